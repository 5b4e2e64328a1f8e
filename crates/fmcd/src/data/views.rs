//! Per-sample weight views.

use ndarray::ArrayView1;

/// Optional per-sample weights (costs).
///
/// Weights multiply every sufficient-statistic sum. Use `WeightsView::None`
/// when all samples count equally.
#[derive(Debug, Clone, Copy, Default)]
pub enum WeightsView<'a> {
    /// No weights - all samples have implicit weight 1.0.
    #[default]
    None,
    /// Explicit weights per sample.
    Some(ArrayView1<'a, f64>),
}

impl<'a> WeightsView<'a> {
    /// Create an empty weights view (all weights are 1.0).
    #[inline]
    pub fn none() -> Self {
        WeightsView::None
    }

    /// Create from weights array.
    #[inline]
    pub fn from_array(weights: ArrayView1<'a, f64>) -> Self {
        WeightsView::Some(weights)
    }

    /// Borrow the same weights for a shorter lifetime.
    #[inline]
    pub fn reborrow(&self) -> WeightsView<'_> {
        match self {
            WeightsView::None => WeightsView::None,
            WeightsView::Some(w) => WeightsView::Some(w.view()),
        }
    }

    /// Get weight for a sample.
    ///
    /// Returns 1.0 for uniform weights, or the stored weight for weighted.
    #[inline]
    pub fn get(&self, idx: usize) -> f64 {
        match self {
            WeightsView::None => 1.0,
            WeightsView::Some(w) => w[idx],
        }
    }

    /// Number of stored weights, `None` for uniform weights.
    #[inline]
    pub fn len(&self) -> Option<usize> {
        match self {
            WeightsView::None => None,
            WeightsView::Some(w) => Some(w.len()),
        }
    }
}
