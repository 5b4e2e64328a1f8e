//! Borrowed parameter views.
//!
//! Prediction and training never own parameters: they work on views over
//! arrays owned by an [`FmModel`](super::FmModel) or by the caller (for
//! example buffers mapped from another runtime). The views borrow for the
//! duration of one call; nothing here allocates, frees or resizes them.
//!
//! Factor matrices are `rank × n_features`. An empty factor matrix means the
//! corresponding interaction order is disabled.

use ndarray::{aview2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::FmError;

/// Interaction rank implied by a factor matrix; empty means disabled.
#[inline]
pub(crate) fn effective_rank(w: &ArrayView2<'_, f64>) -> usize {
    if w.is_empty() {
        0
    } else {
        w.nrows()
    }
}

// =============================================================================
// FmParamsView
// =============================================================================

/// Read-only view of all FM parameters.
#[derive(Debug, Clone, Copy)]
pub struct FmParamsView<'a> {
    pub w0: f64,
    /// Linear weights, length `n_features` (may be empty for prediction).
    pub w1: ArrayView1<'a, f64>,
    /// Pairwise factors, `rank_w2 × n_features`.
    pub w2: ArrayView2<'a, f64>,
    /// Triple-wise factors, `rank_w3 × n_features`.
    pub w3: ArrayView2<'a, f64>,
}

impl<'a> FmParamsView<'a> {
    pub fn new(
        w0: f64,
        w1: ArrayView1<'a, f64>,
        w2: ArrayView2<'a, f64>,
        w3: ArrayView2<'a, f64>,
    ) -> Self {
        Self { w0, w1, w2, w3 }
    }

    /// Second-order model without triple interactions.
    pub fn pairwise(w0: f64, w1: ArrayView1<'a, f64>, w2: ArrayView2<'a, f64>) -> Self {
        Self::new(w0, w1, w2, aview2::<f64, 0>(&[]))
    }

    /// View over flat row-major buffers. Ranks are `len / n_features`.
    ///
    /// # Errors
    ///
    /// [`FmError::DimensionMismatch`] if `w1` is not empty and not
    /// `n_features` long, or a factor buffer is not a multiple of
    /// `n_features`.
    pub fn from_slices(
        w0: f64,
        w1: &'a [f64],
        w2: &'a [f64],
        w3: &'a [f64],
        n_features: usize,
    ) -> Result<Self, FmError> {
        if !w1.is_empty() {
            FmError::check_dim("w1 length", n_features, w1.len())?;
        }
        let w2 = factor_view("w2 length", w2, n_features)?;
        let w3 = factor_view("w3 length", w3, n_features)?;
        Ok(Self::new(w0, ArrayView1::from(w1), w2, w3))
    }

    #[inline]
    pub fn rank_w2(&self) -> usize {
        effective_rank(&self.w2)
    }

    #[inline]
    pub fn rank_w3(&self) -> usize {
        effective_rank(&self.w3)
    }

    /// Check every array against the design matrix width.
    ///
    /// `w1` may be empty unless `require_w1` is set. Non-empty factor
    /// matrices must have exactly `n_features` columns.
    pub fn validate(&self, n_features: usize, require_w1: bool) -> Result<(), FmError> {
        if require_w1 || !self.w1.is_empty() {
            FmError::check_dim("w1 length", n_features, self.w1.len())?;
        }
        if !self.w2.is_empty() {
            FmError::check_dim("w2 columns", n_features, self.w2.ncols())?;
        }
        if !self.w3.is_empty() {
            FmError::check_dim("w3 columns", n_features, self.w3.ncols())?;
        }
        Ok(())
    }
}

fn factor_view<'a>(
    what: &'static str,
    buf: &'a [f64],
    n_features: usize,
) -> Result<ArrayView2<'a, f64>, FmError> {
    let rank = if n_features == 0 { 0 } else { buf.len() / n_features };
    let len = buf.len();
    FmError::check_dim(what, rank * n_features, len)?;
    ArrayView2::from_shape((rank, n_features), buf).map_err(|_| FmError::DimensionMismatch {
        what,
        expected: rank * n_features,
        got: len,
    })
}

// =============================================================================
// FmParamsViewMut
// =============================================================================

/// Mutable view of all FM parameters, updated in place by training.
#[derive(Debug)]
pub struct FmParamsViewMut<'a> {
    pub w0: &'a mut f64,
    pub w1: ArrayViewMut1<'a, f64>,
    pub w2: ArrayViewMut2<'a, f64>,
    pub w3: ArrayViewMut2<'a, f64>,
}

impl<'a> FmParamsViewMut<'a> {
    pub fn new(
        w0: &'a mut f64,
        w1: ArrayViewMut1<'a, f64>,
        w2: ArrayViewMut2<'a, f64>,
        w3: ArrayViewMut2<'a, f64>,
    ) -> Self {
        Self { w0, w1, w2, w3 }
    }

    /// Mutable view over flat row-major buffers owned by the caller.
    ///
    /// Ranks are `len / n_features`; `w1` must be exactly `n_features` long.
    pub fn from_slices(
        w0: &'a mut f64,
        w1: &'a mut [f64],
        w2: &'a mut [f64],
        w3: &'a mut [f64],
        n_features: usize,
    ) -> Result<Self, FmError> {
        FmError::check_dim("w1 length", n_features, w1.len())?;
        let w2 = factor_view_mut("w2 length", w2, n_features)?;
        let w3 = factor_view_mut("w3 length", w3, n_features)?;
        Ok(Self::new(w0, ArrayViewMut1::from(w1), w2, w3))
    }

    /// Reborrow as a read-only view.
    pub fn view(&self) -> FmParamsView<'_> {
        FmParamsView::new(*self.w0, self.w1.view(), self.w2.view(), self.w3.view())
    }

    #[inline]
    pub fn rank_w2(&self) -> usize {
        effective_rank(&self.w2.view())
    }

    #[inline]
    pub fn rank_w3(&self) -> usize {
        effective_rank(&self.w3.view())
    }
}

fn factor_view_mut<'a>(
    what: &'static str,
    buf: &'a mut [f64],
    n_features: usize,
) -> Result<ArrayViewMut2<'a, f64>, FmError> {
    let rank = if n_features == 0 { 0 } else { buf.len() / n_features };
    let len = buf.len();
    FmError::check_dim(what, rank * n_features, len)?;
    ArrayViewMut2::from_shape((rank, n_features), buf).map_err(|_| FmError::DimensionMismatch {
        what,
        expected: rank * n_features,
        got: len,
    })
}
