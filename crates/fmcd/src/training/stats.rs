//! Sufficient statistics for closed-form coordinate updates.
//!
//! With every other parameter fixed, the model is affine in a single
//! coordinate `w`: `f = w * h + c`, where `h` is the coordinate's effective
//! feature. The ridge-penalised least-squares minimiser over `w` depends on
//! the data only through
//!
//! ```text
//! chsqr = Σ_i cost_i * h_i²
//! che   = Σ_i cost_i * h_i * err_i
//! ```
//!
//! summed over the rows where the coordinate's column is non-zero.

use crate::data::{SparseColumns, WeightsView};

use super::cache::{InteractionCache, TripleInteractionCache};

/// Denominators below this are treated as zero.
const DENOM_EPS: f64 = 1e-10;

/// The two scalars behind one coordinate update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateStats {
    /// Weighted sum of squared effective features.
    pub chsqr: f64,
    /// Weighted sum of effective feature times residual.
    pub che: f64,
}

impl CoordinateStats {
    #[inline]
    fn accumulate(&mut self, cost: f64, h: f64, err: f64) {
        self.chsqr += cost * h * h;
        self.che += cost * h * err;
    }

    /// Closed-form minimiser `(che + w_old * chsqr) / (chsqr + l2)`.
    ///
    /// A coordinate with no signal and no penalty (column entirely zero under
    /// its effective feature) keeps its old value.
    #[inline]
    pub fn ridge_solution(&self, w_old: f64, l2: f64) -> f64 {
        let denom = self.chsqr + l2;
        if denom.abs() < DENOM_EPS {
            return w_old;
        }
        (self.che + w_old * self.chsqr) / denom
    }
}

// =============================================================================
// Effective features
// =============================================================================

/// Effective feature of `w2[k, j]` at one row: `x * (q - w * x)`.
#[inline]
pub(crate) fn pairwise_basis(x: f64, w: f64, q: f64) -> f64 {
    x * (q - w * x)
}

/// Effective feature of `w3[k, j]` at one row.
///
/// The triple term is `v_j x_j` times the second elementary symmetric
/// polynomial of the remaining `x_l v_l`, which is
/// `½((q - v x)² - (q2 - v² x²))`.
#[inline]
pub(crate) fn triple_basis(x: f64, v: f64, q: f64, q2: f64) -> f64 {
    let rest = q - v * x;
    let rest_sq = q2 - v * v * x * x;
    x * 0.5 * (rest * rest - rest_sq)
}

// =============================================================================
// Statistics per order
// =============================================================================

/// Statistics for the linear weight `w1[col]`.
pub fn first_order_stats<X: SparseColumns + ?Sized>(
    x: &X,
    col: usize,
    err: &[f64],
    cost: WeightsView<'_>,
) -> CoordinateStats {
    let mut stats = CoordinateStats::default();
    for (row, value) in x.column(col) {
        stats.accumulate(cost.get(row), value, err[row]);
    }
    stats
}

/// Statistics for the pairwise factor `w2[k, col]` with current value `w`.
pub fn second_order_stats<X: SparseColumns + ?Sized>(
    x: &X,
    col: usize,
    w: f64,
    cache: &InteractionCache,
    err: &[f64],
    cost: WeightsView<'_>,
) -> CoordinateStats {
    let q = cache.values();
    let mut stats = CoordinateStats::default();
    for (row, value) in x.column(col) {
        let h = pairwise_basis(value, w, q[row]);
        stats.accumulate(cost.get(row), h, err[row]);
    }
    stats
}

/// Statistics for the triple-wise factor `w3[k, col]` with current value `v`.
pub fn third_order_stats<X: SparseColumns + ?Sized>(
    x: &X,
    col: usize,
    v: f64,
    cache: &TripleInteractionCache,
    err: &[f64],
    cost: WeightsView<'_>,
) -> CoordinateStats {
    let (q, q2) = (cache.values(), cache.squared_values());
    let mut stats = CoordinateStats::default();
    for (row, value) in x.column(col) {
        let h = triple_basis(value, v, q[row], q2[row]);
        stats.accumulate(cost.get(row), h, err[row]);
    }
    stats
}
