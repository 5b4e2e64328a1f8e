//! Batch prediction.
//!
//! ```text
//! f(x) = w0 + Σ_j w1_j x_j
//!           + Σ_k Σ_{i<j} v_ki v_kj x_i x_j           (w2 rows)
//!           + Σ_k Σ_{i<j<l} u_ki u_kj u_kl x_i x_j x_l (w3 rows)
//! ```
//!
//! Interaction sums are evaluated in O(nnz) per factor row from the power
//! sums `p_m = Σ_l (x_l v_l)^m`:
//!
//! - pairs: `(p1² - p2) / 2`
//! - triples: `(p1³ - 3 p1 p2 + 2 p3) / 6`

use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut1};

use crate::data::SparseColumns;
use crate::error::FmError;
use crate::model::FmParamsView;

/// Predict every row of `x`.
///
/// `w1` may be empty (no linear term); empty factor matrices disable their
/// interaction order.
///
/// # Errors
///
/// [`FmError::DimensionMismatch`] if a non-empty parameter array disagrees
/// with the number of columns of `x`.
pub fn predict<X: SparseColumns + ?Sized>(
    x: &X,
    params: FmParamsView<'_>,
) -> Result<Array1<f64>, FmError> {
    params.validate(x.n_cols(), false)?;
    let mut out = vec![0.0; x.n_rows()];
    predict_unchecked(x, &params, &mut out, &mut PowerSums::default());
    Ok(Array1::from(out))
}

/// Predict into a caller-provided buffer of length `n_rows`.
pub fn predict_into<X: SparseColumns + ?Sized>(
    x: &X,
    params: FmParamsView<'_>,
    mut out: ArrayViewMut1<'_, f64>,
) -> Result<(), FmError> {
    params.validate(x.n_cols(), false)?;
    FmError::check_dim("output length", x.n_rows(), out.len())?;

    let mut sums = PowerSums::default();
    match out.as_slice_mut() {
        Some(slice) => predict_unchecked(x, &params, slice, &mut sums),
        None => {
            let mut buf = vec![0.0; x.n_rows()];
            predict_unchecked(x, &params, &mut buf, &mut sums);
            out.assign(&ArrayView1::from(&buf[..]));
        }
    }
    Ok(())
}

// =============================================================================
// Kernel
// =============================================================================

/// Per-row power sums for one factor row, reused across rows and calls.
#[derive(Debug, Default)]
pub(crate) struct PowerSums {
    p1: Vec<f64>,
    p2: Vec<f64>,
    p3: Vec<f64>,
}

impl PowerSums {
    fn reset(&mut self, n_rows: usize, third: bool) {
        for buf in [&mut self.p1, &mut self.p2] {
            buf.clear();
            buf.resize(n_rows, 0.0);
        }
        self.p3.clear();
        if third {
            self.p3.resize(n_rows, 0.0);
        }
    }

    fn accumulate<X: SparseColumns + ?Sized>(&mut self, x: &X, w_row: ArrayView1<'_, f64>, third: bool) {
        for (col, &w) in w_row.iter().enumerate() {
            for (row, value) in x.column(col) {
                let t = w * value;
                let t2 = t * t;
                self.p1[row] += t;
                self.p2[row] += t2;
                if third {
                    self.p3[row] += t2 * t;
                }
            }
        }
    }
}

/// Overwrite `out` with predictions. Shapes must already be validated.
pub(crate) fn predict_unchecked<X: SparseColumns + ?Sized>(
    x: &X,
    params: &FmParamsView<'_>,
    out: &mut [f64],
    sums: &mut PowerSums,
) {
    debug_assert_eq!(out.len(), x.n_rows());
    out.fill(params.w0);

    if !params.w1.is_empty() {
        for (col, &w) in params.w1.iter().enumerate() {
            for (row, value) in x.column(col) {
                out[row] += w * value;
            }
        }
    }

    add_interactions(x, params.w2, out, sums, false);
    add_interactions(x, params.w3, out, sums, true);
}

fn add_interactions<X: SparseColumns + ?Sized>(
    x: &X,
    factors: ArrayView2<'_, f64>,
    out: &mut [f64],
    sums: &mut PowerSums,
    third: bool,
) {
    if factors.is_empty() {
        return;
    }
    for w_row in factors.rows() {
        sums.reset(out.len(), third);
        sums.accumulate(x, w_row, third);
        if third {
            for (row, y) in out.iter_mut().enumerate() {
                let (p1, p2, p3) = (sums.p1[row], sums.p2[row], sums.p3[row]);
                *y += (p1 * p1 * p1 - 3.0 * p1 * p2 + 2.0 * p3) / 6.0;
            }
        } else {
            for (row, y) in out.iter_mut().enumerate() {
                let p1 = sums.p1[row];
                *y += 0.5 * (p1 * p1 - sums.p2[row]);
            }
        }
    }
}
