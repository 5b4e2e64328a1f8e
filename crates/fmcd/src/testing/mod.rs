//! Reference evaluators and synthetic data for tests and benchmarks.

use ndarray::{Array1, Array2, ArrayView2};
use rand::prelude::*;

use crate::data::CscMatrix;
use crate::model::{FmModel, FmParamsView};

/// Explicit polynomial expansion, O(p²) per row (O(p³) with `w3`).
///
/// Sums every pair `i < j` and triple `i < j < l` directly. Used to check the
/// power-sum evaluation in [`predict`](crate::inference::predict).
pub fn brute_force_predict(x: ArrayView2<'_, f64>, params: FmParamsView<'_>) -> Array1<f64> {
    let p = x.ncols();
    let mut out = Array1::from_elem(x.nrows(), params.w0);

    for (row, xr) in x.rows().into_iter().enumerate() {
        let mut y = params.w0;
        if !params.w1.is_empty() {
            for j in 0..p {
                y += params.w1[j] * xr[j];
            }
        }
        for v in params.w2.rows() {
            if v.is_empty() {
                continue;
            }
            for i in 0..p {
                for j in (i + 1)..p {
                    y += v[i] * v[j] * xr[i] * xr[j];
                }
            }
        }
        for u in params.w3.rows() {
            if u.is_empty() {
                continue;
            }
            for i in 0..p {
                for j in (i + 1)..p {
                    for l in (j + 1)..p {
                        y += u[i] * u[j] * u[l] * xr[i] * xr[j] * xr[l];
                    }
                }
            }
        }
        out[row] = y;
    }
    out
}

/// Random sparse matrix; each entry is non-zero with probability `density`,
/// values uniform in `[-1, 1)`.
pub fn random_sparse<R: Rng + ?Sized>(n_rows: usize, n_cols: usize, density: f64, rng: &mut R) -> CscMatrix {
    let mut triplets = Vec::new();
    for col in 0..n_cols {
        for row in 0..n_rows {
            if rng.r#gen::<f64>() < density {
                let value = rng.r#gen::<f64>() * 2.0 - 1.0;
                if value != 0.0 {
                    triplets.push((row, col, value));
                }
            }
        }
    }
    // Indices come from the loops above, so they are always in bounds.
    CscMatrix::from_triplets(n_rows, n_cols, &triplets).unwrap_or_else(|e| panic!("random_sparse: {e}"))
}

/// Regression data generated by a known second-order FM plus uniform noise.
///
/// Returns `(x, y, true_model)`.
pub fn synthetic_regression(
    n_rows: usize,
    n_cols: usize,
    rank: usize,
    density: f64,
    noise_amplitude: f64,
    seed: u64,
) -> (CscMatrix, Array1<f64>, FmModel) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x = random_sparse(n_rows, n_cols, density, &mut rng);

    let w0 = rng.r#gen::<f64>() - 0.5;
    let w1 = Array1::from_shape_simple_fn(n_cols, || rng.r#gen::<f64>() * 2.0 - 1.0);
    let w2 = Array2::from_shape_simple_fn((rank, n_cols), || rng.r#gen::<f64>() - 0.5);
    let truth = FmModel::from_parts(w0, w1, w2, Array2::zeros((0, n_cols)))
        .unwrap_or_else(|e| panic!("synthetic_regression: {e}"));

    let mut y = truth
        .predict(&x)
        .unwrap_or_else(|e| panic!("synthetic_regression: {e}"));
    if noise_amplitude > 0.0 {
        y.mapv_inplace(|v| v + (rng.r#gen::<f64>() * 2.0 - 1.0) * noise_amplitude);
    }
    (x, y, truth)
}

/// Binary targets in `{0, 1}` from thresholding [`synthetic_regression`] at 0.
pub fn synthetic_binary(
    n_rows: usize,
    n_cols: usize,
    rank: usize,
    density: f64,
    seed: u64,
) -> (CscMatrix, Array1<f64>) {
    let (x, score, _) = synthetic_regression(n_rows, n_cols, rank, density, 0.0, seed);
    let y = score.mapv(|s| if s > 0.0 { 1.0 } else { 0.0 });
    (x, y)
}
