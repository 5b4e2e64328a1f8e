//! Factorization machine parameters.
//!
//! [`FmModel`] owns the arrays. Prediction and training take the borrowed
//! [`FmParamsView`] / [`FmParamsViewMut`], so parameters owned elsewhere can
//! be used without copying.

mod params;

pub use params::{FmParamsView, FmParamsViewMut};

pub(crate) use params::effective_rank;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::data::SparseColumns;
use crate::error::FmError;
use crate::training::{CdSettings, ConfigError};

/// Factorization machine with optional triple interactions.
///
/// # Example
///
/// ```
/// use fmcd::data::CscMatrix;
/// use fmcd::model::FmModel;
/// use ndarray::array;
///
/// let x = CscMatrix::from_dense(array![[1.0, 2.0], [0.0, 3.0]].view());
/// let model = FmModel::from_parts(
///     0.5,
///     array![1.0, 1.0],
///     array![[1.0, 2.0]],
///     ndarray::Array2::zeros((0, 2)),
/// )
/// .unwrap();
///
/// // 0.5 + 1 + 2 + (1*1)(2*2) = 7.5
/// assert_eq!(model.predict(&x).unwrap()[0], 7.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FmModel {
    w0: f64,
    w1: Array1<f64>,
    w2: Array2<f64>,
    w3: Array2<f64>,
}

impl FmModel {
    /// All-zero parameters.
    pub fn zeros(n_features: usize, rank_w2: usize, rank_w3: usize) -> Self {
        Self {
            w0: 0.0,
            w1: Array1::zeros(n_features),
            w2: Array2::zeros((rank_w2, n_features)),
            w3: Array2::zeros((rank_w3, n_features)),
        }
    }

    /// Assemble from existing arrays.
    ///
    /// # Errors
    ///
    /// [`FmError::DimensionMismatch`] if a non-empty factor matrix does not
    /// have `w1.len()` columns.
    pub fn from_parts(w0: f64, w1: Array1<f64>, w2: Array2<f64>, w3: Array2<f64>) -> Result<Self, FmError> {
        let n_features = w1.len();
        FmParamsView::new(w0, w1.view(), w2.view(), w3.view()).validate(n_features, true)?;
        Ok(Self { w0, w1, w2, w3 })
    }

    /// Zero bias and linear weights; factors drawn from `Normal(0, sqrt(var))`.
    ///
    /// The generator is owned by the caller.
    pub fn random<R: Rng + ?Sized>(
        n_features: usize,
        rank_w2: usize,
        rank_w3: usize,
        init_var_w2: f64,
        init_var_w3: f64,
        rng: &mut R,
    ) -> Result<Self, FmError> {
        let w2 = random_factors(rank_w2, n_features, "init_var_w2", init_var_w2, rng)?;
        let w3 = random_factors(rank_w3, n_features, "init_var_w3", init_var_w3, rng)?;
        Ok(Self {
            w0: 0.0,
            w1: Array1::zeros(n_features),
            w2,
            w3,
        })
    }

    /// [`random`](Self::random) with the variances and seed from `settings`.
    pub fn from_settings(
        n_features: usize,
        rank_w2: usize,
        rank_w3: usize,
        settings: &CdSettings,
    ) -> Result<Self, FmError> {
        let mut rng = StdRng::seed_from_u64(settings.rng_seed);
        Self::random(
            n_features,
            rank_w2,
            rank_w3,
            settings.init_var_w2,
            settings.init_var_w3,
            &mut rng,
        )
    }

    // --- Accessors ---

    #[inline]
    pub fn n_features(&self) -> usize {
        self.w1.len()
    }

    #[inline]
    pub fn rank_w2(&self) -> usize {
        effective_rank(&self.w2.view())
    }

    #[inline]
    pub fn rank_w3(&self) -> usize {
        effective_rank(&self.w3.view())
    }

    #[inline]
    pub fn w0(&self) -> f64 {
        self.w0
    }

    #[inline]
    pub fn set_w0(&mut self, w0: f64) {
        self.w0 = w0;
    }

    pub fn w1(&self) -> ArrayView1<'_, f64> {
        self.w1.view()
    }

    pub fn w2(&self) -> ArrayView2<'_, f64> {
        self.w2.view()
    }

    pub fn w3(&self) -> ArrayView2<'_, f64> {
        self.w3.view()
    }

    pub fn view(&self) -> FmParamsView<'_> {
        FmParamsView::new(self.w0, self.w1.view(), self.w2.view(), self.w3.view())
    }

    pub fn view_mut(&mut self) -> FmParamsViewMut<'_> {
        FmParamsViewMut::new(
            &mut self.w0,
            self.w1.view_mut(),
            self.w2.view_mut(),
            self.w3.view_mut(),
        )
    }

    pub fn into_parts(self) -> (f64, Array1<f64>, Array2<f64>, Array2<f64>) {
        (self.w0, self.w1, self.w2, self.w3)
    }

    /// Predict every row of `x`.
    pub fn predict<X: SparseColumns + ?Sized>(&self, x: &X) -> Result<Array1<f64>, FmError> {
        crate::inference::predict(x, self.view())
    }
}

fn random_factors<R: Rng + ?Sized>(
    rank: usize,
    n_features: usize,
    field: &'static str,
    variance: f64,
    rng: &mut R,
) -> Result<Array2<f64>, FmError> {
    if !(variance >= 0.0) || !variance.is_finite() {
        return Err(ConfigError::InvalidInitVariance { field, value: variance }.into());
    }
    let normal = Normal::new(0.0, variance.sqrt())
        .map_err(|_| ConfigError::InvalidInitVariance { field, value: variance })?;
    Ok(Array2::from_shape_simple_fn((rank, n_features), || normal.sample(&mut *rng)))
}
