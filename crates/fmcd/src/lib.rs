//! fmcd: factorization machines fitted by closed-form coordinate descent.
//!
//! A factorization machine predicts
//!
//! ```text
//! f(x) = w0 + Σ_j w1_j x_j + Σ_{i<j} <v_i, v_j> x_i x_j [+ Σ_{i<j<l} triples]
//! ```
//!
//! with the pairwise weights factorized through `rank_w2` factor rows (and
//! optional triple-wise weights through `rank_w3` rows).
//!
//! # Key Types
//!
//! - [`CscMatrix`] / [`CscView`] - Column-major sparse design matrices
//! - [`FmModel`] / [`FmParamsView`] / [`FmParamsViewMut`] - Parameters, owned or borrowed
//! - [`CdSettings`] - Solver settings builder
//! - [`CdTrainer`] - Coordinate descent training
//! - [`predict`] - Batch prediction
//!
//! # Example
//!
//! ```
//! use fmcd::{CdSettings, CdTrainer, CscMatrix, FmModel, WeightsView};
//! use ndarray::array;
//!
//! let x = CscMatrix::from_dense(array![[1., 2., 0.], [0., 3., 0.], [4., 0., 2.], [4., 5., 0.]].view());
//! let y = array![1., 1., 1., 1.];
//!
//! let settings = CdSettings::builder().iter(50).build().unwrap();
//! let mut model = FmModel::from_settings(3, 2, 0, &settings).unwrap();
//! let report = CdTrainer::new(settings)
//!     .fit_model(&x, y.view(), WeightsView::None, &mut model, None)
//!     .unwrap();
//!
//! assert_eq!(report.sweeps_run, 50);
//! let pred = model.predict(&x).unwrap();
//! assert_eq!(pred.len(), 4);
//! ```

pub mod data;
pub mod error;
pub mod inference;
pub mod model;
pub mod testing;
pub mod training;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::{CscMatrix, CscView, DataError, SparseColumns, WeightsView};
pub use error::FmError;
pub use inference::{predict, predict_into};
pub use model::{FmModel, FmParamsView, FmParamsViewMut};
pub use training::{
    CdSettings, CdTrainer, ConfigError, EarlyStopping, FitCallback, FitReport, Loss, Solver,
    SweepStatus, Verbosity,
};
