//! Coordinate descent training.
//!
//! - [`CdTrainer`]: sweeps over bias, linear and factor coordinates
//! - [`CdSettings`]: solver settings (builder, serde, string map)
//! - [`InteractionCache`] / [`TripleInteractionCache`]: per-row partial sums
//!   that make one factor update cost O(nnz) of its column
//! - [`CoordinateStats`]: the two scalars behind a closed-form update
//! - [`FitCallback`], [`EarlyStopping`]: per-sweep progress and cancellation
//! - [`TrainingLogger`], [`Verbosity`]: progress output via `log`

mod cache;
mod callback;
mod logger;
mod loss;
mod settings;
mod stats;
mod trainer;

pub use cache::{InteractionCache, TripleInteractionCache};
pub use callback::{CallbackAction, EarlyStopping, FitCallback, SweepStatus};
pub use logger::{TrainingLogger, Verbosity};
pub use loss::{sigmoid, Loss};
pub use settings::{CdSettings, CdSettingsBuilder, ConfigError, Solver};
pub use stats::{first_order_stats, second_order_stats, third_order_stats, CoordinateStats};
pub use trainer::{CdTrainer, FitReport, UpdateStages};
