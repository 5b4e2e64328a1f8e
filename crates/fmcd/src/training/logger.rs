//! Training progress logging.
//!
//! Messages go through the [`log`] facade; the embedding application picks
//! the backend. [`Verbosity`] filters on top of the backend's own level.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// How much the trainer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing at all.
    #[default]
    Silent,
    /// Only problems (non-finite parameters or losses).
    Warning,
    /// One line per sweep.
    Info,
    /// Per-stage timings as well.
    Debug,
}

/// Logger for a single training call.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    started: Option<Instant>,
    n_sweeps: usize,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            started: None,
            n_sweeps: 0,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn start_training(&mut self, n_sweeps: usize, n_samples: usize, n_features: usize, stages: &str) {
        self.started = Some(Instant::now());
        self.n_sweeps = n_sweeps;
        if self.verbosity >= Verbosity::Info {
            log::info!(
                "coordinate descent: {} sweeps, {} samples, {} features, stages [{}]",
                n_sweeps,
                n_samples,
                n_features,
                stages
            );
        }
    }

    pub fn log_sweep(&self, sweep: usize, train_loss: f64, loss_name: &str) {
        if self.verbosity >= Verbosity::Info {
            log::info!("[{}/{}] train-{}: {:.6}", sweep + 1, self.n_sweeps, loss_name, train_loss);
        }
    }

    pub fn log_stage(&self, sweep: usize, stage: &str, elapsed: Duration) {
        if self.verbosity >= Verbosity::Debug {
            log::debug!("[{}] {} stage took {:.3?}", sweep + 1, stage, elapsed);
        }
    }

    pub fn warn_non_finite(&self, sweep: usize, what: &str) {
        if self.verbosity >= Verbosity::Warning {
            log::warn!("[{}] {} is not finite; check regularization and feature scaling", sweep + 1, what);
        }
    }

    pub fn log_early_stopping(&self, sweep: usize) {
        if self.verbosity >= Verbosity::Info {
            log::info!("callback requested stop after sweep {}", sweep + 1);
        }
    }

    pub fn finish_training(&self, sweeps_run: usize) {
        if self.verbosity >= Verbosity::Info {
            let elapsed = self.started.map(|t| t.elapsed()).unwrap_or_default();
            log::info!("finished {} sweeps in {:.3?}", sweeps_run, elapsed);
        }
    }
}
