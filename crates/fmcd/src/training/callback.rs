//! Per-sweep progress callbacks.
//!
//! The trainer calls [`FitCallback::on_sweep`] once after every completed
//! sweep. Returning [`CallbackAction::Stop`] ends training after that sweep;
//! there is no other way to cancel a fit.

use serde::Serialize;

use super::Loss;

// =============================================================================
// Status payload
// =============================================================================

/// Snapshot handed to the callback after each sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepStatus {
    /// Zero-based index of the sweep that just finished.
    pub sweep: usize,
    /// Loss the residual was fitted against.
    pub loss: Loss,
    /// Training loss at the end of the sweep (RMSE or mean log-loss).
    pub train_loss: f64,
}

impl SweepStatus {
    /// Serialize to the JSON payload passed across language bindings.
    pub fn to_json(&self) -> String {
        // Serializing a struct of primitives into a String cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// What the trainer should do after a callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
}

impl CallbackAction {
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, CallbackAction::Stop)
    }
}

impl From<bool> for CallbackAction {
    /// `true` means "stop", matching the boolean callback convention.
    fn from(stop: bool) -> Self {
        if stop {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }
}

/// Observer invoked once per sweep.
pub trait FitCallback {
    fn on_sweep(&mut self, status: &SweepStatus) -> CallbackAction;
}

/// Closures returning `true` to request a stop.
impl<F> FitCallback for F
where
    F: FnMut(&SweepStatus) -> bool,
{
    fn on_sweep(&mut self, status: &SweepStatus) -> CallbackAction {
        CallbackAction::from(self(status))
    }
}

// =============================================================================
// Early stopping
// =============================================================================

/// Stops training once more than `patience` consecutive sweeps fail to
/// improve on the best training loss.
///
/// An improving sweep never stops training, even with `patience == 0`.
///
/// # Example
///
/// ```
/// use fmcd::training::EarlyStopping;
///
/// let mut early_stop = EarlyStopping::new(2);
/// assert!(!early_stop.should_stop(1.0)); // best
/// assert!(!early_stop.should_stop(1.0)); // 1 without improvement
/// assert!(!early_stop.should_stop(1.0)); // 2
/// assert!(early_stop.should_stop(1.0)); // 3 > patience
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    /// Number of sweeps without improvement before stopping.
    patience: usize,
    /// Required decrease for a sweep to count as an improvement.
    min_delta: f64,
    best_value: Option<f64>,
    best_round: usize,
    current_round: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            min_delta: 0.0,
            best_value: None,
            best_round: 0,
            current_round: 0,
        }
    }

    /// Only count decreases larger than `min_delta` as improvements.
    pub fn with_min_delta(mut self, min_delta: f64) -> Self {
        self.min_delta = min_delta.max(0.0);
        self
    }

    /// Record a loss value and report whether training should stop.
    ///
    /// Lower is better. Non-finite values never count as an improvement.
    pub fn should_stop(&mut self, value: f64) -> bool {
        let is_improvement = value.is_finite()
            && match self.best_value {
                None => true,
                Some(best) => value < best - self.min_delta,
            };

        if is_improvement {
            self.best_value = Some(value);
            self.best_round = self.current_round;
        }

        let since_best = self.current_round - self.best_round;
        self.current_round += 1;

        since_best > self.patience
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Sweep at which the best value was observed.
    pub fn best_round(&self) -> usize {
        self.best_round
    }

    pub fn reset(&mut self) {
        self.best_value = None;
        self.best_round = 0;
        self.current_round = 0;
    }
}

impl FitCallback for EarlyStopping {
    fn on_sweep(&mut self, status: &SweepStatus) -> CallbackAction {
        CallbackAction::from(self.should_stop(status.train_loss))
    }
}
