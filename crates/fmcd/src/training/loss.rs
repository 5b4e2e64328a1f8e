//! Losses and their residual transforms.
//!
//! Squared loss fits the plain residual `y - f`. Logistic loss is reduced to a
//! weighted least-squares problem once per sweep (IRLS): the residual becomes
//! the working residual `(y01 - p) / (p (1 - p))` and `p (1 - p)` multiplies
//! every sufficient statistic.

use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::data::WeightsView;

/// Lower bound on the IRLS weight `p (1 - p)`.
const IRLS_WEIGHT_MIN: f64 = 1e-16;

/// Training loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loss {
    /// Least squares regression.
    #[default]
    Squared,
    /// Binary classification; a sample is positive iff `y > 0`.
    Logistic,
}

impl Loss {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loss::Squared => "squared",
            Loss::Logistic => "logistic",
        }
    }

    /// Name of the training metric reported per sweep.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Loss::Squared => "rmse",
            Loss::Logistic => "logloss",
        }
    }

    /// Whether the loss needs per-sweep reweighting.
    #[inline]
    pub fn is_irls(&self) -> bool {
        matches!(self, Loss::Logistic)
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Loss {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squared" => Ok(Loss::Squared),
            "logistic" => Ok(Loss::Logistic),
            other => Err(ConfigError::UnknownLoss(other.to_string())),
        }
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `ln(1 + e^x)` without overflow.
#[inline]
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

// =============================================================================
// Residual transforms
// =============================================================================

/// Turn a prediction buffer into the squared-loss residual `y - f`.
pub(crate) fn squared_residual(y: ArrayView1<'_, f64>, err: &mut [f64]) {
    debug_assert_eq!(y.len(), err.len());
    for (e, &t) in err.iter_mut().zip(y.iter()) {
        *e = t - *e;
    }
}

/// Turn a prediction buffer into the IRLS working residual.
///
/// On entry `err` holds the prediction `f`. On exit it holds
/// `(y01 - p) / w`, `weight` holds `w * cost` and `response` the working
/// response `z = f + err`, so that `f = z - err` can be recovered later.
pub(crate) fn logistic_working_response(
    y: ArrayView1<'_, f64>,
    cost: WeightsView<'_>,
    err: &mut [f64],
    weight: &mut [f64],
    response: &mut [f64],
) {
    debug_assert_eq!(y.len(), err.len());
    debug_assert_eq!(err.len(), weight.len());
    debug_assert_eq!(err.len(), response.len());

    for i in 0..err.len() {
        let f = err[i];
        let p = sigmoid(f);
        let target = if y[i] > 0.0 { 1.0 } else { 0.0 };
        let w = (p * (1.0 - p)).max(IRLS_WEIGHT_MIN);
        err[i] = (target - p) / w;
        weight[i] = w * cost.get(i);
        response[i] = f + err[i];
    }
}

// =============================================================================
// Training metrics
// =============================================================================

/// Weighted root mean squared residual.
pub(crate) fn weighted_rmse(err: &[f64], cost: WeightsView<'_>) -> f64 {
    let (mut sum, mut total) = (0.0, 0.0);
    for (i, &e) in err.iter().enumerate() {
        let c = cost.get(i);
        sum += c * e * e;
        total += c;
    }
    if total > 0.0 {
        (sum / total).sqrt()
    } else {
        0.0
    }
}

/// Weighted mean negative log-likelihood of the prediction `response - err`.
pub(crate) fn mean_logloss(
    y: ArrayView1<'_, f64>,
    cost: WeightsView<'_>,
    response: &[f64],
    err: &[f64],
) -> f64 {
    let (mut sum, mut total) = (0.0, 0.0);
    for i in 0..err.len() {
        let f = response[i] - err[i];
        let c = cost.get(i);
        let nll = if y[i] > 0.0 { softplus(-f) } else { softplus(f) };
        sum += c * nll;
        total += c;
    }
    if total > 0.0 {
        sum / total
    } else {
        0.0
    }
}
