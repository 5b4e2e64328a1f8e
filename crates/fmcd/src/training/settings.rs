//! Solver settings with builder pattern.
//!
//! [`CdSettings`] is the settings record consumed by
//! [`CdTrainer`](super::CdTrainer). It can be built three ways:
//!
//! ```
//! use std::collections::HashMap;
//! use fmcd::training::{CdSettings, Loss};
//!
//! // All defaults: squared loss, coordinate descent, 50 sweeps
//! let settings = CdSettings::default();
//!
//! // Builder, validated on build()
//! let settings = CdSettings::builder()
//!     .loss(Loss::Logistic)
//!     .iter(100)
//!     .l2_reg_w2(0.5)
//!     .step_size(0.1)
//!     .build()
//!     .unwrap();
//!
//! // String map, as handed over by bindings
//! let map = HashMap::from([
//!     ("solver".to_string(), "cd".to_string()),
//!     ("loss".to_string(), "squared".to_string()),
//!     ("iter".to_string(), "20".to_string()),
//! ]);
//! let settings = CdSettings::from_map(&map).unwrap();
//! assert_eq!(settings.iter, 20);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::{Loss, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during settings validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be non-negative, got {value}")]
    InvalidRegularization { field: &'static str, value: f64 },

    #[error("step_size must be positive and finite, got {0}")]
    InvalidStepSize(f64),

    #[error("{field} must be non-negative and finite, got {value}")]
    InvalidInitVariance { field: &'static str, value: f64 },

    #[error("unknown loss `{0}` (expected `squared` or `logistic`)")]
    UnknownLoss(String),

    #[error("unknown solver `{0}` (expected `cd` or `mcmc`)")]
    UnknownSolver(String),

    #[error("cannot parse value `{value}` for setting `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("unknown setting `{0}`")]
    UnknownKey(String),
}

// =============================================================================
// Solver
// =============================================================================

/// Which solver the settings request.
///
/// Only [`Solver::Cd`] runs in this crate; the Gibbs sampler lives outside
/// and shares the settings record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    /// Closed-form coordinate descent.
    #[default]
    Cd,
    /// Markov chain Monte Carlo (Gibbs sampling).
    Mcmc,
}

impl Solver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Solver::Cd => "cd",
            Solver::Mcmc => "mcmc",
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Solver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cd" => Ok(Solver::Cd),
            "mcmc" => Ok(Solver::Mcmc),
            other => Err(ConfigError::UnknownSolver(other.to_string())),
        }
    }
}

// =============================================================================
// CdSettings
// =============================================================================

/// Settings for one training call.
///
/// Interaction ranks are not part of the settings: they are read from the
/// shapes of the parameter arrays handed to the trainer.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default)]
pub struct CdSettings {
    /// Loss to minimise. Default: squared.
    #[builder(default)]
    pub loss: Loss,

    /// Solver. Default: coordinate descent.
    #[builder(default)]
    pub solver: Solver,

    /// Number of full sweeps over all coordinates. Default: 50.
    #[builder(default = 50)]
    pub iter: usize,

    /// Update the bias `w0`. Default: true.
    #[builder(default = true)]
    pub zero_order: bool,

    /// Update the linear weights `w1`. Default: true.
    #[builder(default = true)]
    pub first_order: bool,

    /// Under logistic loss, move the bias by the IRLS-weighted mean of the
    /// working residual instead of the plain mean. Default: false.
    #[builder(default)]
    pub weighted_bias: bool,

    /// Bias regularization. Accepted for compatibility; the closed-form bias
    /// update is unregularized.
    #[builder(default)]
    pub l2_reg_w0: f64,

    /// L2 penalty on the linear weights.
    #[builder(default)]
    pub l2_reg_w1: f64,

    /// L2 penalty on the pairwise factors.
    #[builder(default)]
    pub l2_reg_w2: f64,

    /// L2 penalty on the triple-wise factors.
    #[builder(default)]
    pub l2_reg_w3: f64,

    /// Damping for the logistic (IRLS) path: `w += step_size * (w_new - w)`.
    /// Squared loss always takes the full closed-form step. Default: 0.01.
    #[builder(default = 0.01)]
    pub step_size: f64,

    /// Variance of the normal distribution used to initialise `w2`. Default: 0.1.
    #[builder(default = 0.1)]
    pub init_var_w2: f64,

    /// Variance of the normal distribution used to initialise `w3`. Default: 0.1.
    #[builder(default = 0.1)]
    pub init_var_w3: f64,

    /// Seed for parameter initialisation. Default: 123.
    #[builder(default = 123)]
    pub rng_seed: u64,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,
}

/// Custom finishing function that validates the settings.
impl<S: cd_settings_builder::IsComplete> CdSettingsBuilder<S> {
    /// Build and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for negative regularization, a non-positive
    /// step size or a negative initialisation variance.
    pub fn build(self) -> Result<CdSettings, ConfigError> {
        let settings = self.__build_internal();
        settings.validate()?;
        Ok(settings)
    }
}

impl CdSettings {
    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("l2_reg_w0", self.l2_reg_w0),
            ("l2_reg_w1", self.l2_reg_w1),
            ("l2_reg_w2", self.l2_reg_w2),
            ("l2_reg_w3", self.l2_reg_w3),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidRegularization { field, value });
            }
        }

        if !(self.step_size > 0.0) || !self.step_size.is_finite() {
            return Err(ConfigError::InvalidStepSize(self.step_size));
        }

        for (field, value) in [("init_var_w2", self.init_var_w2), ("init_var_w3", self.init_var_w3)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::InvalidInitVariance { field, value });
            }
        }

        Ok(())
    }

    /// Parse settings from `name -> value` strings.
    ///
    /// Missing keys keep their defaults. Booleans are `true`/`false`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unknown keys, unparsable values and
    /// anything [`validate`](Self::validate) rejects.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut settings = CdSettings::default();

        for (key, value) in map {
            match key.as_str() {
                "loss" => settings.loss = value.parse()?,
                "solver" => settings.solver = value.parse()?,
                "iter" => settings.iter = parse_value(key, value)?,
                "zero_order" => settings.zero_order = parse_value(key, value)?,
                "first_order" => settings.first_order = parse_value(key, value)?,
                "weighted_bias" => settings.weighted_bias = parse_value(key, value)?,
                "l2_reg_w0" => settings.l2_reg_w0 = parse_value(key, value)?,
                "l2_reg_w1" => settings.l2_reg_w1 = parse_value(key, value)?,
                "l2_reg_w2" => settings.l2_reg_w2 = parse_value(key, value)?,
                "l2_reg_w3" => settings.l2_reg_w3 = parse_value(key, value)?,
                "step_size" => settings.step_size = parse_value(key, value)?,
                "init_var_w2" => settings.init_var_w2 = parse_value(key, value)?,
                "init_var_w3" => settings.init_var_w3 = parse_value(key, value)?,
                "rng_seed" => settings.rng_seed = parse_value(key, value)?,
                _ => return Err(ConfigError::UnknownKey(key.clone())),
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

impl Default for CdSettings {
    fn default() -> Self {
        Self::builder().build().expect("default settings are valid")
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
