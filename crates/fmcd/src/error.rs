//! Crate-wide error type.
//!
//! Every check runs before any parameter, residual or cache is touched, so a
//! returned error never leaves a model half-updated.

use crate::data::DataError;
use crate::training::{ConfigError, Solver};

/// Errors returned by prediction and training entry points.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FmError {
    /// Array lengths or shapes disagree with the design matrix.
    #[error("{what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Invalid or inconsistent settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested solver cannot run this configuration.
    #[error("solver `{solver}` does not support {reason}")]
    Unsupported { solver: Solver, reason: &'static str },

    /// Malformed sparse matrix buffers.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl FmError {
    pub(crate) fn check_dim(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected != got {
            return Err(FmError::DimensionMismatch {
                what,
                expected,
                got,
            });
        }
        Ok(())
    }
}
