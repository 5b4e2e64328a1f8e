//! Prediction.

mod predict;

pub use predict::{predict, predict_into};

pub(crate) use predict::{predict_unchecked, PowerSums};
