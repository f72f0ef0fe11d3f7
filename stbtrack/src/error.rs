//! Error types for the track stabilizer

use crate::config::Category;
use thiserror::Error;

/// Result type alias for the stabilizer
pub type Result<T> = std::result::Result<T, StabilizerError>;

/// Errors reported by the configuration and frame-level API.
///
/// The association core itself never fails; these cover input that would
/// otherwise break its capacity contract.
#[derive(Error, Debug)]
pub enum StabilizerError {
    #[error("Invalid {name}: {value} is outside {min}..={max}")]
    InvalidParam {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Too many {category} detections: {count} exceeds the limit of {max}")]
    TooManyDetections {
        category: Category,
        count: usize,
        max: usize,
    },

    #[error("{0} tracking is not enabled")]
    CategoryDisabled(Category),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StabilizerError {
    pub fn invalid_param(name: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::InvalidParam {
            name,
            value,
            min,
            max,
        }
    }
}
