use thiserror::Error;

use crate::variable::Dim;

/// Error type for invalid inputs to the diagnostics.
#[derive(Error, Debug)]
pub enum DiagnosticsError {
    #[error("Shape mismatch in {field} along {axis}: expected {expected}, got {found}")]
    ShapeMismatch {
        field: String,
        axis: Dim,
        expected: usize,
        found: usize,
    },
    #[error("Field {field} has axis {axis} which the target does not have")]
    MissingAxis { field: String, axis: Dim },
    #[error("At least two depth levels are required, got {0}")]
    InsufficientDepthLevels(usize),
    #[error("Data length {found} does not match the shape size {expected}")]
    DataLength { expected: usize, found: usize },
    #[error("Invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Plotting failed: {0}")]
    Plot(String),
}

/// Convenience type for `Result<T, DiagnosticsError>`.
pub type Result<T> = std::result::Result<T, DiagnosticsError>;
