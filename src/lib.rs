//! Stratification diagnostics for gridded ocean model output.
//!
//! The central piece is the [`PycnoclineMomentCalculator`](pycnocline::PycnoclineMomentCalculator),
//! which approximates pycnocline depth and thickness by the first and second depth moments of
//! the stratification and masks both in weakly stratified water columns. Around it, the crate
//! provides labelled N-dimensional fields, the w-grid geometry the moments are integrated on,
//! polygon region masks and seasonal climatologies of the resulting diagnostics.

pub mod climatology;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod field;
pub mod grid;
pub mod mask;
#[cfg(feature = "plotting")]
pub mod plot;
pub mod pycnocline;
pub mod region;
pub mod variable;

pub use errors::{DiagnosticsError, Result};

use std::ops::{Add, Div, Mul, Sub};

/// Super Trait for numeric data types.
///
/// Besides the arithmetic needed for number crunching, a type must provide a
/// marker for missing data, which all skip-missing reductions in [`field`] rely on.
pub trait Numeric:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + Mul<Output = Self>
    + Sub<Output = Self>
    + Div<Output = Self>
    + Add<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Div<f64, Output = Self>
    + From<f64>
    + Into<f64>
{
    /// Returns the value used to flag missing data.
    fn missing() -> Self;

    /// Check if a value flags missing data.
    fn is_missing(&self) -> bool;
}

impl Numeric for f64 {
    fn missing() -> Self {
        f64::NAN
    }

    fn is_missing(&self) -> bool {
        self.is_nan()
    }
}
