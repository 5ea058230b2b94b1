//! Trait for types that flag a water column as stratified or not, and the default
//! implementation using the enum [`StratMask`].

use crate::field::ArrND;
use crate::Numeric;

/// Type to flag a water column as stratified or unstratified.
///
/// `core::convert::From<StratMask>` is implemented for `f64`, converting
/// `StratMask::Stratified` to `1f64` and `StratMask::Unstratified` to `0f64`.
///
/// # Examples
/// ```
/// use stratos::mask::{Mask, StratMask};
///
/// let m = StratMask::from_column_min(-0.5, -0.01);
/// assert!(m.is_set());
/// assert!(StratMask::from_column_min(-0.005, -0.01).is_unset());
/// assert!(StratMask::from_column_min(f64::NAN, -0.01).is_unset());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StratMask {
    /// Stratification nowhere in the column exceeds the threshold.
    Unstratified,
    /// Stratification somewhere in the column exceeds the threshold.
    Stratified,
}

/// Trait for types representing a binary mask.
pub trait Mask: Copy + PartialEq + Into<f64> {
    /// Return a "set" value.
    fn set() -> Self;
    /// Return an "unset" value.
    fn unset() -> Self;
    /// Check if the mask value corresponds to "set".
    fn is_set(&self) -> bool {
        *self == Self::set()
    }
    /// Check if the mask value corresponds to "unset".
    fn is_unset(&self) -> bool {
        !self.is_set()
    }
}

impl Mask for StratMask {
    /// Returns [`StratMask::Stratified`]
    fn set() -> Self {
        StratMask::Stratified
    }

    /// Returns [`StratMask::Unstratified`]
    fn unset() -> Self {
        StratMask::Unstratified
    }
}

impl StratMask {
    /// Classify a column by its minimum stratification.
    ///
    /// Stratification is negative, so a column counts as stratified if its minimum is strictly
    /// below `threshold`. A missing minimum (all-missing column) is unstratified.
    pub fn from_column_min<I: Numeric>(column_min: I, threshold: I) -> Self {
        if !column_min.is_missing() && column_min < threshold {
            StratMask::Stratified
        } else {
            StratMask::Unstratified
        }
    }
}

/// Mask values are interpreted as 0f64 if unstratified and 1f64 if stratified.
///
/// # Examples
/// ```
/// use stratos::mask::StratMask;
///
/// assert_eq!(f64::from(StratMask::Unstratified), 0.0);
/// assert_eq!(f64::from(StratMask::Stratified), 1.0);
/// ```
impl From<StratMask> for f64 {
    fn from(mask: StratMask) -> Self {
        match mask {
            StratMask::Stratified => 1f64,
            StratMask::Unstratified => 0f64,
        }
    }
}

/// Null-propagating select: keep `values` where `mask` is set, missing elsewhere.
pub fn mask_where<const ND: usize, M: Mask>(
    values: &ArrND<ND, f64>,
    mask: &ArrND<ND, M>,
) -> ArrND<ND, f64> {
    values.select(&mask.map(Mask::is_set), f64::missing())
}

/// Convert a mask field to its 0/1 float representation.
pub fn to_float<const ND: usize, M: Mask>(mask: &ArrND<ND, M>) -> ArrND<ND, f64> {
    mask.map(|&m| m.into())
}
