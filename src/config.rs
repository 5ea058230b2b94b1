//! Run configuration of the diagnostics.

use serde::{Deserialize, Serialize};

use crate::climatology::Season;
use crate::errors::Result;
use crate::pycnocline::DEFAULT_STRAT_THRESHOLD;

/// Parameters of a diagnostics run.
///
/// Missing keys take their default values.
///
/// # Examples
/// ```
/// use stratos::climatology::Season;
/// use stratos::config::DiagnosticsConfig;
///
/// let config = DiagnosticsConfig::from_toml_str("season = \"summer\"").unwrap();
/// assert_eq!(config.season, Season::Summer);
/// assert_eq!(config.strat_threshold, -0.01);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Stratification (kg m-4) below which a water column counts as stratified.
    ///
    /// Default: -0.01
    pub strat_threshold: f64,

    /// Season for multi-year averages of the diagnostics.
    ///
    /// Default: all seasons
    pub season: Season,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            strat_threshold: DEFAULT_STRAT_THRESHOLD,
            season: Season::All,
        }
    }
}

impl DiagnosticsConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
