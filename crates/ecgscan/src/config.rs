//! Aggregate pipeline configuration.

use std::path::Path;

use crate::calibrate::{CalibrationConfig, NormalizationConfig};
use crate::classify::ClassifierConfig;
use crate::error::ConfigError;
use crate::grid::GridConfig;
use crate::oracle::OracleConfig;
use crate::path::PathConfig;
use crate::quality::QualityConfig;
use crate::region::RegionConfig;

/// Every tunable of the digitizer. Missing JSON sections or fields keep
/// their defaults.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DigitizeConfig {
    pub classifier: ClassifierConfig,
    pub grid: GridConfig,
    pub region: RegionConfig,
    pub path: PathConfig,
    pub calibration: CalibrationConfig,
    pub normalization: NormalizationConfig,
    pub quality: QualityConfig,
    pub oracle: OracleConfig,
}

impl DigitizeConfig {
    /// Load a (possibly partial) config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
