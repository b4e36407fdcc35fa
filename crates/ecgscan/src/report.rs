//! Caller-facing JSON document for one digitized strip.

use std::collections::BTreeMap;

use crate::{ExtractionMethod, ExtractionResult, PathSource};

/// Thresholds behind the human-readable issue flags.
#[derive(Debug, Clone, Copy)]
pub struct IssueThresholds {
    pub min_quality: f64,
    pub min_spacing_px: f64,
    pub min_range_uv: f64,
    pub max_range_uv: f64,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            min_quality: 0.5,
            min_spacing_px: 5.0,
            min_range_uv: 500.0,
            max_range_uv: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeadSignal {
    #[serde(rename = "samples_uV")]
    pub samples_uv: Vec<f64>,
    pub fs: u32,
    pub duration_s: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CalibrationReport {
    pub px_per_mm: f64,
    pub method: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QualityReport {
    pub score: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReportMetadata {
    pub algorithm: ExtractionMethod,
    pub path_source: PathSource,
    pub processing_time_ms: f64,
    pub image_size: [u32; 2],
}

/// Full report, keyed by lead name.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DigitizeReport {
    pub leads: BTreeMap<String, LeadSignal>,
    pub calibration: CalibrationReport,
    pub quality: QualityReport,
    pub metadata: ReportMetadata,
}

impl DigitizeReport {
    pub fn from_result(result: &ExtractionResult, lead: &str) -> Self {
        Self::with_thresholds(result, lead, &IssueThresholds::default())
    }

    pub fn with_thresholds(result: &ExtractionResult, lead: &str, thresholds: &IssueThresholds) -> Self {
        let mut leads = BTreeMap::new();
        leads.insert(
            lead.to_string(),
            LeadSignal {
                samples_uv: result.signal_uv.clone(),
                fs: result.fs,
                duration_s: result.duration_s,
            },
        );
        Self {
            leads,
            calibration: CalibrationReport {
                px_per_mm: result.grid_spacing_px,
                method: "autocorrelation".to_string(),
                confidence: result.grid_confidence,
            },
            quality: QualityReport {
                score: result.quality_score,
                issues: issues(result, thresholds),
            },
            metadata: ReportMetadata {
                algorithm: result.method,
                path_source: result.path_source,
                processing_time_ms: (result.processing_time_ms * 10.0).round() / 10.0,
                image_size: result.image_size,
            },
        }
    }
}

/// Warnings a reviewer should see before trusting the signal.
pub fn issues(result: &ExtractionResult, thresholds: &IssueThresholds) -> Vec<String> {
    let mut out = Vec::new();
    if result.quality_score < thresholds.min_quality {
        out.push("Low confidence extraction - consider manual calibration".to_string());
    }
    if result.grid_spacing_px < thresholds.min_spacing_px {
        out.push("Grid detection uncertain - verify paper speed setting".to_string());
    }
    if result.range_uv < thresholds.min_range_uv {
        out.push("Low amplitude signal - check voltage scale or image quality".to_string());
    } else if result.range_uv > thresholds.max_range_uv {
        out.push("High amplitude - possible clipping or incorrect scale".to_string());
    }
    out
}
