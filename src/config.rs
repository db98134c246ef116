use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::constants::{
    DEFAULT_ADJUSTMENT_FLOOR, DEFAULT_AETNA_MULTIPLIER, DEFAULT_BCBS_MULTIPLIER,
    DEFAULT_CLASSIFICATION_THRESHOLD, DEFAULT_MIN_WEEKS, DEFAULT_OTHER_MULTIPLIER,
    DEFAULT_SKEW_WARNING_RATIO, DEFAULT_TEST_SIZE, DEFAULT_TIE_BREAK_MAE,
};
use crate::error::{ForecastError, Result};

/// Revenue multipliers applied by the payer-weighted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayerMultipliers {
    pub bcbs: f64,
    pub aetna: f64,
    pub other: f64,
    /// Lower bound on the combined adjustment factor.
    pub floor: f64,
}

impl Default for PayerMultipliers {
    fn default() -> Self {
        Self {
            bcbs: DEFAULT_BCBS_MULTIPLIER,
            aetna: DEFAULT_AETNA_MULTIPLIER,
            other: DEFAULT_OTHER_MULTIPLIER,
            floor: DEFAULT_ADJUSTMENT_FLOOR,
        }
    }
}

/// Tunables for a single pipeline run.
///
/// Every field has a default, so a JSON config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fraction of weeks (taken from the end of the timeline) held out for testing.
    pub test_size: f64,
    /// Relative deviation beyond which a week is over/under performing.
    pub classification_threshold: f64,
    pub min_weeks: usize,
    /// Share of weeks in one category above which the fit is flagged as degenerate.
    pub skew_warning_ratio: f64,
    /// Models whose test MAE is within this many dollars of the best are compared on R².
    pub tie_break_mae: f64,
    pub payer_multipliers: PayerMultipliers,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            classification_threshold: DEFAULT_CLASSIFICATION_THRESHOLD,
            min_weeks: DEFAULT_MIN_WEEKS,
            skew_warning_ratio: DEFAULT_SKEW_WARNING_RATIO,
            tie_break_mae: DEFAULT_TIE_BREAK_MAE,
            payer_multipliers: PayerMultipliers::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ForecastError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ForecastError::Config(format!(
                "test_size must be between 0 and 1 (exclusive), got {}",
                self.test_size
            )));
        }
        if !self.classification_threshold.is_finite() || self.classification_threshold < 0.0 {
            return Err(ForecastError::Config(format!(
                "classification_threshold must be a non-negative number, got {}",
                self.classification_threshold
            )));
        }
        if self.min_weeks < 2 {
            return Err(ForecastError::Config(format!(
                "min_weeks must be at least 2, got {}",
                self.min_weeks
            )));
        }
        if !(self.skew_warning_ratio > 0.0 && self.skew_warning_ratio <= 1.0) {
            return Err(ForecastError::Config(format!(
                "skew_warning_ratio must be in (0, 1], got {}",
                self.skew_warning_ratio
            )));
        }
        if !self.tie_break_mae.is_finite() || self.tie_break_mae < 0.0 {
            return Err(ForecastError::Config(format!(
                "tie_break_mae must be a non-negative number, got {}",
                self.tie_break_mae
            )));
        }
        let m = &self.payer_multipliers;
        if [m.bcbs, m.aetna, m.other, m.floor]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ForecastError::Config(
                "payer multipliers must be non-negative numbers".to_string(),
            ));
        }
        Ok(())
    }
}
