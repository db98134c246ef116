use serde::Serialize;

use crate::common::safe_div;
use crate::features::FeatureRow;
use crate::models::FittedModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Diagnostic {
    #[serde(rename = "Over Performed")]
    Over,
    #[serde(rename = "Average Performance")]
    Average,
    #[serde(rename = "Under Performed")]
    Under,
}

impl Diagnostic {
    /// Classifies a relative deviation `(predicted - actual) / actual`.
    pub fn from_percent_error(percent_error: f64, threshold: f64) -> Self {
        if percent_error < -threshold {
            Diagnostic::Under
        } else if percent_error > threshold {
            Diagnostic::Over
        } else {
            Diagnostic::Average
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Diagnostic::Over => "Over Performed",
            Diagnostic::Average => "Average Performance",
            Diagnostic::Under => "Under Performed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRecord {
    pub week_key: String,
    pub year: String,
    pub week: String,
    pub actual_payments: f64,
    pub predicted_payments: f64,
    pub absolute_error: f64,
    /// `(predicted - actual) / actual` as a ratio; 0 when nothing was paid.
    pub percent_error: f64,
    pub diagnostic: Diagnostic,
}

impl PerformanceRecord {
    pub fn new(week: &FeatureRow, predicted: f64, threshold: f64) -> Self {
        let actual = week.total_payments();
        let percent_error = safe_div(predicted - actual, actual);
        Self {
            week_key: week.key().to_string(),
            year: week.key().year.clone(),
            week: week.key().week.clone(),
            actual_payments: actual,
            predicted_payments: predicted,
            absolute_error: (predicted - actual).abs(),
            percent_error,
            diagnostic: Diagnostic::from_percent_error(percent_error, threshold),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceDistribution {
    pub over: usize,
    pub average: usize,
    pub under: usize,
}

impl PerformanceDistribution {
    pub fn from_records(records: &[PerformanceRecord]) -> Self {
        let mut dist = Self::default();
        for record in records {
            match record.diagnostic {
                Diagnostic::Over => dist.over += 1,
                Diagnostic::Average => dist.average += 1,
                Diagnostic::Under => dist.under += 1,
            }
        }
        dist
    }

    pub fn total(&self) -> usize {
        self.over + self.average + self.under
    }

    /// The category holding more than `ratio` of all weeks, if any.
    pub fn dominant(&self, ratio: f64) -> Option<Diagnostic> {
        let total = self.total() as f64;
        [
            (Diagnostic::Over, self.over),
            (Diagnostic::Average, self.average),
            (Diagnostic::Under, self.under),
        ]
        .into_iter()
        .find(|(_, count)| total > 0.0 && *count as f64 / total > ratio)
        .map(|(diagnostic, _)| diagnostic)
    }
}

/// Applies the winning model to every week, training and test alike.
pub fn classify_weeks(
    model: &FittedModel,
    weeks: &[FeatureRow],
    threshold: f64,
    skew_warning_ratio: f64,
) -> (Vec<PerformanceRecord>, PerformanceDistribution) {
    let records: Vec<PerformanceRecord> = weeks
        .iter()
        .map(|week| PerformanceRecord::new(week, model.predict(week), threshold))
        .collect();
    let distribution = PerformanceDistribution::from_records(&records);

    tracing::info!(
        "Classified {} weeks with {}: over={} average={} under={}",
        records.len(),
        model.name(),
        distribution.over,
        distribution.average,
        distribution.under
    );
    if let Some(dominant) = distribution.dominant(skew_warning_ratio) {
        tracing::warn!(
            "More than {:.0}% of weeks are \"{}\"; the {} fit may be degenerate",
            skew_warning_ratio * 100.0,
            dominant.label(),
            model.name()
        );
    }

    (records, distribution)
}
