//! Narrative explanations for each week's diagnostic.
//!
//! Every week's per-payer metrics are compared against that payer's average
//! over the whole upload. The comparisons are ranked by percent difference and
//! the extremes become the "what went well" / "what could be improved" bullets;
//! BCBS and Aetna always get their own commentary.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::classify::{Diagnostic, PerformanceRecord};
use crate::common::{fmt_count, fmt_currency, fmt_pct, mean, safe_div};
use crate::constants::{PAYER_AETNA, PAYER_BCBS};
use crate::extract::{BillingRecord, RecordField, ValueKind};
use crate::features::FeatureRow;

const BULLETS_PER_SECTION: usize = 2;
const WENT_WELL_FALLBACK: &str = "Payments did not exceed the forecast this week";
const IMPROVE_FALLBACK: &str = "No shortfall against the forecast this week";
const BCBS_ABSENT: &str = "No BCBS activity this week; potential growth opportunity";
const AETNA_ABSENT: &str = "No Aetna activity this week; potential partnership opportunity";

/// The exported, display-ready row for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyInsight {
    pub week_key: String,
    pub year: String,
    pub week: String,
    pub actual_payments: String,
    pub predicted_payments: String,
    pub absolute_error: String,
    pub percent_error: String,
    pub diagnostic: String,
    pub what_went_well: String,
    pub what_could_be_improved: String,
    pub bcbs_analysis: String,
    pub aetna_analysis: String,
}

/// One `(payer, metric)` comparison for a week.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub payer: String,
    pub field: RecordField,
    pub current: f64,
    pub average: f64,
    /// `(current - average) / average * 100`; 0 when the average is 0.
    pub pct_diff: f64,
}

impl Observation {
    fn sentence(&self) -> String {
        format!(
            "{} {} was {} against a {} average ({:+.1}%)",
            payer_display(&self.payer),
            self.field.label(),
            format_value(self.field, self.current),
            format_value(self.field, self.average),
            self.pct_diff
        )
    }
}

/// "2-BCBS" -> "BCBS".
pub fn payer_display(code: &str) -> &str {
    let stripped = code
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches('-')
        .trim();
    if stripped.is_empty() { code } else { stripped }
}

fn format_value(field: RecordField, value: f64) -> String {
    match field.kind() {
        ValueKind::Currency => fmt_currency(value),
        ValueKind::Percent => fmt_pct(value),
        ValueKind::Count => fmt_count(value),
        ValueKind::Weight => format!("{value:.2}"),
    }
}

fn per_payer_means<'a>(
    records: impl Iterator<Item = &'a BillingRecord>,
) -> BTreeMap<(String, RecordField), f64> {
    let mut grouped: BTreeMap<&str, Vec<&BillingRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.payer.as_str()).or_default().push(record);
    }
    let mut means = BTreeMap::new();
    for (payer, records) in grouped {
        for field in RecordField::ALL {
            let value = mean(records.iter().map(|r| field.value(r)));
            means.insert((payer.to_string(), field), value);
        }
    }
    means
}

fn join_sentences<'a>(observations: impl Iterator<Item = &'a Observation>) -> String {
    observations
        .map(Observation::sentence)
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct InsightGenerator {
    baseline: BTreeMap<(String, RecordField), f64>,
}

impl InsightGenerator {
    /// Builds per-payer averages from the detail records of every week.
    pub fn new(weeks: &[FeatureRow]) -> Self {
        let baseline = per_payer_means(weeks.iter().flat_map(|w| w.original.detail_records.iter()));
        Self { baseline }
    }

    /// All comparisons for a week, ranked by percent difference, highest first.
    pub fn ranked_observations(&self, week: &FeatureRow) -> Vec<Observation> {
        let current = per_payer_means(week.original.detail_records.iter());
        let mut observations: Vec<Observation> = current
            .into_iter()
            .map(|((payer, field), value)| {
                let average = self
                    .baseline
                    .get(&(payer.clone(), field))
                    .copied()
                    .unwrap_or_default();
                Observation {
                    pct_diff: safe_div(value - average, average) * 100.0,
                    payer,
                    field,
                    current: value,
                    average,
                }
            })
            .collect();
        observations.sort_by(|a, b| b.pct_diff.total_cmp(&a.pct_diff));
        observations
    }

    fn payer_analysis(observations: &[Observation], payer: &str, absent: &str) -> String {
        let mut matching: Vec<&Observation> =
            observations.iter().filter(|o| o.payer == payer).collect();
        if matching.iter().all(|o| o.current == 0.0) {
            return absent.to_string();
        }
        matching.sort_by(|a, b| b.pct_diff.abs().total_cmp(&a.pct_diff.abs()));
        join_sentences(matching.into_iter().take(BULLETS_PER_SECTION))
    }

    pub fn insight_for(&self, week: &FeatureRow, performance: &PerformanceRecord) -> WeeklyInsight {
        let observations = self.ranked_observations(week);

        let what_went_well =
            if performance.diagnostic == Diagnostic::Over && !observations.is_empty() {
                join_sentences(observations.iter().take(BULLETS_PER_SECTION))
            } else {
                WENT_WELL_FALLBACK.to_string()
            };
        let what_could_be_improved =
            if performance.diagnostic == Diagnostic::Under && !observations.is_empty() {
                join_sentences(observations.iter().rev().take(BULLETS_PER_SECTION))
            } else {
                IMPROVE_FALLBACK.to_string()
            };

        WeeklyInsight {
            week_key: performance.week_key.clone(),
            year: performance.year.clone(),
            week: performance.week.clone(),
            actual_payments: fmt_currency(performance.actual_payments),
            predicted_payments: fmt_currency(performance.predicted_payments),
            absolute_error: fmt_currency(performance.absolute_error),
            percent_error: fmt_pct(performance.percent_error),
            diagnostic: performance.diagnostic.label().to_string(),
            what_went_well,
            what_could_be_improved,
            bcbs_analysis: Self::payer_analysis(&observations, PAYER_BCBS, BCBS_ABSENT),
            aetna_analysis: Self::payer_analysis(&observations, PAYER_AETNA, AETNA_ABSENT),
        }
    }
}

/// Pairs each week with its performance record and renders the narrative rows.
pub fn generate_insights(
    weeks: &[FeatureRow],
    performance: &[PerformanceRecord],
) -> Vec<WeeklyInsight> {
    let generator = InsightGenerator::new(weeks);
    weeks
        .iter()
        .zip(performance)
        .map(|(week, record)| generator.insight_for(week, record))
        .collect()
}
