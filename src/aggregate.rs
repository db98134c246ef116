//! Weekly aggregation of billing records.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::common::{mean, safe_div};
use crate::constants::{PAYER_AETNA, PAYER_BCBS, PAYER_COMMERCIAL, PAYER_SELF_PAY};
use crate::extract::BillingRecord;

/// `(year, week)` bucket identifier with chronological ordering.
///
/// Labels are compared by their numeric content first so that `"W2"` sorts
/// before `"W10"`; the raw labels only break ties between labels with equal
/// numbers (or none at all).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WeekKey {
    pub year: String,
    pub week: String,
}

fn digit_runs(label: &str) -> Vec<u64> {
    label
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse().ok())
        .collect()
}

impl WeekKey {
    pub fn new(year: impl Into<String>, week: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            week: week.into(),
        }
    }

    fn year_ordinal(&self) -> Option<u64> {
        digit_runs(&self.year).first().copied()
    }

    // Last run, so "2024-W05" orders by 5 rather than by the embedded year.
    fn week_ordinal(&self) -> Option<u64> {
        digit_runs(&self.week).last().copied()
    }
}

impl Ord for WeekKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year_ordinal()
            .cmp(&other.year_ordinal())
            .then_with(|| self.week_ordinal().cmp(&other.week_ordinal()))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.week.cmp(&other.week))
    }
}

impl PartialOrd for WeekKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.week)
    }
}

/// Sub-totals for one payer within a week. Zero when the payer had no records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PayerTotals {
    pub charges: f64,
    pub visits: f64,
    pub payments: f64,
    pub collection_rate: f64,
    pub record_count: usize,
}

impl PayerTotals {
    fn from_records<'a>(records: impl Iterator<Item = &'a BillingRecord>) -> Self {
        let mut totals = PayerTotals::default();
        let mut rates = Vec::new();
        for record in records {
            totals.charges += record.charge_amount;
            totals.visits += record.visit_count;
            totals.payments += record.total_payments;
            totals.record_count += 1;
            rates.push(record.collection_pct);
        }
        totals.collection_rate = mean(rates);
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyAggregate {
    pub key: WeekKey,
    pub total_payments: f64,
    pub total_charge_amount: f64,
    pub total_visit_count: f64,
    pub total_visits_with_lab_count: f64,
    /// Charge-weighted mean of the records' collection rates.
    pub weighted_avg_collection_pct: f64,
    pub avg_payment_per_visit: f64,
    pub bcbs: PayerTotals,
    pub aetna: PayerTotals,
    pub self_pay: PayerTotals,
    pub commercial: PayerTotals,
    #[serde(skip)]
    pub detail_records: Vec<BillingRecord>,
}

impl WeeklyAggregate {
    pub fn from_records(key: WeekKey, records: Vec<BillingRecord>) -> Self {
        let mut total_payments = 0.0;
        let mut total_charge_amount = 0.0;
        let mut total_visit_count = 0.0;
        let mut total_visits_with_lab_count = 0.0;
        let mut weighted_collection = 0.0;
        for record in &records {
            total_payments += record.total_payments;
            total_charge_amount += record.charge_amount;
            total_visit_count += record.visit_count;
            total_visits_with_lab_count += record.visits_with_lab_count;
            weighted_collection += record.collection_pct * record.charge_amount;
        }

        let payer =
            |code: &str| PayerTotals::from_records(records.iter().filter(|r| r.payer == code));
        let bcbs = payer(PAYER_BCBS);
        let aetna = payer(PAYER_AETNA);
        let self_pay = payer(PAYER_SELF_PAY);
        let commercial = payer(PAYER_COMMERCIAL);

        Self {
            key,
            total_payments,
            total_charge_amount,
            total_visit_count,
            total_visits_with_lab_count,
            weighted_avg_collection_pct: safe_div(weighted_collection, total_charge_amount),
            avg_payment_per_visit: safe_div(total_payments, total_visit_count),
            bcbs,
            aetna,
            self_pay,
            commercial,
            detail_records: records,
        }
    }
}

/// Groups records by week and returns one aggregate per week in chronological order.
pub fn aggregate_weekly(records: Vec<BillingRecord>) -> Vec<WeeklyAggregate> {
    let mut groups: BTreeMap<WeekKey, Vec<BillingRecord>> = BTreeMap::new();
    for record in records {
        let key = WeekKey::new(record.year.clone(), record.week.clone());
        groups.entry(key).or_default().push(record);
    }

    let weeks: Vec<WeeklyAggregate> = groups
        .into_iter()
        .map(|(key, records)| WeeklyAggregate::from_records(key, records))
        .collect();
    tracing::info!("Aggregated records into {} weeks", weeks.len());
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: &str, week: &str, payer: &str, charge: f64, payments: f64) -> BillingRecord {
        BillingRecord {
            year: year.to_string(),
            week: week.to_string(),
            payer: payer.to_string(),
            em_group: "99213".to_string(),
            payments_pct_of_total: 0.0,
            avg_payment: 0.0,
            avg_em_weight: 0.0,
            charge_amount: charge,
            collection_pct: safe_div(payments, charge),
            total_payments: payments,
            visit_count: 4.0,
            visits_with_lab_count: 1.0,
            pct_visits_with_labs: 0.25,
            payment_per_visit: payments / 4.0,
        }
    }

    #[test]
    fn sums_records_sharing_a_week() {
        let weeks = aggregate_weekly(vec![
            record("2024", "W01", PAYER_BCBS, 200.0, 100.0),
            record("2024", "W01", PAYER_AETNA, 300.0, 150.0),
        ]);
        assert_eq!(weeks.len(), 1);
        let week = &weeks[0];
        assert_eq!(week.total_payments, 250.0);
        assert_eq!(week.total_charge_amount, 500.0);
        assert_eq!(week.total_visit_count, 8.0);
        assert_eq!(week.bcbs.charges, 200.0);
        assert_eq!(week.aetna.payments, 150.0);
        assert_eq!(week.self_pay, PayerTotals::default());
        assert_eq!(week.detail_records.len(), 2);
    }

    #[test]
    fn collection_rate_is_charge_weighted() {
        let mut low = record("2024", "W01", "9-OTHER", 100.0, 10.0);
        low.collection_pct = 0.1;
        let mut high = record("2024", "W01", "9-OTHER", 300.0, 270.0);
        high.collection_pct = 0.9;
        let week = WeeklyAggregate::from_records(WeekKey::new("2024", "W01"), vec![low, high]);
        // (0.1 * 100 + 0.9 * 300) / 400
        assert!((week.weighted_avg_collection_pct - 0.7).abs() < 1e-12);
    }

    #[test]
    fn zero_visits_and_charges_do_not_divide() {
        let mut empty = record("2024", "W01", PAYER_BCBS, 0.0, 0.0);
        empty.visit_count = 0.0;
        let week = WeeklyAggregate::from_records(WeekKey::new("2024", "W01"), vec![empty]);
        assert_eq!(week.avg_payment_per_visit, 0.0);
        assert_eq!(week.weighted_avg_collection_pct, 0.0);
    }

    #[test]
    fn weeks_sort_numerically() {
        let weeks = aggregate_weekly(vec![
            record("2024", "W10", PAYER_BCBS, 1.0, 1.0),
            record("2023", "W52", PAYER_BCBS, 1.0, 1.0),
            record("2024", "W2", PAYER_BCBS, 1.0, 1.0),
        ]);
        let order: Vec<String> = weeks.iter().map(|w| w.key.to_string()).collect();
        assert_eq!(order, vec!["2023-W52", "2024-W2", "2024-W10"]);
    }

    #[test]
    fn iso_style_week_labels_use_trailing_number() {
        assert!(WeekKey::new("2024", "2024-W05") < WeekKey::new("2024", "2024-W11"));
    }
}
