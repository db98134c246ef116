use serde::Serialize;

use crate::aggregate::{WeekKey, WeeklyAggregate};
use crate::common::safe_div;

/// One week of aggregated billing plus the payer-mix and intensity ratios derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub original: WeeklyAggregate,
    pub bcbs_charges_pct: f64,
    pub aetna_charges_pct: f64,
    pub self_pay_charges_pct: f64,
    pub commercial_charges_pct: f64,
    pub charges_per_visit: f64,
    /// BCBS + Aetna share of charges.
    pub high_value_payer_pct: f64,
}

impl FeatureRow {
    pub fn from_aggregate(week: WeeklyAggregate) -> Self {
        let total = week.total_charge_amount;
        let bcbs_charges_pct = safe_div(week.bcbs.charges, total);
        let aetna_charges_pct = safe_div(week.aetna.charges, total);
        Self {
            bcbs_charges_pct,
            aetna_charges_pct,
            self_pay_charges_pct: safe_div(week.self_pay.charges, total),
            commercial_charges_pct: safe_div(week.commercial.charges, total),
            charges_per_visit: safe_div(total, week.total_visit_count),
            high_value_payer_pct: bcbs_charges_pct + aetna_charges_pct,
            original: week,
        }
    }

    pub fn key(&self) -> &WeekKey {
        &self.original.key
    }

    pub fn total_payments(&self) -> f64 {
        self.original.total_payments
    }
}

pub fn engineer_features(weeks: Vec<WeeklyAggregate>) -> Vec<FeatureRow> {
    weeks.into_iter().map(FeatureRow::from_aggregate).collect()
}

/// Features screened for correlation with weekly payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    TotalChargeAmount,
    TotalVisitCount,
    WeightedAvgCollectionPct,
    AvgPaymentPerVisit,
    BcbsChargesPct,
    AetnaChargesPct,
    HighValuePayerPct,
    ChargesPerVisit,
}

impl Feature {
    pub const CORRELATED: [Feature; 8] = [
        Feature::TotalChargeAmount,
        Feature::TotalVisitCount,
        Feature::WeightedAvgCollectionPct,
        Feature::AvgPaymentPerVisit,
        Feature::BcbsChargesPct,
        Feature::AetnaChargesPct,
        Feature::HighValuePayerPct,
        Feature::ChargesPerVisit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::TotalChargeAmount => "totalChargeAmount",
            Feature::TotalVisitCount => "totalVisitCount",
            Feature::WeightedAvgCollectionPct => "weightedAvgCollectionPct",
            Feature::AvgPaymentPerVisit => "avgPaymentPerVisit",
            Feature::BcbsChargesPct => "bcbsChargesPct",
            Feature::AetnaChargesPct => "aetnaChargesPct",
            Feature::HighValuePayerPct => "highValuePayerPct",
            Feature::ChargesPerVisit => "chargesPerVisit",
        }
    }

    pub fn value(self, row: &FeatureRow) -> f64 {
        match self {
            Feature::TotalChargeAmount => row.original.total_charge_amount,
            Feature::TotalVisitCount => row.original.total_visit_count,
            Feature::WeightedAvgCollectionPct => row.original.weighted_avg_collection_pct,
            Feature::AvgPaymentPerVisit => row.original.avg_payment_per_visit,
            Feature::BcbsChargesPct => row.bcbs_charges_pct,
            Feature::AetnaChargesPct => row.aetna_charges_pct,
            Feature::HighValuePayerPct => row.high_value_payer_pct,
            Feature::ChargesPerVisit => row.charges_per_visit,
        }
    }
}
