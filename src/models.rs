//! The bank of revenue models.
//!
//! Each model is a fixed revenue-cycle heuristic, not a learned regression: the
//! only thing "fit" on the training weeks is a pair of averages ([`TrainStats`]).
//! A [`FittedModel`] carries those averages with it, so the model that wins
//! evaluation can be re-applied to any week without re-deriving anything.

use serde::Serialize;

use crate::common::mean;
use crate::config::PayerMultipliers;
use crate::features::FeatureRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    BusinessLogic,
    VisitBased,
    MultiFactor,
    PayerWeighted,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::BusinessLogic,
        ModelKind::VisitBased,
        ModelKind::MultiFactor,
        ModelKind::PayerWeighted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::BusinessLogic => "Business Logic",
            ModelKind::VisitBased => "Visit-Based",
            ModelKind::MultiFactor => "Multi-Factor",
            ModelKind::PayerWeighted => "Payer-Weighted",
        }
    }
}

/// Averages captured from the training weeks at fit time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrainStats {
    /// Mean of the weekly charge-weighted collection rates.
    pub avg_collection_rate: f64,
    /// Mean of the weekly payment-per-visit values.
    pub avg_payment_per_visit: f64,
}

impl TrainStats {
    pub fn from_train(train: &[FeatureRow]) -> Self {
        Self {
            avg_collection_rate: mean(train.iter().map(|w| w.original.weighted_avg_collection_pct)),
            avg_payment_per_visit: mean(train.iter().map(|w| w.original.avg_payment_per_visit)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub stats: TrainStats,
    #[serde(skip)]
    pub multipliers: PayerMultipliers,
}

impl FittedModel {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn predict(&self, week: &FeatureRow) -> f64 {
        let charges = week.original.total_charge_amount;
        let visits = week.original.total_visit_count;
        let visit_revenue = visits * self.stats.avg_payment_per_visit;
        match self.kind {
            ModelKind::BusinessLogic => charges * self.stats.avg_collection_rate,
            ModelKind::VisitBased => visit_revenue,
            // The charge term uses the week's own collection rate, not the training average.
            ModelKind::MultiFactor => {
                0.6 * charges * week.original.weighted_avg_collection_pct + 0.4 * visit_revenue
            }
            ModelKind::PayerWeighted => {
                let m = &self.multipliers;
                let other_pct = 1.0 - week.bcbs_charges_pct - week.aetna_charges_pct;
                let adjustment = week.bcbs_charges_pct * m.bcbs
                    + week.aetna_charges_pct * m.aetna
                    + other_pct * m.other;
                visit_revenue * adjustment.max(m.floor)
            }
        }
    }
}

/// Fits every model in the bank on the training weeks, in [`ModelKind::ALL`] order.
pub fn fit_models(train: &[FeatureRow], multipliers: PayerMultipliers) -> Vec<FittedModel> {
    let stats = TrainStats::from_train(train);
    tracing::debug!(
        "Training stats: avg_collection_rate={:.4} avg_payment_per_visit={:.2}",
        stats.avg_collection_rate,
        stats.avg_payment_per_visit
    );
    ModelKind::ALL
        .iter()
        .map(|&kind| FittedModel {
            kind,
            stats,
            multipliers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{PayerTotals, WeekKey, WeeklyAggregate};

    fn row(charges: f64, visits: f64, collection: f64, bcbs: f64, aetna: f64) -> FeatureRow {
        FeatureRow::from_aggregate(WeeklyAggregate {
            key: WeekKey::new("2024", "W01"),
            total_payments: charges * collection,
            total_charge_amount: charges,
            total_visit_count: visits,
            total_visits_with_lab_count: 0.0,
            weighted_avg_collection_pct: collection,
            avg_payment_per_visit: charges * collection / visits,
            bcbs: PayerTotals {
                charges: charges * bcbs,
                ..PayerTotals::default()
            },
            aetna: PayerTotals {
                charges: charges * aetna,
                ..PayerTotals::default()
            },
            self_pay: PayerTotals::default(),
            commercial: PayerTotals::default(),
            detail_records: Vec::new(),
        })
    }

    fn model(kind: ModelKind) -> FittedModel {
        FittedModel {
            kind,
            stats: TrainStats {
                avg_collection_rate: 0.5,
                avg_payment_per_visit: 40.0,
            },
            multipliers: PayerMultipliers::default(),
        }
    }

    #[test]
    fn formulas() {
        let week = row(1000.0, 10.0, 0.8, 0.0, 0.0);
        assert_eq!(model(ModelKind::BusinessLogic).predict(&week), 500.0);
        assert_eq!(model(ModelKind::VisitBased).predict(&week), 400.0);
        // 0.6 * 1000 * 0.8 + 0.4 * 10 * 40
        assert!((model(ModelKind::MultiFactor).predict(&week) - 640.0).abs() < 1e-9);
        // no BCBS/Aetna: 400 * 0.95
        assert!((model(ModelKind::PayerWeighted).predict(&week) - 380.0).abs() < 1e-9);
    }

    #[test]
    fn payer_weighting_rewards_high_value_mix() {
        let week = row(1000.0, 10.0, 0.8, 0.5, 0.5);
        // 0.5 * 1.25 + 0.5 * 1.20 + 0 * 0.95 = 1.225
        assert!((model(ModelKind::PayerWeighted).predict(&week) - 490.0).abs() < 1e-9);
    }

    #[test]
    fn payer_adjustment_is_floored() {
        let mut fitted = model(ModelKind::PayerWeighted);
        fitted.multipliers = PayerMultipliers {
            bcbs: 0.1,
            aetna: 0.1,
            other: 0.1,
            floor: 0.5,
        };
        let week = row(1000.0, 10.0, 0.8, 0.3, 0.3);
        assert!((fitted.predict(&week) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn train_stats_average_weekly_values() {
        let train = vec![row(1000.0, 10.0, 0.8, 0.0, 0.0), row(2000.0, 10.0, 0.6, 0.0, 0.0)];
        let stats = TrainStats::from_train(&train);
        assert!((stats.avg_collection_rate - 0.7).abs() < 1e-12);
        // (80 + 120) / 2
        assert!((stats.avg_payment_per_visit - 100.0).abs() < 1e-9);
        let models = fit_models(&train, PayerMultipliers::default());
        assert_eq!(models.len(), 4);
        assert_eq!(models[0].name(), "Business Logic");
    }
}
