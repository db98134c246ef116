use serde::Serialize;

use crate::common::{mean, safe_div};
use crate::features::FeatureRow;
use crate::models::{FittedModel, ModelKind};

/// Accuracy of one model on the held-out weeks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub model_name: String,
    pub model: ModelKind,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent. Weeks with no payments contribute 0.
    pub mape: f64,
    pub r_squared: f64,
    /// Mean of `actual - predicted`; positive means the model under-forecasts.
    pub bias: f64,
    pub predictions: Vec<f64>,
}

pub fn evaluate_model(model: &FittedModel, test: &[FeatureRow]) -> EvaluationResult {
    let actual: Vec<f64> = test.iter().map(FeatureRow::total_payments).collect();
    let predictions: Vec<f64> = test.iter().map(|week| model.predict(week)).collect();
    let errors: Vec<f64> = actual
        .iter()
        .zip(&predictions)
        .map(|(a, p)| a - p)
        .collect();

    let mae = mean(errors.iter().map(|e| e.abs()));
    let rmse = mean(errors.iter().map(|e| e * e)).sqrt();
    let mape = mean(
        errors
            .iter()
            .zip(&actual)
            .map(|(e, a)| safe_div(e.abs(), *a) * 100.0),
    );
    let actual_mean = mean(actual.iter().copied());
    let ss_res: f64 = errors.iter().map(|e| e * e).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0)
    } else {
        0.0
    };
    let bias = mean(errors.iter().copied());

    tracing::debug!(
        "{}: mae={:.2} rmse={:.2} mape={:.2}% r2={:.4} bias={:.2}",
        model.name(),
        mae,
        rmse,
        mape,
        r_squared,
        bias
    );

    EvaluationResult {
        model_name: model.name().to_string(),
        model: model.kind,
        mae,
        rmse,
        mape,
        r_squared,
        bias,
        predictions,
    }
}

pub fn evaluate_models(models: &[FittedModel], test: &[FeatureRow]) -> Vec<EvaluationResult> {
    models.iter().map(|m| evaluate_model(m, test)).collect()
}

/// Index of the winning evaluation.
///
/// Lowest MAE wins, except that any model within `tie_break_mae` dollars of the
/// lowest MAE is compared on R² instead; remaining ties go to the lower MAE and
/// then to the earlier model.
pub fn select_best(results: &[EvaluationResult], tie_break_mae: f64) -> Option<usize> {
    let best_mae = results
        .iter()
        .map(|r| r.mae)
        .min_by(|a, b| a.total_cmp(b))?;
    results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.mae - best_mae <= tie_break_mae)
        .reduce(|best, candidate| {
            let better = candidate.1.r_squared > best.1.r_squared
                || (candidate.1.r_squared == best.1.r_squared && candidate.1.mae < best.1.mae);
            if better { candidate } else { best }
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{PayerTotals, WeekKey, WeeklyAggregate};
    use crate::config::PayerMultipliers;
    use crate::models::TrainStats;
    use approx::assert_relative_eq;

    fn result(model: ModelKind, mae: f64, r_squared: f64) -> EvaluationResult {
        EvaluationResult {
            model_name: model.name().to_string(),
            model,
            mae,
            rmse: mae,
            mape: 0.0,
            r_squared,
            bias: 0.0,
            predictions: Vec::new(),
        }
    }

    /// A week whose Business Logic forecast at a 100% collection rate is `charges`.
    fn week(charges: f64, payments: f64) -> FeatureRow {
        FeatureRow::from_aggregate(WeeklyAggregate {
            key: WeekKey::new("2024", "W01"),
            total_payments: payments,
            total_charge_amount: charges,
            total_visit_count: 0.0,
            total_visits_with_lab_count: 0.0,
            weighted_avg_collection_pct: 1.0,
            avg_payment_per_visit: 0.0,
            bcbs: PayerTotals::default(),
            aetna: PayerTotals::default(),
            self_pay: PayerTotals::default(),
            commercial: PayerTotals::default(),
            detail_records: Vec::new(),
        })
    }

    fn full_collection() -> FittedModel {
        FittedModel {
            kind: ModelKind::BusinessLogic,
            stats: TrainStats {
                avg_collection_rate: 1.0,
                avg_payment_per_visit: 0.0,
            },
            multipliers: PayerMultipliers::default(),
        }
    }

    #[test]
    fn metrics_match_hand_computed_values() {
        // Errors (actual - predicted) are -10, +10 and -20.
        let test = [week(110.0, 100.0), week(-10.0, 0.0), week(220.0, 200.0)];
        let eval = evaluate_model(&full_collection(), &test);

        assert_eq!(eval.model, ModelKind::BusinessLogic);
        assert_eq!(eval.predictions, vec![110.0, -10.0, 220.0]);
        assert_relative_eq!(eval.mae, 40.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(eval.rmse, 200.0f64.sqrt(), epsilon = 1e-9);
        // The week with nothing paid contributes 0 rather than dividing by zero.
        assert_relative_eq!(eval.mape, 20.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(eval.bias, -20.0 / 3.0, epsilon = 1e-9);
        // ss_res = 600, ss_tot = 20_000.
        assert_relative_eq!(eval.r_squared, 0.97, epsilon = 1e-9);
    }

    #[test]
    fn r_squared_is_floored_for_fits_worse_than_the_mean() {
        let test = [week(300.0, 100.0), week(0.0, 200.0)];
        let eval = evaluate_model(&full_collection(), &test);
        assert_eq!(eval.r_squared, 0.0);
        assert_relative_eq!(eval.mae, 200.0, epsilon = 1e-9);
    }

    #[test]
    fn r_squared_is_zero_without_variance_in_actuals() {
        let test = [week(90.0, 100.0), week(110.0, 100.0)];
        let eval = evaluate_model(&full_collection(), &test);
        assert_eq!(eval.r_squared, 0.0);
        assert_relative_eq!(eval.bias, 0.0, epsilon = 1e-9);
        assert_relative_eq!(eval.mape, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn lowest_mae_wins_outside_tie_band() {
        let results = vec![
            result(ModelKind::BusinessLogic, 900.0, 0.9),
            result(ModelKind::VisitBased, 500.0, 0.2),
            result(ModelKind::MultiFactor, 1200.0, 0.95),
        ];
        assert_eq!(select_best(&results, 100.0), Some(1));
    }

    #[test]
    fn near_ties_prefer_higher_r_squared() {
        let results = vec![
            result(ModelKind::BusinessLogic, 550.0, 0.8),
            result(ModelKind::VisitBased, 500.0, 0.2),
            result(ModelKind::PayerWeighted, 590.0, 0.7),
        ];
        assert_eq!(select_best(&results, 100.0), Some(0));
    }

    #[test]
    fn empty_results_have_no_winner() {
        assert_eq!(select_best(&[], 100.0), None);
    }
}
