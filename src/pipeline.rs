//! End-to-end analysis: raw cells in, forecast diagnostics and narratives out.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::aggregate_weekly;
use crate::cells::Cell;
use crate::classify::{PerformanceDistribution, PerformanceRecord, classify_weeks};
use crate::common::mean;
use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::evaluate::{EvaluationResult, evaluate_models, select_best};
use crate::extract::{ExtractionSummary, extract_records};
use crate::features::engineer_features;
use crate::insights::{WeeklyInsight, generate_insights};
use crate::models::fit_models;
use crate::split::split_train_test;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Benchmarks {
    pub total_weeks: usize,
    /// Mean of `100 - |percent error| * 100` across all weeks, floored at 0 per week.
    pub avg_accuracy: f64,
    pub model_mae: f64,
}

impl Benchmarks {
    fn new(performance: &[PerformanceRecord], best: &EvaluationResult) -> Self {
        Self {
            total_weeks: performance.len(),
            avg_accuracy: mean(
                performance
                    .iter()
                    .map(|p| (100.0 - p.percent_error.abs() * 100.0).max(0.0)),
            ),
            model_mae: best.mae,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub best_model: EvaluationResult,
    pub evaluations: Vec<EvaluationResult>,
    pub train_correlations: BTreeMap<String, f64>,
    pub performance_results: Vec<PerformanceRecord>,
    pub final_results: Vec<WeeklyInsight>,
    pub benchmarks: Benchmarks,
    pub distribution: PerformanceDistribution,
    pub extraction: ExtractionSummary,
}

pub fn run_pipeline(rows: &[Vec<Cell>], config: &PipelineConfig) -> Result<AnalysisResult> {
    config.validate()?;

    let extraction = extract_records(rows)?;
    if extraction.records.is_empty() {
        return Err(ForecastError::data_format(
            "file contains no usable weekly records",
        ));
    }
    let summary = extraction.summary;

    let weeks = aggregate_weekly(extraction.records);
    if weeks.len() < config.min_weeks {
        return Err(ForecastError::InsufficientData {
            weeks: weeks.len(),
            required: config.min_weeks,
        });
    }

    let features = engineer_features(weeks);
    let split = split_train_test(&features, config.test_size);
    let models = fit_models(split.train, config.payer_multipliers);
    let evaluations = evaluate_models(&models, split.test);
    let best_idx = select_best(&evaluations, config.tie_break_mae).ok_or_else(|| {
        ForecastError::InsufficientData {
            weeks: features.len(),
            required: config.min_weeks,
        }
    })?;
    let best_model = evaluations[best_idx].clone();
    let winner = &models[best_idx];
    tracing::info!(
        "Selected {} (test MAE {:.2}, R² {:.4})",
        best_model.model_name,
        best_model.mae,
        best_model.r_squared
    );

    let (performance_results, distribution) = classify_weeks(
        winner,
        &features,
        config.classification_threshold,
        config.skew_warning_ratio,
    );
    let final_results = generate_insights(&features, &performance_results);
    let benchmarks = Benchmarks::new(&performance_results, &best_model);

    Ok(AnalysisResult {
        best_model,
        evaluations,
        train_correlations: split.train_correlations,
        performance_results,
        final_results,
        benchmarks,
        distribution,
        extraction: summary,
    })
}
