use anyhow::{Context, Result};
use csv::Writer;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::common::{ensure_parent_dir, tmp_path_for, write_atomic};
use crate::constants::{ANALYSIS_JSON_FILE, INSIGHTS_CSV_FILE, MODEL_COMPARISON_CSV_FILE};
use crate::evaluate::EvaluationResult;
use crate::insights::WeeklyInsight;
use crate::pipeline::AnalysisResult;

fn finish_csv(mut writer: Writer<fs::File>, tmp_path: &Path, output_path: &Path) -> Result<()> {
    writer
        .flush()
        .with_context(|| format!("Failed flushing {}", tmp_path.display()))?;
    drop(writer);
    fs::rename(tmp_path, output_path).with_context(|| {
        format!(
            "Failed moving {} to {}",
            tmp_path.display(),
            output_path.display()
        )
    })?;
    Ok(())
}

pub fn write_insights_csv(output_path: &Path, insights: &[WeeklyInsight]) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let tmp_path = tmp_path_for(output_path);
    let mut writer = Writer::from_path(&tmp_path)
        .with_context(|| format!("Failed creating insights CSV {}", tmp_path.display()))?;
    writer
        .write_record([
            "week_key",
            "year",
            "week",
            "actual_payments",
            "predicted_payments",
            "absolute_error",
            "percent_error",
            "diagnostic",
            "what_went_well",
            "what_could_be_improved",
            "bcbs_analysis",
            "aetna_analysis",
        ])
        .context("Failed writing insights header")?;

    for row in insights {
        writer
            .write_record([
                row.week_key.as_str(),
                row.year.as_str(),
                row.week.as_str(),
                row.actual_payments.as_str(),
                row.predicted_payments.as_str(),
                row.absolute_error.as_str(),
                row.percent_error.as_str(),
                row.diagnostic.as_str(),
                row.what_went_well.as_str(),
                row.what_could_be_improved.as_str(),
                row.bcbs_analysis.as_str(),
                row.aetna_analysis.as_str(),
            ])
            .with_context(|| format!("Failed writing insight row {}", row.week_key))?;
    }
    finish_csv(writer, &tmp_path, output_path)
}

pub fn write_model_comparison_csv(
    output_path: &Path,
    evaluations: &[EvaluationResult],
    best_model: &str,
) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let tmp_path = tmp_path_for(output_path);
    let mut writer = Writer::from_path(&tmp_path)
        .with_context(|| format!("Failed creating model comparison CSV {}", tmp_path.display()))?;
    writer
        .write_record(["model", "mae", "rmse", "mape", "r_squared", "bias", "selected"])
        .context("Failed writing model comparison header")?;

    for eval in evaluations {
        writer
            .write_record([
                eval.model_name.clone(),
                format!("{:.2}", eval.mae),
                format!("{:.2}", eval.rmse),
                format!("{:.2}", eval.mape),
                format!("{:.4}", eval.r_squared),
                format!("{:.2}", eval.bias),
                (eval.model_name == best_model).to_string(),
            ])
            .with_context(|| format!("Failed writing model row {}", eval.model_name))?;
    }
    finish_csv(writer, &tmp_path, output_path)
}

pub fn write_analysis_json(output_path: &Path, result: &AnalysisResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed serializing analysis")?;
    write_atomic(output_path, &json)
}

/// Writes every report into `output_dir` and returns the paths written.
pub fn write_reports(output_dir: &Path, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed creating {}", output_dir.display()))?;

    let insights_csv = output_dir.join(INSIGHTS_CSV_FILE);
    let models_csv = output_dir.join(MODEL_COMPARISON_CSV_FILE);
    let analysis_json = output_dir.join(ANALYSIS_JSON_FILE);

    write_insights_csv(&insights_csv, &result.final_results)?;
    write_model_comparison_csv(&models_csv, &result.evaluations, &result.best_model.model_name)?;
    write_analysis_json(&analysis_json, result)?;

    Ok(vec![insights_csv, models_csv, analysis_json])
}
