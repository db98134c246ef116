mod util;

use std::fs;

use revenue_forecast::cells::load_cells;
use revenue_forecast::constants::{ANALYSIS_JSON_FILE, INSIGHTS_CSV_FILE, MODEL_COMPARISON_CSV_FILE};
use revenue_forecast::report::write_reports;
use revenue_forecast::{PipelineConfig, run_pipeline};

use util::{HEADERS, linear_collection_rows};

fn write_input_csv(dir: &std::path::Path, weeks: usize) -> std::path::PathBuf {
    let path = dir.join("billing.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    for row in linear_collection_rows(weeks) {
        let fields: Vec<String> = row
            .iter()
            .map(|cell| cell.label().unwrap_or_default())
            .collect();
        writer.write_record(&fields).unwrap();
    }
    writer.flush().unwrap();
    path
}

#[test]
fn csv_upload_produces_all_reports() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input_csv(dir.path(), 10);
    let rows = load_cells(&input).unwrap();
    assert_eq!(rows[0].len(), HEADERS.len());

    let result = run_pipeline(&rows, &PipelineConfig::default()).unwrap();
    let out_dir = dir.path().join("out");
    let written = write_reports(&out_dir, &result).unwrap();
    assert_eq!(written.len(), 3);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }
    assert!(!out_dir.join(format!("{INSIGHTS_CSV_FILE}.tmp")).exists());

    let mut insights = csv::Reader::from_path(out_dir.join(INSIGHTS_CSV_FILE)).unwrap();
    let headers = insights.headers().unwrap().clone();
    assert_eq!(&headers[0], "week_key");
    assert_eq!(&headers[7], "diagnostic");
    let records: Vec<csv::StringRecord> = insights.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 10);
    assert_eq!(&records[0][0], "2024-W01");
    assert!(records[0][3].starts_with('$'));
    assert_eq!(&records[0][7], "Average Performance");

    let mut models = csv::Reader::from_path(out_dir.join(MODEL_COMPARISON_CSV_FILE)).unwrap();
    let rows: Vec<csv::StringRecord> = models.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    let selected: Vec<&str> = rows
        .iter()
        .filter(|r| &r[6] == "true")
        .map(|r| &r[0])
        .collect();
    assert_eq!(selected, ["Business Logic"]);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join(ANALYSIS_JSON_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["best_model"]["model_name"], "Business Logic");
    assert_eq!(json["performance_results"].as_array().map(Vec::len), Some(10));
    assert_eq!(json["distribution"]["average"], 10);
}

#[test]
fn json_upload_matches_csv_upload() {
    let dir = tempfile::tempdir().unwrap();
    let csv_rows = load_cells(&write_input_csv(dir.path(), 8)).unwrap();

    let json_path = dir.path().join("billing.json");
    fs::write(&json_path, serde_json::to_string(&linear_collection_rows(8)).unwrap()).unwrap();
    let json_rows = load_cells(&json_path).unwrap();

    let config = PipelineConfig::default();
    let from_csv = run_pipeline(&csv_rows, &config).unwrap();
    let from_json = run_pipeline(&json_rows, &config).unwrap();
    assert_eq!(from_csv.best_model.model_name, from_json.best_model.model_name);
    assert_eq!(from_csv.final_results.len(), from_json.final_results.len());
    for (a, b) in from_csv.performance_results.iter().zip(&from_json.performance_results) {
        assert_eq!(a.week_key, b.week_key);
        assert_eq!(a.diagnostic, b.diagnostic);
        approx::assert_relative_eq!(a.actual_payments, b.actual_payments, max_relative = 1e-9);
    }
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("billing.xlsx");
    fs::write(&path, b"not a spreadsheet").unwrap();
    let err = load_cells(&path).unwrap_err();
    assert!(matches!(err, revenue_forecast::ForecastError::DataFormat(_)));
}
