pub const PAYER_BCBS: &str = "2-BCBS";
pub const PAYER_AETNA: &str = "17-AETNA";
pub const PAYER_SELF_PAY: &str = "1-SELF PAY";
pub const PAYER_COMMERCIAL: &str = "5-COMMERCIAL";

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_CLASSIFICATION_THRESHOLD: f64 = 0.025;
pub const DEFAULT_MIN_WEEKS: usize = 5;
pub const DEFAULT_SKEW_WARNING_RATIO: f64 = 0.8;
pub const DEFAULT_TIE_BREAK_MAE: f64 = 100.0;

pub const DEFAULT_BCBS_MULTIPLIER: f64 = 1.25;
pub const DEFAULT_AETNA_MULTIPLIER: f64 = 1.20;
pub const DEFAULT_OTHER_MULTIPLIER: f64 = 0.95;
pub const DEFAULT_ADJUSTMENT_FLOOR: f64 = 0.5;

/// Upper bound on a record's collection rate (500%) before it is treated as bad input.
pub const MAX_COLLECTION_PCT: f64 = 5.0;

pub const INSIGHTS_CSV_FILE: &str = "weekly_insights.csv";
pub const MODEL_COMPARISON_CSV_FILE: &str = "model_comparison.csv";
pub const ANALYSIS_JSON_FILE: &str = "analysis.json";
