//! Weekly healthcare billing revenue forecasting.
//!
//! Raw spreadsheet rows flow through a fixed sequence of stages:
//! extraction, weekly aggregation, feature engineering, a chronological
//! train/test split with training-only correlations, a bank of four revenue
//! heuristics, held-out evaluation, per-week classification, and narrative
//! insights. [`pipeline::run_pipeline`] runs them all.

pub mod aggregate;
pub mod cells;
pub mod classify;
pub mod common;
pub mod config;
pub mod constants;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod features;
pub mod insights;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod split;

pub use config::{PayerMultipliers, PipelineConfig};
pub use error::{ForecastError, Result};
pub use pipeline::{AnalysisResult, run_pipeline};
