use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// Input table is empty, has no header, or lacks the columns records are keyed on.
    #[error("{0}")]
    DataFormat(String),

    #[error("only {weeks} weekly group(s) found; at least {required} are needed for a train/test split")]
    InsufficientData { weeks: usize, required: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed parsing JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat(message.into())
    }
}
