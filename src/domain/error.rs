//! Domain error types.

use chrono::NaiveDate;
use std::time::Duration;

/// Top-level error type for mandimetrics.
#[derive(Debug, thiserror::Error)]
pub enum MandiError {
    #[error("'{path}' not found. Please ensure the file is in the same directory.")]
    SourceNotFound { path: String },

    #[error("failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("line {line}: cannot read {column} from {value:?}: {reason}")]
    Coercion {
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("please select at least one province to forecast")]
    NoForecastRegions,

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MandiError> for std::process::ExitCode {
    fn from(err: &MandiError) -> Self {
        let code: u8 = match err {
            MandiError::Io(_) | MandiError::Report { .. } => 1,
            MandiError::ConfigParse { .. } | MandiError::ConfigInvalid { .. } => 2,
            MandiError::SourceNotFound { .. }
            | MandiError::Load { .. }
            | MandiError::Coercion { .. } => 3,
            MandiError::InvalidDateRange { .. } | MandiError::NoForecastRegions => 4,
        };
        std::process::ExitCode::from(code)
    }
}

/// Errors raised by a forecaster while fitting or predicting one series.
///
/// These never abort a forecast batch; orchestration turns them into
/// per-region warnings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("insufficient history: need {required} points, have {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("fit timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("model error: {0}")]
    Model(String),
}
