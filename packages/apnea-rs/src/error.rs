use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Recording '{recording}' does not provide required channel '{channel}'")]
    MissingChannel { recording: String, channel: String },

    #[error("Non-finite values in recording '{recording}': {detail}")]
    NumericIntegrity { recording: String, detail: String },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("Index resolution invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Malformed recording '{recording}': {reason}")]
    MalformedRecording { recording: String, reason: String },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DatasetError {
    /// Only out-of-range access is an expected condition (iteration bounds);
    /// everything else points at a data or configuration defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DatasetError::IndexOutOfRange { .. })
    }

    pub(crate) fn malformed(recording: impl Into<String>, reason: impl Into<String>) -> Self {
        DatasetError::MalformedRecording {
            recording: recording.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
