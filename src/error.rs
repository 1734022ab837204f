/// Centralized error types for ifcwise using thiserror
///
/// Model-level failures are fatal to a pipeline run. Field-level failures are
/// recovered inside row extraction and never escape it.
use thiserror::Error;

/// Main error type for ifcwise
#[derive(Error, Debug)]
pub enum IfcWiseError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// The model source cannot be opened or read
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read model file '{file}': {reason}")]
    ReadFailed { file: String, reason: String },

    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Missing {0} section")]
    MissingSection(&'static str),

    #[error("Duplicate entity id #{0}")]
    DuplicateEntity(u64),
}

/// A single attribute, placement, property or quantity lookup failed.
///
/// Recovered locally by the row extractor: the affected field contributes an
/// empty value (or no columns) and extraction continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("attribute '{0}' is not set")]
    Absent(&'static str),

    #[error("reference #{0} does not resolve")]
    Dangling(u64),

    #[error("unexpected entity type {found}, expected {expected}")]
    UnexpectedType { expected: &'static str, found: String },

    #[error("malformed value: {0}")]
    Malformed(String),
}

/// Errors related to chunk planning
#[derive(Error, Debug)]
pub enum ChunkingError {
    #[error("Invalid chunk budget: {0}")]
    InvalidBudget(String),

    #[error("Failed to serialize chunk payload: {0}")]
    Serialize(#[from] ExportError),
}

/// Errors related to table export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export produced invalid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// A setting is out of range after all configuration sources are merged
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },

    #[error("Empty {0}")]
    Empty(String),
}

/// Sending one chunk to the batch transmitter failed.
///
/// `index` is the 0-based position in the planned chunk sequence, so a caller
/// can re-plan the same table and resume from exactly this chunk.
#[derive(Error, Debug)]
#[error("Failed to send chunk {index} ({label}): {reason}")]
pub struct TransmissionError {
    pub index: usize,
    pub label: String,
    pub reason: String,
}

// Conversion from anyhow::Error to IfcWiseError
impl From<anyhow::Error> for IfcWiseError {
    fn from(err: anyhow::Error) -> Self {
        IfcWiseError::Other(format!("{:#}", err))
    }
}

impl IfcWiseError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        IfcWiseError::Other(msg.into())
    }

    /// Check if this is a user error (bad input or settings) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IfcWiseError::Validation(_)
                | IfcWiseError::Config(ConfigError::InvalidValue { .. })
                | IfcWiseError::Model(ModelError::FileNotFound(_))
                | IfcWiseError::Export(ExportError::UnsupportedFormat(_))
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, IfcWiseError::Transmission(_) | IfcWiseError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, IfcWiseError>;
