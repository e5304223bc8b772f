//! Custom error types for the ETL pipeline.
//!
//! This module provides the error taxonomy used throughout the pipeline
//! using `thiserror`. Schema violations carry enough detail (failing
//! columns and offending rows) to diagnose bad data without re-running
//! the stage.

use thiserror::Error;

use crate::schema::SchemaViolation;

/// The main error type for the ETL pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// No source files matched the requested location and file kind.
    #[error("No {kind} files found at '{location}'")]
    NotFound { location: String, kind: String },

    /// The requested file kind has no registered reader.
    #[error("The '{0}' file extension is not supported")]
    UnsupportedFormat(String),

    /// A dataset failed a hard (exit) schema gate.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// A zero-row dataset was handed to a load boundary.
    #[error("Refusing to load empty dataset into '{destination}'")]
    EmptyDataset { destination: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EtlError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error is a schema-gate rejection.
    pub fn is_schema_violation(&self) -> bool {
        match self {
            Self::Schema(_) => true,
            Self::WithContext { source, .. } => source.is_schema_violation(),
            _ => false,
        }
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EtlError::Polars(e).with_context(context))
    }
}
