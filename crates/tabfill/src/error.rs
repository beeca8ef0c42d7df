//! Custom error types for the imputation components.
//!
//! Configuration problems (unknown columns, invalid strategies, transform
//! before fit) surface as errors at fit/transform entry. Unimputable data is
//! never an error: rows whose group key has no fitted statistic simply keep
//! their missing marker, and callers inspect remaining null counts.

use thiserror::Error;

/// The main error type for fit/transform operations.
#[derive(Error, Debug)]
pub enum ImputeError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A statistic required a numeric column but got something else.
    #[error("Column '{column}' must be numeric, found {dtype}")]
    NotNumeric { column: String, dtype: String },

    /// Transform was called on a component that has not been fitted.
    #[error("Component must be fitted before transform")]
    NotFitted,

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputeError>,
    },
}

impl ImputeError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error is a configuration problem (as opposed to a
    /// wrapped engine failure).
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_)
            | Self::InvalidConfig(_)
            | Self::NotNumeric { .. }
            | Self::NotFitted => true,
            Self::WithContext { source, .. } => source.is_config_error(),
            _ => false,
        }
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputeError>;

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
        self.map_err(|e| ImputeError::Polars(e).with_context(context))
    }
}
