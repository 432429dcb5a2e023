//! Error types for registration runs.

use thiserror::Error;

/// Error type for registration operations.
///
/// `Configuration` and `Domain` errors are raised before any iteration runs;
/// `Numeric` and `Metric` errors abort a run in progress without publishing a
/// result. Exhausting an iteration budget is never an error.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Missing inputs or inconsistent parameters.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Incompatible image geometries.
    #[error("incompatible image domains: {0}")]
    Domain(String),

    /// Non-finite values or a diverging numeric stage.
    #[error("numerical failure: {0}")]
    Numeric(String),

    /// Failure propagated from a similarity metric.
    #[error("metric failure: {0}")]
    Metric(String),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a domain error.
    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    /// Create a numeric error.
    pub fn numeric(msg: impl Into<String>) -> Self {
        Self::Numeric(msg.into())
    }

    /// Create a metric error.
    pub fn metric(msg: impl Into<String>) -> Self {
        Self::Metric(msg.into())
    }
}
