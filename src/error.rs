//! Error type shared by the registry, the query layer and the preloader.

use std::fmt;

/// Error type for hydraguard operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydraError {
    /// An attribute is declared but its value table or association is missing.
    ///
    /// Always fatal: a relation is never built with a malformed join.
    Configuration(String),
    /// Failure reported by the underlying store (query or batched preload)
    Persistence(String),
    /// Row parsing/conversion error
    Parse(String),
    /// Malformed query request
    Query(String),
}

impl fmt::Display for HydraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydraError::Configuration(s) => {
                write!(f, "Configuration error: {s}")
            }
            HydraError::Persistence(s) => {
                write!(f, "Persistence error: {s}")
            }
            HydraError::Parse(s) => {
                write!(f, "Parse error: {s}")
            }
            HydraError::Query(s) => {
                write!(f, "Query error: {s}")
            }
        }
    }
}

impl std::error::Error for HydraError {}

impl From<config::ConfigError> for HydraError {
    fn from(err: config::ConfigError) -> Self {
        HydraError::Configuration(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type HydraResult<T> = Result<T, HydraError>;
