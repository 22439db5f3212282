//! Error types for FHIRPath type analysis

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Type algebra errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A single type was required but the set held zero or several
    #[error("Multiple types? ({0})")]
    MultipleTypes(String),

    #[error("Circular baseDefinition chain at {0}")]
    CircularBaseDefinition(String),
}
