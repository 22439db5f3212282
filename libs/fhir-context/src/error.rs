//! Error types for FHIR context

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid StructureDefinition: {0}")]
    InvalidStructureDefinition(String),

    #[error("Resource is missing a canonical url")]
    MissingUrl,

    #[error("Conformance store error: {0}")]
    ConformanceStore(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(#[from] fhirmap_models::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
