//! Error types for differential normalization and child resolution

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to process contentReference '{reference}' on element '{path}'")]
    ContentReference { reference: String, path: String },

    #[error("Unable to resolve name reference {reference} at path {path}")]
    UnresolvedContentReference { reference: String, path: String },

    #[error("Circular contentReference '{reference}' at path {path}")]
    CircularContentReference { reference: String, path: String },

    #[error("StructureDefinition {0} has no snapshot")]
    MissingSnapshot(String),

    #[error("Element '{path}' is not part of the snapshot of {url}")]
    ElementNotInSnapshot { path: String, url: String },

    #[error("No slicing rule defined for path '{0}'")]
    NoSlicingRule(String),

    #[error("FHIR context error: {0}")]
    FhirContext(#[from] fhirmap_context::Error),
}
