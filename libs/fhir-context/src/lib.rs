//! FHIR Context for runtime StructureDefinition access
//!
//! Provides the trait-based interface the normalizer, the child-map resolver
//! and the type algebra use to look up conformance resources by canonical URL.

pub mod context;
pub mod error;

pub use context::{FhirContext, InMemoryContext};
pub use error::{Error, Result};
