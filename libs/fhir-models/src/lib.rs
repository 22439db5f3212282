//! FHIR data models
//!
//! Strongly-typed structures for the conformance resources the mapping
//! toolchain consumes: `StructureDefinition` and `ElementDefinition`.
//!
//! - **Version-agnostic core**: common fields present across FHIR R4, R4B and R5
//! - **Lossless**: unknown properties are kept in a flattened `extensions` map
//!
//! # Example
//!
//! ```rust
//! use fhirmap_models::common::{StructureDefinition, StructureDefinitionKind};
//! use serde_json::json;
//!
//! let sd_json = json!({
//!     "resourceType": "StructureDefinition",
//!     "id": "Patient",
//!     "url": "http://hl7.org/fhir/StructureDefinition/Patient",
//!     "version": "4.0.1",
//!     "name": "Patient",
//!     "status": "active",
//!     "kind": "resource",
//!     "abstract": false,
//!     "type": "Patient",
//!     "baseDefinition": "http://hl7.org/fhir/StructureDefinition/DomainResource"
//! });
//!
//! let sd: StructureDefinition = serde_json::from_value(sd_json).unwrap();
//! assert_eq!(sd.name, "Patient");
//! assert_eq!(sd.kind, StructureDefinitionKind::Resource);
//! ```

pub mod common;

// Re-export commonly used types
pub use common::*;
