//! FHIR StructureDefinition pre-processing
//!
//! This crate prepares StructureDefinitions for snapshot generation and
//! navigation:
//!
//! - [`normalize`] rewrites repeated differential paths into explicit slicing
//! - [`ChildMapResolver`] lists the direct children of snapshot elements,
//!   following `contentReference` indirection
//!
//! # Example
//!
//! ```rust
//! use fhirmap_snapshot::{normalize, ElementDefinition, StructureDefinition};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sd = StructureDefinition::new("http://example.org/StructureDefinition/p", "Patient")
//!     .with_differential(vec![
//!         ElementDefinition::new("Patient"),
//!         ElementDefinition::new("Patient.extension"),
//!         ElementDefinition::new("Patient.extension"),
//!     ]);
//!
//! normalize(&mut sd)?;
//!
//! let keys: Vec<String> = sd.differential_elements().iter().map(|e| e.key()).collect();
//! assert_eq!(
//!     keys,
//!     ["Patient", "Patient.extension", "Patient.extension:slice-1", "Patient.extension:slice-2"]
//! );
//! # Ok(())
//! # }
//! ```

pub mod children;
pub mod error;
pub mod normalization;
pub mod slicing;

pub use children::ChildMapResolver;
pub use error::{Error, Result};
pub use normalization::{normalize, normalize_slices};
pub use slicing::{discriminator_for, DiscriminatorPolicy, SliceNamer};
pub use fhirmap_models::{Differential, ElementDefinition, Snapshot, StructureDefinition};
