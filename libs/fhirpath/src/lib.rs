//! FHIRPath static types
//!
//! The type of a FHIRPath expression is a collection of possible FHIR or
//! FHIRPath system types. [`TypeDetails`] models that set and the algebra used
//! when expressions are combined (union, intersection, widening updates), and
//! answers inheritance-aware membership questions by walking base definitions
//! through a [`fhirmap_context::FhirContext`].
//!
//! # Example
//!
//! ```
//! use fhirmap_fhirpath::{CollectionStatus, TypeDetails};
//!
//! let left = TypeDetails::new(CollectionStatus::Singleton, ["string"]);
//! let right = TypeDetails::new(CollectionStatus::Singleton, ["integer"]);
//! let both = left.union(&right);
//!
//! assert_eq!(both.len(), 2);
//! assert_eq!(both.collection_status(), CollectionStatus::Ordered);
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{CollectionStatus, ProfiledType, TypeDetails, FHIR_NS, FP_NS};
