//! Slicing headers, slice names and the discriminator policy
//!
//! When a differential repeats a path, the repetitions become slices of a
//! synthetic header element. Each header receives exactly one `value`
//! discriminator chosen from a fixed table keyed on the sliced path; paths the
//! table does not know cannot be sliced.

use crate::error::{Error, Result};
use fhirmap_models::{
    DiscriminatorType, ElementDefinition, ElementDefinitionDiscriminator,
    ElementDefinitionSlicing, SLICE_NAME_TAG,
};

/// Discriminator rules for the paths that may be sliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorPolicy {
    /// `*.extension` and `*.modifierExtension`, told apart by url
    Extension,
    /// `DiagnosticReport.result`
    DiagnosticReportResult,
    /// `Observation.related`
    ObservationRelated,
    /// `Bundle.entry`
    BundleEntry,
}

impl DiscriminatorPolicy {
    /// Policy for a sliced path, or `None` if the path cannot be sliced.
    pub fn for_path(path: &str) -> Option<Self> {
        if path.ends_with(".extension") || path.ends_with(".modifierExtension") {
            return Some(Self::Extension);
        }
        match path {
            "DiagnosticReport.result" => Some(Self::DiagnosticReportResult),
            "Observation.related" => Some(Self::ObservationRelated),
            "Bundle.entry" => Some(Self::BundleEntry),
            _ => None,
        }
    }

    pub fn discriminator_path(self) -> &'static str {
        match self {
            Self::Extension => "url",
            Self::DiagnosticReportResult => "reference.code",
            Self::ObservationRelated => "target.reference.code",
            Self::BundleEntry => "resource.@profile",
        }
    }

    pub fn discriminator(self) -> ElementDefinitionDiscriminator {
        ElementDefinitionDiscriminator {
            discriminator_type: DiscriminatorType::Value,
            path: self.discriminator_path().to_string(),
        }
    }
}

/// Discriminator for a sliced path; fails if the path has no rule.
pub fn discriminator_for(path: &str) -> Result<ElementDefinitionDiscriminator> {
    DiscriminatorPolicy::for_path(path)
        .map(DiscriminatorPolicy::discriminator)
        .ok_or_else(|| Error::NoSlicingRule(path.to_string()))
}

/// Build the header that introduces a slice group on `path`.
///
/// The header carries open slicing and the single discriminator for the path.
pub fn slicing_header(path: &str) -> Result<ElementDefinition> {
    let mut slicing = ElementDefinitionSlicing::open();
    slicing.push_discriminator(discriminator_for(path)?);

    let mut header = ElementDefinition::new(path);
    header.slicing = Some(slicing);
    Ok(header)
}

/// Hands out slice names for one slice group.
///
/// Tagged slices keep their tag; every other member is numbered `slice-1`,
/// `slice-2`, ... in order of appearance, replacing any authored `sliceName`.
#[derive(Debug, Default)]
pub struct SliceNamer {
    counter: usize,
}

impl SliceNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, element: &ElementDefinition) -> String {
        if let Some(tag) = element.user_data(SLICE_NAME_TAG) {
            return tag.to_string();
        }
        self.counter += 1;
        format!("slice-{}", self.counter)
    }

    /// Name `element` and align its id with the `path:sliceName` convention.
    pub fn apply(&mut self, element: &mut ElementDefinition) {
        let name = self.name_for(element);
        element.id = Some(format!("{}:{}", element.path, name));
        element.slice_name = Some(name);
    }
}
