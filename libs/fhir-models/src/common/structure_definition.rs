//! FHIR StructureDefinition model
//!
//! Only the properties the mapping toolchain reads are modelled explicitly;
//! everything else is preserved in `extensions`.

use super::element_definition::{Differential, ElementDefinition, Snapshot};
use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Canonical URL root for core FHIR structure definitions
pub const FHIR_STRUCTURE_DEFINITION_ROOT: &str = "http://hl7.org/fhir/StructureDefinition/";

/// FHIR StructureDefinition resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    /// Resource type - always "StructureDefinition"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical identifier
    pub url: String,

    /// Business version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Name (computer friendly)
    #[serde(default)]
    pub name: String,

    /// Publication status
    #[serde(default)]
    pub status: PublicationStatus,

    /// primitive-type | complex-type | resource | logical
    #[serde(default)]
    pub kind: StructureDefinitionKind,

    /// Whether the structure is abstract
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,

    /// Type defined or constrained by this structure
    #[serde(rename = "type")]
    pub type_: String,

    /// Definition that this type is constrained/specialized from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_definition: Option<String>,

    /// specialization | constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<TypeDerivationRule>,

    /// Snapshot view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,

    /// Differential view of the structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<Differential>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "StructureDefinition".to_string()
}

/// Publication status of a conformance resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Active,
    Retired,
    Unknown,
}

/// Defines the type of structure that a definition is describing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    PrimitiveType,
    ComplexType,
    #[default]
    Resource,
    Logical,
}

/// How a type relates to its baseDefinition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDerivationRule {
    Specialization,
    Constraint,
}

impl StructureDefinition {
    /// Minimal structure definition with the given canonical URL and type
    pub fn new(url: impl Into<String>, type_: impl Into<String>) -> Self {
        let type_ = type_.into();
        Self {
            resource_type: default_resource_type(),
            id: None,
            url: url.into(),
            version: None,
            name: type_.clone(),
            status: PublicationStatus::default(),
            kind: StructureDefinitionKind::default(),
            is_abstract: false,
            type_,
            base_definition: None,
            derivation: None,
            snapshot: None,
            differential: None,
            extensions: HashMap::new(),
        }
    }

    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        let sd: Self = serde_json::from_value(value.clone())?;
        if sd.resource_type != "StructureDefinition" {
            return Err(Error::InvalidResource(format!(
                "expected StructureDefinition, got {}",
                sd.resource_type
            )));
        }
        Ok(sd)
    }

    pub fn with_base_definition(mut self, base: impl Into<String>) -> Self {
        self.base_definition = Some(base.into());
        self
    }

    pub fn with_snapshot(mut self, element: Vec<ElementDefinition>) -> Self {
        self.snapshot = Some(Snapshot { element });
        self
    }

    pub fn with_differential(mut self, element: Vec<ElementDefinition>) -> Self {
        self.differential = Some(Differential { element });
        self
    }

    /// Snapshot elements, empty when no snapshot is present
    pub fn snapshot_elements(&self) -> &[ElementDefinition] {
        self.snapshot
            .as_ref()
            .map(|s| s.element.as_slice())
            .unwrap_or(&[])
    }

    /// Differential elements, empty when no differential is present
    pub fn differential_elements(&self) -> &[ElementDefinition] {
        self.differential
            .as_ref()
            .map(|d| d.element.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this structure is one of the core FHIR definitions
    pub fn is_core(&self) -> bool {
        self.url.starts_with(FHIR_STRUCTURE_DEFINITION_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_structure_definition() {
        let sd = StructureDefinition::from_value(&json!({
            "resourceType": "StructureDefinition",
            "url": "http://hl7.org/fhir/StructureDefinition/uri",
            "name": "uri",
            "status": "active",
            "kind": "primitive-type",
            "abstract": false,
            "type": "uri",
            "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Element",
            "derivation": "specialization",
            "text": { "status": "generated" }
        }))
        .unwrap();

        assert_eq!(sd.type_, "uri");
        assert_eq!(sd.kind, StructureDefinitionKind::PrimitiveType);
        assert_eq!(sd.derivation, Some(TypeDerivationRule::Specialization));
        assert_eq!(
            sd.base_definition.as_deref(),
            Some("http://hl7.org/fhir/StructureDefinition/Element")
        );
        assert!(sd.is_core());
        assert!(sd.extensions.contains_key("text"));
        assert!(sd.snapshot_elements().is_empty());
    }

    #[test]
    fn rejects_other_resource_types() {
        let result = StructureDefinition::from_value(&json!({
            "resourceType": "ValueSet",
            "url": "http://example.org/vs",
            "type": "ValueSet"
        }));
        assert!(matches!(result, Err(Error::InvalidResource(_))));
    }

    #[test]
    fn builder_round_trips_through_json() {
        let sd = StructureDefinition::new("http://example.org/StructureDefinition/MyPatient", "Patient")
            .with_base_definition("http://hl7.org/fhir/StructureDefinition/Patient")
            .with_differential(vec![ElementDefinition::new("Patient")]);

        let value = serde_json::to_value(&sd).unwrap();
        assert_eq!(value["resourceType"], "StructureDefinition");
        assert_eq!(value["differential"]["element"][0]["path"], "Patient");

        let back = StructureDefinition::from_value(&value).unwrap();
        assert_eq!(back, sd);
    }
}
