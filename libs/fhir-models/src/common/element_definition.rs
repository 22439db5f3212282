//! FHIR ElementDefinition model
//!
//! Version-agnostic model for ElementDefinition (used in StructureDefinition snapshots and differentials)

use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// User-data key carrying a slice name chosen before normalization
pub const SLICE_NAME_TAG: &str = "slice-name";

/// FHIR ElementDefinition - defines an element in a resource or data type structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinition {
    /// Unique id for inter-element referencing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Path of the element in the hierarchy (e.g., "Patient.name")
    pub path: String,

    /// Name for this particular element (in a slice)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_name: Option<String>,

    /// Short label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Full formal definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    /// Minimum cardinality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,

    /// Maximum cardinality (can be "*")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    /// Base definition information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<ElementDefinitionBase>,

    /// Reference to definition of content, either `#id` or `url#id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,

    /// Data type and profile for this element
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<ElementDefinitionType>>,

    /// ValueSet details if this is coded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<ElementDefinitionBinding>,

    /// This element is sliced - slices follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slicing: Option<ElementDefinitionSlicing>,

    /// If this element must be supported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_support: Option<bool>,

    /// Processing annotations attached by tooling; never serialized
    #[serde(skip)]
    pub user_data: HashMap<String, String>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Base definition information for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionBase {
    /// Path that identifies the base element
    pub path: String,

    /// Min cardinality of the base element
    pub min: u32,

    /// Max cardinality of the base element
    pub max: String,
}

/// Data type for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionType {
    /// Data type code
    pub code: String,

    /// Profile (StructureDefinition canonical URLs) that apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,

    /// Profile (StructureDefinition) for Reference/canonical target types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_profile: Option<Vec<String>>,
}

/// ValueSet binding for a coded element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementDefinitionBinding {
    /// Binding strength (required | extensible | preferred | example)
    pub strength: BindingStrength,

    /// Human explanation of the value set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source of value set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
}

/// Degree of conformance expected by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrength {
    Required,
    Extensible,
    Preferred,
    Example,
}

/// Slicing information for an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionSlicing {
    /// Element values that are used to distinguish slices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Vec<ElementDefinitionDiscriminator>>,

    /// Text description of how slicing works
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// If elements must be in same order as slices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,

    /// Slicing rules (closed | open | openAtEnd)
    pub rules: SlicingRules,
}

impl ElementDefinitionSlicing {
    /// Open slicing with no discriminators yet
    pub fn open() -> Self {
        Self {
            discriminator: None,
            description: None,
            ordered: Some(false),
            rules: SlicingRules::Open,
        }
    }

    /// Append a discriminator, creating the list on first use
    pub fn push_discriminator(&mut self, discriminator: ElementDefinitionDiscriminator) {
        self.discriminator
            .get_or_insert_with(Vec::new)
            .push(discriminator);
    }

    pub fn discriminators(&self) -> &[ElementDefinitionDiscriminator] {
        self.discriminator.as_deref().unwrap_or(&[])
    }
}

/// Discriminator for slicing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementDefinitionDiscriminator {
    /// Type of discriminator (value | exists | pattern | type | profile)
    #[serde(rename = "type")]
    pub discriminator_type: DiscriminatorType,

    /// Path to element value
    pub path: String,
}

/// Type of slicing discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscriminatorType {
    Value,
    Exists,
    Pattern,
    Type,
    Profile,
}

/// Slicing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlicingRules {
    Closed,
    Open,
    OpenAtEnd,
}

/// Snapshot - a set of elements that define the structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub element: Vec<ElementDefinition>,
}

/// Differential - a set of elements that define changes from the base
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Differential {
    pub element: Vec<ElementDefinition>,
}

impl Snapshot {
    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }

    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an element by path
    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        self.element.iter().find(|e| e.path == path)
    }

    /// Get an element by its id
    pub fn get_element_by_id(&self, id: &str) -> Option<&ElementDefinition> {
        self.element.iter().find(|e| e.id.as_deref() == Some(id))
    }

    /// Position of this exact element (by reference, not by value) in the snapshot
    pub fn position_of(&self, element: &ElementDefinition) -> Option<usize> {
        self.element.iter().position(|e| std::ptr::eq(e, element))
    }
}

impl Differential {
    /// Parse from JSON Value
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(Error::from)
    }

    /// Create a new empty differential
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an element by path
    pub fn get_element(&self, path: &str) -> Option<&ElementDefinition> {
        self.element.iter().find(|e| e.path == path)
    }
}

impl ElementDefinition {
    /// Element with only a path set
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Get the key for this element (path:sliceName for slices, just path otherwise)
    pub fn key(&self) -> String {
        if let Some(ref slice_name) = self.slice_name {
            format!("{}:{}", self.path, slice_name)
        } else {
            self.path.clone()
        }
    }

    /// Check if this element has a slice name
    pub fn is_slice(&self) -> bool {
        self.slice_name.is_some()
    }

    /// Nesting depth: the number of dots in the path
    pub fn depth(&self) -> usize {
        self.path.matches('.').count()
    }

    /// Get the parent path (everything before the last '.')
    pub fn parent_path(&self) -> Option<String> {
        self.path.rfind('.').map(|pos| self.path[..pos].to_string())
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path
            .rfind('.')
            .map_or(self.path.as_str(), |pos| &self.path[pos + 1..])
    }

    /// Check if this element is a descendant of the given path
    pub fn is_descendant_of(&self, parent_path: &str) -> bool {
        self.path.starts_with(parent_path)
            && self.path.len() > parent_path.len()
            && self.path.as_bytes().get(parent_path.len()) == Some(&b'.')
    }

    /// Check if this element is a direct child of the given path
    pub fn is_child_of(&self, parent_path: &str) -> bool {
        self.is_descendant_of(parent_path) && !self.path[parent_path.len() + 1..].contains('.')
    }

    /// Check if this is a choice type element (ends with [x])
    pub fn is_choice_type(&self) -> bool {
        self.path.ends_with("[x]")
    }

    /// Get type codes for this element
    pub fn type_codes(&self) -> Vec<String> {
        self.types
            .as_ref()
            .map(|types| types.iter().map(|t| t.code.clone()).collect())
            .unwrap_or_default()
    }

    /// Get the cardinality as a string (e.g., "0..1", "1..*")
    pub fn cardinality_string(&self) -> String {
        let min = self.min.unwrap_or(0);
        let max = self.max.as_deref().unwrap_or("*");
        format!("{}..{}", min, max)
    }

    pub fn user_data(&self, key: &str) -> Option<&str> {
        self.user_data.get(key).map(String::as_str)
    }

    pub fn set_user_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.user_data.insert(key.into(), value.into());
    }

    /// Validate that the path is a non-empty dotted name without empty segments
    pub fn validate_path(&self) -> Result<()> {
        if self.path.is_empty() || self.path.split('.').any(str::is_empty) {
            return Err(Error::InvalidPath(self.path.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_element_key() {
        let mut elem = ElementDefinition::new("Patient.name");
        elem.slice_name = Some("official".to_string());

        assert_eq!(elem.key(), "Patient.name:official");
        assert!(elem.is_slice());
    }

    #[test]
    fn test_depth_and_name() {
        let elem = ElementDefinition::new("Patient.name.given");
        assert_eq!(elem.depth(), 2);
        assert_eq!(elem.name(), "given");
        assert_eq!(elem.parent_path(), Some("Patient.name".to_string()));
        assert_eq!(ElementDefinition::new("Patient").depth(), 0);
    }

    #[test]
    fn test_child_relations() {
        let elem = ElementDefinition::new("Patient.name.given");
        assert!(elem.is_descendant_of("Patient"));
        assert!(elem.is_child_of("Patient.name"));
        assert!(!elem.is_child_of("Patient"));
        assert!(!ElementDefinition::new("Patient.names").is_descendant_of("Patient.name"));
    }

    #[test]
    fn test_is_choice_type() {
        let mut elem = ElementDefinition::new("Observation.value[x]");
        assert!(elem.is_choice_type());

        elem.path = "Observation.value".to_string();
        assert!(!elem.is_choice_type());
    }

    #[test]
    fn test_cardinality_string() {
        let mut elem = ElementDefinition::new("Patient.name");
        elem.min = Some(1);
        elem.max = Some("*".to_string());

        assert_eq!(elem.cardinality_string(), "1..*");
    }

    #[test]
    fn user_data_is_not_serialized() {
        let mut elem = ElementDefinition::new("Patient.extension");
        elem.set_user_data(SLICE_NAME_TAG, "race");

        assert_eq!(elem.user_data(SLICE_NAME_TAG), Some("race"));
        let value = serde_json::to_value(&elem).unwrap();
        assert_eq!(value, json!({ "path": "Patient.extension" }));
    }

    #[test]
    fn parses_slicing_and_keeps_unknown_fields() {
        let elem: ElementDefinition = serde_json::from_value(json!({
            "id": "Patient.extension",
            "path": "Patient.extension",
            "slicing": {
                "discriminator": [{ "type": "value", "path": "url" }],
                "rules": "open"
            },
            "isModifier": false
        }))
        .unwrap();

        let slicing = elem.slicing.as_ref().unwrap();
        assert_eq!(slicing.rules, SlicingRules::Open);
        assert_eq!(slicing.discriminators()[0].path, "url");
        assert_eq!(
            slicing.discriminators()[0].discriminator_type,
            DiscriminatorType::Value
        );
        assert_eq!(elem.extensions.get("isModifier"), Some(&json!(false)));
    }

    #[test]
    fn rejects_empty_path_segments() {
        assert!(ElementDefinition::new("Patient..name").validate_path().is_err());
        assert!(ElementDefinition::new("Patient.name").validate_path().is_ok());
    }

    #[test]
    fn finds_position_by_identity() {
        let snapshot = Snapshot {
            element: vec![
                ElementDefinition::new("Patient.name"),
                ElementDefinition::new("Patient.name"),
            ],
        };
        let second = &snapshot.element[1];
        assert_eq!(snapshot.position_of(second), Some(1));

        let lookalike = ElementDefinition::new("Patient.name");
        assert_eq!(snapshot.position_of(&lookalike), None);
    }
}
