//! Type algebra for FHIRPath result types
//!
//! Every FHIRPath expression yields a collection, so its static type is a set of
//! possible element types plus a classification of the collection itself.
//!
//! This module provides:
//! - `ProfiledType`: a canonical type URI narrowed by profiles ("or" semantics) and bindings
//! - `TypeDetails`: an insertion-ordered, URI-keyed set of `ProfiledType`s + `CollectionStatus`
//!
//! Types are identified by canonical URI. Bare FHIR type names live under
//! [`FHIR_NS`]; FHIRPath system primitives live under [`FP_NS`].

use crate::error::{Error, Result};
use fhirmap_context::FhirContext;
use fhirmap_models::{ElementDefinitionBinding, StructureDefinition};
use indexmap::{IndexMap, IndexSet};
use phf::phf_set;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Namespace of core FHIR StructureDefinitions
pub const FHIR_NS: &str = "http://hl7.org/fhir/StructureDefinition/";

/// Namespace of FHIRPath system types
pub const FP_NS: &str = "http://hl7.org/fhirpath/";

/// Names that also exist as FHIRPath system types.
static FHIRPATH_PRIMITIVES: phf::Set<&'static str> = phf_set! {
    "boolean", "string", "integer", "decimal", "Quantity", "dateTime", "time",
    "ClassInfo", "SimpleTypeInfo",
};

/// Shape of the collection an expression produces.
///
/// Combining collections only ever widens the status towards `Unordered`;
/// only [`TypeDetails::to_singleton`] narrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CollectionStatus {
    #[default]
    Unspecified,
    Singleton,
    Ordered,
    Unordered,
}

impl CollectionStatus {
    /// Status of a collection built from two contributors
    pub fn combine(self, other: CollectionStatus) -> CollectionStatus {
        if self == CollectionStatus::Unordered || other == CollectionStatus::Unordered {
            CollectionStatus::Unordered
        } else {
            CollectionStatus::Ordered
        }
    }
}

/// A type URI optionally constrained by profiles and value-set bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfiledType {
    uri: String,
    profiles: IndexSet<String>,
    bindings: Vec<ElementDefinitionBinding>,
}

impl ProfiledType {
    pub fn new(name: &str) -> Self {
        Self {
            uri: Self::ns(name),
            profiles: IndexSet::new(),
            bindings: Vec::new(),
        }
    }

    /// Canonical URI for a type name; absolute URLs pass through unchanged.
    pub fn ns(name: &str) -> String {
        if is_absolute_url(name) {
            name.to_string()
        } else {
            format!("{}{}", FHIR_NS, name)
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(String::as_str)
    }

    pub fn bindings(&self) -> &[ElementDefinitionBinding] {
        &self.bindings
    }

    pub fn has_profiles(&self) -> bool {
        !self.profiles.is_empty()
    }

    pub fn has_bindings(&self) -> bool {
        !self.bindings.is_empty()
    }

    pub fn has_binding(&self, binding: &ElementDefinitionBinding) -> bool {
        self.bindings.contains(binding)
    }

    pub fn add_profile(&mut self, profile: impl Into<String>) {
        self.profiles.insert(profile.into());
    }

    pub fn add_profiles<I, S>(&mut self, profiles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles.extend(profiles.into_iter().map(Into::into));
    }

    pub fn add_binding(&mut self, binding: ElementDefinitionBinding) {
        if !self.has_binding(&binding) {
            self.bindings.push(binding);
        }
    }

    /// Whether the URI names a FHIRPath system type
    pub fn is_system_type(&self) -> bool {
        self.uri.starts_with(FP_NS)
    }

    /// Fold the profiles and bindings of another entry for the same URI into this one.
    fn merge(&mut self, other: ProfiledType) {
        self.profiles.extend(other.profiles);
        for binding in other.bindings {
            self.add_binding(binding);
        }
    }
}

impl fmt::Display for ProfiledType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)?;
        if self.has_profiles() {
            let profiles: Vec<&str> = self.profiles().collect();
            write!(f, "({})", profiles.join(" | "))?;
        }
        Ok(())
    }
}

/// Possible result types of an expression and the shape of its collection.
///
/// Each `ProfiledType` URI appears at most once; entries keep insertion order,
/// which [`TypeDetails::binding`] relies on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDetails {
    types: IndexMap<String, ProfiledType>,
    collection_status: CollectionStatus,
}

impl TypeDetails {
    pub fn new<I, S>(collection_status: CollectionStatus, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut details = Self {
            types: IndexMap::new(),
            collection_status,
        };
        details.add_types(names);
        details
    }

    /// No types, unspecified status
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a type by name, returning its canonical URI.
    pub fn add_type(&mut self, name: &str) -> String {
        let pt = ProfiledType::new(name);
        let uri = pt.uri.clone();
        self.add_profiled_type(pt);
        uri
    }

    /// Add a type constrained to `profile`, returning its canonical URI.
    pub fn add_type_with_profile(&mut self, name: &str, profile: &str) -> String {
        let mut pt = ProfiledType::new(name);
        pt.add_profile(profile);
        let uri = pt.uri.clone();
        self.add_profiled_type(pt);
        uri
    }

    /// Merge a type into the set: an existing entry for the URI absorbs its profiles and bindings.
    pub fn add_profiled_type(&mut self, pt: ProfiledType) {
        match self.types.get_mut(&pt.uri) {
            Some(existing) => existing.merge(pt),
            None => {
                self.types.insert(pt.uri.clone(), pt);
            }
        }
    }

    pub fn add_types<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add_type(name.as_ref());
        }
    }

    /// Absorb all types of `source` into this value.
    pub fn update(&mut self, source: &TypeDetails) {
        for pt in source.types.values() {
            self.add_profiled_type(pt.clone());
        }
        self.collection_status = match self.collection_status {
            CollectionStatus::Unspecified => source.collection_status,
            current => current.combine(source.collection_status),
        };
    }

    /// Types of either operand.
    pub fn union(&self, right: &TypeDetails) -> TypeDetails {
        let mut result = TypeDetails {
            types: IndexMap::new(),
            collection_status: self.collection_status.combine(right.collection_status),
        };
        for pt in self.types.values().chain(right.types.values()) {
            result.add_profiled_type(pt.clone());
        }
        result
    }

    /// Types of this operand that the right operand shares, plus all of the right operand's types.
    ///
    /// The right operand's entries are always merged in, so its profiles and
    /// bindings survive even for URIs this operand lacks.
    pub fn intersect(&self, right: &TypeDetails) -> TypeDetails {
        let mut result = TypeDetails {
            types: IndexMap::new(),
            collection_status: self.collection_status.combine(right.collection_status),
        };
        for pt in self.types.values() {
            if right.types.contains_key(&pt.uri) {
                result.add_profiled_type(pt.clone());
            }
        }
        for pt in right.types.values() {
            result.add_profiled_type(pt.clone());
        }
        result
    }

    /// Same types, as a single value.
    pub fn to_singleton(&self) -> TypeDetails {
        TypeDetails {
            types: self.types.clone(),
            collection_status: CollectionStatus::Singleton,
        }
    }

    /// Whether any of `names` is one of these types, directly or through its base definitions.
    ///
    /// A base definition the context cannot supply ends the walk for that name.
    /// A base chain that loops back on itself is an error.
    pub fn has_type(&self, context: &dyn FhirContext, names: &[&str]) -> Result<bool> {
        if names.iter().any(|n| self.has_direct_type(n)) {
            return Ok(true);
        }

        for name in names {
            if self.has_inherited_type(context, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Direct membership test over a set of names, without inheritance.
    pub fn has_type_in(&self, names: &HashSet<String>) -> bool {
        names.iter().any(|n| self.has_direct_type(n))
    }

    fn has_direct_type(&self, name: &str) -> bool {
        if self.contains_uri(&ProfiledType::ns(name)) {
            return true;
        }
        FHIRPATH_PRIMITIVES.contains(name)
            && self.contains_uri(&format!("{}{}", FP_NS, capitalize(name)))
    }

    fn has_inherited_type(&self, context: &dyn FhirContext, name: &str) -> Result<bool> {
        // "Type#Type.path" names a backbone element inside Type
        let (id, tail) = match name.split_once('#') {
            Some((id, rest)) => (id, Some(rest.find('.').map_or("", |pos| &rest[pos..]))),
            None => (name, None),
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut current = fetch(context, &ProfiledType::ns(id));

        while let Some(sd) = current {
            if !visited.insert(sd.url.clone()) {
                return Err(Error::CircularBaseDefinition(sd.url.clone()));
            }

            match tail {
                None => {
                    if self.contains_uri(&sd.url) {
                        return Ok(true);
                    }
                    if let Some(system) = system_type(&sd) {
                        if self.contains_uri(&system) {
                            return Ok(true);
                        }
                    }
                }
                Some(tail) => {
                    if self.contains_uri(&format!("{}#{}{}", sd.url, sd.type_, tail)) {
                        return Ok(true);
                    }
                }
            }

            current = match sd.base_definition.as_deref() {
                Some(base) if is_element_based_uri(&sd, base) => {
                    fetch(context, &format!("{}string", FHIR_NS))
                }
                Some(base) => fetch(context, base),
                None => None,
            };
        }
        Ok(false)
    }

    fn contains_uri(&self, uri: &str) -> bool {
        self.types.contains_key(uri)
    }

    pub fn has_no_types(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Type URIs in insertion order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn profiled_types(&self) -> impl Iterator<Item = &ProfiledType> {
        self.types.values()
    }

    pub fn collection_status(&self) -> CollectionStatus {
        self.collection_status
    }

    /// URI of the first type, if any
    pub fn type_uri(&self) -> Option<&str> {
        self.types.keys().next().map(String::as_str)
    }

    /// Code of the only type, with the core FHIR namespace stripped.
    ///
    /// Callers must ensure exactly one type is present.
    pub fn type_code(&self) -> Result<String> {
        if self.types.len() != 1 {
            return Err(Error::MultipleTypes(self.describe()));
        }
        let uri = self.types.keys().next().map(String::as_str).unwrap_or_default();
        Ok(uri.strip_prefix(FHIR_NS).unwrap_or(uri).to_string())
    }

    pub fn has_binding(&self) -> bool {
        self.types.values().any(ProfiledType::has_bindings)
    }

    /// First binding of the first type that has one.
    pub fn binding(&self) -> Option<&ElementDefinitionBinding> {
        self.types.values().find_map(|pt| pt.bindings.first())
    }

    /// `[uri, uri, ...]`
    pub fn describe(&self) -> String {
        let uris: Vec<&str> = self.types().collect();
        format!("[{}]", uris.join(", "))
    }
}

impl fmt::Display for TypeDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn fetch(context: &dyn FhirContext, url: &str) -> Option<Arc<StructureDefinition>> {
    match context.get_structure_definition(url) {
        Ok(found) => {
            if found.is_none() {
                tracing::debug!(url, "base definition not available, ending type walk");
            }
            found
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "failed to resolve base definition");
            None
        }
    }
}

/// `uri` specializes Element directly but behaves as a string for type tests.
fn is_element_based_uri(sd: &StructureDefinition, base: &str) -> bool {
    base.strip_prefix(FHIR_NS) == Some("Element") && sd.type_ == "uri"
}

/// System-type projection of a StructureDefinition whose type code is a FHIRPath primitive.
fn system_type(sd: &StructureDefinition) -> Option<String> {
    let code = sd.type_.as_str();
    FHIRPATH_PRIMITIVES
        .contains(code)
        .then(|| format!("{}{}", FP_NS, capitalize(code)))
}

fn is_absolute_url(name: &str) -> bool {
    name.contains("://") || name.starts_with("urn:")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
