//! Direct-child lookup over StructureDefinition snapshots
//!
//! Children of an element are the snapshot entries one level below it in the
//! contiguous run that follows it. Elements carrying a `contentReference`
//! borrow the children of the element they point at, either in the same
//! structure (`#id`) or in another one fetched through the context (`url#id`).

use crate::error::{Error, Result};
use fhirmap_context::FhirContext;
use fhirmap_models::{ElementDefinition, StructureDefinition};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Identity of an element: the structure (canonical and business version) it
/// belongs to plus its snapshot position.
///
/// Paths are not unique (slices and content references repeat them), positions are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ElementKey {
    url: String,
    version: Option<String>,
    index: usize,
}

impl ElementKey {
    fn new(profile: &StructureDefinition, index: usize) -> Self {
        Self {
            url: profile.url.clone(),
            version: profile.version.clone(),
            index,
        }
    }
}

/// Resolves and caches the direct children of snapshot elements.
///
/// The cache lives as long as the resolver, so one resolver should be created per
/// processing session and not shared between unrelated sessions.
pub struct ChildMapResolver<'a> {
    context: &'a dyn FhirContext,
    cache: HashMap<ElementKey, Arc<Vec<ElementDefinition>>>,
}

impl<'a> ChildMapResolver<'a> {
    pub fn new(context: &'a dyn FhirContext) -> Self {
        Self {
            context,
            cache: HashMap::new(),
        }
    }

    /// Direct children of `element`, which must be an entry of `profile`'s snapshot.
    ///
    /// The element is located by reference, so a clone with an identical path is rejected.
    pub fn children(
        &mut self,
        profile: &StructureDefinition,
        element: &ElementDefinition,
    ) -> Result<Arc<Vec<ElementDefinition>>> {
        let snapshot = profile
            .snapshot
            .as_ref()
            .ok_or_else(|| Error::MissingSnapshot(profile.url.clone()))?;
        let index = snapshot
            .position_of(element)
            .ok_or_else(|| Error::ElementNotInSnapshot {
                path: element.path.clone(),
                url: profile.url.clone(),
            })?;
        self.children_at(profile, index)
    }

    /// Direct children of the snapshot entry at `index`.
    pub fn children_at(
        &mut self,
        profile: &StructureDefinition,
        index: usize,
    ) -> Result<Arc<Vec<ElementDefinition>>> {
        let mut visited = HashSet::new();
        self.resolve(profile, index, &mut visited)
    }

    /// Number of elements whose children are cached
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn resolve(
        &mut self,
        profile: &StructureDefinition,
        index: usize,
        visited: &mut HashSet<ElementKey>,
    ) -> Result<Arc<Vec<ElementDefinition>>> {
        let elements = snapshot_of(profile)?;
        let element = elements
            .get(index)
            .ok_or_else(|| Error::ElementNotInSnapshot {
                path: format!("#{}", index),
                url: profile.url.clone(),
            })?;
        let key = ElementKey::new(profile, index);

        let Some(reference) = element.content_reference.as_deref() else {
            if let Some(hit) = self.cache.get(&key) {
                return Ok(Arc::clone(hit));
            }
            let children = Arc::new(direct_children(elements, index));
            tracing::debug!(
                path = %element.path,
                children = children.len(),
                "resolved child map"
            );
            self.cache.insert(key, Arc::clone(&children));
            return Ok(children);
        };

        if !visited.insert(key) {
            return Err(Error::CircularContentReference {
                reference: reference.to_string(),
                path: element.path.clone(),
            });
        }

        let unresolved = || Error::UnresolvedContentReference {
            reference: reference.to_string(),
            path: element.path.clone(),
        };

        match parse_content_reference(reference) {
            Some(ContentReference::Local(id)) => {
                let target = position_by_id(elements, id).ok_or_else(unresolved)?;
                self.resolve(profile, target, visited)
            }
            Some(ContentReference::External { url, id }) => {
                let target_sd = self
                    .context
                    .get_structure_definition(url)?
                    .ok_or_else(|| Error::ContentReference {
                        reference: reference.to_string(),
                        path: element.path.clone(),
                    })?;
                let target = position_by_id(snapshot_of(&target_sd)?, id).ok_or_else(unresolved)?;
                tracing::debug!(reference, url, "following external contentReference");
                self.resolve(&target_sd, target, visited)
            }
            None => Err(Error::ContentReference {
                reference: reference.to_string(),
                path: element.path.clone(),
            }),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ContentReference<'r> {
    Local(&'r str),
    External { url: &'r str, id: &'r str },
}

fn parse_content_reference(reference: &str) -> Option<ContentReference<'_>> {
    if let Some(id) = reference.strip_prefix('#') {
        return Some(ContentReference::Local(id));
    }
    reference
        .split_once('#')
        .map(|(url, id)| ContentReference::External { url, id })
}

fn snapshot_of(profile: &StructureDefinition) -> Result<&[ElementDefinition]> {
    profile
        .snapshot
        .as_ref()
        .map(|s| s.element.as_slice())
        .ok_or_else(|| Error::MissingSnapshot(profile.url.clone()))
}

fn position_by_id(elements: &[ElementDefinition], id: &str) -> Option<usize> {
    elements.iter().position(|e| e.id.as_deref() == Some(id))
}

/// Single forward pass: descendants are contiguous, so the scan stops at the first non-descendant.
fn direct_children(elements: &[ElementDefinition], index: usize) -> Vec<ElementDefinition> {
    let parent = &elements[index].path;
    elements[index + 1..]
        .iter()
        .take_while(|e| e.is_descendant_of(parent))
        .filter(|e| e.is_child_of(parent))
        .cloned()
        .collect()
}
