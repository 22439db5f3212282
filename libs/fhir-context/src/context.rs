use crate::error::{Error, Result};
use fhirmap_models::StructureDefinition;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Read access to conformance resources by canonical URL.
///
/// A missing resource is `Ok(None)`; callers decide whether that is fatal.
pub trait FhirContext: Send + Sync {
    /// Look up a raw resource by canonical URL, optionally pinned to a business version.
    fn get_resource_by_url(
        &self,
        canonical_url: &str,
        version: Option<&str>,
    ) -> Result<Option<Arc<Value>>>;

    /// Latest known version of a resource.
    fn get_latest_resource_by_url(&self, canonical_url: &str) -> Result<Option<Arc<Value>>> {
        let (url, version) = split_canonical(canonical_url);
        self.get_resource_by_url(url, version)
    }

    /// Typed StructureDefinition lookup.
    ///
    /// Resources of any other type under the same URL are reported as absent.
    fn get_structure_definition(
        &self,
        canonical_url: &str,
    ) -> Result<Option<Arc<StructureDefinition>>> {
        let Some(resource) = self.get_latest_resource_by_url(canonical_url)? else {
            return Ok(None);
        };
        if resource.get("resourceType").and_then(Value::as_str) != Some("StructureDefinition") {
            return Ok(None);
        }
        let sd: StructureDefinition = serde_json::from_value(Arc::unwrap_or_clone(resource))?;
        Ok(Some(Arc::new(sd)))
    }
}

impl<C: FhirContext + ?Sized> FhirContext for Arc<C> {
    fn get_resource_by_url(
        &self,
        canonical_url: &str,
        version: Option<&str>,
    ) -> Result<Option<Arc<Value>>> {
        (**self).get_resource_by_url(canonical_url, version)
    }

    fn get_structure_definition(
        &self,
        canonical_url: &str,
    ) -> Result<Option<Arc<StructureDefinition>>> {
        (**self).get_structure_definition(canonical_url)
    }
}

/// Split `url|version` into its parts.
pub fn split_canonical(canonical: &str) -> (&str, Option<&str>) {
    match canonical.split_once('|') {
        Some((url, version)) if !version.is_empty() => (url, Some(version)),
        Some((url, _)) => (url, None),
        None => (canonical, None),
    }
}

/// A [`FhirContext`] over resources held in memory.
///
/// Several versions of one canonical URL may be registered; unversioned lookups
/// return the most recently added one. Parsed StructureDefinitions are cached by
/// canonical URL for reuse across lookups.
#[derive(Default)]
pub struct InMemoryContext {
    by_url: HashMap<String, Vec<Arc<Value>>>,
    parsed: RwLock<HashMap<String, Arc<StructureDefinition>>>,
}

impl InMemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from raw JSON resources.
    pub fn from_resources<I>(resources: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut ctx = Self::new();
        for resource in resources {
            ctx.add_resource(resource)?;
        }
        Ok(ctx)
    }

    /// Build a context from typed StructureDefinitions.
    pub fn from_structure_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = StructureDefinition>,
    {
        let mut ctx = Self::new();
        for sd in definitions {
            ctx.add_structure_definition(&sd)?;
        }
        Ok(ctx)
    }

    /// Register a raw resource under its `url`.
    pub fn add_resource(&mut self, resource: Value) -> Result<()> {
        let url = resource
            .get("url")
            .and_then(Value::as_str)
            .ok_or(Error::MissingUrl)?
            .to_string();

        self.invalidate(&url)?;
        tracing::debug!(url = %url, "registering conformance resource");
        self.by_url.entry(url).or_default().push(Arc::new(resource));
        Ok(())
    }

    pub fn add_structure_definition(&mut self, sd: &StructureDefinition) -> Result<()> {
        self.add_resource(serde_json::to_value(sd)?)
    }

    /// Number of distinct canonical URLs known to the context
    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    fn invalidate(&self, url: &str) -> Result<()> {
        let mut parsed = self
            .parsed
            .write()
            .map_err(|e| Error::ConformanceStore(e.to_string()))?;
        parsed.retain(|key, _| split_canonical(key).0 != url);
        Ok(())
    }
}

impl FhirContext for InMemoryContext {
    fn get_resource_by_url(
        &self,
        canonical_url: &str,
        version: Option<&str>,
    ) -> Result<Option<Arc<Value>>> {
        let Some(candidates) = self.by_url.get(canonical_url) else {
            return Ok(None);
        };
        let found = match version {
            Some(version) => candidates
                .iter()
                .rev()
                .find(|r| r.get("version").and_then(Value::as_str) == Some(version)),
            None => candidates.last(),
        };
        Ok(found.cloned())
    }

    fn get_structure_definition(
        &self,
        canonical_url: &str,
    ) -> Result<Option<Arc<StructureDefinition>>> {
        if let Some(hit) = self
            .parsed
            .read()
            .ok()
            .and_then(|m| m.get(canonical_url).cloned())
        {
            return Ok(Some(hit));
        }

        let Some(resource) = self.get_latest_resource_by_url(canonical_url)? else {
            return Ok(None);
        };
        if resource.get("resourceType").and_then(Value::as_str) != Some("StructureDefinition") {
            return Ok(None);
        }

        let sd = Arc::new(StructureDefinition::from_value(&resource).map_err(|e| {
            Error::InvalidStructureDefinition(format!("{}: {}", canonical_url, e))
        })?);
        if let Ok(mut m) = self.parsed.write() {
            m.insert(canonical_url.to_string(), Arc::clone(&sd));
        }
        Ok(Some(sd))
    }
}
