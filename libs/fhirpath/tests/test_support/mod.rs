#![allow(dead_code)]

use fhirmap_context::InMemoryContext;
use serde_json::{json, Value};

pub const FHIR_NS: &str = "http://hl7.org/fhir/StructureDefinition/";

fn type_definition(name: &str, kind: &str, base: Option<&str>) -> Value {
    let mut sd = json!({
        "resourceType": "StructureDefinition",
        "url": format!("{}{}", FHIR_NS, name),
        "name": name,
        "status": "active",
        "kind": kind,
        "abstract": false,
        "type": name,
    });
    if let Some(base) = base {
        sd["baseDefinition"] = json!(base);
    }
    sd
}

/// Base
///  └─ Element
///      ├─ string ─ code
///      ├─ uri ─ url
///      ├─ integer
///      └─ Quantity ─ Age
pub fn core_types() -> Vec<Value> {
    let ns = |n: &str| format!("{}{}", FHIR_NS, n);
    vec![
        type_definition("Base", "complex-type", None),
        type_definition("Element", "complex-type", Some(&ns("Base"))),
        type_definition("string", "primitive-type", Some(&ns("Element"))),
        type_definition("code", "primitive-type", Some(&ns("string"))),
        type_definition("uri", "primitive-type", Some(&ns("Element"))),
        type_definition("url", "primitive-type", Some(&ns("uri"))),
        type_definition("integer", "primitive-type", Some(&ns("Element"))),
        type_definition("Quantity", "complex-type", Some(&ns("Element"))),
        type_definition("Age", "complex-type", Some(&ns("Quantity"))),
    ]
}

pub fn context() -> InMemoryContext {
    InMemoryContext::from_resources(core_types()).unwrap()
}

/// Two profiles deriving from each other.
pub fn circular_context() -> InMemoryContext {
    let a = "http://example.org/StructureDefinition/A";
    let b = "http://example.org/StructureDefinition/B";
    let mut first = type_definition("A", "complex-type", Some(b));
    first["url"] = json!(a);
    let mut second = type_definition("B", "complex-type", Some(a));
    second["url"] = json!(b);

    let mut resources = core_types();
    resources.push(first);
    resources.push(second);
    InMemoryContext::from_resources(resources).unwrap()
}
