#![allow(dead_code)]

use fhirmap_context::InMemoryContext;
use fhirmap_models::StructureDefinition;
use serde_json::{json, Value};

pub fn structure_definition(value: Value) -> StructureDefinition {
    serde_json::from_value(value)
        .unwrap_or_else(|e| panic!("Failed to deserialize StructureDefinition: {}", e))
}

/// Observation with `referenceRange` and a nested `component.referenceRange` content reference
pub fn sd_observation() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "url": "http://hl7.org/fhir/StructureDefinition/Observation",
        "name": "Observation",
        "status": "active",
        "kind": "resource",
        "abstract": false,
        "type": "Observation",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/DomainResource",
        "snapshot": {
            "element": [
                { "id": "Observation", "path": "Observation" },
                { "id": "Observation.status", "path": "Observation.status", "type": [{ "code": "code" }] },
                { "id": "Observation.referenceRange", "path": "Observation.referenceRange", "type": [{ "code": "BackboneElement" }] },
                { "id": "Observation.referenceRange.low", "path": "Observation.referenceRange.low", "type": [{ "code": "Quantity" }] },
                { "id": "Observation.referenceRange.high", "path": "Observation.referenceRange.high", "type": [{ "code": "Quantity" }] },
                { "id": "Observation.referenceRange.appliesTo", "path": "Observation.referenceRange.appliesTo", "type": [{ "code": "CodeableConcept" }] },
                { "id": "Observation.component", "path": "Observation.component", "type": [{ "code": "BackboneElement" }] },
                { "id": "Observation.component.code", "path": "Observation.component.code", "type": [{ "code": "CodeableConcept" }] },
                { "id": "Observation.component.referenceRange", "path": "Observation.component.referenceRange", "contentReference": "#Observation.referenceRange" }
            ]
        }
    })
}

/// Logical model borrowing Observation.referenceRange across structures
pub fn sd_lab_result() -> Value {
    json!({
        "resourceType": "StructureDefinition",
        "url": "http://example.org/fhir/StructureDefinition/LabResult",
        "name": "LabResult",
        "status": "draft",
        "kind": "logical",
        "abstract": false,
        "type": "LabResult",
        "snapshot": {
            "element": [
                { "id": "LabResult", "path": "LabResult" },
                { "id": "LabResult.range", "path": "LabResult.range", "contentReference": "http://hl7.org/fhir/StructureDefinition/Observation#Observation.referenceRange" },
                { "id": "LabResult.missing", "path": "LabResult.missing", "contentReference": "http://example.org/fhir/StructureDefinition/Unknown#Unknown.part" },
                { "id": "LabResult.dangling", "path": "LabResult.dangling", "contentReference": "http://hl7.org/fhir/StructureDefinition/Observation#Observation.nothing" }
            ]
        }
    })
}

pub fn context() -> InMemoryContext {
    InMemoryContext::from_resources([sd_observation(), sd_lab_result()])
        .expect("Failed to create in-memory context")
}
