use fhirmap_models::common::{
    DiscriminatorType, SlicingRules, StructureDefinition, StructureDefinitionKind,
    TypeDerivationRule,
};
use serde_json::json;

fn extension_profile() -> serde_json::Value {
    json!({
        "resourceType": "StructureDefinition",
        "id": "patient-with-race",
        "url": "http://example.org/fhir/StructureDefinition/patient-with-race",
        "name": "PatientWithRace",
        "status": "draft",
        "kind": "resource",
        "abstract": false,
        "type": "Patient",
        "baseDefinition": "http://hl7.org/fhir/StructureDefinition/Patient",
        "derivation": "constraint",
        "differential": {
            "element": [
                { "id": "Patient", "path": "Patient" },
                {
                    "id": "Patient.extension",
                    "path": "Patient.extension",
                    "slicing": {
                        "discriminator": [{ "type": "value", "path": "url" }],
                        "ordered": false,
                        "rules": "open"
                    }
                },
                {
                    "id": "Patient.extension:race",
                    "path": "Patient.extension",
                    "sliceName": "race",
                    "min": 0,
                    "max": "1",
                    "type": [{
                        "code": "Extension",
                        "profile": ["http://example.org/fhir/StructureDefinition/race"]
                    }]
                }
            ]
        }
    })
}

#[test]
fn parse_constraint_profile() {
    let sd: StructureDefinition = serde_json::from_value(extension_profile()).unwrap();

    assert_eq!(sd.resource_type, "StructureDefinition");
    assert_eq!(sd.kind, StructureDefinitionKind::Resource);
    assert_eq!(sd.derivation, Some(TypeDerivationRule::Constraint));
    assert_eq!(sd.type_, "Patient");

    let elements = sd.differential_elements();
    assert_eq!(elements.len(), 3);

    let header = elements[1].slicing.as_ref().expect("slicing should be present");
    assert_eq!(header.rules, SlicingRules::Open);
    assert_eq!(header.discriminators().len(), 1);
    assert_eq!(
        header.discriminators()[0].discriminator_type,
        DiscriminatorType::Value
    );

    assert_eq!(elements[2].key(), "Patient.extension:race");
    assert_eq!(elements[2].type_codes(), vec!["Extension".to_string()]);
    assert_eq!(elements[2].cardinality_string(), "0..1");
}

#[test]
fn serialization_preserves_element_order() {
    let sd: StructureDefinition = serde_json::from_value(extension_profile()).unwrap();
    let value = serde_json::to_value(&sd).unwrap();

    let ids: Vec<&str> = value["differential"]["element"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["Patient", "Patient.extension", "Patient.extension:race"]
    );
}
