use std::fs;

use chembl_bioactivity_report::classify::classify;
use chembl_bioactivity_report::flatten::{FlatPropertyRow, flatten_document};

fn row(property: &str, value: &str, source: &str) -> FlatPropertyRow {
    FlatPropertyRow {
        property: property.to_string(),
        value: value.to_string(),
        source: source.to_string(),
    }
}

#[test]
fn named_properties_match_on_property_or_source() {
    let rows = vec![
        row("Melting Point", "59 °C", "Experimental Properties > Melting Point"),
        row("Other", "x", "Stability"),
        row("LogP", "0.98", "Octanol/Water Partition Coefficient"),
        row("Property", "white crystals", "Appearance"),
    ];
    let subset = classify(&rows);
    assert_eq!(subset.len(), 3);
    assert!(subset.iter().all(|r| r.property != "Other"));
}

#[test]
fn xlogp_variants_are_relevant() {
    let rows = vec![
        row("XLogP3", "0.9", "Computed Properties"),
        row("XLogP3-AA", "1.2", "Computed Properties"),
        row("Signal", "Danger", "GHS Classification"),
    ];
    let subset = classify(&rows);
    assert_eq!(subset.len(), 2);
}

#[test]
fn category_tier_widens_when_no_named_property_matches() {
    let rows = vec![
        row("Some Value", "1.5", "Chemical and Physical Properties > Other Experimental"),
        row("Another", "abc", "Safety and Hazards"),
    ];
    let subset = classify(&rows);
    // Only the row under a physical/chemical heading survives the second tier.
    assert_eq!(subset.len(), 1);
    assert_eq!(subset[0].property, "Some Value");
}

#[test]
fn classifier_never_returns_empty_for_nonempty_input() {
    let rows = vec![
        row("Alpha", "1", "Uninformative"),
        row("Beta", "2", "Uninformative"),
        row("Gamma", "3", "Uninformative"),
        row("Delta", "4", "Uninformative"),
        row("Epsilon", "5", "Uninformative"),
    ];
    let subset = classify(&rows);
    assert_eq!(subset, rows);
}

#[test]
fn classify_empty_input() {
    assert!(classify(&[]).is_empty());
}

#[test]
fn fixture_document_classifies_to_experimental_subset() {
    let raw = fs::read_to_string("tests/fixtures/pugview_scopolamine.json").unwrap();
    let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let rows = flatten_document(&document);
    let subset = classify(&rows);

    let properties: Vec<&str> = subset.iter().map(|r| r.property.as_str()).collect();
    assert!(properties.contains(&"Melting Point"));
    assert!(properties.contains(&"Solubility"));
    assert!(properties.contains(&"XLogP3"));
    assert!(!properties.contains(&"Signal"));
    assert!(!properties.contains(&"InChIKey"));
}
