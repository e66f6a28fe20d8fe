use std::fs;

use serde_json::json;

use chembl_bioactivity_report::flatten::{
    FlatPropertyRow, extract_information_value, flatten_document, flatten_markup, render_numeric,
    render_table,
};

fn fixture() -> serde_json::Value {
    let raw = fs::read_to_string("tests/fixtures/pugview_scopolamine.json").unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn find<'a>(rows: &'a [FlatPropertyRow], property: &str) -> &'a FlatPropertyRow {
    rows.iter()
        .find(|row| row.property == property)
        .unwrap_or_else(|| panic!("missing row {property}"))
}

#[test]
fn flatten_fixture_document() {
    let rows = flatten_document(&fixture());
    assert_eq!(rows.len(), 8);

    let iupac = find(&rows, "IUPAC Name");
    assert!(iupac.value.starts_with("[(1R,2R,4S,5S)"));
    assert_eq!(
        iupac.source,
        "Names and Identifiers > Computed Descriptors > IUPAC Name"
    );

    // Item without its own name falls back to the section heading.
    let formula = find(&rows, "Molecular Formula");
    assert_eq!(formula.value, "C17H21NO4");
    assert_eq!(formula.source, "Names and Identifiers > Molecular Formula");

    let weight = find(&rows, "Molecular Weight");
    assert_eq!(weight.value, "303.4 g/mol");

    let xlogp = find(&rows, "XLogP3");
    assert_eq!(xlogp.value, "0.9");

    let solubility = find(&rows, "Solubility");
    assert_eq!(
        solubility.source,
        "Chemical and Physical Properties > Experimental Properties > Solubility"
    );

    // No row ever carries an empty value.
    assert!(rows.iter().all(|row| !row.value.trim().is_empty()));
}

#[test]
fn flatten_empty_documents() {
    assert!(flatten_document(&json!({})).is_empty());
    assert!(flatten_document(&json!({"Record": {"Section": []}})).is_empty());
    // Sections with neither information nor tables contribute nothing.
    let hollow = json!({"Record": {"Section": [
        {"TOCHeading": "Empty", "Section": [{"TOCHeading": "Also empty"}]}
    ]}});
    assert!(flatten_document(&hollow).is_empty());
}

#[test]
fn markup_flattening_recurses_and_joins() {
    let value = json!({
        "StringWithMarkup": [
            {"String": "Soluble in"},
            {"String": "water"},
            {"List": [{"String": "and"}, {"String": "ethanol"}]}
        ]
    });
    assert_eq!(flatten_markup(&value), "Soluble in water and ethanol");

    assert_eq!(flatten_markup(&json!({"String": "  "})).trim(), "");
    assert_eq!(flatten_markup(&json!(["a", 3, null, "b"])), "a 3 b");
}

#[test]
fn numeric_rendering() {
    assert_eq!(render_numeric(&json!({"Number": [158], "Unit": "°C"})), "158 °C");
    assert_eq!(render_numeric(&json!({"Number": [1.2, 3.4], "Units": "mg/L"})), "1.2, 3.4 mg/L");
    assert_eq!(render_numeric(&json!({"Number": [0.9]})), "0.9");
    assert_eq!(render_numeric(&json!({"Number": []})), "");
    assert_eq!(render_numeric(&json!({"Unit": "°C"})), "");
}

#[test]
fn empty_markup_falls_through_to_number() {
    let info = json!({
        "Name": "Boiling Point",
        "Value": {
            "StringWithMarkup": [{"String": ""}],
            "Number": [280.1],
            "Unit": "°C"
        }
    });
    assert_eq!(extract_information_value(&info).as_deref(), Some("280.1 °C"));
}

#[test]
fn information_without_extractable_value_is_skipped() {
    assert_eq!(extract_information_value(&json!({"Name": "Nothing"})), None);
    let blank = json!({"Name": "Blank", "Value": {"StringWithMarkup": [{"String": " "}]}});
    assert_eq!(extract_information_value(&blank), None);
}

#[test]
fn table_rendering_with_matching_headers() {
    let table = json!({
        "Title": "Dissociation Constants",
        "Columns": [{"Name": "pKa"}, {"Name": "Temperature"}],
        "Row": [
            {"Cell": [{"String": "7.75"}, {"String": "25 °C"}]},
            {"Cell": [{"String": "9.1"}, {"String": "20 °C"}]}
        ]
    });
    assert_eq!(
        render_table(&table),
        "Dissociation Constants: pKa: 7.75 | Temperature: 25 °C; pKa: 9.1 | Temperature: 20 °C"
    );
}

#[test]
fn table_rendering_with_mismatched_headers() {
    let table = json!({
        "Columns": [{"Name": "Only one"}],
        "Row": [{"Cell": [{"String": "a"}, {"String": "b"}]}]
    });
    assert_eq!(render_table(&table), "a | b");
}

#[test]
fn table_title_alone_survives() {
    let table = json!({"Title": "Empty body", "Row": []});
    assert_eq!(render_table(&table), "Empty body");
}

#[test]
fn section_level_table_emits_one_row() {
    let document = json!({"Record": {"Section": [{
        "TOCHeading": "Density",
        "Table": {
            "Columns": [{"Name": "Value"}],
            "Row": [{"Cell": [{"String": "1.02 g/cm3"}]}]
        }
    }]}});
    let rows = flatten_document(&document);
    assert_eq!(rows.len(), 1);
    // No table title, so the section heading names the row.
    assert_eq!(rows[0].property, "Density");
    assert_eq!(rows[0].value, "Value: 1.02 g/cm3");
    assert_eq!(rows[0].source, "Density");
}

#[test]
fn headingless_sections_do_not_extend_the_path() {
    let document = json!({"Record": {"Section": [{
        "Section": [{
            "TOCHeading": "Inner",
            "Information": [{"Name": "Key", "Value": {"String": "val"}}]
        }],
        "Information": [{"Value": {"String": "loose"}}]
    }]}});
    let rows = flatten_document(&document);
    assert_eq!(rows.len(), 2);
    // Item in the anonymous section: no name, no heading.
    assert_eq!(rows[0].property, "Property");
    assert_eq!(rows[0].source, "");
    assert_eq!(rows[1].property, "Key");
    assert_eq!(rows[1].source, "Inner");
}

#[test]
fn duplicate_rows_collapse() {
    let info = json!({"Name": "Color", "Value": {"String": "white"}});
    let document = json!({"Record": {"Section": [
        {"TOCHeading": "Appearance", "Information": [info.clone(), info]}
    ]}});
    let rows = flatten_document(&document);
    assert_eq!(rows.len(), 1);
}
