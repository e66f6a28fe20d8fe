use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

/// One flattened property: name, extracted value text, and the " > "-joined
/// chain of ancestor section headings it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FlatPropertyRow {
    pub property: String,
    pub value: String,
    pub source: String,
}

/// The value encodings an information item can carry, in extraction
/// priority order. Each tag has exactly one extraction function; the first
/// tag whose extraction is non-empty wins.
#[derive(Debug, Clone, Copy)]
pub enum ItemValue<'a> {
    Markup(&'a Value),
    Numeric(&'a Value),
    Table(&'a Value),
}

impl ItemValue<'_> {
    pub fn extract(&self) -> String {
        match self {
            ItemValue::Markup(value) => flatten_markup(value),
            ItemValue::Numeric(value) => render_numeric(value),
            ItemValue::Table(table) => render_table(table),
        }
    }
}

/// Flattens a PUG-View property document into rows. A document without
/// `Record.Section` yields an empty list; emitted rows never have an empty
/// value; exact-duplicate triples are removed, first occurrence kept.
pub fn flatten_document(document: &Value) -> Vec<FlatPropertyRow> {
    let mut rows = Vec::new();
    if let Some(sections) = document
        .get("Record")
        .and_then(|record| record.get("Section"))
        .and_then(|value| value.as_array())
    {
        let mut path = Vec::new();
        walk_sections(sections, &mut path, &mut rows);
    }
    dedup_rows(rows)
}

fn walk_sections(sections: &[Value], path: &mut Vec<String>, out: &mut Vec<FlatPropertyRow>) {
    for section in sections {
        let heading = section_heading(section);
        let pushed = !heading.is_empty();
        if pushed {
            path.push(heading.to_string());
        }
        let source = path.join(" > ");

        if let Some(items) = section.get("Information").and_then(|v| v.as_array()) {
            for info in items {
                let property = info
                    .get("Name")
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(if heading.is_empty() { "Property" } else { heading });
                if let Some(value) = extract_information_value(info) {
                    out.push(FlatPropertyRow {
                        property: property.to_string(),
                        value,
                        source: source.clone(),
                    });
                }
            }
        }

        // A table attached to the section itself, as opposed to one inside
        // an information item.
        if let Some(table) = section.get("Table").filter(|t| t.is_object()) {
            let rendered = render_table(table);
            if !rendered.is_empty() {
                let property = table
                    .get("Title")
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|title| !title.is_empty())
                    .unwrap_or(if heading.is_empty() { "Table" } else { heading });
                out.push(FlatPropertyRow {
                    property: property.to_string(),
                    value: rendered,
                    source: source.clone(),
                });
            }
        }

        if let Some(children) = section.get("Section").and_then(|v| v.as_array()) {
            walk_sections(children, path, out);
        }
        if pushed {
            path.pop();
        }
    }
}

fn section_heading(section: &Value) -> &str {
    section
        .get("TOCHeading")
        .or_else(|| section.get("Name"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

/// Classifies an information item into its candidate encodings, priority
/// ordered. A markup-bearing value that flattens to nothing falls through
/// to the numeric encoding, then to an item-level table.
pub fn classify_information(info: &Value) -> Vec<ItemValue<'_>> {
    let mut candidates = Vec::new();
    if let Some(value) = info.get("Value") {
        if value.get("StringWithMarkup").is_some()
            || value.get("String").is_some()
            || value.get("List").is_some()
        {
            candidates.push(ItemValue::Markup(value));
        }
        if value.get("Number").is_some() {
            candidates.push(ItemValue::Numeric(value));
        }
    }
    if let Some(table) = info.get("Table").filter(|t| t.is_object()) {
        candidates.push(ItemValue::Table(table));
    }
    candidates
}

pub fn extract_information_value(info: &Value) -> Option<String> {
    classify_information(info)
        .into_iter()
        .map(|candidate| candidate.extract())
        .find(|text| !text.is_empty())
}

/// Recursively collapses a string-with-markup / nested-list value into one
/// space-joined string.
pub fn flatten_markup(value: &Value) -> String {
    let mut parts = Vec::new();
    collect_markup(value, &mut parts);
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn collect_markup(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(text) = map.get("String") {
                out.push(scalar_text(text));
            }
            if let Some(Value::Array(items)) = map.get("StringWithMarkup") {
                for item in items {
                    collect_markup(item, out);
                }
            }
            if let Some(Value::Array(items)) = map.get("List") {
                for item in items {
                    collect_markup(item, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_markup(item, out);
            }
        }
        Value::Null => {}
        other => out.push(scalar_text(other)),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

/// Renders a numeric value as `"{numbers} {unit}"`, unit optional. The
/// `Number` field may be a single number or a list of them.
pub fn render_numeric(value: &Value) -> String {
    let numbers = match value.get("Number") {
        Some(Value::Array(items)) => items
            .iter()
            .map(scalar_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };
    if numbers.is_empty() {
        return String::new();
    }
    let unit = value
        .get("Unit")
        .or_else(|| value.get("Units"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    format!("{numbers} {unit}").trim().to_string()
}

/// Renders a table value: `"header: cell | ..."` per row when the header
/// count matches the cell count, plain `"cell | cell"` otherwise; non-empty
/// rows joined with "; "; title prefixed only when both title and body are
/// non-empty.
pub fn render_table(table: &Value) -> String {
    let headers: Vec<String> = table
        .get("Columns")
        .and_then(|v| v.as_array())
        .map(|columns| {
            columns
                .iter()
                .map(|column| {
                    column
                        .get("Name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .trim()
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let mut rendered_rows = Vec::new();
    if let Some(rows) = table.get("Row").and_then(|v| v.as_array()) {
        for row in rows {
            let cells: Vec<String> = row
                .get("Cell")
                .and_then(|v| v.as_array())
                .map(|cells| cells.iter().map(flatten_markup).collect())
                .unwrap_or_default();
            let row_text = if !headers.is_empty() && headers.len() == cells.len() {
                headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(header, cell)| format!("{header}: {cell}"))
                    .collect::<Vec<_>>()
                    .join(" | ")
            } else {
                cells.join(" | ")
            };
            let row_text = row_text.trim().to_string();
            if !row_text.is_empty() {
                rendered_rows.push(row_text);
            }
        }
    }

    let title = table
        .get("Title")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim();
    let body = rendered_rows.join("; ");
    if !title.is_empty() && !body.is_empty() {
        format!("{title}: {body}")
    } else if !body.is_empty() {
        body
    } else {
        title.to_string()
    }
}

fn dedup_rows(rows: Vec<FlatPropertyRow>) -> Vec<FlatPropertyRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}
