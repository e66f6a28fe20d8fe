use std::collections::BTreeMap;

use serde_json::Value;

use crate::domain::{ChemblId, CompoundQuery};
use crate::error::ReportError;
use crate::http::HttpFetcher;
use crate::table::DataTable;

pub const ACTIVITY_COLUMNS: [&str; 5] = [
    "Target",
    "Activity",
    "Value",
    "Units",
    "Kd (nM) (from KA)",
];

/// Inverse-molar unit spellings accepted for the Ka -> Kd conversion.
const INVERSE_MOLAR_UNITS: [&str; 3] = ["M^-1", "M-1", "1/M"];

const PAGE_LIMIT: usize = 1000;
const MAX_PAGES: usize = 50;

/// One raw bioactivity measurement, projected down to the four fields the
/// report uses. Missing upstream fields arrive as empty strings; a missing
/// target id degrades to "Unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub target: String,
    pub activity_type: String,
    pub value: String,
    pub units: String,
}

pub trait ChemblClient: Send + Sync {
    fn resolve_molecule(&self, query: &CompoundQuery) -> Result<ChemblId, ReportError>;
    fn fetch_activities(&self, id: &ChemblId) -> Result<Vec<ActivityRecord>, ReportError>;
    fn fetch_target_name(&self, target_id: &str) -> Option<String>;
}

#[derive(Clone)]
pub struct ChemblHttpClient {
    http: HttpFetcher,
    base_url: String,
}

impl ChemblHttpClient {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            base_url: "https://www.ebi.ac.uk".to_string(),
        }
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ReportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "ChEMBL request failed".to_string());
        Err(ReportError::ChemblStatus { status, message })
    }

    fn get_json(&self, url: &str) -> Result<Value, ReportError> {
        let response = self
            .http
            .get(url)
            .ok_or_else(|| ReportError::ChemblHttp("retry budget exhausted".to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| ReportError::ChemblHttp(err.to_string()))
    }

    fn molecule_url(&self, query: &CompoundQuery) -> String {
        format!(
            "{}/chembl/api/data/molecule.json?pref_name__iexact={}&only=molecule_chembl_id",
            self.base_url,
            urlencoding::encode(query.as_str())
        )
    }

    fn activities_url(&self, id: &ChemblId) -> String {
        format!(
            "{}/chembl/api/data/activity.json?molecule_chembl_id={}&target_organism__iexact=Homo%20sapiens&only=target_chembl_id,standard_type,standard_value,standard_units&limit={}",
            self.base_url,
            urlencoding::encode(id.as_str()),
            PAGE_LIMIT
        )
    }

    fn target_url(&self, target_id: &str) -> String {
        format!(
            "{}/chembl/api/data/target/{}.json?only=pref_name",
            self.base_url,
            urlencoding::encode(target_id)
        )
    }
}

impl ChemblClient for ChemblHttpClient {
    fn resolve_molecule(&self, query: &CompoundQuery) -> Result<ChemblId, ReportError> {
        let body = self.get_json(&self.molecule_url(query))?;
        body.get("molecules")
            .and_then(|v| v.as_array())
            .and_then(|molecules| molecules.first())
            .and_then(|molecule| molecule.get("molecule_chembl_id"))
            .and_then(|v| v.as_str())
            .map(ChemblId::new)
            .ok_or_else(|| ReportError::NotFound(query.to_string()))
    }

    fn fetch_activities(&self, id: &ChemblId) -> Result<Vec<ActivityRecord>, ReportError> {
        let mut url = self.activities_url(id);
        let mut records = Vec::new();
        for _ in 0..MAX_PAGES {
            let page = self.get_json(&url)?;
            let (mut batch, next) = parse_activity_page(&page);
            records.append(&mut batch);
            match next {
                Some(path) => url = format!("{}{}", self.base_url, path),
                None => break,
            }
        }
        Ok(records)
    }

    fn fetch_target_name(&self, target_id: &str) -> Option<String> {
        let response = self.http.get(&self.target_url(target_id))?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().ok()?;
        body.get("pref_name")
            .and_then(|v| v.as_str())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
    }
}

/// Parses one activity result page into records plus the relative path of
/// the next page, if any.
pub fn parse_activity_page(page: &Value) -> (Vec<ActivityRecord>, Option<String>) {
    let mut records = Vec::new();
    if let Some(items) = page.get("activities").and_then(|v| v.as_array()) {
        for item in items {
            let target = field_text(item, "target_chembl_id");
            records.push(ActivityRecord {
                target: if target.is_empty() {
                    "Unknown".to_string()
                } else {
                    target
                },
                activity_type: field_text(item, "standard_type"),
                value: field_text(item, "standard_value"),
                units: field_text(item, "standard_units"),
            });
        }
    }
    let next = page
        .get("page_meta")
        .and_then(|v| v.get("next"))
        .and_then(|v| v.as_str())
        .map(|path| path.to_string());
    (records, next)
}

fn field_text(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Kd in nanomolar, derived from an association constant. Only computed for
/// activity type "KA" with an inverse-molar unit and a parseable non-zero
/// value; everything else is a miss, not an error.
pub fn kd_nanomolar(activity_type: &str, value: &str, units: &str) -> Option<f64> {
    if !activity_type.eq_ignore_ascii_case("KA") {
        return None;
    }
    if !INVERSE_MOLAR_UNITS.contains(&units.trim()) {
        return None;
    }
    let ka: f64 = value.trim().parse().ok()?;
    if ka == 0.0 || !ka.is_finite() {
        return None;
    }
    let kd_nm = 1e9 / ka;
    Some((kd_nm * 1000.0).round() / 1000.0)
}

/// Resolves display names for every distinct target id in `records`.
/// A lookup miss falls back to the raw id, so the map is total over the
/// record set.
pub fn resolve_target_names<C: ChemblClient + ?Sized>(
    client: &C,
    records: &[ActivityRecord],
) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();
    for record in records {
        if names.contains_key(&record.target) {
            continue;
        }
        let name = client
            .fetch_target_name(&record.target)
            .unwrap_or_else(|| record.target.clone());
        names.insert(record.target.clone(), name);
    }
    names
}

/// Builds the bioactivity table: fixed column order, target names
/// substituted, derived Kd column, rows with an empty raw value dropped.
pub fn build_activity_table(
    records: &[ActivityRecord],
    names: &BTreeMap<String, String>,
) -> DataTable {
    let mut table = DataTable::new(ACTIVITY_COLUMNS.iter().map(|c| c.to_string()).collect());
    for record in records {
        if record.value.is_empty() {
            continue;
        }
        let target = names
            .get(&record.target)
            .cloned()
            .unwrap_or_else(|| record.target.clone());
        let kd = kd_nanomolar(&record.activity_type, &record.value, &record.units)
            .map(format_kd)
            .unwrap_or_default();
        table.push_row(vec![
            target,
            record.activity_type.clone(),
            record.value.clone(),
            record.units.clone(),
            kd,
        ]);
    }
    table
}

fn format_kd(kd: f64) -> String {
    if kd.fract() == 0.0 {
        format!("{kd:.1}")
    } else {
        kd.to_string()
    }
}
