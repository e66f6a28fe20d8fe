use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::domain::{Cid, CompoundQuery};
use crate::http::HttpFetcher;
use crate::table::DataTable;

const PUG_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
const PUG_VIEW_BASE: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug_view";

/// Computed descriptors requested from the PUG property endpoint, in the
/// order they appear in the basic-properties table.
const BASIC_PROPERTY_KEYS: [&str; 13] = [
    "IUPACName",
    "MolecularFormula",
    "MolecularWeight",
    "CanonicalSMILES",
    "IsomericSMILES",
    "InChIKey",
    "XLogP",
    "ExactMass",
    "TPSA",
    "HBondDonorCount",
    "HBondAcceptorCount",
    "RotatableBondCount",
    "Charge",
];

/// Identifier names selected out of the flattened document when the
/// property endpoint is unavailable.
const BASIC_FALLBACK_NAMES: [&str; 5] = [
    "IUPAC Name",
    "Molecular Formula",
    "InChIKey",
    "Canonical SMILES",
    "Isomeric SMILES",
];

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("static pattern compiles"));

/// Optional external name->CID source (a locally bound client library, a
/// cache, ...). Absent by default; when present it is consulted before any
/// network tier.
pub trait BoundCidSource: Send + Sync {
    fn cids_for_name(&self, name: &str) -> Option<Vec<u64>>;
}

pub trait PubchemClient: Send + Sync {
    fn resolve_cid(&self, query: &CompoundQuery) -> Option<Cid>;
    fn fetch_property_document(&self, cid: Cid) -> Option<Value>;
    fn fetch_basic_properties(&self, cid: Cid) -> Option<DataTable>;
    fn fetch_png_2d(&self, cid: Cid, pixels: u32) -> Option<Vec<u8>>;
    fn fetch_sdf_3d(&self, cid: Cid) -> Option<String>;
}

#[derive(Clone)]
pub struct PubchemHttpClient {
    http: HttpFetcher,
    pug_base: String,
    pug_view_base: String,
    bound: Option<Arc<dyn BoundCidSource>>,
}

impl PubchemHttpClient {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            pug_base: PUG_BASE.to_string(),
            pug_view_base: PUG_VIEW_BASE.to_string(),
            bound: None,
        }
    }

    pub fn with_bound_source(mut self, source: Arc<dyn BoundCidSource>) -> Self {
        self.bound = Some(source);
        self
    }

    /// Points both PUG endpoints at a different host (test stubs).
    pub fn with_base_urls(mut self, pug: impl Into<String>, pug_view: impl Into<String>) -> Self {
        self.pug_base = pug.into();
        self.pug_view_base = pug_view.into();
        self
    }

    fn cid_from_bound(&self, name: &str) -> Option<Cid> {
        let source = self.bound.as_ref()?;
        source
            .cids_for_name(name)
            .and_then(|ids| ids.first().copied())
            .map(Cid)
    }

    fn cid_from_json(&self, name: &str) -> Option<Cid> {
        let url = format!(
            "{}/compound/name/{}/cids/JSON",
            self.pug_base,
            urlencoding::encode(name)
        );
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        parse_cid_json(&response.text().ok()?)
    }

    fn cid_from_txt(&self, name: &str) -> Option<Cid> {
        let url = format!(
            "{}/compound/name/{}/cids/TXT",
            self.pug_base,
            urlencoding::encode(name)
        );
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        parse_cid_txt(&response.text().ok()?)
    }
}

impl PubchemClient for PubchemHttpClient {
    /// Name -> CID through the tier chain; every tier absorbs its own
    /// failures and a full miss is a normal outcome.
    fn resolve_cid(&self, query: &CompoundQuery) -> Option<Cid> {
        let tiers: [fn(&Self, &str) -> Option<Cid>; 3] = [
            Self::cid_from_bound,
            Self::cid_from_json,
            Self::cid_from_txt,
        ];
        tiers.iter().find_map(|tier| {
            let cid = tier(self, query.as_str());
            if cid.is_none() {
                tracing::debug!(compound = query.as_str(), "cid tier missed");
            }
            cid
        })
    }

    fn fetch_property_document(&self, cid: Cid) -> Option<Value> {
        let url = format!("{}/data/compound/{}/JSON", self.pug_view_base, cid);
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        response.json().ok()
    }

    fn fetch_basic_properties(&self, cid: Cid) -> Option<DataTable> {
        let url = format!(
            "{}/compound/cid/{}/property/{}/JSON",
            self.pug_base,
            cid,
            BASIC_PROPERTY_KEYS.join(",")
        );
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().ok()?;
        let record = body
            .get("PropertyTable")
            .and_then(|v| v.get("Properties"))
            .and_then(|v| v.as_array())
            .and_then(|properties| properties.first())?;

        let mut table = basic_properties_table();
        for key in BASIC_PROPERTY_KEYS {
            let text = property_text(record.get(key));
            if !text.is_empty() {
                table.push_row(vec![
                    key.to_string(),
                    text,
                    "PubChem (computed)".to_string(),
                ]);
            }
        }
        if table.is_empty() { None } else { Some(table) }
    }

    fn fetch_png_2d(&self, cid: Cid, pixels: u32) -> Option<Vec<u8>> {
        let url = format!(
            "{}/compound/cid/{}/PNG?image_size={}x{}",
            self.pug_base, cid, pixels, pixels
        );
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        response.bytes().ok().map(|bytes| bytes.to_vec())
    }

    /// 3D conformer in chemical-table format. A body without a V2000/V3000
    /// marker is not a usable model and counts as a miss.
    fn fetch_sdf_3d(&self, cid: Cid) -> Option<String> {
        let url = format!("{}/compound/cid/{}/SDF?record_type=3d", self.pug_base, cid);
        let response = self.http.get(&url)?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().ok()?;
        if body.contains("V2000") || body.contains("V3000") {
            Some(body)
        } else {
            None
        }
    }
}

pub fn parse_cid_json(body: &str) -> Option<Cid> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("IdentifierList")?
        .get("CID")?
        .as_array()?
        .first()?
        .as_u64()
        .map(Cid)
}

pub fn parse_cid_txt(body: &str) -> Option<Cid> {
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(run) = DIGIT_RUN.find(line) {
            if let Ok(id) = run.as_str().parse::<u64>() {
                return Some(Cid(id));
            }
        }
    }
    None
}

/// Fallback basic-identifiers table built from an already-flattened
/// document when the property endpoint misses.
pub fn basic_properties_from_rows(rows: &[crate::flatten::FlatPropertyRow]) -> Option<DataTable> {
    let mut table = basic_properties_table();
    for wanted in BASIC_FALLBACK_NAMES {
        if let Some(row) = rows.iter().find(|row| row.property == wanted) {
            table.push_row(vec![
                row.property.clone(),
                row.value.clone(),
                "PubChem".to_string(),
            ]);
        }
    }
    if table.is_empty() { None } else { Some(table) }
}

fn basic_properties_table() -> DataTable {
    DataTable::new(vec![
        "Property".to_string(),
        "Value".to_string(),
        "Source".to_string(),
    ])
}

fn property_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}
