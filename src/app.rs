use std::time::Duration;

use serde::Serialize;

use crate::chembl::{ChemblClient, build_activity_table, resolve_target_names};
use crate::classify::classify;
use crate::domain::{ChemblId, Cid, CompoundQuery, SortDirection};
use crate::error::ReportError;
use crate::flatten::flatten_document;
use crate::pubchem::{PubchemClient, basic_properties_from_rows};
use crate::table::{DataTable, table_from_flat_rows};

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Activity types to keep; empty means no filter.
    pub activity_types: Vec<String>,
    pub sort_column: String,
    pub sort_direction: SortDirection,
    pub fetch_structures: bool,
    pub image_pixels: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            activity_types: Vec::new(),
            sort_column: "Target".to_string(),
            sort_direction: SortDirection::Asc,
            fetch_structures: true,
            image_pixels: 320,
        }
    }
}

/// Everything one query produced. Data-irregularity conditions never abort
/// the run; they degrade to `None` fields plus a user-visible message.
#[derive(Debug, Clone, Serialize)]
pub struct CompoundReport {
    pub compound: String,
    pub generated_at: String,
    pub chembl_id: Option<ChemblId>,
    pub bioactivity: Option<DataTable>,
    pub cid: Option<Cid>,
    pub basic_properties: Option<DataTable>,
    pub experimental_properties: Option<DataTable>,
    #[serde(skip)]
    pub image_2d: Option<Vec<u8>>,
    #[serde(skip)]
    pub structure_3d: Option<String>,
    pub messages: Vec<String>,
}

impl CompoundReport {
    fn new(compound: &CompoundQuery) -> Self {
        Self {
            compound: compound.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            chembl_id: None,
            bioactivity: None,
            cid: None,
            basic_properties: None,
            experimental_properties: None,
            image_2d: None,
            structure_3d: None,
            messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<C: ChemblClient, P: PubchemClient> {
    chembl: C,
    pubchem: P,
}

impl<C: ChemblClient, P: PubchemClient> App<C, P> {
    pub fn new(chembl: C, pubchem: P) -> Self {
        Self { chembl, pubchem }
    }

    /// Bioactivity table for one compound: resolve, fetch, join target
    /// names, build. An unresolvable name fails with `NotFound` before any
    /// activity fetch is issued.
    pub fn bioactivity_table(&self, query: &CompoundQuery) -> Result<DataTable, ReportError> {
        let id = self.chembl.resolve_molecule(query)?;
        self.activity_table_for(&id)
    }

    fn activity_table_for(&self, id: &ChemblId) -> Result<DataTable, ReportError> {
        let records = self.chembl.fetch_activities(id)?;
        let names = resolve_target_names(&self.chembl, &records);
        Ok(build_activity_table(&records, &names))
    }

    /// Runs the full report. ChEMBL failures and every PubChem miss are
    /// absorbed into `messages`; the only hard errors out of here are
    /// programmer errors (an unknown sort column).
    pub fn run(
        &self,
        query: &CompoundQuery,
        options: &QueryOptions,
        sink: &dyn ProgressSink,
    ) -> Result<CompoundReport, ReportError> {
        let mut report = CompoundReport::new(query);

        sink.event(ProgressEvent {
            message: format!("phase=ChEMBL; resolving molecule {query}"),
            elapsed: None,
        });
        match self.chembl.resolve_molecule(query) {
            Ok(id) => {
                sink.event(ProgressEvent {
                    message: format!("phase=ChEMBL; fetching activities for {id}"),
                    elapsed: None,
                });
                match self.activity_table_for(&id) {
                    Ok(mut table) => {
                        if !options.activity_types.is_empty() {
                            if let Some(index) = table.column_index("Activity") {
                                table.retain(|row| {
                                    options.activity_types.iter().any(|kind| {
                                        row.get(index).map(String::as_str) == Some(kind.as_str())
                                    })
                                });
                            }
                        }
                        if table.is_empty() {
                            report
                                .messages
                                .push("No human bioactivity rows returned by ChEMBL.".to_string());
                        } else {
                            table.sort_by_column(&options.sort_column, options.sort_direction)?;
                        }
                        report.bioactivity = Some(table);
                    }
                    Err(err) => report.messages.push(format!("ChEMBL error: {err}")),
                }
                report.chembl_id = Some(id);
            }
            Err(err) => report.messages.push(format!("ChEMBL error: {err}")),
        }

        sink.event(ProgressEvent {
            message: format!("phase=PubChem; resolving CID for {query}"),
            elapsed: None,
        });
        let Some(cid) = self.pubchem.resolve_cid(query) else {
            report
                .messages
                .push("PubChem lookup failed; structure/properties unavailable.".to_string());
            return Ok(report);
        };
        report.cid = Some(cid);

        sink.event(ProgressEvent {
            message: format!("phase=PubChem; fetching property document for CID {cid}"),
            elapsed: None,
        });
        let document = self.pubchem.fetch_property_document(cid);
        let flat = document
            .as_ref()
            .map(flatten_document)
            .unwrap_or_default();

        report.basic_properties = self
            .pubchem
            .fetch_basic_properties(cid)
            .or_else(|| basic_properties_from_rows(&flat));

        if flat.is_empty() {
            report
                .messages
                .push("No experimental/computed properties found (or parse failed).".to_string());
        } else {
            report.experimental_properties = Some(table_from_flat_rows(&classify(&flat)));
        }

        if options.fetch_structures {
            sink.event(ProgressEvent {
                message: format!("phase=PubChem; fetching structures for CID {cid}"),
                elapsed: None,
            });
            report.image_2d = self.pubchem.fetch_png_2d(cid, options.image_pixels);
            if report.image_2d.is_none() {
                report
                    .messages
                    .push("Unable to render 2D structure (PNG retrieval failed).".to_string());
            }
            report.structure_3d = self.pubchem.fetch_sdf_3d(cid);
            if report.structure_3d.is_none() {
                report.messages.push(
                    "3D model unavailable: no PubChem 3D conformer found or retrieval failed."
                        .to_string(),
                );
            }
        }

        Ok(report)
    }
}
