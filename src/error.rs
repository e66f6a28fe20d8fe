use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("invalid compound name: {0}")]
    InvalidCompoundName(String),

    #[error("no ChEMBL entry for '{0}'")]
    NotFound(String),

    #[error("http client construction failed: {0}")]
    Http(String),

    #[error("ChEMBL request failed: {0}")]
    ChemblHttp(String),

    #[error("ChEMBL returned status {status}: {message}")]
    ChemblStatus { status: u16, message: String },

    #[error("unknown table column: {0}")]
    InvalidColumn(String),

    #[error("unsupported export format: {0}")]
    UnsupportedExportFormat(String),

    #[error("spreadsheet encoding failed: {0}")]
    Spreadsheet(String),

    #[error("missing config file chembl-report.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
