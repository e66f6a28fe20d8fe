use std::io::Write;

use rust_xlsxwriter::Workbook;

use crate::domain::{Delimiter, ExportFormat};
use crate::error::ReportError;
use crate::table::DataTable;

pub const NO_DATA_PLACEHOLDER: &str = "No data to export";

/// Renders a table to a downloadable byte payload. An empty table still
/// produces a readable placeholder file.
pub fn export_table(
    table: &DataTable,
    format: ExportFormat,
    delimiter: Delimiter,
) -> Result<Vec<u8>, ReportError> {
    match format {
        ExportFormat::Csv => Ok(to_delimited(table, delimiter.as_char()).into_bytes()),
        ExportFormat::Xlsx => to_xlsx(table),
    }
}

pub fn to_delimited(table: &DataTable, sep: char) -> String {
    if table.is_empty() {
        return format!("{NO_DATA_PLACEHOLDER}\n");
    }
    let mut buf: Vec<u8> = Vec::new();
    let _ = write_row(&mut buf, &table.columns, sep);
    for row in &table.rows {
        let _ = write_row(&mut buf, row, sep);
    }
    match String::from_utf8(buf) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(&err.into_bytes()).into_owned(),
    }
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{sep}")?;
        } else {
            first = false;
        }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{escaped}\"")?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    writeln!(w)
}

pub fn to_xlsx(table: &DataTable) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    if table.is_empty() {
        worksheet
            .write_string(0, 0, NO_DATA_PLACEHOLDER)
            .map_err(|err| ReportError::Spreadsheet(err.to_string()))?;
    } else {
        for (col, header) in table.columns.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header)
                .map_err(|err| ReportError::Spreadsheet(err.to_string()))?;
        }
        for (row_index, row) in table.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                worksheet
                    .write_string(row_index as u32 + 1, col as u16, cell)
                    .map_err(|err| ReportError::Spreadsheet(err.to_string()))?;
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|err| ReportError::Spreadsheet(err.to_string()))
}
