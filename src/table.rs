use std::cmp::Ordering;

use serde::Serialize;

use crate::domain::SortDirection;
use crate::error::ReportError;
use crate::flatten::FlatPropertyRow;

/// A flat table of string cells with named columns. Rows keep a dense
/// 0-based order; sorting and filtering rewrite that order in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Mixed-type sort on one column. The column sorts numerically when at
    /// least half of its non-missing cells parse as numbers (missing cells
    /// last in either direction, ties keep first-seen order), and by
    /// case-folded text otherwise.
    pub fn sort_by_column(
        &mut self,
        column: &str,
        direction: SortDirection,
    ) -> Result<(), ReportError> {
        let index = self
            .column_index(column)
            .ok_or_else(|| ReportError::InvalidColumn(column.to_string()))?;

        let keys: Vec<Option<f64>> = self
            .rows
            .iter()
            .map(|row| parse_cell_number(row.get(index).map(String::as_str).unwrap_or("")))
            .collect();
        let non_missing = self
            .rows
            .iter()
            .filter(|row| {
                !row.get(index)
                    .map(String::as_str)
                    .unwrap_or("")
                    .trim()
                    .is_empty()
            })
            .count();
        let parsed = keys.iter().filter(|key| key.is_some()).count();

        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        if parsed > 0 && parsed * 2 >= non_missing {
            order.sort_by(|&a, &b| compare_numeric(keys[a], keys[b], direction));
        } else {
            let folded: Vec<String> = self
                .rows
                .iter()
                .map(|row| {
                    row.get(index)
                        .map(String::as_str)
                        .unwrap_or("")
                        .to_lowercase()
                })
                .collect();
            order.sort_by(|&a, &b| {
                let ordering = folded[a].cmp(&folded[b]);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for position in order {
            rows.push(std::mem::take(&mut self.rows[position]));
        }
        self.rows = rows;
        Ok(())
    }
}

fn parse_cell_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn compare_numeric(a: Option<f64>, b: Option<f64>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Packs classified property rows into the fixed Property/Value/Source
/// table shape.
pub fn table_from_flat_rows(rows: &[FlatPropertyRow]) -> DataTable {
    let mut table = DataTable::new(vec![
        "Property".to_string(),
        "Value".to_string(),
        "Source".to_string(),
    ]);
    for row in rows {
        table.push_row(vec![
            row.property.clone(),
            row.value.clone(),
            row.source.clone(),
        ]);
    }
    table
}
