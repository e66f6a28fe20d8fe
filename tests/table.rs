use assert_matches::assert_matches;

use chembl_bioactivity_report::domain::SortDirection;
use chembl_bioactivity_report::error::ReportError;
use chembl_bioactivity_report::table::DataTable;

fn table_with(values: &[&str]) -> DataTable {
    let mut table = DataTable::new(vec!["Value".to_string(), "Tag".to_string()]);
    for (index, value) in values.iter().enumerate() {
        table.push_row(vec![value.to_string(), format!("row{index}")]);
    }
    table
}

fn column(table: &DataTable, index: usize) -> Vec<String> {
    table.rows.iter().map(|row| row[index].clone()).collect()
}

#[test]
fn numeric_sort_with_missing_last() {
    let mut table = table_with(&["100", "", "2", "30", ""]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(column(&table, 0), vec!["2", "30", "100", "", ""]);

    table.sort_by_column("Value", SortDirection::Desc).unwrap();
    assert_eq!(column(&table, 0), vec!["100", "30", "2", "", ""]);
}

#[test]
fn numeric_sort_when_half_of_nonmissing_parse() {
    // 2 of 4 non-missing cells parse: numeric order, text last.
    let mut table = table_with(&["10", "abc", "2", "xyz"]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(column(&table, 0), vec!["2", "10", "abc", "xyz"]);
}

#[test]
fn lexical_sort_when_numbers_are_the_minority() {
    let mut table = table_with(&["10", "abc", "Xyz", "def"]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(column(&table, 0), vec!["10", "abc", "def", "Xyz"]);
}

#[test]
fn lexical_sort_casefolds() {
    let mut table = table_with(&["banana", "Apple", "cherry"]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(column(&table, 0), vec!["Apple", "banana", "cherry"]);

    table.sort_by_column("Value", SortDirection::Desc).unwrap();
    assert_eq!(column(&table, 0), vec!["cherry", "banana", "Apple"]);
}

#[test]
fn sorting_is_idempotent() {
    let mut table = table_with(&["30", "", "7", "7", "100"]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    let once = table.clone();
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(table, once);
}

#[test]
fn ties_keep_first_seen_order() {
    let mut table = table_with(&["5", "5", "1"]);
    table.sort_by_column("Value", SortDirection::Asc).unwrap();
    assert_eq!(column(&table, 1), vec!["row2", "row0", "row1"]);
}

#[test]
fn unknown_column_is_a_hard_error() {
    let mut table = table_with(&["1"]);
    let err = table
        .sort_by_column("Missing", SortDirection::Asc)
        .unwrap_err();
    assert_matches!(err, ReportError::InvalidColumn(_));
}

#[test]
fn retain_filters_rows_in_place() {
    let mut table = table_with(&["1", "2", "3"]);
    table.retain(|row| row[0] != "2");
    assert_eq!(table.len(), 2);
    assert_eq!(column(&table, 0), vec!["1", "3"]);
}
