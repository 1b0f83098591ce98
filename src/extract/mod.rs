// src/extract/mod.rs

pub mod table;

pub use table::{normalize_name, Table, TableSet};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::workbook::{CellValue, RawGrid};

/// Errors raised while segmenting a grid into tables. Row numbers in
/// messages are 1-based, matching what a spreadsheet UI shows.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source grid is empty")]
    EmptySource,

    #[error("malformed table '{table}' at row {row}: {message}")]
    MalformedTable {
        table: String,
        row: usize,
        message: String,
    },

    #[error("duplicate table name '{name}' at row {row}")]
    DuplicateTable { name: String, row: usize },
}

/// Scanner states for one top-to-bottom pass over the grid.
enum ScanState {
    /// Between tables, waiting for a row with exactly one non-empty cell.
    SeekingTitle,
    /// Title seen; the next row must supply the column labels.
    ReadingHeader { name: String, title_row: usize },
    /// Collecting data rows until a blank separator or the end of the grid.
    ReadingRows(PartialTable),
}

/// A table mid-extraction. Header columns remember their source column
/// index so data cells stay positionally aligned even when the header
/// row has gaps.
struct PartialTable {
    name: String,
    title_row: usize,
    columns: Vec<(usize, String)>,
    row_labels: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

/// Segment `grid` into named tables.
///
/// One forward scan drives a small state machine: a row with exactly one
/// non-empty cell opens a table and names it, the next row supplies the
/// column labels, and every following row is a data row until a blank
/// separator closes the table. Rows seen while seeking that have two or
/// more non-empty cells belong to no table and are skipped.
#[instrument(level = "debug", skip(grid), fields(rows = grid.height()))]
pub fn extract(grid: &RawGrid) -> Result<TableSet, ExtractError> {
    if grid.is_empty() {
        return Err(ExtractError::EmptySource);
    }

    let mut tables = TableSet::default();
    let mut state = ScanState::SeekingTitle;

    for (row_idx, row) in grid.rows().iter().enumerate() {
        state = match state {
            ScanState::SeekingTitle => match single_label(row) {
                Some(name) => ScanState::ReadingHeader {
                    name,
                    title_row: row_idx,
                },
                None => ScanState::SeekingTitle,
            },
            ScanState::ReadingHeader { name, title_row } => {
                ScanState::ReadingRows(read_header(name, title_row, row_idx, row)?)
            }
            ScanState::ReadingRows(mut partial) => {
                if is_blank(row) {
                    finish_table(&mut tables, partial)?;
                    ScanState::SeekingTitle
                } else {
                    read_data_row(&mut partial, row_idx, row)?;
                    ScanState::ReadingRows(partial)
                }
            }
        };
    }

    // The grid may end mid-table; a title with nothing under it cannot.
    match state {
        ScanState::SeekingTitle => {}
        ScanState::ReadingHeader { name, title_row } => {
            return Err(ExtractError::MalformedTable {
                table: name,
                row: title_row + 1,
                message: "table has no header row".to_string(),
            });
        }
        ScanState::ReadingRows(partial) => finish_table(&mut tables, partial)?,
    }

    debug!(tables = tables.len(), "extraction complete");
    Ok(tables)
}

/// Numeric coercion for matrix cells: numbers pass through, booleans count
/// as 1/0, and text parses as f64 with a trailing `%` read as a
/// percentage, so "5.5%" yields 0.055. Everything else is absent.
pub fn coerce_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if let Some(percent) = trimmed.strip_suffix('%') {
                return percent.trim().parse::<f64>().ok().map(|v| v / 100.0);
            }
            trimmed.parse::<f64>().ok()
        }
        CellValue::Empty => None,
    }
}

/// True for a separator row: no cells, or only empty cells.
fn is_blank(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

/// The table name, if `row` is a title row with exactly one non-empty cell.
fn single_label(row: &[CellValue]) -> Option<String> {
    let mut non_empty = row.iter().filter(|cell| !cell.is_empty());
    let first = non_empty.next()?;
    if non_empty.next().is_some() {
        return None;
    }
    first.label_text()
}

fn read_header(
    name: String,
    title_row: usize,
    row_idx: usize,
    row: &[CellValue],
) -> Result<PartialTable, ExtractError> {
    if is_blank(row) {
        return Err(ExtractError::MalformedTable {
            table: name,
            row: row_idx + 1,
            message: "header row has no labels".to_string(),
        });
    }
    // Column 0 holds row labels, so header labels start at column 1.
    let columns = row
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, cell)| cell.label_text().map(|label| (idx, label)))
        .collect();
    Ok(PartialTable {
        name,
        title_row,
        columns,
        row_labels: Vec::new(),
        values: Vec::new(),
    })
}

fn read_data_row(
    partial: &mut PartialTable,
    row_idx: usize,
    row: &[CellValue],
) -> Result<(), ExtractError> {
    let label = match row.first().and_then(CellValue::label_text) {
        Some(label) => label,
        None => {
            return Err(ExtractError::MalformedTable {
                table: partial.name.clone(),
                row: row_idx + 1,
                message: "data row has values but no label".to_string(),
            })
        }
    };
    let values = partial
        .columns
        .iter()
        .map(|&(idx, _)| row.get(idx).and_then(coerce_number))
        .collect();
    partial.row_labels.push(label);
    partial.values.push(values);
    Ok(())
}

fn finish_table(tables: &mut TableSet, partial: PartialTable) -> Result<(), ExtractError> {
    let title_row = partial.title_row;
    let table = Table {
        name: partial.name,
        row_labels: partial.row_labels,
        column_labels: partial.columns.into_iter().map(|(_, label)| label).collect(),
        values: partial.values,
    };
    debug!(
        table = %table.name,
        rows = table.row_labels.len(),
        columns = table.column_labels.len(),
        "table extracted"
    );
    tables.insert(table).map_err(|rejected| ExtractError::DuplicateTable {
        name: rejected.name,
        row: title_row + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn grid(rows: Vec<Vec<CellValue>>) -> RawGrid {
        RawGrid::from_rows(rows)
    }

    /// Two stacked tables in the shape of a capital-budgeting sheet.
    fn budget_grid() -> RawGrid {
        grid(vec![
            vec![text("INITIAL INVESTMENT")],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Initial Investment"), num(1000.0)],
            vec![text("Opportunity Cost (if any)"), num(200.0)],
            vec![text("Lifetime of the investment"), num(10.0)],
            Vec::new(),
            vec![text("GROWTH RATES")],
            vec![CellValue::Empty, num(1.0), num(2.0), num(3.0)],
            vec![text("Revenue Growth"), text("10%"), num(0.12), text("n/a")],
        ])
    }

    #[test]
    fn splits_stacked_tables_in_order() {
        let tables = extract(&budget_grid()).expect("extract");

        assert_eq!(tables.names(), vec!["INITIAL INVESTMENT", "GROWTH RATES"]);

        let investment = tables.get("INITIAL INVESTMENT").expect("table");
        assert_eq!(investment.column_labels, vec!["Amount"]);
        assert_eq!(
            investment.row_labels,
            vec![
                "Initial Investment",
                "Opportunity Cost (if any)",
                "Lifetime of the investment",
            ]
        );
        assert_eq!(
            investment.values,
            vec![vec![Some(1000.0)], vec![Some(200.0)], vec![Some(10.0)]]
        );
    }

    #[test]
    fn coerces_percent_text_and_leaves_junk_absent() {
        let tables = extract(&budget_grid()).expect("extract");
        let growth = tables.get("growth rates").expect("table");

        assert_eq!(growth.column_labels, vec!["1", "2", "3"]);
        assert_eq!(growth.values, vec![vec![Some(0.10), Some(0.12), None]]);
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(matches!(extract(&grid(Vec::new())), Err(ExtractError::EmptySource)));

        let blank_only = grid(vec![Vec::new(), vec![CellValue::Empty, text("  ")]]);
        assert!(matches!(extract(&blank_only), Err(ExtractError::EmptySource)));
    }

    #[test]
    fn grid_without_tables_yields_empty_set() {
        // Non-empty rows that never form a title: two or more filled cells.
        let tables = extract(&grid(vec![
            vec![text("a"), text("b")],
            vec![num(1.0), num(2.0), num(3.0)],
        ]))
        .expect("extract");

        assert!(tables.is_empty());
        assert_eq!(tables.names(), Vec::<String>::new());
    }

    #[test]
    fn preamble_rows_are_skipped() {
        let tables = extract(&grid(vec![
            vec![text("Prepared by"), text("Finance")],
            Vec::new(),
            vec![text("SALVAGE VALUE")],
            vec![CellValue::Empty, text("End of Year")],
            vec![text("Equipment"), num(20.0)],
        ]))
        .expect("extract");

        assert_eq!(tables.names(), vec!["SALVAGE VALUE"]);
    }

    #[test]
    fn title_may_sit_in_any_column() {
        let tables = extract(&grid(vec![
            vec![CellValue::Empty, CellValue::Empty, text("WORKING CAPITAL")],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Initial"), num(10.0)],
        ]))
        .expect("extract");

        assert_eq!(tables.names(), vec!["WORKING CAPITAL"]);
    }

    #[test]
    fn table_closed_by_end_of_grid() {
        let tables = extract(&grid(vec![
            vec![text("ONLY TABLE")],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Row"), num(1.0)],
        ]))
        .expect("extract");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables.get("only table").expect("table").row_labels, vec!["Row"]);
    }

    #[test]
    fn table_may_have_zero_data_rows() {
        let tables = extract(&grid(vec![
            vec![text("EMPTY TABLE")],
            vec![CellValue::Empty, text("Amount")],
            Vec::new(),
            vec![text("NEXT")],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Row"), num(1.0)],
        ]))
        .expect("extract");

        let empty = tables.get("EMPTY TABLE").expect("table");
        assert!(empty.row_labels.is_empty());
        assert!(empty.values.is_empty());
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn consecutive_blank_rows_between_tables_are_fine() {
        let tables = extract(&grid(vec![
            vec![text("A")],
            vec![CellValue::Empty, text("X")],
            vec![text("r"), num(1.0)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            vec![text("B")],
            vec![CellValue::Empty, text("Y")],
            vec![text("s"), num(2.0)],
        ]))
        .expect("extract");

        assert_eq!(tables.names(), vec!["A", "B"]);
    }

    #[test]
    fn blank_header_row_is_malformed() {
        let err = extract(&grid(vec![
            vec![text("BROKEN")],
            vec![CellValue::Empty, text("   ")],
        ]))
        .unwrap_err();

        match err {
            ExtractError::MalformedTable { table, row, .. } => {
                assert_eq!(table, "BROKEN");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn title_at_end_of_grid_is_malformed() {
        let err = extract(&grid(vec![
            vec![text("FIRST")],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Row"), num(1.0)],
            Vec::new(),
            vec![text("DANGLING")],
        ]))
        .unwrap_err();

        match err {
            ExtractError::MalformedTable { table, row, .. } => {
                assert_eq!(table, "DANGLING");
                assert_eq!(row, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unlabeled_data_row_is_malformed() {
        let err = extract(&grid(vec![
            vec![text("T")],
            vec![CellValue::Empty, text("Amount")],
            vec![CellValue::Empty, num(5.0)],
        ]))
        .unwrap_err();

        match err {
            ExtractError::MalformedTable { table, row, .. } => {
                assert_eq!(table, "T");
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_titles_are_rejected_after_normalization() {
        let err = extract(&grid(vec![
            vec![text("GROWTH RATES")],
            vec![CellValue::Empty, text("Year 1")],
            vec![text("Revenue"), num(1.0)],
            Vec::new(),
            vec![text("  growth rates ")],
            vec![CellValue::Empty, text("Year 1")],
            vec![text("Revenue"), num(2.0)],
        ]))
        .unwrap_err();

        match err {
            ExtractError::DuplicateTable { name, row } => {
                assert_eq!(name, "growth rates");
                assert_eq!(row, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn header_gaps_keep_data_aligned_by_position() {
        let tables = extract(&grid(vec![
            vec![text("GAPPED")],
            vec![CellValue::Empty, text("A"), CellValue::Empty, text("B")],
            vec![text("r1"), num(1.0), num(99.0), num(2.0)],
            vec![text("r2"), num(3.0)],
        ]))
        .expect("extract");

        let gapped = tables.get("GAPPED").expect("table");
        assert_eq!(gapped.column_labels, vec!["A", "B"]);
        // The value under the unlabeled column is dropped; short rows read
        // as absent.
        assert_eq!(
            gapped.values,
            vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), None]]
        );
    }

    #[test]
    fn numeric_title_names_table_by_its_rendering() {
        let tables = extract(&grid(vec![
            vec![num(2024.0)],
            vec![CellValue::Empty, text("Amount")],
            vec![text("Row"), num(1.0)],
        ]))
        .expect("extract");

        assert_eq!(tables.names(), vec!["2024"]);
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(coerce_number(&num(12.5)), Some(12.5));
        assert_eq!(coerce_number(&CellValue::Bool(true)), Some(1.0));
        assert_eq!(coerce_number(&CellValue::Bool(false)), Some(0.0));
        assert_eq!(coerce_number(&text(" 42 ")), Some(42.0));
        assert_eq!(coerce_number(&text("-3.5")), Some(-3.5));
        assert_eq!(coerce_number(&text("5.5%")), Some(0.055));
        assert_eq!(coerce_number(&text("10 %")), Some(0.10));
        assert_eq!(coerce_number(&text("St. line")), None);
        assert_eq!(coerce_number(&text("%")), None);
        assert_eq!(coerce_number(&text("")), None);
        assert_eq!(coerce_number(&CellValue::Empty), None);
    }
}
