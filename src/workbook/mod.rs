// src/workbook/mod.rs

pub mod csv;
pub mod excel;

use std::ffi::OsStr;
use std::path::Path;

use ::csv::Error as CsvError;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a spreadsheet file into a [`RawGrid`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid xlsx file: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("invalid xls file: {0}")]
    Xls(#[from] calamine::XlsError),

    #[error("invalid ods file: {0}")]
    Ods(#[from] calamine::OdsError),

    #[error("invalid csv file: {0}")]
    Csv(#[from] CsvError),

    #[error("unsupported spreadsheet format for '{0}'")]
    UnsupportedFormat(String),

    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("workbook contains no sheets")]
    NoSheets,
}

/// A single cell as read from the source sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Whitespace-only text counts as empty: invisible padding must not
    /// break separator-row or title-row detection.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell text for use as a table name or a row/column label.
    pub fn label_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
        }
    }
}

/// The raw cell grid of one sheet, exactly as read from the source file.
///
/// Rows may be ragged; a missing trailing cell reads as empty. Coordinates
/// are absolute sheet coordinates, so "first cell of a row" means sheet
/// column 0 even when the sheet's used range starts further right.
#[derive(Debug, Clone, Default)]
pub struct RawGrid {
    rows: Vec<Vec<CellValue>>,
}

impl RawGrid {
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// True when the grid has no rows or every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.iter().all(CellValue::is_empty))
    }
}

/// Load one sheet of the spreadsheet at `path` into a [`RawGrid`].
///
/// The on-disk format is chosen by extension: `.xlsx`/`.xlsm`/`.xlam`,
/// `.xls`/`.xla` and `.ods` go through calamine, `.csv` through the csv
/// crate. `sheet` selects a sheet by name; the first sheet is used when it
/// is `None`.
pub fn load_grid(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<RawGrid, LoadError> {
    let path = path.as_ref();
    let grid = match path.extension().and_then(OsStr::to_str) {
        Some("csv") => csv::load_grid(path, sheet)?,
        Some("xlsx") | Some("xlsm") | Some("xlam") | Some("xls") | Some("xla") | Some("ods") => {
            excel::load_grid(path, sheet)?
        }
        _ => {
            return Err(LoadError::UnsupportedFormat(
                path.to_string_lossy().into_owned(),
            ))
        }
    };
    debug!(path = %path.display(), rows = grid.height(), "grid loaded");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn whitespace_only_text_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("   ".to_string()).is_empty());
        assert!(!CellValue::Text("x".to_string()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
        assert!(!CellValue::Bool(false).is_empty());
    }

    #[test]
    fn label_text_trims_and_formats() {
        assert_eq!(CellValue::Text("  Amount ".to_string()).label_text(), Some("Amount".to_string()));
        assert_eq!(CellValue::Text("  ".to_string()).label_text(), None);
        assert_eq!(CellValue::Number(2024.0).label_text(), Some("2024".to_string()));
        assert_eq!(CellValue::Number(0.5).label_text(), Some("0.5".to_string()));
        assert_eq!(CellValue::Bool(true).label_text(), Some("true".to_string()));
        assert_eq!(CellValue::Empty.label_text(), None);
    }

    #[test]
    fn grid_emptiness() {
        assert!(RawGrid::from_rows(Vec::new()).is_empty());
        assert!(RawGrid::from_rows(vec![
            vec![CellValue::Empty, CellValue::Text(" ".to_string())],
            Vec::new(),
        ])
        .is_empty());
        assert!(!RawGrid::from_rows(vec![vec![CellValue::Number(1.0)]]).is_empty());
    }

    #[test]
    fn dispatches_csv_by_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("create temp csv");
        writeln!(file, "INITIAL INVESTMENT,,").expect("write");
        writeln!(file, ",Amount,").expect("write");
        writeln!(file, "Initial Investment,1000,").expect("write");
        file.flush().expect("flush");

        let grid = load_grid(file.path(), None).expect("load csv grid");
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.rows()[0][0], CellValue::Text("INITIAL INVESTMENT".to_string()));
        assert_eq!(grid.rows()[1][0], CellValue::Empty);
        assert_eq!(grid.rows()[2][1], CellValue::Text("1000".to_string()));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_grid("tables.parquet", None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }
}
