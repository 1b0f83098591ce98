use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Data, Ods, Range, Reader, Xls, Xlsx};

use super::{CellValue, LoadError, RawGrid};

type FileReader = BufReader<File>;

/// Calamine-backed workbook, one variant per on-disk format.
enum Workbook {
    Xlsx(Xlsx<FileReader>),
    Xls(Xls<FileReader>),
    Ods(Ods<FileReader>),
}

impl Workbook {
    fn open(path: &Path) -> Result<Self, LoadError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("xlsx") | Some("xlsm") | Some("xlam") => Ok(Self::Xlsx(open_workbook(path)?)),
            Some("xls") | Some("xla") => Ok(Self::Xls(open_workbook(path)?)),
            Some("ods") => Ok(Self::Ods(open_workbook(path)?)),
            _ => Err(LoadError::UnsupportedFormat(
                path.to_string_lossy().into_owned(),
            )),
        }
    }

    fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(wb) => wb.sheet_names(),
            Self::Xls(wb) => wb.sheet_names(),
            Self::Ods(wb) => wb.sheet_names(),
        }
    }

    fn range(&mut self, sheet: &str) -> Result<Range<Data>, LoadError> {
        match self {
            Self::Xlsx(wb) => Ok(wb.worksheet_range(sheet)?),
            Self::Xls(wb) => Ok(wb.worksheet_range(sheet)?),
            Self::Ods(wb) => Ok(wb.worksheet_range(sheet)?),
        }
    }
}

pub(super) fn load_grid(path: &Path, sheet: Option<&str>) -> Result<RawGrid, LoadError> {
    let mut workbook = Workbook::open(path)?;
    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => {
            if names.iter().any(|n| n == name) {
                name.to_string()
            } else {
                return Err(LoadError::SheetNotFound(name.to_string()));
            }
        }
        None => names.first().cloned().ok_or(LoadError::NoSheets)?,
    };
    let range = workbook.range(&sheet_name)?;
    Ok(grid_from_range(&range))
}

/// Rebuild absolute sheet coordinates. Calamine ranges start at the first
/// used cell, but row labels live in the sheet's column 0, so the offset
/// is padded back with empty rows and cells.
fn grid_from_range(range: &Range<Data>) -> RawGrid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(row_offset + range.height());
    rows.resize(row_offset, Vec::new());
    for source_row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(source_row.iter().map(cell_value));
        rows.push(cells);
    }
    RawGrid::from_rows(rows)
}

/// Map a calamine cell onto the grid model. Dates, durations and cell
/// error codes degrade to text, so they serve as labels but never as
/// numeric values.
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Text(
            dt.as_datetime()
                .map(|d| d.to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
