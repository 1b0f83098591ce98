use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::{CellValue, LoadError, RawGrid};

/// Load a CSV export as a single-sheet grid.
///
/// Every field reads as text; numeric coercion happens during extraction,
/// the same as for workbook cells. A requested sheet name must match the
/// file stem, since a CSV file carries exactly one sheet.
pub(super) fn load_grid(path: &Path, sheet: Option<&str>) -> Result<RawGrid, LoadError> {
    if let Some(name) = sheet {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if name != stem {
            return Err(LoadError::SheetNotFound(name.to_string()));
        }
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut record = StringRecord::new();
    let mut next_line = 1u64;
    while reader.read_record(&mut record)? {
        // The reader skips blank lines and stamps a following record with
        // the position of the first skipped line, so derive the record's
        // true start from the post-read position instead and reinsert the
        // gap as empty rows. Separator rows between stacked tables depend
        // on this.
        let after = reader.position().line();
        let spanned = 1 + record
            .iter()
            .map(|field| field.matches('\n').count() as u64)
            .sum::<u64>();
        let start = after.saturating_sub(spanned);
        while next_line < start {
            rows.push(Vec::new());
            next_line += 1;
        }
        rows.push(record.iter().map(field_value).collect());
        next_line = after;
    }
    Ok(RawGrid::from_rows(rows))
}

fn field_value(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(field.to_string())
    }
}
