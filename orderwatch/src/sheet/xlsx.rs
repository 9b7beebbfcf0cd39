//! Workbook file bridge: calamine in, rust_xlsxwriter out
//!
//! The CLI operates on .xlsx snapshots of the tracking sheet. Loading pulls
//! one worksheet (values plus merged regions) into a `MemorySheet`; saving
//! writes the sheet back, re-creating merges so a later load sees the same
//! spans.

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::{Format, Workbook};

use super::{CellValue, Merge, MemorySheet, RowStore};

/// Load one worksheet of an .xlsx file into memory
pub fn load_sheet<P: AsRef<Path>>(path: P, sheet: &str) -> Result<MemorySheet> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    workbook
        .load_merged_regions()
        .context("Failed to read merged regions")?;

    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("No worksheet named '{}'", sheet))?;

    let mut out = MemorySheet::new(sheet);

    if let Some((top, left)) = range.start() {
        let (height, width) = range.get_size();
        for r in 0..height as u32 {
            for c in 0..width as u32 {
                if let Some(cell) = range.get_value((top + r, left + c)) {
                    let value = convert(cell);
                    if !value.is_empty() {
                        out.insert(top + r + 1, left + c + 1, value);
                    }
                }
            }
        }
    }

    for region in workbook.merged_regions_by_sheet(sheet) {
        let dims = &region.2;
        out.add_merge(Merge {
            row: dims.start.0 + 1,
            col: dims.start.1 + 1,
            num_rows: dims.end.0 - dims.start.0 + 1,
            num_cols: dims.end.1 - dims.start.1 + 1,
        });
    }

    Ok(out)
}

/// Write a sheet back to an .xlsx file, preserving merged regions
pub fn save_sheet<P: AsRef<Path>>(sheet: &MemorySheet, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet.name())?;

    let format = Format::default();
    for merge in sheet.merges() {
        let anchor = sheet.value(merge.row, merge.col);
        worksheet.merge_range(
            merge.row - 1,
            (merge.col - 1) as u16,
            merge.row + merge.num_rows - 2,
            (merge.col + merge.num_cols - 2) as u16,
            &anchor.as_text(),
            &format,
        )?;
    }

    for (&(row, col), value) in sheet.cells() {
        // Merged cells were written above
        if sheet.merges().iter().any(|m| m.contains(row, col)) {
            continue;
        }
        let (r, c) = (row - 1, (col - 1) as u16);
        match value {
            CellValue::Empty => {}
            CellValue::Text(s) => {
                worksheet.write_string(r, c, s)?;
            }
            CellValue::Number(n) => {
                worksheet.write_number(r, c, *n)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean(r, c, *b)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path.display()))?;
    Ok(())
}

/// Convert a calamine cell to the row-store scalar
fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Text(format!("{}", dt)),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}
