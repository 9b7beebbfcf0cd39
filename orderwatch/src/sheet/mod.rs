//! Row-store abstraction over the order-tracking sheet
//!
//! The spreadsheet host is an external collaborator; this module models the
//! narrow slice of it the pipeline needs: cell reads/writes by 1-based
//! row/column, sheet extents, and vertical merged-cell spans. `MemorySheet`
//! is the working in-process representation; the `xlsx` submodule bridges it
//! to workbook files.

pub mod schema;
pub mod xlsx;

use std::collections::HashMap;

use anyhow::Result;

/// Scalar cell content as the row store exposes it
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Render the cell the way it reads in the sheet; empty cells become ""
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                // Whole numbers print without the trailing ".0"
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => b.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty) || matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

/// A contiguous block of detail rows covered by one logical order
///
/// `len == 1` for plain rows; merged status cells produce longer spans with
/// `start` at the merge anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: u32,
    pub len: u32,
}

impl Default for RowSpan {
    fn default() -> Self {
        RowSpan::single(1)
    }
}

impl RowSpan {
    pub fn single(row: u32) -> Self {
        RowSpan { start: row, len: 1 }
    }

    pub fn end(&self) -> u32 {
        self.start + self.len - 1
    }

    pub fn rows(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end()
    }

    pub fn contains(&self, row: u32) -> bool {
        row >= self.start && row <= self.end()
    }
}

/// A merged cell region, 1-based and inclusive of its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub row: u32,
    pub col: u32,
    pub num_rows: u32,
    pub num_cols: u32,
}

impl Merge {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.row
            && row < self.row + self.num_rows
            && col >= self.col
            && col < self.col + self.num_cols
    }

    pub fn row_span(&self) -> RowSpan {
        RowSpan {
            start: self.row,
            len: self.num_rows,
        }
    }
}

/// The external row store, reduced to what the notification pipeline uses
///
/// Rows and columns are 1-based, matching how the sheet host addresses them.
/// Reads are infallible (an out-of-range cell is simply empty); writes can
/// fail because the backing store may be remote.
pub trait RowStore {
    fn name(&self) -> &str;

    /// Index of the last row holding any value
    fn last_row(&self) -> u32;

    /// Index of the last column holding any value
    fn last_column(&self) -> u32;

    fn value(&self, row: u32, col: u32) -> CellValue;

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<()>;

    /// The vertical merged span covering a cell, if the cell is merged
    fn merged_span(&self, row: u32, col: u32) -> Option<RowSpan>;
}

/// In-memory sheet used as the working representation and in tests
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    cells: HashMap<(u32, u32), CellValue>,
    merges: Vec<Merge>,
    last_row: u32,
    last_column: u32,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        MemorySheet {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert a value without going through the fallible trait method
    pub fn insert(&mut self, row: u32, col: u32, value: CellValue) {
        if !value.is_empty() {
            self.last_row = self.last_row.max(row);
            self.last_column = self.last_column.max(col);
        }
        self.cells.insert((row, col), value);
    }

    /// Fill a row from column 1 onwards; empty strings become empty cells
    pub fn put_row(&mut self, row: u32, values: &[&str]) {
        for (i, value) in values.iter().enumerate() {
            let cell = if value.is_empty() {
                CellValue::Empty
            } else {
                CellValue::text(*value)
            };
            self.insert(row, i as u32 + 1, cell);
        }
    }

    pub fn add_merge(&mut self, merge: Merge) {
        self.merges.push(merge);
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn cells(&self) -> impl Iterator<Item = (&(u32, u32), &CellValue)> {
        self.cells.iter()
    }
}

impl RowStore for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_row(&self) -> u32 {
        self.last_row
    }

    fn last_column(&self) -> u32 {
        self.last_column
    }

    fn value(&self, row: u32, col: u32) -> CellValue {
        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<()> {
        self.insert(row, col, value);
        Ok(())
    }

    fn merged_span(&self, row: u32, col: u32) -> Option<RowSpan> {
        self.merges
            .iter()
            .find(|m| m.contains(row, col))
            .map(Merge::row_span)
    }
}
