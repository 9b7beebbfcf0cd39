//! Sent-marker column: the duplicate-send guard
//!
//! One cell per row records whether a delivery notification already went
//! out. The column is created lazily on first use; marking happens only
//! after a confirmed send.

use anyhow::Result;
use log::{error, info};

use super::OrderRecord;
use crate::sheet::{CellValue, RowStore, schema};

/// Marker written in production mode
pub const SENT_MARKER: &str = "YES";

#[derive(Debug, Clone, Copy)]
pub struct SentTracker {
    column: u32,
}

impl SentTracker {
    /// Resolve the marker column, appending it (with its header) when no
    /// existing header matches
    pub fn resolve(
        store: &mut dyn RowStore,
        columns: &schema::ColumnMap,
        header_row: u32,
    ) -> Result<Self> {
        let column = match columns.sent {
            Some(col) => col,
            None => {
                let col = store.last_column() + 1;
                store.set_value(header_row, col, CellValue::text(schema::SENT_HEADER))?;
                info!("Created '{}' column at index {}", schema::SENT_HEADER, col);
                col
            }
        };
        Ok(SentTracker { column })
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// True iff the marker cell is exactly "YES", "SÍ", or boolean true.
    /// String comparison is case-sensitive: a lowercase "yes" does not count.
    pub fn was_sent(&self, store: &dyn RowStore, row: u32) -> bool {
        match store.value(row, self.column) {
            CellValue::Bool(true) => true,
            CellValue::Text(s) => s == "YES" || s == "SÍ",
            _ => false,
        }
    }

    /// Write the marker for every order; a failure on one row is logged and
    /// does not abort the rest of the batch
    pub fn mark_sent(&self, store: &mut dyn RowStore, orders: &[OrderRecord], marker: &str) {
        for order in orders {
            // A merged marker cell is written at its anchor
            let target = store
                .merged_span(order.row, self.column)
                .map(|span| span.start)
                .unwrap_or(order.row);
            match store.set_value(target, self.column, CellValue::text(marker)) {
                Ok(()) => info!("Marked row {} as sent (\"{}\")", order.row, marker),
                Err(err) => error!("Failed to mark row {} as sent: {:#}", order.row, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Merge, MemorySheet, RowSpan, schema::ColumnMap};

    fn tracker_for(sheet: &mut MemorySheet) -> SentTracker {
        let columns = ColumnMap::resolve(sheet, 2);
        SentTracker::resolve(sheet, &columns, 2).unwrap()
    }

    #[test]
    fn test_was_sent_exact_values_only() {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["PO", "Email Sent"]);
        let tracker = tracker_for(&mut sheet);

        for (value, expected) in [
            (CellValue::text("YES"), true),
            (CellValue::text("SÍ"), true),
            (CellValue::Bool(true), true),
            (CellValue::text("yes"), false),
            (CellValue::text("NO"), false),
            (CellValue::text("TEST-SENT"), false),
            (CellValue::Bool(false), false),
            (CellValue::Empty, false),
        ] {
            sheet.insert(3, 2, value.clone());
            assert_eq!(tracker.was_sent(&sheet, 3), expected, "value {value:?}");
        }
    }

    #[test]
    fn test_missing_column_is_created_with_header() {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["PO", "Status"]);
        let tracker = tracker_for(&mut sheet);

        assert_eq!(tracker.column(), 3);
        assert_eq!(sheet.value(2, 3).as_text(), "Email Sent");
        assert!(!tracker.was_sent(&sheet, 3));

        // A second resolve now finds the created column instead of appending
        let columns = ColumnMap::resolve(&sheet, 2);
        assert_eq!(columns.sent, Some(3));
    }

    #[test]
    fn test_mark_sent_writes_merge_anchor() {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["PO", "Email Sent"]);
        sheet.add_merge(Merge {
            row: 5,
            col: 2,
            num_rows: 3,
            num_cols: 1,
        });
        let tracker = tracker_for(&mut sheet);

        let order = OrderRecord {
            row: 6,
            span: RowSpan { start: 5, len: 3 },
            ..Default::default()
        };
        tracker.mark_sent(&mut sheet, &[order], SENT_MARKER);

        assert_eq!(sheet.value(5, 2).as_text(), "YES");
        assert!(tracker.was_sent(&sheet, 5));
    }
}
