//! Per-customer aggregation of delivered, unnotified orders
//!
//! A full scan per trigger is O(rows × columns); acceptable because the
//! tracking sheets stay in the hundreds of rows.

use super::{OrderRecord, read_order, sent::SentTracker};
use crate::sheet::{RowStore, schema::ColumnMap};

/// All delivered, unsent orders whose primary email equals `email`
///
/// The email match is exact and case-sensitive; the status match is
/// lowercase-tolerant. Rows covered by an already-visited merged span are
/// skipped, so a merged block yields exactly one record at its anchor.
/// Results come back in row order.
pub fn unsent_delivered_for(
    store: &dyn RowStore,
    columns: &ColumnMap,
    tracker: &SentTracker,
    email: &str,
    first_data_row: u32,
) -> Vec<OrderRecord> {
    let mut orders = Vec::new();
    let last_row = store.last_row();
    let mut row = first_data_row;

    while row <= last_row {
        let record = read_order(store, columns, row);
        let next = (record.span.end() + 1).max(row + 1);

        if record.email == email
            && record.is_delivered()
            && !tracker.was_sent(store, record.row)
        {
            orders.push(record);
        }

        row = next;
    }

    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{CellValue, Merge, MemorySheet};

    fn sheet_with_orders() -> MemorySheet {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["PO", "Contact", "Email", "Product", "Qty", "Status", "Email Sent"]);
        sheet.put_row(3, &["PO-1", "Ada", "a@x.com", "Cable A", "5", "delivered", ""]);
        sheet.put_row(4, &["PO-2", "Bob", "b@y.com", "Cable B", "1", "delivered", ""]);
        sheet.put_row(5, &["PO-3", "Ada", "a@x.com", "Cable C", "2", "Delivered", ""]);
        sheet.put_row(6, &["PO-4", "Ada", "a@x.com", "Cable D", "9", "shipped", ""]);
        sheet
    }

    fn resolve(sheet: &mut MemorySheet) -> (ColumnMap, SentTracker) {
        let columns = ColumnMap::resolve(sheet, 2);
        let tracker = SentTracker::resolve(sheet, &columns, 2).unwrap();
        (columns, tracker)
    }

    #[test]
    fn test_collects_delivered_unsent_rows_in_order() {
        let mut sheet = sheet_with_orders();
        let (columns, tracker) = resolve(&mut sheet);

        let orders = unsent_delivered_for(&sheet, &columns, &tracker, "a@x.com", 3);
        let pos: Vec<_> = orders.iter().map(|o| o.po.as_str()).collect();
        assert_eq!(pos, vec!["PO-1", "PO-3"]);
    }

    #[test]
    fn test_email_match_is_case_sensitive() {
        let mut sheet = sheet_with_orders();
        let (columns, tracker) = resolve(&mut sheet);

        assert!(unsent_delivered_for(&sheet, &columns, &tracker, "A@X.COM", 3).is_empty());
    }

    #[test]
    fn test_sent_rows_are_excluded() {
        let mut sheet = sheet_with_orders();
        let (columns, tracker) = resolve(&mut sheet);
        sheet.insert(3, 7, CellValue::text("YES"));

        let orders = unsent_delivered_for(&sheet, &columns, &tracker, "a@x.com", 3);
        let pos: Vec<_> = orders.iter().map(|o| o.po.as_str()).collect();
        assert_eq!(pos, vec!["PO-3"]);
    }

    #[test]
    fn test_merged_span_yields_single_record() {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["PO", "Email", "Product", "Status", "Email Sent"]);
        sheet.put_row(5, &["PO-1", "a@x.com", "Cable A", "delivered", ""]);
        sheet.put_row(6, &["PO-2", "", "Cable B", "", ""]);
        sheet.put_row(7, &["", "", "", "", ""]);
        sheet.add_merge(Merge {
            row: 5,
            col: 4,
            num_rows: 3,
            num_cols: 1,
        });
        let (columns, tracker) = resolve(&mut sheet);

        let orders = unsent_delivered_for(&sheet, &columns, &tracker, "a@x.com", 3);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].row, 5);
        assert_eq!(orders[0].products, "Cable A\nCable B");
    }
}
