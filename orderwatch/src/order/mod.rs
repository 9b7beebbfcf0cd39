//! Order record reconstruction from sheet rows
//!
//! Records are rebuilt from the row store on every read and never cached;
//! their only identity is the anchor row index, which stays valid until the
//! sheet is restructured.

pub mod aggregate;
pub mod sent;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::sheet::{RowSpan, RowStore, schema::ColumnMap};

static ADDRESS_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;\s]+").unwrap());

/// One order as reconstructed from the sheet
///
/// When the status cell is merged across several detail rows, `span` covers
/// the whole block, `row` is the span anchor, and `products`, `qty` and
/// `tracking_number` hold newline-joined lists (`po` is comma-joined). The
/// lists are not guaranteed to be the same length, so consumers zip them
/// defensively. Missing fields are empty strings, never absent.
#[derive(Debug, Clone, Default)]
pub struct OrderRecord {
    pub po: String,
    pub date: String,
    pub order_type: String,
    pub customer_name: String,
    pub qty: String,
    pub products: String,
    pub status: String,
    pub tracking_number: String,
    /// First valid address of the email field
    pub email: String,
    /// The raw email field, possibly holding several addresses
    pub all_emails: String,
    /// Anchor row of the record
    pub row: u32,
    pub span: RowSpan,
}

impl OrderRecord {
    pub fn is_delivered(&self) -> bool {
        self.status.to_lowercase() == "delivered"
    }
}

/// Reconstruct the order covering `row`
///
/// If the status cell belongs to a merged range the record is normalized to
/// the range anchor and the detail columns are collected across the whole
/// span.
pub fn read_order(store: &dyn RowStore, columns: &ColumnMap, row: u32) -> OrderRecord {
    let span = columns
        .status
        .and_then(|col| store.merged_span(row, col))
        .unwrap_or_else(|| RowSpan::single(row));
    let anchor = span.start;

    let get = |col: Option<u32>| -> String {
        col.map(|c| store.value(anchor, c).as_text().trim().to_string())
            .unwrap_or_default()
    };

    let mut products = get(columns.product);
    let mut qty = get(columns.qty);
    let mut po = get(columns.po);
    let mut tracking_number = get(columns.tracking);

    if span.len > 1 {
        let collect = |col: Option<u32>| -> Vec<String> {
            let Some(c) = col else { return Vec::new() };
            span.rows()
                .map(|r| store.value(r, c).as_text().trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };

        let all_products = collect(columns.product);
        let all_qtys = collect(columns.qty);
        let all_pos = collect(columns.po);
        let all_tracking = collect(columns.tracking);

        if !all_products.is_empty() {
            products = all_products.join("\n");
        }
        if !all_qtys.is_empty() {
            qty = all_qtys.join("\n");
        }
        if !all_pos.is_empty() {
            po = all_pos.join(",");
        }
        if !all_tracking.is_empty() {
            tracking_number = all_tracking.join("\n");
        }
    }

    let all_emails = get(columns.email);
    let addresses = split_addresses(&all_emails);
    let email = addresses.first().cloned().unwrap_or_default();
    if addresses.len() > 1 {
        info!(
            "Row {}: found multiple addresses ({}), using {}",
            anchor,
            addresses.join(", "),
            email
        );
    }

    OrderRecord {
        po,
        date: get(columns.date),
        order_type: get(columns.order_type),
        customer_name: get(columns.contact),
        qty,
        products,
        status: get(columns.status),
        tracking_number,
        email,
        all_emails,
        row: anchor,
        span,
    }
}

/// Split a raw email field into its address tokens
pub fn split_addresses(raw: &str) -> Vec<String> {
    ADDRESS_SPLIT
        .split(raw)
        .filter(|token| !token.is_empty() && token.contains('@'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Merge, MemorySheet};

    fn base_sheet() -> MemorySheet {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(
            2,
            &["PO", "Date", "Type", "Contact", "Email", "Product", "Qty", "Status", "Tracking Number"],
        );
        sheet
    }

    #[test]
    fn test_read_plain_row() {
        let mut sheet = base_sheet();
        sheet.put_row(
            3,
            &["PO-1", "2026-08-01", "Wire", "Ada", "a@x.com", "Cable A", "5", "delivered", "1Z99"],
        );
        let columns = ColumnMap::resolve(&sheet, 2);

        let order = read_order(&sheet, &columns, 3);
        assert_eq!(order.po, "PO-1");
        assert_eq!(order.customer_name, "Ada");
        assert_eq!(order.products, "Cable A");
        assert_eq!(order.email, "a@x.com");
        assert!(order.is_delivered());
        assert_eq!(order.row, 3);
        assert_eq!(order.span, RowSpan::single(3));
    }

    #[test]
    fn test_missing_columns_default_to_empty() {
        let mut sheet = MemorySheet::new("Orders");
        sheet.put_row(2, &["Status", "Email"]);
        sheet.put_row(3, &["delivered", "a@x.com"]);
        let columns = ColumnMap::resolve(&sheet, 2);

        let order = read_order(&sheet, &columns, 3);
        assert_eq!(order.po, "");
        assert_eq!(order.products, "");
        assert_eq!(order.tracking_number, "");
    }

    #[test]
    fn test_merged_status_span_collects_detail_rows() {
        let mut sheet = base_sheet();
        sheet.put_row(
            5,
            &["PO-1", "", "", "Ada", "a@x.com", "Cable A", "5", "delivered", "1Z01"],
        );
        sheet.put_row(6, &["PO-2", "", "", "", "", "Cable B", "2", "", "1Z02"]);
        sheet.put_row(7, &["", "", "", "", "", "", "", "", ""]);
        sheet.add_merge(Merge {
            row: 5,
            col: 8,
            num_rows: 3,
            num_cols: 1,
        });
        let columns = ColumnMap::resolve(&sheet, 2);

        // Any row of the span resolves to the anchor record
        for row in 5..=7 {
            let order = read_order(&sheet, &columns, row);
            assert_eq!(order.row, 5);
            assert_eq!(order.span, RowSpan { start: 5, len: 3 });
            assert_eq!(order.products, "Cable A\nCable B");
            assert_eq!(order.qty, "5\n2");
            assert_eq!(order.po, "PO-1,PO-2");
            assert_eq!(order.tracking_number, "1Z01\n1Z02");
            assert_eq!(order.email, "a@x.com");
        }
    }

    #[test]
    fn test_primary_email_extraction() {
        let mut sheet = base_sheet();
        sheet.put_row(3, &["PO-1", "", "", "Ada", "a@x.com, b@y.com", "", "", "delivered", ""]);
        let columns = ColumnMap::resolve(&sheet, 2);

        let order = read_order(&sheet, &columns, 3);
        assert_eq!(order.email, "a@x.com");
        assert_eq!(order.all_emails, "a@x.com, b@y.com");
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(split_addresses("a@x.com"), vec!["a@x.com"]);
        assert_eq!(
            split_addresses("a@x.com; b@y.com c@z.com"),
            vec!["a@x.com", "b@y.com", "c@z.com"]
        );
        assert!(split_addresses("no address here").is_empty());
        assert!(split_addresses("").is_empty());
    }
}
