//! Column resolution via a canonical field → header-alias table
//!
//! Headers in the tracking sheets are free text maintained by hand, so
//! columns are located by case-insensitive substring match against a fixed
//! alias list, resolved once per sheet read rather than per row. The
//! "tracing number" alias covers a long-standing typo in production sheets.

use super::RowStore;

const STATUS: &[&str] = &["status"];
const PRODUCT: &[&str] = &["product"];
const QTY: &[&str] = &["qty"];
const PO: &[&str] = &["po"];
const TRACKING: &[&str] = &["tracing number", "tracking number"];
const EMAIL: &[&str] = &["email"];
const CONTACT: &[&str] = &["contact"];
const DATE: &[&str] = &["date"];
const ORDER_TYPE: &[&str] = &["type"];

/// Aliases accepted for the sent-marker column
pub const SENT_ALIASES: &[&str] = &["email sent", "correo enviado", "email_sent"];

/// Header written when the sent-marker column has to be created
pub const SENT_HEADER: &str = "Email Sent";

/// Resolved 1-based column indices for one sheet; `None` means no header
/// matched the field's aliases
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub status: Option<u32>,
    pub product: Option<u32>,
    pub qty: Option<u32>,
    pub po: Option<u32>,
    pub tracking: Option<u32>,
    pub email: Option<u32>,
    pub contact: Option<u32>,
    pub date: Option<u32>,
    pub order_type: Option<u32>,
    pub sent: Option<u32>,
}

impl ColumnMap {
    pub fn resolve(store: &dyn RowStore, header_row: u32) -> Self {
        let headers = read_headers(store, header_row);
        ColumnMap {
            status: find_column(&headers, STATUS),
            product: find_column(&headers, PRODUCT),
            qty: find_column(&headers, QTY),
            po: find_column(&headers, PO),
            tracking: find_column(&headers, TRACKING),
            email: find_column(&headers, EMAIL),
            contact: find_column(&headers, CONTACT),
            date: find_column(&headers, DATE),
            order_type: find_column(&headers, ORDER_TYPE),
            sent: find_column(&headers, SENT_ALIASES),
        }
    }
}

/// Read the header row as trimmed, lowercased text
pub fn read_headers(store: &dyn RowStore, header_row: u32) -> Vec<String> {
    (1..=store.last_column())
        .map(|col| store.value(header_row, col).as_text().trim().to_lowercase())
        .collect()
}

/// First header containing any alias as a substring, 1-based
pub fn find_column(headers: &[String], aliases: &[&str]) -> Option<u32> {
    headers
        .iter()
        .position(|header| aliases.iter().any(|alias| header.contains(alias)))
        .map(|i| i as u32 + 1)
}
