//! Delivery-notification automation for an order-tracking spreadsheet
//!
//! Watches status edits on a tracking sheet; when an order becomes
//! "delivered", all of that customer's delivered-but-unnotified orders are
//! batched into one email, sent through a transmissions API, and the rows
//! are marked so duplicate triggers cannot double-send.

pub mod api;
pub mod cli;
pub mod config;
pub mod notify;
pub mod order;
pub mod pipeline;
pub mod sheet;
pub mod trigger;

pub use config::NotifyConfig;
pub use order::OrderRecord;
pub use pipeline::EditEvent;
