//! Outbound mail transmission API
//!
//! Thin client for a SparkPost-style `POST /transmissions` endpoint. The
//! `MailSender` trait is the seam the pipeline depends on; tests substitute
//! a recording sender.

pub mod client;
pub mod models;

pub use client::{MailSender, SendOutcome, SparkPostClient};
pub use models::{Address, Content, Recipient, Transmission, TransmissionResponse};
