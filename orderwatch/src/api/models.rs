//! Wire types for the transmission endpoint

use serde::{Deserialize, Serialize};

/// Request body for `POST /transmissions`
#[derive(Debug, Clone, Serialize)]
pub struct Transmission {
    pub use_sandbox: bool,
    pub recipients: Vec<Recipient>,
    pub content: Content,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub address: Address,
}

#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub from: Address,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Response body; `results` may be absent on some error shapes
#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionResponse {
    #[serde(default)]
    pub results: Option<TransmissionResults>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransmissionResults {
    #[serde(default)]
    pub total_accepted_recipients: u32,
    #[serde(default)]
    pub total_rejected_recipients: u32,
}
