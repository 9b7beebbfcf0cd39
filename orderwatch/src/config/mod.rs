//! Runtime configuration
//!
//! Everything the pipeline parameterizes over lives in `NotifyConfig`,
//! loaded from a TOML file with full defaults so the binary runs without
//! one. Test/production behavior is an explicit `[testing]` table injected
//! at the entry points, not a global flag.

pub mod secrets;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Sheet names the edit observer reacts to
    pub worksheets: Vec<String>,
    /// Row holding the column headers
    pub header_row: u32,
    /// First row holding order data; rows above it are header/reserved
    pub first_data_row: u32,
    /// Fixed delay before aggregation, letting a near-simultaneous duplicate
    /// trigger's write land first. Best-effort only, not a lock.
    pub race_delay_ms: u64,
    /// Transmission endpoint
    pub api_url: String,
    pub from_email: String,
    pub from_name: String,
    /// When present, notifications are redirected and annotated for testing
    pub testing: Option<TestingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Override recipient; every notification goes here instead of the
    /// customer
    pub destination: String,
    pub subject_prefix: String,
    /// Marker written instead of "YES" so test runs are distinguishable
    pub marker_value: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            worksheets: vec![
                "Offline Orders".to_string(),
                "Marketplace Orders".to_string(),
                "Wholesale Orders".to_string(),
            ],
            header_row: 2,
            first_data_row: 3,
            race_delay_ms: 1000,
            api_url: "https://api.sparkpost.com/api/v1/transmissions".to_string(),
            from_email: "noreply@orders.example.com".to_string(),
            from_name: "Order Desk".to_string(),
            testing: None,
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        TestingConfig {
            destination: String::new(),
            subject_prefix: "[TESTING] ".to_string(),
            marker_value: "TEST-SENT".to_string(),
        }
    }
}

impl NotifyConfig {
    /// Load from `path`, or from the default location; a missing file means
    /// defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("No user config directory available")?;
        Ok(base.join("orderwatch").join("config.toml"))
    }

    /// Marker written into the sent column after a confirmed send
    pub fn marker_value(&self) -> &str {
        self.testing
            .as_ref()
            .map(|t| t.marker_value.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(crate::order::sent::SENT_MARKER)
    }

    pub fn is_testing(&self) -> bool {
        self.testing.is_some()
    }
}
