//! Command-line interface
//!
//! The host fires one process per edit event; `process` materializes that
//! event against a workbook file, runs the observer, and writes any new
//! sent markers back.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::api::{MailSender, SendOutcome, SparkPostClient, Transmission};
use crate::config::{NotifyConfig, secrets};
use crate::notify::PlainBody;
use crate::pipeline::{EditEvent, on_edit};
use crate::sheet::{CellValue, RowStore, schema::ColumnMap, xlsx};

#[derive(Parser)]
#[command(name = "orderwatch", version, about = "Delivery notifications for an order-tracking sheet")]
pub struct Cli {
    /// Alternate config file location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a cell-edit event to a workbook and send any due notifications
    Process {
        /// The .xlsx workbook holding the tracking sheet
        workbook: PathBuf,
        /// Name of the edited sheet
        #[arg(long)]
        sheet: String,
        /// Edited row (1-based)
        #[arg(long)]
        row: u32,
        /// Edited column; defaults to the resolved status column
        #[arg(long)]
        column: Option<u32>,
        /// The new cell value
        #[arg(long, default_value = "delivered")]
        value: String,
        /// Log the transmission instead of sending, and leave the workbook
        /// untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and report the active notification mode
    Setup,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = NotifyConfig::load(cli.config.as_deref())?;
    match cli.command {
        Command::Process {
            workbook,
            sheet,
            row,
            column,
            value,
            dry_run,
        } => handle_process(&config, &workbook, &sheet, row, column, value, dry_run).await,
        Command::Setup => handle_setup(&config),
    }
}

async fn handle_process(
    config: &NotifyConfig,
    workbook: &PathBuf,
    sheet: &str,
    row: u32,
    column: Option<u32>,
    value: String,
    dry_run: bool,
) -> Result<()> {
    let mut store = xlsx::load_sheet(workbook, sheet)?;

    let column = match column.or_else(|| ColumnMap::resolve(&store, config.header_row).status) {
        Some(col) => col,
        None => bail!("No status column found on sheet '{}'", sheet),
    };

    // The host applies the edit before firing the trigger; mirror that
    store.set_value(row, column, CellValue::text(value.clone()))?;

    let event = EditEvent {
        sheet: sheet.to_string(),
        row,
        column,
        value,
    };
    let renderer = PlainBody;

    if dry_run {
        on_edit(&mut store, &event, config, &LoggingSender, &renderer).await;
        info!("Dry run: workbook left untouched");
        return Ok(());
    }

    let token = secrets::sparkpost_token()?;
    let sender = SparkPostClient::new(&config.api_url, token);
    on_edit(&mut store, &event, config, &sender, &renderer).await;
    xlsx::save_sheet(&store, workbook)?;
    Ok(())
}

fn handle_setup(config: &NotifyConfig) -> Result<()> {
    // Trigger removal itself runs inside the sheet host; embedders call
    // trigger::remove_edit_triggers against their host binding.
    match secrets::lookup(secrets::TOKEN_KEY)? {
        Some(_) => info!("Transmission token is configured"),
        None => warn!("{} is not configured; sends will fail", secrets::TOKEN_KEY),
    }
    match &config.testing {
        Some(testing) => info!(
            "Trigger configured in testing mode; all notifications go to {}",
            testing.destination
        ),
        None => info!("Trigger configured for production"),
    }
    info!("Watching sheets: {}", config.worksheets.join(", "));
    Ok(())
}

/// Dry-run sender: accepts everything and logs the payload
struct LoggingSender;

#[async_trait]
impl MailSender for LoggingSender {
    async fn send(&self, transmission: &Transmission) -> Result<SendOutcome> {
        info!(
            "Dry-run transmission:\n{}",
            serde_json::to_string_pretty(transmission).context("Failed to serialize transmission")?
        );
        Ok(SendOutcome {
            accepted: 1,
            rejected: 0,
        })
    }
}
