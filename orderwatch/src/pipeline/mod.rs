//! Edit observation and order processing
//!
//! One invocation per cell-edit event. The observer filters edits down to
//! "status became delivered on a recognized sheet", then the processor
//! batches every delivered, unnotified order of the affected customer into
//! a single notification and marks the rows only after a confirmed send.
//!
//! Concurrency defenses are best-effort only: the host may deliver
//! overlapping invocations, and the row store offers no compare-and-set.
//! A fixed delay before aggregation plus a re-check right before sending
//! narrow the double-send window without closing it.

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};
use tokio::time::sleep;

use crate::api::MailSender;
use crate::config::NotifyConfig;
use crate::notify::{BodyRenderer, send_delivery_email};
use crate::order::{aggregate::unsent_delivered_for, read_order, sent::SentTracker};
use crate::sheet::{RowStore, schema::ColumnMap};

/// Placeholder recipient substituted in testing mode when a row has no
/// email
const TEST_FALLBACK_EMAIL: &str = "client-without-email@example.com";

/// A cell-edit notification from the sheet host
#[derive(Debug, Clone)]
pub struct EditEvent {
    pub sheet: String,
    pub row: u32,
    pub column: u32,
    /// The new cell value as entered
    pub value: String,
}

/// Trigger entry point: never propagates an error, because an unhandled
/// failure would get the trigger disabled by the host
pub async fn on_edit(
    store: &mut dyn RowStore,
    event: &EditEvent,
    config: &NotifyConfig,
    sender: &dyn MailSender,
    renderer: &dyn BodyRenderer,
) {
    if let Err(err) = handle_edit(store, event, config, sender, renderer).await {
        error!("Edit handler failed on row {}: {:#}", event.row, err);
    }
}

async fn handle_edit(
    store: &mut dyn RowStore,
    event: &EditEvent,
    config: &NotifyConfig,
    sender: &dyn MailSender,
    renderer: &dyn BodyRenderer,
) -> Result<()> {
    if !config.worksheets.iter().any(|name| name == &event.sheet) {
        return Ok(());
    }

    let columns = ColumnMap::resolve(&*store, config.header_row);
    let Some(status_column) = columns.status else {
        warn!("Sheet '{}' has no status column, ignoring edit", event.sheet);
        return Ok(());
    };
    if event.column != status_column {
        return Ok(());
    }
    if event.value.to_lowercase() != "delivered" {
        return Ok(());
    }

    info!(
        "Status changed to delivered on row {} of sheet '{}'",
        event.row, event.sheet
    );
    process_delivered_order(store, &columns, event.row, config, sender, renderer).await
}

/// Batch and send the notification for the customer behind `row`
pub async fn process_delivered_order(
    store: &mut dyn RowStore,
    columns: &ColumnMap,
    row: u32,
    config: &NotifyConfig,
    sender: &dyn MailSender,
    renderer: &dyn BodyRenderer,
) -> Result<()> {
    let mut order = read_order(&*store, columns, row);

    if order.email.is_empty() {
        if config.is_testing() {
            order.email = TEST_FALLBACK_EMAIL.to_string();
            if order.customer_name.is_empty() {
                order.customer_name = "Test client".to_string();
            }
        } else {
            warn!("No email address found for row {}, skipping", row);
            return Ok(());
        }
    }

    let tracker = SentTracker::resolve(store, columns, config.header_row)?;
    if tracker.was_sent(&*store, order.row) {
        info!("Notification already sent for row {}", order.row);
        return Ok(());
    }

    // Let a near-simultaneous duplicate trigger's write land first
    sleep(Duration::from_millis(config.race_delay_ms)).await;

    let candidates =
        unsent_delivered_for(&*store, columns, &tracker, &order.email, config.first_data_row);
    if candidates.is_empty() {
        info!("No unsent delivered orders for {}", order.email);
        return Ok(());
    }
    info!(
        "Processing {} order(s) for {}",
        candidates.len(),
        order.email
    );

    // Re-check right before sending; another trigger may have marked rows
    // while we slept
    let pending: Vec<_> = candidates
        .into_iter()
        .filter(|candidate| !tracker.was_sent(&*store, candidate.row))
        .collect();
    if pending.is_empty() {
        info!("All orders for {} were already processed", order.email);
        return Ok(());
    }

    let delivered = send_delivery_email(sender, renderer, config, &order.email, &pending).await?;
    if delivered {
        tracker.mark_sent(store, &pending, config.marker_value());
    }

    Ok(())
}
