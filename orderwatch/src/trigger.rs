//! Administrative trigger maintenance
//!
//! The sheet host owns trigger registration; this module only provides the
//! cleanup half of setup: removing every edit trigger bound to the observer
//! handler so a fresh one can be registered without duplicates.

use anyhow::Result;
use log::info;

/// Handler name edit triggers are bound to
pub const EDIT_HANDLER: &str = "on_edit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub id: String,
    pub handler: String,
}

/// The host's trigger registry
pub trait TriggerHost {
    fn triggers(&self) -> Vec<Trigger>;
    fn delete(&mut self, id: &str) -> Result<()>;
}

/// Delete every trigger bound to the edit handler; returns how many were
/// removed
pub fn remove_edit_triggers(host: &mut dyn TriggerHost) -> Result<usize> {
    let mut removed = 0;
    for trigger in host.triggers() {
        if trigger.handler == EDIT_HANDLER {
            host.delete(&trigger.id)?;
            removed += 1;
        }
    }
    info!("Removed {} edit trigger(s)", removed);
    Ok(removed)
}
