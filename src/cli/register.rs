//! Register subcommand implementation.
//!
//! Handles `printsweep register <run-id>`: loads a saved report and adds the
//! selected new devices to inventory, one record at a time.

use crate::backend::{HttpBackend, InventoryBackend};
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::registration::{add_selected, annotate, InventoryIndex, Selection};
use crate::storage::ReportStore;
use clap::Parser;
use std::net::IpAddr;

/// Register discovered devices in the printer inventory.
#[derive(Parser, Debug)]
pub struct RegisterCommand {
    /// Run ID or prefix of a saved discovery report
    #[arg(value_name = "RUN_ID")]
    pub run_id: String,

    /// Register every device not already in inventory
    #[arg(long, conflicts_with = "ips", required_unless_present = "ips")]
    pub all: bool,

    /// Register only these devices (repeatable)
    #[arg(long = "ip", value_name = "IP")]
    pub ips: Vec<IpAddr>,
}

impl RegisterCommand {
    /// Execute the register command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let store = ReportStore::new()?;
        let mut report = store.find_by_prefix(&self.run_id)?;
        let backend = HttpBackend::new(&settings.backend_url)?;

        // Selection is built against current inventory, not the one seen at
        // discovery time.
        let printers = backend.list_printers().await?;
        annotate(&mut report.devices, &InventoryIndex::from_printers(&printers));

        let selection = if self.all {
            Selection::all_new(&report.devices)
        } else {
            let mut selection = Selection::new();
            for ip in &self.ips {
                let Some(device) = report.devices.iter().find(|d| d.ip == *ip) else {
                    if !quiet {
                        println!("  {} skipped: not in run {}", ip, report.id.short());
                    }
                    continue;
                };
                if !selection.select(device) && !quiet {
                    println!("  {} skipped: already registered", ip);
                }
            }
            selection
        };

        if selection.is_empty() {
            if !quiet {
                println!("Nothing to register.");
            }
            return Ok(());
        }

        let outcomes = add_selected(&backend, &report.devices, &selection.ips()).await?;
        let succeeded = outcomes.iter().filter(|o| o.success).count();

        for outcome in &outcomes {
            match (&outcome.asset_tag, &outcome.error) {
                (Some(tag), _) if outcome.success => println!("  {} registered as {}", outcome.ip, tag),
                (_, Some(error)) => println!("  {} failed: {}", outcome.ip, error),
                _ => println!("  {} failed", outcome.ip),
            }
        }
        if !quiet {
            println!("{} of {} devices registered.", succeeded, outcomes.len());
        }

        Ok(())
    }
}
