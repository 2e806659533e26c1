//! Discover subcommand implementation.
//!
//! Handles `printsweep discover <range>...`: runs both discovery phases,
//! marks devices already in inventory, and saves the report.

use crate::backend::{HttpBackend, InventoryBackend};
use crate::config::AppSettings;
use crate::discovery::{DiscoveryOrchestrator, DiscoveryProgress, DiscoverySettings};
use crate::error::{CliError, CliResult};
use crate::registration::{annotate, dedup_by_ip, InventoryIndex};
use crate::storage::ReportStore;
use crate::types::{DiscoveredDevice, IpRange};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Discover printers in IP ranges.
#[derive(Parser, Debug)]
pub struct DiscoverCommand {
    /// Ranges to scan, in dash or CIDR notation
    ///
    /// Examples:
    ///   192.168.1.1-192.168.1.100   Dash range
    ///   10.20.0.0/24                CIDR block
    #[arg(value_name = "RANGE", required = true)]
    pub ranges: Vec<String>,

    /// Per-call timeout in seconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Worker count the backend may use per probe
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Also probe for medical devices
    #[arg(long)]
    pub medical: bool,

    /// Port for the medical probe
    #[arg(long, value_name = "PORT")]
    pub medical_port: Option<u16>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Don't save the report
    #[arg(long)]
    pub no_save: bool,
}

impl DiscoverCommand {
    /// Discovery settings from configuration, overridden by flags.
    pub fn discovery_settings(&self, settings: &AppSettings) -> DiscoverySettings {
        let mut discovery = settings.discovery_settings();
        if let Some(timeout) = self.timeout {
            discovery.timeout_seconds = timeout;
        }
        if let Some(workers) = self.workers {
            discovery.max_workers = workers;
        }
        if self.medical {
            discovery.include_medical_probe = true;
        }
        if let Some(port) = self.medical_port {
            discovery.medical_port = port;
        }
        discovery
    }

    /// Execute the discover command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let backend = Arc::new(HttpBackend::new(&settings.backend_url)?);
        let discovery = self.discovery_settings(settings);
        let ranges = IpRange::from_expressions(self.ranges.iter().cloned());

        let mut orchestrator = DiscoveryOrchestrator::new(Arc::clone(&backend));
        let spinner = (!quiet && !self.json).then(|| spawn_spinner(orchestrator.subscribe()));

        let result = tokio::select! {
            result = orchestrator.start(&ranges, &discovery) => result.map_err(CliError::from),
            _ = tokio::signal::ctrl_c() => {
                Err(CliError::Other("discovery interrupted".to_string()))
            }
        };

        // Dropping the orchestrator closes the progress stream, which lets
        // the spinner clear itself.
        drop(orchestrator);
        if let Some(handle) = spinner {
            let _ = handle.await;
        }
        let mut report = result?;

        // Inventory is only needed for annotation; a failure here loses the
        // registered flags, not the run.
        match backend.list_printers().await {
            Ok(printers) => annotate(&mut report.devices, &InventoryIndex::from_printers(&printers)),
            Err(e) => warn!(error = %e, "could not load inventory; devices not checked"),
        }

        if settings.auto_save_reports && !self.no_save {
            ReportStore::new()?.save(&report)?;
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        if !quiet {
            println!("{}", report.summary());
            for range in report.failed_ranges() {
                println!(
                    "  {} failed: {}",
                    range.range.raw,
                    range.error.as_deref().unwrap_or("unknown error")
                );
            }
            for line in device_lines(&report.devices) {
                println!("  {}", line);
            }
            println!("Run id: {}", report.id.short());
        }

        Ok(())
    }
}

/// One line per printer, each address shown once, tagged with its inventory
/// state.
fn device_lines(devices: &[DiscoveredDevice]) -> Vec<String> {
    dedup_by_ip(devices.to_vec())
        .iter()
        .map(|device| match &device.existing_asset_tag {
            Some(tag) => format!("{} [{}]", device.label(), tag),
            None => format!("{} [new]", device.label()),
        })
        .collect()
}

/// Drive a spinner from the progress stream until the sender goes away.
fn spawn_spinner(mut rx: watch::Receiver<DiscoveryProgress>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(120));

        while rx.changed().await.is_ok() {
            let p = rx.borrow_and_update().clone();
            pb.set_message(format!(
                "[{}] {} ({}/{} ranges, {:.0}%, {} responsive, {} printers)",
                p.phase,
                p.stage,
                p.completed_ranges,
                p.total_ranges,
                p.fraction_complete() * 100.0,
                p.ping_responses,
                p.devices_found
            ));
        }
        pb.finish_and_clear();
    })
}
