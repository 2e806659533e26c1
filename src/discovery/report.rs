//! Completion summary of a discovery run.

use crate::discovery::state::{RangePhase, RangeScanState};
use crate::types::{DiscoveredDevice, RunId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a finished run produced. Built even when some ranges failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// One entry per validated range, in input order.
    pub range_details: Vec<RangeScanState>,
    pub devices: Vec<DiscoveredDevice>,
    pub ping_responses: u64,
    pub snmp_responses: u64,
    pub devices_found: u64,
    pub total_ips_estimate: u64,
    /// `ping_responses / total_ips_estimate`, 0 when nothing was estimated.
    pub efficiency: f64,
    pub duration_ms: u64,
}

impl DiscoveryReport {
    /// Build a report from final range states and the discovered list.
    pub fn build(
        id: RunId,
        started_at: DateTime<Utc>,
        range_details: Vec<RangeScanState>,
        devices: Vec<DiscoveredDevice>,
        duration_ms: u64,
    ) -> Self {
        let ping_responses = range_details.iter().map(|r| r.ping_responses).sum();
        let snmp_responses = range_details.iter().map(|r| r.snmp_responses).sum();
        let devices_found = range_details.iter().map(|r| r.devices_found).sum();
        let total_ips_estimate = range_details.iter().map(|r| r.estimated_size).sum();

        Self {
            id,
            started_at,
            completed_at: Utc::now(),
            range_details,
            devices,
            ping_responses,
            snmp_responses,
            devices_found,
            total_ips_estimate,
            efficiency: efficiency(ping_responses, total_ips_estimate),
            duration_ms,
        }
    }

    /// Ranges that ended in `Error`.
    pub fn failed_ranges(&self) -> impl Iterator<Item = &RangeScanState> {
        self.range_details
            .iter()
            .filter(|r| r.phase == RangePhase::Error)
    }

    /// Devices not yet in inventory.
    pub fn new_devices(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.iter().filter(|d| !d.already_registered)
    }

    /// One-line summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} ranges ({} failed), {} hosts responded, {} printers found ({} new), {:.1}% responsive [{:.2}s]",
            self.range_details.len(),
            self.failed_ranges().count(),
            self.ping_responses,
            self.devices_found,
            self.new_devices().count(),
            self.efficiency * 100.0,
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Share of estimated hosts that answered the sweep.
pub fn efficiency(ping_responses: u64, total_ips_estimate: u64) -> f64 {
    if total_ips_estimate == 0 {
        return 0.0;
    }
    ping_responses as f64 / total_ips_estimate as f64
}
