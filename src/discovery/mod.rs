//! Discovery orchestrator - drives the two-phase scan over all ranges.
//!
//! Phase 1 sweeps every range for responsive hosts. Only once the sweep has
//! finished for all ranges does Phase 2 probe the responsive hosts for
//! printers. Each range is scanned in input order with one outstanding backend
//! call at a time, and a failing range never stops the run.

pub mod progress;
pub mod report;
pub mod settings;
pub mod state;

use crate::backend::{DiscoverRequest, DiscoveryBackend};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::types::{validate_ranges, DiscoveredDevice, IpRange, RunId};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, instrument, warn};

pub use progress::{DiscoveryPhase, DiscoveryProgress, ProgressAggregator};
pub use report::DiscoveryReport;
pub use settings::DiscoverySettings;
pub use state::{RangePhase, RangeScanState};

/// Stage shown when a run halts on a contract violation.
pub const FAILED_STAGE: &str = "Discovery failed";

/// Owns all state of discovery runs and publishes their progress.
///
/// Only the orchestrator mutates range states, the discovered list, and the
/// progress snapshot. Observers call [`subscribe`](Self::subscribe).
pub struct DiscoveryOrchestrator<B: ?Sized> {
    backend: Arc<B>,
    states: Vec<RangeScanState>,
    devices: Vec<DiscoveredDevice>,
    progress: ProgressAggregator,
    running: Arc<AtomicBool>,
}

/// Clears the running flag and stops the elapsed-time sampler when a run
/// ends, including when its future is dropped mid-flight.
struct RunGuard {
    flag: Arc<AtomicBool>,
    sampler: Option<AbortHandle>,
}

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> DiscoveryResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(DiscoveryError::AlreadyRunning);
        }
        Ok(Self {
            flag: Arc::clone(flag),
            sampler: None,
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.abort();
        }
        self.flag.store(false, Ordering::Release);
    }
}

impl<B: DiscoveryBackend + ?Sized> DiscoveryOrchestrator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            states: Vec::new(),
            devices: Vec::new(),
            progress: ProgressAggregator::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Live progress snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryProgress> {
        self.progress.subscribe()
    }

    pub fn snapshot(&self) -> DiscoveryProgress {
        self.progress.snapshot()
    }

    /// Per-range states of the current or last run.
    pub fn range_states(&self) -> &[RangeScanState] {
        &self.states
    }

    /// Printers discovered by the current or last run.
    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Drop results of the last run. Only valid while idle.
    pub fn clear(&mut self) -> DiscoveryResult<()> {
        if self.is_running() {
            return Err(DiscoveryError::AlreadyRunning);
        }
        self.states.clear();
        self.devices.clear();
        self.progress.clear();
        Ok(())
    }

    /// Run discovery over `ranges`.
    ///
    /// Malformed ranges are dropped. Per-range backend failures are recorded
    /// on the range and the run continues; only invalid settings or a broken
    /// state transition end the run with an error.
    #[instrument(skip_all, fields(ranges = ranges.len()))]
    pub async fn start(
        &mut self,
        ranges: &[IpRange],
        settings: &DiscoverySettings,
    ) -> DiscoveryResult<DiscoveryReport> {
        let mut guard = RunGuard::acquire(&self.running)?;
        if let Err(e) = settings.validate() {
            return Err(self.halt(e));
        }

        let run_id = RunId::new();
        let started_at = Utc::now();

        self.states = validate_ranges(ranges)
            .into_iter()
            .map(RangeScanState::new)
            .collect();
        self.devices.clear();

        let estimate: u64 = self.states.iter().map(|s| s.estimated_size).sum();
        self.progress.reset(self.states.len(), estimate);
        guard.sampler = self.progress.sampler_handle();

        info!(
            run = %run_id.short(),
            valid = self.states.len(),
            dropped = ranges.len() - self.states.len(),
            estimate,
            "starting discovery"
        );

        self.run(run_id, started_at, settings).await
    }

    /// Drive both phases over the prepared range states and build the report.
    async fn run(
        &mut self,
        run_id: RunId,
        started_at: DateTime<Utc>,
        settings: &DiscoverySettings,
    ) -> DiscoveryResult<DiscoveryReport> {
        if let Err(e) = self.run_phases(settings).await {
            return Err(self.halt(e));
        }

        let found = self.devices.len();
        self.progress
            .finish(format!("Discovery complete: {} printers found", found));

        let report = DiscoveryReport::build(
            run_id,
            started_at,
            self.states.clone(),
            self.devices.clone(),
            self.progress.elapsed_ms(),
        );

        info!(
            run = %run_id.short(),
            responsive = report.ping_responses,
            printers = report.devices_found,
            failed = report.failed_ranges().count(),
            "discovery complete"
        );

        Ok(report)
    }

    /// Publish the failure stage for a critical error and hand it back.
    fn halt(&mut self, e: DiscoveryError) -> DiscoveryError {
        error!(error = %e, "discovery halted");
        self.progress.fail(FAILED_STAGE);
        e
    }

    async fn run_phases(&mut self, settings: &DiscoverySettings) -> DiscoveryResult<()> {
        self.sweep(settings).await?;
        let responsive = self.responsive_union();
        self.probe(settings, responsive).await?;

        if let Some(state) = self.states.iter().find(|s| !s.is_terminal()) {
            return Err(DiscoveryError::Unfinished(state.range.raw.clone()));
        }
        Ok(())
    }

    /// Phase 1: reachability sweep of every range.
    async fn sweep(&mut self, settings: &DiscoverySettings) -> DiscoveryResult<()> {
        let total = self.states.len();
        self.progress
            .set_phase(DiscoveryPhase::Ping, "Sweeping ranges for responsive hosts");

        for (i, state) in self.states.iter_mut().enumerate() {
            let raw = state.range.raw.clone();
            self.progress
                .set_current(&raw, format!("Pinging range {}/{}: {}", i + 1, total, raw));
            state.advance(RangePhase::PingScanning)?;

            match self
                .backend
                .ping_range(&raw, settings.timeout_seconds)
                .await
            {
                Ok(ips) => {
                    let count = ips.len() as u64;
                    state.ping_responses = count;
                    state.responsive_ips = ips;
                    state.complete()?;
                    self.progress.add_ping_responses(count);
                    debug!(range = %raw, responsive = count, "sweep finished");
                }
                Err(e) => {
                    warn!(range = %raw, error = %e, "sweep failed");
                    state.fail(e.to_string())?;
                    // A range that fails the sweep is final for this run.
                    self.progress.range_finished();
                }
            }
        }

        Ok(())
    }

    /// Deduplicated union of every responsive address.
    fn responsive_union(&self) -> HashSet<IpAddr> {
        self.states
            .iter()
            .flat_map(|s| s.responsive_ips.iter().copied())
            .collect()
    }

    /// Phase 2: protocol probe of the responsive hosts, range by range.
    ///
    /// Each address in `unprobed` is sent to the backend at most once, by the
    /// first range (in input order) that saw it.
    async fn probe(
        &mut self,
        settings: &DiscoverySettings,
        mut unprobed: HashSet<IpAddr>,
    ) -> DiscoveryResult<()> {
        let total = self.states.len();
        self.progress
            .set_phase(DiscoveryPhase::Snmp, "Probing responsive hosts for printers");

        for state in &mut self.states {
            state.reset_for_probe();
        }

        for (i, state) in self.states.iter_mut().enumerate() {
            if state.phase == RangePhase::Error {
                continue;
            }

            let raw = state.range.raw.clone();
            let ip_list: Vec<IpAddr> = state
                .responsive_ips
                .iter()
                .copied()
                .filter(|ip| unprobed.remove(ip))
                .collect();

            if ip_list.is_empty() {
                state.devices_found = 0;
                state.complete()?;
                self.progress.range_finished();
                debug!(range = %raw, "nothing to probe");
                continue;
            }

            self.progress
                .set_current(&raw, format!("Probing range {}/{}: {}", i + 1, total, raw));
            state.advance(RangePhase::SnmpScanning)?;

            let request = DiscoverRequest {
                ip_list,
                timeout: settings.timeout_seconds,
                max_workers: settings.max_workers,
                include_medical_probe: settings.include_medical_probe,
                medical_port: settings.medical_port,
            };

            match self.backend.discover(&request).await {
                Ok(found) => {
                    let printers: Vec<DiscoveredDevice> =
                        found.into_iter().filter(|d| d.is_printer).collect();
                    let count = printers.len() as u64;
                    state.snmp_responses = count;
                    state.devices_found = count;
                    state.complete()?;
                    for printer in &printers {
                        info!(range = %raw, device = %printer.label(), "printer found");
                    }
                    self.devices.extend(printers);
                    self.progress.add_probe_results(count, count);
                }
                Err(e) => {
                    warn!(range = %raw, error = %e, "probe failed");
                    state.fail(e.to_string())?;
                }
            }
            self.progress.range_finished();
        }

        Ok(())
    }
}
