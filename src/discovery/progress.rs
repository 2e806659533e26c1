//! Live progress of a discovery run.
//!
//! The orchestrator owns a [`ProgressAggregator`] and pushes a new
//! [`DiscoveryProgress`] snapshot through a `watch` channel at every state
//! transition. A sampler task refreshes `elapsed_ms` on a fixed tick so
//! observers see time advance even while a long backend call is pending.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

/// How often the sampler refreshes elapsed time.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

/// Aggregate phase of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryPhase {
    #[default]
    Idle,
    Ping,
    Snmp,
    Complete,
}

impl fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Ping => write!(f, "ping"),
            Self::Snmp => write!(f, "snmp"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Point-in-time view of a run. Consumers get copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryProgress {
    /// Human-readable description of the current step.
    pub stage: String,
    pub total_ranges: usize,
    /// Ranges that have reached their final state for this run.
    pub completed_ranges: usize,
    pub current_range: Option<String>,
    pub devices_found: u64,
    pub ping_responses: u64,
    pub snmp_responses: u64,
    pub total_ips_estimate: u64,
    pub elapsed_ms: u64,
    pub phase: DiscoveryPhase,
}

impl DiscoveryProgress {
    /// Fraction of ranges finished, in `0.0..=1.0`.
    pub fn fraction_complete(&self) -> f64 {
        if self.total_ranges == 0 {
            return 0.0;
        }
        self.completed_ranges as f64 / self.total_ranges as f64
    }
}

/// Publisher side of the progress stream.
///
/// Counter updates go through [`add_*`](Self::add_ping_responses) methods so
/// they can only grow between [`reset`](Self::reset) calls.
pub struct ProgressAggregator {
    tx: watch::Sender<DiscoveryProgress>,
    started: Instant,
    sampler: Option<JoinHandle<()>>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DiscoveryProgress {
            stage: "Idle".to_string(),
            ..DiscoveryProgress::default()
        });
        Self {
            tx,
            started: Instant::now(),
            sampler: None,
        }
    }

    /// Subscribe to snapshots. The receiver sees the current value immediately.
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryProgress> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> DiscoveryProgress {
        self.tx.borrow().clone()
    }

    /// Zero everything for a new run and start the elapsed-time sampler.
    pub fn reset(&mut self, total_ranges: usize, total_ips_estimate: u64) {
        self.stop_sampler();
        self.started = Instant::now();
        self.tx.send_replace(DiscoveryProgress {
            stage: "Starting discovery".to_string(),
            total_ranges,
            total_ips_estimate,
            phase: DiscoveryPhase::Idle,
            ..DiscoveryProgress::default()
        });
        self.start_sampler();
    }

    /// Return to the idle snapshot, dropping all counters.
    pub fn clear(&mut self) {
        self.stop_sampler();
        self.tx.send_replace(DiscoveryProgress {
            stage: "Idle".to_string(),
            ..DiscoveryProgress::default()
        });
    }

    pub fn set_phase(&self, phase: DiscoveryPhase, stage: impl Into<String>) {
        let stage = stage.into();
        self.tx.send_modify(|p| {
            p.phase = phase;
            p.stage = stage;
            p.current_range = None;
        });
    }

    pub fn set_current(&self, range: &str, stage: impl Into<String>) {
        let stage = stage.into();
        self.tx.send_modify(|p| {
            p.current_range = Some(range.to_string());
            p.stage = stage;
        });
    }

    pub fn add_ping_responses(&self, n: u64) {
        self.tx.send_modify(|p| p.ping_responses += n);
    }

    pub fn add_probe_results(&self, snmp_responses: u64, devices: u64) {
        self.tx.send_modify(|p| {
            p.snmp_responses += snmp_responses;
            p.devices_found += devices;
        });
    }

    pub fn range_finished(&self) {
        self.tx.send_modify(|p| {
            p.completed_ranges = (p.completed_ranges + 1).min(p.total_ranges);
        });
    }

    /// Final transition: stop sampling and publish the terminal snapshot.
    pub fn finish(&mut self, stage: impl Into<String>) {
        self.stop_sampler();
        let elapsed = self.elapsed_ms();
        let stage = stage.into();
        self.tx.send_modify(|p| {
            p.phase = DiscoveryPhase::Complete;
            p.stage = stage;
            p.current_range = None;
            p.elapsed_ms = p.elapsed_ms.max(elapsed);
        });
    }

    /// Record a fatal failure. Phase and counters are left as they were.
    pub fn fail(&mut self, stage: impl Into<String>) {
        self.stop_sampler();
        let elapsed = self.elapsed_ms();
        let stage = stage.into();
        self.tx.send_modify(|p| {
            p.stage = stage;
            p.current_range = None;
            p.elapsed_ms = p.elapsed_ms.max(elapsed);
        });
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Handle that stops the running sampler, if any.
    pub fn sampler_handle(&self) -> Option<AbortHandle> {
        self.sampler.as_ref().map(JoinHandle::abort_handle)
    }

    fn start_sampler(&mut self) {
        let tx = self.tx.clone();
        let started = self.started;
        self.sampler = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
            loop {
                ticker.tick().await;
                let elapsed = started.elapsed().as_millis() as u64;
                tx.send_modify(|p| p.elapsed_ms = p.elapsed_ms.max(elapsed));
            }
        }));
    }

    fn stop_sampler(&mut self) {
        if let Some(handle) = self.sampler.take() {
            handle.abort();
        }
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressAggregator {
    fn drop(&mut self) {
        self.stop_sampler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_zeroes_counters() {
        let mut agg = ProgressAggregator::new();
        agg.reset(2, 10);
        agg.add_ping_responses(4);
        agg.add_probe_results(1, 1);
        agg.range_finished();

        agg.reset(3, 20);
        let p = agg.snapshot();
        assert_eq!(p.total_ranges, 3);
        assert_eq!(p.total_ips_estimate, 20);
        assert_eq!(p.ping_responses, 0);
        assert_eq!(p.devices_found, 0);
        assert_eq!(p.completed_ranges, 0);
        assert_eq!(p.phase, DiscoveryPhase::Idle);
    }

    #[tokio::test]
    async fn test_completed_ranges_capped() {
        let mut agg = ProgressAggregator::new();
        agg.reset(1, 0);
        agg.range_finished();
        agg.range_finished();
        assert_eq!(agg.snapshot().completed_ranges, 1);
        assert_eq!(agg.snapshot().fraction_complete(), 1.0);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let mut agg = ProgressAggregator::new();
        let mut rx = agg.subscribe();
        agg.reset(1, 3);
        agg.set_phase(DiscoveryPhase::Ping, "Sweeping");
        agg.add_ping_responses(3);

        rx.changed().await.unwrap();
        let p = rx.borrow_and_update().clone();
        assert_eq!(p.phase, DiscoveryPhase::Ping);
        assert_eq!(p.ping_responses, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_advances_elapsed() {
        let mut agg = ProgressAggregator::new();
        agg.reset(1, 0);
        let before = agg.snapshot().elapsed_ms;

        tokio::time::sleep(SAMPLE_INTERVAL * 4).await;
        let during = agg.snapshot().elapsed_ms;
        assert!(during > before);
        assert!(during >= 750);

        agg.finish("Done");
        let p = agg.snapshot();
        assert_eq!(p.phase, DiscoveryPhase::Complete);
        assert!(p.elapsed_ms >= during);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_keeps_counters_and_stops_sampler() {
        let mut agg = ProgressAggregator::new();
        agg.reset(2, 10);
        agg.set_phase(DiscoveryPhase::Snmp, "Probing");
        agg.add_ping_responses(3);
        tokio::time::sleep(SAMPLE_INTERVAL * 2).await;

        agg.fail("Discovery failed");
        let failed = agg.snapshot();
        assert_eq!(failed.stage, "Discovery failed");
        assert_eq!(failed.phase, DiscoveryPhase::Snmp);
        assert_eq!(failed.ping_responses, 3);
        assert!(failed.current_range.is_none());

        tokio::time::sleep(SAMPLE_INTERVAL * 4).await;
        assert_eq!(agg.snapshot().elapsed_ms, failed.elapsed_ms);
    }
}
