//! Per-range scan state.
//!
//! One `RangeScanState` exists per validated range for the lifetime of a run.
//! It is reused by both phases: Phase 1 drives it from `Pending` to a terminal
//! state, Phase 2 resets it to `Pending` and drives it again.

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::types::ValidRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Where a range is within the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePhase {
    Pending,
    PingScanning,
    SnmpScanning,
    Completed,
    Error,
}

impl RangePhase {
    /// `Completed` or `Error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::PingScanning | Self::SnmpScanning => 1,
            Self::Completed | Self::Error => 2,
        }
    }
}

impl fmt::Display for RangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::PingScanning => write!(f, "ping scanning"),
            Self::SnmpScanning => write!(f, "snmp scanning"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Status record for one range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeScanState {
    pub range: ValidRange,
    pub phase: RangePhase,
    pub ping_responses: u64,
    pub snmp_responses: u64,
    pub devices_found: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Addresses that answered the reachability sweep.
    #[serde(default)]
    pub responsive_ips: Vec<IpAddr>,
    pub estimated_size: u64,
}

impl RangeScanState {
    /// Fresh state for a range at run start.
    pub fn new(range: ValidRange) -> Self {
        let estimated_size = range.estimate_size();
        Self {
            range,
            phase: RangePhase::Pending,
            ping_responses: 0,
            snmp_responses: 0,
            devices_found: 0,
            error: None,
            responsive_ips: Vec::new(),
            estimated_size,
        }
    }

    /// Move to `next`, which must not be behind the current phase.
    ///
    /// Leaving a terminal state is only possible through [`reset_for_probe`].
    ///
    /// [`reset_for_probe`]: Self::reset_for_probe
    pub fn advance(&mut self, next: RangePhase) -> DiscoveryResult<()> {
        let legal = next.rank() > self.phase.rank()
            || (next == self.phase && !next.is_terminal());
        if !legal {
            return Err(DiscoveryError::InvalidTransition {
                range: self.range.raw.clone(),
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Finish the current phase successfully.
    pub fn complete(&mut self) -> DiscoveryResult<()> {
        self.advance(RangePhase::Completed)
    }

    /// Finish the current phase with an error.
    pub fn fail(&mut self, message: impl Into<String>) -> DiscoveryResult<()> {
        self.advance(RangePhase::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Start the second sub-run. Ranges that failed the sweep keep their error.
    pub fn reset_for_probe(&mut self) {
        if self.phase != RangePhase::Error {
            self.phase = RangePhase::Pending;
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}
