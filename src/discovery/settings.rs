//! Per-run discovery settings.

use crate::error::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;
/// Default worker count forwarded to the probe.
pub const DEFAULT_MAX_WORKERS: usize = 50;
/// DICOM port, where medical film printers listen.
pub const DEFAULT_MEDICAL_PORT: u16 = 104;

/// Settings forwarded to the backend on every call of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub timeout_seconds: u64,
    /// Forwarded to the probe; not enforced locally.
    pub max_workers: usize,
    pub include_medical_probe: bool,
    pub medical_port: u16,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_workers: DEFAULT_MAX_WORKERS,
            include_medical_probe: false,
            medical_port: DEFAULT_MEDICAL_PORT,
        }
    }
}

impl DiscoverySettings {
    /// Set the per-call timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the forwarded worker count.
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Enable the medical-device probe on the given port.
    pub fn with_medical_probe(mut self, port: u16) -> Self {
        self.include_medical_probe = true;
        self.medical_port = port;
        self
    }

    /// Reject settings the backend cannot honor.
    pub fn validate(&self) -> DiscoveryResult<()> {
        if self.timeout_seconds == 0 {
            return Err(DiscoveryError::InvalidSettings(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(DiscoveryError::InvalidSettings(
                "max workers must be at least 1".to_string(),
            ));
        }
        if self.include_medical_probe && self.medical_port == 0 {
            return Err(DiscoveryError::InvalidSettings(
                "medical port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults_are_valid() {
        let settings = DiscoverySettings::default();
        assert_ok!(settings.validate());
        assert!(!settings.include_medical_probe);
    }

    #[test]
    fn test_rejects_zero_values() {
        assert_err!(DiscoverySettings::default().with_timeout(0).validate());
        assert_err!(DiscoverySettings::default().with_max_workers(0).validate());
        assert_err!(DiscoverySettings::default().with_medical_probe(0).validate());
        assert_ok!(DiscoverySettings::default().with_medical_probe(11112).validate());
    }
}
