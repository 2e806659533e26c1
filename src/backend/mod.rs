//! Collaborator abstraction.
//!
//! Packet-level probing (ICMP sweeps, SNMP and medical-port probes) and the
//! printer inventory live in a remote service. These traits describe the four
//! calls this crate makes against it, enabling polymorphism and easier
//! testing.

pub mod http;

use crate::error::BackendResult;
use crate::types::{DiscoveredDevice, NewPrinterRecord, Printer};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub use http::HttpBackend;

/// Parameters for a protocol probe over a list of addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    pub ip_list: Vec<IpAddr>,
    /// Per-call timeout in seconds.
    pub timeout: u64,
    /// Worker count the backend may use for this call.
    pub max_workers: usize,
    pub include_medical_probe: bool,
    pub medical_port: u16,
}

/// Reachability sweep and protocol probe operations.
///
/// The orchestrator issues one call at a time; any fan-out within a call is
/// the backend's business.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Sweep a range expression and return the addresses that answered.
    async fn ping_range(&self, range: &str, timeout_secs: u64) -> BackendResult<Vec<IpAddr>>;

    /// Probe the given addresses and describe what answered.
    async fn discover(&self, request: &DiscoverRequest) -> BackendResult<Vec<DiscoveredDevice>>;
}

/// Printer inventory operations used for registration filtering.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Fetch every known printer.
    async fn list_printers(&self) -> BackendResult<Vec<Printer>>;

    /// Create one printer record.
    async fn create_printer_record(&self, record: &NewPrinterRecord) -> BackendResult<Printer>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend used by unit tests across the crate.

    use super::*;
    use crate::error::BackendError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A recorded backend call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Ping(String),
        Discover(Vec<IpAddr>),
        List,
        Create(String),
    }

    /// Scripted backend. Unscripted ranges answer with no hosts.
    #[derive(Default)]
    pub struct FakeBackend {
        pub pings: HashMap<String, Result<Vec<IpAddr>, String>>,
        pub devices: HashMap<IpAddr, DiscoveredDevice>,
        pub failing_discover_for: Vec<IpAddr>,
        pub printers: Mutex<Vec<Printer>>,
        pub failing_creates: Vec<String>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn ping_ok(mut self, range: &str, ips: &[&str]) -> Self {
            let ips = ips.iter().map(|ip| ip.parse().unwrap()).collect();
            self.pings.insert(range.to_string(), Ok(ips));
            self
        }

        pub fn ping_err(mut self, range: &str, message: &str) -> Self {
            self.pings
                .insert(range.to_string(), Err(message.to_string()));
            self
        }

        pub fn device(mut self, device: DiscoveredDevice) -> Self {
            self.devices.insert(device.ip, device);
            self
        }

        pub fn discover_err_for(mut self, ip: &str) -> Self {
            self.failing_discover_for.push(ip.parse().unwrap());
            self
        }

        pub fn printer(self, id: i64, tag: &str, ip: Option<&str>) -> Self {
            self.printers.lock().unwrap().push(Printer {
                id,
                asset_tag: tag.to_string(),
                ip_address: ip.map(str::to_string),
                hostname: None,
                brand: None,
                model: None,
                serial_number: None,
                status: None,
            });
            self
        }

        pub fn create_err_for(mut self, ip: &str) -> Self {
            self.failing_creates.push(ip.to_string());
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn discover_calls(&self) -> Vec<Vec<IpAddr>> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Discover(ips) => Some(ips),
                    _ => None,
                })
                .collect()
        }
    }

    fn failure(endpoint: &str, reason: &str) -> BackendError {
        BackendError::Request {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    #[async_trait]
    impl DiscoveryBackend for FakeBackend {
        async fn ping_range(&self, range: &str, _timeout_secs: u64) -> BackendResult<Vec<IpAddr>> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Ping(range.to_string()));
            match self.pings.get(range) {
                Some(Ok(ips)) => Ok(ips.clone()),
                Some(Err(message)) => Err(failure("ping-range", message)),
                None => Ok(Vec::new()),
            }
        }

        async fn discover(&self, request: &DiscoverRequest) -> BackendResult<Vec<DiscoveredDevice>> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Discover(request.ip_list.clone()));
            if request
                .ip_list
                .iter()
                .any(|ip| self.failing_discover_for.contains(ip))
            {
                return Err(failure("discover", "probe failed"));
            }
            Ok(request
                .ip_list
                .iter()
                .filter_map(|ip| self.devices.get(ip).cloned())
                .collect())
        }
    }

    #[async_trait]
    impl InventoryBackend for FakeBackend {
        async fn list_printers(&self) -> BackendResult<Vec<Printer>> {
            self.calls.lock().unwrap().push(Call::List);
            Ok(self.printers.lock().unwrap().clone())
        }

        async fn create_printer_record(&self, record: &NewPrinterRecord) -> BackendResult<Printer> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(record.ip_address.clone()));
            if self.failing_creates.contains(&record.ip_address) {
                return Err(BackendError::Status {
                    endpoint: "printers".to_string(),
                    status: 409,
                    body: "duplicate serial".to_string(),
                });
            }
            let mut printers = self.printers.lock().unwrap();
            let printer = Printer {
                id: printers.len() as i64 + 1,
                asset_tag: record.asset_tag.clone(),
                ip_address: Some(record.ip_address.clone()),
                hostname: record.hostname.clone(),
                brand: Some(record.brand.clone()),
                model: Some(record.model.clone()),
                serial_number: record.serial_number.clone(),
                status: Some(record.status.clone()),
            };
            printers.push(printer.clone());
            Ok(printer)
        }
    }
}
