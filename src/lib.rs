//! # printsweep - Printer Fleet Network Discovery
//!
//! printsweep finds printers on operator-supplied IP ranges and helps add
//! them to a fleet inventory. Packet-level work (ICMP sweeps, SNMP and
//! medical-port probes) is done by a remote backend; this crate orchestrates
//! it.
//!
//! ## Features
//!
//! - **Two-phase discovery**: a reachability sweep of every range, then a
//!   protocol probe of only the hosts that answered
//! - **Partial-failure tolerance**: a failing range is marked and skipped,
//!   the run always completes with a report
//! - **Live progress**: monotonic snapshots over a `watch` channel
//! - **Registration filtering**: devices already in inventory can never be
//!   selected; bulk registration reports per-device outcomes
//! - **Report history**: finished runs are saved as JSON
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use printsweep::backend::HttpBackend;
//! use printsweep::discovery::{DiscoveryOrchestrator, DiscoverySettings};
//! use printsweep::types::IpRange;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(HttpBackend::new("http://localhost:8000")?);
//!     let mut orchestrator = DiscoveryOrchestrator::new(backend);
//!
//!     let ranges = IpRange::from_expressions(["192.168.1.1-192.168.1.100"]);
//!     let report = orchestrator.start(&ranges, &DiscoverySettings::default()).await?;
//!
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Range expressions, devices, and inventory records
//! - [`backend`] - Collaborator traits and the HTTP implementation
//! - [`discovery`] - The orchestrator, range states, and progress
//! - [`registration`] - Inventory matching and bulk registration
//! - [`config`] - Application settings
//! - [`storage`] - Report persistence
//! - [`error`] - Error types

pub mod backend;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod registration;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use discovery::{DiscoveryOrchestrator, DiscoveryProgress, DiscoveryReport, DiscoverySettings};
pub use error::{BackendError, CliError, DiscoveryError};
pub use types::{DiscoveredDevice, IpRange, RunId, ValidRange};
