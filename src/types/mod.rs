//! Core type definitions shared across the crate.
//!
//! Range expressions are validated into newtypes up front so the orchestrator
//! never handles unparsed operator input.

mod device;
mod range;
mod run_id;

pub use device::{ConnectionMethod, DiscoveredDevice, NewPrinterRecord, Printer};
pub use range::{estimate_size, validate_ranges, IpRange, RangeError, RangeExpr, ValidRange};
pub use run_id::{RunId, RunIdError};
