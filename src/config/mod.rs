//! Configuration management for printsweep.
//!
//! Provides XDG-compliant configuration storage for backend location and
//! discovery defaults.

mod settings;

pub use settings::{AppSettings, Paths};
