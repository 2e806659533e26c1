//! Discovery report persistence.
//!
//! Provides JSON-based storage for finished reports so that registration can
//! act on a past run.

mod json_store;

pub use json_store::ReportStore;
