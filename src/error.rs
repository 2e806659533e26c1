//! Error types for printsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer has its own
//! enum; `CliError` folds them together for the binary.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single call to the probing or inventory backend.
///
/// During discovery these are recorded on the affected range and never abort
/// the run.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("invalid backend URL '{0}'")]
    InvalidUrl(String),
}

/// Result type alias for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that halt a whole discovery run.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("a discovery run is already in progress")]
    AlreadyRunning,

    #[error("invalid discovery settings: {0}")]
    InvalidSettings(String),

    #[error("range {range}: illegal phase transition {from} -> {to}")]
    InvalidTransition {
        range: String,
        from: String,
        to: String,
    },

    #[error("range {0} did not reach a terminal state")]
    Unfinished(String),
}

/// Result type alias for discovery runs.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors that prevent a bulk registration from starting.
///
/// Individual record failures are reported per device instead.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("failed to load printer inventory: {0}")]
    Inventory(#[from] BackendError),

    #[error("no devices selected")]
    NothingSelected,
}

/// Result type alias for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Report storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("report not found: {0}")]
    ReportNotFound(String),

    #[error("ambiguous report id '{prefix}': {matches} matches")]
    AmbiguousId { prefix: String, matches: usize },

    #[error("failed to save report: {0}")]
    SaveFailed(String),

    #[error("failed to load report: {0}")]
    LoadFailed(String),

    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for storage.
pub type StorageResult<T> = Result<T, StorageError>;

/// Top-level error for CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.to_string())
    }
}
