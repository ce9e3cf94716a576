//! Error types for the VAD profile toolkit.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using VadError.
pub type VadResult<T> = Result<T, VadError>;

/// Primary error type shared by every crate in the workspace.
#[derive(Debug, Error)]
pub enum VadError {
    // === Scan Errors ===
    #[error("Not a readable radar scan: {path}: {reason}")]
    UnreadableScan { path: PathBuf, reason: String },

    #[error("Radar scan error in {path}: {message}")]
    Scan { path: PathBuf, message: String },

    #[error("Velocity field not found in scan: {0}")]
    MissingField(String),

    #[error("VAD retrieval for {path} returned {actual} levels, expected {expected}")]
    GridMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("No usable scans among {attempted} input files")]
    NoUsableScans { attempted: usize },

    #[error("Invalid height grid: {0}")]
    InvalidGrid(String),

    // === Registry Errors ===
    #[error("Missing site configuration: {0}")]
    UnknownSite(String),

    #[error("Invalid site registry: {0}")]
    Registry(String),

    // === Persisted Profile Errors ===
    #[error("Missing required variable in {path}: {name}")]
    MissingVariable { path: PathBuf, name: String },

    #[error("Invalid profile data: {0}")]
    InvalidData(String),

    #[error("NetCDF error: {0}")]
    NetCdf(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VadError {
    /// Whether the assembler may skip the offending scan and continue.
    ///
    /// Only the "not a scan" case is recoverable; every other failure aborts
    /// the run.
    pub fn is_skippable(&self) -> bool {
        matches!(self, VadError::UnreadableScan { .. })
    }
}

impl From<serde_yaml::Error> for VadError {
    fn from(err: serde_yaml::Error) -> Self {
        VadError::Registry(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for VadError {
    fn from(err: serde_json::Error) -> Self {
        VadError::Registry(format!("JSON error: {}", err))
    }
}
