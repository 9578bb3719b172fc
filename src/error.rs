//! Error types for ehnet-train
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ehnet-train error types
#[derive(Error, Debug)]
pub enum Error {
    /// Another process claimed the same run version directory
    #[error("Directory conflict: {path} was created concurrently by another run")]
    DirectoryConflict {
        /// Version directory both runs tried to claim
        path: PathBuf,
    },

    /// Bounded retry of version allocation ran out (fatal to the run)
    #[error("Version allocation exhausted after {attempts} attempts for {base_dir}/{run_name}\nNo output directory means no safe place to write checkpoints.")]
    VersionAllocationExhausted {
        /// Base directory the versioner scanned
        base_dir: PathBuf,
        /// Run name whose versions were contended
        run_name: String,
        /// Number of directory-creation attempts made
        attempts: u32,
    },

    /// Checkpoint artifact materialization failed mid-write (recoverable per epoch)
    #[error("Checkpoint write failed: {0}\nThe offer was discarded; training can continue.")]
    WriteFailure(String),

    /// Configuration validation failed at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
