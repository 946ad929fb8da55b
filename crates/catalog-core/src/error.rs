use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Input directory missing or unreadable: {}", path.display())]
    InputDirMissing { path: PathBuf },

    /// A single source file that could not be read or parsed. Never fatal.
    #[error("Malformed document {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write index to {}: {source}", path.display())]
    OutputUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No index built yet at {}", path.display())]
    IndexMissing { path: PathBuf },

    #[error("Index at {} is corrupt: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("Index at {} has format version {found}, expected {expected}", path.display())]
    IndexVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed { path: path.into(), reason: reason.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Per-file failures are skipped and counted; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
