//! Error types shared by every stage of the simulation pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for simulation, reconstruction and evaluation operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed reconstruction space or acquisition geometry
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Physical or numerical parameter outside its valid domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Phantom file missing, unreadable, or not matching the reconstruction space
    #[error("Could not load phantom {}: {reason}", .path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// No correction model checkpoint at the expected location
    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    /// Configuration file could not be read or parsed
    #[error("Bad config file {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::DataLoad { path: path.into(), reason: reason.to_string() }
    }
}
