//! Error types for durable timer storage

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or writing the timer store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read timer store {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write timer store {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse timer store TOML in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize timer store")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to create store directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timer store lock poisoned")]
    Poisoned,
}
