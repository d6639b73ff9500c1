//! Error types for the stopwatch engine and its persistence layer

use std::path::PathBuf;

use stopwatch_core::SessionState;
use thiserror::Error;

/// Engine errors. Timing operations themselves never fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopwatchError {
    #[error("cannot {operation} while {from:?}")]
    InvalidStateTransition {
        from: SessionState,
        operation: &'static str,
    },
}

/// Failure to write the persisted record.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode stopwatch state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure to read the persisted record. Always recoverable by starting fresh.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no saved stopwatch state")]
    NotFound,

    #[error("saved stopwatch state is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
