//! Stopwatch engine with lap splits and sessions that survive restarts.
//!
//! The host owns a [`Stopwatch`], drives [`Stopwatch::tick`] on its own
//! schedule while [`Stopwatch::wants_ticks`] is true, and persists through a
//! [`StateStore`]. Pure time math lives in `stopwatch-core`.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod observer;
pub mod stopwatch;
pub mod storage;

pub use stopwatch_core::{
    elapsed, format, format_lap, pad2, DisplayFields, LapStore, SessionState, Timestamp,
};

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{EngineConfig, HostConfig};
pub use crate::error::{LoadError, StopwatchError, StorageError};
pub use crate::observer::{ChangeSet, ObserverId, StopwatchObserver};
pub use crate::stopwatch::Stopwatch;
pub use crate::storage::{FileStore, MemoryStore, PersistedState, StateStore};
