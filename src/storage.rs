use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use stopwatch_core::{duration_to_secs_string, parse_secs_string, SessionState, Timestamp};

use crate::error::{LoadError, StorageError};

const KEY_LAPS: &str = "laps";
const KEY_START_TIME: &str = "startTime";
const KEY_LAP_TIME: &str = "lapTime";
const KEY_STATE: &str = "state";
const KEY_PAUSED_INTERVAL: &str = "lastPausedTimeInterval";
const KEY_PAUSED_LAP: &str = "lastPausedLapTime";

/// Everything needed to rebuild an engine in a later process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Oldest first.
    pub laps: Vec<String>,
    pub start_time: Option<Timestamp>,
    pub lap_time: Option<Timestamp>,
    pub state: SessionState,
    pub last_paused_time_interval: Duration,
    pub last_paused_lap_time: Duration,
}

/// Storage medium for the persisted record.
pub trait StateStore {
    fn save(&self, state: &PersistedState) -> Result<(), StorageError>;
    fn load(&self) -> Result<PersistedState, LoadError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Record<'a> {
    laps: &'a [String],
    start_time: Option<u64>,
    lap_time: Option<u64>,
    state: &'static str,
    last_paused_time_interval: String,
    last_paused_lap_time: String,
}

/// Encode as JSON. Instants are epoch milliseconds, durations decimal
/// seconds in strings.
pub fn encode_state(state: &PersistedState) -> Result<Vec<u8>, StorageError> {
    let record = Record {
        laps: &state.laps,
        start_time: state.start_time.map(Timestamp::epoch_millis),
        lap_time: state.lap_time.map(Timestamp::epoch_millis),
        state: state.state.tag(),
        last_paused_time_interval: duration_to_secs_string(state.last_paused_time_interval),
        last_paused_lap_time: duration_to_secs_string(state.last_paused_lap_time),
    };
    Ok(serde_json::to_vec_pretty(&record)?)
}

/// Decode leniently: bad numeric fields become zero, a bad state tag becomes
/// paused, a bad instant becomes `None`. A record without a string-only
/// `laps` array decodes to the default state.
pub fn decode_state(data: &[u8]) -> Result<PersistedState, LoadError> {
    let value: Value =
        serde_json::from_slice(data).map_err(|e| LoadError::Malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(LoadError::Malformed("expected a JSON object".into()));
    };

    let laps = match map.get(KEY_LAPS) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };
    let Some(laps) = laps else {
        log::warn!("saved state has no usable lap list, starting fresh");
        return Ok(PersistedState::default());
    };

    Ok(PersistedState {
        laps,
        start_time: read_instant(&map, KEY_START_TIME),
        lap_time: read_instant(&map, KEY_LAP_TIME),
        state: map
            .get(KEY_STATE)
            .and_then(Value::as_str)
            .and_then(SessionState::from_tag)
            .unwrap_or_default(),
        last_paused_time_interval: read_secs(&map, KEY_PAUSED_INTERVAL),
        last_paused_lap_time: read_secs(&map, KEY_PAUSED_LAP),
    })
}

fn read_instant(map: &Map<String, Value>, key: &str) -> Option<Timestamp> {
    map.get(key)
        .and_then(Value::as_u64)
        .map(Timestamp::from_epoch_millis)
}

fn read_secs(map: &Map<String, Value>, key: &str) -> Duration {
    match map.get(key).and_then(Value::as_str).and_then(parse_secs_string) {
        Some(secs) => secs,
        None => {
            if map.contains_key(key) {
                log::warn!("saved field {} is malformed, using 0.0", key);
            }
            Duration::ZERO
        }
    }
}

/// JSON file on disk, replaced atomically on every save.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStore {
    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let data = encode_state(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &data).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        log::debug!("saved stopwatch state to {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<PersistedState, LoadError> {
        match fs::read(&self.path) {
            Ok(data) => decode_state(&data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound),
            Err(e) => Err(self.io_error(e).into()),
        }
    }
}

/// In-memory medium. Holds the encoded bytes so it exercises the same codec
/// as the file store.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Option<Vec<u8>>>,
    fail_saves: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(Some(data.into())),
            fail_saves: Mutex::new(false),
        }
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }
}

impl StateStore for MemoryStore {
    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        if *self.fail_saves.lock() {
            return Err(StorageError::Unavailable("memory store rejects saves".into()));
        }
        let data = encode_state(state)?;
        *self.data.lock() = Some(data);
        Ok(())
    }

    fn load(&self) -> Result<PersistedState, LoadError> {
        match self.data.lock().as_deref() {
            Some(data) => decode_state(data),
            None => Err(LoadError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_state() -> PersistedState {
        PersistedState {
            laps: vec!["01:02.03".into()],
            start_time: Some(Timestamp::from_epoch_millis(1_700_000_000_250)),
            lap_time: Some(Timestamp::from_epoch_millis(1_700_000_010_000)),
            state: SessionState::Running,
            last_paused_time_interval: Duration::from_secs_f64(12.5),
            last_paused_lap_time: Duration::from_secs_f64(3.2),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("stopwatch-test-{}-{}", std::process::id(), name))
            .join("state.json")
    }

    #[test]
    fn test_round_trip_memory() {
        let store = MemoryStore::new();
        let state = running_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_round_trip_default() {
        let store = MemoryStore::new();
        store.save(&PersistedState::default()).unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_record_layout() {
        let data = encode_state(&running_state()).unwrap();
        let value: Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["laps"][0], "01:02.03");
        assert_eq!(value["startTime"], 1_700_000_000_250u64);
        assert_eq!(value["state"], "r");
        assert_eq!(value["lastPausedTimeInterval"], "12.5");
        assert_eq!(value["lastPausedLapTime"], "3.2");

        let paused = encode_state(&PersistedState::default()).unwrap();
        let value: Value = serde_json::from_slice(&paused).unwrap();
        assert!(value["startTime"].is_null());
        assert_eq!(value["state"], "p");
        assert_eq!(value["lastPausedTimeInterval"], "0");
    }

    #[test]
    fn test_malformed_fields_default() {
        let data = br#"{
            "laps": ["00:10.00"],
            "startTime": "yesterday",
            "state": "x",
            "lastPausedTimeInterval": "not a number",
            "lastPausedLapTime": 4.5
        }"#;
        let state = decode_state(data).unwrap();
        assert_eq!(state.laps, vec!["00:10.00"]);
        assert_eq!(state.start_time, None);
        assert_eq!(state.lap_time, None);
        assert_eq!(state.state, SessionState::Paused);
        assert_eq!(state.last_paused_time_interval, Duration::ZERO);
        assert_eq!(state.last_paused_lap_time, Duration::ZERO);
    }

    #[test]
    fn test_missing_state_tag_is_paused() {
        let state = decode_state(br#"{"laps": [], "lastPausedTimeInterval": "7.25"}"#).unwrap();
        assert_eq!(state.state, SessionState::Paused);
        assert_eq!(state.last_paused_time_interval, Duration::from_millis(7250));
    }

    #[test]
    fn test_missing_laps_is_default() {
        let state = decode_state(br#"{"state": "r", "lastPausedTimeInterval": "7.25"}"#).unwrap();
        assert_eq!(state, PersistedState::default());
        let state = decode_state(br#"{"laps": [1, 2], "state": "r"}"#).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn test_not_an_object_is_malformed() {
        assert!(matches!(decode_state(b"[1, 2, 3]"), Err(LoadError::Malformed(_))));
        assert!(matches!(decode_state(b"{oops"), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_empty_memory_store_not_found() {
        assert!(matches!(MemoryStore::new().load(), Err(LoadError::NotFound)));
    }

    #[test]
    fn test_failing_memory_store_keeps_previous_record() {
        let store = MemoryStore::new();
        store.save(&running_state()).unwrap();
        store.set_fail_saves(true);
        let err = store.save(&PersistedState::default()).unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(store.load().unwrap(), running_state());
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = temp_path("round-trip");
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(LoadError::NotFound)));

        store.save(&running_state()).unwrap();
        assert_eq!(store.load().unwrap(), running_state());
        assert!(!path.with_extension("tmp").exists());

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_file_store_unwritable_path_is_io_error() {
        let blocker = temp_path("blocker");
        fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        fs::write(&blocker, b"file, not a directory").unwrap();

        let store = FileStore::new(blocker.join("state.json"));
        let err = store.save(&running_state()).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));

        fs::remove_dir_all(blocker.parent().unwrap()).ok();
    }
}
