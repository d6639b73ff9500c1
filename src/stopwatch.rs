use std::time::Duration;

use stopwatch_core::{elapsed, format, format_lap, DisplayFields, LapStore, SessionState, Timestamp};

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{LoadError, StopwatchError, StorageError};
use crate::observer::{ChangeSet, ObserverId, StopwatchObserver};
use crate::storage::{PersistedState, StateStore};

/// Stopwatch with a lap sub-timer.
///
/// Elapsed time is always derived from clock instants, never accumulated by
/// ticks, so late or skipped ticks only delay display updates.
pub struct Stopwatch {
    clock: Box<dyn Clock>,
    config: EngineConfig,
    state: SessionState,
    start_time: Option<Timestamp>,
    lap_time: Option<Timestamp>,
    paused_offset: Duration,
    paused_lap_offset: Duration,
    laps: LapStore,
    fields: DisplayFields,
    ticking_halted: bool,
    observers: Vec<(ObserverId, Box<dyn StopwatchObserver + Send>)>,
    next_observer_id: u64,
}

impl Stopwatch {
    pub fn new(clock: impl Clock + 'static, config: EngineConfig) -> Self {
        Self {
            clock: Box::new(clock),
            config,
            state: SessionState::Paused,
            start_time: None,
            lap_time: None,
            paused_offset: Duration::ZERO,
            paused_lap_offset: Duration::ZERO,
            laps: LapStore::new(),
            fields: DisplayFields::ZERO,
            ticking_halted: false,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    /// Rebuild from a saved record. A running session keeps its instants, so
    /// time that passed while no process was alive is counted. Display
    /// fields start at zero until the next `refresh` or `tick`.
    pub fn from_persisted(
        saved: PersistedState,
        clock: impl Clock + 'static,
        config: EngineConfig,
    ) -> Self {
        let mut sw = Self::new(clock, config);
        sw.laps = LapStore::from_laps(saved.laps);
        sw.paused_offset = saved.last_paused_time_interval;
        sw.paused_lap_offset = saved.last_paused_lap_time;

        match (saved.state, saved.start_time) {
            (SessionState::Running, Some(start)) => {
                sw.state = SessionState::Running;
                sw.start_time = Some(start);
                sw.lap_time = Some(saved.lap_time.unwrap_or(start));
            }
            (SessionState::Running, None) => {
                log::warn!("saved session is running without a start time, restoring as paused");
            }
            (SessionState::Paused, _) => {}
        }
        log::debug!(
            "restored {:?} session with {} laps",
            sw.state,
            sw.laps.len()
        );
        sw
    }

    /// Construct from whatever the store holds, starting fresh when there is
    /// nothing usable.
    pub fn load_or_default(
        store: &dyn StateStore,
        clock: impl Clock + 'static,
        config: EngineConfig,
    ) -> Self {
        match store.load() {
            Ok(saved) => Self::from_persisted(saved, clock, config),
            Err(LoadError::NotFound) => {
                log::info!("no saved stopwatch state, starting fresh");
                Self::new(clock, config)
            }
            Err(e) => {
                log::warn!("could not load stopwatch state ({}), starting fresh", e);
                Self::new(clock, config)
            }
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            laps: self.laps.all().to_vec(),
            start_time: self.start_time,
            lap_time: self.lap_time,
            state: self.state,
            last_paused_time_interval: self.paused_offset,
            last_paused_lap_time: self.paused_lap_offset,
        }
    }

    /// A failed save leaves the engine untouched.
    pub fn save(&self, store: &dyn StateStore) -> Result<(), StorageError> {
        store.save(&self.snapshot()).map_err(|e| {
            log::error!("Failed to save stopwatch state: {}", e);
            e
        })
    }

    fn now(&self) -> Timestamp {
        let now = self.clock.now();
        if let Some(start) = self.start_time {
            if now < start {
                log::warn!("clock moved backwards past the session start, clamping");
            }
        }
        now
    }

    pub fn start(&mut self) {
        if self.state == SessionState::Running {
            return;
        }
        let now = self.now();
        self.start_time = Some(now);
        self.lap_time = Some(now);
        self.state = SessionState::Running;
        log::debug!("started with {:?} banked", self.paused_offset);
    }

    pub fn pause(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        let now = self.now();
        self.paused_offset = elapsed(self.start_time, self.paused_offset, now);
        self.paused_lap_offset = elapsed(self.lap_time, self.paused_lap_offset, now);
        self.start_time = None;
        self.lap_time = None;
        self.state = SessionState::Paused;
        log::debug!("paused at {:?}", self.paused_offset);
    }

    /// Close the current lap. Returns the recorded lap time, or `None` when
    /// paused.
    pub fn record_lap(&mut self) -> Option<String> {
        if self.state != SessionState::Running {
            return None;
        }
        let now = self.now();
        let lap = format_lap(elapsed(self.lap_time, self.paused_lap_offset, now));
        self.laps.push(lap.clone());
        self.lap_time = Some(now);
        self.paused_lap_offset = Duration::ZERO;
        log::info!("lap {} recorded: {}", self.laps.len(), lap);
        Some(lap)
    }

    /// Only reachable while paused.
    pub fn reset(&mut self) -> Result<ChangeSet, StopwatchError> {
        if self.state == SessionState::Running {
            return Err(StopwatchError::InvalidStateTransition {
                from: self.state,
                operation: "reset",
            });
        }
        self.start_time = None;
        self.lap_time = None;
        self.paused_offset = Duration::ZERO;
        self.paused_lap_offset = Duration::ZERO;
        self.laps.reset();
        self.fields = DisplayFields::ZERO;
        self.ticking_halted = false;
        log::debug!("reset");

        let changes = ChangeSet {
            minutes: Some(0),
            seconds: Some(0),
            hundredths: Some(0),
            lap_time: Some(format_lap(Duration::ZERO)),
        };
        self.notify(&changes);
        Ok(changes)
    }

    /// Periodic update while running. Returns the fields that changed and
    /// notifies observers of them. Does nothing once the tick cutoff is hit,
    /// and minutes are never advanced to the cutoff from here.
    pub fn tick(&mut self) -> ChangeSet {
        if self.ticking_halted {
            return ChangeSet::default();
        }
        self.update_fields(true)
    }

    /// Like `tick`, but also honoured after the cutoff and free to show
    /// minutes past it. Hosts call this once after restoring to populate the
    /// display.
    pub fn refresh(&mut self) -> ChangeSet {
        self.update_fields(false)
    }

    fn update_fields(&mut self, from_tick: bool) -> ChangeSet {
        let now = self.now();
        let derived = format(elapsed(self.start_time, self.paused_offset, now));
        let mut changes = ChangeSet::default();

        if derived.hundredths != self.fields.hundredths {
            self.fields.hundredths = derived.hundredths;
            changes.hundredths = Some(derived.hundredths);
            changes.lap_time = Some(format_lap(elapsed(
                self.lap_time,
                self.paused_lap_offset,
                now,
            )));
        }

        // Zero is accepted even though it is smaller: the wrap at each minute.
        if derived.seconds != self.fields.seconds
            && (derived.seconds > self.fields.seconds || derived.seconds == 0)
        {
            self.fields.seconds = derived.seconds;
            changes.seconds = Some(derived.seconds);
        }

        let past_cutoff = derived.minutes >= self.config.tick_cutoff_minutes;
        if past_cutoff && !self.ticking_halted {
            log::info!(
                "reached {} minutes, halting ticks",
                self.config.tick_cutoff_minutes
            );
            self.ticking_halted = true;
        }
        if !(past_cutoff && from_tick) && derived.minutes > self.fields.minutes {
            self.fields.minutes = derived.minutes;
            changes.minutes = Some(derived.minutes);
        }

        self.notify(&changes);
        changes
    }

    fn notify(&mut self, changes: &ChangeSet) {
        if changes.is_empty() {
            return;
        }
        for (_, observer) in self.observers.iter_mut() {
            changes.deliver(observer.as_mut());
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StopwatchObserver + Send>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// True while the host should keep scheduling ticks.
    pub fn wants_ticks(&self) -> bool {
        self.is_running() && !self.ticking_halted
    }

    pub fn ticking_halted(&self) -> bool {
        self.ticking_halted
    }

    pub fn elapsed(&self) -> Duration {
        elapsed(self.start_time, self.paused_offset, self.now())
    }

    pub fn lap_elapsed(&self) -> Duration {
        elapsed(self.lap_time, self.paused_lap_offset, self.now())
    }

    pub fn lap_time_string(&self) -> String {
        format_lap(self.lap_elapsed())
    }

    pub fn fields(&self) -> DisplayFields {
        self.fields
    }

    /// Newest first.
    pub fn current_laps(&self) -> Vec<String> {
        self.laps.newest_first()
    }

    pub fn lap_count(&self) -> usize {
        self.laps.len()
    }
}
