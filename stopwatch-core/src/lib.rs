//! Pure timing logic library with no platform dependencies.
//! Testable on host, shared by the engine and its persisted record.

use std::ops::Add;
use std::time::Duration;

const NANOS_PER_HUNDREDTH: u128 = 10_000_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionState {
    #[default]
    Paused,
    Running,
}

impl SessionState {
    /// Single-letter tag used in the persisted record.
    pub fn tag(self) -> &'static str {
        match self {
            SessionState::Paused => "p",
            SessionState::Running => "r",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "p" => Some(SessionState::Paused),
            "r" => Some(SessionState::Running),
            _ => None,
        }
    }
}

/// An absolute wall-clock instant, measured from the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_epoch(since_epoch: Duration) -> Self {
        Self(since_epoch)
    }

    pub fn from_epoch_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub fn since_epoch(self) -> Duration {
        self.0
    }

    /// Sub-millisecond precision is truncated.
    pub fn epoch_millis(self) -> u64 {
        self.0.as_millis() as u64
    }

    /// Zero when `earlier` is actually later than `self`.
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0 + rhs)
    }
}

/// Elapsed time of a timer that banked `paused_offset` before the segment
/// that began at `start`. A `now` earlier than `start` contributes nothing.
pub fn elapsed(start: Option<Timestamp>, paused_offset: Duration, now: Timestamp) -> Duration {
    match start {
        Some(start) => now
            .saturating_duration_since(start)
            .saturating_add(paused_offset),
        None => paused_offset,
    }
}

/// Minute, second and hundredth fields shown by a stopwatch face.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DisplayFields {
    pub minutes: u64,
    pub seconds: u8,
    pub hundredths: u8,
}

impl DisplayFields {
    pub const ZERO: DisplayFields = DisplayFields {
        minutes: 0,
        seconds: 0,
        hundredths: 0,
    };
}

/// Split a duration into display fields. Minutes are unbounded.
pub fn format(duration: Duration) -> DisplayFields {
    let total_secs = duration.as_secs();
    let total_hundredths = duration.as_nanos() / NANOS_PER_HUNDREDTH;
    DisplayFields {
        minutes: total_secs / 60,
        seconds: (total_secs % 60) as u8,
        hundredths: (total_hundredths % 100) as u8,
    }
}

/// Zero-pad to at least two digits: 5 -> "05", 12 -> "12".
pub fn pad2(value: u64) -> String {
    format!("{:02}", value)
}

/// Format a duration as "MM:SS.CC" (centiseconds)
pub fn format_lap(duration: Duration) -> String {
    let f = format(duration);
    format!("{:02}:{:02}.{:02}", f.minutes, f.seconds, f.hundredths)
}

/// Decimal seconds, shortest form that parses back to the same value.
pub fn duration_to_secs_string(duration: Duration) -> String {
    duration.as_secs_f64().to_string()
}

pub fn parse_secs_string(text: &str) -> Option<Duration> {
    let secs: f64 = text.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Ordered lap list. Append-only between resets; keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LapStore {
    laps: Vec<String>,
}

impl LapStore {
    pub fn new() -> Self {
        Self { laps: Vec::new() }
    }

    pub fn from_laps(laps: Vec<String>) -> Self {
        Self { laps }
    }

    pub fn push(&mut self, lap: impl Into<String>) {
        self.laps.push(lap.into());
    }

    pub fn reset(&mut self) {
        self.laps.clear();
    }

    pub fn len(&self) -> usize {
        self.laps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    /// Oldest first.
    pub fn all(&self) -> &[String] {
        &self.laps
    }

    pub fn newest_first(&self) -> Vec<String> {
        self.laps.iter().rev().cloned().collect()
    }
}
