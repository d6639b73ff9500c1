//! Change notifications for whatever presents the stopwatch.

use stopwatch_core::pad2;

/// Receives the formatted value of each display field that changed.
pub trait StopwatchObserver {
    fn minutes_did_change(&mut self, value: &str);
    fn seconds_did_change(&mut self, value: &str);
    fn hundredths_did_change(&mut self, value: &str);

    /// Current lap time, delivered alongside every hundredths change.
    fn lap_time_did_change(&mut self, _value: &str) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObserverId(pub(crate) u64);

/// Fields that changed during one tick, refresh or reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub minutes: Option<u64>,
    pub seconds: Option<u8>,
    pub hundredths: Option<u8>,
    pub lap_time: Option<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.minutes.is_none()
            && self.seconds.is_none()
            && self.hundredths.is_none()
            && self.lap_time.is_none()
    }

    pub fn minutes_text(&self) -> Option<String> {
        self.minutes.map(pad2)
    }

    pub fn seconds_text(&self) -> Option<String> {
        self.seconds.map(|s| pad2(s as u64))
    }

    pub fn hundredths_text(&self) -> Option<String> {
        self.hundredths.map(|h| pad2(h as u64))
    }

    pub(crate) fn deliver(&self, observer: &mut dyn StopwatchObserver) {
        if let Some(text) = self.minutes_text() {
            observer.minutes_did_change(&text);
        }
        if let Some(text) = self.seconds_text() {
            observer.seconds_did_change(&text);
        }
        if let Some(text) = self.hundredths_text() {
            observer.hundredths_did_change(&text);
        }
        if let Some(lap) = &self.lap_time {
            observer.lap_time_did_change(lap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl StopwatchObserver for Log {
        fn minutes_did_change(&mut self, value: &str) {
            self.0.push(format!("m{}", value));
        }
        fn seconds_did_change(&mut self, value: &str) {
            self.0.push(format!("s{}", value));
        }
        fn hundredths_did_change(&mut self, value: &str) {
            self.0.push(format!("h{}", value));
        }
    }

    #[test]
    fn test_empty_change_set_delivers_nothing() {
        let mut log = Log::default();
        let changes = ChangeSet::default();
        assert!(changes.is_empty());
        changes.deliver(&mut log);
        assert!(log.0.is_empty());
    }

    #[test]
    fn test_deliver_pads_values() {
        let mut log = Log::default();
        let changes = ChangeSet {
            minutes: None,
            seconds: Some(7),
            hundredths: Some(42),
            lap_time: Some("00:07.42".into()),
        };
        changes.deliver(&mut log);
        // lap_time_did_change has a no-op default
        assert_eq!(log.0, vec!["s07", "h42"]);
    }
}
