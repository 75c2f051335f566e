use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxPainEntry {
    pub timestamp: DateTime<Utc>,
    pub strike: f64,
}

/// Max-pain strikes seen within a rolling window, one entry per change
#[derive(Debug, Clone)]
pub struct MaxPainHistory {
    window: Duration,
    entries: VecDeque<MaxPainEntry>,
}

impl MaxPainHistory {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: VecDeque::new(),
        }
    }

    /// Record a freshly computed strike. Strike 0 (no data) is ignored;
    /// repeats of the last strike only prune.
    pub fn record(&mut self, now: DateTime<Utc>, strike: f64) {
        if strike <= 0.0 {
            return;
        }

        let changed = self.entries.back().is_none_or(|last| last.strike != strike);
        if changed {
            self.entries.push_back(MaxPainEntry {
                timestamp: now,
                strike,
            });
        }

        let cutoff = now - self.window;
        while self.entries.front().is_some_and(|e| e.timestamp < cutoff) {
            self.entries.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&MaxPainEntry> {
        self.entries.back()
    }

    pub fn entries(&self) -> Vec<MaxPainEntry> {
        self.entries.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 20, 9, 15, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_only_changes_are_recorded() {
        let mut history = MaxPainHistory::new(Duration::hours(1));
        history.record(at(0), 22500.0);
        history.record(at(1), 22500.0);
        history.record(at(2), 22550.0);
        history.record(at(3), 0.0);
        history.record(at(4), 22500.0);

        let strikes: Vec<f64> = history.entries().iter().map(|e| e.strike).collect();
        assert_eq!(strikes, vec![22500.0, 22550.0, 22500.0]);
    }

    #[test]
    fn test_old_entries_are_pruned() {
        let mut history = MaxPainHistory::new(Duration::hours(1));
        history.record(at(0), 22500.0);
        history.record(at(30), 22550.0);
        // same strike, still prunes the 09:15 entry
        history.record(at(61), 22550.0);

        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|e| e.strike), Some(22550.0));
    }
}
