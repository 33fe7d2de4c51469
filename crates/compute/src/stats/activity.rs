//! Time-of-day activity per calendar day.

use chrono::{DateTime, FixedOffset, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use callscope_core::CallRecord;

/// Fixed hour bands of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// 06:00–11:59
    Morning,
    /// 12:00–17:59
    Afternoon,
    /// 18:00–23:59
    Evening,
    /// 00:00–05:59
    Night,
}

impl Period {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Period::Morning,
            12..=17 => Period::Afternoon,
            18..=23 => Period::Evening,
            _ => Period::Night,
        }
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Band counters for one day. Bands with no calls are omitted when serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayActivity {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub morning_calls: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub afternoon_calls: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub evening_calls: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub night_calls: u64,
    pub total_calls: u64,
}

impl DayActivity {
    fn record(&mut self, period: Period) {
        match period {
            Period::Morning => self.morning_calls += 1,
            Period::Afternoon => self.afternoon_calls += 1,
            Period::Evening => self.evening_calls += 1,
            Period::Night => self.night_calls += 1,
        }
        self.total_calls += 1;
    }

    pub fn count(&self, period: Period) -> u64 {
        match period {
            Period::Morning => self.morning_calls,
            Period::Afternoon => self.afternoon_calls,
            Period::Evening => self.evening_calls,
            Period::Night => self.night_calls,
        }
    }
}

/// Per-day band tallies keyed by `YYYY-MM-DD` of the wall-clock timestamp.
#[derive(Debug, Clone, Default)]
pub struct ActivityTally {
    days: IndexMap<String, DayActivity>,
    skipped: u64,
}

impl ActivityTally {
    pub fn observe(&mut self, rec: &CallRecord) {
        match rec.parsed_timestamp() {
            Some(Ok(ts)) => self.observe_at(ts),
            Some(Err(e)) => {
                self.skipped += 1;
                debug!(error = %e, "activity skipped record");
            }
            None => self.skipped += 1,
        }
    }

    fn observe_at(&mut self, ts: DateTime<FixedOffset>) {
        let day = ts.date_naive().format("%Y-%m-%d").to_string();
        self.days
            .entry(day)
            .or_default()
            .record(Period::from_hour(ts.hour()));
    }

    /// Records without a usable timestamp.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Days with the most calls first; ties keep first-seen order.
    pub fn finish(mut self) -> IndexMap<String, DayActivity> {
        self.days.sort_by(|_, a, _, b| b.total_calls.cmp(&a.total_calls));
        self.days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: &str) -> CallRecord {
        CallRecord {
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(Period::from_hour(0), Period::Night);
        assert_eq!(Period::from_hour(5), Period::Night);
        assert_eq!(Period::from_hour(6), Period::Morning);
        assert_eq!(Period::from_hour(11), Period::Morning);
        assert_eq!(Period::from_hour(12), Period::Afternoon);
        assert_eq!(Period::from_hour(17), Period::Afternoon);
        assert_eq!(Period::from_hour(18), Period::Evening);
        assert_eq!(Period::from_hour(23), Period::Evening);
    }

    #[test]
    fn groups_by_day_then_band() {
        let mut tally = ActivityTally::default();
        for ts in [
            "2024-01-01T08:00:00",
            "2024-01-01T20:00:00",
            "2024-01-02T03:15:00",
            "2024-01-02T13:00:00",
            "2024-01-02T14:00:00",
        ] {
            tally.observe(&at(ts));
        }
        let days = tally.finish();
        assert_eq!(days.keys().collect::<Vec<_>>(), vec!["2024-01-02", "2024-01-01"]);

        let first = days["2024-01-01"];
        assert_eq!(first.count(Period::Morning), 1);
        assert_eq!(first.count(Period::Evening), 1);
        assert_eq!(first.total_calls, 2);

        let second = days["2024-01-02"];
        assert_eq!(second.night_calls, 1);
        assert_eq!(second.afternoon_calls, 2);
        assert_eq!(second.total_calls, 3);
    }

    #[test]
    fn unparsable_and_missing_timestamps_are_skipped() {
        let mut tally = ActivityTally::default();
        tally.observe(&at("2024-05-01T10:00:00"));
        tally.observe(&at("??"));
        tally.observe(&CallRecord::default());
        assert_eq!(tally.skipped(), 2);

        let days = tally.finish();
        let total: u64 = days.values().map(|d| d.total_calls).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn uses_wall_clock_of_offset_timestamps() {
        let mut tally = ActivityTally::default();
        tally.observe(&at("2024-01-01T23:30:00+06:00"));
        let days = tally.finish();
        assert_eq!(days["2024-01-01"].evening_calls, 1);
    }

    #[test]
    fn zero_bands_are_not_serialized() {
        let mut day = DayActivity::default();
        day.record(Period::Morning);
        let json = serde_json::to_value(day).unwrap();
        assert_eq!(json, serde_json::json!({"morning_calls": 1, "total_calls": 1}));
    }
}
