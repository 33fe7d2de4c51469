//! Aggregation engine.
//!
//! A single pass over the (already filtered) records feeds every
//! sub-computation:
//!
//! - directional counts and duration summaries ([`duration`])
//! - per-application breakdown ([`apps`])
//! - key contacts ([`contacts`])
//! - per-day activity bands ([`activity`])
//! - country and city attribution ([`geo`])
//!
//! Each call builds its own accumulators; only the reference tables are shared.

pub mod activity;
pub mod apps;
pub mod contacts;
pub mod duration;
pub mod geo;

use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use callscope_core::{CallRecord, ReferenceTables, TableKind};

use crate::error::{ComputeError, Result};

use self::activity::{ActivityTally, DayActivity};
use self::apps::{AppBreakdown, AppCounts};
use self::contacts::ContactTally;
use self::duration::{CallDurationStats, DurationAccumulator};
use self::geo::{CityBucket, CityTally, CountryBucket, CountryTally};

/// Aggregate statistics for a set of call records.
///
/// Field names are consumed verbatim by report and chart generators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    pub incoming: u64,
    pub outgoing: u64,
    pub call_duration: CallDurationStats,
    pub call_apps: IndexMap<String, AppCounts>,
    pub key_contacts: IndexMap<String, u64>,
    pub activity_periods: IndexMap<String, DayActivity>,
    pub country_activity: IndexMap<CountryBucket, u64>,
    pub city_activity: IndexMap<CityBucket, u64>,
}

/// Statistics together with the reference tables that were unavailable.
///
/// The geographic map belonging to a missing table is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    #[serde(flatten)]
    pub statistics: StatisticsResult,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_tables: Vec<TableKind>,
}

/// Single-pass accumulator over call records.
pub struct Aggregator<'t> {
    durations: DurationAccumulator,
    apps: AppBreakdown,
    contacts: ContactTally,
    activity: ActivityTally,
    countries: Option<CountryTally<'t>>,
    cities: Option<CityTally<'t>>,
    missing: Vec<TableKind>,
    observed: usize,
}

impl<'t> Aggregator<'t> {
    pub fn new(tables: &'t ReferenceTables) -> Self {
        Self {
            durations: DurationAccumulator::default(),
            apps: AppBreakdown::default(),
            contacts: ContactTally::default(),
            activity: ActivityTally::default(),
            countries: tables.country.as_ref().map(CountryTally::new),
            cities: tables.city.as_ref().map(CityTally::new),
            missing: tables.missing(),
            observed: 0,
        }
    }

    pub fn observe(&mut self, rec: &CallRecord) {
        self.observed += 1;
        self.durations.observe(rec);
        self.apps.observe(rec);
        self.contacts.observe(rec);
        self.activity.observe(rec);
        if let Some(countries) = self.countries.as_mut() {
            countries.observe(rec);
        }
        if let Some(cities) = self.cities.as_mut() {
            cities.observe(rec);
        }
    }

    pub fn finish(self) -> StatisticsReport {
        debug!(
            records = self.observed,
            skipped_timestamps = self.activity.skipped(),
            missing_tables = ?self.missing,
            "aggregation finished"
        );
        let incoming = self.durations.incoming_count;
        let outgoing = self.durations.outgoing_count;
        StatisticsReport {
            statistics: StatisticsResult {
                incoming,
                outgoing,
                call_duration: self.durations.finish(),
                call_apps: self.apps.finish(),
                key_contacts: self.contacts.finish(),
                activity_periods: self.activity.finish(),
                country_activity: self.countries.map(CountryTally::finish).unwrap_or_default(),
                city_activity: self.cities.map(CityTally::finish).unwrap_or_default(),
            },
            missing_tables: self.missing,
        }
    }
}

/// Aggregate records, leaving geography empty for any missing table.
pub fn aggregate_partial<'a, I>(records: I, tables: &ReferenceTables) -> StatisticsReport
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    let start = Instant::now();
    let mut agg = Aggregator::new(tables);
    for rec in records {
        agg.observe(rec);
    }
    let report = agg.finish();
    debug!(elapsed_us = start.elapsed().as_micros() as u64, "aggregate completed");
    report
}

/// Aggregate records; a missing reference table is an error.
pub fn aggregate<'a, I>(records: I, tables: &ReferenceTables) -> Result<StatisticsResult>
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    if let Some(kind) = tables.missing().into_iter().next() {
        return Err(ComputeError::MissingTable(kind));
    }
    Ok(aggregate_partial(records, tables).statistics)
}

#[cfg(test)]
mod tests {
    use callscope_core::{CallType, PrefixTable};

    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::new(
            PrefixTable::new([("Kazakhstan", vec!["+77"]), ("Russia", vec!["+7"])]),
            PrefixTable::new([("Almaty", vec!["727"])]),
        )
    }

    fn make_call(
        call_type: &str,
        app: &str,
        number: &str,
        duration: f64,
        timestamp: &str,
    ) -> CallRecord {
        CallRecord {
            call_type: Some(CallType::from(call_type)),
            app: Some(app.to_string()),
            number: Some(number.to_string()),
            duration: Some(duration),
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn end_to_end_example() {
        let records = vec![
            make_call("incoming", "unknown", "+77011234567", 30.0, "2024-01-01T08:00:00"),
            make_call("outgoing", "unknown", "+77011234567", 0.0, "2024-01-01T20:00:00"),
        ];
        let stats = aggregate(&records, &tables()).unwrap();

        assert_eq!(stats.incoming, 1);
        assert_eq!(stats.outgoing, 1);
        assert_eq!(stats.call_duration.total_calls.amount, 2);
        assert_eq!(stats.call_duration.total_calls.average_duration, 15.0);

        let day = stats.activity_periods["2024-01-01"];
        assert_eq!(day.morning_calls, 1);
        assert_eq!(day.evening_calls, 1);
        assert_eq!(day.afternoon_calls, 0);
        assert_eq!(day.night_calls, 0);
        assert_eq!(day.total_calls, 2);

        assert_eq!(stats.call_apps["unknown"], AppCounts { incoming: 1, outgoing: 1 });
        assert_eq!(stats.key_contacts["+77011234567"], 2);
        assert_eq!(
            stats.country_activity[&CountryBucket::Country("Kazakhstan".into())],
            2
        );
        assert_eq!(stats.city_activity[&CityBucket::MobileCall], 2);
    }

    #[test]
    fn empty_input_yields_zeroes_and_empty_maps() {
        let stats = aggregate(&[] as &[CallRecord], &tables()).unwrap();
        assert_eq!(stats, StatisticsResult::default());

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["call_apps"], serde_json::json!({}));
        assert_eq!(json["call_duration"]["total_calls"]["amount"], 0);
        assert_eq!(json["country_activity"], serde_json::json!({}));
    }

    #[test]
    fn directional_counts_bounded_by_record_count() {
        let records = vec![
            make_call("incoming", "unknown", "1", 1.0, "2024-01-01T00:00:00"),
            make_call("missed", "unknown", "2", 0.0, "2024-01-01T00:00:00"),
            CallRecord::default(),
        ];
        let stats = aggregate(&records, &tables()).unwrap();
        assert!(stats.incoming + stats.outgoing <= records.len() as u64);
        assert_eq!(stats.call_duration.total_calls.amount, 3);
        assert_eq!(stats.country_activity[&CountryBucket::Unknown], 3);
    }

    #[test]
    fn activity_total_matches_parsable_timestamps() {
        let records = vec![
            make_call("incoming", "unknown", "1", 1.0, "2024-01-01T00:00:00"),
            make_call("incoming", "unknown", "1", 1.0, "bogus"),
            make_call("outgoing", "unknown", "1", 1.0, "2024-01-03T19:00:00"),
        ];
        let stats = aggregate(&records, &tables()).unwrap();
        let total: u64 = stats.activity_periods.values().map(|d| d.total_calls).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn strict_aggregate_rejects_missing_table() {
        let tables = ReferenceTables {
            country: None,
            city: Some(PrefixTable::default()),
        };
        match aggregate(&[] as &[CallRecord], &tables) {
            Err(ComputeError::MissingTable(kind)) => assert_eq!(kind, TableKind::Country),
            other => panic!("expected missing table, got {:?}", other),
        }
    }

    #[test]
    fn partial_aggregate_isolates_missing_table() {
        let records = vec![make_call(
            "incoming",
            "unknown",
            "87272000000",
            10.0,
            "2024-01-01T09:00:00",
        )];
        let tables = ReferenceTables {
            country: None,
            city: Some(PrefixTable::new([("Almaty", vec!["727"])])),
        };
        let report = aggregate_partial(&records, &tables);
        assert_eq!(report.missing_tables, vec![TableKind::Country]);
        assert!(report.statistics.country_activity.is_empty());
        assert_eq!(report.statistics.incoming, 1);
        assert_eq!(
            report.statistics.city_activity[&CityBucket::City("Almaty".into())],
            1
        );
    }

    #[test]
    fn report_serializes_flat() {
        let report = aggregate_partial(&[] as &[CallRecord], &ReferenceTables::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["incoming"], 0);
        assert_eq!(json["missing_tables"], serde_json::json!(["country", "city"]));
    }

    #[test]
    fn aggregation_is_deterministic() {
        let records = vec![
            make_call("incoming", "Telegram", "+79161234567", 42.0, "2024-02-01T12:00:00"),
            make_call("outgoing", "unknown", "87272000000", 5.0, "2024-02-02T01:00:00"),
            make_call("incoming", "unknown", "+77011234567", 7.0, "2024-02-02T07:00:00"),
        ];
        let a = serde_json::to_string(&aggregate(&records, &tables()).unwrap()).unwrap();
        let b = serde_json::to_string(&aggregate(&records, &tables()).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
