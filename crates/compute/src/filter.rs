//! Record filter: conjunctive constraints over call records.
//!
//! Equality constraints compare exact strings. Time bounds are inclusive on
//! both ends and compared as instants. A record whose timestamp is missing or
//! unparsable fails any active time bound but never aborts the filter.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use callscope_core::{parse_timestamp, CallRecord, FilterSpec};

use crate::error::{ComputeError, Result};

/// A [`FilterSpec`] with its time bounds parsed once up front.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter<'s> {
    pub call_type: Option<&'s str>,
    pub app: Option<&'s str>,
    pub number: Option<&'s str>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

impl<'s> RecordFilter<'s> {
    /// Compile a filter spec. Fails only if a time bound cannot be parsed.
    pub fn compile(spec: &'s FilterSpec) -> Result<Self> {
        Ok(Self {
            call_type: spec.call_type.as_deref(),
            app: spec.app.as_deref(),
            number: spec.number.as_deref(),
            start: parse_bound("start_time", spec.start_bound())?,
            end: parse_bound("end_time", spec.end_bound())?,
        })
    }

    /// True when no constraint is set.
    pub fn is_identity(&self) -> bool {
        self.call_type.is_none()
            && self.app.is_none()
            && self.number.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    fn has_time_bound(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Test a single record against every present constraint.
    pub fn matches(&self, rec: &CallRecord) -> bool {
        if let Some(expected) = self.number {
            if rec.number.as_deref() != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = self.call_type {
            if rec.type_str() != Some(expected) {
                return false;
            }
        }
        if let Some(expected) = self.app {
            if rec.app.as_deref() != Some(expected) {
                return false;
            }
        }

        if !self.has_time_bound() {
            return true;
        }

        let ts = match rec.parsed_timestamp() {
            Some(Ok(ts)) => ts,
            Some(Err(e)) => {
                debug!(error = %e, "record excluded by time filter: unparsable timestamp");
                return false;
            }
            None => return false,
        };
        if let Some(start) = &self.start {
            if ts < *start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if ts > *end {
                return false;
            }
        }
        true
    }

    /// Stable filter: output keeps input order.
    pub fn apply<'a>(&self, records: &'a [CallRecord]) -> Vec<&'a CallRecord> {
        if self.is_identity() {
            return records.iter().collect();
        }
        records.iter().filter(|rec| self.matches(rec)).collect()
    }
}

fn parse_bound(field: &'static str, raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>> {
    raw.map(|value| {
        parse_timestamp(value).map_err(|_| ComputeError::InvalidBound {
            field,
            value: value.to_string(),
        })
    })
    .transpose()
}

/// Filter records by an optional spec. `None` or an empty spec is identity.
pub fn filter_records<'a>(
    records: &'a [CallRecord],
    spec: Option<&FilterSpec>,
) -> Result<Vec<&'a CallRecord>> {
    let filtered = match spec {
        Some(spec) => RecordFilter::compile(spec)?.apply(records),
        None => records.iter().collect(),
    };
    debug!(input = records.len(), output = filtered.len(), "records filtered");
    Ok(filtered)
}
