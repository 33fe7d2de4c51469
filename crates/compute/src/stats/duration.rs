use serde::{Deserialize, Serialize};

use callscope_core::{CallRecord, CallType};

/// Summary of call durations (seconds) for one subset of calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationStats {
    pub amount: u64,
    /// Arithmetic mean rounded to one decimal place.
    pub average_duration: f64,
    pub max_duration: f64,
    pub min_duration: f64,
}

/// Duration summaries for all calls and each direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallDurationStats {
    pub total_calls: DurationStats,
    pub incoming_calls: DurationStats,
    pub outgoing_calls: DurationStats,
}

/// Running sum / min / max over one subset.
#[derive(Debug, Clone, Copy, Default)]
struct Running {
    count: u64,
    sum: f64,
    max: Option<f64>,
    min: Option<f64>,
}

impl Running {
    fn push(&mut self, secs: f64) {
        self.count += 1;
        self.sum += secs;
        self.max = Some(self.max.map_or(secs, |m| m.max(secs)));
        self.min = Some(self.min.map_or(secs, |m| m.min(secs)));
    }

    /// `amount` is supplied by the caller so the per-direction summaries
    /// report the directional counters.
    fn finish(self, amount: u64) -> DurationStats {
        let average = if amount == 0 {
            0.0
        } else {
            round1(self.sum / amount as f64)
        };
        DurationStats {
            amount,
            average_duration: average,
            max_duration: self.max.unwrap_or(0.0),
            min_duration: self.min.unwrap_or(0.0),
        }
    }
}

/// Accumulates directional counters and duration summaries in one pass.
#[derive(Debug, Clone, Default)]
pub struct DurationAccumulator {
    total: Running,
    incoming: Running,
    outgoing: Running,
    pub incoming_count: u64,
    pub outgoing_count: u64,
}

impl DurationAccumulator {
    pub fn observe(&mut self, rec: &CallRecord) {
        let secs = rec.duration_secs();
        self.total.push(secs);
        match rec.call_type {
            Some(CallType::Incoming) => {
                self.incoming_count += 1;
                self.incoming.push(secs);
            }
            Some(CallType::Outgoing) => {
                self.outgoing_count += 1;
                self.outgoing.push(secs);
            }
            _ => {}
        }
    }

    pub fn finish(self) -> CallDurationStats {
        CallDurationStats {
            total_calls: self.total.finish(self.total.count),
            incoming_calls: self.incoming.finish(self.incoming_count),
            outgoing_calls: self.outgoing.finish(self.outgoing_count),
        }
    }
}

/// Round to one decimal the way the report consumers do: correctly rounded
/// from the exact binary value, exact ties to even (`0.25 -> 0.2`).
fn round1(x: f64) -> f64 {
    // A tie at one decimal needs x * 4 to be an odd integer; then x * 10 is exact.
    let quarters = x * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        return (x * 10.0).round_ties_even() / 10.0;
    }
    format!("{:.1}", x).parse().unwrap_or(x)
}
