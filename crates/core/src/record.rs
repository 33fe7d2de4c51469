use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimestampError;
use crate::time::parse_timestamp;

/// App identifier used by extractors for native telephony calls.
pub const NATIVE_APP: &str = "unknown";

/// Call direction. Values other than `incoming`/`outgoing` are kept verbatim
/// so filters can still match them exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallType {
    Incoming,
    Outgoing,
    Other(String),
}

impl CallType {
    pub fn as_str(&self) -> &str {
        match self {
            CallType::Incoming => "incoming",
            CallType::Outgoing => "outgoing",
            CallType::Other(s) => s.as_str(),
        }
    }

    pub fn is_directional(&self) -> bool {
        matches!(self, CallType::Incoming | CallType::Outgoing)
    }
}

impl From<String> for CallType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "incoming" => CallType::Incoming,
            "outgoing" => CallType::Outgoing,
            _ => CallType::Other(s),
        }
    }
}

impl From<&str> for CallType {
    fn from(s: &str) -> Self {
        CallType::from(s.to_string())
    }
}

impl From<CallType> for String {
    fn from(t: CallType) -> Self {
        match t {
            CallType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed call event, as produced by an extraction tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<CallType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seconds.
    #[serde(
        default,
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl CallRecord {
    /// Duration in seconds, absent treated as zero.
    pub fn duration_secs(&self) -> f64 {
        self.duration.unwrap_or(0.0)
    }

    /// Non-empty phone number.
    pub fn number(&self) -> Option<&str> {
        self.number.as_deref().filter(|n| !n.is_empty())
    }

    pub fn type_str(&self) -> Option<&str> {
        self.call_type.as_ref().map(CallType::as_str)
    }

    pub fn is_native(&self) -> bool {
        self.app.as_deref() == Some(NATIVE_APP)
    }

    /// Parsed timestamp; `None` when the record has none.
    pub fn parsed_timestamp(&self) -> Option<Result<DateTime<FixedOffset>, TimestampError>> {
        self.timestamp.as_deref().map(parse_timestamp)
    }
}

/// Optional per-dimension constraints applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub call_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(
        rename = "phone_number",
        alias = "number",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.call_type.is_none()
            && self.app.is_none()
            && self.number.is_none()
            && self.start_bound().is_none()
            && self.end_bound().is_none()
    }

    /// Lower time bound; a blank value means no bound.
    pub fn start_bound(&self) -> Option<&str> {
        non_blank(self.start_time.as_deref())
    }

    /// Upper time bound; a blank value means no bound.
    pub fn end_bound(&self) -> Option<&str> {
        non_blank(self.end_time.as_deref())
    }

    /// Field-by-field overlay: constraints set on `other` replace ours.
    pub fn merged_with(&self, other: &FilterSpec) -> FilterSpec {
        FilterSpec {
            call_type: other.call_type.clone().or_else(|| self.call_type.clone()),
            app: other.app.clone().or_else(|| self.app.clone()),
            number: other.number.clone().or_else(|| self.number.clone()),
            start_time: other.start_time.clone().or_else(|| self.start_time.clone()),
            end_time: other.end_time.clone().or_else(|| self.end_time.clone()),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A call history as submitted for statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallHistory {
    pub call_history: Vec<CallRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSpec>,
    /// Report language for downstream renderers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

// ── Duration decoding ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDuration> = Option::deserialize(deserializer)?;
    Ok(raw.map(|raw| match raw {
        RawDuration::Seconds(secs) => secs.max(0.0),
        RawDuration::Text(text) => parse_clock_duration(&text),
    }))
}

/// Whole seconds are written as integers, as extraction tools emit them.
fn serialize_duration<S>(duration: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *duration {
        Some(secs) if secs.fract() == 0.0 && (0.0..9.0e15).contains(&secs) => {
            serializer.serialize_u64(secs as u64)
        }
        Some(secs) => serializer.serialize_f64(secs),
        None => serializer.serialize_none(),
    }
}

/// Parse `"HH:MM:SS"`, `"MM:SS"` or plain seconds. Unparsable input is 0.
pub fn parse_clock_duration(text: &str) -> f64 {
    let text = text.trim();
    if let Ok(secs) = text.parse::<f64>() {
        return if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    }

    let parts: Option<Vec<u64>> = text.split(':').map(|p| p.parse().ok()).collect();
    match parts.as_deref() {
        Some([h, m, s]) => (*h as f64) * 3600.0 + (*m as f64) * 60.0 + *s as f64,
        Some([m, s]) => (*m as f64) * 60.0 + *s as f64,
        _ => 0.0,
    }
}
