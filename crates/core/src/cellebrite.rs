//! Conversion of Cellebrite UFED XML reports into a call history.
//!
//! Every `<model type="Call">` becomes one [`CallRecord`]. Field values live
//! in `<field name="..."><value>...</value></field>`; the counterpart's number
//! and name sit inside the `Parties` multi-model field.

use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::info;

use crate::error::ConvertError;
use crate::record::{parse_clock_duration, CallHistory, CallRecord, CallType, NATIVE_APP};

/// Namespace of report format 2.0.
pub const REPORT_NS: &str = "http://pa.cellebrite.com/report/2.0";

/// Status written when the report has none.
const UNKNOWN_STATUS: &str = "unknown";

fn is_element(node: &Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && node.has_tag_name((REPORT_NS, tag))
}

fn named(node: Node<'_, '_>, tag: &str, name: &str) -> bool {
    is_element(&node, tag) && node.attribute("name") == Some(name)
}

/// Trimmed, non-empty text of a field's `<value>`.
fn value_of<'a>(field: Node<'a, '_>) -> Option<&'a str> {
    field
        .children()
        .find(|c| is_element(c, "value"))
        .and_then(|v| v.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// First field with this name anywhere under the call.
fn field_text<'a>(call: Node<'a, '_>, name: &str) -> Option<&'a str> {
    call.descendants()
        .find(|n| named(*n, "field", name))
        .and_then(value_of)
}

/// First party model carrying this field.
fn party_text<'a>(call: Node<'a, '_>, name: &str) -> Option<&'a str> {
    call.descendants()
        .filter(|n| named(*n, "multiModelField", "Parties"))
        .flat_map(|parties| parties.children().filter(|m| is_element(m, "model")))
        .find_map(|party| {
            party
                .children()
                .find(|f| named(*f, "field", name))
                .and_then(value_of)
        })
}

fn call_record(call: Node<'_, '_>) -> CallRecord {
    CallRecord {
        call_type: field_text(call, "Direction").map(|d| CallType::from(d.to_lowercase())),
        app: Some(field_text(call, "Source").unwrap_or(NATIVE_APP).to_string()),
        number: party_text(call, "Identifier").map(str::to_string),
        name: party_text(call, "Name").map(str::to_string),
        duration: Some(field_text(call, "Duration").map_or(0.0, parse_clock_duration)),
        timestamp: field_text(call, "TimeStamp").map(str::to_string),
        status: Some(field_text(call, "Status").unwrap_or(UNKNOWN_STATUS).to_string()),
    }
}

/// Convert report XML text into a call history (no filters, no language).
pub fn parse_report(xml: &str) -> Result<CallHistory, ConvertError> {
    let doc = Document::parse(xml)?;
    let call_history: Vec<CallRecord> = doc
        .descendants()
        .filter(|n| is_element(n, "model") && n.attribute("type") == Some("Call"))
        .map(call_record)
        .collect();
    Ok(CallHistory {
        call_history,
        filters: None,
        language: None,
    })
}

/// Read and convert a report file.
pub fn read_report(path: &Path) -> Result<CallHistory, ConvertError> {
    let xml = fs::read_to_string(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let history = parse_report(&xml)?;
    info!(
        path = %path.display(),
        calls = history.call_history.len(),
        "converted extraction report"
    );
    Ok(history)
}
