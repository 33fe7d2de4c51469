//! Cross-source correlation of call records.
//!
//! Every `(field, value)` pair on a tagged record forms a group key. A group
//! is reported only when records from at least two distinct sources share
//! it, i.e. independent extractions corroborate the value.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use callscope_core::{SimilarityRequest, SourcedRecord, SOURCE_FIELD};

/// Fields that differ between tools or are redundant, and would only add noise.
pub const EXCLUDED_FIELDS: &[&str] = &["app", "type", SOURCE_FIELD];

/// Records from two or more sources sharing one field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityGroup<'a> {
    pub field: &'a str,
    pub value: &'a Value,
    /// Contributing records in input order.
    pub objects: Vec<&'a SourcedRecord>,
}

impl SimilarityGroup<'_> {
    /// Distinct sources among the contributing records.
    pub fn sources(&self) -> HashSet<&str> {
        self.objects.iter().map(|r| r.source.as_str()).collect()
    }
}

/// Group tagged records by shared field values across sources.
///
/// Groups come out in the order their key was first seen. `null` values are
/// treated as absent fields.
pub fn correlate(records: &[SourcedRecord]) -> Vec<SimilarityGroup<'_>> {
    // Keyed by (field, JSON text of value) so 555 and "555" stay distinct.
    let mut groups: IndexMap<(&str, String), SimilarityGroup<'_>> = IndexMap::new();

    for rec in records {
        for (field, value) in &rec.fields {
            if EXCLUDED_FIELDS.contains(&field.as_str()) || value.is_null() {
                continue;
            }
            groups
                .entry((field.as_str(), value.to_string()))
                .or_insert_with(|| SimilarityGroup {
                    field: field.as_str(),
                    value,
                    objects: Vec::new(),
                })
                .objects
                .push(rec);
        }
    }

    let candidates = groups.len();
    let result: Vec<_> = groups
        .into_values()
        .filter(|group| group.sources().len() > 1)
        .collect();

    debug!(
        records = records.len(),
        candidates,
        groups = result.len(),
        "correlation complete"
    );
    result
}

/// Optional post-filter over computed groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarityQuery {
    pub field: Option<String>,
    pub value: Option<String>,
}

impl SimilarityQuery {
    pub fn new(field: Option<String>, value: Option<String>) -> Self {
        Self { field, value }
    }

    pub fn matches(&self, group: &SimilarityGroup<'_>) -> bool {
        if let Some(field) = &self.field {
            if group.field != field.as_str() {
                return false;
            }
        }
        if let Some(value) = &self.value {
            if value_text(group.value) != *value {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, groups: Vec<SimilarityGroup<'a>>) -> Vec<SimilarityGroup<'a>> {
        groups.into_iter().filter(|g| self.matches(g)).collect()
    }
}

impl From<&SimilarityRequest> for SimilarityQuery {
    fn from(request: &SimilarityRequest) -> Self {
        Self::new(request.target_field.clone(), request.target_value.clone())
    }
}

/// Tagged records plus the post-filter to apply to their groups.
///
/// Groups borrow the records, so the job owns them and hands out groups
/// on demand.
#[derive(Debug, Clone, Default)]
pub struct SimilarityJob {
    records: Vec<SourcedRecord>,
    query: SimilarityQuery,
}

impl SimilarityJob {
    pub fn new(records: Vec<SourcedRecord>, query: SimilarityQuery) -> Self {
        Self { records, query }
    }

    /// Tag every source's calls and take the request's target field/value.
    pub fn from_request(request: &SimilarityRequest) -> Self {
        Self::new(request.tagged_records(), SimilarityQuery::from(request))
    }

    pub fn records(&self) -> &[SourcedRecord] {
        &self.records
    }

    pub fn query(&self) -> &SimilarityQuery {
        &self.query
    }

    /// Correlate, then keep the groups matching the query.
    pub fn groups(&self) -> Vec<SimilarityGroup<'_>> {
        self.query.apply(correlate(&self.records))
    }
}

/// String form used for value matching: strings as-is, everything else as JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
