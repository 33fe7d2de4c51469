//! Source-tagged records for cross-source correlation.
//!
//! Correlation has to iterate arbitrary field names, so a tagged record keeps
//! its fields as an ordered JSON object instead of a fixed struct.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::CallRecord;

/// Field name carrying the source tag in serialized form.
pub const SOURCE_FIELD: &str = "source";

/// A record annotated with the extraction that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub source: String,
}

impl SourcedRecord {
    /// Tag a raw JSON object. Any `source` key inside it is replaced by the tag.
    pub fn new(source: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove(SOURCE_FIELD);
        Self {
            fields,
            source: source.into(),
        }
    }

    /// Tag a typed call record, keeping only the fields it actually has.
    pub fn from_call(source: impl Into<String>, call: &CallRecord) -> Self {
        let fields = match serde_json::to_value(call) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self::new(source, fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// One extraction's call history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilaritySource {
    pub source: String,
    pub call_history: Vec<CallRecord>,
}

/// A correlation request over several extractions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub sources: Vec<SimilaritySource>,
    #[serde(default)]
    pub target_field: Option<String>,
    #[serde(default)]
    pub target_value: Option<String>,
}

impl SimilarityRequest {
    /// Flatten all sources into tagged records, preserving source then call order.
    pub fn tagged_records(&self) -> Vec<SourcedRecord> {
        self.sources
            .iter()
            .flat_map(|src| {
                src.call_history
                    .iter()
                    .map(move |call| SourcedRecord::from_call(src.source.clone(), call))
            })
            .collect()
    }
}
