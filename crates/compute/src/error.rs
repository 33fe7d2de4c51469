use callscope_core::TableKind;

/// Error type for engine operations.
///
/// Missing optional record fields and unparsable record timestamps are never
/// errors; they only exclude the record from the affected computation.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    /// A filter time bound is not a valid ISO-8601 value.
    #[error("invalid {field} filter bound: {value:?}")]
    InvalidBound { field: &'static str, value: String },

    /// A reference table required for geographic attribution is not loaded.
    #[error("{0} reference table is not loaded")]
    MissingTable(TableKind),

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, ComputeError>;
