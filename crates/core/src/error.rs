use std::path::PathBuf;

use thiserror::Error;

use crate::prefix::TableKind;

/// Errors raised while loading reference tables.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} table not found at {path}")]
    Missing { kind: TableKind, path: PathBuf },
}

/// A timestamp string that is not a recognised ISO-8601 date or date-time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ISO-8601 timestamp: {0:?}")]
pub struct TimestampError(pub String);

/// Errors raised while converting an extraction report.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),
}
