pub mod cellebrite;
pub mod config;
pub mod error;
pub mod loader;
pub mod prefix;
pub mod record;
pub mod sourced;
pub mod time;

pub use cellebrite::{parse_report, read_report};
pub use config::{AnalyticsConfig, Config, TablesConfig};
pub use error::*;
pub use loader::{TableLoader, TableStore};
pub use prefix::*;
pub use record::*;
pub use sourced::*;
pub use time::parse_timestamp;
