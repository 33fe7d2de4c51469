pub mod engine;
pub mod error;
pub mod filter;
pub mod similarity;
pub mod stats;

pub use engine::AnalyticsEngine;
pub use error::{ComputeError, Result};
pub use filter::{filter_records, RecordFilter};
pub use similarity::{correlate, SimilarityGroup, SimilarityJob, SimilarityQuery};
pub use stats::{aggregate, aggregate_partial, Aggregator, StatisticsReport, StatisticsResult};
