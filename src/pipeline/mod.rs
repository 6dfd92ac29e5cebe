//! The rollup pipeline: service discovery, minute partitioning, percentile
//! sampling and upsert-by-absence, driven per service by [`Orchestrator`].
//!
//! Every stage takes the store and the time range explicitly; nothing here
//! reads the clock or holds a connection of its own.
mod discovery;
mod orchestrator;
mod partition;
mod report;
mod sampler;
mod upsert;


use crate::domain::FieldNames;

pub use discovery::discover_services;
pub use orchestrator::Orchestrator;
pub use partition::{buckets_from_bins, partition};
pub use report::RunReport;
pub use sampler::sample_bucket;
pub use upsert::{UpsertOutcome, upsert_record};

/// Upper bound on distinct services processed by one run.
pub const DEFAULT_MAX_SERVICES: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Index holding raw access-log events.
    pub event_index: String,
    /// Index receiving percentile records.
    pub percentile_index: String,
    pub fields: FieldNames,
    pub max_services: u64,
    /// Services processed at once; 1 keeps the run strictly sequential.
    pub concurrency: usize,
    /// Check for existing records but never write.
    pub dry_run: bool,
}

impl PipelineConfig {
    #[must_use]
    pub fn new(event_index: &str, percentile_index: &str) -> Self {
        Self {
            event_index: event_index.to_owned(),
            percentile_index: percentile_index.to_owned(),
            fields: FieldNames::default(),
            max_services: DEFAULT_MAX_SERVICES,
            concurrency: 1,
            dry_run: false,
        }
    }
}
