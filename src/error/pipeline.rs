use thiserror::Error;

use super::StoreError;

/// Per-unit failures of a rollup run.
///
/// None of these abort a run. Each one is recorded against the narrowest
/// unit of work (the whole discovery step, one service, or one bucket) and
/// that unit is skipped until the next run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Service discovery failed for {range}: {source}")]
    Discovery {
        range: String,
        #[source]
        source: StoreError,
    },
    #[error("Histogram query failed for service '{service}' in {range}: {source}")]
    Histogram {
        service: String,
        range: String,
        #[source]
        source: StoreError,
    },
    #[error("Sample query failed for service '{service}' at {bucket_start}: {source}")]
    SampleQuery {
        service: String,
        bucket_start: String,
        #[source]
        source: StoreError,
    },
    #[error(
        "{percentile} rank out of range for service '{service}' at {bucket_start} (count {count}, {available} sampled)"
    )]
    RankOutOfRange {
        service: String,
        bucket_start: String,
        percentile: &'static str,
        count: u64,
        available: usize,
    },
    #[error(
        "Existence check failed for service '{service}' at {bucket_start} (values {values}): {source}"
    )]
    DedupCheck {
        service: String,
        bucket_start: String,
        values: String,
        #[source]
        source: StoreError,
    },
    #[error("Write failed for service '{service}' at {bucket_start} (values {values}): {source}")]
    Write {
        service: String,
        bucket_start: String,
        values: String,
        #[source]
        source: StoreError,
    },
}

impl PipelineError {
    /// Short, stable label used to group diagnostics in run summaries.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            PipelineError::Discovery { .. } => "discovery",
            PipelineError::Histogram { .. } => "histogram",
            PipelineError::SampleQuery { .. } => "sample_query",
            PipelineError::RankOutOfRange { .. } => "rank_out_of_range",
            PipelineError::DedupCheck { .. } => "dedup_check",
            PipelineError::Write { .. } => "write",
        }
    }

    /// Service the failure is attributed to, if any.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match self {
            PipelineError::Discovery { .. } => None,
            PipelineError::Histogram { service, .. }
            | PipelineError::SampleQuery { service, .. }
            | PipelineError::RankOutOfRange { service, .. }
            | PipelineError::DedupCheck { service, .. }
            | PipelineError::Write { service, .. } => Some(service),
        }
    }
}
