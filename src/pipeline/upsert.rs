use serde_json::Value;
use tracing::{debug, info};

use super::PipelineConfig;
use crate::domain::PercentileRecord;
use crate::error::{PipelineError, StoreError};
use crate::store::{DocumentStore, Filter, SearchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record existed and one was written.
    Written,
    /// A record for the same service and bucket start already exists.
    AlreadyPresent,
    /// No record existed; the write was suppressed by `dry_run`.
    DryRun,
}

/// Writes `record` unless one with the same service and bucket start exists.
///
/// The check and the write are two separate store calls, so two runs that
/// overlap on the same key can both write. Runs must not overlap.
///
/// # Errors
///
/// Returns `PipelineError::DedupCheck` or `PipelineError::Write` with the
/// service, bucket start and computed values attached.
pub async fn upsert_record<S>(
    store: &S,
    config: &PipelineConfig,
    record: &PercentileRecord,
) -> Result<UpsertOutcome, PipelineError>
where
    S: DocumentStore + ?Sized,
{
    let bucket_start = record.bucket.start_label();
    let existing = existing_records(store, config, record, &bucket_start)
        .await
        .map_err(|err| PipelineError::DedupCheck {
            service: record.service.clone(),
            bucket_start: bucket_start.clone(),
            values: record.values.to_json().to_string(),
            source: err,
        })?;

    if existing > 0 {
        debug!(
            service = %record.service,
            bucket_start = %bucket_start,
            existing,
            "percentile record already present"
        );
        return Ok(UpsertOutcome::AlreadyPresent);
    }

    let document = record.to_document(&config.fields);
    if config.dry_run {
        info!(
            service = %record.service,
            bucket_start = %bucket_start,
            document = %document,
            "dry run: would write percentile record"
        );
        return Ok(UpsertOutcome::DryRun);
    }

    let ack = store
        .index(&config.percentile_index, &document)
        .await
        .map_err(|err| PipelineError::Write {
            service: record.service.clone(),
            bucket_start: bucket_start.clone(),
            values: record.values.to_json().to_string(),
            source: err,
        })?;
    info!(
        service = %record.service,
        bucket_start = %bucket_start,
        result = %ack.result,
        id = ack.id.as_deref().unwrap_or("-"),
        "wrote percentile record"
    );
    Ok(UpsertOutcome::Written)
}

async fn existing_records<S>(
    store: &S,
    config: &PipelineConfig,
    record: &PercentileRecord,
    bucket_start: &str,
) -> Result<u64, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let fields = &config.fields;
    let request = SearchRequest::new()
        .filter(Filter::exact(&fields.service_keyword(), &record.service))
        .filter(Filter::term(
            &fields.timestamp,
            Value::String(bucket_start.to_owned()),
        ))
        .size(0);

    match store.search(&config.percentile_index, &request).await {
        Ok(response) => Ok(response.total),
        // The percentile index is created by the first write.
        Err(StoreError::NotFound { .. }) => Ok(0),
        Err(err) => Err(err),
    }
}
