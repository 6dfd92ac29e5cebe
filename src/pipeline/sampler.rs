use serde_json::Value;

use super::PipelineConfig;
use crate::domain::{Bucket, Percentile, PercentileSet, RankMiss, sample_size};
use crate::error::PipelineError;
use crate::store::{DocumentStore, Filter, SearchRequest, SortOrder};

/// Picks the event at each percentile rank of one bucket.
///
/// Fetches the `ceil(count * 0.99)` fastest events of the bucket in ascending
/// latency order and selects by nearest rank. Buckets too small for a rank
/// are rejected before any query is sent.
///
/// # Errors
///
/// Returns `PipelineError::RankOutOfRange` when a rank index would be
/// negative or beyond the returned sample, and `PipelineError::SampleQuery`
/// when the search fails.
pub async fn sample_bucket<S>(
    store: &S,
    config: &PipelineConfig,
    service: &str,
    bucket: &Bucket,
) -> Result<PercentileSet, PipelineError>
where
    S: DocumentStore + ?Sized,
{
    let rank_error = |miss: RankMiss| PipelineError::RankOutOfRange {
        service: service.to_owned(),
        bucket_start: bucket.start_label(),
        percentile: miss.percentile.label(),
        count: miss.count,
        available: miss.available,
    };

    let unranked = Percentile::ALL
        .into_iter()
        .find(|percentile| percentile.sample_index(bucket.count).is_none());
    let size = sample_size(bucket.count);
    let (Some(size), None) = (size, unranked) else {
        return Err(rank_error(RankMiss {
            percentile: unranked.unwrap_or(Percentile::P99),
            count: bucket.count,
            available: 0,
        }));
    };

    let fields = &config.fields;
    let request = SearchRequest::new()
        .filter(Filter::in_bucket(&fields.timestamp, bucket))
        .filter(Filter::exact(&fields.service_keyword(), service))
        .size(size)
        .source(fields.sample_fields())
        .sort(&fields.latency, SortOrder::Asc);

    let response = store
        .search(&config.event_index, &request)
        .await
        .map_err(|err| PipelineError::SampleQuery {
            service: service.to_owned(),
            bucket_start: bucket.start_label(),
            source: err,
        })?;

    let sample: Vec<Value> = response.hits.into_iter().map(|hit| hit.source).collect();
    PercentileSet::select(bucket.count, &sample).map_err(rank_error)
}
