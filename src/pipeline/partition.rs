use tracing::debug;

use super::PipelineConfig;
use crate::domain::{Bucket, TimeRange};
use crate::error::{PipelineError, StoreError};
use crate::store::{DocumentStore, Filter, HistogramBin, SearchRequest};

const HISTOGRAM_NAME: &str = "events_over_time";

/// Turns consecutive histogram bins into contiguous buckets.
///
/// Bucket `i` spans `[bins[i].key, bins[i + 1].key)` and carries
/// `bins[i].doc_count`. The last bin has no known end and never starts a
/// bucket, so `n` bins yield `n - 1` buckets.
#[must_use]
pub fn buckets_from_bins(bins: &[HistogramBin]) -> Vec<Bucket> {
    bins.windows(2)
        .filter_map(|pair| match pair {
            [current, next] => Some(Bucket {
                start: current.key,
                end: next.key,
                count: current.doc_count,
            }),
            _ => None,
        })
        .collect()
}

/// Minute buckets for one service within `range`, oldest first.
///
/// # Errors
///
/// Returns `PipelineError::Histogram` when the histogram query fails or the
/// response carries no histogram; the caller skips the service.
pub async fn partition<S>(
    store: &S,
    config: &PipelineConfig,
    range: &TimeRange,
    service: &str,
) -> Result<Vec<Bucket>, PipelineError>
where
    S: DocumentStore + ?Sized,
{
    let fields = &config.fields;
    let request = SearchRequest::new()
        .filter(Filter::within(&fields.timestamp, range))
        .filter(Filter::exact(&fields.service_keyword(), service))
        .size(0)
        .histogram(HISTOGRAM_NAME, &fields.timestamp);

    let histogram_error = |source: StoreError| PipelineError::Histogram {
        service: service.to_owned(),
        range: range.to_string(),
        source,
    };

    let response = store
        .search(&config.event_index, &request)
        .await
        .map_err(histogram_error)?;
    let bins = response.histogram(HISTOGRAM_NAME).ok_or_else(|| {
        histogram_error(StoreError::MalformedResponse {
            message: format!("response has no '{}' aggregation", HISTOGRAM_NAME),
        })
    })?;

    let buckets = buckets_from_bins(bins);
    debug!(service, bins = bins.len(), buckets = buckets.len(), "partitioned service");
    Ok(buckets)
}
