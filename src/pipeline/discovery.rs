use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::PipelineConfig;
use crate::domain::TimeRange;
use crate::error::PipelineError;
use crate::store::{DocumentStore, Filter, SearchRequest};

/// Distinct services with at least one event in `range`, at most
/// `config.max_services` of them, in the order the store returns them.
///
/// # Errors
///
/// Returns `PipelineError::Discovery` when the search fails. Callers treat
/// this as "no services this run".
pub async fn discover_services<S>(
    store: &S,
    config: &PipelineConfig,
    range: &TimeRange,
) -> Result<Vec<String>, PipelineError>
where
    S: DocumentStore + ?Sized,
{
    let fields = &config.fields;
    let request = SearchRequest::new()
        .filter(Filter::within(&fields.timestamp, range))
        .collapse(&fields.service_keyword())
        .size(config.max_services)
        .source(vec![fields.service.clone()]);

    let response = store
        .search(&config.event_index, &request)
        .await
        .map_err(|err| PipelineError::Discovery {
            range: range.to_string(),
            source: err,
        })?;

    let mut seen = HashSet::new();
    let services: Vec<String> = response
        .hits
        .iter()
        .filter_map(|hit| hit.source.get(&fields.service).and_then(Value::as_str))
        .filter(|service| seen.insert(*service))
        .map(str::to_owned)
        .collect();
    debug!(count = services.len(), %range, "discovered services");
    Ok(services)
}
