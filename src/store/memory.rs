//! In-process `DocumentStore` backing the unit tests.
//!
//! It evaluates the same `SearchRequest` model as the Elasticsearch adapter:
//! range filters, exact term filters (a `.keyword` suffix resolves to the
//! stored value, never to its tokens), collapse, ascending/descending sort, page
//! size, `_source` projection and a minute date histogram. Failures can be
//! injected per index, per service histogram or per service write.
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::DocumentStore;
use super::query::{
    Aggregate, Filter, HistogramBin, Hit, RangeBound, SearchRequest, SearchResponse, SortOrder,
    WriteAck,
};
use crate::domain::parse_timestamp;
use crate::error::StoreError;

const KEYWORD_SUFFIX: &str = ".keyword";
/// Page size Elasticsearch applies when a request sets none.
const DEFAULT_PAGE_SIZE: u64 = 10;
const SECONDS_PER_MINUTE: i64 = 60;

/// Injected failure, matched on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Every search against this index fails.
    Search { index: String },
    /// Histogram searches filtered on this service fail.
    Histogram { service: String },
    /// Writes of documents naming this service fail.
    Write { service: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    indices: BTreeMap<String, Vec<Value>>,
    failures: Vec<Failure>,
    search_calls: usize,
    index_calls: usize,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|err| StoreError::Unavailable {
            message: format!("memory store lock poisoned: {}", err),
        })
    }

    /// Adds a document directly, bypassing failure injection and call counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn insert(&self, index: &str, document: Value) -> Result<(), StoreError> {
        self.lock()?
            .indices
            .entry(index.to_owned())
            .or_default()
            .push(document);
        Ok(())
    }

    /// Registers a failure that stays active for the life of the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn fail(&self, failure: Failure) -> Result<(), StoreError> {
        self.lock()?.failures.push(failure);
        Ok(())
    }

    /// Snapshot of the documents held in `index` (empty if it does not exist).
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn documents(&self, index: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self.lock()?.indices.get(index).cloned().unwrap_or_default())
    }

    /// Number of `search` calls served so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn search_calls(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.search_calls)
    }

    /// Number of `index` calls served so far, including failed ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn index_calls(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.index_calls)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let mut state = self.lock()?;
        state.search_calls = state.search_calls.saturating_add(1);

        for failure in &state.failures {
            if search_fails(failure, index, request) {
                return Err(StoreError::Unavailable {
                    message: format!("injected search failure on '{}'", index),
                });
            }
        }

        let docs = state
            .indices
            .get(index)
            .ok_or_else(|| StoreError::NotFound {
                index: index.to_owned(),
            })?;

        let mut matched: Vec<&Value> = docs
            .iter()
            .filter(|doc| request.filters.iter().all(|filter| filter_matches(filter, doc)))
            .collect();
        let total = u64::try_from(matched.len()).unwrap_or(u64::MAX);

        let mut aggregations = BTreeMap::new();
        if let Some(histogram) = &request.histogram {
            aggregations.insert(
                histogram.name.clone(),
                Aggregate::DateHistogram {
                    buckets: minute_histogram(&matched, &histogram.field),
                },
            );
        }

        if let Some(field) = &request.collapse {
            let mut seen = HashSet::new();
            matched.retain(|doc| {
                let key = field_value(doc, field).map(Value::to_string);
                seen.insert(key)
            });
        }

        if let Some((field, order)) = &request.sort {
            matched.sort_by(|left, right| {
                let ordering = compare_values(field_value(left, field), field_value(right, field));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let size = usize::try_from(request.size.unwrap_or(DEFAULT_PAGE_SIZE)).unwrap_or(usize::MAX);
        let hits = matched
            .into_iter()
            .take(size)
            .map(|doc| Hit {
                id: None,
                source: project(doc, request.source.as_deref()),
            })
            .collect();

        Ok(SearchResponse {
            total,
            hits,
            aggregations,
        })
    }

    async fn index(&self, index: &str, document: &Value) -> Result<WriteAck, StoreError> {
        let mut state = self.lock()?;
        state.index_calls = state.index_calls.saturating_add(1);

        for failure in &state.failures {
            if let Failure::Write { service } = failure
                && names_service(document, service)
            {
                return Err(StoreError::Unavailable {
                    message: format!("injected write failure for '{}'", service),
                });
            }
        }

        state.next_id = state.next_id.saturating_add(1);
        let id = format!("mem-{}", state.next_id);
        state
            .indices
            .entry(index.to_owned())
            .or_default()
            .push(document.clone());
        Ok(WriteAck {
            id: Some(id),
            result: "created".to_owned(),
        })
    }
}

fn search_fails(failure: &Failure, index: &str, request: &SearchRequest) -> bool {
    match failure {
        Failure::Search { index: failing } => failing == index,
        Failure::Histogram { service } => {
            request.histogram.is_some()
                && request.filters.iter().any(|filter| {
                    matches!(
                        filter,
                        Filter::Term { value, .. } if value.as_str() == Some(service.as_str())
                    )
                })
        }
        Failure::Write { .. } => false,
    }
}

fn names_service(document: &Value, service: &str) -> bool {
    document
        .as_object()
        .is_some_and(|fields| fields.values().any(|value| value.as_str() == Some(service)))
}

fn field_value<'doc>(doc: &'doc Value, field: &str) -> Option<&'doc Value> {
    let field = field.strip_suffix(KEYWORD_SUFFIX).unwrap_or(field);
    doc.get(field)
}

fn filter_matches(filter: &Filter, doc: &Value) -> bool {
    match filter {
        Filter::Range {
            field,
            lower,
            upper,
        } => {
            let Some(ts) = field_value(doc, field)
                .and_then(Value::as_str)
                .and_then(parse_timestamp)
            else {
                return false;
            };
            let above = match lower {
                Some(RangeBound::Exclusive(bound)) => ts > *bound,
                Some(RangeBound::Inclusive(bound)) => ts >= *bound,
                None => true,
            };
            let below = match upper {
                Some(RangeBound::Exclusive(bound)) => ts < *bound,
                Some(RangeBound::Inclusive(bound)) => ts <= *bound,
                None => true,
            };
            above && below
        }
        Filter::Term { field, value } => {
            field_value(doc, field).is_some_and(|found| same_term(found, value))
        }
    }
}

/// Exact equality, treating two RFC 3339 strings as equal when they name
/// the same instant.
fn same_term(found: &Value, wanted: &Value) -> bool {
    if found == wanted {
        return true;
    }
    match (found.as_str(), wanted.as_str()) {
        (Some(left), Some(right)) => match (parse_timestamp(left), parse_timestamp(right)) {
            (Some(left), Some(right)) => left == right,
            (Some(_) | None, _) => false,
        },
        (Some(_) | None, _) => false,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> CmpOrdering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => {
            match (left.as_f64(), right.as_f64()) {
                (Some(left), Some(right)) => left.total_cmp(&right),
                (Some(_) | None, _) => CmpOrdering::Equal,
            }
        }
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        // Missing values sort last, as Elasticsearch does by default.
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_) | None, _) => CmpOrdering::Equal,
    }
}

fn project(doc: &Value, fields: Option<&[String]>) -> Value {
    let Some(fields) = fields else {
        return doc.clone();
    };
    let mut projected = Map::new();
    for field in fields {
        if let Some(value) = doc.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    Value::Object(projected)
}

fn minute_floor(ts: DateTime<Utc>) -> Option<i64> {
    let secs = ts.timestamp();
    secs.checked_sub(secs.rem_euclid(SECONDS_PER_MINUTE))
}

/// Per-minute counts from the first to the last populated minute, with
/// empty minutes in between filled with zero.
fn minute_histogram(docs: &[&Value], field: &str) -> Vec<HistogramBin> {
    let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
    for doc in docs {
        let minute = field_value(doc, field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .and_then(minute_floor);
        if let Some(minute) = minute {
            let count = counts.entry(minute).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    let (Some(first), Some(last)) = (
        counts.keys().next().copied(),
        counts.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut bins = Vec::new();
    let mut minute = first;
    while minute <= last {
        if let Some(key) = DateTime::from_timestamp(minute, 0) {
            bins.push(HistogramBin {
                key,
                doc_count: counts.get(&minute).copied().unwrap_or(0),
            });
        }
        let Some(next) = minute.checked_add(SECONDS_PER_MINUTE) else {
            break;
        };
        minute = next;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format_timestamp;
    use serde_json::json;

    fn event(ts: &str, service: &str, latency: u64) -> Value {
        json!({
            "@timestamp": ts,
            "service": service,
            "response_time": latency,
            "request_path": "/"
        })
    }

    fn seeded() -> Result<MemoryStore, String> {
        let store = MemoryStore::new();
        let events = [
            ("2024-03-01T10:00:05Z", "checkout", 30),
            ("2024-03-01T10:00:15Z", "checkout", 10),
            ("2024-03-01T10:00:25Z", "search", 20),
            ("2024-03-01T10:02:10Z", "checkout", 20),
        ];
        for (ts, service, latency) in events {
            store
                .insert("events", event(ts, service, latency))
                .map_err(|err| err.to_string())?;
        }
        Ok(store)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_index_is_not_found() -> Result<(), String> {
        let store = MemoryStore::new();
        match store.search("nope", &SearchRequest::new()).await {
            Err(StoreError::NotFound { index }) if index == "nope" => Ok(()),
            other => Err(format!("expected NotFound, got {:?}", other)),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn sort_size_and_projection() -> Result<(), String> {
        let store = seeded()?;
        let request = SearchRequest::new()
            .filter(Filter::exact("service.keyword", "checkout"))
            .sort("response_time", SortOrder::Asc)
            .size(2)
            .source(vec!["response_time".to_owned()]);
        let response = store
            .search("events", &request)
            .await
            .map_err(|err| err.to_string())?;

        let latencies: Vec<Value> = response.hits.iter().map(|hit| hit.source.clone()).collect();
        if latencies != vec![json!({ "response_time": 10 }), json!({ "response_time": 20 })] {
            return Err(format!("unexpected hits {:?}", latencies));
        }
        if response.total != 3 {
            return Err(format!("unexpected total {}", response.total));
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn collapse_keeps_one_hit_per_value() -> Result<(), String> {
        let store = seeded()?;
        let request = SearchRequest::new().collapse("service.keyword").size(50);
        let response = store
            .search("events", &request)
            .await
            .map_err(|err| err.to_string())?;
        if response.hits.len() != 2 {
            return Err(format!("expected two services, got {:?}", response.hits));
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn histogram_fills_empty_minutes() -> Result<(), String> {
        let store = seeded()?;
        let request = SearchRequest::new()
            .filter(Filter::exact("service.keyword", "checkout"))
            .size(0)
            .histogram("per_minute", "@timestamp");
        let response = store
            .search("events", &request)
            .await
            .map_err(|err| err.to_string())?;
        let bins: Vec<(String, u64)> = response
            .histogram("per_minute")
            .ok_or("missing histogram")?
            .iter()
            .map(|bin| (format_timestamp(bin.key), bin.doc_count))
            .collect();
        let expected = vec![
            ("2024-03-01T10:00:00.000Z".to_owned(), 2),
            ("2024-03-01T10:01:00.000Z".to_owned(), 0),
            ("2024-03-01T10:02:00.000Z".to_owned(), 1),
        ];
        if bins != expected {
            return Err(format!("unexpected bins {:?}", bins));
        }
        if !response.hits.is_empty() {
            return Err("expected zero-size page".to_owned());
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn term_matches_same_instant() -> Result<(), String> {
        let store = seeded()?;
        let request = SearchRequest::new()
            .filter(Filter::term("@timestamp", json!("2024-03-01T10:00:05.000Z")))
            .size(0);
        let response = store
            .search("events", &request)
            .await
            .map_err(|err| err.to_string())?;
        if response.total != 1 {
            return Err(format!("unexpected total {}", response.total));
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn keyword_term_does_not_match_shared_tokens() -> Result<(), String> {
        let store = seeded()?;
        store
            .insert("events", event("2024-03-01T10:00:35Z", "checkout-api", 40))
            .map_err(|err| err.to_string())?;

        for (service, expected) in [("checkout", 3), ("checkout-api", 1), ("api", 0)] {
            let request = SearchRequest::new()
                .filter(Filter::exact("service.keyword", service))
                .size(0);
            let response = store
                .search("events", &request)
                .await
                .map_err(|err| err.to_string())?;
            if response.total != expected {
                return Err(format!(
                    "{} matched {} events, expected {}",
                    service, response.total, expected
                ));
            }
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn injected_write_failure_leaves_index_untouched() -> Result<(), String> {
        let store = MemoryStore::new();
        store
            .fail(Failure::Write {
                service: "checkout".to_owned(),
            })
            .map_err(|err| err.to_string())?;
        if store
            .index("pct", &json!({ "service": "checkout" }))
            .await
            .is_ok()
        {
            return Err("expected write to fail".to_owned());
        }
        store
            .index("pct", &json!({ "service": "search" }))
            .await
            .map_err(|err| err.to_string())?;
        let docs = store.documents("pct").map_err(|err| err.to_string())?;
        if docs.len() != 1 || store.index_calls().map_err(|err| err.to_string())? != 2 {
            return Err(format!("unexpected documents {:?}", docs));
        }
        Ok(())
    }
}
