use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::DocumentStore;
use super::query::{Aggregate, HistogramBin, Hit, SearchRequest, SearchResponse, WriteAck};
use crate::error::StoreError;

const USER_AGENT: &str = concat!("percentile-rollup/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct StoreClientConfig {
    pub hosts: Vec<Url>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// `DocumentStore` over the Elasticsearch REST API.
///
/// Requests rotate across the configured hosts. Each call is one attempt
/// bounded by the client timeout; a failed call is reported, never retried.
#[derive(Debug)]
pub struct ElasticsearchStore {
    client: Client,
    hosts: Vec<Url>,
    next_host: AtomicUsize,
}

impl ElasticsearchStore {
    /// Builds the HTTP client for the configured hosts.
    ///
    /// # Errors
    ///
    /// Returns an error when no hosts are configured or the client cannot be
    /// built.
    pub fn new(config: &StoreClientConfig) -> Result<Self, StoreError> {
        if config.hosts.is_empty() {
            return Err(StoreError::NoHosts);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| StoreError::BuildClient { source: err })?;
        let hosts = config.hosts.iter().map(with_trailing_slash).collect();
        Ok(Self {
            client,
            hosts,
            next_host: AtomicUsize::new(0),
        })
    }

    fn endpoint(&self, index: &str, action: &str) -> Result<Url, StoreError> {
        let slot = self.next_host.fetch_add(1, Ordering::Relaxed);
        let host = self
            .hosts
            .get(slot.checked_rem(self.hosts.len()).unwrap_or(0))
            .ok_or(StoreError::NoHosts)?;
        let path = format!("{}/{}", index, action);
        host.join(&path).map_err(|err| StoreError::InvalidHost {
            host: host.to_string(),
            source: err,
        })
    }

    async fn post(&self, index: &str, action: &str, body: &Value) -> Result<Value, StoreError> {
        let url = self.endpoint(index, action)?;
        debug!(url = %url, "store request");
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| StoreError::Request {
                url: url.to_string(),
                source: err,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| StoreError::Request {
            url: url.to_string(),
            source: err,
        })?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                index: index.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|err| StoreError::Decode {
            context: "store response",
            source: err,
        })
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError> {
        let raw = self.post(index, "_search", &request.to_body()).await?;
        decode_search(&raw)
    }

    async fn index(&self, index: &str, document: &Value) -> Result<WriteAck, StoreError> {
        let raw = self.post(index, "_doc", document).await?;
        decode_ack(&raw)
    }
}

fn with_trailing_slash(host: &Url) -> Url {
    let mut host = host.clone();
    if !host.path().ends_with('/') {
        let path = format!("{}/", host.path());
        host.set_path(&path);
    }
    host
}

fn malformed(message: &str) -> StoreError {
    StoreError::MalformedResponse {
        message: message.to_owned(),
    }
}

pub(crate) fn decode_search(raw: &Value) -> Result<SearchResponse, StoreError> {
    let hits_section = raw.get("hits").ok_or_else(|| malformed("missing 'hits'"))?;
    let hits = hits_section
        .get("hits")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing 'hits.hits'"))?
        .iter()
        .map(|hit| Hit {
            id: hit.get("_id").and_then(Value::as_str).map(str::to_owned),
            source: hit.get("_source").cloned().unwrap_or(Value::Null),
        })
        .collect::<Vec<_>>();

    // Pre-7 clusters report a bare number, later ones `{ "value": n }`.
    let total = match hits_section.get("total") {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
        Some(_) | None => None,
    }
    .unwrap_or_else(|| u64::try_from(hits.len()).unwrap_or(u64::MAX));

    let mut aggregations = BTreeMap::new();
    if let Some(Value::Object(aggs)) = raw.get("aggregations") {
        for (name, agg) in aggs {
            let Some(buckets) = agg.get("buckets").and_then(Value::as_array) else {
                continue;
            };
            let bins = buckets
                .iter()
                .map(decode_bin)
                .collect::<Result<Vec<_>, _>>()?;
            aggregations.insert(name.clone(), Aggregate::DateHistogram { buckets: bins });
        }
    }

    Ok(SearchResponse {
        total,
        hits,
        aggregations,
    })
}

fn decode_bin(bucket: &Value) -> Result<HistogramBin, StoreError> {
    let millis = bucket
        .get("key")
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed("histogram bucket without numeric 'key'"))?;
    let key = DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| malformed("histogram bucket key out of range"))?;
    let doc_count = bucket
        .get("doc_count")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed("histogram bucket without 'doc_count'"))?;
    Ok(HistogramBin { key, doc_count })
}

pub(crate) fn decode_ack(raw: &Value) -> Result<WriteAck, StoreError> {
    let result = raw
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("write response without 'result'"))?;
    Ok(WriteAck {
        id: raw.get("_id").and_then(Value::as_str).map(str::to_owned),
        result: result.to_owned(),
    })
}
