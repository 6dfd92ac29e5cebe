//! Document store capability and its implementations.
//!
//! The pipeline only ever talks to [`DocumentStore`]; connection handling,
//! host selection and the wire format live behind it.
mod elasticsearch;
#[cfg(test)]
pub(crate) mod memory;
mod query;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub use elasticsearch::{ElasticsearchStore, StoreClientConfig};
#[cfg(test)]
pub(crate) use memory::{Failure, MemoryStore};
pub use query::{
    Aggregate, DateHistogram, Filter, HistogramBin, Hit, RangeBound, SearchRequest,
    SearchResponse, SortOrder, WriteAck,
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs a structured search against `index`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the index does not exist and
    /// another `StoreError` for every other failure.
    async fn search(&self, index: &str, request: &SearchRequest)
    -> Result<SearchResponse, StoreError>;

    /// Inserts one document, creating the index on first write.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` when the write is not acknowledged.
    async fn index(&self, index: &str, document: &Value) -> Result<WriteAck, StoreError>;
}
