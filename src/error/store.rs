use thiserror::Error;

/// Failures surfaced by a document store.
///
/// `NotFound` is reserved for a missing index; callers that probe for
/// existence treat it as "zero matches" rather than as a failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Index '{index}' does not exist.")]
    NotFound { index: String },
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Store returned status {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Malformed store response: {message}")]
    MalformedResponse { message: String },
    #[error("No store hosts configured.")]
    NoHosts,
    #[error("Invalid store host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[cfg(test)]
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}
