/// Document field names used when querying events and writing records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub service: String,
    pub timestamp: String,
    pub latency: String,
    pub path: String,
}

impl FieldNames {
    /// Keyword sub-field used for grouping, so that service names are not
    /// split by the text analyzer.
    #[must_use]
    pub fn service_keyword(&self) -> String {
        format!("{}.keyword", self.service)
    }

    /// Fields fetched for each sampled event.
    #[must_use]
    pub fn sample_fields(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.latency.clone(),
            self.path.clone(),
        ]
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            service: "service".to_owned(),
            timestamp: "@timestamp".to_owned(),
            latency: "response_time".to_owned(),
            path: "request_path".to_owned(),
        }
    }
}
