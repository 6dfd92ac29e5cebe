use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::domain::{Bucket, TimeRange, format_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Exclusive(DateTime<Utc>),
    Inclusive(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Timestamp range on `field`; either side may be open.
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Exact value equality; string values should target a keyword field.
    Term { field: String, value: Value },
}

impl Filter {
    #[must_use]
    pub fn range(field: &str, lower: Option<RangeBound>, upper: Option<RangeBound>) -> Self {
        Filter::Range {
            field: field.to_owned(),
            lower,
            upper,
        }
    }

    /// Events strictly inside `range`.
    #[must_use]
    pub fn within(field: &str, range: &TimeRange) -> Self {
        Self::range(
            field,
            Some(RangeBound::Exclusive(range.gt())),
            Some(RangeBound::Exclusive(range.lt())),
        )
    }

    /// Events in `[bucket.start, bucket.end)`.
    #[must_use]
    pub fn in_bucket(field: &str, bucket: &Bucket) -> Self {
        Self::range(
            field,
            Some(RangeBound::Inclusive(bucket.start)),
            Some(RangeBound::Exclusive(bucket.end)),
        )
    }

    /// Exact, unanalysed string equality on `field`.
    #[must_use]
    pub fn exact(field: &str, value: &str) -> Self {
        Self::term(field, Value::String(value.to_owned()))
    }

    #[must_use]
    pub fn term(field: &str, value: Value) -> Self {
        Filter::Term {
            field: field.to_owned(),
            value,
        }
    }

    fn to_clause(&self) -> Value {
        match self {
            Filter::Range {
                field,
                lower,
                upper,
            } => {
                let mut bounds = Map::new();
                match lower {
                    Some(RangeBound::Exclusive(ts)) => {
                        bounds.insert("gt".to_owned(), json!(format_timestamp(*ts)));
                    }
                    Some(RangeBound::Inclusive(ts)) => {
                        bounds.insert("gte".to_owned(), json!(format_timestamp(*ts)));
                    }
                    None => {}
                }
                match upper {
                    Some(RangeBound::Exclusive(ts)) => {
                        bounds.insert("lt".to_owned(), json!(format_timestamp(*ts)));
                    }
                    Some(RangeBound::Inclusive(ts)) => {
                        bounds.insert("lte".to_owned(), json!(format_timestamp(*ts)));
                    }
                    None => {}
                }
                json!({ "range": { field.as_str(): Value::Object(bounds) } })
            }
            Filter::Term { field, value } => json!({ "term": { field.as_str(): value } }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Minute-granularity event counts on a timestamp field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateHistogram {
    pub name: String,
    pub field: String,
}

/// Store-agnostic description of one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub filters: Vec<Filter>,
    pub size: Option<u64>,
    pub source: Option<Vec<String>>,
    pub sort: Option<(String, SortOrder)>,
    pub collapse: Option<String>,
    pub histogram: Option<DateHistogram>,
}

impl SearchRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn source(mut self, fields: Vec<String>) -> Self {
        self.source = Some(fields);
        self
    }

    #[must_use]
    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = Some((field.to_owned(), order));
        self
    }

    #[must_use]
    pub fn collapse(mut self, field: &str) -> Self {
        self.collapse = Some(field.to_owned());
        self
    }

    #[must_use]
    pub fn histogram(mut self, name: &str, field: &str) -> Self {
        self.histogram = Some(DateHistogram {
            name: name.to_owned(),
            field: field.to_owned(),
        });
        self
    }

    /// Elasticsearch `_search` body for this request.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let must: Vec<Value> = self.filters.iter().map(Filter::to_clause).collect();
        let mut body = Map::new();
        body.insert("query".to_owned(), json!({ "bool": { "must": must } }));
        if let Some(size) = self.size {
            body.insert("size".to_owned(), json!(size));
        }
        if let Some(fields) = &self.source {
            body.insert("_source".to_owned(), json!(fields));
        }
        if let Some((field, order)) = &self.sort {
            body.insert(
                "sort".to_owned(),
                json!({ field.as_str(): { "order": order.as_str() } }),
            );
        }
        if let Some(field) = &self.collapse {
            body.insert("collapse".to_owned(), json!({ "field": field }));
        }
        if let Some(histogram) = &self.histogram {
            body.insert(
                "aggs".to_owned(),
                json!({
                    histogram.name.as_str(): {
                        "date_histogram": {
                            "field": histogram.field,
                            "calendar_interval": "minute"
                        }
                    }
                }),
            );
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: Option<String>,
    pub source: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBin {
    pub key: DateTime<Utc>,
    pub doc_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    DateHistogram { buckets: Vec<HistogramBin> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Number of matching documents, independent of the page size.
    pub total: u64,
    pub hits: Vec<Hit>,
    pub aggregations: BTreeMap<String, Aggregate>,
}

impl SearchResponse {
    /// Bins of the named date histogram, if the response carries one.
    #[must_use]
    pub fn histogram(&self, name: &str) -> Option<&[HistogramBin]> {
        match self.aggregations.get(name) {
            Some(Aggregate::DateHistogram { buckets }) => Some(buckets),
            None => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub id: Option<String>,
    pub result: String,
}
