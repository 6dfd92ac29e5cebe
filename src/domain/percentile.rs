use serde_json::{Map, Value};

use super::bucket::Bucket;
use super::fields::FieldNames;

const PERCENT_DIVISOR: u64 = 100;
/// Added before dividing to turn floor division into ceiling division.
const CEIL_OFFSET: u64 = 99;
/// Field holding the nested copy of all picks in a persisted record.
const NESTED_FIELD: &str = "msg";

/// Reported percentiles, in the order they are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Percentile {
    P99,
    P95,
    P80,
    P50,
}

impl Percentile {
    pub const ALL: [Percentile; 4] = [
        Percentile::P99,
        Percentile::P95,
        Percentile::P80,
        Percentile::P50,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Percentile::P99 => "99th",
            Percentile::P95 => "95th",
            Percentile::P80 => "80th",
            Percentile::P50 => "50th",
        }
    }

    const fn hundredths(self) -> u64 {
        match self {
            Percentile::P99 => 99,
            Percentile::P95 => 95,
            Percentile::P80 => 80,
            Percentile::P50 => 50,
        }
    }

    /// 1-based nearest rank of this percentile among `count` events.
    ///
    /// The 99th rank rounds up (it is also the sample page size), the other
    /// ranks round down. `None` only on overflow.
    #[must_use]
    pub fn rank(self, count: u64) -> Option<u64> {
        let scaled = count.checked_mul(self.hundredths())?;
        match self {
            Percentile::P99 => scaled
                .checked_add(CEIL_OFFSET)?
                .checked_div(PERCENT_DIVISOR),
            Percentile::P95 | Percentile::P80 | Percentile::P50 => {
                scaled.checked_div(PERCENT_DIVISOR)
            }
        }
    }

    /// 0-based index into an ascending sample; `None` when the rank is zero
    /// (the bucket is too small for this percentile).
    #[must_use]
    pub fn sample_index(self, count: u64) -> Option<usize> {
        let rank = self.rank(count)?;
        let index = rank.checked_sub(1)?;
        usize::try_from(index).ok()
    }
}

/// Number of ascending-sorted events needed to cover every rank of a bucket
/// holding `count` events, i.e. `ceil(count * 0.99)`.
#[must_use]
pub fn sample_size(count: u64) -> Option<u64> {
    Percentile::P99.rank(count)
}

/// A percentile whose rank could not be served by the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankMiss {
    pub percentile: Percentile,
    pub count: u64,
    pub available: usize,
}

/// Source documents picked at each percentile rank of one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileSet {
    p99: Value,
    p95: Value,
    p80: Value,
    p50: Value,
}

impl PercentileSet {
    /// Picks the document at each percentile rank of an ascending sample.
    ///
    /// # Errors
    ///
    /// Returns the first percentile whose index is negative (rank zero) or
    /// past the end of `sample`. Indices never wrap.
    pub fn select(count: u64, sample: &[Value]) -> Result<Self, RankMiss> {
        let pick = |percentile: Percentile| -> Result<Value, RankMiss> {
            percentile
                .sample_index(count)
                .and_then(|index| sample.get(index))
                .cloned()
                .ok_or(RankMiss {
                    percentile,
                    count,
                    available: sample.len(),
                })
        };
        Ok(Self {
            p99: pick(Percentile::P99)?,
            p95: pick(Percentile::P95)?,
            p80: pick(Percentile::P80)?,
            p50: pick(Percentile::P50)?,
        })
    }

    #[must_use]
    pub const fn get(&self, percentile: Percentile) -> &Value {
        match percentile {
            Percentile::P99 => &self.p99,
            Percentile::P95 => &self.p95,
            Percentile::P80 => &self.p80,
            Percentile::P50 => &self.p50,
        }
    }

    /// `{"99th": doc, "95th": doc, "80th": doc, "50th": doc}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for percentile in Percentile::ALL {
            map.insert(percentile.label().to_owned(), self.get(percentile).clone());
        }
        Value::Object(map)
    }
}

/// The persisted summary of one `(service, bucket start)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileRecord {
    pub service: String,
    pub bucket: Bucket,
    pub values: PercentileSet,
}

impl PercentileRecord {
    /// Document written to the percentile index: identity fields, one field
    /// per percentile and the full set nested under `msg`.
    #[must_use]
    pub fn to_document(&self, fields: &FieldNames) -> Value {
        let mut doc = Map::new();
        doc.insert(
            fields.timestamp.clone(),
            Value::String(self.bucket.start_label()),
        );
        doc.insert(fields.service.clone(), Value::String(self.service.clone()));
        for percentile in Percentile::ALL {
            doc.insert(
                percentile.label().to_owned(),
                self.values.get(percentile).clone(),
            );
        }
        doc.insert(
            NESTED_FIELD.to_owned(),
            Value::Array(vec![self.values.to_json()]),
        );
        Value::Object(doc)
    }
}
