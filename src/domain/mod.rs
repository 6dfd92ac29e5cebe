//! Value types shared by the rollup pipeline: time ranges, minute buckets,
//! percentile ranks and the persisted percentile record.
mod bucket;
mod fields;
mod percentile;
mod time;

pub use bucket::Bucket;
pub use fields::FieldNames;
pub use percentile::{Percentile, PercentileRecord, PercentileSet, RankMiss, sample_size};
pub use time::{TimeRange, format_timestamp, parse_timestamp};
