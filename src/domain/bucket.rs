use chrono::{DateTime, Utc};

use super::time::format_timestamp;

/// One minute-wide slice `[start, end)` of a service's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: u64,
}

impl Bucket {
    /// Identity-key form of the bucket start.
    #[must_use]
    pub fn start_label(&self) -> String {
        format_timestamp(self.start)
    }
}
