use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::error::ValidationError;

/// Window of events considered by one run, exclusive on both ends
/// (`gt < @timestamp < lt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    gt: DateTime<Utc>,
    lt: DateTime<Utc>,
}

impl TimeRange {
    /// Builds a range from explicit bounds.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTimeRange` unless `gt < lt`.
    pub fn new(gt: DateTime<Utc>, lt: DateTime<Utc>) -> Result<Self, ValidationError> {
        if gt >= lt {
            return Err(ValidationError::EmptyTimeRange {
                gt: format_timestamp(gt),
                lt: format_timestamp(lt),
            });
        }
        Ok(Self { gt, lt })
    }

    /// The `lookback` wide range ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when `lookback` is zero or does not fit a timestamp
    /// offset.
    pub fn trailing(now: DateTime<Utc>, lookback: Duration) -> Result<Self, ValidationError> {
        let delta = TimeDelta::from_std(lookback)
            .map_err(|_err| ValidationError::LookbackOutOfRange { value: lookback })?;
        let gt = now
            .checked_sub_signed(delta)
            .ok_or(ValidationError::LookbackOutOfRange { value: lookback })?;
        Self::new(gt, now)
    }

    #[must_use]
    pub const fn gt(&self) -> DateTime<Utc> {
        self.gt
    }

    #[must_use]
    pub const fn lt(&self) -> DateTime<Utc> {
        self.lt
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            format_timestamp(self.gt),
            format_timestamp(self.lt)
        )
    }
}

/// Canonical wire form of a timestamp: RFC 3339, millisecond precision, `Z`.
///
/// Bucket starts are written and matched in this form, so two runs that see
/// the same bucket produce byte-identical identity keys.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
