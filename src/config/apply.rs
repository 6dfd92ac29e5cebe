use std::time::Duration;

use chrono::NaiveDate;
use url::Url;

use crate::args::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOSTS, DEFAULT_LOOKBACK, DEFAULT_TIMEOUT, PositiveU64,
    PositiveUsize, RollupArgs,
};
use crate::domain::FieldNames;
use crate::error::{AppError, AppResult, ConfigError};
use crate::pipeline::{DEFAULT_MAX_SERVICES, PipelineConfig};
use crate::store::StoreClientConfig;

use super::types::{ConfigFile, DurationValue, FieldsConfig};

/// Everything a run needs, resolved from CLI arguments, the optional config
/// file and the run date.
#[derive(Debug, Clone)]
pub struct RollupSettings {
    pub store: StoreClientConfig,
    pub pipeline: PipelineConfig,
    pub lookback: Duration,
}

/// Daily event and percentile index names for `log_name`.
#[must_use]
pub fn index_names(log_name: &str, day: NaiveDate) -> (String, String) {
    let suffix = day.format("%Y.%m.%d");
    (
        format!("{}-{}", log_name, suffix),
        format!("{}-percentile-{}", log_name, suffix),
    )
}

/// Merges the config file over built-in defaults.
///
/// # Errors
///
/// Returns an error when a configured value is invalid.
pub fn apply_config(
    args: &RollupArgs,
    config: Option<&ConfigFile>,
    day: NaiveDate,
) -> AppResult<RollupSettings> {
    let empty = ConfigFile::default();
    let config = config.unwrap_or(&empty);

    let hosts = match &config.hosts {
        Some(hosts) => parse_hosts(hosts.iter().map(String::as_str))?,
        None => parse_hosts(DEFAULT_HOSTS.into_iter())?,
    };
    let timeout = duration_or(config.timeout.as_ref(), "timeout", DEFAULT_TIMEOUT)?;
    let connect_timeout = duration_or(
        config.connect_timeout.as_ref(),
        "connect_timeout",
        DEFAULT_CONNECT_TIMEOUT,
    )?;
    let lookback = duration_or(config.lookback.as_ref(), "lookback", DEFAULT_LOOKBACK)?;

    let max_services = match config.max_services {
        Some(value) => PositiveU64::try_from(value)
            .map_err(|err| {
                AppError::config(ConfigError::FieldMustBePositive {
                    field: "max_services",
                    source: err,
                })
            })?
            .get(),
        None => DEFAULT_MAX_SERVICES,
    };
    let concurrency = match config.concurrency {
        Some(value) => PositiveUsize::try_from(value)
            .map_err(|err| {
                AppError::config(ConfigError::FieldMustBePositive {
                    field: "concurrency",
                    source: err,
                })
            })?
            .get(),
        None => 1,
    };

    let (default_events, default_percentiles) = index_names(&args.log_name, day);
    let event_index = non_empty_or(config.event_index.as_ref(), "event_index", default_events)?;
    let percentile_index = non_empty_or(
        config.percentile_index.as_ref(),
        "percentile_index",
        default_percentiles,
    )?;

    Ok(RollupSettings {
        store: StoreClientConfig {
            hosts,
            timeout,
            connect_timeout,
        },
        pipeline: PipelineConfig {
            event_index,
            percentile_index,
            fields: resolve_fields(config.fields.as_ref())?,
            max_services,
            concurrency,
            dry_run: args.dry_run || config.dry_run.unwrap_or(false),
        },
        lookback,
    })
}

fn parse_hosts<'host, I>(hosts: I) -> AppResult<Vec<Url>>
where
    I: Iterator<Item = &'host str>,
{
    let mut parsed = Vec::new();
    for host in hosts {
        let url = Url::parse(host.trim()).map_err(|err| {
            AppError::config(ConfigError::InvalidHost {
                host: host.to_owned(),
                source: err,
            })
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(ConfigError::UnsupportedHostScheme {
                host: host.to_owned(),
            }));
        }
        parsed.push(url);
    }
    if parsed.is_empty() {
        return Err(AppError::config(ConfigError::HostsEmpty));
    }
    Ok(parsed)
}

fn duration_or(
    value: Option<&DurationValue>,
    field: &'static str,
    default: Duration,
) -> AppResult<Duration> {
    value.map_or(Ok(default), |value| {
        value
            .to_duration()
            .map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
    })
}

fn non_empty_or(
    value: Option<&String>,
    field: &'static str,
    default: String,
) -> AppResult<String> {
    match value {
        Some(value) if value.trim().is_empty() => {
            Err(AppError::config(ConfigError::FieldEmpty { field }))
        }
        Some(value) => Ok(value.trim().to_owned()),
        None => Ok(default),
    }
}

fn resolve_fields(fields: Option<&FieldsConfig>) -> AppResult<FieldNames> {
    let defaults = FieldNames::default();
    let Some(fields) = fields else {
        return Ok(defaults);
    };
    Ok(FieldNames {
        service: non_empty_or(fields.service.as_ref(), "fields.service", defaults.service)?,
        timestamp: non_empty_or(
            fields.timestamp.as_ref(),
            "fields.timestamp",
            defaults.timestamp,
        )?,
        latency: non_empty_or(fields.latency.as_ref(), "fields.latency", defaults.latency)?,
        path: non_empty_or(fields.path.as_ref(), "fields.path", defaults.path)?,
    })
}
