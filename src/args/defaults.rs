use std::time::Duration;

pub(crate) const DEFAULT_LOG_NAME: &str = "production-access-log";

/// Config filenames checked in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILES: [&str; 2] =
    ["percentile-rollup.toml", "percentile-rollup.json"];

pub(crate) const DEFAULT_HOSTS: [&str; 3] =
    ["http://es0:9200", "http://es1:9200", "http://es2:9200"];

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Width of the live window ending at run start.
pub(crate) const DEFAULT_LOOKBACK: Duration = Duration::from_secs(300);
