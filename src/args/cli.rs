use clap::Parser;

use super::defaults::DEFAULT_LOG_NAME;
use super::parsers::{parse_bool_env, parse_log_name};

const LONG_ABOUT: &str = "\
Scans the last few minutes of an access-log index, computes per-service, \
per-minute latency percentiles (p50/p80/p95/p99) and writes each one to the \
percentile index unless a record for that service and minute already exists.

The existence check and the write are not atomic. Schedule runs so that they \
never overlap (for example under `flock`), otherwise two runs may both write \
the same record.";

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Rolls access-log events up into per-service, per-minute latency percentile records.",
    long_about = LONG_ABOUT
)]
pub struct RollupArgs {
    /// Log stream name; selects `<name>-<date>` and `<name>-percentile-<date>` indices
    #[arg(default_value = DEFAULT_LOG_NAME, value_parser = parse_log_name)]
    pub log_name: String,

    /// Config file (.toml or .json); defaults to ./percentile-rollup.toml or .json
    #[arg(long = "config", short = 'c')]
    pub config: Option<String>,

    /// Compute and check records but do not write them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Log at debug level unless PERCENTILE_ROLLUP_LOG or RUST_LOG is set
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Disable ANSI colours in log output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}
