//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod test_support;

pub use cli::RollupArgs;
pub use types::{PositiveU64, PositiveUsize};

pub(crate) use defaults::{
    DEFAULT_CONFIG_FILES, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HOSTS, DEFAULT_LOG_NAME,
    DEFAULT_LOOKBACK, DEFAULT_TIMEOUT,
};
