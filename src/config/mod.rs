//! Configuration loading and application.
pub(crate) mod apply;
mod loader;
pub mod types;


pub use apply::{RollupSettings, apply_config, index_names};
pub use loader::load_config;

#[cfg(test)]
pub(crate) use loader::load_config_file;
