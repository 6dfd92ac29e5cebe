mod app;
mod config;
mod pipeline;
mod store;
mod validation;


pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use pipeline::PipelineError;
pub use store::StoreError;
pub use validation::ValidationError;
