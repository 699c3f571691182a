//! # Gemini Projects Config
//!
//! Configuration for the projects layer: host URL shape, locale, injection
//! timing bounds, visibility thresholds, storage location and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
