//! # minimon Config
//!
//! Configuration management for the minimon agent: typed schema, custom
//! field types, loading with environment interpolation, and validation.

mod error;
mod loader;
mod schema;
pub mod types;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use types::{RelativeAbsoluteValue, TimeOfDay};
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
