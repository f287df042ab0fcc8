//! # modelkit-core
//!
//! Foundation of the modelkit object-data mapper: model and property
//! declarations, the definition registry, model definition utilities,
//! configuration and error types shared by the validation and storage
//! crates.

pub mod config;
pub mod definition;
pub mod error;
pub mod value;

pub use config::{ConfigError, ConfigSource, ModelConfig};
pub use definition::*;
pub use error::{ModelError, ModelResult};
pub use value::Record;
