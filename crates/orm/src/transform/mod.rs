//! Data Transformer
//!
//! - `registry`: named transformers, including the built-ins
//! - `builtin`: `trim`, `toUpperCase`, `toLowerCase`, `toTitleCase`
//! - `transformer`: applies declared transformer chains to records

pub mod builtin;
pub mod registry;
pub mod transformer;

pub use registry::TransformerRegistry;
pub use transformer::DataTransformer;
