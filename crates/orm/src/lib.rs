//! # modelkit: pluggable object-data mapper
//!
//! Validates, transforms and persists JSON records against declared
//! models, independent of the storage engine.
//!
//! - [`adapter`]: the storage adapter contract and the middleware pipeline
//!   that decorates it (sanitizing, default values, transformation,
//!   validation, uniqueness, fields filtering, inclusion)
//! - [`filter`]: where/order/fields/skip/limit/include clauses
//! - [`transform`]: property transformers
//! - [`backends`]: the in-memory adapter
//!
//! ```
//! use modelkit::{Adapter, AdapterContext, DecoratedAdapter, Filter, MemoryAdapter};
//! use modelkit::{DataType, ModelDefinition, PropertyDefinition, Schema};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> modelkit::ModelResult<()> {
//! let mut schema = Schema::new();
//! schema.define_model(
//!     ModelDefinition::new("model")
//!         .property("foo", PropertyDefinition::new(DataType::Number).default_value(json!(10))),
//! )?;
//! let schema = Arc::new(schema);
//!
//! let adapter = DecoratedAdapter::new(
//!     MemoryAdapter::new(schema.clone()),
//!     AdapterContext::new(schema),
//! );
//! let created = adapter.create("model", Default::default(), None).await?;
//! assert_eq!(serde_json::Value::Object(created), json!({"id": 1, "foo": 10}));
//!
//! let filter = Filter::from_json(&json!({"where": {"foo": {"gte": 10}}}))?;
//! assert_eq!(adapter.find("model", Some(filter)).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod backends;
pub mod filter;
pub mod transform;

pub use adapter::{
    Adapter, AdapterContext, Call, CallHandle, DecoratedAdapter, Middleware, Next, NextFuture,
    Operation, Output, Pipeline,
};
pub use backends::MemoryAdapter;
pub use filter::{Filter, IncludeSpec, OrderDirection, OrderKey, WhereClause};
pub use transform::{DataTransformer, TransformerRegistry};

pub use modelkit_core::{
    DataType, ModelConfig, ModelDefinition, ModelError, ModelResult, PropertyDefinition,
    PropertyTransformer, PropertyUniqueness, PropertyValidator, Record, RelationDefinition,
    RelationType, Schema,
};
pub use modelkit_validation::{DataValidator, ValidatorRegistry};
