//! Model Definitions - Declarations consumed by every other component
//!
//! - `data_type`: closed set of property types
//! - `property`: property declarations, defaults and uniqueness
//! - `relation`: relations between models
//! - `functions`: validator and transformer declarations
//! - `model`: model declarations and their JSON shape
//! - `empty_values`: per-type "not provided" values
//! - `schema`: the definition registry
//! - `utils`: hierarchy, column mapping, primary keys and defaults

pub mod data_type;
pub mod empty_values;
pub mod functions;
pub mod model;
pub mod property;
pub mod relation;
pub mod schema;
pub mod utils;

pub use data_type::DataType;
pub use empty_values::EmptyValues;
pub use functions::{
    FnTransformer, PropertyTransformer, PropertyValidator, Transformer, TransformerContext,
    ValidatorContext, ValidatorFn,
};
pub use model::ModelDefinition;
pub use property::{DefaultValue, PropertyDefinition, PropertyUniqueness};
pub use relation::{RelationDefinition, RelationType};
pub use schema::Schema;
