//! Standard pipeline stages, listed outermost first
//!
//! - `sanitizing`: rejects unknown models and relations, strips relation keys
//! - `default_values`: fills defaults into payloads and returned records
//! - `transformation`: runs property transformers on payloads
//! - `validation`: validates payloads
//! - `uniqueness`: rejects payloads duplicating unique properties
//! - `fields_filtering`: projects returned records
//! - `inclusion`: attaches related records to returned records

pub mod default_values;
pub mod fields_filtering;
pub mod inclusion;
pub mod sanitizing;
pub mod transformation;
pub mod uniqueness;
pub mod validation;

pub use default_values::DefaultValuesStage;
pub use fields_filtering::FieldsFilteringStage;
pub use inclusion::InclusionStage;
pub use sanitizing::SanitizingStage;
pub use transformation::TransformationStage;
pub use uniqueness::UniquenessStage;
pub use validation::ValidationStage;
