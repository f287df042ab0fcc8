//! # modelkit-validation
//!
//! Validation of records against modelkit model declarations: the data
//! validator plus a registry of named property validators with the
//! built-in `minLength`, `maxLength` and `regexp` validators.
//!
//! Property validators are synchronous. They receive the property value,
//! the options declared with the validator and a [`ValidatorContext`]
//! naming the model and property, and return whether the value is
//! accepted.

pub mod registry;
pub mod validator;
pub mod validators;

pub use registry::ValidatorRegistry;
pub use validator::DataValidator;
pub use validators::{length::LengthValidator, pattern::PatternValidator};

pub use modelkit_core::{ValidatorContext, ValidatorFn};
