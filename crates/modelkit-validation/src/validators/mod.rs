//! Built-in property validators

pub mod length;
pub mod pattern;

pub use length::LengthValidator;
pub use pattern::PatternValidator;
