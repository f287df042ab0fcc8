//! Order clause: stable multi-key sorting

use modelkit_core::value::compare_values;
use modelkit_core::{ModelError, ModelResult, Record};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// One sort key of an order clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub property: String,
    pub direction: OrderDirection,
}

impl OrderKey {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse `"prop"` or `"prop ASC|DESC"`
    pub fn parse(text: &str) -> ModelResult<Self> {
        let mut parts = text.split_whitespace();
        let invalid = || {
            ModelError::invalid_argument(format!(
                "The provided option \"order\" should be a String like \"prop ASC\", but {:?} given.",
                text
            ))
        };

        let property = parts.next().ok_or_else(invalid)?;
        let direction = match parts.next() {
            None => OrderDirection::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("asc") => OrderDirection::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
            Some(_) => return Err(invalid()),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            property: property.to_string(),
            direction,
        })
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.direction)
    }
}

/// Parse a string or an array of strings into sort keys
pub fn parse_order(value: &Value) -> ModelResult<Vec<OrderKey>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(vec![OrderKey::parse(text)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => OrderKey::parse(text),
                other => Err(ModelError::invalid_argument(format!(
                    "The provided option \"order\" should be an Array of String, but {} given.",
                    other
                ))),
            })
            .collect(),
        other => Err(ModelError::invalid_argument(format!(
            "The provided option \"order\" should be a String or an Array of String, but {} given.",
            other
        ))),
    }
}

/// Sort records in place by the given keys, in priority order.
/// The sort is stable; absent properties sort as `null`.
pub fn sort_records(records: &mut [Record], order: &[OrderKey]) {
    if order.is_empty() {
        return;
    }
    records.sort_by(|left, right| {
        for key in order {
            let a = left.get(&key.property).unwrap_or(&Value::Null);
            let b = right.get(&key.property).unwrap_or(&Value::Null);
            let ordering = compare_values(a, b).unwrap_or(Ordering::Equal);
            let ordering = match key.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
