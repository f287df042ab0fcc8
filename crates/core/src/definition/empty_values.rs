//! Per-type sets of values treated as "not provided"

use super::data_type::DataType;
use crate::value::values_equal;
use serde_json::Value;
use std::collections::HashMap;

/// Values considered empty for defaulting, validation and sparse
/// uniqueness. An absent property is always empty; by default `null` is
/// the only empty value of every type.
#[derive(Debug, Clone)]
pub struct EmptyValues {
    by_type: HashMap<DataType, Vec<Value>>,
}

impl Default for EmptyValues {
    fn default() -> Self {
        let by_type = DataType::ALL
            .iter()
            .map(|data_type| (*data_type, vec![Value::Null]))
            .collect();
        Self { by_type }
    }
}

impl EmptyValues {
    /// Replace the empty values of a type
    pub fn set_empty_values(&mut self, data_type: DataType, values: Vec<Value>) -> &mut Self {
        self.by_type.insert(data_type, values);
        self
    }

    pub fn empty_values(&self, data_type: DataType) -> &[Value] {
        self.by_type
            .get(&data_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Check whether a (possibly absent) value is empty for the given type
    pub fn is_empty(&self, data_type: DataType, value: Option<&Value>) -> bool {
        match value {
            None => true,
            Some(value) => self
                .empty_values(data_type)
                .iter()
                .any(|empty| values_equal(empty, value)),
        }
    }
}
