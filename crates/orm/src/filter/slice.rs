//! Skip and limit: pagination of an ordered sequence of records

use modelkit_core::{ModelError, ModelResult};
use serde_json::Value;

/// Parse a `skip` or `limit` option as a non-negative integer
pub fn parse_count(option: &str, value: &Value) -> ModelResult<Option<usize>> {
    match value {
        Value::Null => Ok(None),
        other => other
            .as_u64()
            .map(|count| Some(count as usize))
            .ok_or_else(|| {
                ModelError::invalid_argument(format!(
                    "The provided option {:?} should be a non-negative integer, but {} given.",
                    option, other
                ))
            }),
    }
}

/// Apply `skip` then `limit`.
///
/// A `limit` of zero means no limit rather than an empty result.
pub fn slice<T>(items: Vec<T>, skip: Option<usize>, limit: Option<usize>) -> Vec<T> {
    let skipped = items.into_iter().skip(skip.unwrap_or(0));
    match limit {
        Some(limit) if limit > 0 => skipped.take(limit).collect(),
        _ => skipped.collect(),
    }
}
