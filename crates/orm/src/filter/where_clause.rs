//! Where clause: predicate filtering of records
//!
//! Parsed from the JSON shape `{"prop": value}` (equality) or
//! `{"prop": {"gte": 1, "lte": 5}}` (operators, ANDed together). Multiple
//! keys AND together; `and`/`or` keys hold arrays of sub-clauses.

use modelkit_core::value::{compare_values, values_equal};
use modelkit_core::{ModelError, ModelResult, Record};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Operator keys recognised inside a property condition
const OPERATORS: &[&str] = &[
    "eq", "neq", "gt", "gte", "lt", "lte", "inq", "nin", "between", "exists", "like", "nlike",
    "ilike", "nilike", "regexp",
];

/// Predicate over records
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    And(Vec<WhereClause>),
    Or(Vec<WhereClause>),
    Condition { property: String, operator: Operator },
}

/// Comparison applied to a single property
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Inq(Vec<Value>),
    Nin(Vec<Value>),
    Between(Value, Value),
    Exists(bool),
    Like(Pattern),
    NLike(Pattern),
    ILike(Pattern),
    NILike(Pattern),
    Regexp(Pattern),
}

/// A compiled `like` or `regexp` pattern
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a `like` pattern: `%` matches any sequence, `_` one character
    pub fn like(source: &str, case_insensitive: bool) -> ModelResult<Self> {
        let mut expression = String::from("^");
        let mut literal = String::new();
        for ch in source.chars() {
            match ch {
                '%' | '_' => {
                    expression.push_str(&regex::escape(&literal));
                    literal.clear();
                    expression.push_str(if ch == '%' { ".*" } else { "." });
                }
                other => literal.push(other),
            }
        }
        expression.push_str(&regex::escape(&literal));
        expression.push('$');
        Self::compile(source, &expression, case_insensitive)
    }

    /// Compile a regular expression; `flags` containing `i` makes it case-insensitive
    pub fn regexp(source: &str, flags: &str) -> ModelResult<Self> {
        Self::compile(source, source, flags.contains('i'))
    }

    fn compile(source: &str, expression: &str, case_insensitive: bool) -> ModelResult<Self> {
        let regex = RegexBuilder::new(expression)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| {
                ModelError::invalid_argument(format!(
                    "The pattern {:?} of the where clause is invalid: {}",
                    source, err
                ))
            })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.regex.as_str()).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.source == other.source
    }
}

impl WhereClause {
    /// Equality condition
    pub fn eq(property: impl Into<String>, value: Value) -> Self {
        Self::condition(property, Operator::Eq(value))
    }

    /// Membership condition
    pub fn inq(property: impl Into<String>, values: Vec<Value>) -> Self {
        Self::condition(property, Operator::Inq(values))
    }

    pub fn condition(property: impl Into<String>, operator: Operator) -> Self {
        WhereClause::Condition {
            property: property.into(),
            operator,
        }
    }

    /// Conjunction of two clauses, flattening nested conjunctions
    pub fn and(self, other: WhereClause) -> Self {
        let mut clauses = match self {
            WhereClause::And(clauses) => clauses,
            clause => vec![clause],
        };
        match other {
            WhereClause::And(more) => clauses.extend(more),
            clause => clauses.push(clause),
        }
        WhereClause::And(clauses)
    }

    /// Parse the JSON form of a where clause
    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "The provided option \"where\" should be an Object, but {} given.",
                value
            ))
        })?;

        let mut clauses = Vec::new();
        for (key, value) in object {
            match key.as_str() {
                "and" | "or" => {
                    let items = value.as_array().ok_or_else(|| {
                        ModelError::invalid_argument(format!(
                            "The provided option {:?} of the where clause should be an Array, but {} given.",
                            key, value
                        ))
                    })?;
                    let nested = items
                        .iter()
                        .map(WhereClause::from_json)
                        .collect::<ModelResult<Vec<_>>>()?;
                    clauses.push(if key == "and" {
                        WhereClause::And(nested)
                    } else {
                        WhereClause::Or(nested)
                    });
                }
                property => clauses.extend(parse_property_condition(property, value)?),
            }
        }

        Ok(if clauses.len() == 1 {
            clauses.remove(0)
        } else {
            WhereClause::And(clauses)
        })
    }

    /// Evaluate the clause against a property-keyed record
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            WhereClause::And(clauses) => clauses.iter().all(|clause| clause.matches(record)),
            WhereClause::Or(clauses) => clauses.iter().any(|clause| clause.matches(record)),
            WhereClause::Condition { property, operator } => {
                operator.test(record.get(property))
            }
        }
    }

    /// Keep the records matching the clause
    pub fn filter(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|record| self.matches(record)).collect()
    }
}

fn is_operator_object(object: &Map<String, Value>) -> bool {
    !object.is_empty()
        && object
            .keys()
            .all(|key| OPERATORS.contains(&key.as_str()) || key == "flags")
        && object.keys().any(|key| key != "flags")
}

fn parse_property_condition(property: &str, value: &Value) -> ModelResult<Vec<WhereClause>> {
    let object = match value {
        Value::Object(object) if is_operator_object(object) => object,
        other => return Ok(vec![WhereClause::eq(property, other.clone())]),
    };

    let flags = object.get("flags").and_then(Value::as_str).unwrap_or_default();
    object
        .iter()
        .filter(|(key, _)| key.as_str() != "flags")
        .map(|(key, operand)| {
            let operator = parse_operator(property, key, operand, flags)?;
            Ok(WhereClause::condition(property, operator))
        })
        .collect()
}

fn parse_operator(
    property: &str,
    key: &str,
    operand: &Value,
    flags: &str,
) -> ModelResult<Operator> {
    let invalid = |expected: &str| {
        ModelError::invalid_argument(format!(
            "The operator {:?} of the property {:?} requires {}, but {} given.",
            key, property, expected, operand
        ))
    };
    let list = || operand.as_array().cloned().ok_or_else(|| invalid("an Array"));
    let text = || operand.as_str().ok_or_else(|| invalid("a String"));

    Ok(match key {
        "eq" => Operator::Eq(operand.clone()),
        "neq" => Operator::Neq(operand.clone()),
        "gt" => Operator::Gt(operand.clone()),
        "gte" => Operator::Gte(operand.clone()),
        "lt" => Operator::Lt(operand.clone()),
        "lte" => Operator::Lte(operand.clone()),
        "inq" => Operator::Inq(list()?),
        "nin" => Operator::Nin(list()?),
        "between" => match operand.as_array().map(Vec::as_slice) {
            Some([low, high]) => Operator::Between(low.clone(), high.clone()),
            _ => return Err(invalid("an Array of two elements")),
        },
        "exists" => Operator::Exists(operand.as_bool().ok_or_else(|| invalid("a Boolean"))?),
        "like" => Operator::Like(Pattern::like(text()?, false)?),
        "nlike" => Operator::NLike(Pattern::like(text()?, false)?),
        "ilike" => Operator::ILike(Pattern::like(text()?, true)?),
        "nilike" => Operator::NILike(Pattern::like(text()?, true)?),
        "regexp" => Operator::Regexp(Pattern::regexp(text()?, flags)?),
        other => {
            return Err(ModelError::invalid_argument(format!(
                "The operator {:?} of the where clause is not supported.",
                other
            )))
        }
    })
}

impl Operator {
    /// Test a (possibly absent) property value
    pub fn test(&self, actual: Option<&Value>) -> bool {
        let actual = actual.unwrap_or(&Value::Null);
        match self {
            Operator::Eq(expected) => equals(actual, expected),
            Operator::Neq(expected) => !equals(actual, expected),
            Operator::Gt(bound) => ordered(actual, bound, |o| o == Ordering::Greater),
            Operator::Gte(bound) => ordered(actual, bound, |o| o != Ordering::Less),
            Operator::Lt(bound) => ordered(actual, bound, |o| o == Ordering::Less),
            Operator::Lte(bound) => ordered(actual, bound, |o| o != Ordering::Greater),
            Operator::Inq(values) => values.iter().any(|value| equals(actual, value)),
            Operator::Nin(values) => !values.iter().any(|value| equals(actual, value)),
            Operator::Between(low, high) => {
                ordered(actual, low, |o| o != Ordering::Less)
                    && ordered(actual, high, |o| o != Ordering::Greater)
            }
            Operator::Exists(flag) => !actual.is_null() == *flag,
            Operator::Like(pattern) | Operator::ILike(pattern) | Operator::Regexp(pattern) => {
                actual.as_str().is_some_and(|text| pattern.is_match(text))
            }
            Operator::NLike(pattern) | Operator::NILike(pattern) => {
                !actual.as_str().is_some_and(|text| pattern.is_match(text))
            }
        }
    }
}

/// Equality where an array property equals a scalar containing it
fn equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Array(items), expected) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        _ => values_equal(actual, expected),
    }
}

/// Range comparison; null and incomparable values never match
fn ordered(actual: &Value, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    if actual.is_null() || bound.is_null() {
        return false;
    }
    compare_values(actual, bound).is_some_and(accept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn check(clause: Value, data: Value) -> bool {
        WhereClause::from_json(&clause).unwrap().matches(&record(data))
    }

    #[test]
    fn test_bare_value_is_equality() {
        assert!(check(json!({"foo": 1}), json!({"foo": 1.0})));
        assert!(!check(json!({"foo": 1}), json!({"foo": 2})));
        assert!(check(json!({"foo": null}), json!({})));
        assert!(check(json!({"foo": {"a": 1}}), json!({"foo": {"a": 1}})));
    }

    #[test]
    fn test_multiple_keys_and_together() {
        let clause = json!({"foo": 1, "bar": "x"});
        assert!(check(clause.clone(), json!({"foo": 1, "bar": "x"})));
        assert!(!check(clause, json!({"foo": 1, "bar": "y"})));
    }

    #[test]
    fn test_range_operators() {
        let clause = json!({"foo": {"gte": 10, "lt": 20}});
        assert!(check(clause.clone(), json!({"foo": 10})));
        assert!(check(clause.clone(), json!({"foo": 19.5})));
        assert!(!check(clause.clone(), json!({"foo": 20})));
        assert!(!check(clause, json!({"foo": null})));

        assert!(check(json!({"foo": {"between": [1, 3]}}), json!({"foo": 3})));
        assert!(!check(json!({"foo": {"lt": 5}}), json!({})));
    }

    #[test]
    fn test_membership_operators() {
        assert!(check(json!({"foo": {"inq": [1, 2]}}), json!({"foo": 2})));
        assert!(!check(json!({"foo": {"nin": [1, 2]}}), json!({"foo": 2})));
        assert!(check(json!({"foo": {"nin": [1, 2]}}), json!({})));
    }

    #[test]
    fn test_array_property_equality() {
        assert!(check(json!({"tags": "a"}), json!({"tags": ["a", "b"]})));
        assert!(check(json!({"tags": ["a", "b"]}), json!({"tags": ["a", "b"]})));
        assert!(!check(json!({"tags": "c"}), json!({"tags": ["a", "b"]})));
    }

    #[test]
    fn test_like_operators() {
        assert!(check(json!({"name": {"like": "jo%"}}), json!({"name": "john"})));
        assert!(!check(json!({"name": {"like": "jo%"}}), json!({"name": "JOHN"})));
        assert!(check(json!({"name": {"ilike": "jo%"}}), json!({"name": "JOHN"})));
        assert!(check(json!({"name": {"like": "j_hn"}}), json!({"name": "john"})));
        assert!(check(json!({"name": {"like": "a.b"}}), json!({"name": "a.b"})));
        assert!(!check(json!({"name": {"like": "a.b"}}), json!({"name": "axb"})));
        assert!(check(json!({"name": {"nlike": "jo%"}}), json!({"name": "mary"})));
        assert!(check(json!({"name": {"nilike": "JO%"}}), json!({"name": 5})));
    }

    #[test]
    fn test_regexp_with_flags() {
        assert!(check(json!({"name": {"regexp": "^J"}}), json!({"name": "John"})));
        assert!(!check(json!({"name": {"regexp": "^j"}}), json!({"name": "John"})));
        assert!(check(
            json!({"name": {"regexp": "^j", "flags": "i"}}),
            json!({"name": "John"})
        ));
    }

    #[test]
    fn test_exists() {
        assert!(check(json!({"foo": {"exists": true}}), json!({"foo": 0})));
        assert!(!check(json!({"foo": {"exists": true}}), json!({"foo": null})));
        assert!(check(json!({"foo": {"exists": false}}), json!({})));
    }

    #[test]
    fn test_and_or() {
        let clause = json!({"or": [{"foo": 1}, {"and": [{"foo": {"gt": 5}}, {"bar": true}]}]});
        assert!(check(clause.clone(), json!({"foo": 1})));
        assert!(check(clause.clone(), json!({"foo": 6, "bar": true})));
        assert!(!check(clause, json!({"foo": 6, "bar": false})));
    }

    #[test]
    fn test_malformed_clauses() {
        assert!(WhereClause::from_json(&json!("foo")).is_err());
        assert!(WhereClause::from_json(&json!({"and": {}})).is_err());
        assert!(WhereClause::from_json(&json!({"foo": {"inq": 1}})).is_err());
        assert!(WhereClause::from_json(&json!({"foo": {"between": [1]}})).is_err());
        assert!(WhereClause::from_json(&json!({"foo": {"regexp": "("}})).is_err());
    }

    #[test]
    fn test_and_flattens() {
        let clause = WhereClause::eq("a", json!(1))
            .and(WhereClause::eq("b", json!(2)))
            .and(WhereClause::eq("c", json!(3)));
        match clause {
            WhereClause::And(clauses) => assert_eq!(clauses.len(), 3),
            other => panic!("unexpected clause {:?}", other),
        }
    }
}
