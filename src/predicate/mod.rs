//! The predicate tree: a typed condition language evaluated directly over
//! `serde_json::Value` documents, and translated to an equivalent MongoDB
//! query for the retention store's query path (see [`query`]).
//!
//! Grounded on the union of `filter.py` revisions in the relay this system
//! was distilled from: `Exists`/`Exact`/`Regex`/`All`/`Any` appear in every
//! revision; `Range`, `DateRange`, and `Not` are additions of the most
//! capable revision.

mod path;
pub mod query;

pub use path::Path;

use crate::error::PredicateError;
use regex::Regex;
use serde_json::{Map, Value};

/// A predicate tree. Construction (see [`Predicate::from_description`]) can
/// fail; evaluation ([`Predicate::matches`]) never does.
#[derive(Debug, Clone)]
pub enum Predicate {
    Exists {
        path: Path,
    },
    Exact {
        path: Path,
        value: Value,
    },
    Regex {
        path: Path,
        pattern: Regex,
    },
    Range {
        path: Path,
        min: Option<f64>,
        max: Option<f64>,
    },
    DateRange {
        path: Path,
        min: Option<chrono::DateTime<chrono::Utc>>,
        max: Option<chrono::DateTime<chrono::Utc>>,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Vec<Predicate>),
}

impl Predicate {
    /// The predicate that matches every event: `All[]`. This is the default
    /// predicate a freshly-opened subscriber carries.
    pub fn match_all() -> Predicate {
        Predicate::All(Vec::new())
    }

    /// Builds a predicate from its declarative JSON description (see
    /// SPEC_FULL.md §6 for the grammar). Unknown `type`, missing
    /// variant-specific fields, an invalid regex, or an invalid ISO-8601
    /// bound are all construction errors.
    pub fn from_description(desc: &Value) -> Result<Predicate, PredicateError> {
        let obj = desc
            .as_object()
            .ok_or_else(|| PredicateError::UnknownType(desc.to_string()))?;

        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(PredicateError::MissingField {
                ty: "<root>",
                field: "type",
            })?;

        match ty {
            "exists" => Ok(Predicate::Exists {
                path: Path::from_dotted(required_str(obj, "exists", "path")?),
            }),
            "exact" => {
                let path = Path::from_dotted(required_str(obj, "exact", "path")?);
                let value = obj
                    .get("value")
                    .cloned()
                    .ok_or(PredicateError::MissingField {
                        ty: "exact",
                        field: "value",
                    })?;
                Ok(Predicate::Exact { path, value })
            }
            "regex" => {
                let path = Path::from_dotted(required_str(obj, "regex", "path")?);
                let pattern_str = required_str(obj, "regex", "pattern")?;
                let pattern =
                    Regex::new(pattern_str).map_err(|source| PredicateError::InvalidRegex {
                        pattern: pattern_str.to_string(),
                        source,
                    })?;
                Ok(Predicate::Regex { path, pattern })
            }
            "range" => {
                let path = Path::from_dotted(required_str(obj, "range", "path")?);
                let min = optional_f64(obj, "min_value");
                let max = optional_f64(obj, "max_value");
                Ok(Predicate::Range { path, min, max })
            }
            "daterange" => {
                let path = Path::from_dotted(required_str(obj, "daterange", "path")?);
                let min = optional_datetime(obj, "min_value")?;
                let max = optional_datetime(obj, "max_value")?;
                Ok(Predicate::DateRange { path, min, max })
            }
            "all" => Ok(Predicate::All(parse_conditions(obj, "all")?)),
            "any" => Ok(Predicate::Any(parse_conditions(obj, "any")?)),
            "not" => Ok(Predicate::Not(parse_conditions(obj, "not")?)),
            other => Err(PredicateError::UnknownType(other.to_string())),
        }
    }

    /// Re-emits the declarative description this predicate was built from
    /// (or an equivalent one), for the round-trip property in §8.
    pub fn to_description(&self) -> Value {
        match self {
            Predicate::Exists { path } => serde_json::json!({"type": "exists", "path": path.to_string()}),
            Predicate::Exact { path, value } => {
                serde_json::json!({"type": "exact", "path": path.to_string(), "value": value})
            }
            Predicate::Regex { path, pattern } => {
                serde_json::json!({"type": "regex", "path": path.to_string(), "pattern": pattern.as_str()})
            }
            Predicate::Range { path, min, max } => {
                serde_json::json!({"type": "range", "path": path.to_string(), "min_value": min, "max_value": max})
            }
            Predicate::DateRange { path, min, max } => serde_json::json!({
                "type": "daterange",
                "path": path.to_string(),
                "min_value": min.map(|dt| dt.to_rfc3339()),
                "max_value": max.map(|dt| dt.to_rfc3339()),
            }),
            Predicate::All(children) => serde_json::json!({
                "type": "all",
                "conditions": children.iter().map(Predicate::to_description).collect::<Vec<_>>(),
            }),
            Predicate::Any(children) => serde_json::json!({
                "type": "any",
                "conditions": children.iter().map(Predicate::to_description).collect::<Vec<_>>(),
            }),
            Predicate::Not(children) => serde_json::json!({
                "type": "not",
                "conditions": children.iter().map(Predicate::to_description).collect::<Vec<_>>(),
            }),
        }
    }

    /// Evaluates this predicate against a document. Never errors: a
    /// predicate whose path doesn't resolve, or whose value doesn't coerce
    /// to the variant's expected shape, simply evaluates to `false`.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Predicate::Exists { path } => path.test(doc, &mut |v| !v.is_null()),
            Predicate::Exact { path, value } => path.test(doc, &mut |v| values_equal(v, value)),
            Predicate::Regex { path, pattern } => path.test(doc, &mut |v| {
                let s = coerce_string(v);
                pattern.find(&s).is_some_and(|m| m.start() == 0)
            }),
            Predicate::Range { path, min, max } => path.test(doc, &mut |v| {
                coerce_f64(v).is_some_and(|v| in_bounds(v, *min, *max))
            }),
            Predicate::DateRange { path, min, max } => path.test(doc, &mut |v| {
                v.as_str()
                    .and_then(|s| crate::timeutil::parse_utc(s).ok())
                    .is_some_and(|v| in_bounds(v, *min, *max))
            }),
            Predicate::All(children) => children.iter().all(|c| c.matches(doc)),
            Predicate::Any(children) => children.iter().any(|c| c.matches(doc)),
            Predicate::Not(children) => !children.iter().any(|c| c.matches(doc)),
        }
    }
}

fn in_bounds<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    let above_min = match &min {
        Some(min) => value >= *min,
        None => true,
    };
    let below_max = match &max {
        Some(max) => value <= *max,
        None => true,
    };
    above_min && below_max
}

/// Deep equality with cross-numeric-type coercion: `2` and `2.0` are equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|y| values_equal(v, y)))
        }
        _ => a == b,
    }
}

/// Coerces a resolved value to its canonical string form for regex matching:
/// strings pass through unquoted, everything else uses its JSON rendering.
fn coerce_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn required_str<'o>(
    obj: &'o Map<String, Value>,
    ty: &'static str,
    field: &'static str,
) -> Result<&'o str, PredicateError> {
    obj.get(field)
        .and_then(Value::as_str)
        .ok_or(PredicateError::MissingField { ty, field })
}

fn optional_f64(obj: &Map<String, Value>, field: &str) -> Option<f64> {
    obj.get(field).and_then(Value::as_f64)
}

fn optional_datetime(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, PredicateError> {
    let Some(raw) = obj.get(field).and_then(Value::as_str) else {
        return Ok(None);
    };
    crate::timeutil::parse_utc(raw)
        .map(Some)
        .map_err(|source| PredicateError::InvalidTimestamp {
            value: raw.to_string(),
            source,
        })
}

fn parse_conditions(
    obj: &Map<String, Value>,
    ty: &'static str,
) -> Result<Vec<Predicate>, PredicateError> {
    let arr = obj
        .get("conditions")
        .and_then(Value::as_array)
        .ok_or(PredicateError::MissingField {
            ty,
            field: "conditions",
        })?;
    arr.iter().map(Predicate::from_description).collect()
}
