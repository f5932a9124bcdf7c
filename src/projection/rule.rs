//! Extraction rules and their evaluation against one raw record
//!
//! Evaluation never fails. A missing source yields the rule's declared
//! default; a source of the wrong type yields the same default and marks the
//! field as degraded.

use serde_json::Value;

/// A path of object keys from the record root, e.g. `["author", "id"]`
pub type Path = &'static [&'static str];

/// Value substituted when the source field is missing or unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Null,
    EmptyList,
    EmptyString,
    Zero,
}

impl Fallback {
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::EmptyList => Value::Array(Vec::new()),
            Self::EmptyString => Value::String(String::new()),
            Self::Zero => Value::from(0),
        }
    }
}

/// Which segment of a split string to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    First,
    Last,
}

/// One output field's extraction rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Copy the value at the path; null when missing
    Field(Path),

    /// Copy the value at the path, or the fallback when it is missing, null or `false`
    OrDefault(Path, Fallback),

    /// When the path holds an array, the string ids of its elements; otherwise `[]`
    IdList(Path),

    /// When the path holds an object, one of its keys; otherwise null
    ObjectField(Path, &'static str),

    /// Split a non-empty string on `sep` and keep the first or last segment
    SplitPick(Path, char, Pick),

    /// Length of the array (or object, or string) at the path; 0 when missing
    LengthOf(Path),

    /// Concatenate the array at the path with `sep`; `""` when missing
    Join(Path, &'static str),
}

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub value: Value,
    pub degraded: bool,
}

impl Evaluated {
    fn ok(value: Value) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    fn degraded(value: Value) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

/// Walks `path` through nested objects
///
/// Returns `None` when a key is missing or an intermediate value is not an
/// object.
pub fn lookup<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(record, |current, key| current.as_object()?.get(*key))
}

impl Rule {
    /// Evaluates this rule against a raw record
    pub fn evaluate(&self, record: &Value) -> Evaluated {
        match *self {
            Rule::Field(path) => match lookup(record, path) {
                None | Some(Value::Null) => Evaluated::ok(Value::Null),
                Some(v) => flatten(v),
            },

            Rule::OrDefault(path, fallback) => match lookup(record, path) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => {
                    Evaluated::ok(fallback.to_value())
                }
                Some(v) => {
                    let flat = flatten(v);
                    if flat.degraded && flat.value.is_null() {
                        Evaluated::degraded(fallback.to_value())
                    } else {
                        flat
                    }
                }
            },

            Rule::IdList(path) => match lookup(record, path) {
                Some(Value::Array(items)) => {
                    let ids: Vec<Value> = items.iter().filter_map(id_string).collect();
                    if ids.len() == items.len() {
                        Evaluated::ok(Value::Array(ids))
                    } else {
                        Evaluated::degraded(Value::Array(ids))
                    }
                }
                None | Some(Value::Null) => Evaluated::ok(Value::Array(Vec::new())),
                Some(_) => Evaluated::degraded(Value::Array(Vec::new())),
            },

            Rule::ObjectField(path, key) => match lookup(record, path) {
                Some(Value::Object(map)) => match map.get(key) {
                    None | Some(Value::Null) => Evaluated::ok(Value::Null),
                    Some(v) => flatten(v),
                },
                None | Some(Value::Null) => Evaluated::ok(Value::Null),
                Some(_) => Evaluated::degraded(Value::Null),
            },

            Rule::SplitPick(path, sep, pick) => {
                let text = match lookup(record, path) {
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    None | Some(Value::Null) | Some(Value::String(_)) => {
                        return Evaluated::ok(Value::Null)
                    }
                    Some(_) => return Evaluated::degraded(Value::Null),
                };
                let segment = match pick {
                    Pick::First => text.split(sep).next(),
                    Pick::Last => text.split(sep).last(),
                };
                Evaluated::ok(segment.map_or(Value::Null, |s| Value::String(s.to_string())))
            }

            Rule::LengthOf(path) => match lookup(record, path) {
                Some(Value::Array(items)) => Evaluated::ok(Value::from(items.len())),
                Some(Value::Object(map)) => Evaluated::ok(Value::from(map.len())),
                Some(Value::String(s)) => Evaluated::ok(Value::from(s.chars().count())),
                None | Some(Value::Null) | Some(Value::Bool(false)) => {
                    Evaluated::ok(Value::from(0))
                }
                Some(_) => Evaluated::degraded(Value::from(0)),
            },

            Rule::Join(path, sep) => match lookup(record, path) {
                Some(Value::Array(items)) => {
                    let mut degraded = false;
                    let parts: Vec<String> = items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => n.to_string(),
                            Value::Bool(b) => b.to_string(),
                            Value::Null => String::new(),
                            _ => {
                                degraded = true;
                                String::new()
                            }
                        })
                        .collect();
                    let joined = Value::String(parts.join(sep));
                    if degraded {
                        Evaluated::degraded(joined)
                    } else {
                        Evaluated::ok(joined)
                    }
                }
                None | Some(Value::Null) | Some(Value::Bool(false)) => {
                    Evaluated::ok(Value::String(String::new()))
                }
                Some(_) => Evaluated::degraded(Value::String(String::new())),
            },
        }
    }
}

/// Converts an array element to its string id
///
/// Strings pass through, numbers are stringified, and references of the form
/// `{"id": ..}` are reduced to their id.
fn id_string(item: &Value) -> Option<Value> {
    match item {
        Value::String(s) => Some(Value::String(s.clone())),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(s)) => Some(Value::String(s.clone())),
            Some(Value::Number(n)) => Some(Value::String(n.to_string())),
            _ => None,
        },
        _ => None,
    }
}

/// Keeps a value within the flat output shape
///
/// Scalars pass through, arrays become arrays of strings, objects are
/// replaced by null.
fn flatten(value: &Value) -> Evaluated {
    match value {
        Value::Object(_) => Evaluated::degraded(Value::Null),
        Value::Array(items) => {
            let mut degraded = false;
            let flat: Vec<Value> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(_) => Some(item.clone()),
                    Value::Number(n) => Some(Value::String(n.to_string())),
                    Value::Bool(b) => Some(Value::String(b.to_string())),
                    Value::Null => None,
                    Value::Object(_) => {
                        let id = id_string(item);
                        degraded |= id.is_none();
                        id
                    }
                    Value::Array(_) => {
                        degraded = true;
                        None
                    }
                })
                .collect();
            Evaluated {
                value: Value::Array(flat),
                degraded,
            }
        }
        scalar => Evaluated::ok(scalar.clone()),
    }
}
