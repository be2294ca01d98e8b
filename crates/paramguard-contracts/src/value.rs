//! The input value model.
//!
//! `ParamValue` is the already-decoded, untrusted request data the validator
//! inspects.  It is a plain tagged union over scalars, sequences, and
//! string-keyed mappings.  Once built, a `Params` mapping cannot be modified:
//! the only way to obtain one is to construct it whole.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A single decoded input value.
///
/// Converts losslessly from and to `serde_json::Value`, which also makes it
/// deserializable from any self-describing serde format (TOML rule parameters
/// use this path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Vec<ParamValue>),
    Map(Params),
}

impl ParamValue {
    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Return true if the value counts as "blank" for presence checks.
    ///
    /// Blank values: `Null`, `false`, a string that is empty or only
    /// whitespace, an empty sequence, and an empty mapping.
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Null => true,
            ParamValue::Bool(b) => !b,
            ParamValue::Number(_) => false,
            ParamValue::String(s) => s.trim().is_empty(),
            ParamValue::Seq(items) => items.is_empty(),
            ParamValue::Map(params) => params.is_empty(),
        }
    }

    /// The size used by length rules.
    ///
    /// Strings count characters, sequences and mappings count entries, and
    /// any other scalar is measured by its textual rendering.
    pub fn length(&self) -> usize {
        match self {
            ParamValue::String(s) => s.chars().count(),
            ParamValue::Seq(items) => items.len(),
            ParamValue::Map(params) => params.len(),
            other => other.to_string().chars().count(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Params> {
        match self {
            ParamValue::Map(params) => Some(params),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => Ok(()),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Seq(_) | ParamValue::Map(_) => {
                write!(f, "{}", Value::from(self.clone()))
            }
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => ParamValue::Number(n),
            Value::String(s) => ParamValue::String(s),
            Value::Array(items) => ParamValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => ParamValue::Map(map.into_iter().collect()),
        }
    }
}

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Null => Value::Null,
            ParamValue::Bool(b) => Value::Bool(b),
            ParamValue::Number(n) => Value::Number(n),
            ParamValue::String(s) => Value::String(s),
            ParamValue::Seq(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            ParamValue::Map(params) => Value::Object(
                params
                    .entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::String(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Number(n.into())
    }
}

impl From<Params> for ParamValue {
    fn from(params: Params) -> Self {
        ParamValue::Map(params)
    }
}

/// An immutable string-keyed mapping of input values.
///
/// Keys are held in sorted order, so iteration is deterministic regardless of
/// the order the source document listed them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Look up `key`.  An explicit `Null` is returned as-is; callers decide
    /// whether to treat it as absent.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
