//! Call arguments as they travel to the host.

use serde::Serialize;
use serde_json::{Map, Value};

/// Arguments of a bridge call.
///
/// Named arguments keep their insertion order so the positional (args-array)
/// encoding can send the same call as a JSON array.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Args {
    #[default]
    None,
    Named(Vec<(String, Value)>),
    Positional(Vec<Value>),
}

impl Args {
    pub fn named<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Args::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn positional<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Args::Positional(values.into_iter().collect())
    }

    /// Named arguments from the fields of a serializable struct.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Args::from(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Args::None => true,
            Args::Named(pairs) => pairs.is_empty(),
            Args::Positional(values) => values.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Args::None => 0,
            Args::Named(pairs) => pairs.len(),
            Args::Positional(values) => values.len(),
        }
    }

    /// Look up a named argument.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Args::Named(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up an argument by position; named arguments count in insertion order.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            Args::None => None,
            Args::Named(pairs) => pairs.get(index).map(|(_, v)| v),
            Args::Positional(values) => values.get(index),
        }
    }

    /// Named lookup with a positional fallback, for handlers that accept both shapes.
    pub fn get_or_at(&self, key: &str, index: usize) -> Option<&Value> {
        match self {
            Args::Positional(_) => self.at(index),
            _ => self.get(key),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Args::None => Vec::new(),
            Args::Named(pairs) => pairs.into_iter().map(|(_, v)| v).collect(),
            Args::Positional(values) => values,
        }
    }

    /// Named arguments as a JSON object; positional arguments as a JSON array.
    pub fn to_value(&self) -> Value {
        match self {
            Args::None => Value::Object(Map::new()),
            Args::Named(pairs) => Value::Object(pairs.iter().cloned().collect()),
            Args::Positional(values) => Value::Array(values.clone()),
        }
    }
}

impl From<Value> for Args {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Args::None,
            Value::Object(map) => Args::Named(map.into_iter().collect()),
            Value::Array(values) => Args::Positional(values),
            other => Args::Positional(vec![other]),
        }
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Args::Positional(values)
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::None
    }
}
