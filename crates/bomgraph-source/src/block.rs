//! Typed blocks: the only thing downstream compilation sees of a source file.

use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Attribute value as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    /// Bare dotted reference such as `parts.bolt`.
    Ref(Vec<String>),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Reference path. A quoted dotted string is accepted as well.
    pub fn as_path(&self) -> Option<Vec<String>> {
        match self {
            Value::Ref(path) => Some(path.clone()),
            Value::Str(s) if !s.is_empty() => Some(s.split('.').map(str::to_string).collect()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Scalar rendered as a string; `None` for lists and objects.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Value::Str(s) => Some(s.clone()),
            Value::Num(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Ref(path) => Some(path.join(".")),
            Value::List(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Str(s) => Json::String(s.clone()),
            Value::Num(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::Bool(b) => Json::Bool(*b),
            Value::Ref(path) => Json::String(path.join(".")),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json());
                }
                Json::Object(out)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_scalar_string() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

/// One top-level block: `kind "label" ... { attrs }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub attrs: BTreeMap<String, Value>,
    pub file: PathBuf,
    pub line: usize,
}

impl Block {
    /// The first label, which names the block.
    pub fn name(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(Value::as_str)
    }

    pub fn num_attr(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(Value::as_f64)
    }

    /// Directory holding the declaring file; relative paths resolve here.
    pub fn dir(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new("."))
    }
}
