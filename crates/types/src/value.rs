//! Tagged value model for the variables map.
//!
//! The variables side of the value store is heterogeneous but typed; the
//! results side is always strings. [`ScriptValue::coerce_string`] is the single
//! canonical coercion between the two, so a mirrored write can never drift
//! from its typed source.

use indexmap::IndexMap;
use serde_json::Value;

/// A typed value held in the per-execution variables map.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Plain text.
    Str(String),
    /// All numerics are f64; display uses the shortest round-trip form.
    Number(f64),
    /// Boolean, coerced to `"true"`/`"false"`.
    Bool(bool),
    /// Parsed date as UTC epoch seconds.
    Date(i64),
    /// Ordered sequence, e.g. the element cache written by `findElements`.
    List(Vec<ScriptValue>),
    /// Keyed record, e.g. one element descriptor or a rect.
    Record(IndexMap<String, ScriptValue>),
}

impl ScriptValue {
    /// Canonical string coercion used at the results boundary.
    ///
    /// Numbers print in Rust's shortest round-trip form (`12.0` becomes
    /// `"12"`), booleans are `"true"`/`"false"`, and compound values render as
    /// compact JSON.
    pub fn coerce_string(&self) -> String {
        match self {
            ScriptValue::Str(s) => s.clone(),
            ScriptValue::Number(n) => n.to_string(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Date(ts) => ts.to_string(),
            ScriptValue::List(_) | ScriptValue::Record(_) => self.to_json().to_string(),
        }
    }

    /// True when the value is a scalar whose coercion loses nothing.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ScriptValue::List(_) | ScriptValue::Record(_))
    }

    /// Numeric view: numbers directly, numeric strings parsed, booleans as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::Str(s) => s.trim().parse().ok(),
            ScriptValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ScriptValue::Date(ts) => Some(*ts as f64),
            _ => None,
        }
    }

    /// Truthiness used by `true`/`false` conditions: booleans are themselves,
    /// numbers are non-zero, strings recognize `"true"`/`"false"` and fall
    /// back to non-emptiness, compounds are non-empty.
    pub fn truthy(&self) -> bool {
        match self {
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0,
            ScriptValue::Str(s) => match s.as_str() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                _ => true,
            },
            ScriptValue::Date(_) => true,
            ScriptValue::List(items) => !items.is_empty(),
            ScriptValue::Record(fields) => !fields.is_empty(),
        }
    }

    /// Decodes an arbitrary JSON value, e.g. initial request variables.
    pub fn from_json(value: &Value) -> ScriptValue {
        match value {
            Value::Null => ScriptValue::Str(String::new()),
            Value::Bool(b) => ScriptValue::Bool(*b),
            Value::Number(n) => ScriptValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => ScriptValue::Str(s.clone()),
            Value::Array(items) => ScriptValue::List(items.iter().map(ScriptValue::from_json).collect()),
            Value::Object(map) => {
                let fields = map.iter().map(|(k, v)| (k.clone(), ScriptValue::from_json(v))).collect();
                ScriptValue::Record(fields)
            }
        }
    }

    /// JSON form used by the terminal report's `variables` map.
    pub fn to_json(&self) -> Value {
        match self {
            ScriptValue::Str(s) => Value::String(s.clone()),
            ScriptValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ScriptValue::Bool(b) => Value::Bool(*b),
            ScriptValue::Date(ts) => Value::Number((*ts).into()),
            ScriptValue::List(items) => Value::Array(items.iter().map(ScriptValue::to_json).collect()),
            ScriptValue::Record(fields) => {
                let map = fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                Value::Object(map)
            }
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::Str(s.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        ScriptValue::Str(s)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}
