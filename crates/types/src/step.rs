//! The step record and its typed argument accessors.
//!
//! A step is a keyed record decoded from JSON. The universal fields (`action`,
//! `optional`, `timeout`, `id`, `as`) are lifted into struct fields; every
//! action-specific key stays in the flattened [`Step::args`] map and is read
//! through the accessors below, which produce
//! [`StepError::InvalidArgument`](crate::StepError::InvalidArgument) for
//! missing required fields so handlers never unwrap raw JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StepError;

/// Argument keys that carry nested step sequences rather than plain values.
///
/// The interpolator must leave these subtrees untouched: sub-steps are
/// interpolated at their own dispatch time, so loop variables such as
/// `_iteration` or spread item fields resolve per iteration.
pub const NESTED_STEP_KEYS: [&str; 7] = ["then", "else", "do", "try", "catch", "finally", "steps"];

/// One element of a script: an action name plus its arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Action name routing this step to a primitive handler. Decodes to an
    /// empty string when absent; the dispatcher rejects that case.
    #[serde(default)]
    pub action: String,

    /// When true, this step's failure is logged but never fails the script.
    #[serde(default)]
    pub optional: bool,

    /// Per-step timeout in seconds; each action supplies its own default.
    #[serde(default)]
    pub timeout: Option<f64>,

    /// Optional identifier echoed in step events and failure reports.
    #[serde(default)]
    pub id: Option<String>,

    /// Result key for primitives that produce output.
    #[serde(default, rename = "as")]
    pub result_key: Option<String>,

    /// All remaining action-specific arguments.
    #[serde(flatten)]
    pub args: serde_json::Map<String, Value>,
}

impl Step {
    /// Convenience constructor used by tests and the control-flow engine.
    pub fn new(action: impl Into<String>) -> Self {
        Step {
            action: action.into(),
            ..Default::default()
        }
    }

    /// Raw argument lookup.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// String argument; numbers and booleans render through their JSON form.
    pub fn str_arg(&self, key: &str) -> Option<String> {
        match self.args.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Required string argument.
    pub fn require_str(&self, key: &str) -> Result<String, StepError> {
        self.str_arg(key)
            .ok_or_else(|| StepError::InvalidArgument(format!("'{}' requires a '{}' argument", self.action, key)))
    }

    /// First present key out of a list of aliases, as a string.
    pub fn str_arg_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.str_arg(key))
    }

    /// Numeric argument; accepts JSON numbers and numeric strings, since
    /// interpolation turns `${n}` references into strings.
    pub fn f64_arg(&self, key: &str) -> Option<f64> {
        match self.args.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Required numeric argument.
    pub fn require_f64(&self, key: &str) -> Result<f64, StepError> {
        self.f64_arg(key)
            .ok_or_else(|| StepError::InvalidArgument(format!("'{}' requires a numeric '{}' argument", self.action, key)))
    }

    /// Non-negative integer argument.
    pub fn usize_arg(&self, key: &str) -> Option<usize> {
        let n = self.f64_arg(key)?;
        if n.is_finite() && n >= 0.0 { Some(n as usize) } else { None }
    }

    /// Required non-negative integer argument.
    pub fn require_usize(&self, key: &str) -> Result<usize, StepError> {
        self.usize_arg(key)
            .ok_or_else(|| StepError::InvalidArgument(format!("'{}' requires an integer '{}' argument", self.action, key)))
    }

    /// Boolean argument; accepts JSON booleans and `"true"`/`"false"` strings.
    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        match self.args.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Array-of-strings argument, with scalar coercion per element.
    pub fn string_list_arg(&self, key: &str) -> Vec<String> {
        match self.args.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Nested step sequence (`then`, `do`, `catch`, ...). Absent keys decode
    /// to an empty sequence; a present key must be an array of objects.
    pub fn steps_arg(&self, key: &str) -> Result<Vec<Step>, StepError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    serde_json::from_value(item.clone())
                        .map_err(|_| StepError::InvalidArgument(format!("'{}.{}' entries must be step objects", self.action, key)))
                })
                .collect(),
            Some(_) => Err(StepError::InvalidArgument(format!(
                "'{}' expects '{}' to be an array of steps",
                self.action, key
            ))),
        }
    }

    /// Effective timeout for this step, falling back to the action default.
    pub fn timeout_or(&self, default_secs: f64) -> Duration {
        let secs = self.timeout.unwrap_or(default_secs).max(0.0);
        Duration::from_secs_f64(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Step {
        serde_json::from_value(value).expect("step decodes")
    }

    #[test]
    fn universal_fields_are_lifted_and_extras_are_flattened() {
        let step = decode(json!({
            "action": "click",
            "optional": true,
            "timeout": 2.5,
            "id": "tap-go",
            "as": "out",
            "selector": "Go",
            "selectorType": "label"
        }));

        assert_eq!(step.action, "click");
        assert!(step.optional);
        assert_eq!(step.timeout, Some(2.5));
        assert_eq!(step.id.as_deref(), Some("tap-go"));
        assert_eq!(step.result_key.as_deref(), Some("out"));
        assert_eq!(step.str_arg("selector").as_deref(), Some("Go"));
        assert_eq!(step.str_arg("selectorType").as_deref(), Some("label"));
    }

    #[test]
    fn missing_action_decodes_to_an_empty_string() {
        let step = decode(json!({"selector": "Go"}));
        assert!(step.action.is_empty());
    }

    #[test]
    fn numeric_arguments_accept_numbers_and_numeric_strings() {
        let step = decode(json!({"action": "math", "a": 3, "b": "4.5"}));
        assert_eq!(step.f64_arg("a"), Some(3.0));
        assert_eq!(step.f64_arg("b"), Some(4.5));
        assert_eq!(step.f64_arg("c"), None);
    }

    #[test]
    fn require_str_names_the_action_and_argument() {
        let step = decode(json!({"action": "launch"}));
        let err = step.require_str("bundleId").unwrap_err();
        assert_eq!(err.to_string(), "'launch' requires a 'bundleId' argument");
    }

    #[test]
    fn nested_step_sequences_decode_on_demand() {
        let step = decode(json!({
            "action": "if",
            "condition": "true",
            "then": [{"action": "log", "message": "hi"}],
        }));

        let then = step.steps_arg("then").expect("then decodes");
        assert_eq!(then.len(), 1);
        assert_eq!(then[0].action, "log");
        assert!(step.steps_arg("else").expect("absent else is empty").is_empty());
    }

    #[test]
    fn non_array_nested_sequence_is_an_invalid_argument() {
        let step = decode(json!({"action": "if", "then": "not-steps"}));
        assert!(step.steps_arg("then").is_err());
    }

    #[test]
    fn timeout_falls_back_to_the_action_default() {
        let step = decode(json!({"action": "wait"}));
        assert_eq!(step.timeout_or(10.0), Duration::from_secs(10));

        let step = decode(json!({"action": "wait", "timeout": 0.5}));
        assert_eq!(step.timeout_or(10.0), Duration::from_millis(500));
    }
}
