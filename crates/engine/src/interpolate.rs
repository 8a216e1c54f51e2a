//! `${name}` interpolation over step argument trees.
//!
//! Interpolation happens exactly once per step, at dispatch entry: strings are
//! scanned left to right, each `${name}` is replaced by the variable (or
//! result) of that name coerced to a string, and missing names substitute
//! empty. Sequences and records recurse; other scalars pass through.
//!
//! The reserved nested-sequence keys (`then`, `do`, `catch`, ...) are left
//! untouched — sub-steps interpolate at their own dispatch time, so loop
//! variables and spread item fields resolve per iteration rather than being
//! frozen when the enclosing step is dispatched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use tapkit_types::Step;
use tapkit_types::step::NESTED_STEP_KEYS;

use crate::state::RunState;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid interpolation pattern"));

/// Substitutes every `${name}` reference in one string.
pub fn interpolate_string(input: &str, state: &RunState) -> String {
    NAME_PATTERN
        .replace_all(input, |caps: &Captures<'_>| state.lookup_text(&caps[1]).unwrap_or_default())
        .into_owned()
}

/// Recursively interpolates a JSON value.
pub fn interpolate_value(value: &Value, state: &RunState) -> Value {
    match value {
        Value::String(text) => Value::String(interpolate_string(text, state)),
        Value::Array(items) => Value::Array(items.iter().map(|item| interpolate_value(item, state)).collect()),
        Value::Object(map) => {
            let mut interpolated = serde_json::Map::new();
            for (key, entry) in map {
                interpolated.insert(key.clone(), interpolate_value(entry, state));
            }
            Value::Object(interpolated)
        }
        _ => value.clone(),
    }
}

/// Produces the resolved step a handler sees: every argument interpolated
/// except nested sub-step sequences.
pub fn resolve_step(step: &Step, state: &RunState) -> Step {
    let mut resolved = step.clone();
    for (key, value) in &step.args {
        if NESTED_STEP_KEYS.contains(&key.as_str()) {
            continue;
        }
        resolved.args.insert(key.clone(), interpolate_value(value, state));
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tapkit_types::ScriptValue;

    fn state_with(pairs: &[(&str, ScriptValue)]) -> RunState {
        let mut state = RunState::default();
        for (name, value) in pairs {
            state.set_variable(name, value.clone());
        }
        state
    }

    #[test]
    fn replaces_references_with_coerced_values() {
        let state = state_with(&[("p", ScriptValue::Number(12.0)), ("who", ScriptValue::Str("you".into()))]);
        assert_eq!(interpolate_string("product=${p} for ${who}", &state), "product=12 for you");
    }

    #[test]
    fn missing_names_substitute_empty() {
        let state = RunState::default();
        assert_eq!(interpolate_string("a${missing}b", &state), "ab");
    }

    #[test]
    fn malformed_references_pass_through() {
        let state = state_with(&[("n", ScriptValue::Number(1.0))]);
        assert_eq!(interpolate_string("${n", &state), "${n");
        assert_eq!(interpolate_string("$n", &state), "$n");
    }

    #[test]
    fn falls_back_to_results_when_no_variable_exists() {
        let mut state = RunState::default();
        state.set_result("st", "OK".into());
        assert_eq!(interpolate_string("status=${st}", &state), "status=OK");
    }

    #[test]
    fn value_trees_interpolate_recursively() {
        let state = state_with(&[("name", ScriptValue::Str("demo".into()))]);
        let tree = json!({"outer": {"inner": "${name}"}, "list": ["${name}", 7]});
        let resolved = interpolate_value(&tree, &state);
        assert_eq!(resolved["outer"]["inner"], "demo");
        assert_eq!(resolved["list"][0], "demo");
        assert_eq!(resolved["list"][1], 7);
    }

    #[test]
    fn resolve_step_skips_nested_step_sequences() {
        let state = state_with(&[("item_label", ScriptValue::Str("Row 1".into()))]);
        let step: Step = serde_json::from_value(json!({
            "action": "forEach",
            "items": "elements",
            "note": "${item_label}",
            "do": [{"action": "log", "message": "${item_label}"}],
        }))
        .expect("step decodes");

        let resolved = resolve_step(&step, &state);
        assert_eq!(resolved.str_arg("note").as_deref(), Some("Row 1"));
        // The body is untouched: it interpolates per iteration, not up front.
        assert_eq!(resolved.args["do"][0]["message"], "${item_label}");
    }
}
