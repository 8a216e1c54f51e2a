//! Variable primitives: `set`, `getVar`, `increment`, `decrement`, `concat`.

use serde_json::Value;
use tapkit_types::{ScriptValue, Step, StepError};

use crate::context::ExecCtx;

use super::result_key;

pub fn set(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = step.require_str("key")?;
    let value = step
        .arg("value")
        .cloned()
        .ok_or_else(|| StepError::InvalidArgument("'set' requires a 'value' argument".into()))?;
    let target = step.str_arg("target").unwrap_or_else(|| "variables".to_string());

    match target.as_str() {
        "variables" => cx.record(&key, ScriptValue::from_json(&value)),
        "results" => {
            let text = ScriptValue::from_json(&value).coerce_string();
            cx.state.set_result(&key, text);
        }
        other => {
            return Err(StepError::InvalidArgument(format!("unknown set target '{other}'")));
        }
    }
    Ok(())
}

pub fn get_var(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = step.require_str("key")?;
    let out = result_key(step)?;
    let value = cx
        .state
        .variable(&key)
        .cloned()
        .or_else(|| cx.state.results.get(&key).map(|text| ScriptValue::Str(text.clone())))
        .unwrap_or_else(|| ScriptValue::Str(String::new()));
    cx.record(&out, value);
    Ok(())
}

fn adjust(step: &Step, cx: &mut ExecCtx<'_>, sign: f64) -> Result<(), StepError> {
    let key = step.require_str("key")?;
    let by = step.f64_arg("by").unwrap_or(1.0);
    let current = cx.state.numeric(&key).unwrap_or(0.0);
    cx.record(&key, ScriptValue::Number(current + sign * by));
    Ok(())
}

pub fn increment(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    adjust(step, cx, 1.0)
}

pub fn decrement(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    adjust(step, cx, -1.0)
}

/// Joins the (already interpolated) `values` list with a separator.
pub fn concat(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let out = result_key(step)?;
    let separator = step.str_arg("separator").unwrap_or_default();
    let Some(Value::Array(items)) = step.arg("values") else {
        return Err(StepError::InvalidArgument("'concat' requires a 'values' array".into()));
    };
    let joined = items
        .iter()
        .map(|item| ScriptValue::from_json(item).coerce_string())
        .collect::<Vec<_>>()
        .join(&separator);
    cx.record(&out, ScriptValue::Str(joined));
    Ok(())
}
