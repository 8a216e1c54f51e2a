//! The closed condition set evaluated by `if`, `while`, and `assert`.
//!
//! Conditions read current run state and, for the UI-facing predicates, the
//! live screen. Store comparisons are deliberately simple: `equals` and
//! friends compare the string results surface, `greaterThan`/`lessThan`
//! compare the typed variables side numerically.

use std::thread;
use std::time::{Duration, Instant};

use tapkit_driver::{UiDriver, UiElement};
use tapkit_types::{Step, StepError};
use tracing::trace;

use crate::context::ExecCtx;
use crate::handlers::selector_of;
use crate::selector::{self, POLL_INTERVAL};

/// OCR-backed conditions poll more slowly than element conditions.
pub const OCR_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Evaluates the step's `condition` argument against current state.
pub fn eval_condition(step: &Step, cx: &mut ExecCtx<'_>) -> Result<bool, StepError> {
    let condition = step.require_str("condition")?;
    let result = match condition.as_str() {
        "exists" => element_exists(step, cx, Duration::ZERO)?,
        "notExists" => !element_exists(step, cx, Duration::ZERO)?,
        "visible" => {
            let (selector, kind) = selector_of(step)?;
            let app = cx.app();
            selector::resolve_one(app.as_ref(), &selector, kind)
                .map(|element| element.is_hittable())
                .unwrap_or(false)
        }
        "waitExists" => element_exists(step, cx, step.timeout_or(10.0))?,
        "textVisible" => text_visible(step, cx)?,
        "textNotVisible" => !text_visible(step, cx)?,
        "equals" => compare_result_text(step, cx, |actual, expected| actual == expected)?,
        "notEquals" => compare_result_text(step, cx, |actual, expected| actual != expected)?,
        "contains" => compare_result_text(step, cx, |actual, expected| actual.contains(expected))?,
        "greaterThan" => compare_numeric(step, cx, |actual, expected| actual > expected)?,
        "lessThan" => compare_numeric(step, cx, |actual, expected| actual < expected)?,
        "true" => variable_truthy(step, cx)?,
        "false" => !variable_truthy(step, cx)?,
        other => {
            return Err(StepError::InvalidArgument(format!("unknown condition '{other}'")));
        }
    };
    trace!(condition = %condition, result, "condition evaluated");
    Ok(result)
}

fn element_exists(step: &Step, cx: &mut ExecCtx<'_>, timeout: Duration) -> Result<bool, StepError> {
    let (selector, kind) = selector_of(step)?;
    let deadline = Instant::now() + timeout;
    loop {
        let app = cx.app();
        if selector::resolve_one(app.as_ref(), &selector, kind).is_some() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn text_visible(step: &Step, cx: &mut ExecCtx<'_>) -> Result<bool, StepError> {
    let text = step.require_str("text")?;
    let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
    Ok(cx.vision.find_text(&shot.image, &text).is_some())
}

fn compare_result_text(step: &Step, cx: &mut ExecCtx<'_>, compare: impl Fn(&str, &str) -> bool) -> Result<bool, StepError> {
    let key = step.require_str("key")?;
    let expected = step.str_arg("value").unwrap_or_default();
    let actual = cx
        .state
        .results
        .get(&key)
        .cloned()
        .or_else(|| cx.state.lookup_text(&key))
        .unwrap_or_default();
    Ok(compare(&actual, &expected))
}

fn compare_numeric(step: &Step, cx: &mut ExecCtx<'_>, compare: impl Fn(f64, f64) -> bool) -> Result<bool, StepError> {
    let key = step.require_str("key")?;
    let expected = step.require_f64("value")?;
    let Some(actual) = cx.state.numeric(&key) else {
        return Ok(false);
    };
    Ok(compare(actual, expected))
}

fn variable_truthy(step: &Step, cx: &mut ExecCtx<'_>) -> Result<bool, StepError> {
    let key = step.require_str("key")?;
    Ok(cx.state.variable(&key).map(|value| value.truthy()).unwrap_or(false))
}
