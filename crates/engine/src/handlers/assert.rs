//! Assertion primitives. A failed assertion carries the script author's
//! `message` verbatim when one is given.

use tapkit_driver::UiElement;
use tapkit_types::{Step, StepError};

use crate::conditions::eval_condition;
use crate::context::ExecCtx;
use crate::selector::{await_element, resolve_one};

use super::{DEFAULT_TIMEOUT_SECS, selector_of};

fn failure(step: &Step, default_message: String) -> StepError {
    StepError::AssertionFailed(step.str_arg("message").unwrap_or(default_message))
}

pub fn assert_condition(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let holds = eval_condition(step, cx)?;
    if holds {
        return Ok(());
    }
    let condition = step.str_arg("condition").unwrap_or_default();
    Err(failure(step, format!("assertion '{condition}' failed")))
}

pub fn assert_exists(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    match await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false) {
        Ok(_) => Ok(()),
        Err(_) => Err(failure(step, format!("element '{selector}' does not exist"))),
    }
}

pub fn assert_not_exists(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    if resolve_one(app.as_ref(), &selector, kind).is_some() {
        return Err(failure(step, format!("element '{selector}' unexpectedly exists")));
    }
    Ok(())
}

/// Compares the element's label or value against `expected` (exact) or
/// `contains` (substring).
pub fn assert_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    let element = match await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false) {
        Ok(element) => element,
        Err(_) => return Err(failure(step, format!("element '{selector}' does not exist"))),
    };

    let label = element.label();
    let value = element.value();

    if let Some(expected) = step.str_arg("expected") {
        if label == expected || value == expected {
            return Ok(());
        }
        return Err(failure(
            step,
            format!("expected '{expected}' but found label '{label}' / value '{value}'"),
        ));
    }
    if let Some(fragment) = step.str_arg("contains") {
        if label.contains(&fragment) || value.contains(&fragment) {
            return Ok(());
        }
        return Err(failure(
            step,
            format!("expected text containing '{fragment}' but found label '{label}' / value '{value}'"),
        ));
    }
    Err(StepError::InvalidArgument(
        "'assertText' requires an 'expected' or 'contains' argument".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use serde_json::json;
    use tapkit_driver::sim::{SimElement, SimulatedDriver};
    use tapkit_types::StepError;

    const APP: &str = "com.example.app";

    fn scene() -> SimulatedDriver {
        let driver = SimulatedDriver::new();
        driver.add_element(APP, SimElement::text("Status", "Ready"));
        driver
    }

    #[test]
    fn assert_exists_fails_with_the_custom_message() {
        let mut harness = Harness::new(scene()).targeting(APP);
        let err = harness
            .run(json!({"action": "assertExists", "selector": "Ghost", "timeout": 0.2, "message": "no ghost"}))
            .unwrap_err();
        assert_eq!(err, StepError::AssertionFailed("no ghost".into()));

        harness
            .run(json!({"action": "assertExists", "selector": "Status", "timeout": 0}))
            .expect("exists");
    }

    #[test]
    fn assert_not_exists_checks_the_inverse() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness
            .run(json!({"action": "assertNotExists", "selector": "Ghost"}))
            .expect("absent");
        let err = harness
            .run(json!({"action": "assertNotExists", "selector": "Status"}))
            .unwrap_err();
        assert!(matches!(err, StepError::AssertionFailed(_)));
    }

    #[test]
    fn assert_text_accepts_exact_and_substring_matches() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness
            .run(json!({"action": "assertText", "selector": "Status", "expected": "Ready", "timeout": 0}))
            .expect("exact");
        harness
            .run(json!({"action": "assertText", "selector": "Status", "contains": "Rea", "timeout": 0}))
            .expect("substring");
        let err = harness
            .run(json!({"action": "assertText", "selector": "Status", "expected": "Done", "timeout": 0}))
            .unwrap_err();
        assert!(matches!(err, StepError::AssertionFailed(_)));
    }

    #[test]
    fn assert_evaluates_the_condition_set() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness.run(json!({"action": "set", "key": "n", "value": 5})).expect("set");
        harness
            .run(json!({"action": "assert", "condition": "greaterThan", "key": "n", "value": 3}))
            .expect("holds");
        let err = harness
            .run(json!({"action": "assert", "condition": "lessThan", "key": "n", "value": 3, "message": "too big"}))
            .unwrap_err();
        assert_eq!(err, StepError::AssertionFailed("too big".into()));
    }
}
