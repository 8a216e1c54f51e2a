//! Single-element primitives sharing the `{selector, selectorType, timeout}`
//! argument shape.

use tapkit_driver::UiElement;
use tapkit_types::{ScriptValue, Step, StepError};
use tracing::{debug, info};

use crate::context::ExecCtx;
use crate::selector::{await_element, await_gone};

use super::{DEFAULT_TIMEOUT_SECS, result_key, selector_of};

pub fn click(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), true)?;
    element.tap().map_err(StepError::from_host)?;
    info!(selector = %selector, "element clicked");
    Ok(())
}

pub fn wait(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
    Ok(())
}

/// Observation only: waiting out the timeout is not a failure.
pub fn wait_disappear(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    let gone = await_gone(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS));
    debug!(selector = %selector, gone, "waitDisappear finished");
    Ok(())
}

pub fn read(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let key = result_key(step)?;
    let attribute = step.str_arg("attribute").unwrap_or_else(|| "label".to_string());

    let app = cx.app();
    let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
    let text = match attribute.as_str() {
        "label" => element.label(),
        "value" => element.value(),
        "identifier" => element.identifier(),
        "placeholderValue" => element.placeholder_value(),
        other => {
            return Err(StepError::InvalidArgument(format!("unknown attribute '{other}'")));
        }
    };
    cx.record(&key, ScriptValue::Str(text));
    Ok(())
}

/// Never fails: writes `"true"`/`"false"` after an immediate probe (or a
/// deadline loop when a timeout is given).
pub fn exists(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let key = result_key(step)?;
    let app = cx.app();
    let found = await_element(app.as_ref(), &selector, kind, step.timeout_or(0.0), false).is_ok();
    cx.record(&key, ScriptValue::Bool(found));
    Ok(())
}

pub fn get_rect(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let key = result_key(step)?;
    let app = cx.app();
    let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
    cx.state.set_rect(&key, element.frame());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use serde_json::json;
    use tapkit_driver::sim::{SimElement, SimulatedDriver, TapEffect};
    use tapkit_driver::{ElementType, Rect};
    use tapkit_types::{StepError, StepEvent};

    const APP: &str = "com.example.app";

    fn scene() -> SimulatedDriver {
        let driver = SimulatedDriver::new();
        driver.add_element(
            APP,
            SimElement::button("Go").frame(Rect::new(20.0, 100.0, 80.0, 44.0)).on_tap(TapEffect::SetLabel {
                target: "Status".into(),
                label: "OK".into(),
            }),
        );
        driver.add_element(APP, SimElement::text("Status", "Idle").frame(Rect::new(20.0, 160.0, 200.0, 30.0)));
        driver.add_element(APP, SimElement::button("Covered").not_hittable());
        driver
    }

    #[test]
    fn click_taps_a_hittable_element() {
        let driver = scene();
        let mut harness = Harness::new(driver.clone()).targeting(APP);
        harness.run(json!({"action": "click", "selector": "Go"})).expect("click");
        assert_eq!(driver.element_label(APP, "Status").as_deref(), Some("OK"));
    }

    #[test]
    fn tap_is_an_alias_for_click() {
        let driver = scene();
        let mut harness = Harness::new(driver.clone()).targeting(APP);
        harness.run(json!({"action": "tap", "selector": "Go"})).expect("tap");
        assert_eq!(driver.element_label(APP, "Status").as_deref(), Some("OK"));
    }

    #[test]
    fn click_on_an_unhittable_element_is_not_interactable() {
        let mut harness = Harness::new(scene()).targeting(APP);
        let err = harness
            .run(json!({"action": "click", "selector": "Covered", "timeout": 0}))
            .unwrap_err();
        assert!(matches!(err, StepError::NotInteractable(_)));
    }

    #[test]
    fn wait_fails_with_not_found_after_the_timeout() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness.run(json!({"action": "wait", "selector": "Go", "timeout": 0})).expect("wait");
        let err = harness
            .run(json!({"action": "wait", "selector": "Ghost", "timeout": 0}))
            .unwrap_err();
        assert!(matches!(err, StepError::NotFound(_)));
    }

    #[test]
    fn wait_disappear_succeeds_even_when_the_element_stays() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness
            .run(json!({"action": "waitDisappear", "selector": "Go", "timeout": 0}))
            .expect("observation only");
    }

    #[test]
    fn read_defaults_to_the_label_attribute() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness
            .run(json!({"action": "read", "selector": "Status", "as": "st"}))
            .expect("read");
        assert_eq!(harness.result("st"), Some("Idle"));
        assert!(
            harness
                .sink
                .events
                .iter()
                .any(|event| matches!(event, StepEvent::Result { key, value, .. } if key == "st" && value == "Idle"))
        );
    }

    #[test]
    fn read_of_an_unknown_attribute_is_rejected() {
        let mut harness = Harness::new(scene()).targeting(APP);
        let err = harness
            .run(json!({"action": "read", "selector": "Status", "attribute": "frame", "as": "x"}))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument(_)));
    }

    #[test]
    fn exists_writes_a_boolean_and_never_fails() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness.run(json!({"action": "exists", "selector": "Go", "as": "there"})).expect("exists");
        assert_eq!(harness.result("there"), Some("true"));
        harness
            .run(json!({"action": "exists", "selector": "Ghost", "as": "there"}))
            .expect("exists");
        assert_eq!(harness.result("there"), Some("false"));
    }

    #[test]
    fn get_rect_writes_sibling_component_keys() {
        let mut harness = Harness::new(scene()).targeting(APP);
        harness.run(json!({"action": "getRect", "selector": "Go", "as": "r"})).expect("getRect");
        assert_eq!(harness.result("r_x"), Some("20"));
        assert_eq!(harness.result("r_centerX"), Some("60"));
        assert_eq!(harness.result("r_height"), Some("44"));
    }

    #[test]
    fn selector_type_label_narrows_matching() {
        let driver = SimulatedDriver::new();
        driver.add_element(APP, SimElement::new(ElementType::StaticText, "greeting").label("Hello there"));
        let mut harness = Harness::new(driver).targeting(APP);
        harness
            .run(json!({"action": "wait", "selector": "Hello there", "selectorType": "label", "timeout": 0}))
            .expect("label match");
        let err = harness
            .run(json!({"action": "wait", "selector": "Hello", "selectorType": "label", "timeout": 0}))
            .unwrap_err();
        assert!(matches!(err, StepError::NotFound(_)));
        harness
            .run(json!({"action": "wait", "selector": "Hello", "selectorType": "labelContains", "timeout": 0}))
            .expect("contains match");
    }
}
