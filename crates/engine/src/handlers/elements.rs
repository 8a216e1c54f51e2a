//! Multi-element primitives: `findElements`, `countElements`, `clickNth`,
//! `readNth`.

use tapkit_driver::{ElementRef, UiElement};
use tapkit_types::{ScriptValue, Step, StepError};
use tracing::info;

use crate::context::ExecCtx;
use crate::selector::resolve_many;
use crate::state::ElementSnapshot;

use super::{result_key, selector_of};

fn resolve_all(step: &Step, cx: &mut ExecCtx<'_>) -> Result<Vec<ElementRef>, StepError> {
    let (selector, kind) = selector_of(step)?;
    let limit = step.usize_arg("limit").unwrap_or(0);
    let app = cx.app();
    Ok(resolve_many(app.as_ref(), &selector, kind, limit))
}

/// Refreshes the element cache and writes the descriptor list plus its count.
pub fn find_elements(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = step.result_key.clone().unwrap_or_else(|| "elements".to_string());
    let found = resolve_all(step, cx)?;

    let snapshots: Vec<ElementSnapshot> = found
        .iter()
        .enumerate()
        .map(|(index, element)| ElementSnapshot::capture(index, element.as_ref()))
        .collect();
    let records: Vec<ScriptValue> = snapshots.iter().map(ElementSnapshot::to_record).collect();
    let count = snapshots.len();

    info!(key = %key, count, "element cache refreshed");
    cx.state.elements = snapshots;
    cx.state.set_variable(&key, ScriptValue::List(records));
    cx.record(&format!("{key}_count"), ScriptValue::Number(count as f64));
    Ok(())
}

pub fn count_elements(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = step.result_key.clone().unwrap_or_else(|| "count".to_string());
    let found = resolve_all(step, cx)?;
    cx.record(&key, ScriptValue::Number(found.len() as f64));
    Ok(())
}

fn nth(step: &Step, cx: &mut ExecCtx<'_>) -> Result<ElementRef, StepError> {
    let index = step.require_usize("index")?;
    let mut found = resolve_all(step, cx)?;
    if index >= found.len() {
        return Err(StepError::NotFound(format!(
            "index {} is out of bounds ({} matching elements)",
            index,
            found.len()
        )));
    }
    Ok(found.swap_remove(index))
}

pub fn click_nth(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let element = nth(step, cx)?;
    if !element.is_hittable() {
        return Err(StepError::NotInteractable(format!(
            "element at index {} is not hittable",
            step.usize_arg("index").unwrap_or(0)
        )));
    }
    element.tap().map_err(StepError::from_host)
}

pub fn read_nth(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = result_key(step)?;
    let attribute = step.str_arg("attribute").unwrap_or_else(|| "label".to_string());
    let element = nth(step, cx)?;
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

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use serde_json::json;
    use tapkit_driver::sim::{SimElement, SimulatedDriver, TapEffect};
    use tapkit_driver::{ElementType, Rect};
    use tapkit_types::{ScriptValue, StepError};

    const APP: &str = "com.example.app";

    fn scene_with_rows(count: usize) -> SimulatedDriver {
        let driver = SimulatedDriver::new();
        for i in 0..count {
            driver.add_element(
                APP,
                SimElement::new(ElementType::Cell, "row")
                    .label(format!("Row {i}"))
                    .frame(Rect::new(0.0, 100.0 * i as f64, 320.0, 90.0)),
            );
        }
        driver
    }

    #[test]
    fn find_elements_caches_descriptors_and_writes_count() {
        let mut harness = Harness::new(scene_with_rows(3)).targeting(APP);
        harness.run(json!({"action": "findElements", "selector": "row"})).expect("find");

        assert_eq!(harness.state.elements.len(), 3);
        assert_eq!(harness.result("elements_count"), Some("3"));
        let Some(ScriptValue::List(items)) = harness.state.variable("elements") else {
            panic!("element cache variable missing");
        };
        assert_eq!(items.len(), 3);
        let ScriptValue::Record(first) = &items[0] else {
            panic!("descriptor is a record");
        };
        assert_eq!(first.get("label"), Some(&ScriptValue::Str("Row 0".into())));
        assert_eq!(first.get("index"), Some(&ScriptValue::Number(0.0)));
        assert_eq!(first.get("isHittable"), Some(&ScriptValue::Bool(true)));
    }

    #[test]
    fn find_elements_respects_the_limit() {
        let mut harness = Harness::new(scene_with_rows(5)).targeting(APP);
        harness
            .run(json!({"action": "findElements", "selector": "row", "limit": 2, "as": "rows"}))
            .expect("find");
        assert_eq!(harness.result("rows_count"), Some("2"));
    }

    #[test]
    fn count_elements_reports_zero_for_no_matches() {
        let mut harness = Harness::new(scene_with_rows(2)).targeting(APP);
        harness
            .run(json!({"action": "countElements", "selector": "nothing", "as": "n"}))
            .expect("count");
        assert_eq!(harness.result("n"), Some("0"));
    }

    #[test]
    fn click_nth_taps_by_natural_order() {
        let driver = SimulatedDriver::new();
        for i in 0..2 {
            driver.add_element(
                APP,
                SimElement::new(ElementType::Cell, "row")
                    .label(format!("Row {i}"))
                    .on_tap(TapEffect::SetValue {
                        target: "row".into(),
                        value: format!("tapped {i}"),
                    }),
            );
        }
        let mut harness = Harness::new(driver.clone()).targeting(APP);
        harness.run(json!({"action": "clickNth", "selector": "row", "index": 1})).expect("click");
        assert_eq!(driver.element_value(APP, "row").as_deref(), Some("tapped 1"));
    }

    #[test]
    fn nth_out_of_bounds_is_not_found() {
        let mut harness = Harness::new(scene_with_rows(1)).targeting(APP);
        let err = harness
            .run(json!({"action": "clickNth", "selector": "row", "index": 4}))
            .unwrap_err();
        assert!(matches!(err, StepError::NotFound(_)));
    }

    #[test]
    fn read_nth_reads_the_requested_attribute() {
        let mut harness = Harness::new(scene_with_rows(3)).targeting(APP);
        harness
            .run(json!({"action": "readNth", "selector": "row", "index": 2, "as": "third"}))
            .expect("read");
        assert_eq!(harness.result("third"), Some("Row 2"));
    }
}
