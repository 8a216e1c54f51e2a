//! Selector resolution against the live UI.
//!
//! The resolver itself never waits; [`await_element`] is the deadline loop
//! callers layer on top. For accessibility-id lookups the fixed typed probe
//! order is the performance contract: the cheap typed queries run before the
//! expensive match-any-descendant fallback.

use std::thread;
use std::time::{Duration, Instant};

use tapkit_driver::predicate::{Attribute, Comparison};
use tapkit_driver::{AppHandle, ElementRef, ElementType, Predicate, SelectorKind, UiElement};
use tapkit_types::StepError;
use tracing::trace;

/// Polling interval for element deadline loops.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Resolves the first matching element, or `None`.
pub fn resolve_one(app: &dyn AppHandle, selector: &str, kind: SelectorKind) -> Option<ElementRef> {
    resolve_many(app, selector, kind, 1).into_iter().next()
}

/// Resolves matching elements in the driver's natural order, truncated to
/// `limit` (0 means unlimited).
pub fn resolve_many(app: &dyn AppHandle, selector: &str, kind: SelectorKind, limit: usize) -> Vec<ElementRef> {
    match kind {
        SelectorKind::AccessibilityId | SelectorKind::Id => {
            let predicate = Predicate::id_or_label(selector);
            for element_type in ElementType::PROBE_ORDER {
                let found = app.query_type(element_type, Some(&predicate), limit);
                if !found.is_empty() {
                    trace!(selector, ?element_type, count = found.len(), "typed probe matched");
                    return found;
                }
            }
            app.query_descendants(&predicate, limit)
        }
        SelectorKind::ClassChain => app.query_class_chain(selector, limit == 1),
        SelectorKind::Predicate => match Predicate::parse(selector) {
            Ok(predicate) => app.query_descendants(&predicate, limit),
            // A malformed predicate resolves to nothing, not an error.
            Err(_) => Vec::new(),
        },
        SelectorKind::Label => query_attribute(app, Attribute::Label, Comparison::Equals, selector, limit),
        SelectorKind::LabelContains => query_attribute(app, Attribute::Label, Comparison::Contains, selector, limit),
        SelectorKind::Value => query_attribute(app, Attribute::Value, Comparison::Equals, selector, limit),
        SelectorKind::ValueContains => query_attribute(app, Attribute::Value, Comparison::Contains, selector, limit),
    }
}

fn query_attribute(app: &dyn AppHandle, attribute: Attribute, comparison: Comparison, literal: &str, limit: usize) -> Vec<ElementRef> {
    let predicate = Predicate::attribute(attribute, comparison, literal);
    app.query_descendants(&predicate, limit)
}

/// Deadline loop over [`resolve_one`]. With `require_hittable`, an element
/// that exists but never becomes hittable is reported as `NotInteractable`
/// rather than `NotFound`. A zero timeout means exactly one probe.
pub fn await_element(
    app: &dyn AppHandle,
    selector: &str,
    kind: SelectorKind,
    timeout: Duration,
    require_hittable: bool,
) -> Result<ElementRef, StepError> {
    let deadline = Instant::now() + timeout;
    let mut saw_unhittable = false;

    loop {
        if let Some(element) = resolve_one(app, selector, kind) {
            if !require_hittable || element.is_hittable() {
                return Ok(element);
            }
            saw_unhittable = true;
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    if saw_unhittable {
        Err(StepError::NotInteractable(format!(
            "element '{selector}' exists but is not hittable"
        )))
    } else {
        Err(StepError::NotFound(format!(
            "element '{selector}' not found within {:.1}s",
            timeout.as_secs_f64()
        )))
    }
}

/// Deadline loop that succeeds when the selector stops matching. Observation
/// only: returns normally even when the element is still present at timeout.
pub fn await_gone(app: &dyn AppHandle, selector: &str, kind: SelectorKind, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if resolve_one(app, selector, kind).is_none() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapkit_driver::sim::{SimElement, SimulatedDriver};
    use tapkit_driver::{Rect, UiDriver};

    const APP: &str = "com.example.app";

    fn driver_with(elements: Vec<SimElement>) -> SimulatedDriver {
        let driver = SimulatedDriver::new();
        for element in elements {
            driver.add_element(APP, element);
        }
        driver
    }

    #[test]
    fn typed_probe_order_prefers_buttons_over_images() {
        let driver = driver_with(vec![
            SimElement::new(ElementType::Image, "logo").label("Go"),
            SimElement::button("Go"),
        ]);
        let app = driver.app_by_bundle(APP);
        let found = resolve_one(app.as_ref(), "Go", SelectorKind::AccessibilityId).expect("match");
        assert_eq!(found.identifier(), "Go");
        // The button wins even though the image appears first in the scene.
        let many = resolve_many(app.as_ref(), "Go", SelectorKind::AccessibilityId, 0);
        assert_eq!(many.len(), 1);
    }

    #[test]
    fn accessibility_id_falls_back_to_descendant_matching() {
        // An element of a type outside the probe list still resolves through
        // the generic predicate query.
        let driver = driver_with(vec![SimElement::new(ElementType::Any, "odd").label("odd")]);
        let app = driver.app_by_bundle(APP);
        assert!(resolve_one(app.as_ref(), "odd", SelectorKind::AccessibilityId).is_some());
    }

    #[test]
    fn label_contains_matches_substrings() {
        let driver = driver_with(vec![SimElement::text("t", "Sign In Now")]);
        let app = driver.app_by_bundle(APP);
        assert!(resolve_one(app.as_ref(), "Sign In", SelectorKind::LabelContains).is_some());
        assert!(resolve_one(app.as_ref(), "Sign In", SelectorKind::Label).is_none());
    }

    #[test]
    fn malformed_predicate_resolves_to_nothing() {
        let driver = driver_with(vec![SimElement::button("Go")]);
        let app = driver.app_by_bundle(APP);
        assert!(resolve_many(app.as_ref(), "label ~~ 'Go'", SelectorKind::Predicate, 0).is_empty());
    }

    #[test]
    fn await_element_distinguishes_missing_from_unhittable() {
        let driver = driver_with(vec![SimElement::button("Covered").not_hittable()]);
        let app = driver.app_by_bundle(APP);

        let missing = await_element(app.as_ref(), "Ghost", SelectorKind::AccessibilityId, Duration::ZERO, true);
        assert!(matches!(missing, Err(StepError::NotFound(_))));

        let covered = await_element(app.as_ref(), "Covered", SelectorKind::AccessibilityId, Duration::ZERO, true);
        assert!(matches!(covered, Err(StepError::NotInteractable(_))));

        let observed = await_element(app.as_ref(), "Covered", SelectorKind::AccessibilityId, Duration::ZERO, false);
        assert!(observed.is_ok());
    }

    #[test]
    fn await_gone_reports_whether_the_element_disappeared() {
        let driver = driver_with(vec![SimElement::button("Stays").frame(Rect::new(0.0, 0.0, 10.0, 10.0))]);
        let app = driver.app_by_bundle(APP);
        assert!(!await_gone(app.as_ref(), "Stays", SelectorKind::AccessibilityId, Duration::ZERO));
        assert!(await_gone(app.as_ref(), "NeverThere", SelectorKind::AccessibilityId, Duration::ZERO));
    }
}
