//! Coordinate and gesture primitives.
//!
//! Coordinates accept `xVar`/`yVar` variable references as alternatives to
//! literal values, so loops can tap positions computed by earlier steps.

use std::time::Duration;

use tapkit_driver::{Point, UiDriver, UiElement};
use tapkit_types::{Step, StepError};
use tracing::debug;

use crate::context::ExecCtx;
use crate::selector::await_element;

use super::{DEFAULT_TIMEOUT_SECS, coordinate, selector_of};

const SWIPE_DURATION: f64 = 0.3;
/// Fraction of the element frame a directional swipe travels.
const SWIPE_SPAN: f64 = 0.4;

pub fn tap_xy(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let point = point_of(step, cx)?;
    cx.driver.tap_at(point).map_err(StepError::from_host)
}

pub fn double_tap_xy(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let point = point_of(step, cx)?;
    cx.driver.double_tap_at(point).map_err(StepError::from_host)
}

pub fn long_press_xy(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let point = point_of(step, cx)?;
    let duration = Duration::from_secs_f64(step.f64_arg("duration").unwrap_or(1.0).max(0.0));
    cx.driver.press_at(point, duration).map_err(StepError::from_host)
}

pub fn swipe(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let from = point_of(step, cx)?;
    let to = Point::new(
        coordinate(step, cx.state, "toX", "toXVar")?,
        coordinate(step, cx.state, "toY", "toYVar")?,
    );
    let duration = Duration::from_secs_f64(step.f64_arg("duration").unwrap_or(SWIPE_DURATION).max(0.0));
    cx.driver.press_drag(from, to, duration).map_err(StepError::from_host)
}

pub fn swipe_element(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let direction = step.require_str("direction")?;
    let app = cx.app();
    let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
    let frame = element.frame();
    let from = frame.center();
    let to = match direction.as_str() {
        "up" => from.offset(0.0, -frame.height * SWIPE_SPAN),
        "down" => from.offset(0.0, frame.height * SWIPE_SPAN),
        "left" => from.offset(-frame.width * SWIPE_SPAN, 0.0),
        "right" => from.offset(frame.width * SWIPE_SPAN, 0.0),
        other => {
            return Err(StepError::InvalidArgument(format!("unknown swipe direction '{other}'")));
        }
    };
    debug!(selector = %selector, direction = %direction, "swiping element");
    cx.driver
        .press_drag(from, to, Duration::from_secs_f64(SWIPE_DURATION))
        .map_err(StepError::from_host)
}

/// Scrolls content by press-then-drag from the center of the selector (or the
/// screen). The finger moves opposite to the scroll direction: scrolling down
/// drags upward.
pub fn scroll(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let direction = step.require_str("direction")?;
    let distance = step.f64_arg("distance").unwrap_or(200.0);

    let from = match step.str_arg("selector") {
        Some(_) => {
            let (selector, kind) = selector_of(step)?;
            let app = cx.app();
            let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
            element.frame().center()
        }
        None => cx.driver.screen_size().center(),
    };

    let to = match direction.as_str() {
        "down" => from.offset(0.0, -distance),
        "up" => from.offset(0.0, distance),
        "left" => from.offset(distance, 0.0),
        "right" => from.offset(-distance, 0.0),
        other => {
            return Err(StepError::InvalidArgument(format!("unknown scroll direction '{other}'")));
        }
    };
    cx.driver
        .press_drag(from, to, Duration::from_secs_f64(SWIPE_DURATION))
        .map_err(StepError::from_host)
}

pub fn pinch(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let scale = step.f64_arg("scale").unwrap_or(1.0);
    let velocity = step.f64_arg("velocity").unwrap_or(1.0);
    let center = match step.str_arg("selector") {
        Some(_) => {
            let (selector, kind) = selector_of(step)?;
            let app = cx.app();
            let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), false)?;
            element.frame().center()
        }
        None => cx.driver.screen_size().center(),
    };
    cx.driver.pinch_at(center, scale, velocity).map_err(StepError::from_host)
}

fn point_of(step: &Step, cx: &ExecCtx<'_>) -> Result<Point, StepError> {
    Ok(Point::new(
        coordinate(step, cx.state, "x", "xVar")?,
        coordinate(step, cx.state, "y", "yVar")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testutil::Harness;
    use serde_json::json;
    use tapkit_driver::sim::{Gesture, SimElement, SimulatedDriver};
    use tapkit_driver::{Point, Rect};
    use tapkit_types::{ScriptValue, StepError};

    const APP: &str = "com.example.app";

    #[test]
    fn tap_xy_taps_the_literal_coordinates() {
        let driver = SimulatedDriver::new();
        let mut harness = Harness::new(driver.clone());
        harness.run(json!({"action": "tapXY", "x": 50, "y": 120})).expect("tap");
        assert_eq!(driver.recorded_gestures(), vec![Gesture::Tap(Point::new(50.0, 120.0))]);
    }

    #[test]
    fn coordinates_resolve_from_variables() {
        let driver = SimulatedDriver::new();
        let mut harness = Harness::new(driver.clone());
        harness.state.set_variable("px", ScriptValue::Number(33.0));
        harness.state.set_variable("py", ScriptValue::Number(44.0));
        harness
            .run(json!({"action": "tapXY", "xVar": "px", "yVar": "py"}))
            .expect("tap");
        assert_eq!(driver.recorded_gestures(), vec![Gesture::Tap(Point::new(33.0, 44.0))]);
    }

    #[test]
    fn missing_coordinates_are_an_invalid_argument() {
        let mut harness = Harness::new(SimulatedDriver::new());
        let err = harness.run(json!({"action": "tapXY", "x": 10})).unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument(_)));
    }

    #[test]
    fn swipe_drags_between_the_two_points() {
        let driver = SimulatedDriver::new();
        let mut harness = Harness::new(driver.clone());
        harness
            .run(json!({"action": "swipe", "x": 10, "y": 400, "toX": 10, "toY": 100}))
            .expect("swipe");
        let gestures = driver.recorded_gestures();
        assert!(matches!(gestures[0], Gesture::Drag(from, to, _) if from.y == 400.0 && to.y == 100.0));
    }

    #[test]
    fn swipe_element_moves_relative_to_the_frame() {
        let driver = SimulatedDriver::new();
        driver.add_element(APP, SimElement::button("List").frame(Rect::new(0.0, 0.0, 100.0, 200.0)));
        let mut harness = Harness::new(driver.clone()).targeting(APP);
        harness
            .run(json!({"action": "swipeElement", "selector": "List", "direction": "up"}))
            .expect("swipe");
        let gestures = driver.recorded_gestures();
        assert!(matches!(gestures[0], Gesture::Drag(from, to, _) if to.y < from.y));
    }

    #[test]
    fn scroll_down_drags_the_finger_upward() {
        let driver = SimulatedDriver::new();
        let mut harness = Harness::new(driver.clone());
        harness
            .run(json!({"action": "scroll", "direction": "down", "distance": 150}))
            .expect("scroll");
        let gestures = driver.recorded_gestures();
        assert!(matches!(gestures[0], Gesture::Drag(from, to, _) if (from.y - to.y) == 150.0));
    }

    #[test]
    fn unknown_directions_are_rejected() {
        let mut harness = Harness::new(SimulatedDriver::new());
        let err = harness
            .run(json!({"action": "scroll", "direction": "sideways"}))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidArgument(_)));
    }

    #[test]
    fn pinch_defaults_to_the_screen_center() {
        let driver = SimulatedDriver::new();
        let mut harness = Harness::new(driver.clone());
        harness.run(json!({"action": "pinch", "scale": 2.0})).expect("pinch");
        let gestures = driver.recorded_gestures();
        assert!(matches!(gestures[0], Gesture::Pinch(center, scale, _) if scale == 2.0 && center.x == 195.0));
    }
}
