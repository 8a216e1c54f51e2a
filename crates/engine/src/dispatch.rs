//! The closed action table.
//!
//! One `match` routes every action name to its handler. Before a handler
//! runs, the dispatcher rejects steps with no `action` and interpolates the
//! argument tree, so handlers always see resolved arguments. Unknown actions
//! fail naming the action, which is usually a typo in the script.

use tapkit_types::{Step, StepError};
use tracing::debug;

use crate::context::ExecCtx;
use crate::control;
use crate::handlers;
use crate::interpolate::resolve_step;

pub fn dispatch_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    if step.action.trim().is_empty() {
        return Err(StepError::InvalidArgument("step is missing required field 'action'".into()));
    }

    let resolved = resolve_step(step, cx.state);
    debug!(action = %resolved.action, "dispatching step");

    match resolved.action.as_str() {
        // App lifecycle
        "launch" => handlers::app::launch(&resolved, cx),
        "terminate" => handlers::app::terminate(&resolved, cx),
        "activate" => handlers::app::activate(&resolved, cx),
        "isRunning" => handlers::app::is_running(&resolved, cx),

        // Single-element actions
        "click" | "tap" => handlers::element::click(&resolved, cx),
        "wait" => handlers::element::wait(&resolved, cx),
        "waitDisappear" => handlers::element::wait_disappear(&resolved, cx),
        "read" => handlers::element::read(&resolved, cx),
        "exists" => handlers::element::exists(&resolved, cx),
        "getRect" => handlers::element::get_rect(&resolved, cx),

        // Multi-element actions
        "findElements" => handlers::elements::find_elements(&resolved, cx),
        "countElements" => handlers::elements::count_elements(&resolved, cx),
        "clickNth" => handlers::elements::click_nth(&resolved, cx),
        "readNth" => handlers::elements::read_nth(&resolved, cx),

        // Alerts
        "handleAlert" => handlers::alerts::handle_alert(&resolved, cx),
        "dismissAlert" => handlers::alerts::dismiss_alert(&resolved, cx),
        "acceptAlert" => handlers::alerts::accept_alert(&resolved, cx),

        // Picker wheels
        "setPicker" => handlers::picker::set_picker(&resolved, cx),
        "getPicker" => handlers::picker::get_picker(&resolved, cx),

        // Coordinates and gestures
        "tapXY" => handlers::gesture::tap_xy(&resolved, cx),
        "doubleTapXY" => handlers::gesture::double_tap_xy(&resolved, cx),
        "longPressXY" => handlers::gesture::long_press_xy(&resolved, cx),
        "swipe" => handlers::gesture::swipe(&resolved, cx),
        "swipeElement" => handlers::gesture::swipe_element(&resolved, cx),
        "scroll" => handlers::gesture::scroll(&resolved, cx),
        "pinch" => handlers::gesture::pinch(&resolved, cx),

        // Text input
        "type" => handlers::input::type_text(&resolved, cx),
        "clear" => handlers::input::clear(&resolved, cx),
        "pasteText" => handlers::input::paste_text(&resolved, cx),

        // Utility
        "sleep" => handlers::util::sleep(&resolved, cx),
        "screenshot" => handlers::util::screenshot(&resolved, cx),
        "home" => handlers::util::home(&resolved, cx),
        "lock" => handlers::util::lock(&resolved, cx),
        "unlock" => handlers::util::unlock(&resolved, cx),
        "log" => handlers::util::log(&resolved, cx),

        // Variables and math
        "set" => handlers::vars::set(&resolved, cx),
        "getVar" => handlers::vars::get_var(&resolved, cx),
        "increment" => handlers::vars::increment(&resolved, cx),
        "decrement" => handlers::vars::decrement(&resolved, cx),
        "concat" => handlers::vars::concat(&resolved, cx),
        "math" => handlers::math::math(&resolved, cx),

        // Dates
        "parseDate" => handlers::date::parse_date(&resolved, cx),
        "formatDate" => handlers::date::format_date(&resolved, cx),

        // Assertions
        "assert" => handlers::assert::assert_condition(&resolved, cx),
        "assertExists" => handlers::assert::assert_exists(&resolved, cx),
        "assertNotExists" => handlers::assert::assert_not_exists(&resolved, cx),
        "assertText" => handlers::assert::assert_text(&resolved, cx),

        // OCR and template matching
        "clickText" => handlers::vision::click_text(&resolved, cx),
        "waitText" => handlers::vision::wait_text(&resolved, cx),
        "findText" => handlers::vision::find_text(&resolved, cx),
        "readScreen" => handlers::vision::read_screen(&resolved, cx),
        "readRegion" => handlers::vision::read_region(&resolved, cx),
        "clickImage" => handlers::vision::click_image(&resolved, cx),
        "waitImage" => handlers::vision::wait_image(&resolved, cx),

        // Control flow
        "if" => control::if_step(&resolved, cx),
        "while" => control::while_step(&resolved, cx),
        "repeat" => control::repeat_step(&resolved, cx),
        "forEach" => control::for_each(&resolved, cx),
        "try" => control::try_step(&resolved, cx),
        "break" => control::break_step(&resolved, cx),
        "stop" => control::stop_step(&resolved, cx),
        "return" => control::return_step(&resolved, cx),

        other => Err(StepError::InvalidArgument(format!("unknown action '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventClock, MemorySink};
    use crate::state::RunState;
    use serde_json::json;
    use tapkit_driver::sim::SimulatedDriver;
    use tapkit_vision::StaticVision;

    fn run(step_json: serde_json::Value) -> Result<(), StepError> {
        let step: Step = serde_json::from_value(step_json).expect("step decodes");
        let driver = SimulatedDriver::new();
        let vision = StaticVision::new();
        let mut state = RunState::default();
        let mut sink = MemorySink::new();
        let mut clock = EventClock::new();
        let mut cx = ExecCtx {
            state: &mut state,
            driver: &driver,
            vision: &vision,
            sink: &mut sink,
            clock: &mut clock,
        };
        dispatch_step(&step, &mut cx)
    }

    #[test]
    fn missing_action_is_rejected_before_any_handler_runs() {
        let err = run(json!({"selector": "Go"})).unwrap_err();
        assert_eq!(err.to_string(), "step is missing required field 'action'");
    }

    #[test]
    fn unknown_actions_fail_naming_the_action() {
        let err = run(json!({"action": "teleport"})).unwrap_err();
        assert_eq!(err.to_string(), "unknown action 'teleport'");
    }

    #[test]
    fn arguments_are_interpolated_before_the_handler_sees_them() {
        let step: Step = serde_json::from_value(json!({
            "action": "log",
            "message": "value is ${v}",
        }))
        .expect("step decodes");

        let driver = SimulatedDriver::new();
        let vision = StaticVision::new();
        let mut state = RunState::default();
        state.set_result("v", "42".into());
        let mut sink = MemorySink::new();
        let mut clock = EventClock::new();
        let mut cx = ExecCtx {
            state: &mut state,
            driver: &driver,
            vision: &vision,
            sink: &mut sink,
            clock: &mut clock,
        };
        dispatch_step(&step, &mut cx).expect("log");

        assert!(
            sink.events
                .iter()
                .any(|event| matches!(event, tapkit_types::StepEvent::Log { message, .. } if message == "value is 42"))
        );
    }
}
