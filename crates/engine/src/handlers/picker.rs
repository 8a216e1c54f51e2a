//! Picker wheel primitives: `setPicker`, `getPicker`.

use std::thread;
use std::time::Instant;

use tapkit_driver::{AppHandle, ElementRef, UiElement};
use tapkit_types::{ScriptValue, Step, StepError};

use crate::context::ExecCtx;
use crate::selector::POLL_INTERVAL;

use super::{DEFAULT_TIMEOUT_SECS, result_key};

fn await_wheel(step: &Step, cx: &mut ExecCtx<'_>, index: usize) -> Result<ElementRef, StepError> {
    let deadline = Instant::now() + step.timeout_or(DEFAULT_TIMEOUT_SECS);
    loop {
        let app = cx.app();
        let mut wheels = app.picker_wheels();
        if index < wheels.len() {
            return Ok(wheels.swap_remove(index));
        }
        if Instant::now() >= deadline {
            return Err(StepError::NotFound(format!(
                "picker wheel {} not found ({} wheels present)",
                index,
                wheels.len()
            )));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn set_picker(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let index = step.usize_arg("index").unwrap_or(0);
    let value = step.require_str("value")?;
    let wheel = await_wheel(step, cx, index)?;
    wheel
        .adjust_picker_to(&value)
        .map_err(|error| StepError::NotFound(error.to_string()))
}

pub fn get_picker(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let index = step.usize_arg("index").unwrap_or(0);
    let key = result_key(step)?;
    let wheel = await_wheel(step, cx, index)?;
    cx.record(&key, ScriptValue::Str(wheel.value()));
    Ok(())
}
