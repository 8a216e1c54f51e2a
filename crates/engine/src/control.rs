//! Control-flow steps: `if`, `while`, `repeat`, `forEach`, `try`, `break`,
//! `stop`, `return`.
//!
//! Loops unwind through the one-shot signals on [`RunState`] rather than
//! errors: a `break` sets the flag, the innermost loop observes it, clears
//! it, and stops; `stop` is left set so the executor aborts the whole script
//! at the next step boundary. Sub-step failure propagates normally unless the
//! failing step is `optional`.

use std::thread;
use std::time::Duration;

use tapkit_types::{ScriptValue, Step, StepError};
use tracing::{debug, info, warn};

use crate::conditions::eval_condition;
use crate::context::ExecCtx;
use crate::executor::run_sequence;
use crate::state::reserved;

/// Guard rail on `while` loops with no honest exit.
const DEFAULT_MAX_ITERATIONS: usize = 100;
/// Sleep between `while` iterations.
const DEFAULT_LOOP_INTERVAL: f64 = 0.1;

pub fn if_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let branch = if eval_condition(step, cx)? { "then" } else { "else" };
    debug!(branch, "conditional evaluated");
    let steps = step.steps_arg(branch)?;
    run_sequence(&steps, cx)
}

pub fn while_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let body = step.steps_arg("do")?;
    let max_iterations = step.usize_arg("maxIterations").unwrap_or(DEFAULT_MAX_ITERATIONS);
    let interval = Duration::from_secs_f64(step.f64_arg("interval").unwrap_or(DEFAULT_LOOP_INTERVAL).max(0.0));

    let mut iteration = 0usize;
    loop {
        if iteration >= max_iterations {
            warn!(iterations = iteration, "while loop hit its iteration guard");
            break;
        }
        if !eval_condition(step, cx)? {
            break;
        }
        cx.state.set_variable(reserved::ITERATION, ScriptValue::Number(iteration as f64));
        run_sequence(&body, cx)?;
        if cx.state.should_break {
            cx.state.should_break = false;
            break;
        }
        if cx.state.should_stop {
            break;
        }
        iteration += 1;
        thread::sleep(interval);
    }
    Ok(())
}

pub fn repeat_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let times = step.require_usize("times")?;
    let body = step.steps_arg("do")?;

    for iteration in 0..times {
        cx.state.set_variable(reserved::ITERATION, ScriptValue::Number(iteration as f64));
        cx.state.set_variable(reserved::INDEX, ScriptValue::Number(iteration as f64));
        run_sequence(&body, cx)?;
        if cx.state.should_break {
            cx.state.should_break = false;
            break;
        }
        if cx.state.should_stop {
            break;
        }
    }
    Ok(())
}

/// Iterates a named sequence variable (by default the `findElements` cache),
/// binding the item, spreading record fields as `<itemVar>_<key>`, and
/// writing the index under both the index variable and the reserved names.
pub fn for_each(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let source = step.str_arg_any(&["items", "elements"]).unwrap_or_else(|| "elements".to_string());
    let item_var = step
        .result_key
        .clone()
        .or_else(|| step.str_arg("itemVar"))
        .unwrap_or_else(|| "item".to_string());
    let index_var = step.str_arg_any(&["indexAs", "indexVar"]).unwrap_or_else(|| "index".to_string());
    let body = step.steps_arg("do")?;

    let items = match cx.state.variable(&source) {
        Some(ScriptValue::List(items)) => items.clone(),
        // Anything else (missing or non-sequence) iterates zero times.
        _ => Vec::new(),
    };
    let limit = step.usize_arg("limit").unwrap_or(items.len());
    info!(source = %source, count = items.len().min(limit), "forEach starting");

    for (index, item) in items.into_iter().take(limit).enumerate() {
        cx.state.set_variable(&index_var, ScriptValue::Number(index as f64));
        cx.state.set_variable(reserved::INDEX, ScriptValue::Number(index as f64));
        cx.state.set_variable(reserved::ITERATION, ScriptValue::Number(index as f64));
        if let ScriptValue::Record(fields) = &item {
            for (field, value) in fields {
                cx.state.set_variable(&format!("{item_var}_{field}"), value.clone());
            }
        }
        cx.state.set_variable(&item_var, item);

        run_sequence(&body, cx)?;
        if cx.state.should_break {
            cx.state.should_break = false;
            break;
        }
        if cx.state.should_stop {
            break;
        }
    }
    Ok(())
}

/// `try`/`catch`/`finally`. The failure message is exposed as `_error`, the
/// catch and finally bodies have their own failures swallowed, and the try
/// outcome only propagates when `propagateError` is set.
pub fn try_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let mut body = step.steps_arg("try")?;
    if body.is_empty() {
        body = step.steps_arg("do")?;
    }
    let propagate = step.bool_arg("propagateError").unwrap_or(false);

    let outcome = run_sequence(&body, cx);
    if let Err(error) = &outcome {
        warn!(error = %error, "try block failed");
        cx.state
            .set_variable(reserved::ERROR, ScriptValue::Str(error.to_string()));
        let catch_steps = step.steps_arg("catch")?;
        if let Err(catch_error) = run_sequence(&catch_steps, cx) {
            debug!(error = %catch_error, "catch block failed; swallowed");
        }
    }

    let finally_steps = step.steps_arg("finally")?;
    if let Err(finally_error) = run_sequence(&finally_steps, cx) {
        debug!(error = %finally_error, "finally block failed; swallowed");
    }

    match outcome {
        Err(error) if propagate => Err(error),
        _ => Ok(()),
    }
}

pub fn break_step(_step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    cx.state.should_break = true;
    Ok(())
}

pub fn stop_step(_step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    info!("script stop requested");
    cx.state.should_stop = true;
    Ok(())
}

/// Records `_returnValue` and unwinds one loop, the closest thing a script
/// has to returning from a subroutine.
pub fn return_step(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    if let Some(value) = step.arg("value") {
        cx.state
            .set_variable(reserved::RETURN_VALUE, ScriptValue::from_json(value));
    }
    cx.state.should_break = true;
    Ok(())
}
