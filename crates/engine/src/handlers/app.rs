//! App lifecycle primitives: `launch`, `terminate`, `activate`, `isRunning`.

use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde_json::Value;
use tapkit_driver::{AppHandle, AppState, UiDriver};
use tapkit_types::{ScriptValue, Step, StepError};
use tracing::{info, warn};

use crate::context::ExecCtx;
use crate::selector::POLL_INTERVAL;
use crate::state::reserved;

use super::result_key;

fn state_name(state: AppState) -> &'static str {
    match state {
        AppState::NotRunning => "notRunning",
        AppState::Background => "background",
        AppState::Foreground => "foreground",
    }
}

fn environment_of(step: &Step) -> IndexMap<String, String> {
    let mut environment = IndexMap::new();
    if let Some(Value::Object(map)) = step.arg("environment") {
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            environment.insert(key.clone(), text);
        }
    }
    environment
}

fn record_current_app(cx: &mut ExecCtx<'_>, bundle: &str, state: AppState) {
    cx.state.current_app = Some(bundle.to_string());
    cx.state
        .set_variable(reserved::APP_BUNDLE_ID, ScriptValue::Str(bundle.to_string()));
    cx.state
        .set_variable(reserved::APP_STATE, ScriptValue::Str(state_name(state).to_string()));
}

fn await_foreground(app: &dyn AppHandle, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if app.state() == AppState::Foreground {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn launch(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let bundle = step.require_str("bundleId")?;
    let arguments = step.string_list_arg("arguments");
    let environment = environment_of(step);
    let wait = step.bool_arg("wait").unwrap_or(true);
    let timeout = step.timeout_or(30.0);
    let retries = step.usize_arg("retries").unwrap_or(1);
    let retry_delay = Duration::from_secs_f64(step.f64_arg("retryDelay").unwrap_or(2.0).max(0.0));

    let app = cx.driver.app_by_bundle(&bundle);
    let mut last_error: Option<StepError> = None;

    for attempt in 0..=retries {
        if attempt > 0 {
            thread::sleep(retry_delay);
        }
        match app.launch(&arguments, &environment) {
            Ok(()) => {
                if !wait || await_foreground(app.as_ref(), timeout) {
                    info!(bundle = %bundle, attempt, "app launched");
                    record_current_app(cx, &bundle, app.state());
                    return Ok(());
                }
                last_error = Some(StepError::Timeout(format!(
                    "app '{}' did not reach foreground within {:.1}s",
                    bundle,
                    timeout.as_secs_f64()
                )));
                warn!(bundle = %bundle, attempt, "app launch timed out waiting for foreground");
            }
            Err(error) => {
                warn!(bundle = %bundle, attempt, error = %error, "app launch failed");
                last_error = Some(StepError::from_host(error));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| StepError::Unknown(format!("launch of '{bundle}' failed"))))
}

pub fn terminate(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let bundle = step.require_str("bundleId")?;
    let timeout = step.timeout_or(5.0);

    let app = cx.driver.app_by_bundle(&bundle);
    app.terminate().map_err(StepError::from_host)?;

    // Grace window only: not quitting in time is still a success.
    let deadline = Instant::now() + timeout;
    while app.state() != AppState::NotRunning && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
    }

    if cx.state.current_app.as_deref() == Some(bundle.as_str()) {
        cx.state
            .set_variable(reserved::APP_STATE, ScriptValue::Str(state_name(app.state()).to_string()));
    }
    info!(bundle = %bundle, "app terminated");
    Ok(())
}

pub fn activate(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let bundle = step.require_str("bundleId")?;
    let app = cx.driver.app_by_bundle(&bundle);
    app.activate().map_err(StepError::from_host)?;
    record_current_app(cx, &bundle, app.state());
    Ok(())
}

pub fn is_running(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let bundle = step.require_str("bundleId")?;
    let key = result_key(step)?;
    let running = cx.driver.app_by_bundle(&bundle).state() != AppState::NotRunning;
    cx.record(&key, ScriptValue::Bool(running));
    Ok(())
}
