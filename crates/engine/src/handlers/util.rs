//! Utility primitives: `sleep`, `screenshot`, `home`, `lock`, `unlock`, `log`.

use std::thread;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tapkit_driver::UiDriver;
use tapkit_types::{ScriptValue, Step, StepError, StepEvent};
use tracing::{debug, error, info, warn};

use crate::context::ExecCtx;

const JPEG_QUALITY: u8 = 70;

pub fn sleep(step: &Step, _cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let seconds = step
        .f64_arg("duration")
        .or(step.timeout)
        .unwrap_or(1.0)
        .max(0.0);
    thread::sleep(Duration::from_secs_f64(seconds));
    Ok(())
}

/// Captures the screen. Full captures encode as PNG; the default mode uses
/// JPEG at quality 70. The base64 payload always lands in variables; it is
/// copied into the results surface only on request, to keep terminal reports
/// small.
pub fn screenshot(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = step.result_key.clone().unwrap_or_else(|| "screenshot".to_string());
    let full = step.bool_arg("full").unwrap_or(false);
    let include_in_results = step.bool_arg("includeInResults").unwrap_or(false);

    let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
    let bytes = if full {
        shot.png_bytes().map_err(StepError::from_host)?
    } else {
        shot.jpeg_bytes(JPEG_QUALITY).map_err(StepError::from_host)?
    };
    let encoded = BASE64.encode(&bytes);
    debug!(key = %key, bytes = bytes.len(), full, "screenshot captured");

    cx.state.set_variable_unmirrored(&key, ScriptValue::Str(encoded.clone()));
    if include_in_results {
        cx.state.set_result(&key, encoded);
    }
    let timestamp_ms = cx.now_ms();
    cx.emit(StepEvent::Screenshot {
        timestamp_ms,
        key,
        size: bytes.len(),
    });
    Ok(())
}

pub fn home(_step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    cx.driver.press_home().map_err(StepError::from_host)
}

pub fn lock(_step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    cx.driver.lock().map_err(StepError::from_host)
}

pub fn unlock(_step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    cx.driver.unlock().map_err(StepError::from_host)
}

/// Emits a `log` event and mirrors it into the server's own logs.
pub fn log(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let message = step.require_str("message")?;
    let level = step.str_arg("level").unwrap_or_else(|| "info".to_string());
    match level.as_str() {
        "error" => error!(script = true, "{message}"),
        "warn" | "warning" => warn!(script = true, "{message}"),
        "debug" => debug!(script = true, "{message}"),
        _ => info!(script = true, "{message}"),
    }
    cx.emit_log(&level, &message);
    Ok(())
}
