//! Alert primitives: `handleAlert`, `dismissAlert`, `acceptAlert`.
//!
//! All three scan the same locations in a fixed order: springboard buttons,
//! springboard alert buttons, current-app buttons, current-app alert buttons,
//! current-app sheet buttons. Permission prompts surface on the springboard,
//! which is why it is searched before the app itself.

use std::thread;
use std::time::{Duration, Instant};

use tapkit_driver::{AppHandle, ElementRef, ElementType, UiDriver, UiElement};
use tapkit_types::{Step, StepError};
use tracing::{debug, info};

use crate::context::ExecCtx;
use crate::selector::POLL_INTERVAL;

/// Labels tried, in order, by `dismissAlert`.
const DISMISS_LABELS: [&str; 7] = ["Cancel", "No", "Don't Allow", "Not Now", "Later", "Dismiss", "Close"];

/// Labels tried, in order, by `acceptAlert`.
const ACCEPT_LABELS: [&str; 8] = [
    "OK",
    "Allow",
    "Yes",
    "Accept",
    "Continue",
    "Open",
    "Allow Full Access",
    "Allow While Using App",
];

/// Settle delay after tapping an alert button.
const POST_TAP_SETTLE: Duration = Duration::from_millis(300);

fn candidate_buttons(cx: &ExecCtx<'_>) -> Vec<ElementRef> {
    let springboard = cx.driver.springboard();
    let app = cx.app();
    let mut candidates = springboard.query_type(ElementType::Button, None, 0);
    candidates.extend(springboard.alert_buttons());
    candidates.extend(app.query_type(ElementType::Button, None, 0));
    candidates.extend(app.alert_buttons());
    candidates.extend(app.sheet_buttons());
    candidates
}

fn tap_labeled(cx: &ExecCtx<'_>, label: &str) -> Result<bool, StepError> {
    for button in candidate_buttons(cx) {
        if button.label() == label && button.is_hittable() {
            button.tap().map_err(StepError::from_host)?;
            thread::sleep(POST_TAP_SETTLE);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Taps a specific alert button, retrying whole deadline windows.
pub fn handle_alert(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let label = step.require_str("button")?;
    let timeout = step.timeout_or(3.0);
    let attempts = step.usize_arg("retries").unwrap_or(1).max(1);

    for attempt in 0..attempts {
        let deadline = Instant::now() + timeout;
        loop {
            if tap_labeled(cx, &label)? {
                info!(button = %label, attempt, "alert button tapped");
                return Ok(());
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    Err(StepError::NotFound(format!("alert button '{label}' not found")))
}

fn sweep_labels(step: &Step, cx: &mut ExecCtx<'_>, labels: &[&str], default_timeout: f64) -> Result<(), StepError> {
    let deadline = Instant::now() + step.timeout_or(default_timeout);
    loop {
        for label in labels {
            if tap_labeled(cx, label)? {
                debug!(button = %label, "alert handled by label sweep");
                return Ok(());
            }
        }
        if Instant::now() >= deadline {
            // No alert showed up: that is a normal outcome, not an error.
            return Ok(());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub fn dismiss_alert(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    sweep_labels(step, cx, &DISMISS_LABELS, 2.0)
}

pub fn accept_alert(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    sweep_labels(step, cx, &ACCEPT_LABELS, 2.0)
}
