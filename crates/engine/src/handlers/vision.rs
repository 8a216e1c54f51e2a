//! Screen-reading primitives backed by the vision facade: OCR text lookup,
//! full/region screen reading, and template-image matching.
//!
//! All locate primitives share the same deadline loop: capture a screenshot,
//! ask the vision engine, sleep 200 ms, repeat until the timeout elapses. OCR
//! polls more slowly than element queries because each probe runs recognition
//! over a full frame.

use std::thread;
use std::time::Instant;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;
use indexmap::IndexMap;
use tapkit_driver::{Point, UiDriver};
use tapkit_types::{ScriptValue, Step, StepError};
use tracing::debug;

use crate::conditions::OCR_POLL_INTERVAL;
use crate::context::ExecCtx;

use super::{DEFAULT_TIMEOUT_SECS, result_key};

/// Deadline-loops screenshot → OCR until the needle appears. Returns the tap
/// point in screen coordinates, or `None` at timeout.
fn await_text(step: &Step, cx: &mut ExecCtx<'_>, needle: &str) -> Result<Option<Point>, StepError> {
    let deadline = Instant::now() + step.timeout_or(DEFAULT_TIMEOUT_SECS);
    loop {
        let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
        if let Some(found) = cx.vision.find_text(&shot.image, needle) {
            let (x, y) = found.rect.pixel_center(shot.width(), shot.height());
            debug!(needle = %needle, x, y, "text located on screen");
            return Ok(Some(Point::new(x, y)));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(OCR_POLL_INTERVAL);
    }
}

pub fn click_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let needle = step.require_str("text")?;
    match await_text(step, cx, &needle)? {
        Some(point) => cx.driver.tap_at(point).map_err(StepError::from_host),
        None => Err(StepError::NotFound(format!("text '{needle}' not found on screen"))),
    }
}

pub fn wait_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let needle = step.require_str("text")?;
    match await_text(step, cx, &needle)? {
        Some(_) => Ok(()),
        None => Err(StepError::NotFound(format!("text '{needle}' not found on screen"))),
    }
}

/// Records where (and whether) the text was found; never fails on absence.
pub fn find_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let needle = step.require_str("text")?;
    let key = result_key(step)?;
    match await_text(step, cx, &needle)? {
        Some(point) => {
            let mut record = IndexMap::new();
            record.insert("x".to_string(), ScriptValue::Number(point.x));
            record.insert("y".to_string(), ScriptValue::Number(point.y));
            cx.state.set_variable(&key, ScriptValue::Record(record));
            cx.state.set_variable(&format!("{key}_x"), ScriptValue::Number(point.x));
            cx.state.set_variable(&format!("{key}_y"), ScriptValue::Number(point.y));
            cx.record(&format!("{key}_found"), ScriptValue::Bool(true));
        }
        None => {
            cx.record(&format!("{key}_found"), ScriptValue::Bool(false));
        }
    }
    Ok(())
}

fn joined_text(regions: Vec<tapkit_vision::TextRegion>) -> String {
    regions
        .into_iter()
        .map(|region| region.text)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn read_screen(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = result_key(step)?;
    let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
    let text = joined_text(cx.vision.recognize_text(&shot.image));
    cx.record(&key, ScriptValue::Str(text));
    Ok(())
}

pub fn read_region(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let key = result_key(step)?;
    let x = step.require_f64("regionX")?.max(0.0) as u32;
    let y = step.require_f64("regionY")?.max(0.0) as u32;
    let width = step.require_f64("regionWidth")?.max(0.0) as u32;
    let height = step.require_f64("regionHeight")?.max(0.0) as u32;

    let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
    let cropped = image::imageops::crop_imm(
        &shot.image,
        x.min(shot.width()),
        y.min(shot.height()),
        width.min(shot.width().saturating_sub(x)),
        height.min(shot.height().saturating_sub(y)),
    )
    .to_image();
    let text = joined_text(cx.vision.recognize_text(&cropped));
    cx.record(&key, ScriptValue::Str(text));
    Ok(())
}

fn decode_template(step: &Step) -> Result<RgbaImage, StepError> {
    let encoded = step.require_str("imageBase64")?;
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|error| StepError::Decode(format!("template image is not valid base64: {error}")))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|error| StepError::Decode(format!("template image could not be decoded: {error}")))?;
    Ok(decoded.to_rgba8())
}

/// Deadline-loops screenshot → template match. Returns the match center, or
/// `None` at timeout.
fn await_template(step: &Step, cx: &mut ExecCtx<'_>, template: &RgbaImage, confidence: f64) -> Result<Option<Point>, StepError> {
    let deadline = Instant::now() + step.timeout_or(DEFAULT_TIMEOUT_SECS);
    loop {
        let shot = cx.driver.capture_screenshot().map_err(StepError::from_host)?;
        if let Some(found) = cx.vision.match_template(&shot.image, template, confidence) {
            let (x, y) = found.center();
            debug!(score = found.score, x, y, "template located on screen");
            return Ok(Some(Point::new(x, y)));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(OCR_POLL_INTERVAL);
    }
}

pub fn click_image(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let template = decode_template(step)?;
    let confidence = step.f64_arg("confidence").unwrap_or(0.8);
    match await_template(step, cx, &template, confidence)? {
        Some(point) => cx.driver.tap_at(point).map_err(StepError::from_host),
        None => Err(StepError::NotFound("template image not found on screen".into())),
    }
}

pub fn wait_image(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let template = decode_template(step)?;
    let confidence = step.f64_arg("confidence").unwrap_or(0.8);
    match await_template(step, cx, &template, confidence)? {
        Some(_) => Ok(()),
        None => Err(StepError::NotFound("template image not found on screen".into())),
    }
}
