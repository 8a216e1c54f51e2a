//! Text input primitives: `type`, `clear`, `pasteText`.

use std::thread;
use std::time::Duration;

use tapkit_driver::predicate::{Attribute, Comparison};
use tapkit_driver::{AppHandle, Predicate, UiDriver, UiElement};
use tapkit_types::{Step, StepError};
use tracing::debug;

use crate::context::ExecCtx;
use crate::selector::await_element;

use super::{DEFAULT_TIMEOUT_SECS, selector_of};

/// Long-press duration that summons the edit menu.
const EDIT_MENU_PRESS: Duration = Duration::from_secs(1);
/// XCUIKeyboardKeyDelete.
const DELETE_KEY: char = '\u{8}';

/// Types text, optionally tapping (and clearing) a target field first.
pub fn type_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let text = step
        .str_arg_any(&["value", "text"])
        .ok_or_else(|| StepError::InvalidArgument("'type' requires a 'value' or 'text' argument".into()))?;

    let app = cx.app();
    match step.str_arg("selector") {
        Some(_) => {
            let (selector, kind) = selector_of(step)?;
            let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), true)?;
            element.tap().map_err(StepError::from_host)?;
            if step.bool_arg("clear").unwrap_or(false) {
                clear_element(element.as_ref(), app.as_ref())?;
            }
            element.type_text(&text).map_err(StepError::from_host)
        }
        None => app.type_text(&text).map_err(StepError::from_host),
    }
}

pub fn clear(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let (selector, kind) = selector_of(step)?;
    let app = cx.app();
    let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), true)?;
    element.tap().map_err(StepError::from_host)?;
    clear_element(element.as_ref(), app.as_ref())
}

/// Long-press, "Select All" from the edit menu, then a single delete. When
/// the menu item never appears, fall back to one backspace per character.
fn clear_element(element: &dyn UiElement, app: &dyn AppHandle) -> Result<(), StepError> {
    element.press_for(EDIT_MENU_PRESS).map_err(StepError::from_host)?;
    if let Some(select_all) = menu_item(app, "Select All") {
        select_all.tap().map_err(StepError::from_host)?;
        element.type_text(&DELETE_KEY.to_string()).map_err(StepError::from_host)?;
        return Ok(());
    }
    let backspaces: String = std::iter::repeat_n(DELETE_KEY, element.value().chars().count()).collect();
    debug!("edit menu unavailable, clearing with backspaces");
    element.type_text(&backspaces).map_err(StepError::from_host)
}

/// Sets the pasteboard and invokes the "Paste" menu item on the target.
pub fn paste_text(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let text = step.require_str("text")?;
    cx.driver.set_pasteboard(&text).map_err(StepError::from_host)?;

    let app = cx.app();
    match step.str_arg("selector") {
        Some(_) => {
            let (selector, kind) = selector_of(step)?;
            let element = await_element(app.as_ref(), &selector, kind, step.timeout_or(DEFAULT_TIMEOUT_SECS), true)?;
            element.press_for(EDIT_MENU_PRESS).map_err(StepError::from_host)?;
        }
        None => {
            let center = cx.driver.screen_size().center();
            cx.driver.press_at(center, EDIT_MENU_PRESS).map_err(StepError::from_host)?;
        }
    }
    // Give the edit menu a beat to appear.
    thread::sleep(Duration::from_millis(100));

    match menu_item(app.as_ref(), "Paste") {
        Some(paste) => paste.tap().map_err(StepError::from_host),
        None => Err(StepError::NotFound("'Paste' menu item not found".into())),
    }
}

fn menu_item(app: &dyn AppHandle, label: &str) -> Option<Box<dyn UiElement>> {
    let predicate = Predicate::attribute(Attribute::Label, Comparison::Equals, label);
    app.query_descendants(&predicate, 1)
        .into_iter()
        .next()
        .filter(|item| item.is_hittable())
}
