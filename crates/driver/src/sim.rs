//! In-memory simulated driver.
//!
//! Plays the role a no-op runner plays in a workflow engine: a deterministic,
//! side-effect-free backend for tests, previews, and the demo server binary.
//! The scene is a flat list of elements per app; tap effects are plain data so
//! tests can script UI reactions (change a label, dismiss an alert, remove an
//! element) without callbacks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use image::{Rgba, RgbaImage};
use indexmap::IndexMap;
use tracing::debug;

use crate::geometry::{Point, Rect, Size};
use crate::predicate::{AttrSnapshot, Predicate};
use crate::selector::ElementType;
use crate::traits::{AppHandle, AppState, ElementRef, Screenshot, UiDriver, UiElement};

/// Bundle id of the auto-installed springboard app.
pub const SPRINGBOARD_BUNDLE: &str = "com.apple.springboard";

const DEFAULT_SCREEN: Size = Size {
    width: 390.0,
    height: 844.0,
};

/// Where an element lives inside its app's scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    App,
    Alert,
    Sheet,
}

/// Scripted reaction applied when an element is tapped.
#[derive(Debug, Clone)]
pub enum TapEffect {
    /// Replace the label of the element with the given identifier.
    SetLabel { target: String, label: String },
    /// Replace the value of the element with the given identifier.
    SetValue { target: String, value: String },
    /// Remove the element with the given identifier from the scene.
    Remove { target: String },
    /// Remove every alert-scoped element in the current app.
    DismissAlert,
}

/// Recorded device-level gesture, for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Tap(Point),
    DoubleTap(Point),
    Press(Point, Duration),
    Drag(Point, Point, Duration),
    Pinch(Point, f64, f64),
    Home,
    Lock,
    Unlock,
}

/// One scene node.
#[derive(Debug, Clone)]
pub struct SimElement {
    uid: u64,
    pub element_type: ElementType,
    pub identifier: String,
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub frame: Rect,
    pub hittable: bool,
    pub enabled: bool,
    pub scope: Scope,
    pub picker_values: Vec<String>,
    pub on_tap: Vec<TapEffect>,
}

impl SimElement {
    pub fn new(element_type: ElementType, identifier: impl Into<String>) -> Self {
        SimElement {
            uid: 0,
            element_type,
            identifier: identifier.into(),
            label: String::new(),
            value: String::new(),
            placeholder: String::new(),
            frame: Rect::new(0.0, 0.0, 100.0, 44.0),
            hittable: true,
            enabled: true,
            scope: Scope::App,
            picker_values: Vec::new(),
            on_tap: Vec::new(),
        }
    }

    /// Button whose label equals its identifier, the common case.
    pub fn button(name: &str) -> Self {
        SimElement::new(ElementType::Button, name).label(name)
    }

    /// Static text with an identifier and display label.
    pub fn text(identifier: &str, label: &str) -> Self {
        SimElement::new(ElementType::StaticText, identifier).label(label)
    }

    /// Picker wheel cycling through the given values.
    pub fn picker(identifier: &str, values: &[&str]) -> Self {
        let mut element = SimElement::new(ElementType::Other, identifier);
        element.picker_values = values.iter().map(|v| v.to_string()).collect();
        if let Some(first) = values.first() {
            element.value = first.to_string();
        }
        element
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    pub fn not_hittable(mut self) -> Self {
        self.hittable = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn in_alert(mut self) -> Self {
        self.scope = Scope::Alert;
        self
    }

    pub fn in_sheet(mut self) -> Self {
        self.scope = Scope::Sheet;
        self
    }

    pub fn on_tap(mut self, effect: TapEffect) -> Self {
        self.on_tap.push(effect);
        self
    }

    fn attrs(&self) -> AttrSnapshot<'_> {
        AttrSnapshot {
            identifier: &self.identifier,
            label: &self.label,
            value: &self.value,
            placeholder: &self.placeholder,
        }
    }
}

#[derive(Debug, Default)]
struct SimApp {
    state: AppState,
    elements: Vec<SimElement>,
    /// Remaining launches that should fail, for retry tests.
    failing_launches: u32,
    focused: Option<u64>,
}

struct SimState {
    apps: IndexMap<String, SimApp>,
    active: Option<String>,
    locked: bool,
    pasteboard: String,
    screen: Size,
    canvas: RgbaImage,
    gestures: Vec<Gesture>,
    typed: Vec<String>,
    next_uid: u64,
}

impl SimState {
    fn app_mut(&mut self, bundle: &str) -> &mut SimApp {
        self.apps.entry(bundle.to_string()).or_default()
    }

    fn find_uid(&self, bundle: &str, uid: u64) -> Option<&SimElement> {
        self.apps.get(bundle)?.elements.iter().find(|e| e.uid == uid)
    }

    fn apply_effects(&mut self, bundle: &str, effects: &[TapEffect]) {
        for effect in effects {
            let Some(app) = self.apps.get_mut(bundle) else { continue };
            match effect {
                TapEffect::SetLabel { target, label } => {
                    if let Some(element) = app.elements.iter_mut().find(|e| e.identifier == *target) {
                        element.label = label.clone();
                    }
                }
                TapEffect::SetValue { target, value } => {
                    if let Some(element) = app.elements.iter_mut().find(|e| e.identifier == *target) {
                        element.value = value.clone();
                    }
                }
                TapEffect::Remove { target } => {
                    app.elements.retain(|e| e.identifier != *target);
                }
                TapEffect::DismissAlert => {
                    app.elements.retain(|e| e.scope != Scope::Alert);
                }
            }
        }
    }
}

/// The simulated device. Cloning shares the underlying scene.
#[derive(Clone)]
pub struct SimulatedDriver {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDriver {
    pub fn new() -> Self {
        let canvas = RgbaImage::from_pixel(
            DEFAULT_SCREEN.width as u32,
            DEFAULT_SCREEN.height as u32,
            Rgba([24, 24, 28, 255]),
        );
        let mut apps = IndexMap::new();
        apps.insert(SPRINGBOARD_BUNDLE.to_string(), SimApp {
            state: AppState::Foreground,
            ..Default::default()
        });
        SimulatedDriver {
            state: Arc::new(Mutex::new(SimState {
                apps,
                active: None,
                locked: false,
                pasteboard: String::new(),
                screen: DEFAULT_SCREEN,
                canvas,
                gestures: Vec::new(),
                typed: Vec::new(),
                next_uid: 1,
            })),
        }
    }

    /// Registers an app in the not-running state.
    pub fn install_app(&self, bundle: &str) -> &Self {
        self.state.lock().unwrap().app_mut(bundle);
        self
    }

    /// Adds an element to an app's scene (installing the app if needed).
    pub fn add_element(&self, bundle: &str, mut element: SimElement) -> &Self {
        let mut state = self.state.lock().unwrap();
        element.uid = state.next_uid;
        state.next_uid += 1;
        state.app_mut(bundle).elements.push(element);
        self
    }

    /// Makes the next `count` launches of an app fail, for retry tests.
    pub fn fail_launches(&self, bundle: &str, count: u32) -> &Self {
        self.state.lock().unwrap().app_mut(bundle).failing_launches = count;
        self
    }

    /// Paints a solid patch onto the screenshot canvas, for template tests.
    pub fn paint_patch(&self, x: u32, y: u32, width: u32, height: u32, rgba: [u8; 4]) -> &Self {
        let mut state = self.state.lock().unwrap();
        for py in y..(y + height).min(state.canvas.height()) {
            for px in x..(x + width).min(state.canvas.width()) {
                state.canvas.put_pixel(px, py, Rgba(rgba));
            }
        }
        self
    }

    pub fn pasteboard_contents(&self) -> String {
        self.state.lock().unwrap().pasteboard.clone()
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().unwrap().locked
    }

    pub fn recorded_gestures(&self) -> Vec<Gesture> {
        self.state.lock().unwrap().gestures.clone()
    }

    pub fn typed_text(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn app_state(&self, bundle: &str) -> AppState {
        self.state
            .lock()
            .unwrap()
            .apps
            .get(bundle)
            .map(|app| app.state)
            .unwrap_or(AppState::NotRunning)
    }

    /// Current value of an element, for post-script assertions.
    pub fn element_value(&self, bundle: &str, identifier: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .apps
            .get(bundle)?
            .elements
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| e.value.clone())
    }

    pub fn element_label(&self, bundle: &str, identifier: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .apps
            .get(bundle)?
            .elements
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| e.label.clone())
    }

    fn handle(&self, bundle: &str) -> SimAppHandle {
        SimAppHandle {
            state: Arc::clone(&self.state),
            bundle: bundle.to_string(),
        }
    }
}

impl UiDriver for SimulatedDriver {
    fn active_app(&self) -> Option<Box<dyn AppHandle>> {
        let active = self.state.lock().unwrap().active.clone()?;
        Some(Box::new(self.handle(&active)))
    }

    fn app_by_bundle(&self, bundle_id: &str) -> Box<dyn AppHandle> {
        Box::new(self.handle(bundle_id))
    }

    fn springboard(&self) -> Box<dyn AppHandle> {
        Box::new(self.handle(SPRINGBOARD_BUNDLE))
    }

    fn screen_size(&self) -> Size {
        self.state.lock().unwrap().screen
    }

    fn press_home(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.gestures.push(Gesture::Home);
        state.active = None;
        for (bundle, app) in state.apps.iter_mut() {
            if bundle != SPRINGBOARD_BUNDLE && app.state == AppState::Foreground {
                app.state = AppState::Background;
            }
        }
        Ok(())
    }

    fn lock(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.gestures.push(Gesture::Lock);
        state.locked = true;
        Ok(())
    }

    fn unlock(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.gestures.push(Gesture::Unlock);
        state.locked = false;
        Ok(())
    }

    fn set_pasteboard(&self, text: &str) -> Result<()> {
        self.state.lock().unwrap().pasteboard = text.to_string();
        Ok(())
    }

    fn tap_at(&self, point: Point) -> Result<()> {
        self.state.lock().unwrap().gestures.push(Gesture::Tap(point));
        Ok(())
    }

    fn double_tap_at(&self, point: Point) -> Result<()> {
        self.state.lock().unwrap().gestures.push(Gesture::DoubleTap(point));
        Ok(())
    }

    fn press_at(&self, point: Point, duration: Duration) -> Result<()> {
        self.state.lock().unwrap().gestures.push(Gesture::Press(point, duration));
        Ok(())
    }

    fn press_drag(&self, from: Point, to: Point, duration: Duration) -> Result<()> {
        self.state.lock().unwrap().gestures.push(Gesture::Drag(from, to, duration));
        Ok(())
    }

    fn pinch_at(&self, center: Point, scale: f64, velocity: f64) -> Result<()> {
        self.state.lock().unwrap().gestures.push(Gesture::Pinch(center, scale, velocity));
        Ok(())
    }

    fn capture_screenshot(&self) -> Result<Screenshot> {
        Ok(Screenshot::new(self.state.lock().unwrap().canvas.clone()))
    }
}

struct SimAppHandle {
    state: Arc<Mutex<SimState>>,
    bundle: String,
}

impl SimAppHandle {
    fn collect(&self, scope: Scope, element_type: ElementType, predicate: Option<&Predicate>, limit: usize) -> Vec<ElementRef> {
        let state = self.state.lock().unwrap();
        let Some(app) = state.apps.get(&self.bundle) else {
            return Vec::new();
        };
        let mut out: Vec<ElementRef> = Vec::new();
        for element in &app.elements {
            if element.scope != scope {
                continue;
            }
            if element_type != ElementType::Any && element.element_type != element_type {
                continue;
            }
            if let Some(predicate) = predicate
                && !predicate.matches_attrs(&element.attrs())
            {
                continue;
            }
            out.push(Box::new(SimElementRef {
                state: Arc::clone(&self.state),
                bundle: self.bundle.clone(),
                uid: element.uid,
            }));
            if limit != 0 && out.len() >= limit {
                break;
            }
        }
        out
    }
}

impl AppHandle for SimAppHandle {
    fn bundle_id(&self) -> String {
        self.bundle.clone()
    }

    fn launch(&self, _arguments: &[String], _environment: &IndexMap<String, String>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        let app = state.app_mut(&bundle);
        if app.failing_launches > 0 {
            app.failing_launches -= 1;
            bail!("simulated launch failure for '{}'", bundle);
        }
        app.state = AppState::Foreground;
        for (other, entry) in state.apps.iter_mut() {
            if *other != bundle && entry.state == AppState::Foreground && other != SPRINGBOARD_BUNDLE {
                entry.state = AppState::Background;
            }
        }
        state.active = Some(bundle.clone());
        debug!(bundle = %bundle, "simulated app launched");
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        state.app_mut(&bundle).state = AppState::NotRunning;
        if state.active.as_deref() == Some(&bundle) {
            state.active = None;
        }
        Ok(())
    }

    fn activate(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        state.app_mut(&bundle).state = AppState::Foreground;
        state.active = Some(bundle);
        Ok(())
    }

    fn state(&self) -> AppState {
        let state = self.state.lock().unwrap();
        state
            .apps
            .get(&self.bundle)
            .map(|app| app.state)
            .unwrap_or(AppState::NotRunning)
    }

    fn query_type(&self, element_type: ElementType, predicate: Option<&Predicate>, limit: usize) -> Vec<ElementRef> {
        self.collect(Scope::App, element_type, predicate, limit)
    }

    fn query_class_chain(&self, chain: &str, first_only: bool) -> Vec<ElementRef> {
        // Supports the `**/XCUIElementTypeButton[`predicate`]` subset, which
        // is what the interpreter's scripts use in practice.
        let tail = chain.rsplit('/').next().unwrap_or(chain);
        let (type_name, predicate_text) = match tail.split_once("[`") {
            Some((head, rest)) => (head, rest.strip_suffix("`]").map(|p| p.to_string())),
            None => (tail, None),
        };
        let element_type = match type_name.trim() {
            "XCUIElementTypeButton" => ElementType::Button,
            "XCUIElementTypeStaticText" => ElementType::StaticText,
            "XCUIElementTypeTextField" => ElementType::TextField,
            "XCUIElementTypeCell" => ElementType::Cell,
            "XCUIElementTypeAny" | "*" => ElementType::Any,
            _ => ElementType::Other,
        };
        let predicate = match predicate_text {
            Some(text) => match Predicate::parse(&text) {
                Ok(parsed) => Some(parsed),
                Err(_) => return Vec::new(),
            },
            None => None,
        };
        let limit = if first_only { 1 } else { 0 };
        self.collect(Scope::App, element_type, predicate.as_ref(), limit)
    }

    fn query_descendants(&self, predicate: &Predicate, limit: usize) -> Vec<ElementRef> {
        self.collect(Scope::App, ElementType::Any, Some(predicate), limit)
    }

    fn alert_buttons(&self) -> Vec<ElementRef> {
        self.collect(Scope::Alert, ElementType::Button, None, 0)
    }

    fn sheet_buttons(&self) -> Vec<ElementRef> {
        self.collect(Scope::Sheet, ElementType::Button, None, 0)
    }

    fn picker_wheels(&self) -> Vec<ElementRef> {
        let state = self.state.lock().unwrap();
        let Some(app) = state.apps.get(&self.bundle) else {
            return Vec::new();
        };
        app.elements
            .iter()
            .filter(|element| !element.picker_values.is_empty())
            .map(|element| {
                Box::new(SimElementRef {
                    state: Arc::clone(&self.state),
                    bundle: self.bundle.clone(),
                    uid: element.uid,
                }) as ElementRef
            })
            .collect()
    }

    fn type_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        let app = state.app_mut(&bundle);
        if let Some(uid) = app.focused
            && let Some(element) = app.elements.iter_mut().find(|e| e.uid == uid)
        {
            apply_typed_text(&mut element.value, text);
        }
        state.typed.push(text.to_string());
        Ok(())
    }
}

/// Applies typed text, honoring backspace control characters.
fn apply_typed_text(value: &mut String, text: &str) {
    for ch in text.chars() {
        if ch == '\u{8}' {
            value.pop();
        } else {
            value.push(ch);
        }
    }
}

struct SimElementRef {
    state: Arc<Mutex<SimState>>,
    bundle: String,
    uid: u64,
}

impl SimElementRef {
    fn read<T: Default>(&self, f: impl FnOnce(&SimElement) -> T) -> T {
        let state = self.state.lock().unwrap();
        state.find_uid(&self.bundle, self.uid).map(f).unwrap_or_default()
    }
}

impl UiElement for SimElementRef {
    fn exists(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.find_uid(&self.bundle, self.uid).is_some()
    }

    fn is_hittable(&self) -> bool {
        self.read(|e| e.hittable)
    }

    fn is_enabled(&self) -> bool {
        self.read(|e| e.enabled)
    }

    fn label(&self) -> String {
        self.read(|e| e.label.clone())
    }

    fn value(&self) -> String {
        self.read(|e| e.value.clone())
    }

    fn identifier(&self) -> String {
        self.read(|e| e.identifier.clone())
    }

    fn placeholder_value(&self) -> String {
        self.read(|e| e.placeholder.clone())
    }

    fn frame(&self) -> Rect {
        self.read(|e| e.frame)
    }

    fn tap(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let Some(element) = state.find_uid(&self.bundle, self.uid) else {
            bail!("element no longer exists");
        };
        let effects = element.on_tap.clone();
        let center = element.frame.center();
        let focusable = matches!(
            element.element_type,
            ElementType::TextField | ElementType::SecureTextField | ElementType::TextView
        );
        let uid = element.uid;
        state.gestures.push(Gesture::Tap(center));
        let bundle = self.bundle.clone();
        if focusable {
            state.app_mut(&bundle).focused = Some(uid);
        }
        state.apply_effects(&bundle, &effects);
        Ok(())
    }

    fn double_tap(&self) -> Result<()> {
        let center = self.frame().center();
        self.state.lock().unwrap().gestures.push(Gesture::DoubleTap(center));
        Ok(())
    }

    fn press_for(&self, duration: Duration) -> Result<()> {
        let center = self.frame().center();
        self.state.lock().unwrap().gestures.push(Gesture::Press(center, duration));
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        let uid = self.uid;
        let Some(app) = state.apps.get_mut(&bundle) else {
            bail!("app '{}' is not installed", bundle);
        };
        let Some(element) = app.elements.iter_mut().find(|e| e.uid == uid) else {
            bail!("element no longer exists");
        };
        apply_typed_text(&mut element.value, text);
        state.typed.push(text.to_string());
        Ok(())
    }

    fn adjust_picker_to(&self, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let bundle = self.bundle.clone();
        let uid = self.uid;
        let Some(app) = state.apps.get_mut(&bundle) else {
            bail!("app '{}' is not installed", bundle);
        };
        let Some(element) = app.elements.iter_mut().find(|e| e.uid == uid) else {
            bail!("element no longer exists");
        };
        if !element.picker_values.iter().any(|candidate| candidate == value) {
            bail!("picker has no value '{}'", value);
        }
        element.value = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SimulatedDriver {
        let driver = SimulatedDriver::new();
        driver.install_app("com.example.app");
        driver.add_element(
            "com.example.app",
            SimElement::button("Go")
                .frame(Rect::new(20.0, 100.0, 80.0, 44.0))
                .on_tap(TapEffect::SetLabel {
                    target: "Status".into(),
                    label: "OK".into(),
                }),
        );
        driver.add_element(
            "com.example.app",
            SimElement::text("Status", "Idle").frame(Rect::new(20.0, 160.0, 200.0, 30.0)),
        );
        driver
    }

    #[test]
    fn launch_brings_the_app_to_the_foreground() {
        let driver = scene();
        let app = driver.app_by_bundle("com.example.app");
        assert_eq!(app.state(), AppState::NotRunning);
        app.launch(&[], &IndexMap::new()).expect("launch");
        assert_eq!(app.state(), AppState::Foreground);
        assert!(driver.active_app().is_some());
    }

    #[test]
    fn failing_launches_consume_the_configured_count() {
        let driver = scene();
        driver.fail_launches("com.example.app", 1);
        let app = driver.app_by_bundle("com.example.app");
        assert!(app.launch(&[], &IndexMap::new()).is_err());
        assert!(app.launch(&[], &IndexMap::new()).is_ok());
    }

    #[test]
    fn tap_effects_mutate_the_scene() {
        let driver = scene();
        let app = driver.app_by_bundle("com.example.app");
        let buttons = app.query_type(ElementType::Button, Some(&Predicate::id_or_label("Go")), 1);
        assert_eq!(buttons.len(), 1);
        buttons[0].tap().expect("tap");
        assert_eq!(driver.element_label("com.example.app", "Status").as_deref(), Some("OK"));
    }

    #[test]
    fn typed_queries_filter_by_type_and_predicate() {
        let driver = scene();
        let app = driver.app_by_bundle("com.example.app");
        assert_eq!(app.query_type(ElementType::Button, None, 0).len(), 1);
        assert_eq!(app.query_type(ElementType::StaticText, None, 0).len(), 1);
        assert!(app.query_type(ElementType::Cell, None, 0).is_empty());

        let matches = app.query_descendants(&Predicate::id_or_label("Status"), 0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].label(), "Idle");
    }

    #[test]
    fn class_chain_subset_matches_typed_elements() {
        let driver = scene();
        let app = driver.app_by_bundle("com.example.app");
        let matches = app.query_class_chain("**/XCUIElementTypeButton[`label == 'Go'`]", true);
        assert_eq!(matches.len(), 1);
        assert!(app.query_class_chain("**/XCUIElementTypeCell", false).is_empty());
    }

    #[test]
    fn alert_scope_is_separate_from_the_main_scene() {
        let driver = scene();
        driver.add_element(
            "com.example.app",
            SimElement::button("Allow").in_alert().on_tap(TapEffect::DismissAlert),
        );
        let app = driver.app_by_bundle("com.example.app");
        assert_eq!(app.alert_buttons().len(), 1);
        app.alert_buttons()[0].tap().expect("tap");
        assert!(app.alert_buttons().is_empty());
    }

    #[test]
    fn typing_into_a_tapped_field_updates_its_value() {
        let driver = SimulatedDriver::new();
        driver.add_element("app", SimElement::new(ElementType::TextField, "name"));
        let app = driver.app_by_bundle("app");
        let fields = app.query_type(ElementType::TextField, None, 1);
        fields[0].tap().expect("tap focuses");
        app.type_text("hi").expect("type");
        assert_eq!(driver.element_value("app", "name").as_deref(), Some("hi"));

        app.type_text("\u{8}").expect("backspace");
        assert_eq!(driver.element_value("app", "name").as_deref(), Some("h"));
    }

    #[test]
    fn picker_adjustment_validates_the_value() {
        let driver = SimulatedDriver::new();
        driver.add_element("app", SimElement::picker("wheel", &["Red", "Green"]));
        let app = driver.app_by_bundle("app");
        let wheels = app.picker_wheels();
        assert_eq!(wheels.len(), 1);
        wheels[0].adjust_picker_to("Green").expect("adjust");
        assert_eq!(driver.element_value("app", "wheel").as_deref(), Some("Green"));
        assert!(wheels[0].adjust_picker_to("Blue").is_err());
    }

    #[test]
    fn gestures_are_recorded_in_order() {
        let driver = SimulatedDriver::new();
        driver.tap_at(Point::new(1.0, 2.0)).unwrap();
        driver
            .press_drag(Point::new(0.0, 0.0), Point::new(5.0, 5.0), Duration::from_millis(300))
            .unwrap();
        let gestures = driver.recorded_gestures();
        assert_eq!(gestures.len(), 2);
        assert_eq!(gestures[0], Gesture::Tap(Point::new(1.0, 2.0)));
    }
}
