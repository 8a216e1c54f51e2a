//! Per-execution run state: the value store, signals, and element cache.
//!
//! The value store is two maps. *Results* is the user-visible surface and is
//! always strings. *Variables* is typed. Scalar variable writes mirror into
//! results through the canonical coercion, so the two can never disagree;
//! compound values (element lists, rects) and reserved `_`-prefixed runtime
//! variables live only on the variables side.

use indexmap::IndexMap;
use serde_json::Value;
use tapkit_driver::{Rect, UiElement};
use tapkit_types::ScriptValue;

/// Reserved variable names written by the runtime. Scripts should not use
/// these as their own keys.
pub mod reserved {
    pub const ITERATION: &str = "_iteration";
    pub const INDEX: &str = "_index";
    pub const ERROR: &str = "_error";
    pub const RETURN_VALUE: &str = "_returnValue";
    pub const APP_BUNDLE_ID: &str = "_appBundleId";
    pub const APP_STATE: &str = "_appState";
}

/// Everything one execution owns. Never shared across executions.
#[derive(Debug, Default)]
pub struct RunState {
    /// String results, in insertion order.
    pub results: IndexMap<String, String>,
    /// Typed variables, in insertion order.
    pub variables: IndexMap<String, ScriptValue>,
    /// One-shot signal: unwind exactly one enclosing loop.
    pub should_break: bool,
    /// One-shot signal: abort the whole script at the next step boundary.
    pub should_stop: bool,
    /// Element cache refreshed by `findElements`, consumed by `forEach`.
    pub elements: Vec<ElementSnapshot>,
    /// Bundle id recorded by the last `launch`/`activate`.
    pub current_app: Option<String>,
}

impl RunState {
    /// Fresh state seeded with the request's initial variables.
    pub fn new(initial_variables: &serde_json::Map<String, Value>) -> Self {
        let mut state = RunState::default();
        for (name, value) in initial_variables {
            state.set_variable(name, ScriptValue::from_json(value));
        }
        state
    }

    /// Writes a variable, mirroring scalars into results. Reserved names and
    /// compound values stay variables-only.
    pub fn set_variable(&mut self, key: &str, value: ScriptValue) {
        if value.is_scalar() && !key.starts_with('_') {
            self.results.insert(key.to_string(), value.coerce_string());
        }
        self.variables.insert(key.to_string(), value);
    }

    /// Writes a variable without the results mirror, for bulky payloads such
    /// as base64 screenshots that are opt-in on the results side.
    pub fn set_variable_unmirrored(&mut self, key: &str, value: ScriptValue) {
        self.variables.insert(key.to_string(), value);
    }

    /// Writes to the results map only.
    pub fn set_result(&mut self, key: &str, value: String) {
        self.results.insert(key.to_string(), value);
    }

    /// Typed variable lookup.
    pub fn variable(&self, name: &str) -> Option<&ScriptValue> {
        self.variables.get(name)
    }

    /// Text used by interpolation: variables first, results as fallback,
    /// missing names resolve to `None`.
    pub fn lookup_text(&self, name: &str) -> Option<String> {
        if let Some(value) = self.variables.get(name) {
            return Some(value.coerce_string());
        }
        self.results.get(name).cloned()
    }

    /// Numeric view of a variable (or a numeric result string).
    pub fn numeric(&self, name: &str) -> Option<f64> {
        if let Some(value) = self.variables.get(name) {
            return value.as_f64();
        }
        self.results.get(name)?.trim().parse().ok()
    }

    /// Writes a rect under `key` plus its sibling component keys.
    pub fn set_rect(&mut self, key: &str, rect: Rect) {
        let center = rect.center();
        let mut record = IndexMap::new();
        record.insert("x".to_string(), ScriptValue::Number(rect.x));
        record.insert("y".to_string(), ScriptValue::Number(rect.y));
        record.insert("width".to_string(), ScriptValue::Number(rect.width));
        record.insert("height".to_string(), ScriptValue::Number(rect.height));
        record.insert("centerX".to_string(), ScriptValue::Number(center.x));
        record.insert("centerY".to_string(), ScriptValue::Number(center.y));
        self.set_variable(key, ScriptValue::Record(record));
        self.set_result(key, format!("{{{},{},{},{}}}", rect.x, rect.y, rect.width, rect.height));
        self.set_variable(&format!("{key}_x"), ScriptValue::Number(rect.x));
        self.set_variable(&format!("{key}_y"), ScriptValue::Number(rect.y));
        self.set_variable(&format!("{key}_width"), ScriptValue::Number(rect.width));
        self.set_variable(&format!("{key}_height"), ScriptValue::Number(rect.height));
        self.set_variable(&format!("{key}_centerX"), ScriptValue::Number(center.x));
        self.set_variable(&format!("{key}_centerY"), ScriptValue::Number(center.y));
    }

    /// Variables coerced to JSON for the terminal report.
    pub fn variables_json(&self) -> serde_json::Map<String, Value> {
        self.variables
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

/// Immutable descriptor of one element captured by `findElements`.
///
/// Snapshots deliberately hold plain data, not element handles: the UI mutates
/// between steps, and `forEach` iterates over what was seen at capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSnapshot {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub label: String,
    pub value: String,
    pub identifier: String,
    pub is_enabled: bool,
    pub is_hittable: bool,
}

impl ElementSnapshot {
    pub fn capture(index: usize, element: &dyn UiElement) -> Self {
        let frame = element.frame();
        let center = frame.center();
        ElementSnapshot {
            index,
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            center_x: center.x,
            center_y: center.y,
            label: element.label(),
            value: element.value(),
            identifier: element.identifier(),
            is_enabled: element.is_enabled(),
            is_hittable: element.is_hittable(),
        }
    }

    /// Record form stored in the element cache variable.
    pub fn to_record(&self) -> ScriptValue {
        let mut record = IndexMap::new();
        record.insert("index".to_string(), ScriptValue::Number(self.index as f64));
        record.insert("x".to_string(), ScriptValue::Number(self.x));
        record.insert("y".to_string(), ScriptValue::Number(self.y));
        record.insert("width".to_string(), ScriptValue::Number(self.width));
        record.insert("height".to_string(), ScriptValue::Number(self.height));
        record.insert("centerX".to_string(), ScriptValue::Number(self.center_x));
        record.insert("centerY".to_string(), ScriptValue::Number(self.center_y));
        record.insert("label".to_string(), ScriptValue::Str(self.label.clone()));
        record.insert("value".to_string(), ScriptValue::Str(self.value.clone()));
        record.insert("identifier".to_string(), ScriptValue::Str(self.identifier.clone()));
        record.insert("isEnabled".to_string(), ScriptValue::Bool(self.is_enabled));
        record.insert("isHittable".to_string(), ScriptValue::Bool(self.is_hittable));
        ScriptValue::Record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_variable_writes_mirror_into_results() {
        let mut state = RunState::default();
        state.set_variable("n", ScriptValue::Number(3.0));
        assert_eq!(state.results.get("n").map(String::as_str), Some("3"));
        assert_eq!(state.variables.get("n"), Some(&ScriptValue::Number(3.0)));
    }

    #[test]
    fn reserved_and_compound_values_stay_variables_only() {
        let mut state = RunState::default();
        state.set_variable("_iteration", ScriptValue::Number(1.0));
        state.set_variable("list", ScriptValue::List(vec![ScriptValue::Number(1.0)]));
        assert!(state.results.get("_iteration").is_none());
        assert!(state.results.get("list").is_none());
        assert!(state.variables.contains_key("list"));
    }

    #[test]
    fn initial_variables_seed_both_maps() {
        let initial = json!({"app": "demo", "n": 2}).as_object().unwrap().clone();
        let state = RunState::new(&initial);
        assert_eq!(state.lookup_text("app").as_deref(), Some("demo"));
        assert_eq!(state.results.get("n").map(String::as_str), Some("2"));
    }

    #[test]
    fn lookup_prefers_variables_over_results() {
        let mut state = RunState::default();
        state.set_result("k", "from-results".into());
        assert_eq!(state.lookup_text("k").as_deref(), Some("from-results"));
        state.set_variable_unmirrored("k", ScriptValue::Str("from-variables".into()));
        assert_eq!(state.lookup_text("k").as_deref(), Some("from-variables"));
    }

    #[test]
    fn set_rect_writes_all_sibling_keys() {
        let mut state = RunState::default();
        state.set_rect("r", Rect::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(state.numeric("r_x"), Some(10.0));
        assert_eq!(state.numeric("r_centerX"), Some(60.0));
        assert_eq!(state.numeric("r_centerY"), Some(45.0));
        assert_eq!(state.results.get("r_width").map(String::as_str), Some("100"));
        assert!(matches!(state.variable("r"), Some(ScriptValue::Record(_))));
    }
}
