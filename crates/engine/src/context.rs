//! Execution context threaded through every handler.

use tapkit_driver::{AppHandle, UiDriver};
use tapkit_types::{ScriptValue, StepEvent};
use tapkit_vision::VisionEngine;

use crate::events::{EventClock, EventSink};
use crate::state::RunState;

/// Mutable state plus the external facades one execution runs against.
pub struct ExecCtx<'a> {
    pub state: &'a mut RunState,
    pub driver: &'a dyn UiDriver,
    pub vision: &'a dyn VisionEngine,
    pub sink: &'a mut dyn EventSink,
    pub clock: &'a mut EventClock,
}

impl ExecCtx<'_> {
    /// Monotonic timestamp for the next event.
    pub fn now_ms(&mut self) -> u64 {
        self.clock.now_ms()
    }

    pub fn emit(&mut self, event: StepEvent) {
        self.sink.emit(event);
    }

    /// Emits a `log` event (in addition to whatever tracing the caller does).
    pub fn emit_log(&mut self, level: &str, message: &str) {
        let timestamp_ms = self.now_ms();
        self.emit(StepEvent::Log {
            timestamp_ms,
            level: level.to_string(),
            message: message.to_string(),
        });
    }

    /// Writes an output value through the value store (scalars mirror into
    /// results) and announces it with a `result` event.
    pub fn record(&mut self, key: &str, value: ScriptValue) {
        let coerced = value.coerce_string();
        self.state.set_variable(key, value);
        let timestamp_ms = self.now_ms();
        self.emit(StepEvent::Result {
            timestamp_ms,
            key: key.to_string(),
            value: coerced,
        });
    }

    /// The app the next UI primitive should target: the recorded current app
    /// when one was launched or activated, otherwise whatever is frontmost,
    /// otherwise the springboard.
    pub fn app(&self) -> Box<dyn AppHandle> {
        if let Some(bundle) = &self.state.current_app {
            return self.driver.app_by_bundle(bundle);
        }
        self.driver.active_app().unwrap_or_else(|| self.driver.springboard())
    }
}
