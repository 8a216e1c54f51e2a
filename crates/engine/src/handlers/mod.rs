//! Primitive handlers, grouped by concern.
//!
//! Every handler has the same shape: it receives the resolved step (arguments
//! already interpolated) and the execution context, performs one primitive,
//! and reports through the [`StepError`] taxonomy. Handlers that produce
//! output write it through `ExecCtx::record` so the results mirror and the
//! `result` event stay consistent.

pub mod alerts;
pub mod app;
pub mod assert;
pub mod date;
pub mod element;
pub mod elements;
pub mod gesture;
pub mod input;
pub mod math;
pub mod picker;
pub mod util;
pub mod vars;
pub mod vision;

use tapkit_driver::SelectorKind;
use tapkit_types::{Step, StepError};

use crate::state::RunState;

/// Default timeout for element-facing primitives, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// Reads the `selector`/`selectorType` pair shared by element primitives.
pub(crate) fn selector_of(step: &Step) -> Result<(String, SelectorKind), StepError> {
    let selector = step.require_str("selector")?;
    let kind = step
        .str_arg("selectorType")
        .map(|name| SelectorKind::parse(&name))
        .unwrap_or_default();
    Ok((selector, kind))
}

/// Required result key (`as`) for primitives that produce output.
pub(crate) fn result_key(step: &Step) -> Result<String, StepError> {
    step.result_key
        .clone()
        .ok_or_else(|| StepError::InvalidArgument(format!("'{}' requires an 'as' argument", step.action)))
}

/// A coordinate given either literally (`x`) or by variable name (`xVar`).
pub(crate) fn coordinate(step: &Step, state: &RunState, literal_key: &str, var_key: &str) -> Result<f64, StepError> {
    if let Some(value) = step.f64_arg(literal_key) {
        return Ok(value);
    }
    if let Some(name) = step.str_arg(var_key) {
        return state
            .numeric(&name)
            .ok_or_else(|| StepError::InvalidArgument(format!("variable '{name}' is not numeric")));
    }
    Err(StepError::InvalidArgument(format!(
        "'{}' requires '{}' or '{}'",
        step.action, literal_key, var_key
    )))
}

/// Shared shape check in tests.
#[cfg(test)]
pub(crate) mod testutil {
    use serde_json::Value;
    use tapkit_driver::sim::SimulatedDriver;
    use tapkit_types::{Step, StepError};
    use tapkit_vision::StaticVision;

    use crate::context::ExecCtx;
    use crate::dispatch::dispatch_step;
    use crate::events::{EventClock, MemorySink};
    use crate::state::RunState;

    /// Drives a single step against a simulated scene.
    pub struct Harness {
        pub driver: SimulatedDriver,
        pub vision: StaticVision,
        pub state: RunState,
        pub sink: MemorySink,
        pub clock: EventClock,
    }

    impl Harness {
        pub fn new(driver: SimulatedDriver) -> Self {
            Harness {
                driver,
                vision: StaticVision::new(),
                state: RunState::default(),
                sink: MemorySink::new(),
                clock: EventClock::new(),
            }
        }

        pub fn with_vision(mut self, vision: StaticVision) -> Self {
            self.vision = vision;
            self
        }

        pub fn targeting(mut self, bundle: &str) -> Self {
            self.state.current_app = Some(bundle.to_string());
            self
        }

        pub fn run(&mut self, step_json: Value) -> Result<(), StepError> {
            let step: Step = serde_json::from_value(step_json).expect("step decodes");
            let mut cx = ExecCtx {
                state: &mut self.state,
                driver: &self.driver,
                vision: &self.vision,
                sink: &mut self.sink,
                clock: &mut self.clock,
            };
            dispatch_step(&step, &mut cx)
        }

        pub fn result(&self, key: &str) -> Option<&str> {
            self.state.results.get(key).map(String::as_str)
        }
    }
}
