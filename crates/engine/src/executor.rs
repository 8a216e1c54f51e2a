//! Top-level execution loop and terminal result assembly.
//!
//! The executor walks the step list sequentially, emitting a `step_start`/
//! `step_complete` pair around every top-level step and exactly one `done`
//! event at the end, whatever the outcome. Failure of a non-optional step
//! ends the run; `stop` aborts at the step boundary; a `break` that reaches
//! the top level ends the run successfully with the index recorded.

use std::time::Instant;

use serde_json::Value;
use tapkit_driver::UiDriver;
use tapkit_types::{ScriptReport, Step, StepError, StepEvent};
use tapkit_vision::VisionEngine;
use tracing::{info, warn};

use crate::context::ExecCtx;
use crate::dispatch::dispatch_step;
use crate::events::{EventClock, EventSink};
use crate::state::RunState;

/// Runs whole scripts against one driver/vision pair. Cheap to construct;
/// every [`Executor::run`] call owns fresh per-execution state.
pub struct Executor<'a> {
    driver: &'a dyn UiDriver,
    vision: &'a dyn VisionEngine,
}

impl<'a> Executor<'a> {
    pub fn new(driver: &'a dyn UiDriver, vision: &'a dyn VisionEngine) -> Self {
        Executor { driver, vision }
    }

    /// Executes the script to completion and returns the terminal report.
    pub fn run(&self, steps: &[Step], initial_variables: &serde_json::Map<String, Value>, sink: &mut dyn EventSink) -> ScriptReport {
        let started = Instant::now();
        let mut state = RunState::new(initial_variables);
        let mut clock = EventClock::new();

        // An empty script is a trivial success; no events required.
        if steps.is_empty() {
            return finish(&state, started, Outcome::Success);
        }

        let mut cx = ExecCtx {
            state: &mut state,
            driver: self.driver,
            vision: self.vision,
            sink,
            clock: &mut clock,
        };

        let timestamp_ms = cx.now_ms();
        cx.emit(StepEvent::Start {
            timestamp_ms,
            total_steps: steps.len(),
        });
        info!(total_steps = steps.len(), "script execution started");

        for (index, step) in steps.iter().enumerate() {
            let timestamp_ms = cx.now_ms();
            cx.emit(StepEvent::StepStart {
                timestamp_ms,
                index,
                action: step.action.clone(),
                step_id: step.id.clone(),
            });

            let step_started = Instant::now();
            let outcome = dispatch_step(step, &mut cx);
            let duration_ms = step_started.elapsed().as_millis() as u64;

            let timestamp_ms = cx.now_ms();
            cx.emit(StepEvent::StepComplete {
                timestamp_ms,
                index,
                action: step.action.clone(),
                success: outcome.is_ok(),
                duration_ms,
                error: outcome.as_ref().err().map(StepError::to_string),
            });

            match outcome {
                Ok(()) => {}
                Err(error) if step.optional => {
                    warn!(index, action = %step.action, error = %error, "optional step failed; continuing");
                }
                Err(error) => {
                    warn!(index, action = %step.action, error = %error, "step failed; aborting script");
                    let report = finish(
                        cx.state,
                        started,
                        Outcome::Failed {
                            index,
                            error,
                            action: step.action.clone(),
                            step_id: step.id.clone(),
                        },
                    );
                    emit_done(&mut cx, &report);
                    return report;
                }
            }

            if cx.state.should_stop {
                info!(index, "script stopped by request");
                let report = finish(cx.state, started, Outcome::Stopped { index });
                emit_done(&mut cx, &report);
                return report;
            }
            if cx.state.should_break {
                info!(index, "script ended by top-level break");
                cx.state.should_break = false;
                let report = finish(cx.state, started, Outcome::Broke { index });
                emit_done(&mut cx, &report);
                return report;
            }
        }

        let report = finish(cx.state, started, Outcome::Success);
        emit_done(&mut cx, &report);
        info!(duration_ms = report.duration_ms, "script execution finished");
        report
    }
}

/// Runs a nested step sequence (a control-flow body). Optional sub-steps log
/// and continue; signals short-circuit the rest of the sequence and are
/// handled by the enclosing loop or the executor.
pub fn run_sequence(steps: &[Step], cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    for step in steps {
        if cx.state.should_stop || cx.state.should_break {
            break;
        }
        match dispatch_step(step, cx) {
            Ok(()) => {}
            Err(error) if step.optional => {
                warn!(action = %step.action, error = %error, "optional sub-step failed; continuing");
            }
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

enum Outcome {
    Success,
    Broke {
        index: usize,
    },
    Stopped {
        index: usize,
    },
    Failed {
        index: usize,
        error: StepError,
        action: String,
        step_id: Option<String>,
    },
}

fn finish(state: &RunState, started: Instant, outcome: Outcome) -> ScriptReport {
    let mut report = ScriptReport {
        results: state.results.clone(),
        variables: state.variables_json(),
        duration_ms: started.elapsed().as_millis() as u64,
        ..Default::default()
    };
    match outcome {
        Outcome::Success => {
            report.success = true;
        }
        Outcome::Broke { index } => {
            report.success = true;
            report.stopped_at = Some(index);
            report.broke = true;
        }
        Outcome::Stopped { index } => {
            report.success = false;
            report.stopped_at = Some(index);
            report.stopped = true;
        }
        Outcome::Failed {
            index,
            error,
            action,
            step_id,
        } => {
            report.success = false;
            report.stopped_at = Some(index);
            report.error = Some(error.to_string());
            report.failed_action = Some(action);
            report.failed_step_id = step_id;
        }
    }
    report
}

fn emit_done(cx: &mut ExecCtx<'_>, report: &ScriptReport) {
    let timestamp_ms = cx.now_ms();
    cx.emit(StepEvent::Done {
        timestamp_ms,
        success: report.success,
        duration_ms: report.duration_ms,
        stopped_at: report.stopped_at,
        error: report.error.clone(),
    });
}
