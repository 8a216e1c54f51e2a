//! # tapkit script interpreter
//!
//! The core of tapkit: a small embedded interpreter that executes a declarative
//! script (an ordered list of typed steps) against the UI driver and vision
//! facades. One execution owns a [`RunState`] (the results/variables value
//! store, one-shot break/stop signals, and the element cache), dispatches each
//! step through a closed action table, and emits lifecycle events to a
//! pluggable [`EventSink`].
//!
//! Execution is synchronous and single-threaded by design: primitives that
//! must wait poll the live UI with short sleeps, and transports bridge to
//! async with a blocking task plus an event channel. Nothing here is shared
//! across concurrent executions; the driver and vision facades are the only
//! process-global collaborators.

pub mod conditions;
pub mod context;
pub mod control;
pub mod dispatch;
pub mod events;
pub mod executor;
pub mod handlers;
pub mod interpolate;
pub mod selector;
pub mod state;

pub use context::ExecCtx;
pub use events::{ChannelSink, EventClock, EventSink, MemorySink, NullSink};
pub use executor::Executor;
pub use state::{ElementSnapshot, RunState};
