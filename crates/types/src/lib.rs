//! # tapkit wire types
//!
//! Shared data shapes for the script interpreter: the [`Step`] record decoded
//! from request JSON, the tagged [`ScriptValue`] stored in the variables map,
//! lifecycle [`StepEvent`]s streamed to clients, the terminal [`ScriptReport`],
//! and the [`StepError`] taxonomy every primitive reports through.
//!
//! This crate is deliberately leaf-level: it depends only on serde and friends
//! so the driver, vision, engine, and server crates can all share it without
//! dragging in each other's concerns.

pub mod error;
pub mod event;
pub mod report;
pub mod step;
pub mod value;

pub use error::StepError;
pub use event::StepEvent;
pub use report::ScriptReport;
pub use step::Step;
pub use value::ScriptValue;
