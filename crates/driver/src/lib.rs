//! # tapkit UI driver facade
//!
//! The interpreter never talks to a UI-test runtime directly; it consumes the
//! narrow capability traits defined here. [`UiDriver`] covers device-level
//! actions (gestures by coordinate, screenshots, hardware buttons),
//! [`AppHandle`] covers per-application queries and lifecycle, and
//! [`UiElement`] covers one live element. Implementations are free to wrap
//! whatever native facilities the host offers; the engine only assumes that
//! queries return fresh snapshots on every call, because the UI mutates
//! asynchronously underneath it.
//!
//! [`sim::SimulatedDriver`] is a complete in-memory implementation used by the
//! test suite and the demo server binary.

pub mod geometry;
pub mod predicate;
pub mod selector;
pub mod sim;
mod traits;

pub use geometry::{Point, Rect, Size};
pub use predicate::Predicate;
pub use selector::{ElementType, SelectorKind};
pub use traits::{AppHandle, AppState, ElementRef, Screenshot, UiDriver, UiElement};
