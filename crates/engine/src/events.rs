//! Event sinks and the per-execution monotonic clock.
//!
//! The executor emits every lifecycle event synchronously at the step boundary
//! it belongs to. Sinks must therefore be cheap and non-blocking; the channel
//! sink drops writes once the receiver is gone, so a disconnected streaming
//! client never stalls or aborts a running script.

use std::time::{SystemTime, UNIX_EPOCH};

use tapkit_types::StepEvent;
use tokio::sync::mpsc::UnboundedSender;

/// Receives lifecycle events as they happen.
pub trait EventSink: Send {
    fn emit(&mut self, event: StepEvent);
}

/// Discards every event; used by the blocking `/script` endpoint.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: StepEvent) {}
}

/// Collects events in memory, for tests and previews.
#[derive(Default)]
pub struct MemorySink {
    pub events: Vec<StepEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: StepEvent) {
        self.events.push(event);
    }
}

/// Forwards events over an unbounded channel to an async consumer. Send
/// failures mean the consumer hung up; they are dropped silently.
pub struct ChannelSink {
    sender: UnboundedSender<StepEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<StepEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: StepEvent) {
        let _ = self.sender.send(event);
    }
}

/// Wall-clock milliseconds clamped to be non-decreasing within one execution,
/// so event timestamps stay ordered even if the system clock steps backwards.
#[derive(Debug, Default)]
pub struct EventClock {
    last_ms: u64,
}

impl EventClock {
    pub fn new() -> Self {
        EventClock::default()
    }

    pub fn now_ms(&mut self) -> u64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        self.last_ms = wall.max(self.last_ms);
        self.last_ms
    }
}
