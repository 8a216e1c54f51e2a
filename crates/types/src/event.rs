//! Lifecycle events streamed while a script executes.
//!
//! Each event carries a `timestamp_ms` stamped by the executor's monotonic
//! clock; within one execution timestamps never decrease, and every
//! `step_start` is paired with exactly one `step_complete` before the next
//! step begins.

use serde::{Deserialize, Serialize};

/// One lifecycle event, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// Execution is beginning.
    Start { timestamp_ms: u64, total_steps: usize },

    /// A top-level step is about to dispatch.
    StepStart {
        timestamp_ms: u64,
        index: usize,
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        step_id: Option<String>,
    },

    /// The paired completion for a `step_start`.
    StepComplete {
        timestamp_ms: u64,
        index: usize,
        action: String,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A `log` primitive or runtime notice.
    Log {
        timestamp_ms: u64,
        level: String,
        message: String,
    },

    /// A value was written to the results map.
    Result {
        timestamp_ms: u64,
        key: String,
        value: String,
    },

    /// A screenshot was captured; `size` is the encoded byte length.
    Screenshot { timestamp_ms: u64, key: String, size: usize },

    /// Terminal event: the script finished, failed, or was stopped.
    Done {
        timestamp_ms: u64,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        stopped_at: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl StepEvent {
    /// The event's timestamp, for ordering assertions.
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            StepEvent::Start { timestamp_ms, .. }
            | StepEvent::StepStart { timestamp_ms, .. }
            | StepEvent::StepComplete { timestamp_ms, .. }
            | StepEvent::Log { timestamp_ms, .. }
            | StepEvent::Result { timestamp_ms, .. }
            | StepEvent::Screenshot { timestamp_ms, .. }
            | StepEvent::Done { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_snake_case_type_tags() {
        let event = StepEvent::StepStart {
            timestamp_ms: 12,
            index: 0,
            action: "click".into(),
            step_id: None,
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "step_start");
        assert_eq!(value["index"], 0);
        assert!(value.get("step_id").is_none());
    }

    #[test]
    fn step_complete_carries_failure_details() {
        let event = StepEvent::StepComplete {
            timestamp_ms: 40,
            index: 2,
            action: "assertExists".into(),
            success: false,
            duration_ms: 210,
            error: Some("no ghost".into()),
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "step_complete");
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "no ghost");
    }

    #[test]
    fn done_round_trips_through_json() {
        let event = StepEvent::Done {
            timestamp_ms: 99,
            success: true,
            duration_ms: 1234,
            stopped_at: None,
            error: None,
        };
        let encoded = serde_json::to_value(&event).expect("serialize");
        assert_eq!(encoded, json!({"type": "done", "timestamp_ms": 99, "success": true, "duration_ms": 1234}));
        let decoded: StepEvent = serde_json::from_value(encoded).expect("deserialize");
        assert_eq!(decoded, event);
    }
}
