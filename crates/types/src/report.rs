//! The terminal result returned after one script execution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured outcome of a full script run, returned as the response body of
/// `POST /script` and as the final frame of `POST /script/stream`.
///
/// `stopped_at` is `None` exactly when the script succeeded with no top-level
/// `break`; a deliberate `stop` sets `stopped: true` with `success: false`,
/// and a `break` that unwound to the top level sets `break: true` with
/// `success: true`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptReport {
    pub success: bool,

    /// The user-visible result surface: always strings.
    pub results: IndexMap<String, String>,

    /// Typed variables coerced to JSON.
    pub variables: serde_json::Map<String, Value>,

    #[serde(rename = "stoppedAt")]
    pub stopped_at: Option<usize>,

    pub error: Option<String>,

    #[serde(rename = "failedAction", skip_serializing_if = "Option::is_none")]
    pub failed_action: Option<String>,

    #[serde(rename = "failedStepId", skip_serializing_if = "Option::is_none")]
    pub failed_step_id: Option<String>,

    pub duration_ms: u64,

    /// Set when a top-level `break` ended the script early.
    #[serde(rename = "break", default, skip_serializing_if = "std::ops::Not::not")]
    pub broke: bool,

    /// Set when `stop` aborted the script.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stopped: bool,
}
