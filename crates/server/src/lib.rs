//! # tapkit HTTP transport
//!
//! Two script endpoints over one shared driver/vision pair:
//!
//! - `POST /script` runs the script to completion on a blocking task and
//!   returns the terminal report as JSON.
//! - `POST /script/stream` responds with Server-Sent Events: one
//!   `data: {json}` frame per lifecycle event, the full terminal report as
//!   the final frame, then the connection closes.
//!
//! Only request-shape problems are HTTP errors (400 with a fixed message);
//! script-internal failures come back as status 200 with `success: false`.
//! A streaming client that disconnects mid-run does not abort the script —
//! the channel sink simply drops further events.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use tapkit_driver::UiDriver;
use tapkit_engine::{ChannelSink, Executor, NullSink};
use tapkit_types::Step;
use tapkit_vision::VisionEngine;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

const STEPS_REQUIRED: &str = "'steps' array is required";
const STEP_NOT_DICT: &str = "Each step must be a dictionary";

/// Shared facades handed to every execution.
#[derive(Clone)]
pub struct ServerState {
    pub driver: Arc<dyn UiDriver>,
    pub vision: Arc<dyn VisionEngine>,
}

impl ServerState {
    pub fn new(driver: Arc<dyn UiDriver>, vision: Arc<dyn VisionEngine>) -> Self {
        ServerState { driver, vision }
    }
}

/// Builds the script router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/script", post(run_script))
        .route("/script/stream", post(stream_script))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// A decoded script request: the step list and optional initial variables.
struct ScriptRequest {
    steps: Vec<Step>,
    variables: serde_json::Map<String, Value>,
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message}))).into_response()
}

fn decode_request(body: Result<Json<Value>, JsonRejection>) -> Result<ScriptRequest, Response> {
    let Ok(Json(value)) = body else {
        return Err(bad_request(STEPS_REQUIRED));
    };
    let Some(raw_steps) = value.get("steps").and_then(Value::as_array) else {
        return Err(bad_request(STEPS_REQUIRED));
    };

    let mut steps = Vec::with_capacity(raw_steps.len());
    for raw in raw_steps {
        if !raw.is_object() {
            return Err(bad_request(STEP_NOT_DICT));
        }
        let step: Step = serde_json::from_value(raw.clone()).map_err(|_| bad_request(STEP_NOT_DICT))?;
        steps.push(step);
    }

    let variables = value
        .get("variables")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(ScriptRequest { steps, variables })
}

async fn run_script(State(state): State<ServerState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let request = match decode_request(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(steps = request.steps.len(), "script request accepted");

    let driver = Arc::clone(&state.driver);
    let vision = Arc::clone(&state.vision);
    let outcome = tokio::task::spawn_blocking(move || {
        let executor = Executor::new(driver.as_ref(), vision.as_ref());
        executor.run(&request.steps, &request.variables, &mut NullSink)
    })
    .await;

    match outcome {
        Ok(report) => Json(report).into_response(),
        Err(join_error) => {
            error!(error = %join_error, "script execution task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "script execution failed"})),
            )
                .into_response()
        }
    }
}

async fn stream_script(State(state): State<ServerState>, body: Result<Json<Value>, JsonRejection>) -> Response {
    let request = match decode_request(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(steps = request.steps.len(), "streaming script request accepted");

    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let (report_tx, report_rx) = tokio::sync::oneshot::channel();
    let driver = Arc::clone(&state.driver);
    let vision = Arc::clone(&state.vision);

    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink::new(event_tx);
        let executor = Executor::new(driver.as_ref(), vision.as_ref());
        let report = executor.run(&request.steps, &request.variables, &mut sink);
        let _ = report_tx.send(report);
    });

    // Lifecycle events first; the full terminal report is the final frame,
    // after which dropping both channels closes the connection.
    let events = UnboundedReceiverStream::new(event_rx).map(|event| Event::default().json_data(&event));
    let terminal = futures_util::stream::once(async move {
        match report_rx.await {
            Ok(report) => Event::default().json_data(&report),
            Err(_) => Ok(Event::default().comment("execution task ended abnormally")),
        }
    });
    Sse::new(events.chain(terminal)).into_response()
}
