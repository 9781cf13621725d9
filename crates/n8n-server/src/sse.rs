//! Server-sent events for live execution streams.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use n8n_core::ExecutionEvent;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// Turn a channel of engine events into an SSE response, one `data:` line
/// per event with the event name mirrored into the SSE `event:` field.
pub fn event_stream(
    rx: mpsc::Receiver<ExecutionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(rx).map(|event| {
        let name = event.event_name();
        let data = execution_event_json(&event);
        Ok(Event::default().event(name).data(data.to_string()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Render an `ExecutionEvent` as the JSON payload carried in its `data:` line.
fn execution_event_json(event: &ExecutionEvent) -> serde_json::Value {
    match event {
        ExecutionEvent::ExecutionStart {
            execution_id,
            workflow_id,
        } => serde_json::json!({
            "executionId": execution_id,
            "workflowId": workflow_id,
        }),
        ExecutionEvent::NodeStart { node_name, run_index } => serde_json::json!({
            "nodeName": node_name,
            "runIndex": run_index,
        }),
        ExecutionEvent::NodeComplete {
            node_name,
            run_index,
            task_data,
        } => serde_json::json!({
            "nodeName": node_name,
            "runIndex": run_index,
            "taskData": task_data,
        }),
        ExecutionEvent::NodeError {
            node_name,
            run_index,
            error,
        } => serde_json::json!({
            "nodeName": node_name,
            "runIndex": run_index,
            "error": error,
        }),
        ExecutionEvent::ExecutionError { error } => serde_json::json!({ "error": error }),
        ExecutionEvent::ExecutionComplete { result } => serde_json::json!({ "result": result }),
    }
}
