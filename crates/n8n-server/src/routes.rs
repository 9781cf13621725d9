//! HTTP route handlers.

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
use n8n_core::node_types::list_node_type_descriptions;
use n8n_workflow::{DataObject, GenericValue, NodeExecutionData, Workflow, WorkflowExecuteMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::sse::event_stream;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/nodes", axum::routing::get(list_nodes))
        .route(
            "/workflows",
            axum::routing::get(list_workflows).post(create_workflow),
        )
        .route(
            "/workflows/:id",
            axum::routing::get(get_workflow)
                .put(update_workflow)
                .delete(delete_workflow),
        )
        .route("/workflows/:id/run", axum::routing::post(run_workflow))
        .route("/workflows/run-adhoc", axum::routing::post(run_adhoc))
        .route(
            "/execution-stream/:id",
            axum::routing::get(execution_stream),
        )
        .route(
            "/execution-stream/adhoc",
            axum::routing::post(execution_stream_adhoc),
        )
        .route(
            "/webhook/:workflow_id",
            axum::routing::get(webhook)
                .post(webhook)
                .put(webhook)
                .delete(webhook),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_nodes() -> Json<Vec<n8n_workflow::NodeTypeDescription>> {
    Json(list_node_type_descriptions())
}

async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<Vec<Workflow>>, ApiError> {
    let workflows = state.workflow_storage.list_workflows().await?;
    Ok(Json(workflows))
}

async fn create_workflow(
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> Result<Json<Workflow>, ApiError> {
    state.workflow_storage.save_workflow(&workflow).await?;
    Ok(Json(workflow))
}

async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Workflow>, ApiError> {
    state
        .workflow_storage
        .get_workflow(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("workflow '{id}' not found")))
}

async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut workflow): Json<Workflow>,
) -> Result<Json<Workflow>, ApiError> {
    workflow.id = id;
    workflow.updated_at = Some(chrono::Utc::now());
    state.workflow_storage.save_workflow(&workflow).await?;
    Ok(Json(workflow))
}

async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.workflow_storage.delete_workflow(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("workflow '{id}' not found")))
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    input_data: Option<Vec<NodeExecutionData>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunAdhocRequest {
    workflow: Workflow,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    input_data: Option<Vec<NodeExecutionData>>,
}

fn parse_mode(mode: Option<&str>) -> WorkflowExecuteMode {
    mode.and_then(WorkflowExecuteMode::from_str)
        .unwrap_or(WorkflowExecuteMode::Manual)
}

async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RunRequest>>,
) -> Result<Json<n8n_workflow::Run>, ApiError> {
    let workflow = state
        .workflow_storage
        .get_workflow(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("workflow '{id}' not found")))?;

    let req = body.map(|Json(r)| r).unwrap_or_default();
    let mode = parse_mode(req.mode.as_deref());

    let run = state.engine.execute(&workflow, mode, req.input_data).await?;

    let execution_id = Uuid::new_v4().to_string();
    state
        .execution_storage
        .save_execution(&execution_id, &run)
        .await?;

    Ok(Json(run))
}

async fn run_adhoc(
    State(state): State<AppState>,
    Json(req): Json<RunAdhocRequest>,
) -> Result<Json<n8n_workflow::Run>, ApiError> {
    let mode = parse_mode(req.mode.as_deref());
    let run = state
        .engine
        .execute(&req.workflow, mode, req.input_data)
        .await?;

    let execution_id = Uuid::new_v4().to_string();
    state
        .execution_storage
        .save_execution(&execution_id, &run)
        .await?;

    Ok(Json(run))
}

async fn execution_stream(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = state
        .workflow_storage
        .get_workflow(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("workflow '{id}' not found")))?;

    let (tx, rx) = mpsc::channel(100);
    let engine = state.engine.clone();
    let execution_storage = state.execution_storage.clone();

    tokio::spawn(async move {
        let result = engine
            .execute_with_events(&workflow, WorkflowExecuteMode::Manual, None, tx)
            .await;

        if let Ok(run) = result {
            let execution_id = Uuid::new_v4().to_string();
            let _ = execution_storage.save_execution(&execution_id, &run).await;
        }
    });

    Ok(event_stream(rx))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdhocStreamRequest {
    workflow: Workflow,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    input_data: Option<Vec<NodeExecutionData>>,
}

async fn execution_stream_adhoc(
    State(state): State<AppState>,
    Json(req): Json<AdhocStreamRequest>,
) -> impl IntoResponse {
    let mode = parse_mode(req.mode.as_deref());
    let (tx, rx) = mpsc::channel(100);
    let engine = state.engine.clone();
    let execution_storage = state.execution_storage.clone();

    tokio::spawn(async move {
        let result = engine
            .execute_with_events(&req.workflow, mode, req.input_data, tx)
            .await;

        if let Ok(run) = result {
            let execution_id = Uuid::new_v4().to_string();
            let _ = execution_storage.save_execution(&execution_id, &run).await;
        }
    });

    event_stream(rx)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookReceivedResponse {
    status: &'static str,
    execution_id: String,
}

async fn webhook(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    method: Method,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = state
        .workflow_storage
        .get_workflow(&workflow_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("workflow '{workflow_id}' not found")))?;

    let webhook_node = workflow
        .nodes
        .iter()
        .find(|n| n.node_type == "n8n-nodes-base.webhook")
        .ok_or_else(|| ApiError::bad_request("workflow has no webhook trigger node"))?;

    let response_mode = webhook_node
        .parameters
        .get("responseMode")
        .and_then(|v| match v {
            n8n_workflow::NodeParameterValue::String(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "onReceived".to_string());

    let json_body = body.map(|Json(v)| v).unwrap_or(Value::Null);
    let item_json = json_to_data_object(&json_body, method.as_str());
    let input_data = vec![NodeExecutionData::new(item_json)];

    let execution_id = Uuid::new_v4().to_string();

    if response_mode == "lastNode" {
        let run = state
            .engine
            .execute(&workflow, WorkflowExecuteMode::Webhook, Some(input_data))
            .await?;
        state
            .execution_storage
            .save_execution(&execution_id, &run)
            .await?;

        let last_item = last_node_item(&run);
        Ok(Json(last_item.unwrap_or(Value::Null)).into_response())
    } else {
        let engine = state.engine.clone();
        let execution_storage = state.execution_storage.clone();
        let execution_id_for_task = execution_id.clone();

        tokio::spawn(async move {
            let result = engine
                .execute(
                    &workflow,
                    WorkflowExecuteMode::Webhook,
                    Some(input_data),
                )
                .await;
            if let Ok(run) = result {
                let _ = execution_storage
                    .save_execution(&execution_id_for_task, &run)
                    .await;
            }
        });

        Ok(Json(WebhookReceivedResponse {
            status: "received",
            execution_id,
        })
        .into_response())
    }
}

fn json_to_data_object(value: &Value, http_method: &str) -> DataObject {
    let mut obj = match json_value_to_generic(value) {
        GenericValue::Object(map) => map,
        _ => DataObject::new(),
    };
    obj.entry("httpMethod".to_string())
        .or_insert_with(|| GenericValue::String(http_method.to_string()));
    obj
}

fn json_value_to_generic(value: &Value) -> GenericValue {
    match value {
        Value::Null => GenericValue::Null,
        Value::Bool(b) => GenericValue::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                GenericValue::Integer(i)
            } else {
                GenericValue::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => GenericValue::String(s.clone()),
        Value::Array(items) => GenericValue::Array(items.iter().map(json_value_to_generic).collect()),
        Value::Object(map) => {
            let mut obj = DataObject::new();
            for (k, v) in map {
                obj.insert(k.clone(), json_value_to_generic(v));
            }
            GenericValue::Object(obj)
        }
    }
}

/// Extract the last item of the last node's main output, for the
/// webhook `lastNode` response mode.
fn last_node_item(run: &n8n_workflow::Run) -> Option<Value> {
    let (_, task_data_list) = run.data.result_data.run_data.iter().last()?;
    let task_data = task_data_list.last()?;
    let main = task_data.data.as_ref()?.get("main")?;
    let port = main.last()?;
    let items = port.items()?;
    let last = items.last()?;
    serde_json::to_value(&last.json).ok()
}
