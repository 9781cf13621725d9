//! Node executor trait and implementations.

use crate::code_sandbox;
use crate::condition;
use crate::error::ExecutionEngineError;
use crate::expression::{self, ExpressionContext};
use crate::runtime::RuntimeContext;
use async_trait::async_trait;
use n8n_workflow::{
    DataObject, GenericValue, Node, NodeExecutionData, NodeParameterValue, PortData,
    TaskDataConnections,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of node execution: one `PortData` per output port, in port order.
pub type NodeOutput = Vec<PortData>;

/// Trait for executing nodes.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Get the node type this executor handles.
    fn node_type(&self) -> &str;

    /// Execute the node with the given input data.
    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError>;
}

/// Registry of node executors.
pub struct NodeExecutorRegistry {
    executors: HashMap<String, Arc<dyn NodeExecutor>>,
}

impl NodeExecutorRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            executors: HashMap::new(),
        };

        // Triggers
        registry.register(Arc::new(ManualTriggerExecutor));
        registry.register(Arc::new(ScheduleTriggerExecutor));
        registry.register(Arc::new(WebhookTriggerExecutor));
        registry.register(Arc::new(ErrorTriggerExecutor));

        // Data and flow
        registry.register(Arc::new(SetExecutor));
        registry.register(Arc::new(CodeExecutor));
        registry.register(Arc::new(IfExecutor));
        registry.register(Arc::new(MergeExecutor));
        registry.register(Arc::new(NoOpExecutor));
        registry.register(Arc::new(HttpRequestExecutor));

        // P0 Flow Control nodes
        registry.register(Arc::new(SwitchExecutor));
        registry.register(Arc::new(FilterExecutor));
        registry.register(Arc::new(SortExecutor));
        registry.register(Arc::new(LimitExecutor));
        registry.register(Arc::new(RemoveDuplicatesExecutor));
        registry.register(Arc::new(AggregateExecutor));
        registry.register(Arc::new(SplitInBatchesExecutor));
        registry.register(Arc::new(WaitExecutor));
        registry.register(Arc::new(StopAndErrorExecutor));
        registry.register(Arc::new(ExecuteWorkflowExecutor));

        // AI nodes
        registry.register(Arc::new(LlmChatExecutor));
        registry.register(Arc::new(AiAgentExecutor));

        registry
    }

    /// Register a node executor.
    pub fn register(&mut self, executor: Arc<dyn NodeExecutor>) {
        self.executors
            .insert(executor.node_type().to_string(), executor);
    }

    /// Get an executor for a node type.
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(node_type).cloned()
    }
}

impl Default for NodeExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the items delivered on the first `main` input port, treating a
/// missing port or an explicit `NoOutput` the same as an empty item list.
fn main_items(input: &TaskDataConnections) -> Vec<NodeExecutionData> {
    input
        .get("main")
        .and_then(|ports| ports.first())
        .and_then(PortData::items)
        .map(|items| items.to_vec())
        .unwrap_or_default()
}

/// Pull every item port delivered under `main`, in connection order.
fn main_ports(input: &TaskDataConnections) -> &[PortData] {
    input.get("main").map(|v| v.as_slice()).unwrap_or(&[])
}

/// Turn a branch-node's (`If`/`Switch`) matched items into the port's
/// `PortData`. An empty match list becomes `NoOutput` (killing single-input
/// successors fed only by this port) unless the node was configured to
/// always emit data. Every other executor's empty result is a legitimately
/// empty `Items(vec![])` instead — see `PortData` — so this conversion is
/// deliberately scoped to the two branch-routing node kinds.
fn branch_port(items: Vec<NodeExecutionData>, always_output_data: bool) -> PortData {
    if items.is_empty() && !always_output_data {
        PortData::NoOutput
    } else {
        PortData::Items(items)
    }
}

fn get_string_param(node: &Node, key: &str) -> Option<String> {
    match node.parameters.get(key) {
        Some(NodeParameterValue::String(s)) | Some(NodeParameterValue::Expression(s)) => {
            Some(s.clone())
        }
        _ => None,
    }
}

fn get_number_param(node: &Node, key: &str) -> Option<f64> {
    match node.parameters.get(key) {
        Some(NodeParameterValue::Number(n)) => Some(*n),
        _ => None,
    }
}

fn get_bool_param(node: &Node, key: &str) -> Option<bool> {
    match node.parameters.get(key) {
        Some(NodeParameterValue::Boolean(b)) => Some(*b),
        _ => None,
    }
}

// ============================================================================
// Built-in Node Executors
// ============================================================================

/// Manual trigger node - entry point for manual executions.
pub struct ManualTriggerExecutor;

#[async_trait]
impl NodeExecutor for ManualTriggerExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.manualTrigger"
    }

    async fn execute(
        &self,
        _node: &Node,
        _input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        // Manual trigger just passes through an empty item
        Ok(vec![PortData::Items(vec![NodeExecutionData::default()])])
    }
}

/// Error trigger node - entry point for a workflow's designated error
/// handler, fired when another execution fails. Standalone (manual) runs
/// of the error workflow get a synthetic, empty error payload.
pub struct ErrorTriggerExecutor;

#[async_trait]
impl NodeExecutor for ErrorTriggerExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.errorTrigger"
    }

    async fn execute(
        &self,
        _node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        if !items.is_empty() {
            return Ok(vec![PortData::Items(items)]);
        }

        let mut execution = DataObject::new();
        execution.insert("id".to_string(), GenericValue::String(String::new()));
        let mut error_data = DataObject::new();
        error_data.insert("execution".to_string(), GenericValue::Object(execution));
        error_data.insert(
            "trigger".to_string(),
            GenericValue::String("manual".to_string()),
        );

        Ok(vec![PortData::Items(vec![NodeExecutionData::new(
            error_data,
        )])])
    }
}

/// Schedule trigger node - triggers workflow on a schedule (cron).
///
/// When executed within a workflow context, this provides the trigger data
/// that was captured when the schedule fired.
pub struct ScheduleTriggerExecutor;

#[async_trait]
impl NodeExecutor for ScheduleTriggerExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.scheduleTrigger"
    }

    async fn execute(
        &self,
        node: &Node,
        _input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let cron_expression = get_string_param(node, "cronExpression");

        let mut trigger_data = DataObject::new();
        trigger_data.insert(
            "timestamp".to_string(),
            GenericValue::Integer(chrono::Utc::now().timestamp_millis()),
        );
        trigger_data.insert(
            "timezone".to_string(),
            GenericValue::String("UTC".to_string()),
        );

        if let Some(cron) = cron_expression {
            trigger_data.insert("cronExpression".to_string(), GenericValue::String(cron));
        }

        let now = chrono::Utc::now();
        trigger_data.insert(
            "date".to_string(),
            GenericValue::String(now.format("%Y-%m-%d").to_string()),
        );
        trigger_data.insert(
            "time".to_string(),
            GenericValue::String(now.format("%H:%M:%S").to_string()),
        );
        trigger_data.insert(
            "dayOfWeek".to_string(),
            GenericValue::Integer(now.format("%u").to_string().parse().unwrap_or(1)),
        );
        trigger_data.insert(
            "hour".to_string(),
            GenericValue::Integer(now.format("%H").to_string().parse().unwrap_or(0)),
        );
        trigger_data.insert(
            "minute".to_string(),
            GenericValue::Integer(now.format("%M").to_string().parse().unwrap_or(0)),
        );

        Ok(vec![PortData::Items(vec![NodeExecutionData::new(
            trigger_data,
        )])])
    }
}

/// Webhook trigger node - triggers workflow when HTTP request is received.
///
/// When executed within a workflow context, this provides the request data
/// that was captured when the webhook was called.
pub struct WebhookTriggerExecutor;

#[async_trait]
impl NodeExecutor for WebhookTriggerExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.webhook"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        // Check if webhook data was provided in input (from webhook handler)
        if let Some(main_input) = input.get("main").and_then(|v| v.first()) {
            if let Some(items) = main_input.items() {
                if !items.is_empty() {
                    return Ok(vec![PortData::Items(items.to_vec())]);
                }
            }
        }

        // No webhook data provided - this is a manual trigger or test.
        let http_method = get_string_param(node, "httpMethod").unwrap_or_else(|| "GET".to_string());
        let path = get_string_param(node, "path").unwrap_or_else(|| "/webhook".to_string());

        let mut webhook_data = DataObject::new();

        let mut headers = DataObject::new();
        headers.insert("content-type".to_string(), "application/json".into());
        headers.insert("user-agent".to_string(), "n8n-test".into());
        webhook_data.insert("headers".to_string(), GenericValue::Object(headers));
        webhook_data.insert("params".to_string(), GenericValue::Object(DataObject::new()));
        webhook_data.insert("query".to_string(), GenericValue::Object(DataObject::new()));
        webhook_data.insert("body".to_string(), GenericValue::Object(DataObject::new()));
        webhook_data.insert(
            "webhookUrl".to_string(),
            GenericValue::String(format!("/webhook{}", path)),
        );
        webhook_data.insert("httpMethod".to_string(), GenericValue::String(http_method));
        webhook_data.insert(
            "executionMode".to_string(),
            GenericValue::String("test".to_string()),
        );

        Ok(vec![PortData::Items(vec![NodeExecutionData::new(
            webhook_data,
        )])])
    }
}

/// Set node - set values on items.
pub struct SetExecutor;

#[async_trait]
impl NodeExecutor for SetExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.set"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);

        let mode = get_string_param(node, "mode").unwrap_or_else(|| "manual".to_string());
        let keep_only_set = get_bool_param(node, "keepOnlySet").unwrap_or(false);
        let values = node.parameters.get("values");
        let json_output = node.parameters.get("jsonOutput");
        let deletions = node.parameters.get("delete");
        let renames = node.parameters.get("rename");

        let output: Vec<NodeExecutionData> = items
            .into_iter()
            .map(|item| {
                let mut json = if keep_only_set {
                    DataObject::new()
                } else {
                    item.json.clone()
                };

                if mode == "json" {
                    if let Some(NodeParameterValue::Object(obj)) = json_output {
                        if let GenericValue::Object(merged) =
                            param_to_generic_per_item(&NodeParameterValue::Object(obj.clone()), &item)
                        {
                            for (k, v) in merged {
                                json.insert(k, v);
                            }
                        }
                    }
                } else if let Some(NodeParameterValue::Object(vals)) = values {
                    for (path, val) in vals {
                        set_by_path(&mut json, path, param_to_generic_per_item(val, &item));
                    }
                }

                if let Some(NodeParameterValue::Array(paths)) = deletions {
                    for path in paths {
                        if let NodeParameterValue::String(p) = path {
                            delete_by_path(&mut json, p);
                        }
                    }
                }

                if let Some(NodeParameterValue::Array(pairs)) = renames {
                    for pair in pairs {
                        if let NodeParameterValue::Object(obj) = pair {
                            let from = obj.get("currentKey").and_then(param_value_as_str);
                            let to = obj.get("newKey").and_then(param_value_as_str);
                            if let (Some(from), Some(to)) = (from, to) {
                                if let Some(value) = delete_by_path(&mut json, from) {
                                    set_by_path(&mut json, to, value);
                                }
                            }
                        }
                    }
                }

                let mut out = NodeExecutionData::new(json);
                if !keep_only_set {
                    out.binary = item.binary.clone();
                }
                out
            })
            .collect();

        Ok(vec![PortData::Items(output)])
    }
}

/// Convert a Set-node assignment value into the generic JSON-like value
/// items carry, resolving any `{{ }}` expression against *this* item.
///
/// The engine resolves most node parameters once per node invocation
/// (against the batch's first item), but a field mutator that assigns
/// `{{$json.x}}` needs a distinct result per row; it re-resolves here the
/// same way the Switch executor re-resolves `outputExpression` per item.
fn param_to_generic_per_item(value: &NodeParameterValue, item: &NodeExecutionData) -> GenericValue {
    match value {
        NodeParameterValue::String(s) | NodeParameterValue::Expression(s) if s.contains("{{") => {
            let context = ExpressionContext::minimal(item);
            let evaluator = expression::ExpressionEvaluator::new();
            let resolved = expression::parse_template(s)
                .and_then(|expr| evaluator.evaluate(&expr, &context));
            match resolved {
                Ok(v) => json_value_to_generic(&v),
                Err(e) => GenericValue::String(format!("[Expression Error: {e}]")),
            }
        }
        NodeParameterValue::Array(arr) => {
            GenericValue::Array(arr.iter().map(|v| param_to_generic_per_item(v, item)).collect())
        }
        NodeParameterValue::Object(obj) => {
            let mut out = DataObject::new();
            for (k, v) in obj {
                out.insert(k.clone(), param_to_generic_per_item(v, item));
            }
            GenericValue::Object(out)
        }
        other => param_to_generic(other),
    }
}

/// Convert a resolved node parameter into the generic JSON-like value items carry.
fn param_to_generic(value: &NodeParameterValue) -> GenericValue {
    match value {
        NodeParameterValue::String(s) | NodeParameterValue::Expression(s) => {
            GenericValue::String(s.clone())
        }
        NodeParameterValue::Number(n) => GenericValue::Float(*n),
        NodeParameterValue::Boolean(b) => GenericValue::Bool(*b),
        NodeParameterValue::Array(arr) => {
            GenericValue::Array(arr.iter().map(param_to_generic).collect())
        }
        NodeParameterValue::Object(obj) => {
            let mut out = DataObject::new();
            for (k, v) in obj {
                out.insert(k.clone(), param_to_generic(v));
            }
            GenericValue::Object(out)
        }
    }
}

/// Set a value at a dot-notation path (`address.city`), creating intermediate
/// objects as needed. A segment that collides with a non-object value
/// overwrites it, matching the teacher's permissive Set-node semantics.
fn set_by_path(root: &mut DataObject, path: &str, value: GenericValue) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }

        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| GenericValue::Object(DataObject::new()));

        if !matches!(entry, GenericValue::Object(_)) {
            *entry = GenericValue::Object(DataObject::new());
        }

        current = match entry {
            GenericValue::Object(obj) => obj,
            _ => unreachable!(),
        };
    }
}

/// Remove the value at a dot-notation path, returning it if present. A
/// missing intermediate segment or leaf is a no-op that returns `None`,
/// matching the Set node's "no-op if source absent" rename contract.
fn delete_by_path(root: &mut DataObject, path: &str) -> Option<GenericValue> {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop()?;

    let mut current = root;
    for segment in segments {
        current = match current.get_mut(segment) {
            Some(GenericValue::Object(obj)) => obj,
            _ => return None,
        };
    }
    current.remove(last)
}

/// Read a parameter value that should be a plain string (used for the
/// rename list's `currentKey`/`newKey` entries).
fn param_value_as_str(value: &NodeParameterValue) -> Option<&str> {
    match value {
        NodeParameterValue::String(s) | NodeParameterValue::Expression(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Code node - run sandboxed JavaScript against the input items.
pub struct CodeExecutor;

#[async_trait]
impl NodeExecutor for CodeExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.code"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let code = get_string_param(node, "code").unwrap_or_default();
        let run_each = get_string_param(node, "mode")
            .map(|m| m == "runOnceForEachItem")
            .unwrap_or(false);

        let node_name = node.name.clone();
        let node_data = context.node_data_snapshot().await;
        let result = tokio::task::spawn_blocking(move || {
            code_sandbox::run_code(&code, items, run_each, &node_name, &node_data)
        })
        .await
        .map_err(|_| ExecutionEngineError::Internal("code sandbox task panicked".to_string()))?;

        match result {
            Ok(items) => Ok(vec![PortData::Items(items)]),
            Err(e) => Err(ExecutionEngineError::NodeExecution {
                node: node.name.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// If node - conditional branching: output 0 is the true branch, output 1
/// the false branch.
pub struct IfExecutor;

#[async_trait]
impl NodeExecutor for IfExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.if"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let conditions = node.parameters.get("conditions");

        let mut true_output = Vec::new();
        let mut false_output = Vec::new();

        for item in items {
            if condition::evaluate_condition_group(conditions, &item) {
                true_output.push(item);
            } else {
                false_output.push(item);
            }
        }

        Ok(vec![
            branch_port(true_output, node.always_output_data),
            branch_port(false_output, node.always_output_data),
        ])
    }
}

/// Merge node - combine the items delivered on its input ports.
///
/// The engine's join buffering already waits for every declared incoming
/// edge before scheduling this node regardless of `mode`; `mode` only
/// decides how the already-complete set of input ports is combined.
pub struct MergeExecutor;

#[async_trait]
impl NodeExecutor for MergeExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.merge"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let ports = main_ports(input);

        match get_string_param(node, "mode").as_deref().unwrap_or("append") {
            "waitForAll" => {
                let mut inputs = Vec::new();
                for port in ports {
                    let items = port.items().unwrap_or(&[]);
                    inputs.push(GenericValue::Array(
                        items.iter().map(|i| GenericValue::Object(i.json.clone())).collect(),
                    ));
                }
                let mut json = DataObject::new();
                json.insert("inputs".to_string(), GenericValue::Array(inputs));
                Ok(vec![PortData::Items(vec![NodeExecutionData::new(json)])])
            }
            "combinePairs" => {
                let merged = merge_combine_pairs(ports);
                Ok(vec![PortData::Items(merged)])
            }
            "keepMatches" => {
                let merged = merge_keep_matches(node, ports);
                Ok(vec![PortData::Items(merged)])
            }
            // "append": concatenate every input port's items in port order.
            _ => {
                let merged: Vec<NodeExecutionData> = ports
                    .iter()
                    .flat_map(|p| p.items().map(|i| i.to_vec()).unwrap_or_default())
                    .collect();
                Ok(vec![PortData::Items(merged)])
            }
        }
    }
}

/// Zip every input port by index into one object per row: `{input0: ...,
/// input1: ..., ...}`. Rows beyond the shortest port's length are dropped.
fn merge_combine_pairs(ports: &[PortData]) -> Vec<NodeExecutionData> {
    let item_lists: Vec<&[NodeExecutionData]> =
        ports.iter().map(|p| p.items().unwrap_or(&[])).collect();
    let len = item_lists.iter().map(|l| l.len()).min().unwrap_or(0);

    (0..len)
        .map(|row| {
            let mut json = DataObject::new();
            for (port_index, items) in item_lists.iter().enumerate() {
                json.insert(
                    format!("input{port_index}"),
                    GenericValue::Object(items[row].json.clone()),
                );
            }
            NodeExecutionData::new(json)
        })
        .collect()
}

/// Items from the first input port that share `matchField`'s value with at
/// least one item in *every* other port, in first-port order.
fn merge_keep_matches(node: &Node, ports: &[PortData]) -> Vec<NodeExecutionData> {
    let Some((first, rest)) = ports.split_first() else {
        return Vec::new();
    };
    let first_items = first.items().unwrap_or(&[]);
    let match_field = get_string_param(node, "matchField").unwrap_or_else(|| "id".to_string());

    first_items
        .iter()
        .filter(|a| {
            let key = condition::to_string(condition::get_by_path(&a.json, &match_field));
            rest.iter().all(|port| {
                port.items().unwrap_or(&[]).iter().any(|b| {
                    condition::to_string(condition::get_by_path(&b.json, &match_field)) == key
                })
            })
        })
        .cloned()
        .collect()
}

/// No-op node - pass through without modification.
pub struct NoOpExecutor;

#[async_trait]
impl NodeExecutor for NoOpExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.noOp"
    }

    async fn execute(
        &self,
        _node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let main_input = input.get("main").and_then(|v| v.first());
        Ok(vec![main_input.cloned().unwrap_or(PortData::NoOutput)])
    }
}

/// Resolve the `headers` parameter into `(name, value)` pairs. Accepts
/// either a map (`{"X-Api-Key": "..."}`) or a list of `{name, value}`
/// objects, the latter kept for back-compat with editors that always
/// serialize header tables as an ordered list.
fn parse_request_headers(param: Option<&NodeParameterValue>) -> Vec<(String, NodeParameterValue)> {
    match param {
        Some(NodeParameterValue::Object(h)) => {
            h.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }
        Some(NodeParameterValue::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                NodeParameterValue::Object(obj) => {
                    let name = obj.get("name").and_then(param_value_as_str)?.to_string();
                    let value = obj.get("value").cloned().unwrap_or_default();
                    Some((name, value))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// HTTP Request node - issue a real HTTP request per input item.
///
/// `url`/`headers`/`body` are resolved once per node invocation against
/// the first input item (the engine resolves node parameters once, not
/// per item); every item in the batch shares that one resolved request.
pub struct HttpRequestExecutor;

#[async_trait]
impl NodeExecutor for HttpRequestExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.httpRequest"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let item_count = items.len().max(1);

        let url = get_string_param(node, "url").ok_or_else(|| ExecutionEngineError::NodeExecution {
            node: node.name.clone(),
            message: "HTTP Request node requires a url".to_string(),
        })?;
        let method = get_string_param(node, "method").unwrap_or_else(|| "GET".to_string());
        let response_type = get_string_param(node, "responseType").unwrap_or_else(|| "json".to_string());
        let body = node.parameters.get("body").map(param_to_generic);
        let headers = parse_request_headers(node.parameters.get("headers"));

        let client = reqwest::Client::new();
        let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
            .unwrap_or(reqwest::Method::GET);

        let mut output = Vec::with_capacity(item_count);

        for _ in 0..item_count {
            if context.is_canceled() {
                return Err(ExecutionEngineError::Canceled);
            }

            let mut request = client.request(method.clone(), &url);
            for (key, value) in &headers {
                request = request.header(key, condition::param_to_string(Some(value)));
            }
            if let Some(GenericValue::Object(ref json)) = body {
                request = request.json(json);
            }

            let response = request.send().await.map_err(|e| ExecutionEngineError::NodeExecution {
                node: node.name.clone(),
                message: format!("request failed: {e}"),
            })?;

            let status = response.status().as_u16() as i64;
            let mut response_headers = DataObject::new();
            for (name, value) in response.headers().iter() {
                response_headers.insert(
                    name.to_string(),
                    GenericValue::String(value.to_str().unwrap_or_default().to_string()),
                );
            }

            let mut result = DataObject::new();
            result.insert("statusCode".to_string(), GenericValue::Integer(status));
            result.insert("headers".to_string(), GenericValue::Object(response_headers));

            match response_type.as_str() {
                "text" => {
                    let text = response
                        .text()
                        .await
                        .map_err(|e| ExecutionEngineError::NodeExecution {
                            node: node.name.clone(),
                            message: e.to_string(),
                        })?;
                    result.insert("body".to_string(), GenericValue::String(text));
                }
                "binary-metadata" => {
                    let len = response.content_length().unwrap_or(0) as i64;
                    result.insert("contentLength".to_string(), GenericValue::Integer(len));
                }
                _ => {
                    let value: serde_json::Value = response
                        .json()
                        .await
                        .unwrap_or(serde_json::Value::Null);
                    result.insert("body".to_string(), json_value_to_generic(&value));
                }
            }

            output.push(NodeExecutionData::new(result));
        }

        Ok(vec![PortData::Items(output)])
    }
}

fn json_value_to_generic(value: &serde_json::Value) -> GenericValue {
    match value {
        serde_json::Value::Null => GenericValue::Null,
        serde_json::Value::Bool(b) => GenericValue::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(GenericValue::Integer)
            .unwrap_or_else(|| GenericValue::Float(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => GenericValue::String(s.clone()),
        serde_json::Value::Array(arr) => {
            GenericValue::Array(arr.iter().map(json_value_to_generic).collect())
        }
        serde_json::Value::Object(obj) => {
            let mut out = DataObject::new();
            for (k, v) in obj {
                out.insert(k.clone(), json_value_to_generic(v));
            }
            GenericValue::Object(out)
        }
    }
}

// ============================================================================
// P0 Flow Control Nodes
// ============================================================================

/// Switch node - route items to one of several outputs.
///
/// "rules" mode (default): evaluates an ordered list of condition groups
/// per item, first match wins; items matching nothing go to a fallback
/// slot after the rule outputs, unless `fallbackOutput` names another
/// index or `-1` to drop the item.
///
/// "expression" mode: evaluates `outputExpression` once per item via the
/// expression engine and routes by the numeric result.
pub struct SwitchExecutor;

#[async_trait]
impl NodeExecutor for SwitchExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.switch"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let mode = get_string_param(node, "mode").unwrap_or_else(|| "rules".to_string());

        if mode == "expression" {
            return self.execute_expression_mode(node, items);
        }

        let rule_list = match node.parameters.get("rules") {
            Some(NodeParameterValue::Object(rules_obj)) => match rules_obj.get("rules") {
                Some(NodeParameterValue::Array(list)) => list.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let fallback_output = get_number_param(node, "fallbackOutput").map(|n| n as i64);
        let num_slots = rule_list.len() + 1; // rule outputs + fallback slot
        let mut outputs: Vec<Vec<NodeExecutionData>> = vec![Vec::new(); num_slots];

        for item in items {
            let matched = rule_list.iter().enumerate().find(|(_, rule)| {
                let conditions = match rule {
                    NodeParameterValue::Object(rule_obj) => rule_obj.get("conditions"),
                    _ => None,
                };
                condition::evaluate_condition_group(conditions, &item)
            });

            match matched {
                Some((index, _)) => outputs[index].push(item),
                None => match fallback_output {
                    Some(-1) => {} // explicitly dropped
                    Some(index) if index >= 0 && (index as usize) < num_slots => {
                        outputs[index as usize].push(item)
                    }
                    _ => outputs[rule_list.len()].push(item),
                },
            }
        }

        Ok(outputs
            .into_iter()
            .map(|items| branch_port(items, node.always_output_data))
            .collect())
    }
}

impl SwitchExecutor {
    fn execute_expression_mode(
        &self,
        node: &Node,
        items: Vec<NodeExecutionData>,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let expr_source = get_string_param(node, "outputExpression").unwrap_or_default();
        let num_outputs = get_number_param(node, "numberOutputs")
            .map(|n| n as usize)
            .unwrap_or(4)
            .max(1);
        let fallback = get_number_param(node, "fallbackOutput")
            .map(|n| n as i64)
            .filter(|&n| n >= 0 && (n as usize) < num_outputs)
            .map(|n| n as usize)
            .unwrap_or(0);

        let mut outputs: Vec<Vec<NodeExecutionData>> = vec![Vec::new(); num_outputs];

        for item in items {
            let index = evaluate_output_expression(&expr_source, &item)
                .filter(|&i| i < num_outputs)
                .unwrap_or(fallback);
            outputs[index].push(item);
        }

        Ok(outputs
            .into_iter()
            .map(|items| branch_port(items, node.always_output_data))
            .collect())
    }
}

/// Evaluate a raw n8n expression string (optionally `=`-prefixed and/or
/// `{{ }}`-wrapped) against a single item and read the result as an index.
fn evaluate_output_expression(source: &str, item: &NodeExecutionData) -> Option<usize> {
    let trimmed = source.strip_prefix('=').unwrap_or(source).trim();
    let context = ExpressionContext::minimal(item);
    let evaluator = expression::ExpressionEvaluator::new();

    let expr = if trimmed.contains("{{") {
        expression::parse_template(trimmed)
    } else {
        expression::parse(trimmed)
    }
    .ok()?;

    let value = evaluator.evaluate(&expr, &context).ok()?;
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|f| f.max(0.0) as usize),
        serde_json::Value::String(s) => s.parse::<f64>().ok().map(|f| f.max(0.0) as usize),
        _ => None,
    }
}

/// Filter node - keep only items matching the configured condition group.
pub struct FilterExecutor;

#[async_trait]
impl NodeExecutor for FilterExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.filter"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let conditions = node.parameters.get("conditions");

        let passed: Vec<NodeExecutionData> = items
            .into_iter()
            .filter(|item| condition::evaluate_condition_group(conditions, item))
            .collect();

        Ok(vec![PortData::Items(passed)])
    }
}

/// Sort node - sort items by a field.
pub struct SortExecutor;

#[async_trait]
impl NodeExecutor for SortExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.sort"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let mut items = main_items(input);

        let sort_field = get_string_param(node, "sortBy").unwrap_or_else(|| "id".to_string());
        let descending = get_string_param(node, "order")
            .map(|s| s == "desc" || s == "descending")
            .unwrap_or(false);

        items.sort_by(|a, b| {
            let val_a = a.json.get(&sort_field);
            let val_b = b.json.get(&sort_field);

            let ord = compare_values(val_a, val_b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        Ok(vec![PortData::Items(items)])
    }
}

fn compare_values(a: Option<&GenericValue>, b: Option<&GenericValue>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(GenericValue::Integer(a)), Some(GenericValue::Integer(b))) => a.cmp(b),
        (Some(GenericValue::Float(a)), Some(GenericValue::Float(b))) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (Some(GenericValue::String(a)), Some(GenericValue::String(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Limit node - limit number of items.
pub struct LimitExecutor;

#[async_trait]
impl NodeExecutor for LimitExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.limit"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let limit = get_number_param(node, "maxItems")
            .map(|n| n.max(0.0) as usize)
            .unwrap_or(1);

        let limited: Vec<NodeExecutionData> = items.into_iter().take(limit).collect();
        Ok(vec![PortData::Items(limited)])
    }
}

/// RemoveDuplicates node - remove duplicate items.
pub struct RemoveDuplicatesExecutor;

#[async_trait]
impl NodeExecutor for RemoveDuplicatesExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.removeDuplicates"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let compare_field = get_string_param(node, "compare").filter(|s| s != "allFields");

        let mut seen = std::collections::HashSet::new();
        let mut unique = Vec::new();

        for item in items {
            let key = if let Some(ref field) = compare_field {
                item.json
                    .get(field)
                    .map(|v| format!("{:?}", v))
                    .unwrap_or_default()
            } else {
                format!("{:?}", item.json)
            };

            if seen.insert(key) {
                unique.push(item);
            }
        }

        Ok(vec![PortData::Items(unique)])
    }
}

/// Aggregate node - aggregate items into groups.
pub struct AggregateExecutor;

#[async_trait]
impl NodeExecutor for AggregateExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.aggregate"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let destination_field =
            get_string_param(node, "destinationFieldName").unwrap_or_else(|| "data".to_string());
        let group_field = get_string_param(node, "groupByField");

        let output = if let Some(group_field) = group_field {
            let mut groups: std::collections::HashMap<String, Vec<NodeExecutionData>> =
                std::collections::HashMap::new();

            for item in items {
                let key = item
                    .json
                    .get(&group_field)
                    .map(|v| format!("{:?}", v))
                    .unwrap_or_else(|| "default".to_string());
                groups.entry(key).or_default().push(item);
            }

            groups
                .into_iter()
                .map(|(key, group_items)| {
                    let items_data: Vec<GenericValue> = group_items
                        .into_iter()
                        .map(|item| GenericValue::Object(item.json))
                        .collect();

                    let mut result = DataObject::new();
                    result.insert("groupKey".to_string(), key.into());
                    result.insert(destination_field.clone(), GenericValue::Array(items_data));
                    NodeExecutionData::new(result)
                })
                .collect()
        } else {
            let all_data: Vec<GenericValue> = items
                .into_iter()
                .map(|item| GenericValue::Object(item.json))
                .collect();

            let mut result = DataObject::new();
            result.insert(destination_field, GenericValue::Array(all_data));
            vec![NodeExecutionData::new(result)]
        };

        Ok(vec![PortData::Items(output)])
    }
}

/// Persisted state between loop iterations of a [`SplitInBatchesExecutor`].
#[derive(serde::Serialize, serde::Deserialize)]
struct SplitInBatchesState {
    remaining_batches: Vec<Vec<NodeExecutionData>>,
    total_items: usize,
    batches_processed: usize,
}

/// SplitInBatches node - split items into batches for loop processing.
///
/// The node executor interface doesn't expose a run index, so the
/// presence of persisted state in the runtime context is the signal that
/// distinguishes a fresh invocation (split the input and emit the first
/// batch) from a looped-back one (emit the next batch). A fresh top-level
/// execution always starts with an empty runtime context, so this holds.
pub struct SplitInBatchesExecutor;

#[async_trait]
impl NodeExecutor for SplitInBatchesExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.splitInBatches"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let state_key = format!("splitInBatches::{}", node.name);

        let mut state = match context.get_state(&state_key).await {
            Some(value) => serde_json::from_value::<SplitInBatchesState>(value)
                .map_err(|e| ExecutionEngineError::Internal(e.to_string()))?,
            None => {
                let items = main_items(input);
                let batch_size = get_number_param(node, "batchSize")
                    .map(|n| (n as usize).max(1))
                    .unwrap_or(1);

                SplitInBatchesState {
                    total_items: items.len(),
                    remaining_batches: items
                        .chunks(batch_size)
                        .map(|chunk| chunk.to_vec())
                        .collect(),
                    batches_processed: 0,
                }
            }
        };

        if state.remaining_batches.is_empty() {
            context.clear_state(&state_key).await;

            let mut summary = DataObject::new();
            summary.insert(
                "totalProcessed".to_string(),
                GenericValue::Integer(state.total_items as i64),
            );
            summary.insert(
                "batchesProcessed".to_string(),
                GenericValue::Integer(state.batches_processed as i64),
            );

            return Ok(vec![
                PortData::Items(vec![NodeExecutionData::new(summary)]),
                PortData::NoOutput,
            ]);
        }

        let batch = state.remaining_batches.remove(0);
        state.batches_processed += 1;

        let serialized = serde_json::to_value(&state)
            .map_err(|e| ExecutionEngineError::Internal(e.to_string()))?;
        context.set_state(state_key, serialized).await;

        Ok(vec![PortData::NoOutput, PortData::Items(batch)])
    }
}

/// Wait node - pause execution for a specified time.
pub struct WaitExecutor;

/// Hard ceiling on a single Wait invocation, independent of the configured
/// amount, so a misconfigured node can't stall an execution indefinitely.
const MAX_WAIT: std::time::Duration = std::time::Duration::from_secs(5 * 60);

#[async_trait]
impl NodeExecutor for WaitExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.wait"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);

        let amount = get_number_param(node, "amount").unwrap_or(1.0).max(0.0);
        let unit = get_string_param(node, "unit").unwrap_or_else(|| "seconds".to_string());

        let duration_ms = match unit.as_str() {
            "milliseconds" => amount,
            "minutes" => amount * 60.0 * 1000.0,
            "hours" => amount * 60.0 * 60.0 * 1000.0,
            _ => amount * 1000.0,
        };

        let sleep_duration =
            std::time::Duration::from_millis(duration_ms as u64).min(MAX_WAIT);

        tokio::select! {
            _ = tokio::time::sleep(sleep_duration) => {}
            _ = context.wait_for_cancellation() => {
                return Err(ExecutionEngineError::Canceled);
            }
        }

        Ok(vec![PortData::Items(items)])
    }
}

/// StopAndError node - stop execution and throw an error.
pub struct StopAndErrorExecutor;

#[async_trait]
impl NodeExecutor for StopAndErrorExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.stopAndError"
    }

    async fn execute(
        &self,
        node: &Node,
        _input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let error_message = get_string_param(node, "message")
            .or_else(|| get_string_param(node, "errorMessage"))
            .unwrap_or_else(|| "Workflow stopped by StopAndError node".to_string());

        Err(ExecutionEngineError::NodeExecution {
            node: node.name.clone(),
            message: error_message,
        })
    }
}

/// ExecuteWorkflow node - run another workflow as a sub-workflow.
///
/// The executor trait doesn't thread a workflow repository reference
/// through to node executors, so true recursive sub-workflow execution
/// isn't wired up here; this passes its input through unchanged, which
/// is sufficient for workflows that use it purely as a routing label.
pub struct ExecuteWorkflowExecutor;

#[async_trait]
impl NodeExecutor for ExecuteWorkflowExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.executeWorkflow"
    }

    async fn execute(
        &self,
        _node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let main_input = input.get("main").and_then(|v| v.first());
        Ok(vec![main_input.cloned().unwrap_or(PortData::NoOutput)])
    }
}

/// LLM Chat node - send a single chat completion request per item.
pub struct LlmChatExecutor;

#[async_trait]
impl NodeExecutor for LlmChatExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.llmChat"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let endpoint = get_string_param(node, "endpoint").ok_or_else(|| {
            ExecutionEngineError::NodeExecution {
                node: node.name.clone(),
                message: "LLM Chat node requires an endpoint".to_string(),
            }
        })?;
        let prompt = get_string_param(node, "prompt").unwrap_or_default();
        let model = get_string_param(node, "model");

        let client = reqwest::Client::new();
        let item_count = items.len().max(1);
        let mut output = Vec::with_capacity(item_count);

        for _ in 0..item_count {
            if context.is_canceled() {
                return Err(ExecutionEngineError::Canceled);
            }

            let mut payload = serde_json::Map::new();
            payload.insert("prompt".to_string(), serde_json::Value::String(prompt.clone()));
            if let Some(ref model) = model {
                payload.insert("model".to_string(), serde_json::Value::String(model.clone()));
            }

            let response = client
                .post(&endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| ExecutionEngineError::NodeExecution {
                    node: node.name.clone(),
                    message: format!("request failed: {e}"),
                })?;

            let value: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
            let mut result = DataObject::new();
            result.insert("response".to_string(), json_value_to_generic(&value));
            output.push(NodeExecutionData::new(result));
        }

        Ok(vec![PortData::Items(output)])
    }
}

/// AI Agent node - run an agent loop against a language model endpoint.
///
/// Simplified to a single request/response round trip against `endpoint`:
/// genuine multi-step tool-calling agent loops need a tool registry this
/// executor doesn't have access to.
pub struct AiAgentExecutor;

#[async_trait]
impl NodeExecutor for AiAgentExecutor {
    fn node_type(&self) -> &str {
        "n8n-nodes-base.aiAgent"
    }

    async fn execute(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let items = main_items(input);
        let endpoint = get_string_param(node, "endpoint").ok_or_else(|| {
            ExecutionEngineError::NodeExecution {
                node: node.name.clone(),
                message: "AI Agent node requires an endpoint".to_string(),
            }
        })?;
        let instructions = get_string_param(node, "instructions").unwrap_or_default();

        let client = reqwest::Client::new();
        let mut output = Vec::with_capacity(items.len().max(1));

        for item in if items.is_empty() {
            vec![NodeExecutionData::default()]
        } else {
            items
        } {
            if context.is_canceled() {
                return Err(ExecutionEngineError::Canceled);
            }

            let mut payload = serde_json::Map::new();
            payload.insert(
                "instructions".to_string(),
                serde_json::Value::String(instructions.clone()),
            );
            payload.insert(
                "input".to_string(),
                serde_json::to_value(&item.json).unwrap_or(serde_json::Value::Null),
            );

            let response = client
                .post(&endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| ExecutionEngineError::NodeExecution {
                    node: node.name.clone(),
                    message: format!("request failed: {e}"),
                })?;

            let value: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
            let mut result = DataObject::new();
            result.insert("output".to_string(), json_value_to_generic(&value));
            output.push(NodeExecutionData::new(result));
        }

        Ok(vec![PortData::Items(output)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{RuntimeConfig, RuntimeContext};
    use n8n_workflow::WorkflowExecuteMode;

    fn ctx() -> RuntimeContext {
        RuntimeContext::new(WorkflowExecuteMode::Manual, RuntimeConfig::default())
    }

    fn single_item_input(fields: &[(&str, &str)]) -> TaskDataConnections {
        let mut json = DataObject::new();
        for (k, v) in fields {
            json.insert(k.to_string(), GenericValue::String(v.to_string()));
        }
        let mut input = TaskDataConnections::new();
        input.insert("main".to_string(), vec![PortData::Items(vec![NodeExecutionData::new(json)])]);
        input
    }

    #[test]
    fn branch_port_empty_becomes_no_output_unless_always_output() {
        assert!(matches!(branch_port(vec![], false), PortData::NoOutput));
        assert!(matches!(branch_port(vec![], true), PortData::Items(_)));
        assert!(matches!(
            branch_port(vec![NodeExecutionData::default()], false),
            PortData::Items(_)
        ));
    }

    #[tokio::test]
    async fn filter_empty_result_is_items_not_no_output() {
        let mut node = Node::new("Filter", "n8n-nodes-base.filter");
        let mut condition = HashMap::new();
        condition.insert("field".to_string(), NodeParameterValue::String("missingField".to_string()));
        condition.insert("operator".to_string(), NodeParameterValue::String("isNotEmpty".to_string()));
        let mut group = HashMap::new();
        group.insert(
            "conditions".to_string(),
            NodeParameterValue::Array(vec![NodeParameterValue::Object(condition)]),
        );
        node.set_parameter("conditions", NodeParameterValue::Object(group));

        let executor = FilterExecutor;
        let input = single_item_input(&[("name", "a")]);
        let result = executor.execute(&node, &input, &ctx()).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(
            matches!(result[0], PortData::Items(ref items) if items.is_empty()),
            "a legitimately empty Filter result must stay Items(vec![]), not NoOutput"
        );
    }

    fn header_value(headers: &[(String, NodeParameterValue)], name: &str) -> String {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| param_value_as_str(v))
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn parse_request_headers_accepts_map_and_list_forms() {
        let mut map = HashMap::new();
        map.insert(
            "X-Api-Key".to_string(),
            NodeParameterValue::String("secret".to_string()),
        );
        let from_map = parse_request_headers(Some(&NodeParameterValue::Object(map)));
        assert_eq!(from_map.len(), 1);
        assert_eq!(header_value(&from_map, "X-Api-Key"), "secret");

        let mut entry = HashMap::new();
        entry.insert("name".to_string(), NodeParameterValue::String("X-Api-Key".to_string()));
        entry.insert("value".to_string(), NodeParameterValue::String("secret".to_string()));
        let list = NodeParameterValue::Array(vec![NodeParameterValue::Object(entry)]);
        let from_list = parse_request_headers(Some(&list));
        assert_eq!(from_list.len(), 1);
        assert_eq!(header_value(&from_list, "X-Api-Key"), "secret");
    }

    #[test]
    fn delete_by_path_removes_nested_value_and_no_ops_when_absent() {
        let mut obj = DataObject::new();
        let mut nested = DataObject::new();
        nested.insert("city".to_string(), GenericValue::String("NYC".to_string()));
        obj.insert("address".to_string(), GenericValue::Object(nested));

        assert!(delete_by_path(&mut obj, "address.city").is_some());
        assert!(delete_by_path(&mut obj, "address.city").is_none());
        assert!(delete_by_path(&mut obj, "nope.nested").is_none());
    }

    #[tokio::test]
    async fn set_json_mode_shallow_merges_object() {
        let mut node = Node::new("Set", "n8n-nodes-base.set");
        node.set_parameter("mode", NodeParameterValue::String("json".to_string()));
        let mut json_obj = HashMap::new();
        json_obj.insert("added".to_string(), NodeParameterValue::String("yes".to_string()));
        node.set_parameter("jsonOutput", NodeParameterValue::Object(json_obj));

        let executor = SetExecutor;
        let input = single_item_input(&[("existing", "kept")]);
        let result = executor.execute(&node, &input, &ctx()).await.unwrap();

        let PortData::Items(items) = &result[0] else { panic!("expected Items") };
        assert_eq!(items[0].json.get("added"), Some(&GenericValue::String("yes".to_string())));
        assert_eq!(items[0].json.get("existing"), Some(&GenericValue::String("kept".to_string())));
    }

    #[tokio::test]
    async fn set_rename_moves_value_and_delete_removes_it() {
        let mut node = Node::new("Set", "n8n-nodes-base.set");

        let mut pair = HashMap::new();
        pair.insert("currentKey".to_string(), NodeParameterValue::String("old".to_string()));
        pair.insert("newKey".to_string(), NodeParameterValue::String("renamed".to_string()));
        node.set_parameter(
            "rename",
            NodeParameterValue::Array(vec![NodeParameterValue::Object(pair)]),
        );
        node.set_parameter(
            "delete",
            NodeParameterValue::Array(vec![NodeParameterValue::String("drop_me".to_string())]),
        );

        let executor = SetExecutor;
        let input = single_item_input(&[("old", "value"), ("drop_me", "gone")]);
        let result = executor.execute(&node, &input, &ctx()).await.unwrap();

        let PortData::Items(items) = &result[0] else { panic!("expected Items") };
        assert_eq!(items[0].json.get("renamed"), Some(&GenericValue::String("value".to_string())));
        assert!(items[0].json.get("old").is_none());
        assert!(items[0].json.get("drop_me").is_none());
    }
}
