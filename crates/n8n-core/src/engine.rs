//! Workflow execution engine.
//!
//! The engine walks a workflow's connection graph starting from its trigger
//! (or start) nodes, executing one node at a time from a FIFO job queue.
//! Nodes whose type declares more than one input are held in a join buffer
//! until every distinct upstream edge has delivered data (or `NoOutput`) for
//! the current run index; only then is the node's job enqueued.

use crate::error::ExecutionEngineError;
use crate::executor::NodeExecutorRegistry;
use crate::expression::{self, ExpressionContext};
use crate::node_types::get_node_type_description;
use crate::runtime::{RuntimeConfig, RuntimeContext};
use n8n_workflow::{
    connection::{graph, CONNECTION_MAIN},
    ExecutionStatus, ExecutionError, Node, NodeExecutionData, NodeParameterValue, PortData, Run,
    TaskData, TaskDataConnections, TaskDataConnectionsSource, Workflow, WorkflowExecuteMode,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The runner aborts an execution after this many node invocations, as a
/// guard against a workflow whose loop never terminates.
pub const MAX_EXECUTION_STEPS: usize = 1000;

/// Event emitted during workflow execution. Variant names mirror the wire
/// event names surfaced over the execution stream (see `event_name`).
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    ExecutionStart {
        execution_id: String,
        workflow_id: String,
    },
    NodeStart {
        node_name: String,
        run_index: usize,
    },
    NodeComplete {
        node_name: String,
        run_index: usize,
        task_data: TaskData,
    },
    NodeError {
        node_name: String,
        run_index: usize,
        error: ExecutionError,
    },
    ExecutionError {
        error: ExecutionError,
    },
    ExecutionComplete {
        result: Run,
    },
}

impl ExecutionEvent {
    /// The literal event name used on the wire (SSE `event:` field).
    pub fn event_name(&self) -> &'static str {
        match self {
            ExecutionEvent::ExecutionStart { .. } => "execution:start",
            ExecutionEvent::NodeStart { .. } => "node:start",
            ExecutionEvent::NodeComplete { .. } => "node:complete",
            ExecutionEvent::NodeError { .. } => "node:error",
            ExecutionEvent::ExecutionError { .. } => "execution:error",
            ExecutionEvent::ExecutionComplete { .. } => "execution:complete",
        }
    }
}

/// A unit of work: a node ready to execute with all of its input data
/// already joined.
struct Job {
    node_name: String,
    run_index: usize,
    input: TaskDataConnections,
    source: Option<Vec<TaskDataConnectionsSource>>,
}

/// One incoming edge into a node, as seen from the destination side.
#[derive(Clone, PartialEq, Eq, Hash)]
struct EdgeKey {
    connection_type: String,
    source_node: String,
    source_index: usize,
}

#[derive(Clone)]
struct EdgeTarget {
    key: EdgeKey,
    dest_index: usize,
}

/// Buffers input data for a node+run_index until every required edge has
/// delivered.
struct JoinState {
    /// Workflow-wide required edges per destination node.
    required: HashMap<String, Vec<EdgeTarget>>,
    /// (node_name, run_index) -> edge key -> (dest_index, data)
    pending: HashMap<(String, usize), HashMap<EdgeKey, (usize, PortData)>>,
    /// Per-target extra run-index offset accumulated by traversing a `loop` port.
    loop_bump: HashMap<String, usize>,
}

impl JoinState {
    fn new(workflow: &Workflow) -> Self {
        let connections_by_dest = graph::map_connections_by_destination(&workflow.connections);
        let mut required: HashMap<String, Vec<EdgeTarget>> = HashMap::new();
        for (dest_node, sources) in &connections_by_dest {
            let targets = sources
                .iter()
                .map(|s| EdgeTarget {
                    key: EdgeKey {
                        connection_type: s.connection_type.clone(),
                        source_node: s.source_node.clone(),
                        source_index: s.source_index,
                    },
                    dest_index: s.dest_index,
                })
                .collect();
            required.insert(dest_node.clone(), targets);
        }
        Self {
            required,
            pending: HashMap::new(),
            loop_bump: HashMap::new(),
        }
    }

    fn required_edge_count(&self, node_name: &str) -> usize {
        let Some(targets) = self.required.get(node_name) else {
            return 0;
        };
        let unique: HashSet<&EdgeKey> = targets.iter().map(|t| &t.key).collect();
        unique.len()
    }

    /// Deliver straight to a non-joining (declared arity <= 1) node: no
    /// buffering, the single delivered port becomes the whole input.
    fn deliver_single(
        &self,
        conn_type: &str,
        dest_index: usize,
        data: PortData,
    ) -> TaskDataConnections {
        let mut result = TaskDataConnections::new();
        let bucket = result.entry(conn_type.to_string()).or_default();
        if bucket.len() <= dest_index {
            bucket.resize(dest_index + 1, PortData::NoOutput);
        }
        bucket[dest_index] = data;
        result
    }

    fn target_run_index(&self, node_name: &str, run_data_len: usize, source_port: &str) -> usize {
        let bump = self.loop_bump.get(node_name).copied().unwrap_or(0);
        let base = run_data_len + bump;
        if source_port == "loop" {
            // The bump applies to deliveries *after* this one too, so the
            // loop iteration that is currently being delivered lands one
            // generation ahead of whatever the node last completed.
            base
        } else {
            base
        }
    }

    fn bump_loop(&mut self, node_name: &str) {
        *self.loop_bump.entry(node_name.to_string()).or_insert(0) += 1;
    }

    /// Record a delivery. Returns the assembled input once all required
    /// edges for `(node_name, run_index)` have arrived.
    fn deliver(
        &mut self,
        node_name: &str,
        run_index: usize,
        edge: EdgeKey,
        dest_index: usize,
        data: PortData,
    ) -> Option<TaskDataConnections> {
        let slot = self
            .pending
            .entry((node_name.to_string(), run_index))
            .or_default();
        slot.insert(edge, (dest_index, data));

        let required = self.required_edge_count(node_name);
        if required == 0 || slot.len() < required {
            return None;
        }

        let slot = self
            .pending
            .remove(&(node_name.to_string(), run_index))
            .unwrap();

        let mut by_type_index: HashMap<(String, usize), Vec<PortData>> = HashMap::new();
        for (edge_key, (dest_index, port_data)) in slot {
            by_type_index
                .entry((edge_key.connection_type.clone(), dest_index))
                .or_default()
                .push(port_data);
        }

        let mut result = TaskDataConnections::new();
        for ((conn_type, dest_index), parts) in by_type_index {
            let merged = if parts.iter().all(PortData::is_no_output) {
                PortData::NoOutput
            } else {
                let mut items = Vec::new();
                for part in parts {
                    if let Some(existing) = part.items() {
                        items.extend_from_slice(existing);
                    }
                }
                PortData::Items(items)
            };
            let bucket = result.entry(conn_type).or_default();
            if bucket.len() <= dest_index {
                bucket.resize(dest_index + 1, PortData::NoOutput);
            }
            bucket[dest_index] = merged;
        }

        Some(result)
    }
}

/// Whether a target node's declared type needs the multi-input join buffer
/// (spec §4.E step 3: "If the node has inputCount > 1 ... route into the
/// multi-input join. If not, continue directly"). Unknown node types default
/// to no-join, since every built-in single-purpose node reachable by name
/// behaves that way and a missing descriptor should not stall a run waiting
/// on synchronization it never declared.
fn node_requires_join(node: &Node) -> bool {
    get_node_type_description(&node.node_type)
        .map(|d| d.input_count.requires_join())
        .unwrap_or(false)
}

/// Workflow execution engine.
pub struct WorkflowEngine {
    /// Node executor registry.
    executors: Arc<NodeExecutorRegistry>,
    /// Runtime configuration.
    config: RuntimeConfig,
}

impl WorkflowEngine {
    /// Create a new workflow engine.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            executors: Arc::new(NodeExecutorRegistry::new()),
            config,
        }
    }

    /// Create with custom executor registry.
    pub fn with_executors(executors: NodeExecutorRegistry, config: RuntimeConfig) -> Self {
        Self {
            executors: Arc::new(executors),
            config,
        }
    }

    /// Execute a workflow and return the result.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        mode: WorkflowExecuteMode,
        input_data: Option<Vec<NodeExecutionData>>,
    ) -> Result<Run, ExecutionEngineError> {
        let (tx, _rx) = mpsc::channel(100);
        self.execute_with_events(workflow, mode, input_data, tx).await
    }

    /// Execute a workflow with event streaming.
    pub async fn execute_with_events(
        &self,
        workflow: &Workflow,
        mode: WorkflowExecuteMode,
        input_data: Option<Vec<NodeExecutionData>>,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> Result<Run, ExecutionEngineError> {
        workflow.validate()?;

        let start_nodes = self.find_start_nodes(workflow)?;
        self.run_internal(workflow, mode, &start_nodes, input_data, None, None, event_tx)
            .await
    }

    /// Execute a subset of a workflow, optionally stopping once a
    /// destination node has produced output.
    pub async fn execute_partial(
        &self,
        workflow: &Workflow,
        start_nodes: Vec<String>,
        destination_node: Option<String>,
        input_data: Option<Vec<NodeExecutionData>>,
    ) -> Result<Run, ExecutionEngineError> {
        for name in &start_nodes {
            if workflow.get_node(name).is_none() {
                return Err(ExecutionEngineError::StartNodeNotFound(name.clone()));
            }
        }

        let allowed_nodes: Option<HashSet<String>> = destination_node.as_ref().map(|dest| {
            let conns_by_dest = graph::map_connections_by_destination(&workflow.connections);
            let mut allowed: HashSet<_> = graph::get_parent_nodes(&conns_by_dest, dest, None, None)
                .into_iter()
                .collect();
            allowed.insert(dest.clone());
            for start in &start_nodes {
                allowed.insert(start.clone());
            }
            allowed
        });

        let (tx, _rx) = mpsc::channel(100);
        self.run_internal(
            workflow,
            WorkflowExecuteMode::Manual,
            &start_nodes,
            input_data,
            allowed_nodes,
            destination_node,
            tx,
        )
        .await
    }

    fn find_start_nodes(&self, workflow: &Workflow) -> Result<Vec<String>, ExecutionEngineError> {
        let triggers: Vec<_> = workflow
            .get_trigger_nodes()
            .into_iter()
            .map(|n| n.name.clone())
            .collect();

        if !triggers.is_empty() {
            return Ok(triggers);
        }

        let start_nodes: Vec<_> = workflow
            .get_start_nodes()
            .into_iter()
            .filter(|n| !n.disabled)
            .map(|n| n.name.clone())
            .collect();

        if start_nodes.is_empty() {
            return Err(ExecutionEngineError::NoStartNodes);
        }

        Ok(start_nodes)
    }

    /// Core execution loop shared by `execute_with_events` and
    /// `execute_partial`.
    #[allow(clippy::too_many_arguments)]
    async fn run_internal(
        &self,
        workflow: &Workflow,
        mode: WorkflowExecuteMode,
        start_nodes: &[String],
        input_data: Option<Vec<NodeExecutionData>>,
        allowed_nodes: Option<HashSet<String>>,
        destination_node: Option<String>,
        event_tx: mpsc::Sender<ExecutionEvent>,
    ) -> Result<Run, ExecutionEngineError> {
        let context = RuntimeContext::new(mode, self.config.clone());
        let mut run = Run::new(mode);
        let execution_id = uuid::Uuid::new_v4().to_string();

        let _ = event_tx
            .send(ExecutionEvent::ExecutionStart {
                execution_id: execution_id.clone(),
                workflow_id: workflow.id.clone(),
            })
            .await;

        let initial_items = input_data.unwrap_or_else(|| vec![NodeExecutionData::default()]);
        let mut queue: VecDeque<Job> = VecDeque::new();
        for node_name in start_nodes {
            let mut data = TaskDataConnections::new();
            data.insert(
                CONNECTION_MAIN.to_string(),
                vec![PortData::Items(initial_items.clone())],
            );
            queue.push_back(Job {
                node_name: node_name.clone(),
                run_index: 0,
                input: data,
                source: None,
            });
        }

        let mut join = JoinState::new(workflow);
        let mut steps = 0usize;
        let mut bounded_abort = false;
        let mut had_unhandled_error = false;

        while let Some(job) = queue.pop_front() {
            if context.is_canceled() {
                run.finish(ExecutionStatus::Canceled);
                return Err(ExecutionEngineError::Canceled);
            }

            if let Some(ref allowed) = allowed_nodes {
                if !allowed.contains(&job.node_name) {
                    continue;
                }
            }

            steps += 1;
            if steps > MAX_EXECUTION_STEPS {
                bounded_abort = true;
                let bound_err: ExecutionError = ExecutionEngineError::ExecutionBounded.into();
                run.data.result_data.errors.push(bound_err.clone());
                run.data.result_data.error = Some(bound_err.clone());
                let _ = event_tx
                    .send(ExecutionEvent::ExecutionError { error: bound_err })
                    .await;
                break;
            }

            let node = match workflow.get_node(&job.node_name) {
                Some(n) => n.clone(),
                None => continue,
            };
            if node.disabled {
                continue;
            }

            let _ = event_tx
                .send(ExecutionEvent::NodeStart {
                    node_name: job.node_name.clone(),
                    run_index: job.run_index,
                })
                .await;

            debug!(node = %job.node_name, run_index = job.run_index, "Executing node");

            let task_data = self
                .execute_node(&node, &job.input, &context, &run, &execution_id, workflow)
                .await;

            run.data
                .result_data
                .run_data
                .entry(job.node_name.clone())
                .or_default()
                .push(task_data.clone());
            run.data.result_data.last_node_executed = Some(job.node_name.clone());

            if task_data.execution_status == ExecutionStatus::Error {
                let err = task_data
                    .error
                    .clone()
                    .unwrap_or_else(|| ExecutionError::new("Unknown error"));
                run.data.result_data.errors.push(err.clone());

                let _ = event_tx
                    .send(ExecutionEvent::NodeError {
                        node_name: job.node_name.clone(),
                        run_index: job.run_index,
                        error: err.clone(),
                    })
                    .await;

                if !node.continue_on_fail {
                    error!(node = %job.node_name, "Node execution failed");
                    had_unhandled_error = true;
                    run.data.result_data.error = Some(err.clone());
                    let _ = event_tx.send(ExecutionEvent::ExecutionError { error: err }).await;
                    self.fan_out_no_output(workflow, &job.node_name, &run, &mut join, &mut queue);
                    continue;
                }

                warn!(node = %job.node_name, "Node failed but continue_on_fail is set");
            }

            let _ = event_tx
                .send(ExecutionEvent::NodeComplete {
                    node_name: job.node_name.clone(),
                    run_index: job.run_index,
                    task_data: task_data.clone(),
                })
                .await;

            if destination_node.as_deref() == Some(job.node_name.as_str()) {
                break;
            }

            if let Some(output_data) = &task_data.data {
                self.fan_out(
                    workflow,
                    &job.node_name,
                    output_data,
                    &run,
                    &mut join,
                    &mut queue,
                );
            }
        }

        let final_status = if bounded_abort || had_unhandled_error {
            ExecutionStatus::Error
        } else {
            ExecutionStatus::Success
        };
        run.finish(final_status);
        info!(workflow_id = %workflow.id, status = ?final_status, "Workflow execution completed");

        let _ = event_tx
            .send(ExecutionEvent::ExecutionComplete { result: run.clone() })
            .await;

        Ok(run)
    }

    /// Deliver a node's produced outputs to every downstream connection,
    /// enqueueing jobs as join buffers complete.
    fn fan_out(
        &self,
        workflow: &Workflow,
        source_node: &str,
        output_data: &TaskDataConnections,
        run: &Run,
        join: &mut JoinState,
        queue: &mut VecDeque<Job>,
    ) {
        let Some(node_conns) = workflow.connections.get(source_node) else {
            return;
        };

        for (conn_type, by_index) in node_conns {
            for (output_index, connections) in by_index.iter().enumerate() {
                let outputs = output_data.get(conn_type);
                let port_data = outputs
                    .and_then(|o| o.get(output_index))
                    .cloned()
                    .unwrap_or(PortData::NoOutput);

                // SplitInBatches' second output is the "loop" port (index 1, per its
                // fixed [done, loop] output order); every other node's outputs only
                // ever carry run index 0 forward.
                let is_loop_port = workflow
                    .get_node(source_node)
                    .map(|n| n.node_type == "n8n-nodes-base.splitInBatches" && output_index == 1)
                    .unwrap_or(false);

                for conn in connections {
                    let target_node = match workflow.get_node(&conn.node) {
                        Some(n) => n,
                        None => continue,
                    };
                    if target_node.disabled {
                        continue;
                    }

                    let target_run_data_len =
                        run.data.result_data.run_data.get(&conn.node).map(|v| v.len()).unwrap_or(0);
                    let target_run_index =
                        join.target_run_index(&conn.node, target_run_data_len, if is_loop_port { "loop" } else { "" });
                    if is_loop_port {
                        join.bump_loop(&conn.node);
                    }

                    let requires_join = node_requires_join(target_node);

                    // NO-OUTPUT on a single-input successor kills that branch outright:
                    // it must not be scheduled at all, even with empty input.
                    if port_data.is_no_output() && !requires_join {
                        continue;
                    }

                    let source = vec![TaskDataConnectionsSource {
                        previous_node: source_node.to_string(),
                        previous_node_output: Some(output_index),
                        previous_node_run: Some(target_run_data_len),
                    }];

                    if !requires_join {
                        // Declared arity <= 1: each delivery fires the node on
                        // its own, with no cross-edge synchronization. This is
                        // what lets a loop-back edge (e.g. SplitInBatches'
                        // `loop` output feeding back into its own main input)
                        // re-invoke the node every iteration instead of
                        // waiting on the initial trigger edge to fire again.
                        let assembled = join.deliver_single(conn_type, conn.index, port_data.clone());
                        queue.push_back(Job {
                            node_name: conn.node.clone(),
                            run_index: target_run_index,
                            input: assembled,
                            source: Some(source),
                        });
                        continue;
                    }

                    let edge = EdgeKey {
                        connection_type: conn_type.clone(),
                        source_node: source_node.to_string(),
                        source_index: output_index,
                    };

                    if let Some(assembled) = join.deliver(
                        &conn.node,
                        target_run_index,
                        edge,
                        conn.index,
                        port_data.clone(),
                    ) {
                        queue.push_back(Job {
                            node_name: conn.node.clone(),
                            run_index: target_run_index,
                            input: assembled,
                            source: Some(source),
                        });
                    }
                }
            }
        }
    }

    /// A node failed with no output at all (continue-on-fail is off and the
    /// branch is dying, or the node had nothing to say). Still needs to
    /// notify multi-input joins downstream that this edge resolved to
    /// `NoOutput` so they don't wait forever.
    fn fan_out_no_output(
        &self,
        workflow: &Workflow,
        source_node: &str,
        run: &Run,
        join: &mut JoinState,
        queue: &mut VecDeque<Job>,
    ) {
        let Some(node_conns) = workflow.connections.get(source_node) else {
            return;
        };
        for (conn_type, by_index) in node_conns {
            for (output_index, connections) in by_index.iter().enumerate() {
                for conn in connections {
                    let Some(target_node) = workflow.get_node(&conn.node) else {
                        continue;
                    };
                    if !node_requires_join(target_node) {
                        continue;
                    }
                    let target_run_data_len =
                        run.data.result_data.run_data.get(&conn.node).map(|v| v.len()).unwrap_or(0);
                    let target_run_index = join.target_run_index(&conn.node, target_run_data_len, "");
                    let edge = EdgeKey {
                        connection_type: conn_type.clone(),
                        source_node: source_node.to_string(),
                        source_index: output_index,
                    };
                    if let Some(assembled) =
                        join.deliver(&conn.node, target_run_index, edge, conn.index, PortData::NoOutput)
                    {
                        queue.push_back(Job {
                            node_name: conn.node.clone(),
                            run_index: target_run_index,
                            input: assembled,
                            source: None,
                        });
                    }
                }
            }
        }
    }

    /// Execute a single node: resolve expressions, honor pinned data, run
    /// the executor with retries, and translate failures per the node's
    /// error policy.
    async fn execute_node(
        &self,
        node: &Node,
        input: &TaskDataConnections,
        context: &RuntimeContext,
        run: &Run,
        execution_id: &str,
        workflow: &Workflow,
    ) -> TaskData {
        let mut task_data = TaskData::new();

        if let Some(pinned) = workflow.pin_data.as_ref().and_then(|p| p.get(&node.name)) {
            let mut data = TaskDataConnections::new();
            data.insert(CONNECTION_MAIN.to_string(), vec![PortData::Items(pinned.clone())]);
            task_data.data = Some(data);
            task_data.execution_status = ExecutionStatus::Success;
            task_data.finish();
            return task_data;
        }

        let resolved_node = self.resolve_node_parameters(node, run, input, execution_id, workflow);

        let node_data = Self::build_node_data_for_expressions(&run.data.result_data.run_data);
        context.set_node_data(node_data).await;

        let executor = match self.executors.get(&resolved_node.node_type) {
            Some(e) => e,
            None => {
                task_data.execution_status = ExecutionStatus::Error;
                task_data.error = Some(ExecutionError::new(format!(
                    "No executor found for node type: {}",
                    resolved_node.node_type
                )));
                task_data.finish();
                return task_data;
            }
        };

        let max_attempts = resolved_node.retry_on_fail as usize + 1;
        let mut last_err: Option<ExecutionEngineError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                debug!(node = %resolved_node.name, attempt, "Retrying node execution");
                if resolved_node.retry_delay > 0 {
                    tokio::time::sleep(tokio::time::Duration::from_millis(resolved_node.retry_delay)).await;
                }
            }

            match executor.execute(&resolved_node, input, context).await {
                Ok(output) => {
                    let mut data = TaskDataConnections::new();
                    data.insert(CONNECTION_MAIN.to_string(), output);
                    task_data.data = Some(data);
                    task_data.execution_status = ExecutionStatus::Success;
                    task_data.finish();
                    return task_data;
                }
                Err(e) => last_err = Some(e),
            }
        }

        let err = last_err.unwrap_or_else(|| ExecutionEngineError::Internal("unknown failure".into()));
        let execution_error = ExecutionError::new(err.to_string()).with_node(&resolved_node.name);

        if node.continue_on_fail {
            // Synthesize a recovered item so downstream nodes still fire.
            let mut error_item = n8n_workflow::DataObject::new();
            error_item.insert(
                "error".to_string(),
                n8n_workflow::GenericValue::String(execution_error.message.clone()),
            );
            error_item.insert(
                "_errorNode".to_string(),
                n8n_workflow::GenericValue::String(node.name.clone()),
            );
            let mut data = TaskDataConnections::new();
            data.insert(
                CONNECTION_MAIN.to_string(),
                vec![PortData::Items(vec![NodeExecutionData::new(error_item)])],
            );
            task_data.data = Some(data);
        }

        task_data.execution_status = ExecutionStatus::Error;
        task_data.error = Some(execution_error);
        task_data.finish();
        task_data
    }

    // ========================================================================
    // Expression Resolution
    // ========================================================================

    fn param_to_json(param: &NodeParameterValue) -> serde_json::Value {
        match param {
            NodeParameterValue::String(s) => serde_json::Value::String(s.clone()),
            NodeParameterValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            NodeParameterValue::Boolean(b) => serde_json::Value::Bool(*b),
            NodeParameterValue::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Self::param_to_json).collect())
            }
            NodeParameterValue::Object(obj) => {
                let map: serde_json::Map<String, serde_json::Value> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::param_to_json(v)))
                    .collect();
                serde_json::Value::Object(map)
            }
            NodeParameterValue::Expression(s) => serde_json::Value::String(s.clone()),
        }
    }

    fn json_to_param(value: &serde_json::Value) -> NodeParameterValue {
        match value {
            serde_json::Value::Null => NodeParameterValue::String(String::new()),
            serde_json::Value::Bool(b) => NodeParameterValue::Boolean(*b),
            serde_json::Value::Number(n) => NodeParameterValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => NodeParameterValue::String(s.clone()),
            serde_json::Value::Array(arr) => {
                NodeParameterValue::Array(arr.iter().map(Self::json_to_param).collect())
            }
            serde_json::Value::Object(obj) => {
                let map: HashMap<String, NodeParameterValue> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::json_to_param(v)))
                    .collect();
                NodeParameterValue::Object(map)
            }
        }
    }

    fn params_contain_expression(params: &HashMap<String, NodeParameterValue>) -> bool {
        params.values().any(Self::value_contains_expression)
    }

    fn value_contains_expression(value: &NodeParameterValue) -> bool {
        match value {
            NodeParameterValue::String(s) => s.contains("{{"),
            NodeParameterValue::Expression(s) => s.contains("{{"),
            NodeParameterValue::Array(arr) => arr.iter().any(Self::value_contains_expression),
            NodeParameterValue::Object(obj) => obj.values().any(Self::value_contains_expression),
            _ => false,
        }
    }

    /// Build the `node_data` map the expression engine needs:
    /// node name -> per-run -> items, taken from each run's `main` output.
    fn build_node_data_for_expressions(
        run_data: &HashMap<String, Vec<TaskData>>,
    ) -> HashMap<String, Vec<Vec<NodeExecutionData>>> {
        let mut node_data: HashMap<String, Vec<Vec<NodeExecutionData>>> = HashMap::new();
        for (node_name, task_list) in run_data {
            let runs: Vec<Vec<NodeExecutionData>> = task_list
                .iter()
                .map(|task| {
                    task.data
                        .as_ref()
                        .and_then(|c| c.get(CONNECTION_MAIN))
                        .and_then(|outputs| outputs.first())
                        .and_then(|port| port.items())
                        .map(|items| items.to_vec())
                        .unwrap_or_default()
                })
                .collect();
            node_data.insert(node_name.clone(), runs);
        }
        node_data
    }

    /// Resolve `{{ }}` expressions in a node's parameters against the
    /// current item and run context.
    fn resolve_node_parameters(
        &self,
        node: &Node,
        run: &Run,
        input: &TaskDataConnections,
        execution_id: &str,
        workflow: &Workflow,
    ) -> Node {
        if !Self::params_contain_expression(&node.parameters) {
            return node.clone();
        }

        let node_data = Self::build_node_data_for_expressions(&run.data.result_data.run_data);

        let default_item = NodeExecutionData::default();
        let input_items: &[NodeExecutionData] = input
            .get(CONNECTION_MAIN)
            .and_then(|outputs| outputs.first())
            .and_then(|port| port.items())
            .unwrap_or(&[]);
        let current_item = input_items.first().unwrap_or(&default_item);

        let run_index = run
            .data
            .result_data
            .run_data
            .get(&node.name)
            .map(|v| v.len())
            .unwrap_or(0);

        let empty_vars: HashMap<String, serde_json::Value> = HashMap::new();
        let empty_env: HashMap<String, String> = std::env::vars().collect();

        let context = ExpressionContext {
            item: current_item,
            input_items,
            item_index: 0,
            run_index,
            node_data: &node_data,
            variables: &empty_vars,
            env: &empty_env,
            execution_id,
            execution_mode: run.mode.as_str(),
            workflow_id: &workflow.id,
            workflow_name: &workflow.name,
            node_name: &node.name,
        };

        let skip_keys = Self::parameters_resolved_per_item(&node.node_type);

        let mut resolved_node = node.clone();
        for (key, value) in &node.parameters {
            if skip_keys.contains(&key.as_str()) {
                continue;
            }
            if !Self::value_contains_expression(value) {
                continue;
            }

            let json_value = Self::param_to_json(value);
            let resolved = expression::resolve_parameter(&json_value, &context);
            resolved_node
                .parameters
                .insert(key.clone(), Self::json_to_param(&resolved));
        }

        resolved_node
    }

    /// Parameters that name a raw, unresolved expression/script which the
    /// executor itself evaluates once per item, rather than once against the
    /// first input item here.
    fn parameters_resolved_per_item(node_type: &str) -> &'static [&'static str] {
        match node_type {
            "n8n-nodes-base.switch" => &["outputExpression"],
            "n8n-nodes-base.code" => &["code"],
            // Set assigns distinct values per row; it re-resolves `values`
            // against each item itself (see `param_to_generic_per_item`).
            "n8n-nodes-base.set" => &["values"],
            _ => &[],
        }
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
