//! Integration tests for the workflow execution engine.
//!
//! These tests verify end-to-end workflow execution including node traversal,
//! data flow between nodes, conditional branching, error handling, and event
//! streaming.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use n8n_core::{
    ExecutionEngineError, ExecutionEvent, NodeExecutor, NodeExecutorRegistry, NodeOutput,
    RuntimeConfig, RuntimeContext, WorkflowEngine,
};
use n8n_workflow::{
    ExecutionStatus, GenericValue, Node, NodeExecutionData, NodeParameterValue, PortData,
    TaskDataConnections, Workflow, WorkflowExecuteMode, CONNECTION_MAIN,
};
use tokio::sync::mpsc;

// ============================================================================
// Helper functions
// ============================================================================

/// Create a workflow from a list of nodes and connect them using the provided
/// connection tuples.  Each tuple is `(source_name, target_name,
/// source_output_index, target_input_index)`.
fn make_workflow(
    name: &str,
    nodes: Vec<Node>,
    connections: &[(&str, &str, usize, usize)],
) -> Workflow {
    let mut wf = Workflow::new(name);
    for node in nodes {
        wf.add_node(node);
    }
    for &(src, tgt, src_idx, tgt_idx) in connections {
        wf.connect(src, tgt, src_idx, tgt_idx)
            .unwrap_or_else(|e| panic!("Failed to connect {src} -> {tgt}: {e}"));
    }
    wf
}

/// Create a ManualTrigger node with the given display name.
fn manual_trigger(name: &str) -> Node {
    Node::new(name, "n8n-nodes-base.manualTrigger")
}

/// Create a Set node that sets the given key/value string pairs.
fn set_node(name: &str, values: &[(&str, &str)]) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.set");
    let mut map: HashMap<String, NodeParameterValue> = HashMap::new();
    for &(k, v) in values {
        map.insert(k.to_string(), NodeParameterValue::String(v.to_string()));
    }
    node.set_parameter("values", NodeParameterValue::Object(map));
    node
}

/// Create a NoOp (pass-through) node.
fn noop_node(name: &str) -> Node {
    Node::new(name, "n8n-nodes-base.noOp")
}

/// Create an If node that checks whether a given field exists on the item.
fn if_node(name: &str, field: &str) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.if");
    let mut conditions: HashMap<String, NodeParameterValue> = HashMap::new();
    conditions.insert(
        "field".to_string(),
        NodeParameterValue::String(field.to_string()),
    );
    node.set_parameter("conditions", NodeParameterValue::Object(conditions));
    node
}

/// Create a Merge node.
fn merge_node(name: &str) -> Node {
    Node::new(name, "n8n-nodes-base.merge")
}

/// Create a Filter node that checks a field for truthiness.
fn filter_node(name: &str, field: &str) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.filter");
    let mut cond: HashMap<String, NodeParameterValue> = HashMap::new();
    cond.insert(
        "field".to_string(),
        NodeParameterValue::String(field.to_string()),
    );
    node.set_parameter("conditions", NodeParameterValue::Object(cond));
    node
}

/// Create a Sort node that sorts by the given field with the given order.
fn sort_node(name: &str, sort_by: &str, order: &str) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.sort");
    node.set_parameter("sortBy", NodeParameterValue::String(sort_by.to_string()));
    node.set_parameter("order", NodeParameterValue::String(order.to_string()));
    node
}

/// Create a Limit node with the given max items.
fn limit_node(name: &str, max_items: f64) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.limit");
    node.set_parameter("maxItems", NodeParameterValue::Number(max_items));
    node
}

/// Create a Switch node with rules that check for specific field presence.
fn switch_node(name: &str, num_outputs: f64, rule_fields: &[&str]) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.switch");
    node.set_parameter("numberOutputs", NodeParameterValue::Number(num_outputs));
    let rules: Vec<NodeParameterValue> = rule_fields
        .iter()
        .map(|field| {
            let mut rule: HashMap<String, NodeParameterValue> = HashMap::new();
            rule.insert(
                "field".to_string(),
                NodeParameterValue::String(field.to_string()),
            );
            NodeParameterValue::Object(rule)
        })
        .collect();
    let mut rules_obj: HashMap<String, NodeParameterValue> = HashMap::new();
    rules_obj.insert("rules".to_string(), NodeParameterValue::Array(rules));
    node.set_parameter("rules", NodeParameterValue::Object(rules_obj));
    node
}

/// Create a StopAndError node.
fn stop_and_error_node(name: &str, message: &str) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.stopAndError");
    node.set_parameter(
        "errorMessage",
        NodeParameterValue::String(message.to_string()),
    );
    node
}

/// Create a SplitInBatches node with the given batch size.
fn split_in_batches_node(name: &str, batch_size: f64) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.splitInBatches");
    node.set_parameter("batchSize", NodeParameterValue::Number(batch_size));
    node
}

/// Create a Switch node (rules mode) that routes on `field == value` per
/// rule, in the proper nested `{conditions: {conditions: [...]}}` shape the
/// condition-group evaluator expects.
fn switch_equals_node(name: &str, num_outputs: f64, rules: &[(&str, &str)]) -> Node {
    let mut node = Node::new(name, "n8n-nodes-base.switch");
    node.set_parameter("numberOutputs", NodeParameterValue::Number(num_outputs));

    let rule_list: Vec<NodeParameterValue> = rules
        .iter()
        .map(|&(field, value)| {
            let mut single_condition: HashMap<String, NodeParameterValue> = HashMap::new();
            single_condition.insert("field".to_string(), NodeParameterValue::String(field.to_string()));
            single_condition.insert("operator".to_string(), NodeParameterValue::String("equals".to_string()));
            single_condition.insert("value".to_string(), NodeParameterValue::String(value.to_string()));

            let mut group: HashMap<String, NodeParameterValue> = HashMap::new();
            group.insert(
                "conditions".to_string(),
                NodeParameterValue::Array(vec![NodeParameterValue::Object(single_condition)]),
            );
            group.insert("combinator".to_string(), NodeParameterValue::String("and".to_string()));

            let mut rule: HashMap<String, NodeParameterValue> = HashMap::new();
            rule.insert("conditions".to_string(), NodeParameterValue::Object(group));
            NodeParameterValue::Object(rule)
        })
        .collect();

    let mut rules_obj: HashMap<String, NodeParameterValue> = HashMap::new();
    rules_obj.insert("rules".to_string(), NodeParameterValue::Array(rule_list));
    node.set_parameter("rules", NodeParameterValue::Object(rules_obj));
    node
}

/// A node executor that fails its first `fail_times` invocations (per node
/// name) and succeeds afterwards, passing its input straight through. Used
/// to exercise the engine's retry policy without depending on any built-in
/// executor that can be made to fail deterministically N times.
struct FlakyExecutor {
    fail_times: usize,
    attempts: Arc<AtomicUsize>,
}

impl FlakyExecutor {
    fn new(fail_times: usize, attempts: Arc<AtomicUsize>) -> Self {
        Self { fail_times, attempts }
    }
}

#[async_trait]
impl NodeExecutor for FlakyExecutor {
    fn node_type(&self) -> &str {
        "test.flaky"
    }

    async fn execute(
        &self,
        _node: &Node,
        input: &TaskDataConnections,
        _context: &RuntimeContext,
    ) -> Result<NodeOutput, ExecutionEngineError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_times {
            return Err(ExecutionEngineError::Internal(format!(
                "flaky failure #{attempt}"
            )));
        }

        let items = input
            .get(CONNECTION_MAIN)
            .and_then(|ports| ports.first())
            .and_then(PortData::items)
            .map(|items| items.to_vec())
            .unwrap_or_default();
        Ok(vec![PortData::Items(items)])
    }
}

/// Helper to extract output items from a run for a given node name.
/// Returns the items from the first run of the node, first output index.
fn get_node_output_items(run: &n8n_workflow::Run, node_name: &str) -> Vec<NodeExecutionData> {
    let task_data_vec = run
        .data
        .result_data
        .run_data
        .get(node_name)
        .unwrap_or_else(|| panic!("No run data found for node '{node_name}'"));

    let task_data = &task_data_vec[0];
    let connections = task_data
        .data
        .as_ref()
        .unwrap_or_else(|| panic!("No output data for node '{node_name}'"));

    let main_outputs = connections
        .get("main")
        .unwrap_or_else(|| panic!("No 'main' output for node '{node_name}'"));

    main_outputs
        .first()
        .cloned()
        .unwrap_or_default()
}

/// Helper to extract output items from a specific output index of a node.
fn get_node_output_at_index(
    run: &n8n_workflow::Run,
    node_name: &str,
    output_index: usize,
) -> Vec<NodeExecutionData> {
    let task_data_vec = run
        .data
        .result_data
        .run_data
        .get(node_name)
        .unwrap_or_else(|| panic!("No run data found for node '{node_name}'"));

    let task_data = &task_data_vec[0];
    let connections = task_data
        .data
        .as_ref()
        .unwrap_or_else(|| panic!("No output data for node '{node_name}'"));

    let main_outputs = connections
        .get("main")
        .unwrap_or_else(|| panic!("No 'main' output for node '{node_name}'"));

    main_outputs
        .get(output_index)
        .cloned()
        .unwrap_or_default()
}

// ============================================================================
// Test cases
// ============================================================================

/// 1. Simple trigger-to-set pipeline.
///    ManualTrigger -> Set(field1="hello")
///    Verify that the Set node ran and added the value.
#[tokio::test]
async fn test_simple_trigger_to_set() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "simple_trigger_to_set",
        vec![
            manual_trigger("Trigger"),
            set_node("Set", &[("field1", "hello")]),
        ],
        &[("Trigger", "Set", 0, 0)],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // The Set node should have executed
    assert!(
        run.data.result_data.run_data.contains_key("Set"),
        "Set node should be in run data"
    );

    // Verify the Set node added the field
    let set_items = get_node_output_items(&run, "Set");
    assert!(!set_items.is_empty(), "Set node should output at least one item");

    let first_item = &set_items[0];
    let field_val = first_item.json.get("field1");
    assert!(field_val.is_some(), "Set node should add 'field1'");
    assert_eq!(
        field_val.unwrap(),
        &GenericValue::String("hello".to_string())
    );
}

/// 2. If branching test.
///    ManualTrigger -> Set(active="true") -> If(field="active") -> NoOp_True (output 0)
///                                                               -> NoOp_False (output 1)
///    Since the Set node adds "active" as a string field and the If node
///    checks for field existence, items should go to the true branch only.
#[tokio::test]
async fn test_if_branching() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "if_branching",
        vec![
            manual_trigger("Trigger"),
            set_node("Set", &[("active", "true")]),
            if_node("If", "active"),
            noop_node("TrueBranch"),
            noop_node("FalseBranch"),
        ],
        &[
            ("Trigger", "Set", 0, 0),
            ("Set", "If", 0, 0),
            ("If", "TrueBranch", 0, 0),  // output 0 = true branch
            ("If", "FalseBranch", 1, 0), // output 1 = false branch
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // The If node should have produced output on index 0 (true branch)
    let true_items = get_node_output_at_index(&run, "If", 0);
    assert!(
        !true_items.is_empty(),
        "True branch should have items"
    );

    // The false branch (output 1) should be empty
    let false_items = get_node_output_at_index(&run, "If", 1);
    assert!(
        false_items.is_empty(),
        "False branch should be empty"
    );

    // TrueBranch NoOp should have executed
    assert!(
        run.data.result_data.run_data.contains_key("TrueBranch"),
        "TrueBranch node should have been executed"
    );

    // FalseBranch NoOp should NOT have executed (no items flowed to it)
    assert!(
        !run.data.result_data.run_data.contains_key("FalseBranch"),
        "FalseBranch node should NOT have been executed"
    );
}

/// 3. Merge two branches.
///    ManualTrigger1 -> Set1(source="branch1")
///    ManualTrigger2 -> Set2(source="branch2")
///    Both Set nodes connect to a Merge node.
///    The merge should combine items from both branches.
#[tokio::test]
async fn test_merge_two_branches() {
    let engine = WorkflowEngine::default();

    // NOTE: Because the engine finds all trigger nodes and executes them
    // sequentially, each branch will be queued. The Merge node will be
    // reached once from each branch, producing separate runs.
    // We verify that the Merge node was executed at least once.
    let workflow = make_workflow(
        "merge_two_branches",
        vec![
            manual_trigger("Trigger1"),
            manual_trigger("Trigger2"),
            set_node("Set1", &[("source", "branch1")]),
            set_node("Set2", &[("source", "branch2")]),
            merge_node("Merge"),
        ],
        &[
            ("Trigger1", "Set1", 0, 0),
            ("Trigger2", "Set2", 0, 0),
            ("Set1", "Merge", 0, 0),
            ("Set2", "Merge", 0, 0),
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // Merge node should have executed
    assert!(
        run.data.result_data.run_data.contains_key("Merge"),
        "Merge node should have been executed"
    );

    // Both Set nodes should have executed
    assert!(
        run.data.result_data.run_data.contains_key("Set1"),
        "Set1 should have been executed"
    );
    assert!(
        run.data.result_data.run_data.contains_key("Set2"),
        "Set2 should have been executed"
    );

    // The Merge node should have produced output items
    let merge_runs = run.data.result_data.run_data.get("Merge").unwrap();
    assert!(
        !merge_runs.is_empty(),
        "Merge should have at least one execution run"
    );

    // Collect all items from all Merge runs
    let mut all_merge_items: Vec<NodeExecutionData> = Vec::new();
    for task in merge_runs {
        if let Some(ref data) = task.data {
            if let Some(main) = data.get("main") {
                for output in main {
                    all_merge_items.extend(output.clone());
                }
            }
        }
    }
    assert!(
        !all_merge_items.is_empty(),
        "Merge should produce output items"
    );
}

/// 4. Filter node test.
///    ManualTrigger -> Set(count="5") -> Filter(field="count")
///    The filter checks truthiness of the "count" field (non-empty string
///    is truthy), so the item should pass through.
#[tokio::test]
async fn test_filter_node() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "filter_test",
        vec![
            manual_trigger("Trigger"),
            set_node("Set", &[("count", "5")]),
            filter_node("Filter", "count"),
        ],
        &[
            ("Trigger", "Set", 0, 0),
            ("Set", "Filter", 0, 0),
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // Filter output 0 = passed items
    let passed = get_node_output_at_index(&run, "Filter", 0);
    assert!(
        !passed.is_empty(),
        "Items with truthy 'count' field should pass the filter"
    );

    // Filter output 1 = failed items (should be empty)
    let failed = get_node_output_at_index(&run, "Filter", 1);
    assert!(
        failed.is_empty(),
        "No items should fail the filter since 'count' is truthy"
    );
}

/// 5. Sort node test.
///    ManualTrigger -> Sort(sortBy="name", order="asc")
///    We supply multiple input items with different "name" values and verify
///    they come out sorted.
#[tokio::test]
async fn test_sort_node() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "sort_test",
        vec![
            manual_trigger("Trigger"),
            sort_node("Sort", "name", "asc"),
        ],
        &[("Trigger", "Sort", 0, 0)],
    );

    // Provide multiple input items with "name" fields in unsorted order
    let input_items: Vec<NodeExecutionData> = vec!["charlie", "alpha", "bravo"]
        .into_iter()
        .map(|name| {
            let mut data = HashMap::new();
            data.insert("name".to_string(), GenericValue::String(name.to_string()));
            NodeExecutionData::new(data)
        })
        .collect();

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, Some(input_items))
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    let sorted_items = get_node_output_items(&run, "Sort");
    assert_eq!(sorted_items.len(), 3, "Should have 3 items after sort");

    let names: Vec<String> = sorted_items
        .iter()
        .filter_map(|item| {
            if let Some(GenericValue::String(s)) = item.json.get("name") {
                Some(s.clone())
            } else {
                None
            }
        })
        .collect();

    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
}

/// 6. Limit node test.
///    ManualTrigger -> Limit(maxItems=3)
///    Provide 10 input items and verify only 3 come out.
#[tokio::test]
async fn test_limit_node() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "limit_test",
        vec![manual_trigger("Trigger"), limit_node("Limit", 3.0)],
        &[("Trigger", "Limit", 0, 0)],
    );

    // Provide 10 input items
    let input_items: Vec<NodeExecutionData> = (0..10)
        .map(|i| {
            let mut data = HashMap::new();
            data.insert("index".to_string(), GenericValue::Integer(i));
            NodeExecutionData::new(data)
        })
        .collect();

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, Some(input_items))
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    let limited_items = get_node_output_items(&run, "Limit");
    assert_eq!(
        limited_items.len(),
        3,
        "Limit node should output exactly 3 items"
    );

    // Verify we got the first 3 items (indices 0, 1, 2)
    for (i, item) in limited_items.iter().enumerate() {
        let idx = item.json.get("index");
        assert_eq!(
            idx,
            Some(&GenericValue::Integer(i as i64)),
            "Item at position {i} should have index {i}"
        );
    }
}

/// 7. Switch node test.
///    ManualTrigger -> Switch(3 outputs, rules check fields "alpha" and "bravo")
///    The switch has 3 outputs:
///      - Output 0 matches items with field "alpha"
///      - Output 1 matches items with field "bravo"
///      - Output 2 is the fallback (no match)
///    We connect each output to a separate NoOp node.
#[tokio::test]
async fn test_switch_node() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "switch_test",
        vec![
            manual_trigger("Trigger"),
            switch_node("Switch", 3.0, &["alpha", "bravo"]),
            noop_node("OutputAlpha"),
            noop_node("OutputBravo"),
            noop_node("OutputDefault"),
        ],
        &[
            ("Trigger", "Switch", 0, 0),
            ("Switch", "OutputAlpha", 0, 0),
            ("Switch", "OutputBravo", 1, 0),
            ("Switch", "OutputDefault", 2, 0),
        ],
    );

    // Create an item with field "alpha" -- it should route to output 0
    let input_items: Vec<NodeExecutionData> = vec![{
        let mut data = HashMap::new();
        data.insert(
            "alpha".to_string(),
            GenericValue::String("value".to_string()),
        );
        NodeExecutionData::new(data)
    }];

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, Some(input_items))
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // Switch output 0 (alpha) should have items
    let alpha_items = get_node_output_at_index(&run, "Switch", 0);
    assert!(
        !alpha_items.is_empty(),
        "Output 0 (alpha) should have items"
    );

    // OutputAlpha node should have executed
    assert!(
        run.data.result_data.run_data.contains_key("OutputAlpha"),
        "OutputAlpha should have been executed"
    );

    // OutputBravo should NOT have been reached (no items on output 1)
    let bravo_items = get_node_output_at_index(&run, "Switch", 1);
    assert!(
        bravo_items.is_empty(),
        "Output 1 (bravo) should be empty"
    );

    // OutputDefault should NOT have been reached
    let default_items = get_node_output_at_index(&run, "Switch", 2);
    assert!(
        default_items.is_empty(),
        "Output 2 (default) should be empty"
    );
}

/// 8. Error handling test.
///    ManualTrigger -> StopAndError
///    The execution should complete with Error status.
#[tokio::test]
async fn test_error_handling() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "error_handling",
        vec![
            manual_trigger("Trigger"),
            stop_and_error_node("StopAndError", "Test error message"),
        ],
        &[("Trigger", "StopAndError", 0, 0)],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Engine should return a Run even on error");

    assert_eq!(
        run.status,
        ExecutionStatus::Error,
        "Execution should have Error status"
    );

    // The run should have an error recorded
    assert!(
        run.data.result_data.error.is_some(),
        "Run should have an error recorded"
    );

    let error = run.data.result_data.error.as_ref().unwrap();
    assert!(
        error.message.contains("Test error message"),
        "Error message should contain the StopAndError message, got: {}",
        error.message
    );
}

/// 8b. A node failing without `continueOnFail` kills only its own
///     downstream branch; an independent branch fed by the same trigger
///     must still run to completion (spec §4.E step 7/10).
#[tokio::test]
async fn test_failure_does_not_abort_independent_branch() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "failure_is_scoped_to_its_branch",
        vec![
            manual_trigger("Trigger"),
            stop_and_error_node("Failing", "boom"),
            set_node("Survivor", &[("ok", "true")]),
        ],
        &[
            ("Trigger", "Failing", 0, 0),
            ("Trigger", "Survivor", 0, 0),
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Engine should return a Run even when one branch fails");

    assert_eq!(
        run.status,
        ExecutionStatus::Error,
        "An unhandled node failure should still mark the run as Error overall"
    );

    let survivor_items = get_node_output_items(&run, "Survivor");
    assert_eq!(
        survivor_items.len(),
        1,
        "the independent branch must still execute despite the sibling branch's failure"
    );
    assert_eq!(
        survivor_items[0].json.get("ok"),
        Some(&GenericValue::String("true".to_string())),
        "the independent branch's Set node should have run normally"
    );
}

/// 9. Continue on fail test.
///    ManualTrigger -> StopAndError (continue_on_fail=true) -> NoOp
///    The StopAndError node fails but continue_on_fail is set, so execution
///    should proceed to the NoOp and the run should finish with Success.
#[tokio::test]
async fn test_continue_on_fail() {
    let engine = WorkflowEngine::default();

    let mut error_node = stop_and_error_node("StopAndError", "Ignored error");
    error_node.continue_on_fail = true;

    let workflow = make_workflow(
        "continue_on_fail",
        vec![
            manual_trigger("Trigger"),
            error_node,
            noop_node("AfterError"),
        ],
        &[
            ("Trigger", "StopAndError", 0, 0),
            ("StopAndError", "AfterError", 0, 0),
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    // The StopAndError node should have executed with error status
    assert!(
        run.data.result_data.run_data.contains_key("StopAndError"),
        "StopAndError node should be in run data"
    );

    let stop_task = &run.data.result_data.run_data["StopAndError"][0];
    assert_eq!(
        stop_task.execution_status,
        ExecutionStatus::Error,
        "StopAndError node itself should have Error status"
    );

    // But the overall run should succeed since continue_on_fail was set: the
    // node synthesizes a `{error, _errorNode}` item on `main` and execution
    // carries on downstream through it (spec §4.E step 7 / scenario 5).
    assert_eq!(
        run.status,
        ExecutionStatus::Success,
        "Overall run should succeed when continue_on_fail is set"
    );

    let after_items = get_node_output_items(&run, "AfterError");
    assert_eq!(
        after_items.len(),
        1,
        "the synthesized error item should still reach the downstream node"
    );
    assert_eq!(
        after_items[0].json.get("_errorNode"),
        Some(&GenericValue::String("StopAndError".to_string())),
        "the synthesized item should be tagged with the failing node's name"
    );
    assert!(
        after_items[0].json.get("error").is_some(),
        "the synthesized item should carry the error message"
    );

    // Verify no global error is set on the run
    assert!(
        run.data.result_data.error.is_none(),
        "No global error should be set when continue_on_fail is used"
    );
}

/// 10. Event streaming test.
///     Execute a simple workflow with an event channel and verify that the
///     expected events are emitted: Started, NodeStarted, NodeFinished,
///     Finished.
#[tokio::test]
async fn test_event_streaming() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "event_streaming",
        vec![
            manual_trigger("Trigger"),
            noop_node("NoOp"),
        ],
        &[("Trigger", "NoOp", 0, 0)],
    );

    let (tx, mut rx) = mpsc::channel::<ExecutionEvent>(100);

    let run = engine
        .execute_with_events(&workflow, WorkflowExecuteMode::Manual, None, tx)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // Collect all events
    let mut events: Vec<ExecutionEvent> = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    // Verify we got a Started event
    let has_started = events.iter().any(|e| matches!(e, ExecutionEvent::ExecutionStart { .. }));
    assert!(has_started, "Should have received a Started event");

    // Verify we got NodeStarted events for both nodes
    let node_started_names: Vec<String> = events
        .iter()
        .filter_map(|e| {
            if let ExecutionEvent::NodeStart { node_name, .. } = e {
                Some(node_name.clone())
            } else {
                None
            }
        })
        .collect();
    assert!(
        node_started_names.contains(&"Trigger".to_string()),
        "Should have NodeStarted for Trigger"
    );
    assert!(
        node_started_names.contains(&"NoOp".to_string()),
        "Should have NodeStarted for NoOp"
    );

    // Verify we got NodeFinished events for both nodes
    let node_finished_names: Vec<String> = events
        .iter()
        .filter_map(|e| {
            if let ExecutionEvent::NodeComplete { node_name, .. } = e {
                Some(node_name.clone())
            } else {
                None
            }
        })
        .collect();
    assert!(
        node_finished_names.contains(&"Trigger".to_string()),
        "Should have NodeFinished for Trigger"
    );
    assert!(
        node_finished_names.contains(&"NoOp".to_string()),
        "Should have NodeFinished for NoOp"
    );

    // Verify we got a Finished event
    let has_finished = events
        .iter()
        .any(|e| matches!(e, ExecutionEvent::ExecutionComplete { .. }));
    assert!(has_finished, "Should have received a Finished event");

    // Verify event ordering: Started should come first, Finished should come last
    let first_event = &events[0];
    assert!(
        matches!(first_event, ExecutionEvent::ExecutionStart { .. }),
        "First event should be Started"
    );

    let last_event = events.last().unwrap();
    assert!(
        matches!(last_event, ExecutionEvent::ExecutionComplete { .. }),
        "Last event should be Finished"
    );
}

/// 11. Linear Set chain (spec §8 scenario 1).
///     Start -> Set(first="one") -> Set(second="two") -> Set(third="three")
///     Given `[{json:{}}]`, terminal main output must be exactly
///     `[{json:{first:"one",second:"two",third:"three"}}]`.
#[tokio::test]
async fn test_linear_set_chain() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "linear_set_chain",
        vec![
            manual_trigger("Trigger"),
            set_node("First", &[("first", "one")]),
            set_node("Second", &[("second", "two")]),
            set_node("Third", &[("third", "three")]),
        ],
        &[
            ("Trigger", "First", 0, 0),
            ("First", "Second", 0, 0),
            ("Second", "Third", 0, 0),
        ],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    let final_items = get_node_output_items(&run, "Third");
    assert_eq!(final_items.len(), 1, "Terminal node should emit exactly one item");

    let json = &final_items[0].json;
    assert_eq!(json.get("first"), Some(&GenericValue::String("one".to_string())));
    assert_eq!(json.get("second"), Some(&GenericValue::String("two".to_string())));
    assert_eq!(json.get("third"), Some(&GenericValue::String("three".to_string())));
}

/// 12. Diamond with append Merge (spec §8 scenario 2).
///     Start -> Switch(type=="a"->0, type=="b"->1, fallback 2) -> {A,B,C}
///           -> Merge(append) -> Finalize(set finalized=true)
///     Given items of type a/b/c, the terminal output has exactly 3 items,
///     every one carrying `finalized === true`, and the original `type`
///     fields are preserved through the append merge.
#[tokio::test]
async fn test_diamond_switch_merge() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "diamond_switch_merge",
        vec![
            manual_trigger("Trigger"),
            switch_equals_node("Switch", 3.0, &[("type", "a"), ("type", "b")]),
            noop_node("BranchA"),
            noop_node("BranchB"),
            noop_node("BranchC"),
            merge_node("Merge"),
            set_node("Finalize", &[("finalized", "true")]),
        ],
        &[
            ("Trigger", "Switch", 0, 0),
            ("Switch", "BranchA", 0, 0),
            ("Switch", "BranchB", 1, 0),
            ("Switch", "BranchC", 2, 0),
            ("BranchA", "Merge", 0, 0),
            ("BranchB", "Merge", 0, 1),
            ("BranchC", "Merge", 0, 2),
            ("Merge", "Finalize", 0, 0),
        ],
    );

    let input_items: Vec<NodeExecutionData> = vec!["a", "b", "c"]
        .into_iter()
        .enumerate()
        .map(|(i, ty)| {
            let mut data = HashMap::new();
            data.insert("type".to_string(), GenericValue::String(ty.to_string()));
            data.insert("id".to_string(), GenericValue::Integer(i as i64 + 1));
            NodeExecutionData::new(data)
        })
        .collect();

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, Some(input_items))
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    let final_items = get_node_output_items(&run, "Finalize");
    assert_eq!(final_items.len(), 3, "Terminal node should see all 3 items");

    let mut types: Vec<String> = final_items
        .iter()
        .map(|item| {
            assert_eq!(
                item.json.get("finalized"),
                Some(&GenericValue::String("true".to_string())),
                "every item should carry finalized=true"
            );
            match item.json.get("type") {
                Some(GenericValue::String(s)) => s.clone(),
                other => panic!("expected a string 'type' field, got {other:?}"),
            }
        })
        .collect();
    types.sort();
    assert_eq!(types, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

/// 13. Keep-matches Merge (spec §8 scenario 3).
///     Branch A emits ids [1,2,3], branch B emits ids [1,3]; `keepMatches`
///     on `id` should keep only [1,3], in branch-A order.
#[tokio::test]
async fn test_merge_keep_matches() {
    let engine = WorkflowEngine::default();

    let mut merge = merge_node("Merge");
    merge.set_parameter("mode", NodeParameterValue::String("keepMatches".to_string()));
    merge.set_parameter("matchField", NodeParameterValue::String("id".to_string()));

    let workflow = make_workflow(
        "merge_keep_matches",
        vec![
            manual_trigger("TriggerA"),
            manual_trigger("TriggerB"),
            noop_node("BranchA"),
            noop_node("BranchB"),
            merge,
        ],
        &[
            ("TriggerA", "BranchA", 0, 0),
            ("TriggerB", "BranchB", 0, 0),
            ("BranchA", "Merge", 0, 0),
            ("BranchB", "Merge", 0, 1),
        ],
    );

    // Pinned data lets each trigger branch carry its own fixed item set
    // despite both triggers sharing the same initial input otherwise.
    let mut pin_a = HashMap::new();
    pin_a.insert(
        "BranchA".to_string(),
        vec![1, 2, 3]
            .into_iter()
            .map(|id| {
                let mut data = HashMap::new();
                data.insert("id".to_string(), GenericValue::Integer(id));
                NodeExecutionData::new(data)
            })
            .collect(),
    );
    pin_a.insert(
        "BranchB".to_string(),
        vec![1, 3]
            .into_iter()
            .map(|id| {
                let mut data = HashMap::new();
                data.insert("id".to_string(), GenericValue::Integer(id));
                NodeExecutionData::new(data)
            })
            .collect(),
    );

    let mut workflow = workflow;
    workflow.pin_data = Some(pin_a);

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    let merged = get_node_output_items(&run, "Merge");
    let ids: Vec<i64> = merged
        .iter()
        .map(|item| match item.json.get("id") {
            Some(GenericValue::Integer(n)) => *n,
            other => panic!("expected integer id, got {other:?}"),
        })
        .collect();
    assert_eq!(ids, vec![1, 3], "keepMatches should keep only ids shared by every port");
}

/// 14. Retry then success (spec §8 scenario 4).
///     A node configured with `retryOnFail=2, retryDelay=10ms` that fails
///     twice then succeeds: the engine must record zero errors, invoke the
///     executor exactly 3 times, and finish with Success.
#[tokio::test]
async fn test_retry_then_success() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let mut registry = NodeExecutorRegistry::new();
    registry.register(Arc::new(FlakyExecutor::new(2, attempts.clone())));
    let engine = WorkflowEngine::with_executors(registry, RuntimeConfig::default());

    let mut flaky = Node::new("Flaky", "test.flaky");
    flaky.retry_on_fail = 2;
    flaky.retry_delay = 10;

    let workflow = make_workflow(
        "retry_then_success",
        vec![manual_trigger("Trigger"), flaky],
        &[("Trigger", "Flaky", 0, 0)],
    );

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, None)
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);
    assert!(
        run.data.result_data.errors.is_empty(),
        "no errors should be recorded once the retry succeeds"
    );
    assert_eq!(
        attempts.load(Ordering::SeqCst),
        3,
        "executor should have been invoked exactly 3 times (2 failures + 1 success)"
    );

    let flaky_task = &run.data.result_data.run_data["Flaky"][0];
    assert_eq!(flaky_task.execution_status, ExecutionStatus::Success);
}

/// 15. Batch loop (spec §8 scenario 6).
///     10 items through SplitInBatches(batchSize=3) with a trivial
///     processor looped back: `done` fires once with
///     `{totalProcessed:10, batchesProcessed:4}`, `loop` fires 4 times, and
///     no item is processed twice.
#[tokio::test]
async fn test_split_in_batches_loop() {
    let engine = WorkflowEngine::default();

    let workflow = make_workflow(
        "split_in_batches_loop",
        vec![
            manual_trigger("Trigger"),
            split_in_batches_node("Batcher", 3.0),
            noop_node("Processor"),
            noop_node("Final"),
        ],
        &[
            ("Trigger", "Batcher", 0, 0),
            ("Batcher", "Final", 0, 0),   // output 0 = done
            ("Batcher", "Processor", 1, 0), // output 1 = loop
            ("Processor", "Batcher", 0, 0), // loop back into the main input
        ],
    );

    let input_items: Vec<NodeExecutionData> = (0..10)
        .map(|i| {
            let mut data = HashMap::new();
            data.insert("index".to_string(), GenericValue::Integer(i));
            NodeExecutionData::new(data)
        })
        .collect();

    let run = engine
        .execute(&workflow, WorkflowExecuteMode::Manual, Some(input_items))
        .await
        .expect("Execution should succeed");

    assert_eq!(run.status, ExecutionStatus::Success);

    // `loop` (output index 1) should have fired with non-empty batches
    // exactly 4 times; `done` (output index 0) should carry data only once,
    // on the final invocation.
    let batcher_runs = &run.data.result_data.run_data["Batcher"];

    let mut loop_item_count = 0usize;
    let mut done_fires = 0usize;
    let mut summary = None;

    for task in batcher_runs {
        let Some(ref data) = task.data else { continue };
        if let Some(done_port) = data.get(CONNECTION_MAIN).and_then(|ports| ports.first()) {
            if let Some(items) = done_port.items() {
                if !items.is_empty() {
                    done_fires += 1;
                    summary = Some(items[0].json.clone());
                }
            }
        }
        if let Some(loop_port) = data.get(CONNECTION_MAIN).and_then(|ports| ports.get(1)) {
            if let Some(items) = loop_port.items() {
                loop_item_count += items.len();
            }
        }
    }

    assert_eq!(done_fires, 1, "done should fire exactly once with data");
    assert_eq!(loop_item_count, 10, "every item should be emitted on loop exactly once");

    let summary = summary.expect("done should have produced a summary item");
    assert_eq!(
        summary.get("totalProcessed"),
        Some(&GenericValue::Integer(10))
    );
    assert_eq!(
        summary.get("batchesProcessed"),
        Some(&GenericValue::Integer(4))
    );

    // The Processor (loop body) should have run once per batch (4 times).
    let processor_runs = &run.data.result_data.run_data["Processor"];
    assert_eq!(processor_runs.len(), 4, "processor should run once per batch");

    // No item should have been duplicated or dropped by the time it reaches
    // Processor: collect every index it saw across all 4 runs.
    let mut seen_indices: Vec<i64> = Vec::new();
    for task in processor_runs {
        if let Some(ref data) = task.data {
            if let Some(main) = data.get(CONNECTION_MAIN).and_then(|ports| ports.first()) {
                if let Some(items) = main.items() {
                    for item in items {
                        if let Some(GenericValue::Integer(idx)) = item.json.get("index") {
                            seen_indices.push(*idx);
                        }
                    }
                }
            }
        }
    }
    seen_indices.sort();
    assert_eq!(seen_indices, (0..10).collect::<Vec<i64>>());
}
