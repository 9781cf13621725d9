//! Sandboxed JavaScript execution for the Code node.
//!
//! Scripts run inside a QuickJS runtime (`rquickjs`) on a dedicated OS
//! thread so a runaway or hung script can't block the async executor; the
//! calling task cancels it by polling a shared flag QuickJS checks between
//! bytecode instructions, rather than by killing the thread outright.

use n8n_workflow::{DataObject, GenericValue, NodeExecutionData};
use rquickjs::{Array, Context, Ctx, Function, Object, Runtime, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wall-clock budget for a single Code node invocation.
pub const CODE_TIMEOUT: Duration = Duration::from_secs(5);
/// Heap ceiling enforced on the QuickJS runtime, in bytes.
pub const CODE_MEMORY_LIMIT: usize = 128 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CodeSandboxError {
    #[error("{0}")]
    Script(String),
    #[error("script exceeded its {0:?} time budget")]
    Timeout(Duration),
    #[error("sandbox thread did not shut down cleanly")]
    ThreadPanic,
}

/// Run `code` against `items`, either once per item (`run_once_for_each_item`)
/// or once against the whole set, returning the resulting items.
pub fn run_code(
    code: &str,
    items: Vec<NodeExecutionData>,
    run_once_for_each_item: bool,
    node_name: &str,
    node_data: &HashMap<String, Vec<Vec<NodeExecutionData>>>,
) -> Result<Vec<NodeExecutionData>, CodeSandboxError> {
    let code = code.to_string();
    let node_name = node_name.to_string();
    let node_data = node_data.clone();
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_for_thread = interrupted.clone();

    let (tx, rx) = std::sync::mpsc::channel();
    let handle = std::thread::Builder::new()
        .name(format!("code-node-{node_name}"))
        .spawn(move || {
            let result = execute_in_runtime(
                &code,
                items,
                run_once_for_each_item,
                &node_name,
                &node_data,
                interrupted_for_thread,
            );
            let _ = tx.send(result);
        })
        .map_err(|e| CodeSandboxError::Script(e.to_string()))?;

    match rx.recv_timeout(CODE_TIMEOUT) {
        Ok(result) => {
            let _ = handle.join();
            result
        }
        Err(_) => {
            // Ask QuickJS to unwind at its next interrupt check, then stop
            // waiting on the thread: the async caller must not block here.
            interrupted.store(true, Ordering::SeqCst);
            Err(CodeSandboxError::Timeout(CODE_TIMEOUT))
        }
    }
}

fn execute_in_runtime(
    code: &str,
    items: Vec<NodeExecutionData>,
    run_once_for_each_item: bool,
    node_name: &str,
    node_data: &HashMap<String, Vec<Vec<NodeExecutionData>>>,
    interrupted: Arc<AtomicBool>,
) -> Result<Vec<NodeExecutionData>, CodeSandboxError> {
    let runtime = Runtime::new().map_err(|e| CodeSandboxError::Script(e.to_string()))?;
    runtime.set_memory_limit(CODE_MEMORY_LIMIT);
    runtime.set_interrupt_handler(Some(Box::new(move || interrupted.load(Ordering::SeqCst))));

    let context = Context::full(&runtime).map_err(|e| CodeSandboxError::Script(e.to_string()))?;

    context.with(|ctx| run_in_context(ctx, code, items, run_once_for_each_item, node_name, node_data))
}

fn run_in_context<'js>(
    ctx: Ctx<'js>,
    code: &str,
    items: Vec<NodeExecutionData>,
    run_once_for_each_item: bool,
    node_name: &str,
    node_data: &HashMap<String, Vec<Vec<NodeExecutionData>>>,
) -> Result<Vec<NodeExecutionData>, CodeSandboxError> {
    let to_script_err = |e: rquickjs::Error| CodeSandboxError::Script(e.to_string());

    let globals = ctx.globals();

    let items_js = Array::new(ctx.clone()).map_err(to_script_err)?;
    for (i, item) in items.iter().enumerate() {
        let obj = Object::new(ctx.clone()).map_err(to_script_err)?;
        obj.set("json", data_object_to_js(&ctx, &item.json).map_err(to_script_err)?)
            .map_err(to_script_err)?;
        items_js.set(i, obj).map_err(to_script_err)?;
    }
    globals.set("items", items_js.clone()).map_err(to_script_err)?;

    if let Some(first) = items.first() {
        globals
            .set("$json", data_object_to_js(&ctx, &first.json).map_err(to_script_err)?)
            .map_err(to_script_err)?;
    }

    globals
        .set("$input", build_input_binding(&ctx, items_js).map_err(to_script_err)?)
        .map_err(to_script_err)?;

    globals
        .set("$node", build_node_binding(&ctx, node_data).map_err(to_script_err)?)
        .map_err(to_script_err)?;

    let execution_obj = Object::new(ctx.clone()).map_err(to_script_err)?;
    execution_obj.set("id", "").map_err(to_script_err)?;
    globals.set("$execution", execution_obj).map_err(to_script_err)?;
    globals.set("$nodeName", node_name).map_err(to_script_err)?;

    let log_fn = Function::new(ctx.clone(), |msg: String| {
        tracing::info!(target: "code_node", "{msg}");
    })
    .map_err(to_script_err)?;
    globals.set("log", log_fn).map_err(to_script_err)?;

    // `getItem`/`newItem` are small JS helpers rather than native bindings:
    // they only touch values already marshaled into the VM.
    let prelude = "function getItem(i) { return items[i].json; } \
                   function newItem(json) { return { json: json }; }";
    ctx.eval::<(), _>(prelude).map_err(to_script_err)?;

    let wrapped = if run_once_for_each_item {
        format!(
            "(function() {{ \
                const __fn = function($json, $itemIndex) {{ {code} }}; \
                const __out = []; \
                for (let __i = 0; __i < items.length; __i++) {{ \
                    const __r = __fn(items[__i].json, __i); \
                    if (__r !== undefined) __out.push(__r); \
                }} \
                return __out; \
            }})()"
        )
    } else {
        format!("(function() {{ {code} }})()")
    };

    let result: Value = ctx.eval(wrapped.as_bytes()).map_err(to_script_err)?;
    Ok(js_result_to_items(&result))
}

/// Build the `$input` binding: an object exposing `all()`, `first()`,
/// `last()` over the node's full input sequence, matching the `items`
/// array already bound to the globals.
fn build_input_binding<'js>(ctx: &Ctx<'js>, items_js: Array<'js>) -> rquickjs::Result<Object<'js>> {
    let input = Object::new(ctx.clone())?;

    let all_items = items_js.clone();
    let all_fn = Function::new(ctx.clone(), move || all_items.clone())?;
    input.set("all", all_fn)?;

    let first_items = items_js.clone();
    let first_fn = Function::new(ctx.clone(), move || -> rquickjs::Result<Value> {
        first_items.get::<_, Value>(0)
    })?;
    input.set("first", first_fn)?;

    let last_items = items_js.clone();
    let last_ctx = ctx.clone();
    let last_fn = Function::new(ctx.clone(), move || -> rquickjs::Result<Value> {
        let len = last_items.len();
        if len == 0 {
            return Ok(Value::new_undefined(last_ctx.clone()));
        }
        last_items.get::<_, Value>(len - 1)
    })?;
    input.set("last", last_fn)?;

    input.set("length", items_js.len())?;

    Ok(input)
}

/// Build the `$node` binding: `$node["Name"].json` / `.data` resolve to the
/// named node's most recent main-output items (an array of `{json}`-shaped
/// entries, matching `$json`'s item shape; `.json` is the first item's
/// payload as a convenience, `.data` the full array).
fn build_node_binding<'js>(
    ctx: &Ctx<'js>,
    node_data: &HashMap<String, Vec<Vec<NodeExecutionData>>>,
) -> rquickjs::Result<Object<'js>> {
    let node_obj = Object::new(ctx.clone())?;
    for (name, runs) in node_data {
        let items = runs.last().cloned().unwrap_or_default();

        let data_arr = Array::new(ctx.clone())?;
        for (i, item) in items.iter().enumerate() {
            let wrapper = Object::new(ctx.clone())?;
            wrapper.set("json", data_object_to_js(ctx, &item.json)?)?;
            data_arr.set(i, wrapper)?;
        }

        let entry = Object::new(ctx.clone())?;
        if let Some(first) = items.first() {
            entry.set("json", data_object_to_js(ctx, &first.json)?)?;
        } else {
            entry.set("json", Object::new(ctx.clone())?)?;
        }
        entry.set("data", data_arr)?;

        node_obj.set(name.as_str(), entry)?;
    }
    Ok(node_obj)
}

fn generic_to_js<'js>(ctx: &Ctx<'js>, value: &GenericValue) -> rquickjs::Result<Value<'js>> {
    Ok(match value {
        GenericValue::Null => Value::new_null(ctx.clone()),
        GenericValue::Bool(b) => Value::new_bool(ctx.clone(), *b),
        GenericValue::Integer(n) => Value::new_number(ctx.clone(), *n as f64),
        GenericValue::Float(f) => Value::new_number(ctx.clone(), *f),
        GenericValue::String(s) => rquickjs::String::from_str(ctx.clone(), s)?.into_value(),
        GenericValue::Array(items) => {
            let arr = Array::new(ctx.clone())?;
            for (i, item) in items.iter().enumerate() {
                arr.set(i, generic_to_js(ctx, item)?)?;
            }
            arr.into_value()
        }
        GenericValue::Object(obj) => data_object_to_js(ctx, obj)?.into_value(),
    })
}

fn data_object_to_js<'js>(ctx: &Ctx<'js>, obj: &DataObject) -> rquickjs::Result<Object<'js>> {
    let o = Object::new(ctx.clone())?;
    for (k, v) in obj {
        o.set(k.as_str(), generic_to_js(ctx, v)?)?;
    }
    Ok(o)
}

fn js_to_generic(value: &Value<'_>) -> GenericValue {
    if value.is_null() || value.is_undefined() {
        return GenericValue::Null;
    }
    if let Some(b) = value.as_bool() {
        return GenericValue::Bool(b);
    }
    if let Some(n) = value.as_int() {
        return GenericValue::Integer(n as i64);
    }
    if let Some(f) = value.as_float() {
        return GenericValue::Float(f);
    }
    if let Some(s) = value.as_string() {
        return GenericValue::String(s.to_string().unwrap_or_default());
    }
    if let Some(arr) = value.as_array() {
        let mut out = Vec::new();
        for entry in arr.iter::<Value>().flatten() {
            out.push(js_to_generic(&entry));
        }
        return GenericValue::Array(out);
    }
    if let Some(obj) = value.as_object() {
        let mut out = DataObject::new();
        for key in obj.keys::<String>().flatten() {
            if let Ok(v) = obj.get::<_, Value>(key.as_str()) {
                out.insert(key, js_to_generic(&v));
            }
        }
        return GenericValue::Object(out);
    }
    GenericValue::Null
}

fn js_result_to_items(result: &Value<'_>) -> Vec<NodeExecutionData> {
    match js_to_generic(result) {
        GenericValue::Array(items) => items.into_iter().map(generic_to_item).collect(),
        GenericValue::Null => Vec::new(),
        other => vec![generic_to_item(other)],
    }
}

fn generic_to_item(value: GenericValue) -> NodeExecutionData {
    match value {
        GenericValue::Object(mut obj) => match obj.remove("json") {
            Some(GenericValue::Object(json)) => NodeExecutionData::new(json),
            _ => NodeExecutionData::new(obj),
        },
        other => {
            let mut wrapper = DataObject::new();
            wrapper.insert("value".to_string(), other);
            NodeExecutionData::new(wrapper)
        }
    }
}
