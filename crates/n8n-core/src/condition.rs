//! Shared condition/operator evaluation used by the If, Filter, and
//! Switch ("rules" mode) executors.
//!
//! Conditions are expressed as a structured group rather than a raw
//! expression string, so each item can be tested individually without
//! re-invoking the expression engine per item:
//!
//! ```text
//! conditions: {
//!     combinator: "and" | "or",         // default "and"
//!     conditions: [
//!         { field: "status", operator: "equals", value: "ok" },
//!         ...
//!     ],
//! }
//! ```
//!
//! `field` is a dot-notation path into the item's JSON (`address.city`).
//! `value` is omitted for unary operators (`isEmpty`, `isTrue`, ...).

use n8n_workflow::{DataObject, GenericValue, NodeExecutionData, NodeParameterValue};
use regex::Regex;

/// Operators supported by conditions across If/Filter/Switch.
pub const OPERATORS: &[&str] = &[
    "equals",
    "notEquals",
    "contains",
    "notContains",
    "startsWith",
    "endsWith",
    "gt",
    "gte",
    "lt",
    "lte",
    "isEmpty",
    "isNotEmpty",
    "regex",
    "isTrue",
    "isFalse",
];

/// Evaluate a condition group against a single item. Missing or
/// malformed condition data defaults to `true` (pass), matching the
/// permissive behavior of an unconfigured filter.
pub fn evaluate_condition_group(
    group: Option<&NodeParameterValue>,
    item: &NodeExecutionData,
) -> bool {
    let Some(NodeParameterValue::Object(group)) = group else {
        return true;
    };

    let combinator = match group.get("combinator") {
        Some(NodeParameterValue::String(s)) => s.as_str(),
        _ => "and",
    };

    let conditions = match group.get("conditions") {
        Some(NodeParameterValue::Array(list)) => list,
        _ => return true,
    };

    if conditions.is_empty() {
        return true;
    }

    let mut results = conditions.iter().map(|c| evaluate_single(c, item));

    if combinator == "or" {
        results.any(|r| r)
    } else {
        results.all(|r| r)
    }
}

fn evaluate_single(condition: &NodeParameterValue, item: &NodeExecutionData) -> bool {
    let NodeParameterValue::Object(cond) = condition else {
        return false;
    };

    let field = match cond.get("field") {
        Some(NodeParameterValue::String(s)) => s.as_str(),
        _ => return false,
    };
    let operator = match cond.get("operator") {
        Some(NodeParameterValue::String(s)) => s.as_str(),
        _ => "equals",
    };
    let right = cond.get("value");

    let left = get_by_path(&item.json, field);
    evaluate_operator(left, operator, right)
}

/// Walk a dot-notation path (`address.city`) through an item's JSON object.
pub fn get_by_path<'a>(json: &'a DataObject, path: &str) -> Option<&'a GenericValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = json.get(first)?;
    for segment in segments {
        match current {
            GenericValue::Object(obj) => current = obj.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn evaluate_operator(
    left: Option<&GenericValue>,
    operator: &str,
    right: Option<&NodeParameterValue>,
) -> bool {
    match operator {
        "notEquals" => !values_equal(left, right),
        "contains" => to_string(left).contains(&param_to_string(right)),
        "notContains" => !to_string(left).contains(&param_to_string(right)),
        "startsWith" => to_string(left).starts_with(&param_to_string(right)),
        "endsWith" => to_string(left).ends_with(&param_to_string(right)),
        "gt" => to_f64(left)
            .zip(param_to_f64(right))
            .map(|(l, r)| l > r)
            .unwrap_or(false),
        "gte" => to_f64(left)
            .zip(param_to_f64(right))
            .map(|(l, r)| l >= r)
            .unwrap_or(false),
        "lt" => to_f64(left)
            .zip(param_to_f64(right))
            .map(|(l, r)| l < r)
            .unwrap_or(false),
        "lte" => to_f64(left)
            .zip(param_to_f64(right))
            .map(|(l, r)| l <= r)
            .unwrap_or(false),
        "isEmpty" => is_empty(left),
        "isNotEmpty" => !is_empty(left),
        "isTrue" => is_truthy(left),
        "isFalse" => !is_truthy(left),
        "regex" => {
            let pattern = param_to_string(right);
            Regex::new(&pattern)
                .map(|re| re.is_match(&to_string(left)))
                .unwrap_or(false)
        }
        _ => values_equal(left, right),
    }
}

fn values_equal(left: Option<&GenericValue>, right: Option<&NodeParameterValue>) -> bool {
    match right {
        Some(NodeParameterValue::Boolean(b)) => is_truthy(left) == *b,
        Some(NodeParameterValue::Number(n)) => to_f64(left).map(|l| l == *n).unwrap_or(false),
        _ => to_string(left) == param_to_string(right),
    }
}

pub fn is_truthy(v: Option<&GenericValue>) -> bool {
    match v {
        None | Some(GenericValue::Null) => false,
        Some(GenericValue::Bool(b)) => *b,
        Some(GenericValue::Integer(n)) => *n != 0,
        Some(GenericValue::Float(f)) => *f != 0.0,
        Some(GenericValue::String(s)) => !s.is_empty(),
        Some(GenericValue::Array(a)) => !a.is_empty(),
        Some(GenericValue::Object(o)) => !o.is_empty(),
    }
}

fn is_empty(v: Option<&GenericValue>) -> bool {
    match v {
        None | Some(GenericValue::Null) => true,
        Some(GenericValue::String(s)) => s.is_empty(),
        Some(GenericValue::Array(a)) => a.is_empty(),
        Some(GenericValue::Object(o)) => o.is_empty(),
        _ => false,
    }
}

pub fn to_string(v: Option<&GenericValue>) -> String {
    match v {
        None | Some(GenericValue::Null) => String::new(),
        Some(GenericValue::String(s)) => s.clone(),
        Some(GenericValue::Bool(b)) => b.to_string(),
        Some(GenericValue::Integer(n)) => n.to_string(),
        Some(GenericValue::Float(f)) => f.to_string(),
        Some(other) => format!("{:?}", other),
    }
}

fn to_f64(v: Option<&GenericValue>) -> Option<f64> {
    match v {
        Some(GenericValue::Integer(n)) => Some(*n as f64),
        Some(GenericValue::Float(f)) => Some(*f),
        Some(GenericValue::String(s)) => s.parse().ok(),
        Some(GenericValue::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub fn param_to_string(v: Option<&NodeParameterValue>) -> String {
    match v {
        Some(NodeParameterValue::String(s)) | Some(NodeParameterValue::Expression(s)) => {
            s.clone()
        }
        Some(NodeParameterValue::Number(n)) => n.to_string(),
        Some(NodeParameterValue::Boolean(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn param_to_f64(v: Option<&NodeParameterValue>) -> Option<f64> {
    match v {
        Some(NodeParameterValue::Number(n)) => Some(*n),
        Some(NodeParameterValue::String(s)) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n8n_workflow::NodeExecutionData;

    fn item_with(key: &str, value: GenericValue) -> NodeExecutionData {
        let mut json = DataObject::new();
        json.insert(key.to_string(), value);
        NodeExecutionData::new(json)
    }

    fn group(conditions: Vec<NodeParameterValue>, combinator: &str) -> NodeParameterValue {
        let mut obj = std::collections::HashMap::new();
        obj.insert(
            "combinator".to_string(),
            NodeParameterValue::String(combinator.to_string()),
        );
        obj.insert("conditions".to_string(), NodeParameterValue::Array(conditions));
        NodeParameterValue::Object(obj)
    }

    fn condition(field: &str, operator: &str, value: Option<NodeParameterValue>) -> NodeParameterValue {
        let mut obj = std::collections::HashMap::new();
        obj.insert("field".to_string(), NodeParameterValue::String(field.to_string()));
        obj.insert("operator".to_string(), NodeParameterValue::String(operator.to_string()));
        if let Some(v) = value {
            obj.insert("value".to_string(), v);
        }
        NodeParameterValue::Object(obj)
    }

    #[test]
    fn no_conditions_passes() {
        let item = item_with("status", GenericValue::String("ok".into()));
        assert!(evaluate_condition_group(None, &item));
    }

    #[test]
    fn equals_matches() {
        let item = item_with("status", GenericValue::String("ok".into()));
        let g = group(
            vec![condition(
                "status",
                "equals",
                Some(NodeParameterValue::String("ok".into())),
            )],
            "and",
        );
        assert!(evaluate_condition_group(Some(&g), &item));
    }

    #[test]
    fn and_combinator_requires_all() {
        let item = item_with("status", GenericValue::String("ok".into()));
        let g = group(
            vec![
                condition("status", "equals", Some(NodeParameterValue::String("ok".into()))),
                condition("missing", "isNotEmpty", None),
            ],
            "and",
        );
        assert!(!evaluate_condition_group(Some(&g), &item));
    }

    #[test]
    fn or_combinator_requires_any() {
        let item = item_with("status", GenericValue::String("ok".into()));
        let g = group(
            vec![
                condition("status", "equals", Some(NodeParameterValue::String("bad".into()))),
                condition("status", "equals", Some(NodeParameterValue::String("ok".into()))),
            ],
            "or",
        );
        assert!(evaluate_condition_group(Some(&g), &item));
    }

    #[test]
    fn gt_numeric_compare() {
        let item = item_with("age", GenericValue::Integer(21));
        let g = group(
            vec![condition("age", "gt", Some(NodeParameterValue::Number(18.0)))],
            "and",
        );
        assert!(evaluate_condition_group(Some(&g), &item));
    }

    #[test]
    fn nested_path_lookup() {
        let mut inner = DataObject::new();
        inner.insert("city".to_string(), GenericValue::String("Berlin".into()));
        let item = item_with("address", GenericValue::Object(inner));
        let g = group(
            vec![condition(
                "address.city",
                "equals",
                Some(NodeParameterValue::String("Berlin".into())),
            )],
            "and",
        );
        assert!(evaluate_condition_group(Some(&g), &item));
    }
}
