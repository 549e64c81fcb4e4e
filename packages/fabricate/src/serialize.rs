//! Persisted state layout (§6 "Persisted state layout"): a plain, serde-friendly mirror of
//! [`InstanceNode`] with live signals and function props stripped out.

use fabricate_core::{InstanceNode, PropValue, Props};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel written in place of a [`PropValue::Function`], which cannot itself be serialized.
const FUNCTION_SENTINEL: &str = "__fabricate_function__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: String,
    pub path: Vec<String>,
    pub construct_type: String,
    pub reconcile_key: String,
    pub props: serde_json::Value,
    pub outputs: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedState {
    pub nodes: Vec<SerializedNode>,
    pub timestamp: u64,
    pub checkpoint_index: usize,
    pub audit_ref: Option<String>,
}

pub fn prop_value_to_json(value: &PropValue) -> serde_json::Value {
    match value {
        PropValue::Undefined => serde_json::Value::Null,
        PropValue::Null => serde_json::Value::Null,
        PropValue::Bool(b) => serde_json::Value::Bool(*b),
        PropValue::Number(n) => serde_json::json!(n),
        PropValue::String(s) => serde_json::Value::String(s.clone()),
        PropValue::Array(items) => serde_json::Value::Array(items.iter().map(prop_value_to_json).collect()),
        PropValue::Object(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), prop_value_to_json(v))).collect(),
        ),
        PropValue::Function(_) => serde_json::Value::String(FUNCTION_SENTINEL.to_string()),
    }
}

pub fn json_to_prop_value(value: &serde_json::Value) -> PropValue {
    match value {
        serde_json::Value::Null => PropValue::Null,
        serde_json::Value::Bool(b) => PropValue::Bool(*b),
        serde_json::Value::Number(n) => PropValue::Number(n.as_f64().unwrap_or_default()),
        serde_json::Value::String(s) if s == FUNCTION_SENTINEL => {
            PropValue::Function(std::rc::Rc::new(|_: &[PropValue]| PropValue::Undefined))
        }
        serde_json::Value::String(s) => PropValue::String(s.clone()),
        serde_json::Value::Array(items) => PropValue::Array(items.iter().map(json_to_prop_value).collect()),
        serde_json::Value::Object(map) => {
            PropValue::Object(map.iter().map(|(k, v)| (k.clone(), json_to_prop_value(v))).collect())
        }
    }
}

fn props_to_json(props: &Props) -> serde_json::Value {
    serde_json::Value::Object(props.iter().map(|(k, v)| (k.clone(), prop_value_to_json(v))).collect())
}

fn json_to_props(value: &serde_json::Value) -> Props {
    match value {
        serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), json_to_prop_value(v))).collect(),
        _ => Props::new(),
    }
}

pub fn to_serialized(node: &InstanceNode) -> SerializedNode {
    SerializedNode {
        id: node.id.clone(),
        path: node.path.clone(),
        construct_type: node.construct_type.clone(),
        reconcile_key: node.reconcile_key.clone(),
        props: props_to_json(&node.props),
        outputs: props_to_json(&node.outputs_snapshot()),
    }
}

pub fn from_serialized(serialized: &SerializedNode) -> InstanceNode {
    InstanceNode::new(
        serialized.id.clone(),
        serialized.path.clone(),
        serialized.construct_type.clone(),
        json_to_props(&serialized.props),
        serialized.reconcile_key.clone(),
        json_to_props(&serialized.outputs),
    )
}
