//! Tool catalog adapter
//!
//! Converts MCP tool descriptors into the function-calling envelope the
//! chat completions API expects. Servers advertise their input schema
//! under different keys and shapes, so extraction runs through an ordered
//! chain of strategies; the first one producing a non-empty schema object
//! wins, and total failure falls back to the empty-object schema.

use serde_json::{json, Map, Value};

use crate::mcp::types::ToolDescriptor;

/// Keys a descriptor may hold its schema under, in priority order
const SCHEMA_KEYS: [&str; 3] = ["inputSchema", "input_schema", "parameters"];

/// Keys a wrapper object may expose the actual schema under
const ACCESSOR_KEYS: [&str; 2] = ["schema", "json_schema"];

/// Schema extraction strategy: inspect a descriptor, maybe produce a schema
type Extractor = fn(&ToolDescriptor) -> Option<Value>;

/// The extraction chain, in priority order
const EXTRACTORS: [Extractor; 3] = [
    extract_inline_object,
    extract_wrapped_object,
    extract_embedded_string,
];

/// The schema used when a descriptor carries nothing extractable
pub fn empty_object_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
    })
}

/// Extract the input schema from a descriptor, falling back to the
/// empty-object schema
pub fn extract_schema(descriptor: &ToolDescriptor) -> Value {
    for extract in EXTRACTORS {
        if let Some(schema) = extract(descriptor) {
            return schema;
        }
    }
    empty_object_schema()
}

/// Wrap one descriptor in the function-calling envelope
pub fn to_function_envelope(descriptor: &ToolDescriptor) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": descriptor.name,
            "description": descriptor.description.clone().unwrap_or_default(),
            "parameters": extract_schema(descriptor),
        }
    })
}

/// Convert a full descriptor list into the function-calling catalog
pub fn openai_tools(descriptors: &[ToolDescriptor]) -> Vec<Value> {
    descriptors.iter().map(to_function_envelope).collect()
}

/// Strategy 1: a schema key directly holding a JSON-Schema object
fn extract_inline_object(descriptor: &ToolDescriptor) -> Option<Value> {
    for key in SCHEMA_KEYS {
        if let Some(Value::Object(obj)) = descriptor.extra.get(key) {
            if !obj.is_empty() {
                return Some(Value::Object(obj.clone()));
            }
        }
    }
    None
}

/// Strategy 2: a schema key holding a wrapper object whose accessor key
/// carries the schema (possibly as a JSON string)
fn extract_wrapped_object(descriptor: &ToolDescriptor) -> Option<Value> {
    for key in SCHEMA_KEYS {
        let Some(Value::Object(wrapper)) = descriptor.extra.get(key) else {
            continue;
        };
        for accessor in ACCESSOR_KEYS {
            match wrapper.get(accessor) {
                Some(Value::Object(obj)) if !obj.is_empty() => {
                    return Some(Value::Object(obj.clone()));
                }
                Some(Value::String(s)) => {
                    if let Some(obj) = parse_schema_string(s) {
                        return Some(Value::Object(obj));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

/// Strategy 3: a schema key holding a JSON string that parses to an object
fn extract_embedded_string(descriptor: &ToolDescriptor) -> Option<Value> {
    for key in SCHEMA_KEYS {
        if let Some(Value::String(s)) = descriptor.extra.get(key) {
            if let Some(obj) = parse_schema_string(s) {
                return Some(Value::Object(obj));
            }
        }
    }
    None
}

/// Parse a candidate JSON string; anything but a non-empty object is
/// treated as a miss, never an error
fn parse_schema_string(s: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(obj)) if !obj.is_empty() => Some(obj),
        _ => None,
    }
}
