//! Request flattening expected by the stock-movement API.
//!
//! The server binds request parameters by dotted path, so nested objects are
//! collapsed into `parent.child` keys: `{"recipient": {"id": "u1"}}` is sent
//! as `{"recipient.id": "u1"}`. Arrays stay arrays; each element is flattened
//! on its own, which keeps `packPageItems` and `splitLineItems` intact.

use serde_json::Map;
use serde_json::Value;

pub fn flatten_request(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(flatten_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(flatten_request).collect()),
        other => other,
    }
}

fn flatten_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in map {
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                for (child_key, child) in flatten_object(inner) {
                    out.insert(format!("{key}.{child_key}"), child);
                }
            }
            other => {
                out.insert(key, flatten_request(other));
            }
        }
    }
    out
}
