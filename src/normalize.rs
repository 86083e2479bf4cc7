//! Normalization of provider responses into an ordered message list.
//!
//! Providers wrap their message array differently. The set of accepted shapes is
//! closed:
//!
//! 1. a bare JSON array,
//! 2. an object with the array under `data` or `messages` (checked in that order),
//! 3. an object whose first array-valued field (in document order) holds it.
//!
//! Anything else normalizes to an empty list.
//!
//! ```
//! use mailbox_poll::normalize::{normalize, ResponseShape, detect_shape};
//! use serde_json::json;
//!
//! let body = json!({"total": 1, "data": [{"subject": "Hi"}]});
//! assert_eq!(detect_shape(&body), ResponseShape::KnownKey("data"));
//! assert_eq!(normalize(body).len(), 1);
//! ```

use crate::message::RawMessage;
use serde_json::Value;

/// Wrapper keys tried before falling back to the first list-valued field.
pub const KNOWN_LIST_KEYS: [&str; 2] = ["data", "messages"];

/// Where the message list was found in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// The response itself is the list.
    BareList,
    /// The list sits under one of [`KNOWN_LIST_KEYS`].
    KnownKey(&'static str),
    /// The list sits under the first array-valued field.
    FirstListField(String),
    /// No list anywhere.
    NoList,
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseShape::BareList => write!(f, "bare list"),
            ResponseShape::KnownKey(key) => write!(f, "list under '{key}'"),
            ResponseShape::FirstListField(key) => write!(f, "first list field '{key}'"),
            ResponseShape::NoList => write!(f, "no list"),
        }
    }
}

/// Determines which shape a response has.
#[must_use]
pub fn detect_shape(response: &Value) -> ResponseShape {
    match response {
        Value::Array(_) => ResponseShape::BareList,
        Value::Object(map) => {
            if let Some(key) = KNOWN_LIST_KEYS
                .into_iter()
                .find(|key| map.get(*key).is_some_and(Value::is_array))
            {
                return ResponseShape::KnownKey(key);
            }

            map.iter()
                .find(|(_, v)| v.is_array())
                .map_or(ResponseShape::NoList, |(key, _)| {
                    ResponseShape::FirstListField(key.clone())
                })
        }
        _ => ResponseShape::NoList,
    }
}

/// Extracts the message list from a response, keeping provider order.
#[must_use]
pub fn normalize(response: Value) -> Vec<RawMessage> {
    let shape = detect_shape(&response);

    let list = match (shape, response) {
        (ResponseShape::BareList, Value::Array(items)) => items,
        (ResponseShape::KnownKey(key), Value::Object(mut map)) => take_list(&mut map, key),
        (ResponseShape::FirstListField(key), Value::Object(mut map)) => take_list(&mut map, &key),
        _ => Vec::new(),
    };

    list.into_iter().map(RawMessage::new).collect()
}

fn take_list(map: &mut serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
    match map.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}
