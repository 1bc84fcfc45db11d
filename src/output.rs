//! JSON output for query results.
//!
//! All output is deterministic: set members are sorted before printing, and
//! lookup responses are keyed in sorted order.
//!
//! ```
//! use keyset_query::output::{ToJson, to_json};
//! use keyset_query::sets::UInt32Set;
//!
//! let set = UInt32Set::from_iter([3, 1, 2]);
//! assert_eq!(to_json(&set.to_json()), "[1,2,3]");
//! ```

use serde_json::{Map, Value, json};

use crate::{
    lookup::{LookupResponse, SingleLookupResult},
    sets::{StringSet, UInt32Set},
};

pub trait ToJson {
    fn to_json(&self) -> Value;
}

impl ToJson for StringSet {
    fn to_json(&self) -> Value {
        let mut members: Vec<&String> = self.iter().collect();
        members.sort();
        json!(members)
    }
}

impl ToJson for UInt32Set {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(Value::from).collect())
    }
}

impl ToJson for SingleLookupResult {
    fn to_json(&self) -> Value {
        match self {
            SingleLookupResult::Value(value) => json!({ "value": value }),
            SingleLookupResult::KeysetValues(values) => json!({ "keyset_values": values }),
            SingleLookupResult::UInt32SetValues(values) => json!({ "uint32set_values": values }),
            SingleLookupResult::NotFound(message) => {
                json!({ "status": { "code": "NOT_FOUND", "message": message } })
            }
        }
    }
}

impl ToJson for LookupResponse {
    fn to_json(&self) -> Value {
        let pairs: Map<String, Value> = self
            .iter()
            .map(|(key, result)| (key.clone(), result.to_json()))
            .collect();
        Value::Object(pairs)
    }
}

/// Compact JSON with no extra whitespace.
pub fn to_json(value: &Value) -> String {
    value.to_string()
}

/// JSON with 2-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
