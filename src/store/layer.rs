//! Layer type and value helpers

use serde_json::Value;

/// A flat key/value mapping holding one configuration source
pub type Layer = serde_json::Map<String, Value>;

/// Layer populated by file loads
pub const FILE_LAYER: &str = "file";
/// Layer populated from the process environment
pub const ENV_LAYER: &str = "env";
/// Layer populated from command-line arguments
pub const ARGV_LAYER: &str = "argv";
/// Default layer for `set`
pub const CUSTOM_LAYER: &str = "custom";

/// Layers present in every storage, lowest precedence first
pub const BUILTIN_LAYERS: [&str; 4] = [FILE_LAYER, ENV_LAYER, ARGV_LAYER, CUSTOM_LAYER];

/// Whether a value counts as set during lookup
///
/// Follows JavaScript truthiness: `null`, `false`, `0` and `""` are falsy,
/// every array and object is truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Short name of a value's type, for error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
