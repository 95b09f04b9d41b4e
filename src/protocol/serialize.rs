//! Text forms for results and errors.
//!
//! Result and error fields on the wire are strings. Script values use the
//! rules below; everything structured (diffs, log pages, error payloads) is
//! JSON text.
//!
//! | Value | Text |
//! |-------|------|
//! | `undefined` | `undefined` |
//! | `null` | `null` |
//! | primitive | its string form |
//! | element | outer markup, truncated |
//! | element collection | `[N elements]` |
//! | other | pretty JSON, or the host's string fallback |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::{Error, Result};
use crate::host::ScriptValue;
use crate::util::{now_ms, truncate_chars};

// ============================================================================
// Values
// ============================================================================

/// Converts a script value to its result text.
#[must_use]
pub fn serialize_value(value: &ScriptValue, markup_chars: usize) -> String {
    match value {
        ScriptValue::Undefined => "undefined".to_string(),
        ScriptValue::Null => "null".to_string(),
        ScriptValue::Bool(b) => b.to_string(),
        ScriptValue::Number(n) => format_number(*n),
        ScriptValue::String(s) => s.clone(),
        ScriptValue::Element { outer_html } => truncate_chars(outer_html, markup_chars),
        ScriptValue::ElementList { len } => {
            let noun = if *len == 1 { "element" } else { "elements" };
            format!("[{len} {noun}]")
        }
        ScriptValue::Structured(json) => {
            serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string())
        }
        ScriptValue::Opaque(text) => text.clone(),
    }
}

/// Formats a number the way the page would print it.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Serializes any structured result to JSON text.
pub(crate) fn to_json_text<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

// ============================================================================
// Errors
// ============================================================================

/// Structured error sent in the `error` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Human-readable message.
    pub message: String,
    /// Error class name.
    pub name: String,
    /// Stack trace, when known.
    pub stack: Option<String>,
    /// Error category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Time the error was serialized.
    pub timestamp: u64,
    /// Source file of the throw site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Line of the throw site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Column of the throw site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    /// Elapsed time for timeouts, in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<u64>,
}

impl ErrorPayload {
    /// Builds the payload for `error`.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        let mut payload = Self {
            message: error.to_string(),
            name: error.name().to_string(),
            stack: None,
            kind: error.category().to_string(),
            timestamp: now_ms(),
            file_name: None,
            line_number: None,
            column_number: None,
            elapsed: None,
        };

        match error {
            Error::Script(script) => {
                payload.message = script.message.clone();
                payload.stack = script.stack.clone();
                payload.file_name = script.file_name.clone();
                payload.line_number = script.line_number;
                payload.column_number = script.column_number;
            }
            Error::Timeout { elapsed_ms, .. } => payload.elapsed = Some(*elapsed_ms),
            _ => {}
        }

        payload
    }

    /// Returns the payload as JSON text.
    #[must_use]
    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::host::ScriptError;

    #[test]
    fn test_primitives() {
        assert_eq!(serialize_value(&ScriptValue::Undefined, 10), "undefined");
        assert_eq!(serialize_value(&ScriptValue::Null, 10), "null");
        assert_eq!(serialize_value(&ScriptValue::Bool(true), 10), "true");
        assert_eq!(serialize_value(&ScriptValue::Number(42.0), 10), "42");
        assert_eq!(serialize_value(&ScriptValue::Number(0.5), 10), "0.5");
        assert_eq!(serialize_value(&ScriptValue::Number(f64::NAN), 10), "NaN");
        assert_eq!(
            serialize_value(&ScriptValue::Number(f64::NEG_INFINITY), 10),
            "-Infinity"
        );
        assert_eq!(serialize_value(&ScriptValue::Number(-0.0), 10), "0");
        assert_eq!(serialize_value(&ScriptValue::String("hi".into()), 10), "hi");
    }

    #[test]
    fn test_element_markup_is_truncated() {
        let value = ScriptValue::Element {
            outer_html: format!("<div>{}</div>", "a".repeat(3000)),
        };
        assert_eq!(serialize_value(&value, 2000).chars().count(), 2000);
    }

    #[test]
    fn test_element_list_summary() {
        assert_eq!(
            serialize_value(&ScriptValue::ElementList { len: 3 }, 2000),
            "[3 elements]"
        );
        assert_eq!(
            serialize_value(&ScriptValue::ElementList { len: 1 }, 2000),
            "[1 element]"
        );
    }

    #[test]
    fn test_structured_is_json() {
        let text = serialize_value(&ScriptValue::Structured(json!({"a": [1, 2]})), 2000);
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(parsed, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_script_error_payload() {
        let error = Error::from(
            ScriptError::new("ReferenceError", "x is not defined")
                .with_stack("at <anonymous>:1:1")
                .with_location("<anonymous>", 1, 1),
        );
        let payload = ErrorPayload::from_error(&error);
        assert_eq!(payload.name, "ReferenceError");
        assert_eq!(payload.message, "x is not defined");
        assert_eq!(payload.kind, "script");
        assert_eq!(payload.line_number, Some(1));

        let json: serde_json::Value = serde_json::from_str(&payload.to_text()).expect("json");
        assert_eq!(json["type"], "script");
        assert_eq!(json["fileName"], "<anonymous>");
    }

    #[test]
    fn test_timeout_payload_carries_elapsed() {
        let payload = ErrorPayload::from_error(&Error::timeout("execute", 30_000));
        assert_eq!(payload.name, "TimeoutError");
        assert_eq!(payload.elapsed, Some(30_000));

        let json = serde_json::to_value(&payload).expect("serialize");
        assert!(json.get("lineNumber").is_none());
        assert!(json["stack"].is_null());
    }
}
