//! Code evaluation against the page's global scope.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::result::Result as StdResult;

use futures_util::future::BoxFuture;
use serde_json::Value;

// ============================================================================
// ScriptValue
// ============================================================================

/// A value produced by evaluated code.
///
/// The host classifies page values into these shapes; the bridge turns them
/// into text with [`serialize_value`](crate::protocol::serialize_value).
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// Boolean primitive.
    Bool(bool),
    /// Number primitive.
    Number(f64),
    /// String primitive.
    String(String),
    /// A single element, carried as its outer markup.
    Element {
        /// Outer markup of the element.
        outer_html: String,
    },
    /// A collection of elements.
    ElementList {
        /// Number of elements in the collection.
        len: usize,
    },
    /// Any other value that could be structured.
    Structured(Value),
    /// A value that could not be structured (cycles, host objects).
    ///
    /// Carries the host's best-effort string conversion.
    Opaque(String),
}

// ============================================================================
// ScriptError
// ============================================================================

/// An error raised by evaluated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// Error class name (`TypeError`, `ReferenceError`, ...).
    pub name: String,
    /// Error message.
    pub message: String,
    /// Stack trace, when the host has one.
    pub stack: Option<String>,
    /// Source file of the throw site.
    pub file_name: Option<String>,
    /// Line of the throw site.
    pub line_number: Option<u32>,
    /// Column of the throw site.
    pub column_number: Option<u32>,
}

impl ScriptError {
    /// Creates a script error with a class name and message.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            file_name: None,
            line_number: None,
            column_number: None,
        }
    }

    /// Sets the stack trace.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Sets the throw-site location.
    #[must_use]
    pub fn with_location(mut self, file_name: impl Into<String>, line: u32, column: u32) -> Self {
        self.file_name = Some(file_name.into());
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for ScriptError {}

// ============================================================================
// Evaluation
// ============================================================================

/// Pending completion of a thenable result.
pub type Deferred = BoxFuture<'static, StdResult<ScriptValue, ScriptError>>;

/// Outcome of evaluating code.
pub enum Evaluation {
    /// The code produced a value synchronously.
    Ready(ScriptValue),
    /// The code produced a thenable; the value arrives later.
    Deferred(Deferred),
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

// ============================================================================
// ScriptHost
// ============================================================================

/// Evaluates caller-supplied code in the page.
pub trait ScriptHost: Send + Sync {
    /// Evaluates `code` against the page's global scope.
    ///
    /// # Errors
    ///
    /// Returns the error thrown synchronously by the code.
    fn evaluate(&self, code: &str) -> StdResult<Evaluation, ScriptError>;
}
