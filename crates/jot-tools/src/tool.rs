use async_trait::async_trait;
use serde_json::Value;

/// A single tool invocation, executed by name with JSON arguments.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Opaque identifier forwarded verbatim into the output.
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments
    pub args: Value,
}

/// The result of executing a tool.
///
/// Tool failures are data, not panics: a failing execution produces an
/// output with `is_error` set and a message, which the integration layer
/// wraps into a typed error for callers.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub call_id: String,
    /// Structured result payload; `Null` on error.
    pub value: Value,
    /// Human-readable summary, or the error message when `is_error` is set.
    pub message: String,
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful structured result.
    pub fn ok(call_id: impl Into<String>, value: Value) -> Self {
        Self {
            call_id: call_id.into(),
            value,
            message: String::new(),
            is_error: false,
        }
    }

    /// Error result containing a plain-text error message.
    pub fn err(call_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            value: Value::Null,
            message: msg.into(),
            is_error: true,
        }
    }
}

/// Trait that every builtin and user-defined tool must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Capabilities this tool provides (e.g. `["tabular_write"]`).
    fn capabilities(&self) -> &[&str];
    /// JSON Schema for parameters
    fn parameters_schema(&self) -> Value;
    /// External account whose stored credential this tool depends on.
    /// `None` for tools that need no per-user setup.
    fn requires_account(&self) -> Option<&str> {
        None
    }
    /// Generic automation bridge: proxies the same external actions without
    /// a user-specific stored key.  Ranked after credentialed providers.
    fn is_bridge(&self) -> bool {
        false
    }
    /// Execute the tool.  Errors should be wrapped in [`ToolOutput::err`].
    async fn execute(&self, call: &ToolCall) -> ToolOutput;
}
