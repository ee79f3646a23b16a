use std::collections::BTreeMap;

/// One reasoning call, fully specified.
#[derive(Debug, Clone, Default)]
pub struct ReasonRequest {
    /// System prompt for the call; `None` uses the provider default.
    pub system_prompt: Option<String>,
    /// The task prompt itself.
    pub prompt: String,
    /// Named context values appended to the prompt (`key: value` lines),
    /// kept separate so drivers may place them provider-appropriately.
    pub context: BTreeMap<String, String>,
    /// Tool names the provider is allowed to surface in its answer.
    /// Purely advisory for providers without native tool support.
    pub allowed_tools: Vec<String>,
    /// Per-call output token cap; `None` uses the configured default.
    pub max_tokens: Option<u32>,
}

impl ReasonRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The full prompt as sent to providers that take a single text block:
    /// the prompt followed by a `Context:` section when context is present.
    pub fn full_prompt(&self) -> String {
        if self.context.is_empty() {
            return self.prompt.clone();
        }
        let context_str: String = self
            .context
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n\nContext:\n{}", self.prompt, context_str)
    }
}

/// Structured result of a reasoning call.
#[derive(Debug, Clone, Default)]
pub struct ReasonOutcome {
    /// The provider's text answer.
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_prompt_without_context_is_prompt() {
        let req = ReasonRequest::new("extract the table");
        assert_eq!(req.full_prompt(), "extract the table");
    }

    #[test]
    fn full_prompt_appends_context_section() {
        let req = ReasonRequest::new("extract")
            .with_context("user_context", "inventory page")
            .with_context("urls", "https://example.com");
        let full = req.full_prompt();
        assert!(full.starts_with("extract\n\nContext:\n"));
        assert!(full.contains("user_context: inventory page"));
        assert!(full.contains("urls: https://example.com"));
    }
}
