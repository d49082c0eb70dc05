//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities; clone them freely.
//! The `complete` method is `async fn` on the enum so callers need no
//! trait-object machinery.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("{0}")]
    Request(String),
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` as the user message, preceded by `system` when given,
    /// and return the text of the first completion choice.
    pub async fn complete(&self, content: &str, system: Option<&str>) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(content, system).await,
        }
    }

    /// Whether the provider holds everything it needs to issue a request.
    /// Keyless providers are always ready.
    pub fn has_credential(&self) -> bool {
        match self {
            LlmProvider::Dummy(_) => true,
            LlmProvider::OpenAiCompatible(p) => p.has_api_key(),
        }
    }

    /// Short name for logs and the health endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai-compatible",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dummy_dispatch_ignores_system_prompt() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.complete("hi", Some("be terse")).await.unwrap(), "[echo] hi");
        assert!(p.has_credential());
        assert_eq!(p.name(), "dummy");
    }

    #[test]
    fn request_error_displays_bare_message() {
        let e = ProviderError::Request("HTTP 503 Service Unavailable: overloaded".into());
        assert_eq!(e.to_string(), "HTTP 503 Service Unavailable: overloaded");
    }
}
