//! Query gateway: turns a user question into one chat-completion call.
//!
//! Every question is sent as a two-message conversation: the configured
//! system prompt followed by the question itself. Successful answers are
//! recorded in the shared [`HistoryBuffer`]; failures leave it untouched.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::history::{HistoryBuffer, HistoryEntry};
use crate::llm::{providers, LlmProvider, ProviderError};

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryResponse {
    pub response: String,
    pub timestamp: String,
}

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum QueryError {
    /// No API credential was available at startup.
    #[error("{env_var} not configured")]
    Configuration { env_var: String },
    /// The completion call failed: transport, timeout, non-2xx or bad body.
    #[error("LLM API error: {0}")]
    Upstream(String),
}

impl From<ProviderError> for QueryError {
    fn from(e: ProviderError) -> Self {
        QueryError::Upstream(e.to_string())
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

pub struct QueryGateway {
    provider: LlmProvider,
    system_prompt: String,
    /// Env var the credential is expected in; named in configuration errors.
    api_key_env: String,
    history: Arc<HistoryBuffer>,
}

impl QueryGateway {
    pub fn new(
        provider: LlmProvider,
        system_prompt: impl Into<String>,
        api_key_env: impl Into<String>,
        history: Arc<HistoryBuffer>,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            api_key_env: api_key_env.into(),
            history,
        }
    }

    /// Build the provider and history ring described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let provider = providers::build(&config.llm, config.llm_api_key.clone())?;
        let history = Arc::new(HistoryBuffer::new(config.history.capacity));
        Ok(Self::new(
            provider,
            config.gateway.system_prompt.clone(),
            config.llm.api_key_env.clone(),
            history,
        ))
    }

    pub fn history(&self) -> &Arc<HistoryBuffer> {
        &self.history
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Ask the completion service `question` and record the answer.
    ///
    /// Fails with [`QueryError::Configuration`] before any network traffic
    /// when the provider has no credential. No retries are attempted.
    pub async fn submit(&self, question: &str) -> Result<QueryResponse, QueryError> {
        if !self.provider.has_credential() {
            warn!(env_var = %self.api_key_env, "query rejected: API key not configured");
            return Err(QueryError::Configuration { env_var: self.api_key_env.clone() });
        }

        debug!(provider = self.provider.name(), question_len = question.len(), "submitting query");

        let response = self
            .provider
            .complete(question, Some(&self.system_prompt))
            .await?;

        // Stamped under the history lock so buffer order matches timestamp order.
        let entry = self.history.push_with(|| HistoryEntry {
            question: question.to_string(),
            response,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        });

        info!(response_len = entry.response.len(), history_len = self.history.len(), "query answered");

        Ok(QueryResponse { response: entry.response, timestamp: entry.timestamp })
    }

    /// The last `limit` recorded exchanges, oldest first.
    pub fn recent(&self, limit: i64) -> Vec<HistoryEntry> {
        self.history.recent(limit)
    }
}
