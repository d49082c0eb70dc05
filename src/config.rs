//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the path passed with `-f/--config`), then applies `LED_ASSIST_BIND` and
//! `LED_ASSIST_LOG_LEVEL` env overrides. The LLM credential is read from the
//! env var named by `llm.api_key_env` and is never sourced from TOML.

use std::{
    env, fs,
    path::Path,
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

/// Default system prompt sent ahead of every user question.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert AI assistant specializing in LED light manufacturing. \
Focus on real-world manufacturing processes, failure analysis, and optimization. \
Provide practical, technical, industry-level answers. \
Answer user query precisely and concisely.";

/// Upper bound accepted for `[history] capacity`.
pub const MAX_HISTORY_CAPACITY: usize = 100_000;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address to bind the API server to.
    pub bind: String,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    pub temperature: f32,
    /// Upper bound on generated tokens (`max_tokens` in the request body).
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"groq"`, `"openai"`, `"dummy"`, …).
    /// Maps to `default` in `[llm]` TOML.
    pub provider: String,
    /// Name of the env var holding the API credential.
    pub api_key_env: String,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub system_prompt: String,
}

/// History ring sizing.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Maximum retained exchanges; oldest are evicted first.
    pub capacity: usize,
    /// Entries returned by `GET /api/history` when no `limit` is given.
    pub default_limit: i64,
}

/// Fully-resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub log_level: String,
    pub http: HttpConfig,
    pub llm: LlmConfig,
    pub gateway: GatewayConfig,
    pub history: HistoryConfig,
    /// API key captured from the environment at load time.
    /// `None` leaves the server running but every query fails.
    pub llm_api_key: Option<String>,
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    http: RawHttp,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    gateway: RawGateway,
    #[serde(default)]
    history: RawHistory,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_app_name")]
    app_name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self { app_name: default_app_name(), log_level: default_log_level() }
    }
}

#[derive(Deserialize)]
struct RawHttp {
    #[serde(default = "default_http_bind")]
    bind: String,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { bind: default_http_bind() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key_env: default_api_key_env(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            max_tokens: default_openai_max_tokens(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawGateway {
    #[serde(default)]
    system_prompt: Option<String>,
}

#[derive(Deserialize)]
struct RawHistory {
    #[serde(default = "default_history_capacity")]
    capacity: usize,
    #[serde(default = "default_history_limit")]
    default_limit: i64,
}

impl Default for RawHistory {
    fn default() -> Self {
        Self { capacity: default_history_capacity(), default_limit: default_history_limit() }
    }
}

fn default_app_name() -> String { "LED Manufacturing AI Assistant".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_http_bind() -> String { "0.0.0.0:8000".to_string() }
fn default_llm_provider() -> String { "groq".to_string() }
fn default_api_key_env() -> String { "GROQ_API_KEY".to_string() }
fn default_openai_api_base_url() -> String { "https://api.groq.com/openai/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "llama-3.1-8b-instant".to_string() }
fn default_openai_temperature() -> f32 { 0.7 }
fn default_openai_max_tokens() -> u32 { 1024 }
fn default_openai_timeout_seconds() -> u64 { 30 }
fn default_history_capacity() -> usize { 100 }
fn default_history_limit() -> i64 { 10 }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides and capture the API credential.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or("config/default.toml"));
    let bind_override = env::var("LED_ASSIST_BIND").ok();
    let log_level_override = env::var("LED_ASSIST_LOG_LEVEL").ok();

    let mut config = load_from(path, bind_override.as_deref(), log_level_override.as_deref())?;
    config.llm_api_key = env::var(&config.llm.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());
    Ok(config)
}

/// Internal loader: accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars; the returned
/// config never carries an API key.
pub fn load_from(
    path: &Path,
    bind_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let log_level = log_level_override.unwrap_or(&parsed.server.log_level).to_string();
    logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("server.log_level: {e}")))?;

    if parsed.llm.api_key_env.trim().is_empty() {
        return Err(AppError::Config("llm.api_key_env must not be empty".into()));
    }

    if parsed.history.capacity > MAX_HISTORY_CAPACITY {
        return Err(AppError::Config(format!(
            "history.capacity {} exceeds the maximum of {MAX_HISTORY_CAPACITY}",
            parsed.history.capacity
        )));
    }

    Ok(Config {
        app_name: parsed.server.app_name,
        log_level,
        http: HttpConfig {
            bind: bind_override.map(str::to_string).unwrap_or(parsed.http.bind),
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            api_key_env: parsed.llm.api_key_env,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                max_tokens: parsed.llm.openai.max_tokens,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        gateway: GatewayConfig {
            system_prompt: parsed
                .gateway
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        },
        history: HistoryConfig {
            capacity: parsed.history.capacity,
            default_limit: parsed.history.default_limit,
        },
        llm_api_key: None,
    })
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Shipped defaults pointed at `api_base_url`. No file or env access.
#[cfg(test)]
impl Config {
    pub fn test_default(api_base_url: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            app_name: "test".into(),
            log_level: "info".into(),
            http: HttpConfig { bind: "127.0.0.1:0".into() },
            llm: LlmConfig {
                provider: "openai-compatible".into(),
                api_key_env: default_api_key_env(),
                openai: OpenAiConfig {
                    api_base_url: api_base_url.into(),
                    model: default_openai_model(),
                    temperature: default_openai_temperature(),
                    max_tokens: default_openai_max_tokens(),
                    timeout_seconds: 5,
                },
            },
            gateway: GatewayConfig { system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() },
            history: HistoryConfig {
                capacity: default_history_capacity(),
                default_limit: default_history_limit(),
            },
            llm_api_key: api_key.map(str::to_string),
        }
    }
}
