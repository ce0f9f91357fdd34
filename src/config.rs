//! Configuration types for query-gateway.
//!
//! Config is loaded once at startup from a TOML file and validated before the
//! server opens its port. Every section is optional; omitted values fall back
//! to the public upstream endpoints. Secrets never live in the file: each
//! provider names the environment variable that holds its credential.
//!
//! # Example
//! ```toml
//! [gateway]
//! port = 4000
//! log_format = "json"
//!
//! [providers.deepseek]
//! api_key_env = "DEEPSEEK_API_KEY"
//!
//! [providers.openai]
//! default_model = "gpt-4o"
//! default_reasoning_effort = "medium"
//!
//! [providers.agent]
//! base_url = "http://mastra.internal:4111"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.gateway.error_body_limit > 0,
            "`gateway.error_body_limit` must be greater than zero"
        );

        let upstreams = [
            ("deepseek", &self.providers.deepseek.base_url, self.providers.deepseek.timeout_ms),
            ("openai", &self.providers.openai.base_url, self.providers.openai.timeout_ms),
            ("agent", &self.providers.agent.base_url, self.providers.agent.timeout_ms),
        ];
        for (name, base_url, timeout_ms) in upstreams {
            anyhow::ensure!(
                base_url.starts_with("http://") || base_url.starts_with("https://"),
                "provider `{}` base_url `{}` must start with http:// or https://",
                name,
                base_url
            );
            anyhow::ensure!(timeout_ms > 0, "provider `{}` timeout_ms must be non-zero", name);
        }

        anyhow::ensure!(
            !self.providers.agent.default_run_id.trim().is_empty(),
            "provider `agent` default_run_id must not be empty"
        );

        Ok(())
    }
}

/// Core gateway settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Port for the query API (default: 4000).
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Log output format (also see the `RUST_LOG` env var for levels).
    #[serde(default)]
    pub log_format: LogFormat,

    /// Maximum characters of an upstream error body quoted back to callers
    /// (default: 2048). The HTTP status is always reported in full.
    #[serde(default = "defaults::error_body_limit")]
    pub error_body_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            log_format: LogFormat::default(),
            error_body_limit: defaults::error_body_limit(),
        }
    }
}

/// One section per upstream.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub deepseek: DeepSeekConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// DeepSeek chat completions (`POST {base_url}/chat/completions`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeepSeekConfig {
    pub base_url: String,
    /// Environment variable holding the API key. Required.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    /// Model used when the caller does not name one.
    pub default_model: String,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".into(),
            api_key_env: Some("DEEPSEEK_API_KEY".into()),
            timeout_ms: defaults::timeout_ms(),
            default_model: "deepseek-chat".into(),
        }
    }
}

impl DeepSeekConfig {
    /// Resolve the API key. A missing key is a configuration failure.
    pub fn api_key(&self) -> Result<String, GatewayError> {
        required_key("deepseek", self.api_key_env.as_deref())
    }
}

/// OpenAI Responses API (`POST {base_url}/v1/responses`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    /// Environment variable holding the API key. Required.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    /// Model used when the caller does not name one.
    pub default_model: String,
    /// Reasoning effort sent when the caller gives none. Unset means the
    /// `reasoning` field is omitted entirely.
    pub default_reasoning_effort: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key_env: Some("OPENAI_API_KEY".into()),
            timeout_ms: defaults::timeout_ms(),
            default_model: "gpt-4o".into(),
            default_reasoning_effort: None,
        }
    }
}

impl OpenAiConfig {
    /// Resolve the API key. A missing key is a configuration failure.
    pub fn api_key(&self) -> Result<String, GatewayError> {
        required_key("openai", self.api_key_env.as_deref())
    }
}

/// Agent orchestration server (`POST {base_url}/api/agents/{run_id}/generate`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    pub base_url: String,
    /// Environment variable holding a bearer token. Optional: leave unset for
    /// keyless local servers. When set, the variable must resolve.
    pub api_key_env: Option<String>,
    pub timeout_ms: u64,
    /// Agent invoked when the caller does not pass `runId`.
    pub default_run_id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4111".into(),
            api_key_env: None,
            timeout_ms: defaults::timeout_ms(),
            default_run_id: "weatherAgent".into(),
        }
    }
}

impl AgentConfig {
    /// Resolve the optional bearer token.
    pub fn api_key(&self) -> Result<Option<String>, GatewayError> {
        self.api_key_env
            .as_deref()
            .map(|var| required_key("agent", Some(var)))
            .transpose()
    }
}

fn required_key(provider: &str, api_key_env: Option<&str>) -> Result<String, GatewayError> {
    let var = api_key_env.ok_or_else(|| {
        GatewayError::ConfigMissing(format!("{provider} credential: no `api_key_env` configured"))
    })?;
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::ConfigMissing(format!(
                "{provider} credential: environment variable `{var}` is not set"
            ))
        })
}

mod defaults {
    pub fn port() -> u16 { 4000 }
    pub fn error_body_limit() -> usize { 2048 }
    pub fn timeout_ms() -> u64 { 60_000 }
}
