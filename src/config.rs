use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    /// Supports ${ENV_VAR} substitution
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_request: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
    /// Ceiling on reasoning-service round trips per session
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    /// Directory all tool operations are confined to
    pub root: PathBuf,
    /// Maximum characters returned by the read tool before truncation
    #[serde(default = "default_read_limit")]
    pub read_limit: usize,
    /// Wall-clock ceiling for one execute subprocess, in seconds
    #[serde(default = "default_exec_timeout_secs")]
    pub exec_timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_rounds() -> u32 {
    20
}

fn default_read_limit() -> usize {
    10_000
}

fn default_exec_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${ANTHROPIC_API_KEY}
        let expanded = shellexpand::env(&content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Whether a usable API credential is configured.
    pub fn has_credential(&self) -> bool {
        !self.llm.api_key.trim().is_empty()
    }
}
