// ABOUTME: Configuration loading for bedrock-agent-chat.
// ABOUTME: Layers ~/.bedrock-chat/config.toml, environment variables, and CLI overrides.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{ChatError, Result};

/// Top-level configuration, resolved from file, environment, then CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Remote agent identifiers and endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub agent_id: Option<String>,
    pub agent_arn: Option<String>,
    pub alias_id: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            agent_arn: None,
            alias_id: "TSTALIASID".to_string(),
            region: "us-west-2".to_string(),
            endpoint: None,
            api_key: None,
        }
    }
}

/// Chat history storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
        }
    }
}

impl Config {
    /// Load config from ~/.bedrock-chat/config.toml, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ChatError::Configuration(format!("invalid {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bedrock-chat")
            .join("config.toml")
    }

    /// Overlay environment variables onto the loaded config.
    ///
    /// `.env` autoloading (dotenvy) happens in main before this runs.
    pub fn apply_env(&mut self) {
        if let Ok(v) = env::var("BEDROCK_AGENT_ID") {
            self.agent.agent_id = Some(v);
        }
        if let Ok(v) = env::var("BEDROCK_AGENT_ARN") {
            self.agent.agent_arn = Some(v);
        }
        if let Ok(v) = env::var("BEDROCK_AGENT_ALIAS_ID") {
            self.agent.alias_id = v;
        }
        if let Ok(v) = env::var("AWS_REGION") {
            self.agent.region = v;
        }
        if let Ok(v) = env::var("BEDROCK_AGENT_ENDPOINT") {
            self.agent.endpoint = Some(v);
        }
        if let Ok(v) = env::var("AWS_BEARER_TOKEN_BEDROCK") {
            self.agent.api_key = Some(v);
        }
        if let Ok(v) = env::var("CHAT_HISTORY_DIR") {
            self.history.dir = PathBuf::from(v);
        }
    }

    /// Resolve the final agent identity, consulting the ARN when needed.
    ///
    /// An explicit agent id wins over the ARN. When the id comes from the
    /// ARN, so does the region. Fails before any network use when no id
    /// can be determined.
    pub fn resolve(&mut self) -> Result<()> {
        if self.agent.agent_id.is_none() {
            if let Some(arn) = self.agent.agent_arn.clone() {
                let (agent_id, region) = parse_agent_arn(&arn)?;
                self.agent.agent_id = Some(agent_id);
                self.agent.region = region;
            }
        }
        if self.agent.agent_id.is_none() {
            return Err(ChatError::Configuration(
                "BEDROCK_AGENT_ID or BEDROCK_AGENT_ARN must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse agent id and region out of a Bedrock agent ARN.
///
/// The ARN must have at least 6 colon-delimited fields with `bedrock`
/// as the service field, e.g.
/// `arn:aws:bedrock:us-west-2:123456789:agent/ABCDEF`.
pub fn parse_agent_arn(arn: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 6 || parts[2] != "bedrock" {
        return Err(ChatError::Configuration(format!(
            "invalid Bedrock agent ARN: {arn}"
        )));
    }
    let region = parts[3].to_string();
    let agent_id = parts[5].rsplit('/').next().unwrap_or(parts[5]).to_string();
    Ok((agent_id, region))
}
