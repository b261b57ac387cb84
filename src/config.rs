//! Configuration loader and validator for the Notion polling jobs.
//!
//! Secrets only come from the environment (optionally seeded from `.env`).
//! Everything else has built-in defaults that a YAML file may override.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const ENV_NOTION_TOKEN: &str = "NOTION_TOKEN";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DATABASE_ID: &str = "NOTION_DATABASE_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
    pub scripting: Scripting,
    pub openai: OpenAi,
    pub thumbnails: Thumbnails,
}

/// Settings shared by both polling loops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    /// Pause after a pass that failed unexpectedly.
    pub cooldown_secs: u64,
}

impl Default for App {
    fn default() -> Self {
        Self { cooldown_secs: 60 }
    }
}

/// Notion API settings and property mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Notion {
    pub base_url: String,
    pub version: String,
    pub properties: Properties,
}

impl Default for Notion {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com/".into(),
            version: "2022-06-28".into(),
            properties: Properties::default(),
        }
    }
}

/// Display names of the database properties. Lists are tried in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Properties {
    pub title: Vec<String>,
    pub description: String,
    pub status: String,
    pub url: Vec<String>,
    pub url_filter: String,
    pub thumbnail_url: String,
    pub script_generated: String,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            title: vec!["Video Title".into(), "Name".into()],
            description: "Video Description".into(),
            status: "Status".into(),
            url: vec!["YouTube URL".into(), "URL".into()],
            url_filter: "URL".into(),
            thumbnail_url: "Thumbnail URL".into(),
            script_generated: "Script Generated".into(),
        }
    }
}

/// Script generation workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Scripting {
    pub poll_interval_secs: u64,
    pub source_status: String,
    pub target_status: String,
}

impl Default for Scripting {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
            source_status: "Scripting".into(),
            target_status: "Review".into(),
        }
    }
}

/// Chat-completions endpoint and prompt framing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAi {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub channel_name: String,
    pub channel_niche: String,
}

impl Default for OpenAi {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/".into(),
            model: "gpt-4".into(),
            max_tokens: 4000,
            temperature: 0.7,
            channel_name: "ADev Tutorials".into(),
            channel_niche: "Web Development, Programming and AI".into(),
        }
    }
}

/// Thumbnail backfill workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Thumbnails {
    pub poll_interval_secs: u64,
    pub image_host: String,
    pub probe_timeout_secs: u64,
    /// Pause between two records of the same pass.
    pub record_delay_ms: u64,
}

impl Default for Thumbnails {
    fn default() -> Self {
        Self {
            poll_interval_secs: 600,
            image_host: "https://img.youtube.com/vi/".into(),
            probe_timeout_secs: 10,
            record_delay_ms: 1000,
        }
    }
}

/// Credentials read from the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub notion_token: String,
    pub database_id: String,
    pub openai_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl Secrets {
    /// Read secrets from the environment. The OpenAI key is only required by
    /// the script generator.
    pub fn from_env(require_openai: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), require_openai)
    }

    pub fn from_lookup<F>(lookup: F, require_openai: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let notion_token = read(ENV_NOTION_TOKEN);
        let database_id = read(ENV_DATABASE_ID);
        let openai_api_key = read(ENV_OPENAI_API_KEY);

        let mut missing = Vec::new();
        if notion_token.is_none() {
            missing.push(ENV_NOTION_TOKEN);
        }
        if require_openai && openai_api_key.is_none() {
            missing.push(ENV_OPENAI_API_KEY);
        }
        if database_id.is_none() {
            missing.push(ENV_DATABASE_ID);
        }

        match (notion_token, database_id) {
            (Some(notion_token), Some(database_id)) if missing.is_empty() => Ok(Self {
                notion_token,
                database_id,
                openai_api_key,
            }),
            _ => Err(ConfigError::MissingEnv(missing)),
        }
    }
}

/// Load configuration from an optional YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.cooldown_secs == 0 {
        return Err(ConfigError::Invalid("app.cooldown_secs must be > 0"));
    }

    if cfg.notion.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.base_url must be non-empty"));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty"));
    }

    let p = &cfg.notion.properties;
    if p.title.is_empty() || p.title.iter().any(|n| n.trim().is_empty()) {
        return Err(ConfigError::Invalid(
            "notion.properties.title must list non-empty names",
        ));
    }
    if p.url.is_empty() || p.url.iter().any(|n| n.trim().is_empty()) {
        return Err(ConfigError::Invalid(
            "notion.properties.url must list non-empty names",
        ));
    }
    let singles = [
        (&p.description, "notion.properties.description must be non-empty"),
        (&p.status, "notion.properties.status must be non-empty"),
        (&p.url_filter, "notion.properties.url_filter must be non-empty"),
        (&p.thumbnail_url, "notion.properties.thumbnail_url must be non-empty"),
        (
            &p.script_generated,
            "notion.properties.script_generated must be non-empty",
        ),
    ];
    for (value, msg) in singles {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(msg));
        }
    }

    if cfg.scripting.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("scripting.poll_interval_secs must be > 0"));
    }
    if cfg.scripting.source_status.trim().is_empty() {
        return Err(ConfigError::Invalid("scripting.source_status must be non-empty"));
    }
    if cfg.scripting.target_status.trim().is_empty() {
        return Err(ConfigError::Invalid("scripting.target_status must be non-empty"));
    }

    if cfg.openai.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("openai.base_url must be non-empty"));
    }
    if cfg.openai.model.trim().is_empty() {
        return Err(ConfigError::Invalid("openai.model must be non-empty"));
    }
    if cfg.openai.max_tokens == 0 {
        return Err(ConfigError::Invalid("openai.max_tokens must be > 0"));
    }
    if !(0.0..=2.0).contains(&cfg.openai.temperature) {
        return Err(ConfigError::Invalid("openai.temperature must be within 0.0..=2.0"));
    }

    if cfg.thumbnails.poll_interval_secs == 0 {
        return Err(ConfigError::Invalid("thumbnails.poll_interval_secs must be > 0"));
    }
    if cfg.thumbnails.image_host.trim().is_empty() {
        return Err(ConfigError::Invalid("thumbnails.image_host must be non-empty"));
    }
    if cfg.thumbnails.probe_timeout_secs == 0 {
        return Err(ConfigError::Invalid("thumbnails.probe_timeout_secs must be > 0"));
    }

    Ok(())
}

/// Example YAML listing every tunable with its default value.
pub fn example() -> &'static str {
    r#"app:
  cooldown_secs: 60

notion:
  base_url: "https://api.notion.com/"
  version: "2022-06-28"
  properties:
    title: ["Video Title", "Name"]
    description: "Video Description"
    status: "Status"
    url: ["YouTube URL", "URL"]
    url_filter: "URL"
    thumbnail_url: "Thumbnail URL"
    script_generated: "Script Generated"

scripting:
  poll_interval_secs: 300
  source_status: "Scripting"
  target_status: "Review"

openai:
  base_url: "https://api.openai.com/v1/"
  model: "gpt-4"
  max_tokens: 4000
  temperature: 0.7
  channel_name: "ADev Tutorials"
  channel_niche: "Web Development, Programming and AI"

thumbnails:
  poll_interval_secs: 600
  image_host: "https://img.youtube.com/vi/"
  probe_timeout_secs: 10
  record_delay_ms: 1000
"#
}
