use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;

use backend_domain::RuntimeConfig;

use super::validation::{ensure_positive, validate_origin};

/// Where a loaded config came from. Logged once tracing is up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Defaults,
    File(String),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub history_limit: usize,
    pub feed_capacity: usize,
    pub max_message_len: usize,
    pub allowed_origins: Vec<String>,
    pub log_dir: Option<String>,
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            bind_addr: runtime.bind_addr,
            max_body_bytes: runtime.max_body_bytes,
            request_timeout_seconds: runtime.request_timeout_seconds,
            history_limit: runtime.history_limit,
            feed_capacity: runtime.feed_capacity,
            max_message_len: runtime.max_message_len,
            allowed_origins: runtime.allowed_origins,
            log_dir: None,
            source: ConfigSource::Defaults,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("CHAT_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(Path::new(&path)).await
    }

    /// Reads `file_path` when it exists, otherwise starts from defaults.
    pub async fn load_from(file_path: &Path) -> Result<Self> {
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            let mut config = Self::from_toml(&content)?;
            config.source = ConfigSource::File(file_path.display().to_string());
            config
        } else {
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(log_dir) = &self.log_dir {
            if log_dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
        self.bind_addr = self.bind_addr.trim().to_string();
        let mut origins: Vec<String> = std::mem::take(&mut self.allowed_origins)
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
        origins.sort();
        origins.dedup();
        self.allowed_origins = origins;
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        ensure_positive("max_body_bytes", self.max_body_bytes)?;
        ensure_positive("request_timeout_seconds", self.request_timeout_seconds)?;
        ensure_positive("history_limit", self.history_limit as u64)?;
        ensure_positive("feed_capacity", self.feed_capacity as u64)?;
        ensure_positive("max_message_len", self.max_message_len as u64)?;
        for origin in &self.allowed_origins {
            validate_origin(origin)?;
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            history_limit: self.history_limit,
            feed_capacity: self.feed_capacity,
            max_message_len: self.max_message_len,
            allowed_origins: self.allowed_origins.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("CHAT_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("CHAT_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("CHAT_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("CHAT_HISTORY_LIMIT") {
            self.history_limit = value.parse().unwrap_or(self.history_limit);
        }
        if let Ok(value) = env::var("CHAT_FEED_CAPACITY") {
            self.feed_capacity = value.parse().unwrap_or(self.feed_capacity);
        }
        if let Ok(value) = env::var("CHAT_MAX_MESSAGE_LEN") {
            self.max_message_len = value.parse().unwrap_or(self.max_message_len);
        }
        if let Ok(value) = env::var("CHAT_ALLOWED_ORIGINS") {
            self.allowed_origins = parse_env_list(&value);
        }
        if let Ok(value) = env::var("CHAT_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn parse_env_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}
