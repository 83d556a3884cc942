use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::FileTokenStore;
use crate::config::ClientConfig;
use crate::services::Propman;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Up => "up",
            ServerStatus::Down => "down",
            ServerStatus::Unknown => "unknown",
        }
    }
}

/// Named backends, persisted as `server.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub servers: BTreeMap<String, ServerInfo>,
}

/// Current selection, persisted as `env.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_server: Option<String>,
    pub current_user: Option<String>,
}

impl ServerInfo {
    pub fn new(url: String, api_key: Option<String>, description: String) -> Self {
        Self {
            url: url.trim().trim_end_matches('/').to_string(),
            api_key,
            description,
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PROPMAN_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("propman")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating config directory {}", config_dir.display()))?;
    }

    Ok(config_dir)
}

fn load_json<T: Default + for<'de> Deserialize<'de>>(file: &str) -> anyhow::Result<T> {
    let path = get_config_dir()?.join(file);
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(&path)?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn save_json<T: Serialize>(file: &str, value: &T) -> anyhow::Result<()> {
    let path = get_config_dir()?.join(file);
    let content = serde_json::to_string_pretty(value)?;
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_json("server.json")
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_json("server.json", config)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    load_json("env.json")
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    save_json("env.json", config)
}

pub fn session_path(server_name: &str) -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("sessions").join(format!("{}.json", server_name)))
}

/// The selected server, by name
pub fn current_server() -> anyhow::Result<(String, ServerInfo)> {
    let env_config = load_environment_config()?;
    let name = env_config
        .current_server
        .ok_or_else(|| anyhow::anyhow!("No current server set. Use 'propman server add <url>' first"))?;

    let servers = load_server_config()?;
    let info = servers
        .servers
        .get(&name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Current server '{}' not found in configuration", name))?;
    Ok((name, info))
}

/// Client for the selected server, with its session stored on disk
pub fn connect() -> anyhow::Result<Propman> {
    let (name, server) = current_server()?;

    let mut config = ClientConfig::from_env();
    config.api.base_url = server.url.clone();
    if server.api_key.is_some() {
        config.api.api_key = server.api_key.clone();
    }

    let store = FileTokenStore::new(session_path(&name)?);
    tracing::debug!(server = %name, url = %server.url, "connecting");
    Ok(Propman::new(&config, Arc::new(store))?)
}

pub async fn ping_server(server_info: &ServerInfo) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_info.url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}
