use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const ASSEMBLY_AI_PROVIDER: &str = "assembly-ai";

const APP_DIR: &str = "gitintel";

/// `<config_dir>/gitintel/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Unable to determine config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}

/// `<data_dir>/gitintel/gitintel.db`, under `~/.local/share` when the platform
/// has no data directory.
pub fn default_database_path() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .context("Unable to determine data directory")?;
    Ok(base.join(APP_DIR).join("gitintel.db"))
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub transcription: TranscriptionConfig,
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data_dir>/gitintel/gitintel.db`.
    pub path: Option<String>,
}

/// Upper bound for `auth.session_ttl_hours` (ten years).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub api_endpoint: Option<String>,
    /// Upper bound for a single summarization attempt
    pub timeout_seconds: u64,
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub retry_backoff_seconds: u64,
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Mark meetings left in PROCESSING by a previous run as FAILED on start-up
    pub fail_interrupted_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 30,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: Some(ASSEMBLY_AI_PROVIDER.to_string()),
            api_key: None,
            api_endpoint: None,
            timeout_seconds: 900,
            max_attempts: 2,
            retry_backoff_seconds: 5,
            poll_interval_seconds: 3,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            fail_interrupted_on_startup: true,
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Apply `DATABASE_URL`, `ASSEMBLYAI_API_KEY`, `GITINTEL_HOST` and
    /// `GITINTEL_PORT` on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("DATABASE_URL") {
            let path = url.strip_prefix("sqlite://").unwrap_or(&url);
            self.database.path = Some(path.to_string());
        }
        if let Some(key) = lookup("ASSEMBLYAI_API_KEY") {
            self.transcription.api_key = Some(key);
        }
        if let Some(host) = lookup("GITINTEL_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("GITINTEL_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid GITINTEL_PORT: {}", port))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let transcription = &self.transcription;
        match transcription.provider.as_deref() {
            Some(ASSEMBLY_AI_PROVIDER) => {
                if transcription.api_key.as_deref().map_or(true, str::is_empty) {
                    bail!("API key required for AssemblyAI (set transcription.api_key or ASSEMBLYAI_API_KEY)");
                }
            }
            Some(other) => bail!(
                "Unknown transcription provider '{}'. Supported providers: {}",
                other,
                ASSEMBLY_AI_PROVIDER
            ),
            None => bail!("No transcription provider configured"),
        }

        if transcription.max_attempts == 0 {
            bail!("transcription.max_attempts must be at least 1");
        }
        if transcription.timeout_seconds == 0 {
            bail!("transcription.timeout_seconds must be greater than 0");
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            bail!(
                "auth.session_ttl_hours must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            );
        }

        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => default_database_path(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> Result<PathBuf> {
        default_config_path()
    }
}
