//! Application configuration backed by the `config` crate.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file at
//! `~/.config/racedesk/config.toml`, then `RACEDESK_*` environment variables.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory below the user config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "racedesk";

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "RACEDESK";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_NOTIFICATION_SECS: u64 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# RaceDesk configuration.
# Every key may also be set through the environment, e.g. RACEDESK_API_BASE_URL.

# Root of the racing-event REST API.
api_base_url = "http://localhost:8080/api"

# Rows per page in every list.
page_size = 10

# Seconds a success/error notification stays visible.
notification_secs = 3

# Per-request timeout in seconds.
request_timeout_secs = 30

# Jump back to page 1 whenever the search text changes.
reset_page_on_search = false
"#;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root URL of the REST API.
    pub api_base_url: String,
    /// Rows per page.
    pub page_size: usize,
    /// Lifetime of a notification, in seconds.
    pub notification_secs: u64,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Whether editing the search resets pagination to the first page.
    pub reset_page_on_search: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            notification_secs: DEFAULT_NOTIFICATION_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reset_page_on_search: false,
        }
    }
}

impl AppConfig {
    /// Load from the default config file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (optional on disk) and the process environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load from `path` and `env`, a stand-in for the process environment
    /// when given. Keys keep their `RACEDESK_` prefix.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(env.map(|vars| vars.into_iter().collect()));
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        config.validate()?;
        info!(api = %config.api_base_url, page_size = config.page_size, "configuration loaded");
        Ok(config)
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            bail!("api_base_url must not be empty");
        }
        let url = Url::parse(base).with_context(|| format!("invalid api_base_url {base}"))?;
        if url.cannot_be_a_base() {
            bail!("api_base_url {base} cannot carry resource paths");
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        Ok(())
    }

    /// How long notifications stay visible.
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Default location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Write the commented default file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn isolated() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_with_env(dir.path().join("absent.toml"), isolated())?;
        assert_eq!(config.page_size, 10);
        assert_eq!(config.notification_ttl(), Duration::from_secs(3));
        assert!(!config.reset_page_on_search);
        Ok(())
    }

    #[test]
    fn default_template_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("racedesk").join("config.toml");
        write_default_config(&path)?;
        assert!(path.exists());
        assert_eq!(AppConfig::load_with_env(&path, isolated())?, AppConfig::default());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"https://races.example.com/v1\"\npage_size = 25\nreset_page_on_search = true\n",
        )?;
        let config = AppConfig::load_with_env(&path, isolated())?;
        assert_eq!(config.api_base_url, "https://races.example.com/v1");
        assert_eq!(config.page_size, 25);
        assert!(config.reset_page_on_search);
        assert_eq!(config.notification_secs, 3);
        Ok(())
    }

    #[test]
    fn zero_page_size_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 0\n")?;
        assert!(AppConfig::load_with_env(&path, isolated()).is_err());
        Ok(())
    }

    #[test]
    fn environment_overrides_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "page_size = 25\n")?;
        let env = HashMap::from([
            ("RACEDESK_PAGE_SIZE".to_string(), "7".to_string()),
            ("OTHER_PAGE_SIZE".to_string(), "99".to_string()),
        ]);

        let config = AppConfig::load_with_env(&path, Some(env))?;
        assert_eq!(config.page_size, 7);
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        Ok(())
    }

    #[test]
    fn validate_rejects_blank_url() {
        let config = AppConfig {
            api_base_url: "  ".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
