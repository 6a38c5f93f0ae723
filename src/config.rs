use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub panel: PanelConfig,

    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Panel host name, without scheme or port.
    pub domain: String,

    pub port: u16,

    pub username: String,

    pub password: String,

    /// Per-request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for PanelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelConfig")
            .field("domain", &self.domain)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl PanelConfig {
    /// `https://{domain}:{port}`. A scheme or trailing slash typed into the
    /// domain is tolerated.
    pub fn base_url(&self) -> Result<Url> {
        let domain = self.domain.trim();
        let domain = domain.strip_prefix("https://").unwrap_or(domain);
        let domain = domain.trim_end_matches('/');

        if domain.is_empty() {
            anyhow::bail!("Panel domain is not configured");
        }

        Url::parse(&format!("https://{domain}:{}", self.port))
            .with_context(|| format!("Invalid panel domain: {domain}"))
    }

    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// IANA zone in which "last online" ages are measured.
    pub reference_timezone: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            reference_timezone: "Asia/Tehran".to_string(),
        }
    }
}

impl FilterConfig {
    pub fn zone(&self) -> Result<Tz> {
        self.reference_timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid reference timezone '{}': {e}", self.reference_timezone))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        match Self::locate() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// First existing file among the search paths.
    #[must_use]
    pub fn locate() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|path| path.exists())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("marzban-manager").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".marzban-manager").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Applies `MARZBAN_*` overrides. `lookup` is normally `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domain) = lookup("MARZBAN_DOMAIN") {
            self.panel.domain = domain;
        }
        if let Some(port) = lookup("MARZBAN_PORT") {
            self.panel.port = port
                .parse()
                .with_context(|| format!("MARZBAN_PORT is not a valid port: {port}"))?;
        }
        if let Some(username) = lookup("MARZBAN_USERNAME") {
            self.panel.username = username;
        }
        if let Some(password) = lookup("MARZBAN_PASSWORD") {
            self.panel.password = password;
        }
        if let Some(zone) = lookup("MARZBAN_TIMEZONE") {
            self.filters.reference_timezone = zone;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.panel.port == 0 {
            anyhow::bail!("Panel port must be between 1 and 65535");
        }

        if self.panel.request_timeout_seconds == 0 {
            anyhow::bail!("Request timeout must be > 0 seconds");
        }

        self.filters.zone()?;
        Ok(())
    }
}
