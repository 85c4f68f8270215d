use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_SMTP_PORT: u16 = 587;

pub const ENV_SMTP_HOST: &str = "SURVEY_SMTP_HOST";
pub const ENV_SMTP_USERNAME: &str = "SURVEY_SMTP_USERNAME";
pub const ENV_SMTP_PASSWORD: &str = "SURVEY_SMTP_PASSWORD";
pub const ENV_FROM_ADDRESS: &str = "SURVEY_FROM_ADDRESS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub from_address: String,
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: String::from("surveys@localhost"),
        }
    }
}

impl NotificationSettings {
    /// Whether mail should go out over SMTP rather than to the outbox.
    pub fn uses_smtp(&self) -> bool {
        self.enabled && !self.smtp_host.trim().is_empty()
    }
}

/// Repository configuration stored in `.survey/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            created_at: Utc::now(),
            notifications: NotificationSettings::default(),
        }
    }
}

impl Config {
    /// Read the config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let mut config: Config = match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(StoreError::Io(e)),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Write the config atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Overlay non-empty values from `lookup`. Setting an SMTP host this way
    /// also enables notifications.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let n = &mut self.notifications;
        if let Some(host) = get(ENV_SMTP_HOST) {
            n.smtp_host = host;
            n.enabled = true;
        }
        if let Some(username) = get(ENV_SMTP_USERNAME) {
            n.smtp_username = username;
        }
        if let Some(password) = get(ENV_SMTP_PASSWORD) {
            n.smtp_password = password;
        }
        if let Some(from) = get(ENV_FROM_ADDRESS) {
            n.from_address = from;
        }
    }
}
