//! Configuration for the clipboard service.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ECOPASTE_HOME, ECOPASTE_DB, ECOPASTE_BIND, ECOPASTE_WEBHOOK_URL)
//! 2. Config file (.ecopaste/config.yaml)
//! 3. Defaults (~/.ecopaste, <home>/clipboard.db, 0.0.0.0:3000)
//!
//! Config file discovery:
//! - Searches current directory and parents for .ecopaste/config.yaml
//! - Paths in config file are relative to the .ecopaste/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::webhook::RetryPolicy;
use crate::core::Deadlines;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub timeouts: Option<TimeoutsConfig>,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .ecopaste/)
    pub home: Option<String>,
    /// SQLite database file (relative to .ecopaste/)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    pub insert_seconds: Option<u64>,
    pub query_seconds: Option<u64>,
    pub delete_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// HTTP listen address
    pub bind: String,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Store deadlines
    pub timeouts: TimeoutSettings,
    /// Outbound webhook settings
    pub webhook: WebhookSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutSettings {
    pub insert_seconds: u64,
    pub query_seconds: u64,
    pub delete_seconds: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            insert_seconds: 5,
            query_seconds: 10,
            delete_seconds: 5,
        }
    }
}

impl TimeoutSettings {
    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            insert: Duration::from_secs(self.insert_seconds),
            query: Duration::from_secs(self.query_seconds),
            delete: Duration::from_secs(self.delete_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl WebhookSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".ecopaste").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge defaults, an optional config file and environment lookups
fn resolve_config<E>(
    default_home: PathBuf,
    file: Option<(PathBuf, ConfigFile)>,
    env: E,
) -> ResolvedConfig
where
    E: Fn(&str) -> Option<String>,
{
    let (config_file, config) = match file {
        Some((path, config)) => (Some(path), Some(config)),
        None => (None, None),
    };

    // Relative paths in the file resolve against .ecopaste/
    let file_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let paths = config.as_ref().map(|c| c.paths.clone()).unwrap_or_default();

    let home = env("ECOPASTE_HOME")
        .map(PathBuf::from)
        .or_else(|| paths.home.as_deref().map(|p| resolve_path(&file_dir, p)))
        .unwrap_or(default_home);

    let database = env("ECOPASTE_DB")
        .map(PathBuf::from)
        .or_else(|| paths.database.as_deref().map(|p| resolve_path(&file_dir, p)))
        .unwrap_or_else(|| home.join("clipboard.db"));

    let bind = env("ECOPASTE_BIND")
        .or_else(|| {
            config
                .as_ref()
                .and_then(|c| c.server.as_ref())
                .and_then(|s| s.bind.clone())
        })
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let defaults = TimeoutSettings::default();
    let timeouts_file = config.as_ref().and_then(|c| c.timeouts.as_ref());
    let timeouts = TimeoutSettings {
        insert_seconds: timeouts_file
            .and_then(|t| t.insert_seconds)
            .unwrap_or(defaults.insert_seconds),
        query_seconds: timeouts_file
            .and_then(|t| t.query_seconds)
            .unwrap_or(defaults.query_seconds),
        delete_seconds: timeouts_file
            .and_then(|t| t.delete_seconds)
            .unwrap_or(defaults.delete_seconds),
    };

    let defaults = WebhookSettings::default();
    let webhook_file = config.as_ref().and_then(|c| c.webhook.as_ref());
    let webhook = WebhookSettings {
        url: env("ECOPASTE_WEBHOOK_URL").or_else(|| webhook_file.and_then(|w| w.url.clone())),
        max_retries: webhook_file
            .and_then(|w| w.max_retries)
            .unwrap_or(defaults.max_retries),
        retry_delay_ms: webhook_file
            .and_then(|w| w.retry_delay_ms)
            .unwrap_or(defaults.retry_delay_ms),
    };

    ResolvedConfig {
        home,
        database,
        bind,
        config_file,
        timeouts,
        webhook,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".ecopaste");

    let file = match find_config_file() {
        Some(path) => {
            let config = load_config_file(&path)?;
            Some((path, config))
        }
        None => None,
    };

    Ok(resolve_config(default_home, file, |key| {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve_config(PathBuf::from("/home/u/.ecopaste"), None, no_env);

        assert_eq!(config.home, PathBuf::from("/home/u/.ecopaste"));
        assert_eq!(config.database, PathBuf::from("/home/u/.ecopaste/clipboard.db"));
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert!(config.config_file.is_none());
        assert_eq!(config.timeouts, TimeoutSettings::default());
        assert_eq!(config.webhook, WebhookSettings::default());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".ecopaste");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  home: ./state
  database: ./state/history.db
server:
  bind: 127.0.0.1:8080
timeouts:
  query_seconds: 30
webhook:
  url: http://peer:3000/api/webhook
  max_retries: 5
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");

        let config = resolve_config(
            PathBuf::from("/unused"),
            Some((config_path.clone(), parsed)),
            no_env,
        );

        assert_eq!(config.home, dir.join("state"));
        assert_eq!(config.database, dir.join("state/history.db"));
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.config_file, Some(config_path));
        assert_eq!(config.timeouts.query_seconds, 30);
        assert_eq!(config.timeouts.insert_seconds, 5);
        assert_eq!(config.webhook.url.as_deref(), Some("http://peer:3000/api/webhook"));
        assert_eq!(config.webhook.max_retries, 5);
        assert_eq!(config.webhook.retry_delay_ms, 1000);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                home: Some("/from/file".to_string()),
                database: None,
            },
            server: Some(ServerConfig {
                bind: Some("127.0.0.1:1".to_string()),
            }),
            timeouts: None,
            webhook: None,
        };
        let env: HashMap<&str, &str> = [
            ("ECOPASTE_HOME", "/from/env"),
            ("ECOPASTE_BIND", "127.0.0.1:2"),
        ]
        .into_iter()
        .collect();

        let config = resolve_config(
            PathBuf::from("/unused"),
            Some((PathBuf::from("/proj/.ecopaste/config.yaml"), file)),
            |key| env.get(key).map(|v| v.to_string()),
        );

        assert_eq!(config.home, PathBuf::from("/from/env"));
        assert_eq!(config.database, PathBuf::from("/from/env/clipboard.db"));
        assert_eq!(config.bind, "127.0.0.1:2");
    }

    #[test]
    fn test_settings_conversions() {
        let deadlines = TimeoutSettings::default().deadlines();
        assert_eq!(deadlines, Deadlines::default());

        let policy = WebhookSettings::default().retry_policy();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project/.ecopaste");

        assert_eq!(
            resolve_path(&base, "./state"),
            PathBuf::from("/home/user/project/.ecopaste/./state")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
