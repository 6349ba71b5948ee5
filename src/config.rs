//! Service configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SECRET, ANTHROPIC_API_KEY, GITHUB_TOKEN,
//!    GITHUB_USERNAME, PORT)
//! 2. Config file (pagewright.yaml, path overridable via PAGEWRIGHT_CONFIG)
//! 3. Defaults
//!
//! Credentials come from the environment only, never from the file. The
//! resolved [`Config`] is built once at startup and passed by reference into
//! every component constructor; nothing reads the environment after load.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub hosting: HostingSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelSection {
    #[serde(default = "default_model")]
    pub name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_anthropic_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostingSection {
    /// Hosting account username; the GITHUB_USERNAME env var wins over this
    pub username: Option<String>,
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: default_model(),
            max_tokens: default_max_tokens(),
            api_base: default_anthropic_api_base(),
        }
    }
}

impl Default for HostingSection {
    fn default() -> Self {
        Self {
            username: None,
            api_base: default_github_api_base(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_anthropic_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP front end listens on
    pub port: u16,
    /// Shared secret inbound requests must present
    pub secret: Option<String>,
    /// Model provider credential
    pub anthropic_api_key: Option<String>,
    /// Hosting provider credential
    pub github_token: Option<String>,
    /// Hosting account username (owns created repositories)
    pub github_username: Option<String>,
    /// Model name sent with every generation call
    pub model: String,
    /// Output budget per generation call
    pub max_tokens: u32,
    /// Model provider API base URL
    pub anthropic_api_base: String,
    /// Hosting provider API base URL
    pub github_api_base: String,
    /// Config file the values came from (if one was found)
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(ConfigFile::default(), EnvOverrides::default(), None)
    }
}

/// Environment variables consulted at load time
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub secret: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub github_token: Option<String>,
    pub github_username: Option<String>,
    pub port: Option<u16>,
}

impl EnvOverrides {
    /// Snapshot the relevant process environment variables
    pub fn from_process() -> Self {
        Self {
            secret: std::env::var("SECRET").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            github_username: std::env::var("GITHUB_USERNAME").ok(),
            port: std::env::var("PORT").ok().and_then(|p| p.parse().ok()),
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present) and environment
    pub fn load() -> Result<Self> {
        let config_path = find_config_file();

        let file = match config_path {
            Some(ref path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        Ok(Self::resolve(file, EnvOverrides::from_process(), config_path))
    }

    /// Merge file values with environment overrides
    fn resolve(file: ConfigFile, env: EnvOverrides, config_file: Option<PathBuf>) -> Self {
        Self {
            port: env.port.unwrap_or(file.server.port),
            secret: env.secret,
            anthropic_api_key: env.anthropic_api_key,
            github_token: env.github_token,
            github_username: env.github_username.or(file.hosting.username),
            model: file.model.name,
            max_tokens: file.model.max_tokens,
            anthropic_api_base: file.model.api_base,
            github_api_base: file.hosting.api_base,
            config_file,
        }
    }

    /// Warn about missing credentials; absence never prevents startup
    pub fn warn_missing_credentials(&self) {
        if self.secret.is_none() {
            warn!("SECRET not set; inbound requests cannot be authenticated");
        }
        if self.anthropic_api_key.is_none() {
            warn!("ANTHROPIC_API_KEY not set; generation will fall back to templates");
        }
        if self.github_token.is_none() {
            warn!("GITHUB_TOKEN not set; publishing will fail");
        }
        if self.github_username.is_none() {
            warn!("GITHUB_USERNAME not set; repository URLs will be incomplete");
        }
    }
}

/// Find the config file: explicit path via PAGEWRIGHT_CONFIG, else
/// pagewright.yaml in the current directory
fn find_config_file() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("PAGEWRIGHT_CONFIG") {
        return Some(PathBuf::from(explicit));
    }

    let local = PathBuf::from("pagewright.yaml");
    if local.exists() {
        return Some(local);
    }

    None
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = Config::default();

        assert_eq!(config.port, 8000);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.anthropic_api_base, "https://api.anthropic.com");
        assert_eq!(config.github_api_base, "https://api.github.com");
        assert!(config.secret.is_none());
        assert!(config.github_username.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("pagewright.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9100
model:
  name: claude-sonnet-4-20250514
  max_tokens: 2048
hosting:
  username: octocat
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();

        assert_eq!(parsed.server.port, 9100);
        assert_eq!(parsed.model.max_tokens, 2048);
        assert_eq!(parsed.hosting.username, Some("octocat".to_string()));
        // Unspecified fields keep their defaults
        assert_eq!(parsed.model.api_base, "https://api.anthropic.com");
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = ConfigFile {
            server: ServerSection { port: 9100 },
            hosting: HostingSection {
                username: Some("from-file".to_string()),
                api_base: default_github_api_base(),
            },
            ..ConfigFile::default()
        };
        let env = EnvOverrides {
            port: Some(9200),
            github_username: Some("from-env".to_string()),
            secret: Some("s3cret".to_string()),
            ..EnvOverrides::default()
        };

        let config = Config::resolve(file, env, None);

        assert_eq!(config.port, 9200);
        assert_eq!(config.github_username, Some("from-env".to_string()));
        assert_eq!(config.secret, Some("s3cret".to_string()));
    }

    #[test]
    fn test_file_username_used_when_env_absent() {
        let file = ConfigFile {
            hosting: HostingSection {
                username: Some("from-file".to_string()),
                api_base: default_github_api_base(),
            },
            ..ConfigFile::default()
        };

        let config = Config::resolve(file, EnvOverrides::default(), None);

        assert_eq!(config.github_username, Some("from-file".to_string()));
    }
}
