/**
 * config.rs
 * Parser for ontoview.yaml workspace configuration
 *
 * Format:
 * ```yaml
 * dataDir: /home/user/.ontoview
 * inMemory: false
 * suggestionCapacity: 64
 * github:
 *   apiUrl: https://api.github.com
 *   userAgent: ontoview/0.4.2
 *   token: ghp_...
 * oauth:
 *   proxyUrl: https://ontoview.example.org
 * ```
 *
 * Every field is optional. Environment overrides are applied after the file:
 * ONTOVIEW_DATA_DIR, GITHUB_TOKEN, ONTOVIEW_OAUTH_PROXY.
 */

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::drivers::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use crate::errors::{OntoError, Result};
use crate::suggest::DEFAULT_CAPACITY;

pub const CONFIG_FILE: &str = "ontoview.yaml";
pub const SETTINGS_FILE: &str = "settings.json";
pub const STORE_DIR: &str = "store";

pub const ENV_DATA_DIR: &str = "ONTOVIEW_DATA_DIR";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_OAUTH_PROXY: &str = "ONTOVIEW_OAUTH_PROXY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

/// ontoview.yaml structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Root for the persistent quad store and the settings file
    pub data_dir: PathBuf,
    /// Keep the quad store in memory only
    pub in_memory: bool,
    /// Number of memoized autocomplete queries
    pub suggestion_capacity: usize,
    pub github: GitHubConfig,
    pub oauth: OAuthConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ontoview"),
            in_memory: false,
            suggestion_capacity: DEFAULT_CAPACITY,
            github: GitHubConfig::default(),
            oauth: OAuthConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Load ontoview.yaml from the specified path
    ///
    /// # Arguments
    /// * `path` - Path to the YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OntoError::Config(format!("config file not found: {}", path.display())));
        }

        let content = fs::read_to_string(path)?;
        let config: WorkspaceConfig = serde_yaml::from_str(&content)
            .map_err(|e| OntoError::Config(format!("invalid {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file when given, defaults otherwise, then apply environment overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (`std::env::var` in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(token) = lookup(ENV_GITHUB_TOKEN).filter(|v| !v.is_empty()) {
            self.github.token = Some(token);
        }
        if let Some(proxy) = lookup(ENV_OAUTH_PROXY).filter(|v| !v.is_empty()) {
            self.oauth.proxy_url = Some(proxy);
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.user_agent.trim().is_empty() {
            return Err(OntoError::Config("github.userAgent cannot be empty".to_string()));
        }
        if self.github.api_url.trim().is_empty() {
            return Err(OntoError::Config("github.apiUrl cannot be empty".to_string()));
        }
        if self.suggestion_capacity == 0 {
            return Err(OntoError::Config("suggestionCapacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR)
    }
}
