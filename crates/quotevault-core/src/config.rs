use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Loaded from a TOML file under the platform config dir, with an env
/// override for the FavQs key so it never has to live on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub favqs: FavQsConfig,
    #[serde(default)]
    pub zenquotes: ZenQuotesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults
    /// when no file exists yet
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?
        } else {
            // No config file? Use defaults
            Self::default()
        };

        if let Ok(key) = std::env::var("FAVQS_API_KEY") {
            if !key.is_empty() {
                config.favqs.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("quotevault");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the SQLite database lives
    pub fn database_path(&self) -> crate::Result<PathBuf> {
        if let Some(ref path) = self.database.path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("quotevault");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir.join("quotes.db"))
    }
}

/// Which upstream API to pull quotes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    FavQs,
    ZenQuotes,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FavQsConfig {
    /// FavQs API key
    /// Get one at https://favqs.com/api
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZenQuotesConfig {
    // ZenQuotes needs no credentials; the section exists so a base-url
    // override has somewhere to live if self-hosting ever happens
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Shared pool TTL in seconds
    #[serde(default = "default_pool_ttl")]
    pub pool_ttl_secs: u64,

    /// Per-user favorite caches TTL in seconds (kept short so stale
    /// favorite flags self-heal even if an invalidation is missed)
    #[serde(default = "default_favorite_ttl")]
    pub favorite_ttl_secs: u64,
}

fn default_pool_ttl() -> u64 {
    3600 // An hour matches how often the quote pool is worth refreshing
}

fn default_favorite_ttl() -> u64 {
    300 // Five minutes, the ceiling for favorite-status staleness
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pool_ttl_secs: default_pool_ttl(),
            favorite_ttl_secs: default_favorite_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// SQLite file path; defaults to the platform data dir
    pub path: Option<PathBuf>,
}
