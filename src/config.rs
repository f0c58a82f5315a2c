use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    playlist_id: Option<String>,
    #[serde(default)]
    records_file: Option<String>,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub batch: BatchSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Results requested per search call.
    pub search_limit: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".to_string(),
            access_token: None,
            request_timeout_secs: 10,
            search_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub similarity_threshold: f64,
    pub max_logged_candidates: usize,
    pub include_album_in_query: bool,
    pub search_timeout_secs: u64,
    pub max_concurrent_searches: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            max_logged_candidates: 3,
            include_album_in_query: true,
            search_timeout_secs: 15,
            max_concurrent_searches: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub max_records: usize,
    pub track_link_prefix: String,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            max_records: 25,
            track_link_prefix: "https://open.spotify.com/track/".to_string(),
        }
    }
}

/// Immutable settings handed to the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSettings {
    pub similarity_threshold: f64,
    pub max_logged_candidates: usize,
    pub include_album_in_query: bool,
    pub search_timeout: Duration,
    pub max_concurrent_searches: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverConfig::default().into()
    }
}

impl From<ResolverConfig> for ResolverSettings {
    fn from(config: ResolverConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            max_logged_candidates: config.max_logged_candidates,
            include_album_in_query: config.include_album_in_query,
            search_timeout: Duration::from_secs(config.search_timeout_secs),
            max_concurrent_searches: config.max_concurrent_searches.max(1),
        }
    }
}

/// Immutable settings for one playlist build, passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub playlist_id: Option<String>,
    pub max_records: usize,
    pub track_link_prefix: String,
    pub resolver: ResolverSettings,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let batch = BatchSection::default();
        Self {
            playlist_id: None,
            max_records: batch.max_records,
            track_link_prefix: batch.track_link_prefix,
            resolver: ResolverSettings::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default location of the config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("highlights-playlist").join("config.toml"))
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write a default config file, unless one already exists.
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or(eyre!("No config directory available"))?;
        if path.exists() {
            log::info!("Config already exists at {}", path.display());
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(&Self::default())?;
        std::fs::write(&path, contents)
            .wrap_err(format!("Failed to write config file: {}", path.display()))?;
        Ok(path)
    }

    fn validate(&self) -> Result<()> {
        let threshold = self.resolver.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(eyre!(
                "resolver.similarity_threshold must be between 0 and 1, got {}",
                threshold
            ));
        }
        if self.batch.max_records == 0 {
            return Err(eyre!("batch.max_records must be at least 1"));
        }
        Ok(())
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn records_file_path(&self) -> Option<PathBuf> {
        self.records_file.as_deref().map(|path| self.expand_path(path))
    }

    /// Playlist id from the config, or the PLAYLIST_ID environment variable.
    pub fn playlist_id(&self) -> Option<String> {
        self.playlist_id
            .clone()
            .or_else(|| std::env::var("PLAYLIST_ID").ok())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn spotify_access_token(&self) -> Option<String> {
        self.spotify
            .access_token
            .clone()
            .or_else(|| std::env::var("SPOTIFY_ACCESS_TOKEN").ok())
            .filter(|token| !token.trim().is_empty())
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            playlist_id: self.playlist_id(),
            max_records: self.batch.max_records,
            track_link_prefix: self.batch.track_link_prefix.clone(),
            resolver: self.resolver.clone().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
playlist_id = "abc123"

[resolver]
similarity_threshold = 0.75
search_timeout_secs = 5
"#,
        )
        .unwrap();

        let batch = config.batch_config();
        assert_eq!(batch.playlist_id.as_deref(), Some("abc123"));
        assert_eq!(batch.max_records, 25);
        assert_eq!(batch.resolver.similarity_threshold, 0.75);
        assert_eq!(batch.resolver.search_timeout, Duration::from_secs(5));
        assert_eq!(batch.resolver.max_logged_candidates, 3);
        assert!(batch.resolver.include_album_in_query);
        assert_eq!(config.spotify.api_base_url, "https://api.spotify.com/v1");
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = Config::from_toml(
            r#"
[resolver]
similarity_threshold = 1.5
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let config = Config::from_toml(
            r#"
[resolver]
max_concurrent_searches = 0
"#,
        )
        .unwrap();
        assert_eq!(config.batch_config().resolver.max_concurrent_searches, 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "records_file = \"/tmp/records.json\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.records_file_path(),
            Some(PathBuf::from("/tmp/records.json"))
        );
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let contents = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml(&contents).unwrap();
        assert_eq!(parsed.batch_config(), Config::default().batch_config());
    }
}
