use crate::error::{FetcherError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default TMDb REST endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default prefix for profile image paths
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Value shipped in sample configs; treated as a missing key
pub const PLACEHOLDER_API_KEY: &str = "YOUR_TMDB_API_KEY";

/// Environment variable prefix, e.g. `PEOPLE_FETCHER_TMDB__API_KEY`
pub const ENV_PREFIX: &str = "PEOPLE_FETCHER";

/// Configuration for the people fetcher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// TMDb API configuration
    pub tmdb: TmdbConfig,

    /// Destination database configuration
    pub database: DatabaseConfig,

    /// Pipeline behaviour
    pub pipeline: PipelineConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    /// Base URL of the REST API
    pub api_base_url: String,

    /// Prefix joined with `profile_path` to build photo URLs
    pub image_base_url: String,

    /// API key, sent as the `api_key` query parameter
    pub api_key: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database server host name
    pub host: Option<String>,

    /// Database server port
    pub port: u16,

    /// Database name
    pub name: String,

    /// Login role
    pub user: String,

    /// Password for `user`
    pub password: Option<String>,

    /// Seconds to keep retrying the initial connection before giving up
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Listing page to load. Only the first page is ever fetched.
    pub page: u32,

    /// When inserted rows are committed
    pub commit_mode: CommitMode,
}

/// Commit policy for inserted rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One transaction for the whole run; a storage error discards every insert
    #[default]
    AtEnd,

    /// Commit after each insert so earlier rows survive a later failure
    PerItem,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 5432,
            name: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { page: 1, commit_mode: CommitMode::AtEnd }
    }
}

// Secrets never reach the logs.
impl fmt::Debug for TmdbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbConfig")
            .field("api_base_url", &self.api_base_url)
            .field("image_base_url", &self.image_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl FetcherConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Precedence, lowest first: built-in defaults, `config_file` (skipped when
    /// it does not exist), `PEOPLE_FETCHER_*` environment variables. Nothing is
    /// validated here; see [`FetcherConfig::validate`].
    pub fn load(config_file: &Path) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(config_file).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"),
            )
            .build()
            .map_err(|e| FetcherError::config(format!("failed to read configuration: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| FetcherError::config(format!("invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Check that every required value is present and usable
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        if non_blank(self.database.host.as_deref()).is_none() {
            return Err(FetcherError::config("database host is not set"));
        }
        if non_blank(self.database.password.as_deref()).is_none() {
            return Err(FetcherError::config("database password is not set"));
        }
        if self.database.port == 0 {
            return Err(FetcherError::config("database port must be non-zero"));
        }
        if self.pipeline.page != 1 {
            return Err(FetcherError::config(format!(
                "only page 1 of the popular listing is supported, got {}",
                self.pipeline.page
            )));
        }

        Ok(())
    }

    /// The TMDb API key, rejecting blanks and the sample placeholder
    pub fn api_key(&self) -> Result<&str> {
        match non_blank(self.tmdb.api_key.as_deref()) {
            Some(PLACEHOLDER_API_KEY) => Err(FetcherError::config(format!(
                "replace '{PLACEHOLDER_API_KEY}' with your actual TMDb API key"
            ))),
            Some(key) => Ok(key),
            None => Err(FetcherError::config(format!(
                "TMDb API key not found; set {ENV_PREFIX}_TMDB__API_KEY or tmdb.api_key"
            ))),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
