//! Configuration for a feed generation run.
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! (`~/.config/oreilly-feed/config.toml` unless `--config` says otherwise),
//! and per-run overrides from the command line and environment. The layers
//! are merged once by [`Config::resolve`] into an immutable [`QueryConfig`]
//! that the pipeline only ever reads.
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::Channel;
use crate::util::{validate_api_base, UrlValidationError};

/// Environment variable holding the API token. Takes precedence over the
/// config file's `api_token`.
pub const TOKEN_ENV_VAR: &str = "OREILLY_API_TOKEN";

/// Origin of the O'Reilly Online Learning site. Used both as the API host
/// and as the base that relative result URLs are resolved against.
pub const DEFAULT_ORIGIN: &str = "https://learning.oreilly.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("No API token: set OREILLY_API_TOKEN or `api_token` in the config file")]
    MissingToken,

    #[error("Search query must not be empty")]
    EmptyQuery,

    #[error("Result limit must be a positive integer")]
    InvalidLimit,

    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(#[from] UrlValidationError),

    #[error("Invalid link origin '{0}': expected an absolute http(s) URL")]
    InvalidOrigin(String),
}

// ============================================================================
// File Configuration
// ============================================================================

/// Channel-level metadata written into the feed header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: "O'Reilly - Recent Software Development Courses".to_string(),
            link: "https://learning.oreilly.com/".to_string(),
            description: "Latest software development courses from O'Reilly Online Learning."
                .to_string(),
        }
    }
}

impl From<ChannelConfig> for Channel {
    fn from(c: ChannelConfig) -> Self {
        Channel {
            title: c.title,
            link: c.link,
            description: c.description,
        }
    }
}

/// Settings as read from the config file.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `api_token` to prevent secret leakage
/// in logs, error messages, and debug output.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search term sent as the `query` parameter.
    pub query: String,

    /// Maximum number of results requested. Must be positive.
    pub limit: u32,

    /// Output file. `-` writes the feed to stdout.
    pub output: String,

    /// Value of the `type` filter parameter.
    pub content_type: String,

    /// Base URL of the search API. HTTPS unless pointing at localhost.
    pub api_base_url: String,

    /// Origin prefixed to result URLs that are not already absolute.
    pub link_origin: String,

    /// Timeout for the search request, in seconds.
    pub timeout_secs: u64,

    /// API token (alternative to the OREILLY_API_TOKEN env var).
    pub api_token: Option<String>,

    pub channel: ChannelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query: "software development".to_string(),
            limit: 10,
            output: "v2_oreilly_feed.xml".to_string(),
            content_type: "video".to_string(),
            api_base_url: DEFAULT_ORIGIN.to_string(),
            link_origin: DEFAULT_ORIGIN.to_string(),
            timeout_secs: 30,
            api_token: None,
            channel: ChannelConfig::default(),
        }
    }
}

/// Mask api_token in Debug output to prevent secret leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("query", &self.query)
            .field("limit", &self.limit)
            .field("output", &self.output)
            .field("content_type", &self.content_type)
            .field("api_base_url", &self.api_base_url)
            .field("link_origin", &self.link_origin)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("channel", &self.channel)
            .finish()
    }
}

/// Per-run values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub query: Option<String>,
    pub limit: Option<u32>,
    pub output: Option<String>,
    pub content_type: Option<String>,
    /// Token taken from the environment.
    pub api_token: Option<String>,
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "query",
        "limit",
        "output",
        "content_type",
        "api_base_url",
        "link_origin",
        "timeout_secs",
        "api_token",
        "channel",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), query = %config.query, "Loaded configuration");
        Ok(config)
    }

    /// Merge overrides into the file settings and validate the result.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingToken`] when neither layer supplies a non-blank token
    /// - [`ConfigError::EmptyQuery`] for a blank search term
    /// - [`ConfigError::InvalidLimit`] for a zero limit
    /// - [`ConfigError::InvalidBaseUrl`] / [`ConfigError::InvalidOrigin`] for bad URLs
    pub fn resolve(self, overrides: Overrides) -> Result<QueryConfig, ConfigError> {
        // A blank value in one layer must not shadow a usable one below it
        let non_blank = |t: &String| !t.trim().is_empty();
        let token = overrides
            .api_token
            .filter(non_blank)
            .or(self.api_token.filter(non_blank))
            .ok_or(ConfigError::MissingToken)?;

        let query = overrides.query.unwrap_or(self.query);
        if query.trim().is_empty() {
            return Err(ConfigError::EmptyQuery);
        }

        let limit = NonZeroU32::new(overrides.limit.unwrap_or(self.limit))
            .ok_or(ConfigError::InvalidLimit)?;

        let api_base = validate_api_base(&self.api_base_url)?;
        let link_origin = resolve_origin(&self.link_origin)?;

        Ok(QueryConfig {
            query,
            limit,
            token: SecretString::from(token),
            output: OutputTarget::from(overrides.output.unwrap_or(self.output).as_str()),
            content_type: overrides.content_type.unwrap_or(self.content_type),
            api_base,
            link_origin,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            channel: self.channel.into(),
        })
    }
}

/// Validates the link origin and strips trailing slashes so that joining
/// with a root-relative path never produces `//`.
fn resolve_origin(origin: &str) -> Result<String, ConfigError> {
    match Url::parse(origin) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(origin.trim_end_matches('/').to_string())
        }
        _ => Err(ConfigError::InvalidOrigin(origin.to_string())),
    }
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Where the generated feed is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl From<&str> for OutputTarget {
    fn from(s: &str) -> Self {
        if s == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(s))
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => f.write_str("<stdout>"),
        }
    }
}

/// Immutable settings for one run, produced by [`Config::resolve`].
///
/// `token` is a [`SecretString`], so the derived Debug output never shows it.
#[derive(Debug)]
pub struct QueryConfig {
    pub query: String,
    pub limit: NonZeroU32,
    pub token: SecretString,
    pub output: OutputTarget,
    pub content_type: String,
    pub api_base: Url,
    /// Origin without a trailing slash.
    pub link_origin: String,
    pub timeout: Duration,
    pub channel: Channel,
}

// ============================================================================
// Tests
// ============================================================================
