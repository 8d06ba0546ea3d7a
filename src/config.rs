//! Configuration management for sporbpm.
//!
//! Values come from environment variables, optionally seeded from a `.env` file in
//! the local data directory. They are read once at startup into a [`Config`] which
//! is then passed explicitly to whatever needs it.
//!
//! The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Built-in defaults for everything except the client id

use std::{env, path::PathBuf, time::Duration};

use crate::{
    error::{Result, SessionError},
    utils,
};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-library-read",
    "user-modify-playback-state",
    "user-read-playback-state",
    "user-read-private",
    "playlist-modify-public",
];

/// Loads environment variables from `<data_local_dir>/sporbpm/.env`.
///
/// Creates the directory if needed. A missing `.env` file is fine: the process
/// environment may already carry everything.
///
/// - Linux: `~/.local/share/sporbpm/.env`
/// - macOS: `~/Library/Application Support/sporbpm/.env`
/// - Windows: `%LOCALAPPDATA%/sporbpm/.env`
pub async fn load_env() -> std::result::Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("{}: {}", path.display(), e)),
    }
}

/// Base directory for everything sporbpm keeps on disk.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporbpm");
    path
}

/// Static configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    /// Requested permission scopes, normalised (sorted, de-duplicated).
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub server_addr: String,
    /// Append `prompt=none` to the authorization request.
    pub prompt_none: bool,
    pub consent_timeout: Duration,
    pub retry: RetrySettings,
    /// `limit` used when draining paged collections.
    pub page_size: u32,
    /// Service ceiling for `GET /audio-features?ids=`.
    pub tempo_batch_size: usize,
    /// Service ceiling for `POST /playlists/{id}/tracks`.
    pub playlist_batch_size: usize,
    /// Upper bound on API requests one listing or resolution keeps in flight.
    pub max_concurrent_requests: usize,
}

/// Exponential backoff parameters for API calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub factor: f32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            factor: 2.0,
        }
    }
}

impl Config {
    /// Builds a configuration with defaults for everything but the client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: utils::normalize_scopes(DEFAULT_SCOPES.iter().copied()),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            prompt_none: false,
            consent_timeout: Duration::from_secs(120),
            retry: RetrySettings::default(),
            page_size: 50,
            tempo_batch_size: 100,
            playlist_batch_size: 100,
            max_concurrent_requests: 4,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// Only `SPOTIFY_API_AUTH_CLIENT_ID` is mandatory.
    pub fn from_env() -> Result<Self> {
        let client_id = required("SPOTIFY_API_AUTH_CLIENT_ID")?;
        let mut config = Self::new(client_id);

        if let Some(v) = optional("SPOTIFY_API_REDIRECT_URI") {
            config.redirect_uri = v;
        }
        if let Some(v) = optional("SPOTIFY_API_AUTH_SCOPE") {
            config.scopes = utils::normalize_scopes(v.split([' ', ',']));
        }
        if let Some(v) = optional("SPOTIFY_API_AUTH_URL") {
            config.auth_url = v;
        }
        if let Some(v) = optional("SPOTIFY_API_TOKEN_URL") {
            config.token_url = v;
        }
        if let Some(v) = optional("SPOTIFY_API_URL") {
            config.api_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = optional("SERVER_ADDRESS") {
            config.server_addr = v;
        }
        if let Some(v) = optional("SPOTIFY_API_AUTH_PROMPT_NONE") {
            config.prompt_none = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = optional("SPOTIFY_CONSENT_TIMEOUT_SECS") {
            let secs = v.parse::<u64>().map_err(|_| {
                SessionError::Config(format!("SPOTIFY_CONSENT_TIMEOUT_SECS is not a number: {v}"))
            })?;
            config.consent_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = optional("SPOTIFY_MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests = v.parse::<usize>().map_err(|_| {
                SessionError::Config(format!(
                    "SPOTIFY_MAX_CONCURRENT_REQUESTS is not a number: {v}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_scopes<'a>(mut self, scopes: impl IntoIterator<Item = &'a str>) -> Self {
        self.scopes = utils::normalize_scopes(scopes);
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Rejects configurations the authorization server would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(SessionError::Config("client id is empty".into()));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(SessionError::Config("redirect uri is empty".into()));
        }
        if self.scopes.is_empty() {
            return Err(SessionError::Config("no scopes requested".into()));
        }
        if self.page_size == 0 || self.tempo_batch_size == 0 || self.playlist_batch_size == 0 {
            return Err(SessionError::Config("batch sizes must be positive".into()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(SessionError::Config(
                "max_concurrent_requests must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(SessionError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| SessionError::Config(format!("{key} must be set")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
