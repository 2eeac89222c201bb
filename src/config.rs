//! Configuration management for playlist-fill.
//!
//! This module loads configuration values from environment variables and
//! `.env` files. Values are resolved in this order:
//! 1. Command-line overrides (`--tracks-file`, `--playlist-id`)
//! 2. Environment variables
//! 3. `.env` in the working directory
//! 4. `.env` in the local data directory (`playlist-fill/.env`)
//! 5. Application defaults (optional values only)
//!
//! All required values are checked up front so a misconfigured run fails
//! before any network call.

use std::{env, fmt, path::PathBuf};

use reqwest::Url;

pub const APP_DIR: &str = "playlist-fill";

pub const ENV_CLIENT_ID: &str = "SPOTIPY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIPY_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "SPOTIPY_REDIRECT_URI";
pub const ENV_USERNAME: &str = "SPOTIFY_USERNAME";
pub const ENV_PLAYLIST_ID: &str = "SPOTIFY_PLAYLIST_ID";
pub const ENV_TRACKS_FILE: &str = "TRACKS_FILE";
pub const ENV_SCOPE: &str = "SPOTIFY_API_AUTH_SCOPE";
pub const ENV_API_URL: &str = "SPOTIFY_API_URL";
pub const ENV_AUTH_URL: &str = "SPOTIFY_API_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "SPOTIFY_API_TOKEN_URL";
pub const ENV_SERVER_ADDRESS: &str = "SERVER_ADDRESS";
pub const ENV_TOKEN_CACHE: &str = "SPOTIFY_TOKEN_CACHE";

pub const DEFAULT_TRACKS_FILE: &str = "tracks.txt";
pub const DEFAULT_SCOPE: &str =
    "playlist-read-private playlist-read-collaborative playlist-modify-public playlist-modify-private";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

const REQUIRED: [&str; 5] = [
    ENV_CLIENT_ID,
    ENV_CLIENT_SECRET,
    ENV_REDIRECT_URI,
    ENV_USERNAME,
    ENV_PLAYLIST_ID,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(Vec<&'static str>),
    InvalidRedirectUri(String),
    InvalidPlaylistId(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(vars) => write!(
                f,
                "Missing configuration. Please set {} (environment or .env file).",
                vars.join(", ")
            ),
            ConfigError::InvalidRedirectUri(uri) => write!(
                f,
                "{} '{}' must be an absolute http(s) URL with a host",
                ENV_REDIRECT_URI, uri
            ),
            ConfigError::InvalidPlaylistId(id) => write!(
                f,
                "{} '{}' is not a playlist ID, URI or URL",
                ENV_PLAYLIST_ID, id
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Url,
    pub username: String,
    pub playlist_id: String,
    pub tracks_file: PathBuf,
    pub scope: String,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    /// Address the OAuth callback server binds to.
    pub server_addr: String,
    pub token_cache: PathBuf,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] listing every required variable that
    /// is unset, or a validation error for the redirect URI or playlist ID.
    ///
    /// # Example
    ///
    /// ```
    /// let vars: HashMap<&str, &str> = HashMap::from([...]);
    /// let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()))?;
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|&key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let required = |key: &str| get(key).unwrap_or_default().trim().to_string();

        let raw_redirect = required(ENV_REDIRECT_URI);
        let redirect_uri = parse_redirect_uri(&raw_redirect)?;

        let raw_playlist = required(ENV_PLAYLIST_ID);
        let playlist_id = normalize_playlist_id(&raw_playlist)
            .ok_or_else(|| ConfigError::InvalidPlaylistId(raw_playlist.clone()))?;

        let username = required(ENV_USERNAME);

        let server_addr = get(ENV_SERVER_ADDRESS).unwrap_or_else(|| callback_addr(&redirect_uri));
        let token_cache = get(ENV_TOKEN_CACHE)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_token_cache(&username));

        Ok(Config {
            client_id: required(ENV_CLIENT_ID),
            client_secret: required(ENV_CLIENT_SECRET),
            redirect_uri,
            username,
            playlist_id,
            tracks_file: PathBuf::from(
                get(ENV_TRACKS_FILE).unwrap_or_else(|| DEFAULT_TRACKS_FILE.to_string()),
            ),
            scope: get(ENV_SCOPE).unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            api_url: trim_base(get(ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string())),
            auth_url: get(ENV_AUTH_URL).unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: get(ENV_TOKEN_URL).unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            server_addr,
            token_cache,
        })
    }

    /// Path the OAuth callback route is served on.
    pub fn callback_path(&self) -> String {
        match self.redirect_uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        }
    }
}

/// Loads `.env` files from the working directory and the local data directory.
///
/// Creates the `playlist-fill` data directory if it does not exist yet.
/// Missing `.env` files are fine; variables already present in the process
/// environment are never overwritten.
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path.push(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    for candidate in [PathBuf::from(".env"), path] {
        if candidate.is_file() {
            dotenv::from_path(&candidate)
                .map_err(|e| format!("Failed to load {}: {}", candidate.display(), e))?;
        }
    }
    Ok(())
}

fn parse_redirect_uri(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidRedirectUri(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidRedirectUri(raw.to_string()));
    }
    Ok(url)
}

/// Accepts a bare playlist ID, a `spotify:playlist:<id>` URI or an
/// `https://open.spotify.com/playlist/<id>` URL, localized or not.
pub fn normalize_playlist_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let id = if let Some(rest) = raw.strip_prefix("spotify:playlist:") {
        rest.to_string()
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        let url = Url::parse(raw).ok()?;
        let mut segments = url.path_segments()?.peekable();
        // Localized share links: /intl-de/playlist/<id>
        if segments.peek().is_some_and(|s| s.starts_with("intl-")) {
            segments.next();
        }
        match (segments.next(), segments.next()) {
            (Some("playlist"), Some(id)) => id.to_string(),
            _ => return None,
        }
    } else {
        raw.to_string()
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(id)
}

fn callback_addr(redirect_uri: &Url) -> String {
    let host = match redirect_uri.host_str() {
        Some("localhost") | None => "127.0.0.1",
        Some(host) => host,
    };
    let port = redirect_uri.port_or_known_default().unwrap_or(80);
    format!("{}:{}", host, port)
}

fn default_token_cache(username: &str) -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    let safe_user: String = username
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    path.push(format!("{APP_DIR}/cache/token-{safe_user}.json"));
    path
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
