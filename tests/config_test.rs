use std::{collections::HashMap, path::PathBuf};

use playlist_fill::cli::{SyncArgs, resolve_config};
use playlist_fill::config::{self, Config, ConfigError, normalize_playlist_id};

fn base_vars() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (config::ENV_CLIENT_ID, "cid"),
        (config::ENV_CLIENT_SECRET, "csecret"),
        (config::ENV_REDIRECT_URI, "http://localhost:8888/callback"),
        (config::ENV_USERNAME, "someone"),
        (config::ENV_PLAYLIST_ID, "37i9dQZF1DXcBWIGoYBM5M"),
    ])
}

fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
}

#[test]
fn loads_required_values_and_defaults() {
    let config = load(&base_vars()).unwrap();

    assert_eq!(config.client_id, "cid");
    assert_eq!(config.client_secret, "csecret");
    assert_eq!(config.username, "someone");
    assert_eq!(config.playlist_id, "37i9dQZF1DXcBWIGoYBM5M");
    assert_eq!(config.tracks_file, PathBuf::from("tracks.txt"));
    assert_eq!(config.scope, config::DEFAULT_SCOPE);
    assert_eq!(config.api_url, config::DEFAULT_API_URL);
    assert_eq!(config.token_url, config::DEFAULT_TOKEN_URL);
    assert_eq!(config.server_addr, "127.0.0.1:8888");
    assert_eq!(config.callback_path(), "/callback");
    assert!(
        config
            .token_cache
            .to_string_lossy()
            .ends_with("token-someone.json")
    );
}

#[test]
fn reports_every_missing_variable() {
    let mut vars = base_vars();
    vars.remove(config::ENV_CLIENT_SECRET);
    vars.insert(config::ENV_PLAYLIST_ID, "   ");

    match load(&vars) {
        Err(ConfigError::Missing(missing)) => {
            assert_eq!(
                missing,
                vec![config::ENV_CLIENT_SECRET, config::ENV_PLAYLIST_ID]
            );
        }
        other => panic!("expected missing configuration, got {:?}", other),
    }
}

#[test]
fn missing_configuration_message_names_variables() {
    let err = load(&HashMap::new()).unwrap_err();
    let message = err.to_string();
    for var in [
        "SPOTIPY_CLIENT_ID",
        "SPOTIPY_CLIENT_SECRET",
        "SPOTIPY_REDIRECT_URI",
        "SPOTIFY_USERNAME",
        "SPOTIFY_PLAYLIST_ID",
    ] {
        assert!(message.contains(var), "{} missing from '{}'", var, message);
    }
}

#[test]
fn optional_values_override_defaults() {
    let mut vars = base_vars();
    vars.insert(config::ENV_TRACKS_FILE, "mix.txt");
    vars.insert(config::ENV_API_URL, "http://127.0.0.1:9999/v1/");
    vars.insert(config::ENV_SERVER_ADDRESS, "0.0.0.0:9000");
    vars.insert(config::ENV_TOKEN_CACHE, "/tmp/token.json");

    let config = load(&vars).unwrap();
    assert_eq!(config.tracks_file, PathBuf::from("mix.txt"));
    assert_eq!(config.api_url, "http://127.0.0.1:9999/v1");
    assert_eq!(config.server_addr, "0.0.0.0:9000");
    assert_eq!(config.token_cache, PathBuf::from("/tmp/token.json"));
}

#[test]
fn invalid_redirect_uri_is_rejected() {
    let mut vars = base_vars();
    vars.insert(config::ENV_REDIRECT_URI, "not a url");
    assert!(matches!(
        load(&vars),
        Err(ConfigError::InvalidRedirectUri(_))
    ));

    vars.insert(config::ENV_REDIRECT_URI, "ftp://example.com/callback");
    assert!(matches!(
        load(&vars),
        Err(ConfigError::InvalidRedirectUri(_))
    ));
}

#[test]
fn server_address_follows_redirect_uri() {
    let mut vars = base_vars();
    vars.insert(config::ENV_REDIRECT_URI, "http://127.0.0.1:5173/");
    let config = load(&vars).unwrap();
    assert_eq!(config.server_addr, "127.0.0.1:5173");
    assert_eq!(config.callback_path(), "/");
}

#[test]
fn playlist_id_accepts_uri_and_url_forms() {
    assert_eq!(
        normalize_playlist_id("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").as_deref(),
        Some("37i9dQZF1DXcBWIGoYBM5M")
    );
    assert_eq!(
        normalize_playlist_id("https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc")
            .as_deref(),
        Some("37i9dQZF1DXcBWIGoYBM5M")
    );
    assert_eq!(
        normalize_playlist_id("https://open.spotify.com/intl-de/playlist/37i9dQZF1DXcBWIGoYBM5M?si=abc")
            .as_deref(),
        Some("37i9dQZF1DXcBWIGoYBM5M")
    );
    assert_eq!(normalize_playlist_id("https://open.spotify.com/intl-de/album/x"), None);
    assert_eq!(normalize_playlist_id("https://open.spotify.com/album/x"), None);
    assert_eq!(normalize_playlist_id("bad id"), None);

    let mut vars = base_vars();
    vars.insert(config::ENV_PLAYLIST_ID, "spotify:album:xyz");
    assert!(matches!(
        load(&vars),
        Err(ConfigError::InvalidPlaylistId(_))
    ));
}

#[test]
fn command_line_flags_satisfy_required_values() {
    // The remaining values come from the process environment and may be unset.
    let args = SyncArgs {
        tracks_file: Some(PathBuf::from("other.txt")),
        playlist_id: Some("spotify:playlist:ABC".to_string()),
        dry_run: true,
    };
    match resolve_config(&args) {
        Ok(config) => {
            assert_eq!(config.tracks_file, PathBuf::from("other.txt"));
            assert_eq!(config.playlist_id, "ABC");
        }
        Err(ConfigError::Missing(missing)) => {
            assert!(!missing.contains(&config::ENV_PLAYLIST_ID));
        }
        Err(other) => panic!("unexpected configuration error: {}", other),
    }
}
