use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use chrono::Utc;
use mockito::{Matcher, Server};
use playlist_fill::{
    config::{self, Config},
    management::TokenManager,
    spotify::{PlaylistClient, SpotifyClient},
    sync,
    track::TrackId,
    types::Token,
};
use serde_json::json;
use tempfile::tempdir;

fn test_config(base_url: &str, token_cache: &Path) -> Config {
    let api_url = format!("{}/v1", base_url);
    let token_url = format!("{}/api/token", base_url);
    let cache = token_cache.display().to_string();
    let vars: HashMap<&str, String> = HashMap::from([
        (config::ENV_CLIENT_ID, "cid".to_string()),
        (config::ENV_CLIENT_SECRET, "csecret".to_string()),
        (
            config::ENV_REDIRECT_URI,
            "http://127.0.0.1:8888/callback".to_string(),
        ),
        (config::ENV_USERNAME, "someone".to_string()),
        (config::ENV_PLAYLIST_ID, "pl1".to_string()),
        (config::ENV_API_URL, api_url),
        (config::ENV_TOKEN_URL, token_url),
        (config::ENV_TOKEN_CACHE, cache),
    ]);
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn token(access_token: &str, obtained_secs_ago: u64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "refresh_token_value".to_string(),
        scope: config::DEFAULT_SCOPE.to_string(),
        expires_in: 3600,
        obtained_at: Utc::now().timestamp() as u64 - obtained_secs_ago,
    }
}

fn client(config: Config, token: Token) -> SpotifyClient {
    let tokens = TokenManager::new(token, config.token_cache.clone());
    SpotifyClient::new(config, tokens)
}

fn ids(values: &[&str]) -> Vec<TrackId> {
    values.iter().map(|v| TrackId::parse(v).unwrap()).collect()
}

#[tokio::test]
async fn fetches_every_page_of_the_playlist() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let first_page = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
        .match_header("authorization", "Bearer valid")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    { "track": { "id": "A", "type": "track" } },
                    { "track": null },
                    { "track": { "id": null, "type": "track" } },
                    { "track": { "id": "EP1", "type": "episode" } }
                ],
                "next": format!("{}/v1/next-page?offset=100", server.url()),
                "total": 5
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let second_page = server
        .mock("GET", "/v1/next-page")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [ { "track": { "id": "B", "type": "track" } } ],
                "next": null,
                "total": 5
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client(config, token("valid", 0));
    let snapshot = client.playlist_track_ids("pl1").await.unwrap();

    assert_eq!(snapshot, ids(&["A", "B"]).into_iter().collect::<HashSet<_>>());
    first_page.assert_async().await;
    second_page.assert_async().await;
}

#[tokio::test]
async fn adds_tracks_as_uris() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let add = server
        .mock("POST", "/v1/playlists/pl1/tracks")
        .match_header("authorization", "Bearer valid")
        .match_body(Matcher::Json(json!({
            "uris": ["spotify:track:C", "spotify:track:D"]
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "snapshot_id": "s1" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client(config, token("valid", 0));
    let snapshot_id = client.add_tracks("pl1", &ids(&["C", "D"])).await.unwrap();

    assert_eq!(snapshot_id, "s1");
    add.assert_async().await;
}

#[tokio::test]
async fn rejects_batches_over_the_limit() {
    let server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let tracks: Vec<TrackId> = (0..101)
        .map(|n| TrackId::parse(&format!("t{}", n)).unwrap())
        .collect();
    let client = client(config, token("valid", 0));

    assert!(client.add_tracks("pl1", &tracks).await.is_err());
}

#[tokio::test]
async fn sync_against_api_issues_one_call_per_hundred_tracks() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let _snapshot = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [ { "track": { "id": "t0", "type": "track" } } ],
                "next": null
            })
            .to_string(),
        )
        .create_async()
        .await;

    let add = server
        .mock("POST", "/v1/playlists/pl1/tracks")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "snapshot_id": "s" }).to_string())
        .expect(3)
        .create_async()
        .await;

    let tracks: Vec<TrackId> = (0..251)
        .map(|n| TrackId::parse(&format!("t{}", n)).unwrap())
        .collect();
    let client = client(config, token("valid", 0));

    let report = sync::run(&client, "pl1", &tracks, false, |_| {})
        .await
        .unwrap();

    assert_eq!(report.added, 250);
    assert_eq!(report.batches, 3);
    add.assert_async().await;
}

#[tokio::test]
async fn retries_after_rate_limit() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let limited = server
        .mock("POST", "/v1/playlists/pl1/tracks")
        .with_status(429)
        .with_header("retry-after", "0")
        .with_body(r#"{"error":"rate_limited"}"#)
        .expect(1)
        .create_async()
        .await;

    // Registered second, so it only answers once the 429 mock has had its hit.
    let ok = server
        .mock("POST", "/v1/playlists/pl1/tracks")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "snapshot_id": "s2" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client(config, token("valid", 0));
    let snapshot_id = client.add_tracks("pl1", &ids(&["A"])).await.unwrap();

    assert_eq!(snapshot_id, "s2");
    limited.assert_async().await;
    ok.assert_async().await;
}

#[tokio::test]
async fn surfaces_api_errors() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let _missing = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error":{"status":404,"message":"Resource not found"}}"#)
        .create_async()
        .await;

    let client = client(config, token("valid", 0));
    let err = client.playlist_track_ids("pl1").await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("404"), "{}", message);
    assert!(message.contains("Resource not found"), "{}", message);
}

#[tokio::test]
async fn refreshes_expired_token_and_persists_it() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let cache = dir.path().join("cache/token.json");
    let config = test_config(&server.url(), &cache);

    let refresh = server
        .mock("POST", "/api/token")
        .match_header("authorization", "Basic Y2lkOmNzZWNyZXQ=")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh_token_value".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": "fresh",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "playlist-modify-private"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let fetch = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [], "next": null }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client(config, token("stale", 7200));
    let snapshot = client.playlist_track_ids("pl1").await.unwrap();
    assert!(snapshot.is_empty());

    refresh.assert_async().await;
    fetch.assert_async().await;

    let cached = TokenManager::load(&cache).await.unwrap();
    assert_eq!(cached.current_token().access_token, "fresh");
    // No new refresh token in the response, so the old one is kept.
    assert_eq!(cached.current_token().refresh_token, "refresh_token_value");
}

#[tokio::test]
async fn refreshes_once_on_unauthorized() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let config = test_config(&server.url(), &dir.path().join("token.json"));

    let rejected = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer revoked")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let _refresh = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": "fresh",
                "refresh_token": "rotated",
                "expires_in": 3600
            })
            .to_string(),
        )
        .create_async()
        .await;

    let accepted = server
        .mock("GET", "/v1/playlists/pl1/tracks")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "items": [ { "track": { "id": "A" } } ], "next": null }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client(config, token("revoked", 0));
    let snapshot = client.playlist_track_ids("pl1").await.unwrap();

    assert_eq!(snapshot.len(), 1);
    rejected.assert_async().await;
    accepted.assert_async().await;
}
