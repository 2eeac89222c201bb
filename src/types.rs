use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::track::TrackId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

/// Raw body of the `/api/token` endpoint.
///
/// `refresh_token` is absent from most refresh responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// A pending authorization request, shared between the auth flow and the
/// callback handler.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub code_verifier: String,
    pub state: String,
    pub outcome: Option<Result<Token, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<PlaylistTrack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

#[derive(Tabled)]
pub struct PendingTrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub id: String,
    pub uri: String,
}

impl PendingTrackTableRow {
    pub fn rows(pending: &[TrackId]) -> Vec<Self> {
        pending
            .iter()
            .enumerate()
            .map(|(idx, id)| PendingTrackTableRow {
                position: idx + 1,
                id: id.to_string(),
                uri: id.uri(),
            })
            .collect()
    }
}
