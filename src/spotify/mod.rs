//! # Spotify Integration Module
//!
//! The integration layer between playlist-fill and the Spotify Web API:
//! authentication, playlist reads and playlist writes.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI, Sync)
//!          ↓
//! PlaylistClient trait
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code + PKCE, token cache)
//!     ├── Request pipeline (bearer token, Retry-After, refresh on 401)
//!     └── Playlist Operations (snapshot, add tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## API Coverage
//!
//! - `GET /playlists/{playlist_id}/tracks` - Playlist contents, paginated
//! - `POST /playlists/{playlist_id}/tracks` - Append up to 100 tracks
//! - `POST /api/token` - Code exchange and token refresh
//!
//! The sync logic only depends on [`PlaylistClient`], so it can run against
//! an in-memory playlist in tests.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::{Res, track::TrackId};

pub mod auth;
mod client;
pub mod playlist;

pub use client::SpotifyClient;

/// Maximum number of tracks Spotify accepts per add request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Remote playlist operations needed by the sync.
#[async_trait]
pub trait PlaylistClient: Send + Sync {
    /// All track IDs currently in the playlist.
    async fn playlist_track_ids(&self, playlist_id: &str) -> Res<HashSet<TrackId>>;

    /// Appends one batch (at most [`MAX_TRACKS_PER_REQUEST`]) to the playlist.
    async fn add_tracks(&self, playlist_id: &str, tracks: &[TrackId]) -> Res<()>;
}

#[async_trait]
impl PlaylistClient for SpotifyClient {
    async fn playlist_track_ids(&self, playlist_id: &str) -> Res<HashSet<TrackId>> {
        self.get_playlist_track_ids(playlist_id).await
    }

    async fn add_tracks(&self, playlist_id: &str, tracks: &[TrackId]) -> Res<()> {
        SpotifyClient::add_tracks(self, playlist_id, tracks)
            .await
            .map(|_snapshot_id| ())
    }
}
