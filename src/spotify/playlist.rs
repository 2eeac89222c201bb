use std::collections::HashSet;

use crate::{
    Res,
    spotify::{MAX_TRACKS_PER_REQUEST, SpotifyClient},
    track::TrackId,
    types::{AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, PlaylistTracksPage},
};

/// Fields requested for playlist items; everything else is dropped server side.
const PLAYLIST_ITEM_FIELDS: &str = "items(track(id,type)),next,total";

impl SpotifyClient {
    /// Retrieves the IDs of every track in a playlist.
    ///
    /// Follows the `next` links until the last page. Items without a track
    /// (removed from the catalog), without an ID (local files) or of another
    /// type (podcast episodes) are skipped.
    ///
    /// # API Endpoint
    ///
    /// `GET /playlists/{playlist_id}/tracks`
    pub async fn get_playlist_track_ids(&self, playlist_id: &str) -> Res<HashSet<TrackId>> {
        let mut ids = HashSet::new();
        let mut next = Some(self.api_url(&format!(
            "/playlists/{id}/tracks?fields={fields}&limit={limit}",
            id = playlist_id,
            fields = PLAYLIST_ITEM_FIELDS,
            limit = MAX_TRACKS_PER_REQUEST
        )));

        while let Some(url) = next {
            let page: PlaylistTracksPage = self
                .send(|client| client.get(&url))
                .await
                .map_err(|e| format!("Failed to fetch playlist {}: {}", playlist_id, e))?
                .json()
                .await?;

            ids.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track)
                    .filter(|track| track.kind.as_deref().is_none_or(|kind| kind == "track"))
                    .filter_map(|track| track.id)
                    .filter_map(|id| TrackId::parse(&id).ok()),
            );
            next = page.next;
        }

        Ok(ids)
    }

    /// Appends up to 100 tracks to the end of a playlist.
    ///
    /// Returns the playlist snapshot ID after the change.
    ///
    /// # API Endpoint
    ///
    /// `POST /playlists/{playlist_id}/tracks`
    pub async fn add_tracks(&self, playlist_id: &str, tracks: &[TrackId]) -> Res<String> {
        if tracks.len() > MAX_TRACKS_PER_REQUEST {
            return Err(format!(
                "Cannot add {} tracks in one request (limit is {})",
                tracks.len(),
                MAX_TRACKS_PER_REQUEST
            )
            .into());
        }

        let url = self.api_url(&format!("/playlists/{}/tracks", playlist_id));
        let body = AddTrackToPlaylistRequest {
            uris: tracks.iter().map(TrackId::uri).collect(),
        };

        let response: AddTrackToPlaylistResponse = self
            .send(|client| client.post(&url).json(&body))
            .await?
            .json()
            .await?;

        Ok(response.snapshot_id)
    }
}
