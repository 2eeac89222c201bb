//! Playlist diff and batched additions.
//!
//! A run reads the playlist once, computes which listed tracks are missing
//! and appends them in file order, at most [`MAX_TRACKS_PER_REQUEST`] per
//! call. The snapshot is never re-read during the run, so a second run with
//! no external changes adds nothing.

use std::collections::HashSet;

use crate::{
    Res,
    spotify::{MAX_TRACKS_PER_REQUEST, PlaylistClient},
    track::TrackId,
};

/// Progress notifications emitted while a sync runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    SnapshotFetched { tracks: usize },
    Planned { pending: usize, batches: usize },
    BatchAdded { batch: usize, tracks: usize, added: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tracks in the playlist before the run.
    pub snapshot_size: usize,
    /// Entries parsed from the track list, duplicates included.
    pub requested: usize,
    /// Entries skipped because the playlist already has them.
    pub already_present: usize,
    /// Entries missing from the playlist, in file order.
    pub pending: Vec<TrackId>,
    pub added: usize,
    /// Add-calls needed for `pending`; issued unless this is a dry run.
    pub batches: usize,
    pub dry_run: bool,
}

/// Returns the listed tracks absent from the snapshot.
///
/// File order is kept, and so are duplicates the list itself contains.
///
/// # Example
///
/// ```
/// // snapshot = {A, B}, tracks = [A, C, D]
/// assert_eq!(pending_additions(&tracks, &snapshot), vec![c, d]);
/// ```
pub fn pending_additions(tracks: &[TrackId], snapshot: &HashSet<TrackId>) -> Vec<TrackId> {
    tracks
        .iter()
        .filter(|id| !snapshot.contains(*id))
        .cloned()
        .collect()
}

/// Appends `pending` to the playlist in ordered batches.
///
/// Returns the number of tracks added. When a batch fails, the batches
/// before it stay in the playlist and the error says how many made it.
pub async fn add_in_batches<C, F>(
    client: &C,
    playlist_id: &str,
    pending: &[TrackId],
    mut on_event: F,
) -> Res<usize>
where
    C: PlaylistClient + ?Sized,
    F: FnMut(SyncEvent),
{
    let mut added = 0;
    for (idx, batch) in pending.chunks(MAX_TRACKS_PER_REQUEST).enumerate() {
        client
            .add_tracks(playlist_id, batch)
            .await
            .map_err(|e| {
                format!(
                    "Failed to add batch {} to playlist {} after adding {} of {} tracks: {}",
                    idx + 1,
                    playlist_id,
                    added,
                    pending.len(),
                    e
                )
            })?;
        added += batch.len();
        on_event(SyncEvent::BatchAdded {
            batch: idx + 1,
            tracks: batch.len(),
            added,
        });
    }
    Ok(added)
}

/// Brings the playlist up to date with `tracks`.
///
/// With `dry_run` the plan is computed but nothing is added. An empty track
/// list short-circuits before any API call.
pub async fn run<C, F>(
    client: &C,
    playlist_id: &str,
    tracks: &[TrackId],
    dry_run: bool,
    mut on_event: F,
) -> Res<SyncReport>
where
    C: PlaylistClient + ?Sized,
    F: FnMut(SyncEvent),
{
    let mut report = SyncReport {
        requested: tracks.len(),
        dry_run,
        ..SyncReport::default()
    };
    if tracks.is_empty() {
        return Ok(report);
    }

    let snapshot = client.playlist_track_ids(playlist_id).await?;
    report.snapshot_size = snapshot.len();
    on_event(SyncEvent::SnapshotFetched {
        tracks: snapshot.len(),
    });

    report.pending = pending_additions(tracks, &snapshot);
    report.already_present = tracks.len() - report.pending.len();
    report.batches = report.pending.len().div_ceil(MAX_TRACKS_PER_REQUEST);
    on_event(SyncEvent::Planned {
        pending: report.pending.len(),
        batches: report.batches,
    });

    if dry_run || report.pending.is_empty() {
        return Ok(report);
    }

    report.added = add_in_batches(client, playlist_id, &report.pending, on_event).await?;
    Ok(report)
}
