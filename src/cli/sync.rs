use std::{env, path::PathBuf};

use indicatif::ProgressBar;
use tabled::{Table, settings::Style};

use crate::{
    config::{self, Config, ConfigError},
    error, info,
    spotify::SpotifyClient,
    success,
    sync::{self, SyncEvent, SyncReport},
    tracklist,
    types::PendingTrackTableRow,
    utils,
};

#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub tracks_file: Option<PathBuf>,
    pub playlist_id: Option<String>,
    pub dry_run: bool,
}

/// Loads the configuration, letting command-line flags take precedence over
/// the environment.
pub fn resolve_config(args: &SyncArgs) -> Result<Config, ConfigError> {
    Config::from_lookup(|key| match key {
        config::ENV_TRACKS_FILE if args.tracks_file.is_some() => args
            .tracks_file
            .as_ref()
            .map(|path| path.display().to_string()),
        config::ENV_PLAYLIST_ID if args.playlist_id.is_some() => args.playlist_id.clone(),
        _ => env::var(key).ok(),
    })
}

pub async fn sync(args: SyncArgs) {
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };

    let tracks = match tracklist::read_track_list(&config.tracks_file).await {
        Ok(tracks) => tracks,
        Err(e) => error!("{}", e),
    };

    if tracks.is_empty() {
        info!("No track IDs found in input file; nothing to do.");
        return;
    }

    info!(
        "Read {} track entries from {}",
        tracks.len(),
        config.tracks_file.display()
    );

    let playlist_id = config.playlist_id.clone();
    let client = match SpotifyClient::connect(config).await {
        Ok(client) => client,
        Err(e) => error!("{}", e),
    };

    let spinner = utils::spinner(&format!("Fetching tracks of playlist {}...", playlist_id));
    let mut progress: Option<ProgressBar> = None;

    let result = sync::run(&client, &playlist_id, &tracks, args.dry_run, |event| {
        match event {
            SyncEvent::SnapshotFetched { tracks } => {
                spinner.finish_and_clear();
                info!("Playlist {} currently holds {} tracks", playlist_id, tracks);
            }
            SyncEvent::Planned { pending, batches } if pending > 0 && !args.dry_run => {
                info!(
                    "Adding {} new tracks to playlist {} in {} batch(es)...",
                    pending, playlist_id, batches
                );
                progress = Some(utils::progress_bar(pending as u64, "Adding"));
            }
            SyncEvent::Planned { .. } => {}
            SyncEvent::BatchAdded { added, .. } => {
                if let Some(pb) = &progress {
                    pb.set_position(added as u64);
                }
            }
        }
    })
    .await;

    spinner.finish_and_clear();
    if let Some(pb) = progress.take() {
        pb.finish_and_clear();
    }

    match result {
        Ok(report) => print_summary(&playlist_id, &report),
        Err(e) => error!("{}", e),
    }
}

fn print_summary(playlist_id: &str, report: &SyncReport) {
    if report.dry_run {
        if report.pending.is_empty() {
            info!("Dry run: playlist {} already contains all provided songs.", playlist_id);
            return;
        }
        let mut table = Table::new(PendingTrackTableRow::rows(&report.pending));
        table.with(Style::rounded());
        println!("{}", table);
        info!(
            "Dry run: {} tracks would be added to playlist {} in {} batch(es); {} already present.",
            report.pending.len(),
            playlist_id,
            report.batches,
            report.already_present
        );
        return;
    }

    if report.added == 0 {
        info!("No new tracks to add; playlist already contains all provided songs.");
        return;
    }

    success!(
        "Added {} tracks to playlist {} ({} already present).",
        report.added,
        playlist_id,
        report.already_present
    );
}
