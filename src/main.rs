use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use playlist_fill::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Defaults to `sync` when omitted
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API and cache the token
    Auth,

    /// Add missing tracks from the track list to the playlist
    Sync(SyncOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone, Default)]
pub struct SyncOptions {
    /// Track list file (overrides TRACKS_FILE)
    #[clap(long)]
    tracks_file: Option<PathBuf>,

    /// Target playlist ID, URI or URL (overrides SPOTIFY_PLAYLIST_ID)
    #[clap(long)]
    playlist_id: Option<String>,

    /// Show the tracks that would be added without changing the playlist
    #[clap(long)]
    dry_run: bool,
}

impl From<SyncOptions> for cli::SyncArgs {
    fn from(opt: SyncOptions) -> Self {
        cli::SyncArgs {
            tracks_file: opt.tracks_file,
            playlist_id: opt.playlist_id,
            dry_run: opt.dry_run,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(Command::Completions(opt)) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    match cli.command {
        Some(Command::Auth) => cli::auth().await,
        Some(Command::Sync(opt)) => cli::sync(opt.into()).await,
        Some(Command::Completions(_)) => {}
        None => cli::sync(SyncOptions::default().into()).await,
    }
}
