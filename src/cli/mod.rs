//! # CLI Module
//!
//! User-facing commands. Each command loads its configuration, delegates to
//! the library modules and turns failures into a message and exit code 1.
//!
//! ## Commands
//!
//! - [`sync`] - Adds the tracks of the track list that the playlist is missing
//! - [`auth`] - Runs the browser authorization and caches the token
//!
//! ## Usage Patterns
//!
//! ```bash
//! playlist-fill auth                          # One-time authorization
//! playlist-fill                               # Sync tracks.txt into the playlist
//! playlist-fill sync --tracks-file mix.txt    # Sync another list
//! playlist-fill sync --dry-run                # Show what would be added
//! ```

mod auth;
mod sync;

pub use auth::auth;
pub use sync::SyncArgs;
pub use sync::resolve_config;
pub use sync::sync;
