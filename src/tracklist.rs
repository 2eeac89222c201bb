//! Track list file parsing.
//!
//! The track list is a UTF-8 text file with one entry per line. Entries are
//! bare track IDs or `<prefix>:track:<id>` URIs. Empty lines and lines
//! starting with `#` are ignored. Lines that are neither form are reported
//! as [`MalformedLine`] and skipped by [`read_track_list`].

use std::{fmt, path::Path};

use crate::{
    Res,
    track::{TrackId, TrackIdError},
    warning,
};

/// A line of the track list that is neither a bare ID nor a track URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
    pub reason: TrackIdError,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for MalformedLine {}

/// Lazily parses track list content.
///
/// Yields one item per non-empty, non-comment line, in file order. A
/// malformed line is yielded as `Err` and iteration continues with the
/// following line. A leading byte-order mark is ignored.
pub fn entries(content: &str) -> impl Iterator<Item = Result<TrackId, MalformedLine>> + '_ {
    content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(TrackId::parse(line).map_err(|reason| MalformedLine {
                line: idx + 1,
                content: line.to_string(),
                reason,
            }))
        })
}

/// Parses track list content, warning about and skipping malformed lines.
pub fn parse_track_list(content: &str) -> Vec<TrackId> {
    entries(content)
        .filter_map(|entry| match entry {
            Ok(id) => Some(id),
            Err(malformed) => {
                warning!(
                    "Skipping malformed entry '{}' ({})",
                    malformed.content,
                    malformed
                );
                None
            }
        })
        .collect()
}

/// Reads and parses the track list file.
///
/// # Errors
///
/// Fails if the file does not exist or cannot be read as UTF-8. Malformed
/// lines are not errors.
pub async fn read_track_list(path: &Path) -> Res<Vec<TrackId>> {
    if !path.is_file() {
        return Err(format!("Tracks file '{}' does not exist.", path.display()).into());
    }

    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read tracks file '{}': {}", path.display(), e))?;

    Ok(parse_track_list(&content))
}
