//! Track identifier normalization.
//!
//! Spotify accepts tracks either as bare base-62 IDs (`6rqhFgbbKwnb9MLmUQDhG6`)
//! or as URIs (`spotify:track:6rqhFgbbKwnb9MLmUQDhG6`). Both forms normalize
//! to the same [`TrackId`], so comparisons against the playlist are plain
//! string equality on the bare ID.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// URI prefix used when sending tracks to the Web API.
pub const TRACK_URI_PREFIX: &str = "spotify:track:";

/// A normalized Spotify track identifier (the bare ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackIdError {
    Empty,
    InvalidId(String),
    InvalidUri(String),
}

impl fmt::Display for TrackIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackIdError::Empty => write!(f, "empty track identifier"),
            TrackIdError::InvalidId(id) => write!(
                f,
                "'{}' is not a track ID (expected ASCII letters and digits only)",
                id
            ),
            TrackIdError::InvalidUri(uri) => write!(
                f,
                "'{}' is not a track URI (expected <prefix>:track:<id>)",
                uri
            ),
        }
    }
}

impl std::error::Error for TrackIdError {}

impl TrackId {
    /// Normalizes a bare ID or a `<prefix>:track:<id>` URI.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// let a = TrackId::parse("spotify:track:ABC123")?;
    /// let b = TrackId::parse("ABC123")?;
    /// assert_eq!(a, b);
    /// ```
    pub fn parse(input: &str) -> Result<Self, TrackIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TrackIdError::Empty);
        }

        if !input.contains(':') {
            return Self::from_bare(input);
        }

        let parts: Vec<&str> = input.split(':').collect();
        match parts.as_slice() {
            [prefix, "track", id] if !prefix.is_empty() => {
                Self::from_bare(id).map_err(|_| TrackIdError::InvalidUri(input.to_string()))
            }
            _ => Err(TrackIdError::InvalidUri(input.to_string())),
        }
    }

    fn from_bare(id: &str) -> Result<Self, TrackIdError> {
        if id.is_empty() {
            return Err(TrackIdError::Empty);
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TrackIdError::InvalidId(id.to_string()));
        }
        Ok(TrackId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `spotify:track:<id>` form expected by playlist endpoints.
    pub fn uri(&self) -> String {
        format!("{}{}", TRACK_URI_PREFIX, self.0)
    }
}

impl FromStr for TrackId {
    type Err = TrackIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackId::parse(s)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
