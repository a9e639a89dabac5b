//! Media references and track roles.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Opaque reference to a playable media artifact (path or URI).
///
/// A reference is never edited in place; a new rendition gets a new
/// reference and replaces the old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build a reference from a filesystem path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path, stripping a `file://` scheme if present.
    pub fn local_path(&self) -> &Path {
        Path::new(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }

    /// File stem of the referenced media, used to name derived artifacts.
    pub fn stem(&self) -> Option<&str> {
        self.local_path().file_stem().and_then(|s| s.to_str())
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MediaRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which playback timeline a value or command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    /// The video timeline; drives every other component.
    Primary,
    /// The optional attached audio timeline.
    Secondary,
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Secondary => f.write_str("secondary"),
        }
    }
}
