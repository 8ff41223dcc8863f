use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque version marker (etag) of a stored organization.
///
/// Markers are only ever compared for equality. They are minted by the
/// persistence layer and carried forward unchanged by callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(tag: impl Into<String>) -> Self {
        Version(tag.into())
    }

    /// Marker chained over the previous marker and the new content.
    pub fn chained(previous: Option<&Version>, content: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        if let Some(previous) = previous {
            hasher.update(previous.0.as_bytes());
        }
        hasher.update(content);

        let hex = hasher.finalize().to_hex();
        Version(format!("\"{}\"", &hex.as_str()[..32]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(tag: &str) -> Self {
        Version::new(tag)
    }
}
