use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from retrieving the feed over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Errors from turning the response body into entries.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("feed is not well-formed XML: {0}")]
    Malformed(String),

    #[error("no RSS or Atom container found in feed body")]
    NotAFeed,
}

/// Errors from locating the editable region in the target document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerError {
    #[error("start and end markers must be non-empty")]
    EmptyMarker,

    #[error("start marker '{0}' not found")]
    MissingStart(String),

    #[error("end marker '{0}' not found")]
    MissingEnd(String),

    #[error("start marker occurs {0} times, expected exactly once")]
    DuplicateStart(usize),

    #[error("end marker occurs {0} times, expected exactly once")]
    DuplicateEnd(usize),

    #[error("end marker appears before start marker")]
    Misordered,

    #[error("rendered posts contain a region marker")]
    MarkerInBlock,
}

/// Pipeline step that a run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Fetch,
    Parse,
    Update,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Update => "update",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error("{}: {source}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    pub fn stage(&self) -> Stage {
        match self {
            SyncError::Fetch(_) => Stage::Fetch,
            SyncError::Parse(_) => Stage::Parse,
            SyncError::Marker(_) => Stage::Update,
            SyncError::Io { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Read.to_string(), "read");
        assert_eq!(Stage::Fetch.to_string(), "fetch");
        assert_eq!(Stage::Write.to_string(), "write");
    }

    #[test]
    fn test_sync_error_stage_mapping() {
        let err: SyncError = FetchError::HttpStatus(503).into();
        assert_eq!(err.stage(), Stage::Fetch);

        let err: SyncError = ParseError::NotAFeed.into();
        assert_eq!(err.stage(), Stage::Parse);

        let err: SyncError = MarkerError::Misordered.into();
        assert_eq!(err.stage(), Stage::Update);

        let err = SyncError::Io {
            stage: Stage::Write,
            path: PathBuf::from("README.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.stage(), Stage::Write);
        assert_eq!(err.to_string(), "README.md: denied");
    }

    #[test]
    fn test_marker_error_messages() {
        assert_eq!(
            MarkerError::DuplicateStart(2).to_string(),
            "start marker occurs 2 times, expected exactly once"
        );
        assert_eq!(
            MarkerError::MissingEnd("<!-- END -->".into()).to_string(),
            "end marker '<!-- END -->' not found"
        );
    }
}
