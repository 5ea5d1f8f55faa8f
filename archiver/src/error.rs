//! Application-wide error types.

use std::path::{Path, PathBuf};

use platforms_parser::{ExtractorError, StreamKind};
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Platform error: {0}")]
    Platform(#[from] ExtractorError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("short read: expected {expected} bytes, received {actual}")]
    ShortRead { expected: u64, actual: u64 },

    #[error("{kind} transfer failed: {source}")]
    Transfer {
        kind: StreamKind,
        #[source]
        source: Box<Error>,
    },

    #[error("video transfer failed: {video}; audio transfer failed: {audio}")]
    StreamTransfers { video: Box<Error>, audio: Box<Error> },

    #[error("remux failed ({status}): {stderr}")]
    Remux { status: String, stderr: String },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg not found at '{0}'; install it or set ffmpeg_path / FFMPEG_PATH")]
    FfmpegMissing(String),

    #[error("output path {} is already claimed by another catalog item", .0.display())]
    OutputClaimed(PathBuf),

    #[error("Catalog not found for author {0}")]
    CatalogNotFound(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error while {op} {}: {source}", .path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn transfer(kind: StreamKind, source: Error) -> Self {
        Self::Transfer {
            kind,
            source: Box::new(source),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP status carried by this error, looking through transfer wrappers.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus(code) => Some(*code),
            Self::Platform(ExtractorError::UnexpectedStatus(code)) => Some(*code),
            Self::Transfer { source, .. } => source.status_code(),
            Self::StreamTransfers { video, audio } => {
                video.status_code().or_else(|| audio.status_code())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = Error::transfer(StreamKind::Video, Error::UnexpectedStatus(403));
        assert_eq!(err.to_string(), "video transfer failed: unexpected status: 403");
        assert_eq!(err.status_code(), Some(403));
    }

    #[test]
    fn test_both_stream_failures_are_reported() {
        let err = Error::StreamTransfers {
            video: Box::new(Error::UnexpectedStatus(403)),
            audio: Box::new(Error::ShortRead {
                expected: 100,
                actual: 10,
            }),
        };
        assert_eq!(
            err.to_string(),
            "video transfer failed: unexpected status: 403; \
             audio transfer failed: short read: expected 100 bytes, received 10"
        );
        assert_eq!(err.status_code(), Some(403));
    }

    #[test]
    fn test_io_path_display() {
        let err = Error::io_path(
            "creating directory",
            Path::new("/tmp/x"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "IO error while creating directory /tmp/x: denied"
        );
    }
}
