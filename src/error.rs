use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A marker pair could not be located (or the end marker precedes the start).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing AUTO markers {start} .. {end}")]
pub struct MissingMarkers {
    pub start: String,
    pub end: String,
}

/// Model-backed classification failed. Never fatal: callers fall back to keywords.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("classifier returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("classifier response is not valid JSON: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("No URL found in issue")]
    NoUrl,

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} returned status {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("category store {} is corrupt: {source}", path.display())]
    StoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{marker} in {}", path.display())]
    MissingMarkers {
        path: PathBuf,
        #[source]
        marker: MissingMarkers,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
