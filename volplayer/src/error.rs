use thiserror::Error;

/**
    Errors produced by the player.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("response body from {url} is empty")]
    EmptyBody { url: String },

    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("manifest does not name a media file")]
    MissingFile,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Media(#[from] media_types::Error),

    #[error("writer thread is unavailable")]
    WriterUnavailable,
}

impl Error {
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /**
        Returns true for decode errors the writer recovers from by
        restarting the stream.
    */
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Media(e) if e.is_recoverable())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
