use thiserror::Error;

use crate::stream::RoleSet;

/**
    Errors produced while opening, demuxing or decoding media.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("missing required streams: {0}")]
    MissingStreams(RoleSet),

    #[error("streams out of sync: routed {packets} packets without completing a frame (missing {missing})")]
    Desync { packets: usize, missing: RoleSet },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /**
        Returns true for errors the playback loop can recover from by
        restarting the stream.
    */
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Desync { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
