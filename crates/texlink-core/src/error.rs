/// Core error types for the Texlink renderer.
use crate::types::TextureId;

/// A specialized Result type for Texlink operations.
pub type TexlinkResult<T> = Result<T, TexlinkError>;

/// Top-level error type encompassing all Texlink subsystems.
#[derive(Debug, thiserror::Error)]
pub enum TexlinkError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid frame: {message} ({width}x{height}, {len} bytes)")]
    InvalidFrame {
        message: String,
        width: u32,
        height: u32,
        len: usize,
    },

    #[error("unknown surface: {0}")]
    UnknownSurface(TextureId),

    #[error("surface {0} has been released")]
    SurfaceReleased(TextureId),

    #[error("surface {0} already exists")]
    DuplicateSurface(TextureId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TexlinkError {
    /// Create an invalid-frame error describing the offending buffer.
    pub fn invalid_frame(message: impl Into<String>, width: u32, height: u32, len: usize) -> Self {
        TexlinkError::InvalidFrame {
            message: message.into(),
            width,
            height,
            len,
        }
    }
}

impl From<toml::de::Error> for TexlinkError {
    fn from(err: toml::de::Error) -> Self {
        TexlinkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TexlinkError {
    fn from(err: toml::ser::Error) -> Self {
        TexlinkError::Config(err.to_string())
    }
}
