//! Danmaku error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, DanmakuError>;

/// Errors that can occur while decoding danmaku or persisting viewer settings.
#[derive(Error, Debug)]
pub enum DanmakuError {
    /// The danmaku document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be written as TOML
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Settings file is not valid TOML or has the wrong shape
    #[error("Deserialize error: {0}")]
    Deserialize(#[from] toml::de::Error),
}

impl DanmakuError {
    /// Create an XML error.
    pub fn xml(msg: impl Into<String>) -> Self {
        Self::Xml(msg.into())
    }
}
