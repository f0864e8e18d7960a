use thiserror::Error;

/// Errors surfaced by the engine's public API.
///
/// Geometry problems (zero-size shapes, single-point paths) and history
/// underflow are not errors; they are silent no-ops.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A colour string that is not `#rrggbb` / `#rrggbbaa` hex.
    #[error("invalid color '{0}': expected #rrggbbaa hex")]
    InvalidColor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("replay script error: {0}")]
    Script(String),
}

impl From<Box<bincode::ErrorKind>> for EngineError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        EngineError::Serialize(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
