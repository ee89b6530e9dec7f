//! Error types for the emblem service

use crate::assets::Layer;
use crate::png::FormatError;
use thiserror::Error;

/// Result type alias for emblem operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving an emblem
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter was present but out of range or not a number
    #[error("Invalid emblem request: {0}")]
    InvalidRequest(String),

    /// Neither the path nor the query carried emblem parameters
    #[error("{}", crate::request::USAGE)]
    MissingParameters,

    /// Failed to load a sprite or fallback image from the origin
    #[error("Failed to load asset: {0}")]
    LoadError(String),

    /// A sprite was fetched but is not a PNG this decoder accepts
    #[error("Failed to decode {layer} sprite: {source}")]
    Decode {
        layer: Layer,
        #[source]
        source: FormatError,
    },

    /// Compositing preconditions were not met
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// HTTP status this error maps to when it ends a request.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) | Error::MissingParameters => 400,
            _ => 500,
        }
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        Error::RenderError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_client_errors() {
        assert_eq!(Error::InvalidRequest("EF".into()).status_code(), 400);
        assert_eq!(Error::MissingParameters.status_code(), 400);
        assert_eq!(Error::LoadError("404".into()).status_code(), 500);
    }

    #[test]
    fn decode_error_names_the_layer() {
        let err = Error::Decode {
            layer: Layer::Background,
            source: FormatError::MissingImageData,
        };
        let msg = err.to_string();
        assert!(msg.contains("background"), "{msg}");
        assert!(msg.contains("IDAT"), "{msg}");
    }
}
