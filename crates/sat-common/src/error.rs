//! Error types for the satellite image pipeline.

use thiserror::Error;

/// Result type alias using SatError.
pub type SatResult<T> = Result<T, SatError>;

/// Failure kinds of the satellite pipeline.
///
/// Every variant maps to an HTTP 500 at the API boundary; the kind is kept so
/// logs and metrics can tell a missing scene apart from a broken renderer.
#[derive(Debug, Error)]
pub enum SatError {
    /// No scene for the band inside the lookback window.
    #[error("No scene found: {0}")]
    NotFound(String),

    /// The object store or another remote dependency failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Decoding, projecting or cropping the scene failed.
    #[error("Processing failed: {0}")]
    Processing(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    /// Reading or writing the image cache directory failed.
    #[error("Cache I/O error: {0}")]
    CacheIo(String),
}

impl SatError {
    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            SatError::NotFound(_) => "not_found",
            SatError::Upstream(_) => "upstream",
            SatError::Processing(_) => "processing",
            SatError::Render(_) => "render",
            SatError::CacheIo(_) => "cache_io",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        500
    }
}

impl From<std::io::Error> for SatError {
    fn from(err: std::io::Error) -> Self {
        SatError::CacheIo(err.to_string())
    }
}

impl From<serde_json::Error> for SatError {
    fn from(err: serde_json::Error) -> Self {
        SatError::Processing(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_cache_io() {
        let err: SatError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, SatError::CacheIo(_)));
        assert_eq!(err.kind(), "cache_io");
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_display_includes_message() {
        let err = SatError::NotFound("band 13".to_string());
        assert_eq!(err.to_string(), "No scene found: band 13");
    }
}
