use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitrineError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("Response from {url} exceeds {limit} bytes")]
    PayloadTooLarge { url: String, limit: usize },

    #[error("Fetch failed: {message}")]
    FetchFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Could not extract a product title from {0}")]
    ExtractionFailed(String),

    #[error("Offer {offer_id} does not belong to gift {gift_id}")]
    InvalidOffer { gift_id: i64, offer_id: i64 },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-checkable error category surfaced to the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    PayloadTooLarge,
    FetchFailed,
    ExtractionFailed,
    InvalidOffer,
    NotFound,
    Internal,
}

impl VitrineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            Self::FetchFailed { .. } => ErrorKind::FetchFailed,
            Self::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            Self::InvalidOffer { .. } => ErrorKind::InvalidOffer,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(_)
            | Self::Migration(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status the calling API layer should answer with.
    pub fn status_hint(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidUrl | ErrorKind::InvalidOffer => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::ExtractionFailed => 422,
            ErrorKind::FetchFailed => 502,
            ErrorKind::Timeout => 504,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether a later attempt could plausibly succeed. The core never retries
    /// on its own; this is for whoever sits at the integration boundary.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::FetchFailed { status: None, .. } => true,
            Self::FetchFailed {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VitrineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_hint() {
        let err = VitrineError::InvalidUrl("ftp://example.com".into());
        assert_eq!(err.kind(), ErrorKind::InvalidUrl);
        assert_eq!(err.status_hint(), 400);

        let err = VitrineError::ExtractionFailed("https://example.com".into());
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(err.status_hint(), 422);

        let err = VitrineError::PayloadTooLarge {
            url: "https://example.com".into(),
            limit: 10,
        };
        assert_eq!(err.status_hint(), 413);

        let err = VitrineError::NotFound("Offer 7".into());
        assert_eq!(err.status_hint(), 404);
        assert_eq!(err.to_string(), "Offer 7 not found");
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        let err = VitrineError::Config("bad".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_hint(), 500);
    }

    #[test]
    fn test_transient_classification() {
        assert!(VitrineError::Timeout("https://example.com".into()).is_transient());
        assert!(VitrineError::FetchFailed {
            status: Some(503),
            message: "unavailable".into()
        }
        .is_transient());
        assert!(VitrineError::FetchFailed {
            status: None,
            message: "connection reset".into()
        }
        .is_transient());
        assert!(!VitrineError::FetchFailed {
            status: Some(404),
            message: "gone".into()
        }
        .is_transient());
        assert!(!VitrineError::ExtractionFailed("https://example.com".into()).is_transient());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::PayloadTooLarge).unwrap();
        assert_eq!(json, "\"payload_too_large\"");
    }
}
