//! hcache error types

use std::time::Duration;

/// hcache error types
///
/// `Clone` so that the outcome of one fetch can be handed to every caller
/// waiting on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    // Inbound request errors
    #[error("failed to decode request: {0}")]
    Decode(String),

    #[error("header[{index}] \"{header}\" is badly formatted")]
    InvalidHeader { index: usize, header: String },

    #[error("ttl should be at least 1s (got {ttl}s)")]
    TtlTooLow { ttl: u64 },

    // Fetch errors
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cache entry closed before its first fetch completed")]
    Closed,
}

impl CacheError {
    /// Whether the error was produced while validating an inbound request,
    /// before any cache entry was looked up or created.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CacheError::Decode(_) | CacheError::InvalidHeader { .. } | CacheError::TtlTooLow { .. }
        )
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            CacheError::InvalidRequest(err.to_string())
        } else {
            CacheError::Http(err.to_string())
        }
    }
}

/// Result type alias for hcache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_classified() {
        assert!(CacheError::Decode("eof".into()).is_rejection());
        assert!(CacheError::TtlTooLow { ttl: 0 }.is_rejection());
        assert!(
            CacheError::InvalidHeader {
                index: 0,
                header: "x".into()
            }
            .is_rejection()
        );
        assert!(!CacheError::Http("refused".into()).is_rejection());
        assert!(!CacheError::FetchTimeout(Duration::from_secs(1)).is_rejection());
    }

    #[test]
    fn messages_carry_context() {
        let err = CacheError::InvalidHeader {
            index: 2,
            header: "Accept".into(),
        };
        assert_eq!(err.to_string(), "header[2] \"Accept\" is badly formatted");
        assert_eq!(
            CacheError::TtlTooLow { ttl: 0 }.to_string(),
            "ttl should be at least 1s (got 0s)"
        );
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: CacheError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, CacheError::Decode(_)));
    }
}
