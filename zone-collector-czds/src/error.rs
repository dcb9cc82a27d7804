use serde::{Deserialize, Serialize};

/// Unified error type for all CZDS API operations.
///
/// All variants are serializable for structured error reporting.
///
/// # Retryable Errors
///
/// The following variants represent transient failures that may succeed on retry:
/// - [`NetworkError`](Self::NetworkError) — network connectivity issues
/// - [`Timeout`](Self::Timeout) — request timed out
///
/// The built-in HTTP helpers automatically retry these with exponential backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum CzdsError {
    /// Authentication against the ICANN accounts API was rejected.
    AuthenticationFailed {
        /// HTTP status returned by the auth endpoint, if the request got that far.
        status: Option<u16>,
        /// Error details.
        detail: String,
    },

    /// An API call was rejected as unauthorized (HTTP 401) even after re-authentication.
    Unauthorized {
        /// Error details.
        detail: String,
    },

    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    ///
    /// This is a transient error and is automatically retried.
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    ///
    /// This is a transient error and is automatically retried.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The API returned an unexpected HTTP status.
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Response body or details.
        detail: String,
    },

    /// Failed to parse an API response.
    ParseError {
        /// Details about the parse failure.
        detail: String,
    },

    /// Failed to write a downloaded zone file to disk.
    IoError {
        /// Error details.
        detail: String,
    },
}

impl CzdsError {
    /// Whether it is expected behavior (bad credentials, expired token) used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed { .. } | Self::Unauthorized { .. }
        )
    }

    /// Whether the error is transient and worth retrying.
    ///
    /// Auth rejections and unexpected statuses are not retried; the caller
    /// handles token refresh separately.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError { .. } | Self::Timeout { .. })
    }
}

impl std::fmt::Display for CzdsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { status, detail } => {
                if let Some(code) = status {
                    write!(f, "[czds] Authentication failed (HTTP {code}): {detail}")
                } else {
                    write!(f, "[czds] Authentication failed: {detail}")
                }
            }
            Self::Unauthorized { detail } => {
                write!(f, "[czds] Unauthorized: {detail}")
            }
            Self::NetworkError { detail } => {
                write!(f, "[czds] Network error: {detail}")
            }
            Self::Timeout { detail } => {
                write!(f, "[czds] Request timeout: {detail}")
            }
            Self::HttpStatus { status, detail } => {
                write!(f, "[czds] Unexpected HTTP {status}: {detail}")
            }
            Self::ParseError { detail } => {
                write!(f, "[czds] Parse error: {detail}")
            }
            Self::IoError { detail } => {
                write!(f, "[czds] I/O error: {detail}")
            }
        }
    }
}

impl std::error::Error for CzdsError {}

/// Convenience type alias for `Result<T, CzdsError>`.
pub type Result<T> = std::result::Result<T, CzdsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_authentication_failed_with_status() {
        let e = CzdsError::AuthenticationFailed {
            status: Some(401),
            detail: "bad credentials".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[czds] Authentication failed (HTTP 401): bad credentials"
        );
    }

    #[test]
    fn display_authentication_failed_without_status() {
        let e = CzdsError::AuthenticationFailed {
            status: None,
            detail: "connection refused".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[czds] Authentication failed: connection refused"
        );
    }

    #[test]
    fn display_unauthorized() {
        let e = CzdsError::Unauthorized {
            detail: "token expired".to_string(),
        };
        assert_eq!(e.to_string(), "[czds] Unauthorized: token expired");
    }

    #[test]
    fn display_network_error() {
        let e = CzdsError::NetworkError {
            detail: "connection reset".to_string(),
        };
        assert_eq!(e.to_string(), "[czds] Network error: connection reset");
    }

    #[test]
    fn display_http_status() {
        let e = CzdsError::HttpStatus {
            status: 503,
            detail: "service unavailable".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "[czds] Unexpected HTTP 503: service unavailable"
        );
    }

    #[test]
    fn expected_variants() {
        assert!(
            CzdsError::AuthenticationFailed {
                status: Some(401),
                detail: String::new(),
            }
            .is_expected()
        );
        assert!(
            CzdsError::Unauthorized {
                detail: String::new(),
            }
            .is_expected()
        );
        assert!(
            !CzdsError::NetworkError {
                detail: String::new(),
            }
            .is_expected()
        );
    }

    #[test]
    fn retryable_variants() {
        assert!(
            CzdsError::NetworkError {
                detail: String::new(),
            }
            .is_retryable()
        );
        assert!(
            CzdsError::Timeout {
                detail: String::new(),
            }
            .is_retryable()
        );
        assert!(
            !CzdsError::Unauthorized {
                detail: String::new(),
            }
            .is_retryable()
        );
        assert!(
            !CzdsError::HttpStatus {
                status: 500,
                detail: String::new(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn serialize_json_round_trip() {
        let e = CzdsError::HttpStatus {
            status: 404,
            detail: "not found".to_string(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"code\":\"HttpStatus\""));
        let back: CzdsError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.to_string(), e.to_string());
    }
}
