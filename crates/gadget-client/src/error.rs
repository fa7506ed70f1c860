//! # Client Error Types
//!
//! Error types for everything in the client that can fail at runtime.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Unauthorized           │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Api {status, message}  │ │
//! │  │  ConfigLoad/Save│  │                 │  │  InvalidPayload         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Storage      │  │    Session      │  │      Domain             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  StorageFailed  │  │  NotAuthenticated│ │  Core (cart, checkout)  │ │
//! │  │                 │  │                 │  │  Validation (forms)     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What reaches the user
//! Only [`ClientError::user_message`] is meant for display. A backend message
//! is shown verbatim; everything else collapses to a generic sentence and the
//! detail goes to the log.

use gadget_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Shown when the backend gave no usable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Shown when login fails without a backend message.
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed. Check your email and password.";

/// Client error type.
///
/// ## Design Principles
/// - Each variant includes enough context for the log line
/// - Errors are categorized for different handling strategies
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Backend unreachable (DNS, refused, reset).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// 401/403 from the backend.
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("no message"))]
    Unauthorized { message: Option<String> },

    /// Any other non-2xx response.
    #[error("Backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The response body could not be decoded or normalized.
    #[error("Invalid {resource} payload: {reason}")]
    InvalidPayload { resource: String, reason: String },

    // =========================================================================
    // Session & Storage Errors
    // =========================================================================
    /// An authenticated call was attempted without a session.
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session storage failed: {0}")]
    StorageFailed(String),

    /// The operation doesn't apply in the current auth state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest doesn't carry the configured duration
            ClientError::Timeout(0)
        } else if err.is_decode() {
            ClientError::InvalidPayload {
                resource: "response".to_string(),
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            ClientError::Api {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ClientError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the same call might succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the session is missing or was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized { .. } | ClientError::NotAuthenticated
        )
    }

    /// The backend's own message, if it sent one.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { message } | ClientError::Api { message, .. } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            _ => None,
        }
    }

    /// Text for a notification or form error.
    ///
    /// Backend messages are surfaced verbatim. Local validation errors are
    /// already user-facing. Everything else becomes [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        if let Some(message) = self.backend_message() {
            return message.to_string();
        }
        match self {
            ClientError::Validation(err) => err.to_string(),
            ClientError::Core(err) => err.to_string(),
            ClientError::NotAuthenticated => "Please sign in first.".to_string(),
            ClientError::InvalidState(message) => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::ConnectionFailed("refused".into()).is_retryable());
        assert!(ClientError::Timeout(30).is_retryable());
        assert!(ClientError::Api { status: 503, message: None }.is_retryable());

        assert!(!ClientError::Api { status: 422, message: None }.is_retryable());
        assert!(!ClientError::Unauthorized { message: None }.is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_categories() {
        assert!(ClientError::InvalidUrl("x".into()).is_config_error());
        assert!(ClientError::NotAuthenticated.is_auth_error());
        assert!(ClientError::Unauthorized { message: None }.is_auth_error());
        assert!(!ClientError::Timeout(1).is_auth_error());
    }

    #[test]
    fn test_user_message_prefers_backend_text() {
        let err = ClientError::Api {
            status: 422,
            message: Some("SKU sudah digunakan".into()),
        };
        assert_eq!(err.user_message(), "SKU sudah digunakan");

        let blank = ClientError::Api {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message(), GENERIC_FAILURE);

        let network = ClientError::ConnectionFailed("connection refused".into());
        assert_eq!(network.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_validation_message_is_user_facing() {
        let err: ClientError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert_eq!(err.user_message(), "name is required");
    }
}
