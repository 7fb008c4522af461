//! Backend port for courier-sync.
//!
//! [`DeliveryApi`] is the seam between the sync policy and the network. The
//! production implementation is [`HttpDeliveryApi`]; tests substitute a
//! scripted double.

mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::route::{DeliveryConfirmation, DeliveryPoint, LocationPing, Route};

pub use http::HttpDeliveryApi;

/// Errors reported by a [`DeliveryApi`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request never produced a response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The request took longer than the client timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Description of the failure.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}{}", body_suffix(.body))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Shortened response body.
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response payload: {message}")]
    Decode {
        /// Description of the failure.
        message: String,
    },

    /// The request could not be built.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the failure.
        message: String,
    },
}

impl RemoteError {
    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Check if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

/// Calls the courier backend exposes.
///
/// Implementations are stateless apart from connection settings: no call
/// remembers anything about a previous one.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// Fetch the authoritative current route for a courier.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a route.
    async fn fetch_current_route(&self, courier_id: &str) -> Result<Route, RemoteError>;

    /// Push a single confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error unless the backend acknowledges with a 2xx status.
    async fn confirm_delivery(&self, confirmation: &DeliveryConfirmation)
        -> Result<(), RemoteError>;

    /// Push several confirmations as one batch.
    ///
    /// # Errors
    ///
    /// Returns an error unless the backend acknowledges the whole batch.
    async fn confirm_batch(&self, confirmations: &[DeliveryConfirmation])
        -> Result<(), RemoteError>;

    /// Report the courier's position.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn send_location(&self, ping: &LocationPing) -> Result<(), RemoteError>;

    /// Fetch one delivery point.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a point.
    async fn fetch_delivery_point(&self, point_id: &str) -> Result<DeliveryPoint, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_with_body() {
        let err = RemoteError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned status 503: maintenance");
    }

    #[test]
    fn test_status_display_without_body() {
        let err = RemoteError::Status {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "backend returned status 404");
    }

    #[test]
    fn test_is_timeout() {
        let err = RemoteError::Timeout {
            message: "deadline".to_string(),
        };
        assert!(err.is_timeout());
        assert!(!RemoteError::transport("refused").is_timeout());
    }

    #[test]
    fn test_decode_display() {
        let err = RemoteError::decode("missing field `id`");
        assert!(err.to_string().contains("missing field `id`"));
    }
}
