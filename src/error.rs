//! Error types for the transport.

use crate::types::RoutingKey;
use thiserror::Error;

/// Boxed error raised by handlers and custom subscription teardown.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Participant already active: {participant}")]
    DuplicateParticipant { participant: &'static str },

    #[error("Failed to close subscription: {source}")]
    SubscriptionClose {
        #[source]
        source: BoxError,
    },

    #[error("Handler for {key} failed: {source}")]
    Handler {
        key: RoutingKey,
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    /// Whether this error came out of a handler during dispatch.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, TransportError::Handler { .. })
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
