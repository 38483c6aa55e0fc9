//! Error types for the Bybit adapter

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection to {url} failed: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Connection to {url} timed out after {timeout_ms}ms")]
    ConnectionTimeout { url: String, timeout_ms: u64 },

    /// The exchange refused a subscription request. Ends the session; the
    /// reconnect loop will retry with a fresh subscription.
    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    /// A frame that could not be decoded. Recoverable; the frame is dropped.
    #[error("Failed to parse {what}: {error}")]
    Parse { what: String, error: String },

    #[error("Bybit API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The event consumer hung up. Signals adapter shutdown, not a fault.
    #[error("Event channel closed by consumer")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, AdapterError>;
