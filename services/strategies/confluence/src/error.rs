//! Error types for the confluence strategy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Candle rejected at ingestion; the event is skipped, per-symbol state
    /// is untouched.
    #[error("Malformed candle for {symbol}: {detail}")]
    MalformedCandle { symbol: String, detail: String },

    /// A numerical invariant the engine cannot recover from (upstream data
    /// corruption). Fatal for the affected symbol stream.
    #[error("Numerical invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Execution error: {message}")]
    Execution { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
