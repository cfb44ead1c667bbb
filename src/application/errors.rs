//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// Top-level errors, fatal at startup.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Floor-price lookup errors, converted to user-facing replies at the
/// controller boundary.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("collection not found")]
    NotFound,

    #[error("rate limited by marketplace")]
    RateLimited { retry_after: Option<Duration> },

    #[error("marketplace unavailable: {0}")]
    Upstream(String),
}

/// Errors from sending a reply through the gateway.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("gateway session is not ready")]
    NotReady,

    #[error("reply rejected: {0}")]
    Rejected(String),
}

/// Gateway transport errors. Handled inside the session manager's reconnect
/// loop; never surfaced to the controller.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Configuration errors. The only fatal class, at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("parse error: {0}")]
    Parse(String),
}
