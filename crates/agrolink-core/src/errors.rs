//! Error hierarchy for the AgroLink client.
//!
//! Nothing in the connection subsystem is fatal to the process: every
//! failure path ends in an observable `ConnectionState` rather than an
//! uncaught panic. These types classify the failures along the way.

use thiserror::Error;

/// Errors produced by the AgroLink client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not be opened.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The transport neither opened nor errored within the configured
    /// connect timeout.
    #[error("connect timed out after {0} ms")]
    ConnectTimeout(u64),

    /// A send was attempted while the connection was not usable.
    #[error("not connected (status: {status})")]
    NotConnected {
        /// The status observed at rejection time.
        status: String,
    },

    /// An inbound frame could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The outbound channel to the socket writer is gone.
    #[error("outbound channel closed")]
    ChannelClosed,

    /// The outbound channel is full; the command was not queued.
    #[error("outbound channel full")]
    Backpressure,

    /// The retry ceiling was exceeded; manual reconnect required.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Consecutive failures observed.
        attempts: u32,
        /// The error that ended the final attempt.
        last_error: String,
    },

    /// An HTTP collaborator call failed.
    #[error("http request failed: {0}")]
    Http(String),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}
