//! # agrolink-core
//!
//! Foundation types for the AgroLink client.
//!
//! This crate provides the shared vocabulary the client and front end
//! depend on:
//!
//! - **Protocol frames**: [`InboundMessage`] and [`ClientCommand`], the
//!   tagged wire format spoken over the analysis WebSocket
//! - **Connection state**: [`ConnectionStatus`] and [`ConnectionState`],
//!   the single observable truth about the duplex channel
//! - **Backoff**: [`BackoffPolicy`], deterministic capped exponential
//!   delays for reconnection
//! - **Errors**: [`ClientError`] hierarchy via `thiserror`

#![deny(unsafe_code)]

pub mod backoff;
pub mod errors;
pub mod protocol;
pub mod state;

pub use backoff::BackoffPolicy;
pub use errors::ClientError;
pub use protocol::{ClientCommand, InboundMessage};
pub use state::{ConnectionState, ConnectionStatus};
