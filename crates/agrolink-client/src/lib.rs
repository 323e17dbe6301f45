//! # agrolink-client
//!
//! The resilient duplex connection manager for the AgroTech analysis
//! service, plus its read-only HTTP collaborators.
//!
//! - **Connection supervisor**: one task owning the WebSocket lifecycle —
//!   open, heartbeat, bounded-backoff reconnect, deliberate shutdown
//! - **Message router**: demultiplexes inbound frames into typed
//!   [`ClientEvent`]s and shared result state
//! - **Command gateway**: the only path by which a caller may inject an
//!   outbound request, gated on connection status
//! - **HTTP API**: image upload and analysis-history fetches, independent
//!   of the connection state machine

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod connection;
pub mod events;
pub mod gateway;
pub mod heartbeat;
pub mod router;
pub mod shared;
pub mod store;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use connection::{ClientHandle, ConnectionManager};
pub use events::ClientEvent;
pub use gateway::CommandGateway;
pub use store::AgentResultStore;
