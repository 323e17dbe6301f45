//! Client configuration.

use agrolink_core::BackoffPolicy;
use serde::{Deserialize, Serialize};

/// Default completion marker emitted by the reference backend when an
/// analysis run finishes.
pub const DEFAULT_COMPLETION_MARKER: &str = "Análisis completado";

/// Configuration for the AgroLink client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// WebSocket endpoint of the analysis backend.
    pub ws_url: String,
    /// Base URL for the HTTP collaborators (upload, history).
    pub api_base_url: String,
    /// Heartbeat probe interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// How long an open attempt may hang before it is failed, in ms.
    pub connect_timeout_ms: u64,
    /// Substring of a `status` frame that marks analysis completion.
    ///
    /// The backend signals completion only through free text; the marker
    /// is configuration rather than a hard-coded match so deployments
    /// against a localized backend can adjust it.
    pub completion_marker: String,
    /// Reconnection backoff parameters.
    pub backoff: BackoffPolicy,
    /// Capacity of the outbound command channel.
    pub outbound_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:8000/ws".into(),
            api_base_url: "http://127.0.0.1:8000".into(),
            heartbeat_interval_secs: 30,
            connect_timeout_ms: 10_000,
            completion_marker: DEFAULT_COMPLETION_MARKER.into(),
            backoff: BackoffPolicy::default(),
            outbound_buffer: 64,
        }
    }
}
