//! Wire protocol for the analysis WebSocket.
//!
//! Frames are JSON text with a `type` discriminant field. Inbound frames
//! with an unrecognized `type` decode to [`InboundMessage::Unknown`] so that
//! new backend message kinds are forward-compatible no-ops for old clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ClientError;

/// Inbound frame types the client understands.
const KNOWN_TYPES: &[&str] = &["agent_result", "status", "scenario", "pong", "error"];

/// A decoded inbound frame from the analysis backend.
///
/// Each decoded message is transient: the router consumes it once and
/// never retains it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// One agent finished its step; `data` is the agent's opaque payload.
    AgentResult {
        /// Agent name, e.g. `"AgriVision"`, `"SoilSense"`, `"CropMaster"`.
        agent: String,
        /// Most-recent result payload for that agent.
        data: Value,
    },
    /// Human-readable progress text for the in-flight analysis.
    Status {
        /// Progress message.
        message: String,
    },
    /// The backend announced which scenario it is analyzing.
    Scenario {
        /// Scenario name and description.
        data: Value,
    },
    /// Liveness acknowledgment for a `ping` probe.
    Pong,
    /// The backend reported a non-fatal error.
    Error {
        /// Error text.
        message: String,
    },
    /// A well-formed frame with a discriminant this client does not know.
    #[serde(skip)]
    Unknown {
        /// The raw frame text, kept for logging only.
        raw: String,
    },
}

impl InboundMessage {
    /// Decode a text frame.
    ///
    /// Returns [`InboundMessage::Unknown`] for frames carrying a `type`
    /// discriminant outside [`KNOWN_TYPES`]. Frames that are not JSON
    /// objects, lack a `type` field, or carry a malformed payload for a
    /// known discriminant are decode errors.
    pub fn decode(text: &str) -> Result<Self, ClientError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ClientError::Decode(format!("invalid JSON frame: {e}")))?;

        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Err(ClientError::Decode(
                "frame missing `type` discriminant".into(),
            ));
        };

        if !KNOWN_TYPES.contains(&kind) {
            return Ok(Self::Unknown { raw: text.into() });
        }
        let kind = kind.to_owned();

        serde_json::from_value(value)
            .map_err(|e| ClientError::Decode(format!("malformed `{kind}` frame: {e}")))
    }
}

/// An outbound command sent to the analysis backend.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Heartbeat liveness probe.
    Ping,
    /// Request analysis of an uploaded image.
    ImageAnalysis {
        /// Base64-encoded image bytes.
        image_data: String,
        /// Free-text description of the growing environment.
        environment_description: String,
    },
    /// Request analysis of a described (imageless) scenario.
    CustomScenario {
        /// Free-text description of the crop as observed.
        image_description: String,
        /// Free-text description of the growing environment.
        environment_description: String,
    },
}

impl ClientCommand {
    /// Serialize this command to its wire form.
    pub fn encode(&self) -> Result<String, ClientError> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::Decode(format!("failed to encode command: {e}")))
    }
}
