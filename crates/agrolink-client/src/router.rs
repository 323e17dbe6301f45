//! Inbound frame routing.
//!
//! One decoded frame, exactly one handler. Decode failures are recorded
//! and skipped; they never change connection status and never tear the
//! connection down.

use agrolink_core::InboundMessage;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::events::ClientEvent;
use crate::shared::ClientShared;
use crate::store::AgentResultStore;

/// Route one inbound text frame.
///
/// - `agent_result` → upsert into the store, emit [`ClientEvent::AgentResult`]
/// - `status` → emit the text; clear the analyzing flag when the text
///   carries `completion_marker`
/// - `pong` → trace only
/// - `error` → record into `last_error`, status untouched
/// - unknown discriminant → trace only, forward-compatible no-op
pub fn route_frame(
    text: &str,
    shared: &ClientShared,
    store: &AgentResultStore,
    events: &mpsc::UnboundedSender<ClientEvent>,
    completion_marker: &str,
) {
    let message = match InboundMessage::decode(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "dropping malformed frame");
            shared.record_error(e.to_string());
            return;
        }
    };

    match message {
        InboundMessage::AgentResult { agent, data } => {
            debug!(agent, "agent result received");
            store.upsert(&agent, data.clone());
            let _ = events.send(ClientEvent::AgentResult { agent, data });
        }
        InboundMessage::Status { message } => {
            if message.contains(completion_marker) {
                shared.set_analyzing(false);
                let _ = events.send(ClientEvent::AnalysisComplete);
            }
            let _ = events.send(ClientEvent::StatusText { message });
        }
        InboundMessage::Scenario { data } => {
            let _ = events.send(ClientEvent::Scenario { data });
        }
        InboundMessage::Pong => {
            trace!("pong received");
        }
        InboundMessage::Error { message } => {
            warn!(message, "backend reported an error");
            shared.record_error(message.clone());
            let _ = events.send(ClientEvent::BackendError { message });
        }
        InboundMessage::Unknown { raw } => {
            debug!(frame = %raw, "ignoring frame with unknown type");
        }
    }
}
