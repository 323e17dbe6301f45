//! Outbound command gateway.
//!
//! The only path by which a caller may inject a request into the duplex
//! channel. A command is accepted only while the connection is usable;
//! rejection is synchronous and recorded, never silently queued.

use std::sync::Arc;

use agrolink_core::{ClientCommand, ClientError, ConnectionStatus};
use tokio::sync::mpsc;
use tracing::debug;

use crate::shared::ClientShared;
use crate::store::AgentResultStore;

/// Status-gated entry point for outbound commands.
#[derive(Clone, Debug)]
pub struct CommandGateway {
    shared: Arc<ClientShared>,
    store: AgentResultStore,
    outbound: mpsc::Sender<String>,
}

impl CommandGateway {
    /// Create a gateway over the supervisor's outbound channel.
    pub(crate) fn new(
        shared: Arc<ClientShared>,
        store: AgentResultStore,
        outbound: mpsc::Sender<String>,
    ) -> Self {
        Self {
            shared,
            store,
            outbound,
        }
    }

    /// Send a command over the connection.
    ///
    /// Requires status `Connected` and a live writer. The command is
    /// serialized exactly once. On rejection the error is recorded into
    /// `last_error` and returned; nothing is queued or retried.
    pub fn send(&self, command: &ClientCommand) -> Result<(), ClientError> {
        let status = self.shared.status();
        if status != ConnectionStatus::Connected {
            let err = ClientError::NotConnected {
                status: status.to_string(),
            };
            self.shared.record_error(err.to_string());
            return Err(err);
        }

        let frame = command.encode()?;
        self.outbound.try_send(frame).map_err(|e| {
            let err = match e {
                mpsc::error::TrySendError::Full(_) => ClientError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => ClientError::ChannelClosed,
            };
            self.shared.record_error(err.to_string());
            err
        })?;

        if matches!(
            command,
            ClientCommand::ImageAnalysis { .. } | ClientCommand::CustomScenario { .. }
        ) {
            // A new analysis supersedes every previous result.
            self.store.clear();
            self.shared.set_analyzing(true);
            debug!("analysis request submitted, result store cleared");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn gateway_with(
        status: ConnectionStatus,
        capacity: usize,
    ) -> (CommandGateway, mpsc::Receiver<String>, Arc<ClientShared>) {
        let shared = Arc::new(ClientShared::new());
        shared.set_status(status);
        let (tx, rx) = mpsc::channel(capacity);
        let gateway = CommandGateway::new(shared.clone(), AgentResultStore::new(), tx);
        (gateway, rx, shared)
    }

    #[tokio::test]
    async fn send_while_connected() {
        let (gateway, mut rx, _) = gateway_with(ConnectionStatus::Connected, 8);
        gateway.send(&ClientCommand::Ping).unwrap();
        assert_eq!(rx.recv().await.unwrap(), r#"{"type":"ping"}"#);
    }

    #[tokio::test]
    async fn rejected_while_reconnecting() {
        let (gateway, mut rx, shared) = gateway_with(ConnectionStatus::Reconnecting, 8);
        let err = gateway.send(&ClientCommand::Ping).unwrap_err();
        assert_matches!(err, ClientError::NotConnected { status } if status == "reconnecting");
        // Nothing reached the transport.
        assert!(rx.try_recv().is_err());
        // And the rejection is observable.
        assert!(
            shared
                .snapshot()
                .last_error
                .unwrap()
                .contains("not connected")
        );
    }

    #[tokio::test]
    async fn rejected_while_failed() {
        let (gateway, _rx, _) = gateway_with(ConnectionStatus::Failed, 8);
        let err = gateway.send(&ClientCommand::Ping).unwrap_err();
        assert_matches!(err, ClientError::NotConnected { .. });
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let (gateway, rx, shared) = gateway_with(ConnectionStatus::Connected, 8);
        drop(rx);
        let err = gateway.send(&ClientCommand::Ping).unwrap_err();
        assert_matches!(err, ClientError::ChannelClosed);
        assert!(shared.snapshot().last_error.is_some());
    }

    #[tokio::test]
    async fn full_channel_is_backpressure() {
        let (gateway, _rx, _) = gateway_with(ConnectionStatus::Connected, 1);
        gateway.send(&ClientCommand::Ping).unwrap();
        let err = gateway.send(&ClientCommand::Ping).unwrap_err();
        assert_matches!(err, ClientError::Backpressure);
    }

    #[tokio::test]
    async fn analysis_request_clears_store_and_sets_flag() {
        let (gateway, mut rx, shared) = gateway_with(ConnectionStatus::Connected, 8);
        gateway.store.upsert("SoilSense", json!({"ph": 6.7}));

        gateway
            .send(&ClientCommand::CustomScenario {
                image_description: "hojas sanas".into(),
                environment_description: "pH 6.7".into(),
            })
            .unwrap();

        assert!(gateway.store.is_empty());
        assert!(shared.is_analyzing());
        let frame = rx.recv().await.unwrap();
        assert!(frame.contains("custom_scenario"));
    }

    #[tokio::test]
    async fn rejected_analysis_leaves_store_intact() {
        let (gateway, _rx, _) = gateway_with(ConnectionStatus::Disconnected, 8);
        gateway.store.upsert("CropMaster", json!({"risk": "low"}));

        let _ = gateway
            .send(&ClientCommand::ImageAnalysis {
                image_data: "aGk=".into(),
                environment_description: "seco".into(),
            })
            .unwrap_err();

        assert_eq!(gateway.store.len(), 1);
    }

    #[tokio::test]
    async fn ping_does_not_clear_store() {
        let (gateway, _rx, shared) = gateway_with(ConnectionStatus::Connected, 8);
        gateway.store.upsert("AgriVision", json!({"ok": true}));
        gateway.send(&ClientCommand::Ping).unwrap();
        assert_eq!(gateway.store.len(), 1);
        assert!(!shared.is_analyzing());
    }
}
