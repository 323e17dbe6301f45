//! Most-recent-result store, keyed by agent name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Shared map from agent name to its most recent result payload.
///
/// The router overwrites an agent's entry on each new result (last write
/// wins, no merge); the gateway clears the whole map when a new analysis
/// request is submitted. The front end only reads.
#[derive(Clone, Debug, Default)]
pub struct AgentResultStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl AgentResultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the result for `agent`.
    pub fn upsert(&self, agent: &str, data: Value) {
        let _ = self.inner.write().insert(agent.to_owned(), data);
    }

    /// The most recent result for `agent`, if any.
    pub fn get(&self, agent: &str) -> Option<Value> {
        self.inner.read().get(agent).cloned()
    }

    /// A point-in-time copy of all results.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.inner.read().clone()
    }

    /// Remove every result.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Number of agents with a stored result.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no agent has reported yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
