use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use mystery_types::events::GatewayEvent;
use mystery_types::models::Character;

/// Identifies one live WebSocket connection.
pub type ConnectionId = Uuid;

/// Owns every live connection's outbound queue and the per-session
/// channel membership. Cheap to clone; all clones share state.
///
/// Delivery is best-effort: an event is pushed onto each subscriber's queue
/// and forgotten. Nothing is acknowledged or replayed, and a connection that
/// is gone by the time of the push is skipped.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

// Lock order: `rooms` before `connections`.
#[derive(Default)]
struct DispatcherInner {
    /// Outbound queue per live connection: conn_id -> sender
    connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<GatewayEvent>>>,

    /// Channel membership: session_id -> conn_ids
    rooms: RwLock<HashMap<Uuid, HashSet<ConnectionId>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new live connection. Returns (conn_id, receiver).
    pub async fn register_connection(&self) -> (ConnectionId, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.write().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    /// Drop a connection's queue and every membership it held.
    pub async fn unregister_connection(&self, conn_id: ConnectionId) {
        let mut rooms = self.inner.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
        self.inner.connections.write().await.remove(&conn_id);
    }

    /// Subscribe a connection to a session's channel. Returns false if the
    /// connection is not registered. Joining twice is a no-op.
    pub async fn join(&self, conn_id: ConnectionId, session_id: Uuid) -> bool {
        let mut rooms = self.inner.rooms.write().await;
        if !self.inner.connections.read().await.contains_key(&conn_id) {
            return false;
        }
        rooms.entry(session_id).or_default().insert(conn_id);
        true
    }

    /// Send an event to one connection only.
    pub async fn send_to_connection(&self, conn_id: ConnectionId, event: GatewayEvent) {
        let connections = self.inner.connections.read().await;
        if let Some(tx) = connections.get(&conn_id) {
            let _ = tx.send(event);
        }
    }

    /// Push an event to every subscriber of `session_id`.
    /// Returns how many queues accepted it.
    pub async fn publish(&self, session_id: Uuid, event: GatewayEvent) -> usize {
        let members: Vec<ConnectionId> = match self.inner.rooms.read().await.get(&session_id) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let connections = self.inner.connections.read().await;
        let delivered = members
            .iter()
            .filter_map(|id| connections.get(id))
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count();

        debug!("{} -> session {}: {}/{} subscribers", event.kind(), session_id, delivered, members.len());
        delivered
    }

    pub async fn publish_phase_change(&self, session_id: Uuid, phase: i64) -> usize {
        self.publish(session_id, GatewayEvent::PhaseUpdated(phase)).await
    }

    /// Fan a freshly stored character out to its session's channel.
    pub async fn publish_character_created(&self, character: &Character) -> usize {
        self.publish(character.session_id, GatewayEvent::CharacterCreated(character.clone()))
            .await
    }

    /// Number of connections currently subscribed to `session_id`.
    pub async fn member_count(&self, session_id: Uuid) -> usize {
        self.inner
            .rooms
            .read()
            .await
            .get(&session_id)
            .map_or(0, HashSet::len)
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }
}
