use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Character;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GatewayEvent {
    /// Sent once, right after the upgrade
    Ready { connection_id: Uuid },

    /// Acknowledges a joinSession to the joining connection only
    SessionJoined(Uuid),

    /// A character was persisted in a session this connection joined
    CharacterCreated(Character),

    /// A client announced a phase change; carries the phase value only
    PhaseUpdated(i64),
}

impl GatewayEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::SessionJoined(_) => "sessionJoined",
            Self::CharacterCreated(_) => "characterCreated",
            Self::PhaseUpdated(_) => "phaseUpdated",
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GatewayCommand {
    /// Subscribe this connection to a session's channel
    JoinSession(Uuid),

    /// Relay a phase value to everyone in the session's channel
    PhaseChange { session_id: Uuid, phase: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phase_updated_carries_only_the_phase() {
        let value = serde_json::to_value(GatewayEvent::PhaseUpdated(3)).unwrap();
        assert_eq!(value, json!({ "type": "phaseUpdated", "data": 3 }));
    }

    #[test]
    fn parses_client_commands() {
        let id = Uuid::new_v4();

        let join: GatewayCommand =
            serde_json::from_value(json!({ "type": "joinSession", "data": id })).unwrap();
        assert_eq!(join, GatewayCommand::JoinSession(id));

        let phase: GatewayCommand = serde_json::from_value(
            json!({ "type": "phaseChange", "data": { "sessionId": id, "phase": 2 } }),
        )
        .unwrap();
        assert_eq!(phase, GatewayCommand::PhaseChange { session_id: id, phase: 2 });
    }

    #[test]
    fn ready_uses_camel_case_fields() {
        let id = Uuid::new_v4();
        let value = serde_json::to_value(GatewayEvent::Ready { connection_id: id }).unwrap();
        assert_eq!(value, json!({ "type": "ready", "data": { "connectionId": id } }));
    }
}
