//! JSON wire contracts (§6 EXTERNAL INTERFACES).
//!
//! The streaming-message endpoint itself (framing, the socket, the lobby
//! handshake) is an external collaborator out of scope here; this module
//! only defines the message *shapes* that cross that boundary, using
//! `serde_json` rather than a length-prefixed binary protocol, since the
//! external interface contract is explicitly JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::glossary::WeaponConfig;
use crate::ids::GameId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    Ping,
    ConfigChange {
        weapon: WeaponConfig,
        utility: String,
    },
    PlayerInput(PlayerInputMessage),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInputMessage {
    pub move_x: f32,
    pub move_y: f32,
    pub world_x: f32,
    pub world_y: f32,
    #[serde(default)]
    pub reload: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub alt_fire: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub weapon_switch: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundControl {
    Pong,
}

/// Minimal per-entity state included in a snapshot (§6 "Outbound").
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: u32,
    pub position: (f32, f32),
    pub rotation: f32,
    pub velocity: (f32, f32),
    pub health: f32,
    pub team: u8,
    pub eliminated: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileState {
    pub id: u32,
    pub position: (f32, f32),
    pub velocity: (f32, f32),
    pub ordinance: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamState {
    pub id: u32,
    pub start: (f32, f32),
    pub effective_end: (f32, f32),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEffectState {
    pub id: u32,
    pub kind: String,
    pub center: (f32, f32),
    pub radius: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericEntityState {
    pub id: u32,
    pub position: (f32, f32),
    pub health: f32,
}

#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutboundSnapshot {
    pub tick: u64,
    pub players: Vec<PlayerState>,
    pub projectiles: Vec<ProjectileState>,
    pub beams: Vec<BeamState>,
    pub field_effects: Vec<FieldEffectState>,
    pub obstacles: Vec<GenericEntityState>,
    pub turrets: Vec<GenericEntityState>,
    pub teleport_pads: Vec<GenericEntityState>,
    pub nets: Vec<GenericEntityState>,
    pub flags: Vec<GenericEntityState>,
    pub koth_zones: Vec<GenericEntityState>,
    pub workshops: Vec<GenericEntityState>,
    pub power_ups: Vec<GenericEntityState>,
    pub headquarters: Vec<GenericEntityState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Kill,
    Capture,
    Achievement,
    System,
    Team,
    Custom,
}

/// Targeting selector for an outbound event (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum EventTarget {
    All,
    Team { ids: Vec<u32> },
    Specific { ids: Vec<u32> },
    Spectators,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEvent {
    pub kind: EventKind,
    pub message: String,
    pub target: EventTarget,
    #[serde(default)]
    pub exclude: Vec<u32>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
}

impl OutboundEvent {
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::System,
            message: message.into(),
            target: EventTarget::All,
            exclude: Vec::new(),
            data: HashMap::new(),
        }
    }

    pub fn custom_for(target: EventTarget, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Custom,
            message: message.into(),
            target,
            exclude: Vec::new(),
            data: HashMap::new(),
        }
    }
}

pub fn absent_or(id: Option<GameId>) -> u32 {
    id.map(|g| g.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_round_trips_through_json() {
        let msg: InboundMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Ping));
    }

    #[test]
    fn player_input_deserializes_camel_case() {
        let json = r#"{"type":"playerInput","moveX":1.0,"moveY":0.0,"worldX":10.0,"worldY":5.0,"reload":true,"left":false,"right":false,"altFire":false,"shift":false}"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        match msg {
            InboundMessage::PlayerInput(input) => {
                assert_eq!(input.move_x, 1.0);
                assert!(input.reload);
            }
            _ => panic!("expected playerInput"),
        }
    }

    #[test]
    fn user_visible_events_never_carry_a_stack_or_type_name() {
        let event = OutboundEvent::system("room terminated");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("RoomError"));
        assert!(!json.contains("panic"));
    }
}
