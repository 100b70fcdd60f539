//! Player entity (§3 "Player").

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids::GameId;

use super::entity::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    Burning,
    Electrified,
    Frozen,
    Poisoned,
    Slowed,
}

#[derive(Component, Debug, Clone)]
pub struct Player {
    pub name: String,
    pub team: u8,
    pub utility_slot: Option<UtilityWeapon>,
    pub aim_unit_vector: Vec2,
    pub last_shot_wall_time: f64,
    pub last_utility_use_wall_time: f64,
    pub kills: u32,
    pub deaths: u32,
    pub captures: u32,
    /// `-1` means unlimited lives.
    pub lives_remaining: i32,
    pub eliminated: bool,
    pub respawn_point: Vec2,
    pub max_speed: f32,
    pub status_effects: HashSet<StatusEffect>,
    /// Seconds remaining for each active status effect; `update_turrets`'s
    /// sibling `trigger_net_traps`/`tick_status_effects` in `utility_system`
    /// are the only writers. An effect is removed from both this map and
    /// `status_effects` once its remaining time reaches zero.
    pub status_effect_timers: std::collections::HashMap<StatusEffect, f32>,
    pub is_spectator: bool,
    /// Set while `RespawnMode::Instant` counts down to reactivation.
    pub respawn_timer: Option<f32>,
    pub is_vip: bool,
    /// Intents built from the drained input queue (§4.1 step 2), consumed
    /// and cleared by `process_fire_intents`/`process_utility_intents` each
    /// tick.
    pub fire_requested_this_tick: bool,
    pub reload_requested_this_tick: bool,
    pub utility_requested_this_tick: bool,
    pub move_intent: Vec2,
    /// Id/team of whoever last damaged this player, for kill attribution at
    /// the death-detection site (§4.5 scoring; §9 HQ friendly-fire note
    /// applies the same "check at the damage-accounting site" principle to
    /// kill credit). Cleared on respawn.
    pub last_damage_source: Option<(GameId, Team)>,
}

impl Player {
    pub fn new(name: String, team: u8, respawn_point: Vec2) -> Self {
        Self {
            name,
            team,
            utility_slot: None,
            aim_unit_vector: Vec2::X,
            last_shot_wall_time: 0.0,
            last_utility_use_wall_time: 0.0,
            kills: 0,
            deaths: 0,
            captures: 0,
            lives_remaining: -1,
            eliminated: false,
            respawn_point,
            max_speed: 6.0,
            status_effects: HashSet::new(),
            status_effect_timers: std::collections::HashMap::new(),
            is_spectator: false,
            respawn_timer: None,
            is_vip: false,
            fire_requested_this_tick: false,
            reload_requested_this_tick: false,
            utility_requested_this_tick: false,
            move_intent: Vec2::ZERO,
            last_damage_source: None,
        }
    }

    /// §3 invariant: `eliminated ⇒ !active` and no respawn scheduled.
    pub fn assert_elimination_invariant(&self, active: bool) -> bool {
        !self.eliminated || (!active && self.respawn_timer.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtilityWeapon {
    TurretDeployer,
    BarrierDeployer,
    TeleportPadDeployer,
    NetLauncher,
    HealingZoneDeployer,
}

impl UtilityWeapon {
    /// Maps the `utility` field of a `configChange` message (§6) to the
    /// deployable it selects. Unrecognized names return `None` so the
    /// caller can treat them as the rule-violation class (§7: reject,
    /// retain prior state) rather than panicking on an unknown string.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            "turret" | "TurretDeployer" => Some(Self::TurretDeployer),
            "barrier" | "BarrierDeployer" => Some(Self::BarrierDeployer),
            "teleportPad" | "TeleportPadDeployer" => Some(Self::TeleportPadDeployer),
            "net" | "NetLauncher" => Some(Self::NetLauncher),
            "healingZone" | "HealingZoneDeployer" => Some(Self::HealingZoneDeployer),
            _ => None,
        }
    }
}

/// Marker component carrying the id of the weapon entity logic currently
/// attached to this player. Kept separate from `Player` so systems can
/// `Query<(&Player, &Weapon)>` without borrowing all of `Player` mutably.
#[derive(Component, Debug, Clone, Copy)]
pub struct PrimaryWeaponOwner(pub GameId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_map_to_every_utility_weapon() {
        assert_eq!(UtilityWeapon::from_wire_name("turret"), Some(UtilityWeapon::TurretDeployer));
        assert_eq!(UtilityWeapon::from_wire_name("barrier"), Some(UtilityWeapon::BarrierDeployer));
        assert_eq!(UtilityWeapon::from_wire_name("teleportPad"), Some(UtilityWeapon::TeleportPadDeployer));
        assert_eq!(UtilityWeapon::from_wire_name("net"), Some(UtilityWeapon::NetLauncher));
        assert_eq!(UtilityWeapon::from_wire_name("healingZone"), Some(UtilityWeapon::HealingZoneDeployer));
    }

    #[test]
    fn unknown_wire_name_is_rejected_not_panicked() {
        assert_eq!(UtilityWeapon::from_wire_name("not-a-real-utility"), None);
    }
}
