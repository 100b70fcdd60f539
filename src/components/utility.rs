//! Deployed utilities: turrets, teleport pads, nets, KOTH zones, workshops,
//! power-ups, headquarters, flags (§3 "Deployed utilities").

use std::collections::HashMap;
use std::collections::HashSet;

use bevy::prelude::*;

use crate::ids::GameId;

#[derive(Component, Debug, Clone)]
pub struct Turret {
    pub detection_range: f32,
    pub fire_rate: f32,
    pub damage: f32,
    pub target: Option<GameId>,
    pub expires: f32,
    pub last_shot_wall_time: f64,
}

#[derive(Component, Debug, Clone)]
pub struct TeleportPad {
    pub activation_radius: f32,
    pub cooldown: f32,
    pub cooldown_remaining: f32,
    /// `None` until paired with a partner pad; §3 invariant: the pairing is
    /// an undirected matching (`a.partner == b ⇔ b.partner == a`).
    pub partner_id: Option<GameId>,
    pub charging: bool,
    pub recently_teleported: HashSet<GameId>,
}

/// A deployed net trap (§3 "NetProjectile" — despite the name this is a
/// stationary/ballistic deployed utility, not a [`crate::components::projectile::Projectile`]).
#[derive(Component, Debug, Clone)]
pub struct NetTrap {
    pub slow_multiplier: f32,
    pub duration: f32,
    pub pushback: f32,
    pub hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KothZoneState {
    Neutral,
    Capturing,
    Controlled,
    Contested,
}

#[derive(Component, Debug, Clone)]
pub struct KothZone {
    pub zone_index: u32,
    pub radius: f32,
    /// `-1` means no controller yet.
    pub controlling_team: i32,
    pub state: KothZoneState,
    pub capture_progress: f32,
    pub players_in_zone: HashMap<GameId, u8>,
    pub team_scores: HashMap<u8, f32>,
}

impl KothZone {
    pub fn new(zone_index: u32, radius: f32) -> Self {
        Self {
            zone_index,
            radius,
            controlling_team: -1,
            state: KothZoneState::Neutral,
            capture_progress: 0.0,
            players_in_zone: HashMap::new(),
            team_scores: HashMap::new(),
        }
    }

    /// §8 round-trip: resets to `controlling_team=-1, state=NEUTRAL, progress=0`.
    pub fn reset(&mut self) {
        self.controlling_team = -1;
        self.state = KothZoneState::Neutral;
        self.capture_progress = 0.0;
        self.players_in_zone.clear();
    }

    /// Strict-majority dominant team among current occupants, or `None` if
    /// contested/empty (§4.5 "KOTH per-zone update").
    pub fn dominant_team(&self) -> Option<u8> {
        let mut counts: HashMap<u8, u32> = HashMap::new();
        for team in self.players_in_zone.values() {
            *counts.entry(*team).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return None;
        }
        let total: u32 = counts.values().sum();
        let (&team, &count) = counts.iter().max_by_key(|(_, c)| **c).unwrap();
        if (count as f32) > (total as f32) / 2.0 {
            Some(team)
        } else {
            None
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Workshop {
    pub craft_radius: f32,
    pub craft_time: f32,
    pub progress_per_player: HashMap<GameId, f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpType {
    Health,
    Ammo,
    Speed,
    Shield,
    Damage,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct PowerUp {
    pub kind: PowerUpType,
    pub workshop_id: Option<GameId>,
    pub duration: f32,
    pub strength: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Headquarters {
    pub team: u8,
    pub max_health: f32,
    pub total_damage_taken: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagState {
    AtHome,
    Carried,
    Dropped,
}

#[derive(Component, Debug, Clone)]
pub struct Flag {
    pub owner_team: u8,
    pub home: Vec2,
    /// `None` means not currently carried.
    pub carried_by: Option<GameId>,
    pub state: FlagState,
}
