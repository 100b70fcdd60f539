//! Room configuration: the table of fields a lobby/host can set on a room
//! before or during play (§6 "Configuration recognized by the room").
//!
//! All fields carry defaults and unknown fields are ignored, so `RoomConfig`
//! derives `Deserialize` with `#[serde(default)]` throughout — a payload
//! missing every field still deserializes to sane defaults, and a payload
//! with extra unrecognized keys (future client, older server) still parses.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreStyle {
    TotalKills,
    Objective,
    Total,
    Captures,
}

impl Default for ScoreStyle {
    fn default() -> Self {
        ScoreStyle::TotalKills
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryCondition {
    ScoreLimit,
    TimeLimit,
    Elimination,
    Endless,
}

impl Default for VictoryCondition {
    fn default() -> Self {
        VictoryCondition::Endless
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RespawnMode {
    Instant,
    Wave,
    Limited,
    Elimination,
}

impl Default for RespawnMode {
    fn default() -> Self {
        RespawnMode::Instant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventDensity {
    Sparse,
    Dense,
    Choked,
    Random,
}

impl Default for EventDensity {
    fn default() -> Self {
        EventDensity::Sparse
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentalEventKind {
    MeteorShower,
    SupplyDrop,
    VolcanicEruption,
    IonStorm,
    Earthquake,
}

fn default_true() -> bool {
    true
}

fn default_zero() -> bool {
    false
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomConfig {
    pub round_duration: f32,
    pub rest_duration: f32,
    pub flags_per_team: u32,
    pub score_style: ScoreStyle,
    pub victory_condition: VictoryCondition,
    pub score_limit: f32,
    pub time_limit: f32,
    pub sudden_death: bool,
    pub respawn_mode: RespawnMode,
    pub respawn_delay: f32,
    pub max_lives: i32,
    pub wave_respawn_interval: f32,

    pub koth_zones: u32,
    pub koth_points_per_second: f32,

    pub add_headquarters: bool,
    pub headquarters_max_health: f32,
    pub headquarters_points_per_damage: f32,
    pub headquarters_destruction_bonus: f32,
    pub headquarters_destruction_ends_game: bool,

    pub enable_vip: bool,
    pub vip_kill_points: f32,

    pub enable_random_weapons: bool,
    pub random_weapon_interval: f32,

    pub enable_random_events: bool,
    pub random_event_interval: f32,
    pub random_event_interval_variance: f32,
    pub event_warning_duration: f32,
    pub enabled_events: Vec<EnvironmentalEventKind>,
    pub meteor_shower_density: EventDensity,
    pub meteor_damage: f32,
    pub meteor_radius: f32,
    pub supply_drop_density: EventDensity,
    pub volcanic_eruption_density: EventDensity,
    pub eruption_damage: f32,
    pub eruption_radius: f32,
    pub ion_storm_density: EventDensity,
    pub ion_storm_damage: f32,
    pub earthquake_damage: f32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            round_duration: 300.0,
            rest_duration: 15.0,
            flags_per_team: 1,
            score_style: ScoreStyle::default(),
            victory_condition: VictoryCondition::default(),
            score_limit: 30.0,
            time_limit: 600.0,
            sudden_death: default_zero(),
            respawn_mode: RespawnMode::default(),
            respawn_delay: 5.0,
            max_lives: 5,
            wave_respawn_interval: 10.0,

            koth_zones: 0,
            koth_points_per_second: 1.0,

            add_headquarters: default_zero(),
            headquarters_max_health: 1000.0,
            headquarters_points_per_damage: 0.1,
            headquarters_destruction_bonus: 100.0,
            headquarters_destruction_ends_game: default_true(),

            enable_vip: default_zero(),
            vip_kill_points: 10.0,

            enable_random_weapons: default_zero(),
            random_weapon_interval: 30.0,

            enable_random_events: default_zero(),
            random_event_interval: 45.0,
            random_event_interval_variance: 0.3,
            event_warning_duration: 5.0,
            enabled_events: Vec::new(),
            meteor_shower_density: EventDensity::default(),
            meteor_damage: 40.0,
            meteor_radius: 150.0,
            supply_drop_density: EventDensity::default(),
            volcanic_eruption_density: EventDensity::default(),
            eruption_damage: 10.0,
            eruption_radius: 100.0,
            ion_storm_density: EventDensity::default(),
            ion_storm_damage: 8.0,
            earthquake_damage: 5.0,
        }
    }
}

/// Fixed simulation timestep. §4.1: `dt = 1/60 s`, never variable.
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Player input older than this is dropped (§5 cancellation/timeouts).
pub const INPUT_STALENESS_LIMIT_MS: f64 = 200.0;

/// Per-(owner, utility-class) deployment cap before the oldest is retired (§3 invariants).
pub const UTILITY_CAP_PER_OWNER: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_from_empty_object() {
        let cfg: RoomConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.round_duration, 300.0);
        assert_eq!(cfg.respawn_delay, 5.0);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let cfg: RoomConfig =
            serde_json::from_str(r#"{"scoreLimitTypo": 5, "roundDuration": 120.0}"#).unwrap();
        assert_eq!(cfg.round_duration, 120.0);
    }
}
