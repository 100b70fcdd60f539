//! Area-of-effect damage/heal/debuff sources (§3 "Field Effect").

use bevy::prelude::*;

use crate::ids::GameId;

use super::entity::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldEffectType {
    Explosion,
    Fire,
    Electric,
    Freeze,
    Poison,
    /// Visual-only, spawned by `BulletEffectProcessor` fragmenting (§4.4 step 1).
    Fragmentation,
    WarningZone,
    Earthquake,
    /// Healing zones deployed by `UtilitySystem` (§2 "Deploys ... healing
    /// zones"). Not part of the bullet-effect expansion catalog in §3; it
    /// reuses the same radius/duration/`damage_per_tick` machinery with a
    /// negative rate instead of inventing a parallel healing-zone type.
    Heal,
}

impl FieldEffectType {
    /// Whether this type applies its effect once on spawn (explosions,
    /// fragmentation bursts) or continuously every tick it remains active.
    pub fn is_instantaneous(self) -> bool {
        matches!(
            self,
            FieldEffectType::Explosion | FieldEffectType::Fragmentation
        )
    }

    pub fn default_duration(self) -> f32 {
        match self {
            FieldEffectType::Explosion => 0.0,
            FieldEffectType::Fragmentation => 0.0,
            FieldEffectType::Fire => 4.0,
            FieldEffectType::Electric => 2.0,
            FieldEffectType::Freeze => 3.0,
            FieldEffectType::Poison => 5.0,
            FieldEffectType::WarningZone => 5.0,
            FieldEffectType::Earthquake => 3.0,
            FieldEffectType::Heal => 10.0,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct FieldEffect {
    pub kind: FieldEffectType,
    pub center: Vec2,
    pub radius: f32,
    pub damage_per_tick: f32,
    pub duration: f32,
    pub remaining: f32,
    pub owner_id: GameId,
    pub owner_team: Team,
    /// Set true the tick after an instantaneous effect applies, so cleanup
    /// removes it without a second damage application.
    pub applied_once: bool,
}

impl FieldEffect {
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}
