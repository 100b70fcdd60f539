//! Kinetic and hitscan weapon outputs (§3 "Projectile" / "Beam").

use std::collections::HashMap;
use std::collections::HashSet;

use bevy::prelude::*;

use crate::glossary::{DamageApplication, OrdinanceKind};
use crate::ids::GameId;

use super::entity::Team;
use super::weapon::BulletEffect;

/// A physical, kinetic weapon output moving under `avian2d`'s rigid body
/// integration. No aerodynamic drag *model* (top-down arena, not a
/// ballistics range) — just a flat per-ordinance `LinearDamping` coefficient
/// (§3 Ordinance) so heavier rounds bleed off speed below `min_velocity`
/// before `ttl_seconds` expires — plus a "remember where I was last tick"
/// field for collision raycasting.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner_id: GameId,
    pub owner_team: Team,
    pub damage: f32,
    pub ttl_seconds: f32,
    pub min_velocity: f32,
    pub linear_damping: f32,
    pub bullet_effects: HashSet<BulletEffect>,
    pub ordinance: OrdinanceKind,
    pub exploded: bool,
    pub previous_position: Vec2,
}

impl Projectile {
    /// `ttl = range / speed` (§3 Projectile).
    pub fn ttl_from_range_speed(range: f32, speed: f32) -> f32 {
        if speed <= 0.0 {
            0.0
        } else {
            range / speed
        }
    }

    pub fn tick_ttl(&mut self, dt: f32) -> bool {
        self.ttl_seconds -= dt;
        self.ttl_seconds <= 0.0
    }
}

/// Hitscan/continuous weapon output (§3 "Beam").
#[derive(Component, Debug, Clone)]
pub struct Beam {
    pub start: Vec2,
    pub direction: Vec2,
    pub range: f32,
    /// Recomputed every tick by clipping against opaque obstacles (§3, §4.3).
    pub effective_end: Vec2,
    pub damage: f32,
    pub owner_id: GameId,
    pub owner_team: Team,
    pub ordinance: OrdinanceKind,
    pub bullet_effects: HashSet<BulletEffect>,
    pub application_type: DamageApplication,
    pub damage_interval: f32,
    pub duration: f32,
    pub remaining: f32,
    pub affected_players: HashSet<GameId>,
    pub last_damage_time_per_player: HashMap<GameId, f64>,
}

impl Beam {
    pub fn end_point_unclipped(&self) -> Vec2 {
        self.start + self.direction * self.range
    }

    pub fn tick_duration(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_derives_from_range_and_speed() {
        assert_eq!(Projectile::ttl_from_range_speed(1000.0, 200.0), 5.0);
        assert_eq!(Projectile::ttl_from_range_speed(1000.0, 0.0), 0.0);
    }

    #[test]
    fn beam_effective_end_defaults_to_unclipped_range() {
        let beam = Beam {
            start: Vec2::ZERO,
            direction: Vec2::X,
            range: 600.0,
            effective_end: Vec2::new(600.0, 0.0),
            damage: 10.0,
            owner_id: GameId(1),
            owner_team: Team(1),
            ordinance: OrdinanceKind::Laser,
            bullet_effects: HashSet::new(),
            application_type: DamageApplication::Dot,
            damage_interval: 0.0,
            duration: 0.5,
            remaining: 0.5,
            affected_players: HashSet::new(),
            last_damage_time_per_player: HashMap::new(),
        };
        assert_eq!(beam.end_point_unclipped(), Vec2::new(600.0, 0.0));
        // §8 invariant: effective_end lies on [start, start + range*direction].
        let on_segment = (beam.effective_end - beam.start).dot(beam.direction) >= 0.0
            && (beam.effective_end - beam.start).length() <= beam.range + f32::EPSILON;
        assert!(on_segment);
    }
}
