//! Beam damage application and lifetime (§4.3 "Beam fire", §4.4 "Beams apply
//! the same set minus PIERCING/BOUNCY/HOMING/FRAGMENTING").
//!
//! Obstacle clipping of `effective_end` happens earlier in the tick
//! (`kinematics::clip_beams_against_obstacles`); this module only applies
//! damage/healing along the already-clipped segment and retires expired
//! beams.

use bevy::prelude::*;

use crate::components::entity::{Team, Vitals};
use crate::components::{Beam, Player};
use crate::config::FIXED_DT;
use crate::glossary::DamageApplication;
use crate::ids::GameId;
use crate::resources::RoomClock;

/// Perpendicular hit tolerance around the beam segment.
pub const BEAM_HIT_RADIUS: f32 = 1.0;

fn point_in_beam(start: Vec2, end: Vec2, point: Vec2) -> bool {
    let segment = end - start;
    let len_sq = segment.length_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((point - start).dot(segment) / len_sq).clamp(0.0, 1.0)
    };
    let closest = start + segment * t;
    point.distance(closest) <= BEAM_HIT_RADIUS
}

/// Applies one tick's worth of beam damage/healing to every eligible target
/// along the beam's current (obstacle-clipped) segment (§4.3 Beam fire).
pub fn apply_beam_damage(
    clock: Res<RoomClock>,
    mut beams: Query<&mut Beam>,
    mut players: Query<(&Transform, &GameId, &Team, &mut Vitals, &mut Player)>,
) {
    let now = clock.game_time;
    for mut beam in beams.iter_mut() {
        let healing = beam.ordinance.is_healing();
        // An untouched `remaining == duration` means this is the tick the
        // beam spawned on: the only tick an `Instant` application fires.
        let is_spawn_tick = (beam.duration - beam.remaining).abs() < f32::EPSILON;
        let start = beam.start;
        let end = beam.effective_end;

        for (transform, id, team, mut vitals, mut player) in players.iter_mut() {
            if !vitals.active {
                continue;
            }
            let is_owner = *id == beam.owner_id;
            let is_ally = team.is_friendly_to(beam.owner_team) || is_owner;
            if healing != is_ally {
                continue;
            }
            let pos = transform.translation.truncate();
            if !point_in_beam(start, end, pos) {
                continue;
            }

            let magnitude = match beam.application_type {
                DamageApplication::Instant => {
                    if !is_spawn_tick {
                        continue;
                    }
                    beam.damage
                }
                DamageApplication::Dot => beam.damage / beam.duration.max(0.001) * FIXED_DT,
                DamageApplication::Burst => {
                    let last = beam
                        .last_damage_time_per_player
                        .get(id)
                        .copied()
                        .unwrap_or(f64::NEG_INFINITY);
                    if now - last < beam.damage_interval as f64 {
                        continue;
                    }
                    beam.last_damage_time_per_player.insert(*id, now);
                    beam.damage
                }
            };

            beam.affected_players.insert(*id);
            if healing {
                vitals.apply_heal(magnitude, now);
            } else {
                vitals.apply_damage(magnitude, now);
                if !vitals.active {
                    player.last_damage_source = Some((beam.owner_id, beam.owner_team));
                }
            }
        }
    }
}

/// Advances `Beam::remaining` and despawns beams whose duration has elapsed.
pub fn tick_beam_durations(mut commands: Commands, mut beams: Query<(Entity, &mut Beam)>) {
    for (entity, mut beam) in beams.iter_mut() {
        if beam.tick_duration(FIXED_DT) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_on_segment_is_hit() {
        assert!(point_in_beam(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 0.5)));
    }

    #[test]
    fn point_beyond_segment_end_is_miss() {
        assert!(!point_in_beam(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(150.0, 0.0)));
    }

    #[test]
    fn point_far_off_axis_is_miss() {
        assert!(!point_in_beam(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 20.0)));
    }
}
