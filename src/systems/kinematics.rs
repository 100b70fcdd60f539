//! Per-tick projectile/beam bookkeeping that rides alongside the `avian2d`
//! rigid-body step: TTL/velocity-floor dismissal, beam obstacle clipping,
//! and homing steering (§4.1 step 3/5, §4.4 step 5).
//!
//! Keeps a "store previous_position, then integrate" shape for raycast-style
//! collision capture, but the actual force integration is delegated to
//! `avian2d::LinearVelocity`; this module only adds the game-specific
//! decisions the physics engine doesn't know about.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::components::entity::{Team, Vitals};
use crate::components::weapon::BulletEffect;
use crate::components::{Beam, Obstacle, Projectile};
use crate::config::FIXED_DT;

/// Minimum speed below which `HOMING` no longer applies steering (§4.4 step 5).
pub const HOMING_VELOCITY_FLOOR: f32 = 20.0;
pub const HOMING_DISTANCE: f32 = 250.0;
pub const HOMING_STEER_FORCE: f32 = 400.0;

/// Advances projectile TTL, dismisses on TTL expiry or falling below the
/// ordinance-specific velocity floor (§3 Projectile dismissal triggers),
/// and records the dismissal for `BulletEffectProcessor` expansion exactly
/// like a hit dismissal would (§4.1 step 5/6). A projectile already marked
/// `exploded` this tick by the collision dispatcher is skipped so it is
/// never recorded twice.
pub fn apply_lifetime_dismissals(
    mut commands: Commands,
    clock: Res<crate::resources::RoomClock>,
    mut query: Query<(Entity, &Transform, &LinearVelocity, &mut Projectile)>,
    mut dismissed: ResMut<super::bullet_effects::DismissedThisTick>,
) {
    let now = clock.game_time;
    let _ = now;
    for (entity, transform, velocity, mut projectile) in query.iter_mut() {
        if projectile.exploded {
            continue;
        }
        let expired = projectile.tick_ttl(FIXED_DT);
        let too_slow = velocity.length() < projectile.min_velocity;
        if !(expired || too_slow) {
            continue;
        }
        projectile.exploded = true;
        dismissed.0.push(super::bullet_effects::DismissedProjectile {
            position: transform.translation.truncate(),
            velocity: velocity.0,
            damage: projectile.damage,
            owner_id: projectile.owner_id,
            owner_team: projectile.owner_team,
            bullet_effects: projectile.bullet_effects.clone(),
            speed_at_dismissal: velocity.length(),
        });
        commands.entity(entity).despawn();
    }
}

/// Re-clips every beam's `effective_end` against the nearest opaque
/// obstacle along its ray, unless its ordinance pierces obstacles (§4.3
/// "Beam fire", §4.4 "Beams apply the same set minus ... BOUNCY").
pub fn clip_beams_against_obstacles(
    mut beams: Query<&mut Beam>,
    obstacles: Query<(&Transform, &Obstacle)>,
) {
    for mut beam in beams.iter_mut() {
        if beam.ordinance.pierces_obstacles() {
            beam.effective_end = beam.end_point_unclipped();
            continue;
        }
        let full_end = beam.end_point_unclipped();
        let mut closest = beam.range;
        for (transform, obstacle) in obstacles.iter() {
            if !obstacle.blocks_beams {
                continue;
            }
            let center = transform.translation.truncate();
            if let Some(dist) = ray_circle_intersection(beam.start, beam.direction, center, obstacle.bounding_radius)
            {
                if dist < closest {
                    closest = dist;
                }
            }
        }
        beam.effective_end = beam.start + beam.direction * closest;
        let _ = full_end;
    }
}

fn ray_circle_intersection(origin: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let to_center = center - origin;
    let projection = to_center.dot(direction);
    if projection < 0.0 {
        return None;
    }
    let closest_point = origin + direction * projection;
    let distance_to_center = (closest_point - center).length();
    if distance_to_center > radius {
        return None;
    }
    let half_chord = (radius * radius - distance_to_center * distance_to_center).max(0.0).sqrt();
    Some((projection - half_chord).max(0.0))
}

/// §4.4 step 5: homing steers toward the nearest enemy within
/// `HOMING_DISTANCE`, applying a perpendicular force whose side is chosen by
/// the cross-product sign.
pub fn apply_homing_steering(
    mut projectiles: Query<(&Transform, &mut ExternalForce, &LinearVelocity, &Projectile)>,
    targets: Query<(&Transform, &Team, &Vitals)>,
) {
    for (transform, mut force, velocity, projectile) in projectiles.iter_mut() {
        if !projectile.bullet_effects.contains(&BulletEffect::Homing) {
            continue;
        }
        if velocity.length() < HOMING_VELOCITY_FLOOR {
            continue;
        }
        let pos = transform.translation.truncate();
        let mut nearest: Option<(Vec2, f32)> = None;
        for (target_transform, team, vitals) in targets.iter() {
            let is_owner_team = *team == projectile.owner_team && !team.is_ffa();
            if !vitals.active || team.is_friendly_to(projectile.owner_team) || is_owner_team {
                continue;
            }
            let target_pos = target_transform.translation.truncate();
            let dist = pos.distance(target_pos);
            if dist <= HOMING_DISTANCE && nearest.map_or(true, |(_, d)| dist < d) {
                nearest = Some((target_pos, dist));
            }
        }
        let Some((target_pos, _)) = nearest else {
            continue;
        };
        let to_target = (target_pos - pos).normalize_or_zero();
        let vel_dir = velocity.0.normalize_or_zero();
        let cross = vel_dir.x * to_target.y - vel_dir.y * to_target.x;
        let perpendicular = Vec2::new(-vel_dir.y, vel_dir.x) * cross.signum();
        force.apply_force(perpendicular * HOMING_STEER_FORCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_circle_head_on() {
        let hit = ray_circle_intersection(Vec2::ZERO, Vec2::X, Vec2::new(100.0, 0.0), 10.0);
        assert!(hit.is_some());
        assert!((hit.unwrap() - 90.0).abs() < 0.5);
    }

    #[test]
    fn ray_misses_circle_behind_origin() {
        let hit = ray_circle_intersection(Vec2::ZERO, Vec2::X, Vec2::new(-100.0, 0.0), 10.0);
        assert!(hit.is_none());
    }
}
