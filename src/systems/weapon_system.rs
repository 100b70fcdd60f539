//! Fire-rate gating, ammo, reload, projectile spread, and beam spawning
//! (§4.3 WeaponSystem).

use avian2d::prelude::*;
use bevy::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::collections::HashSet;

use crate::components::entity::{Owner, Team, Vitals};
use crate::components::weapon::BulletEffect;
use crate::components::{Beam, EntityKind, Player, Projectile, Weapon};
use crate::config::FIXED_DT;
use crate::glossary::{DamageApplication, OrdinanceKind};
use crate::ids::{GameId, IdAllocator};
use crate::resources::{RoomClock, RoomRng};

/// One fully-resolved spawn request produced by [`resolve_fire`]; kept
/// separate from the Bevy `Commands`-issuing system so the spread/jitter
/// math is independently unit-testable without a `World`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpawn {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub ttl: f32,
    pub min_velocity: f32,
    pub linear_damping: f32,
    pub bullet_effects: HashSet<BulletEffect>,
    pub ordinance: OrdinanceKind,
    pub owner_id: GameId,
    pub owner_team: Team,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamSpawn {
    pub start: Vec2,
    pub direction: Vec2,
    pub range: f32,
    pub damage: f32,
    pub bullet_effects: HashSet<BulletEffect>,
    pub ordinance: OrdinanceKind,
    pub owner_id: GameId,
    pub owner_team: Team,
    pub application_type: DamageApplication,
    pub damage_interval: f32,
    pub duration: f32,
}

pub enum FireOutput {
    Projectiles(Vec<ProjectileSpawn>),
    Beam(BeamSpawn),
    /// Fire gate failed (cooldown, no ammo, reloading, inactive).
    None,
}

/// §4.3 "Projectile fire" / "Beam fire". Pure function: given the weapon's
/// resolved attributes and an aim direction, decides what (if anything) to
/// spawn, and mutates ammo/reload state in place.
pub fn resolve_fire(
    weapon: &mut Weapon,
    owner_id: GameId,
    owner_team: Team,
    origin: Vec2,
    aim_direction: Vec2,
    now_wall: f64,
    last_shot_wall_time: &mut f64,
    active: bool,
    rng: &mut impl Rng,
) -> FireOutput {
    if !weapon.can_fire(now_wall, *last_shot_wall_time, active) {
        if weapon.current_ammo <= 0 && !weapon.reloading {
            weapon.begin_reload();
        }
        return FireOutput::None;
    }

    *last_shot_wall_time = now_wall;
    let attrs = &weapon.attributes;

    if weapon.ordinance.is_beam() {
        let profile = crate::glossary::ordinance_profile(weapon.ordinance);
        weapon.consume_ammo(1);
        return FireOutput::Beam(BeamSpawn {
            start: origin,
            direction: aim_direction,
            range: attrs.range * 0.6,
            damage: attrs.damage,
            bullet_effects: weapon.bullet_effects.clone(),
            ordinance: weapon.ordinance,
            owner_id,
            owner_team,
            application_type: profile.damage_application,
            damage_interval: profile.damage_interval,
            duration: profile.beam_duration,
        });
    }

    let bullets = attrs.bullets_per_shot.min(weapon.current_ammo).max(0) as usize;
    if bullets == 0 {
        return FireOutput::None;
    }
    weapon.consume_ammo(bullets as i32);
    let profile = crate::glossary::ordinance_profile(weapon.ordinance);

    let spread = (1.0 - attrs.accuracy) * 0.17;
    let spread_dist = Uniform::new_inclusive(-spread, spread);
    let jitter_dist = Uniform::new_inclusive(-3.0_f32, 3.0);

    let mut spawns = Vec::with_capacity(bullets);
    for i in 0..bullets {
        let angle_offset = spread_dist.sample(rng);
        let direction = Vec2::from_angle(aim_direction.to_angle() + angle_offset);
        let position = if i == 0 {
            origin
        } else {
            origin + Vec2::new(jitter_dist.sample(rng), jitter_dist.sample(rng))
        };
        spawns.push(ProjectileSpawn {
            position,
            direction,
            speed: attrs.projectile_speed,
            damage: attrs.damage,
            ttl: Projectile::ttl_from_range_speed(attrs.range, attrs.projectile_speed),
            min_velocity: attrs.projectile_speed * 0.1,
            linear_damping: profile.linear_damping,
            bullet_effects: weapon.bullet_effects.clone(),
            ordinance: weapon.ordinance,
            owner_id,
            owner_team,
        });
    }
    FireOutput::Projectiles(spawns)
}

/// Advances ammo.current reload timers for every weapon in the room (§4.3
/// "Reload"). Runs once per tick using `dt`, independent of the fire-rate
/// gate which is wall-clock based.
pub fn tick_reloads(mut weapons: Query<&mut Weapon>) {
    for mut weapon in weapons.iter_mut() {
        weapon.tick_reload(FIXED_DT);
    }
}

/// Manual reload requests from `{reload:true}` input (§6 inbound contract).
pub fn process_reload_requests(mut players: Query<(&mut Player, &mut Weapon)>) {
    for (mut player, mut weapon) in players.iter_mut() {
        if player.reload_requested_this_tick {
            player.reload_requested_this_tick = false;
            weapon.begin_reload();
        }
    }
}

/// Drives player fire-intent (built from drained input, §4.1 step 2) into
/// spawned projectile/beam entities.
pub fn process_fire_intents(
    mut commands: Commands,
    mut allocator: ResMut<IdAllocator>,
    mut rng: ResMut<RoomRng>,
    clock: Res<RoomClock>,
    mut players: Query<(&mut Player, &mut Weapon, &Transform, &Vitals, &GameId)>,
) {
    for (mut player, mut weapon, transform, vitals, owner_id) in players.iter_mut() {
        if !player.fire_requested_this_tick {
            continue;
        }
        player.fire_requested_this_tick = false;
        let owner_team = Team(player.team);
        let origin = transform.translation.truncate();
        let aim = player.aim_unit_vector;
        let owner_id = *owner_id;
        let mut last_shot = player.last_shot_wall_time;
        let output = resolve_fire(
            &mut weapon,
            owner_id,
            owner_team,
            origin,
            aim,
            clock.wall_time,
            &mut last_shot,
            vitals.active,
            &mut rng.0,
        );
        player.last_shot_wall_time = last_shot;

        match output {
            FireOutput::Projectiles(spawns) => {
                for spawn in spawns {
                    spawn_projectile(&mut commands, &mut allocator, &spawn, clock.game_time);
                }
            }
            FireOutput::Beam(spawn) => {
                spawn_beam(&mut commands, &mut allocator, &spawn);
            }
            FireOutput::None => {}
        }
    }
}

pub(crate) fn spawn_projectile(commands: &mut Commands, allocator: &mut IdAllocator, spawn: &ProjectileSpawn, now: f64) {
    let id = allocator.alloc_entity();
    let profile = crate::glossary::ordinance_profile(spawn.ordinance);
    commands.spawn((
        id,
        EntityKind::Projectile,
        Owner {
            id: spawn.owner_id,
            team: spawn.owner_team,
        },
        Vitals::new(now),
        Transform::from_translation(spawn.position.extend(0.0)),
        RigidBody::Dynamic,
        Collider::circle(profile.size),
        ExternalForce::default(),
        LinearVelocity(spawn.direction * spawn.speed),
        LinearDamping(spawn.linear_damping),
        Projectile {
            owner_id: spawn.owner_id,
            owner_team: spawn.owner_team,
            damage: spawn.damage,
            ttl_seconds: spawn.ttl,
            min_velocity: spawn.min_velocity,
            linear_damping: spawn.linear_damping,
            bullet_effects: spawn.bullet_effects.clone(),
            ordinance: spawn.ordinance,
            exploded: false,
            previous_position: spawn.position,
        },
    ));
}

fn spawn_beam(commands: &mut Commands, allocator: &mut IdAllocator, spawn: &BeamSpawn) {
    let id = allocator.alloc_entity();
    commands.spawn((
        id,
        EntityKind::Beam,
        Beam {
            start: spawn.start,
            direction: spawn.direction,
            range: spawn.range,
            effective_end: spawn.start + spawn.direction * spawn.range,
            damage: spawn.damage,
            owner_id: spawn.owner_id,
            owner_team: spawn.owner_team,
            ordinance: spawn.ordinance,
            bullet_effects: spawn.bullet_effects.clone(),
            application_type: spawn.application_type,
            damage_interval: spawn.damage_interval,
            duration: spawn.duration,
            remaining: spawn.duration,
            affected_players: HashSet::new(),
            last_damage_time_per_player: std::collections::HashMap::new(),
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary::WeaponAttributes;
    use rand::SeedableRng;

    fn rifle_weapon() -> Weapon {
        let attrs = WeaponAttributes {
            damage: 25.0,
            fire_rate: 10.0,
            range: 1000.0,
            accuracy: 0.9,
            magazine_size: 30,
            reload_time: 2.0,
            projectile_speed: 400.0,
            bullets_per_shot: 1,
        };
        Weapon::new(attrs, OrdinanceKind::Bullet, HashSet::new())
    }

    #[test]
    fn fire_at_zero_ammo_begins_reload_and_spawns_nothing() {
        let mut weapon = rifle_weapon();
        weapon.current_ammo = 0;
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut last_shot = 0.0;
        let out = resolve_fire(
            &mut weapon,
            GameId(1),
            Team(1),
            Vec2::ZERO,
            Vec2::X,
            1.0,
            &mut last_shot,
            true,
            &mut rng,
        );
        assert!(matches!(out, FireOutput::None));
        assert!(weapon.reloading);
    }

    #[test]
    fn bullets_per_shot_greater_than_ammo_emits_exactly_ammo_count() {
        let mut weapon = rifle_weapon();
        weapon.current_ammo = 2;
        weapon.attributes.bullets_per_shot = 5;
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut last_shot = 0.0;
        let out = resolve_fire(
            &mut weapon,
            GameId(1),
            Team(1),
            Vec2::ZERO,
            Vec2::X,
            1.0,
            &mut last_shot,
            true,
            &mut rng,
        );
        match out {
            FireOutput::Projectiles(spawns) => assert_eq!(spawns.len(), 2),
            _ => panic!("expected projectiles"),
        }
        assert_eq!(weapon.current_ammo, 0);
    }

    #[test]
    fn projectile_spawns_carry_the_ordinances_linear_damping() {
        let mut weapon = rifle_weapon();
        weapon.ordinance = OrdinanceKind::Grenade;
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut last_shot = 0.0;
        let out = resolve_fire(&mut weapon, GameId(1), Team(1), Vec2::ZERO, Vec2::X, 1.0, &mut last_shot, true, &mut rng);
        match out {
            FireOutput::Projectiles(spawns) => {
                let profile = crate::glossary::ordinance_profile(OrdinanceKind::Grenade);
                assert_eq!(spawns[0].linear_damping, profile.linear_damping);
                assert!(spawns[0].linear_damping > 0.0);
            }
            _ => panic!("expected projectiles"),
        }
    }

    #[test]
    fn fire_rate_gate_blocks_immediate_refire() {
        let mut weapon = rifle_weapon();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut last_shot = 0.0;
        let _ = resolve_fire(&mut weapon, GameId(1), Team(1), Vec2::ZERO, Vec2::X, 1.0, &mut last_shot, true, &mut rng);
        let second = resolve_fire(&mut weapon, GameId(1), Team(1), Vec2::ZERO, Vec2::X, 1.001, &mut last_shot, true, &mut rng);
        assert!(matches!(second, FireOutput::None));
    }
}
