//! Shared scenario-test scaffolding: stands in for the lobby/host layer
//! that would normally spawn players and arena fixtures before handing the
//! room off to [`GameLoop`].

use std::collections::HashSet;

use arena_room_core::components::entity::{Owner, Team, Vitals};
use arena_room_core::components::utility::{Headquarters, KothZone};
use arena_room_core::components::{EntityKind, Player, Weapon};
use arena_room_core::glossary::{OrdinanceKind, WeaponAttributes};
use arena_room_core::ids::{GameId, PlayerId};
use avian2d::prelude::*;
use bevy::prelude::*;

/// A minimal always-accurate, fast-firing pistol, parameterized on damage so
/// scenarios can hit an exact per-shot number (§8 scenario 1: 40 damage).
pub fn test_weapon(damage: f32) -> Weapon {
    let attrs = WeaponAttributes {
        damage,
        fire_rate: 600.0,
        range: 1000.0,
        accuracy: 1.0,
        magazine_size: 30,
        reload_time: 1.0,
        projectile_speed: 400.0,
        bullets_per_shot: 1,
    };
    Weapon::new(attrs, OrdinanceKind::Bullet, HashSet::new())
}

/// Spawns a fully-componentized player the way the (out-of-scope) lobby
/// layer would: identity, team, a physics body avian2d can resolve
/// collisions against, and a weapon.
pub fn spawn_player(world: &mut World, game_id: u32, player_id: u32, team: u8, position: Vec2) -> Entity {
    world
        .spawn((
            GameId(game_id),
            PlayerId(player_id),
            EntityKind::Player,
            Team(team),
            Player::new(format!("p{player_id}"), team, position),
            Vitals::new(0.0),
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Dynamic,
            Collider::circle(0.5),
            LinearVelocity::default(),
            test_weapon(40.0),
        ))
        .id()
}

pub fn spawn_headquarters(world: &mut World, game_id: u32, team: u8, position: Vec2, max_health: f32) -> Entity {
    world
        .spawn((
            GameId(game_id),
            EntityKind::Headquarters,
            Team(team),
            Vitals::with_max_health(max_health, 0.0),
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Static,
            Collider::circle(3.0),
            Headquarters {
                team,
                max_health,
                total_damage_taken: 0.0,
            },
        ))
        .id()
}

pub fn spawn_koth_zone(world: &mut World, game_id: u32, position: Vec2, radius: f32) -> Entity {
    world
        .spawn((
            GameId(game_id),
            EntityKind::KothZone,
            Transform::from_translation(position.extend(0.0)),
            KothZone::new(0, radius),
        ))
        .id()
}

/// Makes `attacker_id` responsible for `target`'s most recent damage,
/// standing in for a collision the test doesn't want to drive through real
/// physics contact detection.
pub fn set_last_damage_source(world: &mut World, target: Entity, attacker_id: GameId, attacker_team: Team) {
    let mut player = world.get_mut::<Player>(target).unwrap();
    player.last_damage_source = Some((attacker_id, attacker_team));
}

pub fn owner(id: u32, team: u8) -> Owner {
    Owner {
        id: GameId(id),
        team: Team(team),
    }
}
