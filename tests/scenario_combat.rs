//! §8 end-to-end scenario 1: single-shot kill, FFA.

mod common;

use arena_room_core::components::entity::Vitals;
use arena_room_core::components::{Player, Projectile};
use arena_room_core::game_loop::GameLoop;
use arena_room_core::ids::GameId;
use arena_room_core::prelude::RoomConfig;
use bevy::prelude::*;

#[test]
fn firing_spawns_a_projectile() {
    let mut room = GameLoop::new(RoomConfig::default(), 1);
    let world = room.app_mut().world_mut();
    let shooter = common::spawn_player(world, 1, 1, 1, Vec2::ZERO);
    common::spawn_player(world, 2, 2, 2, Vec2::new(3.0, 0.0));

    // The fire-rate gate compares wall-clock time against
    // `last_shot_wall_time`, which starts at 0.0 same as the room clock
    // itself; warm up one tick first so the gate sees real elapsed time
    // before the fire request is issued.
    room.tick().unwrap();

    let world = room.app_mut().world_mut();
    world.get_mut::<Player>(shooter).unwrap().aim_unit_vector = Vec2::X;
    world.get_mut::<Player>(shooter).unwrap().fire_requested_this_tick = true;

    room.tick().unwrap();

    let world = room.app_mut().world_mut();
    let mut query = world.query::<&Projectile>();
    let count = query.iter(world).count();
    assert_eq!(count, 1, "firing should spawn exactly one projectile");
}

/// Drives three hits through the documented per-hit contract (the same
/// `Vitals::apply_damage` + `Player::last_damage_source` pair the collision
/// dispatcher uses) and checks the scoring/elimination pipeline reacts the
/// way §8 scenario 1 describes: two survivable 40-damage hits, then a third
/// that kills and credits the shooter.
#[test]
fn three_forty_damage_hits_kill_and_credit_the_shooter() {
    let mut room = GameLoop::new(RoomConfig::default(), 1);
    let world = room.app_mut().world_mut();
    let shooter = common::spawn_player(world, 1, 1, 1, Vec2::ZERO);
    let target = common::spawn_player(world, 2, 2, 2, Vec2::new(3.0, 0.0));

    for expected_health in [60.0_f32, 20.0, 0.0] {
        let world = room.app_mut().world_mut();
        world.get_mut::<Vitals>(target).unwrap().apply_damage(40.0, 0.0);
        common::set_last_damage_source(world, target, GameId(1), arena_room_core::components::entity::Team(1));
        room.tick().unwrap();
        let world = room.app_mut().world_mut();
        let health = world.get::<Vitals>(target).unwrap().health;
        assert_eq!(health, expected_health);
    }

    let world = room.app_mut().world_mut();
    let shooter_player = world.get::<Player>(shooter).unwrap();
    assert_eq!(shooter_player.kills, 1);
    let target_player = world.get::<Player>(target).unwrap();
    assert_eq!(target_player.deaths, 1);
    assert!(!world.get::<Vitals>(target).unwrap().active);
}
