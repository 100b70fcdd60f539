//! §8 end-to-end scenario 5: destroying the enemy headquarters ends the
//! game immediately when `headquarters_destruction_ends_game` is set.

mod common;

use arena_room_core::components::entity::Team;
use arena_room_core::game_loop::GameLoop;
use arena_room_core::prelude::RoomConfig;
use arena_room_core::systems::collision::{HqDamageEvents, HqDamageRecord};
use arena_room_core::systems::rule_system::{RoomPhase, RuleState};
use bevy::prelude::*;

#[test]
fn destroying_headquarters_ends_the_game_and_credits_the_attacker() {
    let config = RoomConfig {
        headquarters_destruction_ends_game: true,
        headquarters_destruction_bonus: 100.0,
        headquarters_points_per_damage: 0.1,
        ..Default::default()
    };
    let mut room = GameLoop::new(config, 1);
    let world = room.app_mut().world_mut();
    common::spawn_headquarters(world, 1, 2, Vec2::new(20.0, 0.0), 500.0);
    world.resource_mut::<HqDamageEvents>().0.push(HqDamageRecord {
        attacker_team: Team(1),
        damage: 1000.0,
        destroyed: true,
    });

    room.tick().unwrap();

    let world = room.app_mut().world_mut();
    let state = world.resource::<RuleState>();
    assert_eq!(state.phase, RoomPhase::GameOver);
    assert_eq!(state.winning_team, Some(1));
    assert!(!state.draw);
    assert_eq!(*state.hq_bonus.get(&1).unwrap(), 200.0);
}
