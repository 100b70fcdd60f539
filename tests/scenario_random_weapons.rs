//! §8 end-to-end scenario 6: random weapon rotation never hands out a
//! healing-classified loadout, sampled across ~1000 rotations.

mod common;

use arena_room_core::components::Weapon;
use arena_room_core::game_loop::GameLoop;
use arena_room_core::glossary::OrdinanceKind;
use arena_room_core::prelude::RoomConfig;
use bevy::prelude::*;

#[test]
fn random_weapon_rotation_excludes_healing_loadouts() {
    let config = RoomConfig {
        enable_random_weapons: true,
        random_weapon_interval: 1.0 / 60.0,
        ..Default::default()
    };
    let mut room = GameLoop::new(config, 99);
    let world = room.app_mut().world_mut();
    let player = common::spawn_player(world, 1, 1, 1, Vec2::ZERO);

    let mut observed_ordinances = std::collections::HashSet::new();
    for _ in 0..1000 {
        room.tick().unwrap();
        let ordinance = room.app_mut().world_mut().get::<Weapon>(player).unwrap().ordinance;
        assert_ne!(
            ordinance,
            OrdinanceKind::HealBeam,
            "rotation must never hand out a healing-classified ordinance"
        );
        observed_ordinances.insert(ordinance);
    }
    assert!(
        observed_ordinances.len() > 1,
        "a 1000-rotation sample should have seen more than one non-healing preset"
    );
}
