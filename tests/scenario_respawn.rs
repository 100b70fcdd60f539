//! §8 end-to-end scenario 4: instant respawn timing.
//!
//! A killed player reactivates exactly `respawn_delay` seconds later, back
//! at its respawn point, with full health and a full magazine.

mod common;

use arena_room_core::components::entity::Vitals;
use arena_room_core::components::{Player, Weapon};
use arena_room_core::game_loop::GameLoop;
use arena_room_core::prelude::RoomConfig;
use bevy::prelude::*;

#[test]
fn instant_respawn_reactivates_after_respawn_delay() {
    let config = RoomConfig {
        respawn_delay: 5.0,
        ..Default::default()
    };
    let mut room = GameLoop::new(config, 1);
    let world = room.app_mut().world_mut();
    let respawn_point = Vec2::new(10.0, -4.0);
    let victim = common::spawn_player(world, 1, 1, 1, respawn_point);
    world.get_mut::<Vitals>(victim).unwrap().apply_damage(1000.0, 0.0);
    world.get_mut::<Weapon>(victim).unwrap().current_ammo = 0;

    // The tick that notices the death starts the respawn timer; it doesn't
    // reactivate the player until 5s (~300 ticks) later.
    room.tick().unwrap();
    {
        let world = room.app_mut().world_mut();
        assert!(!world.get::<Vitals>(victim).unwrap().active);
        assert!(world.get::<Player>(victim).unwrap().respawn_timer.is_some());
    }

    // Float accumulation over 300 steps of 1/60 may land the reactivating
    // tick at 299, 300 or 301; assert the timing band rather than an exact
    // tick, then assert on the reactivated state itself.
    for _ in 0..290 {
        room.tick().unwrap();
    }
    assert!(
        !room.app_mut().world_mut().get::<Vitals>(victim).unwrap().active,
        "player shouldn't reactivate well before the respawn delay elapses"
    );

    let mut reactivated_within = None;
    for i in 0..20 {
        room.tick().unwrap();
        if room.app_mut().world_mut().get::<Vitals>(victim).unwrap().active {
            reactivated_within = Some(i);
            break;
        }
    }
    assert!(
        reactivated_within.is_some(),
        "player should have reactivated within ~5s of the death tick"
    );

    let world = room.app_mut().world_mut();
    let vitals = world.get::<Vitals>(victim).unwrap();
    assert!(vitals.active, "player should reactivate once the respawn delay elapses");
    assert_eq!(vitals.health, vitals.max_health);
    let transform = world.get::<Transform>(victim).unwrap();
    assert_eq!(transform.translation.truncate(), respawn_point);
    let weapon = world.get::<Weapon>(victim).unwrap();
    assert_eq!(weapon.current_ammo, weapon.attributes.magazine_size);
    assert!(!weapon.reloading);
}
