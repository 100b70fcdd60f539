//! §8 end-to-end scenario 3: a fragmenting rocket's dismissal spawns its
//! fragment children and its fragmentation field effect through a real tick,
//! not just through the pure expansion function (already covered by the
//! inline unit tests in `bullet_effects.rs`).

mod common;

use std::collections::HashSet;

use arena_room_core::components::entity::Team;
use arena_room_core::components::weapon::BulletEffect;
use arena_room_core::components::{EntityKind, FieldEffect, Projectile};
use arena_room_core::game_loop::GameLoop;
use arena_room_core::glossary::OrdinanceKind;
use arena_room_core::ids::GameId;
use arena_room_core::prelude::RoomConfig;
use bevy::prelude::*;

#[test]
fn fragmenting_rocket_dismissal_spawns_dart_children_through_a_real_tick() {
    let mut room = GameLoop::new(RoomConfig::default(), 1);
    let world = room.app_mut().world_mut();

    let mut effects = HashSet::new();
    effects.insert(BulletEffect::Fragmenting);
    effects.insert(BulletEffect::Explosive);
    world
        .resource_mut::<arena_room_core::systems::bullet_effects::DismissedThisTick>()
        .0
        .push(arena_room_core::systems::bullet_effects::DismissedProjectile {
            position: Vec2::ZERO,
            velocity: Vec2::X,
            damage: 30.0,
            owner_id: GameId(1),
            owner_team: Team(1),
            bullet_effects: effects,
            speed_at_dismissal: 300.0,
        });

    room.tick().unwrap();

    let world = room.app_mut().world_mut();
    let mut projectiles = world.query::<(&Projectile, &EntityKind)>();
    let darts: Vec<_> = projectiles
        .iter(world)
        .filter(|(_, kind)| matches!(kind, EntityKind::Projectile))
        .collect();
    assert_eq!(darts.len(), 5, "30 damage fragmenting hit should spawn 3 + floor(30/15) = 5 children");
    for (projectile, _) in &darts {
        assert_eq!(projectile.ordinance, OrdinanceKind::Dart);
        assert_eq!(projectile.damage, 12.0);
        assert!(projectile.bullet_effects.contains(&BulletEffect::Explosive));
        assert!(!projectile.bullet_effects.contains(&BulletEffect::Fragmenting));
    }

    let mut field_effects = world.query::<&FieldEffect>();
    assert_eq!(
        field_effects.iter(world).count(),
        1,
        "the fragmentation burst itself is a single instantaneous field effect"
    );
}
