//! Benchmark for room-tick throughput and the bullet-effect expansion
//! pipeline's pure hot path.

use arena_room_core::components::entity::{Team, Vitals};
use arena_room_core::components::{EntityKind, Player};
use arena_room_core::game_loop::GameLoop;
use arena_room_core::glossary::{OrdinanceKind, WeaponAttributes};
use arena_room_core::ids::{GameId, PlayerId};
use arena_room_core::prelude::RoomConfig;
use arena_room_core::systems::bullet_effects::{expand_dismissed_projectile, DismissedProjectile};
use avian2d::prelude::*;
use bevy::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use std::collections::HashSet;

fn populated_room(player_count: u32) -> GameLoop {
    let mut room = GameLoop::new(RoomConfig::default(), 1);
    let world = room.app_mut().world_mut();
    let attrs = WeaponAttributes {
        damage: 20.0,
        fire_rate: 300.0,
        range: 500.0,
        accuracy: 0.9,
        magazine_size: 30,
        reload_time: 1.5,
        projectile_speed: 300.0,
        bullets_per_shot: 1,
    };
    for i in 0..player_count {
        let team = (i % 2) as u8 + 1;
        let position = Vec2::new((i as f32) * 2.0, 0.0);
        world.spawn((
            GameId(i + 1),
            PlayerId(i + 1),
            EntityKind::Player,
            Team(team),
            Player::new(format!("p{i}"), team, position),
            Vitals::new(0.0),
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Dynamic,
            Collider::circle(0.5),
            LinearVelocity::default(),
            arena_room_core::components::Weapon::new(attrs.clone(), OrdinanceKind::Bullet, HashSet::new()),
        ));
    }
    room
}

fn benchmark_room_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("room tick");

    for player_count in [4, 16, 64].iter() {
        let mut room = populated_room(*player_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(player_count),
            player_count,
            |b, _| {
                b.iter(|| {
                    let _ = room.tick();
                });
            },
        );
    }

    group.finish();
}

fn benchmark_bullet_effect_expansion(c: &mut Criterion) {
    use arena_room_core::components::weapon::BulletEffect;

    let mut effects = HashSet::new();
    effects.insert(BulletEffect::Fragmenting);
    effects.insert(BulletEffect::Explosive);
    let hit = DismissedProjectile {
        position: Vec2::ZERO,
        velocity: Vec2::X,
        damage: 30.0,
        owner_id: GameId(1),
        owner_team: Team(1),
        bullet_effects: effects,
        speed_at_dismissal: 300.0,
    };
    let mut rng = rand::rngs::StdRng::from_seed([7; 32]);

    c.bench_function("fragmenting rocket expansion", |b| {
        b.iter(|| expand_dismissed_projectile(&hit, 0.0, &mut rng));
    });
}

criterion_group!(benches, benchmark_room_tick, benchmark_bullet_effect_expansion);
criterion_main!(benches);
