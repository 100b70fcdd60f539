//! Post-hit/post-dismissal expansion pipeline (§4.4 BulletEffectProcessor).

use std::collections::HashSet;

use bevy::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::components::entity::{Team, Vitals};
use crate::components::field_effect::{FieldEffect, FieldEffectType};
use crate::components::weapon::BulletEffect;
use crate::components::Projectile;
use crate::glossary::OrdinanceKind;
use crate::ids::GameId;

/// Accumulates dismissed-projectile records produced by `apply_deferred_hits`
/// and `apply_lifetime_dismissals` during the current tick, consumed by
/// `expand_dismissed_projectiles_system` (§4.1 step 6).
#[derive(Resource, Default)]
pub struct DismissedThisTick(pub Vec<DismissedProjectile>);

/// A fully-resolved hit or dismissal ready for expansion. Built by the
/// collision dispatcher (on-hit) or by kinematics (TTL/obstacle dismissal).
#[derive(Debug, Clone)]
pub struct DismissedProjectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub owner_id: GameId,
    pub owner_team: Team,
    pub bullet_effects: HashSet<BulletEffect>,
    pub speed_at_dismissal: f32,
}

/// Result of expanding one dismissed projectile: zero or more field effects
/// and zero or more fragment child-projectile spawns.
#[derive(Default)]
pub struct ExpansionResult {
    pub field_effects: Vec<FieldEffect>,
    pub fragments: Vec<FragmentSpawn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpawn {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub bullet_effects: HashSet<BulletEffect>,
}

/// §4.4 steps 1-2: fragmenting dominates (and excludes every other
/// expansion on the parent); otherwise each of EXPLOSIVE/INCENDIARY/
/// ELECTRIC/FREEZING/POISON present spawns one field effect, in that
/// priority order.
pub fn expand_dismissed_projectile(
    hit: &DismissedProjectile,
    now: f64,
    rng: &mut impl Rng,
) -> ExpansionResult {
    let mut result = ExpansionResult::default();

    if hit.bullet_effects.contains(&BulletEffect::Fragmenting) {
        let child_count = 3 + (hit.damage / 15.0).floor() as u32;
        let child_damage = hit.damage * 0.4;
        let child_speed = hit.speed_at_dismissal * 0.6;
        let remaining_effects: HashSet<BulletEffect> = hit
            .bullet_effects
            .iter()
            .copied()
            .filter(|e| *e != BulletEffect::Fragmenting)
            .collect();
        let random_offset = Uniform::new(0.0_f32, std::f32::consts::TAU).sample(rng);
        for i in 0..child_count {
            let angle = random_offset + (i as f32) * std::f32::consts::TAU / (child_count as f32);
            result.fragments.push(FragmentSpawn {
                position: hit.position,
                direction: Vec2::from_angle(angle),
                speed: child_speed,
                damage: child_damage,
                bullet_effects: remaining_effects.clone(),
            });
        }
        result.field_effects.push(FieldEffect {
            kind: FieldEffectType::Fragmentation,
            center: hit.position,
            radius: 0.0,
            damage_per_tick: 0.0,
            duration: FieldEffectType::Fragmentation.default_duration(),
            remaining: FieldEffectType::Fragmentation.default_duration(),
            owner_id: hit.owner_id,
            owner_team: hit.owner_team,
            applied_once: false,
        });
        return result;
    }

    for effect in crate::glossary::BULLET_EFFECT_EXPANSION_PRIORITY {
        if hit.bullet_effects.contains(&effect) {
            let (kind, radius, damage) = field_effect_scaling(effect, hit.damage);
            result.field_effects.push(FieldEffect {
                kind,
                center: hit.position,
                radius,
                damage_per_tick: damage,
                duration: kind.default_duration(),
                remaining: kind.default_duration(),
                owner_id: hit.owner_id,
                owner_team: hit.owner_team,
                applied_once: false,
            });
        }
    }
    result
}

/// Radius/damage scaling function over `(base_damage, effect)` (§3 Bullet Effect).
fn field_effect_scaling(effect: BulletEffect, base_damage: f32) -> (FieldEffectType, f32, f32) {
    match effect {
        BulletEffect::Explosive => (FieldEffectType::Explosion, 50.0 + base_damage * 0.5, base_damage * 1.2),
        BulletEffect::Incendiary => (FieldEffectType::Fire, 40.0, base_damage * 0.15),
        BulletEffect::Electric => (FieldEffectType::Electric, 35.0, base_damage * 0.2),
        BulletEffect::Freezing => (FieldEffectType::Freeze, 30.0, 0.0),
        BulletEffect::Poison => (FieldEffectType::Poison, 30.0, base_damage * 0.1),
        // Not expanded here; handled by the dispatcher/kinematics directly.
        BulletEffect::Fragmenting | BulletEffect::Piercing | BulletEffect::Homing | BulletEffect::Bouncy => {
            (FieldEffectType::Explosion, 0.0, 0.0)
        }
    }
}

/// Applies `damage_per_tick` from active, continuous field effects to every
/// eligible entity within radius. Instantaneous effects (explosion,
/// fragmentation) apply once on the tick they spawn, tracked by
/// `applied_once`.
pub fn apply_field_effect_damage(
    clock: Res<crate::resources::RoomClock>,
    mut effects: Query<&mut FieldEffect>,
    mut players: Query<(
        &Transform,
        &GameId,
        &Team,
        &mut Vitals,
        &mut crate::components::Player,
    )>,
    mut headquarters: Query<(&Transform, &crate::components::Headquarters, &mut Vitals), Without<crate::components::Player>>,
) {
    let now = clock.game_time;
    for mut effect in effects.iter_mut() {
        if effect.kind.is_instantaneous() && effect.applied_once {
            continue;
        }
        let magnitude = if effect.kind.is_instantaneous() {
            effect.damage_per_tick
        } else {
            effect.damage_per_tick * crate::config::FIXED_DT
        };
        let healing = effect.kind == FieldEffectType::Heal;

        for (transform, id, team, mut vitals, mut player) in players.iter_mut() {
            if !vitals.active {
                continue;
            }
            let is_owner = *id == effect.owner_id;
            let is_ally = team.is_friendly_to(effect.owner_team) || is_owner;
            // Healing zones only help allies (owner, in FFA); damaging
            // zones only hit non-allies (§3 Field Effect owner_team rule;
            // §4.3 "Healing beams ... in FFA the only ally is the owner").
            if healing != is_ally {
                continue;
            }
            let pos = transform.translation.truncate();
            if pos.distance(effect.center) > effect.radius {
                continue;
            }
            if healing {
                vitals.apply_heal(magnitude, now);
            } else {
                vitals.apply_damage(magnitude, now);
                if !vitals.active {
                    player.last_damage_source = Some((effect.owner_id, effect.owner_team));
                }
            }
        }

        if !healing {
            for (transform, hq, mut vitals) in headquarters.iter_mut() {
                if !vitals.active || effect.owner_team.is_friendly_to(Team(hq.team)) {
                    continue;
                }
                let pos = transform.translation.truncate();
                if pos.distance(effect.center) <= effect.radius {
                    vitals.apply_damage(magnitude, now);
                }
            }
        }
        effect.applied_once = true;
    }
}

/// §4.4 item producing spawned DART fragments with range capped at 100 and
/// ordinance forced to `DART` (§4.4 step 1, §8 scenario 3).
pub fn fragment_ordinance() -> OrdinanceKind {
    OrdinanceKind::Dart
}

pub const FRAGMENT_RANGE: f32 = 100.0;

/// Drains `DismissedThisTick` (populated by `collision::apply_deferred_hits`
/// and `kinematics::apply_lifetime_dismissals`) and spawns whatever the
/// expansion produces: field effects directly, fragment children as new
/// `DART` projectiles (§4.4 step 1, §4.1 step 6).
pub fn expand_dismissed_projectiles_system(
    mut commands: Commands,
    clock: Res<crate::resources::RoomClock>,
    mut allocator: ResMut<crate::ids::IdAllocator>,
    mut rng: ResMut<crate::resources::RoomRng>,
    mut dismissed: ResMut<DismissedThisTick>,
) {
    let now = clock.game_time;
    for hit in dismissed.0.drain(..) {
        let result = expand_dismissed_projectile(&hit, now, &mut rng.0);

        for field_effect in result.field_effects {
            let id = allocator.alloc_entity();
            commands.spawn((
                id,
                crate::components::EntityKind::FieldEffect,
                field_effect,
            ));
        }

        for fragment in result.fragments {
            let spawn = crate::systems::weapon_system::ProjectileSpawn {
                position: fragment.position,
                direction: fragment.direction,
                speed: fragment.speed,
                damage: fragment.damage,
                ttl: Projectile::ttl_from_range_speed(FRAGMENT_RANGE, fragment.speed.max(1.0)),
                min_velocity: fragment.speed * 0.1,
                bullet_effects: fragment.bullet_effects,
                ordinance: fragment_ordinance(),
                owner_id: hit.owner_id,
                owner_team: hit.owner_team,
            };
            crate::systems::weapon_system::spawn_projectile(&mut commands, &mut allocator, &spawn, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn hit(damage: f32, effects: &[BulletEffect]) -> DismissedProjectile {
        DismissedProjectile {
            position: Vec2::ZERO,
            velocity: Vec2::X,
            damage,
            owner_id: GameId(1),
            owner_team: Team(1),
            bullet_effects: effects.iter().copied().collect(),
            speed_at_dismissal: 300.0,
        }
    }

    #[test]
    fn fragmenting_rocket_spawns_expected_children() {
        let h = hit(30.0, &[BulletEffect::Fragmenting, BulletEffect::Explosive]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let result = expand_dismissed_projectile(&h, 0.0, &mut rng);
        assert_eq!(result.fragments.len(), 5);
        for fragment in &result.fragments {
            assert_eq!(fragment.damage, 12.0);
            assert!(fragment.bullet_effects.contains(&BulletEffect::Explosive));
            assert!(!fragment.bullet_effects.contains(&BulletEffect::Fragmenting));
        }
        assert_eq!(result.field_effects.len(), 1);
        assert_eq!(result.field_effects[0].kind, FieldEffectType::Fragmentation);
    }

    #[test]
    fn fragmenting_never_recurses() {
        let h = hit(60.0, &[BulletEffect::Fragmenting]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let result = expand_dismissed_projectile(&h, 0.0, &mut rng);
        for fragment in &result.fragments {
            assert!(!fragment.bullet_effects.contains(&BulletEffect::Fragmenting));
        }
    }

    #[test]
    fn non_fragmenting_effects_expand_in_priority_order() {
        let h = hit(20.0, &[BulletEffect::Poison, BulletEffect::Explosive]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let result = expand_dismissed_projectile(&h, 0.0, &mut rng);
        assert_eq!(result.field_effects.len(), 2);
        assert_eq!(result.field_effects[0].kind, FieldEffectType::Explosion);
        assert_eq!(result.field_effects[1].kind, FieldEffectType::Poison);
    }
}
