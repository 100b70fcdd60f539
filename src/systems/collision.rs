//! Type-pair collision dispatch (§4.2 CollisionDispatcher).
//!
//! `avian2d` reports a `CollisionStart`/`CollisionEnd` message per
//! contacting pair (§6 physics engine contract: "a callback for each
//! contact manifold"). This module reads those messages, determines each
//! side's [`EntityKind`], and either applies the corresponding handler
//! immediately (sensor membership, which never skips resolution) or
//! enqueues deferred work (damage, dismissal) so collision enumeration
//! order is never disturbed by mutation mid-iteration (§4.1 step 3/4).

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::components::entity::{Owner, Team, Vitals};
use crate::components::utility::{Headquarters, KothZone, PowerUp, Workshop};
use crate::components::weapon::BulletEffect;
use crate::components::{EntityKind, Flag, Projectile};
use crate::ids::GameId;
use crate::resources::RoomClock;

/// One piece of deferred work produced during collision enumeration,
/// applied afterward by [`apply_deferred_hits`] (§4.1 step 4).
#[derive(Debug, Clone)]
pub enum DeferredHit {
    ProjectileHitPlayer {
        projectile: Entity,
        player: Entity,
        damage: f32,
        piercing: bool,
        owner_id: GameId,
        owner_team: Team,
    },
    ProjectileHitObstacle {
        projectile: Entity,
        bouncy: bool,
    },
    ProjectileHitHeadquarters {
        projectile: Entity,
        headquarters: Entity,
        damage: f32,
        owner_id: GameId,
        owner_team: Team,
    },
}

#[derive(Resource, Default)]
pub struct DeferredHitQueue(pub Vec<DeferredHit>);

/// Reads this tick's collision-start messages and builds the deferred work
/// queue, keeping a `handle_collisions`/`process_hit` split so dispatch
/// (read contacts, decide what happened) stays separate from resolution
/// (apply damage, despawn, queue effects); generalized from a single
/// raycast-vs-hit model to the full type-pair switch table in §4.2.
pub fn dispatch_collisions(
    mut collisions: MessageReader<CollisionStart>,
    mut queue: ResMut<DeferredHitQueue>,
    kinds: Query<&EntityKind>,
    vitals: Query<&Vitals>,
    projectiles: Query<(&Projectile, &Owner)>,
    mut koth_zones: Query<(&mut KothZone, &Owner)>,
    mut workshops: Query<&mut Workshop>,
    players: Query<(Entity, &Owner), With<EntityKind>>,
    powerups: Query<&PowerUp>,
    mut flags: Query<&mut Flag>,
    player_game_ids: Query<(&GameId, &Team)>,
    headquarters_teams: Query<&Headquarters>,
) {
    for event in collisions.read() {
        let (a, b) = (event.collider1, event.collider2);
        let Ok(kind_a) = kinds.get(a) else { continue };
        let Ok(kind_b) = kinds.get(b) else { continue };

        // Treat inactive entities as inert (§4.2 failure modes).
        if vitals.get(a).map(|v| !v.active).unwrap_or(false) || vitals.get(b).map(|v| !v.active).unwrap_or(false) {
            continue;
        }

        dispatch_pair(
            a,
            *kind_a,
            b,
            *kind_b,
            &mut queue,
            &projectiles,
            &mut koth_zones,
            &mut workshops,
            &powerups,
            &mut flags,
            &player_game_ids,
            &headquarters_teams,
        );
        let _ = &players;
    }
}

#[allow(clippy::too_many_arguments)]
fn dispatch_pair(
    a: Entity,
    kind_a: EntityKind,
    b: Entity,
    kind_b: EntityKind,
    queue: &mut DeferredHitQueue,
    projectiles: &Query<(&Projectile, &Owner)>,
    koth_zones: &mut Query<(&mut KothZone, &Owner)>,
    workshops: &mut Query<&mut Workshop>,
    powerups: &Query<&PowerUp>,
    flags: &mut Query<&mut Flag>,
    player_game_ids: &Query<(&GameId, &Team)>,
    headquarters_teams: &Query<&Headquarters>,
) {
    use EntityKind::*;
    let (projectile_side, other_side, proj_kind, other_kind) = match (kind_a, kind_b) {
        (Projectile, _) => (a, b, kind_a, kind_b),
        (_, Projectile) => (b, a, kind_b, kind_a),
        _ => (a, b, kind_a, kind_b),
    };
    let _ = proj_kind;

    match (other_kind, kind_a, kind_b) {
        _ if kind_a == Projectile || kind_b == Projectile => {
            let Ok((projectile, owner)) = projectiles.get(projectile_side) else {
                return;
            };
            match other_kind {
                Player => {
                    if let Ok((target_id, target_team)) = player_game_ids.get(other_side) {
                        let _ = target_id;
                        if target_team.is_friendly_to(owner.team) {
                            return;
                        }
                    }
                    queue.0.push(DeferredHit::ProjectileHitPlayer {
                        projectile: projectile_side,
                        player: other_side,
                        damage: projectile.damage,
                        piercing: projectile.bullet_effects.contains(&BulletEffect::Piercing),
                        owner_id: owner.id,
                        owner_team: owner.team,
                    });
                }
                Obstacle => {
                    queue.0.push(DeferredHit::ProjectileHitObstacle {
                        projectile: projectile_side,
                        bouncy: projectile.bullet_effects.contains(&BulletEffect::Bouncy),
                    });
                }
                Headquarters => {
                    // §9 open question: the source only enforced HQ
                    // friendly-fire at collision time; this spec enforces
                    // it here too, and again at the damage-accounting site
                    // in `apply_deferred_hits` so neither path can diverge.
                    if let Ok(hq) = headquarters_teams.get(other_side) {
                        if owner.team.is_friendly_to(Team(hq.team)) {
                            return;
                        }
                    }
                    queue.0.push(DeferredHit::ProjectileHitHeadquarters {
                        projectile: projectile_side,
                        headquarters: other_side,
                        damage: projectile.damage,
                        owner_id: owner.id,
                        owner_team: owner.team,
                    });
                }
                _ => {}
            }
        }
        _ => {
            // Sensor-membership pairs never skip engine resolution; they're
            // handled by dedicated systems (`utility_system`) that read
            // `CollisionStart`/`CollisionEnd` directly against their own
            // component types, not through this queue.
            let _ = (koth_zones, workshops, powerups, flags);
        }
    }
}

/// One damage instance landed on a headquarters this tick, consumed by
/// `rule_system::apply_hq_damage_scoring` (§4.5 "HQ damage").
#[derive(Debug, Clone, Copy)]
pub struct HqDamageRecord {
    pub attacker_team: Team,
    pub damage: f32,
    pub destroyed: bool,
}

#[derive(Resource, Default)]
pub struct HqDamageEvents(pub Vec<HqDamageRecord>);

/// Applies the deferred hit queue built this tick: damage, dismissal
/// flags, and kicks off `BulletEffectProcessor` inputs (§4.1 step 4, §4.2).
pub fn apply_deferred_hits(
    mut commands: Commands,
    mut queue: ResMut<DeferredHitQueue>,
    clock: Res<RoomClock>,
    mut vitals: Query<&mut Vitals>,
    mut players: Query<&mut crate::components::Player>,
    mut projectiles: Query<(&Transform, &LinearVelocity, &mut Projectile)>,
    mut headquarters: Query<&mut Headquarters>,
    mut dismissed: ResMut<super::bullet_effects::DismissedThisTick>,
    mut hq_damage: ResMut<HqDamageEvents>,
) {
    let now = clock.game_time;
    for hit in queue.0.drain(..) {
        match hit {
            DeferredHit::ProjectileHitPlayer { projectile, player, damage, piercing, owner_id, owner_team } => {
                if let Ok(mut target_vitals) = vitals.get_mut(player) {
                    target_vitals.apply_damage(damage, now);
                }
                if let Ok(mut target_player) = players.get_mut(player) {
                    target_player.last_damage_source = Some((owner_id, owner_team));
                }
                if !piercing {
                    dismiss_projectile(&mut commands, &mut projectiles, &mut dismissed, projectile, now);
                }
            }
            DeferredHit::ProjectileHitObstacle { projectile, bouncy } => {
                if !bouncy {
                    dismiss_projectile(&mut commands, &mut projectiles, &mut dismissed, projectile, now);
                }
            }
            DeferredHit::ProjectileHitHeadquarters { projectile, headquarters: hq_entity, damage, owner_team, .. } => {
                if let Ok(mut hq) = headquarters.get_mut(hq_entity) {
                    // Re-checked here (not just at dispatch) per §9: HQ
                    // friendly fire must be enforced at the damage-
                    // accounting site as well.
                    if !owner_team.is_friendly_to(Team(hq.team)) {
                        hq.total_damage_taken += damage;
                        let destroyed = if let Ok(mut hq_vitals) = vitals.get_mut(hq_entity) {
                            hq_vitals.apply_damage(damage, now);
                            !hq_vitals.active
                        } else {
                            false
                        };
                        hq_damage.0.push(HqDamageRecord {
                            attacker_team: owner_team,
                            damage,
                            destroyed,
                        });
                    }
                }
                dismiss_projectile(&mut commands, &mut projectiles, &mut dismissed, projectile, now);
            }
        }
    }
}

fn dismiss_projectile(
    commands: &mut Commands,
    projectiles: &mut Query<(&Transform, &LinearVelocity, &mut Projectile)>,
    dismissed: &mut super::bullet_effects::DismissedThisTick,
    projectile: Entity,
    now: f64,
) {
    if let Ok((transform, velocity, mut proj)) = projectiles.get_mut(projectile) {
        if proj.exploded {
            return;
        }
        proj.exploded = true;
        dismissed.0.push(super::bullet_effects::DismissedProjectile {
            position: transform.translation.truncate(),
            velocity: velocity.0,
            damage: proj.damage,
            owner_id: proj.owner_id,
            owner_team: proj.owner_team,
            bullet_effects: proj.bullet_effects.clone(),
            speed_at_dismissal: velocity.length(),
        });
    }
    commands.entity(projectile).despawn();
    let _ = now;
}
