//! Deploys and maintains turrets, barriers, mines, nets, teleport pads,
//! healing zones, and tracks sensor membership for KOTH/workshop/power-up/
//! flag pickups (§4.2 sensor handlers, §4.3 "UtilitySystem" share of §2).

use avian2d::prelude::*;
use bevy::prelude::*;
use tracing::debug;

use crate::components::entity::{Owner, Team, Vitals};
use crate::components::player::{StatusEffect, UtilityWeapon};
use crate::components::utility::{KothZone, NetTrap, PowerUp, TeleportPad, Turret, Workshop};
use crate::components::{EntityKind, Flag, FlagState, Obstacle, Player};
use crate::config::{FIXED_DT, UTILITY_CAP_PER_OWNER};
use crate::error::RoomError;
use crate::ids::GameId;
use crate::resources::{ArenaBounds, RoomClock};

/// Per-owner deployment ledger used to enforce the cap = 4 invariant (§3
/// "Per (owner, utility class) the registry caps deployed instances").
#[derive(Resource, Default)]
pub struct DeploymentLedger {
    pub turrets: std::collections::HashMap<GameId, Vec<(f64, Entity)>>,
    pub barriers: std::collections::HashMap<GameId, Vec<(f64, Entity)>>,
    pub teleport_pads: std::collections::HashMap<GameId, Vec<(f64, Entity)>>,
}

impl DeploymentLedger {
    /// Registers a new deployment for `owner`, retiring the oldest entry if
    /// the cap is already at capacity. Returns the entity to despawn, if any.
    pub fn register(
        ledger: &mut Vec<(f64, Entity)>,
        owner_time: f64,
        new_entity: Entity,
    ) -> Option<Entity> {
        ledger.push((owner_time, new_entity));
        if ledger.len() > UTILITY_CAP_PER_OWNER {
            ledger.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            let (_, retired) = ledger.remove(0);
            Some(retired)
        } else {
            None
        }
    }
}

/// Validates a deployment placement before spawning it (§7 placement
/// failure: "utility deployed inside obstacle or out of bounds").
pub fn validate_placement(
    position: Vec2,
    bounds: &ArenaBounds,
    obstacles: &Query<(&Transform, &Obstacle)>,
) -> Result<(), RoomError> {
    if position.x.abs() > bounds.half_extents.x || position.y.abs() > bounds.half_extents.y {
        return Err(RoomError::PlacementFailure {
            owner: GameId::ABSENT,
            reason: "out of arena bounds".into(),
        });
    }
    for (transform, obstacle) in obstacles.iter() {
        let center = transform.translation.truncate();
        if position.distance(center) < obstacle.bounding_radius {
            return Err(RoomError::PlacementFailure {
                owner: GameId::ABSENT,
                reason: "overlaps an existing obstacle".into(),
            });
        }
    }
    Ok(())
}

/// Drives player utility-use intents into deployments (turret/barrier/pad/
/// net/healing-zone), logging and refunding the cooldown on placement
/// failure (§7).
pub fn process_utility_intents(
    mut commands: Commands,
    bounds: Res<ArenaBounds>,
    clock: Res<crate::resources::RoomClock>,
    mut allocator: ResMut<crate::ids::IdAllocator>,
    mut ledger: ResMut<DeploymentLedger>,
    obstacles: Query<(&Transform, &Obstacle)>,
    mut players: Query<(&mut Player, &Transform, &GameId)>,
) {
    for (mut player, transform, owner_id) in players.iter_mut() {
        if !player.utility_requested_this_tick {
            continue;
        }
        player.utility_requested_this_tick = false;
        let Some(utility) = player.utility_slot else { continue };
        let position = transform.translation.truncate() + player.aim_unit_vector * 2.0;

        if let Err(err) = validate_placement(position, &bounds, &obstacles) {
            debug!(?err, owner = ?owner_id, "utility placement rejected");
            // Refund cooldown: leave `last_utility_use_wall_time` untouched.
            continue;
        }

        player.last_utility_use_wall_time = clock.wall_time;
        let entity = spawn_utility(&mut commands, &mut allocator, utility, position, *owner_id, player.team, clock.game_time);

        let owner_ledger = match utility {
            UtilityWeapon::TurretDeployer => ledger.turrets.entry(*owner_id).or_default(),
            UtilityWeapon::BarrierDeployer => ledger.barriers.entry(*owner_id).or_default(),
            UtilityWeapon::TeleportPadDeployer => ledger.teleport_pads.entry(*owner_id).or_default(),
            _ => continue,
        };
        if let Some(retired) = DeploymentLedger::register(owner_ledger, clock.game_time, entity) {
            commands.entity(retired).despawn();
        }
    }
}

fn spawn_utility(
    commands: &mut Commands,
    allocator: &mut crate::ids::IdAllocator,
    utility: UtilityWeapon,
    position: Vec2,
    owner_id: GameId,
    team: u8,
    now: f64,
) -> Entity {
    let id = allocator.alloc_entity();
    let base = (
        id,
        Owner { id: owner_id, team: Team(team) },
        Transform::from_translation(position.extend(0.0)),
        Vitals::new(now),
    );
    match utility {
        UtilityWeapon::TurretDeployer => commands
            .spawn((
                base,
                EntityKind::Turret,
                Turret {
                    detection_range: 200.0,
                    fire_rate: 2.0,
                    damage: 10.0,
                    target: None,
                    expires: 60.0,
                    last_shot_wall_time: 0.0,
                },
            ))
            .id(),
        UtilityWeapon::BarrierDeployer => commands
            .spawn((
                base,
                EntityKind::Obstacle,
                Obstacle {
                    owner: Some(owner_id),
                    lifespan_remaining: Some(30.0),
                    bounding_radius: 2.0,
                    shape: crate::components::ShapeDescriptor::Box {
                        half_extents: Vec2::splat(2.0),
                    },
                    blocks_beams: true,
                },
            ))
            .id(),
        UtilityWeapon::TeleportPadDeployer => commands
            .spawn((
                base,
                EntityKind::TeleportPad,
                TeleportPad {
                    activation_radius: 2.0,
                    cooldown: 3.0,
                    cooldown_remaining: 0.0,
                    partner_id: None,
                    charging: false,
                    recently_teleported: Default::default(),
                },
            ))
            .id(),
        UtilityWeapon::NetLauncher => commands
            .spawn((
                base,
                EntityKind::NetProjectile,
                crate::components::NetTrap {
                    slow_multiplier: 0.4,
                    duration: 3.0,
                    pushback: 150.0,
                    hit: false,
                },
            ))
            .id(),
        UtilityWeapon::HealingZoneDeployer => commands
            .spawn((
                base,
                EntityKind::FieldEffect,
                crate::components::FieldEffect {
                    kind: crate::components::FieldEffectType::Heal,
                    center: position,
                    radius: 50.0,
                    damage_per_tick: 5.0,
                    duration: 10.0,
                    remaining: 10.0,
                    owner_id,
                    owner_team: Team(team),
                    applied_once: false,
                },
            ))
            .id(),
    }
}

/// Maintains teleport-pad partner pairing as an undirected matching (§3
/// invariant): the most recently deployed unpaired pad pairs with the next
/// one placed.
pub fn pair_teleport_pads(mut pads: Query<(&GameId, &mut TeleportPad)>) {
    let unpaired: Vec<GameId> = pads
        .iter()
        .filter(|(_, pad)| pad.partner_id.is_none())
        .map(|(id, _)| *id)
        .collect();
    if unpaired.len() < 2 {
        return;
    }
    let (first, second) = (unpaired[0], unpaired[1]);
    for (id, mut pad) in pads.iter_mut() {
        if *id == first {
            pad.partner_id = Some(second);
        } else if *id == second {
            pad.partner_id = Some(first);
        }
    }
}

/// Updates KOTH per-zone occupancy membership from current sensor contacts
/// (§4.2 "(Player, KothZone) sensor"). Zone *state* advancement (capture
/// progress, scoring) lives in `rule_system` since it's part of
/// `RuleSystem`'s per-tick update (§4.5).
pub fn update_koth_membership(
    mut zones: Query<(&Transform, &mut KothZone)>,
    players: Query<(&GameId, &Transform, &Player, &Vitals)>,
) {
    for (zone_transform, mut zone) in zones.iter_mut() {
        let center = zone_transform.translation.truncate();
        zone.players_in_zone.clear();
        for (id, transform, player, vitals) in players.iter() {
            if !vitals.active || player.is_spectator {
                continue;
            }
            if transform.translation.truncate().distance(center) <= zone.radius {
                zone.players_in_zone.insert(*id, player.team);
            }
        }
    }
}

/// Workshop craft-membership tracking (§4.2 "(Player, Workshop) sensor").
pub fn update_workshop_membership(
    mut workshops: Query<(&Transform, &mut Workshop)>,
    players: Query<(&GameId, &Transform, &Vitals)>,
) {
    for (workshop_transform, mut workshop) in workshops.iter_mut() {
        let center = workshop_transform.translation.truncate();
        let mut present = std::collections::HashSet::new();
        for (id, transform, vitals) in players.iter() {
            if vitals.active && transform.translation.truncate().distance(center) <= workshop.craft_radius {
                present.insert(*id);
                let progress = workshop.progress_per_player.entry(*id).or_insert(0.0);
                *progress += crate::config::FIXED_DT / workshop.craft_time.max(0.001);
            }
        }
        workshop.progress_per_player.retain(|id, _| present.contains(id));
    }
}

/// Power-up collection (§4.2 "(Player, PowerUp) sensor": "collect and consume").
pub fn collect_powerups(
    mut commands: Commands,
    powerups: Query<(Entity, &Transform, &PowerUp)>,
    mut players: Query<(&Transform, &mut Player, &Vitals)>,
) {
    for (entity, powerup_transform, powerup) in powerups.iter() {
        let center = powerup_transform.translation.truncate();
        for (player_transform, mut player, vitals) in players.iter_mut() {
            if !vitals.active {
                continue;
            }
            if player_transform.translation.truncate().distance(center) <= 1.5 {
                apply_powerup(&mut player, powerup);
                commands.entity(entity).despawn();
                break;
            }
        }
    }
}

fn apply_powerup(player: &mut Player, powerup: &PowerUp) {
    match powerup.kind {
        crate::components::PowerUpType::Speed => player.max_speed *= 1.0 + powerup.strength,
        _ => {
            // Health/ammo/shield/damage power-ups are applied by dedicated
            // timed status effects tracked on `Player::status_effects`;
            // immediate-application kinds (health/ammo) are resolved at the
            // collision site by the caller in a full implementation.
        }
    }
}

/// Radius within which a player may pick up or capture a flag (§4.2 "(Player,
/// Flag) sensor: attempt pickup if allowed by CTF rules").
pub const FLAG_INTERACTION_RADIUS: f32 = 1.5;

/// A carried flag has no physics body of its own; it rides along with its
/// carrier's transform so it renders at the right place and the capture
/// check below can compare positions directly.
pub fn carried_flags_follow_carrier(
    mut flags: Query<(&mut Transform, &Flag)>,
    carriers: Query<(&GameId, &Transform), Without<Flag>>,
) {
    for (mut flag_transform, flag) in flags.iter_mut() {
        let Some(carrier_id) = flag.carried_by else { continue };
        if let Some((_, carrier_transform)) = carriers.iter().find(|(id, _)| **id == carrier_id) {
            flag_transform.translation = carrier_transform.translation;
        }
    }
}

/// Enemy players standing near an uncarried flag pick it up. A team can
/// never pick up its own flag (§4.2, §3 Flag invariant set: `CTF rules`).
pub fn process_flag_pickups(
    mut flags: Query<(&mut Flag, &Transform)>,
    players: Query<(&GameId, &Transform, &Player, &Vitals)>,
) {
    for (mut flag, flag_transform) in flags.iter_mut() {
        if flag.carried_by.is_some() {
            continue;
        }
        let flag_pos = if flag.state == FlagState::AtHome {
            flag.home
        } else {
            flag_transform.translation.truncate()
        };
        for (player_id, player_transform, player, vitals) in players.iter() {
            if !vitals.active || player.is_spectator || player.team == flag.owner_team {
                continue;
            }
            if player_transform.translation.truncate().distance(flag_pos) <= FLAG_INTERACTION_RADIUS {
                flag.carried_by = Some(*player_id);
                flag.state = FlagState::Carried;
                break;
            }
        }
    }
}

/// A carrier who reaches their own (still-home) flag scores a capture: the
/// carried flag snaps home and the enemy's presence resets it (§4.5 scoring
/// feeds `ScoreStyle::Captures`/`Objective`/`Total` from `player.captures`).
pub fn process_flag_captures(
    mut flags: Query<(&mut Flag, &Transform)>,
    mut players: Query<(&GameId, &Transform, &mut Player)>,
) {
    let home_positions: Vec<(u8, Vec2)> = flags
        .iter()
        .filter(|(f, _)| f.state == FlagState::AtHome)
        .map(|(f, _)| (f.owner_team, f.home))
        .collect();

    for (mut flag, _) in flags.iter_mut() {
        let Some(carrier_id) = flag.carried_by else { continue };
        let Some((_, carrier_transform, mut carrier)) = players.iter_mut().find(|(id, _, _)| **id == carrier_id) else {
            continue;
        };
        if carrier.team == flag.owner_team {
            continue;
        }
        let carrier_pos = carrier_transform.translation.truncate();
        let scores = home_positions
            .iter()
            .any(|(team, pos)| *team == carrier.team && carrier_pos.distance(*pos) <= FLAG_INTERACTION_RADIUS);
        if scores {
            carrier.captures += 1;
            flag.carried_by = None;
            flag.state = FlagState::AtHome;
        }
    }
}

/// Marks carried flags as dropped when their carrier is deactivated, and
/// returns dropped flags home after their drop timer (kept simple:
/// immediate return is out of scope — CTF return timers are config-driven
/// and not specified further by §6, so flags return only on recapture).
pub fn handle_flag_carrier_elimination(
    mut flags: Query<&mut Flag>,
    carriers: Query<(&GameId, &Vitals), With<Player>>,
) {
    for mut flag in flags.iter_mut() {
        if let Some(carrier_id) = flag.carried_by {
            let still_active = carriers
                .iter()
                .any(|(id, vitals)| *id == carrier_id && vitals.active);
            if !still_active {
                flag.carried_by = None;
                flag.state = FlagState::Dropped;
            }
        }
    }
}
