//! Fixed-step driver tying every system together into one room tick (§4.1
//! GameLoop).
//!
//! One `.chain()`ed system tuple registered on `FixedUpdate`, ordering the
//! full nine-step tick §4.1 prescribes: input drain, intents, the physics
//! step, deferred collision/timer resolution, bullet-effect expansion,
//! rule/event systems, and cleanup. `avian2d`'s own `PhysicsPlugins` owns
//! step 3 (the rigid-body step itself); everything else here is the
//! game-specific bookkeeping riding alongside it.

use std::panic::{self, AssertUnwindSafe};

use avian2d::prelude::*;
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;

use crate::components::entity::Vitals;
use crate::components::{FieldEffect, NetTrap, Obstacle, Player, Turret};
use crate::config::{RoomConfig, FIXED_DT};
use crate::error::RoomError;
use crate::ids::IdAllocator;
use crate::network::messages::OutboundSnapshot;
use crate::resources::{ArenaBounds, EventBus, InputQueues, RoomClock, RoomRng, TickFailureCounter};
use crate::snapshot::build_snapshot;
use crate::systems::{
    beam_system, bullet_effects, collision, event_system, input_system, kinematics, rule_system,
    utility_system, weapon_system,
};

/// §4.1 step 5 (partial) / step 8: advances non-physics timers owned by
/// deployed utilities and field effects, despawning whatever expires.
/// Lives here rather than in `utility_system`/`bullet_effects` because it's
/// tick-lifecycle bookkeeping, not gameplay logic proper.
pub fn tick_entity_lifetimes(
    mut commands: Commands,
    mut obstacles: Query<(Entity, &mut Obstacle)>,
    mut turrets: Query<(Entity, &mut Turret)>,
    mut nets: Query<(Entity, &mut NetTrap)>,
    mut field_effects: Query<(Entity, &mut FieldEffect)>,
) {
    for (entity, mut obstacle) in obstacles.iter_mut() {
        if obstacle.tick_lifespan(FIXED_DT) {
            commands.entity(entity).despawn();
        }
    }
    for (entity, mut turret) in turrets.iter_mut() {
        turret.expires -= FIXED_DT;
        if turret.expires <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
    for (entity, mut net) in nets.iter_mut() {
        net.duration -= FIXED_DT;
        if net.duration <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
    for (entity, mut effect) in field_effects.iter_mut() {
        if effect.kind.is_instantaneous() {
            if effect.applied_once {
                commands.entity(entity).despawn();
            }
            continue;
        }
        if effect.tick(FIXED_DT) {
            commands.entity(entity).despawn();
        }
    }
}

/// §4.1 step 8: removes any non-player entity whose [`Vitals::active`] went
/// false this tick (players stay alive — inactive-but-not-eliminated is the
/// respawn-pending state, §3 Player).
pub fn cleanup_inactive_non_player_entities(
    mut commands: Commands,
    query: Query<(Entity, &Vitals), Without<Player>>,
) {
    for (entity, vitals) in query.iter() {
        if !vitals.active {
            commands.entity(entity).despawn();
        }
    }
}

/// One room's empty-of-real-players tracking (§5 "Cancellation and
/// timeouts": "A room terminates when it is empty of real players for one
/// tick — spectators do not keep a room alive").
#[derive(Resource, Debug, Default)]
pub struct RoomLifecycle {
    pub terminated: bool,
    pub termination_reason: Option<String>,
}

pub fn check_room_emptiness(mut lifecycle: ResMut<RoomLifecycle>, players: Query<&Player>) {
    if lifecycle.terminated {
        return;
    }
    let has_real_player = players.iter().any(|p| !p.is_spectator);
    if !has_real_player {
        lifecycle.terminated = true;
        lifecycle.termination_reason = Some("room emptied of real players".into());
    }
}

/// Registers every system in the §4.1 tick order on `FixedUpdate`. Physics
/// stepping itself is `avian2d`'s job (added separately in
/// [`RoomPlugin::build`]); this only orders the game-specific systems
/// around it.
pub struct RoomPlugin;

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoomConfig>()
            .init_resource::<RoomClock>()
            .init_resource::<InputQueues>()
            .init_resource::<EventBus>()
            .init_resource::<ArenaBounds>()
            .init_resource::<TickFailureCounter>()
            .init_resource::<RoomLifecycle>()
            .init_resource::<IdAllocator>()
            .init_resource::<collision::DeferredHitQueue>()
            .init_resource::<collision::HqDamageEvents>()
            .init_resource::<bullet_effects::DismissedThisTick>()
            .init_resource::<utility_system::DeploymentLedger>()
            .insert_resource(event_system::RandomEventState::new(&RoomConfig::default()))
            .insert_resource(RoomRng::from_seed(0))
            .insert_resource(rule_system::RuleState::new(&RoomConfig::default()))
            .add_plugins(PhysicsPlugins::new(FixedUpdate))
            .insert_resource(Time::<Fixed>::from_seconds(FIXED_DT as f64))
            .add_systems(
                FixedUpdate,
                (
                    // 1. drain inputs
                    input_system::drain_player_inputs,
                    // 2. advance intents
                    (
                        input_system::apply_movement_intents,
                        weapon_system::process_reload_requests,
                        weapon_system::process_fire_intents,
                        utility_system::process_utility_intents,
                    ),
                )
                    .chain()
                    .before(PhysicsSet::StepSimulation),
            )
            .add_systems(
                FixedUpdate,
                (
                    // 4. deferred collision handlers (after avian2d's own step)
                    collision::dispatch_collisions,
                    collision::apply_deferred_hits,
                    // 5. timers
                    kinematics::apply_lifetime_dismissals,
                    kinematics::clip_beams_against_obstacles,
                    kinematics::apply_homing_steering,
                    beam_system::apply_beam_damage,
                    beam_system::tick_beam_durations,
                    bullet_effects::apply_field_effect_damage,
                    weapon_system::tick_reloads,
                    utility_system::pair_teleport_pads,
                    utility_system::update_koth_membership,
                    utility_system::update_workshop_membership,
                    utility_system::collect_powerups,
                    utility_system::carried_flags_follow_carrier,
                    utility_system::process_flag_pickups,
                    utility_system::process_flag_captures,
                    utility_system::handle_flag_carrier_elimination,
                    tick_entity_lifetimes,
                )
                    .chain()
                    .after(PhysicsSet::StepSimulation),
            )
            .add_systems(
                FixedUpdate,
                (
                    // 6. post-dismissal bullet-effect expansion
                    bullet_effects::expand_dismissed_projectiles_system,
                    // 7. rule/event systems
                    rule_system::update_koth_zone_state,
                    rule_system::apply_hq_damage_scoring,
                    rule_system::maintain_vip_assignments,
                    rule_system::rotate_random_weapons,
                    rule_system::process_player_deaths,
                    rule_system::process_respawn_timers,
                    rule_system::advance_round_phase,
                    event_system::schedule_environmental_events,
                    event_system::activate_pending_environmental_event,
                    // 8. cleanup
                    cleanup_inactive_non_player_entities,
                    check_room_emptiness,
                    advance_clock,
                )
                    .chain()
                    .after(PhysicsSet::StepSimulation)
                    .after(tick_entity_lifetimes),
            );
    }
}

fn advance_clock(mut clock: ResMut<RoomClock>) {
    clock.advance(FIXED_DT, FIXED_DT as f64);
}

/// Owns one room's headless `App` and drives it one tick at a time,
/// catching simulation panics at the tick boundary per §7's propagation
/// policy (three consecutive failures of any kind promote to `Fatal`).
pub struct GameLoop {
    app: App,
}

impl GameLoop {
    pub fn new(config: RoomConfig, seed: u64) -> Self {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, bevy::log::LogPlugin::default()));
        app.add_plugins(RoomPlugin);
        // Plugin construction seeds `RuleState`/`RandomEventState`/`RoomRng`
        // from defaults; re-derive all three from the caller's actual
        // config/seed now that the resources exist.
        app.insert_resource(rule_system::RuleState::new(&config));
        app.insert_resource(event_system::RandomEventState::new(&config));
        app.insert_resource(config);
        app.insert_resource(RoomRng::from_seed(seed));
        Self { app }
    }

    /// Runs exactly one `FixedUpdate` tick. On success, returns the
    /// snapshot and drained events for broadcast (§4.1 step 9). A caught
    /// panic counts as a tick failure; three consecutive failures are
    /// promoted to [`RoomError::Fatal`] and the caller should evict the
    /// room (§7 propagation policy).
    pub fn tick(&mut self) -> Result<(OutboundSnapshot, Vec<crate::network::messages::OutboundEvent>), RoomError> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.app.update();
        }));

        let mut failures = self.app.world_mut().resource_mut::<TickFailureCounter>();
        if result.is_err() {
            failures.0 += 1;
            let count = failures.0;
            if count >= 3 {
                return Err(RoomError::Fatal(format!(
                    "{count} consecutive tick failures"
                )));
            }
            return Err(RoomError::PhysicsAnomaly("tick panicked".into()));
        }
        failures.0 = 0;

        let snapshot = self.app.world_mut().run_system_once(build_snapshot).map_err(|e| {
            RoomError::Fatal(format!("snapshot build failed: {e}"))
        })?;
        let events = self.app.world_mut().resource_mut::<EventBus>().drain();
        Ok((snapshot, events))
    }

    pub fn is_terminated(&mut self) -> bool {
        self.app.world_mut().resource::<RoomLifecycle>().terminated
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_loop_ticks_without_panicking() {
        let mut loop_ = GameLoop::new(RoomConfig::default(), 1);
        for _ in 0..5 {
            let result = loop_.tick();
            assert!(result.is_ok());
        }
    }

    #[test]
    fn empty_room_terminates_after_one_tick() {
        let mut loop_ = GameLoop::new(RoomConfig::default(), 1);
        loop_.tick().unwrap();
        assert!(loop_.is_terminated());
    }
}
