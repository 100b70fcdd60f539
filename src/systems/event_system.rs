//! Time-driven environmental hazards (§4.6 EventSystem).
//!
//! Mirrors the warn-then-activate two-phase shape used by `UtilitySystem`'s
//! deployments (validate placement, then spawn) and by `BulletEffectProcessor`
//! (resolve a batch of field-effect spawns from one decision point), just
//! driven by a room-wide interval timer instead of player input.

use bevy::prelude::*;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::components::entity::Team;
use crate::components::{EntityKind, FieldEffect, FieldEffectType, PowerUp, PowerUpType};
use crate::config::{EnvironmentalEventKind, EventDensity, RoomConfig};
use crate::ids::IdAllocator;
use crate::network::messages::OutboundEvent;
use crate::resources::{ArenaBounds, EventBus, RoomClock, RoomRng};

/// A warned-but-not-yet-activated environmental event. Its points are fixed
/// at announce time so the warning zones and the eventual hazards line up
/// (§4.6 step 1: "create WARNING_ZONE field effects at designated points").
#[derive(Debug, Clone)]
pub struct PendingEnvironmentalEvent {
    pub kind: EnvironmentalEventKind,
    pub points: Vec<Vec2>,
    pub warning_remaining: f32,
}

#[derive(Resource, Debug, Default)]
pub struct RandomEventState {
    pub next_event_in: f32,
    pub pending: Option<PendingEnvironmentalEvent>,
    /// `false` until the first tick of [`schedule_environmental_events`] has
    /// drawn the initial interval from the room's seeded `RoomRng`. Kept
    /// unsampled at construction time so two rooms built with the same seed
    /// stay in lockstep (§8 determinism property) instead of diverging on
    /// whichever interval the nondeterministic thread-local RNG happened to
    /// produce at startup.
    pub initialized: bool,
}

impl RandomEventState {
    pub fn new(_config: &RoomConfig) -> Self {
        Self {
            next_event_in: 0.0,
            pending: None,
            initialized: false,
        }
    }
}

/// §4.6 "schedules environmental events at intervals `U(interval·(1−variance),
/// interval·(1+variance))`".
fn schedule_interval(config: &RoomConfig, rng: &mut impl Rng) -> f32 {
    let lo = (config.random_event_interval * (1.0 - config.random_event_interval_variance)).max(0.1);
    let hi = (config.random_event_interval * (1.0 + config.random_event_interval_variance)).max(lo + 0.1);
    Uniform::new_inclusive(lo, hi).sample(rng)
}

/// Baseline hazard count before the density multiplier is applied (§4.6
/// "Event counts use a density multiplier ... k explosions/power-ups/...").
fn base_count(kind: EnvironmentalEventKind) -> u32 {
    match kind {
        EnvironmentalEventKind::MeteorShower => 5,
        EnvironmentalEventKind::SupplyDrop => 3,
        EnvironmentalEventKind::VolcanicEruption => 4,
        EnvironmentalEventKind::IonStorm => 4,
        EnvironmentalEventKind::Earthquake => 6,
    }
}

fn density_band(density: EventDensity) -> (f32, f32) {
    match density {
        EventDensity::Sparse => (0.6, 0.9),
        EventDensity::Dense => (1.2, 1.8),
        EventDensity::Choked => (2.0, 3.0),
        // §4.6 "RANDOM: U over the union" of the three named bands.
        EventDensity::Random => (0.6, 3.0),
    }
}

/// Draws a density multiplier for one activation. `RANDOM` selects uniformly
/// among the three named bands first, then samples within it, rather than
/// sampling the gapped union as a single continuous range.
fn density_multiplier(density: EventDensity, rng: &mut impl Rng) -> f32 {
    let (lo, hi) = if density == EventDensity::Random {
        let bands = [
            density_band(EventDensity::Sparse),
            density_band(EventDensity::Dense),
            density_band(EventDensity::Choked),
        ];
        bands[rng.random_range(0..bands.len())]
    } else {
        density_band(density)
    };
    Uniform::new_inclusive(lo, hi).sample(rng)
}

fn density_for(config: &RoomConfig, kind: EnvironmentalEventKind) -> EventDensity {
    match kind {
        EnvironmentalEventKind::MeteorShower => config.meteor_shower_density,
        EnvironmentalEventKind::SupplyDrop => config.supply_drop_density,
        EnvironmentalEventKind::VolcanicEruption => config.volcanic_eruption_density,
        EnvironmentalEventKind::IonStorm => config.ion_storm_density,
        EnvironmentalEventKind::Earthquake => config.meteor_shower_density,
    }
}

fn scatter_points(bounds: &ArenaBounds, count: u32, rng: &mut impl Rng) -> Vec<Vec2> {
    let x_dist = Uniform::new_inclusive(-bounds.half_extents.x, bounds.half_extents.x);
    let y_dist = Uniform::new_inclusive(-bounds.half_extents.y, bounds.half_extents.y);
    (0..count)
        .map(|_| Vec2::new(x_dist.sample(rng), y_dist.sample(rng)))
        .collect()
}

/// Advances the schedule timer and, when it elapses, announces a new
/// pending event and creates its warning zones (§4.6 step 1).
pub fn schedule_environmental_events(
    config: Res<RoomConfig>,
    clock: Res<RoomClock>,
    bounds: Res<ArenaBounds>,
    mut allocator: ResMut<IdAllocator>,
    mut rng: ResMut<RoomRng>,
    mut state: ResMut<RandomEventState>,
    mut events: ResMut<EventBus>,
    mut commands: Commands,
) {
    if !config.enable_random_events || config.enabled_events.is_empty() {
        return;
    }
    if state.pending.is_some() {
        return;
    }
    if !state.initialized {
        state.next_event_in = schedule_interval(&config, &mut rng.0);
        state.initialized = true;
        return;
    }
    state.next_event_in -= crate::config::FIXED_DT;
    if state.next_event_in > 0.0 {
        return;
    }
    state.next_event_in = schedule_interval(&config, &mut rng.0);

    let kind_index = rng.0.random_range(0..config.enabled_events.len());
    let kind = config.enabled_events[kind_index];
    let density = density_for(&config, kind);
    let multiplier = density_multiplier(density, &mut rng.0);
    let count = ((base_count(kind) as f32) * multiplier).round().max(1.0) as u32;
    let points = scatter_points(&bounds, count, &mut rng.0);

    events.push(OutboundEvent::system(format!("{} incoming", event_label(kind))));
    for point in &points {
        let id = allocator.alloc_entity();
        commands.spawn((
            id,
            EntityKind::FieldEffect,
            FieldEffect {
                kind: FieldEffectType::WarningZone,
                center: *point,
                radius: 60.0,
                damage_per_tick: 0.0,
                duration: config.event_warning_duration,
                remaining: config.event_warning_duration,
                owner_id: crate::ids::GameId::ABSENT,
                owner_team: Team::FFA,
                applied_once: false,
            },
        ));
    }

    state.pending = Some(PendingEnvironmentalEvent {
        kind,
        points,
        warning_remaining: config.event_warning_duration,
    });
}

/// Counts down a pending event's warning period and, on activation, spawns
/// the concrete hazards for its kind (§4.6 step 2).
pub fn activate_pending_environmental_event(
    config: Res<RoomConfig>,
    mut allocator: ResMut<IdAllocator>,
    mut state: ResMut<RandomEventState>,
    mut events: ResMut<EventBus>,
    mut commands: Commands,
) {
    let Some(pending) = state.pending.as_mut() else {
        return;
    };
    pending.warning_remaining -= crate::config::FIXED_DT;
    if pending.warning_remaining > 0.0 {
        return;
    }
    let pending = state.pending.take().unwrap();
    events.push(OutboundEvent::system(format!("{} strikes", event_label(pending.kind))));

    for point in &pending.points {
        let id = allocator.alloc_entity();
        match pending.kind {
            EnvironmentalEventKind::MeteorShower => {
                commands.spawn((
                    id,
                    EntityKind::FieldEffect,
                    FieldEffect {
                        kind: FieldEffectType::Explosion,
                        center: *point,
                        radius: config.meteor_radius,
                        damage_per_tick: config.meteor_damage,
                        duration: 0.0,
                        remaining: 0.0,
                        owner_id: crate::ids::GameId::ABSENT,
                        owner_team: Team::FFA,
                        applied_once: false,
                    },
                ));
            }
            EnvironmentalEventKind::SupplyDrop => {
                commands.spawn((
                    id,
                    EntityKind::PowerUp,
                    Transform::from_translation(point.extend(0.0)),
                    PowerUp {
                        kind: PowerUpType::Health,
                        workshop_id: None,
                        duration: 0.0,
                        strength: 25.0,
                    },
                ));
            }
            EnvironmentalEventKind::VolcanicEruption => {
                commands.spawn((
                    id,
                    EntityKind::FieldEffect,
                    FieldEffect {
                        kind: FieldEffectType::Fire,
                        center: *point,
                        radius: config.eruption_radius,
                        damage_per_tick: config.eruption_damage,
                        duration: FieldEffectType::Fire.default_duration(),
                        remaining: FieldEffectType::Fire.default_duration(),
                        owner_id: crate::ids::GameId::ABSENT,
                        owner_team: Team::FFA,
                        applied_once: false,
                    },
                ));
            }
            EnvironmentalEventKind::IonStorm => {
                commands.spawn((
                    id,
                    EntityKind::FieldEffect,
                    FieldEffect {
                        kind: FieldEffectType::Electric,
                        center: *point,
                        radius: 45.0,
                        damage_per_tick: config.ion_storm_damage,
                        duration: FieldEffectType::Electric.default_duration(),
                        remaining: FieldEffectType::Electric.default_duration(),
                        owner_id: crate::ids::GameId::ABSENT,
                        owner_team: Team::FFA,
                        applied_once: false,
                    },
                ));
            }
            EnvironmentalEventKind::Earthquake => {
                commands.spawn((
                    id,
                    EntityKind::FieldEffect,
                    FieldEffect {
                        kind: FieldEffectType::Earthquake,
                        center: *point,
                        radius: 80.0,
                        damage_per_tick: config.earthquake_damage,
                        duration: FieldEffectType::Earthquake.default_duration(),
                        remaining: FieldEffectType::Earthquake.default_duration(),
                        owner_id: crate::ids::GameId::ABSENT,
                        owner_team: Team::FFA,
                        applied_once: false,
                    },
                ));
            }
        }
    }
}

fn event_label(kind: EnvironmentalEventKind) -> &'static str {
    match kind {
        EnvironmentalEventKind::MeteorShower => "a meteor shower",
        EnvironmentalEventKind::SupplyDrop => "a supply drop",
        EnvironmentalEventKind::VolcanicEruption => "a volcanic eruption",
        EnvironmentalEventKind::IonStorm => "an ion storm",
        EnvironmentalEventKind::Earthquake => "an earthquake",
    }
}
