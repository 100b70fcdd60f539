//! Process/room-wide resources that aren't part of any single entity (§9
//! "Global state").

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::network::messages::{OutboundEvent, PlayerInputMessage};

/// Wall-clock-independent tick counter plus the accumulated game-time clock
/// used by every gameplay timer (§5/§9: gameplay timers use `dt`, not
/// wall-clock).
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct RoomClock {
    pub tick: u64,
    pub game_time: f64,
    /// Real (wall-clock) time, used only by the fire-rate gate.
    pub wall_time: f64,
}

impl RoomClock {
    pub fn advance(&mut self, dt: f32, wall_dt: f64) {
        self.tick += 1;
        self.game_time += dt as f64;
        self.wall_time += wall_dt;
    }
}

/// Seeded, deterministic RNG shared by every system that needs randomness
/// (spread jitter, fragment angles, event density). Re-seeding with the
/// same value and replaying the same input queue must reproduce identical
/// snapshots (§8 determinism property).
#[derive(Resource)]
pub struct RoomRng(pub StdRng);

impl RoomRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Arena bounds used for out-of-bounds placement checks (§7 placement
/// failure) and random environmental event point selection.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub half_extents: Vec2,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            half_extents: Vec2::new(500.0, 500.0),
        }
    }
}

/// Per-client inbound input queue, drained at-most-latest-per-player each
/// tick (§4.1 step 1). Keyed by player id outside this struct (see
/// [`InputQueues`]); stale entries (older than
/// [`crate::config::INPUT_STALENESS_LIMIT_MS`]) are dropped on drain.
#[derive(Debug, Clone, Default)]
pub struct PlayerInputQueue {
    pub queue: VecDeque<(f64, PlayerInputMessage)>,
}

#[derive(Resource, Debug, Default)]
pub struct InputQueues {
    pub by_player: std::collections::HashMap<crate::ids::PlayerId, PlayerInputQueue>,
}

/// Outbound event fan-out buffer, drained and broadcast once per tick (§4.1
/// step 9, §6 "event stream").
#[derive(Resource, Debug, Default)]
pub struct EventBus {
    pub pending: Vec<OutboundEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: OutboundEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Counts consecutive per-tick failures toward the three-strikes `Fatal`
/// promotion (§7 propagation policy).
#[derive(Resource, Debug, Default)]
pub struct TickFailureCounter(pub u32);
