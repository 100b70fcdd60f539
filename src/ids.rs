//! Process-wide monotonic entity identifiers.
//!
//! All entities, effects, and projectiles share one 32-bit id namespace that
//! skips 0 (0 is reserved to mean "absent"). Player ids are a disjoint,
//! also-monotonic subspace so a `GameId` can never be mistaken for a player
//! reference or vice versa.

use std::sync::atomic::{AtomicU32, Ordering};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable, network-safe identity for a simulated entity.
///
/// Bevy's own [`Entity`] is reused internally for archetype storage and
/// querying, but it is never serialized to clients: its generation/index
/// encoding is an implementation detail of this process. `GameId` is the
/// wire-stable handle every cross-entity reference (teleport pad partners,
/// projectile owners, KOTH occupancy) is expressed in terms of.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u32);

impl GameId {
    /// The reserved "absent" id. No live entity is ever assigned this value.
    pub const ABSENT: GameId = GameId(0);

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }
}

/// Disjoint subspace reserved for player identities.
///
/// `PlayerId` and `GameId` never compare equal even if their inner integers
/// coincide; they are allocated from separate counters precisely so a
/// projectile's `owner_id` can't accidentally alias a player id.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Process-wide atomic counters backing [`GameId`] and [`PlayerId`].
///
/// One allocator is shared by every room in the process (§5: "the entity id
/// allocator is process-wide atomic"). Constructed once at process start and
/// cloned (cheaply, it's just two `Arc`-free atomics behind a resource) into
/// each room.
#[derive(Resource)]
pub struct IdAllocator {
    next_entity: AtomicU32,
    next_player: AtomicU32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_entity: AtomicU32::new(1),
            next_player: AtomicU32::new(1),
        }
    }
}

impl IdAllocator {
    pub fn alloc_entity(&self) -> GameId {
        let id = self.next_entity.fetch_add(1, Ordering::Relaxed);
        GameId(id)
    }

    pub fn alloc_player(&self) -> PlayerId {
        let id = self.next_player.fetch_add(1, Ordering::Relaxed);
        PlayerId(id)
    }
}
