//! Static convex shapes, including temporary player-placed barriers (§3 "Obstacle/Barrier").

use bevy::prelude::*;

use crate::ids::GameId;

/// Cached client-renderable shape descriptor. The physics collider is the
/// authority for collision; this is purely what `SnapshotBuilder` forwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDescriptor {
    Circle { radius: f32 },
    Box { half_extents: Vec2 },
}

#[derive(Component, Debug, Clone)]
pub struct Obstacle {
    pub owner: Option<GameId>,
    /// `None` means permanent (map geometry); `Some` counts down for
    /// player-placed barriers.
    pub lifespan_remaining: Option<f32>,
    pub bounding_radius: f32,
    pub shape: ShapeDescriptor,
    /// Opaque obstacles clip beam `effective_end` and dismiss non-bouncy
    /// projectiles; transparent ones (e.g. decorative) do neither.
    pub blocks_beams: bool,
}

impl Obstacle {
    pub fn tick_lifespan(&mut self, dt: f32) -> bool {
        match &mut self.lifespan_remaining {
            Some(remaining) => {
                *remaining -= dt;
                *remaining <= 0.0
            }
            None => false,
        }
    }
}
