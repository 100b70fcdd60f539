//! Error taxonomy for the room simulation core.
//!
//! The tick body catches everything at the tick boundary: a `RoomError`
//! never unwinds out of [`crate::game_loop::GameLoop::tick`] except
//! [`RoomError::Fatal`], which the hosting scheduler (out of scope here) is
//! expected to treat as "evict this room".

use thiserror::Error;

use crate::ids::GameId;

#[derive(Debug, Error)]
pub enum RoomError {
    /// Bad JSON, missing field. The message is dropped; never reaches game logic.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Spectator input, over-budget weapon config, etc. The offending change
    /// is rejected; prior state is retained.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// Utility deployed inside an obstacle or out of bounds.
    #[error("placement failed for owner {owner:?}: {reason}")]
    PlacementFailure { owner: GameId, reason: String },

    /// Degenerate polygon, zero-length direction, etc. A safe default is
    /// substituted and the tick continues.
    #[error("physics anomaly: {0}")]
    PhysicsAnomaly(String),

    /// Global player cap or per-owner utility cap exceeded.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Simulation step threw, or the room reached an impossible state.
    /// Three consecutive tick failures of any kind are promoted to this.
    #[error("fatal room error: {0}")]
    Fatal(String),
}

impl RoomError {
    /// Whether this error should count toward the three-strikes promotion
    /// to [`RoomError::Fatal`] (§7 propagation policy).
    pub fn counts_as_tick_failure(&self) -> bool {
        !matches!(self, RoomError::MalformedInput(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, RoomError::Fatal(_))
    }
}
