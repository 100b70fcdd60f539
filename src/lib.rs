//! # Arena Room Core
//!
//! Fixed-tick room simulation core for a multiplayer arena-combat server.
//!
//! This crate owns everything described as "in scope" by the room
//! simulation specification: the tick loop, the entity model, collision
//! dispatch, weapon/utility/bullet-effect pipelines, the rule system, and
//! snapshot/event fan-out. The HTTP/lobby layer, the streaming-message
//! transport, persistence, and the 2D rigid-body engine itself
//! (`avian2d`, used as a dependency) are external collaborators.
//!
//! ## Quick start
//! ```rust,no_run
//! use arena_room_core::config::RoomConfig;
//! use arena_room_core::game_loop::GameLoop;
//!
//! let mut room = GameLoop::new(RoomConfig::default(), 42);
//! loop {
//!     match room.tick() {
//!         Ok((snapshot, events)) => {
//!             // broadcast `snapshot` and fan out `events` (out of scope here)
//!             let _ = (snapshot, events);
//!         }
//!         Err(err) if err.is_fatal() => break,
//!         Err(_) => continue,
//!     }
//!     if room.is_terminated() {
//!         break;
//!     }
//! }
//! ```

pub mod components;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod glossary;
pub mod ids;
pub mod network;
pub mod resources;
pub mod snapshot;
pub mod systems;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::RoomConfig;
    pub use crate::error::RoomError;
    pub use crate::game_loop::{GameLoop, RoomPlugin};
    pub use crate::ids::{GameId, IdAllocator, PlayerId};
}
