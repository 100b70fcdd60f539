//! Common entity record shared by every simulated thing in the room (§3
//! "Entity (abstract)").
//!
//! The source models this as an abstract base class with many subtypes; per
//! §9 ("Inheritance → variants") we keep the common fields as one component
//! (`Vitals`) plus a tagged `EntityKind` marker, and let per-kind data live
//! in its own component type. Bevy's archetype storage is the "dense arena
//! per kind" the design note asks for: a `Query<&Projectile>` only visits
//! entities that actually have a `Projectile` component.

use bevy::prelude::*;

use crate::ids::GameId;

/// Common bookkeeping fields every entity carries.
#[derive(Component, Debug, Clone, Copy)]
pub struct Vitals {
    pub health: f32,
    pub max_health: f32,
    pub active: bool,
    pub created_at: f64,
    pub last_updated_at: f64,
}

impl Vitals {
    pub fn new(now: f64) -> Self {
        Self::with_max_health(100.0, now)
    }

    pub fn with_max_health(max_health: f32, now: f64) -> Self {
        Self {
            health: max_health,
            max_health,
            active: true,
            created_at: now,
            last_updated_at: now,
        }
    }

    pub fn indestructible(now: f64) -> Self {
        Self {
            health: f32::INFINITY,
            max_health: f32::INFINITY,
            ..Self::new(now)
        }
    }

    /// `active=false` can never return to `true` for most entity kinds (§3
    /// invariant: projectiles, beams, field effects, obstacles). Players and
    /// headquarters are the documented exception, handled by [`Self::reactivate`]
    /// under `rule_system`'s respawn policy, never by this path.
    pub fn deactivate(&mut self, now: f64) {
        self.active = false;
        self.last_updated_at = now;
    }

    /// Brings a dead player (or un-destroys a headquarters, if ever needed)
    /// back to full health. Only `rule_system`'s respawn handling calls this;
    /// every other system treats `active=false` as terminal.
    pub fn reactivate(&mut self, now: f64) {
        self.health = self.max_health;
        self.active = true;
        self.last_updated_at = now;
    }

    pub fn apply_damage(&mut self, amount: f32, now: f64) {
        if !self.health.is_infinite() {
            self.health = (self.health - amount).max(0.0);
        }
        self.last_updated_at = now;
        if self.health <= 0.0 {
            self.deactivate(now);
        }
    }

    /// Heals without exceeding `max_health`; never reactivates an inactive
    /// entity (§3 invariant: `active=false` can never return to `true`).
    pub fn apply_heal(&mut self, amount: f32, now: f64) {
        if !self.health.is_infinite() {
            self.health = (self.health + amount).min(self.max_health);
        }
        self.last_updated_at = now;
    }
}

/// Tagged discriminant used by the collision dispatcher to select a handler
/// without inspecting which component set an entity happens to carry.
/// Mirrors §9's "(KindA, KindB) → handler switch driven by a static table".
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Projectile,
    Beam,
    FieldEffect,
    Obstacle,
    Turret,
    TeleportPad,
    NetProjectile,
    KothZone,
    Workshop,
    PowerUp,
    Headquarters,
    Flag,
}

/// Team identity. `0` means free-for-all (hits/benefits everyone but the owner).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Team(pub u8);

impl Team {
    pub const FFA: Team = Team(0);

    pub fn is_ffa(self) -> bool {
        self.0 == 0
    }

    /// Friendly-fire filtering rule used at both the collision site and the
    /// damage-accounting site (§9 open question: HQ friendly fire must be
    /// checked at both, not just on collision).
    pub fn is_friendly_to(self, other: Team) -> bool {
        !self.is_ffa() && self == other
    }
}

/// Owning entity reference, expressed by id rather than a live handle (§9
/// "Cyclic/back-references": all cross-entity links are by id).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub id: GameId,
    pub team: Team,
}
