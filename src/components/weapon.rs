//! Weapon runtime state attached to a player (§3 "Weapon", §4.3 WeaponSystem).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::glossary::{OrdinanceKind, WeaponAttributes};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletEffect {
    Explosive,
    Incendiary,
    Electric,
    Freezing,
    Poison,
    Fragmenting,
    Piercing,
    Homing,
    Bouncy,
}

/// The live, fireable instance of a weapon a player currently wields.
///
/// `attributes` is derived once (on spawn or `configChange`) from a
/// [`WeaponConfig`](crate::glossary::WeaponConfig); everything else here is
/// mutable fire-control state built on a `last_fire_time`/`can_fire` gate,
/// generalized to ammo/reload instead of a bare fire-rate check.
#[derive(Component, Debug, Clone)]
pub struct Weapon {
    pub attributes: WeaponAttributes,
    pub ordinance: OrdinanceKind,
    pub bullet_effects: HashSet<BulletEffect>,
    pub current_ammo: i32,
    pub reloading: bool,
    pub reload_remaining: f32,
}

impl Weapon {
    pub fn new(attributes: WeaponAttributes, ordinance: OrdinanceKind, bullet_effects: HashSet<BulletEffect>) -> Self {
        let magazine = attributes.magazine_size;
        Self {
            attributes,
            ordinance,
            bullet_effects,
            current_ammo: magazine,
            reloading: false,
            reload_remaining: 0.0,
        }
    }

    /// §4.3 fire gating: wall-clock fire-rate gate (the *only* wall-clock
    /// gameplay timer, per §5/§9) plus ammo/reload/active checks.
    pub fn can_fire(&self, now: f64, last_shot_wall_time: f64, active: bool) -> bool {
        if !active || self.reloading || self.current_ammo <= 0 {
            return false;
        }
        let min_interval_ms = 1000.0 / self.attributes.fire_rate as f64;
        (now - last_shot_wall_time) * 1000.0 >= min_interval_ms
    }

    pub fn begin_reload(&mut self) {
        if !self.reloading {
            self.reloading = true;
            self.reload_remaining = self.attributes.reload_time;
        }
    }

    /// Advances the reload timer using `dt` (gameplay timers use `dt`, never
    /// wall-clock, except the fire-rate gate; §5/§9).
    pub fn tick_reload(&mut self, dt: f32) {
        if self.reloading {
            self.reload_remaining -= dt;
            if self.reload_remaining <= 0.0 {
                self.reloading = false;
                self.current_ammo = self.attributes.magazine_size;
                self.reload_remaining = 0.0;
            }
        }
    }

    pub fn consume_ammo(&mut self, n: i32) {
        self.current_ammo = (self.current_ammo - n).max(0);
        if self.current_ammo == 0 && !self.reloading {
            self.begin_reload();
        }
    }
}
