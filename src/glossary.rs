//! Weapon point-allocation attribute curves and the ordinance/bullet-effect
//! catalogs (§ GLOSSARY, §6 "REST/metadata" collaborator contract).
//!
//! These are pure functions of integer point allocation; they carry no
//! state and are reused by both `WeaponSystem` (building a live [`Weapon`]
//! from a [`WeaponConfig`]) and the out-of-core REST metadata endpoint
//! (whose implementation lives with the HTTP collaborator, not here — we
//! only supply the catalog data it would serialize).

use serde::{Deserialize, Serialize};

use crate::components::weapon::BulletEffect;

/// Client-submitted point allocation across weapon attributes. Total points
/// must not exceed 100 (§3 Weapon, §8 configChange idempotence).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponConfig {
    pub damage_points: i32,
    pub fire_rate_points: i32,
    pub range_points: i32,
    pub accuracy_points: i32,
    pub magazine_points: i32,
    pub reload_points: i32,
    pub projectile_speed_points: i32,
    pub bullets_per_shot_points: i32,
    pub ordinance: OrdinanceKind,
    pub bullet_effects: Vec<BulletEffect>,
}

impl WeaponConfig {
    /// Sum of every point field. Callers must reject configs where this
    /// exceeds 100 (§3 invariant; enforced by `WeaponSystem::apply_config`).
    pub fn total_points(&self) -> i32 {
        self.damage_points
            + self.fire_rate_points
            + self.range_points
            + self.accuracy_points
            + self.magazine_points
            + self.reload_points
            + self.projectile_speed_points
            + self.bullets_per_shot_points
    }
}

/// Derives the curve values listed in the GLOSSARY from a point allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponAttributes {
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
    pub accuracy: f32,
    pub magazine_size: i32,
    pub reload_time: f32,
    pub projectile_speed: f32,
    pub bullets_per_shot: i32,
}

impl WeaponAttributes {
    pub fn from_config(cfg: &WeaponConfig) -> Self {
        let p = |points: i32| points as f32;
        Self {
            damage: 10.0 + p(cfg.damage_points),
            fire_rate: 1.0 + 0.5 * p(cfg.fire_rate_points),
            range: 1000.0 + 200.0 * p(cfg.range_points),
            accuracy: (1.0 + 0.02 * p(cfg.accuracy_points)).clamp(0.0, 1.0),
            magazine_size: (5 + cfg.magazine_points).max(1),
            reload_time: (4.0 - 0.14 * p(cfg.reload_points)).max(0.1),
            projectile_speed: 200.0 + 50.0 * p(cfg.projectile_speed_points),
            bullets_per_shot: (1 + cfg.bullets_per_shot_points / 3).max(1),
        }
    }
}

/// Kind of kinetic output a weapon produces (GLOSSARY "Ordinance").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrdinanceKind {
    Bullet,
    Dart,
    Rocket,
    Grenade,
    PlasmaBolt,
    Cannonball,
    Laser,
    Railgun,
    PlasmaBeam,
    HealBeam,
}

impl OrdinanceKind {
    pub fn is_beam(self) -> bool {
        matches!(
            self,
            OrdinanceKind::Laser
                | OrdinanceKind::Railgun
                | OrdinanceKind::PlasmaBeam
                | OrdinanceKind::HealBeam
        )
    }

    pub fn is_healing(self) -> bool {
        matches!(self, OrdinanceKind::HealBeam)
    }

    /// Railgun beams pierce obstacles instead of clipping at the first
    /// opaque one (§4.3 "Beam fire").
    pub fn pierces_obstacles(self) -> bool {
        matches!(self, OrdinanceKind::Railgun)
    }
}

/// Static shape/behavior parameters for an ordinance kind (§3 Ordinance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrdinanceProfile {
    pub size: f32,
    pub speed_multiplier: f32,
    pub point_cost: i32,
    pub has_trail: bool,
    pub is_beam: bool,
    pub damage_application: DamageApplication,
    pub damage_interval: f32,
    pub beam_duration: f32,
    /// `avian2d` `LinearDamping` coefficient applied to the spawned
    /// projectile's rigid body. Heavier ordinance (grenades, cannonballs)
    /// bleeds off speed fast enough to cross its `min_velocity` dismissal
    /// floor (§3 Projectile) well before `ttl_seconds` expires; beams don't
    /// move under physics at all, so this is `0.0` for every beam ordinance.
    pub linear_damping: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageApplication {
    Instant,
    Dot,
    Burst,
}

pub fn ordinance_profile(kind: OrdinanceKind) -> OrdinanceProfile {
    use OrdinanceKind::*;
    match kind {
        Bullet => OrdinanceProfile {
            size: 0.1,
            speed_multiplier: 1.0,
            point_cost: 0,
            has_trail: false,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.0,
        },
        Dart => OrdinanceProfile {
            size: 0.08,
            speed_multiplier: 0.8,
            point_cost: 2,
            has_trail: false,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.05,
        },
        Rocket => OrdinanceProfile {
            size: 0.3,
            speed_multiplier: 0.6,
            point_cost: 12,
            has_trail: true,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.15,
        },
        Grenade => OrdinanceProfile {
            size: 0.25,
            speed_multiplier: 0.5,
            point_cost: 8,
            has_trail: false,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.6,
        },
        PlasmaBolt => OrdinanceProfile {
            size: 0.2,
            speed_multiplier: 1.2,
            point_cost: 10,
            has_trail: true,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.02,
        },
        Cannonball => OrdinanceProfile {
            size: 0.4,
            speed_multiplier: 0.4,
            point_cost: 15,
            has_trail: false,
            is_beam: false,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.0,
            linear_damping: 0.8,
        },
        Laser => OrdinanceProfile {
            size: 0.05,
            speed_multiplier: 1.0,
            point_cost: 14,
            has_trail: true,
            is_beam: true,
            damage_application: DamageApplication::Dot,
            damage_interval: 0.0,
            beam_duration: 0.5,
            linear_damping: 0.0,
        },
        Railgun => OrdinanceProfile {
            size: 0.05,
            speed_multiplier: 1.0,
            point_cost: 20,
            has_trail: true,
            is_beam: true,
            damage_application: DamageApplication::Instant,
            damage_interval: 0.0,
            beam_duration: 0.1,
            linear_damping: 0.0,
        },
        PlasmaBeam => OrdinanceProfile {
            size: 0.08,
            speed_multiplier: 1.0,
            point_cost: 16,
            has_trail: true,
            is_beam: true,
            damage_application: DamageApplication::Burst,
            damage_interval: 0.2,
            beam_duration: 1.0,
            linear_damping: 0.0,
        },
        HealBeam => OrdinanceProfile {
            size: 0.08,
            speed_multiplier: 1.0,
            point_cost: 6,
            has_trail: false,
            is_beam: true,
            damage_application: DamageApplication::Dot,
            damage_interval: 0.0,
            beam_duration: 1.0,
            linear_damping: 0.0,
        },
    }
}

/// Fixed, non-negotiable point cost and priority rank of each bullet effect
/// (§3 Bullet Effect). Priority is the order `BulletEffectProcessor` expands
/// non-fragmenting effects in (§4.4 step 2).
pub fn bullet_effect_point_cost(effect: BulletEffect) -> i32 {
    use BulletEffect::*;
    match effect {
        Explosive => 10,
        Incendiary => 8,
        Electric => 9,
        Freezing => 7,
        Poison => 7,
        Fragmenting => 12,
        Piercing => 11,
        Homing => 14,
        Bouncy => 5,
    }
}

pub const BULLET_EFFECT_EXPANSION_PRIORITY: [BulletEffect; 5] = [
    BulletEffect::Explosive,
    BulletEffect::Incendiary,
    BulletEffect::Electric,
    BulletEffect::Freezing,
    BulletEffect::Poison,
];

/// Fixed weapon loadouts `rule_system::rotate_random_weapons` draws from
/// (§4.5 "Random weapon rotation"). Each preset is a fully-formed
/// `WeaponConfig`, so rotation just rebuilds a [`Weapon`](crate::components::Weapon)
/// from it the same way `WeaponSystem::apply_config` would.
pub mod weapon_presets {
    use std::collections::HashSet;

    use crate::components::Weapon;
    use crate::components::weapon::BulletEffect;

    use super::{OrdinanceKind, WeaponAttributes, WeaponConfig};

    pub struct WeaponPreset {
        pub name: &'static str,
        pub config: WeaponConfig,
    }

    impl WeaponPreset {
        pub fn build(&self) -> Weapon {
            let attributes = WeaponAttributes::from_config(&self.config);
            let effects: HashSet<BulletEffect> = self.config.bullet_effects.iter().copied().collect();
            Weapon::new(attributes, self.config.ordinance, effects)
        }
    }

    fn config(
        ordinance: OrdinanceKind,
        damage: i32,
        fire_rate: i32,
        range: i32,
        accuracy: i32,
        magazine: i32,
        reload: i32,
        speed: i32,
        bullets: i32,
        bullet_effects: Vec<BulletEffect>,
    ) -> WeaponConfig {
        WeaponConfig {
            damage_points: damage,
            fire_rate_points: fire_rate,
            range_points: range,
            accuracy_points: accuracy,
            magazine_points: magazine,
            reload_points: reload,
            projectile_speed_points: speed,
            bullets_per_shot_points: bullets,
            ordinance,
            bullet_effects,
        }
    }

    /// Every preset the random-weapon rotation and the default loadout menu
    /// may hand out. Point totals stay within the 100-point cap (§3 Weapon).
    pub fn all_presets() -> Vec<WeaponPreset> {
        vec![
            WeaponPreset {
                name: "pistol",
                config: config(OrdinanceKind::Bullet, 5, 10, 5, 20, 5, 10, 5, 0, vec![]),
            },
            WeaponPreset {
                name: "rifle",
                config: config(OrdinanceKind::Bullet, 15, 20, 15, 15, 10, 10, 10, 0, vec![]),
            },
            WeaponPreset {
                name: "shotgun",
                config: config(OrdinanceKind::Bullet, 10, 5, 0, 0, 5, 5, 0, 15, vec![]),
            },
            WeaponPreset {
                name: "sniper",
                config: config(
                    OrdinanceKind::Bullet,
                    25,
                    0,
                    25,
                    25,
                    0,
                    5,
                    10,
                    0,
                    vec![BulletEffect::Piercing],
                ),
            },
            WeaponPreset {
                name: "rocket_launcher",
                config: config(
                    OrdinanceKind::Rocket,
                    20,
                    0,
                    10,
                    5,
                    5,
                    5,
                    5,
                    0,
                    vec![BulletEffect::Explosive, BulletEffect::Fragmenting],
                ),
            },
            WeaponPreset {
                name: "plasma_rifle",
                config: config(
                    OrdinanceKind::PlasmaBolt,
                    15,
                    15,
                    10,
                    10,
                    10,
                    5,
                    15,
                    0,
                    vec![BulletEffect::Electric],
                ),
            },
            WeaponPreset {
                name: "railgun",
                config: config(OrdinanceKind::Railgun, 30, 0, 20, 20, 0, 10, 0, 0, vec![BulletEffect::Piercing]),
            },
            WeaponPreset {
                name: "plasma_beam",
                config: config(OrdinanceKind::PlasmaBeam, 20, 10, 10, 10, 10, 5, 0, 0, vec![]),
            },
            WeaponPreset {
                name: "heal_beam",
                config: config(OrdinanceKind::HealBeam, 10, 10, 5, 10, 10, 5, 0, 0, vec![]),
            },
        ]
    }

    /// `rotate_random_weapons` never hands a player a healer's loadout (§4.5
    /// "Random weapon rotation excludes healing-classified presets").
    pub fn non_healing_presets() -> Vec<WeaponPreset> {
        all_presets().into_iter().filter(|p| !p.config.ordinance.is_healing()).collect()
    }
}
