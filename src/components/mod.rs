//! Entity model (§3 DATA MODEL, §9 "Inheritance → variants").

pub mod entity;
pub mod field_effect;
pub mod obstacle;
pub mod player;
pub mod projectile;
pub mod utility;
pub mod weapon;

pub use entity::{EntityKind, Owner, Team, Vitals};
pub use field_effect::{FieldEffect, FieldEffectType};
pub use obstacle::{Obstacle, ShapeDescriptor};
pub use player::{Player, PrimaryWeaponOwner, StatusEffect, UtilityWeapon};
pub use projectile::{Beam, Projectile};
pub use utility::{
    Flag, FlagState, Headquarters, KothZone, KothZoneState, NetTrap, PowerUp, PowerUpType,
    TeleportPad, Turret, Workshop,
};
pub use weapon::{BulletEffect, Weapon};
