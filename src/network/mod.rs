//! Wire message shapes and the inbound-dispatch system.

pub mod messages;

use bevy::prelude::*;
use tracing::debug;

use crate::components::{Player, UtilityWeapon, Weapon};
use crate::glossary::WeaponAttributes;
use crate::ids::PlayerId;
use crate::resources::{EventBus, InputQueues};

use messages::{InboundMessage, OutboundEvent};

/// Applies a single already-parsed inbound message for one connection.
///
/// Malformed JSON never reaches this function — that rejection happens at
/// the transport boundary (out of scope) and is logged at `debug` per §7.
/// What lands here is the rule-violation class: e.g. a spectator attempting
/// `configChange`.
pub fn apply_inbound_message(
    message: InboundMessage,
    player_id: PlayerId,
    players: &mut Query<(&PlayerId, &mut Player, &mut Weapon)>,
    input_queues: &mut InputQueues,
    event_bus: &mut EventBus,
    wall_now: f64,
) {
    match message {
        InboundMessage::Ping => {
            // Reply is the transport's job; nothing to mutate here.
        }
        InboundMessage::ConfigChange { weapon, utility } => {
            let Some((_, mut player, mut current_weapon)) =
                players.iter_mut().find(|(id, _, _)| **id == player_id)
            else {
                return;
            };
            if player.is_spectator {
                debug!(?player_id, "rejected configChange from spectator");
                event_bus.push(OutboundEvent::system("spectators cannot change loadout"));
                return;
            }
            if weapon.total_points() > 100 {
                debug!(?player_id, total = weapon.total_points(), "configChange exceeds point budget");
                event_bus.push(OutboundEvent::system("weapon config exceeds point budget"));
                return;
            }
            let attributes = WeaponAttributes::from_config(&weapon);
            let bullet_effects = weapon.bullet_effects.iter().copied().collect();
            *current_weapon = Weapon::new(attributes, weapon.ordinance, bullet_effects);

            match UtilityWeapon::from_wire_name(&utility) {
                Some(slot) => player.utility_slot = Some(slot),
                None => {
                    debug!(?player_id, utility, "configChange named an unknown utility, keeping prior slot");
                    event_bus.push(OutboundEvent::system("unknown utility weapon name"));
                }
            }
        }
        InboundMessage::PlayerInput(input) => {
            let queue = input_queues.by_player.entry(player_id).or_default();
            queue.queue.push_back((wall_now, input));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::player::UtilityWeapon;
    use crate::glossary::{OrdinanceKind, WeaponAttributes, WeaponConfig};
    use bevy::ecs::system::SystemState;
    use std::collections::HashSet;

    fn base_weapon_config() -> WeaponConfig {
        WeaponConfig {
            damage_points: 10,
            fire_rate_points: 0,
            range_points: 0,
            accuracy_points: 0,
            magazine_points: 0,
            reload_points: 0,
            projectile_speed_points: 0,
            bullets_per_shot_points: 0,
            ordinance: OrdinanceKind::Bullet,
            bullet_effects: Vec::new(),
        }
    }

    fn config_change(utility: &str) -> InboundMessage {
        InboundMessage::ConfigChange {
            weapon: base_weapon_config(),
            utility: utility.to_string(),
        }
    }

    fn spawn_player(world: &mut World) -> (Entity, PlayerId) {
        let id = PlayerId(1);
        let entity = world
            .spawn((
                id,
                Player::new("p1".into(), 1, Vec2::ZERO),
                Weapon::new(WeaponAttributes::from_config(&base_weapon_config()), OrdinanceKind::Bullet, HashSet::new()),
            ))
            .id();
        (entity, id)
    }

    /// Runs `apply_inbound_message` against a bare `World` via `SystemState`,
    /// the way a bevy system harness would, without pulling in the full
    /// `GameLoop`/`RoomPlugin` schedule.
    fn apply(world: &mut World, message: InboundMessage, player_id: PlayerId) {
        let mut state: SystemState<(Query<(&PlayerId, &mut Player, &mut Weapon)>, ResMut<InputQueues>, ResMut<EventBus>)> =
            SystemState::new(world);
        let (mut players, mut input_queues, mut event_bus) = state.get_mut(world);
        apply_inbound_message(message, player_id, &mut players, &mut input_queues, &mut event_bus, 0.0);
        state.apply(world);
    }

    #[test]
    fn config_change_applies_both_weapon_and_utility_slot() {
        let mut world = World::new();
        world.init_resource::<InputQueues>();
        world.init_resource::<EventBus>();
        let (entity, player_id) = spawn_player(&mut world);

        apply(&mut world, config_change("turret"), player_id);

        let player = world.get::<Player>(entity).unwrap();
        assert_eq!(player.utility_slot, Some(UtilityWeapon::TurretDeployer));
        let weapon = world.get::<Weapon>(entity).unwrap();
        assert_eq!(weapon.attributes.damage, 20.0);
    }

    #[test]
    fn config_change_with_unknown_utility_keeps_prior_slot() {
        let mut world = World::new();
        world.init_resource::<InputQueues>();
        world.init_resource::<EventBus>();
        let (entity, player_id) = spawn_player(&mut world);
        world.get_mut::<Player>(entity).unwrap().utility_slot = Some(UtilityWeapon::NetLauncher);

        apply(&mut world, config_change("not-a-real-utility"), player_id);

        let player = world.get::<Player>(entity).unwrap();
        assert_eq!(player.utility_slot, Some(UtilityWeapon::NetLauncher));
    }
}
