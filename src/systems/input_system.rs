//! Turns queued client input into player intent, then intent into motion
//! (§4.1 steps 1-2: "drain queued player inputs at-most-latest-per-player"
//! / "advance player intents").

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::components::player::StatusEffect;
use crate::components::Player;
use crate::components::entity::Vitals;
use crate::config::INPUT_STALENESS_LIMIT_MS;
use crate::ids::PlayerId;
use crate::network::messages::PlayerInputMessage;
use crate::resources::{InputQueues, RoomClock};

/// Flat multiplier applied while `StatusEffect::Slowed` is active (net traps
/// are the only source of this status today; their own `slow_multiplier`
/// lives on the `NetTrap` deployment, not the player, so this is the
/// player-facing approximation of "caught in a net").
pub const SLOWED_SPEED_MULTIPLIER: f32 = 0.4;

/// Drops stale entries, then applies at most one (the newest) queued input
/// per player this tick. A player with nothing fresh queued keeps whatever
/// intent it already had (no input this tick, not "stop").
pub fn drain_player_inputs(
    clock: Res<RoomClock>,
    mut queues: ResMut<InputQueues>,
    mut players: Query<(&PlayerId, &Transform, &mut Player)>,
) {
    let now = clock.wall_time;
    for (player_id, transform, mut player) in players.iter_mut() {
        let Some(queue) = queues.by_player.get_mut(player_id) else {
            continue;
        };
        queue
            .queue
            .retain(|(ts, _)| (now - ts) * 1000.0 <= INPUT_STALENESS_LIMIT_MS);
        let Some((_, latest)) = queue.queue.back().cloned() else {
            continue;
        };
        queue.queue.clear();
        apply_input_to_player(&mut player, &latest, transform.translation.truncate());
    }
}

fn apply_input_to_player(player: &mut Player, input: &PlayerInputMessage, position: Vec2) {
    player.move_intent = Vec2::new(input.move_x, input.move_y).clamp_length_max(1.0);
    let aim_point = Vec2::new(input.world_x, input.world_y);
    let aim = (aim_point - position).normalize_or_zero();
    if aim != Vec2::ZERO {
        player.aim_unit_vector = aim;
    }
    // `left`/`right` are the client's primary-fire and utility-use buttons;
    // `altFire` has no secondary-fire mode in this ruleset and `shift` has
    // no modifier effect, so both are accepted but unused (§6 inbound
    // contract: unknown/unused fields are ignored, not rejected).
    player.fire_requested_this_tick = input.left;
    player.utility_requested_this_tick = input.right;
    player.reload_requested_this_tick = input.reload;
}

/// Converts `move_intent` into an actual velocity, respecting `max_speed`
/// and slow/freeze status effects (§3 Player, §4.1 step 2).
pub fn apply_movement_intents(mut players: Query<(&Player, &Vitals, &mut LinearVelocity)>) {
    for (player, vitals, mut velocity) in players.iter_mut() {
        if !vitals.active {
            velocity.0 = Vec2::ZERO;
            continue;
        }
        let mut speed = player.max_speed;
        if player.status_effects.contains(&StatusEffect::Frozen) {
            speed = 0.0;
        } else if player.status_effects.contains(&StatusEffect::Slowed) {
            speed *= SLOWED_SPEED_MULTIPLIER;
        }
        velocity.0 = player.move_intent * speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(move_x: f32, move_y: f32, world_x: f32, world_y: f32) -> PlayerInputMessage {
        PlayerInputMessage {
            move_x,
            move_y,
            world_x,
            world_y,
            reload: false,
            left: false,
            right: false,
            alt_fire: false,
            shift: false,
            weapon_switch: None,
        }
    }

    #[test]
    fn move_intent_is_clamped_to_unit_length() {
        let mut player = Player::new("p".into(), 1, Vec2::ZERO);
        apply_input_to_player(&mut player, &input(2.0, 2.0, 10.0, 0.0), Vec2::ZERO);
        assert!(player.move_intent.length() <= 1.0 + f32::EPSILON);
    }

    #[test]
    fn aim_points_from_position_toward_world_target() {
        let mut player = Player::new("p".into(), 1, Vec2::ZERO);
        apply_input_to_player(&mut player, &input(0.0, 0.0, 0.0, 10.0), Vec2::new(0.0, 5.0));
        assert!((player.aim_unit_vector - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn degenerate_aim_point_keeps_previous_direction() {
        let mut player = Player::new("p".into(), 1, Vec2::ZERO);
        player.aim_unit_vector = Vec2::X;
        apply_input_to_player(&mut player, &input(0.0, 0.0, 3.0, 4.0), Vec2::new(3.0, 4.0));
        assert_eq!(player.aim_unit_vector, Vec2::X);
    }
}
