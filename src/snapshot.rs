//! Per-tick state snapshot and event fan-out targeting (§2 "SnapshotBuilder +
//! EventBus", §4.1 step 9, §6 "Outbound").
//!
//! Snapshot construction only reads component state — it never mutates the
//! world — so it can run at the very end of the tick after cleanup, giving
//! clients a single consistent end-of-tick view (§5 "Snapshots sent to
//! clients reflect the end-of-tick state only").

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::components::entity::{Team, Vitals};
use crate::components::{
    Beam, FieldEffect, Flag, Headquarters, KothZone, NetTrap, Obstacle, PowerUp, Projectile,
    TeleportPad, Turret, Workshop,
};
use crate::ids::{GameId, PlayerId};
use crate::network::messages::{
    BeamState, EventTarget, FieldEffectState, GenericEntityState, OutboundEvent, OutboundSnapshot,
    PlayerState, ProjectileState,
};
use crate::resources::RoomClock;

/// Builds the full outbound snapshot for this tick from current component
/// state (§6 "Outbound": one array per entity class, minimal per-entity
/// fields).
pub fn build_snapshot(
    clock: Res<RoomClock>,
    players: Query<(&GameId, &Transform, &LinearVelocity, &Vitals, &Team, &crate::components::Player)>,
    projectiles: Query<(&GameId, &Transform, &LinearVelocity, &Projectile)>,
    beams: Query<(&GameId, &Beam)>,
    field_effects: Query<(&GameId, &FieldEffect)>,
    obstacles: Query<(&GameId, &Transform, &Obstacle)>,
    turrets: Query<(&GameId, &Transform, &Vitals, &Turret)>,
    teleport_pads: Query<(&GameId, &Transform, &TeleportPad)>,
    nets: Query<(&GameId, &Transform, &NetTrap)>,
    flags: Query<(&GameId, &Transform, &Flag)>,
    koth_zones: Query<(&GameId, &Transform, &KothZone)>,
    workshops: Query<(&GameId, &Transform, &Workshop)>,
    power_ups: Query<(&GameId, &Transform, &PowerUp)>,
    headquarters: Query<(&GameId, &Transform, &Vitals, &Headquarters)>,
) -> OutboundSnapshot {
    OutboundSnapshot {
        tick: clock.tick,
        players: players
            .iter()
            .map(|(id, transform, velocity, vitals, team, player)| PlayerState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                rotation: transform.rotation.to_euler(EulerRot::XYZ).2,
                velocity: (velocity.x, velocity.y),
                health: vitals.health,
                team: team.0,
                eliminated: player.eliminated,
            })
            .collect(),
        projectiles: projectiles
            .iter()
            .map(|(id, transform, velocity, projectile)| ProjectileState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                velocity: (velocity.x, velocity.y),
                ordinance: format!("{:?}", projectile.ordinance),
            })
            .collect(),
        beams: beams
            .iter()
            .map(|(id, beam)| BeamState {
                id: id.0,
                start: (beam.start.x, beam.start.y),
                effective_end: (beam.effective_end.x, beam.effective_end.y),
            })
            .collect(),
        field_effects: field_effects
            .iter()
            .map(|(id, effect)| FieldEffectState {
                id: id.0,
                kind: format!("{:?}", effect.kind),
                center: (effect.center.x, effect.center.y),
                radius: effect.radius,
                remaining: effect.remaining,
            })
            .collect(),
        obstacles: obstacles
            .iter()
            .map(|(id, transform, obstacle)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: obstacle.bounding_radius,
            })
            .collect(),
        turrets: turrets
            .iter()
            .map(|(id, transform, vitals, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: vitals.health,
            })
            .collect(),
        teleport_pads: teleport_pads
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        nets: nets
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        flags: flags
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        koth_zones: koth_zones
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        workshops: workshops
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        power_ups: power_ups
            .iter()
            .map(|(id, transform, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: 0.0,
            })
            .collect(),
        headquarters: headquarters
            .iter()
            .map(|(id, transform, vitals, _)| GenericEntityState {
                id: id.0,
                position: (transform.translation.x, transform.translation.y),
                health: vitals.health,
            })
            .collect(),
    }
}

/// One connection the outbound transport (out of scope) knows how to reach.
/// `SnapshotBuilder`/`EventBus` only need enough of a connection's identity
/// to resolve event targeting; the socket/session itself belongs to the
/// streaming-message endpoint collaborator (§1).
#[derive(Debug, Clone, Copy)]
pub struct Recipient {
    pub player_id: PlayerId,
    pub team: u8,
    pub is_spectator: bool,
}

/// Resolves an [`OutboundEvent`]'s target selector plus its `exclude` list
/// into the concrete set of recipients it should reach (§6 "a separate event
/// stream carries typed events ... with targeting").
pub fn resolve_recipients(event: &OutboundEvent, connections: &[Recipient]) -> Vec<PlayerId> {
    let excluded = |id: PlayerId| event.exclude.contains(&id.0);
    match &event.target {
        EventTarget::All => connections
            .iter()
            .filter(|c| !c.is_spectator && !excluded(c.player_id))
            .map(|c| c.player_id)
            .collect(),
        EventTarget::Team { ids } => connections
            .iter()
            .filter(|c| !c.is_spectator && ids.contains(&(c.team as u32)) && !excluded(c.player_id))
            .map(|c| c.player_id)
            .collect(),
        EventTarget::Specific { ids } => connections
            .iter()
            .filter(|c| ids.contains(&c.player_id.0) && !excluded(c.player_id))
            .map(|c| c.player_id)
            .collect(),
        EventTarget::Spectators => connections
            .iter()
            .filter(|c| c.is_spectator && !excluded(c.player_id))
            .map(|c| c.player_id)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipients() -> Vec<Recipient> {
        vec![
            Recipient { player_id: PlayerId(1), team: 1, is_spectator: false },
            Recipient { player_id: PlayerId(2), team: 2, is_spectator: false },
            Recipient { player_id: PlayerId(3), team: 1, is_spectator: true },
        ]
    }

    #[test]
    fn all_excludes_spectators_and_explicit_exclude_list() {
        let conns = recipients();
        let event = OutboundEvent {
            exclude: vec![2],
            ..OutboundEvent::system("test")
        };
        let ids = resolve_recipients(&event, &conns);
        assert_eq!(ids, vec![PlayerId(1)]);
    }

    #[test]
    fn team_target_only_reaches_matching_non_spectators() {
        let conns = recipients();
        let event = OutboundEvent {
            target: EventTarget::Team { ids: vec![1] },
            ..OutboundEvent::system("test")
        };
        let ids = resolve_recipients(&event, &conns);
        assert_eq!(ids, vec![PlayerId(1)]);
    }

    #[test]
    fn spectators_target_reaches_only_spectators() {
        let conns = recipients();
        let event = OutboundEvent {
            target: EventTarget::Spectators,
            ..OutboundEvent::system("test")
        };
        let ids = resolve_recipients(&event, &conns);
        assert_eq!(ids, vec![PlayerId(3)]);
    }
}
