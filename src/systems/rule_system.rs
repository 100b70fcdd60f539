//! Round/rest phase state machine, scoring, victory, respawn policy, KOTH
//! per-zone scoring, HQ damage scoring, VIP tracking, random weapon rotation
//! (§4.5 RuleSystem).

use std::collections::HashMap;

use bevy::prelude::*;
use rand::seq::IteratorRandom;

use crate::components::entity::{Team, Vitals};
use crate::components::utility::{Flag, FlagState, Headquarters, KothZone, KothZoneState};
use crate::components::{Player, Weapon};
use crate::config::{FIXED_DT, RespawnMode, RoomConfig, ScoreStyle, VictoryCondition};
use crate::glossary::weapon_presets;
use crate::ids::GameId;
use crate::resources::{EventBus, RoomClock, RoomRng};
use crate::network::messages::OutboundEvent;
use crate::systems::collision::HqDamageEvents;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Playing,
    RoundEnd,
    RestPeriod,
    GameOver,
}

/// Room-wide rule/scoring state (§4.5). One instance per room.
#[derive(Resource, Debug, Clone)]
pub struct RuleState {
    pub phase: RoomPhase,
    pub current_round: u32,
    pub round_time_remaining: f32,
    pub rest_time_remaining: f32,
    pub elapsed_game_time: f64,
    pub winning_team: Option<u8>,
    pub draw: bool,
    /// Accumulated HQ-damage and destruction bonus, by attacking team.
    pub hq_bonus: HashMap<u8, f32>,
    /// Accumulated VIP-kill bonus, by killer's team.
    pub vip_bonus: HashMap<u8, f32>,
    pub vip_by_team: HashMap<u8, GameId>,
    pub weapon_rotation_timer: f32,
}

impl RuleState {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            phase: RoomPhase::Playing,
            current_round: 1,
            round_time_remaining: config.round_duration,
            rest_time_remaining: 0.0,
            elapsed_game_time: 0.0,
            winning_team: None,
            draw: false,
            hq_bonus: HashMap::new(),
            vip_bonus: HashMap::new(),
            vip_by_team: HashMap::new(),
            weapon_rotation_timer: config.random_weapon_interval,
        }
    }

    /// Total score for `team` under the configured style (§4.5 "Scoring styles").
    pub fn team_score(&self, team: u8, style: ScoreStyle, kills: &HashMap<u8, u32>, captures: &HashMap<u8, u32>, koth: &HashMap<u8, f32>) -> f32 {
        let k = *kills.get(&team).unwrap_or(&0) as f32;
        let c = *captures.get(&team).unwrap_or(&0) as f32;
        let z = *koth.get(&team).unwrap_or(&0.0);
        let hq = *self.hq_bonus.get(&team).unwrap_or(&0.0);
        let vip = *self.vip_bonus.get(&team).unwrap_or(&0.0);
        match style {
            ScoreStyle::TotalKills => k,
            ScoreStyle::Objective => c + z + hq,
            ScoreStyle::Total => k + c + z + hq + vip,
            ScoreStyle::Captures => c,
        }
    }
}

fn team_kills(players: &Query<(&GameId, &Team, &Player, &Vitals)>) -> HashMap<u8, u32> {
    let mut out = HashMap::new();
    for (_, team, player, _) in players.iter() {
        *out.entry(team.0).or_insert(0) += player.kills;
    }
    out
}

fn team_captures(players: &Query<(&GameId, &Team, &Player, &Vitals)>) -> HashMap<u8, u32> {
    let mut out = HashMap::new();
    for (_, team, player, _) in players.iter() {
        *out.entry(team.0).or_insert(0) += player.captures;
    }
    out
}

fn team_koth_points(zones: &Query<&mut KothZone>) -> HashMap<u8, f32> {
    let mut out = HashMap::new();
    for zone in zones.iter() {
        for (team, points) in &zone.team_scores {
            *out.entry(*team).or_insert(0.0) += points;
        }
    }
    out
}

/// Distinct teams represented by at least one connected (spectator or not)
/// player, used to enumerate candidates for scoring/victory checks.
fn known_teams(players: &Query<(&GameId, &Team, &Player, &Vitals)>) -> Vec<u8> {
    let mut teams: Vec<u8> = players.iter().map(|(_, t, _, _)| t.0).filter(|t| *t != 0).collect();
    teams.sort_unstable();
    teams.dedup();
    teams
}

/// §4.5 "Per-tick update": drives `PLAYING → ROUND_END → REST_PERIOD →
/// PLAYING`/`GAME_OVER`, checking the configured victory predicate while
/// `PLAYING`.
pub fn advance_round_phase(
    mut state: ResMut<RuleState>,
    config: Res<RoomConfig>,
    mut events: ResMut<EventBus>,
    mut zones: Query<&mut KothZone>,
    mut flags: Query<&mut Flag>,
    players: Query<(&GameId, &Team, &Player, &Vitals)>,
) {
    state.elapsed_game_time += FIXED_DT as f64;

    match state.phase {
        RoomPhase::Playing => {
            state.round_time_remaining -= FIXED_DT;
            if let Some(winner) = check_victory(&state, &config, &players, &zones) {
                state.phase = RoomPhase::GameOver;
                state.winning_team = winner;
                state.draw = winner.is_none();
                events.push(match winner {
                    Some(team) => OutboundEvent::system(format!("game over: team {team} wins")),
                    None => OutboundEvent::system("game over: draw"),
                });
            } else if state.round_time_remaining <= 0.0 {
                state.phase = RoomPhase::RoundEnd;
            }
        }
        RoomPhase::RoundEnd => {
            for mut zone in zones.iter_mut() {
                zone.reset();
            }
            for mut flag in flags.iter_mut() {
                flag.carried_by = None;
                flag.state = FlagState::AtHome;
            }
            state.rest_time_remaining = config.rest_duration;
            state.phase = RoomPhase::RestPeriod;
            events.push(OutboundEvent::system(format!("round {} ended", state.current_round)));
        }
        RoomPhase::RestPeriod => {
            state.rest_time_remaining -= FIXED_DT;
            if state.rest_time_remaining <= 0.0 {
                state.current_round += 1;
                state.round_time_remaining = config.round_duration;
                state.phase = RoomPhase::Playing;
                events.push(OutboundEvent::system(format!("round {} begins", state.current_round)));
            }
        }
        RoomPhase::GameOver => {}
    }
}

fn check_victory(
    state: &RuleState,
    config: &RoomConfig,
    players: &Query<(&GameId, &Team, &Player, &Vitals)>,
    zones: &Query<&mut KothZone>,
) -> Option<Option<u8>> {
    match config.victory_condition {
        VictoryCondition::Endless => None,
        VictoryCondition::Elimination => {
            let mut remaining: Vec<u8> = Vec::new();
            for team in known_teams(players) {
                let has_survivor = players.iter().any(|(_, t, p, _)| t.0 == team && !p.eliminated);
                if has_survivor {
                    remaining.push(team);
                }
            }
            if remaining.len() == 1 {
                Some(Some(remaining[0]))
            } else {
                None
            }
        }
        VictoryCondition::ScoreLimit => {
            let kills = team_kills(players);
            let captures = team_captures(players);
            let koth = team_koth_points(zones);
            let teams = known_teams(players);
            let fired = teams
                .iter()
                .any(|t| state.team_score(*t, config.score_style, &kills, &captures, &koth) >= config.score_limit);
            if fired {
                Some(tie_break(state, config, &teams, &kills, &captures, &koth))
            } else {
                None
            }
        }
        VictoryCondition::TimeLimit => {
            if state.elapsed_game_time >= config.time_limit as f64 {
                let kills = team_kills(players);
                let captures = team_captures(players);
                let koth = team_koth_points(zones);
                let teams = known_teams(players);
                Some(tie_break(state, config, &teams, &kills, &captures, &koth))
            } else {
                None
            }
        }
    }
}

/// Highest-score wins; an exact tie among the leaders is a draw (§8 "Tie-break").
fn tie_break(
    state: &RuleState,
    config: &RoomConfig,
    teams: &[u8],
    kills: &HashMap<u8, u32>,
    captures: &HashMap<u8, u32>,
    koth: &HashMap<u8, f32>,
) -> Option<u8> {
    if teams.is_empty() {
        return None;
    }
    let scores: Vec<(u8, f32)> = teams
        .iter()
        .map(|t| (*t, state.team_score(*t, config.score_style, kills, captures, koth)))
        .collect();
    let max = scores.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
    let leaders: Vec<u8> = scores.iter().filter(|(_, s)| (*s - max).abs() < f32::EPSILON).map(|(t, _)| *t).collect();
    if leaders.len() == 1 {
        Some(leaders[0])
    } else {
        None
    }
}

/// §4.5 "Respawn modes": detects players that just died (active went false
/// and haven't been processed yet) and applies the configured policy.
/// Kill/VIP-bonus attribution reads `Player::last_damage_source`.
pub fn process_player_deaths(
    config: Res<RoomConfig>,
    mut state: ResMut<RuleState>,
    mut players: Query<(&GameId, &mut Player, &Vitals)>,
) {
    let mut kill_awards: Vec<(GameId, bool)> = Vec::new();

    for (id, mut player, vitals) in players.iter_mut() {
        if vitals.active || player.eliminated || player.respawn_timer.is_some() {
            continue;
        }
        player.deaths += 1;
        if let Some((killer_id, _killer_team)) = player.last_damage_source.take() {
            if killer_id != *id {
                kill_awards.push((killer_id, player.is_vip));
            }
        }

        match config.respawn_mode {
            RespawnMode::Instant => player.respawn_timer = Some(config.respawn_delay),
            RespawnMode::Wave => {
                let interval = config.wave_respawn_interval.max(0.001);
                let elapsed = (config.round_duration - state.round_time_remaining).max(0.0);
                let into_wave = elapsed % interval;
                let wait = if into_wave <= f32::EPSILON { interval } else { interval - into_wave };
                player.respawn_timer = Some(wait);
            }
            RespawnMode::Limited => {
                if player.lives_remaining > 0 {
                    player.lives_remaining -= 1;
                }
                if player.lives_remaining == 0 {
                    player.eliminated = true;
                } else {
                    player.respawn_timer = Some(config.respawn_delay);
                }
            }
            RespawnMode::Elimination => player.eliminated = true,
        }
    }

    if kill_awards.is_empty() {
        return;
    }
    for (id, mut player, _) in players.iter_mut() {
        let matches: Vec<bool> = kill_awards.iter().filter(|(k, _)| k == id).map(|(_, vip)| *vip).collect();
        if matches.is_empty() {
            continue;
        }
        player.kills += matches.len() as u32;
        if config.enable_vip {
            let vip_kills = matches.iter().filter(|v| **v).count() as f32;
            if vip_kills > 0.0 {
                *state.vip_bonus.entry(player.team).or_insert(0.0) += vip_kills * config.vip_kill_points;
            }
        }
    }
}

/// Counts down `Player::respawn_timer` and reactivates at zero, teleporting
/// to the team-safe spawn point with full health and a fresh weapon (§8
/// scenario 4).
pub fn process_respawn_timers(
    clock: Res<RoomClock>,
    mut players: Query<(&mut Player, &mut Vitals, &mut Transform, &mut Weapon)>,
) {
    let now = clock.game_time;
    for (mut player, mut vitals, mut transform, mut weapon) in players.iter_mut() {
        let Some(remaining) = player.respawn_timer else { continue };
        let next = remaining - FIXED_DT;
        if next <= 0.0 {
            player.respawn_timer = None;
            vitals.reactivate(now);
            transform.translation = player.respawn_point.extend(0.0);
            weapon.current_ammo = weapon.attributes.magazine_size;
            weapon.reloading = false;
            weapon.reload_remaining = 0.0;
        } else {
            player.respawn_timer = Some(next);
        }
    }
}

/// §4.5 "KOTH per-zone update": strict-majority control, capture/decay
/// rates, and frame-rate-independent `points_per_second` scoring.
pub fn update_koth_zone_state(config: Res<RoomConfig>, mut zones: Query<&mut KothZone>) {
    for mut zone in zones.iter_mut() {
        let dominant = zone.dominant_team();
        match dominant {
            Some(team) if zone.controlling_team == team as i32 => {
                zone.state = KothZoneState::Controlled;
                zone.capture_progress = 1.0;
            }
            Some(team) => {
                zone.state = KothZoneState::Capturing;
                let rate = if zone.controlling_team < 0 { 0.5 } else { 0.25 };
                zone.capture_progress = (zone.capture_progress + rate * FIXED_DT).min(1.0);
                if zone.capture_progress >= 1.0 {
                    zone.controlling_team = team as i32;
                    zone.state = KothZoneState::Controlled;
                }
            }
            None => {
                if zone.players_in_zone.is_empty() {
                    if zone.state == KothZoneState::Capturing {
                        zone.capture_progress = (zone.capture_progress - 0.5 * FIXED_DT).max(0.0);
                        if zone.capture_progress <= 0.0 {
                            zone.state = KothZoneState::Neutral;
                        }
                    }
                } else {
                    zone.state = KothZoneState::Contested;
                }
            }
        }

        if zone.state == KothZoneState::Controlled && zone.controlling_team >= 0 {
            let team = zone.controlling_team as u8;
            *zone.team_scores.entry(team).or_insert(0.0) += config.koth_points_per_second * FIXED_DT;
        }
    }
}

/// §4.5 "HQ damage": drains this tick's `HqDamageEvents`, crediting
/// `points_per_damage · dmg` plus a destruction bonus, and ending the game
/// if `headquarters_destruction_ends_game` is set (§8 scenario 5).
pub fn apply_hq_damage_scoring(
    config: Res<RoomConfig>,
    mut state: ResMut<RuleState>,
    mut hq_damage: ResMut<HqDamageEvents>,
    mut events: ResMut<EventBus>,
) {
    for record in hq_damage.0.drain(..) {
        let team = record.attacker_team.0;
        *state.hq_bonus.entry(team).or_insert(0.0) += config.headquarters_points_per_damage * record.damage;
        if record.destroyed {
            *state.hq_bonus.entry(team).or_insert(0.0) += config.headquarters_destruction_bonus;
            events.push(OutboundEvent::system(format!("team {team} destroyed the enemy headquarters")));
            if config.headquarters_destruction_ends_game && state.phase != RoomPhase::GameOver {
                state.phase = RoomPhase::GameOver;
                state.winning_team = Some(team);
                state.draw = false;
                events.push(OutboundEvent::system(format!("game over: team {team} wins")));
            }
        }
    }
}

/// §4.5 "VIP": elects one live, non-spectator player per team as VIP,
/// sticky while alive; reassigned the tick the current VIP stops qualifying.
pub fn maintain_vip_assignments(config: Res<RoomConfig>, mut state: ResMut<RuleState>, mut players: Query<(&GameId, &Team, &mut Player, &Vitals)>) {
    if !config.enable_vip {
        return;
    }
    let eligible: Vec<(u8, GameId)> = players
        .iter()
        .filter(|(_, _, p, v)| v.active && !p.is_spectator && !p.eliminated)
        .map(|(id, team, _, _)| (team.0, *id))
        .collect();

    let teams: Vec<u8> = {
        let mut t: Vec<u8> = eligible.iter().map(|(team, _)| *team).filter(|t| *t != 0).collect();
        t.sort_unstable();
        t.dedup();
        t
    };

    for team in teams {
        let still_valid = state
            .vip_by_team
            .get(&team)
            .is_some_and(|vip_id| eligible.iter().any(|(t, id)| *t == team && id == vip_id));
        if !still_valid {
            if let Some((_, new_vip)) = eligible.iter().find(|(t, _)| *t == team) {
                state.vip_by_team.insert(team, *new_vip);
            } else {
                state.vip_by_team.remove(&team);
            }
        }
    }

    for (id, team, mut player, _) in players.iter_mut() {
        player.is_vip = state.vip_by_team.get(&team.0) == Some(id);
    }
}

/// §4.5 "Random weapon rotation": every `random_weapon_interval` seconds,
/// reassigns each active non-spectator player a random non-healing preset.
pub fn rotate_random_weapons(config: Res<RoomConfig>, mut state: ResMut<RuleState>, mut rng: ResMut<RoomRng>, mut players: Query<(&mut Weapon, &Player, &Vitals)>) {
    if !config.enable_random_weapons {
        return;
    }
    state.weapon_rotation_timer -= FIXED_DT;
    if state.weapon_rotation_timer > 0.0 {
        return;
    }
    state.weapon_rotation_timer = config.random_weapon_interval;

    for (mut weapon, player, vitals) in players.iter_mut() {
        if !vitals.active || player.is_spectator {
            continue;
        }
        if let Some(preset) = weapon_presets::non_healing_presets().iter().choose(&mut rng.0) {
            *weapon = preset.build();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state(cfg: &RoomConfig) -> RuleState {
        RuleState::new(cfg)
    }

    #[test]
    fn tie_break_declares_draw_on_equal_scores() {
        let cfg = RoomConfig::default();
        let state = make_state(&cfg);
        let kills: HashMap<u8, u32> = [(1, 3), (2, 3)].into_iter().collect();
        let captures = HashMap::new();
        let koth = HashMap::new();
        let winner = tie_break(&state, &cfg, &[1, 2], &kills, &captures, &koth);
        assert_eq!(winner, None);
    }

    #[test]
    fn tie_break_picks_strict_leader() {
        let cfg = RoomConfig::default();
        let state = make_state(&cfg);
        let kills: HashMap<u8, u32> = [(1, 5), (2, 3)].into_iter().collect();
        let captures = HashMap::new();
        let koth = HashMap::new();
        let winner = tie_break(&state, &cfg, &[1, 2], &kills, &captures, &koth);
        assert_eq!(winner, Some(1));
    }

    #[test]
    fn koth_zone_scores_only_while_controlled() {
        let cfg = RoomConfig {
            koth_points_per_second: 5.0,
            ..Default::default()
        };
        let mut zone = KothZone::new(0, 5.0);
        zone.controlling_team = 1;
        zone.state = KothZoneState::Controlled;
        *zone.team_scores.entry(1).or_insert(0.0) += cfg.koth_points_per_second * FIXED_DT;
        assert!((zone.team_scores[&1] - 5.0 / 60.0).abs() < 1e-6);
    }
}
