use std::time::{Duration, Instant};

use lineup_terminal::matches::Match;
use lineup_terminal::state::{
    AppState, Delta, PlayerStat, PlayerStatus, StatBundle, ToastLevel, apply_delta,
};

fn sample_match(id: &str, p1: &str) -> Match {
    Match {
        id: id.to_string(),
        player1_name: p1.to_string(),
        player2_name: "Opponent".to_string(),
        start_time: "2026-06-01T12:00:00".to_string(),
        surface: "Hard".to_string(),
        p1_odds: -110,
        p2_odds: -110,
        market_vig: None,
        last_simulated_at: None,
        sim_win_prob_p1: None,
    }
}

fn sample_player(id: &str) -> PlayerStat {
    PlayerStat {
        id: id.to_string(),
        name: id.to_uppercase(),
        team: "DAL".to_string(),
        position: "RB".to_string(),
        salary: 5000,
        stats: StatBundle {
            mean: 10.0,
            floor: 6.0,
            ceiling: 20.0,
            win_probability: 0.5,
        },
        status: PlayerStatus::Active,
    }
}

#[test]
fn set_players_bumps_generation_and_marks_lineups_stale() {
    let mut state = AppState::new();
    state.lineups_stale.set(false);
    apply_delta(&mut state, Delta::SetPlayers(vec![sample_player("a"), sample_player("b")]));

    assert_eq!(state.players.len(), 2);
    assert_eq!(state.players_generation, 1);
    assert!(state.lineups_stale.get());
    assert!(state.logs.back().is_some_and(|l| l.contains("Loaded 2 players")));
}

#[test]
fn set_matches_keeps_selection_by_id() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetMatches(vec![sample_match("m1", "A"), sample_match("m2", "B")]),
    );
    state.match_selected = 1;

    apply_delta(
        &mut state,
        Delta::SetMatches(vec![
            sample_match("m0", "Z"),
            sample_match("m1", "A"),
            sample_match("m2", "B"),
        ]),
    );
    assert_eq!(state.selected_match().map(|m| m.id.as_str()), Some("m2"));
    assert!(!state.matches_loading);
    assert!(state.matches_fetched_at.is_some());
}

#[test]
fn set_matches_resets_selection_when_match_disappears() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::SetMatches(vec![sample_match("m1", "A"), sample_match("m2", "B")]),
    );
    state.match_selected = 1;
    apply_delta(&mut state, Delta::SetMatches(vec![sample_match("m1", "A")]));
    assert_eq!(state.match_selected, 0);
}

#[test]
fn simulation_outcomes_raise_toasts_and_clear_pending() {
    let mut state = AppState::new();
    state.pending_simulations.insert("m1".to_string());
    state.pending_simulations.insert("m2".to_string());

    apply_delta(
        &mut state,
        Delta::SimulationTriggered {
            match_id: "m1".to_string(),
            message: "queued".to_string(),
        },
    );
    apply_delta(
        &mut state,
        Delta::SimulationFailed {
            match_id: "m2".to_string(),
            error: "http 500".to_string(),
        },
    );

    assert!(state.pending_simulations.is_empty());
    let toasts: Vec<(ToastLevel, &str)> = state
        .toasts
        .iter()
        .map(|t| (t.level, t.message.as_str()))
        .collect();
    assert_eq!(
        toasts,
        vec![
            (ToastLevel::Success, "Simulation triggered"),
            (ToastLevel::Error, "Failed to trigger simulation"),
        ]
    );
}

#[test]
fn failed_match_load_leaves_existing_rows() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetMatches(vec![sample_match("m1", "A")]));
    state.matches_loading = true;
    apply_delta(&mut state, Delta::MatchesFailed("timeout".to_string()));

    assert_eq!(state.matches.len(), 1);
    assert!(!state.matches_loading);
    assert_eq!(
        state.toasts.back().map(|t| t.message.as_str()),
        Some("Failed to load matches")
    );
}

#[test]
fn toasts_expire_after_ttl() {
    let mut state = AppState::new();
    state.toast(ToastLevel::Info, "hello");
    state.expire_toasts(Instant::now());
    assert_eq!(state.toasts.len(), 1);
    state.expire_toasts(Instant::now() + Duration::from_secs(5));
    assert!(state.toasts.is_empty());
}

#[test]
fn log_ring_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")));
    }
    assert_eq!(state.logs.len(), lineup_terminal::state::LOG_CAPACITY);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}
