use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;

use lineup_terminal::fake_feed::MockMatchesService;
use lineup_terminal::feed::{self, ProviderSettings};
use lineup_terminal::matches::{Match, MatchesService, SimulationTicket};
use lineup_terminal::state::{AppState, Delta, ProviderCommand, ToastLevel, apply_delta};

#[derive(Default)]
struct Recorder {
    reads: Vec<(usize, usize)>,
    invalidations: usize,
    fail_trigger: bool,
}

impl MatchesService for Recorder {
    fn read_matches(&mut self, skip: usize, limit: usize) -> Result<Vec<Match>> {
        self.reads.push((skip, limit));
        Ok(Vec::new())
    }

    fn trigger_simulation(&mut self, match_id: &str) -> Result<SimulationTicket> {
        if self.fail_trigger {
            return Err(anyhow!("backend unavailable for {match_id}"));
        }
        Ok(SimulationTicket {
            message: "queued".to_string(),
            task_id: None,
        })
    }

    fn invalidate_matches(&mut self) {
        self.invalidations += 1;
    }
}

#[test]
fn successful_trigger_invalidates_and_refetches() {
    let mut service = Recorder::default();
    let (tx, rx) = mpsc::channel();
    let alive = feed::handle_command(
        &mut service,
        ProviderCommand::TriggerSimulation {
            match_id: "m1".to_string(),
        },
        25,
        &tx,
    );
    assert!(alive);
    assert_eq!(service.invalidations, 1);
    assert_eq!(service.reads, vec![(0, 25)]);

    let deltas: Vec<Delta> = rx.try_iter().collect();
    assert!(matches!(
        deltas.as_slice(),
        [Delta::SimulationTriggered { .. }, Delta::SetMatches(_)]
    ));
}

#[test]
fn failed_trigger_reports_without_refetch() {
    let mut service = Recorder {
        fail_trigger: true,
        ..Recorder::default()
    };
    let (tx, rx) = mpsc::channel();
    feed::handle_command(
        &mut service,
        ProviderCommand::TriggerSimulation {
            match_id: "m9".to_string(),
        },
        25,
        &tx,
    );
    assert_eq!(service.invalidations, 0);
    assert!(service.reads.is_empty());

    let mut state = AppState::new();
    state.pending_simulations.insert("m9".to_string());
    for delta in rx.try_iter() {
        apply_delta(&mut state, delta);
    }
    assert!(state.pending_simulations.is_empty());
    assert_eq!(
        state.toasts.back().map(|t| (t.level, t.message.as_str())),
        Some((ToastLevel::Error, "Failed to trigger simulation"))
    );
}

#[test]
fn fetch_command_passes_paging_through() {
    let mut service = Recorder::default();
    let (tx, _rx) = mpsc::channel();
    feed::handle_command(
        &mut service,
        ProviderCommand::FetchMatches { skip: 10, limit: 5 },
        100,
        &tx,
    );
    assert_eq!(service.reads, vec![(10, 5)]);
}

#[test]
fn handle_command_stops_when_ui_hangs_up() {
    let mut service = Recorder::default();
    let (tx, rx) = mpsc::channel();
    drop(rx);
    let alive = feed::handle_command(
        &mut service,
        ProviderCommand::FetchMatches { skip: 0, limit: 5 },
        5,
        &tx,
    );
    assert!(!alive);
}

#[test]
fn provider_thread_sends_players_then_matches() {
    let service = MockMatchesService::new(StdRng::seed_from_u64(3));
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let settings = ProviderSettings {
        match_limit: 4,
        poll_interval: Duration::from_secs(60),
    };
    let handle = feed::spawn_provider(Box::new(service), Vec::new(), settings, tx, cmd_rx);

    let first = rx.recv_timeout(Duration::from_secs(2)).expect("players");
    assert!(matches!(first, Delta::SetPlayers(ref p) if p.is_empty()));
    let second = rx.recv_timeout(Duration::from_secs(2)).expect("matches");
    let Delta::SetMatches(list) = second else {
        panic!("expected matches, got {second:?}");
    };
    assert_eq!(list.len(), 4);

    cmd_tx
        .send(ProviderCommand::TriggerSimulation {
            match_id: list[0].id.clone(),
        })
        .expect("send");
    let triggered = rx.recv_timeout(Duration::from_secs(2)).expect("ticket");
    assert!(matches!(triggered, Delta::SimulationTriggered { .. }));
    let Delta::SetMatches(refreshed) = rx.recv_timeout(Duration::from_secs(2)).expect("refetch")
    else {
        panic!("expected refetch");
    };
    assert!(refreshed.iter().any(|m| m.sim_win_prob_p1.is_some()));

    drop(cmd_tx);
    handle.join().expect("provider exits");
}
