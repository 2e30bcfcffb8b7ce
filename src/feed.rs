use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::matches::MatchesService;
use crate::state::{Delta, PlayerStat, ProviderCommand};

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub match_limit: usize,
    pub poll_interval: Duration,
}

/// Runs the match service on its own thread. Commands come in on `cmd_rx`;
/// results go back to the UI loop as deltas. Exits when either channel closes.
pub fn spawn_provider(
    mut service: Box<dyn MatchesService>,
    players: Vec<PlayerStat>,
    settings: ProviderSettings,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        if tx.send(Delta::SetPlayers(players)).is_err() {
            return;
        }
        if !fetch_matches(service.as_mut(), 0, settings.match_limit, &tx) {
            return;
        }
        let mut last_fetch = Instant::now();

        loop {
            let wait = settings
                .poll_interval
                .checked_sub(last_fetch.elapsed())
                .unwrap_or(Duration::ZERO);
            match cmd_rx.recv_timeout(wait) {
                Ok(cmd) => {
                    if !handle_command(service.as_mut(), cmd, settings.match_limit, &tx) {
                        return;
                    }
                    last_fetch = Instant::now();
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !fetch_matches(service.as_mut(), 0, settings.match_limit, &tx) {
                        return;
                    }
                    last_fetch = Instant::now();
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    })
}

/// Returns `false` once the UI side has hung up. A successful simulation
/// trigger invalidates the cached list and refetches `refetch_limit` matches.
pub fn handle_command(
    service: &mut dyn MatchesService,
    cmd: ProviderCommand,
    refetch_limit: usize,
    tx: &Sender<Delta>,
) -> bool {
    match cmd {
        ProviderCommand::FetchMatches { skip, limit } => fetch_matches(service, skip, limit, tx),
        ProviderCommand::TriggerSimulation { match_id } => {
            match service.trigger_simulation(&match_id) {
                Ok(ticket) => {
                    tracing::info!(%match_id, task_id = ?ticket.task_id, "simulation triggered");
                    if tx
                        .send(Delta::SimulationTriggered {
                            match_id,
                            message: ticket.message,
                        })
                        .is_err()
                    {
                        return false;
                    }
                    service.invalidate_matches();
                    fetch_matches(service, 0, refetch_limit, tx)
                }
                Err(err) => {
                    tracing::error!(
                        %match_id,
                        error = %format!("{err:#}"),
                        "simulation trigger failed"
                    );
                    tx.send(Delta::SimulationFailed {
                        match_id,
                        error: format!("{err:#}"),
                    })
                    .is_ok()
                }
            }
        }
    }
}

fn fetch_matches(
    service: &mut dyn MatchesService,
    skip: usize,
    limit: usize,
    tx: &Sender<Delta>,
) -> bool {
    match service.read_matches(skip, limit) {
        Ok(matches) => {
            tracing::debug!(count = matches.len(), "matches loaded");
            tx.send(Delta::SetMatches(matches)).is_ok()
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "match fetch failed");
            tx.send(Delta::MatchesFailed(format!("{err:#}"))).is_ok()
        }
    }
}
