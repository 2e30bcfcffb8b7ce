use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use crate::matches::{Match, MatchServiceError, MatchesService, SimulationTicket};
use crate::state::{PlayerStat, PlayerStatus, StatBundle};

const MOCK_TEAMS: [&str; 4] = ["NYG", "DAL", "PHI", "WAS"];
const MOCK_POSITIONS: [&str; 4] = ["QB", "RB", "WR", "TE"];

pub fn mock_players(count: usize, rng: &mut impl Rng) -> Vec<PlayerStat> {
    (0..count)
        .map(|i| PlayerStat {
            id: format!("p-{i}"),
            name: format!("Player {}", i + 1),
            team: MOCK_TEAMS[i % MOCK_TEAMS.len()].to_string(),
            position: MOCK_POSITIONS[i % MOCK_POSITIONS.len()].to_string(),
            salary: 3000 + (i as u32) * 100,
            stats: StatBundle {
                mean: 10.0 + rng.gen_range(0.0..15.0),
                floor: 5.0 + rng.gen_range(0.0..5.0),
                ceiling: 20.0 + rng.gen_range(0.0..20.0),
                win_probability: 0.5,
            },
            status: PlayerStatus::Active,
        })
        .collect()
}

/// In-process stand-in for the match service. Simulations resolve instantly
/// with a jittered win probability around the no-vig market price.
pub struct MockMatchesService<R: Rng + Send> {
    matches: Vec<Match>,
    rng: R,
}

impl<R: Rng + Send> MockMatchesService<R> {
    pub fn new(mut rng: R) -> Self {
        let matches = seed_matches(&mut rng);
        Self { matches, rng }
    }

    pub fn with_matches(matches: Vec<Match>, rng: R) -> Self {
        Self { matches, rng }
    }
}

impl<R: Rng + Send> MatchesService for MockMatchesService<R> {
    fn read_matches(&mut self, skip: usize, limit: usize) -> Result<Vec<Match>> {
        let mut sorted = self.matches.clone();
        sorted.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(sorted.into_iter().skip(skip).take(limit).collect())
    }

    fn trigger_simulation(&mut self, match_id: &str) -> Result<SimulationTicket> {
        let Some(m) = self.matches.iter_mut().find(|m| m.id == match_id) else {
            return Err(MatchServiceError::NotFound {
                match_id: match_id.to_string(),
            }
            .into());
        };
        let market = crate::matches::no_vig_p1(m).unwrap_or(0.5);
        let jitter = self.rng.gen_range(-0.06..0.06);
        m.sim_win_prob_p1 = Some((market + jitter).clamp(0.01, 0.99));
        m.last_simulated_at = Some(Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string());
        Ok(SimulationTicket {
            message: "Simulation triggered".to_string(),
            task_id: Some(format!("mock-{}", self.rng.gen_range(1000..9999))),
        })
    }
}

fn seed_matches(rng: &mut impl Rng) -> Vec<Match> {
    const PAIRS: [(&str, &str, &str); 6] = [
        ("C. Alcaraz", "J. Sinner", "Hard"),
        ("N. Djokovic", "D. Medvedev", "Hard"),
        ("A. Zverev", "C. Ruud", "Clay"),
        ("H. Hurkacz", "T. Fritz", "Grass"),
        ("S. Tsitsipas", "A. de Minaur", "Clay"),
        ("B. Shelton", "F. Tiafoe", "Hard"),
    ];
    let base = Utc::now();
    PAIRS
        .iter()
        .enumerate()
        .map(|(idx, (p1, p2, surface))| {
            let fav: i32 = -rng.gen_range(110..260);
            let dog: i32 = rng.gen_range(100..220);
            let (p1_odds, p2_odds) = if idx % 2 == 0 { (fav, dog) } else { (dog, fav) };
            let start = base + ChronoDuration::hours(2 + idx as i64 * 3);
            Match {
                id: format!("00000000-0000-4000-8000-{:012}", idx + 1),
                player1_name: p1.to_string(),
                player2_name: p2.to_string(),
                start_time: start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                surface: surface.to_string(),
                p1_odds,
                p2_odds,
                market_vig: Some(0.045),
                last_simulated_at: None,
                sim_win_prob_p1: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn mock_players_follow_roster_pattern() {
        let mut rng = StdRng::seed_from_u64(7);
        let players = mock_players(50, &mut rng);
        assert_eq!(players.len(), 50);
        assert_eq!(players[0].id, "p-0");
        assert_eq!(players[5].team, "DAL");
        assert_eq!(players[49].salary, 7900);
        assert!(players.iter().all(|p| (10.0..25.0).contains(&p.stats.mean)));
    }

    #[test]
    fn mock_simulation_fills_win_probability() {
        let mut service = MockMatchesService::new(StdRng::seed_from_u64(1));
        let first = service.read_matches(0, 1).expect("read")[0].clone();
        assert!(first.sim_win_prob_p1.is_none());
        service.trigger_simulation(&first.id).expect("sim");
        let after = service.read_matches(0, 10).expect("read");
        let sim = after
            .iter()
            .find(|m| m.id == first.id)
            .and_then(|m| m.sim_win_prob_p1)
            .expect("sim prob");
        assert!((0.01..=0.99).contains(&sim));
    }

    #[test]
    fn unknown_match_is_not_found() {
        let mut service = MockMatchesService::new(StdRng::seed_from_u64(2));
        let err = service.trigger_simulation("nope").expect_err("missing");
        assert!(matches!(
            err.downcast_ref::<MatchServiceError>(),
            Some(MatchServiceError::NotFound { .. })
        ));
    }
}
