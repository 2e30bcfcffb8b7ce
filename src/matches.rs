use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub player1_name: String,
    pub player2_name: String,
    pub start_time: String,
    #[serde(default = "default_surface")]
    pub surface: String,
    #[serde(default = "default_odds")]
    pub p1_odds: i32,
    #[serde(default = "default_odds")]
    pub p2_odds: i32,
    #[serde(default)]
    pub market_vig: Option<f64>,
    #[serde(default)]
    pub last_simulated_at: Option<String>,
    #[serde(default)]
    pub sim_win_prob_p1: Option<f64>,
}

fn default_surface() -> String {
    "Hard".to_string()
}

fn default_odds() -> i32 {
    -110
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationTicket {
    pub message: String,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum MatchServiceError {
    #[error("match not found: {match_id}")]
    NotFound { match_id: String },
    #[error("not authorized (set LINEUP_API_TOKEN)")]
    Unauthorized,
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
}

/// Remote source of tennis matches and simulation jobs.
pub trait MatchesService: Send {
    fn read_matches(&mut self, skip: usize, limit: usize) -> anyhow::Result<Vec<Match>>;

    fn trigger_simulation(&mut self, match_id: &str) -> anyhow::Result<SimulationTicket>;

    /// Drops any cached match list so the next read goes to the source.
    fn invalidate_matches(&mut self) {}
}

pub fn format_odds(m: &Match) -> String {
    format!("{} / {}", format_american(m.p1_odds), format_american(m.p2_odds))
}

fn format_american(odds: i32) -> String {
    if odds > 0 {
        format!("+{odds}")
    } else {
        odds.to_string()
    }
}

pub fn format_sim_win(m: &Match) -> String {
    match m.sim_win_prob_p1 {
        Some(p) => format!("{:.1}%", p * 100.0),
        None => "-".to_string(),
    }
}

/// Book-implied win probability for American odds, vig included.
pub fn implied_probability(american: i32) -> Option<f64> {
    match american {
        0 => None,
        o if o < 0 => {
            let o = f64::from(-o);
            Some(o / (o + 100.0))
        }
        o => Some(100.0 / (f64::from(o) + 100.0)),
    }
}

/// Player 1's market probability with the overround removed.
pub fn no_vig_p1(m: &Match) -> Option<f64> {
    let p1 = implied_probability(m.p1_odds)?;
    let p2 = implied_probability(m.p2_odds)?;
    let sum = p1 + p2;
    if sum <= 0.0 {
        return None;
    }
    Some(p1 / sum)
}

pub fn format_market_p1(m: &Match) -> String {
    no_vig_p1(m)
        .map(|p| format!("{:.1}%", p * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Simulated minus market probability for player 1, in percentage points.
pub fn sim_edge_pp(m: &Match) -> Option<f64> {
    Some((m.sim_win_prob_p1? - no_vig_p1(m)?) * 100.0)
}

pub fn format_edge(m: &Match) -> String {
    sim_edge_pp(m)
        .map(|e| format!("{e:+.1}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    let cleaned = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Renders in the local timezone; unparsable input is shown as received.
pub fn format_start_time(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "TBD".to_string();
    }
    match parse_start_time(raw) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => raw.trim().replace('T', " "),
    }
}
