use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::overrides::{LockStatus, OverrideStore};
use crate::projection::DisplayRow;

pub const ROSTER_SLOTS: [&str; 8] = ["QB", "RB", "RB", "WR", "WR", "WR", "TE", "FLEX"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupPlayer {
    pub id: String,
    pub name: String,
    pub position: String,
    pub salary: u32,
    pub projection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub id: String,
    pub players: Vec<LineupPlayer>,
    pub total_salary: u32,
    pub total_projection: f64,
    pub roi: Option<f64>,
}

impl Lineup {
    pub fn new(id: String, players: Vec<LineupPlayer>, roi: Option<f64>) -> Self {
        let total_salary = players.iter().map(|p| p.salary).sum();
        let total_projection = players.iter().map(|p| p.projection).sum();
        Self {
            id,
            players,
            total_salary,
            total_projection,
            roi,
        }
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn short_id(&self) -> String {
        format!("#{}", self.id.chars().take(6).collect::<String>())
    }

    pub fn roi_label(&self) -> String {
        match self.roi {
            Some(roi) => format!("{roi:.1}% ROI"),
            None => "N/A".to_string(),
        }
    }

    pub fn points_label(&self) -> String {
        format!("{:.1} Pts", self.total_projection)
    }

    pub fn salary_label(&self) -> String {
        format_salary(self.total_salary)
    }

    /// One CSV line in slot order: `QB,RB,...` cells hold player ids.
    pub fn csv_row(&self) -> String {
        self.players
            .iter()
            .map(|p| csv_escape(&p.id))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn csv_header() -> String {
    ROSTER_SLOTS.join(",")
}

fn csv_escape(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// `3000` -> `$3,000`.
pub fn format_salary(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Share of `lineups` (0-100) that contain `player_id`.
pub fn current_exposure(player_id: &str, lineups: &[Lineup]) -> f64 {
    if lineups.is_empty() {
        return 0.0;
    }
    let hits = lineups.iter().filter(|l| l.contains(player_id)).count();
    hits as f64 * 100.0 / lineups.len() as f64
}

/// Builds placeholder lineups for the viewer. Locked players are always
/// placed, excluded players never are; everything else is random.
pub fn demo_lineups(
    rows: &[DisplayRow],
    store: &OverrideStore,
    count: usize,
    rng: &mut impl Rng,
) -> Vec<Lineup> {
    let status = |row: &DisplayRow| {
        store
            .get(&row.player.id)
            .map(|o| o.lock_status())
            .unwrap_or_default()
    };
    let locked: Vec<&DisplayRow> = rows
        .iter()
        .filter(|r| status(r) == LockStatus::Locked)
        .collect();
    let pool: Vec<&DisplayRow> = rows
        .iter()
        .filter(|r| status(r) == LockStatus::None)
        .collect();

    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut picked: Vec<&DisplayRow> =
            locked.iter().take(ROSTER_SLOTS.len()).copied().collect();
        let mut candidates = pool.clone();
        candidates.shuffle(rng);
        picked.extend(
            candidates
                .into_iter()
                .take(ROSTER_SLOTS.len().saturating_sub(picked.len())),
        );
        if picked.len() < ROSTER_SLOTS.len() {
            break;
        }

        let players = picked
            .iter()
            .zip(ROSTER_SLOTS)
            .map(|(row, slot)| LineupPlayer {
                id: row.player.id.clone(),
                name: row.player.name.clone(),
                position: slot.to_string(),
                salary: row.player.salary,
                projection: row.display_projection,
            })
            .collect();
        let roi = if rng.gen_bool(0.8) {
            Some((rng.gen_range(-40.0..60.0_f64) * 10.0).round() / 10.0)
        } else {
            None
        };
        out.push(Lineup::new(random_lineup_id(rng), players, roi));
    }
    out
}

fn random_lineup_id(rng: &mut impl Rng) -> String {
    const HEX: &[u8] = b"0123456789abcdef";
    (0..12)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, salary: u32, projection: f64) -> LineupPlayer {
        LineupPlayer {
            id: id.to_string(),
            name: format!("Name {id}"),
            position: "WR".to_string(),
            salary,
            projection,
        }
    }

    #[test]
    fn card_labels() {
        let lineup = Lineup::new(
            "abcdef123456".to_string(),
            vec![player("p-1", 7200, 18.3), player("p-2", 5400, 9.5)],
            None,
        );
        assert_eq!(lineup.short_id(), "#abcdef");
        assert_eq!(lineup.roi_label(), "N/A");
        assert_eq!(lineup.points_label(), "27.8 Pts");
        assert_eq!(lineup.salary_label(), "$12,600");
    }

    #[test]
    fn salary_grouping() {
        assert_eq!(format_salary(0), "$0");
        assert_eq!(format_salary(999), "$999");
        assert_eq!(format_salary(50_000), "$50,000");
        assert_eq!(format_salary(1_234_567), "$1,234,567");
    }

    #[test]
    fn exposure_counts_lineups_containing_player() {
        let a = Lineup::new("a".into(), vec![player("p-1", 1, 1.0)], None);
        let b = Lineup::new("b".into(), vec![player("p-2", 1, 1.0)], None);
        let lineups = vec![a.clone(), b, a];
        let exposure = current_exposure("p-1", &lineups);
        assert!((exposure - 66.666).abs() < 0.01);
        assert_eq!(current_exposure("p-1", &[]), 0.0);
    }

    #[test]
    fn csv_quotes_awkward_ids() {
        let lineup = Lineup::new(
            "x".into(),
            vec![player("a,b", 1, 1.0), player("c", 1, 1.0)],
            None,
        );
        assert_eq!(lineup.csv_row(), "\"a,b\",c");
    }
}
