use crate::lineup::{Lineup, current_exposure};
use crate::overrides::Override;
use crate::projection::DisplayRow;

pub const DEFAULT_MIN: f64 = 0.0;
pub const DEFAULT_MAX: f64 = 100.0;

/// Min/max exposure for one player, in percent. Advisory: nothing clamps or
/// rejects these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ExposureBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl ExposureBounds {
    pub fn from_override(user_override: Option<&Override>) -> Self {
        let defaults = Self::default();
        Self {
            min: user_override
                .and_then(|o| o.exposure_min)
                .unwrap_or(defaults.min),
            max: user_override
                .and_then(|o| o.exposure_max)
                .unwrap_or(defaults.max),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.max < self.min
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposureRow {
    pub player_id: String,
    pub player_name: String,
    pub team: String,
    pub current: f64,
    pub bounds: ExposureBounds,
}

impl ExposureRow {
    pub fn current_label(&self) -> String {
        format!("{:.1}%", self.current)
    }
}

/// Rows ordered by current exposure, highest first; ties keep input order.
pub fn exposure_rows(rows: &[DisplayRow], lineups: &[Lineup]) -> Vec<ExposureRow> {
    let mut out: Vec<ExposureRow> = rows
        .iter()
        .map(|row| ExposureRow {
            player_id: row.player.id.clone(),
            player_name: row.player.name.clone(),
            team: row.player.team.clone(),
            current: current_exposure(&row.player.id, lineups),
            bounds: ExposureBounds::from_override(row.user_override.as_ref()),
        })
        .collect();
    out.sort_by(|a, b| {
        b.current
            .partial_cmp(&a.current)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out
}

/// Filled cells of a `width`-wide bar for a 0-100 value.
pub fn bar_fill(percent: f64, width: usize) -> usize {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    (ratio * width as f64).round() as usize
}
