use crate::overrides::{Override, OverrideStore};
use crate::state::PlayerStat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    Floor,
    #[default]
    Mean,
    Ceiling,
}

impl ProjectionMode {
    pub const ALL: [ProjectionMode; 3] = [
        ProjectionMode::Floor,
        ProjectionMode::Mean,
        ProjectionMode::Ceiling,
    ];

    /// Unrecognised text falls back to `Mean`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "floor" => ProjectionMode::Floor,
            "ceiling" | "ceil" => ProjectionMode::Ceiling,
            _ => ProjectionMode::Mean,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectionMode::Floor => "Floor (25th)",
            ProjectionMode::Mean => "Mean",
            ProjectionMode::Ceiling => "Ceil (85th)",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            ProjectionMode::Floor => ProjectionMode::Mean,
            ProjectionMode::Mean => ProjectionMode::Ceiling,
            ProjectionMode::Ceiling => ProjectionMode::Floor,
        }
    }
}

/// The statistic picked by `mode`, ignoring overrides.
pub fn mode_stat(stat: &PlayerStat, mode: ProjectionMode) -> f64 {
    match mode {
        ProjectionMode::Floor => stat.stats.floor,
        ProjectionMode::Mean => stat.stats.mean,
        ProjectionMode::Ceiling => stat.stats.ceiling,
    }
}

/// A manual projection wins over every mode.
pub fn resolve(stat: &PlayerStat, user_override: Option<&Override>, mode: ProjectionMode) -> f64 {
    match user_override.and_then(|o| o.manual_projection) {
        Some(manual) => manual,
        None => mode_stat(stat, mode),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub player: PlayerStat,
    pub user_override: Option<Override>,
    pub display_projection: f64,
    pub is_edited: bool,
}

impl DisplayRow {
    pub fn new(
        player: &PlayerStat,
        user_override: Option<&Override>,
        mode: ProjectionMode,
    ) -> Self {
        Self {
            display_projection: resolve(player, user_override, mode),
            is_edited: user_override.is_some_and(|o| o.manual_projection.is_some()),
            player: player.clone(),
            user_override: user_override.cloned(),
        }
    }
}

pub fn build_display_rows(
    players: &[PlayerStat],
    store: &OverrideStore,
    mode: ProjectionMode,
) -> Vec<DisplayRow> {
    players
        .iter()
        .map(|player| DisplayRow::new(player, store.get(&player.id), mode))
        .collect()
}

/// Memoised display rows. Recomputes only when the store revision, the mode,
/// or the player list generation differs from the last build.
#[derive(Debug, Default)]
pub struct DisplayRowCache {
    key: Option<(u64, ProjectionMode, u64)>,
    rows: Vec<DisplayRow>,
}

impl DisplayRowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(
        &mut self,
        players: &[PlayerStat],
        players_generation: u64,
        store: &OverrideStore,
        mode: ProjectionMode,
    ) -> &[DisplayRow] {
        let key = (store.revision(), mode, players_generation);
        if self.key != Some(key) {
            self.rows = build_display_rows(players, store, mode);
            self.key = Some(key);
        }
        &self.rows
    }

    /// Rows from the last build, possibly stale.
    pub fn current(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
