use std::cell::Cell;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::editing::{self, CellEditor, ProjectionEdit};
use crate::exposure::{self, ExposureRow};
use crate::lineup::{self, Lineup};
use crate::matches::Match;
use crate::overrides::{self, OverridePatch, OverrideStore};
use crate::projection::{self, DisplayRow, DisplayRowCache, ProjectionMode};

pub const LOG_CAPACITY: usize = 200;
pub const TOAST_TTL: Duration = Duration::from_secs(4);
pub const DEFAULT_UNIQUENESS: u8 = 50;
pub const UNIQUENESS_STEP: u8 = 5;
pub const DEMO_LINEUP_COUNT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayerStatus {
    Active,
    Questionable,
    Out,
    Locked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatBundle {
    pub mean: f64,
    pub floor: f64,
    pub ceiling: f64,
    pub win_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub id: String,
    pub name: String,
    pub team: String,
    #[serde(default)]
    pub position: String,
    pub salary: u32,
    pub stats: StatBundle,
    #[serde(default = "default_status")]
    pub status: PlayerStatus,
}

fn default_status() -> PlayerStatus {
    PlayerStatus::Active
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    PlayerPool,
    Exposure,
    Lineups,
    Matches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Player,
    Team,
    Salary,
    Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub column: SortColumn,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Projection,
    ExposureMin,
    ExposureMax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub player_id: String,
    pub field: EditField,
    pub editor: CellEditor,
    /// Buffer text when the editor opened; committing it unchanged is a no-op.
    pub initial: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    pub created_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerFilter {
    pub hidden_teams: BTreeSet<String>,
    pub statuses: HashSet<PlayerStatus>,
    pub search: String,
}

impl Default for PlayerFilter {
    fn default() -> Self {
        Self {
            hidden_teams: BTreeSet::new(),
            statuses: [
                PlayerStatus::Active,
                PlayerStatus::Questionable,
                PlayerStatus::Locked,
            ]
            .into_iter()
            .collect(),
            search: String::new(),
        }
    }
}

impl PlayerFilter {
    pub fn accepts(&self, player: &PlayerStat) -> bool {
        if self.hidden_teams.contains(&player.team) {
            return false;
        }
        if !self.statuses.contains(&player.status) {
            return false;
        }
        let needle = self.search.trim();
        needle.is_empty() || contains_ascii_ci(&player.name, needle)
    }

    pub fn toggle_team(&mut self, team: &str) {
        if !self.hidden_teams.remove(team) {
            self.hidden_teams.insert(team.to_string());
        }
    }

    pub fn toggle_status(&mut self, status: PlayerStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub projection_mode: ProjectionMode,
    pub overrides: OverrideStore,
    pub players: Vec<PlayerStat>,
    pub players_generation: u64,
    pub rows: DisplayRowCache,
    pub sorting: Option<Sorting>,
    pub filter: PlayerFilter,
    pub filter_panel: bool,
    pub filter_cursor: usize,
    pub search_active: bool,
    pub uniqueness: u8,
    pub selected: usize,
    pub exposure_selected: usize,
    pub lineups: Vec<Lineup>,
    pub lineups_stale: Rc<Cell<bool>>,
    pub lineup_selected: usize,
    pub matches: Vec<Match>,
    pub matches_loading: bool,
    pub matches_fetched_at: Option<SystemTime>,
    pub match_selected: usize,
    pub pending_simulations: HashSet<String>,
    pub editing: Option<CellEdit>,
    pub logs: VecDeque<String>,
    pub toasts: VecDeque<Toast>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        let mut overrides = OverrideStore::new();
        let lineups_stale = Rc::new(Cell::new(true));
        let flag = Rc::clone(&lineups_stale);
        overrides.subscribe(move |_| flag.set(true));

        Self {
            screen: Screen::PlayerPool,
            projection_mode: ProjectionMode::Mean,
            overrides,
            players: Vec::new(),
            players_generation: 0,
            rows: DisplayRowCache::new(),
            sorting: None,
            filter: PlayerFilter::default(),
            filter_panel: false,
            filter_cursor: 0,
            search_active: false,
            uniqueness: DEFAULT_UNIQUENESS,
            selected: 0,
            exposure_selected: 0,
            lineups: Vec::new(),
            lineups_stale,
            lineup_selected: 0,
            matches: Vec::with_capacity(32),
            matches_loading: false,
            matches_fetched_at: None,
            match_selected: 0,
            pending_simulations: HashSet::new(),
            editing: None,
            logs: VecDeque::with_capacity(LOG_CAPACITY),
            toasts: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    pub fn toast(&mut self, level: ToastLevel, msg: impl Into<String>) {
        let message = msg.into();
        let tag = match level {
            ToastLevel::Success | ToastLevel::Info => "[INFO]",
            ToastLevel::Error => "[WARN]",
        };
        self.push_log(format!("{tag} {message}"));
        self.toasts.push_back(Toast {
            level,
            message,
            created_at: Instant::now(),
        });
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|t| now.saturating_duration_since(t.created_at) < TOAST_TTL);
    }

    /// Rebuilds derived rows if overrides, mode, or players changed.
    pub fn refresh_rows(&mut self) {
        self.rows.rows(
            &self.players,
            self.players_generation,
            &self.overrides,
            self.projection_mode,
        );
    }

    /// Filtered and sorted rows as last refreshed.
    pub fn visible_rows(&self) -> Vec<&DisplayRow> {
        let mut rows: Vec<&DisplayRow> = self
            .rows
            .current()
            .iter()
            .filter(|row| self.filter.accepts(&row.player))
            .collect();
        if let Some(sorting) = self.sorting {
            rows.sort_by(|a, b| {
                let ord = compare_rows(a, b, sorting.column);
                match sorting.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn selected_row(&self) -> Option<&DisplayRow> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn selected_player_id(&self) -> Option<String> {
        match self.screen {
            Screen::Exposure => self
                .exposure_rows()
                .get(self.exposure_selected)
                .map(|r| r.player_id.clone()),
            _ => self.selected_row().map(|r| r.player.id.clone()),
        }
    }

    pub fn teams(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|p| p.team.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        if self.projection_mode != mode {
            self.projection_mode = mode;
            self.lineups_stale.set(true);
        }
    }

    pub fn cycle_projection_mode(&mut self) {
        self.set_projection_mode(self.projection_mode.cycle());
    }

    /// Asc, then desc, then unsorted.
    pub fn cycle_sort(&mut self, column: SortColumn) {
        self.sorting = match self.sorting {
            Some(Sorting {
                column: current,
                direction: SortDirection::Asc,
            }) if current == column => Some(Sorting {
                column,
                direction: SortDirection::Desc,
            }),
            Some(Sorting {
                column: current,
                direction: SortDirection::Desc,
            }) if current == column => None,
            _ => Some(Sorting {
                column,
                direction: SortDirection::Asc,
            }),
        };
        self.selected = 0;
    }

    pub fn adjust_uniqueness(&mut self, up: bool) {
        self.uniqueness = if up {
            self.uniqueness.saturating_add(UNIQUENESS_STEP).min(100)
        } else {
            self.uniqueness.saturating_sub(UNIQUENESS_STEP)
        };
    }

    pub fn select_next(&mut self) {
        let total = self.list_len();
        if total == 0 {
            return;
        }
        let cursor = self.cursor_mut();
        *cursor = (*cursor + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_sub(1);
    }

    fn list_len(&self) -> usize {
        match self.screen {
            Screen::PlayerPool => self.visible_rows().len(),
            Screen::Exposure => self.exposure_rows().len(),
            Screen::Lineups => self.lineups.len(),
            Screen::Matches => self.matches.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.screen {
            Screen::PlayerPool => &mut self.selected,
            Screen::Exposure => &mut self.exposure_selected,
            Screen::Lineups => &mut self.lineup_selected,
            Screen::Matches => &mut self.match_selected,
        }
    }

    pub fn toggle_lock_selected(&mut self) {
        if let Some(id) = self.selected_player_id() {
            overrides::toggle_lock(&mut self.overrides, &id);
        }
    }

    pub fn toggle_exclude_selected(&mut self) {
        if let Some(id) = self.selected_player_id() {
            overrides::toggle_exclude(&mut self.overrides, &id);
        }
    }

    pub fn toggle_boost_selected(&mut self) {
        if let Some(id) = self.selected_player_id() {
            overrides::toggle_boost(&mut self.overrides, &id);
        }
    }

    pub fn clear_overrides(&mut self) {
        let count = self.overrides.len();
        self.overrides.clear();
        self.push_log(format!("[INFO] Cleared {count} overrides"));
    }

    pub fn begin_edit(&mut self, field: EditField) {
        let Some(id) = self.selected_player_id() else {
            return;
        };
        let editor = match field {
            EditField::Projection => {
                let Some(row) = self.rows.current().iter().find(|r| r.player.id == id) else {
                    return;
                };
                CellEditor::with_value(row.display_projection)
            }
            EditField::ExposureMin | EditField::ExposureMax => {
                let bounds = exposure::ExposureBounds::from_override(self.overrides.get(&id));
                let value = if field == EditField::ExposureMin {
                    bounds.min
                } else {
                    bounds.max
                };
                CellEditor {
                    buffer: format!("{value}"),
                }
            }
        };
        self.editing = Some(CellEdit {
            player_id: id,
            field,
            initial: editor.buffer.clone(),
            editor,
        });
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Applies the open cell editor to the store.
    pub fn commit_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };
        if edit.editor.buffer == edit.initial {
            return;
        }
        match edit.field {
            EditField::Projection => {
                let Some(player) = self.players.iter().find(|p| p.id == edit.player_id) else {
                    return;
                };
                let mode_value = projection::mode_stat(player, self.projection_mode);
                let outcome = editing::commit_projection_input(
                    &mut self.overrides,
                    &edit.player_id,
                    &edit.editor.buffer,
                    mode_value,
                );
                if let ProjectionEdit::Set(value) = outcome {
                    self.push_log(format!(
                        "[INFO] {} projection set to {value:.1}",
                        edit.player_id
                    ));
                }
            }
            EditField::ExposureMin | EditField::ExposureMax => {
                let value = editing::parse_exposure_input(&edit.editor.buffer);
                let patch = if edit.field == EditField::ExposureMin {
                    OverridePatch {
                        exposure_min: Some(value),
                        ..OverridePatch::default()
                    }
                } else {
                    OverridePatch {
                        exposure_max: Some(value),
                        ..OverridePatch::default()
                    }
                };
                self.overrides.set(&edit.player_id, patch);
            }
        }
    }

    pub fn exposure_rows(&self) -> Vec<ExposureRow> {
        let rows: Vec<DisplayRow> = self.visible_rows().into_iter().cloned().collect();
        exposure::exposure_rows(&rows, &self.lineups)
    }

    /// Regenerates demo lineups when an override or the mode changed since the
    /// last build.
    pub fn maybe_rebuild_lineups(&mut self, rng: &mut impl Rng) {
        if !self.lineups_stale.get() || self.players.is_empty() {
            return;
        }
        let exposure_id = self
            .exposure_rows()
            .get(self.exposure_selected)
            .map(|r| r.player_id.clone());

        self.refresh_rows();
        let rows = self.rows.current().to_vec();
        self.lineups = lineup::demo_lineups(&rows, &self.overrides, DEMO_LINEUP_COUNT, rng);
        self.lineup_selected = self
            .lineup_selected
            .min(self.lineups.len().saturating_sub(1));
        self.lineups_stale.set(false);

        // Exposure rows are ordered by exposure, so the rebuild reorders them.
        if let Some(id) = exposure_id {
            self.exposure_selected = self
                .exposure_rows()
                .iter()
                .position(|r| r.player_id == id)
                .unwrap_or(0);
        }
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.matches.get(self.match_selected)
    }

    pub fn selected_lineup(&self) -> Option<&Lineup> {
        self.lineups.get(self.lineup_selected)
    }
}

fn compare_rows(a: &DisplayRow, b: &DisplayRow, column: SortColumn) -> std::cmp::Ordering {
    match column {
        SortColumn::Player => a.player.name.cmp(&b.player.name),
        SortColumn::Team => a.player.team.cmp(&b.player.team),
        SortColumn::Salary => a.player.salary.cmp(&b.player.salary),
        SortColumn::Projection => a
            .display_projection
            .partial_cmp(&b.display_projection)
            .unwrap_or(std::cmp::Ordering::Equal),
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetPlayers(Vec<PlayerStat>),
    SetMatches(Vec<Match>),
    MatchesFailed(String),
    SimulationTriggered { match_id: String, message: String },
    SimulationFailed { match_id: String, error: String },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchMatches { skip: usize, limit: usize },
    TriggerSimulation { match_id: String },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetPlayers(players) => {
            state.push_log(format!("[INFO] Loaded {} players", players.len()));
            state.players = players;
            state.players_generation += 1;
            state.selected = 0;
            state.lineups_stale.set(true);
        }
        Delta::SetMatches(matches) => {
            let selected_id = state.selected_match().map(|m| m.id.clone());
            state.matches = matches;
            state.matches_loading = false;
            state.matches_fetched_at = Some(SystemTime::now());
            state.match_selected = selected_id
                .and_then(|id| state.matches.iter().position(|m| m.id == id))
                .unwrap_or(0);
        }
        Delta::MatchesFailed(error) => {
            state.matches_loading = false;
            state.toast(ToastLevel::Error, "Failed to load matches");
            state.push_log(format!("[WARN] Matches error: {error}"));
        }
        Delta::SimulationTriggered { match_id, message } => {
            state.pending_simulations.remove(&match_id);
            state.toast(ToastLevel::Success, "Simulation triggered");
            state.push_log(format!("[INFO] {match_id}: {message}"));
        }
        Delta::SimulationFailed { match_id, error } => {
            state.pending_simulations.remove(&match_id);
            state.toast(ToastLevel::Error, "Failed to trigger simulation");
            state.push_log(format!("[WARN] {match_id}: {error}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn status_label(status: PlayerStatus) -> &'static str {
    match status {
        PlayerStatus::Active => "Active",
        PlayerStatus::Questionable => "Questionable",
        PlayerStatus::Out => "Out",
        PlayerStatus::Locked => "Locked",
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::PlayerPool => "PLAYER POOL",
        Screen::Exposure => "EXPOSURE",
        Screen::Lineups => "LINEUPS",
        Screen::Matches => "MATCHES",
    }
}

/// Case-insensitive ASCII substring search without allocating a lowercased copy.
fn contains_ascii_ci(haystack: &str, needle: &str) -> bool {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return false;
    }
    if n.is_empty() {
        return true;
    }
    h.windows(n.len())
        .any(|window| window.iter().zip(n).all(|(a, b)| a.eq_ignore_ascii_case(b)))
}
