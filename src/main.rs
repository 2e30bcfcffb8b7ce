use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table};
use rand::SeedableRng;
use rand::rngs::{StdRng, ThreadRng};

use lineup_terminal::config::AppConfig;
use lineup_terminal::exposure::{self, ExposureRow};
use lineup_terminal::fake_feed::{self, MockMatchesService};
use lineup_terminal::feed::{self, ProviderSettings};
use lineup_terminal::lineup::{self, Lineup};
use lineup_terminal::lineup_export;
use lineup_terminal::logging;
use lineup_terminal::match_fetch::HttpMatchesService;
use lineup_terminal::matches::{self, MatchesService};
use lineup_terminal::overrides::LockStatus;
use lineup_terminal::projection::{DisplayRow, ProjectionMode};
use lineup_terminal::state::{
    self, AppState, EditField, PlayerStatus, ProviderCommand, Screen, SortColumn, SortDirection,
    ToastLevel, apply_delta, screen_label, status_label,
};

const MOCK_PLAYER_COUNT: usize = 50;
const FILTER_STATUSES: [PlayerStatus; 4] = [
    PlayerStatus::Active,
    PlayerStatus::Questionable,
    PlayerStatus::Out,
    PlayerStatus::Locked,
];

struct App {
    state: AppState,
    config: AppConfig,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    rng: ThreadRng,
}

impl App {
    fn new(config: AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            config,
            should_quit: false,
            cmd_tx,
            rng: rand::thread_rng(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.editing.is_some() {
            self.on_edit_key(key);
            return;
        }
        if self.state.search_active {
            self.on_search_key(key);
            return;
        }
        if self.state.filter_panel {
            self.on_filter_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::PlayerPool,
            KeyCode::Char('2') => self.state.screen = Screen::Exposure,
            KeyCode::Char('3') => self.state.screen = Screen::Lineups,
            KeyCode::Char('4') => self.state.screen = Screen::Matches,
            KeyCode::Tab => self.state.screen = next_screen(self.state.screen),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => match self.state.screen {
                Screen::PlayerPool => self.on_pool_key(key),
                Screen::Exposure => self.on_exposure_key(key),
                Screen::Lineups => self.on_lineups_key(key),
                Screen::Matches => self.on_matches_key(key),
            },
        }
    }

    fn on_pool_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('m') => self.state.cycle_projection_mode(),
            KeyCode::Char('f') => self.state.set_projection_mode(ProjectionMode::Floor),
            KeyCode::Char('a') => self.state.set_projection_mode(ProjectionMode::Mean),
            KeyCode::Char('c') => self.state.set_projection_mode(ProjectionMode::Ceiling),
            KeyCode::Enter | KeyCode::Char('e') => self.state.begin_edit(EditField::Projection),
            KeyCode::Char('l') => self.state.toggle_lock_selected(),
            KeyCode::Char('x') => self.state.toggle_exclude_selected(),
            KeyCode::Char('b') => self.state.toggle_boost_selected(),
            KeyCode::Char('n') => self.state.cycle_sort(SortColumn::Player),
            KeyCode::Char('t') => self.state.cycle_sort(SortColumn::Team),
            KeyCode::Char('$') => self.state.cycle_sort(SortColumn::Salary),
            KeyCode::Char('p') => self.state.cycle_sort(SortColumn::Projection),
            KeyCode::Char('/') => self.state.search_active = true,
            KeyCode::Char('F') => {
                self.state.filter_panel = true;
                self.state.filter_cursor = 0;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.adjust_uniqueness(true),
            KeyCode::Char('-') => self.state.adjust_uniqueness(false),
            KeyCode::Char('C') => self.state.clear_overrides(),
            _ => {}
        }
    }

    fn on_exposure_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('[') => self.state.begin_edit(EditField::ExposureMin),
            KeyCode::Char(']') => self.state.begin_edit(EditField::ExposureMax),
            KeyCode::Char('l') => self.state.toggle_lock_selected(),
            KeyCode::Char('x') => self.state.toggle_exclude_selected(),
            _ => {}
        }
    }

    fn on_lineups_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => {
                self.state.lineups_stale.set(true);
                self.state.maybe_rebuild_lineups(&mut self.rng);
                self.state.push_log("[INFO] Lineups regenerated");
            }
            KeyCode::Char('y') => {
                if let Some(lineup) = self.state.selected_lineup() {
                    let line =
                        format!("[INFO] CSV {} | {}", lineup::csv_header(), lineup.csv_row());
                    self.state.push_log(line);
                }
            }
            KeyCode::Char('E') => {
                let path = self.config.export_path.clone();
                let exported = lineup_export::export_lineups(
                    &path,
                    &self.state.lineups,
                    &self.state.overrides,
                );
                match exported {
                    Ok(report) => self.state.toast(
                        ToastLevel::Success,
                        format!(
                            "Exported {} lineups ({} rows, {} overrides) to {}",
                            report.lineups,
                            report.player_rows,
                            report.overrides,
                            path.display()
                        ),
                    ),
                    Err(err) => {
                        tracing::error!(error = %format!("{err:#}"), "lineup export failed");
                        self.state.toast(ToastLevel::Error, format!("Export failed: {err}"));
                    }
                }
            }
            _ => {}
        }
    }

    fn on_matches_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.request_matches(),
            KeyCode::Enter | KeyCode::Char('s') => self.request_simulation(),
            _ => {}
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.commit_edit(),
            KeyCode::Esc => self.state.cancel_edit(),
            KeyCode::Backspace => {
                if let Some(edit) = self.state.editing.as_mut() {
                    edit.editor.backspace();
                }
            }
            KeyCode::Char(c) => {
                if let Some(edit) = self.state.editing.as_mut() {
                    edit.editor.push(c);
                }
            }
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.state.search_active = false,
            KeyCode::Backspace => {
                self.state.filter.search.pop();
                self.state.selected = 0;
            }
            KeyCode::Char(c) => {
                self.state.filter.search.push(c);
                self.state.selected = 0;
            }
            _ => {}
        }
    }

    fn on_filter_key(&mut self, key: KeyEvent) {
        let teams = self.state.teams();
        let total = teams.len() + FILTER_STATUSES.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('F') => self.state.filter_panel = false,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.filter_cursor =
                    (self.state.filter_cursor + 1).min(total.saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.filter_cursor = self.state.filter_cursor.saturating_sub(1);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let cursor = self.state.filter_cursor;
                if let Some(team) = teams.get(cursor) {
                    self.state.filter.toggle_team(team);
                } else if let Some(status) = FILTER_STATUSES.get(cursor - teams.len()) {
                    self.state.filter.toggle_status(*status);
                }
                self.state.selected = 0;
            }
            _ => {}
        }
    }

    fn request_matches(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Match fetch unavailable");
            return;
        };
        let cmd = ProviderCommand::FetchMatches {
            skip: 0,
            limit: self.config.match_limit,
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Match request failed");
        } else {
            self.state.matches_loading = true;
            self.state.push_log("[INFO] Match request sent");
        }
    }

    fn request_simulation(&mut self) {
        let Some(match_id) = self.state.selected_match().map(|m| m.id.clone()) else {
            self.state.push_log("[INFO] No match selected");
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Simulation unavailable");
            return;
        };
        if tx
            .send(ProviderCommand::TriggerSimulation {
                match_id: match_id.clone(),
            })
            .is_err()
        {
            self.state.toast(ToastLevel::Error, "Failed to trigger simulation");
            return;
        }
        self.state.pending_simulations.insert(match_id);
    }
}

fn next_screen(screen: Screen) -> Screen {
    match screen {
        Screen::PlayerPool => Screen::Exposure,
        Screen::Exposure => Screen::Lineups,
        Screen::Lineups => Screen::Matches,
        Screen::Matches => Screen::PlayerPool,
    }
}

fn build_service(config: &AppConfig) -> anyhow::Result<Box<dyn MatchesService>> {
    match HttpMatchesService::from_config(config)? {
        Some(service) => Ok(Box::new(service)),
        None => Ok(Box::new(MockMatchesService::new(StdRng::from_entropy()))),
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    logging::init_logging(config.log_file.as_deref())?;
    tracing::info!(mock = config.uses_mock_service(), "starting lineup terminal");

    let service = build_service(&config)?;
    let players = fake_feed::mock_players(MOCK_PLAYER_COUNT, &mut rand::thread_rng());

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let settings = ProviderSettings {
        match_limit: config.match_limit,
        poll_interval: Duration::from_secs(config.match_poll_secs),
    };
    let _provider = feed::spawn_provider(service, players, settings, tx, cmd_rx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(config, Some(cmd_tx));
    app.state.matches_loading = true;
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.state.refresh_rows();
        app.state.maybe_rebuild_lineups(&mut app.rng);
        app.state.expire_toasts(Instant::now());

        terminal.draw(|f| ui(f, &app.state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match state.screen {
        Screen::PlayerPool => render_pool(frame, chunks[1], state),
        Screen::Exposure => render_exposure(frame, chunks[1], state),
        Screen::Lineups => render_lineups(frame, chunks[1], state),
        Screen::Matches => render_matches(frame, chunks[1], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.filter_panel {
        render_filter_panel(frame, frame.size(), state);
    }
    render_toasts(frame, frame.size(), state);
    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let mut title = format!("LINEUP TERMINAL | {}", screen_label(state.screen));
    if state.screen == Screen::PlayerPool {
        title.push_str(&format!(
            " | Mode: {} | Uniqueness: {}% | Overrides: {}",
            state.projection_mode.label(),
            state.uniqueness,
            state.overrides.len()
        ));
        if !state.filter.search.is_empty() || state.search_active {
            title.push_str(&format!(" | Search: {}", state.filter.search));
            if state.search_active {
                title.push('_');
            }
        }
    }
    if state.screen == Screen::Matches {
        if let Some(at) = state.matches_fetched_at {
            let local: chrono::DateTime<chrono::Local> = at.into();
            title.push_str(&format!(" | Updated {}", local.format("%H:%M:%S")));
        }
        if state.matches_loading {
            title.push_str(" | Loading...");
        }
    }
    title
}

fn footer_text(state: &AppState) -> String {
    if state.editing.is_some() {
        return "Enter Commit | Esc Cancel | non-numeric input clears the override".to_string();
    }
    let keys: &[&str] = match state.screen {
        Screen::PlayerPool => &[
            "1-4 Screens",
            "j/k Move",
            "m/f/a/c Mode",
            "e Edit",
            "l Lock",
            "x Exclude",
            "b Boost",
            "n/t/$/p Sort",
            "/ Search",
            "F Filter",
            "+/- Uniq",
            "C Clear",
            "? Help",
            "q Quit",
        ],
        Screen::Exposure => &[
            "1-4 Screens",
            "j/k Move",
            "[ Min",
            "] Max",
            "l Lock",
            "x Exclude",
            "? Help",
            "q Quit",
        ],
        Screen::Lineups => &[
            "1-4 Screens",
            "j/k Move",
            "r Regenerate",
            "y Copy CSV",
            "E Export xlsx",
            "? Help",
            "q Quit",
        ],
        Screen::Matches => &[
            "1-4 Screens",
            "j/k Move",
            "Enter/s Run Sim",
            "r Refresh",
            "? Help",
            "q Quit",
        ],
    };
    keys.join(" | ")
}

fn render_pool(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.visible_rows();
    if rows.is_empty() {
        let empty = Paragraph::new("No players match the current filters")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from(sort_header(state, SortColumn::Player, "Player")),
        Cell::from(sort_header(state, SortColumn::Team, "Team")),
        Cell::from(sort_header(state, SortColumn::Salary, "Salary")),
        Cell::from(sort_header(state, SortColumn::Projection, "Proj")),
        Cell::from("Actions"),
        Cell::from("Range"),
        Cell::from("Status"),
    ])
    .style(header_style);

    let visible = area.height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);
    let body: Vec<Row> = rows[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| pool_row(state, row, start + offset == state.selected))
        .collect();

    let widths = [
        Constraint::Min(14),
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(13),
    ];
    let table = Table::new(body, widths).header(header).column_spacing(1);
    frame.render_widget(table, area);
}

fn pool_row<'a>(state: &AppState, row: &DisplayRow, selected: bool) -> Row<'a> {
    let base = if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    };

    let proj_text = match &state.editing {
        Some(edit) if edit.player_id == row.player.id && edit.field == EditField::Projection => {
            format!("{}_", edit.editor.buffer)
        }
        _ => format!("{:.1}", row.display_projection),
    };
    let proj_style = if row.is_edited {
        base.fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        base
    };

    Row::new(vec![
        Cell::from(row.player.name.clone()),
        Cell::from(row.player.team.clone()),
        Cell::from(lineup::format_salary(row.player.salary)),
        Cell::from(proj_text).style(proj_style),
        Cell::from(action_glyphs(row)),
        Cell::from(distribution_glyphs(
            row.player.stats.floor,
            row.player.stats.mean,
            row.player.stats.ceiling,
        )),
        Cell::from(status_label(row.player.status)),
    ])
    .style(base)
}

fn sort_header(state: &AppState, column: SortColumn, label: &str) -> String {
    match state.sorting {
        Some(sorting) if sorting.column == column => match sorting.direction {
            SortDirection::Asc => format!("{label} ▲"),
            SortDirection::Desc => format!("{label} ▼"),
        },
        _ => label.to_string(),
    }
}

fn action_glyphs(row: &DisplayRow) -> String {
    let status = row
        .user_override
        .as_ref()
        .map(|o| o.lock_status())
        .unwrap_or_default();
    let boosted = row.user_override.as_ref().is_some_and(|o| o.is_boosted());
    let lock = if status == LockStatus::Locked { 'L' } else { '·' };
    let exclude = if status == LockStatus::Excluded { 'X' } else { '·' };
    let boost = if boosted { '⚡' } else { '·' };
    format!("{lock} {exclude} {boost}")
}

fn distribution_glyphs(floor: f64, mean: f64, ceiling: f64) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let top = floor.max(mean).max(ceiling);
    if top <= 0.0 {
        return "▁▁▁".to_string();
    }
    [floor, mean, ceiling]
        .iter()
        .map(|v| {
            let idx = ((v / top) * (LEVELS.len() - 1) as f64).round() as usize;
            LEVELS[idx.min(LEVELS.len() - 1)]
        })
        .collect()
}

fn render_exposure(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.exposure_rows();
    if rows.is_empty() {
        let empty =
            Paragraph::new("No players to manage").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let block = Block::default()
        .title("Exposure Management")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.exposure_selected, rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        render_exposure_row(frame, row_area, state, &rows[idx], idx == state.exposure_selected);
    }
}

fn render_exposure_row(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    row: &ExposureRow,
    selected: bool,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(20),
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(18),
        ])
        .split(area);

    let name_style = if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(format!("{} {}", row.player_name, row.team)).style(name_style),
        cols[0],
    );

    let ratio = exposure::bar_fill(row.current, 1000) as f64 / 1000.0;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Blue))
        .ratio(ratio)
        .label("");
    frame.render_widget(gauge, cols[1]);
    frame.render_widget(Paragraph::new(row.current_label()), cols[2]);

    let editing = state
        .editing
        .as_ref()
        .filter(|e| e.player_id == row.player_id);
    let min_text = match editing {
        Some(e) if e.field == EditField::ExposureMin => format!("{}_", e.editor.buffer),
        _ => format!("{:.0}", row.bounds.min),
    };
    let max_text = match editing {
        Some(e) if e.field == EditField::ExposureMax => format!("{}_", e.editor.buffer),
        _ => format!("{:.0}", row.bounds.max),
    };
    let max_style = if row.bounds.is_invalid() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let bounds = Line::from(vec![
        Span::raw(format!("{min_text:>5}")),
        Span::styled(" - ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{max_text:>5}"), max_style),
        Span::styled(" %", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(bounds), cols[3]);
}

fn render_lineups(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.lineups.is_empty() {
        let empty = Paragraph::new("No lineups yet (need at least 8 eligible players)")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    const CARD_WIDTH: u16 = 36;
    let per_row = (area.width / CARD_WIDTH).max(1) as usize;
    let card_height = (lineup::ROSTER_SLOTS.len() + 4) as u16;
    let rows_visible = (area.height / card_height).max(1) as usize;
    let capacity = per_row * rows_visible;
    let first_row =
        (state.lineup_selected / per_row).saturating_sub(rows_visible.saturating_sub(1));
    let start = first_row * per_row;

    for (slot, (idx, lineup)) in state
        .lineups
        .iter()
        .enumerate()
        .skip(start)
        .take(capacity)
        .enumerate()
    {
        let card_area = Rect {
            x: area.x + (slot % per_row) as u16 * CARD_WIDTH,
            y: area.y + (slot / per_row) as u16 * card_height,
            width: CARD_WIDTH.min(area.width),
            height: card_height.min(area.height),
        };
        render_lineup_card(frame, card_area, lineup, idx == state.lineup_selected);
    }
}

fn render_lineup_card(frame: &mut Frame, area: Rect, lineup: &Lineup, selected: bool) {
    let border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let roi_style = match lineup.roi {
        Some(roi) if roi < 0.0 => Style::default().fg(Color::Red),
        Some(_) => Style::default().fg(Color::Green),
        None => Style::default().fg(Color::DarkGray),
    };
    let block = Block::default()
        .title(lineup.short_id())
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(lineup.roi_label(), roi_style),
            Span::raw("  "),
            Span::styled(lineup.points_label(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(lineup.salary_label(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
    ];
    for p in &lineup.players {
        lines.push(Line::from(format!(
            "{:<5}{:<20}{:>6.1}",
            p.position, p.name, p.projection
        )));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.matches.is_empty() {
        let text = if state.matches_loading {
            "Loading...".to_string()
        } else {
            "No matches found\nCheck back later for upcoming matches.".to_string()
        };
        let empty = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        "Player 1",
        "Player 2",
        "Start Time",
        "Odds (P1/P2)",
        "Sim Win % (P1)",
        "Mkt % (P1)",
        "Edge",
        "",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let visible = area.height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.match_selected, state.matches.len(), visible);
    let body: Vec<Row> = state.matches[start..end]
        .iter()
        .enumerate()
        .map(|(offset, m)| {
            let selected = start + offset == state.match_selected;
            let style = if selected {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let pending = if state.pending_simulations.contains(&m.id) {
                "running"
            } else {
                ""
            };
            Row::new(vec![
                Cell::from(m.player1_name.clone()),
                Cell::from(m.player2_name.clone()),
                Cell::from(matches::format_start_time(&m.start_time)),
                Cell::from(matches::format_odds(m)),
                Cell::from(matches::format_sim_win(m))
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(matches::format_market_p1(m)),
                Cell::from(matches::format_edge(m)),
                Cell::from(pending),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(14),
        Constraint::Min(14),
        Constraint::Length(17),
        Constraint::Length(13),
        Constraint::Length(15),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(8),
    ];
    frame.render_widget(Table::new(body, widths).header(header), area);
}

fn render_filter_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered_rect(40, 60, area);
    frame.render_widget(Clear, popup);

    let mut lines = vec![Line::from(Span::styled(
        "Teams",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let teams = state.teams();
    for (idx, team) in teams.iter().enumerate() {
        let checked = !state.filter.hidden_teams.contains(team);
        lines.push(filter_line(idx == state.filter_cursor, checked, team));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Status",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (offset, status) in FILTER_STATUSES.iter().enumerate() {
        let checked = state.filter.statuses.contains(status);
        lines.push(filter_line(
            teams.len() + offset == state.filter_cursor,
            checked,
            status_label(*status),
        ));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title("Global Settings (space toggles)")
            .borders(Borders::ALL),
    );
    frame.render_widget(panel, popup);
}

fn filter_line(cursor: bool, checked: bool, label: &str) -> Line<'static> {
    let prefix = if cursor { "> " } else { "  " };
    let mark = if checked { "[x]" } else { "[ ]" };
    Line::from(format!("{prefix}{mark} {label}"))
}

fn render_toasts(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(toast) = state.toasts.back() else {
        return;
    };
    let width = (toast.message.chars().count() as u16 + 4).min(area.width);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 3.min(area.height),
    };
    let color = match toast.level {
        ToastLevel::Success => Color::Green,
        ToastLevel::Error => Color::Red,
        ToastLevel::Info => Color::Blue,
    };
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(toast.message.clone()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        ),
        popup,
    );
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Lineup Terminal - Help",
        "",
        "Global:",
        "  1/2/3/4 Tab  Player pool / Exposure / Lineups / Matches",
        "  j/k or ↑/↓   Move",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Player pool:",
        "  m            Cycle projection mode (f floor, a mean, c ceiling)",
        "  e / Enter    Edit projection (non-numeric input clears it)",
        "  l / x / b    Lock / Exclude / Boost",
        "  n t $ p      Sort by name, team, salary, projection",
        "  / F          Search / Filter panel",
        "  + / -        Uniqueness threshold",
        "  C            Clear all overrides",
        "",
        "Exposure:  [ / ]  Edit min / max",
        "Lineups:   r Regenerate, y Copy CSV, E Export xlsx",
        "Matches:   Enter/s Run Sim, r Refresh",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
