use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
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
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table};

use mlb_picks_terminal::config::AppConfig;
use mlb_picks_terminal::feed::{self, FetchScope};
use mlb_picks_terminal::history::PickHistory;
use mlb_picks_terminal::matcher::PickOutcome;
use mlb_picks_terminal::persist::{FileStore, KeyValueStore, MemoryStore};
use mlb_picks_terminal::state::{
    self, AppState, Delta, HistoryEntry, Pick, Screen, apply_delta, ev_label, odds_label,
};

const CARD_HEIGHT: u16 = 10;

struct App {
    state: AppState,
    config: AppConfig,
    store: Box<dyn KeyValueStore>,
    tx: mpsc::Sender<Delta>,
    scope: Option<FetchScope>,
    next_generation: u64,
    should_quit: bool,
}

impl App {
    fn new(config: AppConfig, store: Box<dyn KeyValueStore>, tx: mpsc::Sender<Delta>) -> Self {
        let history = PickHistory::load(store.as_ref(), config.history_max);
        let state = AppState::new(history, config.match_strategy);
        Self {
            state,
            config,
            store,
            tx,
            scope: None,
            next_generation: 1,
            should_quit: false,
        }
    }

    fn mount(&mut self) {
        // Tear down the previous scope first so its workers stop publishing.
        self.scope = None;
        let generation = self.next_generation;
        self.next_generation += 1;
        self.state.begin_mount(generation);
        self.scope = Some(feed::mount(
            self.tx.clone(),
            &self.config.api_base,
            generation,
        ));
    }

    fn unmount(&mut self) {
        self.scope = None;
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('e') | KeyCode::Char('E') => self.state.toggle_ev_only(),
            KeyCode::Char('p') | KeyCode::Char('P') => self.state.toggle_parlay_only(),
            KeyCode::Char('1') => self.state.set_screen(Screen::Picks),
            KeyCode::Char('2') | KeyCode::Char('h') => self.state.set_screen(Screen::History),
            KeyCode::Tab => {
                let next = match self.state.screen {
                    Screen::Picks => Screen::History,
                    Screen::History => Screen::Picks,
                };
                self.state.set_screen(next);
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_up(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.state.push_log("[INFO] Reloading picks");
                self.mount();
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn persist_history(&mut self) {
        if !self.state.take_history_dirty() || !self.config.persist_history {
            return;
        }
        if let Err(err) = self.state.history.save(self.store.as_mut()) {
            tracing::warn!(error = %err, "failed to persist pick history");
            self.state
                .push_log(format!("[WARN] History not saved: {err:#}"));
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    init_tracing(&config);

    let store = open_store(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(config, store, tx);
    app.mount();
    let res = run_app(&mut terminal, &mut app, rx);
    app.unmount();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let Some(path) = config.log_file.as_ref() else {
        return;
    };
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("[WARN] cannot open log file {}: {err}", path.display());
            return;
        }
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}

fn open_store(config: &AppConfig) -> Box<dyn KeyValueStore> {
    if !config.persist_history {
        return Box::new(MemoryStore::new());
    }
    match config.store_path.clone().or_else(FileStore::default_path) {
        Some(path) => {
            let store = FileStore::open(path);
            tracing::info!(path = %store.path().display(), "using file store");
            Box::new(store)
        }
        None => {
            tracing::warn!("no store path resolved, history kept in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.persist_history();

        terminal.draw(|f| ui(f, app))?;

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

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], &app.state);

    match app.state.screen {
        Screen::Picks => render_picks(frame, chunks[1], &app.state),
        Screen::History => render_history(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let on = Style::default().fg(Color::White).bg(Color::Green);
    let parlay_on = Style::default().fg(Color::White).bg(Color::Blue);
    let off = Style::default();

    let title = Line::from(Span::styled(
        "MLB Daily Betting Picks",
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    let toggles = Line::from(vec![
        Span::styled(
            format!(" [e] {} ", state::ev_toggle_label(state.filter)),
            if state.filter.ev_only { on } else { off },
        ),
        Span::raw("  "),
        Span::styled(
            format!(" [p] {} ", state::parlay_toggle_label(state.filter)),
            if state.filter.parlay_only { parlay_on } else { off },
        ),
    ])
    .alignment(Alignment::Center);

    let header = Paragraph::new(vec![title, toggles])
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Picks => {
            "1 Picks | 2/h History | e +EV | p Parlay | j/k/↑/↓ Scroll | r Reload | ? Help | q Quit"
                .to_string()
        }
        Screen::History => {
            "1 Picks | j/k/↑/↓ Scroll | r Reload | ? Help | q Quit".to_string()
        }
    }
}

fn grid_columns(width: u16) -> usize {
    match width {
        0..=79 => 1,
        80..=119 => 2,
        _ => 3,
    }
}

fn render_picks(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.loading {
        render_centered_message(frame, area, "Loading...");
        return;
    }
    let filtered = state.filtered_picks();
    if filtered.is_empty() {
        render_centered_message(frame, area, "No picks found for today.");
        return;
    }
    if area.height < CARD_HEIGHT {
        render_centered_message(frame, area, "Pick cards need more height");
        return;
    }

    let cols = grid_columns(area.width);
    let visible_rows = (area.height / CARD_HEIGHT) as usize;
    let total_rows = filtered.len().div_ceil(cols);
    let first_row = (state.scroll as usize / cols).min(total_rows.saturating_sub(visible_rows));

    for (i, row) in (first_row..total_rows).take(visible_rows).enumerate() {
        let row_area = Rect {
            x: area.x,
            y: area.y + (i as u16) * CARD_HEIGHT,
            width: area.width,
            height: CARD_HEIGHT,
        };
        let constraints = vec![Constraint::Ratio(1, cols as u32); cols];
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(row_area);

        for (col, cell) in cells.iter().enumerate() {
            let Some(pick) = filtered.get(row * cols + col) else {
                break;
            };
            render_pick_card(frame, *cell, pick, state.outcome(pick));
        }
    }
}

fn render_pick_card(frame: &mut Frame, area: Rect, pick: &Pick, outcome: PickOutcome) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::Gray);
    let field = |label: &'static str, value: String| {
        Line::from(vec![Span::raw(label), Span::styled(value, bold)])
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Away Pitcher: ", dim),
            Span::raw(state::pitcher_label(pick.away_pitcher.as_deref()).to_string()),
        ]),
        Line::from(vec![
            Span::styled("Home Pitcher: ", dim),
            Span::raw(state::pitcher_label(pick.home_pitcher.as_deref()).to_string()),
        ]),
        field("Recommendation: ", state::recommendation_label(pick).to_string()),
        field("Win Probability: ", state::win_prob_label(pick.win_prob)),
        field("Odds: ", odds_label(pick.odds)),
        field("Expected Value: ", ev_label(pick.ev)),
        field("Parlay Worthy: ", state::parlay_label(pick.parlay).to_string()),
        Line::from(vec![
            Span::raw("Result: "),
            Span::styled(outcome.label(), outcome_style(outcome).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let card = Paragraph::new(lines).block(
        Block::default()
            .title(state::matchup_label(pick, "Unknown Matchup").to_string())
            .borders(Borders::ALL),
    );
    frame.render_widget(card, area);
}

fn outcome_style(outcome: PickOutcome) -> Style {
    match outcome {
        PickOutcome::Win => Style::default().fg(Color::Green),
        PickOutcome::Loss => Style::default().fg(Color::Red),
        PickOutcome::Pending => Style::default().fg(Color::Yellow),
    }
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Pick History").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let recent = state.history.recent();
    if recent.is_empty() {
        render_centered_message(frame, inner, "No history yet");
        return;
    }

    let skip = (state.scroll as usize).min(recent.len().saturating_sub(1));
    let mut y = inner.y;
    let bottom = inner.y + inner.height;
    for entry in &recent[skip..] {
        if y >= bottom {
            break;
        }
        let height = history_entry_height(entry.picks.len()).min(bottom - y);
        let entry_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height,
        };
        render_history_entry(frame, entry_area, entry, state);
        y += height;
    }
}

/// Title border, header row, one row per pick, bottom border.
fn history_entry_height(picks: usize) -> u16 {
    u16::try_from(picks).unwrap_or(u16::MAX).saturating_add(3)
}

fn render_history_entry(frame: &mut Frame, area: Rect, entry: &HistoryEntry, state: &AppState) {
    let title = entry
        .date
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let header = Row::new(vec!["Matchup", "Pick", "Odds", "EV", "Result"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = entry.picks.iter().map(|p| {
        Row::new(vec![
            state::matchup_label(p, "N/A").to_string(),
            state::recommendation_label(p).to_string(),
            odds_label(p.odds),
            ev_label(p.ev),
            state.outcome(p).label().to_string(),
        ])
    });
    let widths = [
        Constraint::Min(24),
        Constraint::Length(22),
        Constraint::Length(7),
        Constraint::Length(7),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::TOP | Borders::BOTTOM));
    frame.render_widget(table, area);
}

fn render_centered_message(frame: &mut Frame, area: Rect, text: &str) {
    if area.height == 0 {
        return;
    }
    let text_area = Rect {
        x: area.x,
        y: area.y + area.height / 2,
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, text_area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "MLB Picks - Help",
        "",
        "  e            Toggle +EV only",
        "  p            Toggle parlay picks",
        "  1            Picks",
        "  2 / h / Tab  History",
        "  j/k or ↑/↓   Scroll",
        "  r            Reload picks and results",
        "  ?            Toggle help",
        "  q            Quit",
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
