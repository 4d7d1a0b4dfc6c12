mod help;
mod state;

use crate::cli::{build_facade, Cli, DataPaths};
use crate::model::{DashboardData, DashboardView, LogLevel};
use crate::orchestrator::{self, DashboardEvent, UiCommand};
use crate::text_summary::{log_line, record_line};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{UiState, TAB_CATEGORIES, TAB_DASHBOARD, TAB_HELP};
use std::{io, time::Duration, time::Instant};
use time::macros::format_description;
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, paths: DataPaths) -> Result<()> {
    let facade = build_facade(&args, &paths);
    let refresh_every = Duration::from(args.refresh_interval);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<DashboardEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    tracing::info!(data_dir = %paths.data_dir.display(), "starting dashboard");

    let data_dir = paths.data_dir.display().to_string();
    let ui_handle = std::thread::spawn(move || {
        run_threaded(data_dir, refresh_every.as_secs(), event_rx, cmd_tx)
    });

    let res = orchestrator::run_controller(facade, refresh_every, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    data_dir: String,
    refresh_secs: u64,
    mut event_rx: UnboundedReceiver<DashboardEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal
                .draw(|f| draw(f.area(), f, &state, &data_dir, refresh_secs))
                .ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('r')) => {
                        state.info = "Refreshing…".into();
                        let _ = cmd_tx.send(UiCommand::Refresh);
                    }
                    (_, KeyCode::Tab) => state.next_tab(),
                    (_, KeyCode::Char('?')) => state.tab = TAB_HELP,
                    (_, KeyCode::Down) | (_, KeyCode::Char('j')) if state.tab == TAB_CATEGORIES => {
                        state.select_next_category();
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Char('k')) if state.tab == TAB_CATEGORIES => {
                        state.select_prev_category();
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState, data_dir: &str, refresh_secs: u64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Dashboard"),
        Line::from("Categories"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("extraction-dashboard"),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_DASHBOARD => draw_dashboard(chunks[1], f, state),
        TAB_CATEGORIES => draw_categories(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, data_dir, refresh_secs),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    match state.view.as_ref() {
        None => {
            let p = Paragraph::new("Loading dashboard…")
                .block(Block::default().borders(Borders::ALL).title("Dashboard"));
            f.render_widget(p, main[0]);
        }
        Some(DashboardView::Degraded { error }) => {
            let p = Paragraph::new(vec![
                Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(vec![
                    Span::raw("Press "),
                    Span::styled("r", Style::default().fg(Color::Magenta)),
                    Span::raw(" to retry."),
                ]),
            ])
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Dashboard"));
            f.render_widget(p, main[0]);
        }
        Some(DashboardView::Ready(data)) => draw_ready(main[0], f, data),
    }

    draw_status(main[1], f, state);
}

/// Rows for a bordered list of `items` entries, at least one line tall.
fn bordered_list_height(items: usize) -> u16 {
    u16::try_from(items.max(1))
        .unwrap_or(u16::MAX)
        .saturating_add(2)
}

fn draw_ready(area: Rect, f: &mut ratatui::Frame, data: &DashboardData) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(5), // Stat cards
                Constraint::Min(4),    // Recent extractions
                Constraint::Length(bordered_list_height(data.recent_logs.len())),
            ]
            .as_ref(),
        )
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4].as_ref())
        .split(rows[0]);

    let s = &data.summary;
    let extractions = Paragraph::new(vec![
        Line::from(vec![Span::raw("Total:     "), Span::raw(s.processed.to_string())]),
        Line::from(vec![
            Span::raw("Succeeded: "),
            Span::styled(s.succeeded.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw("Failed:    "),
            Span::styled(s.failed.to_string(), Style::default().fg(Color::Red)),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Extractions"));
    f.render_widget(extractions, cards[0]);

    let rate = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Success rate"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio((s.success_rate_percent / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.1}%", s.success_rate_percent));
    f.render_widget(rate, cards[1]);

    let found = Paragraph::new(vec![
        Line::from(format!("Companies: {}", s.companies_found)),
        Line::from(format!("Products:  {}", s.products_found)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Found"));
    f.render_widget(found, cards[2]);

    let contacts = Paragraph::new(vec![
        Line::from(format!("Emails: {}", s.emails_extracted)),
        Line::from(format!("Phones: {}", s.phones_extracted)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Contacts"));
    f.render_widget(contacts, cards[3]);

    let records: Vec<ListItem> = if data.recent_records.is_empty() {
        vec![ListItem::new(Span::styled(
            "No extractions yet",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        data.recent_records
            .iter()
            .map(|r| ListItem::new(record_line(r)))
            .collect()
    };
    f.render_widget(
        List::new(records).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Recent extractions ({})", data.recent_records.len())),
        ),
        rows[1],
    );

    let logs: Vec<ListItem> = if data.recent_logs.is_empty() {
        vec![ListItem::new(Span::styled(
            "No operations logged yet",
            Style::default().fg(Color::Gray),
        ))]
    } else {
        data.recent_logs
            .iter()
            .map(|e| {
                let color = match e.level {
                    LogLevel::Info => Color::White,
                    LogLevel::Warning => Color::Yellow,
                    LogLevel::Error => Color::Red,
                };
                ListItem::new(Span::styled(log_line(e), Style::default().fg(color)))
            })
            .collect()
    };
    f.render_widget(
        List::new(logs).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Recent operations ({})", data.recent_logs.len())),
        ),
        rows[2],
    );
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let fmt = format_description!("[hour]:[minute]:[second]");
    let refreshed = state
        .last_refreshed
        .and_then(|t| t.format(&fmt).ok())
        .map(|t| format!("{t} UTC"))
        .unwrap_or_else(|| "never".into());

    let mut spans = vec![
        Span::styled("Last refresh: ", Style::default().fg(Color::Gray)),
        Span::raw(refreshed),
    ];
    if state.refreshing {
        spans.push(Span::styled("  (refreshing)", Style::default().fg(Color::Yellow)));
    }
    if !state.info.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::raw(state.info.clone()));
    }
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn draw_categories(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let categories = state.taxonomy.categories();
    let items: Vec<ListItem> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let style = if i == state.category_selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let marker = if i == state.category_selected { "> " } else { "  " };
            ListItem::new(Span::styled(format!("{marker}{}", c.name), style))
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Categories")),
        cols[0],
    );

    let (title, subs): (&str, Vec<ListItem>) = match categories.get(state.category_selected) {
        Some(c) => (
            c.name,
            c.subcategories
                .iter()
                .map(|s| ListItem::new(format!("  {s}")))
                .collect(),
        ),
        None => ("Subcategories", Vec::new()),
    };
    f.render_widget(
        List::new(subs).block(Block::default().borders(Borders::ALL).title(title)),
        cols[1],
    );
}
