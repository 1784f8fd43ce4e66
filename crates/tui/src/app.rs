use std::{io, thread, time::Duration, time::Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use racedesk_core::{
    ApiClient, AppConfig, Director, License, ListController, NotificationKind, Participation,
    Race, Racer, Sponsor,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::pane::{Pane, PaneLoad, ResourcePane};

const TICK_RATE: Duration = Duration::from_millis(250);
const SIDEBAR_WIDTH: u16 = 26;

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub primary_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

pub(crate) enum AppEvent {
    Input(Event),
    Tick,
    /// A pane has finished requests waiting to be applied.
    Completed,
}

/// Sidebar of resource panes over one API client.
pub struct RaceDeskApp {
    panes: Vec<Box<dyn Pane>>,
    active: usize,
    theme: Theme,
    api_label: String,
    should_quit: bool,
    event_tx: mpsc::Sender<AppEvent>,
    event_rx: Option<mpsc::Receiver<AppEvent>>,
}

impl RaceDeskApp {
    pub fn new(config: &AppConfig, api: ApiClient) -> Self {
        let (event_tx, event_rx) = mpsc::channel::<AppEvent>(128);
        let api_label = api.base_url().to_string();
        let panes = vec![
            pane::<Racer>(config, &api, &event_tx),
            pane::<Race>(config, &api, &event_tx),
            pane::<Director>(config, &api, &event_tx),
            pane::<License>(config, &api, &event_tx),
            pane::<Sponsor>(config, &api, &event_tx),
            pane::<Participation>(config, &api, &event_tx),
        ];
        Self {
            panes,
            active: 0,
            theme: Theme::default(),
            api_label,
            should_quit: false,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let Some(mut event_rx) = self.event_rx.take() else {
            anyhow::bail!("the application is already running");
        };

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        spawn_input_thread(self.event_tx.clone());
        self.select(self.active);

        let outcome = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.should_quit {
                break Ok(());
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break Ok(());
            }
        };

        restore_terminal(&mut terminal)?;
        info!("racedesk exited");
        outcome
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
            }
            Some(AppEvent::Input(_)) => {}
            Some(AppEvent::Tick) => {
                let now = Instant::now();
                for pane in &mut self.panes {
                    pane.tick(now);
                }
            }
            Some(AppEvent::Completed) => {
                for pane in &mut self.panes {
                    pane.drain();
                }
            }
            None => return false,
        }
        true
    }

    fn select(&mut self, index: usize) {
        if let Some(pane) = self.panes.get_mut(index) {
            self.active = index;
            pane.activate();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let pane = &mut self.panes[self.active];
        if pane.captures_input() {
            pane.handle_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.should_quit = true,
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                info!(resource = %pane.kind(), "reload requested");
                pane.reload();
            }
            KeyCode::Tab => self.select((self.active + 1) % self.panes.len()),
            KeyCode::BackTab => {
                self.select((self.active + self.panes.len() - 1) % self.panes.len())
            }
            KeyCode::Char(ch @ '1'..='9') => {
                let index = ch as usize - '1' as usize;
                self.select(index);
            }
            _ => pane.handle_key(key),
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(40)])
            .split(size);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(4)])
            .split(columns[1]);

        self.render_sidebar(frame, columns[0]);
        let theme = self.theme.clone();
        self.panes[self.active].render(frame, rows[0], &theme);
        self.render_status(frame, rows[1]);
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .panes
            .iter()
            .enumerate()
            .map(|(idx, pane)| {
                let marker = if idx == self.active {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let title = Span::styled(
                    format!("{} {}", idx + 1, pane.kind().title()),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let badge = Span::styled(
                    format!(" {}", pane.badge()),
                    Style::default().fg(self.theme.muted),
                );
                ListItem::new(Line::from(vec![marker, title, badge]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.active));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("RaceDesk"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let pane = &self.panes[self.active];
        let primary = match pane.status(Instant::now()) {
            Some((message, NotificationKind::Success)) => {
                Line::from(Span::styled(message, Style::default().fg(self.theme.success)))
            }
            Some((message, NotificationKind::Error)) => {
                Line::from(Span::styled(message, Style::default().fg(self.theme.danger)))
            }
            None => Line::from(Span::styled(
                format!("API {}", self.api_label),
                Style::default().fg(self.theme.muted),
            )),
        };
        let secondary = Line::from(Span::styled(
            pane.hint(),
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![primary, secondary])
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn pane<R: PaneLoad>(
    config: &AppConfig,
    api: &ApiClient,
    wake: &mpsc::Sender<AppEvent>,
) -> Box<dyn Pane> {
    Box::new(ResourcePane::<R>::new(
        api.clone(),
        ListController::from_config(config),
        wake.clone(),
    ))
}

pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    // TEST-NET-1 address: loads started by pane switches never reach a server.
    const UNREACHABLE_API: &str = "http://192.0.2.1:9/api";

    fn app() -> RaceDeskApp {
        let config = AppConfig {
            api_base_url: UNREACHABLE_API.to_string(),
            request_timeout_secs: 1,
            ..AppConfig::default()
        };
        let api = ApiClient::from_config(&config).expect("test config is valid");
        RaceDeskApp::new(&config, api)
    }

    #[tokio::test]
    async fn test_app_never_targets_a_local_server() {
        let app = app();
        assert_eq!(app.api_label, "http://192.0.2.1:9/api");
    }

    fn press(app: &mut RaceDeskApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[tokio::test]
    async fn sidebar_lists_every_resource_in_order() {
        let app = app();
        let titles: Vec<&str> = app.panes.iter().map(|pane| pane.kind().title()).collect();
        assert_eq!(
            titles,
            ["Racers", "Races", "Directors", "Licenses", "Sponsors", "Participation"]
        );
    }

    #[tokio::test]
    async fn tab_and_digits_switch_panes() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active, 1);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.active, 5);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.active, 2);
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.active, 2);
    }

    #[tokio::test]
    async fn q_quits_unless_the_pane_is_capturing_input() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn centered_rect_fits_inside_the_area() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect(80, 20, area), area);
    }
}
