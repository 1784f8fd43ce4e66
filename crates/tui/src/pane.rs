//! One browsable resource collection: table, search, form and confirmations.

use std::{future::Future, time::Instant};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use racedesk_core::{
    reference::fetch_race_screen, ActionError, ApiClient, ApiError, Director, License,
    ListController, LoadPhase, NotificationKind, Participation, Race, RaceReferenceData, Racer,
    Resource, ResourceKind, ResourceStore, Sponsor,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    app::{centered_rect, AppEvent, Theme},
    form::RecordForm,
};

const LABEL_WIDTH: usize = 16;

/// How a pane fetches its collection.
#[async_trait]
pub(crate) trait PaneLoad: Resource {
    async fn fetch(api: &ApiClient) -> Result<(Vec<Self>, Option<RaceReferenceData>), ApiError> {
        let records = <ApiClient as ResourceStore<Self>>::list(api).await?;
        Ok((records, None))
    }
}

impl PaneLoad for Racer {}
impl PaneLoad for Director {}
impl PaneLoad for License {}
impl PaneLoad for Sponsor {}
impl PaneLoad for Participation {}

#[async_trait]
impl PaneLoad for Race {
    async fn fetch(api: &ApiClient) -> Result<(Vec<Self>, Option<RaceReferenceData>), ApiError> {
        let (races, reference) = fetch_race_screen(api, api, api, api).await?;
        Ok((races, Some(reference)))
    }
}

/// Results delivered back from spawned requests.
pub(crate) enum Completion<R: Resource> {
    Loaded(u64, Result<(Vec<R>, Option<RaceReferenceData>), ApiError>),
    Created(Result<R, ApiError>),
    Updated(R::Key, Result<R, ApiError>),
    Deleted(R::Key, Result<(), ApiError>),
    Inspected(R::Key, Option<R>),
}

enum Mode<R: Resource> {
    Browse,
    Search,
    Form {
        form: RecordForm,
        key: Option<R::Key>,
    },
    Confirm(R::Key),
    Detail(R),
}

/// Object-safe view of a resource pane, used by the sidebar.
pub(crate) trait Pane {
    fn kind(&self) -> ResourceKind;
    /// Start the first load if it has not happened yet.
    fn activate(&mut self);
    fn reload(&mut self);
    /// Apply finished requests; returns whether anything changed.
    fn drain(&mut self) -> bool;
    fn tick(&mut self, now: Instant);
    /// Whether a prompt, search or modal wants every key.
    fn captures_input(&self) -> bool;
    fn handle_key(&mut self, key: KeyEvent);
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
    fn status(&self, now: Instant) -> Option<(String, NotificationKind)>;
    fn hint(&self) -> &'static str;
    fn badge(&self) -> String;
}

pub(crate) struct ResourcePane<R: PaneLoad> {
    api: ApiClient,
    controller: ListController<R>,
    reference: Option<RaceReferenceData>,
    mode: Mode<R>,
    cursor: usize,
    started: bool,
    generation: u64,
    completions_tx: mpsc::UnboundedSender<Completion<R>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<R>>,
    wake: mpsc::Sender<AppEvent>,
}

impl<R: PaneLoad> ResourcePane<R> {
    pub fn new(api: ApiClient, controller: ListController<R>, wake: mpsc::Sender<AppEvent>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            api,
            controller,
            reference: None,
            mode: Mode::Browse,
            cursor: 0,
            started: false,
            generation: 0,
            completions_tx,
            completions_rx,
            wake,
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion<R>> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        let wake = self.wake.clone();
        tokio::spawn(async move {
            let completion = task.await;
            if completions.send(completion).is_ok() {
                let _ = wake.send(AppEvent::Completed).await;
            }
        });
    }

    fn start_load(&mut self) {
        self.started = true;
        self.generation += 1;
        self.cursor = 0;
        self.mode = Mode::Browse;
        self.controller.begin_load();
        let api = self.api.clone();
        let generation = self.generation;
        self.spawn(async move { Completion::Loaded(generation, R::fetch(&api).await) });
    }

    fn apply(&mut self, completion: Completion<R>) {
        match completion {
            Completion::Loaded(generation, result) => {
                if generation != self.generation {
                    debug!(resource = R::KIND.path(), generation, "stale load ignored");
                    return;
                }
                let result = result.map(|(records, reference)| {
                    self.reference = reference;
                    records
                });
                let _ = self.controller.finish_load(result);
            }
            Completion::Created(result) => {
                let outcome = self.controller.finish_create(result);
                self.after_submit(outcome);
            }
            Completion::Updated(key, result) => {
                let outcome = self.controller.finish_update(&key, result);
                self.after_submit(outcome);
            }
            Completion::Deleted(key, result) => {
                let _ = self.controller.finish_delete(&key, result);
                if self.controller.page_items().is_empty() {
                    self.controller.prev_page();
                }
            }
            Completion::Inspected(key, found) => {
                if let Some(record) = self.controller.finish_inspect(&key, found) {
                    self.mode = Mode::Detail(record.clone());
                }
            }
        }
        self.clamp_cursor();
    }

    fn after_submit(&mut self, outcome: Result<(), ActionError>) {
        let Mode::Form { form, .. } = &mut self.mode else {
            return;
        };
        match outcome {
            Ok(()) => self.mode = Mode::Browse,
            Err(err) => {
                form.pending = false;
                form.error = Some(err.to_string());
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.controller.page_items().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn selected(&self) -> Option<R> {
        self.controller
            .page_items()
            .get(self.cursor)
            .map(|record| (*record).clone())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.controller.page_items().len();
        if len == 0 {
            return;
        }
        self.cursor = (self.cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    fn change_page(&mut self, forward: bool) {
        let moved = if forward {
            self.controller.next_page()
        } else {
            self.controller.prev_page()
        };
        if moved {
            self.cursor = 0;
        }
    }

    fn ready(&mut self) -> bool {
        if self.controller.phase() == LoadPhase::Ready {
            return true;
        }
        self.controller.notify(
            ActionError::NotReady.to_string(),
            NotificationKind::Error,
        );
        false
    }

    fn open_create(&mut self) {
        if !self.ready() {
            return;
        }
        let title = format!("New {}", R::KIND.singular());
        let form = RecordForm::create(title, R::fields(), self.reference.as_ref());
        self.controller.clear_error();
        self.mode = Mode::Form { form, key: None };
    }

    fn open_edit(&mut self) {
        if !self.ready() {
            return;
        }
        let Some(record) = self.selected() else {
            return;
        };
        let key = record.key();
        let title = format!("Edit {} {key}", R::KIND.singular());
        let form = RecordForm::edit(
            title,
            R::fields(),
            record.field_values(),
            self.reference.as_ref(),
        );
        self.controller.clear_error();
        self.mode = Mode::Form {
            form,
            key: Some(key),
        };
    }

    fn submit_form(&mut self) {
        let (key, draft) = {
            let Mode::Form { form, key } = &mut self.mode else {
                return;
            };
            if form.pending {
                return;
            }
            let draft = match R::from_field_values(&form.values()) {
                Ok(draft) => draft,
                Err(err) => {
                    form.error = Some(err.to_string());
                    return;
                }
            };
            let begun = match key {
                None => self.controller.begin_create(&draft),
                Some(key) => self.controller.begin_update(key, &draft),
            };
            if let Err(err) = begun {
                form.error = Some(err.to_string());
                return;
            }
            form.error = None;
            form.pending = true;
            (key.clone(), draft)
        };

        let api = self.api.clone();
        match key {
            None => self.spawn(async move {
                Completion::Created(<ApiClient as ResourceStore<R>>::create(&api, &draft).await)
            }),
            Some(key) => self.spawn(async move {
                let result = <ApiClient as ResourceStore<R>>::update(&api, &key, &draft).await;
                Completion::Updated(key, result)
            }),
        }
    }

    fn confirm_delete(&mut self, key: R::Key) {
        self.mode = Mode::Browse;
        if let Err(err) = self.controller.begin_delete(&key) {
            self.controller
                .notify(err.to_string(), NotificationKind::Error);
            return;
        }
        let api = self.api.clone();
        self.spawn(async move {
            let result = <ApiClient as ResourceStore<R>>::delete(&api, &key).await;
            Completion::Deleted(key, result)
        });
    }

    fn inspect(&mut self) {
        let Some(record) = self.selected() else {
            return;
        };
        let key = record.key();
        let api = self.api.clone();
        self.spawn(async move {
            let found = <ApiClient as ResourceStore<R>>::get(&api, &key).await;
            Completion::Inspected(key, found)
        });
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => self.change_page(true),
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => self.change_page(false),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('a') => self.open_create(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit(),
            KeyCode::Char('i') => self.inspect(),
            KeyCode::Char('d') => {
                if self.ready() {
                    if let Some(record) = self.selected() {
                        self.mode = Mode::Confirm(record.key());
                    }
                }
            }
            KeyCode::Esc => self.controller.dismiss_notification(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Esc => {
                self.controller.set_search("");
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => self.controller.pop_search_char(),
            KeyCode::Char(ch) if is_plain(&key) => self.controller.push_search_char(ch),
            _ => return,
        }
        self.cursor = 0;
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Mode::Form { form, .. } = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.controller.clear_error();
                self.mode = Mode::Browse;
                return;
            }
            KeyCode::Enter => {
                self.submit_form();
                return;
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Left => form.horizontal(-1),
            KeyCode::Right => form.horizontal(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Delete => form.delete(),
            KeyCode::Char(ch) if is_plain(&key) => form.insert(ch),
            _ => {}
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let page_count = self.controller.page_count().max(1);
        let title = format!(
            "{} · page {}/{} · {} shown",
            R::KIND.title(),
            self.controller.page(),
            page_count,
            self.controller.filtered().len(),
        );
        let block = Block::default().borders(Borders::ALL).title(title);

        match self.controller.phase() {
            LoadPhase::Loading => {
                let text = format!("Loading {}…", R::KIND.plural());
                frame.render_widget(
                    Paragraph::new(Span::styled(text, Style::default().fg(theme.muted)))
                        .block(block),
                    area,
                );
                return;
            }
            LoadPhase::Failed => {
                let lines = vec![
                    Line::from(Span::styled(
                        self.controller.error().unwrap_or("Load failed").to_string(),
                        Style::default().fg(theme.danger),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press Ctrl-R to retry",
                        Style::default().fg(theme.muted),
                    )),
                ];
                frame.render_widget(
                    Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
                    area,
                );
                return;
            }
            LoadPhase::Ready => {}
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let show_search = matches!(self.mode, Mode::Search) || !self.controller.search().is_empty();
        let constraints = if show_search {
            vec![Constraint::Length(1), Constraint::Min(1)]
        } else {
            vec![Constraint::Min(1)]
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let table_area = if show_search {
            let style = if matches!(self.mode, Mode::Search) {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.muted)
            };
            let search = Line::from(vec![
                Span::styled("/ ", style.add_modifier(Modifier::BOLD)),
                Span::styled(self.controller.search().to_string(), style),
            ]);
            frame.render_widget(Paragraph::new(search), chunks[0]);
            if matches!(self.mode, Mode::Search) {
                let x = chunks[0].x + 2 + self.controller.search().chars().count() as u16;
                frame.set_cursor(x.min(chunks[0].right().saturating_sub(1)), chunks[0].y);
            }
            chunks[1]
        } else {
            chunks[0]
        };

        let page = self.controller.page_items();
        if page.is_empty() {
            let message = if self.controller.items().is_empty() {
                format!("No {} yet. Press a to add one.", R::KIND.plural())
            } else if self.controller.filtered().is_empty() {
                format!("No {} match \"{}\"", R::KIND.plural(), self.controller.search())
            } else {
                "Nothing on this page. Press p to go back.".to_string()
            };
            frame.render_widget(
                Paragraph::new(Span::styled(message, Style::default().fg(theme.muted))),
                table_area,
            );
            return;
        }

        let fields = R::fields();
        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(fields.iter().map(|field| Cell::from(field.label))),
        )
        .style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = page
            .iter()
            .map(|record| {
                let busy = self.controller.is_busy(&record.key());
                let marker = if busy { "⟳" } else { "" };
                let style = if busy {
                    Style::default().fg(theme.muted)
                } else {
                    Style::default().fg(theme.primary_fg)
                };
                Row::new(
                    std::iter::once(Cell::from(marker))
                        .chain(record.field_values().into_iter().map(Cell::from)),
                )
                .style(style)
            })
            .collect();

        let widths: Vec<Constraint> = std::iter::once(Constraint::Length(2))
            .chain(fields.iter().map(|_| Constraint::Ratio(1, fields.len() as u32)))
            .collect();

        let table = Table::new(rows, widths).header(header).highlight_style(
            Style::default()
                .bg(theme.selection_bg)
                .fg(theme.selection_fg),
        );
        let mut state = TableState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(table, table_area, &mut state);
    }

    fn render_form(frame: &mut Frame, form: &RecordForm, theme: &Theme) {
        let height = form.fields.len() as u16 + 6;
        let area = centered_rect(72, height, frame.size());
        frame.render_widget(Clear, area);

        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let focused = idx == form.focus;
                let marker = if focused {
                    Span::styled("▶ ", Style::default().fg(theme.accent))
                } else {
                    Span::raw("  ")
                };
                let mut label_style = Style::default().fg(theme.primary_fg);
                if focused {
                    label_style = label_style.fg(theme.accent).add_modifier(Modifier::BOLD);
                }
                let label = Span::styled(format!("{:<LABEL_WIDTH$}", field.label), label_style);
                let value = if field.locked {
                    Span::styled(
                        format!("{} (locked)", field.value),
                        Style::default().fg(theme.muted),
                    )
                } else if field.is_selector() {
                    let shown = if field.value.is_empty() {
                        "choose".to_string()
                    } else {
                        field.value.clone()
                    };
                    Span::styled(format!("‹ {shown} ›"), Style::default().fg(theme.primary_fg))
                } else {
                    Span::raw(field.value.clone())
                };
                Line::from(vec![marker, label, value])
            })
            .collect();

        lines.push(Line::from(""));
        if form.pending {
            lines.push(Line::from(Span::styled(
                "Saving…",
                Style::default().fg(theme.warning),
            )));
        } else if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(theme.danger),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next field  "),
            Span::styled("←→", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" choose  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(form.title.clone()),
        );
        frame.render_widget(paragraph, area);

        if let Some(field) = form.fields.get(form.focus) {
            if !field.locked && !field.is_selector() && !form.pending {
                let x = area.x + 1 + 2 + LABEL_WIDTH as u16 + field.cursor() as u16;
                let y = area.y + 1 + form.focus as u16;
                frame.set_cursor(x.min(area.right().saturating_sub(2)), y);
            }
        }
    }

    fn render_confirm(frame: &mut Frame, key: &R::Key, theme: &Theme) {
        let area = centered_rect(56, 5, frame.size());
        frame.render_widget(Clear, area);
        let lines = vec![
            Line::from(format!("Delete {} {key}?", R::KIND.singular())),
            Line::from(vec![
                Span::styled("y", Style::default().fg(theme.danger).add_modifier(Modifier::BOLD)),
                Span::raw(" delete  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" keep"),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_detail(frame: &mut Frame, record: &R, theme: &Theme) {
        let fields = R::fields();
        let area = centered_rect(64, fields.len() as u16 + 4, frame.size());
        frame.render_widget(Clear, area);
        let mut lines: Vec<Line> = fields
            .iter()
            .zip(record.field_values())
            .map(|(field, value)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:<LABEL_WIDTH$}", field.label),
                        Style::default().fg(theme.muted),
                    ),
                    Span::raw(value),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Esc close",
            Style::default().fg(theme.muted),
        )));
        let title = format!("{} {}", R::KIND.singular(), record.key());
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
    }
}

impl<R: PaneLoad> Pane for ResourcePane<R> {
    fn kind(&self) -> ResourceKind {
        R::KIND
    }

    fn activate(&mut self) {
        if !self.started {
            self.start_load();
        }
    }

    fn reload(&mut self) {
        if !self.controller.is_idle() {
            self.controller.notify(
                ActionError::Busy.to_string(),
                NotificationKind::Error,
            );
            return;
        }
        self.start_load();
    }

    fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            changed = true;
        }
        changed
    }

    fn tick(&mut self, now: Instant) {
        self.controller.expire_notification(now);
    }

    fn captures_input(&self) -> bool {
        !matches!(self.mode, Mode::Browse)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match &self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Form { .. } => self.handle_form_key(key),
            Mode::Confirm(pending) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let pending = pending.clone();
                    self.confirm_delete(pending);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.mode = Mode::Browse;
                }
                _ => {}
            },
            Mode::Detail(_) => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = Mode::Browse;
                }
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        self.clamp_cursor();
        self.render_table(frame, area, theme);
        match &self.mode {
            Mode::Form { form, .. } => Self::render_form(frame, form, theme),
            Mode::Confirm(key) => Self::render_confirm(frame, key, theme),
            Mode::Detail(record) => Self::render_detail(frame, record, theme),
            Mode::Browse | Mode::Search => {}
        }
    }

    fn status(&self, now: Instant) -> Option<(String, NotificationKind)> {
        if let Some(notification) = self.controller.notification() {
            if notification.is_live(now) {
                return Some((notification.message.clone(), notification.kind));
            }
        }
        self.controller
            .error()
            .map(|error| (error.to_string(), NotificationKind::Error))
    }

    fn hint(&self) -> &'static str {
        match self.mode {
            Mode::Browse => {
                "j/k move  n/p page  / search  a add  e edit  d delete  i inspect  Ctrl-R reload  q quit"
            }
            Mode::Search => "type to filter  Enter keep  Esc clear",
            Mode::Form { .. } => "Enter save  Tab next field  ←→ choose  Esc cancel",
            Mode::Confirm(_) => "y delete  n keep",
            Mode::Detail(_) => "Esc close",
        }
    }

    fn badge(&self) -> String {
        match self.controller.phase() {
            LoadPhase::Loading if self.started => "…".to_string(),
            LoadPhase::Loading => String::new(),
            LoadPhase::Failed => "!".to_string(),
            LoadPhase::Ready => self.controller.items().len().to_string(),
        }
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT
}
