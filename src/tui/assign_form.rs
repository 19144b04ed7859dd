//! Create & Assign modal for the terminal user interface.
//!
//! The form keeps its own widget state (selector positions, date inputs,
//! the recommended-worker list) and mirrors every edit into an
//! [`AssignmentStaging`] value, which decides what can be staged and
//! committed.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::db::{parse_date_input, Database};
use crate::fields::Priority;
use crate::search::recommend;
use crate::staging::AssignmentStaging;
use crate::task::Worker;
use crate::tui::colors::{availability_color, priority_color, GREEN, ORANGE};
use crate::tui::enums::{Alert, FormAction};
use crate::tui::input::InputField;
use crate::tui::utils::centered_rect;

pub const TYPE_FIELD: usize = 0;
pub const WORKER_FIELD: usize = 1;
pub const PRIORITY_FIELD: usize = 2;
pub const START_FIELD: usize = 3;
pub const END_FIELD: usize = 4;
pub const AREA_FIELD: usize = 5;
const FIELD_COUNT: usize = 6;

/// Create & Assign form state.
pub struct AssignForm {
    pub staging: AssignmentStaging,
    pub current_field: usize,
    pub task_type: Option<usize>,
    pub priority: Option<usize>,
    pub area: Option<usize>,
    pub start: InputField,
    pub end: InputField,
    pub recommended: Vec<Worker>,
    pub show_workers: bool,
    worker_list: ListState,
}

impl Default for AssignForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Step an optional selector index through `len` options, wrapping.
fn cycle(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    })
}

/// Screen column of a text cursor inside a bordered box, kept within the box.
fn cursor_column(chunk: Rect, cursor: usize) -> u16 {
    let last = chunk.width.saturating_sub(3);
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX).min(last);
    chunk.x.saturating_add(1).saturating_add(offset)
}

impl AssignForm {
    pub fn new() -> Self {
        AssignForm {
            staging: AssignmentStaging::new(),
            current_field: TYPE_FIELD,
            task_type: None,
            priority: None,
            area: None,
            start: InputField::new(),
            end: InputField::new(),
            recommended: Vec::new(),
            show_workers: false,
            worker_list: ListState::default(),
        }
    }

    /// Clear the widgets after a successful stage, keeping the staged list.
    fn reset_widgets(&mut self) {
        let staging = self.staging.clone();
        *self = AssignForm::new();
        self.staging = staging;
    }

    fn selected_worker_index(&self) -> usize {
        self.worker_list.selected().unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
    }

    fn select_task_type(&mut self, db: &Database, forward: bool) {
        self.task_type = cycle(self.task_type, db.task_types.len(), forward);
        let Some(name) = self.task_type.and_then(|i| db.task_types.get(i)) else {
            return;
        };
        self.staging = self.staging.with_category(name.clone());
        self.recommended = recommend(&db.workers, name).into_iter().cloned().collect();
        self.show_workers = !self.recommended.is_empty();
        self.worker_list.select(if self.show_workers { Some(0) } else { None });
    }

    fn pick_worker(&mut self) {
        if let Some(worker) = self.recommended.get(self.selected_worker_index()) {
            self.staging = self.staging.with_worker(worker.clone());
            self.show_workers = false;
        }
    }

    fn sync_dates(&mut self) {
        self.staging = match parse_date_input(&self.start.value) {
            Some(d) => self.staging.with_start_date(d),
            None => self.staging.clear_start_date(),
        };
        self.staging = match parse_date_input(&self.end.value) {
            Some(d) => self.staging.with_end_date(d),
            None => self.staging.clear_end_date(),
        };
    }

    fn active_input(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            START_FIELD => Some(&mut self.start),
            END_FIELD => Some(&mut self.end),
            _ => None,
        }
    }

    fn handle_left_right(&mut self, db: &Database, right: bool) {
        match self.current_field {
            TYPE_FIELD => self.select_task_type(db, right),
            PRIORITY_FIELD => {
                self.priority = cycle(self.priority, Priority::ALL.len(), right);
                if let Some(p) = self.priority.map(|i| Priority::ALL[i]) {
                    self.staging = self.staging.with_priority(p);
                }
            }
            AREA_FIELD => {
                self.area = cycle(self.area, db.areas.len(), right);
                if let Some(a) = self.area.and_then(|i| db.areas.get(i)) {
                    self.staging = self.staging.with_area(a.clone());
                }
            }
            START_FIELD | END_FIELD => {
                if let Some(input) = self.active_input() {
                    if right {
                        input.move_cursor_right();
                    } else {
                        input.move_cursor_left();
                    }
                }
            }
            _ => {}
        }
    }

    fn move_worker_cursor(&mut self, down: bool) {
        let len = self.recommended.len();
        if len == 0 {
            return;
        }
        let i = self.selected_worker_index();
        let next = if down { (i + 1).min(len - 1) } else { i.saturating_sub(1) };
        self.worker_list.select(Some(next));
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, db: &Database, key: KeyCode, modifiers: KeyModifiers) -> FormAction {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match key {
            KeyCode::Esc => {
                self.staging = self.staging.cancel();
                return FormAction::Cancelled;
            }
            KeyCode::Char('a') if ctrl => {
                return match self.staging.assign(db) {
                    Ok(next) => {
                        self.staging = next;
                        self.reset_widgets();
                        FormAction::Message(format!(
                            "Assignment staged ({} pending)",
                            self.staging.staged().len()
                        ))
                    }
                    Err(e) => FormAction::Alert(Alert::error(e.message())),
                };
            }
            KeyCode::Char('s') if ctrl => {
                if self.staging.staged().is_empty() {
                    return FormAction::Message("Nothing staged yet (Ctrl+A to assign)".into());
                }
                let commit = self.staging.confirm_all();
                self.staging = commit.staging;
                return FormAction::Committed(commit.tasks);
            }
            KeyCode::Tab => self.next_field(),
            KeyCode::BackTab => self.prev_field(),
            KeyCode::Up if self.current_field == WORKER_FIELD && self.show_workers => {
                self.move_worker_cursor(false)
            }
            KeyCode::Down if self.current_field == WORKER_FIELD && self.show_workers => {
                self.move_worker_cursor(true)
            }
            KeyCode::Up => self.prev_field(),
            KeyCode::Down => self.next_field(),
            KeyCode::Left => self.handle_left_right(db, false),
            KeyCode::Right => self.handle_left_right(db, true),
            KeyCode::Enter if self.current_field == WORKER_FIELD => {
                if self.show_workers {
                    self.pick_worker();
                } else if !self.recommended.is_empty() {
                    self.show_workers = true;
                }
            }
            KeyCode::Enter => self.next_field(),
            KeyCode::Char(c) if !ctrl => {
                if let Some(input) = self.active_input() {
                    input.handle_char(c);
                    self.sync_dates();
                }
            }
            KeyCode::Backspace => {
                if let Some(input) = self.active_input() {
                    input.handle_backspace();
                    self.sync_dates();
                }
            }
            KeyCode::Delete => {
                if let Some(input) = self.active_input() {
                    input.handle_delete();
                    self.sync_dates();
                }
            }
            _ => {}
        }
        FormAction::None
    }

    /// Render the modal over `area`.
    pub fn render(&mut self, f: &mut Frame, area: Rect, db: &Database) {
        let area = centered_rect(80, 90, area);
        f.render_widget(Clear, area);
        let outer = Block::default()
            .borders(Borders::ALL)
            .title("Create & Assign Task - Ctrl+A assign, Ctrl+S confirm all, Esc cancel");
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let worker_height = if self.show_workers {
            self.recommended.len() as u16 + 2
        } else {
            3
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),             // Task type
                Constraint::Length(worker_height), // Worker
                Constraint::Length(3),             // Priority
                Constraint::Length(3),             // Start
                Constraint::Length(3),             // End
                Constraint::Length(3),             // Area
                Constraint::Min(3),                // Staged list
            ])
            .split(inner);

        let focus = |field: usize| {
            if self.current_field == field {
                Style::default().fg(ORANGE)
            } else {
                Style::default()
            }
        };
        let selector = |label: Option<&str>| match label {
            Some(v) => format!("◀ {v} ▶"),
            None => "◀ select ▶".to_string(),
        };

        let type_label = self.task_type.and_then(|i| db.task_types.get(i)).map(String::as_str);
        f.render_widget(
            Paragraph::new(selector(type_label)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Task Type *")
                    .border_style(focus(TYPE_FIELD)),
            ),
            chunks[0],
        );

        let worker_block = Block::default()
            .borders(Borders::ALL)
            .border_style(focus(WORKER_FIELD));
        if self.show_workers {
            let items: Vec<ListItem> = self
                .recommended
                .iter()
                .map(|w| {
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:<10} {:>2}y  ", w.name, w.experience_years)),
                        Span::styled(
                            w.availability.label(),
                            Style::default().fg(availability_color(w.availability)),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(worker_block.title("Recommended Workers (Enter to select)"))
                .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, chunks[1], &mut self.worker_list);
        } else {
            let chosen = self
                .staging
                .draft()
                .worker
                .as_ref()
                .map(|w| format!("{} ({})", w.name, w.id))
                .unwrap_or_else(|| "-".into());
            f.render_widget(
                Paragraph::new(chosen).block(worker_block.title("Worker *")),
                chunks[1],
            );
        }

        let priority = self.priority.map(|i| Priority::ALL[i]);
        let priority_style = priority.map_or(Style::default(), |p| Style::default().fg(priority_color(p)));
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                selector(priority.map(Priority::label)),
                priority_style,
            ))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Priority *")
                    .border_style(focus(PRIORITY_FIELD)),
            ),
            chunks[2],
        );

        for (field, input, title, chunk) in [
            (START_FIELD, &self.start, "Start Date *", chunks[3]),
            (END_FIELD, &self.end, "End Date *", chunks[4]),
        ] {
            let hint = match parse_date_input(&input.value) {
                Some(d) if !input.value.trim().is_empty() => format!("  → {d}"),
                _ => String::new(),
            };
            f.render_widget(
                Paragraph::new(format!("{}{hint}", input.value)).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title)
                        .border_style(focus(field)),
                ),
                chunk,
            );
        }

        let area_label = self.area.and_then(|i| db.areas.get(i)).map(String::as_str);
        f.render_widget(
            Paragraph::new(selector(area_label)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Area / Block *")
                    .border_style(focus(AREA_FIELD)),
            ),
            chunks[5],
        );

        let staged: Vec<Line> = self
            .staging
            .staged()
            .iter()
            .map(|p| {
                Line::from(vec![
                    Span::styled(format!("{:<8}", p.id), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(
                        "{} - {}  {}  {} → {}  ",
                        p.task_type, p.area, p.worker.name, p.start_date, p.end_date
                    )),
                    Span::styled(p.priority.label(), Style::default().fg(priority_color(p.priority))),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(staged).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Assigned Tasks ({})", self.staging.staged().len()))
                    .border_style(Style::default().fg(GREEN)),
            ),
            chunks[6],
        );

        if let Some(input) = match self.current_field {
            START_FIELD => Some(&self.start),
            END_FIELD => Some(&self.end),
            _ => None,
        } {
            let chunk = if self.current_field == START_FIELD { chunks[3] } else { chunks[4] };
            f.set_cursor_position((cursor_column(chunk, input.cursor), chunk.y + 1));
        }
    }
}
