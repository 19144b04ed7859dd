//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! the screens (task board, task details, assignment modal, planting
//! workflow, saved areas, help) and the blocking alert overlay.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::info;

use crate::db::{format_end_relative, Database};
use crate::fields::StatusFilter;
use crate::search::filter_tasks;
use crate::task::Task;
use crate::tui::{
    assign_form::AssignForm,
    colors::{priority_color, status_color, GREEN, PALM_GREEN, RED},
    enums::{Alert, AppState, FormAction, InputMode},
    planting_form::PlantingForm,
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
///
/// Owns the session store; nothing is written anywhere when the app exits.
pub struct App {
    state: AppState,
    db: Database,
    task_list_state: TableState,
    filtered_tasks: Vec<String>,
    selected_task: Option<String>,
    status_filter: StatusFilter,
    filter_text: String,
    input_mode: InputMode,
    assign_form: AssignForm,
    planting_form: PlantingForm,
    alert: Option<Alert>,
    status_message: String,
    areas_scroll: u16,
}

impl App {
    /// Create a new App over the session store.
    pub fn new(db: Database) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            db,
            task_list_state: TableState::default(),
            filtered_tasks: Vec::new(),
            selected_task: None,
            status_filter: StatusFilter::All,
            filter_text: String::new(),
            input_mode: InputMode::None,
            assign_form: AssignForm::new(),
            planting_form: PlantingForm::new(),
            alert: None,
            status_message: String::new(),
            areas_scroll: 0,
        };
        app.update_filtered_tasks();
        app
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Recompute the visible rows from the status tab and search text.
    ///
    /// Keeps the selected task selected when it is still visible.
    fn update_filtered_tasks(&mut self) {
        let old_selected_id = self
            .task_list_state
            .selected()
            .and_then(|idx| self.filtered_tasks.get(idx))
            .cloned();

        self.filtered_tasks = filter_tasks(&self.db.tasks, &self.filter_text, self.status_filter)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();

        let restored = old_selected_id.and_then(|id| self.filtered_tasks.iter().position(|t| *t == id));
        self.task_list_state.select(match restored {
            Some(idx) => Some(idx),
            None if self.filtered_tasks.is_empty() => None,
            None => Some(0),
        });
    }

    fn get_selected_task(&self) -> Option<&Task> {
        self.selected_task.as_deref().and_then(|id| self.db.get(id))
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Apply what a modal form asked for.
    fn apply_form_action(&mut self, action: FormAction) {
        match action {
            FormAction::None => {}
            FormAction::Alert(alert) => self.alert = Some(alert),
            FormAction::Message(msg) => self.set_status_message(msg),
            FormAction::Committed(tasks) => {
                info!(count = tasks.len(), "assignments committed from the board");
                self.db.prepend(tasks);
                self.assign_form = AssignForm::new();
                self.state = AppState::TaskList;
                self.update_filtered_tasks();
                self.task_list_state.select(Some(0));
                self.alert = Some(Alert::success("Workers assigned successfully!"));
            }
            FormAction::AreaFinished(area) => {
                let msg = format!(
                    "{} saved with {} tree(s).",
                    area.block.block_name,
                    area.trees.len()
                );
                self.db.add_area(area);
                self.planting_form = PlantingForm::new();
                self.state = AppState::Areas;
                self.alert = Some(Alert::success(msg));
            }
            FormAction::Cancelled => {
                match self.state {
                    AppState::Assign => self.assign_form = AssignForm::new(),
                    AppState::Planting => self.planting_form = PlantingForm::new(),
                    _ => {}
                }
                self.state = AppState::TaskList;
            }
        }
    }

    fn handle_alert_input(&mut self, key: KeyCode) {
        if matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            self.alert = None;
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.input_mode == InputMode::Search {
            match key {
                KeyCode::Esc => {
                    self.input_mode = InputMode::None;
                    self.filter_text.clear();
                    self.update_filtered_tasks();
                }
                KeyCode::Enter => {
                    self.input_mode = InputMode::None;
                    if !self.filter_text.is_empty() {
                        self.set_status_message(format!(
                            "Filter applied: '{}' ({} tasks)",
                            self.filter_text,
                            self.filtered_tasks.len()
                        ));
                    }
                }
                KeyCode::Backspace => {
                    if self.filter_text.pop().is_some() {
                        self.update_filtered_tasks();
                    }
                }
                KeyCode::Char(c) => {
                    self.filter_text.push(c);
                    self.update_filtered_tasks();
                }
                _ => {}
            }
            return false;
        }

        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.filter_text.is_empty() {
                    return true;
                }
                self.filter_text.clear();
                self.update_filtered_tasks();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.filtered_tasks.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Tab => {
                self.status_filter = self.status_filter.next();
                self.update_filtered_tasks();
            }
            KeyCode::BackTab => {
                self.status_filter = self.status_filter.prev();
                self.update_filtered_tasks();
            }
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Enter => {
                let picked = self
                    .task_list_state
                    .selected()
                    .and_then(|idx| self.filtered_tasks.get(idx))
                    .cloned();
                if picked.is_some() {
                    self.selected_task = picked;
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char('n') => {
                self.assign_form = AssignForm::new();
                self.state = AppState::Assign;
            }
            KeyCode::Char('p') => self.state = AppState::Planting,
            KeyCode::Char('a') => {
                self.areas_scroll = 0;
                self.state = AppState::Areas;
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                if self.alert.is_some() {
                    self.handle_alert_input(key.code);
                    return Ok(false);
                }
                self.clear_status_message();

                match self.state {
                    AppState::TaskList => return Ok(self.handle_task_list_input(key.code, key.modifiers)),
                    AppState::TaskDetail | AppState::Help => {
                        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                            self.state = AppState::TaskList;
                        }
                    }
                    AppState::Areas => match key.code {
                        KeyCode::Up => self.areas_scroll = self.areas_scroll.saturating_sub(1),
                        KeyCode::Down => self.areas_scroll = self.areas_scroll.saturating_add(1),
                        KeyCode::Esc | KeyCode::Char('q') => self.state = AppState::TaskList,
                        _ => {}
                    },
                    AppState::Assign => {
                        let action = self.assign_form.handle_key(&self.db, key.code, key.modifiers);
                        self.apply_form_action(action);
                    }
                    AppState::Planting => {
                        let action = self.planting_form.handle_key(key.code, key.modifiers);
                        self.apply_form_action(action);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Render the task board: header, status tabs and the task table.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let today = Local::now().date_naive();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Status tabs
                Constraint::Min(0),    // Table
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled("PLANTATION TASKS", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "{} workers  {} areas recorded",
                    self.db.workers.len(),
                    self.db.planted_areas.len()
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let titles: Vec<Line> = StatusFilter::TABS.iter().map(|t| Line::from(t.label())).collect();
        let selected_tab = StatusFilter::TABS
            .iter()
            .position(|t| *t == self.status_filter)
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected_tab)
            .block(Block::default().borders(Borders::ALL).title("Status (Tab / Shift+Tab)"))
            .highlight_style(Style::default().fg(Color::Black).bg(GREEN).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, chunks[1]);

        let header_cells = ["ID", "Title", "Status", "Priority", "Assignee", "Area", "Start", "Due", "Progress"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(PALM_GREEN).fg(Color::White))
            .height(1);

        let rows: Vec<Row> = self
            .filtered_tasks
            .iter()
            .filter_map(|id| self.db.get(id))
            .map(|task| {
                Row::new(vec![
                    Cell::from(task.id.clone()),
                    Cell::from(task.title.clone()),
                    Cell::from(task.status.label()).style(Style::default().fg(status_color(task.status))),
                    Cell::from(task.priority.label()).style(Style::default().fg(priority_color(task.priority))),
                    Cell::from(task.assigned_to.clone()),
                    Cell::from(task.area.clone()),
                    Cell::from(task.start_date.to_string()),
                    Cell::from(format_end_relative(task.end_date, today)),
                    Cell::from(format!("{:>3}%", task.progress)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(7),  // ID
            Constraint::Min(24),    // Title
            Constraint::Length(12), // Status
            Constraint::Length(8),  // Priority
            Constraint::Length(13), // Assignee
            Constraint::Length(8),  // Area
            Constraint::Length(11), // Start
            Constraint::Length(10), // Due
            Constraint::Length(8),  // Progress
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                self.filtered_tasks.len(),
                self.db.tasks.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[2], &mut self.task_list_state);
    }

    /// Render the detailed view of a single task.
    fn render_task_detail(&mut self, f: &mut Frame, area: Rect) {
        let Some(task) = self.get_selected_task() else {
            let msg = Paragraph::new("Task not found").block(Block::default().borders(Borders::ALL));
            f.render_widget(msg, area);
            return;
        };
        let today = Local::now().date_naive();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let row = |label: &'static str, value: String| {
            Line::from(vec![Span::styled(format!("{label:<14}"), bold), Span::raw(value)])
        };
        let mut lines = vec![
            Line::from(Span::styled(task.title.clone(), bold.fg(GREEN))),
            Line::from(""),
            Line::from(vec![
                Span::styled(format!("{:<14}", "Status:"), bold),
                Span::styled(task.status.label(), Style::default().fg(status_color(task.status))),
            ]),
            Line::from(vec![
                Span::styled(format!("{:<14}", "Priority:"), bold),
                Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
            ]),
            row("Assigned to:", format!("{} ({})", task.assigned_to, task.assigned_to_id)),
            row("Category:", task.category.clone()),
            row("Area:", task.area.clone()),
            row("Start:", task.start_date.to_string()),
            row(
                "End:",
                format!("{} ({})", task.end_date, format_end_relative(task.end_date, today)),
            ),
        ];
        if let Some(asset) = &task.asset_name {
            lines.push(row("Asset:", asset.clone()));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Description:", bold)));
        lines.push(Line::from(if task.description.is_empty() {
            "-".to_string()
        } else {
            task.description.clone()
        }));

        let details = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Task {} - Esc to return", task.id)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(details, chunks[0]);

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(status_color(task.status)))
            .percent(u16::from(task.progress.min(100)));
        f.render_widget(gauge, chunks[1]);
    }

    /// Render the planting areas recorded this session.
    fn render_areas(&mut self, f: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if self.db.planted_areas.is_empty() {
            lines.push(Line::from("No areas recorded yet. Press 'p' on the task board to start."));
        }
        for rec in &self.db.planted_areas {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} (phase {})  ›  {} #{}",
                    rec.phase.phase_name, rec.phase.phase_number, rec.block.block_name, rec.block.block_number
                ),
                Style::default().add_modifier(Modifier::BOLD).fg(GREEN),
            )));
            lines.push(Line::from(format!(
                "  {} ha / {} acre  {}  soil {}  drainage {}  {} trees/ha  planted {}",
                rec.block.area_hectare,
                rec.block.area_acre,
                rec.block.palm_variety,
                rec.block.soil_type,
                rec.block.drainage,
                rec.block.trees_per_hectare,
                rec.block.planting_date
            )));
            for tree in &rec.trees {
                let style = if tree.diseases.is_empty() {
                    Style::default()
                } else {
                    Style::default().fg(RED)
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        "    Tree {:<4} {:<12} {:<22} {}  {} m  health {}%",
                        tree.tree_number, tree.tag_id, tree.status, tree.diseases, tree.height, tree.health_score
                    ),
                    style,
                )));
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Planted Areas ({}) - Esc to return", self.db.planted_areas.len())),
            )
            .scroll((self.areas_scroll, 0));
        f.render_widget(paragraph, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Plantation Tasks Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task Board:", bold)),
            Line::from("  ↑/↓, k/j       Navigate tasks"),
            Line::from("  Tab/Shift+Tab  Cycle status tab (All, Pending, In Progress, Completed)"),
            Line::from("  /              Search title, description and assignee"),
            Line::from("  Enter          View task details"),
            Line::from("  n              Create & assign tasks"),
            Line::from("  p              Record a planting (phase, block, trees)"),
            Line::from("  a              Show planted areas"),
            Line::from("  h/F1           Show this help"),
            Line::from("  q/Esc          Quit"),
            Line::from(""),
            Line::from(Span::styled("Create & Assign:", bold)),
            Line::from("  Tab/↑/↓        Move between fields"),
            Line::from("  ←/→            Change task type, priority, area"),
            Line::from("  Enter          Select the highlighted recommended worker"),
            Line::from("  Ctrl+A         Add the assignment to the list"),
            Line::from("  Ctrl+S         Confirm all listed assignments"),
            Line::from("  Esc            Cancel and discard"),
            Line::from(""),
            Line::from(Span::styled("Planting:", bold)),
            Line::from("  Ctrl+S         Save the current step"),
            Line::from("  Esc            Back one step"),
            Line::from(""),
            Line::from(Span::styled("Date Formats:", bold)),
            Line::from("  YYYY-MM-DD     Specific date (e.g., 2024-12-25)"),
            Line::from("  today, tomorrow, in 3d, in 2w, friday, next monday, eow, eom"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Esc to return"))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    /// Render the blocking alert on top of everything.
    fn render_alert(&self, f: &mut Frame, area: Rect, alert: &Alert) {
        let color = if alert.is_error() { RED } else { PALM_GREEN };
        let block = Block::default()
            .title(alert.title.as_str())
            .borders(Borders::ALL)
            .style(Style::default().bg(color).fg(Color::White));

        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(alert.message.as_str()),
            Line::from(""),
            Line::from(Span::styled("[ OK ]", Style::default().add_modifier(Modifier::BOLD))),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.input_mode == InputMode::Search {
            format!("Search: {} (Esc to clear, Enter to confirm)", self.filter_text)
        } else if !self.filter_text.is_empty() {
            format!(
                "Tasks: {} (filtered by '{}') | Press 'h' for help",
                self.filtered_tasks.len(),
                self.filter_text
            )
        } else {
            match self.state {
                AppState::TaskList => format!(
                    "Tasks: {} | n Assign  p Plant  a Areas  h Help",
                    self.filtered_tasks.len()
                ),
                AppState::TaskDetail => "Task Details".to_string(),
                AppState::Assign => format!(
                    "Create & Assign | draft {:?} | {} staged",
                    self.assign_form.staging.state(),
                    self.assign_form.staging.staged().len()
                ),
                AppState::Planting => format!("Planting | {}", self.planting_form.workflow.step().title()),
                AppState::Areas => "Planted Areas".to_string(),
                AppState::Help => "Help".to_string(),
            }
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(PALM_GREEN).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::TaskDetail => self.render_task_detail(f, chunks[0]),
            AppState::Assign => {
                self.render_task_list(f, chunks[0]);
                self.assign_form.render(f, chunks[0], &self.db);
            }
            AppState::Planting => self.planting_form.render(f, chunks[0]),
            AppState::Areas => self.render_areas(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
        }

        self.render_status_bar(f, chunks[1]);

        if let Some(alert) = &self.alert {
            self.render_alert(f, chunks[0], alert);
        }
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    #[test]
    fn test_status_tab_and_search_narrow_rows() {
        let mut app = App::new(Database::default());
        assert_eq!(app.filtered_tasks.len(), 4);

        app.handle_task_list_input(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.status_filter, StatusFilter::Pending);
        assert_eq!(app.filtered_tasks, vec!["2", "3"]);

        app.handle_task_list_input(KeyCode::Char('/'), KeyModifiers::NONE);
        for c in "pest".chars() {
            app.handle_task_list_input(KeyCode::Char(c), KeyModifiers::NONE);
        }
        assert_eq!(app.filtered_tasks, vec!["3"]);
        app.handle_task_list_input(KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.filter_text.is_empty());
        assert_eq!(app.filtered_tasks.len(), 2);
    }

    #[test]
    fn test_committed_assignments_land_on_top() {
        let mut app = App::new(Database::default());
        app.state = AppState::Assign;
        let mut task = app.db.tasks[3].clone();
        task.id = "5-w3".into();
        task.status = Status::Pending;
        app.apply_form_action(FormAction::Committed(vec![task]));

        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.db().tasks[0].id, "5-w3");
        assert_eq!(app.filtered_tasks[0], "5-w3");
        assert_eq!(app.alert, Some(Alert::success("Workers assigned successfully!")));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new(Database::default());
        assert!(app.handle_task_list_input(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(!app.handle_task_list_input(KeyCode::Char('n'), KeyModifiers::NONE));
        assert_eq!(app.state, AppState::Assign);
    }
}
