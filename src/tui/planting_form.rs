//! Planting workflow forms for the terminal user interface.
//!
//! One screen per step (phase, block, tree) rendered from the record's field
//! table. Text, numeric and date fields are typed into a single editor that
//! is written back to the record whenever focus leaves the field; choice
//! fields are cycled in place with Left/Right.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tracing::warn;

use crate::planting::{FieldKind, FieldSpec, PlantingStep, PlantingWorkflow, Record};
use crate::tui::colors::{GREEN, ORANGE};
use crate::tui::enums::{Alert, FormAction};
use crate::tui::input::InputField;

/// State of the planting workflow screens.
pub struct PlantingForm {
    pub workflow: PlantingWorkflow,
    focus: Option<&'static str>,
    editor: InputField,
}

impl Default for PlantingForm {
    fn default() -> Self {
        Self::new()
    }
}

fn is_typed(kind: &FieldKind) -> bool {
    matches!(kind, FieldKind::Text | FieldKind::Numeric | FieldKind::Date)
}

impl PlantingForm {
    pub fn new() -> Self {
        let mut form = PlantingForm {
            workflow: PlantingWorkflow::new(),
            focus: None,
            editor: InputField::new(),
        };
        form.focus_first();
        form
    }

    pub fn focus(&self) -> Option<&'static str> {
        self.focus
    }

    fn editable_fields(&self) -> Vec<FieldSpec> {
        self.workflow
            .current()
            .map(|r| r.fields().into_iter().filter(FieldSpec::is_editable).collect())
            .unwrap_or_default()
    }

    fn focused_spec(&self) -> Option<FieldSpec> {
        let key = self.focus?;
        self.editable_fields().into_iter().find(|f| f.key == key)
    }

    fn focus_first(&mut self) {
        self.focus = self.editable_fields().first().map(|f| f.key);
        self.load_editor();
    }

    fn load_editor(&mut self) {
        let value = match (self.focus, self.workflow.current()) {
            (Some(key), Some(record)) => record.value(key).unwrap_or_default().to_string(),
            _ => String::new(),
        };
        self.editor = InputField::with_value(&value);
    }

    /// Write the editor back into the focused field.
    fn commit_editor(&mut self) {
        let Some(spec) = self.focused_spec() else {
            return;
        };
        if !is_typed(&spec.kind) {
            return;
        }
        let value = self.editor.value.clone();
        if let Some(record) = self.workflow.current_mut() {
            if let Err(e) = record.set(spec.key, &value) {
                warn!(field = spec.key, error = %e, "field not updated");
            }
        }
    }

    fn move_focus(&mut self, forward: bool) {
        self.commit_editor();
        let fields = self.editable_fields();
        if fields.is_empty() {
            self.focus = None;
            return;
        }
        let len = fields.len();
        let pos = self.focus.and_then(|k| fields.iter().position(|f| f.key == k));
        let next = match (pos, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.focus = Some(fields[next].key);
        self.load_editor();
    }

    fn cycle_choice(&mut self, right: bool) {
        let Some(spec) = self.focused_spec() else {
            return;
        };
        let FieldKind::Choice(options) = spec.kind else {
            if right {
                self.editor.move_cursor_right();
            } else {
                self.editor.move_cursor_left();
            }
            return;
        };
        if options.is_empty() {
            return;
        }
        let Some(record) = self.workflow.current_mut() else {
            return;
        };
        let current = record.value(spec.key).unwrap_or_default();
        let len = options.len();
        let next = match (options.iter().position(|o| o == current), right) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        if let Err(e) = record.set(spec.key, &options[next]) {
            warn!(field = spec.key, error = %e, "choice not updated");
        }
    }

    fn submit(&mut self) -> FormAction {
        self.commit_editor();
        match self.workflow.submit() {
            Ok(step) => {
                self.focus_first();
                FormAction::Message(format!("{} saved", step_saved_label(step)))
            }
            Err(e) => FormAction::Alert(Alert::error(e.message())),
        }
    }

    fn back(&mut self) -> FormAction {
        self.commit_editor();
        if self.workflow.back() {
            self.focus_first();
            FormAction::None
        } else {
            FormAction::Cancelled
        }
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> FormAction {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        if self.workflow.step() == PlantingStep::Complete {
            return match key {
                KeyCode::Char('a') => {
                    self.workflow.add_another_tree();
                    self.focus_first();
                    FormAction::None
                }
                KeyCode::Char('f') | KeyCode::Enter => match self.workflow.finish() {
                    Some(area) => FormAction::AreaFinished(area),
                    None => FormAction::None,
                },
                KeyCode::Esc => self.back(),
                _ => FormAction::None,
            };
        }

        match key {
            KeyCode::Char('s') if ctrl => return self.submit(),
            KeyCode::Esc => return self.back(),
            KeyCode::Tab | KeyCode::Down | KeyCode::Enter => self.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(false),
            KeyCode::Left => self.cycle_choice(false),
            KeyCode::Right => self.cycle_choice(true),
            KeyCode::Char(c) if !ctrl => match self.focused_spec().map(|s| s.kind) {
                Some(FieldKind::Numeric) => self.editor.handle_numeric_char(c),
                Some(FieldKind::Text) | Some(FieldKind::Date) => self.editor.handle_char(c),
                _ => {}
            },
            KeyCode::Backspace => self.editor.handle_backspace(),
            KeyCode::Delete => self.editor.handle_delete(),
            _ => {}
        }
        FormAction::None
    }

    /// Render the current step.
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let steps = [PlantingStep::Phase, PlantingStep::Block, PlantingStep::Tree];
        let mut crumbs = Vec::new();
        for (i, step) in steps.iter().enumerate() {
            if i > 0 {
                crumbs.push(Span::raw("  ›  "));
            }
            let style = if *step == self.workflow.step() {
                Style::default().fg(GREEN).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            crumbs.push(Span::styled(step.title(), style));
        }
        f.render_widget(
            Paragraph::new(Line::from(crumbs)).block(Block::default().borders(Borders::ALL).title("Planting")),
            chunks[0],
        );

        match self.workflow.current() {
            Some(record) => self.render_record(f, chunks[1], record),
            None => self.render_summary(f, chunks[1]),
        }

        let help = if self.workflow.step() == PlantingStep::Complete {
            "a Add another tree  f/Enter Finish  Esc Back to tree"
        } else {
            "Tab/↑↓ Move  ←/→ Change choice  Ctrl+S Save step  Esc Back"
        };
        f.render_widget(
            Paragraph::new(help).block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );
    }

    fn render_record(&self, f: &mut Frame, area: Rect, record: &dyn Record) {
        let fields = record.fields();
        let mut focus_line = 0usize;
        let lines: Vec<Line> = fields
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let focused = self.focus == Some(spec.key);
                if focused {
                    focus_line = i;
                }
                let value = if focused && is_typed(&spec.kind) {
                    format!("{}▏", self.editor.value)
                } else {
                    record.value(spec.key).unwrap_or_default().to_string()
                };
                let shown = match (&spec.kind, value.is_empty()) {
                    (FieldKind::Choice(_), true) => "◀ select ▶".to_string(),
                    (FieldKind::Choice(_), false) => format!("◀ {value} ▶"),
                    (FieldKind::Date, _) if !focused => format!("{value}  (YYYY-MM-DD)"),
                    _ => value,
                };
                let label_style = match (&spec.kind, focused) {
                    (FieldKind::ReadOnly, _) => Style::default().fg(Color::DarkGray),
                    (_, true) => Style::default().fg(ORANGE).add_modifier(Modifier::BOLD),
                    _ => Style::default(),
                };
                let marker = if focused { "> " } else { "  " };
                Line::from(vec![
                    Span::styled(format!("{marker}{:<26}", spec.label), label_style),
                    Span::raw(shown),
                ])
            })
            .collect();

        let height = area.height.saturating_sub(2) as usize;
        let scroll = focus_line.saturating_sub(height.saturating_sub(1));
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} *", self.workflow.step().title())),
            )
            .scroll((scroll as u16, 0));
        f.render_widget(paragraph, area);
    }

    fn render_summary(&self, f: &mut Frame, area: Rect) {
        let phase = self.workflow.phase();
        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} (phase {})", phase.phase_name, phase.phase_number),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        if let Some(block) = self.workflow.block() {
            lines.push(Line::from(format!(
                "{} #{}  {} ha  {}  {}",
                block.block_name, block.block_number, block.area_hectare, block.palm_variety, block.status
            )));
        }
        lines.push(Line::from(""));
        for tree in self.workflow.trees() {
            let disease = if tree.diseases.is_empty() {
                String::new()
            } else {
                format!(" ({})", tree.diseases)
            };
            lines.push(Line::from(format!(
                "  Tree {:<4} {:<10} {}{}  health {}%",
                tree.tree_number, tree.tag_id, tree.status, disease, tree.health_score
            )));
        }
        f.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("{} - {} tree(s)", PlantingStep::Complete.title(), self.workflow.trees().len())),
                )
                .wrap(Wrap { trim: false }),
            area,
        );
    }
}

fn step_saved_label(reached: PlantingStep) -> &'static str {
    match reached {
        PlantingStep::Phase => "Phase",
        PlantingStep::Block => "Phase",
        PlantingStep::Tree => "Block",
        PlantingStep::Complete => "Tree",
    }
}
