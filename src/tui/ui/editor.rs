//! Settings editor: staged edits against the active mode's bounds.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    EditableParameter, ModeDefinition, ParamKey, ParamValue, ParameterKind, VentilatorSettings,
};
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

/// Editor cursor and the value being typed.
#[derive(Debug, Default)]
pub struct EditorState {
    pub selected: usize,
    pub input: String,
    /// Messages from the last rejected commit or edit
    pub errors: Vec<String>,
}

impl EditorState {
    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
            self.input.zeroize();
        }
    }

    pub fn prev(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
            self.input.zeroize();
        }
    }

    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' || c == '-' {
            self.input.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
    }

    /// Parse the typed value for `key`; empty input yields `None`.
    ///
    /// # Errors
    /// Returns a message when the text is not a number.
    pub fn take_input(&mut self, key: ParamKey) -> Result<Option<ParamValue>, String> {
        if self.input.trim().is_empty() {
            return Ok(None);
        }
        let parsed = ParamValue::parse(key, &self.input)
            .ok_or_else(|| format!("{}: invalid number", key.label()))?;
        self.input.zeroize();
        Ok(Some(parsed))
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.input.zeroize();
        self.errors.clear();
    }
}

/// Next or previous option of a choice parameter, starting from `current`.
#[must_use]
pub fn cycle_choice(
    parameter: &EditableParameter,
    current: Option<ParamValue>,
    forward: bool,
) -> Option<ParamValue> {
    let ParameterKind::Choice { options } = &parameter.kind else {
        return None;
    };
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let pos = match current {
        Some(ParamValue::Ratio(r)) => options.iter().position(|o| *o == r),
        _ => None,
    };
    let next = match (pos, forward) {
        (Some(p), true) => (p + 1) % len,
        (Some(p), false) => (p + len - 1) % len,
        (None, _) => 0,
    };
    Some(ParamValue::Ratio(options[next]))
}

pub fn render_editor(
    f: &mut Frame,
    area: Rect,
    state: &EditorState,
    mode: &ModeDefinition,
    current: &VentilatorSettings,
    staged: Option<&VentilatorSettings>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "Settings Editor",
        &format!("{} - changes apply on commit", mode.display_name),
    );

    let staged = staged.unwrap_or(current);
    render_parameter_table(f, chunks[1], state, mode, current, staged);
    render_edit_panel(f, chunks[2], state, mode, staged);

    render_footer(
        f,
        chunks[3],
        &[
            ("↑↓", "Field"),
            ("Enter", "Stage Value"),
            ("←→", "Choice"),
            ("Del", "Clear"),
            ("C", "Commit"),
            ("R", "Reset"),
            ("Esc", "Cancel"),
        ],
        None,
    );
}

fn render_parameter_table(
    f: &mut Frame,
    area: Rect,
    state: &EditorState,
    mode: &ModeDefinition,
    current: &VentilatorSettings,
    staged: &VentilatorSettings,
) {
    let display = |settings: &VentilatorSettings, key: ParamKey| {
        settings
            .get(key)
            .map_or_else(|| "-".to_string(), |v| v.display_for(key))
    };

    let header = Row::new(vec!["Parameter", "Active", "Staged", "Unit", "Allowed"])
        .style(MedicalTheme::header());

    let mut rows: Vec<Row> = mode
        .editable_parameters
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let active = display(current, p.key);
            let pending = display(staged, p.key);
            let changed = active != pending;
            let allowed = match &p.kind {
                ParameterKind::Numeric { min, max, .. } => format!(
                    "{} - {}",
                    ParamValue::Number(*min).display_for(p.key),
                    ParamValue::Number(*max).display_for(p.key)
                ),
                ParameterKind::Choice { options } => options
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            let row = Row::new(vec![
                Cell::from(p.label),
                Cell::from(active),
                Cell::from(pending).style(if changed {
                    MedicalTheme::warning()
                } else {
                    MedicalTheme::text()
                }),
                Cell::from(p.unit),
                Cell::from(allowed).style(MedicalTheme::text_muted()),
            ]);
            if i == state.selected {
                row.style(MedicalTheme::selected())
            } else {
                row
            }
        })
        .collect();

    // Derived values follow the staged inputs but cannot be edited.
    for key in [ParamKey::Mvent, ParamKey::Vti, ParamKey::Vte] {
        if staged.get(key).is_some() {
            rows.push(
                Row::new(vec![
                    Cell::from(key.label()),
                    Cell::from(display(current, key)),
                    Cell::from(display(staged, key)),
                    Cell::from(key.unit()),
                    Cell::from("derived"),
                ])
                .style(MedicalTheme::text_muted()),
            );
        }
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    f.render_widget(table, area);
}

fn render_edit_panel(
    f: &mut Frame,
    area: Rect,
    state: &EditorState,
    mode: &ModeDefinition,
    staged: &VentilatorSettings,
) {
    let mut lines = Vec::new();

    if let Some(p) = mode.editable_parameters.get(state.selected) {
        let prompt = match p.kind {
            ParameterKind::Numeric { step, .. } => format!(
                "New {} (step {}): ",
                p.label,
                ParamValue::Number(step).display_for(p.key)
            ),
            ParameterKind::Choice { .. } => format!(
                "{}: {} (use ←→)",
                p.label,
                staged
                    .get(p.key)
                    .map_or_else(|| "-".to_string(), |v| v.display_for(p.key))
            ),
        };
        lines.push(Line::from(vec![
            Span::styled(prompt, MedicalTheme::text_secondary()),
            Span::styled(state.input.clone(), MedicalTheme::text()),
            Span::styled("▌", MedicalTheme::cursor()),
        ]));
    }

    for err in &state.errors {
        lines.push(Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            ),
        area,
    );
}
