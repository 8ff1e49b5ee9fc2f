//! Mode selection view.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{ModeDefinition, ModeId, ParamValue, ParameterKind};
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

#[derive(Debug, Default)]
pub struct ModesState {
    pub selected: usize,
}

impl ModesState {
    /// Start the cursor on the active mode.
    pub fn focus(&mut self, modes: &[ModeDefinition], active: ModeId) {
        self.selected = modes.iter().position(|m| m.id == active).unwrap_or(0);
    }

    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn prev(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }
}

pub fn render_modes(
    f: &mut Frame,
    area: Rect,
    state: &ModesState,
    modes: &[ModeDefinition],
    active: ModeId,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, chunks[0], "Ventilation Mode", "modes available to this patient");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .margin(1)
        .split(chunks[1]);

    let items: Vec<Line> = modes
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let marker = if mode.id == active { "● " } else { "  " };
            let style = if i == state.selected {
                MedicalTheme::selected()
            } else if mode.id == active {
                MedicalTheme::focused()
            } else {
                MedicalTheme::text()
            };
            Line::from(Span::styled(
                format!("{marker}{}", mode.display_name),
                style,
            ))
        })
        .collect();

    f.render_widget(
        Paragraph::new(items).block(
            Block::default()
                .title(Span::styled(" Modes ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        ),
        columns[0],
    );

    if let Some(mode) = modes.get(state.selected) {
        render_mode_detail(f, columns[1], mode);
    }

    render_footer(
        f,
        chunks[2],
        &[("↑↓", "Navigate"), ("Enter", "Apply Mode"), ("Esc", "Back")],
        None,
    );
}

fn render_mode_detail(f: &mut Frame, area: Rect, mode: &ModeDefinition) {
    let mut lines = vec![
        Line::from(Span::styled(mode.display_name, MedicalTheme::title())),
        Line::from(Span::styled(mode.description, MedicalTheme::text_secondary())),
        Line::from(""),
    ];

    for note in &mode.notes {
        lines.push(Line::from(vec![
            Span::styled("• ", MedicalTheme::info()),
            Span::styled(*note, MedicalTheme::text()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Starting values",
        MedicalTheme::subtitle(),
    )));

    for (key, value) in &mode.default_settings {
        let range = match mode.parameter(*key).map(|p| &p.kind) {
            Some(ParameterKind::Numeric { min, max, .. }) => format!(
                "  ({} - {})",
                ParamValue::Number(*min).display_for(*key),
                ParamValue::Number(*max).display_for(*key)
            ),
            _ => String::new(),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<22}", key.label()), MedicalTheme::text_secondary()),
            Span::styled(
                format!("{} {}", value.display_for(*key), key.unit()),
                MedicalTheme::text(),
            ),
            Span::styled(range, MedicalTheme::text_muted()),
        ]));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_wraps() {
        let mut state = ModesState::default();
        state.prev(3);
        assert_eq!(state.selected, 2);
        state.next(3);
        assert_eq!(state.selected, 0);
        state.next(0);
        assert_eq!(state.selected, 0);
    }
}
