//! Lab reference table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::domain::LabTest;
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

#[derive(Debug, Default)]
pub struct LabsState {
    pub selected: usize,
}

impl LabsState {
    pub fn next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub fn render_labs(f: &mut Frame, area: Rect, state: &LabsState, tests: &[LabTest]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, chunks[0], "Lab Reference", "collection tubes and normal ranges");

    let rows: Vec<Row> = tests
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let range = if t.normal_range.is_empty() {
                Cell::from("per laboratory").style(MedicalTheme::text_muted())
            } else {
                Cell::from(t.normal_range)
            };
            let row = Row::new(vec![Cell::from(t.test_name), Cell::from(t.tube_type), range]);
            if i == state.selected {
                row.style(MedicalTheme::selected())
            } else {
                row.style(MedicalTheme::text())
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(28),
            Constraint::Min(20),
        ],
    )
    .header(Row::new(vec!["Test", "Tube", "Normal Range"]).style(MedicalTheme::header()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    let body = Layout::default()
        .margin(1)
        .constraints([Constraint::Min(0)])
        .split(chunks[1]);
    f.render_widget(table, body[0]);

    render_footer(f, chunks[2], &[("↑↓", "Scroll"), ("Esc", "Back")], None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_stops_at_ends() {
        let mut state = LabsState::default();
        state.prev();
        assert_eq!(state.selected, 0);
        for _ in 0..5 {
            state.next(3);
        }
        assert_eq!(state.selected, 2);
    }
}
