//! ABG entry form and interpretation result.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::application::{AbgValidation, AssessmentReport};
use crate::domain::{format_number, AbgField, AbgPanel, AbgRanges, ParamValue, NORMAL_RANGES};
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

/// ABG form state
#[derive(Debug, Default)]
pub struct AbgFormState {
    pub panel: AbgPanel,
    pub selected: usize,
    /// Show blocking errors; set after the first submit attempt
    pub show_errors: bool,
    pub result: Option<Box<AssessmentReport>>,
}

impl AbgFormState {
    #[must_use]
    pub fn selected_field(&self) -> AbgField {
        AbgField::ALL[self.selected % AbgField::ALL.len()]
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % AbgField::ALL.len();
    }

    pub fn prev_field(&mut self) {
        let len = AbgField::ALL.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' {
            let field = self.selected_field();
            self.panel.raw_mut(field).push(c);
        }
    }

    pub fn delete_char(&mut self) {
        let field = self.selected_field();
        self.panel.raw_mut(field).pop();
    }

    pub fn clear_field(&mut self) {
        let field = self.selected_field();
        self.panel.raw_mut(field).clear();
    }

    /// Sample: acute respiratory acidosis with hypoxemia
    pub fn load_sample_data(&mut self) {
        self.panel = AbgPanel::new("7.25", "55", "55", "24");
        self.show_errors = false;
    }

    /// Wipe the entered panel, keeping the last result on screen.
    pub fn clear_sensitive(&mut self) {
        for field in AbgField::ALL {
            self.panel.raw_mut(field).zeroize();
        }
        self.selected = 0;
        self.show_errors = false;
    }
}

pub fn render_abg(
    f: &mut Frame,
    area: Rect,
    state: &AbgFormState,
    validation: &AbgValidation,
    admissible: &AbgRanges,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, chunks[0], "Blood Gas", "enter an arterial blood gas panel");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .margin(1)
        .split(chunks[1]);

    render_panel_fields(f, columns[0], state, validation, admissible);
    render_result(f, columns[1], state.result.as_deref());

    render_footer(
        f,
        chunks[2],
        &[
            ("↑↓", "Navigate"),
            ("Enter", "Interpret"),
            ("S", "Sample Panel"),
            ("Del", "Clear"),
            ("Esc", "Back"),
        ],
        None,
    );
}

fn render_panel_fields(
    f: &mut Frame,
    area: Rect,
    state: &AbgFormState,
    validation: &AbgValidation,
    admissible: &AbgRanges,
) {
    let constraints: Vec<Constraint> = AbgField::ALL
        .iter()
        .map(|_| Constraint::Length(4))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in AbgField::ALL.into_iter().enumerate() {
        let is_selected = i == state.selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let range = admissible.get(field);
        let normal = NORMAL_RANGES.get(field);
        let raw = state.panel.raw(field);

        let value_span = if raw.is_empty() {
            Span::styled(
                format!(
                    "{} - {} {}",
                    format_number(range.min, 2),
                    format_number(range.max, 2),
                    field.unit()
                ),
                MedicalTheme::text_muted(),
            )
        } else {
            let style = validation
                .normal_flags
                .get(&field)
                .map_or_else(MedicalTheme::text, |s| MedicalTheme::range_status(*s));
            Span::styled(raw.to_string(), style)
        };

        let mut line = vec![Span::raw(" "), value_span];
        if is_selected {
            line.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        let note = match (validation.error(field), validation.advisory(field)) {
            (Some(err), _) if state.show_errors => {
                Line::from(Span::styled(format!(" {err}"), MedicalTheme::danger()))
            }
            (_, Some(advisory)) => {
                Line::from(Span::styled(format!(" {advisory}"), MedicalTheme::warning()))
            }
            _ => Line::from(Span::styled(
                format!(
                    " normal {} - {}",
                    format_number(normal.min, 2),
                    format_number(normal.max, 2)
                ),
                MedicalTheme::text_muted(),
            )),
        };

        let block = Block::default()
            .title(Span::styled(
                format!(" {} ({}) ", field.name(), field.unit()),
                title_style,
            ))
            .borders(Borders::ALL)
            .border_style(border_style);

        f.render_widget(
            Paragraph::new(vec![Line::from(line), note]).block(block),
            rows[i],
        );
    }
}

fn render_result(f: &mut Frame, area: Rect, report: Option<&AssessmentReport>) {
    let block = Block::default()
        .title(Span::styled(" Interpretation ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let Some(report) = report else {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No panel interpreted yet.",
                MedicalTheme::text_muted(),
            )),
            Line::from(Span::styled(
                "Valid panels update the active settings immediately.",
                MedicalTheme::text_muted(),
            )),
        ])
        .block(block);
        f.render_widget(p, area);
        return;
    };

    let interpretation = &report.interpretation;
    let mut lines = vec![
        Line::from(Span::styled(
            report.interpretation_text.clone(),
            MedicalTheme::title(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Acid-base:    ", MedicalTheme::text_secondary()),
            Span::styled(interpretation.disorder.label(), MedicalTheme::text()),
        ]),
    ];

    if let Some(comp) = interpretation.compensation {
        lines.push(Line::from(vec![
            Span::styled("Compensation: ", MedicalTheme::text_secondary()),
            Span::styled(comp.label(), MedicalTheme::text()),
        ]));
    }
    if let Some(gap) = interpretation.anion_gap {
        lines.push(Line::from(vec![
            Span::styled("Anion gap:    ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{} mEq/L, {}", format_number(gap.gap, 1), gap.note()),
                if gap.elevated {
                    MedicalTheme::warning()
                } else {
                    MedicalTheme::text()
                },
            ),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("Oxygenation:  ", MedicalTheme::text_secondary()),
        Span::styled(
            interpretation.oxygenation.label(),
            MedicalTheme::oxygenation(interpretation.oxygenation),
        ),
    ]));

    lines.push(Line::from(""));
    if report.changes.is_empty() {
        lines.push(Line::from(Span::styled(
            "No setting changes recommended.",
            MedicalTheme::success(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Applied changes",
            MedicalTheme::subtitle(),
        )));
        for change in &report.changes {
            let show = |v: Option<ParamValue>| {
                v.map_or_else(|| "-".to_string(), |v| v.display_for(change.key))
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<22}", change.key.label()), MedicalTheme::text_secondary()),
                Span::styled(show(change.before), MedicalTheme::text_muted()),
                Span::styled(" → ", MedicalTheme::text_muted()),
                Span::styled(show(change.after), MedicalTheme::warning()),
                Span::styled(format!(" {}", change.key.unit()), MedicalTheme::text_muted()),
            ]));
        }
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_goes_to_selected_field() {
        let mut state = AbgFormState::default();
        state.next_field();
        for c in "4a0".chars() {
            state.input_char(c);
        }
        assert_eq!(state.panel.raw(AbgField::PCo2), "40");
        assert_eq!(state.panel.raw(AbgField::Ph), "");

        state.delete_char();
        assert_eq!(state.panel.raw(AbgField::PCo2), "4");
        state.clear_field();
        assert_eq!(state.panel.raw(AbgField::PCo2), "");
    }

    #[test]
    fn test_field_cursor_wraps() {
        let mut state = AbgFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field(), AbgField::Hco3);
        state.next_field();
        assert_eq!(state.selected_field(), AbgField::Ph);
    }

    #[test]
    fn test_clear_sensitive_wipes_panel() {
        let mut state = AbgFormState::default();
        state.load_sample_data();
        state.show_errors = true;
        state.clear_sensitive();

        assert_eq!(state.panel, AbgPanel::default());
        assert!(!state.show_errors);
    }
}
