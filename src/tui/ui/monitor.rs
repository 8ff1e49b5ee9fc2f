//! Monitor view: active settings, alarm bands and the session's changes.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::application::VentilationService;
use crate::domain::{format_number, ParamKey, ParamValue};
use crate::ports::ModeCatalog;
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

/// Render the main monitor view.
pub fn render_monitor<C: ModeCatalog>(f: &mut Frame, area: Rect, session: &VentilationService<C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let profile = session.profile();
    let lungs = profile
        .effective_lung_involvement()
        .map_or_else(String::new, |l| format!(" ({l} lungs)"));
    let context = format!(
        "{} patient, {} kg, {} {}, {}{} | mode {}",
        session.age_class(),
        format_number(profile.weight_kg, 2),
        format_number(profile.age_value, 1),
        profile.age_unit,
        profile.disease_category,
        lungs,
        session.mode().id
    );
    render_header(f, chunks[0], "Monitor", &context);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(chunks[1]);

    render_settings(f, columns[0], session);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // FiO2 gauge
            Constraint::Length(5), // Alarms
            Constraint::Min(4),    // Changes
            Constraint::Length(4), // Last interpretation
        ])
        .split(columns[1]);

    render_fio2_gauge(f, right[0], session.settings().fio2);
    render_alarms(f, right[1], session);
    render_changes(f, right[2], session);
    render_last_interpretation(f, right[3], session);

    render_footer(
        f,
        chunks[2],
        &[
            ("M", "Modes"),
            ("E", "Edit"),
            ("A", "ABG"),
            ("L", "Labs"),
            ("R", "Reset"),
            ("N", "New Patient"),
            ("Q", "Quit"),
        ],
        None,
    );
}

fn render_settings<C: ModeCatalog>(f: &mut Frame, area: Rect, session: &VentilationService<C>) {
    let initial = session.initial_settings();

    let rows: Vec<Row> = session
        .mode_settings()
        .into_iter()
        .map(|(key, value)| {
            let changed = initial.get(key) != Some(value);
            let style = if key.is_derived() {
                MedicalTheme::text_secondary()
            } else if changed {
                MedicalTheme::warning()
            } else {
                MedicalTheme::text()
            };
            Row::new(vec![
                Cell::from(key.label()),
                Cell::from(value.display_for(key)).style(style),
                Cell::from(key.unit()).style(MedicalTheme::text_muted()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(10),
            Constraint::Min(6),
        ],
    )
    .header(Row::new(vec!["Setting", "Value", "Unit"]).style(MedicalTheme::header()))
    .block(
        Block::default()
            .title(Span::styled(" Active Settings ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border_focused()),
    );

    f.render_widget(table, area);
}

fn render_fio2_gauge(f: &mut Frame, area: Rect, fio2: Option<f64>) {
    let block = Block::default()
        .title(Span::styled(" FiO2 ", MedicalTheme::text_secondary()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let fio2 = fio2.unwrap_or(21.0);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(MedicalTheme::fio2_gauge(fio2))
        .ratio((fio2 / 100.0).clamp(0.0, 1.0))
        .label(format!("{} %", format_number(fio2, 0)));

    f.render_widget(gauge, area);
}

fn render_alarms<C: ModeCatalog>(f: &mut Frame, area: Rect, session: &VentilationService<C>) {
    let alarms = session.alarm_ranges();
    let mut lines: Vec<Line> = alarms
        .entries()
        .into_iter()
        .map(|(key, range)| {
            Line::from(vec![
                Span::styled(format!("{:<22}", key.label()), MedicalTheme::text_secondary()),
                Span::styled(range.describe(key), MedicalTheme::text()),
            ])
        })
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No alarm bands for this mode.",
            MedicalTheme::text_muted(),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(" Alarm Limits ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        ),
        area,
    );
}

fn render_changes<C: ModeCatalog>(f: &mut Frame, area: Rect, session: &VentilationService<C>) {
    let changes = session.changes();
    let show = |key: ParamKey, v: Option<ParamValue>| {
        v.map_or_else(|| "-".to_string(), |v| v.display_for(key))
    };

    let lines: Vec<Line> = if changes.is_empty() {
        vec![Line::from(Span::styled(
            "No changes from the initial settings.",
            MedicalTheme::text_muted(),
        ))]
    } else {
        changes
            .iter()
            .map(|c| {
                Line::from(vec![
                    Span::styled(format!("{:<22}", c.key.label()), MedicalTheme::text_secondary()),
                    Span::styled(show(c.key, c.before), MedicalTheme::text_muted()),
                    Span::styled(" → ", MedicalTheme::text_muted()),
                    Span::styled(show(c.key, c.after), MedicalTheme::warning()),
                ])
            })
            .collect()
    };

    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(Span::styled(" Changes Since Start ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        ),
        area,
    );
}

fn render_last_interpretation<C: ModeCatalog>(
    f: &mut Frame,
    area: Rect,
    session: &VentilationService<C>,
) {
    let line = match session.last_assessment() {
        Some(report) => Line::from(vec![
            Span::styled(
                report.generated_at.format("%H:%M:%S ").to_string(),
                MedicalTheme::text_muted(),
            ),
            Span::styled(
                report.interpretation_text.clone(),
                MedicalTheme::oxygenation(report.interpretation.oxygenation),
            ),
        ]),
        None => Line::from(Span::styled(
            "No blood gas interpreted yet.",
            MedicalTheme::text_muted(),
        )),
    };

    f.render_widget(
        Paragraph::new(line).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(Span::styled(" Last ABG ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        ),
        area,
    );
}
