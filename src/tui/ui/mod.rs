//! UI module: View components for the TUI.

pub mod abg;
pub mod editor;
pub mod intake;
pub mod labs;
pub mod modes;
pub mod monitor;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::{MedicalTheme, LOGO_SMALL};

/// Severity of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Feedback from the last action, shown above the disclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Screen title bar: product name, screen name and a short context line.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, context: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(LOGO_SMALL, MedicalTheme::subtitle()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(format!(" │ {context}"), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// `[key] description` pairs on one line.
pub fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let spans: Vec<Span<'static>> = hints
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
            ]
        })
        .collect();
    Line::from(spans)
}

/// Footer with key hints, replaced by `error` when present.
pub fn render_footer(f: &mut Frame, area: Rect, hints: &[(&str, &str)], error: Option<&str>) {
    let content = match error {
        Some(err) => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.to_string(), MedicalTheme::danger()),
        ]),
        None => key_hints(hints),
    };

    let footer = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );

    f.render_widget(footer, area);
}

pub fn render_status(f: &mut Frame, area: Rect, status: Option<&StatusMessage>) {
    let line = match status {
        Some(msg) => {
            let style = match msg.kind {
                StatusKind::Info => MedicalTheme::info(),
                StatusKind::Success => MedicalTheme::success(),
                StatusKind::Error => MedicalTheme::danger(),
            };
            Line::from(Span::styled(format!(" {}", msg.text), style))
        }
        None => Line::from(""),
    };

    f.render_widget(Paragraph::new(line), area);
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            "EDUCATIONAL USE ONLY: Suggested settings and interpretations are illustrative and are not validated clinical guidance.",
            MedicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            "Every ventilator change must be decided by the treating clinician.",
            MedicalTheme::text_muted(),
        )),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
