//! Clinical color palette and preset styles for the terminal views.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{Oxygenation, RangeStatus};

/// Color palette shared by every screen.
pub struct MedicalTheme;

impl MedicalTheme {
    /// Deep teal, the brand color
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110); // #0F766E

    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0F172A

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Highlighted row in a list or table
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Table header row
    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for an ABG value relative to its normal range.
    #[must_use]
    pub fn range_status(status: RangeStatus) -> Style {
        match status {
            RangeStatus::Normal => Self::success(),
            RangeStatus::Low | RangeStatus::High => Self::warning(),
        }
    }

    #[must_use]
    pub fn oxygenation(level: Oxygenation) -> Style {
        match level {
            Oxygenation::Good | Oxygenation::Normal => Self::success(),
            Oxygenation::Hypoxemia => Self::warning(),
            Oxygenation::SevereHypoxemia => Self::danger(),
        }
    }

    /// Gauge color for an FiO2 percentage: more oxygen, hotter color.
    #[must_use]
    pub fn fio2_gauge(fio2: f64) -> Style {
        if fio2 <= 40.0 {
            Self::success()
        } else if fio2 <= 60.0 {
            Self::warning()
        } else {
            Self::danger()
        }
    }
}

pub const LOGO_SMALL: &str = "VentAssist";
