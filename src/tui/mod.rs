//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Patient intake
//! - Monitor with settings, alarm limits and changes
//! - Mode selection and the staged settings editor
//! - ABG entry and interpretation
//! - Lab reference table

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
