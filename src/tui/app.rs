//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Driving the ventilation session

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::BuiltinModeCatalog;
use crate::application::{AbgSubmission, AlarmConfig, VentilationService};
use crate::domain::{ParameterKind, LAB_TESTS};
use crate::VentAssistError;

use super::ui::{
    abg::{render_abg, AbgFormState},
    editor::{cycle_choice, render_editor, EditorState},
    intake::{render_intake, IntakeFormState},
    labs::{render_labs, LabsState},
    modes::{render_modes, ModesState},
    monitor::render_monitor,
    render_disclaimer, render_status, StatusMessage,
};

type Session = VentilationService<BuiltinModeCatalog>;

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Intake,
    Monitor,
    Modes,
    Editor,
    Abg,
    Labs,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    catalog: Arc<BuiltinModeCatalog>,
    alarm_config: AlarmConfig,

    /// Active patient session; `None` until intake succeeds
    session: Option<Session>,

    intake_state: IntakeFormState,
    modes_state: ModesState,
    editor_state: EditorState,
    abg_state: AbgFormState,
    labs_state: LabsState,

    status: Option<StatusMessage>,
}

impl App {
    /// Create the application with the built-in mode tables and alarm
    /// settings read from the environment.
    ///
    /// # Errors
    /// Returns error if the application cannot be initialized.
    pub fn new() -> Result<Self> {
        let catalog = Arc::new(BuiltinModeCatalog::new());
        let alarm_config = AlarmConfig::from_env_or_default();
        Ok(Self::with_dependencies(catalog, alarm_config))
    }

    /// Create application with injected dependencies.
    #[must_use]
    pub fn with_dependencies(catalog: Arc<BuiltinModeCatalog>, alarm_config: AlarmConfig) -> Self {
        Self {
            screen: Screen::Intake,
            should_quit: false,
            catalog,
            alarm_config,
            session: None,
            intake_state: IntakeFormState::default(),
            modes_state: ModesState::default(),
            editor_state: EditorState::default(),
            abg_state: AbgFormState::default(),
            labs_state: LabsState::default(),
            status: None,
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Min(0),
                        Constraint::Length(1),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                let content_area = chunks[0];

                match (self.screen, &self.session) {
                    (Screen::Monitor, Some(session)) => render_monitor(f, content_area, session),
                    (Screen::Modes, Some(session)) => render_modes(
                        f,
                        content_area,
                        &self.modes_state,
                        &session.modes(),
                        session.mode().id,
                    ),
                    (Screen::Editor, Some(session)) => render_editor(
                        f,
                        content_area,
                        &self.editor_state,
                        session.mode(),
                        session.settings(),
                        session.staged(),
                    ),
                    (Screen::Abg, Some(session)) => render_abg(
                        f,
                        content_area,
                        &self.abg_state,
                        &session.validate_abg(&self.abg_state.panel),
                        &session.protocol().admissible,
                    ),
                    (Screen::Labs, _) => {
                        render_labs(f, content_area, &self.labs_state, LAB_TESTS);
                    }
                    _ => render_intake(f, content_area, &self.intake_state),
                }

                render_status(f, chunks[1], self.status.as_ref());
                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Intake => self.handle_intake_key(key),
            Screen::Monitor => self.handle_monitor_key(key),
            Screen::Modes => self.handle_modes_key(key),
            Screen::Editor => self.handle_editor_key(key),
            Screen::Abg => self.handle_abg_key(key),
            Screen::Labs => self.handle_labs_key(key),
        }
    }

    /// Screen to return to from secondary views.
    fn home(&self) -> Screen {
        if self.session.is_some() {
            Screen::Monitor
        } else {
            Screen::Intake
        }
    }

    fn handle_intake_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                if self.session.is_some() {
                    self.screen = Screen::Monitor;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Up => self.intake_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.intake_state.next_field(),
            KeyCode::Left => self.intake_state.cycle(false),
            KeyCode::Right => self.intake_state.cycle(true),
            KeyCode::Char('s') | KeyCode::Char('S') if !self.intake_state.accepts_text() => {
                self.intake_state.load_sample_data();
            }
            KeyCode::Char('l') | KeyCode::Char('L') if !self.intake_state.accepts_text() => {
                self.screen = Screen::Labs;
            }
            KeyCode::Char(c) => self.intake_state.input_char(c),
            KeyCode::Backspace => self.intake_state.delete_char(),
            KeyCode::Delete => self.intake_state.clear_field(),
            KeyCode::Enter => self.submit_intake(),
            _ => {}
        }
    }

    fn submit_intake(&mut self) {
        let profile = match self.intake_state.to_profile() {
            Ok(profile) => profile,
            Err(e) => {
                self.intake_state.error_message = Some(e);
                return;
            }
        };

        match VentilationService::new(self.catalog.clone(), profile, self.alarm_config.clone()) {
            Ok(session) => {
                self.status = Some(StatusMessage::success(format!(
                    "Session started in {} ({} protocol)",
                    session.mode().id,
                    session.age_class()
                )));
                self.session = Some(session);
                self.abg_state = AbgFormState::default();
                self.editor_state.reset();
                self.intake_state.clear_sensitive();
                self.screen = Screen::Monitor;
            }
            Err(e) => {
                tracing::error!("Failed to start session: {}", e);
                self.intake_state.error_message = Some(e.to_string());
            }
        }
    }

    fn handle_monitor_key(&mut self, key: KeyCode) {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Intake;
            return;
        };

        match key {
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.modes_state.focus(&session.modes(), session.mode().id);
                self.screen = Screen::Modes;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                session.begin_edit();
                self.editor_state.reset();
                self.screen = Screen::Editor;
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.screen = Screen::Abg;
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.screen = Screen::Labs;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => match session.reset() {
                Ok(()) => {
                    self.abg_state.result = None;
                    self.status = Some(StatusMessage::info("Settings reset to initial values"));
                }
                Err(e) => self.status = Some(StatusMessage::error(e.to_string())),
            },
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.intake_state = IntakeFormState::default();
                self.screen = Screen::Intake;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_modes_key(&mut self, key: KeyCode) {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Intake;
            return;
        };
        let modes = session.modes();

        match key {
            KeyCode::Esc => self.screen = Screen::Monitor,
            KeyCode::Up => self.modes_state.prev(modes.len()),
            KeyCode::Down | KeyCode::Tab => self.modes_state.next(modes.len()),
            KeyCode::Enter => {
                let Some(mode) = modes.get(self.modes_state.selected) else {
                    return;
                };
                self.status = Some(match session.select_mode(mode.id) {
                    Ok(()) => StatusMessage::success(format!("Mode set to {}", mode.id)),
                    Err(e) => StatusMessage::error(e.to_string()),
                });
                self.screen = Screen::Monitor;
            }
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyCode) {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Intake;
            return;
        };
        if !session.is_editing() {
            session.begin_edit();
        }

        let parameters = session.mode().editable_parameters.clone();
        let Some(parameter) = parameters.get(self.editor_state.selected) else {
            if key == KeyCode::Esc {
                session.cancel_edit();
                self.screen = Screen::Monitor;
            }
            return;
        };

        match key {
            KeyCode::Esc => {
                session.cancel_edit();
                self.editor_state.reset();
                self.status = Some(StatusMessage::info("Edit cancelled"));
                self.screen = Screen::Monitor;
            }
            KeyCode::Up => self.editor_state.prev(parameters.len()),
            KeyCode::Down | KeyCode::Tab => self.editor_state.next(parameters.len()),
            KeyCode::Left | KeyCode::Right => {
                if let ParameterKind::Choice { .. } = parameter.kind {
                    let current = session.staged().and_then(|s| s.get(parameter.key));
                    let next = cycle_choice(parameter, current, key == KeyCode::Right);
                    let result = session.stage(parameter.key, next).map(|_| ());
                    self.record_edit(result);
                }
            }
            KeyCode::Enter => match self.editor_state.take_input(parameter.key) {
                Ok(Some(value)) => {
                    let result = session.stage(parameter.key, Some(value)).map(|_| ());
                    self.record_edit(result);
                }
                Ok(None) => {}
                Err(e) => self.editor_state.errors = vec![e],
            },
            KeyCode::Delete => {
                let result = session.stage(parameter.key, None).map(|_| ());
                self.record_edit(result);
            }
            KeyCode::Backspace => self.editor_state.delete_char(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.commit_edit(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let result = session.reset_staged().map(|_| ());
                self.record_edit(result);
            }
            KeyCode::Char(c) => self.editor_state.input_char(c),
            _ => {}
        }
    }

    fn record_edit(&mut self, result: std::result::Result<(), VentAssistError>) {
        self.editor_state.errors = match result {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        };
    }

    fn commit_edit(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.commit_edit() {
            Ok(()) => {
                self.editor_state.reset();
                self.status = Some(StatusMessage::success("Settings committed"));
                self.screen = Screen::Monitor;
            }
            Err(VentAssistError::Validation(msg)) => {
                self.editor_state.errors = msg.split(", ").map(str::to_string).collect();
            }
            Err(e) => self.editor_state.errors = vec![e.to_string()],
        }
    }

    fn handle_abg_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.screen = self.home(),
            KeyCode::Up => self.abg_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.abg_state.next_field(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.abg_state.load_sample_data(),
            KeyCode::Char(c) => self.abg_state.input_char(c),
            KeyCode::Backspace => self.abg_state.delete_char(),
            KeyCode::Delete => self.abg_state.clear_field(),
            KeyCode::Enter => self.submit_abg(),
            _ => {}
        }
    }

    fn submit_abg(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Intake;
            return;
        };

        match session.submit_abg(&self.abg_state.panel) {
            Ok(AbgSubmission::Rejected(validation)) => {
                self.abg_state.show_errors = true;
                self.status = Some(StatusMessage::error(format!(
                    "Panel not interpreted: {} field(s) need attention",
                    validation.errors_by_field.len()
                )));
            }
            Ok(AbgSubmission::Interpreted { report, .. }) => {
                self.status = Some(StatusMessage::success(format!(
                    "{} ({} setting(s) changed)",
                    report.interpretation_text,
                    report.changes.len()
                )));
                self.abg_state.result = Some(report);
                self.abg_state.clear_sensitive();
            }
            Err(e) => {
                tracing::error!("ABG interpretation failed: {}", e);
                self.status = Some(StatusMessage::error(e.to_string()));
            }
        }
    }

    fn handle_labs_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.screen = self.home(),
            KeyCode::Up => self.labs_state.prev(),
            KeyCode::Down | KeyCode::Tab => self.labs_state.next(LAB_TESTS.len()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AbgField, ModeId, ParamKey};
    use crate::tui::ui::StatusKind;

    fn app() -> App {
        App::with_dependencies(Arc::new(BuiltinModeCatalog::new()), AlarmConfig::default())
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.handle_key(*key, KeyModifiers::NONE);
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn started_app() -> App {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('s'), KeyCode::Enter]);
        app
    }

    #[test]
    fn test_intake_starts_session() {
        let app = started_app();
        assert_eq!(app.screen(), Screen::Monitor);

        let session = app.session().expect("Should have a session");
        assert_eq!(session.mode().id, ModeId::Simv);
        assert!(app.intake_state.weight.is_empty());
    }

    #[test]
    fn test_invalid_intake_stays_on_form() {
        let mut app = app();
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.screen(), Screen::Intake);
        assert!(app.session().is_none());
        assert!(app.intake_state.error_message.is_some());
    }

    #[test]
    fn test_select_mode_from_list() {
        let mut app = started_app();
        press(&mut app, &[KeyCode::Char('m'), KeyCode::Down, KeyCode::Enter]);

        assert_eq!(app.screen(), Screen::Monitor);
        let session = app.session().expect("Should have a session");
        assert_eq!(session.mode().id, ModeId::Cpap);
    }

    #[test]
    fn test_editor_commit_and_rejection() {
        let mut app = started_app();
        press(&mut app, &[KeyCode::Char('e')]);
        assert_eq!(app.screen(), Screen::Editor);

        // First SIMV parameter is tidal volume; 12.5 kg allows 50 - 125 ml
        type_text(&mut app, "200");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('c')]);
        assert_eq!(app.screen(), Screen::Editor);
        assert_eq!(app.editor_state.errors.len(), 1);

        type_text(&mut app, "90");
        press(&mut app, &[KeyCode::Enter, KeyCode::Char('c')]);
        assert_eq!(app.screen(), Screen::Monitor);

        let session = app.session().expect("Should have a session");
        assert_eq!(session.settings().tidal_volume, Some(90.0));
        assert!(!session.is_editing());
    }

    #[test]
    fn test_editor_escape_discards_changes() {
        let mut app = started_app();
        press(&mut app, &[KeyCode::Char('e')]);
        type_text(&mut app, "90");
        press(&mut app, &[KeyCode::Enter, KeyCode::Esc]);

        let session = app.session().expect("Should have a session");
        assert_eq!(session.settings().tidal_volume, Some(75.0));
        assert!(session.changes().is_empty());
    }

    #[test]
    fn test_abg_submission_updates_settings() {
        let mut app = started_app();
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Char('s'), KeyCode::Enter]);

        assert_eq!(app.screen(), Screen::Abg);
        assert!(app.abg_state.result.is_some());
        assert!(app.abg_state.panel.raw(AbgField::Ph).is_empty());

        let session = app.session().expect("Should have a session");
        assert_eq!(session.settings().respiratory_rate, Some(16.0));
        assert!(session
            .changes()
            .iter()
            .any(|c| c.key == ParamKey::Fio2));
    }

    #[test]
    fn test_rejected_abg_shows_errors() {
        let mut app = started_app();
        press(&mut app, &[KeyCode::Char('a'), KeyCode::Enter]);

        assert!(app.abg_state.show_errors);
        assert!(app.abg_state.result.is_none());
        assert!(matches!(
            app.status.as_ref().map(|s| s.kind),
            Some(StatusKind::Error)
        ));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = started_app();
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);

        // Escape on the intake form without a session leaves the app
        let mut fresh = self::app();
        press(&mut fresh, &[KeyCode::Esc]);
        assert!(fresh.should_quit);

        // With a session it returns to the monitor instead
        let mut running = started_app();
        press(&mut running, &[KeyCode::Char('n'), KeyCode::Esc]);
        assert!(!running.should_quit);
        assert_eq!(running.screen(), Screen::Monitor);
    }
}
