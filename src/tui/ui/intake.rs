//! Patient intake form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    parse_decimal, AgeClass, AgeUnit, ClinicalProtocol, DiseaseCategory, LungInvolvement,
    PatientProfile,
};
use crate::tui::styles::MedicalTheme;

use super::{render_footer, render_header};

const LUNG_CHOICES: [Option<LungInvolvement>; 4] = [
    None,
    Some(LungInvolvement::Normal),
    Some(LungInvolvement::Obstructive),
    Some(LungInvolvement::Restrictive),
];

/// Intake form fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeField {
    Weight,
    Age,
    AgeUnit,
    Disease,
    OtherLabel,
    LungInvolvement,
}

impl IntakeField {
    const ALL: [IntakeField; 6] = [
        IntakeField::Weight,
        IntakeField::Age,
        IntakeField::AgeUnit,
        IntakeField::Disease,
        IntakeField::OtherLabel,
        IntakeField::LungInvolvement,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Weight => "Weight",
            Self::Age => "Age",
            Self::AgeUnit => "Age Unit",
            Self::Disease => "Disease Category",
            Self::OtherLabel => "Other Disease",
            Self::LungInvolvement => "Lung Involvement",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::Weight => "kg (> 0)",
            Self::Age => "in the selected unit (> 0)",
            Self::OtherLabel => "free text",
            Self::AgeUnit | Self::Disease | Self::LungInvolvement => "",
        }
    }

    fn is_selector(self) -> bool {
        matches!(self, Self::AgeUnit | Self::Disease | Self::LungInvolvement)
    }
}

/// Intake form state
pub struct IntakeFormState {
    pub weight: String,
    pub age: String,
    pub age_unit: AgeUnit,
    pub disease_index: usize,
    pub other_label: String,
    pub lung_index: usize,
    pub selected: IntakeField,
    pub error_message: Option<String>,
    diseases: Vec<DiseaseCategory>,
}

impl Default for IntakeFormState {
    fn default() -> Self {
        Self {
            weight: String::new(),
            age: String::new(),
            age_unit: AgeUnit::default(),
            disease_index: 0,
            other_label: String::new(),
            lung_index: 0,
            selected: IntakeField::Weight,
            error_message: None,
            diseases: DiseaseCategory::choices(),
        }
    }
}

impl IntakeFormState {
    /// Fields currently shown; the free-text disease field only appears
    /// when "Other" is selected.
    #[must_use]
    pub fn visible_fields(&self) -> Vec<IntakeField> {
        IntakeField::ALL
            .into_iter()
            .filter(|f| *f != IntakeField::OtherLabel || self.is_other_selected())
            .collect()
    }

    fn is_other_selected(&self) -> bool {
        matches!(
            self.diseases.get(self.disease_index),
            Some(DiseaseCategory::Other(_))
        )
    }

    fn selected_position(&self) -> usize {
        self.visible_fields()
            .iter()
            .position(|f| *f == self.selected)
            .unwrap_or(0)
    }

    pub fn next_field(&mut self) {
        let fields = self.visible_fields();
        self.selected = fields[(self.selected_position() + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.visible_fields();
        let pos = self.selected_position();
        self.selected = if pos == 0 {
            fields[fields.len() - 1]
        } else {
            fields[pos - 1]
        };
    }

    /// Whether the focused field takes arbitrary text.
    #[must_use]
    pub fn accepts_text(&self) -> bool {
        self.selected == IntakeField::OtherLabel
    }

    pub fn input_char(&mut self, c: char) {
        let accepted = match self.selected {
            IntakeField::Weight if c.is_ascii_digit() || c == '.' => {
                self.weight.push(c);
                true
            }
            IntakeField::Age if c.is_ascii_digit() || c == '.' => {
                self.age.push(c);
                true
            }
            IntakeField::OtherLabel if !c.is_control() => {
                self.other_label.push(c);
                true
            }
            _ => false,
        };
        if accepted {
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(buf) = self.text_buffer() {
            buf.pop();
        }
    }

    pub fn clear_field(&mut self) {
        if let Some(buf) = self.text_buffer() {
            buf.clear();
        }
    }

    fn text_buffer(&mut self) -> Option<&mut String> {
        match self.selected {
            IntakeField::Weight => Some(&mut self.weight),
            IntakeField::Age => Some(&mut self.age),
            IntakeField::OtherLabel => Some(&mut self.other_label),
            _ => None,
        }
    }

    /// Step a selector field forward or backward.
    pub fn cycle(&mut self, forward: bool) {
        fn step(index: usize, len: usize, forward: bool) -> usize {
            if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            }
        }

        match self.selected {
            IntakeField::AgeUnit => {
                let pos = AgeUnit::ALL
                    .iter()
                    .position(|u| *u == self.age_unit)
                    .unwrap_or(0);
                self.age_unit = AgeUnit::ALL[step(pos, AgeUnit::ALL.len(), forward)];
            }
            IntakeField::Disease => {
                self.disease_index = step(self.disease_index, self.diseases.len(), forward);
            }
            IntakeField::LungInvolvement => {
                self.lung_index = step(self.lung_index, LUNG_CHOICES.len(), forward);
            }
            _ => return,
        }
        self.error_message = None;
    }

    /// Selected category, with the free-text label filled in for "Other".
    #[must_use]
    pub fn disease(&self) -> DiseaseCategory {
        match self.diseases.get(self.disease_index) {
            Some(DiseaseCategory::Other(_)) | None => {
                DiseaseCategory::Other(self.other_label.trim().to_string())
            }
            Some(category) => category.clone(),
        }
    }

    #[must_use]
    pub fn lung_involvement(&self) -> Option<LungInvolvement> {
        LUNG_CHOICES.get(self.lung_index).copied().flatten()
    }

    /// Age class for the age typed so far.
    #[must_use]
    pub fn age_class_preview(&self) -> Option<AgeClass> {
        parse_decimal(&self.age)
            .filter(|age| *age > 0.0)
            .map(|age| AgeClass::from_age(age, self.age_unit))
    }

    /// Build and validate the profile.
    ///
    /// # Errors
    /// Returns a message for malformed numbers, or every failed validation
    /// rule joined together.
    pub fn to_profile(&self) -> Result<PatientProfile, String> {
        let weight = parse_decimal(&self.weight).ok_or("Weight: invalid number")?;
        let age = parse_decimal(&self.age).ok_or("Age: invalid number")?;

        let mut profile = PatientProfile::new(weight, age, self.age_unit, self.disease());
        profile.lung_involvement = self.lung_involvement();
        profile.validate().map_err(|errors| errors.join(", "))?;
        Ok(profile)
    }

    /// Wipe typed values from memory once a session has been created.
    pub fn clear_sensitive(&mut self) {
        self.weight.zeroize();
        self.age.zeroize();
        self.other_label.zeroize();
        self.selected = IntakeField::Weight;
        self.error_message = None;
    }

    /// Sample: 12.5 kg, 2-year-old with pneumonia
    pub fn load_sample_data(&mut self) {
        self.weight = "12.5".to_string();
        self.age = "2".to_string();
        self.age_unit = AgeUnit::Years;
        self.disease_index = self
            .diseases
            .iter()
            .position(|d| *d == DiseaseCategory::Pneumonia)
            .unwrap_or(0);
        self.lung_index = 0;
        self.error_message = None;
    }

    fn display_value(&self, field: IntakeField) -> String {
        match field {
            IntakeField::Weight => self.weight.clone(),
            IntakeField::Age => self.age.clone(),
            IntakeField::OtherLabel => self.other_label.clone(),
            IntakeField::AgeUnit => format!("◀ {} ▶", self.age_unit),
            IntakeField::Disease => match self.diseases.get(self.disease_index) {
                Some(d) => format!("◀ {d} ▶"),
                None => String::new(),
            },
            IntakeField::LungInvolvement => match self.lung_involvement() {
                Some(l) => format!("◀ {l} ▶"),
                None => "◀ from disease ▶".to_string(),
            },
        }
    }
}

/// Render the intake form
pub fn render_intake(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_header(f, chunks[0], "Patient Intake", "weight, age and diagnosis");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .margin(1)
        .split(chunks[1]);

    render_fields(f, columns[0], state);
    render_preview(f, columns[1], state);

    render_footer(
        f,
        chunks[2],
        &[
            ("↑↓", "Navigate"),
            ("←→", "Change"),
            ("Enter", "Start Session"),
            ("S", "Sample Data"),
            ("Esc", "Back"),
        ],
        state.error_message.as_deref(),
    );
}

fn render_fields(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let fields = state.visible_fields();
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = *field == state.selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value = state.display_value(*field);
        let value_span = if value.is_empty() {
            Span::styled(field.hint(), MedicalTheme::text_muted())
        } else {
            Span::styled(value, MedicalTheme::text())
        };

        let cursor = if is_selected && !field.is_selector() {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        };

        let content = Paragraph::new(Line::from(vec![Span::raw(" "), value_span, cursor]))
            .block(block);
        f.render_widget(content, rows[i]);
    }
}

fn render_preview(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let mut lines = vec![Line::from(Span::styled(
        "Session Preview",
        MedicalTheme::subtitle(),
    ))];
    lines.push(Line::from(""));

    match state.age_class_preview() {
        Some(class) => {
            let protocol = ClinicalProtocol::for_class(class);
            lines.push(Line::from(vec![
                Span::styled("Age class:    ", MedicalTheme::text_secondary()),
                Span::styled(class.to_string(), MedicalTheme::text()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Default mode: ", MedicalTheme::text_secondary()),
                Span::styled(protocol.default_mode.to_string(), MedicalTheme::text()),
            ]));
        }
        None => lines.push(Line::from(Span::styled(
            "Enter an age to see the age class.",
            MedicalTheme::text_muted(),
        ))),
    }

    let disease = state.disease();
    let lung = state
        .lung_involvement()
        .or_else(|| disease.default_lung_involvement());
    lines.push(Line::from(vec![
        Span::styled("Disease:      ", MedicalTheme::text_secondary()),
        Span::styled(disease.description().to_string(), MedicalTheme::text()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Lungs:        ", MedicalTheme::text_secondary()),
        Span::styled(
            lung.map_or_else(|| "unspecified".to_string(), |l| l.to_string()),
            MedicalTheme::text(),
        ),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Patients younger than 2 months use the infant protocol.",
        MedicalTheme::text_muted(),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_builds_profile() {
        let mut state = IntakeFormState::default();
        state.load_sample_data();

        let profile = state.to_profile().expect("Should build profile");
        assert_eq!(profile.weight_kg, 12.5);
        assert_eq!(profile.age_class(), AgeClass::Pediatric);
        assert_eq!(profile.disease_category, DiseaseCategory::Pneumonia);
        assert_eq!(profile.lung_involvement, None);
    }

    #[test]
    fn test_invalid_numbers_are_reported() {
        let mut state = IntakeFormState::default();
        assert_eq!(
            state.to_profile().expect_err("Should reject"),
            "Weight: invalid number"
        );

        state.weight = "3".to_string();
        state.age = "0".to_string();
        assert_eq!(
            state.to_profile().expect_err("Should reject"),
            "age must be greater than zero"
        );
    }

    #[test]
    fn test_other_disease_needs_label() {
        let mut state = IntakeFormState::default();
        state.load_sample_data();
        state.selected = IntakeField::Disease;
        state.cycle(false);
        while !state.is_other_selected() {
            state.cycle(true);
        }
        assert!(state.visible_fields().contains(&IntakeField::OtherLabel));
        assert_eq!(
            state.to_profile().expect_err("Should reject"),
            "disease category is required"
        );

        state.next_field();
        assert!(state.accepts_text());
        for c in "Sepsis".chars() {
            state.input_char(c);
        }
        let profile = state.to_profile().expect("Should build profile");
        assert_eq!(
            profile.disease_category,
            DiseaseCategory::Other("Sepsis".to_string())
        );
    }

    #[test]
    fn test_navigation_skips_hidden_field() {
        let mut state = IntakeFormState::default();
        state.selected = IntakeField::Disease;
        state.next_field();
        assert_eq!(state.selected, IntakeField::LungInvolvement);
        state.next_field();
        assert_eq!(state.selected, IntakeField::Weight);
        state.prev_field();
        assert_eq!(state.selected, IntakeField::LungInvolvement);
    }

    #[test]
    fn test_age_unit_drives_class_preview() {
        let mut state = IntakeFormState::default();
        state.age = "45".to_string();
        state.selected = IntakeField::AgeUnit;
        state.cycle(false);
        assert_eq!(state.age_unit, AgeUnit::Days);
        assert_eq!(state.age_class_preview(), Some(AgeClass::Infant));

        state.cycle(true);
        assert_eq!(state.age_class_preview(), Some(AgeClass::Pediatric));
    }

    #[test]
    fn test_numeric_fields_ignore_letters() {
        let mut state = IntakeFormState::default();
        state.input_char('4');
        state.input_char('x');
        state.input_char('.');
        state.input_char('2');
        assert_eq!(state.weight, "4.2");

        state.delete_char();
        assert_eq!(state.weight, "4.");
    }

    #[test]
    fn test_clear_sensitive() {
        let mut state = IntakeFormState::default();
        state.load_sample_data();
        state.selected = IntakeField::Age;
        state.clear_sensitive();

        assert!(state.weight.is_empty());
        assert!(state.age.is_empty());
        assert_eq!(state.selected, IntakeField::Weight);
    }
}
