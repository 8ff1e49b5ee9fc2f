//! Ventilation service: Orchestrates one patient session.
//!
//! This service coordinates:
//! - Initial settings for the age class's default mode
//! - Mode switching
//! - Staged manual edits with atomic commit
//! - ABG validation and interpretation
//! - Alarm bands and the change summary

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    AbgPanel, AgeClass, AlarmRanges, ClinicalProtocol, ModeDefinition, ModeId, ParamKey,
    ParamValue, PatientProfile, SettingChange, VentilatorSettings,
};
use crate::ports::ModeCatalog;
use crate::VentAssistError;

use super::alarms::{AlarmConfig, AlarmRangeCalculator};
use super::calculator::SettingsCalculator;
use super::interpreter::AbgInterpreter;
use super::report::AssessmentReport;
use super::validator::{AbgValidation, AbgValidator};

/// Result of submitting an ABG panel.
#[derive(Debug, Clone, PartialEq)]
pub enum AbgSubmission {
    /// The panel failed validation; settings are unchanged.
    Rejected(AbgValidation),
    /// The panel was interpreted and the settings updated.
    Interpreted {
        validation: AbgValidation,
        report: Box<AssessmentReport>,
    },
}

/// One patient's ventilation session.
///
/// The profile is fixed for the life of the session. Settings change only
/// through mode selection, a committed edit, an interpretation or a reset.
pub struct VentilationService<C>
where
    C: ModeCatalog,
{
    calculator: SettingsCalculator<C>,
    alarms: AlarmRangeCalculator,
    profile: PatientProfile,
    initial: VentilatorSettings,
    current: VentilatorSettings,
    mode: ModeDefinition,
    staged: Option<VentilatorSettings>,
    last_assessment: Option<AssessmentReport>,
}

impl<C> VentilationService<C>
where
    C: ModeCatalog,
{
    /// Start a session for `profile` in the age class's default mode.
    ///
    /// # Errors
    /// Returns `VentAssistError::Validation` for an invalid profile, or a
    /// configuration error if the catalog cannot serve the default mode.
    pub fn new(
        catalog: Arc<C>,
        profile: PatientProfile,
        alarm_config: AlarmConfig,
    ) -> Result<Self, VentAssistError> {
        profile
            .validate()
            .map_err(|errors| VentAssistError::Validation(errors.join(", ")))?;

        let class = profile.age_class();
        let calculator = SettingsCalculator::new(catalog);
        let default_mode = calculator.catalog().default_mode(class);
        let mode = calculator
            .catalog()
            .get(class, default_mode, profile.weight_kg)?;
        let initial = calculator.compute_initial(&profile, default_mode)?;

        tracing::info!(
            "Session started: {} patient, {} kg, {}, mode {}",
            class,
            profile.weight_kg,
            profile.disease_category,
            default_mode
        );

        Ok(Self {
            calculator,
            alarms: AlarmRangeCalculator::new(alarm_config),
            profile,
            current: initial.clone(),
            initial,
            mode,
            staged: None,
            last_assessment: None,
        })
    }

    #[must_use]
    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    #[must_use]
    pub fn age_class(&self) -> AgeClass {
        self.profile.age_class()
    }

    #[must_use]
    pub fn protocol(&self) -> &'static ClinicalProtocol {
        ClinicalProtocol::for_class(self.age_class())
    }

    /// Active settings.
    #[must_use]
    pub fn settings(&self) -> &VentilatorSettings {
        &self.current
    }

    /// Settings the session started with.
    #[must_use]
    pub fn initial_settings(&self) -> &VentilatorSettings {
        &self.initial
    }

    /// Active mode, with bounds scaled to the patient.
    #[must_use]
    pub fn mode(&self) -> &ModeDefinition {
        &self.mode
    }

    /// Modes available to this patient.
    #[must_use]
    pub fn modes(&self) -> Vec<ModeDefinition> {
        self.calculator
            .catalog()
            .list_modes(self.age_class(), self.profile.weight_kg)
    }

    /// Switch to `mode`, overlaying its defaults. Any edit in progress is
    /// discarded.
    ///
    /// # Errors
    /// Returns a configuration error if the patient's catalog lacks `mode`.
    pub fn select_mode(&mut self, mode: ModeId) -> Result<(), VentAssistError> {
        let definition = self
            .calculator
            .catalog()
            .get(self.age_class(), mode, self.profile.weight_kg)?;
        self.current = self
            .calculator
            .apply_mode(&self.current, &self.profile, mode)?;
        self.mode = definition;
        self.staged = None;

        tracing::info!("Mode changed to {}", mode);
        Ok(())
    }

    /// Start editing a copy of the active settings.
    pub fn begin_edit(&mut self) -> &VentilatorSettings {
        self.staged.insert(self.current.clone())
    }

    /// The staged copy, while an edit is in progress.
    #[must_use]
    pub fn staged(&self) -> Option<&VentilatorSettings> {
        self.staged.as_ref()
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.staged.is_some()
    }

    /// Apply one field edit to the staged copy.
    ///
    /// # Errors
    /// Returns `VentAssistError::Validation` if no edit is in progress, or a
    /// configuration error for derived keys and mismatched value kinds.
    pub fn stage(
        &mut self,
        key: ParamKey,
        value: Option<ParamValue>,
    ) -> Result<&VentilatorSettings, VentAssistError> {
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| VentAssistError::Validation("no edit in progress".to_string()))?;
        let next = self.calculator.recompute(staged, key, value)?;
        Ok(self.staged.insert(next))
    }

    /// Replace the staged copy with the active mode's starting values.
    ///
    /// # Errors
    /// Returns `VentAssistError::Validation` if no edit is in progress.
    pub fn reset_staged(&mut self) -> Result<&VentilatorSettings, VentAssistError> {
        if self.staged.is_none() {
            return Err(VentAssistError::Validation(
                "no edit in progress".to_string(),
            ));
        }
        let fresh = self.calculator.compute_initial(&self.profile, self.mode.id)?;
        Ok(self.staged.insert(fresh))
    }

    /// Drop the staged copy.
    pub fn cancel_edit(&mut self) {
        if self.staged.take().is_some() {
            tracing::debug!("Settings edit cancelled");
        }
    }

    /// Check the staged copy against the mode's bounds and, if it passes,
    /// make it the active settings. On failure the edit stays open.
    ///
    /// # Errors
    /// Returns `VentAssistError::Validation` listing every violated bound.
    pub fn commit_edit(&mut self) -> Result<(), VentAssistError> {
        let staged = self
            .staged
            .as_ref()
            .ok_or_else(|| VentAssistError::Validation("no edit in progress".to_string()))?;

        if let Err(errors) = self.calculator.validate(staged, &self.mode) {
            tracing::warn!("Settings edit rejected: {} invalid field(s)", errors.len());
            return Err(VentAssistError::Validation(errors.join(", ")));
        }

        let mut committed = staged.clone();
        committed.refresh_derived();
        let changes = committed.changes_from(&self.current);
        self.current = committed;
        self.staged = None;

        tracing::info!("Settings edit committed: {} summary field(s) changed", changes.len());
        Ok(())
    }

    /// Restore the initial settings and mode, and forget the last assessment.
    ///
    /// # Errors
    /// Returns a configuration error if the initial mode is no longer served.
    pub fn reset(&mut self) -> Result<(), VentAssistError> {
        self.mode = self.calculator.catalog().get(
            self.age_class(),
            self.initial.mode,
            self.profile.weight_kg,
        )?;
        self.current = self.initial.clone();
        self.staged = None;
        self.last_assessment = None;

        tracing::info!("Settings reset to initial values");
        Ok(())
    }

    /// Validate a panel without interpreting it.
    #[must_use]
    pub fn validate_abg(&self, panel: &AbgPanel) -> AbgValidation {
        AbgValidator::validate(panel, self.age_class())
    }

    /// Validate `panel` and, if it passes, interpret it and apply the
    /// recommended settings.
    ///
    /// # Errors
    /// Returns a configuration error if the adjusted settings cannot be
    /// written; a rejected panel is not an error.
    pub fn submit_abg(&mut self, panel: &AbgPanel) -> Result<AbgSubmission, VentAssistError> {
        let validation = self.validate_abg(panel);
        let Some(values) = validation.values else {
            tracing::warn!(
                "ABG panel rejected: {}",
                validation
                    .errors_by_field
                    .values()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Ok(AbgSubmission::Rejected(validation));
        };

        let outcome = AbgInterpreter::interpret(
            &values,
            &self.current,
            &self.mode,
            self.profile.weight_kg,
            self.protocol(),
        )?;

        let before = std::mem::replace(&mut self.current, outcome.updated_settings);
        self.staged = None;

        let report = AssessmentReport {
            generated_at: Utc::now(),
            profile: self.profile.clone(),
            age_class: self.age_class(),
            mode: self.mode.id,
            abg: values,
            interpretation: outcome.interpretation,
            interpretation_text: outcome.interpretation_text,
            changes: self.current.changes_from(&before),
            alarms: self.alarm_ranges(),
            settings_before: before,
            settings_after: self.current.clone(),
        };

        tracing::info!(
            "ABG interpreted: {} ({} setting(s) changed)",
            report.interpretation_text,
            report.changes.len()
        );
        match report.to_json() {
            Ok(json) => tracing::debug!("Assessment report: {}", json),
            Err(e) => tracing::warn!("Failed to encode assessment report: {}", e),
        }

        self.last_assessment = Some(report.clone());
        Ok(AbgSubmission::Interpreted {
            validation,
            report: Box::new(report),
        })
    }

    #[must_use]
    pub fn last_assessment(&self) -> Option<&AssessmentReport> {
        self.last_assessment.as_ref()
    }

    /// Alarm bands for the parameters the active mode defines.
    #[must_use]
    pub fn alarm_ranges(&self) -> AlarmRanges {
        self.alarms.compute_for_mode(&self.current, &self.mode)
    }

    /// Present settings the active mode defines, in display order.
    #[must_use]
    pub fn mode_settings(&self) -> Vec<(ParamKey, ParamValue)> {
        self.current
            .present_keys()
            .into_iter()
            .filter(|key| self.mode.defines(*key))
            .filter_map(|key| self.current.get(key).map(|value| (key, value)))
            .collect()
    }

    /// Summary fields that differ from the initial settings.
    #[must_use]
    pub fn changes(&self) -> Vec<SettingChange> {
        self.current.changes_from(&self.initial)
    }
}
