//! Assessment report produced after each interpretation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AbgValues, AgeClass, AlarmRanges, Interpretation, ModeId, PatientProfile, SettingChange,
    VentilatorSettings,
};
use crate::VentAssistError;

/// Snapshot of one ABG assessment and the settings it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    pub generated_at: DateTime<Utc>,
    pub profile: PatientProfile,
    pub age_class: AgeClass,
    pub mode: ModeId,
    pub abg: AbgValues,
    pub interpretation: Interpretation,
    pub interpretation_text: String,
    pub settings_before: VentilatorSettings,
    pub settings_after: VentilatorSettings,
    pub alarms: AlarmRanges,
    /// Summary fields changed by this assessment
    pub changes: Vec<SettingChange>,
}

impl AssessmentReport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `VentAssistError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String, VentAssistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
