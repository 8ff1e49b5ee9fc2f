//! Settings calculator: Derives and recomputes ventilator settings.
//!
//! Initial settings come from the selected mode's weight-scaled defaults.
//! Every later change goes through `recompute` so that minute ventilation
//! and the inspired volume always follow tidal volume and rate.

use std::sync::Arc;

use crate::domain::{
    ClinicalProtocol, ConfigurationError, ModeDefinition, ModeId, ParamKey, ParamValue,
    PatientProfile, VentilatorSettings,
};
use crate::ports::ModeCatalog;

/// Builds settings records from mode defaults.
pub struct SettingsCalculator<C>
where
    C: ModeCatalog,
{
    catalog: Arc<C>,
}

impl<C> SettingsCalculator<C>
where
    C: ModeCatalog,
{
    /// Create a new calculator backed by `catalog`.
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Settings for `mode`, built from its defaults alone.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the patient's catalog lacks `mode`.
    pub fn compute_initial(
        &self,
        profile: &PatientProfile,
        mode: ModeId,
    ) -> Result<VentilatorSettings, ConfigurationError> {
        let definition = self
            .catalog
            .get(profile.age_class(), mode, profile.weight_kg)?;
        let mut settings = VentilatorSettings::empty(mode);
        overlay_defaults(&mut settings, &definition)?;
        finish(&mut settings, profile);
        Ok(settings)
    }

    /// Switch `current` to `mode`: the mode's defaults win for every key they
    /// define, other keys are kept, derived values are recomputed.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the patient's catalog lacks `mode`.
    pub fn apply_mode(
        &self,
        current: &VentilatorSettings,
        profile: &PatientProfile,
        mode: ModeId,
    ) -> Result<VentilatorSettings, ConfigurationError> {
        let definition = self
            .catalog
            .get(profile.age_class(), mode, profile.weight_kg)?;
        let mut settings = current.clone();
        settings.mode = mode;
        overlay_defaults(&mut settings, &definition)?;
        finish(&mut settings, profile);
        Ok(settings)
    }

    /// Apply one edit to a copy of `settings`.
    ///
    /// Changing tidal volume or rate recomputes minute ventilation; changing
    /// tidal volume also moves `vti`. Other keys pass through untouched.
    ///
    /// # Errors
    /// Returns `ConfigurationError` when `key` is derived or `value` has the
    /// wrong kind for `key`.
    pub fn recompute(
        &self,
        settings: &VentilatorSettings,
        key: ParamKey,
        value: Option<ParamValue>,
    ) -> Result<VentilatorSettings, ConfigurationError> {
        if key.is_derived() {
            return Err(ConfigurationError::DerivedParameter { key });
        }

        let mut next = settings.clone();
        next.set(key, value)?;
        if matches!(key, ParamKey::TidalVolume | ParamKey::RespiratoryRate) {
            next.refresh_derived();
        }
        Ok(next)
    }

    /// Check every editable parameter of `mode` against its bounds.
    ///
    /// # Errors
    /// Returns every failing parameter's message.
    pub fn validate(&self, settings: &VentilatorSettings, mode: &ModeDefinition) -> Result<(), Vec<String>> {
        let errors: Vec<String> = mode
            .editable_parameters
            .iter()
            .filter_map(|p| p.check(settings.get(p.key)).err())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn overlay_defaults(
    settings: &mut VentilatorSettings,
    definition: &ModeDefinition,
) -> Result<(), ConfigurationError> {
    for (key, value) in &definition.default_settings {
        settings.set(*key, Some(*value))?;
    }
    Ok(())
}

fn finish(settings: &mut VentilatorSettings, profile: &PatientProfile) {
    settings.refresh_derived();
    settings.vte =
        Some(ClinicalProtocol::for_class(profile.age_class()).expected_vte(profile.weight_kg));
}
