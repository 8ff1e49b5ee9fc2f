//! Mode catalog port: Trait for ventilator mode lookup.
//!
//! This trait abstracts the mode registry from the rule engines so that
//! the engines never depend on how mode tables are stored.

use crate::domain::{AgeClass, ConfigurationError, ModeDefinition, ModeId};

/// Registry of ventilator modes, keyed by age class.
///
/// Every returned definition has its volume bounds and volume defaults
/// scaled to `weight_kg`; pressure, rate and percentage bounds are fixed.
pub trait ModeCatalog: Send + Sync {
    /// Modes offered for `class`, in display order.
    fn list_modes(&self, class: AgeClass, weight_kg: f64) -> Vec<ModeDefinition>;

    /// Look up one mode.
    ///
    /// # Errors
    /// Returns `ConfigurationError::ModeNotAvailable` when `class` does not
    /// offer `mode`.
    fn get(
        &self,
        class: AgeClass,
        mode: ModeId,
        weight_kg: f64,
    ) -> Result<ModeDefinition, ConfigurationError>;

    /// Look up a mode by its textual id.
    ///
    /// # Errors
    /// Returns `ConfigurationError::UnknownMode` if `id` names no mode.
    fn get_by_id(
        &self,
        class: AgeClass,
        id: &str,
        weight_kg: f64,
    ) -> Result<ModeDefinition, ConfigurationError> {
        let mode: ModeId = id.parse()?;
        self.get(class, mode, weight_kg)
    }

    /// The mode selected when a session starts.
    fn default_mode(&self, class: AgeClass) -> ModeId;
}
