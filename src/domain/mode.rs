//! Ventilator modes and their editable-parameter definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patient::AgeClass;
use super::settings::{IeRatio, ParamKey, ParamValue};

/// Caller/catalog mismatches. These indicate a programming error, not bad
/// user input, and must never be silently defaulted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Mode not found: {0}")]
    UnknownMode(String),

    #[error("Mode {mode} is not available for {age_class} patients")]
    ModeNotAvailable { mode: ModeId, age_class: AgeClass },

    #[error("Mode {mode} has no default for required parameter {key}")]
    MissingDefault { mode: ModeId, key: ParamKey },

    #[error("Parameter {key} does not accept this kind of value")]
    ValueKind { key: ParamKey },

    #[error("Parameter {key} is derived and cannot be edited")]
    DerivedParameter { key: ParamKey },

    #[error("Weight must be a positive number of kilograms, got {0}")]
    InvalidWeight(f64),

    #[error("Parameter {key} has an empty or undefined range")]
    InvalidBounds { key: ParamKey },
}

/// Reject weights that cannot scale a mode's defaults.
///
/// # Errors
/// Returns `ConfigurationError::InvalidWeight` for zero, negative or non-finite weights.
pub fn check_weight(weight_kg: f64) -> Result<(), ConfigurationError> {
    if weight_kg.is_finite() && weight_kg > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidWeight(weight_kg))
    }
}

/// Ventilator mode identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeId {
    #[serde(rename = "SIMV")]
    Simv,
    #[serde(rename = "CPAP")]
    Cpap,
    #[serde(rename = "PRVC")]
    Prvc,
    #[serde(rename = "PCV")]
    Pcv,
    #[serde(rename = "VCV")]
    Vcv,
    #[serde(rename = "PSV")]
    Psv,
    #[serde(rename = "HFOV")]
    Hfov,
    #[serde(rename = "DuoPAP")]
    DuoPap,
}

impl ModeId {
    pub const ALL: [ModeId; 8] = [
        ModeId::Simv,
        ModeId::Cpap,
        ModeId::Prvc,
        ModeId::Pcv,
        ModeId::Vcv,
        ModeId::Psv,
        ModeId::Hfov,
        ModeId::DuoPap,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simv => "SIMV",
            Self::Cpap => "CPAP",
            Self::Prvc => "PRVC",
            Self::Pcv => "PCV",
            Self::Vcv => "VCV",
            Self::Psv => "PSV",
            Self::Hfov => "HFOV",
            Self::DuoPap => "DuoPAP",
        }
    }

    /// Modes where rate and tidal volume respond to CO2 findings.
    #[must_use]
    pub fn is_volume_targeted(&self) -> bool {
        matches!(self, Self::Simv | Self::Prvc | Self::Vcv)
    }

    #[must_use]
    pub fn is_pressure_controlled(&self) -> bool {
        matches!(self, Self::Pcv)
    }

    /// The pressure raised to recruit lung when oxygenation is poor.
    #[must_use]
    pub fn distending_pressure_key(&self) -> ParamKey {
        match self {
            Self::Cpap => ParamKey::Cpap,
            Self::Hfov => ParamKey::MeanAirwayPressure,
            Self::DuoPap => ParamKey::PLow,
            _ => ParamKey::Peep,
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigurationError::UnknownMode(wanted.to_string()))
    }
}

/// How a parameter is edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParameterKind {
    Numeric { min: f64, max: f64, step: f64 },
    Choice { options: Vec<IeRatio> },
}

/// An editable parameter with bounds already resolved for the patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableParameter {
    pub key: ParamKey,
    pub label: &'static str,
    pub unit: &'static str,
    pub kind: ParameterKind,
}

impl EditableParameter {
    /// `(min, max)` for numeric parameters.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self.kind {
            ParameterKind::Numeric { min, max, .. } => Some((min, max)),
            ParameterKind::Choice { .. } => None,
        }
    }

    /// Check a value against this parameter's bounds or options.
    ///
    /// # Errors
    /// Returns a user-facing message naming the violated bound.
    pub fn check(&self, value: Option<ParamValue>) -> Result<(), String> {
        match (&self.kind, value) {
            (_, None) => Err(format!("{} is required", self.label)),
            (ParameterKind::Numeric { min, max, .. }, Some(ParamValue::Number(v))) => {
                if v < *min || v > *max {
                    Err(format!(
                        "{} must be between {} and {}",
                        self.label,
                        self.key_display(*min),
                        self.key_display(*max)
                    ))
                } else {
                    Ok(())
                }
            }
            (ParameterKind::Choice { options }, Some(ParamValue::Ratio(r))) => {
                if options.contains(&r) {
                    Ok(())
                } else {
                    Err(format!("{}: {} is not an available option", self.label, r))
                }
            }
            _ => Err(format!("{}: invalid value", self.label)),
        }
    }

    fn key_display(&self, v: f64) -> String {
        ParamValue::Number(v).display_for(self.key)
    }
}

/// A mode as offered to one patient: defaults and bounds are weight-scaled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeDefinition {
    pub id: ModeId,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Short clinical notes shown alongside the mode.
    pub notes: Vec<&'static str>,
    /// Values applied when the mode is selected.
    pub default_settings: Vec<(ParamKey, ParamValue)>,
    /// Parameters the settings editor exposes, in display order.
    pub editable_parameters: Vec<EditableParameter>,
}

impl ModeDefinition {
    #[must_use]
    pub fn parameter(&self, key: ParamKey) -> Option<&EditableParameter> {
        self.editable_parameters.iter().find(|p| p.key == key)
    }

    #[must_use]
    pub fn bounds(&self, key: ParamKey) -> Option<(f64, f64)> {
        self.parameter(key).and_then(EditableParameter::bounds)
    }

    #[must_use]
    pub fn default_for(&self, key: ParamKey) -> Option<ParamValue> {
        self.default_settings
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Whether `key` belongs to this mode. Keys carried over from a previous
    /// mode are present in the settings record but not defined here.
    /// Derived keys follow their sources; `vte` and FiO2 belong to every mode.
    #[must_use]
    pub fn defines(&self, key: ParamKey) -> bool {
        match key {
            ParamKey::Mvent => {
                self.defines(ParamKey::TidalVolume) && self.defines(ParamKey::RespiratoryRate)
            }
            ParamKey::Vti => self.defines(ParamKey::TidalVolume),
            ParamKey::Vte | ParamKey::Fio2 => true,
            _ => self.default_for(key).is_some() || self.parameter(key).is_some(),
        }
    }

    /// Every editable parameter must have a default.
    ///
    /// # Errors
    /// Returns `ConfigurationError::MissingDefault` for the first gap.
    pub fn ensure_complete(&self) -> Result<(), ConfigurationError> {
        match self
            .editable_parameters
            .iter()
            .find(|p| self.default_for(p.key).is_none())
        {
            Some(p) => Err(ConfigurationError::MissingDefault {
                mode: self.id,
                key: p.key,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(key: ParamKey, min: f64, max: f64) -> EditableParameter {
        EditableParameter {
            key,
            label: key.label(),
            unit: key.unit(),
            kind: ParameterKind::Numeric { min, max, step: 1.0 },
        }
    }

    #[test]
    fn test_mode_id_parsing() {
        assert_eq!("simv".parse::<ModeId>(), Ok(ModeId::Simv));
        assert_eq!("DuoPAP".parse::<ModeId>(), Ok(ModeId::DuoPap));
        assert_eq!(
            "APRV".parse::<ModeId>(),
            Err(ConfigurationError::UnknownMode("APRV".to_string()))
        );
    }

    #[test]
    fn test_check_weight() {
        assert!(check_weight(3.2).is_ok());
        assert_eq!(check_weight(-1.0), Err(ConfigurationError::InvalidWeight(-1.0)));
        assert!(matches!(
            check_weight(f64::NAN),
            Err(ConfigurationError::InvalidWeight(_))
        ));
        assert!(check_weight(0.0).is_err());
    }

    #[test]
    fn test_parameter_check() {
        let rr = numeric(ParamKey::RespiratoryRate, 8.0, 35.0);
        assert!(rr.check(Some(ParamValue::Number(12.0))).is_ok());
        assert_eq!(
            rr.check(Some(ParamValue::Number(40.0))),
            Err("Respiratory Rate must be between 8 and 35".to_string())
        );
        assert_eq!(rr.check(None), Err("Respiratory Rate is required".to_string()));

        let ie = EditableParameter {
            key: ParamKey::IeRatio,
            label: "I:E Ratio",
            unit: "",
            kind: ParameterKind::Choice {
                options: vec![IeRatio::OneToOne, IeRatio::OneToTwo],
            },
        };
        assert!(ie.check(Some(IeRatio::OneToTwo.into())).is_ok());
        assert!(ie.check(Some(IeRatio::OneToFour.into())).is_err());
    }

    #[test]
    fn test_defines_follows_mode_parameters() {
        let cpap = ModeDefinition {
            id: ModeId::Cpap,
            display_name: "CPAP",
            description: "",
            notes: vec![],
            default_settings: vec![
                (ParamKey::Cpap, ParamValue::Number(8.0)),
                (ParamKey::Fio2, ParamValue::Number(40.0)),
            ],
            editable_parameters: vec![numeric(ParamKey::Cpap, 3.0, 15.0)],
        };
        assert!(cpap.defines(ParamKey::Cpap));
        assert!(cpap.defines(ParamKey::Fio2));
        assert!(cpap.defines(ParamKey::Vte));
        assert!(!cpap.defines(ParamKey::Peep));
        assert!(!cpap.defines(ParamKey::RespiratoryRate));
        assert!(!cpap.defines(ParamKey::Mvent));
        assert!(!cpap.defines(ParamKey::Vti));

        let pcv = ModeDefinition {
            id: ModeId::Pcv,
            default_settings: vec![(ParamKey::RespiratoryRate, ParamValue::Number(35.0))],
            editable_parameters: vec![],
            ..cpap
        };
        assert!(pcv.defines(ParamKey::RespiratoryRate));
        assert!(!pcv.defines(ParamKey::Mvent));
    }

    #[test]
    fn test_missing_default_detected() {
        let mode = ModeDefinition {
            id: ModeId::Psv,
            display_name: "PSV",
            description: "",
            notes: vec![],
            default_settings: vec![(ParamKey::Fio2, ParamValue::Number(40.0))],
            editable_parameters: vec![
                numeric(ParamKey::Fio2, 21.0, 100.0),
                numeric(ParamKey::PressureSupport, 5.0, 20.0),
            ],
        };
        assert_eq!(
            mode.ensure_complete(),
            Err(ConfigurationError::MissingDefault {
                mode: ModeId::Psv,
                key: ParamKey::PressureSupport
            })
        );
    }
}
