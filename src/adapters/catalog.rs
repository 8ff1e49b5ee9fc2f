//! Built-in mode catalog: Implementation of ModeCatalog.
//!
//! Mode tables are static templates. Volume bounds and volume defaults are
//! stored per kilogram and resolved against the patient's weight on lookup.

use crate::domain::{
    check_weight, round_to, AgeClass, ClinicalProtocol, ConfigurationError, EditableParameter,
    IeRatio, ModeDefinition, ModeId, ParamKey, ParamValue, ParameterKind,
};
use crate::ports::ModeCatalog;

/// A bound or default that may scale with weight.
#[derive(Debug, Clone, Copy)]
enum Scaled {
    Fixed(f64),
    PerKg(f64),
}

impl Scaled {
    fn resolve(self, weight_kg: f64) -> f64 {
        match self {
            Self::Fixed(v) => v,
            Self::PerKg(v) => round_to(v * weight_kg, 1),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Preset {
    Value(Scaled),
    Ratio(IeRatio),
}

#[derive(Debug, Clone, Copy)]
enum ParamSpec {
    Numeric {
        key: ParamKey,
        min: Scaled,
        max: Scaled,
        step: f64,
    },
    Choice {
        key: ParamKey,
        options: &'static [IeRatio],
    },
}

impl ParamSpec {
    fn resolve(&self, weight_kg: f64) -> EditableParameter {
        let (key, kind) = match *self {
            Self::Numeric { key, min, max, step } => (
                key,
                ParameterKind::Numeric {
                    min: min.resolve(weight_kg),
                    max: max.resolve(weight_kg),
                    step,
                },
            ),
            Self::Choice { key, options } => (
                key,
                ParameterKind::Choice {
                    options: options.to_vec(),
                },
            ),
        };
        EditableParameter {
            key,
            label: key.label(),
            unit: key.unit(),
            kind,
        }
    }
}

struct ModeTemplate {
    id: ModeId,
    display_name: &'static str,
    description: &'static str,
    notes: &'static [&'static str],
    defaults: &'static [(ParamKey, Preset)],
    parameters: &'static [ParamSpec],
}

impl ModeTemplate {
    fn instantiate(&self, weight_kg: f64) -> ModeDefinition {
        let default_settings = self
            .defaults
            .iter()
            .map(|(key, d)| {
                let value = match d {
                    Preset::Value(s) => ParamValue::Number(s.resolve(weight_kg)),
                    Preset::Ratio(r) => ParamValue::Ratio(*r),
                };
                (*key, value)
            })
            .collect();

        ModeDefinition {
            id: self.id,
            display_name: self.display_name,
            description: self.description,
            notes: self.notes.to_vec(),
            default_settings,
            editable_parameters: self
                .parameters
                .iter()
                .map(|p| p.resolve(weight_kg))
                .collect(),
        }
    }
}

const fn num(key: ParamKey, min: f64, max: f64, step: f64) -> ParamSpec {
    ParamSpec::Numeric {
        key,
        min: Scaled::Fixed(min),
        max: Scaled::Fixed(max),
        step,
    }
}

const fn per_kg(key: ParamKey, min: f64, max: f64, step: f64) -> ParamSpec {
    ParamSpec::Numeric {
        key,
        min: Scaled::PerKg(min),
        max: Scaled::PerKg(max),
        step,
    }
}

const fn fixed(v: f64) -> Preset {
    Preset::Value(Scaled::Fixed(v))
}

const ALL_RATIOS: &[IeRatio] = &IeRatio::ALL;

const INFANT_RATIOS: &[IeRatio] = &[
    IeRatio::OneToOne,
    IeRatio::OneToOneAndHalf,
    IeRatio::OneToTwo,
    IeRatio::OneToTwoAndHalf,
    IeRatio::OneToThree,
];

// Pediatric ---------------------------------------------------------------

const PED_FIO2: ParamSpec = num(ParamKey::Fio2, 21.0, 100.0, 1.0);
const PED_TV: ParamSpec = per_kg(ParamKey::TidalVolume, 4.0, 10.0, 0.1);
const PED_RR: ParamSpec = num(ParamKey::RespiratoryRate, 8.0, 35.0, 1.0);
const PED_PEEP: ParamSpec = num(ParamKey::Peep, 3.0, 15.0, 0.5);
const PED_PS: ParamSpec = num(ParamKey::PressureSupport, 5.0, 25.0, 1.0);
const PED_TI: ParamSpec = num(ParamKey::InspiratoryTime, 0.5, 3.0, 0.1);
const PED_IE: ParamSpec = ParamSpec::Choice {
    key: ParamKey::IeRatio,
    options: ALL_RATIOS,
};

static PEDIATRIC_MODES: &[ModeTemplate] = &[
    ModeTemplate {
        id: ModeId::Simv,
        display_name: "SIMV - Synchronized Intermittent Mandatory Ventilation",
        description: "Mandatory breaths synchronized with spontaneous breathing",
        notes: &[
            "Set rate delivers guaranteed breaths",
            "Spontaneous breaths receive pressure support",
        ],
        defaults: &[
            (ParamKey::TidalVolume, Preset::Value(Scaled::PerKg(6.0))),
            (ParamKey::RespiratoryRate, fixed(12.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
            (ParamKey::IeRatio, Preset::Ratio(IeRatio::OneToTwo)),
            (ParamKey::PressureSupport, fixed(10.0)),
            (ParamKey::InspiratoryTime, fixed(1.0)),
            (ParamKey::Trigger, fixed(-2.0)),
        ],
        parameters: &[
            PED_TV,
            PED_RR,
            PED_FIO2,
            PED_PEEP,
            PED_IE,
            PED_PS,
            PED_TI,
            num(ParamKey::Trigger, -20.0, 10.0, 1.0),
        ],
    },
    ModeTemplate {
        id: ModeId::Cpap,
        display_name: "CPAP - Continuous Positive Airway Pressure",
        description: "Constant positive pressure throughout the respiratory cycle",
        notes: &["Requires a reliable spontaneous respiratory drive"],
        defaults: &[
            (ParamKey::Cpap, fixed(8.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::PressureSupport, fixed(10.0)),
        ],
        parameters: &[num(ParamKey::Cpap, 3.0, 15.0, 0.5), PED_FIO2, PED_PS],
    },
    ModeTemplate {
        id: ModeId::Prvc,
        display_name: "PRVC - Pressure Regulated Volume Control",
        description: "Volume target delivered with the lowest necessary pressure",
        notes: &["Combines the benefits of volume and pressure control"],
        defaults: &[
            (ParamKey::TidalVolume, Preset::Value(Scaled::PerKg(6.0))),
            (ParamKey::RespiratoryRate, fixed(12.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
            (ParamKey::IeRatio, Preset::Ratio(IeRatio::OneToTwo)),
            (ParamKey::InspiratoryTime, fixed(1.0)),
        ],
        parameters: &[PED_TV, PED_RR, PED_FIO2, PED_PEEP, PED_IE, PED_TI],
    },
];

// Infant ------------------------------------------------------------------

const INF_FIO2: ParamSpec = num(ParamKey::Fio2, 21.0, 100.0, 1.0);
const INF_TV: ParamSpec = per_kg(ParamKey::TidalVolume, 4.0, 8.0, 0.1);
const INF_RR: ParamSpec = num(ParamKey::RespiratoryRate, 20.0, 60.0, 1.0);
const INF_PEEP: ParamSpec = num(ParamKey::Peep, 3.0, 8.0, 0.5);
const INF_PS: ParamSpec = num(ParamKey::PressureSupport, 4.0, 20.0, 1.0);
const INF_IE: ParamSpec = ParamSpec::Choice {
    key: ParamKey::IeRatio,
    options: INFANT_RATIOS,
};

static INFANT_MODES: &[ModeTemplate] = &[
    ModeTemplate {
        id: ModeId::Pcv,
        display_name: "PCV - Pressure Control Ventilation",
        description: "Fixed inspiratory pressure, variable volume; suited to neonates",
        notes: &[
            "Tidal volume varies with compliance",
            "Short inspiratory time for neonatal lungs",
        ],
        defaults: &[
            (ParamKey::Pip, fixed(18.0)),
            (ParamKey::RespiratoryRate, fixed(35.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
            (ParamKey::IeRatio, Preset::Ratio(IeRatio::OneToOneAndHalf)),
            (ParamKey::InspiratoryTime, fixed(0.4)),
        ],
        parameters: &[
            num(ParamKey::Pip, 10.0, 30.0, 1.0),
            INF_RR,
            INF_FIO2,
            INF_PEEP,
            INF_IE,
            num(ParamKey::InspiratoryTime, 0.25, 0.6, 0.05),
        ],
    },
    ModeTemplate {
        id: ModeId::Vcv,
        display_name: "VCV - Volume Control Ventilation",
        description: "Fixed tidal volume, variable pressure",
        notes: &["Watch peak pressures as compliance changes"],
        defaults: &[
            (ParamKey::TidalVolume, Preset::Value(Scaled::PerKg(6.0))),
            (ParamKey::RespiratoryRate, fixed(30.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
            (ParamKey::IeRatio, Preset::Ratio(IeRatio::OneToTwo)),
            (ParamKey::FlowRate, fixed(8.0)),
        ],
        parameters: &[
            INF_TV,
            INF_RR,
            INF_FIO2,
            INF_PEEP,
            INF_IE,
            num(ParamKey::FlowRate, 4.0, 12.0, 1.0),
        ],
    },
    ModeTemplate {
        id: ModeId::Simv,
        display_name: "SIMV - Synchronized Intermittent Mandatory Ventilation",
        description: "Mandatory breaths combined with spontaneous breathing",
        notes: &["Useful while weaning from full support"],
        defaults: &[
            (ParamKey::TidalVolume, Preset::Value(Scaled::PerKg(6.0))),
            (ParamKey::RespiratoryRate, fixed(25.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
            (ParamKey::IeRatio, Preset::Ratio(IeRatio::OneToTwo)),
            (ParamKey::PressureSupport, fixed(8.0)),
        ],
        parameters: &[INF_TV, INF_RR, INF_FIO2, INF_PEEP, INF_IE, INF_PS],
    },
    ModeTemplate {
        id: ModeId::Cpap,
        display_name: "CPAP - Continuous Positive Airway Pressure",
        description: "Continuous positive pressure throughout the breath",
        notes: &["First-line support for mild respiratory distress"],
        defaults: &[
            (ParamKey::Cpap, fixed(6.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::PressureSupport, fixed(6.0)),
        ],
        parameters: &[num(ParamKey::Cpap, 4.0, 10.0, 0.5), INF_FIO2, INF_PS],
    },
    ModeTemplate {
        id: ModeId::Psv,
        display_name: "PSV - Pressure Support Ventilation",
        description: "Supports the infant's spontaneous breaths",
        notes: &["No backup rate; apnea alarms are essential"],
        defaults: &[
            (ParamKey::PressureSupport, fixed(10.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::Peep, fixed(5.0)),
        ],
        parameters: &[INF_PS, INF_FIO2, INF_PEEP],
    },
    ModeTemplate {
        id: ModeId::Hfov,
        display_name: "HFOV - High Frequency Oscillatory Ventilation",
        description: "Very small tidal volumes at high frequency",
        notes: &[
            "Oxygenation follows mean airway pressure",
            "CO2 clearance follows amplitude",
        ],
        defaults: &[
            (ParamKey::MeanAirwayPressure, fixed(12.0)),
            (ParamKey::Amplitude, fixed(25.0)),
            (ParamKey::Frequency, fixed(10.0)),
            (ParamKey::Fio2, fixed(40.0)),
            (ParamKey::InspiratoryPercent, fixed(33.0)),
        ],
        parameters: &[
            num(ParamKey::MeanAirwayPressure, 6.0, 20.0, 1.0),
            num(ParamKey::Amplitude, 10.0, 50.0, 1.0),
            num(ParamKey::Frequency, 6.0, 15.0, 1.0),
            INF_FIO2,
            num(ParamKey::InspiratoryPercent, 33.0, 50.0, 1.0),
        ],
    },
    ModeTemplate {
        id: ModeId::DuoPap,
        display_name: "DuoPAP - Dual Positive Airway Pressure",
        description: "Two pressure levels, suited to preterm infants",
        notes: &["Spontaneous breathing possible at both levels"],
        defaults: &[
            (ParamKey::PHigh, fixed(16.0)),
            (ParamKey::PLow, fixed(6.0)),
            (ParamKey::TimeHigh, fixed(0.5)),
            (ParamKey::TimeLow, fixed(0.8)),
            (ParamKey::Fio2, fixed(40.0)),
        ],
        parameters: &[
            num(ParamKey::PHigh, 8.0, 25.0, 1.0),
            num(ParamKey::PLow, 3.0, 10.0, 0.5),
            num(ParamKey::TimeHigh, 0.3, 1.5, 0.05),
            num(ParamKey::TimeLow, 0.5, 3.0, 0.1),
            INF_FIO2,
        ],
    },
];

/// Mode catalog backed by the static tables above.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinModeCatalog;

impl BuiltinModeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn templates(class: AgeClass) -> &'static [ModeTemplate] {
        match class {
            AgeClass::Infant => INFANT_MODES,
            AgeClass::Pediatric => PEDIATRIC_MODES,
        }
    }
}

impl ModeCatalog for BuiltinModeCatalog {
    fn list_modes(&self, class: AgeClass, weight_kg: f64) -> Vec<ModeDefinition> {
        Self::templates(class)
            .iter()
            .map(|t| t.instantiate(weight_kg))
            .collect()
    }

    fn get(
        &self,
        class: AgeClass,
        mode: ModeId,
        weight_kg: f64,
    ) -> Result<ModeDefinition, ConfigurationError> {
        check_weight(weight_kg)?;
        let template = Self::templates(class)
            .iter()
            .find(|t| t.id == mode)
            .ok_or(ConfigurationError::ModeNotAvailable {
                mode,
                age_class: class,
            })?;

        let definition = template.instantiate(weight_kg);
        definition.ensure_complete()?;
        Ok(definition)
    }

    fn default_mode(&self, class: AgeClass) -> ModeId {
        ClinicalProtocol::for_class(class).default_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_mode_sets_per_class() {
        let catalog = BuiltinModeCatalog::new();

        let ped: Vec<ModeId> = catalog
            .list_modes(AgeClass::Pediatric, 10.0)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ped, vec![ModeId::Simv, ModeId::Cpap, ModeId::Prvc]);

        let inf: Vec<ModeId> = catalog
            .list_modes(AgeClass::Infant, 3.0)
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(inf.len(), 7);
        assert_eq!(inf[0], ModeId::Pcv);
    }

    #[test]
    fn test_every_mode_is_complete() {
        let catalog = BuiltinModeCatalog::new();
        for class in [AgeClass::Infant, AgeClass::Pediatric] {
            for mode in catalog.list_modes(class, 5.0) {
                assert!(mode.ensure_complete().is_ok(), "{} incomplete", mode.id);
                assert!(catalog.get(class, mode.id, 5.0).is_ok());
            }
        }
    }

    #[test]
    fn test_volume_bounds_scale_with_weight() {
        let catalog = BuiltinModeCatalog::new();
        let simv = catalog
            .get(AgeClass::Pediatric, ModeId::Simv, 10.0)
            .expect("Should find SIMV");

        assert_eq!(simv.bounds(ParamKey::TidalVolume), Some((40.0, 100.0)));
        assert_eq!(simv.bounds(ParamKey::RespiratoryRate), Some((8.0, 35.0)));
        assert_eq!(simv.bounds(ParamKey::InspiratoryTime), Some((0.5, 3.0)));
        assert_eq!(simv.default_for(ParamKey::TidalVolume), Some(ParamValue::Number(60.0)));

        let heavier = catalog
            .get(AgeClass::Pediatric, ModeId::Simv, 20.0)
            .expect("Should find SIMV");
        assert_eq!(heavier.bounds(ParamKey::TidalVolume), Some((80.0, 200.0)));
        assert_eq!(heavier.bounds(ParamKey::Peep), simv.bounds(ParamKey::Peep));
    }

    #[test]
    fn test_unavailable_and_unknown_modes() {
        let catalog = BuiltinModeCatalog::new();

        assert_eq!(
            catalog.get(AgeClass::Pediatric, ModeId::Hfov, 10.0),
            Err(ConfigurationError::ModeNotAvailable {
                mode: ModeId::Hfov,
                age_class: AgeClass::Pediatric
            })
        );
        assert_eq!(
            catalog.get_by_id(AgeClass::Infant, "BIPAP", 3.0),
            Err(ConfigurationError::UnknownMode("BIPAP".to_string()))
        );
        assert!(catalog.get_by_id(AgeClass::Infant, "duopap", 3.0).is_ok());
    }

    #[test]
    fn test_default_modes() {
        let catalog = BuiltinModeCatalog::new();
        assert_eq!(catalog.default_mode(AgeClass::Infant), ModeId::Pcv);
        assert_eq!(catalog.default_mode(AgeClass::Pediatric), ModeId::Simv);
    }
}
