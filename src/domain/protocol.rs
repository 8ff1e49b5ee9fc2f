//! Per-age-class clinical constants.
//!
//! Every rule engine reads its thresholds from here; nothing else in the
//! crate hard-codes a class-specific number. The values are illustrative
//! teaching thresholds, not validated clinical guidance.

use serde::Serialize;

use super::abg::{AbgRanges, ValueRange};
use super::mode::ModeId;
use super::patient::AgeClass;

/// One hypoxemia tier: applies when pO2 is strictly below `po2_below`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HypoxemiaTier {
    pub po2_below: f64,
    pub fio2_step: f64,
    /// Raise applied to the mode's distending pressure (PEEP, CPAP, MAP or P-low)
    pub pressure_step: f64,
}

/// Oxygenation thresholds and responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OxygenationRules {
    pub severe: HypoxemiaTier,
    pub hypoxemia: HypoxemiaTier,
    /// pO2 at or above which FiO2 may be weaned; `None` disables weaning
    pub good_at_or_above: Option<f64>,
    pub fio2_wean_step: f64,
    /// FiO2 is never weaned below room air
    pub fio2_floor: f64,
}

/// Response to CO2 findings in volume and pressure modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VentilationRules {
    pub rate_step: f64,
    pub pip_step: f64,
    /// ml/kg target when ventilation must increase
    pub tidal_volume_up_per_kg: f64,
    /// ml/kg target when ventilation must decrease
    pub tidal_volume_down_per_kg: f64,
}

/// Stricter tier for profound acidemia.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SevereAcidosisRules {
    pub ph_below: f64,
    pub pco2_above: f64,
    pub hco3_below: f64,
    pub rate_step: f64,
    pub pip_step: f64,
}

/// All class-specific constants consumed by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClinicalProtocol {
    pub age_class: AgeClass,
    /// Values outside these ranges are rejected as implausible
    pub admissible: AbgRanges,
    /// Expected exhaled tidal volume, ml/kg
    pub vte_per_kg: f64,
    pub default_mode: ModeId,
    pub oxygenation: OxygenationRules,
    pub ventilation: VentilationRules,
    pub severe_acidosis: Option<SevereAcidosisRules>,
}

static PEDIATRIC: ClinicalProtocol = ClinicalProtocol {
    age_class: AgeClass::Pediatric,
    admissible: AbgRanges {
        ph: ValueRange::new(6.8, 7.8),
        pco2: ValueRange::new(20.0, 100.0),
        po2: ValueRange::new(30.0, 300.0),
        hco3: ValueRange::new(10.0, 40.0),
    },
    vte_per_kg: 5.8,
    default_mode: ModeId::Simv,
    oxygenation: OxygenationRules {
        severe: HypoxemiaTier {
            po2_below: 60.0,
            fio2_step: 20.0,
            pressure_step: 2.0,
        },
        hypoxemia: HypoxemiaTier {
            po2_below: 80.0,
            fio2_step: 10.0,
            pressure_step: 1.0,
        },
        good_at_or_above: Some(100.0),
        fio2_wean_step: 10.0,
        fio2_floor: 21.0,
    },
    ventilation: VentilationRules {
        rate_step: 4.0,
        pip_step: 2.0,
        tidal_volume_up_per_kg: 7.0,
        tidal_volume_down_per_kg: 5.0,
    },
    severe_acidosis: None,
};

static INFANT: ClinicalProtocol = ClinicalProtocol {
    age_class: AgeClass::Infant,
    admissible: AbgRanges {
        ph: ValueRange::new(7.2, 7.6),
        pco2: ValueRange::new(25.0, 60.0),
        po2: ValueRange::new(40.0, 100.0),
        hco3: ValueRange::new(18.0, 32.0),
    },
    vte_per_kg: 6.5,
    default_mode: ModeId::Pcv,
    oxygenation: OxygenationRules {
        severe: HypoxemiaTier {
            po2_below: 50.0,
            fio2_step: 20.0,
            pressure_step: 2.0,
        },
        hypoxemia: HypoxemiaTier {
            po2_below: 60.0,
            fio2_step: 10.0,
            pressure_step: 1.0,
        },
        good_at_or_above: None,
        fio2_wean_step: 5.0,
        fio2_floor: 21.0,
    },
    ventilation: VentilationRules {
        rate_step: 5.0,
        pip_step: 2.0,
        tidal_volume_up_per_kg: 7.0,
        tidal_volume_down_per_kg: 5.0,
    },
    severe_acidosis: Some(SevereAcidosisRules {
        ph_below: 7.25,
        pco2_above: 55.0,
        hco3_below: 16.0,
        rate_step: 10.0,
        pip_step: 4.0,
    }),
};

impl ClinicalProtocol {
    /// The protocol for `class`.
    #[must_use]
    pub fn for_class(class: AgeClass) -> &'static ClinicalProtocol {
        match class {
            AgeClass::Infant => &INFANT,
            AgeClass::Pediatric => &PEDIATRIC,
        }
    }

    /// Expected exhaled tidal volume for `weight_kg`, to 0.1 ml.
    #[must_use]
    pub fn expected_vte(&self, weight_kg: f64) -> f64 {
        super::settings::round_to(weight_kg * self.vte_per_kg, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_per_class() {
        let ped = ClinicalProtocol::for_class(AgeClass::Pediatric);
        let inf = ClinicalProtocol::for_class(AgeClass::Infant);

        assert_eq!(ped.default_mode, ModeId::Simv);
        assert_eq!(inf.default_mode, ModeId::Pcv);
        assert!(ped.severe_acidosis.is_none());
        assert!(inf.severe_acidosis.is_some());

        assert_eq!(ped.oxygenation.good_at_or_above, Some(100.0));
        assert_eq!(inf.oxygenation.good_at_or_above, None);

        // Infant admissible window is the narrower one
        assert!(ped.admissible.ph.contains(7.0));
        assert!(!inf.admissible.ph.contains(7.0));
    }

    #[test]
    fn test_weight_scaled_volumes() {
        let ped = ClinicalProtocol::for_class(AgeClass::Pediatric);
        assert!((ped.expected_vte(10.0) - 58.0).abs() < 1e-9);
        assert!((ped.expected_vte(3.5) - 20.3).abs() < 1e-9);

        let inf = ClinicalProtocol::for_class(AgeClass::Infant);
        assert!((inf.expected_vte(4.0) - 26.0).abs() < 1e-9);
    }
}
