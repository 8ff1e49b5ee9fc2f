//! ABG interpreter: Acid-base and oxygenation classification.
//!
//! Classification is evaluated in a fixed order:
//! 1. Acid-base disorder from pH, then pCO2 and HCO3
//! 2. Expected compensation for the primary disorder
//! 3. Anion gap, for metabolic acidosis only
//! 4. Oxygenation tier, independently of the acid-base axis
//!
//! Setting adjustments are then applied to a copy of the current settings.
//! Every adjusted value is clamped to the active mode's bounds, and a key
//! the mode does not bound is never touched.

use crate::domain::{
    check_weight, round_to, AbgValues, AcidBaseDisorder, AnionGap, ClinicalProtocol,
    Compensation, ConfigurationError, Interpretation, InterpretationOutcome, ModeDefinition,
    Oxygenation, ParamKey, VentilatorSettings,
};

const PH_LOW: f64 = 7.35;
const PH_HIGH: f64 = 7.45;
const PCO2_LOW: f64 = 35.0;
const PCO2_HIGH: f64 = 45.0;
const HCO3_LOW: f64 = 22.0;
const HCO3_HIGH: f64 = 26.0;

/// Allowed distance from the expected compensation value.
const COMPENSATION_TOLERANCE: f64 = 2.0;

/// Interprets validated ABG panels.
pub struct AbgInterpreter;

impl AbgInterpreter {
    /// Classify `values` without touching any settings.
    #[must_use]
    pub fn classify(values: &AbgValues, protocol: &ClinicalProtocol) -> Interpretation {
        let (disorder, compensation) = classify_acid_base(values, protocol);
        let anion_gap = disorder
            .is_metabolic_acidosis()
            .then(|| AnionGap::from_hco3(values.hco3));
        let oxygenation = classify_oxygenation(values.po2, protocol);

        tracing::debug!(
            "ABG classified: disorder={}, compensation={:?}, oxygenation={}",
            disorder,
            compensation,
            oxygenation
        );

        Interpretation {
            disorder,
            compensation,
            anion_gap,
            oxygenation,
        }
    }

    /// Interpret `values` and derive adjusted settings for `mode`.
    ///
    /// The caller must only pass values that passed validation.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if a bounded key cannot be written.
    pub fn interpret(
        values: &AbgValues,
        current: &VentilatorSettings,
        mode: &ModeDefinition,
        weight_kg: f64,
        protocol: &ClinicalProtocol,
    ) -> Result<InterpretationOutcome, ConfigurationError> {
        check_weight(weight_kg)?;
        let interpretation = Self::classify(values, protocol);
        let mut settings = current.clone();

        adjust_ventilation(&mut settings, mode, weight_kg, protocol, &interpretation)?;
        adjust_oxygenation(&mut settings, mode, protocol, interpretation.oxygenation)?;

        for key in [ParamKey::Fio2, ParamKey::Peep, ParamKey::RespiratoryRate] {
            adjust(&mut settings, mode, key, |v| v)?;
        }
        settings.refresh_derived();

        Ok(InterpretationOutcome {
            interpretation_text: interpretation.text(),
            interpretation,
            updated_settings: settings,
        })
    }
}

fn classify_acid_base(
    v: &AbgValues,
    protocol: &ClinicalProtocol,
) -> (AcidBaseDisorder, Option<Compensation>) {
    let severe = protocol.severe_acidosis;

    if v.ph < PH_LOW {
        if v.pco2 > PCO2_HIGH {
            let severe = severe.is_some_and(|s| v.ph < s.ph_below && v.pco2 > s.pco2_above);
            let expected = 24.0 + (v.pco2 - 40.0) / 10.0 * 2.5;
            tracing::debug!("Respiratory acidosis: expected HCO3 {:.2}", expected);
            (
                AcidBaseDisorder::RespiratoryAcidosis { severe },
                Some(respiratory_compensation(v.hco3 - expected)),
            )
        } else if v.hco3 < HCO3_LOW {
            let severe = severe.is_some_and(|s| v.ph < s.ph_below && v.hco3 < s.hco3_below);
            let expected = 1.5 * v.hco3 + 8.0;
            tracing::debug!("Metabolic acidosis: expected pCO2 {:.2}", expected);
            (
                AcidBaseDisorder::MetabolicAcidosis { severe },
                Some(metabolic_compensation(v.pco2, expected)),
            )
        } else {
            (AcidBaseDisorder::UnclassifiedAcidemia, None)
        }
    } else if v.ph > PH_HIGH {
        if v.pco2 < PCO2_LOW {
            let expected = 24.0 - (40.0 - v.pco2) / 10.0 * 5.0;
            tracing::debug!("Respiratory alkalosis: expected HCO3 {:.2}", expected);
            (
                AcidBaseDisorder::RespiratoryAlkalosis,
                Some(respiratory_compensation(expected - v.hco3)),
            )
        } else if v.hco3 > HCO3_HIGH {
            let expected = 0.7 * v.hco3 + 20.0;
            tracing::debug!("Metabolic alkalosis: expected pCO2 {:.2}", expected);
            (
                AcidBaseDisorder::MetabolicAlkalosis,
                Some(metabolic_compensation(v.pco2, expected)),
            )
        } else {
            (AcidBaseDisorder::UnclassifiedAlkalemia, None)
        }
    } else if v.pco2 > PCO2_HIGH && v.hco3 > HCO3_HIGH {
        (
            AcidBaseDisorder::MixedMetabolicAlkalosisRespiratoryAcidosis,
            None,
        )
    } else if v.pco2 < PCO2_LOW && v.hco3 < HCO3_LOW {
        (
            AcidBaseDisorder::MixedMetabolicAcidosisRespiratoryAlkalosis,
            None,
        )
    } else {
        (AcidBaseDisorder::Normal, None)
    }
}

/// `progress` is how far HCO3 has moved past the expected value in the
/// compensating direction; negative means it has not moved far enough.
fn respiratory_compensation(progress: f64) -> Compensation {
    if progress < -COMPENSATION_TOLERANCE {
        Compensation::Uncompensated
    } else if progress > COMPENSATION_TOLERANCE {
        Compensation::Chronic
    } else {
        Compensation::Acute
    }
}

fn metabolic_compensation(pco2: f64, expected: f64) -> Compensation {
    if pco2 > expected + COMPENSATION_TOLERANCE {
        Compensation::ConcurrentRespiratoryAcidosis
    } else if pco2 < expected - COMPENSATION_TOLERANCE {
        Compensation::ConcurrentRespiratoryAlkalosis
    } else {
        Compensation::Appropriate
    }
}

fn classify_oxygenation(po2: f64, protocol: &ClinicalProtocol) -> Oxygenation {
    let rules = &protocol.oxygenation;
    if po2 < rules.severe.po2_below {
        Oxygenation::SevereHypoxemia
    } else if po2 < rules.hypoxemia.po2_below {
        Oxygenation::Hypoxemia
    } else if rules.good_at_or_above.is_some_and(|good| po2 >= good) {
        Oxygenation::Good
    } else {
        Oxygenation::Normal
    }
}

/// Apply `f` to `key` and clamp to the mode's bounds. Keys that are absent
/// or unbounded in `mode` are left alone.
fn adjust(
    settings: &mut VentilatorSettings,
    mode: &ModeDefinition,
    key: ParamKey,
    f: impl FnOnce(f64) -> f64,
) -> Result<(), ConfigurationError> {
    let (Some((min, max)), Some(current)) = (mode.bounds(key), settings.number(key)) else {
        return Ok(());
    };
    if !(min <= max) {
        return Err(ConfigurationError::InvalidBounds { key });
    }
    let next = round_to(f(current), key.precision()).clamp(min, max);
    settings.set_number(key, Some(next))
}

fn adjust_ventilation(
    settings: &mut VentilatorSettings,
    mode: &ModeDefinition,
    weight_kg: f64,
    protocol: &ClinicalProtocol,
    interpretation: &Interpretation,
) -> Result<(), ConfigurationError> {
    let rules = protocol.ventilation;
    let severe = matches!(
        interpretation.disorder,
        AcidBaseDisorder::RespiratoryAcidosis { severe: true }
    );
    let (rate_step, pip_step) = match protocol.severe_acidosis {
        Some(s) if severe => (s.rate_step, s.pip_step),
        _ => (rules.rate_step, rules.pip_step),
    };

    let volume_mode = mode.id.is_volume_targeted();
    let pressure_mode = mode.id.is_pressure_controlled();
    if !volume_mode && !pressure_mode {
        return Ok(());
    }

    if interpretation.disorder.needs_more_ventilation() {
        adjust(settings, mode, ParamKey::RespiratoryRate, |rr| rr + rate_step)?;
        if volume_mode {
            let target = round_to(weight_kg * rules.tidal_volume_up_per_kg, 1);
            adjust(settings, mode, ParamKey::TidalVolume, |tv| tv.max(target))?;
        }
        if pressure_mode {
            adjust(settings, mode, ParamKey::Pip, |pip| pip + pip_step)?;
        }
        tracing::debug!("Increased ventilation for {}", interpretation.disorder);
    } else if interpretation.disorder.needs_less_ventilation() {
        adjust(settings, mode, ParamKey::RespiratoryRate, |rr| rr - rate_step)?;
        if volume_mode {
            let target = round_to(weight_kg * rules.tidal_volume_down_per_kg, 1);
            adjust(settings, mode, ParamKey::TidalVolume, |tv| tv.min(target))?;
        }
        tracing::debug!("Decreased ventilation for {}", interpretation.disorder);
    }

    Ok(())
}

fn adjust_oxygenation(
    settings: &mut VentilatorSettings,
    mode: &ModeDefinition,
    protocol: &ClinicalProtocol,
    oxygenation: Oxygenation,
) -> Result<(), ConfigurationError> {
    let rules = &protocol.oxygenation;
    let pressure_key = mode.id.distending_pressure_key();

    let tier = match oxygenation {
        Oxygenation::SevereHypoxemia => rules.severe,
        Oxygenation::Hypoxemia => rules.hypoxemia,
        Oxygenation::Good => {
            let floor = rules.fio2_floor;
            return adjust(settings, mode, ParamKey::Fio2, |f| {
                (f - rules.fio2_wean_step).max(floor)
            });
        }
        Oxygenation::Normal => return Ok(()),
    };

    adjust(settings, mode, ParamKey::Fio2, |f| f + tier.fio2_step)?;
    adjust(settings, mode, pressure_key, |p| p + tier.pressure_step)?;
    tracing::debug!(
        "Raised FiO2 by {} and {} by {} for {}",
        tier.fio2_step,
        pressure_key,
        tier.pressure_step,
        oxygenation
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::BuiltinModeCatalog;
    use crate::application::SettingsCalculator;
    use crate::domain::{
        minute_ventilation, AgeClass, AgeUnit, DiseaseCategory, ModeId, ParameterKind,
        PatientProfile,
    };
    use crate::ports::ModeCatalog;
    use std::sync::Arc;

    struct Fixture {
        profile: PatientProfile,
        mode: ModeDefinition,
        settings: VentilatorSettings,
    }

    fn fixture(profile: PatientProfile, mode: ModeId) -> Fixture {
        let catalog = Arc::new(BuiltinModeCatalog::new());
        let calc = SettingsCalculator::new(catalog.clone());
        let settings = calc.compute_initial(&profile, mode).expect("Should compute");
        let mode = catalog
            .get(profile.age_class(), mode, profile.weight_kg)
            .expect("Should find mode");
        Fixture {
            profile,
            mode,
            settings,
        }
    }

    fn child(mode: ModeId) -> Fixture {
        fixture(
            PatientProfile::new(10.0, 3.0, AgeUnit::Years, DiseaseCategory::Pneumonia),
            mode,
        )
    }

    fn newborn(mode: ModeId) -> Fixture {
        fixture(
            PatientProfile::new(3.0, 2.0, AgeUnit::Days, DiseaseCategory::Rds),
            mode,
        )
    }

    fn run(fx: &Fixture, values: AbgValues) -> InterpretationOutcome {
        AbgInterpreter::interpret(
            &values,
            &fx.settings,
            &fx.mode,
            fx.profile.weight_kg,
            ClinicalProtocol::for_class(fx.profile.age_class()),
        )
        .expect("Should interpret")
    }

    fn ped() -> &'static ClinicalProtocol {
        ClinicalProtocol::for_class(AgeClass::Pediatric)
    }

    #[test]
    fn test_normal_abg_changes_nothing() {
        let fx = child(ModeId::Simv);
        let out = run(&fx, AbgValues::new(7.40, 40.0, 90.0, 24.0));

        assert_eq!(out.interpretation_text, "normal ABG");
        assert_eq!(out.updated_settings, fx.settings);
    }

    #[test]
    fn test_infant_normal_abg_changes_nothing() {
        let fx = newborn(ModeId::Pcv);
        for po2 in [90.0, 100.0] {
            let out = run(&fx, AbgValues::new(7.40, 40.0, po2, 24.0));
            assert_eq!(out.interpretation.oxygenation, Oxygenation::Normal);
            assert_eq!(out.interpretation_text, "normal ABG");
            assert_eq!(out.updated_settings, fx.settings);
        }
    }

    #[test]
    fn test_respiratory_acidosis_scenario() {
        let fx = child(ModeId::Simv);
        let out = run(&fx, AbgValues::new(7.25, 55.0, 55.0, 24.0));

        assert_eq!(
            out.interpretation.disorder,
            AcidBaseDisorder::RespiratoryAcidosis { severe: false }
        );
        assert_eq!(out.interpretation.compensation, Some(Compensation::Uncompensated));
        assert_eq!(out.interpretation.oxygenation, Oxygenation::SevereHypoxemia);
        assert_eq!(
            out.interpretation_text,
            "respiratory acidosis - uncompensated - severe hypoxemia"
        );

        let s = &out.updated_settings;
        assert_eq!(s.respiratory_rate, Some(16.0));
        assert_eq!(s.tidal_volume, Some(70.0));
        assert_eq!(s.fio2, Some(60.0));
        assert_eq!(s.peep, Some(7.0));
        assert_eq!(s.mvent, Some(minute_ventilation(70.0, 16.0)));
        assert_eq!(s.vti, Some(70.0));
    }

    #[test]
    fn test_respiratory_compensation_tiers() {
        // pCO2 60 expects HCO3 29
        let acute = AbgInterpreter::classify(&AbgValues::new(7.30, 60.0, 90.0, 28.0), ped());
        assert_eq!(acute.compensation, Some(Compensation::Acute));

        let chronic = AbgInterpreter::classify(&AbgValues::new(7.33, 60.0, 90.0, 34.0), ped());
        assert_eq!(chronic.compensation, Some(Compensation::Chronic));

        // pCO2 30 expects HCO3 19
        let alk = AbgInterpreter::classify(&AbgValues::new(7.50, 30.0, 90.0, 24.0), ped());
        assert_eq!(alk.disorder, AcidBaseDisorder::RespiratoryAlkalosis);
        assert_eq!(alk.compensation, Some(Compensation::Uncompensated));

        let alk_chronic = AbgInterpreter::classify(&AbgValues::new(7.46, 30.0, 90.0, 15.0), ped());
        assert_eq!(alk_chronic.compensation, Some(Compensation::Chronic));
    }

    #[test]
    fn test_metabolic_acidosis_with_anion_gap() {
        // HCO3 14 expects pCO2 29; gap 22
        let i = AbgInterpreter::classify(&AbgValues::new(7.20, 29.0, 90.0, 14.0), ped());
        assert_eq!(i.disorder, AcidBaseDisorder::MetabolicAcidosis { severe: false });
        assert_eq!(i.compensation, Some(Compensation::Appropriate));
        assert_eq!(
            i.text(),
            "metabolic acidosis (elevated anion gap, consider fixed-acid etiology) - appropriately compensated"
        );

        // HCO3 20 expects pCO2 38; gap 16 still elevated; pCO2 44 too high
        let i = AbgInterpreter::classify(&AbgValues::new(7.30, 44.0, 90.0, 20.0), ped());
        assert_eq!(i.compensation, Some(Compensation::ConcurrentRespiratoryAcidosis));
    }

    #[test]
    fn test_metabolic_alkalosis() {
        // HCO3 34 expects pCO2 43.8
        let i = AbgInterpreter::classify(&AbgValues::new(7.50, 44.0, 90.0, 34.0), ped());
        assert_eq!(i.disorder, AcidBaseDisorder::MetabolicAlkalosis);
        assert_eq!(i.compensation, Some(Compensation::Appropriate));
        assert!(i.anion_gap.is_none());

        let i = AbgInterpreter::classify(&AbgValues::new(7.55, 36.0, 90.0, 34.0), ped());
        assert_eq!(i.compensation, Some(Compensation::ConcurrentRespiratoryAlkalosis));
    }

    #[test]
    fn test_mixed_and_unclassified() {
        let i = AbgInterpreter::classify(&AbgValues::new(7.40, 50.0, 90.0, 30.0), ped());
        assert_eq!(
            i.text(),
            "mixed disorder: compensated metabolic alkalosis with respiratory acidosis"
        );

        let i = AbgInterpreter::classify(&AbgValues::new(7.40, 30.0, 90.0, 18.0), ped());
        assert_eq!(
            i.text(),
            "mixed disorder: compensated metabolic acidosis with respiratory alkalosis"
        );

        let i = AbgInterpreter::classify(&AbgValues::new(7.30, 40.0, 90.0, 24.0), ped());
        assert_eq!(i.disorder, AcidBaseDisorder::UnclassifiedAcidemia);
        assert!(i.compensation.is_none());

        let i = AbgInterpreter::classify(&AbgValues::new(7.50, 40.0, 90.0, 24.0), ped());
        assert_eq!(i.disorder, AcidBaseDisorder::UnclassifiedAlkalemia);
    }

    #[test]
    fn test_respiratory_alkalosis_lowers_ventilation() {
        let fx = child(ModeId::Prvc);
        let out = run(&fx, AbgValues::new(7.50, 30.0, 90.0, 24.0));

        let s = &out.updated_settings;
        assert_eq!(s.respiratory_rate, Some(8.0));
        assert_eq!(s.tidal_volume, Some(50.0));
        assert_eq!(s.mvent, Some(0.4));
    }

    #[test]
    fn test_good_oxygenation_weans_fio2() {
        let fx = child(ModeId::Simv);
        let out = run(&fx, AbgValues::new(7.40, 40.0, 120.0, 24.0));
        assert_eq!(out.interpretation_text, "normal ABG - good oxygenation");
        assert_eq!(out.updated_settings.fio2, Some(30.0));
    }

    #[test]
    fn test_cpap_leaves_rate_and_volume_alone() {
        let fx = child(ModeId::Cpap);
        let out = run(&fx, AbgValues::new(7.25, 55.0, 70.0, 24.0));

        let s = &out.updated_settings;
        assert_eq!(s.respiratory_rate, fx.settings.respiratory_rate);
        assert_eq!(s.fio2, Some(50.0));
        assert_eq!(s.cpap, Some(9.0));
    }

    #[test]
    fn test_infant_severe_respiratory_acidosis_in_pcv() {
        let fx = newborn(ModeId::Pcv);
        let out = run(&fx, AbgValues::new(7.22, 58.0, 45.0, 24.0));

        assert_eq!(
            out.interpretation.disorder,
            AcidBaseDisorder::RespiratoryAcidosis { severe: true }
        );
        let s = &out.updated_settings;
        assert_eq!(s.pip, Some(22.0));
        assert_eq!(s.respiratory_rate, Some(45.0));
        assert_eq!(s.fio2, Some(60.0));
        assert_eq!(s.peep, Some(7.0));
        assert_eq!(s.mvent, None);
    }

    #[test]
    fn test_infant_severe_metabolic_acidosis_label() {
        let i = AbgInterpreter::classify(
            &AbgValues::new(7.20, 30.0, 70.0, 18.0),
            ClinicalProtocol::for_class(AgeClass::Infant),
        );
        assert_eq!(i.disorder, AcidBaseDisorder::MetabolicAcidosis { severe: false });

        let severe = ClinicalProtocol::for_class(AgeClass::Infant);
        let i = AbgInterpreter::classify(&AbgValues::new(7.20, 25.0, 70.0, 15.0), severe);
        assert_eq!(i.disorder, AcidBaseDisorder::MetabolicAcidosis { severe: true });
        assert!(i.text().starts_with("severe metabolic acidosis (elevated anion gap"));
    }

    #[test]
    fn test_hfov_raises_mean_airway_pressure() {
        let fx = newborn(ModeId::Hfov);
        let out = run(&fx, AbgValues::new(7.40, 40.0, 55.0, 24.0));

        let s = &out.updated_settings;
        assert_eq!(s.mean_airway_pressure, Some(13.0));
        assert_eq!(s.fio2, Some(50.0));
        assert_eq!(s.peep, None);
    }

    #[test]
    fn test_invalid_weight_is_an_error() {
        let fx = child(ModeId::Simv);
        for weight in [-1.0, 0.0, f64::NAN] {
            let result = AbgInterpreter::interpret(
                &AbgValues::new(7.25, 55.0, 55.0, 24.0),
                &fx.settings,
                &fx.mode,
                weight,
                ped(),
            );
            assert!(matches!(result, Err(ConfigurationError::InvalidWeight(_))));
        }
    }

    #[test]
    fn test_inverted_bounds_are_an_error() {
        let mut fx = child(ModeId::Simv);
        for p in &mut fx.mode.editable_parameters {
            if p.key == ParamKey::RespiratoryRate {
                p.kind = ParameterKind::Numeric {
                    min: 35.0,
                    max: 8.0,
                    step: 1.0,
                };
            }
        }
        let result = AbgInterpreter::interpret(
            &AbgValues::new(7.25, 55.0, 55.0, 24.0),
            &fx.settings,
            &fx.mode,
            fx.profile.weight_kg,
            ped(),
        );
        assert_eq!(
            result.expect_err("Should reject inverted bounds"),
            ConfigurationError::InvalidBounds {
                key: ParamKey::RespiratoryRate
            }
        );
    }

    #[test]
    fn test_extreme_panels_stay_within_bounds() {
        let values = [
            AbgValues::new(6.8, 100.0, 30.0, 10.0),
            AbgValues::new(7.8, 20.0, 300.0, 40.0),
            AbgValues::new(7.0, 90.0, 35.0, 12.0),
            AbgValues::new(7.7, 22.0, 250.0, 38.0),
        ];
        let fixtures = [
            child(ModeId::Simv),
            child(ModeId::Prvc),
            child(ModeId::Cpap),
            newborn(ModeId::Pcv),
            newborn(ModeId::Vcv),
            newborn(ModeId::Simv),
        ];

        for fx in &fixtures {
            let mut settings = fx.settings.clone();
            // Feed each result back in to push values towards the limits
            for _ in 0..6 {
                for v in &values {
                    let out = AbgInterpreter::interpret(
                        v,
                        &settings,
                        &fx.mode,
                        fx.profile.weight_kg,
                        ClinicalProtocol::for_class(fx.profile.age_class()),
                    )
                    .expect("Should interpret");
                    settings = out.updated_settings;

                    for key in [ParamKey::Fio2, ParamKey::Peep, ParamKey::RespiratoryRate] {
                        if let (Some((min, max)), Some(x)) =
                            (fx.mode.bounds(key), settings.number(key))
                        {
                            assert!(x >= min && x <= max, "{key}={x} outside {min}..{max}");
                        }
                    }
                    if let (Some(tv), Some(rr)) = (settings.tidal_volume, settings.respiratory_rate) {
                        assert_eq!(settings.mvent, Some(minute_ventilation(tv, rr)));
                    }
                }
            }
        }
    }
}
