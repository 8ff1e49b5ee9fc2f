//! Alarm range calculator.
//!
//! Bands are derived from the settings on every call and never cached.

use crate::domain::{
    round_to, AlarmRange, AlarmRanges, ModeDefinition, ParamKey, VentilatorSettings,
};

/// Alarm band constants.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmConfig {
    /// Rate band half-width, breaths/min
    pub rr_offset: f64,
    pub rr_floor: f64,
    pub mvent_low_factor: f64,
    pub mvent_high_factor: f64,
    pub peep_low_offset: f64,
    pub peep_high_offset: f64,
    pub peep_floor: f64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            rr_offset: 10.0,
            rr_floor: 1.0,
            mvent_low_factor: 0.6,
            mvent_high_factor: 1.4,
            peep_low_offset: 2.0,
            peep_high_offset: 3.0,
            peep_floor: 0.0,
        }
    }
}

impl AlarmConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - VENTASSIST_ALARM_RR_OFFSET
    /// - VENTASSIST_ALARM_RR_FLOOR
    /// - VENTASSIST_ALARM_MVENT_LOW_FACTOR
    /// - VENTASSIST_ALARM_MVENT_HIGH_FACTOR
    /// - VENTASSIST_ALARM_PEEP_LOW_OFFSET
    /// - VENTASSIST_ALARM_PEEP_HIGH_OFFSET
    /// - VENTASSIST_ALARM_PEEP_FLOOR
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        let overrides: [(&str, &mut f64); 7] = [
            ("VENTASSIST_ALARM_RR_OFFSET", &mut cfg.rr_offset),
            ("VENTASSIST_ALARM_RR_FLOOR", &mut cfg.rr_floor),
            ("VENTASSIST_ALARM_MVENT_LOW_FACTOR", &mut cfg.mvent_low_factor),
            ("VENTASSIST_ALARM_MVENT_HIGH_FACTOR", &mut cfg.mvent_high_factor),
            ("VENTASSIST_ALARM_PEEP_LOW_OFFSET", &mut cfg.peep_low_offset),
            ("VENTASSIST_ALARM_PEEP_HIGH_OFFSET", &mut cfg.peep_high_offset),
            ("VENTASSIST_ALARM_PEEP_FLOOR", &mut cfg.peep_floor),
        ];

        for (name, slot) in overrides {
            if let Ok(raw) = std::env::var(name) {
                match parse_override(&raw) {
                    Some(x) => *slot = x,
                    None => tracing::warn!("Ignoring invalid {}={:?}", name, raw),
                }
            }
        }

        if cfg.mvent_low_factor > cfg.mvent_high_factor {
            tracing::warn!("Minute ventilation alarm factors inverted; using defaults");
            let defaults = Self::default();
            cfg.mvent_low_factor = defaults.mvent_low_factor;
            cfg.mvent_high_factor = defaults.mvent_high_factor;
        }

        cfg
    }
}

fn parse_override(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite() && *x >= 0.0)
}

/// Computes alarm bands around the active settings.
#[derive(Debug, Clone, Default)]
pub struct AlarmRangeCalculator {
    config: AlarmConfig,
}

impl AlarmRangeCalculator {
    #[must_use]
    pub fn new(config: AlarmConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Bands for rate, minute ventilation and PEEP. A band is omitted when
    /// its parameter is absent from `settings`.
    #[must_use]
    pub fn compute(&self, settings: &VentilatorSettings) -> AlarmRanges {
        let c = &self.config;

        AlarmRanges {
            respiratory_rate: settings.respiratory_rate.map(|rr| {
                band(
                    ParamKey::RespiratoryRate,
                    rr,
                    (rr - c.rr_offset).max(c.rr_floor),
                    rr + c.rr_offset,
                )
            }),
            mvent: settings.mvent.map(|mv| {
                band(
                    ParamKey::Mvent,
                    mv,
                    mv * c.mvent_low_factor,
                    mv * c.mvent_high_factor,
                )
            }),
            peep: settings.peep.map(|peep| {
                band(
                    ParamKey::Peep,
                    peep,
                    (peep - c.peep_low_offset).max(c.peep_floor),
                    peep + c.peep_high_offset,
                )
            }),
        }
    }

    /// Bands for the parameters `mode` defines. Keys left over from an
    /// earlier mode produce no band.
    #[must_use]
    pub fn compute_for_mode(
        &self,
        settings: &VentilatorSettings,
        mode: &ModeDefinition,
    ) -> AlarmRanges {
        let all = self.compute(settings);
        AlarmRanges {
            respiratory_rate: all
                .respiratory_rate
                .filter(|_| mode.defines(ParamKey::RespiratoryRate)),
            mvent: all.mvent.filter(|_| mode.defines(ParamKey::Mvent)),
            peep: all.peep.filter(|_| mode.defines(ParamKey::Peep)),
        }
    }
}

fn band(key: ParamKey, current: f64, low: f64, high: f64) -> AlarmRange {
    let p = key.precision();
    AlarmRange {
        low: round_to(low, p),
        high: round_to(high, p),
        current,
        unit: key.unit().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::BuiltinModeCatalog;
    use crate::domain::{AgeClass, ModeId};
    use crate::ports::ModeCatalog;

    fn settings(rr: f64, tv: f64, peep: f64) -> VentilatorSettings {
        let mut s = VentilatorSettings::empty(ModeId::Simv);
        s.respiratory_rate = Some(rr);
        s.tidal_volume = Some(tv);
        s.peep = Some(peep);
        s.refresh_derived();
        s
    }

    #[test]
    fn test_default_bands() {
        let ranges = AlarmRangeCalculator::default().compute(&settings(12.0, 60.0, 5.0));

        let rr = ranges.respiratory_rate.expect("Should have a rate band");
        assert_eq!((rr.low, rr.high, rr.current), (2.0, 22.0, 12.0));
        assert_eq!(rr.unit, "/min");

        let mv = ranges.mvent.expect("Should have an mvent band");
        assert_eq!((mv.low, mv.high), (0.43, 1.01));

        let peep = ranges.peep.expect("Should have a peep band");
        assert_eq!((peep.low, peep.high), (3.0, 8.0));
    }

    #[test]
    fn test_floors_apply() {
        let ranges = AlarmRangeCalculator::default().compute(&settings(8.0, 40.0, 1.5));
        assert_eq!(ranges.respiratory_rate.expect("Should have a rate band").low, 1.0);
        assert_eq!(ranges.peep.expect("Should have a peep band").low, 0.0);
    }

    #[test]
    fn test_absent_parameters_have_no_band() {
        let mut s = VentilatorSettings::empty(ModeId::Cpap);
        s.cpap = Some(6.0);
        let ranges = AlarmRangeCalculator::default().compute(&s);
        assert!(ranges.entries().is_empty());
    }

    #[test]
    fn test_stale_keys_have_no_band() {
        let catalog = BuiltinModeCatalog::new();
        let cpap = catalog
            .get(AgeClass::Pediatric, ModeId::Cpap, 10.0)
            .expect("Should find CPAP");
        let mut s = settings(12.0, 60.0, 5.0);
        s.mode = ModeId::Cpap;
        s.cpap = Some(8.0);

        let calc = AlarmRangeCalculator::default();
        assert_eq!(calc.compute(&s).entries().len(), 3);
        assert!(calc.compute_for_mode(&s, &cpap).entries().is_empty());

        let simv = catalog
            .get(AgeClass::Pediatric, ModeId::Simv, 10.0)
            .expect("Should find SIMV");
        assert_eq!(
            calc.compute_for_mode(&settings(12.0, 60.0, 5.0), &simv),
            calc.compute(&settings(12.0, 60.0, 5.0))
        );
    }

    #[test]
    fn test_bands_follow_settings() {
        let calc = AlarmRangeCalculator::default();
        let before = calc.compute(&settings(12.0, 60.0, 5.0));
        let after = calc.compute(&settings(16.0, 70.0, 7.0));
        assert_ne!(before, after);
        assert_eq!(after.respiratory_rate.expect("Should have a rate band").high, 26.0);
    }

    #[test]
    fn test_custom_config() {
        let calc = AlarmRangeCalculator::new(AlarmConfig {
            rr_offset: 5.0,
            ..AlarmConfig::default()
        });
        let rr = calc
            .compute(&settings(12.0, 60.0, 5.0))
            .respiratory_rate
            .expect("Should have a rate band");
        assert_eq!((rr.low, rr.high), (7.0, 17.0));
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override(" 4.5 "), Some(4.5));
        assert_eq!(parse_override("-1"), None);
        assert_eq!(parse_override("NaN"), None);
        assert_eq!(parse_override("ten"), None);
    }
}
