//! Ventilator settings record.
//!
//! One flat record serves every mode; each mode populates a subset of the
//! fields and leaves the rest `None`:
//!
//! | mode   | populated keys                                                       |
//! |--------|----------------------------------------------------------------------|
//! | SIMV   | tidalVolume, respiratoryRate, fio2, peep, ieRatio, pressureSupport, ti, trigger |
//! | PRVC   | tidalVolume, respiratoryRate, fio2, peep, ieRatio, ti                |
//! | VCV    | tidalVolume, respiratoryRate, fio2, peep, ieRatio, flowRate          |
//! | PCV    | pip, respiratoryRate, fio2, peep, ieRatio, ti                        |
//! | CPAP   | cpap, fio2, pressureSupport                                          |
//! | PSV    | pressureSupport, fio2, peep                                          |
//! | HFOV   | map, amplitude, frequency, fio2, inspiratoryPercent                  |
//! | DuoPAP | pHigh, pLow, timeHigh, timeLow, fio2                                 |
//!
//! Switching modes overlays the new mode's defaults, so keys from a previous
//! mode may linger. `mvent`, `vti` and `vte` are derived and never edited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::mode::{ConfigurationError, ModeId};

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Minute ventilation in L/min, rounded to two decimals.
#[must_use]
pub fn minute_ventilation(tidal_volume_ml: f64, respiratory_rate: f64) -> f64 {
    round_to(tidal_volume_ml * respiratory_rate / 1000.0, 2)
}

/// Parse a decimal string. Empty, malformed and non-finite input is absent.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a number with at most `decimals` places, dropping trailing zeros.
#[must_use]
pub fn format_number(value: f64, decimals: u32) -> String {
    let s = format!("{:.*}", decimals as usize, value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Inspiratory to expiratory time ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IeRatio {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:1.5")]
    OneToOneAndHalf,
    #[serde(rename = "1:2")]
    OneToTwo,
    #[serde(rename = "1:2.5")]
    OneToTwoAndHalf,
    #[serde(rename = "1:3")]
    OneToThree,
    #[serde(rename = "1:3.5")]
    OneToThreeAndHalf,
    #[serde(rename = "1:4")]
    OneToFour,
}

impl IeRatio {
    pub const ALL: [IeRatio; 7] = [
        IeRatio::OneToOne,
        IeRatio::OneToOneAndHalf,
        IeRatio::OneToTwo,
        IeRatio::OneToTwoAndHalf,
        IeRatio::OneToThree,
        IeRatio::OneToThreeAndHalf,
        IeRatio::OneToFour,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToOneAndHalf => "1:1.5",
            Self::OneToTwo => "1:2",
            Self::OneToTwoAndHalf => "1:2.5",
            Self::OneToThree => "1:3",
            Self::OneToThreeAndHalf => "1:3.5",
            Self::OneToFour => "1:4",
        }
    }
}

impl fmt::Display for IeRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IeRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown I:E ratio '{s}'"))
    }
}

/// Names of the parameters a settings record can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    TidalVolume,
    RespiratoryRate,
    Fio2,
    Peep,
    IeRatio,
    Pip,
    PressureSupport,
    Cpap,
    FlowRate,
    #[serde(rename = "ti")]
    InspiratoryTime,
    Trigger,
    #[serde(rename = "map")]
    MeanAirwayPressure,
    Amplitude,
    Frequency,
    InspiratoryPercent,
    #[serde(rename = "pHigh")]
    PHigh,
    #[serde(rename = "pLow")]
    PLow,
    TimeHigh,
    TimeLow,
    Mvent,
    Vti,
    Vte,
}

impl ParamKey {
    pub const ALL: [ParamKey; 22] = [
        ParamKey::TidalVolume,
        ParamKey::RespiratoryRate,
        ParamKey::Fio2,
        ParamKey::Peep,
        ParamKey::IeRatio,
        ParamKey::Pip,
        ParamKey::PressureSupport,
        ParamKey::Cpap,
        ParamKey::FlowRate,
        ParamKey::InspiratoryTime,
        ParamKey::Trigger,
        ParamKey::MeanAirwayPressure,
        ParamKey::Amplitude,
        ParamKey::Frequency,
        ParamKey::InspiratoryPercent,
        ParamKey::PHigh,
        ParamKey::PLow,
        ParamKey::TimeHigh,
        ParamKey::TimeLow,
        ParamKey::Mvent,
        ParamKey::Vti,
        ParamKey::Vte,
    ];

    /// Wire name, as used in serialized settings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TidalVolume => "tidalVolume",
            Self::RespiratoryRate => "respiratoryRate",
            Self::Fio2 => "fio2",
            Self::Peep => "peep",
            Self::IeRatio => "ieRatio",
            Self::Pip => "pip",
            Self::PressureSupport => "pressureSupport",
            Self::Cpap => "cpap",
            Self::FlowRate => "flowRate",
            Self::InspiratoryTime => "ti",
            Self::Trigger => "trigger",
            Self::MeanAirwayPressure => "map",
            Self::Amplitude => "amplitude",
            Self::Frequency => "frequency",
            Self::InspiratoryPercent => "inspiratoryPercent",
            Self::PHigh => "pHigh",
            Self::PLow => "pLow",
            Self::TimeHigh => "timeHigh",
            Self::TimeLow => "timeLow",
            Self::Mvent => "mvent",
            Self::Vti => "vti",
            Self::Vte => "vte",
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::TidalVolume => "Tidal Volume",
            Self::RespiratoryRate => "Respiratory Rate",
            Self::Fio2 => "FiO2",
            Self::Peep => "PEEP",
            Self::IeRatio => "I:E Ratio",
            Self::Pip => "PIP",
            Self::PressureSupport => "Pressure Support",
            Self::Cpap => "CPAP Level",
            Self::FlowRate => "Flow Rate",
            Self::InspiratoryTime => "Ti",
            Self::Trigger => "Trigger",
            Self::MeanAirwayPressure => "Mean Airway Pressure",
            Self::Amplitude => "Amplitude",
            Self::Frequency => "Frequency",
            Self::InspiratoryPercent => "Inspiratory Time",
            Self::PHigh => "P High",
            Self::PLow => "P Low",
            Self::TimeHigh => "T High",
            Self::TimeLow => "T Low",
            Self::Mvent => "Minute Ventilation",
            Self::Vti => "VTi",
            Self::Vte => "VTe",
        }
    }

    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::TidalVolume | Self::Vti | Self::Vte => "ml",
            Self::RespiratoryRate => "/min",
            Self::Fio2 | Self::InspiratoryPercent => "%",
            Self::Peep
            | Self::Pip
            | Self::PressureSupport
            | Self::Cpap
            | Self::Trigger
            | Self::MeanAirwayPressure
            | Self::PHigh
            | Self::PLow => "cmH2O",
            Self::Amplitude => "ΔP",
            Self::Frequency => "Hz",
            Self::FlowRate | Self::Mvent => "L/min",
            Self::InspiratoryTime | Self::TimeHigh | Self::TimeLow => "s",
            Self::IeRatio => "",
        }
    }

    /// Decimal places the parameter is displayed and rounded with.
    #[must_use]
    pub fn precision(&self) -> u32 {
        match self {
            Self::RespiratoryRate | Self::Fio2 | Self::FlowRate | Self::Trigger => 0,
            Self::Amplitude | Self::Frequency | Self::InspiratoryPercent => 0,
            Self::Mvent | Self::TimeHigh | Self::TimeLow => 2,
            _ => 1,
        }
    }

    /// Derived keys are computed from other fields and never edited.
    #[must_use]
    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Mvent | Self::Vti | Self::Vte)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "inspiratoryTime" => return Ok(Self::InspiratoryTime),
            "it" => return Ok(Self::InspiratoryPercent),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown parameter '{s}'"))
    }
}

/// A parameter value: numeric, or an I:E ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Ratio(IeRatio),
}

impl ParamValue {
    /// Parse user input for `key`. Empty or malformed input is absent.
    #[must_use]
    pub fn parse(key: ParamKey, raw: &str) -> Option<Self> {
        if key == ParamKey::IeRatio {
            raw.parse::<IeRatio>().ok().map(Self::Ratio)
        } else {
            parse_decimal(raw).map(Self::Number)
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Ratio(_) => None,
        }
    }

    /// Render with the precision `key` uses.
    #[must_use]
    pub fn display_for(&self, key: ParamKey) -> String {
        match self {
            Self::Number(n) => format_number(*n, key.precision()),
            Self::Ratio(r) => r.to_string(),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<IeRatio> for ParamValue {
    fn from(value: IeRatio) -> Self {
        Self::Ratio(value)
    }
}

/// One field that differs between two settings records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingChange {
    pub key: ParamKey,
    pub before: Option<ParamValue>,
    pub after: Option<ParamValue>,
}

/// Keys reported in the "applied changes" summary.
pub const SUMMARY_KEYS: [ParamKey; 6] = [
    ParamKey::RespiratoryRate,
    ParamKey::TidalVolume,
    ParamKey::Pip,
    ParamKey::Fio2,
    ParamKey::Peep,
    ParamKey::Mvent,
];

/// Active ventilator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentilatorSettings {
    pub mode: ModeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tidal_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fio2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peep: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ie_ratio: Option<IeRatio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_support: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    #[serde(default, rename = "ti", skip_serializing_if = "Option::is_none")]
    pub inspiratory_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<f64>,

    // HFOV
    #[serde(default, rename = "map", skip_serializing_if = "Option::is_none")]
    pub mean_airway_pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspiratory_percent: Option<f64>,

    // DuoPAP
    #[serde(default, rename = "pHigh", skip_serializing_if = "Option::is_none")]
    pub p_high: Option<f64>,
    #[serde(default, rename = "pLow", skip_serializing_if = "Option::is_none")]
    pub p_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_low: Option<f64>,

    /// Minute ventilation (L/min), derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mvent: Option<f64>,
    /// Inspired tidal volume (ml), mirrors `tidal_volume`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vti: Option<f64>,
    /// Expected exhaled tidal volume (ml), weight-based
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vte: Option<f64>,
}

impl VentilatorSettings {
    /// An empty record for `mode`.
    #[must_use]
    pub fn empty(mode: ModeId) -> Self {
        Self {
            mode,
            tidal_volume: None,
            respiratory_rate: None,
            fio2: None,
            peep: None,
            ie_ratio: None,
            pip: None,
            pressure_support: None,
            cpap: None,
            flow_rate: None,
            inspiratory_time: None,
            trigger: None,
            mean_airway_pressure: None,
            amplitude: None,
            frequency: None,
            inspiratory_percent: None,
            p_high: None,
            p_low: None,
            time_high: None,
            time_low: None,
            mvent: None,
            vti: None,
            vte: None,
        }
    }

    fn number_slot(&self, key: ParamKey) -> Option<&Option<f64>> {
        Some(match key {
            ParamKey::TidalVolume => &self.tidal_volume,
            ParamKey::RespiratoryRate => &self.respiratory_rate,
            ParamKey::Fio2 => &self.fio2,
            ParamKey::Peep => &self.peep,
            ParamKey::Pip => &self.pip,
            ParamKey::PressureSupport => &self.pressure_support,
            ParamKey::Cpap => &self.cpap,
            ParamKey::FlowRate => &self.flow_rate,
            ParamKey::InspiratoryTime => &self.inspiratory_time,
            ParamKey::Trigger => &self.trigger,
            ParamKey::MeanAirwayPressure => &self.mean_airway_pressure,
            ParamKey::Amplitude => &self.amplitude,
            ParamKey::Frequency => &self.frequency,
            ParamKey::InspiratoryPercent => &self.inspiratory_percent,
            ParamKey::PHigh => &self.p_high,
            ParamKey::PLow => &self.p_low,
            ParamKey::TimeHigh => &self.time_high,
            ParamKey::TimeLow => &self.time_low,
            ParamKey::Mvent => &self.mvent,
            ParamKey::Vti => &self.vti,
            ParamKey::Vte => &self.vte,
            ParamKey::IeRatio => return None,
        })
    }

    fn number_slot_mut(&mut self, key: ParamKey) -> Option<&mut Option<f64>> {
        Some(match key {
            ParamKey::TidalVolume => &mut self.tidal_volume,
            ParamKey::RespiratoryRate => &mut self.respiratory_rate,
            ParamKey::Fio2 => &mut self.fio2,
            ParamKey::Peep => &mut self.peep,
            ParamKey::Pip => &mut self.pip,
            ParamKey::PressureSupport => &mut self.pressure_support,
            ParamKey::Cpap => &mut self.cpap,
            ParamKey::FlowRate => &mut self.flow_rate,
            ParamKey::InspiratoryTime => &mut self.inspiratory_time,
            ParamKey::Trigger => &mut self.trigger,
            ParamKey::MeanAirwayPressure => &mut self.mean_airway_pressure,
            ParamKey::Amplitude => &mut self.amplitude,
            ParamKey::Frequency => &mut self.frequency,
            ParamKey::InspiratoryPercent => &mut self.inspiratory_percent,
            ParamKey::PHigh => &mut self.p_high,
            ParamKey::PLow => &mut self.p_low,
            ParamKey::TimeHigh => &mut self.time_high,
            ParamKey::TimeLow => &mut self.time_low,
            ParamKey::Mvent => &mut self.mvent,
            ParamKey::Vti => &mut self.vti,
            ParamKey::Vte => &mut self.vte,
            ParamKey::IeRatio => return None,
        })
    }

    /// Numeric value of `key`, if present.
    #[must_use]
    pub fn number(&self, key: ParamKey) -> Option<f64> {
        self.number_slot(key).copied().flatten()
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: ParamKey) -> Option<ParamValue> {
        match key {
            ParamKey::IeRatio => self.ie_ratio.map(ParamValue::Ratio),
            _ => self.number(key).map(ParamValue::Number),
        }
    }

    /// Set (or clear, with `None`) a numeric field.
    ///
    /// # Errors
    /// Returns `ConfigurationError::ValueKind` for the I:E ratio key.
    pub fn set_number(&mut self, key: ParamKey, value: Option<f64>) -> Result<(), ConfigurationError> {
        let slot = self
            .number_slot_mut(key)
            .ok_or(ConfigurationError::ValueKind { key })?;
        *slot = value;
        Ok(())
    }

    /// Set (or clear, with `None`) any field.
    ///
    /// # Errors
    /// Returns `ConfigurationError::ValueKind` if the value kind does not fit the key.
    pub fn set(&mut self, key: ParamKey, value: Option<ParamValue>) -> Result<(), ConfigurationError> {
        match (key, value) {
            (ParamKey::IeRatio, Some(ParamValue::Ratio(r))) => {
                self.ie_ratio = Some(r);
                Ok(())
            }
            (ParamKey::IeRatio, None) => {
                self.ie_ratio = None;
                Ok(())
            }
            (ParamKey::IeRatio, Some(ParamValue::Number(_))) | (_, Some(ParamValue::Ratio(_))) => {
                Err(ConfigurationError::ValueKind { key })
            }
            (_, Some(ParamValue::Number(n))) => self.set_number(key, Some(n)),
            (_, None) => self.set_number(key, None),
        }
    }

    /// Keys currently holding a value, in `ParamKey::ALL` order.
    #[must_use]
    pub fn present_keys(&self) -> Vec<ParamKey> {
        ParamKey::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_some())
            .collect()
    }

    /// Recompute `mvent` and `vti` from tidal volume and rate.
    pub fn refresh_derived(&mut self) {
        self.mvent = match (self.tidal_volume, self.respiratory_rate) {
            (Some(tv), Some(rr)) => Some(minute_ventilation(tv, rr)),
            _ => None,
        };
        self.vti = self.tidal_volume;
    }

    /// Summary keys whose values differ from `baseline`.
    #[must_use]
    pub fn changes_from(&self, baseline: &VentilatorSettings) -> Vec<SettingChange> {
        SUMMARY_KEYS
            .into_iter()
            .filter_map(|key| {
                let before = baseline.get(key);
                let after = self.get(key);
                (before != after).then_some(SettingChange { key, before, after })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_ventilation_rounding() {
        assert!((minute_ventilation(60.0, 12.0) - 0.72).abs() < f64::EPSILON);
        assert!((minute_ventilation(36.0, 35.0) - 1.26).abs() < 1e-9);
        assert!((minute_ventilation(33.3, 30.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_decimal_treats_garbage_as_absent() {
        assert_eq!(parse_decimal("7.4"), Some(7.4));
        assert_eq!(parse_decimal("  12 "), Some(12.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut s = VentilatorSettings::empty(ModeId::Simv);
        s.set(ParamKey::Peep, Some(ParamValue::Number(6.0))).expect("Should set numeric key");
        s.set(ParamKey::IeRatio, Some(IeRatio::OneToTwo.into())).expect("Should set ratio key");

        assert_eq!(s.number(ParamKey::Peep), Some(6.0));
        assert_eq!(s.get(ParamKey::IeRatio), Some(ParamValue::Ratio(IeRatio::OneToTwo)));
        assert!(s.set(ParamKey::IeRatio, Some(ParamValue::Number(2.0))).is_err());
        assert!(s.set(ParamKey::Fio2, Some(IeRatio::OneToOne.into())).is_err());

        s.set(ParamKey::Peep, None).expect("Should clear");
        assert_eq!(s.get(ParamKey::Peep), None);
    }

    #[test]
    fn test_refresh_derived() {
        let mut s = VentilatorSettings::empty(ModeId::Simv);
        s.tidal_volume = Some(60.0);
        s.refresh_derived();
        assert_eq!(s.mvent, None);
        assert_eq!(s.vti, Some(60.0));

        s.respiratory_rate = Some(20.0);
        s.refresh_derived();
        assert_eq!(s.mvent, Some(1.2));
    }

    #[test]
    fn test_serialized_key_names() {
        let mut s = VentilatorSettings::empty(ModeId::Simv);
        s.tidal_volume = Some(60.0);
        s.inspiratory_time = Some(0.8);
        s.ie_ratio = Some(IeRatio::OneToOneAndHalf);

        let json = serde_json::to_value(&s).expect("Should serialize");
        assert_eq!(json["mode"], "SIMV");
        assert_eq!(json["tidalVolume"], 60.0);
        assert_eq!(json["ti"], 0.8);
        assert_eq!(json["ieRatio"], "1:1.5");
        assert!(json.get("peep").is_none());
    }

    #[test]
    fn test_changes_from_baseline() {
        let mut before = VentilatorSettings::empty(ModeId::Simv);
        before.respiratory_rate = Some(12.0);
        before.fio2 = Some(40.0);

        let mut after = before.clone();
        after.respiratory_rate = Some(16.0);

        let changes = after.changes_from(&before);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].key, ParamKey::RespiratoryRate);
        assert_eq!(changes[0].after, Some(ParamValue::Number(16.0)));
    }

    #[test]
    fn test_param_key_names_round_trip() {
        for key in ParamKey::ALL {
            assert_eq!(key.as_str().parse::<ParamKey>().ok(), Some(key));
        }
        assert_eq!("inspiratoryTime".parse::<ParamKey>().ok(), Some(ParamKey::InspiratoryTime));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(60.0, 1), "60");
        assert_eq!(format_number(0.72, 2), "0.72");
        assert_eq!(format_number(5.5, 1), "5.5");
        assert_eq!(format_number(12.0, 0), "12");
    }
}
