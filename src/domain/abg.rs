//! Arterial blood gas panel types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::settings::parse_decimal;

/// The four fields of an ABG panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbgField {
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "pCO2")]
    PCo2,
    #[serde(rename = "pO2")]
    PO2,
    #[serde(rename = "HCO3")]
    Hco3,
}

impl AbgField {
    pub const ALL: [AbgField; 4] = [AbgField::Ph, AbgField::PCo2, AbgField::PO2, AbgField::Hco3];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::PCo2 => "pCO2",
            Self::PO2 => "pO2",
            Self::Hco3 => "HCO3",
        }
    }

    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Ph => "",
            Self::PCo2 | Self::PO2 => "mmHg",
            Self::Hco3 => "mEq/L",
        }
    }
}

impl fmt::Display for AbgField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed interval used for admissible and normal ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Where `value` falls relative to this range.
    #[must_use]
    pub fn status(&self, value: f64) -> RangeStatus {
        if value < self.min {
            RangeStatus::Low
        } else if value > self.max {
            RangeStatus::High
        } else {
            RangeStatus::Normal
        }
    }
}

/// One range per ABG field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbgRanges {
    pub ph: ValueRange,
    pub pco2: ValueRange,
    pub po2: ValueRange,
    pub hco3: ValueRange,
}

impl AbgRanges {
    #[must_use]
    pub fn get(&self, field: AbgField) -> ValueRange {
        match field {
            AbgField::Ph => self.ph,
            AbgField::PCo2 => self.pco2,
            AbgField::PO2 => self.po2,
            AbgField::Hco3 => self.hco3,
        }
    }
}

/// Normal physiologic ranges, identical for every age class.
pub const NORMAL_RANGES: AbgRanges = AbgRanges {
    ph: ValueRange::new(7.35, 7.45),
    pco2: ValueRange::new(35.0, 45.0),
    po2: ValueRange::new(80.0, 100.0),
    hco3: ValueRange::new(22.0, 26.0),
};

/// Position of a value relative to the normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStatus {
    Low,
    Normal,
    High,
}

impl fmt::Display for RangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Raw panel as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbgPanel {
    #[serde(rename = "pH")]
    pub ph: String,
    #[serde(rename = "pCO2")]
    pub pco2: String,
    #[serde(rename = "pO2")]
    pub po2: String,
    #[serde(rename = "HCO3")]
    pub hco3: String,
}

impl AbgPanel {
    /// Build a panel from four strings, in pH, pCO2, pO2, HCO3 order.
    #[must_use]
    pub fn new(ph: &str, pco2: &str, po2: &str, hco3: &str) -> Self {
        Self {
            ph: ph.to_string(),
            pco2: pco2.to_string(),
            po2: po2.to_string(),
            hco3: hco3.to_string(),
        }
    }

    #[must_use]
    pub fn raw(&self, field: AbgField) -> &str {
        match field {
            AbgField::Ph => &self.ph,
            AbgField::PCo2 => &self.pco2,
            AbgField::PO2 => &self.po2,
            AbgField::Hco3 => &self.hco3,
        }
    }

    pub fn raw_mut(&mut self, field: AbgField) -> &mut String {
        match field {
            AbgField::Ph => &mut self.ph,
            AbgField::PCo2 => &mut self.pco2,
            AbgField::PO2 => &mut self.po2,
            AbgField::Hco3 => &mut self.hco3,
        }
    }

    /// Parsed value of `field`; blank or malformed input is `None`.
    #[must_use]
    pub fn value(&self, field: AbgField) -> Option<f64> {
        parse_decimal(self.raw(field))
    }
}

/// A validated panel: every field present, finite and admissible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbgValues {
    pub ph: f64,
    pub pco2: f64,
    pub po2: f64,
    pub hco3: f64,
}

impl AbgValues {
    #[must_use]
    pub fn new(ph: f64, pco2: f64, po2: f64, hco3: f64) -> Self {
        Self { ph, pco2, po2, hco3 }
    }

    #[must_use]
    pub fn get(&self, field: AbgField) -> f64 {
        match field {
            AbgField::Ph => self.ph,
            AbgField::PCo2 => self.pco2,
            AbgField::PO2 => self.po2,
            AbgField::Hco3 => self.hco3,
        }
    }
}
