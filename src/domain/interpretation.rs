//! Acid-base and oxygenation findings.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::settings::VentilatorSettings;

/// Primary acid-base finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcidBaseDisorder {
    Normal,
    RespiratoryAcidosis { severe: bool },
    MetabolicAcidosis { severe: bool },
    RespiratoryAlkalosis,
    MetabolicAlkalosis,
    /// Normal pH with high pCO2 and high HCO3
    MixedMetabolicAlkalosisRespiratoryAcidosis,
    /// Normal pH with low pCO2 and low HCO3
    MixedMetabolicAcidosisRespiratoryAlkalosis,
    UnclassifiedAcidemia,
    UnclassifiedAlkalemia,
}

impl AcidBaseDisorder {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal ABG",
            Self::RespiratoryAcidosis { severe: false } => "respiratory acidosis",
            Self::RespiratoryAcidosis { severe: true } => "severe respiratory acidosis",
            Self::MetabolicAcidosis { severe: false } => "metabolic acidosis",
            Self::MetabolicAcidosis { severe: true } => "severe metabolic acidosis",
            Self::RespiratoryAlkalosis => "respiratory alkalosis",
            Self::MetabolicAlkalosis => "metabolic alkalosis",
            Self::MixedMetabolicAlkalosisRespiratoryAcidosis => {
                "mixed disorder: compensated metabolic alkalosis with respiratory acidosis"
            }
            Self::MixedMetabolicAcidosisRespiratoryAlkalosis => {
                "mixed disorder: compensated metabolic acidosis with respiratory alkalosis"
            }
            Self::UnclassifiedAcidemia => "unclassified acidemia",
            Self::UnclassifiedAlkalemia => "unclassified alkalemia",
        }
    }

    #[must_use]
    pub fn is_metabolic_acidosis(&self) -> bool {
        matches!(self, Self::MetabolicAcidosis { .. })
    }

    /// Findings that call for more ventilation.
    #[must_use]
    pub fn needs_more_ventilation(&self) -> bool {
        matches!(self, Self::RespiratoryAcidosis { .. })
    }

    /// Findings that call for less ventilation.
    #[must_use]
    pub fn needs_less_ventilation(&self) -> bool {
        matches!(self, Self::RespiratoryAlkalosis)
    }
}

impl fmt::Display for AcidBaseDisorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Secondary system's response to the primary disorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Compensation {
    Uncompensated,
    Acute,
    Chronic,
    ConcurrentRespiratoryAcidosis,
    ConcurrentRespiratoryAlkalosis,
    Appropriate,
}

impl Compensation {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uncompensated => "uncompensated",
            Self::Acute => "acute",
            Self::Chronic => "chronic",
            Self::ConcurrentRespiratoryAcidosis => "with concurrent respiratory acidosis",
            Self::ConcurrentRespiratoryAlkalosis => "with concurrent respiratory alkalosis",
            Self::Appropriate => "appropriately compensated",
        }
    }
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anion gap assessment, only made for metabolic acidosis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnionGap {
    pub gap: f64,
    pub elevated: bool,
}

impl AnionGap {
    /// Assumed sodium and chloride when no electrolytes are available.
    pub const SODIUM: f64 = 140.0;
    pub const CHLORIDE: f64 = 104.0;
    pub const UPPER_NORMAL: f64 = 12.0;

    #[must_use]
    pub fn from_hco3(hco3: f64) -> Self {
        let gap = Self::SODIUM - Self::CHLORIDE - hco3;
        Self {
            gap,
            elevated: gap > Self::UPPER_NORMAL,
        }
    }

    #[must_use]
    pub fn note(&self) -> &'static str {
        if self.elevated {
            "elevated anion gap, consider fixed-acid etiology"
        } else {
            "normal anion gap, consider HCO3 loss etiology"
        }
    }
}

/// Oxygenation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Oxygenation {
    SevereHypoxemia,
    Hypoxemia,
    Normal,
    Good,
}

impl Oxygenation {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SevereHypoxemia => "severe hypoxemia",
            Self::Hypoxemia => "hypoxemia",
            Self::Normal => "normal",
            Self::Good => "good oxygenation",
        }
    }
}

impl fmt::Display for Oxygenation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Combined findings for one panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    pub disorder: AcidBaseDisorder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<Compensation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anion_gap: Option<AnionGap>,
    pub oxygenation: Oxygenation,
}

impl Interpretation {
    /// Text shown to the user:
    /// `label[ (anion gap note)][ - compensation][ - oxygenation]`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.disorder.label().to_string();
        if let Some(gap) = &self.anion_gap {
            text.push_str(" (");
            text.push_str(gap.note());
            text.push(')');
        }
        if let Some(comp) = &self.compensation {
            text.push_str(" - ");
            text.push_str(comp.label());
        }
        if self.oxygenation != Oxygenation::Normal {
            text.push_str(" - ");
            text.push_str(self.oxygenation.label());
        }
        text
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Result of interpreting a panel against the current settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretationOutcome {
    pub interpretation: Interpretation,
    pub interpretation_text: String,
    pub updated_settings: VentilatorSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_composition() {
        let normal = Interpretation {
            disorder: AcidBaseDisorder::Normal,
            compensation: None,
            anion_gap: None,
            oxygenation: Oxygenation::Normal,
        };
        assert_eq!(normal.text(), "normal ABG");

        let full = Interpretation {
            disorder: AcidBaseDisorder::MetabolicAcidosis { severe: false },
            compensation: Some(Compensation::Appropriate),
            anion_gap: Some(AnionGap::from_hco3(14.0)),
            oxygenation: Oxygenation::Hypoxemia,
        };
        assert_eq!(
            full.text(),
            "metabolic acidosis (elevated anion gap, consider fixed-acid etiology) - appropriately compensated - hypoxemia"
        );
    }

    #[test]
    fn test_anion_gap_threshold() {
        // 140 - 104 - 24 = 12 is not elevated
        let gap = AnionGap::from_hco3(24.0);
        assert!((gap.gap - 12.0).abs() < 1e-9);
        assert!(!gap.elevated);
        assert!(AnionGap::from_hco3(23.0).elevated);
    }
}
