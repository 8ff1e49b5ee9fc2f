//! Patient intake types.
//!
//! A `PatientProfile` is handed over by the intake form once it validates and
//! is treated as immutable for the rest of the session.
//!
//! Only weight and age class feed the settings and ABG rules. Disease
//! category and lung involvement are recorded for display and for the
//! assessment report; no computed setting depends on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Patients younger than this many months use the infant protocol.
pub const INFANT_MAX_AGE_MONTHS: f64 = 2.0;

/// Unit the age was entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Days,
    #[default]
    Months,
    Years,
}

impl AgeUnit {
    /// All units, in the order the intake form cycles through them.
    pub const ALL: [AgeUnit; 3] = [AgeUnit::Days, AgeUnit::Months, AgeUnit::Years];

    /// Convert an age in this unit to months.
    #[must_use]
    pub fn to_months(self, value: f64) -> f64 {
        match self {
            Self::Days => value / 30.0,
            Self::Months => value,
            Self::Years => value * 12.0,
        }
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days => write!(f, "days"),
            Self::Months => write!(f, "months"),
            Self::Years => write!(f, "years"),
        }
    }
}

/// Age class selecting which clinical protocol and mode catalog apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeClass {
    Infant,
    Pediatric,
}

impl AgeClass {
    /// Classify an age. Anything under two months is an infant.
    #[must_use]
    pub fn from_age(value: f64, unit: AgeUnit) -> Self {
        if unit.to_months(value) < INFANT_MAX_AGE_MONTHS {
            Self::Infant
        } else {
            Self::Pediatric
        }
    }
}

impl fmt::Display for AgeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infant => write!(f, "infant"),
            Self::Pediatric => write!(f, "pediatric"),
        }
    }
}

/// Dominant mechanical pattern of the lung disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LungInvolvement {
    Normal,
    Obstructive,
    Restrictive,
}

impl fmt::Display for LungInvolvement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Obstructive => write!(f, "obstructive"),
            Self::Restrictive => write!(f, "restrictive"),
        }
    }
}

/// Disease category selected at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiseaseCategory {
    Ards,
    Asthma,
    Bronchiolitis,
    Pneumonia,
    Copd,
    Rds,
    Other(String),
}

impl DiseaseCategory {
    /// Categories offered by the intake form (`Other` last, with an empty label).
    #[must_use]
    pub fn choices() -> Vec<DiseaseCategory> {
        vec![
            Self::Ards,
            Self::Asthma,
            Self::Bronchiolitis,
            Self::Pneumonia,
            Self::Copd,
            Self::Rds,
            Self::Other("Other".to_string()),
        ]
    }

    /// Long form used in the UI.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Ards => "Acute respiratory distress syndrome",
            Self::Asthma => "Asthma",
            Self::Bronchiolitis => "Bronchiolitis",
            Self::Pneumonia => "Pneumonia",
            Self::Copd => "Chronic obstructive pulmonary disease",
            Self::Rds => "Neonatal respiratory distress syndrome",
            Self::Other(label) => label,
        }
    }

    /// Lung pattern usually associated with the category.
    #[must_use]
    pub fn default_lung_involvement(&self) -> Option<LungInvolvement> {
        match self {
            Self::Asthma | Self::Bronchiolitis | Self::Copd => Some(LungInvolvement::Obstructive),
            Self::Ards | Self::Rds | Self::Pneumonia => Some(LungInvolvement::Restrictive),
            Self::Other(_) => None,
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Other(label) if label.trim().is_empty())
    }
}

impl fmt::Display for DiseaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ards => write!(f, "ARDS"),
            Self::Asthma => write!(f, "Asthma"),
            Self::Bronchiolitis => write!(f, "Bronchiolitis"),
            Self::Pneumonia => write!(f, "Pneumonia"),
            Self::Copd => write!(f, "COPD"),
            Self::Rds => write!(f, "RDS"),
            Self::Other(label) => write!(f, "{label}"),
        }
    }
}

impl FromStr for DiseaseCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_ascii_uppercase().as_str() {
            "ARDS" => Self::Ards,
            "ASTHMA" => Self::Asthma,
            "BRONCHIOLITIS" => Self::Bronchiolitis,
            "PNEUMONIA" => Self::Pneumonia,
            "COPD" => Self::Copd,
            "RDS" => Self::Rds,
            _ => Self::Other(trimmed.to_string()),
        })
    }
}

/// Patient attributes collected at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Age, in `age_unit`
    pub age_value: f64,

    pub age_unit: AgeUnit,

    pub disease_category: DiseaseCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lung_involvement: Option<LungInvolvement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_condition: Option<String>,
}

impl PatientProfile {
    /// Create a profile without the optional refinements.
    #[must_use]
    pub fn new(
        weight_kg: f64,
        age_value: f64,
        age_unit: AgeUnit,
        disease_category: DiseaseCategory,
    ) -> Self {
        Self {
            weight_kg,
            age_value,
            age_unit,
            disease_category,
            lung_involvement: None,
            sub_condition: None,
        }
    }

    /// Set the lung involvement explicitly.
    #[must_use]
    pub fn with_lung_involvement(mut self, involvement: LungInvolvement) -> Self {
        self.lung_involvement = Some(involvement);
        self
    }

    #[must_use]
    pub fn age_class(&self) -> AgeClass {
        AgeClass::from_age(self.age_value, self.age_unit)
    }

    #[must_use]
    pub fn age_in_months(&self) -> f64 {
        self.age_unit.to_months(self.age_value)
    }

    /// Lung involvement as entered, or the category's usual pattern.
    #[must_use]
    pub fn effective_lung_involvement(&self) -> Option<LungInvolvement> {
        self.lung_involvement
            .or_else(|| self.disease_category.default_lung_involvement())
    }

    /// Validate intake values.
    ///
    /// # Errors
    /// Returns every failing field's message.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            errors.push("weight must be greater than zero".to_string());
        }
        if !self.age_value.is_finite() || self.age_value <= 0.0 {
            errors.push("age must be greater than zero".to_string());
        }
        if self.disease_category.is_blank() {
            errors.push("disease category is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_class_cutoff() {
        assert_eq!(AgeClass::from_age(45.0, AgeUnit::Days), AgeClass::Infant);
        assert_eq!(AgeClass::from_age(60.0, AgeUnit::Days), AgeClass::Pediatric);
        assert_eq!(AgeClass::from_age(1.9, AgeUnit::Months), AgeClass::Infant);
        assert_eq!(AgeClass::from_age(2.0, AgeUnit::Months), AgeClass::Pediatric);
        assert_eq!(AgeClass::from_age(0.1, AgeUnit::Years), AgeClass::Infant);
        assert_eq!(AgeClass::from_age(3.0, AgeUnit::Years), AgeClass::Pediatric);
    }

    #[test]
    fn test_validation() {
        let valid = PatientProfile::new(10.0, 2.0, AgeUnit::Years, DiseaseCategory::Pneumonia);
        assert!(valid.validate().is_ok());

        let invalid = PatientProfile::new(0.0, -1.0, AgeUnit::Months, DiseaseCategory::Other("  ".into()));
        let errors = invalid.validate().expect_err("Should reject");
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"weight must be greater than zero".to_string()));
        assert!(errors.contains(&"disease category is required".to_string()));
    }

    #[test]
    fn test_disease_parsing_and_lung_pattern() {
        assert_eq!("ards".parse::<DiseaseCategory>().ok(), Some(DiseaseCategory::Ards));
        assert_eq!(
            "Croup".parse::<DiseaseCategory>().ok(),
            Some(DiseaseCategory::Other("Croup".into()))
        );

        let asthma = PatientProfile::new(20.0, 6.0, AgeUnit::Years, DiseaseCategory::Asthma);
        assert_eq!(asthma.effective_lung_involvement(), Some(LungInvolvement::Obstructive));

        let overridden = asthma.with_lung_involvement(LungInvolvement::Normal);
        assert_eq!(overridden.effective_lung_involvement(), Some(LungInvolvement::Normal));
    }
}
