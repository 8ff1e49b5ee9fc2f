//! ABG validator: Gates panels before interpretation.
//!
//! Field problems are reported as data. A missing or implausible value
//! blocks interpretation; a value that is merely abnormal only earns an
//! advisory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    format_number, AbgField, AbgPanel, AbgValues, AgeClass, ClinicalProtocol, RangeStatus,
    NORMAL_RANGES,
};

/// Outcome of validating one panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbgValidation {
    /// Blocking problems, one per field at most
    pub errors_by_field: BTreeMap<AbgField, String>,
    /// Non-blocking notes for admissible but abnormal values
    pub advisories: BTreeMap<AbgField, String>,
    /// Position of each admissible value relative to the normal range
    pub normal_flags: BTreeMap<AbgField, RangeStatus>,
    /// Parsed values, present only when the panel is valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<AbgValues>,
}

impl AbgValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors_by_field.is_empty()
    }

    #[must_use]
    pub fn error(&self, field: AbgField) -> Option<&str> {
        self.errors_by_field.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn advisory(&self, field: AbgField) -> Option<&str> {
        self.advisories.get(&field).map(String::as_str)
    }
}

/// Validates ABG panels against the age class's admissible ranges.
pub struct AbgValidator;

impl AbgValidator {
    /// Validate every field of `panel`.
    #[must_use]
    pub fn validate(panel: &AbgPanel, class: AgeClass) -> AbgValidation {
        let admissible = ClinicalProtocol::for_class(class).admissible;
        let mut out = AbgValidation::default();

        for field in AbgField::ALL {
            let Some(value) = panel.value(field) else {
                out.errors_by_field
                    .insert(field, format!("{field} is required"));
                continue;
            };

            let range = admissible.get(field);
            if !range.contains(value) {
                out.errors_by_field.insert(
                    field,
                    format!(
                        "{field} must be between {} and {}",
                        format_number(range.min, 2),
                        format_number(range.max, 2)
                    ),
                );
                continue;
            }

            let status = NORMAL_RANGES.get(field).status(value);
            out.normal_flags.insert(field, status);
            if let Some(message) = advisory(field, status) {
                out.advisories.insert(field, message.to_string());
            }
        }

        if out.is_valid() {
            if let (Some(ph), Some(pco2), Some(po2), Some(hco3)) = (
                panel.value(AbgField::Ph),
                panel.value(AbgField::PCo2),
                panel.value(AbgField::PO2),
                panel.value(AbgField::Hco3),
            ) {
                out.values = Some(AbgValues::new(ph, pco2, po2, hco3));
            }
        } else {
            tracing::debug!(
                "ABG panel rejected: {} field error(s)",
                out.errors_by_field.len()
            );
        }

        out
    }
}

fn advisory(field: AbgField, status: RangeStatus) -> Option<&'static str> {
    match (field, status) {
        (_, RangeStatus::Normal) => None,
        (AbgField::Ph, RangeStatus::Low) => Some("low pH indicates acidemia"),
        (AbgField::Ph, RangeStatus::High) => Some("high pH indicates alkalemia"),
        (AbgField::PCo2, RangeStatus::Low) => Some("low pCO2 indicates hypocapnia"),
        (AbgField::PCo2, RangeStatus::High) => Some("high pCO2 indicates hypercapnia"),
        (AbgField::PO2, RangeStatus::Low) => Some("low pO2 indicates possible hypoxemia"),
        (AbgField::PO2, RangeStatus::High) => Some("high pO2 indicates hyperoxia"),
        (AbgField::Hco3, RangeStatus::Low) => Some("low HCO3 indicates base deficit"),
        (AbgField::Hco3, RangeStatus::High) => Some("high HCO3 indicates base excess"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_panel_is_valid_without_advisories() {
        let panel = AbgPanel::new("7.40", "40", "90", "24");
        let v = AbgValidator::validate(&panel, AgeClass::Pediatric);

        assert!(v.is_valid());
        assert!(v.advisories.is_empty());
        assert!(v.normal_flags.values().all(|s| *s == RangeStatus::Normal));
        assert_eq!(v.values, Some(AbgValues::new(7.40, 40.0, 90.0, 24.0)));
    }

    #[test]
    fn test_empty_ph_is_required() {
        let panel = AbgPanel::new("", "40", "90", "24");
        let v = AbgValidator::validate(&panel, AgeClass::Pediatric);

        assert!(!v.is_valid());
        assert_eq!(v.error(AbgField::Ph), Some("pH is required"));
        assert_eq!(v.errors_by_field.len(), 1);
        assert!(v.values.is_none());
    }

    #[test]
    fn test_non_numeric_is_absent_not_zero() {
        let panel = AbgPanel::new("7.4", "abc", "90", "24");
        let v = AbgValidator::validate(&panel, AgeClass::Pediatric);
        assert_eq!(v.error(AbgField::PCo2), Some("pCO2 is required"));
    }

    #[test]
    fn test_admissible_range_depends_on_age_class() {
        let panel = AbgPanel::new("7.10", "70", "150", "15");

        let ped = AbgValidator::validate(&panel, AgeClass::Pediatric);
        assert!(ped.is_valid());

        let inf = AbgValidator::validate(&panel, AgeClass::Infant);
        assert!(!inf.is_valid());
        assert_eq!(inf.error(AbgField::Ph), Some("pH must be between 7.2 and 7.6"));
        assert_eq!(inf.error(AbgField::PCo2), Some("pCO2 must be between 25 and 60"));
        assert_eq!(inf.error(AbgField::PO2), Some("pO2 must be between 40 and 100"));
        assert_eq!(inf.error(AbgField::Hco3), Some("HCO3 must be between 18 and 32"));
    }

    #[test]
    fn test_admissible_bounds_are_inclusive() {
        let panel = AbgPanel::new("6.8", "100", "30", "40");
        assert!(AbgValidator::validate(&panel, AgeClass::Pediatric).is_valid());

        let panel = AbgPanel::new("6.79", "100", "30", "40");
        assert!(!AbgValidator::validate(&panel, AgeClass::Pediatric).is_valid());
    }

    #[test]
    fn test_advisories_do_not_block() {
        let panel = AbgPanel::new("7.25", "55", "55", "24");
        let v = AbgValidator::validate(&panel, AgeClass::Pediatric);

        assert!(v.is_valid());
        assert_eq!(v.advisory(AbgField::Ph), Some("low pH indicates acidemia"));
        assert_eq!(v.advisory(AbgField::PCo2), Some("high pCO2 indicates hypercapnia"));
        assert_eq!(v.advisory(AbgField::PO2), Some("low pO2 indicates possible hypoxemia"));
        assert_eq!(v.advisory(AbgField::Hco3), None);
        assert_eq!(v.normal_flags.get(&AbgField::Ph), Some(&RangeStatus::Low));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let panels = [
            AbgPanel::new("7.40", "40", "90", "24"),
            AbgPanel::new("", "x", "500", "-3"),
            AbgPanel::new("7.5", "30", "120", "30"),
        ];
        for panel in &panels {
            for class in [AgeClass::Infant, AgeClass::Pediatric] {
                assert_eq!(
                    AbgValidator::validate(panel, class),
                    AbgValidator::validate(panel, class)
                );
            }
        }
    }
}
