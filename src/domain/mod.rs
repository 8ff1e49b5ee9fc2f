//! Domain layer: Core clinical types and rule tables.
//!
//! This module contains pure Rust types with no I/O.
//! All records are serializable and validate their own input.

mod abg;
mod alarm;
mod interpretation;
pub mod lab;
mod mode;
mod patient;
mod protocol;
mod settings;

pub use abg::{AbgField, AbgPanel, AbgRanges, AbgValues, RangeStatus, ValueRange, NORMAL_RANGES};
pub use alarm::{AlarmRange, AlarmRanges};
pub use interpretation::{
    AcidBaseDisorder, AnionGap, Compensation, Interpretation, InterpretationOutcome, Oxygenation,
};
pub use lab::{LabTest, LAB_TESTS};
pub use mode::{
    check_weight, ConfigurationError, EditableParameter, ModeDefinition, ModeId, ParameterKind,
};
pub use patient::{
    AgeClass, AgeUnit, DiseaseCategory, LungInvolvement, PatientProfile, INFANT_MAX_AGE_MONTHS,
};
pub use protocol::{
    ClinicalProtocol, HypoxemiaTier, OxygenationRules, SevereAcidosisRules, VentilationRules,
};
pub use settings::{
    format_number, minute_ventilation, parse_decimal, round_to, IeRatio, ParamKey, ParamValue,
    SettingChange, VentilatorSettings, SUMMARY_KEYS,
};
