//! Application layer: Rule engines and the session service.
//!
//! This module combines domain rules with the mode catalog port to
//! implement the calculator's use cases.

mod alarms;
mod calculator;
mod interpreter;
mod report;
mod validator;
mod ventilation;

pub use alarms::{AlarmConfig, AlarmRangeCalculator};
pub use calculator::SettingsCalculator;
pub use interpreter::AbgInterpreter;
pub use report::AssessmentReport;
pub use validator::{AbgValidation, AbgValidator};
pub use ventilation::{AbgSubmission, VentilationService};
