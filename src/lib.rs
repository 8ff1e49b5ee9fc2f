//! # VentAssist
//!
//! Educational ventilator settings calculator and ABG interpretation
//! engine for infant and pediatric patients.
//!
//! This crate provides:
//! - Weight-scaled initial ventilator settings per mode and age class
//! - ABG validation, acid-base and oxygenation classification
//! - Recommended setting adjustments and alarm bands
//! - Terminal UI for local use
//!
//! Thresholds are illustrative and not validated clinical guidance.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core clinical types (Patient, Settings, Modes, ABG)
//! - `ports`: Trait definitions for the mode registry
//! - `adapters`: Concrete implementations (built-in mode tables)
//! - `application`: Rule engines and the session service
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{AbgPanel, ModeId, PatientProfile, VentilatorSettings};

/// Result type for VentAssist operations
pub type Result<T> = std::result::Result<T, VentAssistError>;

/// Main error type for VentAssist
#[derive(Debug, thiserror::Error)]
pub enum VentAssistError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] domain::ConfigurationError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
