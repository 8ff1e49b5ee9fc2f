//! Adapters layer: Concrete implementations of ports.
//!
//! - `catalog`: the built-in, age-class-keyed ventilator mode tables

pub mod catalog;

pub use catalog::BuiltinModeCatalog;
