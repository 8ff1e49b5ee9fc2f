//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the rule engines and the data they are configured with.

mod mode_catalog;

pub use mode_catalog::ModeCatalog;
