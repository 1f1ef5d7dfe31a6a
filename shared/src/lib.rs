//! Shared types and models for the Cylinder Stock platform
//!
//! This crate contains the domain model used by the inventory engine and any
//! other component of the system (reporting, integrations, future frontends).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
