//! Domain models for the Cylinder Stock platform

mod document;
mod stock;
mod variance;
mod variant;
mod warehouse;

pub use document::*;
pub use stock::*;
pub use variance::*;
pub use variant::*;
pub use warehouse::*;
