//! Inventory engine for the Cylinder Stock platform
//!
//! The core that turns cylinder-exchange sales and physical movements into
//! correct stock and deposit-liability mutations. Everything inventory-
//! affecting flows through the same ledger and the same document lifecycle:
//!
//! - the catalog classifies every SKU into exactly one role,
//! - the exchange calculator and bundle expander normalize sales into
//!   signed line tuples,
//! - stock documents carry those lines through an explicit state machine,
//! - posting a document drives atomic stock-ledger mutations.
//!
//! Persistence is expressed through the repository traits in [`store`];
//! [`store::MemoryStore`] is the deterministic in-memory implementation
//! used in tests and embedded deployments. The HTTP layer, auth, and
//! notification delivery live outside this crate.

pub mod config;
pub mod error;
pub mod services;
pub mod store;

pub use config::EngineConfig;
pub use error::{AppError, AppResult};
