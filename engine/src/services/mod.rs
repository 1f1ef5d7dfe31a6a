//! Business logic services for the Cylinder Stock inventory engine

pub mod bundle;
pub mod catalog;
pub mod document;
pub mod exchange;
pub mod ledger;
pub mod reporting;
pub mod variance;

pub use bundle::BundleExpander;
pub use catalog::CatalogService;
pub use document::StockDocumentService;
pub use exchange::ExchangeCalculator;
pub use ledger::StockLedgerService;
pub use reporting::ReportingService;
pub use variance::VarianceService;
