//! Repository interfaces for the inventory engine
//!
//! The engine is specified against these traits rather than a concrete
//! datastore. A SQL implementation would map each trait to a table with the
//! layout described in the platform docs; [`MemoryStore`] is the
//! deterministic implementation used by tests and embedded deployments.
//!
//! Concurrency contract: `StockLevelRepository::apply` serializes mutations
//! per tenant and applies each batch all-or-nothing, so availability
//! invariants hold under parallel callers without any cooperation from the
//! services.

mod memory;

pub use memory::MemoryStore;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    DateRange, StockDocStatus, StockDocType, StockDocument, StockKey, StockLevel, Variant,
    VariantRoleKind, Warehouse,
};

use crate::error::AppResult;

/// One ledger movement against a stock level key
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerMutation {
    /// Add stock; recomputes the weighted-average unit cost when a cost is
    /// supplied
    Receive {
        key: StockKey,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    },
    /// Remove stock; rejected when available < quantity unless
    /// `allow_negative`
    Issue {
        key: StockKey,
        quantity: Decimal,
        allow_negative: bool,
    },
    /// Hold available stock; rejected when the hold would exceed the
    /// recorded quantity unless `allow_shortfall`
    Reserve {
        key: StockKey,
        quantity: Decimal,
        allow_shortfall: bool,
    },
    /// Undo a hold; rejected when it would take the reservation negative
    Release { key: StockKey, quantity: Decimal },
    /// Move stock between two keys in one step, carrying the source unit
    /// cost to the destination
    Transfer {
        from: StockKey,
        to: StockKey,
        quantity: Decimal,
    },
    /// Signed correction bypassing availability checks; never allowed to
    /// take the quantity below the reserved floor
    Adjust { key: StockKey, quantity: Decimal },
}

impl LedgerMutation {
    /// Keys touched by this mutation
    pub fn keys(&self) -> Vec<StockKey> {
        match self {
            LedgerMutation::Receive { key, .. }
            | LedgerMutation::Issue { key, .. }
            | LedgerMutation::Reserve { key, .. }
            | LedgerMutation::Release { key, .. }
            | LedgerMutation::Adjust { key, .. } => vec![*key],
            LedgerMutation::Transfer { from, to, .. } => vec![*from, *to],
        }
    }
}

/// Variant catalog storage
pub trait VariantRepository: Send + Sync {
    /// Rejects a duplicate (tenant, SKU) pair
    fn insert(&self, variant: Variant) -> AppResult<()>;
    fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> Option<Variant>;
    fn get_by_sku(&self, tenant_id: Uuid, sku: &str) -> Option<Variant>;
    /// Rejects an unknown variant
    fn update(&self, variant: Variant) -> AppResult<()>;
    /// Same-size sibling lookup (service <-> deposit <-> physical)
    fn find_sibling(
        &self,
        tenant_id: Uuid,
        size_group: &str,
        kind: VariantRoleKind,
    ) -> Option<Variant>;
    fn list(&self, tenant_id: Uuid) -> Vec<Variant>;
}

/// Warehouse directory
pub trait WarehouseRepository: Send + Sync {
    fn insert(&self, warehouse: Warehouse) -> AppResult<()>;
    fn get(&self, tenant_id: Uuid, id: Uuid) -> Option<Warehouse>;
    fn list(&self, tenant_id: Uuid) -> Vec<Warehouse>;
}

/// Stock level storage; the authoritative quantity ledger
pub trait StockLevelRepository: Send + Sync {
    /// Apply a batch of mutations atomically: either every mutation commits
    /// or none does. Rows are created lazily on first movement. Returns the
    /// post-commit state of every touched level.
    fn apply(&self, tenant_id: Uuid, mutations: &[LedgerMutation]) -> AppResult<Vec<StockLevel>>;
    fn get(&self, tenant_id: Uuid, key: StockKey) -> Option<StockLevel>;
    fn list(&self, tenant_id: Uuid) -> Vec<StockLevel>;
    fn list_for_variant(&self, tenant_id: Uuid, variant_id: Uuid) -> Vec<StockLevel>;
    fn list_for_warehouse(&self, tenant_id: Uuid, warehouse_id: Uuid) -> Vec<StockLevel>;
}

/// Filter for document listings
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub doc_type: Option<StockDocType>,
    pub status: Option<StockDocStatus>,
    /// Matches either endpoint of the document
    pub warehouse_id: Option<Uuid>,
    /// Inclusive creation-date window
    pub created: Option<DateRange>,
}

/// Stock document storage
pub trait StockDocumentRepository: Send + Sync {
    /// Next number in the per-tenant, per-type sequence (e.g. "RCS-000012")
    fn next_doc_number(&self, tenant_id: Uuid, doc_type: StockDocType) -> String;
    fn insert(&self, document: StockDocument) -> AppResult<()>;
    fn get(&self, tenant_id: Uuid, id: Uuid) -> Option<StockDocument>;
    /// Update an existing document. The write carries the version the
    /// caller read; a stale version is a conflict, so two concurrent
    /// editors can never silently drop each other's lines. Returns the
    /// stored document with its bumped version.
    fn update(&self, document: StockDocument) -> AppResult<StockDocument>;
    /// Compare-and-set update: commits only when the stored status still
    /// equals `expected` and the version is current, so a document can
    /// never be claimed twice nor posted from a stale read
    fn update_expecting(
        &self,
        document: StockDocument,
        expected: StockDocStatus,
    ) -> AppResult<StockDocument>;
    fn list(&self, tenant_id: Uuid, filter: &DocumentFilter) -> Vec<StockDocument>;
}
