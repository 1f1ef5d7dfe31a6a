//! Stock level models
//!
//! Quantities live in per-warehouse, per-variant, per-bucket rows. Rows are
//! created lazily on first movement and zeroed rather than deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status partition of stock within a warehouse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockBucket {
    OnHand,
    InTransit,
    TruckStock,
    Quarantine,
}

impl StockBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockBucket::OnHand => "on_hand",
            StockBucket::InTransit => "in_transit",
            StockBucket::TruckStock => "truck_stock",
            StockBucket::Quarantine => "quarantine",
        }
    }
}

impl std::fmt::Display for StockBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a stock level row within a tenant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct StockKey {
    pub warehouse_id: Uuid,
    pub variant_id: Uuid,
    pub bucket: StockBucket,
}

impl StockKey {
    pub fn new(warehouse_id: Uuid, variant_id: Uuid, bucket: StockBucket) -> Self {
        Self {
            warehouse_id,
            variant_id,
            bucket,
        }
    }

    pub fn on_hand(warehouse_id: Uuid, variant_id: Uuid) -> Self {
        Self::new(warehouse_id, variant_id, StockBucket::OnHand)
    }
}

/// Quantity and cost state for one (warehouse, variant, bucket)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLevel {
    pub tenant_id: Uuid,
    pub warehouse_id: Uuid,
    pub variant_id: Uuid,
    pub bucket: StockBucket,
    /// Signed; may go negative to represent an unreconciled shortage
    pub quantity: Decimal,
    /// Holds against available stock, never negative
    pub reserved_quantity: Decimal,
    /// Weighted-average unit cost, when costs have been supplied
    pub unit_cost: Option<Decimal>,
    pub total_cost: Decimal,
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl StockLevel {
    /// Fresh zeroed row for a key
    pub fn empty(tenant_id: Uuid, key: StockKey) -> Self {
        Self {
            tenant_id,
            warehouse_id: key.warehouse_id,
            variant_id: key.variant_id,
            bucket: key.bucket,
            quantity: Decimal::ZERO,
            reserved_quantity: Decimal::ZERO,
            unit_cost: None,
            total_cost: Decimal::ZERO,
            last_transaction_at: None,
        }
    }

    pub fn key(&self) -> StockKey {
        StockKey::new(self.warehouse_id, self.variant_id, self.bucket)
    }

    /// Quantity not held by reservations; may be negative at read time
    pub fn available_quantity(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }

    pub fn is_negative(&self) -> bool {
        self.quantity < Decimal::ZERO
    }
}

/// Per-variant totals across warehouses, for summaries and dashboards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantStockSummary {
    pub variant_id: Uuid,
    pub sku: String,
    pub total_quantity: Decimal,
    pub total_reserved: Decimal,
    pub total_available: Decimal,
    pub total_cost: Decimal,
    pub warehouse_count: usize,
}

/// A stock level below the alert threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockRow {
    pub warehouse_id: Uuid,
    pub variant_id: Uuid,
    pub bucket: StockBucket,
    pub available_quantity: Decimal,
    pub threshold: Decimal,
}

/// A stock level whose recorded quantity has gone negative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeStockRow {
    pub warehouse_id: Uuid,
    pub variant_id: Uuid,
    pub bucket: StockBucket,
    pub quantity: Decimal,
}
