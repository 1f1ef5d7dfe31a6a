//! Stock document models
//!
//! A stock document is the single entry point for every inventory-affecting
//! event: receipts, issues, transfers, and adjustments. Its lines drive
//! ledger mutations once the document is posted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::variance::VarianceDetails;

/// Type of a stock document, fixed at creation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StockDocType {
    /// Goods received from a supplier
    ReceiptSupplier,
    /// Empties returned by customers
    ReceiptReturn,
    /// Filled cylinders received from the filling plant
    ReceiptFilling,
    /// Stock issued to load a vehicle
    IssueLoad,
    /// Stock issued against a sale
    IssueSale,
    /// Write-off of damaged or scrapped stock
    AdjustScrap,
    /// Reconciliation of a physical count
    AdjustVariance,
    /// Movement between two warehouses
    TransferWarehouse,
    /// Movement between on-hand and truck stock
    TransferTruck,
}

impl StockDocType {
    /// Document-number prefix; numbers are sequenced per tenant and type
    pub fn prefix(&self) -> &'static str {
        match self {
            StockDocType::ReceiptSupplier => "RCS",
            StockDocType::ReceiptReturn => "RCR",
            StockDocType::ReceiptFilling => "RCF",
            StockDocType::IssueLoad => "ISL",
            StockDocType::IssueSale => "ISS",
            StockDocType::AdjustScrap => "ADS",
            StockDocType::AdjustVariance => "ADV",
            StockDocType::TransferWarehouse => "TRW",
            StockDocType::TransferTruck => "TRT",
        }
    }

    /// Whether a source warehouse must be present before posting
    pub fn requires_source(&self) -> bool {
        matches!(
            self,
            StockDocType::IssueLoad | StockDocType::IssueSale | StockDocType::TransferWarehouse
        )
    }

    /// Whether a destination warehouse must be present before posting
    pub fn requires_destination(&self) -> bool {
        matches!(
            self,
            StockDocType::ReceiptSupplier
                | StockDocType::ReceiptReturn
                | StockDocType::ReceiptFilling
                | StockDocType::AdjustScrap
                | StockDocType::AdjustVariance
                | StockDocType::TransferWarehouse
        )
    }

    /// Truck transfers only need one endpoint; the other side is implied
    /// by the bucket swap
    pub fn requires_either_endpoint(&self) -> bool {
        matches!(self, StockDocType::TransferTruck)
    }

    pub fn is_receipt(&self) -> bool {
        matches!(
            self,
            StockDocType::ReceiptSupplier | StockDocType::ReceiptReturn | StockDocType::ReceiptFilling
        )
    }

    pub fn is_issue(&self) -> bool {
        matches!(self, StockDocType::IssueLoad | StockDocType::IssueSale)
    }

    pub fn is_adjustment(&self) -> bool {
        matches!(self, StockDocType::AdjustScrap | StockDocType::AdjustVariance)
    }
}

/// Lifecycle status of a stock document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockDocStatus {
    /// Pre-confirmation stage, entered only through the variance workflow
    Draft,
    /// Editable; lines may be added and removed
    Open,
    /// Ledger mutations applied; terminal
    Posted,
    /// Abandoned without ledger effect; terminal
    Cancelled,
}

impl StockDocStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockDocStatus::Draft => "draft",
            StockDocStatus::Open => "open",
            StockDocStatus::Posted => "posted",
            StockDocStatus::Cancelled => "cancelled",
        }
    }

    /// Central transition table; everything else is rejected
    pub fn can_transition_to(&self, next: StockDocStatus) -> bool {
        matches!(
            (self, next),
            (StockDocStatus::Draft, StockDocStatus::Open)
                | (StockDocStatus::Draft, StockDocStatus::Cancelled)
                | (StockDocStatus::Open, StockDocStatus::Posted)
                | (StockDocStatus::Open, StockDocStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StockDocStatus::Posted | StockDocStatus::Cancelled)
    }

    /// Lines may only be changed before posting or cancellation
    pub fn is_editable(&self) -> bool {
        matches!(self, StockDocStatus::Draft | StockDocStatus::Open)
    }
}

impl std::fmt::Display for StockDocStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status transition outside the transition table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid document transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: StockDocStatus,
    pub to: StockDocStatus,
}

/// What a document line refers to: a catalog variant or bulk gas.
/// Gas lines record bulk weight on the document; only variant lines reach
/// the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    Variant { variant_id: Uuid },
    GasType { gas_type: String },
}

/// An ordered child line of a stock document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDocumentLine {
    pub id: Uuid,
    pub item: LineItem,
    /// Signed, never exactly zero
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    /// System quantity at count time, variance lines only
    pub system_quantity: Option<Decimal>,
    /// Physically counted quantity, variance lines only
    pub actual_quantity: Option<Decimal>,
}

impl StockDocumentLine {
    pub fn for_variant(variant_id: Uuid, quantity: Decimal, unit_cost: Option<Decimal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item: LineItem::Variant { variant_id },
            quantity,
            unit_cost,
            system_quantity: None,
            actual_quantity: None,
        }
    }

    pub fn for_gas(gas_type: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            item: LineItem::GasType {
                gas_type: gas_type.into(),
            },
            quantity,
            unit_cost: None,
            system_quantity: None,
            actual_quantity: None,
        }
    }

    pub fn variant_id(&self) -> Option<Uuid> {
        match &self.item {
            LineItem::Variant { variant_id } => Some(*variant_id),
            LineItem::GasType { .. } => None,
        }
    }
}

/// A typed, stateful inventory document with owned lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Unique per tenant (e.g., "RCS-000012")
    pub doc_number: String,
    pub doc_type: StockDocType,
    pub status: StockDocStatus,
    pub source_warehouse_id: Option<Uuid>,
    pub dest_warehouse_id: Option<Uuid>,
    /// Free-form link to an order or another document
    pub reference: Option<String>,
    pub lines: Vec<StockDocumentLine>,
    /// Always the sum of line quantities
    pub total_quantity: Decimal,
    /// Present only for `AdjustVariance` documents
    pub variance: Option<VarianceDetails>,
    /// Optimistic concurrency token, bumped by the store on every write;
    /// a write carrying a stale version is rejected
    pub version: u64,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockDocument {
    /// Apply a status transition, enforcing the central transition table
    pub fn transition(&mut self, next: StockDocStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Recompute the header total from the owned lines
    pub fn recompute_total(&mut self) {
        self.total_quantity = self.lines.iter().map(|l| l.quantity).sum();
    }

    pub fn line(&self, line_id: Uuid) -> Option<&StockDocumentLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use StockDocStatus::*;
        assert!(Draft.can_transition_to(Open));
        assert!(Draft.can_transition_to(Cancelled));
        assert!(Open.can_transition_to(Posted));
        assert!(Open.can_transition_to(Cancelled));

        assert!(!Draft.can_transition_to(Posted));
        assert!(!Open.can_transition_to(Draft));
        assert!(!Posted.can_transition_to(Open));
        assert!(!Posted.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Open));
    }

    #[test]
    fn test_warehouse_requirement_table() {
        use StockDocType::*;
        for t in [ReceiptSupplier, ReceiptReturn, ReceiptFilling] {
            assert!(!t.requires_source());
            assert!(t.requires_destination());
        }
        for t in [IssueLoad, IssueSale] {
            assert!(t.requires_source());
            assert!(!t.requires_destination());
        }
        assert!(TransferWarehouse.requires_source());
        assert!(TransferWarehouse.requires_destination());
        assert!(TransferTruck.requires_either_endpoint());
        for t in [AdjustScrap, AdjustVariance] {
            assert!(!t.requires_source());
            assert!(t.requires_destination());
        }
    }

    #[test]
    fn test_prefixes_are_distinct() {
        use StockDocType::*;
        let all = [
            ReceiptSupplier,
            ReceiptReturn,
            ReceiptFilling,
            IssueLoad,
            IssueSale,
            AdjustScrap,
            AdjustVariance,
            TransferWarehouse,
            TransferTruck,
        ];
        let mut prefixes: Vec<_> = all.iter().map(|t| t.prefix()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), all.len());
    }
}
