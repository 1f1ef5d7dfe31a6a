//! Stock document engine
//!
//! Documents are created Open, stay editable until they are posted or
//! cancelled, and drive ledger mutations exactly once. Posting validates
//! everything first, then claims the document with a compare-and-set
//! status update, then applies the compiled mutations as one atomic
//! batch: a failed batch unclaims the document and leaves the ledger
//! untouched.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::{
    LineItem, PaginatedResponse, Pagination, StockBucket, StockDocStatus, StockDocType,
    StockDocument, StockDocumentLine, StockKey, VariantRoleKind,
};

use crate::error::{AppError, AppResult};
use crate::store::{
    DocumentFilter, LedgerMutation, StockDocumentRepository, StockLevelRepository,
    VariantRepository, WarehouseRepository,
};

/// Stock document service
#[derive(Clone)]
pub struct StockDocumentService {
    documents: Arc<dyn StockDocumentRepository>,
    levels: Arc<dyn StockLevelRepository>,
    variants: Arc<dyn VariantRepository>,
    warehouses: Arc<dyn WarehouseRepository>,
}

/// Input for creating a stock document
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocumentInput {
    pub tenant_id: Uuid,
    pub doc_type: StockDocType,
    pub source_warehouse_id: Option<Uuid>,
    pub dest_warehouse_id: Option<Uuid>,
    pub reference: Option<String>,
}

/// What a new line refers to
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewLineItem {
    Variant { sku: String },
    Gas { gas_type: String },
}

/// Input for adding a line to an open document
#[derive(Debug, Clone, Deserialize)]
pub struct AddLineInput {
    pub item: NewLineItem,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
}

impl StockDocumentService {
    pub fn new(
        documents: Arc<dyn StockDocumentRepository>,
        levels: Arc<dyn StockLevelRepository>,
        variants: Arc<dyn VariantRepository>,
        warehouses: Arc<dyn WarehouseRepository>,
    ) -> Self {
        Self {
            documents,
            levels,
            variants,
            warehouses,
        }
    }

    /// Create an empty document in Open status
    pub fn create_document(&self, input: CreateDocumentInput) -> AppResult<StockDocument> {
        self.create_with_status(input, StockDocStatus::Open, None)
    }

    /// Shared creation path; the variance workflow starts documents in
    /// Draft with its details attached
    pub(crate) fn create_with_status(
        &self,
        input: CreateDocumentInput,
        status: StockDocStatus,
        variance: Option<shared::VarianceDetails>,
    ) -> AppResult<StockDocument> {
        for warehouse_id in [input.source_warehouse_id, input.dest_warehouse_id]
            .into_iter()
            .flatten()
        {
            if self.warehouses.get(input.tenant_id, warehouse_id).is_none() {
                return Err(AppError::NotFound(format!("warehouse '{}'", warehouse_id)));
            }
        }
        if input.doc_type == StockDocType::TransferWarehouse
            && input.source_warehouse_id.is_some()
            && input.source_warehouse_id == input.dest_warehouse_id
        {
            return Err(AppError::InvalidStockOperation(
                "transfer endpoints must differ".to_string(),
            ));
        }

        let now = Utc::now();
        let document = StockDocument {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            doc_number: self
                .documents
                .next_doc_number(input.tenant_id, input.doc_type),
            doc_type: input.doc_type,
            status,
            source_warehouse_id: input.source_warehouse_id,
            dest_warehouse_id: input.dest_warehouse_id,
            reference: input.reference,
            lines: Vec::new(),
            total_quantity: Decimal::ZERO,
            variance,
            version: 1,
            posted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.documents.insert(document.clone())?;

        tracing::info!(
            tenant_id = %document.tenant_id,
            doc_number = %document.doc_number,
            doc_type = ?document.doc_type,
            "Stock document created"
        );
        Ok(document)
    }

    fn editable_document(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let document = self.get_document(tenant_id, document_id)?;
        if !document.status.is_editable() {
            return Err(AppError::InvalidStateTransition(format!(
                "document {} is {} and cannot be edited",
                document.doc_number, document.status
            )));
        }
        Ok(document)
    }

    /// Add a line while the document is editable
    pub fn add_line(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        input: AddLineInput,
    ) -> AppResult<StockDocument> {
        let mut document = self.editable_document(tenant_id, document_id)?;

        if input.quantity == Decimal::ZERO {
            return Err(AppError::validation("quantity", "Line quantity cannot be zero"));
        }
        if let Some(cost) = input.unit_cost {
            if cost < Decimal::ZERO {
                return Err(AppError::validation("unit_cost", "Unit cost cannot be negative"));
            }
        }

        let line = match input.item {
            NewLineItem::Variant { sku } => {
                let variant = self
                    .variants
                    .get_by_sku(tenant_id, &sku)
                    .ok_or_else(|| AppError::NotFound(format!("variant '{}'", sku)))?;
                match variant.role_kind() {
                    VariantRoleKind::PhysicalAsset | VariantRoleKind::DepositLiability => {}
                    VariantRoleKind::ConsumableService | VariantRoleKind::Bundle => {
                        return Err(AppError::validation(
                            "sku",
                            format!(
                                "'{}' is a {} SKU and cannot appear on stock documents",
                                sku,
                                variant.role_kind().as_str()
                            ),
                        ));
                    }
                }
                StockDocumentLine::for_variant(variant.id, input.quantity, input.unit_cost)
            }
            NewLineItem::Gas { gas_type } => {
                if gas_type.trim().is_empty() {
                    return Err(AppError::validation("gas_type", "Gas type cannot be empty"));
                }
                StockDocumentLine::for_gas(gas_type, input.quantity)
            }
        };

        document.lines.push(line);
        document.recompute_total();
        document.updated_at = Utc::now();
        self.documents.update(document)
    }

    /// Remove a line while the document is editable
    pub fn remove_line(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        line_id: Uuid,
    ) -> AppResult<StockDocument> {
        let mut document = self.editable_document(tenant_id, document_id)?;
        let before = document.lines.len();
        document.lines.retain(|line| line.id != line_id);
        if document.lines.len() == before {
            return Err(AppError::NotFound(format!("line '{}'", line_id)));
        }
        document.recompute_total();
        document.updated_at = Utc::now();
        self.documents.update(document)
    }

    /// Cancel the document; terminal, never touches the ledger
    pub fn cancel(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let mut document = self.get_document(tenant_id, document_id)?;
        let previous = document.status;
        document.transition(StockDocStatus::Cancelled)?;
        let document = self.documents.update_expecting(document, previous)?;
        tracing::info!(
            tenant_id = %tenant_id,
            doc_number = %document.doc_number,
            "Stock document cancelled"
        );
        Ok(document)
    }

    /// Post the document: validate, claim, then apply all ledger mutations
    /// atomically
    pub fn post(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let mut document = self.get_document(tenant_id, document_id)?;

        // Everything is validated before any mutation is attempted.
        self.validate_for_posting(&document)?;
        let mutations = self.compile_mutations(&document)?;

        // Claim the document so it can never be posted twice or posted
        // from a stale read.
        document.transition(StockDocStatus::Posted)?;
        document.posted_at = Some(Utc::now());
        let mut document = self
            .documents
            .update_expecting(document, StockDocStatus::Open)?;

        if let Err(err) = self.levels.apply(tenant_id, &mutations) {
            // Unclaim; the ledger batch left no partial state behind.
            document.status = StockDocStatus::Open;
            document.posted_at = None;
            document.updated_at = Utc::now();
            self.documents.update(document)?;
            return Err(err);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            doc_number = %document.doc_number,
            doc_type = ?document.doc_type,
            lines = document.lines.len(),
            "Stock document posted"
        );
        Ok(document)
    }

    fn validate_for_posting(&self, document: &StockDocument) -> AppResult<()> {
        if !document.status.can_transition_to(StockDocStatus::Posted) {
            return Err(AppError::InvalidStateTransition(format!(
                "document {} is {} and cannot be posted",
                document.doc_number, document.status
            )));
        }
        if document.lines.is_empty() {
            return Err(AppError::validation("lines", "Document has no lines"));
        }

        let doc_type = document.doc_type;
        if doc_type.requires_source() && document.source_warehouse_id.is_none() {
            return Err(AppError::validation(
                "source_warehouse_id",
                "Source warehouse is required for this document type",
            ));
        }
        if doc_type.requires_destination() && document.dest_warehouse_id.is_none() {
            return Err(AppError::validation(
                "dest_warehouse_id",
                "Destination warehouse is required for this document type",
            ));
        }
        if doc_type.requires_either_endpoint()
            && document.source_warehouse_id.is_none()
            && document.dest_warehouse_id.is_none()
        {
            return Err(AppError::validation(
                "source_warehouse_id",
                "Truck transfers need a source or destination warehouse",
            ));
        }
        if doc_type == StockDocType::TransferWarehouse
            && document.source_warehouse_id == document.dest_warehouse_id
        {
            return Err(AppError::InvalidStockOperation(
                "transfer endpoints must differ".to_string(),
            ));
        }
        for warehouse_id in [document.source_warehouse_id, document.dest_warehouse_id]
            .into_iter()
            .flatten()
        {
            if self.warehouses.get(document.tenant_id, warehouse_id).is_none() {
                return Err(AppError::NotFound(format!("warehouse '{}'", warehouse_id)));
            }
        }
        Ok(())
    }

    /// Translate document lines into ledger mutations. Gas lines and
    /// deposit-liability lines never move stock.
    fn compile_mutations(&self, document: &StockDocument) -> AppResult<Vec<LedgerMutation>> {
        let mut mutations = Vec::new();
        for line in &document.lines {
            let variant_id = match &line.item {
                LineItem::Variant { variant_id } => *variant_id,
                LineItem::GasType { .. } => continue,
            };
            let variant = self
                .variants
                .get_by_id(document.tenant_id, variant_id)
                .ok_or_else(|| AppError::NotFound(format!("variant '{}'", variant_id)))?;
            if variant.role_kind() == VariantRoleKind::DepositLiability {
                continue;
            }

            let mutation = match document.doc_type {
                StockDocType::ReceiptSupplier
                | StockDocType::ReceiptReturn
                | StockDocType::ReceiptFilling => {
                    let dest = self.required_warehouse(document.dest_warehouse_id)?;
                    LedgerMutation::Receive {
                        key: StockKey::on_hand(dest, variant_id),
                        quantity: self.positive_line_quantity(line.quantity)?,
                        unit_cost: line.unit_cost,
                    }
                }
                StockDocType::IssueLoad | StockDocType::IssueSale => {
                    let source = self.required_warehouse(document.source_warehouse_id)?;
                    LedgerMutation::Issue {
                        key: StockKey::on_hand(source, variant_id),
                        quantity: self.positive_line_quantity(line.quantity)?,
                        allow_negative: false,
                    }
                }
                StockDocType::TransferWarehouse => {
                    let source = self.required_warehouse(document.source_warehouse_id)?;
                    let dest = self.required_warehouse(document.dest_warehouse_id)?;
                    LedgerMutation::Transfer {
                        from: StockKey::on_hand(source, variant_id),
                        to: StockKey::on_hand(dest, variant_id),
                        quantity: self.positive_line_quantity(line.quantity)?,
                    }
                }
                StockDocType::TransferTruck => {
                    let quantity = self.positive_line_quantity(line.quantity)?;
                    match (document.source_warehouse_id, document.dest_warehouse_id) {
                        // Load from a warehouse onto a truck
                        (Some(source), Some(dest)) => LedgerMutation::Transfer {
                            from: StockKey::on_hand(source, variant_id),
                            to: StockKey::new(dest, variant_id, StockBucket::TruckStock),
                            quantity,
                        },
                        // Load within one location: on-hand -> truck stock
                        (Some(source), None) => LedgerMutation::Transfer {
                            from: StockKey::on_hand(source, variant_id),
                            to: StockKey::new(source, variant_id, StockBucket::TruckStock),
                            quantity,
                        },
                        // Unload back into the destination: truck -> on-hand
                        (None, Some(dest)) => LedgerMutation::Transfer {
                            from: StockKey::new(dest, variant_id, StockBucket::TruckStock),
                            to: StockKey::on_hand(dest, variant_id),
                            quantity,
                        },
                        (None, None) => {
                            return Err(AppError::validation(
                                "source_warehouse_id",
                                "Truck transfers need a source or destination warehouse",
                            ));
                        }
                    }
                }
                StockDocType::AdjustScrap | StockDocType::AdjustVariance => {
                    let dest = self.required_warehouse(document.dest_warehouse_id)?;
                    LedgerMutation::Adjust {
                        key: StockKey::on_hand(dest, variant_id),
                        quantity: line.quantity,
                    }
                }
            };
            mutations.push(mutation);
        }
        Ok(mutations)
    }

    fn required_warehouse(&self, warehouse_id: Option<Uuid>) -> AppResult<Uuid> {
        warehouse_id.ok_or_else(|| {
            AppError::validation("warehouse", "Warehouse is required for this document type")
        })
    }

    fn positive_line_quantity(&self, quantity: Decimal) -> AppResult<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(
                "quantity",
                "Line quantity must be positive for this document type",
            ));
        }
        Ok(quantity)
    }

    pub fn get_document(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        self.documents
            .get(tenant_id, document_id)
            .ok_or_else(|| AppError::NotFound(format!("document '{}'", document_id)))
    }

    /// List documents for a tenant, number-ordered and paged
    pub fn list_documents(
        &self,
        tenant_id: Uuid,
        filter: &DocumentFilter,
        pagination: &Pagination,
    ) -> PaginatedResponse<StockDocument> {
        PaginatedResponse::paginate(self.documents.list(tenant_id, filter), pagination)
    }

    pub(crate) fn documents(&self) -> &Arc<dyn StockDocumentRepository> {
        &self.documents
    }
}
