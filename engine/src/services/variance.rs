//! Variance workflow
//!
//! Physical-count reconciliation rides on the document engine: a variance
//! document is an `AdjustVariance` stock document that starts in Draft,
//! gets confirmed, and must pass an approval gate before posting.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared::{
    PhysicalCount, StockDocStatus, StockDocType, StockDocument, StockDocumentLine,
    VarianceDetails, VarianceReason,
};

use crate::error::{AppError, AppResult};
use crate::services::document::{CreateDocumentInput, StockDocumentService};
use crate::store::{StockDocumentRepository, VariantRepository};

/// Variance workflow service
#[derive(Clone)]
pub struct VarianceService {
    documents: StockDocumentService,
    variants: Arc<dyn VariantRepository>,
    /// Policy from configuration; stamped onto every document created here
    approval_required: bool,
}

impl VarianceService {
    pub fn new(
        documents: StockDocumentService,
        variants: Arc<dyn VariantRepository>,
        approval_required: bool,
    ) -> Self {
        Self {
            documents,
            variants,
            approval_required,
        }
    }

    /// Build a Draft variance document from a physical count. Counts that
    /// match the system quantity produce no line.
    pub fn create_from_physical_count(
        &self,
        tenant_id: Uuid,
        warehouse_id: Uuid,
        reason: VarianceReason,
        counts: &[PhysicalCount],
    ) -> AppResult<StockDocument> {
        for count in counts {
            if self.variants.get_by_id(tenant_id, count.variant_id).is_none() {
                return Err(AppError::NotFound(format!(
                    "variant '{}'",
                    count.variant_id
                )));
            }
        }

        let mut document = self.documents.create_with_status(
            CreateDocumentInput {
                tenant_id,
                doc_type: StockDocType::AdjustVariance,
                source_warehouse_id: None,
                dest_warehouse_id: Some(warehouse_id),
                reference: None,
            },
            StockDocStatus::Draft,
            Some(VarianceDetails {
                reason,
                approval_required: self.approval_required,
                approved_by: None,
                approved_at: None,
            }),
        )?;

        for count in counts {
            let variance = count.variance();
            if variance.is_zero() {
                continue;
            }
            let mut line = StockDocumentLine::for_variant(count.variant_id, variance, None);
            line.system_quantity = Some(count.system_quantity);
            line.actual_quantity = Some(count.actual_quantity);
            document.lines.push(line);
        }
        document.recompute_total();
        let document = self.documents.documents().update(document)?;

        tracing::info!(
            tenant_id = %tenant_id,
            doc_number = %document.doc_number,
            counts = counts.len(),
            lines = document.lines.len(),
            "Variance document created from physical count"
        );
        Ok(document)
    }

    fn variance_document(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let document = self.documents.get_document(tenant_id, document_id)?;
        if document.doc_type != StockDocType::AdjustVariance || document.variance.is_none() {
            return Err(AppError::VarianceStatus(format!(
                "document {} is not a variance document",
                document.doc_number
            )));
        }
        Ok(document)
    }

    /// Confirm the count: Draft -> Open, requires at least one line
    pub fn confirm(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let mut document = self.variance_document(tenant_id, document_id)?;
        if document.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "Variance document has no differing counts to confirm",
            ));
        }
        let previous = document.status;
        document.transition(StockDocStatus::Open)?;
        self.documents.documents().update_expecting(document, previous)
    }

    /// Record the approval. Allowed in Draft or Open; re-approval fails.
    pub fn approve(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
        approved_by: Uuid,
    ) -> AppResult<StockDocument> {
        let mut document = self.variance_document(tenant_id, document_id)?;
        if document.status.is_terminal() {
            return Err(AppError::VarianceStatus(format!(
                "document {} is {} and cannot be approved",
                document.doc_number, document.status
            )));
        }

        let details = document
            .variance
            .as_mut()
            .ok_or_else(|| AppError::VarianceStatus("missing variance details".to_string()))?;
        if details.is_approved() {
            return Err(AppError::VarianceStatus(format!(
                "document {} is already approved",
                document.doc_number
            )));
        }
        details.approved_by = Some(approved_by);
        details.approved_at = Some(Utc::now());
        document.updated_at = Utc::now();
        let document = self.documents.documents().update(document)?;

        tracing::info!(
            tenant_id = %tenant_id,
            doc_number = %document.doc_number,
            approved_by = %approved_by,
            "Variance document approved"
        );
        Ok(document)
    }

    /// Post the variance, enforcing the approval gate before delegating to
    /// the document engine
    pub fn post(&self, tenant_id: Uuid, document_id: Uuid) -> AppResult<StockDocument> {
        let document = self.variance_document(tenant_id, document_id)?;
        if let Some(details) = &document.variance {
            if details.approval_required && !details.is_approved() {
                return Err(AppError::VarianceStatus(format!(
                    "document {} requires approval before posting",
                    document.doc_number
                )));
            }
        }
        self.documents.post(tenant_id, document_id)
    }
}
