//! Variance workflow tests
//!
//! Covers the physical-count reconciliation flow: Draft creation from a
//! count sheet, confirmation, the approval gate, and posting the resulting
//! adjustment against the ledger.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use engine::services::catalog::CreateVariantInput;
use engine::services::document::CreateDocumentInput;
use engine::services::{
    CatalogService, StockDocumentService, StockLedgerService, VarianceService,
};
use engine::store::{MemoryStore, WarehouseRepository};
use shared::{
    CylinderState, PhysicalAttributes, PhysicalCount, StockDocStatus, StockDocType, StockKey,
    VariantRole, VarianceReason, Warehouse, WarehouseRole,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    tenant: Uuid,
    catalog: CatalogService,
    documents: StockDocumentService,
    ledger: StockLedgerService,
    variance: VarianceService,
    warehouse: Uuid,
    cylinder: Uuid,
}

fn setup_with_approval(approval_required: bool) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let tenant = Uuid::new_v4();

    let warehouse = Warehouse {
        id: Uuid::new_v4(),
        tenant_id: tenant,
        code: "MAIN".to_string(),
        name: "Main storage".to_string(),
        role: WarehouseRole::Storage,
        active: true,
        created_at: Utc::now(),
    };
    let warehouse_id = warehouse.id;
    store.insert(warehouse).unwrap();

    let catalog = CatalogService::new(store.clone());
    let cylinder = catalog
        .create_variant(CreateVariantInput {
            tenant_id: tenant,
            product_id: Uuid::new_v4(),
            sku: "CYL-12F".to_string(),
            name: "12kg cylinder (full)".to_string(),
            role: VariantRole::PhysicalAsset {
                state: CylinderState::Full,
            },
            physical: Some(PhysicalAttributes {
                tare_weight_kg: Some(dec("14.5")),
                gross_weight_kg: Some(dec("26.5")),
                capacity_kg: Some(dec("12.0")),
            }),
            deposit_amount: None,
            size_group: Some("12KG".to_string()),
        })
        .unwrap();

    let documents = StockDocumentService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let ledger = StockLedgerService::new(store.clone(), store.clone());
    let variance = VarianceService::new(documents.clone(), store.clone(), approval_required);

    Fixture {
        tenant,
        catalog,
        documents,
        ledger,
        variance,
        warehouse: warehouse_id,
        cylinder: cylinder.id,
    }
}

fn setup() -> Fixture {
    setup_with_approval(true)
}

fn count(variant_id: Uuid, system: &str, actual: &str) -> PhysicalCount {
    PhysicalCount {
        variant_id,
        system_quantity: dec(system),
        actual_quantity: dec(actual),
    }
}

fn seed_stock(f: &Fixture, quantity: &str) {
    let key = StockKey::on_hand(f.warehouse, f.cylinder);
    f.ledger.receive(f.tenant, key, dec(quantity), None).unwrap();
}

#[test]
fn test_count_sheet_builds_draft_with_differences_only() {
    let f = setup();
    let matched = Uuid::new_v4();
    // The second variant does not exist; counts are validated up front.
    let err = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(matched, "10", "10")],
        )
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(f.cylinder, "100", "97")],
        )
        .unwrap();
    assert_eq!(doc.status, StockDocStatus::Draft);
    assert_eq!(doc.doc_type, StockDocType::AdjustVariance);
    assert!(doc.doc_number.starts_with("ADV-"));
    assert_eq!(doc.lines.len(), 1);

    let line = &doc.lines[0];
    assert_eq!(line.quantity, dec("-3"));
    assert_eq!(line.system_quantity, Some(dec("100")));
    assert_eq!(line.actual_quantity, Some(dec("97")));

    let details = doc.variance.as_ref().unwrap();
    assert_eq!(details.reason, VarianceReason::PhysicalCount);
    assert!(details.approval_required);
    assert!(!details.is_approved());
}

#[test]
fn test_matching_counts_produce_no_lines() {
    let f = setup();
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(f.cylinder, "50", "50")],
        )
        .unwrap();
    assert!(doc.lines.is_empty());

    // Nothing to confirm on a clean count.
    let err = f.variance.confirm(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[test]
fn test_confirm_moves_draft_to_open() {
    let f = setup();
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::DamagedGoods,
            &[count(f.cylinder, "20", "18")],
        )
        .unwrap();

    let doc = f.variance.confirm(f.tenant, doc.id).unwrap();
    assert_eq!(doc.status, StockDocStatus::Open);

    let err = f.variance.confirm(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
}

#[test]
fn test_approval_gate_blocks_posting() {
    let f = setup();
    seed_stock(&f, "20");
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::TheftLoss,
            &[count(f.cylinder, "20", "18")],
        )
        .unwrap();
    f.variance.confirm(f.tenant, doc.id).unwrap();

    let err = f.variance.post(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
    // The gate fires before any ledger work.
    let key = StockKey::on_hand(f.warehouse, f.cylinder);
    assert_eq!(f.ledger.available(f.tenant, key).unwrap(), dec("20"));

    f.variance
        .approve(f.tenant, doc.id, Uuid::new_v4())
        .unwrap();
    let posted = f.variance.post(f.tenant, doc.id).unwrap();
    assert_eq!(posted.status, StockDocStatus::Posted);
    assert_eq!(f.ledger.available(f.tenant, key).unwrap(), dec("18"));
}

#[test]
fn test_approve_records_who_and_when() {
    let f = setup();
    let approver = Uuid::new_v4();
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::SystemError,
            &[count(f.cylinder, "5", "8")],
        )
        .unwrap();

    // Approval is allowed while still in Draft.
    let doc = f.variance.approve(f.tenant, doc.id, approver).unwrap();
    let details = doc.variance.as_ref().unwrap();
    assert_eq!(details.approved_by, Some(approver));
    assert!(details.approved_at.is_some());

    let err = f
        .variance
        .approve(f.tenant, doc.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
}

#[test]
fn test_draft_cannot_post_even_when_approved() {
    let f = setup();
    seed_stock(&f, "10");
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::FoundStock,
            &[count(f.cylinder, "10", "12")],
        )
        .unwrap();
    f.variance
        .approve(f.tenant, doc.id, Uuid::new_v4())
        .unwrap();

    // Still Draft; it has to be confirmed first.
    let err = f.variance.post(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE_TRANSITION");
}

#[test]
fn test_posted_variance_cannot_be_approved_again() {
    let f = setup_with_approval(false);
    seed_stock(&f, "10");
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(f.cylinder, "10", "9")],
        )
        .unwrap();
    f.variance.confirm(f.tenant, doc.id).unwrap();
    f.variance.post(f.tenant, doc.id).unwrap();

    let err = f
        .variance
        .approve(f.tenant, doc.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
}

#[test]
fn test_no_approval_policy_posts_directly() {
    let f = setup_with_approval(false);
    seed_stock(&f, "50");
    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(f.cylinder, "50", "47")],
        )
        .unwrap();
    assert!(!doc.variance.as_ref().unwrap().approval_required);

    f.variance.confirm(f.tenant, doc.id).unwrap();
    f.variance.post(f.tenant, doc.id).unwrap();

    let key = StockKey::on_hand(f.warehouse, f.cylinder);
    assert_eq!(f.ledger.available(f.tenant, key).unwrap(), dec("47"));
}

#[test]
fn test_multi_variant_count_posts_all_lines() {
    let f = setup_with_approval(false);
    let empty = f
        .catalog
        .create_variant(CreateVariantInput {
            tenant_id: f.tenant,
            product_id: Uuid::new_v4(),
            sku: "CYL-12E".to_string(),
            name: "12kg cylinder (empty)".to_string(),
            role: VariantRole::PhysicalAsset {
                state: CylinderState::Empty,
            },
            physical: Some(PhysicalAttributes {
                tare_weight_kg: Some(dec("14.5")),
                gross_weight_kg: Some(dec("26.5")),
                capacity_kg: Some(dec("12.0")),
            }),
            deposit_amount: None,
            size_group: None,
        })
        .unwrap();

    seed_stock(&f, "100");
    let empty_key = StockKey::on_hand(f.warehouse, empty.id);
    f.ledger.receive(f.tenant, empty_key, dec("30"), None).unwrap();

    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[
                count(f.cylinder, "100", "97"),
                count(empty.id, "30", "32"),
            ],
        )
        .unwrap();
    assert_eq!(doc.lines.len(), 2);
    assert_eq!(doc.total_quantity, dec("-1"));

    f.variance.confirm(f.tenant, doc.id).unwrap();
    f.variance.post(f.tenant, doc.id).unwrap();

    let full_key = StockKey::on_hand(f.warehouse, f.cylinder);
    assert_eq!(f.ledger.available(f.tenant, full_key).unwrap(), dec("97"));
    assert_eq!(f.ledger.available(f.tenant, empty_key).unwrap(), dec("32"));
}

#[test]
fn test_non_variance_document_rejected_by_workflow() {
    let f = setup();
    let doc = f
        .documents
        .create_document(CreateDocumentInput {
            tenant_id: f.tenant,
            doc_type: StockDocType::ReceiptSupplier,
            source_warehouse_id: None,
            dest_warehouse_id: Some(f.warehouse),
            reference: None,
        })
        .unwrap();

    let err = f.variance.confirm(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
    let err = f
        .variance
        .approve(f.tenant, doc.id, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
    let err = f.variance.post(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "VARIANCE_STATUS_ERROR");
}

#[test]
fn test_failed_variance_post_reverts_to_open() {
    let f = setup_with_approval(false);
    seed_stock(&f, "10");
    let key = StockKey::on_hand(f.warehouse, f.cylinder);
    // A reservation puts a floor under the adjustment.
    f.ledger.reserve(f.tenant, key, dec("9"), false).unwrap();

    let doc = f
        .variance
        .create_from_physical_count(
            f.tenant,
            f.warehouse,
            VarianceReason::PhysicalCount,
            &[count(f.cylinder, "10", "7")],
        )
        .unwrap();
    f.variance.confirm(f.tenant, doc.id).unwrap();

    let err = f.variance.post(f.tenant, doc.id).unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");

    let doc = f.documents.get_document(f.tenant, doc.id).unwrap();
    assert_eq!(doc.status, StockDocStatus::Open);
    assert_eq!(
        f.ledger.available(f.tenant, key).unwrap(),
        dec("1")
    );
}
