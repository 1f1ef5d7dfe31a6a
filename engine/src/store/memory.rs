//! In-memory store
//!
//! Deterministic implementation of every repository trait, used by tests
//! and embedded deployments. One mutex per collection: ledger batches are
//! staged against copies of the touched rows and committed only when every
//! mutation validates, which gives the all-or-nothing and no-lost-update
//! guarantees the engine requires.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    StockDocStatus, StockDocType, StockDocument, StockKey, StockLevel, Variant, VariantRoleKind,
    Warehouse,
};

use crate::error::{AppError, AppResult};

use super::{
    DocumentFilter, LedgerMutation, StockDocumentRepository, StockLevelRepository,
    VariantRepository, WarehouseRepository,
};

/// In-memory backing store for all engine repositories
#[derive(Default)]
pub struct MemoryStore {
    variants: Mutex<HashMap<(Uuid, Uuid), Variant>>,
    warehouses: Mutex<HashMap<(Uuid, Uuid), Warehouse>>,
    levels: Mutex<HashMap<(Uuid, StockKey), StockLevel>>,
    documents: Mutex<HashMap<(Uuid, Uuid), StockDocument>>,
    doc_sequences: Mutex<HashMap<(Uuid, StockDocType), u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Recover the guard even when a writer panicked; the maps stay usable
/// because every batch commits only fully-validated state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl VariantRepository for MemoryStore {
    fn insert(&self, variant: Variant) -> AppResult<()> {
        let mut variants = lock(&self.variants);
        let duplicate = variants
            .values()
            .any(|v| v.tenant_id == variant.tenant_id && v.sku == variant.sku);
        if duplicate {
            return Err(AppError::DuplicateEntry(format!(
                "variant SKU '{}'",
                variant.sku
            )));
        }
        variants.insert((variant.tenant_id, variant.id), variant);
        Ok(())
    }

    fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> Option<Variant> {
        lock(&self.variants).get(&(tenant_id, id)).cloned()
    }

    fn get_by_sku(&self, tenant_id: Uuid, sku: &str) -> Option<Variant> {
        lock(&self.variants)
            .values()
            .find(|v| v.tenant_id == tenant_id && v.sku == sku)
            .cloned()
    }

    fn update(&self, variant: Variant) -> AppResult<()> {
        let mut variants = lock(&self.variants);
        let key = (variant.tenant_id, variant.id);
        if !variants.contains_key(&key) {
            return Err(AppError::NotFound(format!("variant '{}'", variant.sku)));
        }
        variants.insert(key, variant);
        Ok(())
    }

    fn find_sibling(
        &self,
        tenant_id: Uuid,
        size_group: &str,
        kind: VariantRoleKind,
    ) -> Option<Variant> {
        lock(&self.variants)
            .values()
            .find(|v| {
                v.tenant_id == tenant_id
                    && v.active
                    && v.role_kind() == kind
                    && v.size_group.as_deref() == Some(size_group)
            })
            .cloned()
    }

    fn list(&self, tenant_id: Uuid) -> Vec<Variant> {
        let mut all: Vec<Variant> = lock(&self.variants)
            .values()
            .filter(|v| v.tenant_id == tenant_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.sku.cmp(&b.sku));
        all
    }
}

impl WarehouseRepository for MemoryStore {
    fn insert(&self, warehouse: Warehouse) -> AppResult<()> {
        let mut warehouses = lock(&self.warehouses);
        let duplicate = warehouses
            .values()
            .any(|w| w.tenant_id == warehouse.tenant_id && w.code == warehouse.code);
        if duplicate {
            return Err(AppError::DuplicateEntry(format!(
                "warehouse code '{}'",
                warehouse.code
            )));
        }
        warehouses.insert((warehouse.tenant_id, warehouse.id), warehouse);
        Ok(())
    }

    fn get(&self, tenant_id: Uuid, id: Uuid) -> Option<Warehouse> {
        lock(&self.warehouses).get(&(tenant_id, id)).cloned()
    }

    fn list(&self, tenant_id: Uuid) -> Vec<Warehouse> {
        let mut all: Vec<Warehouse> = lock(&self.warehouses)
            .values()
            .filter(|w| w.tenant_id == tenant_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }
}

impl StockLevelRepository for MemoryStore {
    fn apply(&self, tenant_id: Uuid, mutations: &[LedgerMutation]) -> AppResult<Vec<StockLevel>> {
        if mutations.is_empty() {
            return Ok(Vec::new());
        }

        let mut levels = lock(&self.levels);
        let now = Utc::now();

        // Stage copies of every touched row; lazily create missing rows.
        let mut staged: HashMap<StockKey, StockLevel> = HashMap::new();
        let mut touched: Vec<StockKey> = Vec::new();
        for mutation in mutations {
            for key in mutation.keys() {
                if !staged.contains_key(&key) {
                    let row = levels
                        .get(&(tenant_id, key))
                        .cloned()
                        .unwrap_or_else(|| StockLevel::empty(tenant_id, key));
                    staged.insert(key, row);
                    touched.push(key);
                }
            }
        }

        // Validate and apply against the staged copies; any failure leaves
        // the committed map untouched.
        for mutation in mutations {
            apply_mutation(&mut staged, mutation, now)?;
        }

        let mut applied = Vec::with_capacity(touched.len());
        for key in touched {
            if let Some(row) = staged.remove(&key) {
                levels.insert((tenant_id, key), row.clone());
                applied.push(row);
            }
        }
        Ok(applied)
    }

    fn get(&self, tenant_id: Uuid, key: StockKey) -> Option<StockLevel> {
        lock(&self.levels).get(&(tenant_id, key)).cloned()
    }

    fn list(&self, tenant_id: Uuid) -> Vec<StockLevel> {
        lock(&self.levels)
            .iter()
            .filter(|((tenant, _), _)| *tenant == tenant_id)
            .map(|(_, level)| level.clone())
            .collect()
    }

    fn list_for_variant(&self, tenant_id: Uuid, variant_id: Uuid) -> Vec<StockLevel> {
        lock(&self.levels)
            .iter()
            .filter(|((tenant, key), _)| *tenant == tenant_id && key.variant_id == variant_id)
            .map(|(_, level)| level.clone())
            .collect()
    }

    fn list_for_warehouse(&self, tenant_id: Uuid, warehouse_id: Uuid) -> Vec<StockLevel> {
        lock(&self.levels)
            .iter()
            .filter(|((tenant, key), _)| *tenant == tenant_id && key.warehouse_id == warehouse_id)
            .map(|(_, level)| level.clone())
            .collect()
    }
}

fn apply_mutation(
    staged: &mut HashMap<StockKey, StockLevel>,
    mutation: &LedgerMutation,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match mutation {
        LedgerMutation::Receive {
            key,
            quantity,
            unit_cost,
        } => {
            let level = staged_row(staged, key)?;
            receive_into(level, *quantity, *unit_cost, now)
        }
        LedgerMutation::Issue {
            key,
            quantity,
            allow_negative,
        } => {
            let level = staged_row(staged, key)?;
            issue_from(level, *quantity, *allow_negative, now)
        }
        LedgerMutation::Reserve {
            key,
            quantity,
            allow_shortfall,
        } => {
            let level = staged_row(staged, key)?;
            require_positive(*quantity)?;
            let new_reserved = level.reserved_quantity + quantity;
            if !allow_shortfall && new_reserved > level.quantity {
                return Err(AppError::InsufficientStock {
                    requested: *quantity,
                    available: level.available_quantity(),
                });
            }
            level.reserved_quantity = new_reserved;
            level.last_transaction_at = Some(now);
            Ok(())
        }
        LedgerMutation::Release { key, quantity } => {
            let level = staged_row(staged, key)?;
            require_positive(*quantity)?;
            if *quantity > level.reserved_quantity {
                return Err(AppError::InvalidStockOperation(format!(
                    "release of {} exceeds reserved {}",
                    quantity, level.reserved_quantity
                )));
            }
            level.reserved_quantity -= quantity;
            level.last_transaction_at = Some(now);
            Ok(())
        }
        LedgerMutation::Transfer { from, to, quantity } => {
            if from == to {
                return Err(AppError::InvalidStockOperation(
                    "transfer endpoints must differ".to_string(),
                ));
            }
            let carried_cost = {
                let source = staged_row(staged, from)?;
                let cost = source.unit_cost;
                issue_from(source, *quantity, false, now)?;
                cost
            };
            let dest = staged_row(staged, to)?;
            receive_into(dest, *quantity, carried_cost, now)
        }
        LedgerMutation::Adjust { key, quantity } => {
            let level = staged_row(staged, key)?;
            if *quantity == Decimal::ZERO {
                return Err(AppError::InvalidQuantity(
                    "adjustment quantity cannot be zero".to_string(),
                ));
            }
            let new_quantity = level.quantity + quantity;
            if new_quantity < level.reserved_quantity {
                return Err(AppError::validation(
                    "quantity",
                    format!(
                        "adjustment would drop quantity to {} below reserved {}",
                        new_quantity, level.reserved_quantity
                    ),
                ));
            }
            level.quantity = new_quantity;
            level.total_cost = level.unit_cost.unwrap_or(Decimal::ZERO) * new_quantity;
            level.last_transaction_at = Some(now);
            Ok(())
        }
    }
}

fn staged_row<'a>(
    staged: &'a mut HashMap<StockKey, StockLevel>,
    key: &StockKey,
) -> AppResult<&'a mut StockLevel> {
    staged
        .get_mut(key)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("stock level not staged for {:?}", key)))
}

fn require_positive(quantity: Decimal) -> AppResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

fn receive_into(
    level: &mut StockLevel,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    require_positive(quantity)?;
    let incoming_cost = unit_cost.or(level.unit_cost);
    let new_quantity = level.quantity + quantity;
    if let Some(cost) = incoming_cost {
        let incoming_value = quantity * cost;
        let new_total = level.total_cost + incoming_value;
        // Weighted-average cost over the new on-record quantity
        if new_quantity > Decimal::ZERO {
            level.unit_cost = Some(new_total / new_quantity);
        } else {
            level.unit_cost = Some(cost);
        }
        level.total_cost = new_total;
    }
    level.quantity = new_quantity;
    level.last_transaction_at = Some(now);
    Ok(())
}

fn issue_from(
    level: &mut StockLevel,
    quantity: Decimal,
    allow_negative: bool,
    now: DateTime<Utc>,
) -> AppResult<()> {
    require_positive(quantity)?;
    let available = level.available_quantity();
    if !allow_negative && available < quantity {
        return Err(AppError::InsufficientStock {
            requested: quantity,
            available,
        });
    }
    level.quantity -= quantity;
    level.total_cost = level.unit_cost.unwrap_or(Decimal::ZERO) * level.quantity;
    level.last_transaction_at = Some(now);
    Ok(())
}

impl StockDocumentRepository for MemoryStore {
    fn next_doc_number(&self, tenant_id: Uuid, doc_type: StockDocType) -> String {
        let mut sequences = lock(&self.doc_sequences);
        let counter = sequences.entry((tenant_id, doc_type)).or_insert(0);
        *counter += 1;
        format!("{}-{:06}", doc_type.prefix(), counter)
    }

    fn insert(&self, document: StockDocument) -> AppResult<()> {
        let mut documents = lock(&self.documents);
        let duplicate = documents
            .values()
            .any(|d| d.tenant_id == document.tenant_id && d.doc_number == document.doc_number);
        if duplicate {
            return Err(AppError::DuplicateEntry(format!(
                "document number '{}'",
                document.doc_number
            )));
        }
        documents.insert((document.tenant_id, document.id), document);
        Ok(())
    }

    fn get(&self, tenant_id: Uuid, id: Uuid) -> Option<StockDocument> {
        lock(&self.documents).get(&(tenant_id, id)).cloned()
    }

    fn update(&self, mut document: StockDocument) -> AppResult<StockDocument> {
        let mut documents = lock(&self.documents);
        let key = (document.tenant_id, document.id);
        let current = documents
            .get(&key)
            .ok_or_else(|| AppError::NotFound(format!("document '{}'", document.doc_number)))?;
        if current.version != document.version {
            return Err(AppError::Conflict(format!(
                "document {} was modified concurrently",
                document.doc_number
            )));
        }
        document.version += 1;
        documents.insert(key, document.clone());
        Ok(document)
    }

    fn update_expecting(
        &self,
        mut document: StockDocument,
        expected: StockDocStatus,
    ) -> AppResult<StockDocument> {
        let mut documents = lock(&self.documents);
        let key = (document.tenant_id, document.id);
        let current = documents
            .get(&key)
            .ok_or_else(|| AppError::NotFound(format!("document '{}'", document.doc_number)))?;
        if current.status != expected {
            return Err(AppError::InvalidStateTransition(format!(
                "document {} is {}, expected {}",
                document.doc_number, current.status, expected
            )));
        }
        if current.version != document.version {
            return Err(AppError::Conflict(format!(
                "document {} was modified concurrently",
                document.doc_number
            )));
        }
        document.version += 1;
        documents.insert(key, document.clone());
        Ok(document)
    }

    fn list(&self, tenant_id: Uuid, filter: &DocumentFilter) -> Vec<StockDocument> {
        let mut all: Vec<StockDocument> = lock(&self.documents)
            .values()
            .filter(|d| d.tenant_id == tenant_id)
            .filter(|d| filter.doc_type.map_or(true, |t| d.doc_type == t))
            .filter(|d| filter.status.map_or(true, |s| d.status == s))
            .filter(|d| {
                filter.warehouse_id.map_or(true, |w| {
                    d.source_warehouse_id == Some(w) || d.dest_warehouse_id == Some(w)
                })
            })
            .filter(|d| {
                filter.created.as_ref().map_or(true, |range| {
                    let created = d.created_at.date_naive();
                    created >= range.start && created <= range.end
                })
            })
            .cloned()
            .collect();
        all.sort_by(|a, b| a.doc_number.cmp(&b.doc_number));
        all
    }
}
