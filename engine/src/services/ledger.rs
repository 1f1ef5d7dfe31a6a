//! Stock ledger service
//!
//! The authoritative quantity store per (warehouse, variant, bucket).
//! Mutations go through `StockLevelRepository::apply`, which serializes
//! them per tenant and applies multi-key batches all-or-nothing, so the
//! availability invariants hold under parallel callers. Reads are served
//! from the committed state without locking.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{StockBucket, StockKey, StockLevel};

use crate::error::{AppError, AppResult};
use crate::store::{LedgerMutation, StockLevelRepository, WarehouseRepository};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLedgerService {
    levels: Arc<dyn StockLevelRepository>,
    warehouses: Arc<dyn WarehouseRepository>,
}

impl StockLedgerService {
    pub fn new(
        levels: Arc<dyn StockLevelRepository>,
        warehouses: Arc<dyn WarehouseRepository>,
    ) -> Self {
        Self { levels, warehouses }
    }

    fn check_warehouse(&self, tenant_id: Uuid, warehouse_id: Uuid) -> AppResult<()> {
        if self.warehouses.get(tenant_id, warehouse_id).is_none() {
            return Err(AppError::NotFound(format!("warehouse '{}'", warehouse_id)));
        }
        Ok(())
    }

    fn apply_single(
        &self,
        tenant_id: Uuid,
        key: StockKey,
        mutation: LedgerMutation,
    ) -> AppResult<StockLevel> {
        let applied = self.levels.apply(tenant_id, &[mutation])?;
        applied
            .into_iter()
            .find(|level| level.key() == key)
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("applied level missing for {:?}", key))
            })
    }

    /// Add stock, recomputing the weighted-average unit cost when a cost
    /// is supplied
    pub fn receive(
        &self,
        tenant_id: Uuid,
        key: StockKey,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
    ) -> AppResult<StockLevel> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        if let Some(cost) = unit_cost {
            if cost < Decimal::ZERO {
                return Err(AppError::validation("unit_cost", "Unit cost cannot be negative"));
            }
        }
        let level = self.apply_single(
            tenant_id,
            key,
            LedgerMutation::Receive {
                key,
                quantity,
                unit_cost,
            },
        )?;
        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %key.warehouse_id,
            variant_id = %key.variant_id,
            bucket = key.bucket.as_str(),
            %quantity,
            "Stock received"
        );
        Ok(level)
    }

    /// Remove stock; fails with insufficient stock unless `allow_negative`
    pub fn issue(
        &self,
        tenant_id: Uuid,
        key: StockKey,
        quantity: Decimal,
        allow_negative: bool,
    ) -> AppResult<StockLevel> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        let level = self.apply_single(
            tenant_id,
            key,
            LedgerMutation::Issue {
                key,
                quantity,
                allow_negative,
            },
        )?;
        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %key.warehouse_id,
            variant_id = %key.variant_id,
            bucket = key.bucket.as_str(),
            %quantity,
            allow_negative,
            "Stock issued"
        );
        Ok(level)
    }

    /// Hold available stock ahead of physical movement. `allow_shortfall`
    /// is the explicit override for reserving past the recorded quantity.
    pub fn reserve(
        &self,
        tenant_id: Uuid,
        key: StockKey,
        quantity: Decimal,
        allow_shortfall: bool,
    ) -> AppResult<StockLevel> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        self.apply_single(
            tenant_id,
            key,
            LedgerMutation::Reserve {
                key,
                quantity,
                allow_shortfall,
            },
        )
    }

    /// Undo a hold; the only non-document "undo" path besides cancel
    pub fn release(&self, tenant_id: Uuid, key: StockKey, quantity: Decimal) -> AppResult<StockLevel> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        self.apply_single(tenant_id, key, LedgerMutation::Release { key, quantity })
    }

    /// Move stock between buckets of one warehouse; both legs apply or
    /// neither does
    pub fn transfer_bucket(
        &self,
        tenant_id: Uuid,
        warehouse_id: Uuid,
        variant_id: Uuid,
        quantity: Decimal,
        from: StockBucket,
        to: StockBucket,
    ) -> AppResult<(StockLevel, StockLevel)> {
        self.check_warehouse(tenant_id, warehouse_id)?;
        if from == to {
            return Err(AppError::InvalidStockOperation(
                "bucket transfer endpoints must differ".to_string(),
            ));
        }
        let from_key = StockKey::new(warehouse_id, variant_id, from);
        let to_key = StockKey::new(warehouse_id, variant_id, to);
        self.transfer(tenant_id, from_key, to_key, quantity)
    }

    /// Move stock between the on-hand buckets of two warehouses
    pub fn transfer_warehouse(
        &self,
        tenant_id: Uuid,
        variant_id: Uuid,
        quantity: Decimal,
        from_warehouse: Uuid,
        to_warehouse: Uuid,
    ) -> AppResult<(StockLevel, StockLevel)> {
        if from_warehouse == to_warehouse {
            return Err(AppError::InvalidStockOperation(
                "warehouse transfer endpoints must differ".to_string(),
            ));
        }
        self.check_warehouse(tenant_id, from_warehouse)?;
        self.check_warehouse(tenant_id, to_warehouse)?;
        let from_key = StockKey::on_hand(from_warehouse, variant_id);
        let to_key = StockKey::on_hand(to_warehouse, variant_id);
        self.transfer(tenant_id, from_key, to_key, quantity)
    }

    fn transfer(
        &self,
        tenant_id: Uuid,
        from: StockKey,
        to: StockKey,
        quantity: Decimal,
    ) -> AppResult<(StockLevel, StockLevel)> {
        let applied = self.levels.apply(
            tenant_id,
            &[LedgerMutation::Transfer { from, to, quantity }],
        )?;
        let source = applied.iter().find(|l| l.key() == from).cloned();
        let dest = applied.iter().find(|l| l.key() == to).cloned();
        match (source, dest) {
            (Some(source), Some(dest)) => {
                tracing::info!(
                    tenant_id = %tenant_id,
                    from_warehouse = %from.warehouse_id,
                    from_bucket = from.bucket.as_str(),
                    to_warehouse = %to.warehouse_id,
                    to_bucket = to.bucket.as_str(),
                    %quantity,
                    "Stock transferred"
                );
                Ok((source, dest))
            }
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "transfer did not return both legs"
            ))),
        }
    }

    /// Signed correction; bypasses availability checks but never takes the
    /// quantity below the reservation floor
    pub fn adjust(&self, tenant_id: Uuid, key: StockKey, quantity: Decimal) -> AppResult<StockLevel> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        let level = self.apply_single(tenant_id, key, LedgerMutation::Adjust { key, quantity })?;
        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %key.warehouse_id,
            variant_id = %key.variant_id,
            bucket = key.bucket.as_str(),
            %quantity,
            "Stock adjusted"
        );
        Ok(level)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Available quantity for a key; zero when no movement has happened yet
    pub fn available(&self, tenant_id: Uuid, key: StockKey) -> AppResult<Decimal> {
        self.check_warehouse(tenant_id, key.warehouse_id)?;
        Ok(self
            .levels
            .get(tenant_id, key)
            .map(|level| level.available_quantity())
            .unwrap_or(Decimal::ZERO))
    }

    /// Available quantity for a variant summed over every warehouse and
    /// bucket
    pub fn total_available_across_warehouses(
        &self,
        tenant_id: Uuid,
        variant_id: Uuid,
    ) -> Decimal {
        self.levels
            .list_for_variant(tenant_id, variant_id)
            .iter()
            .map(|level| level.available_quantity())
            .sum()
    }

    /// All stock rows of one warehouse
    pub fn warehouse_summary(
        &self,
        tenant_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<Vec<StockLevel>> {
        self.check_warehouse(tenant_id, warehouse_id)?;
        let mut rows = self.levels.list_for_warehouse(tenant_id, warehouse_id);
        rows.sort_by_key(|level| (level.variant_id, level.bucket.as_str()));
        Ok(rows)
    }
}
