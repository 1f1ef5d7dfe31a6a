//! Reporting and alert queries
//!
//! Read-only views for dashboards: per-variant stock summaries with
//! valuation, low-stock rows against a configurable threshold, and
//! negative-stock rows flagging unreconciled shortages. No query here
//! mutates anything.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{LowStockRow, NegativeStockRow, VariantStockSummary};

use crate::error::AppResult;
use crate::store::{StockLevelRepository, VariantRepository};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    levels: Arc<dyn StockLevelRepository>,
    variants: Arc<dyn VariantRepository>,
    /// Default threshold for low-stock alerts, in cylinder units
    default_low_stock_threshold: Decimal,
}

impl ReportingService {
    pub fn new(
        levels: Arc<dyn StockLevelRepository>,
        variants: Arc<dyn VariantRepository>,
        default_low_stock_threshold: i64,
    ) -> Self {
        Self {
            levels,
            variants,
            default_low_stock_threshold: Decimal::from(default_low_stock_threshold),
        }
    }

    /// Per-variant totals across every warehouse and bucket
    pub fn stock_summary(&self, tenant_id: Uuid) -> AppResult<Vec<VariantStockSummary>> {
        let mut grouped: HashMap<Uuid, VariantStockSummary> = HashMap::new();
        let mut warehouses_seen: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

        for level in self.levels.list(tenant_id) {
            let sku = match self.variants.get_by_id(tenant_id, level.variant_id) {
                Some(variant) => variant.sku,
                None => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        variant_id = %level.variant_id,
                        "Stock level references a variant missing from the catalog"
                    );
                    level.variant_id.to_string()
                }
            };
            let entry = grouped
                .entry(level.variant_id)
                .or_insert_with(|| VariantStockSummary {
                    variant_id: level.variant_id,
                    sku,
                    total_quantity: Decimal::ZERO,
                    total_reserved: Decimal::ZERO,
                    total_available: Decimal::ZERO,
                    total_cost: Decimal::ZERO,
                    warehouse_count: 0,
                });
            entry.total_quantity += level.quantity;
            entry.total_reserved += level.reserved_quantity;
            entry.total_available += level.available_quantity();
            entry.total_cost += level.total_cost;

            let seen = warehouses_seen.entry(level.variant_id).or_default();
            if !seen.contains(&level.warehouse_id) {
                seen.push(level.warehouse_id);
            }
        }

        let mut summaries: Vec<VariantStockSummary> = grouped
            .into_iter()
            .map(|(variant_id, mut summary)| {
                summary.warehouse_count = warehouses_seen
                    .get(&variant_id)
                    .map(|w| w.len())
                    .unwrap_or(0);
                summary
            })
            .collect();
        summaries.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(summaries)
    }

    /// Stock rows whose available quantity sits at or below the threshold.
    /// Only rows that have seen movement are evaluated; a variant that was
    /// never stocked in a warehouse does not alert.
    pub fn low_stock(
        &self,
        tenant_id: Uuid,
        threshold: Option<Decimal>,
    ) -> AppResult<Vec<LowStockRow>> {
        let threshold = threshold.unwrap_or(self.default_low_stock_threshold);
        let mut rows: Vec<LowStockRow> = self
            .levels
            .list(tenant_id)
            .into_iter()
            .filter(|level| level.available_quantity() <= threshold)
            .map(|level| LowStockRow {
                warehouse_id: level.warehouse_id,
                variant_id: level.variant_id,
                bucket: level.bucket,
                available_quantity: level.available_quantity(),
                threshold,
            })
            .collect();
        rows.sort_by_key(|row| (row.warehouse_id, row.variant_id));

        if !rows.is_empty() {
            tracing::warn!(
                tenant_id = %tenant_id,
                alerts = rows.len(),
                %threshold,
                "Low stock detected"
            );
        }
        Ok(rows)
    }

    /// Stock rows whose recorded quantity has gone negative
    pub fn negative_stock(&self, tenant_id: Uuid) -> AppResult<Vec<NegativeStockRow>> {
        let mut rows: Vec<NegativeStockRow> = self
            .levels
            .list(tenant_id)
            .into_iter()
            .filter(|level| level.is_negative())
            .map(|level| NegativeStockRow {
                warehouse_id: level.warehouse_id,
                variant_id: level.variant_id,
                bucket: level.bucket,
                quantity: level.quantity,
            })
            .collect();
        rows.sort_by_key(|row| (row.warehouse_id, row.variant_id));
        Ok(rows)
    }
}
