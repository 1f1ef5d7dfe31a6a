//! Bundle expander
//!
//! Outright sales bill a bundle SKU; at order time the bundle explodes into
//! its physical and deposit components so downstream ledger logic can tell
//! inventory-affecting lines from liability-only lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{validate_positive_quantity, VariantRoleKind};

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;

/// One expanded order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: String,
    pub variant_id: Uuid,
    pub quantity: Decimal,
    /// Role tag the orders workflow uses to route the line
    pub role: VariantRoleKind,
}

/// Bundle expander backed by the catalog
#[derive(Clone)]
pub struct BundleExpander {
    catalog: CatalogService,
}

impl BundleExpander {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    /// Explode `quantity` units of a bundle SKU into component order lines
    pub fn explode_for_order(
        &self,
        tenant_id: Uuid,
        bundle_sku: &str,
        quantity: Decimal,
    ) -> AppResult<Vec<OrderLine>> {
        validate_positive_quantity(quantity)
            .map_err(|msg| AppError::InvalidQuantity(msg.to_string()))?;

        let bundle = self.catalog.get_variant(tenant_id, bundle_sku)?;
        let components = bundle
            .bundle_components()
            .ok_or_else(|| AppError::NotABundle(bundle_sku.to_string()))?;

        let mut lines = Vec::with_capacity(components.len());
        for component in components {
            let resolved = self.catalog.get_variant(tenant_id, &component.sku)?;
            lines.push(OrderLine {
                sku: resolved.sku,
                variant_id: resolved.id,
                quantity: component.quantity * quantity,
                role: component.role,
            });
        }

        tracing::info!(
            tenant_id = %tenant_id,
            sku = bundle_sku,
            %quantity,
            lines = lines.len(),
            "Bundle exploded"
        );
        Ok(lines)
    }
}
