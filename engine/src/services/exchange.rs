//! Exchange calculator
//!
//! An exchange sale delivers full cylinders and expects the same number of
//! empties back. A shortfall means the customer keeps cylinders and pays
//! the deposit; a surplus means deposits come back as refunds. The maths is
//! pure; the service wrapper resolves the deposit SKU through the catalog.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{validate_cylinder_count, VariantRoleKind};

use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogService;

/// Why a deposit adjustment line was emitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeAdjustmentReason {
    /// Fewer empties returned than cylinders delivered
    CylinderShortage,
    /// More empties returned than cylinders delivered
    CylinderExcess,
}

/// A deposit-liability movement implied by an unbalanced exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAdjustment {
    pub deposit_variant_id: Uuid,
    pub deposit_sku: String,
    /// Positive charges a deposit, negative refunds one
    pub quantity: i64,
    pub reason: ExchangeAdjustmentReason,
}

/// Outcome of an exchange calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub exchange_required: bool,
    /// Empties expected back, equal to the ordered quantity
    pub empties_required: i64,
    pub shortage: i64,
    pub excess: i64,
    pub adjustment_lines: Vec<DepositAdjustment>,
}

impl ExchangeResult {
    fn no_exchange() -> Self {
        Self {
            exchange_required: false,
            empties_required: 0,
            shortage: 0,
            excess: 0,
            adjustment_lines: Vec::new(),
        }
    }
}

/// Shortage/excess figures for an exchange, before SKU resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeFigures {
    pub empties_required: i64,
    pub shortage: i64,
    pub excess: i64,
}

/// Pure exchange arithmetic: `shortage = max(0, ordered - returned)`,
/// `excess = max(0, returned - ordered)`. Total for all inputs >= 0.
pub fn calculate_exchange(ordered: i64, returned: i64) -> AppResult<ExchangeFigures> {
    validate_cylinder_count(ordered)
        .map_err(|msg| AppError::InvalidQuantity(format!("ordered: {msg}")))?;
    validate_cylinder_count(returned)
        .map_err(|msg| AppError::InvalidQuantity(format!("returned: {msg}")))?;

    Ok(ExchangeFigures {
        empties_required: ordered,
        shortage: (ordered - returned).max(0),
        excess: (returned - ordered).max(0),
    })
}

/// Exchange calculator resolving deposit siblings through the catalog
#[derive(Clone)]
pub struct ExchangeCalculator {
    catalog: CatalogService,
}

impl ExchangeCalculator {
    pub fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    /// Compute the exchange outcome for an order of a service SKU.
    ///
    /// Non-exchange service SKUs produce an empty result; exchange SKUs
    /// without a same-size deposit sibling are a configuration error.
    pub fn calculate_for_sku(
        &self,
        tenant_id: Uuid,
        service_sku: &str,
        ordered: i64,
        returned: i64,
    ) -> AppResult<ExchangeResult> {
        let service = self.catalog.get_variant(tenant_id, service_sku)?;
        if service.role_kind() != VariantRoleKind::ConsumableService {
            return Err(AppError::validation(
                "sku",
                format!("'{}' is not a consumable service SKU", service_sku),
            ));
        }
        if !service.requires_exchange() {
            return Ok(ExchangeResult::no_exchange());
        }

        let figures = calculate_exchange(ordered, returned)?;

        let mut adjustment_lines = Vec::new();
        if figures.shortage > 0 || figures.excess > 0 {
            let deposit =
                self.catalog
                    .sibling(tenant_id, &service, VariantRoleKind::DepositLiability)?;
            if figures.shortage > 0 {
                adjustment_lines.push(DepositAdjustment {
                    deposit_variant_id: deposit.id,
                    deposit_sku: deposit.sku.clone(),
                    quantity: figures.shortage,
                    reason: ExchangeAdjustmentReason::CylinderShortage,
                });
            }
            if figures.excess > 0 {
                adjustment_lines.push(DepositAdjustment {
                    deposit_variant_id: deposit.id,
                    deposit_sku: deposit.sku,
                    quantity: -figures.excess,
                    reason: ExchangeAdjustmentReason::CylinderExcess,
                });
            }
        }

        tracing::info!(
            tenant_id = %tenant_id,
            sku = service_sku,
            ordered,
            returned,
            shortage = figures.shortage,
            excess = figures.excess,
            "Exchange calculated"
        );

        Ok(ExchangeResult {
            exchange_required: true,
            empties_required: figures.empties_required,
            shortage: figures.shortage,
            excess: figures.excess,
            adjustment_lines,
        })
    }
}
