//! Exchange calculator tests
//!
//! Covers the shortage/excess arithmetic, deposit-sibling resolution, and
//! the exchange scenarios from the business playbook:
//! - order 3, return 3 -> no adjustment
//! - order 5, return 2 -> +3 deposit charge
//! - order 3, return 5 -> -2 deposit refund

use std::str::FromStr;
use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use engine::services::exchange::{calculate_exchange, ExchangeAdjustmentReason};
use engine::services::{CatalogService, ExchangeCalculator};
use engine::services::catalog::CreateVariantInput;
use engine::store::MemoryStore;
use shared::{CylinderState, PhysicalAttributes, VariantRole};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> (Uuid, CatalogService, ExchangeCalculator) {
    let store = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store);
    let calculator = ExchangeCalculator::new(catalog.clone());
    (Uuid::new_v4(), catalog, calculator)
}

fn seed_exchange_catalog(tenant: Uuid, catalog: &CatalogService, requires_exchange: bool) {
    catalog
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
    catalog
        .create_variant(CreateVariantInput {
            tenant_id: tenant,
            product_id: Uuid::new_v4(),
            sku: "DEP-12".to_string(),
            name: "12kg cylinder deposit".to_string(),
            role: VariantRole::DepositLiability,
            physical: None,
            deposit_amount: Some(dec("1500")),
            size_group: Some("12KG".to_string()),
        })
        .unwrap();
    catalog
        .create_variant(CreateVariantInput {
            tenant_id: tenant,
            product_id: Uuid::new_v4(),
            sku: "GAS-12".to_string(),
            name: "12kg gas refill".to_string(),
            role: VariantRole::ConsumableService { requires_exchange },
            physical: None,
            deposit_amount: None,
            size_group: Some("12KG".to_string()),
        })
        .unwrap();
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn test_balanced_exchange_has_no_adjustments() {
        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, true);

        let result = calculator.calculate_for_sku(tenant, "GAS-12", 3, 3).unwrap();
        assert!(result.exchange_required);
        assert_eq!(result.empties_required, 3);
        assert_eq!(result.shortage, 0);
        assert_eq!(result.excess, 0);
        assert!(result.adjustment_lines.is_empty());
    }

    #[test]
    fn test_shortage_charges_deposit() {
        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, true);

        let result = calculator.calculate_for_sku(tenant, "GAS-12", 5, 2).unwrap();
        assert_eq!(result.shortage, 3);
        assert_eq!(result.excess, 0);
        assert_eq!(result.adjustment_lines.len(), 1);

        let line = &result.adjustment_lines[0];
        assert_eq!(line.deposit_sku, "DEP-12");
        assert_eq!(line.quantity, 3);
        assert_eq!(line.reason, ExchangeAdjustmentReason::CylinderShortage);
    }

    #[test]
    fn test_excess_refunds_deposit() {
        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, true);

        let result = calculator.calculate_for_sku(tenant, "GAS-12", 3, 5).unwrap();
        assert_eq!(result.shortage, 0);
        assert_eq!(result.excess, 2);
        assert_eq!(result.adjustment_lines.len(), 1);

        let line = &result.adjustment_lines[0];
        assert_eq!(line.deposit_sku, "DEP-12");
        assert_eq!(line.quantity, -2);
        assert_eq!(line.reason, ExchangeAdjustmentReason::CylinderExcess);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(calculate_exchange(-1, 0).is_err());
        assert!(calculate_exchange(0, -1).is_err());

        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, true);
        let err = calculator
            .calculate_for_sku(tenant, "GAS-12", -3, 0)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_QUANTITY");
    }

    #[test]
    fn test_non_exchange_service_yields_empty_result() {
        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, false);

        let result = calculator.calculate_for_sku(tenant, "GAS-12", 5, 0).unwrap();
        assert!(!result.exchange_required);
        assert!(result.adjustment_lines.is_empty());
    }

    #[test]
    fn test_missing_deposit_sibling_is_configuration_error() {
        let (tenant, catalog, calculator) = setup();
        // Service SKU only; no deposit sibling in the size group.
        catalog
            .create_variant(CreateVariantInput {
                tenant_id: tenant,
                product_id: Uuid::new_v4(),
                sku: "GAS-12".to_string(),
                name: "12kg gas refill".to_string(),
                role: VariantRole::ConsumableService {
                    requires_exchange: true,
                },
                physical: None,
                deposit_amount: None,
                size_group: Some("12KG".to_string()),
            })
            .unwrap();

        let err = calculator
            .calculate_for_sku(tenant, "GAS-12", 5, 2)
            .unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");

        // A balanced exchange never needs the sibling and still works.
        assert!(calculator.calculate_for_sku(tenant, "GAS-12", 3, 3).is_ok());
    }

    #[test]
    fn test_non_service_sku_rejected() {
        let (tenant, catalog, calculator) = setup();
        seed_exchange_catalog(tenant, &catalog, true);
        let err = calculator
            .calculate_for_sku(tenant, "CYL-12F", 3, 3)
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// shortage = max(0, o - r) and excess = max(0, r - o); at most one of
    /// the two is ever non-zero.
    #[test]
    fn prop_shortage_excess_formulas(ordered in 0i64..10_000, returned in 0i64..10_000) {
        let figures = calculate_exchange(ordered, returned).unwrap();
        prop_assert_eq!(figures.shortage, (ordered - returned).max(0));
        prop_assert_eq!(figures.excess, (returned - ordered).max(0));
        prop_assert_eq!(figures.shortage * figures.excess, 0);
        prop_assert_eq!(figures.shortage - figures.excess, ordered - returned);
        prop_assert_eq!(figures.empties_required, ordered);
    }
}
