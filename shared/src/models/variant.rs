//! Variant (SKU) models
//!
//! Every sellable or trackable unit is a variant with exactly one role,
//! decided at creation time and never re-derived from naming conventions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fill state of a physical cylinder
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CylinderState {
    Empty,
    Full,
}

/// Flat discriminant for a variant role, used to tag order lines and bundle
/// components without carrying the role payload around
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VariantRoleKind {
    PhysicalAsset,
    ConsumableService,
    DepositLiability,
    Bundle,
}

impl VariantRoleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantRoleKind::PhysicalAsset => "physical_asset",
            VariantRoleKind::ConsumableService => "consumable_service",
            VariantRoleKind::DepositLiability => "deposit_liability",
            VariantRoleKind::Bundle => "bundle",
        }
    }
}

/// A component of a bundle SKU
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleComponent {
    /// SKU of the component variant (same tenant, non-bundle role)
    pub sku: String,
    /// Per-unit quantity of the component
    pub quantity: Decimal,
    /// Role of the component variant, denormalized for line tagging
    pub role: VariantRoleKind,
}

/// Role of a variant, decided once at creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum VariantRole {
    /// A physical cylinder tracked in stock, empty or full
    PhysicalAsset { state: CylinderState },
    /// A billing-only gas sale line; exchange sales expect an empty back
    ConsumableService { requires_exchange: bool },
    /// A refundable customer obligation tied to a returnable cylinder
    DepositLiability,
    /// A billing construct that explodes into components at sale time
    Bundle { components: Vec<BundleComponent> },
}

impl VariantRole {
    pub fn kind(&self) -> VariantRoleKind {
        match self {
            VariantRole::PhysicalAsset { .. } => VariantRoleKind::PhysicalAsset,
            VariantRole::ConsumableService { .. } => VariantRoleKind::ConsumableService,
            VariantRole::DepositLiability => VariantRoleKind::DepositLiability,
            VariantRole::Bundle { .. } => VariantRoleKind::Bundle,
        }
    }
}

/// Physical attributes, meaningful only for `PhysicalAsset` variants
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhysicalAttributes {
    /// Weight of the empty cylinder
    pub tare_weight_kg: Option<Decimal>,
    /// Weight of the filled cylinder
    pub gross_weight_kg: Option<Decimal>,
    /// Nominal gas capacity
    pub capacity_kg: Option<Decimal>,
}

/// A sellable or trackable unit, unique per (tenant, SKU)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    /// Unique per tenant (e.g., "CYL-12F", "GAS-12", "DEP-12", "KIT-12")
    pub sku: String,
    pub name: String,
    pub role: VariantRole,
    /// Present only for `PhysicalAsset` variants
    pub physical: Option<PhysicalAttributes>,
    /// Deposit value for `DepositLiability` and `Bundle` variants
    pub deposit_amount: Option<Decimal>,
    /// Key linking same-size siblings (service <-> deposit <-> physical),
    /// e.g. "12KG"; a weak relation resolved through the catalog
    pub size_group: Option<String>,
    /// Deactivated (soft) rather than deleted when superseded
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    /// Flat role discriminant
    pub fn role_kind(&self) -> VariantRoleKind {
        self.role.kind()
    }

    /// Whether this variant occupies physical stock
    pub fn is_physical(&self) -> bool {
        matches!(self.role, VariantRole::PhysicalAsset { .. })
    }

    /// True only for exchange-configured consumable services
    pub fn requires_exchange(&self) -> bool {
        matches!(
            self.role,
            VariantRole::ConsumableService {
                requires_exchange: true
            }
        )
    }

    /// Bundle components, or `None` when this is not a bundle
    pub fn bundle_components(&self) -> Option<&[BundleComponent]> {
        match &self.role {
            VariantRole::Bundle { components } => Some(components),
            _ => None,
        }
    }

    /// Weight used for inventory weighing: tare for empties, gross for
    /// fulls; non-physical variants have no inventory weight
    pub fn weight_for_inventory(&self) -> Option<Decimal> {
        match &self.role {
            VariantRole::PhysicalAsset { state } => {
                let physical = self.physical.as_ref()?;
                match state {
                    CylinderState::Empty => physical.tare_weight_kg,
                    CylinderState::Full => physical.gross_weight_kg,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn physical_variant(state: CylinderState) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            sku: "CYL-12F".to_string(),
            name: "12kg cylinder (full)".to_string(),
            role: VariantRole::PhysicalAsset { state },
            physical: Some(PhysicalAttributes {
                tare_weight_kg: Some(dec("14.5")),
                gross_weight_kg: Some(dec("26.5")),
                capacity_kg: Some(dec("12.0")),
            }),
            deposit_amount: None,
            size_group: Some("12KG".to_string()),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_weight_for_inventory_uses_state() {
        let full = physical_variant(CylinderState::Full);
        assert_eq!(full.weight_for_inventory(), Some(dec("26.5")));

        let empty = physical_variant(CylinderState::Empty);
        assert_eq!(empty.weight_for_inventory(), Some(dec("14.5")));
    }

    #[test]
    fn test_non_physical_has_no_inventory_weight() {
        let mut variant = physical_variant(CylinderState::Full);
        variant.role = VariantRole::DepositLiability;
        variant.physical = None;
        assert_eq!(variant.weight_for_inventory(), None);
        assert!(!variant.is_physical());
    }

    #[test]
    fn test_requires_exchange_only_when_configured() {
        let mut variant = physical_variant(CylinderState::Full);
        variant.role = VariantRole::ConsumableService {
            requires_exchange: true,
        };
        assert!(variant.requires_exchange());

        variant.role = VariantRole::ConsumableService {
            requires_exchange: false,
        };
        assert!(!variant.requires_exchange());

        variant.role = VariantRole::PhysicalAsset {
            state: CylinderState::Full,
        };
        assert!(!variant.requires_exchange());
    }

    #[test]
    fn test_role_wire_format_is_snake_case() {
        let role = VariantRole::ConsumableService {
            requires_exchange: true,
        };
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"consumable_service": {"requires_exchange": true}})
        );

        let role: VariantRole = serde_json::from_value(serde_json::json!({
            "physical_asset": {"state": "empty"}
        }))
        .unwrap();
        assert_eq!(role.kind(), VariantRoleKind::PhysicalAsset);
    }

    #[test]
    fn test_bundle_components_accessor() {
        let mut variant = physical_variant(CylinderState::Full);
        assert!(variant.bundle_components().is_none());

        variant.role = VariantRole::Bundle {
            components: vec![BundleComponent {
                sku: "CYL-12F".to_string(),
                quantity: Decimal::ONE,
                role: VariantRoleKind::PhysicalAsset,
            }],
        };
        assert_eq!(variant.bundle_components().unwrap().len(), 1);
    }
}
