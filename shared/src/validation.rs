//! Validation utilities for the Cylinder Stock platform
//!
//! Pure checks shared by the engine services and any outer layer that wants
//! to pre-validate input before handing it to the core.

use rust_decimal::Decimal;

use crate::models::{BundleComponent, PhysicalAttributes, VariantRoleKind};

// ============================================================================
// Quantity Validations
// ============================================================================

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate that a signed quantity is not exactly zero
pub fn validate_non_zero_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity == Decimal::ZERO {
        return Err("Quantity cannot be zero");
    }
    Ok(())
}

/// Validate a cylinder count used by the exchange calculator (integer, >= 0)
pub fn validate_cylinder_count(count: i64) -> Result<(), &'static str> {
    if count < 0 {
        return Err("Cylinder count cannot be negative");
    }
    Ok(())
}

/// Validate that a unit cost, when supplied, is not negative
pub fn validate_unit_cost(unit_cost: Decimal) -> Result<(), &'static str> {
    if unit_cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Variant Validations
// ============================================================================

/// Validate cylinder weights: tare must be positive and below gross weight
pub fn validate_physical_attributes(attrs: &PhysicalAttributes) -> Result<(), &'static str> {
    if let Some(tare) = attrs.tare_weight_kg {
        if tare <= Decimal::ZERO {
            return Err("Tare weight must be positive");
        }
    }
    if let Some(gross) = attrs.gross_weight_kg {
        if gross <= Decimal::ZERO {
            return Err("Gross weight must be positive");
        }
        if let Some(tare) = attrs.tare_weight_kg {
            if gross <= tare {
                return Err("Gross weight must exceed tare weight");
            }
        }
    }
    if let Some(capacity) = attrs.capacity_kg {
        if capacity <= Decimal::ZERO {
            return Err("Capacity must be positive");
        }
    }
    Ok(())
}

/// Validate a bundle component list: non-empty, positive quantities, no
/// self-reference, and no nested bundles
pub fn validate_bundle_components(
    bundle_sku: &str,
    components: &[BundleComponent],
) -> Result<(), &'static str> {
    if components.is_empty() {
        return Err("Bundle must have at least one component");
    }
    for component in components {
        if component.sku == bundle_sku {
            return Err("Bundle cannot reference itself");
        }
        if component.quantity <= Decimal::ZERO {
            return Err("Bundle component quantity must be positive");
        }
        if component.role == VariantRoleKind::Bundle {
            return Err("Bundle components cannot be bundles");
        }
    }
    Ok(())
}
