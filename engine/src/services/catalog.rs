//! Variant catalog service
//!
//! Creates and classifies SKUs. A variant's role is decided here once and
//! stored as an explicit discriminant; nothing downstream ever infers a
//! role from SKU naming conventions. Role changes require a new SKU.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::{
    validate_bundle_components, validate_physical_attributes, BundleComponent,
    PaginatedResponse, Pagination, PhysicalAttributes, Variant, VariantRole, VariantRoleKind,
};

use crate::error::{AppError, AppResult};
use crate::store::VariantRepository;

/// Catalog service for managing variants
#[derive(Clone)]
pub struct CatalogService {
    variants: Arc<dyn VariantRepository>,
}

/// Input for creating a variant
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVariantInput {
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    pub role: VariantRole,
    pub physical: Option<PhysicalAttributes>,
    pub deposit_amount: Option<Decimal>,
    pub size_group: Option<String>,
}

impl CatalogService {
    pub fn new(variants: Arc<dyn VariantRepository>) -> Self {
        Self { variants }
    }

    /// Create a variant, enforcing role-specific attribute rules
    pub fn create_variant(&self, input: CreateVariantInput) -> AppResult<Variant> {
        if input.sku.trim().is_empty() {
            return Err(AppError::validation("sku", "SKU cannot be empty"));
        }
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Name cannot be empty"));
        }

        match &input.role {
            VariantRole::PhysicalAsset { .. } => {
                if let Some(physical) = &input.physical {
                    validate_physical_attributes(physical)
                        .map_err(|msg| AppError::validation("physical", msg))?;
                }
            }
            VariantRole::Bundle { components } => {
                validate_bundle_components(&input.sku, components)
                    .map_err(|msg| AppError::validation("components", msg))?;
                self.check_components_resolve(input.tenant_id, components)?;
            }
            VariantRole::ConsumableService { .. } | VariantRole::DepositLiability => {}
        }

        // Weight-bearing attributes only apply to physical assets.
        if input.physical.is_some() && !matches!(input.role, VariantRole::PhysicalAsset { .. }) {
            return Err(AppError::validation(
                "physical",
                "Physical attributes only apply to physical assets",
            ));
        }

        if matches!(input.role, VariantRole::DepositLiability) && input.deposit_amount.is_none() {
            return Err(AppError::validation(
                "deposit_amount",
                "Deposit liability variants need a deposit amount",
            ));
        }
        if let Some(amount) = input.deposit_amount {
            if amount < Decimal::ZERO {
                return Err(AppError::validation(
                    "deposit_amount",
                    "Deposit amount cannot be negative",
                ));
            }
        }

        let now = Utc::now();
        let variant = Variant {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            product_id: input.product_id,
            sku: input.sku,
            name: input.name,
            role: input.role,
            physical: input.physical,
            deposit_amount: input.deposit_amount,
            size_group: input.size_group,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.variants.insert(variant.clone())?;

        tracing::info!(
            tenant_id = %variant.tenant_id,
            sku = %variant.sku,
            role = variant.role_kind().as_str(),
            "Variant created"
        );
        Ok(variant)
    }

    /// Each bundle component must resolve to an existing, active,
    /// non-bundle variant of the declared role in the same tenant
    fn check_components_resolve(
        &self,
        tenant_id: Uuid,
        components: &[BundleComponent],
    ) -> AppResult<()> {
        for component in components {
            let resolved = self
                .variants
                .get_by_sku(tenant_id, &component.sku)
                .ok_or_else(|| {
                    AppError::validation(
                        "components",
                        format!("Component SKU '{}' does not exist", component.sku),
                    )
                })?;
            if !resolved.active {
                return Err(AppError::validation(
                    "components",
                    format!("Component SKU '{}' is inactive", component.sku),
                ));
            }
            if resolved.role_kind() != component.role {
                return Err(AppError::validation(
                    "components",
                    format!(
                        "Component SKU '{}' is {}, declared {}",
                        component.sku,
                        resolved.role_kind().as_str(),
                        component.role.as_str()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Resolve a variant by SKU
    pub fn get_variant(&self, tenant_id: Uuid, sku: &str) -> AppResult<Variant> {
        self.variants
            .get_by_sku(tenant_id, sku)
            .ok_or_else(|| AppError::NotFound(format!("variant '{}'", sku)))
    }

    /// Classify a SKU into its role
    pub fn classify(&self, tenant_id: Uuid, sku: &str) -> AppResult<VariantRoleKind> {
        Ok(self.get_variant(tenant_id, sku)?.role_kind())
    }

    /// List variants for a tenant, SKU-ordered and paged
    pub fn list_variants(
        &self,
        tenant_id: Uuid,
        pagination: &Pagination,
    ) -> PaginatedResponse<Variant> {
        PaginatedResponse::paginate(self.variants.list(tenant_id), pagination)
    }

    /// Soft-deactivate a superseded SKU; stock history stays intact
    pub fn deactivate_variant(&self, tenant_id: Uuid, sku: &str) -> AppResult<Variant> {
        let mut variant = self.get_variant(tenant_id, sku)?;
        variant.active = false;
        variant.updated_at = Utc::now();
        self.variants.update(variant.clone())?;
        tracing::info!(tenant_id = %tenant_id, sku = %sku, "Variant deactivated");
        Ok(variant)
    }

    /// Same-size sibling lookup. Missing siblings are a catalog
    /// configuration problem, not a runtime fallback.
    pub fn sibling(
        &self,
        tenant_id: Uuid,
        variant: &Variant,
        kind: VariantRoleKind,
    ) -> AppResult<Variant> {
        let size_group = variant.size_group.as_deref().ok_or_else(|| {
            AppError::Configuration(format!("variant '{}' has no size group", variant.sku))
        })?;
        self.variants
            .find_sibling(tenant_id, size_group, kind)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "no {} sibling for size group '{}'",
                    kind.as_str(),
                    size_group
                ))
            })
    }
}
