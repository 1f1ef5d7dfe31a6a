//! Variance reconciliation models
//!
//! A variance document is an `AdjustVariance` stock document carrying the
//! count context and an approval gate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the counted quantity differs from the system quantity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VarianceReason {
    PhysicalCount,
    DamagedGoods,
    TheftLoss,
    SystemError,
    QualityIssue,
    ExpiryObsolete,
    FoundStock,
    Other,
}

impl VarianceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarianceReason::PhysicalCount => "physical_count",
            VarianceReason::DamagedGoods => "damaged_goods",
            VarianceReason::TheftLoss => "theft_loss",
            VarianceReason::SystemError => "system_error",
            VarianceReason::QualityIssue => "quality_issue",
            VarianceReason::ExpiryObsolete => "expiry_obsolete",
            VarianceReason::FoundStock => "found_stock",
            VarianceReason::Other => "other",
        }
    }
}

/// Variance-specific fields attached to an `AdjustVariance` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceDetails {
    pub reason: VarianceReason,
    /// Set whenever the document was created through the variance workflow
    pub approval_required: bool,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl VarianceDetails {
    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }
}

/// One physical count entry fed into the variance workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalCount {
    pub variant_id: Uuid,
    pub system_quantity: Decimal,
    pub actual_quantity: Decimal,
}

impl PhysicalCount {
    /// Signed difference between counted and recorded quantity
    pub fn variance(&self) -> Decimal {
        self.actual_quantity - self.system_quantity
    }
}
