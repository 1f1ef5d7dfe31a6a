//! Warehouse models
//!
//! Vehicles are modeled as mobile warehouses; truck stock lives in the
//! `TruckStock` bucket of the vehicle warehouse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a warehouse in the distribution network
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseRole {
    /// Fixed storage location (depot, godown)
    Storage,
    /// Filling plant receiving empties and producing fulls
    Filling,
    /// Delivery vehicle treated as a mobile warehouse
    Vehicle,
}

impl WarehouseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseRole::Storage => "storage",
            WarehouseRole::Filling => "filling",
            WarehouseRole::Vehicle => "vehicle",
        }
    }
}

/// A stock-holding location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Short code (e.g., "WH-MAIN", "TRK-07")
    pub code: String,
    pub name: String,
    pub role: WarehouseRole,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
