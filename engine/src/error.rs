//! Error handling for the Cylinder Stock inventory engine
//!
//! One taxonomy for the whole core. Every mutation failure leaves ledger
//! and document state exactly as before the call; callers can rely on the
//! error kind to decide between correcting input, asking for an override,
//! or escalating a configuration problem.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias used across the engine
pub type AppResult<T> = Result<T, AppError>;

/// Engine error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors, safe to retry after correction
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // Business-rule rejections, surfaced for a caller decision
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid stock operation: {0}")]
    InvalidStockOperation(String),

    // State machine rejections; caller must re-fetch current status
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Variance status error: {0}")]
    VarianceStatus(String),

    // A concurrent writer got there first; caller must re-fetch and retry
    #[error("Conflict: {0}")]
    Conflict(String),

    // Catalog misconfiguration, fatal for the operation
    #[error("Not a bundle: {0}")]
    NotABundle(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the library boundary
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateEntry(_) => "DUPLICATE_ENTRY",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::InvalidStockOperation(_) => "INVALID_STOCK_OPERATION",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::VarianceStatus(_) => "VARIANCE_STATUS_ERROR",
            AppError::Conflict(_) => "CONFLICT_ERROR",
            AppError::NotABundle(_) => "NOT_A_BUNDLE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same call can ever succeed without an
    /// intervening correction
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::InsufficientStock { .. })
    }
}

impl From<shared::TransitionError> for AppError {
    fn from(err: shared::TransitionError) -> Self {
        AppError::InvalidStateTransition(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}
