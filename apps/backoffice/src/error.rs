//! # API Error Type
//!
//! Unified error type for Tauri commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  invoke('add_to_cart', { args: { productId: '...' } })                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function  ->  Result<T, ApiError>                       │  │
//! │  │                                                                  │  │
//! │  │  DbError::QueryFailed ──────┐   logged, generic message          │  │
//! │  │  CoreError::InsufficientStock ──► ApiError { code, message }     │  │
//! │  │  ValidationError ───────────┘                                    │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  rejected promise: { code: 'INSUFFICIENT_STOCK', message: '...' }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::error;

use lustre_core::{CoreError, ValidationError};
use lustre_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from commands.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Product not found: RNG-22K-014" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// A duplicate or a write that lost a race (slot full, stock gone).
    Conflict,
    DatabaseError,
    /// Operation not allowed in the record's current state.
    BusinessLogic,
    CartError,
    InsufficientStock,
    PaymentError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            DbError::Domain(e) => ApiError::from(e),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Serialization(e) => {
                error!("Stored record could not be decoded: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::NotFound { entity, id } => ApiError::not_found(entity, &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::CartTooLarge { .. } | CoreError::NotInCart(_) | CoreError::EmptyCart => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::QuantityTooLarge { .. } | CoreError::CurrencyParse(_) => {
                ApiError::validation(message)
            }
            CoreError::InvalidPaymentAmount { .. } => {
                ApiError::new(ErrorCode::PaymentError, message)
            }
            CoreError::InvalidInvoiceStatus { .. } | CoreError::InvalidBookingTransition { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
            CoreError::SlotUnavailable { .. } | CoreError::SlotOverlap { .. } => {
                ApiError::new(ErrorCode::Conflict, message)
            }
            CoreError::Overflow(what) => {
                error!(what, "Amount overflow");
                ApiError::validation("Amount is too large")
            }
            CoreError::Serialization(e) => {
                error!("Serialization failed: {}", e);
                ApiError::internal("Internal error")
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
