//! # Error Types
//!
//! Domain-specific error types for lustre-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lustre-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lustre-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Back office errors (in app)                                           │
//! │  └── ApiError         - What the Tauri commands return                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to add the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 2)
    ///      │
    ///      ▼
    /// Check stock: available=1
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "RING-22K-014", available: 1, requested: 2 }
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A storefront entry, slot or other record was not found in a list.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The product is not a line in the cart.
    #[error("Product {0} not in cart")]
    NotInCart(String),

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Invoice is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding a payment to a voided invoice
    /// - Voiding an invoice twice
    #[error("Invoice {invoice_id} is {current_status}, cannot {operation}")]
    InvalidInvoiceStatus {
        invoice_id: String,
        current_status: String,
        operation: String,
    },

    /// Booking status transition not allowed.
    #[error("Booking cannot move from {from} to {to}")]
    InvalidBookingTransition { from: String, to: String },

    /// Slot is blocked or fully booked.
    #[error("Slot {slot_id} is not available")]
    SlotUnavailable { slot_id: String },

    /// Slot overlaps an existing slot on the same date.
    #[error("Slot overlaps existing slot {existing_id}")]
    SlotOverlap { existing_id: String },

    /// Currency text could not be parsed.
    #[error("Cannot parse amount '{0}'")]
    CurrencyParse(String),

    /// Arithmetic overflow in a money calculation.
    #[error("Amount overflow while computing {0}")]
    Overflow(&'static str),

    /// Failure serializing a value for fingerprinting.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected input, caught before any business rule runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Phone, email, URL, purity grade or UUID that doesn't parse.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;
