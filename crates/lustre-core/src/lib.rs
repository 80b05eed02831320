//! # lustre-core: Pure Business Logic for Lustre
//!
//! This crate is the **heart** of the Lustre jewelry back office. It contains
//! the pricing formula, cart, invoice, booking and storefront rules as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lustre Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Tauri commands (apps/backoffice)                  │   │
//! │  │   add_to_cart, checkout, book_appointment, reorder_carousel     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lustre-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ pricing  │ │   cart   │ │ invoice  │ │ booking          │  │   │
//! │  │   │ GST      │ │ totals   │ │ payments │ │ storefront       │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lustre-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog types (Product, Material, Stone, MetalRates, ...)
//! - [`money`] - Money in paise with integer arithmetic
//! - [`pricing`] - Jewelry line pricing (metal, making, stones, VA, GST)
//! - [`currency`] - Rupee formatting and parsing
//! - [`cart`] - Cart of priced lines
//! - [`invoice`] - Invoice assembly, payment splits, PDF bookkeeping
//! - [`booking`] - Appointment slots and booking lifecycle
//! - [`storefront`] - Themed collections and carousel ordering
//! - [`config`] - Store-wide configuration (`AppConfig`)
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use lustre_core::money::Money;
//! use lustre_core::pricing::{price_line, GstPolicy, PricingInput};
//!
//! let input = PricingInput {
//!     gross_weight_mg: 10_000,
//!     less_weight_mg: 0,
//!     metal_rate_paise_per_g: 600_000,
//!     making_rate_paise_per_g: 50_000,
//!     cw_weight_cents: 0,
//!     stone_rate_paise_per_ct: 0,
//!     va_charges_paise: 0,
//!     discount_bps: 0,
//!     quantity: 1,
//! };
//!
//! let line = price_line(&input, &GstPolicy::default()).unwrap();
//! assert_eq!(line.final_amount, Money::from_rupees(66_950));
//! ```

pub mod booking;
pub mod cart;
pub mod config;
pub mod currency;
pub mod error;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod storefront;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::AppConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{GstPolicy, LineBreakdown, PricingInput};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single jewelry line.
///
/// Jewelry rarely sells in bulk; a large number is almost always a typo.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Milligrams per gram, the unit all metal weights are stored in.
pub const MG_PER_GRAM: i64 = 1_000;

/// Stone weight is stored in cents of a carat (1 cent = 0.01 ct).
pub const CENTS_PER_CARAT: i64 = 100;

/// Heaviest piece accepted, in milligrams (10 kg).
pub const MAX_WEIGHT_MG: i64 = 10_000_000;

/// Heaviest stone weight accepted on one piece, in cents (1,000 ct).
pub const MAX_STONE_WEIGHT_CENTS: i64 = 100_000;

/// Highest metal, making or stone rate accepted, in paise (₹1 crore).
pub const MAX_RATE_PAISE: i64 = 1_000_000_000;

/// Highest flat charge accepted on one line, in paise (₹10 crore).
///
/// With the other ceilings this keeps a full cart's total far inside `i64`.
pub const MAX_CHARGE_PAISE: i64 = 10_000_000_000;
