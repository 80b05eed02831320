//! # Domain Types
//!
//! Catalog and customer types used throughout Lustre.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Material     │   │   MetalRate     │   │     Stone       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, name       │◄──│  material_id    │   │  rate / carat   │       │
//! │  └─────────────────┘   │  purity (22K)   │   └────────▲────────┘       │
//! │                        │  rate / gram    │            │                │
//! │                        └────────▲────────┘            │                │
//! │                                 │ (material, purity)  │ stone_id       │
//! │                        ┌────────┴────────────────────┴────────┐        │
//! │                        │              Product                 │        │
//! │                        │  gross / less weight (mg)            │        │
//! │                        │  making rate, cw weight, VA charges  │        │
//! │                        │  materials: Vec<ProductMaterial>     │        │
//! │                        └──────────────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Units
//! - Money: paise (`*_paise`)
//! - Metal weight: milligrams (`*_mg`)
//! - Stone weight: cents of a carat (`cw_weight_cents`, 100 = 1 ct)
//! - Rates: basis points (`*_bps`, 300 = 3%)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::PricingInput;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 150 bps = 1.5% (CGST on gold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Materials and Rates
// =============================================================================

/// A precious metal the store sells (Gold, Silver, Platinum).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Price per gram of a material at a given purity, effective from a moment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MetalRate {
    pub id: String,
    pub material_id: String,
    /// Purity grade, e.g. "24K", "22K", "18K", "925".
    pub purity: String,
    pub rate_paise_per_g: i64,
    #[ts(as = "String")]
    pub effective_at: DateTime<Utc>,
}

impl MetalRate {
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_paise(self.rate_paise_per_g)
    }
}

/// The current rate board: the latest rate for every (material, purity).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MetalRates {
    pub rates: Vec<MetalRate>,
}

impl MetalRates {
    pub fn new(rates: Vec<MetalRate>) -> Self {
        MetalRates { rates }
    }

    /// Latest rate for a material and purity. Purity matching ignores case.
    pub fn rate_for(&self, material_id: &str, purity: &str) -> Option<&MetalRate> {
        self.rates
            .iter()
            .filter(|r| r.material_id == material_id && r.purity.eq_ignore_ascii_case(purity))
            .max_by_key(|r| r.effective_at)
    }
}

/// A gemstone type priced per carat.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Stone {
    pub id: String,
    pub name: String,
    pub rate_paise_per_ct: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Stone {
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_paise(self.rate_paise_per_ct)
    }
}

// =============================================================================
// Product
// =============================================================================

/// One metal component of a product (e.g. a two-tone ring).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductMaterial {
    pub product_id: String,
    pub material_id: String,
    pub purity: String,
    pub weight_mg: i64,
}

/// A piece of jewelry in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,
    pub description: Option<String>,

    /// Ring, Necklace, Bangle, ...
    pub category: String,

    /// Primary metal, used to look up the per-gram rate.
    pub material_id: String,
    pub purity: String,

    /// Weight of the finished piece.
    pub gross_weight_mg: i64,

    /// Weight deducted from gross before pricing metal (stones, enamel).
    pub less_weight_mg: i64,

    pub making_rate_paise_per_g: i64,

    pub stone_id: Option<String>,

    /// Stone weight in cents of a carat.
    pub cw_weight_cents: i64,

    /// Flat value-addition charge per line.
    pub va_charges_paise: i64,

    /// Default discount in basis points.
    pub discount_bps: u32,

    pub current_stock: i64,
    pub image_url: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Metal composition; empty means the whole net weight is the primary metal.
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub materials: Vec<ProductMaterial>,
}

impl Product {
    /// Net metal weight in milligrams.
    #[inline]
    pub fn net_weight_mg(&self) -> i64 {
        self.gross_weight_mg - self.less_weight_mg
    }

    /// Checks if the requested quantity is in stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && self.current_stock >= quantity
    }

    /// Builds pricing inputs from this product and the current rates.
    pub fn pricing_input(
        &self,
        metal_rate: Money,
        stone_rate: Option<Money>,
        quantity: i64,
    ) -> PricingInput {
        PricingInput {
            gross_weight_mg: self.gross_weight_mg,
            less_weight_mg: self.less_weight_mg,
            metal_rate_paise_per_g: metal_rate.paise(),
            making_rate_paise_per_g: self.making_rate_paise_per_g,
            cw_weight_cents: self.cw_weight_cents,
            stone_rate_paise_per_ct: stone_rate.map(|r| r.paise()).unwrap_or(0),
            va_charges_paise: self.va_charges_paise,
            discount_bps: self.discount_bps,
            quantity,
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

/// A store customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product saved to a customer's wishlist.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WishlistEntry {
    pub customer_id: String,
    pub product_id: String,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
