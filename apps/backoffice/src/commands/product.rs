//! # Product Commands
//!
//! Catalog search and maintenance.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Counter types "kada"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {"cmd": "search_products", "args": {"query": "kada"}}                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Exact SKU?  YES: that product first      │                         │
//! │  │  Name or SKU contains the text            │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<Product>, active only                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};
use crate::commands::IdArgs;
use lustre_core::validation;
use lustre_core::{CoreError, Product, ProductMaterial};
use lustre_core::{MAX_CHARGE_PAISE, MAX_RATE_PAISE, MAX_STONE_WEIGHT_CENTS, MAX_WEIGHT_MG};
use lustre_db::repository::generate_id;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuArgs {
    pub sku: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryArgs {
    pub category: String,
}

/// An extra metal in a mixed-metal piece.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInput {
    pub material_id: String,
    pub purity: String,
    pub weight_mg: i64,
}

/// Everything the product form edits. Stock is only set on create; later
/// changes go through `adjust_stock`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub material_id: String,
    pub purity: String,
    pub gross_weight_mg: i64,
    #[serde(default)]
    pub less_weight_mg: i64,
    pub making_rate_paise_per_g: i64,
    #[serde(default)]
    pub stone_id: Option<String>,
    #[serde(default)]
    pub cw_weight_cents: i64,
    #[serde(default)]
    pub va_charges_paise: i64,
    #[serde(default)]
    pub discount_bps: u32,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialInput>,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        validation::validate_sku(&self.sku)?;
        validation::validate_product_name(&self.name)?;
        validation::validate_name("category", &self.category, 60)?;
        validation::validate_purity(&self.purity)?;
        validation::validate_weights(self.gross_weight_mg, self.less_weight_mg)?;
        validation::validate_at_most("making rate", self.making_rate_paise_per_g, MAX_RATE_PAISE)?;
        validation::validate_at_most("stone weight", self.cw_weight_cents, MAX_STONE_WEIGHT_CENTS)?;
        validation::validate_at_most("VA charges", self.va_charges_paise, MAX_CHARGE_PAISE)?;
        validation::validate_non_negative("stock", self.current_stock)?;
        validation::validate_discount_bps(self.discount_bps)?;
        if let Some(url) = &self.image_url {
            validation::validate_url("image url", url)?;
        }
        for m in &self.materials {
            validation::validate_purity(&m.purity)?;
            validation::validate_at_most("material weight", m.weight_mg, MAX_WEIGHT_MG)?;
        }
        Ok(())
    }

    fn into_product(self, id: String) -> Product {
        let now = Utc::now();
        let materials = self
            .materials
            .into_iter()
            .map(|m| ProductMaterial {
                product_id: id.clone(),
                material_id: m.material_id,
                purity: m.purity.trim().to_ascii_uppercase(),
                weight_mg: m.weight_mg,
            })
            .collect();

        Product {
            id,
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            category: self.category.trim().to_string(),
            material_id: self.material_id,
            purity: self.purity.trim().to_ascii_uppercase(),
            gross_weight_mg: self.gross_weight_mg,
            less_weight_mg: self.less_weight_mg,
            making_rate_paise_per_g: self.making_rate_paise_per_g,
            stone_id: self.stone_id.filter(|s| !s.is_empty()),
            cw_weight_cents: self.cw_weight_cents,
            va_charges_paise: self.va_charges_paise,
            discount_bps: self.discount_bps,
            current_stock: self.current_stock,
            image_url: self.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
            materials,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductArgs {
    pub id: String,
    #[serde(flatten)]
    pub product: ProductInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockArgs {
    pub id: String,
    /// Positive to receive pieces, negative to write them off.
    pub delta: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub id: String,
    pub current_stock: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockArgs {
    /// Defaults to the configured low stock threshold.
    pub threshold: Option<i64>,
}

// =============================================================================
// Queries
// =============================================================================

/// Searches active products by name or SKU.
///
/// ## Arguments
/// * `query` - Search text; empty lists active products by name
/// * `limit` - Maximum results (default: 20, max: 100)
pub async fn search_products(db: &DbState, args: SearchArgs) -> ApiResult<Vec<Product>> {
    let start = Instant::now();
    let query = validation::validate_search_query(&args.query)?;
    let limit = args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT);

    debug!(query = %query, limit = %limit, "search_products command");

    let products = db.inner().products().search(&query, limit).await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = products.len(),
        query = %query,
        "search_products complete"
    );

    Ok(products)
}

pub async fn get_product(db: &DbState, args: IdArgs) -> ApiResult<Product> {
    debug!(id = %args.id, "get_product command");
    db.inner()
        .products()
        .get_by_id(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &args.id))
}

/// Lookup by the tag printed on the piece.
pub async fn get_product_by_sku(db: &DbState, args: SkuArgs) -> ApiResult<Product> {
    debug!(sku = %args.sku, "get_product_by_sku command");
    db.inner()
        .products()
        .get_by_sku(args.sku.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &args.sku))
}

pub async fn list_category(db: &DbState, args: CategoryArgs) -> ApiResult<Vec<Product>> {
    debug!(category = %args.category, "list_category command");
    Ok(db.inner().products().list_by_category(args.category.trim()).await?)
}

pub async fn low_stock(
    db: &DbState,
    config: &ConfigState,
    args: LowStockArgs,
) -> ApiResult<Vec<Product>> {
    let threshold = args
        .threshold
        .unwrap_or_else(|| config.current().low_stock_threshold);
    debug!(threshold, "low_stock command");
    Ok(db.inner().products().low_stock(threshold).await?)
}

// =============================================================================
// Maintenance
// =============================================================================

pub async fn create_product(db: &DbState, input: ProductInput) -> ApiResult<Product> {
    input.validate()?;
    let product = input.into_product(generate_id());

    let created = db.inner().products().insert(&product).await?;
    info!(id = %created.id, sku = %created.sku, "Product created");
    Ok(created)
}

/// Replaces the editable fields of a product. Stock and the active flag
/// are left as they are.
pub async fn update_product(db: &DbState, args: UpdateProductArgs) -> ApiResult<Product> {
    args.product.validate()?;

    let products = db.inner().products();
    let existing = products
        .get_by_id(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &args.id))?;

    let mut product = args.product.into_product(existing.id.clone());
    product.current_stock = existing.current_stock;
    product.is_active = existing.is_active;
    product.created_at = existing.created_at;

    products.update(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product updated");

    products
        .get_by_id(&product.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &product.id))
}

pub async fn adjust_stock(db: &DbState, args: AdjustStockArgs) -> ApiResult<StockResponse> {
    debug!(id = %args.id, delta = args.delta, "adjust_stock command");
    let current_stock = db.inner().products().update_stock(&args.id, args.delta).await?;
    Ok(StockResponse {
        id: args.id,
        current_stock,
    })
}

/// Hides a product from search and sale. Invoices keep their snapshot.
pub async fn delete_product(db: &DbState, args: IdArgs) -> ApiResult<()> {
    db.inner().products().soft_delete(&args.id).await?;
    info!(id = %args.id, "Product deactivated");
    Ok(())
}
