//! # Cart Commands
//!
//! The counter's cart. Every command returns the whole priced cart so the
//! screen can redraw from one response.
//!
//! ## Pricing Snapshot
//! ```text
//! add_to_cart ──► product + today's metal rate + stone rate
//!                      │
//!                      ▼
//!                 CartItem { pricing: PricingInput }   (rates frozen)
//!                      │
//!   refresh_cart_rates ┘  re-reads rates after the board changes
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState, DbState};
use lustre_core::cart::{Cart, CartItem, CartTotals};
use lustre_core::{CoreResult, GstPolicy, LineBreakdown, Money, Product};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartArgs {
    pub product_id: String,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityArgs {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDiscountArgs {
    pub product_id: String,
    pub discount_bps: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdArgs {
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCustomerArgs {
    /// `null` detaches the customer.
    pub customer_id: Option<String>,
}

/// A cart line with its current price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub breakdown: LineBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartLine>,
    pub customer_id: Option<String>,
    pub totals: CartTotals,
}

impl CartResponse {
    pub fn build(cart: &Cart, gst: &GstPolicy) -> CoreResult<Self> {
        let lines = cart.priced_lines(gst)?;
        Ok(CartResponse {
            items: cart
                .items
                .iter()
                .cloned()
                .zip(lines)
                .map(|(item, breakdown)| CartLine { item, breakdown })
                .collect(),
            customer_id: cart.customer_id.clone(),
            totals: cart.totals(gst)?,
        })
    }
}

/// Runs a cart mutation and answers with the priced cart.
///
/// The mutation runs on a copy. The live cart only changes when the copy
/// still prices, so a failed request leaves it as it was.
fn mutate<F>(cart: &CartState, config: &ConfigState, f: F) -> ApiResult<CartResponse>
where
    F: FnOnce(&mut Cart) -> CoreResult<()>,
{
    let gst = config.gst();
    let response = cart.with_cart_mut(|c| {
        let mut next = c.clone();
        f(&mut next)?;
        let response = CartResponse::build(&next, &gst)?;
        *c = next;
        Ok::<_, lustre_core::CoreError>(response)
    })?;
    Ok(response)
}

/// Today's metal rate for the product's purity and its stone's rate.
async fn rates_for(db: &DbState, product: &Product) -> ApiResult<(Money, Option<Money>)> {
    let catalog = db.inner().catalog();
    let metal = catalog
        .require_rate(&product.material_id, &product.purity)
        .await?
        .rate();

    let stone = match &product.stone_id {
        Some(stone_id) => {
            let stone = catalog
                .get_stone(stone_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Stone", stone_id))?;
            Some(stone.rate())
        }
        None => None,
    };

    Ok((metal, stone))
}

// =============================================================================
// Commands
// =============================================================================

pub fn get_cart(cart: &CartState, config: &ConfigState) -> ApiResult<CartResponse> {
    debug!("get_cart command");
    let gst = config.gst();
    Ok(cart.with_cart(|c| CartResponse::build(c, &gst))?)
}

/// Adds a piece, merging with its existing line.
///
/// ## Errors
/// - `NOT_FOUND` for an unknown product or a missing metal rate
/// - `INSUFFICIENT_STOCK` when stock cannot cover the merged quantity
/// - `CART_ERROR` when the cart is full
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    args: AddToCartArgs,
) -> ApiResult<CartResponse> {
    let quantity = args.quantity.unwrap_or(1);
    debug!(product_id = %args.product_id, quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(&args.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &args.product_id))?;
    let (metal_rate, stone_rate) = rates_for(db, &product).await?;

    mutate(cart, config, |c| c.add_item(&product, metal_rate, stone_rate, quantity))
}

/// Sets a line's quantity against current stock. Zero removes the line.
///
/// ## Errors
/// - `NOT_FOUND` if the product no longer exists
/// - `INSUFFICIENT_STOCK` when stock cannot cover the new quantity
/// - `CART_ERROR` if the product has no line
pub async fn update_cart_item(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    args: UpdateQuantityArgs,
) -> ApiResult<CartResponse> {
    debug!(product_id = %args.product_id, quantity = args.quantity, "update_cart_item command");

    if args.quantity == 0 {
        return mutate(cart, config, |c| c.remove_item(&args.product_id));
    }

    let product = db
        .inner()
        .products()
        .get_by_id(&args.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &args.product_id))?;

    mutate(cart, config, |c| c.update_quantity(&product, args.quantity))
}

/// Counter discount on one line, replacing the product's default.
pub fn set_line_discount(
    cart: &CartState,
    config: &ConfigState,
    args: LineDiscountArgs,
) -> ApiResult<CartResponse> {
    debug!(product_id = %args.product_id, bps = args.discount_bps, "set_line_discount command");
    mutate(cart, config, |c| c.set_discount(&args.product_id, args.discount_bps))
}

pub fn remove_from_cart(
    cart: &CartState,
    config: &ConfigState,
    args: ProductIdArgs,
) -> ApiResult<CartResponse> {
    debug!(product_id = %args.product_id, "remove_from_cart command");
    mutate(cart, config, |c| c.remove_item(&args.product_id))
}

pub fn clear_cart(cart: &CartState, config: &ConfigState) -> ApiResult<CartResponse> {
    debug!("clear_cart command");
    mutate(cart, config, |c| {
        c.clear();
        Ok(())
    })
}

pub async fn set_cart_customer(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    args: CartCustomerArgs,
) -> ApiResult<CartResponse> {
    if let Some(id) = &args.customer_id {
        db.inner()
            .customers()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", id))?;
    }

    mutate(cart, config, |c| {
        c.set_customer(args.customer_id);
        Ok(())
    })
}

/// Re-prices every line at the current rate board.
///
/// Lines whose product has since been removed keep their old rates.
pub async fn refresh_cart_rates(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
) -> ApiResult<CartResponse> {
    let product_ids: Vec<String> = cart.with_cart(|c| {
        c.items.iter().map(|i| i.product_id.clone()).collect()
    });

    let mut fresh = Vec::with_capacity(product_ids.len());
    for id in product_ids {
        if let Some(product) = db.inner().products().get_by_id(&id).await? {
            let rates = rates_for(db, &product).await?;
            fresh.push((id, rates));
        }
    }

    info!(lines = fresh.len(), "Cart repriced at current rates");

    mutate(cart, config, |c| {
        for item in c.items.iter_mut() {
            if let Some((_, (metal, stone))) = fresh.iter().find(|(id, _)| *id == item.product_id) {
                item.pricing.metal_rate_paise_per_g = metal.paise();
                item.pricing.stone_rate_paise_per_ct = stone.map(|s| s.paise()).unwrap_or(0);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::catalog::{set_metal_rate, SetRateArgs};
    use crate::commands::product::{create_product, tests::ring_input};
    use crate::error::ErrorCode;
    use crate::App;

    async fn app_with_ring() -> (App, String) {
        let app = App::test_app().await;
        let product = create_product(&app.db, ring_input("RNG-22K-001")).await.unwrap();
        (app, product.id)
    }

    fn add(product_id: &str, quantity: i64) -> AddToCartArgs {
        AddToCartArgs {
            product_id: product_id.to_string(),
            quantity: Some(quantity),
        }
    }

    #[tokio::test]
    async fn test_add_prices_at_todays_rate() {
        let (app, id) = app_with_ring().await;

        let response = add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1))
            .await
            .unwrap();

        // 10 g at ₹6000/g + ₹500/g making, 3% GST
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].breakdown.final_amount, Money::from_rupees(66_950));
        assert_eq!(response.totals.grand_total, Money::from_rupees(66_950));
        assert_eq!(response.totals.cgst, Money::from_paise(97_500));
    }

    #[tokio::test]
    async fn test_add_beyond_stock() {
        let (app, id) = app_with_ring().await;

        add_to_cart(&app.db, &app.cart, &app.config, add(&id, 2)).await.unwrap();
        let err = add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = add_to_cart(&app.db, &app.cart, &app.config, add("missing", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_beyond_stock_keeps_quantity() {
        let (app, id) = app_with_ring().await;
        add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1)).await.unwrap();

        let update = |quantity| UpdateQuantityArgs {
            product_id: id.clone(),
            quantity,
        };

        let err = update_cart_item(&app.db, &app.cart, &app.config, update(50))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(app.cart.with_cart(|c| c.total_quantity()), 1);

        let response = update_cart_item(&app.db, &app.cart, &app.config, update(2))
            .await
            .unwrap();
        assert_eq!(response.totals.total_quantity, 2);

        let response = update_cart_item(&app.db, &app.cart, &app.config, update(0))
            .await
            .unwrap();
        assert!(response.items.is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cart_unchanged() {
        let (app, id) = app_with_ring().await;
        add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1)).await.unwrap();
        let before = get_cart(&app.cart, &app.config).unwrap();

        // A line that validates per field on its own but cannot be priced
        let err = mutate(&app.cart, &app.config, |c| {
            let mut line = c.items[0].clone();
            line.product_id = "unpriceable".to_string();
            line.pricing.va_charges_paise = i64::MAX - 1_000_000;
            c.items.push(line);
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let after = get_cart(&app.cart, &app.config).unwrap();
        assert_eq!(after.items.len(), 1);
        assert_eq!(after.totals.grand_total, before.totals.grand_total);
    }

    #[tokio::test]
    async fn test_discount_remove_and_clear() {
        let (app, id) = app_with_ring().await;
        add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1)).await.unwrap();

        let response = set_line_discount(
            &app.cart,
            &app.config,
            LineDiscountArgs {
                product_id: id.clone(),
                discount_bps: 1_000,
            },
        )
        .unwrap();
        assert!(response.totals.discount > Money::zero());
        assert!(response.totals.grand_total < Money::from_rupees(66_950));

        let err = remove_from_cart(
            &app.cart,
            &app.config,
            ProductIdArgs {
                product_id: "other".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let response = clear_cart(&app.cart, &app.config).unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.totals.grand_total, Money::zero());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_new_rate() {
        let (app, id) = app_with_ring().await;
        add_to_cart(&app.db, &app.cart, &app.config, add(&id, 1)).await.unwrap();

        set_metal_rate(
            &app.db,
            SetRateArgs {
                material_id: "gold".to_string(),
                purity: "22K".to_string(),
                rate_paise_per_g: 700_000,
                effective_at: None,
            },
        )
        .await
        .unwrap();

        let before = get_cart(&app.cart, &app.config).unwrap();
        assert_eq!(before.items[0].item.pricing.metal_rate_paise_per_g, 600_000);

        let after = refresh_cart_rates(&app.db, &app.cart, &app.config).await.unwrap();
        assert_eq!(after.items[0].item.pricing.metal_rate_paise_per_g, 700_000);
        assert!(after.totals.grand_total > before.totals.grand_total);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let (app, _) = app_with_ring().await;
        let err = set_cart_customer(
            &app.db,
            &app.cart,
            &app.config,
            CartCustomerArgs {
                customer_id: Some("nobody".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
