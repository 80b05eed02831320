//! # Cart
//!
//! The in-progress sale: jewelry lines with their pricing inputs frozen at
//! the moment they were added.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  add_item(product, rates, qty) ──► merge by product id or push line    │
//! │  update_quantity(product, 0)   ──► removes the line                    │
//! │  update_quantity(product, n)   ──► sets quantity within stock          │
//! │  set_discount(id, bps)         ──► per-line discount override          │
//! │  remove_item(id) / clear()                                             │
//! │  remove_sold(lines, customer)  ──► after checkout, keeps later lines   │
//! │                                                                         │
//! │  totals(&GstPolicy) ──► price_line() per line ──► CartTotals           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - Every line's quantity is within 1..=MAX_ITEM_QUANTITY
//! - At most MAX_CART_ITEMS lines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{price_line, sum_breakdowns, GstPolicy, LineBreakdown, PricingInput};
use crate::types::Product;
use crate::validation;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// One line in the cart.
///
/// Product details and rates are a snapshot: a rate board update after the
/// line was added does not reprice it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub purity: String,
    /// Pricing inputs including the line quantity.
    pub pricing: PricingInput,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Snapshots a product at the given rates.
    pub fn from_product(
        product: &Product,
        metal_rate: Money,
        stone_rate: Option<Money>,
        quantity: i64,
    ) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            purity: product.purity.clone(),
            pricing: product.pricing_input(metal_rate, stone_rate, quantity),
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        self.pricing.quantity
    }

    /// Prices this line under a GST policy.
    pub fn price(&self, gst: &GstPolicy) -> CoreResult<LineBreakdown> {
        price_line(&self.pricing, gst)
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Customer the sale is for, if known.
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            customer_id: None,
            created_at: Utc::now(),
        }
    }

    /// Adds a product or increases the quantity of its existing line.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the product is inactive
    /// - `InsufficientStock` if stock cannot cover the merged quantity
    /// - `QuantityTooLarge` if the merged quantity exceeds MAX_ITEM_QUANTITY
    /// - `CartTooLarge` if a new line would exceed MAX_CART_ITEMS
    /// - `Validation` if the product's weights or rates are inconsistent
    pub fn add_item(
        &mut self,
        product: &Product,
        metal_rate: Money,
        stone_rate: Option<Money>,
        quantity: i64,
    ) -> CoreResult<()> {
        validation::validate_quantity(quantity)?;

        if !product.is_active {
            return Err(CoreError::ProductNotFound(product.id.clone()));
        }

        let existing = self
            .items
            .iter()
            .position(|i| i.product_id == product.id);

        let new_qty = match existing {
            Some(idx) => self.items[idx].quantity() + quantity,
            None => quantity,
        };

        if new_qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if !product.can_sell(new_qty) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.current_stock,
                requested: new_qty,
            });
        }

        match existing {
            Some(idx) => {
                self.items[idx].pricing.quantity = new_qty;
            }
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                let item = CartItem::from_product(product, metal_rate, stone_rate, quantity);
                item.pricing.validate()?;
                self.items.push(item);
            }
        }

        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    ///
    /// `product` is the line's product as it stands now, so the new quantity
    /// is checked against current stock.
    ///
    /// ## Errors
    /// - `NotInCart` if the product has no line
    /// - `QuantityTooLarge` above MAX_ITEM_QUANTITY
    /// - `InsufficientStock` if stock cannot cover the new quantity
    pub fn update_quantity(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(&product.id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validation::validate_quantity(quantity)?;

        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.current_stock,
                requested: quantity,
            });
        }

        let item = self.find_mut(&product.id)?;
        item.pricing.quantity = quantity;
        Ok(())
    }

    /// Overrides the discount on one line.
    pub fn set_discount(&mut self, product_id: &str, discount_bps: u32) -> CoreResult<()> {
        validation::validate_discount_bps(discount_bps)?;
        let item = self.find_mut(product_id)?;
        item.pricing.discount_bps = discount_bps;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn set_customer(&mut self, customer_id: Option<String>) {
        self.customer_id = customer_id;
    }

    /// Empties the cart and forgets the customer.
    pub fn clear(&mut self) {
        self.items.clear();
        self.customer_id = None;
        self.created_at = Utc::now();
    }

    /// Takes out what a finished sale sold, keeping anything added since.
    ///
    /// `sold` is the snapshot the invoice was built from. A line that grew
    /// after the snapshot keeps the extra quantity. The customer is
    /// forgotten once they have been invoiced or the cart is empty.
    pub fn remove_sold(&mut self, sold: &[CartItem], customer_id: Option<&str>) {
        for line in sold {
            if let Some(idx) = self.items.iter().position(|i| i.product_id == line.product_id) {
                let left = self.items[idx].quantity() - line.quantity();
                if left > 0 {
                    self.items[idx].pricing.quantity = left;
                } else {
                    self.items.remove(idx);
                }
            }
        }

        if self.items.is_empty() || self.customer_id.as_deref() == customer_id {
            self.customer_id = None;
        }
        if self.items.is_empty() {
            self.created_at = Utc::now();
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prices every line in cart order.
    pub fn priced_lines(&self, gst: &GstPolicy) -> CoreResult<Vec<LineBreakdown>> {
        self.items.iter().map(|i| i.price(gst)).collect()
    }

    /// Totals for display and checkout.
    pub fn totals(&self, gst: &GstPolicy) -> CoreResult<CartTotals> {
        let lines = self.priced_lines(gst)?;
        let sum = sum_breakdowns(&lines);

        Ok(CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            total_charges: sum.total_charges,
            discount: sum.discount_amount,
            taxable: sum.taxable_amount,
            cgst: sum.cgst,
            sgst: sum.sgst,
            gst: sum.gst_amount,
            grand_total: sum.final_amount,
        })
    }

    fn find_mut(&mut self, product_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }
}

/// Cart totals summary for responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    /// Metal + making + stones + VA, before discount.
    pub total_charges: Money,
    pub discount: Money,
    pub taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub gst: Money,
    pub grand_total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::test_product;

    const GOLD_22K: Money = Money::from_rupees(6_000);

    #[test]
    fn test_add_item_prices_line() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1"), GOLD_22K, None, 1).unwrap();

        let totals = cart.totals(&GstPolicy::default()).unwrap();
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_charges, Money::from_rupees(65_000));
        assert_eq!(totals.gst, Money::from_rupees(1_950));
        assert_eq!(totals.grand_total, Money::from_rupees(66_950));
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1");

        cart.add_item(&product, GOLD_22K, None, 1).unwrap();
        cart.add_item(&product, GOLD_22K, None, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_add_beyond_stock_fails() {
        let mut cart = Cart::new();
        let product = test_product("1"); // stock 3

        cart.add_item(&product, GOLD_22K, None, 2).unwrap();
        let err = cart.add_item(&product, GOLD_22K, None, 2).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_add_inactive_or_inconsistent_product_fails() {
        let mut cart = Cart::new();

        let mut inactive = test_product("1");
        inactive.is_active = false;
        assert!(cart.add_item(&inactive, GOLD_22K, None, 1).is_err());

        let mut bad = test_product("2");
        bad.less_weight_mg = bad.gross_weight_mg + 1;
        assert!(matches!(
            cart.add_item(&bad, GOLD_22K, None, 1),
            Err(CoreError::Validation(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string()), GOLD_22K, None, 1)
                .unwrap();
        }
        let err = cart
            .add_item(&test_product("extra"), GOLD_22K, None, 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        let product = test_product("1");
        cart.add_item(&product, GOLD_22K, None, 1).unwrap();

        cart.update_quantity(&product, 2).unwrap();
        assert_eq!(cart.total_quantity(), 2);

        cart.update_quantity(&product, 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.update_quantity(&product, 1),
            Err(CoreError::NotInCart(_))
        ));
        assert!(cart.update_quantity(&product, -1).is_err());
    }

    #[test]
    fn test_update_quantity_beyond_stock_fails() {
        let mut cart = Cart::new();
        let product = test_product("1"); // stock 3
        cart.add_item(&product, GOLD_22K, None, 1).unwrap();

        let err = cart.update_quantity(&product, 50).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 50,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 1);

        let mut retired = product.clone();
        retired.is_active = false;
        assert!(cart.update_quantity(&retired, 1).is_err());
    }

    #[test]
    fn test_add_with_unpriceable_charges_leaves_cart_empty() {
        let mut cart = Cart::new();
        let mut product = test_product("1");
        product.va_charges_paise = i64::MAX - 1_000_000;

        assert!(matches!(
            cart.add_item(&product, GOLD_22K, None, 1),
            Err(CoreError::Validation(_))
        ));
        assert!(cart.is_empty());
        assert!(cart.totals(&GstPolicy::default()).is_ok());
    }

    #[test]
    fn test_remove_sold_keeps_later_lines() {
        let mut cart = Cart::new();
        let ring = test_product("1");
        let chain = test_product("2");
        cart.add_item(&ring, GOLD_22K, None, 1).unwrap();
        cart.set_customer(Some("c1".to_string()));
        let sold = cart.items.clone();

        // The counter keeps working while the sale is being written
        cart.add_item(&ring, GOLD_22K, None, 1).unwrap();
        cart.add_item(&chain, GOLD_22K, None, 1).unwrap();

        cart.remove_sold(&sold, Some("c1"));

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.items[0].product_id, "1");
        assert_eq!(cart.items[0].quantity(), 1);
        assert_eq!(cart.items[1].product_id, "2");
        assert!(cart.customer_id.is_none());

        let sold = cart.items.clone();
        cart.remove_sold(&sold, None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_discount_applies_to_totals() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1"), GOLD_22K, None, 1).unwrap();
        cart.set_discount("1", 1_000).unwrap();

        let totals = cart.totals(&GstPolicy::default()).unwrap();
        assert_eq!(totals.discount, Money::from_rupees(6_500));
        assert_eq!(totals.taxable, Money::from_rupees(58_500));

        assert!(cart.set_discount("1", 10_001).is_err());
    }

    #[test]
    fn test_rates_are_frozen() {
        let mut cart = Cart::new();
        let product = test_product("1");
        cart.add_item(&product, GOLD_22K, None, 1).unwrap();
        // A later add at a new rate only merges the quantity.
        cart.add_item(&product, Money::from_rupees(7_000), None, 1)
            .unwrap();

        assert_eq!(cart.items[0].pricing.metal_rate_paise_per_g, 600_000);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1"), GOLD_22K, None, 1).unwrap();
        cart.set_customer(Some("c1".to_string()));

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.customer_id.is_none());
        assert_eq!(
            cart.totals(&GstPolicy::default()).unwrap(),
            CartTotals::default()
        );
    }
}
