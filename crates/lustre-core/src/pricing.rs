//! # Jewelry Line Pricing
//!
//! The one formula every cart line, quote and invoice goes through.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  net weight      = gross weight - less weight                           │
//! │  base amount     = net weight × metal rate × quantity                   │
//! │  making charges  = net weight × making rate per gram × quantity         │
//! │  stone amount    = cw weight × stone rate per carat × quantity          │
//! │  total charges   = base + making + stone + VA charges                   │
//! │  discount        = total charges × discount %                           │
//! │  taxable amount  = total charges - discount                             │
//! │  GST             = taxable × GST rate (flat, or CGST + SGST)            │
//! │  final amount    = taxable + GST                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each product term is rounded once, half away from zero, to whole paise.
//! VA charges are a flat amount per line and are not multiplied by quantity.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TaxRate;
use crate::validation;
use crate::{
    CENTS_PER_CARAT, MAX_CHARGE_PAISE, MAX_RATE_PAISE, MAX_STONE_WEIGHT_CENTS, MG_PER_GRAM,
};

// =============================================================================
// GST Policy
// =============================================================================

/// How GST is levied on the taxable amount.
///
/// Jewelry GST is 3%, invoiced either as one figure or as CGST 1.5% +
/// SGST 1.5% for intra-state sales. Both forms live here so that every
/// caller uses the same configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum GstPolicy {
    /// One GST rate applied to the taxable amount.
    Flat { rate_bps: u32 },
    /// Central and state components, each rounded separately.
    Split { cgst_bps: u32, sgst_bps: u32 },
}

impl Default for GstPolicy {
    fn default() -> Self {
        GstPolicy::Split {
            cgst_bps: 150,
            sgst_bps: 150,
        }
    }
}

impl GstPolicy {
    /// Combined rate in basis points.
    pub fn total_bps(&self) -> u32 {
        match *self {
            GstPolicy::Flat { rate_bps } => rate_bps,
            GstPolicy::Split { cgst_bps, sgst_bps } => cgst_bps.saturating_add(sgst_bps),
        }
    }

    /// Computes GST on a taxable amount.
    ///
    /// For a flat policy the total is reported as two halves so invoices can
    /// still print CGST and SGST lines; the halves always sum to the total.
    pub fn apply(&self, taxable: Money) -> GstAmounts {
        match *self {
            GstPolicy::Flat { rate_bps } => {
                let total = taxable.calculate_tax(TaxRate::from_bps(rate_bps));
                let cgst = total.prorate(1, 2);
                GstAmounts {
                    cgst,
                    sgst: total - cgst,
                    total,
                }
            }
            GstPolicy::Split { cgst_bps, sgst_bps } => {
                let cgst = taxable.calculate_tax(TaxRate::from_bps(cgst_bps));
                let sgst = taxable.calculate_tax(TaxRate::from_bps(sgst_bps));
                GstAmounts {
                    cgst,
                    sgst,
                    total: cgst + sgst,
                }
            }
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            GstPolicy::Flat { rate_bps } => validation::validate_tax_rate_bps(rate_bps)?,
            GstPolicy::Split { cgst_bps, sgst_bps } => {
                validation::validate_tax_rate_bps(cgst_bps)?;
                validation::validate_tax_rate_bps(sgst_bps)?;
                validation::validate_tax_rate_bps(cgst_bps.saturating_add(sgst_bps))?;
            }
        }
        Ok(())
    }
}

/// GST components for one taxable amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstAmounts {
    pub cgst: Money,
    pub sgst: Money,
    pub total: Money,
}

// =============================================================================
// Inputs and Breakdown
// =============================================================================

/// Everything needed to price one jewelry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingInput {
    pub gross_weight_mg: i64,
    pub less_weight_mg: i64,
    pub metal_rate_paise_per_g: i64,
    pub making_rate_paise_per_g: i64,
    pub cw_weight_cents: i64,
    pub stone_rate_paise_per_ct: i64,
    pub va_charges_paise: i64,
    pub discount_bps: u32,
    pub quantity: i64,
}

impl PricingInput {
    /// Rejects inputs that would silently produce meaningless totals.
    ///
    /// ## Rules
    /// - weights, rates and charges are non-negative and below their ceilings
    /// - less weight does not exceed gross weight
    /// - discount is within 0..=100%
    /// - quantity is within 1..=MAX_ITEM_QUANTITY
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_weights(self.gross_weight_mg, self.less_weight_mg)?;
        validation::validate_at_most("metal rate", self.metal_rate_paise_per_g, MAX_RATE_PAISE)?;
        validation::validate_at_most("making rate", self.making_rate_paise_per_g, MAX_RATE_PAISE)?;
        validation::validate_at_most("cw weight", self.cw_weight_cents, MAX_STONE_WEIGHT_CENTS)?;
        validation::validate_at_most("stone rate", self.stone_rate_paise_per_ct, MAX_RATE_PAISE)?;
        validation::validate_at_most("va charges", self.va_charges_paise, MAX_CHARGE_PAISE)?;
        validation::validate_discount_bps(self.discount_bps)?;
        validation::validate_quantity(self.quantity)?;
        Ok(())
    }

    #[inline]
    pub fn net_weight_mg(&self) -> i64 {
        self.gross_weight_mg - self.less_weight_mg
    }
}

/// Every intermediate of a priced line, as shown on quotes and invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineBreakdown {
    pub net_weight_mg: i64,
    pub base_amount: Money,
    pub making_charges: Money,
    pub stone_amount: Money,
    pub va_charges: Money,
    pub total_charges: Money,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub gst_amount: Money,
    pub final_amount: Money,
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices one line.
///
/// ## Example
/// ```rust
/// use lustre_core::money::Money;
/// use lustre_core::pricing::{price_line, GstPolicy, PricingInput};
///
/// let input = PricingInput {
///     gross_weight_mg: 10_000,
///     less_weight_mg: 0,
///     metal_rate_paise_per_g: 600_000,
///     making_rate_paise_per_g: 50_000,
///     cw_weight_cents: 0,
///     stone_rate_paise_per_ct: 0,
///     va_charges_paise: 0,
///     discount_bps: 0,
///     quantity: 1,
/// };
/// let line = price_line(&input, &GstPolicy::Flat { rate_bps: 300 }).unwrap();
/// assert_eq!(line.total_charges, Money::from_rupees(65_000));
/// assert_eq!(line.gst_amount, Money::from_rupees(1_950));
/// ```
pub fn price_line(input: &PricingInput, gst: &GstPolicy) -> CoreResult<LineBreakdown> {
    input.validate()?;

    let net_weight_mg = input.net_weight_mg();
    let metal_mg = net_weight_mg
        .checked_mul(input.quantity)
        .ok_or(CoreError::Overflow("metal weight"))?;
    let stone_cents = input
        .cw_weight_cents
        .checked_mul(input.quantity)
        .ok_or(CoreError::Overflow("stone weight"))?;

    let base_amount =
        Money::from_paise(input.metal_rate_paise_per_g).prorate(metal_mg, MG_PER_GRAM);
    let making_charges =
        Money::from_paise(input.making_rate_paise_per_g).prorate(metal_mg, MG_PER_GRAM);
    let stone_amount =
        Money::from_paise(input.stone_rate_paise_per_ct).prorate(stone_cents, CENTS_PER_CARAT);
    let va_charges = Money::from_paise(input.va_charges_paise);

    let total_charges = [base_amount, making_charges, stone_amount, va_charges]
        .into_iter()
        .try_fold(Money::zero(), Money::checked_add)
        .ok_or(CoreError::Overflow("total charges"))?;

    let discount_amount = total_charges.percentage(input.discount_bps);
    let taxable_amount = total_charges - discount_amount;
    let tax = gst.apply(taxable_amount);
    let final_amount = taxable_amount
        .checked_add(tax.total)
        .ok_or(CoreError::Overflow("final amount"))?;

    Ok(LineBreakdown {
        net_weight_mg,
        base_amount,
        making_charges,
        stone_amount,
        va_charges,
        total_charges,
        discount_amount,
        taxable_amount,
        cgst: tax.cgst,
        sgst: tax.sgst,
        gst_amount: tax.total,
        final_amount,
    })
}

/// Sums breakdowns field by field (cart and invoice totals).
pub fn sum_breakdowns<'a, I>(lines: I) -> LineBreakdown
where
    I: IntoIterator<Item = &'a LineBreakdown>,
{
    lines
        .into_iter()
        .fold(LineBreakdown::default(), |acc, l| LineBreakdown {
            net_weight_mg: acc.net_weight_mg + l.net_weight_mg,
            base_amount: acc.base_amount + l.base_amount,
            making_charges: acc.making_charges + l.making_charges,
            stone_amount: acc.stone_amount + l.stone_amount,
            va_charges: acc.va_charges + l.va_charges,
            total_charges: acc.total_charges + l.total_charges,
            discount_amount: acc.discount_amount + l.discount_amount,
            taxable_amount: acc.taxable_amount + l.taxable_amount,
            cgst: acc.cgst + l.cgst,
            sgst: acc.sgst + l.sgst,
            gst_amount: acc.gst_amount + l.gst_amount,
            final_amount: acc.final_amount + l.final_amount,
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use proptest::prelude::*;

    fn ten_gram_ring() -> PricingInput {
        PricingInput {
            gross_weight_mg: 10_000,
            less_weight_mg: 0,
            metal_rate_paise_per_g: 600_000,
            making_rate_paise_per_g: 50_000,
            cw_weight_cents: 0,
            stone_rate_paise_per_ct: 0,
            va_charges_paise: 0,
            discount_bps: 0,
            quantity: 1,
        }
    }

    #[test]
    fn test_reference_example_flat() {
        let line = price_line(&ten_gram_ring(), &GstPolicy::Flat { rate_bps: 300 }).unwrap();

        assert_eq!(line.base_amount, Money::from_rupees(60_000));
        assert_eq!(line.making_charges, Money::from_rupees(5_000));
        assert_eq!(line.total_charges, Money::from_rupees(65_000));
        assert_eq!(line.gst_amount, Money::from_rupees(1_950));
        assert_eq!(line.final_amount, Money::from_rupees(66_950));
        assert_eq!(line.cgst + line.sgst, line.gst_amount);
    }

    #[test]
    fn test_reference_example_split_matches_flat() {
        let line = price_line(&ten_gram_ring(), &GstPolicy::default()).unwrap();

        assert_eq!(line.cgst, Money::from_rupees(975));
        assert_eq!(line.sgst, Money::from_rupees(975));
        assert_eq!(line.final_amount, Money::from_rupees(66_950));
    }

    #[test]
    fn test_stones_va_discount_and_quantity() {
        let input = PricingInput {
            gross_weight_mg: 5_250,
            less_weight_mg: 250,
            metal_rate_paise_per_g: 600_000,
            making_rate_paise_per_g: 40_000,
            // 0.5 ct at ₹20,000/ct
            cw_weight_cents: 50,
            stone_rate_paise_per_ct: 2_000_000,
            // ₹500 flat, 10% off
            va_charges_paise: 50_000,
            discount_bps: 1_000,
            quantity: 2,
        };
        let line = price_line(&input, &GstPolicy::Flat { rate_bps: 300 }).unwrap();

        assert_eq!(line.net_weight_mg, 5_000);
        assert_eq!(line.base_amount, Money::from_rupees(60_000)); // 10 g total
        assert_eq!(line.making_charges, Money::from_rupees(4_000));
        assert_eq!(line.stone_amount, Money::from_rupees(20_000)); // 1 ct total
        assert_eq!(line.va_charges, Money::from_rupees(500));
        assert_eq!(line.total_charges, Money::from_rupees(84_500));
        assert_eq!(line.discount_amount, Money::from_rupees(8_450));
        assert_eq!(line.taxable_amount, Money::from_rupees(76_050));
        assert_eq!(line.gst_amount, Money::from_rupees_paise(2_281, 50));
        assert_eq!(line.final_amount, Money::from_rupees_paise(78_331, 50));
    }

    #[test]
    fn test_split_rounds_each_component() {
        // taxable 0.33 → 1.5% = 0.495 paise → each rounds to 0
        let policy = GstPolicy::default();
        let gst = policy.apply(Money::from_paise(33));
        assert_eq!(gst.total, Money::zero());

        // 0.34 → 0.51 → each rounds to 1 paise
        let gst = policy.apply(Money::from_paise(34));
        assert_eq!(gst.total, Money::from_paise(2));
    }

    #[test]
    fn test_less_weight_above_gross_rejected() {
        let mut input = ten_gram_ring();
        input.less_weight_mg = 10_001;
        assert!(matches!(
            price_line(&input, &GstPolicy::default()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_rate_and_zero_quantity_rejected() {
        let mut input = ten_gram_ring();
        input.metal_rate_paise_per_g = -1;
        assert!(price_line(&input, &GstPolicy::default()).is_err());

        let mut input = ten_gram_ring();
        input.quantity = 0;
        assert!(price_line(&input, &GstPolicy::default()).is_err());

        let mut input = ten_gram_ring();
        input.discount_bps = 10_001;
        assert!(price_line(&input, &GstPolicy::default()).is_err());
    }

    #[test]
    fn test_charges_above_ceiling_rejected() {
        let mut input = ten_gram_ring();
        input.va_charges_paise = i64::MAX - 1_000_000;
        assert!(matches!(
            price_line(&input, &GstPolicy::default()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let mut input = ten_gram_ring();
        input.metal_rate_paise_per_g = MAX_RATE_PAISE + 1;
        assert!(input.validate().is_err());

        // Every input at its ceiling still prices without overflow
        let input = PricingInput {
            gross_weight_mg: crate::MAX_WEIGHT_MG,
            less_weight_mg: 0,
            metal_rate_paise_per_g: MAX_RATE_PAISE,
            making_rate_paise_per_g: MAX_RATE_PAISE,
            cw_weight_cents: MAX_STONE_WEIGHT_CENTS,
            stone_rate_paise_per_ct: MAX_RATE_PAISE,
            va_charges_paise: MAX_CHARGE_PAISE,
            discount_bps: 0,
            quantity: crate::MAX_ITEM_QUANTITY,
        };
        assert!(price_line(&input, &GstPolicy::default()).is_ok());
    }

    #[test]
    fn test_full_discount_is_zero() {
        let mut input = ten_gram_ring();
        input.discount_bps = 10_000;
        let line = price_line(&input, &GstPolicy::default()).unwrap();
        assert!(line.final_amount.is_zero());
    }

    #[test]
    fn test_policy_validation() {
        assert!(GstPolicy::default().validate().is_ok());
        assert!(GstPolicy::Flat { rate_bps: 10_001 }.validate().is_err());
        assert!(GstPolicy::Split {
            cgst_bps: 6_000,
            sgst_bps: 6_000
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_sum_breakdowns() {
        let policy = GstPolicy::default();
        let a = price_line(&ten_gram_ring(), &policy).unwrap();
        let b = price_line(&ten_gram_ring(), &policy).unwrap();
        let total = sum_breakdowns([&a, &b]);
        assert_eq!(total.final_amount, Money::from_rupees(133_900));
        assert_eq!(total.net_weight_mg, 20_000);
    }

    fn policy_strategy() -> impl Strategy<Value = GstPolicy> {
        prop_oneof![
            (0u32..=2_800).prop_map(|rate_bps| GstPolicy::Flat { rate_bps }),
            (0u32..=1_400, 0u32..=1_400)
                .prop_map(|(cgst_bps, sgst_bps)| GstPolicy::Split { cgst_bps, sgst_bps }),
        ]
    }

    prop_compose! {
        fn valid_input()(
            gross in 0i64..200_000,
            less_share in 0i64..=100,
            metal in 0i64..2_000_000,
            making in 0i64..200_000,
            cw in 0i64..1_000,
            stone in 0i64..10_000_000,
            va in 0i64..1_000_000,
            discount in 0u32..=10_000,
            quantity in 1i64..=crate::MAX_ITEM_QUANTITY,
        ) -> PricingInput {
            PricingInput {
                gross_weight_mg: gross,
                less_weight_mg: gross * less_share / 100,
                metal_rate_paise_per_g: metal,
                making_rate_paise_per_g: making,
                cw_weight_cents: cw,
                stone_rate_paise_per_ct: stone,
                va_charges_paise: va,
                discount_bps: discount,
                quantity,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_final_amount_non_negative(input in valid_input(), policy in policy_strategy()) {
            let line = price_line(&input, &policy).unwrap();
            prop_assert!(!line.final_amount.is_negative());
            prop_assert_eq!(line.cgst + line.sgst, line.gst_amount);
        }

        #[test]
        fn prop_monotone_in_rates_and_va(
            input in valid_input(),
            policy in policy_strategy(),
            bump in 0i64..500_000,
            which in 0usize..4,
        ) {
            let mut higher = input;
            match which {
                0 => higher.metal_rate_paise_per_g += bump,
                1 => higher.making_rate_paise_per_g += bump,
                2 => higher.stone_rate_paise_per_ct += bump,
                _ => higher.va_charges_paise += bump,
            }
            let low = price_line(&input, &policy).unwrap();
            let high = price_line(&higher, &policy).unwrap();
            prop_assert!(high.final_amount >= low.final_amount);
        }

        #[test]
        fn prop_non_increasing_in_discount(
            input in valid_input(),
            policy in policy_strategy(),
            extra in 0u32..=10_000,
        ) {
            let mut deeper = input;
            deeper.discount_bps = (input.discount_bps + extra).min(10_000);
            let base = price_line(&input, &policy).unwrap();
            let discounted = price_line(&deeper, &policy).unwrap();
            prop_assert!(discounted.final_amount <= base.final_amount);
        }
    }
}
