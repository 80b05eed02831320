//! # Currency Formatting
//!
//! Renders `Money` for customers and parses what cashiers type back.
//!
//! ```text
//! Indian grouping:   ₹1,23,45,678.90   (3 digits, then groups of 2)
//! Western grouping:  ₹12,345,678.90    (groups of 3)
//! ```
//!
//! `parse(format(m)) == m` whenever `m` is representable at the configured
//! number of decimals.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Digit grouping style for the integer part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Grouping {
    #[default]
    Indian,
    Western,
}

/// How amounts are displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct CurrencyFormat {
    pub symbol: String,
    /// Digits after the decimal point, 0 to 2.
    pub decimals: u8,
    pub grouping: Grouping,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            symbol: "₹".to_string(),
            decimals: 2,
            grouping: Grouping::Indian,
        }
    }
}

impl CurrencyFormat {
    /// Formats an amount.
    ///
    /// ```rust
    /// use lustre_core::currency::CurrencyFormat;
    /// use lustre_core::money::Money;
    ///
    /// let fmt = CurrencyFormat::default();
    /// assert_eq!(fmt.format(Money::from_paise(12_345_678)), "₹1,23,456.78");
    /// assert_eq!(fmt.format(Money::from_rupees(-66_950)), "-₹66,950.00");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let decimals = self.decimals.min(2) as u32;
        let scale = 10_i64.pow(2 - decimals);

        // Rounded to the displayed precision, half away from zero.
        let paise = amount.paise() as i128;
        let half = scale as i128 / 2;
        let shown = if paise >= 0 {
            (paise + half) / scale as i128
        } else {
            -((-paise + half) / scale as i128)
        };

        let unit = 10_i128.pow(decimals);
        let magnitude = shown.unsigned_abs();
        let whole = magnitude / unit as u128;
        let frac = magnitude % unit as u128;

        let mut out = String::new();
        if shown < 0 {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&group_digits(&whole.to_string(), self.grouping));
        if decimals > 0 {
            out.push('.');
            out.push_str(&format!("{:0width$}", frac, width = decimals as usize));
        }
        out
    }

    /// Parses formatted or plain text into an amount.
    ///
    /// Accepts an optional sign, the configured symbol (before or after the
    /// sign), comma separators in any position and up to two decimals.
    ///
    /// ```rust
    /// use lustre_core::currency::CurrencyFormat;
    /// use lustre_core::money::Money;
    ///
    /// let fmt = CurrencyFormat::default();
    /// assert_eq!(fmt.parse("₹1,23,456.78").unwrap(), Money::from_paise(12_345_678));
    /// assert_eq!(fmt.parse("-5.5").unwrap(), Money::from_paise(-550));
    /// assert!(fmt.parse("12.345").is_err());
    /// ```
    pub fn parse(&self, text: &str) -> CoreResult<Money> {
        let err = || CoreError::CurrencyParse(text.to_string());

        let mut rest = text.trim();
        let mut negative = false;

        if let Some(r) = rest.strip_prefix('-') {
            negative = true;
            rest = r.trim_start();
        }
        if !self.symbol.is_empty() {
            if let Some(r) = rest.strip_prefix(self.symbol.as_str()) {
                rest = r.trim_start();
            }
        }
        if !negative {
            if let Some(r) = rest.strip_prefix('-') {
                negative = true;
                rest = r;
            }
        }

        let cleaned: String = rest.chars().filter(|c| *c != ',').collect();
        let (whole, frac) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(err());
        }

        // i128 so that -₹92,233,720,368,547,758.08 (i64::MIN paise) still
        // fits before the sign is applied
        let rupees: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let paise: i128 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i128>().map_err(|_| err())? * 10,
            _ => frac.parse().map_err(|_| err())?,
        };

        let total = rupees
            .checked_mul(crate::money::PAISE_PER_RUPEE as i128)
            .and_then(|r| r.checked_add(paise))
            .ok_or_else(err)?;
        let signed = if negative { -total } else { total };

        i64::try_from(signed).map(Money::from_paise).map_err(|_| err())
    }
}

/// Inserts comma separators into a string of ASCII digits.
fn group_digits(digits: &str, grouping: Grouping) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(len - 3);
    let step = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    let mut out = groups.join(",");
    out.push(',');
    out.push_str(tail);
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
