//! # Store Configuration
//!
//! `AppConfig` is the single source for store-wide settings: what is printed
//! on invoices, how money is displayed, which GST policy every price uses
//! and how the appointment day is laid out.
//!
//! Loading (file, environment) happens in the application; this module only
//! defines the shape, defaults and validation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::booking::BookingDefaults;
use crate::currency::CurrencyFormat;
use crate::error::{CoreResult, ValidationError};
use crate::pricing::GstPolicy;
use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct AppConfig {
    /// Printed at the top of invoices.
    pub store_name: String,
    pub store_address: Vec<String>,
    pub store_phone: Option<String>,
    /// 15 character GST identification number.
    pub gstin: Option<String>,

    pub currency: CurrencyFormat,
    pub gst: GstPolicy,

    /// Invoice numbers look like `{invoice_prefix}-20240309-0001`.
    pub invoice_prefix: String,

    /// Products at or below this stock show up in the low stock report.
    pub low_stock_threshold: i64,

    pub booking: BookingDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            store_name: "Lustre Jewellers".to_string(),
            store_address: Vec::new(),
            store_phone: None,
            gstin: None,
            currency: CurrencyFormat::default(),
            gst: GstPolicy::default(),
            invoice_prefix: "INV".to_string(),
            low_stock_threshold: 1,
            booking: BookingDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Checks every field. Called after each load and before each save.
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_name("store name", &self.store_name, 120)?;

        if let Some(phone) = &self.store_phone {
            validation::validate_phone(phone)?;
        }
        if let Some(gstin) = &self.gstin {
            validate_gstin(gstin)?;
        }

        let prefix = &self.invoice_prefix;
        if prefix.is_empty()
            || prefix.len() > 10
            || !prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidFormat {
                field: "invoice prefix".to_string(),
                reason: "1 to 10 uppercase letters or digits".to_string(),
            }
            .into());
        }

        if self.currency.decimals > 2 {
            return Err(ValidationError::OutOfRange {
                field: "currency decimals".to_string(),
                min: 0,
                max: 2,
            }
            .into());
        }

        validation::validate_non_negative("low stock threshold", self.low_stock_threshold)?;
        self.gst.validate()?;
        self.booking.validate()?;
        Ok(())
    }
}

fn validate_gstin(gstin: &str) -> CoreResult<()> {
    if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "gstin".to_string(),
            reason: "must be 15 uppercase letters or digits".to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gst.total_bps(), 300);
    }

    #[test]
    fn test_rejects_bad_fields() {
        let mut config = AppConfig::default();
        config.invoice_prefix = "inv-".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gstin = Some("29ABC".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gst = GstPolicy::Flat { rate_bps: 20_000 };
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.currency.decimals = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_policy() {
        let mut config = AppConfig::default();
        config.gst = GstPolicy::Flat { rate_bps: 300 };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""kind":"flat""#));

        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"store_name":"Kanak"}"#).unwrap();
        assert_eq!(config.store_name, "Kanak");
        assert_eq!(config.invoice_prefix, "INV");
    }
}
