//! # Config Commands
//!
//! Reading and saving store settings, and the currency formatter the
//! screens use for amount fields.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::state::{ConfigState, DbState};
use lustre_core::{AppConfig, Money};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatArgs {
    pub amount: Money,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseArgs {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAmount {
    pub amount: Money,
    pub text: String,
}

pub fn get_config(config: &ConfigState) -> AppConfig {
    debug!("get_config command");
    config.current()
}

/// Validates, persists and applies new settings. Carts already priced
/// pick up a changed GST policy on their next response.
pub async fn save_config(
    db: &DbState,
    config: &ConfigState,
    next: AppConfig,
) -> ApiResult<AppConfig> {
    db.inner().config().save(&next).await?;
    config.replace(next.clone());
    info!(store = %next.store_name, prefix = %next.invoice_prefix, "Settings applied");
    Ok(next)
}

/// Paise to display text, e.g. 6695000 -> "₹66,950.00".
pub fn format_amount(config: &ConfigState, args: FormatArgs) -> FormattedAmount {
    let text = config.current().currency.format(args.amount);
    FormattedAmount {
        amount: args.amount,
        text,
    }
}

/// Display text back to paise. Accepts the symbol and grouping commas.
pub fn parse_amount(config: &ConfigState, args: ParseArgs) -> ApiResult<FormattedAmount> {
    let currency = config.current().currency;
    let amount = currency.parse(&args.text)?;
    Ok(FormattedAmount {
        amount,
        text: currency.format(amount),
    })
}
