//! # Invoices
//!
//! Turns a cart into a frozen, numbered invoice and tracks what happens to
//! it afterwards: payments, voiding and the generated PDF.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoice Lifecycle                                │
//! │                                                                         │
//! │   Cart ──► InvoiceDraft::from_cart ──► build_invoice() ──► Draft       │
//! │                                                              │          │
//! │                                                         issue()         │
//! │                                                              │          │
//! │                        ┌──────────────┬──────────────────────┤          │
//! │                        ▼              ▼                      ▼          │
//! │                     Issued ──► PartiallyPaid ──────────►   Paid         │
//! │                        │   add_payment() │                   │          │
//! │                        └────────────────┴─────── void() ─────┴──► Void │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Rules
//! - Every split amount is positive
//! - Tendered more than the total is only allowed when the excess can be
//!   returned from cash; the excess is recorded as change
//! - Fully covered: `Paid`. Partly covered: `PartiallyPaid`. Nothing yet: `Issued`
//!
//! ## PDF Bookkeeping
//! [`content_fingerprint`] hashes every printed field. A stored PDF is stale
//! when its fingerprint differs from the invoice's current one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::cart::{Cart, CartItem};
use crate::config::AppConfig;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{sum_breakdowns, GstPolicy, LineBreakdown, PricingInput};
use crate::validation;

// =============================================================================
// Status and Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(&self, to: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        match (*self, to) {
            (Void, _) => false,
            (_, Void) => true,
            (Draft, Issued | PartiallyPaid | Paid) => true,
            (Issued, PartiallyPaid | Paid) => true,
            (PartiallyPaid, PartiallyPaid | Paid) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "issued" => Ok(InvoiceStatus::Issued),
            "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            other => Err(CoreError::Serialization(format!(
                "unknown invoice status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    BankTransfer,
    /// Customer's old gold valued against the bill.
    OldGoldExchange,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::OldGoldExchange => "old_gold_exchange",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::BankTransfer => "Bank transfer",
            PaymentMethod::OldGoldExchange => "Old gold",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "old_gold_exchange" => Ok(PaymentMethod::OldGoldExchange),
            other => Err(CoreError::Serialization(format!(
                "unknown payment method '{}'",
                other
            ))),
        }
    }
}

/// One tender towards an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentSplit {
    pub method: PaymentMethod,
    pub amount: Money,
    /// Card slip, UPI transaction id, exchange voucher.
    #[serde(default)]
    pub reference: Option<String>,
}

/// Outcome of applying payment splits to a total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Settlement {
    pub tendered: Money,
    /// Tendered minus change, never above the total.
    pub applied: Money,
    pub change: Money,
    pub balance_due: Money,
}

/// Applies payment splits to a grand total.
///
/// ```rust
/// use lustre_core::invoice::{settle_payments, PaymentMethod, PaymentSplit};
/// use lustre_core::money::Money;
///
/// let cash = PaymentSplit {
///     method: PaymentMethod::Cash,
///     amount: Money::from_rupees(1_000),
///     reference: None,
/// };
/// let s = settle_payments(&[cash], Money::from_rupees(950)).unwrap();
/// assert_eq!(s.change, Money::from_rupees(50));
/// ```
pub fn settle_payments(payments: &[PaymentSplit], total: Money) -> CoreResult<Settlement> {
    let mut tendered = Money::zero();
    let mut cash = Money::zero();

    for split in payments {
        validation::validate_payment_amount(split.amount.paise()).map_err(|_| {
            CoreError::InvalidPaymentAmount {
                reason: format!("{} payment must be positive", split.method.label()),
            }
        })?;
        tendered = tendered
            .checked_add(split.amount)
            .ok_or(CoreError::Overflow("payments"))?;
        if split.method == PaymentMethod::Cash {
            cash += split.amount;
        }
    }

    if tendered > total {
        let excess = tendered - total;
        if excess > cash {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "payments exceed total by {}; only cash can be over-tendered",
                    excess
                ),
            });
        }
        return Ok(Settlement {
            tendered,
            applied: total,
            change: excess,
            balance_due: Money::zero(),
        });
    }

    Ok(Settlement {
        tendered,
        applied: tendered,
        change: Money::zero(),
        balance_due: total - tendered,
    })
}

/// Status an issued invoice takes for a settlement.
fn status_for(settlement: &Settlement) -> InvoiceStatus {
    if settlement.balance_due.is_zero() {
        InvoiceStatus::Paid
    } else if settlement.applied.is_zero() {
        InvoiceStatus::Issued
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

// =============================================================================
// Invoice Numbers
// =============================================================================

/// `{prefix}-{YYYYMMDD}-{seq:04}`, with the sequence restarting every day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumber {
    pub prefix: String,
    pub date: NaiveDate,
    pub sequence: i64,
}

impl InvoiceNumber {
    pub fn new(prefix: impl Into<String>, date: NaiveDate, sequence: i64) -> Self {
        InvoiceNumber {
            prefix: prefix.into(),
            date,
            sequence,
        }
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.prefix,
            self.date.format("%Y%m%d"),
            self.sequence
        )
    }
}

// =============================================================================
// Draft and Invoice
// =============================================================================

/// Everything the counter knows at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDraft {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub payments: Vec<PaymentSplit>,
    pub notes: Option<String>,
}

impl InvoiceDraft {
    pub fn from_cart(cart: &Cart) -> Self {
        InvoiceDraft {
            customer_id: cart.customer_id.clone(),
            customer_name: None,
            customer_phone: None,
            items: cart.items.clone(),
            payments: Vec::new(),
            notes: None,
        }
    }

    pub fn with_payments(mut self, payments: Vec<PaymentSplit>) -> Self {
        self.payments = payments;
        self
    }
}

/// A priced line frozen onto an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub line_no: i64,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub purity: String,
    pub pricing: PricingInput,
    pub breakdown: LineBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub total_charges: Money,
    pub discount: Money,
    pub taxable: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub gst: Money,
    pub grand_total: Money,
}

impl From<&LineBreakdown> for InvoiceTotals {
    fn from(sum: &LineBreakdown) -> Self {
        InvoiceTotals {
            total_charges: sum.total_charges,
            discount: sum.discount_amount,
            taxable: sum.taxable_amount,
            cgst: sum.cgst,
            sgst: sum.sgst,
            gst: sum.gst_amount,
            grand_total: sum.final_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    #[ts(as = "String")]
    pub business_date: NaiveDate,
    pub sequence: i64,
    pub status: InvoiceStatus,

    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,

    pub gst_policy: GstPolicy,
    pub items: Vec<InvoiceItem>,
    pub payments: Vec<PaymentSplit>,
    pub totals: InvoiceTotals,
    pub settlement: Settlement,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub issued_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,

    pub pdf_path: Option<String>,
    pub pdf_fingerprint: Option<String>,
    #[ts(as = "Option<String>")]
    pub pdf_generated_at: Option<DateTime<Utc>>,
}

/// Prices a draft into a `Draft` invoice.
///
/// Payments are checked here so a bad tender is rejected before anything is
/// numbered or stored; call [`Invoice::issue`] to finalize.
pub fn build_invoice(
    draft: &InvoiceDraft,
    number: &InvoiceNumber,
    gst: &GstPolicy,
) -> CoreResult<Invoice> {
    if draft.items.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    gst.validate()?;

    let items = draft
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            Ok(InvoiceItem {
                line_no: idx as i64 + 1,
                product_id: item.product_id.clone(),
                sku: item.sku.clone(),
                name: item.name.clone(),
                purity: item.purity.clone(),
                pricing: item.pricing,
                breakdown: item.price(gst)?,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let totals = InvoiceTotals::from(&sum_breakdowns(items.iter().map(|i| &i.breakdown)));
    let settlement = settle_payments(&draft.payments, totals.grand_total)?;

    Ok(Invoice {
        id: uuid::Uuid::new_v4().to_string(),
        invoice_number: number.to_string(),
        business_date: number.date,
        sequence: number.sequence,
        status: InvoiceStatus::Draft,
        customer_id: draft.customer_id.clone(),
        customer_name: draft.customer_name.clone(),
        customer_phone: draft.customer_phone.clone(),
        gst_policy: *gst,
        items,
        payments: draft.payments.clone(),
        totals,
        settlement,
        notes: draft.notes.clone(),
        created_at: Utc::now(),
        issued_at: None,
        voided_at: None,
        void_reason: None,
        pdf_path: None,
        pdf_fingerprint: None,
        pdf_generated_at: None,
    })
}

impl Invoice {
    fn transition(&mut self, to: InvoiceStatus, operation: &str) -> CoreResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidInvoiceStatus {
                invoice_id: self.id.clone(),
                current_status: self.status.to_string(),
                operation: operation.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Finalizes a draft. The resulting status reflects payments so far.
    pub fn issue(&mut self) -> CoreResult<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(CoreError::InvalidInvoiceStatus {
                invoice_id: self.id.clone(),
                current_status: self.status.to_string(),
                operation: "issue".to_string(),
            });
        }
        let to = status_for(&self.settlement);
        self.transition(to, "issue")?;
        self.issued_at = Some(Utc::now());
        Ok(())
    }

    /// Records another tender against an issued invoice.
    pub fn add_payment(&mut self, split: PaymentSplit) -> CoreResult<()> {
        if !matches!(
            self.status,
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid
        ) {
            return Err(CoreError::InvalidInvoiceStatus {
                invoice_id: self.id.clone(),
                current_status: self.status.to_string(),
                operation: "add payment".to_string(),
            });
        }

        let mut payments = self.payments.clone();
        payments.push(split);
        let settlement = settle_payments(&payments, self.totals.grand_total)?;

        self.transition(status_for(&settlement), "add payment")?;
        self.payments = payments;
        self.settlement = settlement;
        Ok(())
    }

    pub fn void(&mut self, reason: &str) -> CoreResult<()> {
        validation::validate_name("void reason", reason, 500)?;
        self.transition(InvoiceStatus::Void, "void")?;
        self.voided_at = Some(Utc::now());
        self.void_reason = Some(reason.trim().to_string());
        Ok(())
    }

    /// True when no PDF exists or the stored one no longer matches.
    pub fn needs_pdf_regeneration(&self) -> CoreResult<bool> {
        match &self.pdf_fingerprint {
            None => Ok(true),
            Some(stored) => Ok(*stored != content_fingerprint(self)?),
        }
    }

    pub fn mark_pdf_generated(&mut self, path: impl Into<String>) -> CoreResult<()> {
        self.pdf_fingerprint = Some(content_fingerprint(self)?);
        self.pdf_path = Some(path.into());
        self.pdf_generated_at = Some(Utc::now());
        Ok(())
    }
}

// =============================================================================
// Fingerprint
// =============================================================================

/// The printed fields, in a fixed order.
#[derive(Serialize)]
struct PrintedContent<'a> {
    invoice_number: &'a str,
    business_date: NaiveDate,
    status: InvoiceStatus,
    customer_name: Option<&'a str>,
    customer_phone: Option<&'a str>,
    gst_policy: &'a GstPolicy,
    items: &'a [InvoiceItem],
    payments: &'a [PaymentSplit],
    totals: &'a InvoiceTotals,
    settlement: &'a Settlement,
    notes: Option<&'a str>,
    void_reason: Option<&'a str>,
}

/// SHA-256 hex digest of the canonical JSON of everything printed on the
/// invoice. PDF bookkeeping fields are excluded.
pub fn content_fingerprint(invoice: &Invoice) -> CoreResult<String> {
    let content = PrintedContent {
        invoice_number: &invoice.invoice_number,
        business_date: invoice.business_date,
        status: invoice.status,
        customer_name: invoice.customer_name.as_deref(),
        customer_phone: invoice.customer_phone.as_deref(),
        gst_policy: &invoice.gst_policy,
        items: &invoice.items,
        payments: &invoice.payments,
        totals: &invoice.totals,
        settlement: &invoice.settlement,
        notes: invoice.notes.as_deref(),
        void_reason: invoice.void_reason.as_deref(),
    };

    let bytes =
        serde_json::to_vec(&content).map_err(|e| CoreError::Serialization(e.to_string()))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

// =============================================================================
// Text Rendering
// =============================================================================

const WIDTH: usize = 42;

fn row(label: &str, value: &str) -> String {
    let pad = WIDTH.saturating_sub(label.chars().count());
    format!("{}{:>pad$}", label, value, pad = pad)
}

fn grams(mg: i64) -> String {
    format!("{}.{:03} g", mg / crate::MG_PER_GRAM, (mg % crate::MG_PER_GRAM).abs())
}

fn percent(bps: u32) -> String {
    format!("{}.{:02}%", bps / 100, bps % 100)
}

/// Fixed-width plain text for printers and the PDF pipeline.
pub fn render_text(invoice: &Invoice, config: &AppConfig) -> String {
    let fmt = &config.currency;
    let rule = "-".repeat(WIDTH);
    let mut out: Vec<String> = Vec::new();

    out.push(config.store_name.clone());
    out.extend(config.store_address.iter().cloned());
    if let Some(gstin) = &config.gstin {
        out.push(format!("GSTIN: {}", gstin));
    }
    out.push(rule.clone());
    out.push(row("Invoice", &invoice.invoice_number));
    out.push(row("Date", &invoice.business_date.format("%d-%m-%Y").to_string()));
    if let Some(name) = &invoice.customer_name {
        out.push(row("Customer", name));
    }
    if let Some(phone) = &invoice.customer_phone {
        out.push(row("Phone", phone));
    }
    out.push(rule.clone());

    for item in &invoice.items {
        let b = &item.breakdown;
        out.push(format!(
            "{}. {} ({}) x{}",
            item.line_no, item.name, item.purity, item.pricing.quantity
        ));
        out.push(row("   SKU", &item.sku));
        out.push(row("   Net weight", &grams(b.net_weight_mg)));
        out.push(row("   Metal", &fmt.format(b.base_amount)));
        out.push(row("   Making", &fmt.format(b.making_charges)));
        if !b.stone_amount.is_zero() {
            out.push(row("   Stones", &fmt.format(b.stone_amount)));
        }
        if !b.va_charges.is_zero() {
            out.push(row("   VA charges", &fmt.format(b.va_charges)));
        }
        if !b.discount_amount.is_zero() {
            out.push(row("   Discount", &fmt.format(-b.discount_amount)));
        }
        out.push(row("   Amount", &fmt.format(b.taxable_amount)));
    }

    let t = &invoice.totals;
    out.push(rule.clone());
    out.push(row("Total charges", &fmt.format(t.total_charges)));
    if !t.discount.is_zero() {
        out.push(row("Discount", &fmt.format(-t.discount)));
    }
    out.push(row("Taxable amount", &fmt.format(t.taxable)));
    match invoice.gst_policy {
        GstPolicy::Split { cgst_bps, sgst_bps } => {
            out.push(row(&format!("CGST {}", percent(cgst_bps)), &fmt.format(t.cgst)));
            out.push(row(&format!("SGST {}", percent(sgst_bps)), &fmt.format(t.sgst)));
        }
        GstPolicy::Flat { rate_bps } => {
            out.push(row(&format!("GST {}", percent(rate_bps)), &fmt.format(t.gst)));
        }
    }
    out.push(row("Grand total", &fmt.format(t.grand_total)));

    if !invoice.payments.is_empty() {
        out.push(rule.clone());
        for p in &invoice.payments {
            out.push(row(&format!("Paid: {}", p.method.label()), &fmt.format(p.amount)));
        }
        if !invoice.settlement.change.is_zero() {
            out.push(row("Change", &fmt.format(invoice.settlement.change)));
        }
    }
    if !invoice.settlement.balance_due.is_zero() {
        out.push(row("Balance due", &fmt.format(invoice.settlement.balance_due)));
    }

    out.push(rule);
    out.push(row("Status", &invoice.status.as_str().to_uppercase()));
    if let Some(reason) = &invoice.void_reason {
        out.push(row("Void reason", reason));
    }
    if let Some(notes) = &invoice.notes {
        out.push(notes.clone());
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

// =============================================================================
// Unit Tests
// =============================================================================
