//! # Checkout Commands
//!
//! Turning the cart into a numbered invoice, and everything that happens to
//! an invoice afterwards.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart ──► InvoiceDraft (+ customer, payments, notes)                    │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  ┌──────────────────────── one transaction ─────────────────────────┐  │
//! │  │ next number ─► price + settle ─► issue ─► decrement stock ─► save │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  cart cleared, Invoice returned (Issued / PartiallyPaid / Paid)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! If anything fails the transaction rolls back and the cart is untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::commands::{today, DateArgs, IdArgs};
use crate::error::{ApiError, ApiResult};
use crate::state::{CartState, ConfigState, DbState};
use lustre_core::invoice::{
    build_invoice, render_text, Invoice, InvoiceDraft, InvoiceNumber, PaymentMethod, PaymentSplit,
};
use lustre_core::Money;
use lustre_db::repository::invoice::DaySummary;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutArgs {
    #[serde(default)]
    pub payments: Vec<PaymentSplit>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentArgs {
    pub invoice_id: String,
    pub method: PaymentMethod,
    /// Paise.
    pub amount: Money,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoidArgs {
    pub invoice_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceNumberArgs {
    pub invoice_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPdfArgs {
    pub invoice_id: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceText {
    pub invoice_number: String,
    pub text: String,
    /// False when the stored PDF still matches the invoice.
    pub needs_pdf: bool,
}

/// Cart snapshot plus customer details, as the invoice will print them.
///
/// A registered customer on the cart fills in name and phone. A walk-in who
/// gives both a name and a valid phone is registered on the spot.
async fn draft_from_cart(
    db: &DbState,
    cart: &CartState,
    args: CheckoutArgs,
) -> ApiResult<InvoiceDraft> {
    let mut draft = cart.with_cart(InvoiceDraft::from_cart).with_payments(args.payments);
    draft.customer_name = args.customer_name.filter(|n| !n.trim().is_empty());
    draft.customer_phone = args.customer_phone.filter(|p| !p.trim().is_empty());
    draft.notes = args.notes.filter(|n| !n.trim().is_empty());

    let customers = db.inner().customers();
    if let Some(id) = draft.customer_id.clone() {
        let customer = customers
            .get_by_id(&id)
            .await?
            .ok_or_else(|| ApiError::not_found("Customer", &id))?;
        draft.customer_name.get_or_insert(customer.name);
        draft.customer_phone.get_or_insert(customer.phone);
    } else if let (Some(name), Some(phone)) =
        (draft.customer_name.clone(), draft.customer_phone.clone())
    {
        match customers.upsert(&name, &phone, None).await {
            Ok(customer) => {
                draft.customer_phone = Some(customer.phone);
                draft.customer_id = Some(customer.id);
            }
            Err(e) => warn!(error = %e, "Walk-in customer not registered"),
        }
    }

    Ok(draft)
}

// =============================================================================
// Checkout
// =============================================================================

/// Prices the cart as an invoice without saving anything.
///
/// The number shown is the one the next checkout would take today.
pub async fn preview_invoice(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    args: CheckoutArgs,
) -> ApiResult<Invoice> {
    let config = config.current();
    let draft = draft_from_cart(db, cart, args).await?;

    let date = today();
    let sequence = db.inner().invoices().next_sequence(date).await?;
    let number = InvoiceNumber::new(config.invoice_prefix.as_str(), date, sequence);

    Ok(build_invoice(&draft, &number, &config.gst)?)
}

/// Issues an invoice for the cart and takes the sold lines out of it.
///
/// Lines added while the invoice was being written stay in the cart.
pub async fn checkout(
    db: &DbState,
    cart: &CartState,
    config: &ConfigState,
    args: CheckoutArgs,
) -> ApiResult<Invoice> {
    let config = config.current();
    let draft = draft_from_cart(db, cart, args).await?;
    debug!(lines = draft.items.len(), payments = draft.payments.len(), "checkout command");

    let invoice = db
        .inner()
        .invoices()
        .checkout(&draft, &config.invoice_prefix, today(), &config.gst)
        .await?;

    cart.with_cart_mut(|c| c.remove_sold(&draft.items, draft.customer_id.as_deref()));

    info!(
        invoice = %invoice.invoice_number,
        total = %invoice.totals.grand_total,
        status = %invoice.status,
        "Checkout complete"
    );
    Ok(invoice)
}

// =============================================================================
// After Checkout
// =============================================================================

pub async fn add_payment(db: &DbState, args: AddPaymentArgs) -> ApiResult<Invoice> {
    let split = PaymentSplit {
        method: args.method,
        amount: args.amount,
        reference: args.reference.filter(|r| !r.trim().is_empty()),
    };
    let invoice = db.inner().invoices().add_payment(&args.invoice_id, split).await?;
    info!(
        invoice = %invoice.invoice_number,
        balance_due = %invoice.settlement.balance_due,
        "Payment recorded"
    );
    Ok(invoice)
}

/// Voids an invoice and puts its pieces back in stock.
pub async fn void_invoice(db: &DbState, args: VoidArgs) -> ApiResult<Invoice> {
    let invoice = db.inner().invoices().void(&args.invoice_id, &args.reason).await?;
    warn!(invoice = %invoice.invoice_number, reason = %args.reason, "Invoice voided");
    Ok(invoice)
}

pub async fn get_invoice(db: &DbState, args: IdArgs) -> ApiResult<Invoice> {
    db.inner()
        .invoices()
        .get(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &args.id))
}

pub async fn get_invoice_by_number(db: &DbState, args: InvoiceNumberArgs) -> ApiResult<Invoice> {
    db.inner()
        .invoices()
        .get_by_number(args.invoice_number.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &args.invoice_number))
}

pub async fn list_invoices(db: &DbState, args: DateArgs) -> ApiResult<Vec<Invoice>> {
    Ok(db.inner().invoices().list_by_date(args.date_or_today()).await?)
}

/// Count and totals of the day's non-void invoices.
pub async fn day_summary(db: &DbState, args: DateArgs) -> ApiResult<DaySummary> {
    Ok(db.inner().invoices().day_summary(args.date_or_today()).await?)
}

/// Printable text of an invoice, with whether its PDF is stale.
pub async fn invoice_text(
    db: &DbState,
    config: &ConfigState,
    args: IdArgs,
) -> ApiResult<InvoiceText> {
    let invoice = get_invoice(db, args).await?;
    Ok(InvoiceText {
        text: render_text(&invoice, &config.current()),
        needs_pdf: invoice.needs_pdf_regeneration()?,
        invoice_number: invoice.invoice_number,
    })
}

/// Records that a PDF was written for the invoice as it is now.
pub async fn record_invoice_pdf(db: &DbState, args: RecordPdfArgs) -> ApiResult<Invoice> {
    Ok(db.inner().invoices().record_pdf(&args.invoice_id, &args.path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, AddToCartArgs};
    use crate::commands::product::{create_product, get_product, tests::ring_input};
    use crate::error::ErrorCode;
    use crate::App;
    use lustre_core::invoice::InvoiceStatus;

    async fn app_with_ring_in_cart() -> (App, String) {
        let app = App::test_app().await;
        let product = create_product(&app.db, ring_input("RNG-22K-001")).await.unwrap();
        add_to_cart(
            &app.db,
            &app.cart,
            &app.config,
            AddToCartArgs {
                product_id: product.id.clone(),
                quantity: Some(1),
            },
        )
        .await
        .unwrap();
        (app, product.id)
    }

    fn cash(rupees: i64) -> PaymentSplit {
        PaymentSplit {
            method: PaymentMethod::Cash,
            amount: Money::from_rupees(rupees),
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_issues_and_clears_cart() {
        let (app, product_id) = app_with_ring_in_cart().await;

        let preview = preview_invoice(&app.db, &app.cart, &app.config, CheckoutArgs::default())
            .await
            .unwrap();
        assert_eq!(preview.status, InvoiceStatus::Draft);

        let invoice = checkout(
            &app.db,
            &app.cart,
            &app.config,
            CheckoutArgs {
                payments: vec![cash(67_000)],
                customer_name: Some("Meera Iyer".to_string()),
                customer_phone: Some("+91 98765 43210".to_string()),
                notes: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(invoice.invoice_number, preview.invoice_number);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.settlement.change, Money::from_rupees(50));
        assert_eq!(invoice.customer_phone.as_deref(), Some("9876543210"));
        assert!(invoice.customer_id.is_some());

        let cart = get_cart(&app.cart, &app.config).unwrap();
        assert!(cart.items.is_empty());

        let product = get_product(&app.db, IdArgs { id: product_id }).await.unwrap();
        assert_eq!(product.current_stock, 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let (app, _) = app_with_ring_in_cart().await;

        let card = PaymentSplit {
            method: PaymentMethod::Card,
            amount: Money::from_rupees(70_000),
            reference: None,
        };
        let err = checkout(
            &app.db,
            &app.cart,
            &app.config,
            CheckoutArgs {
                payments: vec![card],
                ..CheckoutArgs::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let cart = get_cart(&app.cart, &app.config).unwrap();
        assert_eq!(cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout() {
        let app = App::test_app().await;
        let err = checkout(&app.db, &app.cart, &app.config, CheckoutArgs::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }

    #[tokio::test]
    async fn test_pay_later_then_void() {
        let (app, product_id) = app_with_ring_in_cart().await;

        let invoice = checkout(&app.db, &app.cart, &app.config, CheckoutArgs::default())
            .await
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Issued);

        let invoice = add_payment(
            &app.db,
            AddPaymentArgs {
                invoice_id: invoice.id.clone(),
                method: PaymentMethod::Upi,
                amount: Money::from_rupees(30_000),
                reference: Some("UPI-1234".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);

        let summary = day_summary(&app.db, DateArgs::default()).await.unwrap();
        assert_eq!(summary.invoice_count, 1);

        let voided = void_invoice(
            &app.db,
            VoidArgs {
                invoice_id: invoice.id.clone(),
                reason: "Customer changed mind".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(voided.status, InvoiceStatus::Void);

        let product = get_product(&app.db, IdArgs { id: product_id }).await.unwrap();
        assert_eq!(product.current_stock, 2);

        let summary = day_summary(&app.db, DateArgs::default()).await.unwrap();
        assert_eq!(summary.invoice_count, 0);
    }

    #[tokio::test]
    async fn test_invoice_text_and_pdf_bookkeeping() {
        let (app, _) = app_with_ring_in_cart().await;
        let invoice = checkout(&app.db, &app.cart, &app.config, CheckoutArgs::default())
            .await
            .unwrap();

        let text = invoice_text(&app.db, &app.config, IdArgs { id: invoice.id.clone() })
            .await
            .unwrap();
        assert!(text.text.contains(&invoice.invoice_number));
        assert!(text.needs_pdf);

        record_invoice_pdf(
            &app.db,
            RecordPdfArgs {
                invoice_id: invoice.id.clone(),
                path: "/tmp/inv.pdf".to_string(),
            },
        )
        .await
        .unwrap();

        let text = invoice_text(&app.db, &app.config, IdArgs { id: invoice.id.clone() })
            .await
            .unwrap();
        assert!(!text.needs_pdf);

        let by_number = get_invoice_by_number(
            &app.db,
            InvoiceNumberArgs {
                invoice_number: invoice.invoice_number.clone(),
            },
        )
        .await
        .unwrap();
        assert_eq!(by_number.id, invoice.id);
    }
}
