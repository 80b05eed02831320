//! # Invoice Repository
//!
//! Invoice creation, payments, voiding and PDF bookkeeping.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout(draft, prefix, date, gst)                   │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    sequence = MAX(sequence) + 1 for the business date                  │
//! │    build_invoice + issue          (lustre-core: prices, settles)       │
//! │    for each line:                                                      │
//! │      UPDATE products SET current_stock = current_stock - qty           │
//! │       WHERE id = ? AND current_stock >= qty                            │
//! │        └── 0 rows ──────────────► InsufficientStock (rollback)         │
//! │    INSERT invoices, invoice_items, invoice_payments                    │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either the whole invoice is written and the stock moved, or nothing is.
//! Voiding puts the stock back in the same way.
//!
//! ## Storage
//! Each line's pricing inputs and breakdown are stored as JSON text: they
//! are read back whole and never queried field by field. Totals and the
//! settlement are plain integer columns so day reports can sum them.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use lustre_core::invoice::{
    build_invoice, Invoice, InvoiceDraft, InvoiceItem, InvoiceNumber, InvoiceStatus,
    InvoiceTotals, PaymentMethod, PaymentSplit, Settlement,
};
use lustre_core::{CoreError, GstPolicy, Money};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    business_date: NaiveDate,
    sequence: i64,
    status: InvoiceStatus,
    customer_id: Option<String>,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    gst_policy: String,
    total_charges_paise: i64,
    discount_paise: i64,
    taxable_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    gst_paise: i64,
    grand_total_paise: i64,
    tendered_paise: i64,
    applied_paise: i64,
    change_paise: i64,
    balance_due_paise: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    void_reason: Option<String>,
    pdf_path: Option<String>,
    pdf_fingerprint: Option<String>,
    pdf_generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    line_no: i64,
    product_id: String,
    sku: String,
    name: String,
    purity: String,
    pricing: String,
    breakdown: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    method: PaymentMethod,
    amount_paise: i64,
    reference: Option<String>,
}

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, business_date, sequence, status,
    customer_id, customer_name, customer_phone, gst_policy,
    total_charges_paise, discount_paise, taxable_paise, cgst_paise, sgst_paise,
    gst_paise, grand_total_paise,
    tendered_paise, applied_paise, change_paise, balance_due_paise,
    notes, created_at, issued_at, voided_at, void_reason,
    pdf_path, pdf_fingerprint, pdf_generated_at
"#;

/// Count and value of a day's invoices, void ones excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub invoice_count: i64,
    pub grand_total: Money,
    pub gst: Money,
    pub balance_due: Money,
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Next sequence number for `date` (1 for the first invoice of the day).
    pub async fn next_sequence(&self, date: NaiveDate) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        next_sequence(&mut conn, date).await
    }

    /// Numbers, prices, issues and stores an invoice in one transaction.
    pub async fn checkout(
        &self,
        draft: &InvoiceDraft,
        prefix: &str,
        date: NaiveDate,
        gst: &GstPolicy,
    ) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let sequence = next_sequence(&mut tx, date).await?;
        let number = InvoiceNumber::new(prefix, date, sequence);

        let mut invoice = build_invoice(draft, &number, gst)?;
        invoice.issue()?;

        write_invoice(&mut tx, &invoice).await?;
        tx.commit().await?;

        info!(
            invoice = %invoice.invoice_number,
            status = %invoice.status,
            total = %invoice.totals.grand_total,
            lines = invoice.items.len(),
            "Invoice issued"
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        load_invoice(&mut conn, "id", id).await
    }

    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        load_invoice(&mut conn, "invoice_number", number).await
    }

    /// A business day's invoices in sequence order.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM invoices WHERE business_date = ?1 ORDER BY sequence")
                .bind(date)
                .fetch_all(&mut *conn)
                .await?;

        let mut invoices = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(invoice) = load_invoice(&mut conn, "id", &id).await? {
                invoices.push(invoice);
            }
        }
        Ok(invoices)
    }

    pub async fn day_summary(&self, date: NaiveDate) -> DbResult<DaySummary> {
        let (count, total, gst, due): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(grand_total_paise), 0),
                   COALESCE(SUM(gst_paise), 0),
                   COALESCE(SUM(balance_due_paise), 0)
            FROM invoices
            WHERE business_date = ?1 AND status != 'void'
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(DaySummary {
            invoice_count: count,
            grand_total: Money::from_paise(total),
            gst: Money::from_paise(gst),
            balance_due: Money::from_paise(due),
        })
    }

    /// Records another tender against an issued invoice.
    pub async fn add_payment(&self, id: &str, split: PaymentSplit) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = load_invoice(&mut tx, "id", id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        invoice.add_payment(split.clone())?;

        insert_payment(&mut tx, &invoice.id, &split, Utc::now()).await?;
        write_status(&mut tx, &invoice).await?;

        tx.commit().await?;

        info!(
            invoice = %invoice.invoice_number,
            method = split.method.as_str(),
            amount = %split.amount,
            status = %invoice.status,
            "Payment recorded"
        );
        Ok(invoice)
    }

    /// Stores where a PDF was written and the fingerprint it was built from.
    pub async fn record_pdf(&self, id: &str, path: &str) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;

        let mut invoice = load_invoice(&mut conn, "id", id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        invoice.mark_pdf_generated(path)?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET pdf_path = ?2, pdf_fingerprint = ?3, pdf_generated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.pdf_path)
        .bind(&invoice.pdf_fingerprint)
        .bind(invoice.pdf_generated_at)
        .execute(&mut *conn)
        .await?;

        debug!(invoice = %invoice.invoice_number, path = %path, "PDF recorded");
        Ok(invoice)
    }

    /// Voids an invoice and returns its pieces to stock.
    pub async fn void(&self, id: &str, reason: &str) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        let mut invoice = load_invoice(&mut tx, "id", id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        invoice.void(reason)?;
        write_status(&mut tx, &invoice).await?;

        let now = Utc::now();
        for item in &invoice.items {
            sqlx::query(
                "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
            )
            .bind(&item.product_id)
            .bind(item.pricing.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        warn!(invoice = %invoice.invoice_number, reason = %reason, "Invoice voided");
        Ok(invoice)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn next_sequence(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<i64> {
    let next: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM invoices WHERE business_date = ?1",
    )
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(next)
}

/// Takes stock for every line, then writes the invoice rows.
async fn write_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let now = Utc::now();

    for item in &invoice.items {
        let quantity = item.pricing.quantity;
        let taken = sqlx::query(
            r#"
            UPDATE products
            SET current_stock = current_stock - ?2, updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND current_stock >= ?2
            "#,
        )
        .bind(&item.product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if taken.rows_affected() == 0 {
            let available: Option<i64> = sqlx::query_scalar(
                "SELECT current_stock FROM products WHERE id = ?1 AND is_active = 1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *conn)
            .await?;

            return Err(match available {
                None => CoreError::ProductNotFound(item.product_id.clone()),
                Some(available) => CoreError::InsufficientStock {
                    sku: item.sku.clone(),
                    available,
                    requested: quantity,
                },
            }
            .into());
        }
    }

    let gst_policy = serde_json::to_string(&invoice.gst_policy)?;
    let t = &invoice.totals;
    let s = &invoice.settlement;

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, business_date, sequence, status,
            customer_id, customer_name, customer_phone, gst_policy,
            total_charges_paise, discount_paise, taxable_paise, cgst_paise, sgst_paise,
            gst_paise, grand_total_paise,
            tendered_paise, applied_paise, change_paise, balance_due_paise,
            notes, created_at, issued_at, voided_at, void_reason,
            pdf_path, pdf_fingerprint, pdf_generated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14,
            ?15, ?16,
            ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24, ?25,
            ?26, ?27, ?28
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(invoice.business_date)
    .bind(invoice.sequence)
    .bind(invoice.status)
    .bind(&invoice.customer_id)
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_phone)
    .bind(gst_policy)
    .bind(t.total_charges.paise())
    .bind(t.discount.paise())
    .bind(t.taxable.paise())
    .bind(t.cgst.paise())
    .bind(t.sgst.paise())
    .bind(t.gst.paise())
    .bind(t.grand_total.paise())
    .bind(s.tendered.paise())
    .bind(s.applied.paise())
    .bind(s.change.paise())
    .bind(s.balance_due.paise())
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .bind(invoice.issued_at)
    .bind(invoice.voided_at)
    .bind(&invoice.void_reason)
    .bind(&invoice.pdf_path)
    .bind(&invoice.pdf_fingerprint)
    .bind(invoice.pdf_generated_at)
    .execute(&mut *conn)
    .await?;

    for item in &invoice.items {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                invoice_id, line_no, product_id, sku, name, purity, quantity,
                pricing, breakdown, final_amount_paise
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&invoice.id)
        .bind(item.line_no)
        .bind(&item.product_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.purity)
        .bind(item.pricing.quantity)
        .bind(serde_json::to_string(&item.pricing)?)
        .bind(serde_json::to_string(&item.breakdown)?)
        .bind(item.breakdown.final_amount.paise())
        .execute(&mut *conn)
        .await?;
    }

    for split in &invoice.payments {
        insert_payment(conn, &invoice.id, split, invoice.created_at).await?;
    }

    Ok(())
}

async fn insert_payment(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    split: &PaymentSplit,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_payments (invoice_id, method, amount_paise, reference, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(invoice_id)
    .bind(split.method)
    .bind(split.amount.paise())
    .bind(&split.reference)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Persists the mutable part of an invoice: status, settlement and void info.
async fn write_status(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let s = &invoice.settlement;

    sqlx::query(
        r#"
        UPDATE invoices SET
            status = ?2,
            tendered_paise = ?3,
            applied_paise = ?4,
            change_paise = ?5,
            balance_due_paise = ?6,
            voided_at = ?7,
            void_reason = ?8
        WHERE id = ?1
        "#,
    )
    .bind(&invoice.id)
    .bind(invoice.status)
    .bind(s.tendered.paise())
    .bind(s.applied.paise())
    .bind(s.change.paise())
    .bind(s.balance_due.paise())
    .bind(invoice.voided_at)
    .bind(&invoice.void_reason)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Loads an invoice by `id` or `invoice_number` with its lines and payments.
async fn load_invoice(
    conn: &mut SqliteConnection,
    key: &'static str,
    value: &str,
) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE {key} = ?1");

    let Some(row) = sqlx::query_as::<_, InvoiceRow>(&sql)
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT line_no, product_id, sku, name, purity, pricing, breakdown
        FROM invoice_items
        WHERE invoice_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|item| {
        Ok(InvoiceItem {
            line_no: item.line_no,
            product_id: item.product_id,
            sku: item.sku,
            name: item.name,
            purity: item.purity,
            pricing: serde_json::from_str(&item.pricing)?,
            breakdown: serde_json::from_str(&item.breakdown)?,
        })
    })
    .collect::<DbResult<Vec<_>>>()?;

    let payments = sqlx::query_as::<_, PaymentRow>(
        "SELECT method, amount_paise, reference FROM invoice_payments WHERE invoice_id = ?1 ORDER BY id",
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|p| PaymentSplit {
        method: p.method,
        amount: Money::from_paise(p.amount_paise),
        reference: p.reference,
    })
    .collect();

    Ok(Some(Invoice {
        gst_policy: serde_json::from_str(&row.gst_policy)?,
        totals: InvoiceTotals {
            total_charges: Money::from_paise(row.total_charges_paise),
            discount: Money::from_paise(row.discount_paise),
            taxable: Money::from_paise(row.taxable_paise),
            cgst: Money::from_paise(row.cgst_paise),
            sgst: Money::from_paise(row.sgst_paise),
            gst: Money::from_paise(row.gst_paise),
            grand_total: Money::from_paise(row.grand_total_paise),
        },
        settlement: Settlement {
            tendered: Money::from_paise(row.tendered_paise),
            applied: Money::from_paise(row.applied_paise),
            change: Money::from_paise(row.change_paise),
            balance_due: Money::from_paise(row.balance_due_paise),
        },
        id: row.id,
        invoice_number: row.invoice_number,
        business_date: row.business_date,
        sequence: row.sequence,
        status: row.status,
        customer_id: row.customer_id,
        customer_name: row.customer_name,
        customer_phone: row.customer_phone,
        items,
        payments,
        notes: row.notes,
        created_at: row.created_at,
        issued_at: row.issued_at,
        voided_at: row.voided_at,
        void_reason: row.void_reason,
        pdf_path: row.pdf_path,
        pdf_fingerprint: row.pdf_fingerprint,
        pdf_generated_at: row.pdf_generated_at,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_ring, seed_gold, test_db};
    use crate::Database;
    use lustre_core::cart::Cart;
    use lustre_core::Product;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn cash(rupees: i64) -> PaymentSplit {
        PaymentSplit {
            method: PaymentMethod::Cash,
            amount: Money::from_rupees(rupees),
            reference: None,
        }
    }

    /// One 10 g ring at ₹6000/g: grand total ₹66,950 with 1.5% + 1.5% GST.
    fn draft_for(product: &Product, payments: Vec<PaymentSplit>) -> InvoiceDraft {
        let mut cart = Cart::new();
        cart.add_item(product, Money::from_rupees(6_000), None, 1).unwrap();
        InvoiceDraft::from_cart(&cart).with_payments(payments)
    }

    async fn setup() -> (Database, Product) {
        let db = test_db().await;
        seed_gold(&db).await;
        let ring = insert_ring(&db, "RNG-001").await;
        (db, ring)
    }

    #[tokio::test]
    async fn test_checkout_writes_everything() {
        let (db, ring) = setup().await;

        let invoice = db
            .invoices()
            .checkout(&draft_for(&ring, vec![cash(67_000)]), "INV", date(), &GstPolicy::default())
            .await
            .unwrap();

        assert_eq!(invoice.invoice_number, "INV-20240309-0001");
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.totals.grand_total, Money::from_rupees(66_950));
        assert_eq!(invoice.settlement.change, Money::from_rupees(50));

        let loaded = db.invoices().get(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].breakdown, invoice.items[0].breakdown);
        assert_eq!(loaded.payments, invoice.payments);
        assert_eq!(loaded.totals, invoice.totals);
        assert_eq!(loaded.gst_policy, GstPolicy::default());

        let product = db.products().get_by_id(&ring.id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 2);
    }

    #[tokio::test]
    async fn test_daily_sequence() {
        let (db, ring) = setup().await;
        let gst = GstPolicy::default();

        let first = db
            .invoices()
            .checkout(&draft_for(&ring, vec![]), "INV", date(), &gst)
            .await
            .unwrap();
        let second = db
            .invoices()
            .checkout(&draft_for(&ring, vec![]), "INV", date(), &gst)
            .await
            .unwrap();
        let next_day = db
            .invoices()
            .checkout(&draft_for(&ring, vec![]), "INV", date().succ_opt().unwrap(), &gst)
            .await
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.invoice_number, "INV-20240309-0002");
        assert_eq!(next_day.sequence, 1);
        assert_eq!(db.invoices().next_sequence(date()).await.unwrap(), 3);

        let listed = db.invoices().list_by_date(date()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let (db, ring) = setup().await;
        db.products().update_stock(&ring.id, -3).await.unwrap();

        let err = db
            .invoices()
            .checkout(&draft_for(&ring, vec![]), "INV", date(), &GstPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 0, .. })
        ));

        assert!(db.invoices().list_by_date(date()).await.unwrap().is_empty());
        assert_eq!(db.invoices().next_sequence(date()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_partial_payment_then_settle() {
        let (db, ring) = setup().await;

        let invoice = db
            .invoices()
            .checkout(&draft_for(&ring, vec![cash(50_000)]), "INV", date(), &GstPolicy::default())
            .await
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(invoice.settlement.balance_due, Money::from_rupees(16_950));

        let upi = PaymentSplit {
            method: PaymentMethod::Upi,
            amount: Money::from_rupees(16_950),
            reference: Some("UPI-42".to_string()),
        };
        let paid = db.invoices().add_payment(&invoice.id, upi).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);

        let loaded = db.invoices().get(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, InvoiceStatus::Paid);
        assert_eq!(loaded.payments.len(), 2);
        assert!(loaded.settlement.balance_due.is_zero());

        let summary = db.invoices().day_summary(date()).await.unwrap();
        assert_eq!(summary.invoice_count, 1);
        assert_eq!(summary.grand_total, Money::from_rupees(66_950));
    }

    #[tokio::test]
    async fn test_card_overpayment_rejected() {
        let (db, ring) = setup().await;
        let card = PaymentSplit {
            method: PaymentMethod::Card,
            amount: Money::from_rupees(70_000),
            reference: None,
        };

        assert!(matches!(
            db.invoices()
                .checkout(&draft_for(&ring, vec![card]), "INV", date(), &GstPolicy::default())
                .await,
            Err(DbError::Domain(CoreError::InvalidPaymentAmount { .. }))
        ));
    }

    #[tokio::test]
    async fn test_void_restocks() {
        let (db, ring) = setup().await;
        let invoice = db
            .invoices()
            .checkout(&draft_for(&ring, vec![]), "INV", date(), &GstPolicy::default())
            .await
            .unwrap();

        let voided = db.invoices().void(&invoice.id, "Customer returned").await.unwrap();
        assert_eq!(voided.status, InvoiceStatus::Void);

        let product = db.products().get_by_id(&ring.id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, 3);

        let loaded = db.invoices().get_by_number(&invoice.invoice_number).await.unwrap().unwrap();
        assert_eq!(loaded.void_reason.as_deref(), Some("Customer returned"));

        assert!(matches!(
            db.invoices().void(&invoice.id, "again").await,
            Err(DbError::Domain(CoreError::InvalidInvoiceStatus { .. }))
        ));
        assert_eq!(db.invoices().day_summary(date()).await.unwrap().invoice_count, 0);
    }

    #[tokio::test]
    async fn test_pdf_fingerprint_tracks_changes() {
        let (db, ring) = setup().await;
        let invoice = db
            .invoices()
            .checkout(&draft_for(&ring, vec![cash(10_000)]), "INV", date(), &GstPolicy::default())
            .await
            .unwrap();
        assert!(invoice.needs_pdf_regeneration().unwrap());

        let recorded = db.invoices().record_pdf(&invoice.id, "/tmp/inv-1.pdf").await.unwrap();
        let loaded = db.invoices().get(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.pdf_fingerprint, recorded.pdf_fingerprint);
        assert!(!loaded.needs_pdf_regeneration().unwrap());

        let after_payment = db.invoices().add_payment(&invoice.id, cash(1_000)).await.unwrap();
        assert!(after_payment.needs_pdf_regeneration().unwrap());
    }

    #[tokio::test]
    async fn test_missing_invoice() {
        let db = test_db().await;
        assert!(db.invoices().get("missing").await.unwrap().is_none());
        assert!(matches!(
            db.invoices().void("missing", "typo").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
