//! # Booking Repository
//!
//! Appointment slots and the bookings that hold them.
//!
//! ## Capacity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Booking a Slot                                       │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    load slot ── missing ──────────────► NotFound                       │
//! │    Booking::create (core rules) ─ full/blocked ─► SlotUnavailable      │
//! │    UPDATE availability_slots                                           │
//! │       SET booked = booked + 1                                          │
//! │     WHERE id = ? AND is_blocked = 0 AND booked < capacity              │
//! │       └── 0 rows (lost a race) ───────► SlotUnavailable                │
//! │    INSERT INTO bookings                                                │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelling gives the unit back in the same transaction as the status
//! change. Completed and no-show bookings keep theirs: the time was used.

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use lustre_core::booking::{
    check_new_slot, AvailabilitySlot, Booking, BookingDefaults, BookingStatus, NewBooking,
};
use lustre_core::CoreError;

const SLOT_COLUMNS: &str =
    "id, date, start_time, end_time, capacity, booked, is_blocked, note, created_at";

const BOOKING_COLUMNS: &str = r#"
    id, slot_id, customer_id, customer_name, customer_phone, purpose, notes,
    status, created_at, updated_at
"#;

#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // =========================================================================
    // Slots
    // =========================================================================

    /// Creates a slot after checking it against every slot on the same date.
    pub async fn create_slot(&self, slot: &AvailabilitySlot) -> DbResult<AvailabilitySlot> {
        let mut tx = self.pool.begin().await?;

        let existing = slots_on(&mut tx, slot.date).await?;
        check_new_slot(slot, &existing)?;
        insert_slot(&mut tx, slot).await?;

        tx.commit().await?;

        debug!(
            id = %slot.id,
            date = %slot.date,
            start = %slot.start_time,
            "Slot created"
        );
        Ok(slot.clone())
    }

    /// Lays out a day from the store's opening hours.
    ///
    /// Slots that would overlap ones already on the calendar are skipped, so
    /// running this twice for the same date adds nothing.
    pub async fn open_day(
        &self,
        date: NaiveDate,
        defaults: &BookingDefaults,
    ) -> DbResult<Vec<AvailabilitySlot>> {
        let candidates = defaults.day_slots(date)?;

        let mut tx = self.pool.begin().await?;
        let mut existing = slots_on(&mut tx, date).await?;
        let mut created = Vec::new();

        for slot in candidates {
            if check_new_slot(&slot, &existing).is_err() {
                continue;
            }
            insert_slot(&mut tx, &slot).await?;
            existing.push(slot.clone());
            created.push(slot);
        }

        tx.commit().await?;

        info!(date = %date, created = created.len(), "Day opened for bookings");
        Ok(created)
    }

    pub async fn get_slot(&self, id: &str) -> DbResult<Option<AvailabilitySlot>> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?1");

        let slot = sqlx::query_as::<_, AvailabilitySlot>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(slot)
    }

    /// Every slot on a date, in time order.
    pub async fn list_slots(&self, date: NaiveDate) -> DbResult<Vec<AvailabilitySlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM availability_slots WHERE date = ?1 ORDER BY start_time"
        );

        let slots = sqlx::query_as::<_, AvailabilitySlot>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(slots)
    }

    /// Slots on a date that can still take a booking.
    pub async fn available_slots(&self, date: NaiveDate) -> DbResult<Vec<AvailabilitySlot>> {
        let mut slots = self.list_slots(date).await?;
        slots.retain(AvailabilitySlot::is_bookable);
        Ok(slots)
    }

    /// Blocks or unblocks a slot. Existing bookings are kept.
    pub async fn set_blocked(&self, id: &str, blocked: bool, note: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE availability_slots SET is_blocked = ?2, note = COALESCE(?3, note) WHERE id = ?1",
        )
        .bind(id)
        .bind(blocked)
        .bind(note)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Slot", id));
        }

        info!(id = %id, blocked, "Slot block updated");
        Ok(())
    }

    /// Deletes a slot nobody has booked.
    pub async fn delete_slot(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE slot_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if bookings > 0 {
            return Err(DbError::Conflict(format!(
                "slot {} has {} booking(s); block it instead",
                id, bookings
            )));
        }

        let result = sqlx::query("DELETE FROM availability_slots WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Slot", id));
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Bookings
    // =========================================================================

    /// Books one unit of a slot's capacity.
    pub async fn create_booking(&self, request: &NewBooking) -> DbResult<Booking> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE id = ?1");
        let mut slot = sqlx::query_as::<_, AvailabilitySlot>(&sql)
            .bind(&request.slot_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Slot", &request.slot_id))?;

        let booking = Booking::create(request, &mut slot)?;

        let reserved = sqlx::query(
            r#"
            UPDATE availability_slots
            SET booked = booked + 1
            WHERE id = ?1 AND is_blocked = 0 AND booked < capacity
            "#,
        )
        .bind(&slot.id)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            warn!(slot = %slot.id, "Slot filled before booking was saved");
            return Err(CoreError::SlotUnavailable { slot_id: slot.id }.into());
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, slot_id, customer_id, customer_name, customer_phone, purpose, notes,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.slot_id)
        .bind(&booking.customer_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_phone)
        .bind(&booking.purpose)
        .bind(&booking.notes)
        .bind(booking.status)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            booking = %booking.id,
            slot = %booking.slot_id,
            remaining = slot.remaining(),
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");

        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    /// Bookings whose slot falls on `date`, in slot order.
    pub async fn list_bookings(&self, date: NaiveDate) -> DbResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.id, b.slot_id, b.customer_id, b.customer_name, b.customer_phone,
                   b.purpose, b.notes, b.status, b.created_at, b.updated_at
            FROM bookings b
            INNER JOIN availability_slots s ON s.id = b.slot_id
            WHERE s.date = ?1
            ORDER BY s.start_time, b.created_at
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    /// Moves a booking to `status`, releasing capacity on cancellation.
    pub async fn update_status(&self, id: &str, status: BookingStatus) -> DbResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
        let mut booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Booking", id))?;

        let from = booking.status;
        let release = booking.transition(status)?;

        sqlx::query("UPDATE bookings SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&booking.id)
            .bind(booking.status)
            .bind(booking.updated_at)
            .execute(&mut *tx)
            .await?;

        if release {
            sqlx::query(
                "UPDATE availability_slots SET booked = MAX(booked - 1, 0) WHERE id = ?1",
            )
            .bind(&booking.slot_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            booking = %id,
            from = %from,
            to = %status,
            released = release,
            "Booking status changed"
        );
        Ok(booking)
    }
}

async fn slots_on(
    tx: &mut Transaction<'_, Sqlite>,
    date: NaiveDate,
) -> DbResult<Vec<AvailabilitySlot>> {
    let sql = format!("SELECT {SLOT_COLUMNS} FROM availability_slots WHERE date = ?1");

    let slots = sqlx::query_as::<_, AvailabilitySlot>(&sql)
        .bind(date)
        .fetch_all(&mut **tx)
        .await?;

    Ok(slots)
}

async fn insert_slot(tx: &mut Transaction<'_, Sqlite>, slot: &AvailabilitySlot) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO availability_slots (
            id, date, start_time, end_time, capacity, booked, is_blocked, note, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&slot.id)
    .bind(slot.date)
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.capacity)
    .bind(slot.booked)
    .bind(slot.is_blocked)
    .bind(&slot.note)
    .bind(slot.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::NaiveTime;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 2).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn request(slot_id: &str) -> NewBooking {
        NewBooking {
            slot_id: slot_id.to_string(),
            customer_id: None,
            customer_name: "Meera".to_string(),
            customer_phone: "9876543210".to_string(),
            purpose: "Bridal consultation".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_overlapping_slot_rejected() {
        let db = test_db().await;
        let repo = db.bookings();

        repo.create_slot(&AvailabilitySlot::new(date(), t(10), t(11), 1))
            .await
            .unwrap();

        let clash = AvailabilitySlot::new(date(), t(10), t(12), 1);
        assert!(matches!(
            repo.create_slot(&clash).await,
            Err(DbError::Domain(CoreError::SlotOverlap { .. }))
        ));

        // Back to back is fine.
        repo.create_slot(&AvailabilitySlot::new(date(), t(11), t(12), 1))
            .await
            .unwrap();
        assert_eq!(repo.list_slots(date()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_open_day_is_idempotent() {
        let db = test_db().await;
        let defaults = BookingDefaults::default();

        let first = db.bookings().open_day(date(), &defaults).await.unwrap();
        assert_eq!(first.len(), 10);

        let second = db.bookings().open_day(date(), &defaults).await.unwrap();
        assert!(second.is_empty());

        let slots = db.bookings().list_slots(date()).await.unwrap();
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0].start_time, t(10));
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let db = test_db().await;
        let slot = db
            .bookings()
            .create_slot(&AvailabilitySlot::new(date(), t(10), t(11), 1))
            .await
            .unwrap();

        let booking = db.bookings().create_booking(&request(&slot.id)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        assert!(matches!(
            db.bookings().create_booking(&request(&slot.id)).await,
            Err(DbError::Domain(CoreError::SlotUnavailable { .. }))
        ));

        let stored = db.bookings().get_slot(&slot.id).await.unwrap().unwrap();
        assert_eq!(stored.booked, 1);
        assert!(db.bookings().available_slots(date()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_frees_capacity() {
        let db = test_db().await;
        let slot = db
            .bookings()
            .create_slot(&AvailabilitySlot::new(date(), t(10), t(11), 1))
            .await
            .unwrap();
        let booking = db.bookings().create_booking(&request(&slot.id)).await.unwrap();

        let cancelled = db
            .bookings()
            .update_status(&booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let stored = db.bookings().get_slot(&slot.id).await.unwrap().unwrap();
        assert_eq!(stored.booked, 0);

        // A cancelled booking is final.
        assert!(matches!(
            db.bookings().update_status(&booking.id, BookingStatus::Confirmed).await,
            Err(DbError::Domain(CoreError::InvalidBookingTransition { .. }))
        ));

        db.bookings().create_booking(&request(&slot.id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_show_keeps_capacity() {
        let db = test_db().await;
        let slot = db
            .bookings()
            .create_slot(&AvailabilitySlot::new(date(), t(10), t(11), 2))
            .await
            .unwrap();
        let booking = db.bookings().create_booking(&request(&slot.id)).await.unwrap();

        db.bookings()
            .update_status(&booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        db.bookings()
            .update_status(&booking.id, BookingStatus::NoShow)
            .await
            .unwrap();

        let stored = db.bookings().get_slot(&slot.id).await.unwrap().unwrap();
        assert_eq!(stored.booked, 1);

        let listed = db.bookings().list_bookings(date()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, BookingStatus::NoShow);
    }

    #[tokio::test]
    async fn test_blocked_slot_and_delete() {
        let db = test_db().await;
        let slot = db
            .bookings()
            .create_slot(&AvailabilitySlot::new(date(), t(10), t(11), 2))
            .await
            .unwrap();

        db.bookings()
            .set_blocked(&slot.id, true, Some("Stock audit"))
            .await
            .unwrap();
        assert!(matches!(
            db.bookings().create_booking(&request(&slot.id)).await,
            Err(DbError::Domain(CoreError::SlotUnavailable { .. }))
        ));

        db.bookings().set_blocked(&slot.id, false, None).await.unwrap();
        db.bookings().create_booking(&request(&slot.id)).await.unwrap();

        assert!(matches!(
            db.bookings().delete_slot(&slot.id).await,
            Err(DbError::Conflict(_))
        ));
        assert!(matches!(
            db.bookings().create_booking(&request(&crate::repository::generate_id())).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
