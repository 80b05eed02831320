//! # Booking Commands
//!
//! In-store appointment slots and the bookings made against them.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::commands::{DateArgs, IdArgs};
use crate::error::{ApiError, ApiResult};
use crate::state::{ConfigState, DbState};
use lustre_core::booking::{AvailabilitySlot, Booking, BookingStatus, NewBooking};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotArgs {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Defaults to the configured capacity.
    pub capacity: Option<i64>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSlotsArgs {
    pub date: Option<NaiveDate>,
    /// Only slots that can still take a booking.
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSlotArgs {
    pub id: String,
    pub blocked: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStatusArgs {
    pub id: String,
    pub status: BookingStatus,
}

// =============================================================================
// Slots
// =============================================================================

/// Lays out the day from the configured opening hours. Running it again
/// only fills gaps.
pub async fn open_day(
    db: &DbState,
    config: &ConfigState,
    args: DateArgs,
) -> ApiResult<Vec<AvailabilitySlot>> {
    let date = args.date_or_today();
    let defaults = config.current().booking;
    db.inner().bookings().open_day(date, &defaults).await?;
    Ok(db.inner().bookings().list_slots(date).await?)
}

pub async fn create_slot(
    db: &DbState,
    config: &ConfigState,
    args: CreateSlotArgs,
) -> ApiResult<AvailabilitySlot> {
    let capacity = args
        .capacity
        .unwrap_or_else(|| config.current().booking.capacity);

    let mut slot = AvailabilitySlot::new(args.date, args.start_time, args.end_time, capacity);
    slot.note = args.note.filter(|n| !n.trim().is_empty());

    let slot = db.inner().bookings().create_slot(&slot).await?;
    info!(id = %slot.id, date = %slot.date, start = %slot.start_time, "Slot created");
    Ok(slot)
}

pub async fn list_slots(db: &DbState, args: ListSlotsArgs) -> ApiResult<Vec<AvailabilitySlot>> {
    let date = args.date.unwrap_or_else(super::today);
    debug!(date = %date, available_only = args.available_only, "list_slots command");

    let bookings = db.inner().bookings();
    let slots = if args.available_only {
        bookings.available_slots(date).await?
    } else {
        bookings.list_slots(date).await?
    };
    Ok(slots)
}

/// Blocks or reopens a slot. Existing bookings stay.
pub async fn block_slot(db: &DbState, args: BlockSlotArgs) -> ApiResult<AvailabilitySlot> {
    let bookings = db.inner().bookings();
    bookings
        .set_blocked(&args.id, args.blocked, args.note.as_deref())
        .await?;
    bookings
        .get_slot(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Slot", &args.id))
}

/// Removes a slot nobody has booked.
pub async fn delete_slot(db: &DbState, args: IdArgs) -> ApiResult<()> {
    db.inner().bookings().delete_slot(&args.id).await?;
    info!(id = %args.id, "Slot deleted");
    Ok(())
}

// =============================================================================
// Bookings
// =============================================================================

/// Books a slot. A caller not yet in the customer registry is added to it.
pub async fn book_appointment(db: &DbState, mut request: NewBooking) -> ApiResult<Booking> {
    request.validate()?;

    if request.customer_id.is_none() {
        let customer = db
            .inner()
            .customers()
            .upsert(&request.customer_name, &request.customer_phone, None)
            .await?;
        request.customer_phone = customer.phone;
        request.customer_id = Some(customer.id);
    }

    Ok(db.inner().bookings().create_booking(&request).await?)
}

pub async fn get_booking(db: &DbState, args: IdArgs) -> ApiResult<Booking> {
    db.inner()
        .bookings()
        .get_booking(&args.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking", &args.id))
}

pub async fn list_bookings(db: &DbState, args: DateArgs) -> ApiResult<Vec<Booking>> {
    Ok(db.inner().bookings().list_bookings(args.date_or_today()).await?)
}

/// Confirm, complete, cancel or mark a no-show. Cancelling frees the
/// seat for someone else.
pub async fn update_booking_status(db: &DbState, args: BookingStatusArgs) -> ApiResult<Booking> {
    Ok(db.inner().bookings().update_status(&args.id, args.status).await?)
}
