//! # Appointments
//!
//! In-store consultation slots and the bookings made against them.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Slot                                                                   │
//! │  ├── end_time > start_time                                              │
//! │  ├── no two slots on the same date overlap                              │
//! │  └── bookable when !is_blocked && booked < capacity                     │
//! │                                                                         │
//! │  Booking status                                                         │
//! │                                                                         │
//! │     Pending ──► Confirmed ──► Completed                                 │
//! │        │            │                                                   │
//! │        │            └──────► NoShow                                     │
//! │        └──────┬─────┘                                                   │
//! │               ▼                                                         │
//! │           Cancelled   (frees one unit of slot capacity)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation;

// =============================================================================
// Availability Slot
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AvailabilitySlot {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[ts(as = "String")]
    pub end_time: NaiveTime,
    pub capacity: i64,
    /// Bookings currently holding this slot (pending or confirmed).
    pub booked: i64,
    pub is_blocked: bool,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime, capacity: i64) -> Self {
        AvailabilitySlot {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            start_time,
            end_time,
            capacity,
            booked: 0,
            is_blocked: false,
            note: None,
            created_at: Utc::now(),
        }
    }

    /// Checks the slot on its own: time order and capacity bounds.
    pub fn validate(&self) -> CoreResult<()> {
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidFormat {
                field: "end time".to_string(),
                reason: "must be after start time".to_string(),
            }
            .into());
        }
        if self.capacity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "capacity".to_string(),
            }
            .into());
        }
        if self.booked < 0 || self.booked > self.capacity {
            return Err(ValidationError::OutOfRange {
                field: "booked".to_string(),
                min: 0,
                max: self.capacity,
            }
            .into());
        }
        Ok(())
    }

    /// Half-open interval overlap on the same date.
    pub fn overlaps(&self, other: &AvailabilitySlot) -> bool {
        self.date == other.date
            && self.start_time < other.end_time
            && other.start_time < self.end_time
    }

    #[inline]
    pub fn is_bookable(&self) -> bool {
        !self.is_blocked && self.booked < self.capacity
    }

    #[inline]
    pub fn remaining(&self) -> i64 {
        if self.is_blocked {
            0
        } else {
            (self.capacity - self.booked).max(0)
        }
    }

    /// Takes one unit of capacity.
    pub fn reserve(&mut self) -> CoreResult<()> {
        if !self.is_bookable() {
            return Err(CoreError::SlotUnavailable {
                slot_id: self.id.clone(),
            });
        }
        self.booked += 1;
        Ok(())
    }

    /// Returns one unit of capacity.
    pub fn release(&mut self) {
        self.booked = (self.booked - 1).max(0);
    }
}

/// Rejects a slot that is invalid or collides with an existing one.
///
/// `existing` may include the candidate itself (when editing); it is skipped
/// by id.
pub fn check_new_slot(
    candidate: &AvailabilitySlot,
    existing: &[AvailabilitySlot],
) -> CoreResult<()> {
    candidate.validate()?;

    if let Some(clash) = existing
        .iter()
        .find(|s| s.id != candidate.id && s.overlaps(candidate))
    {
        return Err(CoreError::SlotOverlap {
            existing_id: clash.id.clone(),
        });
    }
    Ok(())
}

/// Default opening hours and slot shape used to lay out a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct BookingDefaults {
    #[ts(as = "String")]
    pub open_time: NaiveTime,
    #[ts(as = "String")]
    pub close_time: NaiveTime,
    pub slot_minutes: i64,
    pub capacity: i64,
}

impl Default for BookingDefaults {
    fn default() -> Self {
        BookingDefaults {
            open_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            close_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
            slot_minutes: 60,
            capacity: 2,
        }
    }
}

impl BookingDefaults {
    pub fn validate(&self) -> CoreResult<()> {
        if self.close_time <= self.open_time {
            return Err(ValidationError::InvalidFormat {
                field: "close time".to_string(),
                reason: "must be after open time".to_string(),
            }
            .into());
        }
        if !(5..=480).contains(&self.slot_minutes) {
            return Err(ValidationError::OutOfRange {
                field: "slot minutes".to_string(),
                min: 5,
                max: 480,
            }
            .into());
        }
        if self.capacity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "capacity".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Lays out back-to-back slots from opening to closing time. A trailing
    /// interval shorter than `slot_minutes` is dropped.
    pub fn day_slots(&self, date: NaiveDate) -> CoreResult<Vec<AvailabilitySlot>> {
        self.validate()?;

        let step = Duration::minutes(self.slot_minutes);
        let mut slots = Vec::new();
        let mut start = self.open_time;

        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > self.close_time {
                break;
            }
            slots.push(AvailabilitySlot::new(date, start, end, self.capacity));
            start = end;
        }
        Ok(slots)
    }
}

// =============================================================================
// Booking
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    pub fn can_transition_to(&self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, to),
            (Pending, Confirmed)
                | (Confirmed, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    /// Final states accept no further transitions.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            other => Err(CoreError::Serialization(format!(
                "unknown booking status '{}'",
                other
            ))),
        }
    }
}

/// A request to book a slot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewBooking {
    pub slot_id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    /// "Bridal consultation", "Ring resizing", ...
    pub purpose: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_uuid(&self.slot_id)?;
        validation::validate_name("customer name", &self.customer_name, 120)?;
        validation::validate_phone(&self.customer_phone)?;
        validation::validate_name("purpose", &self.purpose, 200)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub slot_id: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub purpose: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a pending booking and takes capacity from `slot`.
    pub fn create(request: &NewBooking, slot: &mut AvailabilitySlot) -> CoreResult<Booking> {
        request.validate()?;
        if slot.id != request.slot_id {
            return Err(CoreError::SlotUnavailable {
                slot_id: request.slot_id.clone(),
            });
        }
        slot.reserve()?;

        let now = Utc::now();
        Ok(Booking {
            id: uuid::Uuid::new_v4().to_string(),
            slot_id: slot.id.clone(),
            customer_id: request.customer_id.clone(),
            customer_name: request.customer_name.trim().to_string(),
            customer_phone: request.customer_phone.trim().to_string(),
            purpose: request.purpose.trim().to_string(),
            notes: request.notes.clone(),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves to `to`. Returns `true` when the booking's slot capacity should
    /// be released.
    pub fn transition(&mut self, to: BookingStatus) -> CoreResult<bool> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidBookingTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(to == BookingStatus::Cancelled)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
