use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. Every instant comparison happens in this unit.
pub type Ms = i64;

pub type RoomId = Ulid;
pub type BookingId = Ulid;

pub const DAY_MS: Ms = 86_400_000;

/// Combine a calendar date and a time of day into a naive (UTC) instant.
pub fn instant(date: NaiveDate, time: NaiveTime) -> Ms {
    NaiveDateTime::new(date, time).and_utc().timestamp_millis()
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Priced stay products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StayType {
    #[serde(rename = "10 Hours")]
    TenHour,
    #[serde(rename = "21 Hours (Weekday)")]
    TwentyOneHourWeekday,
    #[serde(rename = "21 Hours (Weekend)")]
    TwentyOneHourWeekend,
    #[serde(rename = "Multi-Day")]
    MultiDay,
}

impl StayType {
    pub const ALL: [StayType; 4] = [
        StayType::TenHour,
        StayType::TwentyOneHourWeekday,
        StayType::TwentyOneHourWeekend,
        StayType::MultiDay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StayType::TenHour => "10 Hours",
            StayType::TwentyOneHourWeekday => "21 Hours (Weekday)",
            StayType::TwentyOneHourWeekend => "21 Hours (Weekend)",
            StayType::MultiDay => "Multi-Day",
        }
    }

    pub fn is_overnight(self) -> bool {
        matches!(
            self,
            StayType::TwentyOneHourWeekday | StayType::TwentyOneHourWeekend
        )
    }
}

impl std::fmt::Display for StayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a stored booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Confirmed,
    CheckIn,
    #[serde(rename = "checked-in")]
    CheckedIn,
    Completed,
    Cancelled,
    Rejected,
    #[serde(other)]
    Other,
}

impl BookingStatus {
    /// Blocking bookings reserve the room against overlapping requests.
    /// Unconfirmed and terminal states never block.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            BookingStatus::Approved
                | BookingStatus::Confirmed
                | BookingStatus::CheckIn
                | BookingStatus::CheckedIn
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckIn => "check_in",
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Other => "other",
        }
    }
}

/// A booking record as returned by the booking-list provider. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingBooking {
    pub id: BookingId,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default)]
    pub check_in_time: Option<NaiveTime>,
    #[serde(default)]
    pub check_out_time: Option<NaiveTime>,
    #[serde(default)]
    pub stay_type: Option<StayType>,
    pub status: BookingStatus,
}

/// A fully resolved candidate stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayInterval {
    pub check_in_date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub check_out_date: NaiveDate,
    pub check_out_time: NaiveTime,
}

impl StayInterval {
    pub fn start_ms(&self) -> Ms {
        instant(self.check_in_date, self.check_in_time)
    }

    pub fn end_ms(&self) -> Ms {
        instant(self.check_out_date, self.check_out_time)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestCount {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl GuestCount {
    pub fn new(adults: u32, children: u32, infants: u32) -> Self {
        Self {
            adults,
            children,
            infants,
        }
    }

    /// Bed-occupying guests. Infants are excluded.
    pub fn occupancy(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

/// A reserved range on a room, derived from one blocking booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub booking_id: BookingId,
    pub span: Span,
}

/// Blocking reservations of a single room, sorted by `span.start`.
#[derive(Debug, Clone, Default)]
pub struct RoomSchedule {
    pub reservations: Vec<Reservation>,
}

impl RoomSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert reservation maintaining sort order by span.start.
    pub fn insert(&mut self, reservation: Reservation) {
        let pos = self
            .reservations
            .binary_search_by_key(&reservation.span.start, |r| r.span.start)
            .unwrap_or_else(|e| e);
        self.reservations.insert(pos, reservation);
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Return only reservations whose span overlaps the query window.
    /// Uses binary search to skip reservations starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Reservation> {
        let right_bound = self
            .reservations
            .partition_point(|r| r.span.start < query.end);
        self.reservations[..right_bound]
            .iter()
            .filter(move |r| r.span.end > query.start)
    }
}
