use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use ulid::Ulid;

use crate::checkout::BookingPayload;
use crate::model::*;
use crate::reconcile::CheckoutError;

/// Source of a room's existing bookings. Order of the returned records is irrelevant.
#[async_trait]
pub trait BookingProvider: Send + Sync {
    async fn bookings_for_room(&self, room: RoomId) -> Result<Vec<ExistingBooking>, CheckoutError>;
}

/// Accepts finalized bookings.
#[async_trait]
pub trait BookingSink: Send + Sync {
    async fn submit(&self, payload: BookingPayload) -> Result<SubmissionReceipt, CheckoutError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub booking_id: BookingId,
    pub room_id: RoomId,
    pub status: BookingStatus,
}

/// Booking table held in memory, keyed by room.
pub struct InMemoryBookings {
    rooms: DashMap<RoomId, Vec<ExistingBooking>>,
    /// Reverse lookup: booking id → room id
    booking_to_room: DashMap<BookingId, RoomId>,
}

impl Default for InMemoryBookings {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookings {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            booking_to_room: DashMap::new(),
        }
    }

    pub fn from_rooms(rooms: impl IntoIterator<Item = (RoomId, Vec<ExistingBooking>)>) -> Self {
        let store = Self::new();
        for (room, bookings) in rooms {
            store.add_room(room);
            for booking in bookings {
                store.insert(room, booking);
            }
        }
        store
    }

    pub fn add_room(&self, room: RoomId) {
        self.rooms.entry(room).or_default();
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|e| *e.key()).collect()
    }

    pub fn booking_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map(|e| e.len()).unwrap_or(0)
    }

    pub fn insert(&self, room: RoomId, booking: ExistingBooking) {
        self.booking_to_room.insert(booking.id, room);
        self.rooms.entry(room).or_default().push(booking);
    }

    pub fn get(&self, id: &BookingId) -> Option<ExistingBooking> {
        let room = *self.booking_to_room.get(id)?.value();
        let bookings = self.rooms.get(&room)?;
        bookings.iter().find(|b| b.id == *id).cloned()
    }

    /// Staff transition (approve, check in, cancel, ...).
    pub fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<(), CheckoutError> {
        let room = self
            .booking_to_room
            .get(&id)
            .map(|e| *e.value())
            .ok_or(CheckoutError::BookingNotFound(id))?;
        let mut bookings = self
            .rooms
            .get_mut(&room)
            .ok_or(CheckoutError::BookingNotFound(id))?;
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(CheckoutError::BookingNotFound(id))?;
        info!(
            "booking {id}: {} -> {}",
            booking.status.as_str(),
            status.as_str()
        );
        booking.status = status;
        Ok(())
    }
}

#[async_trait]
impl BookingProvider for InMemoryBookings {
    async fn bookings_for_room(&self, room: RoomId) -> Result<Vec<ExistingBooking>, CheckoutError> {
        Ok(self
            .rooms
            .get(&room)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl BookingSink for InMemoryBookings {
    /// New bookings start as pending and do not block until approved.
    async fn submit(&self, payload: BookingPayload) -> Result<SubmissionReceipt, CheckoutError> {
        let booking = ExistingBooking {
            id: Ulid::new(),
            check_in_date: payload.interval.check_in_date,
            check_out_date: payload.interval.check_out_date,
            check_in_time: Some(payload.interval.check_in_time),
            check_out_time: Some(payload.interval.check_out_time),
            stay_type: Some(payload.stay_type),
            status: BookingStatus::Pending,
        };
        let receipt = SubmissionReceipt {
            booking_id: booking.id,
            room_id: payload.room_id,
            status: booking.status,
        };
        self.insert(payload.room_id, booking);
        Ok(receipt)
    }
}
