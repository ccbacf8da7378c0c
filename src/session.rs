use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::checkout::{Action, CheckoutDraft};
use crate::draft_store::DraftStore;
use crate::model::*;
use crate::provider::{BookingProvider, BookingSink, SubmissionReceipt};
use crate::reconcile::{CheckoutError, check_interval, ensure_room};

/// One guest's checkout: the draft plus the selected room's bookings.
///
/// Bookings are fetched once per room selection and reused for every
/// interaction until the room changes. Submission always re-fetches.
pub struct CheckoutSession<P, S> {
    provider: Arc<P>,
    sink: Arc<S>,
    draft: CheckoutDraft,
    bookings: Vec<ExistingBooking>,
    bookings_room: Option<RoomId>,
}

impl<P: BookingProvider, S: BookingSink> CheckoutSession<P, S> {
    pub fn new(provider: Arc<P>, sink: Arc<S>) -> Self {
        Self::resume(provider, sink, CheckoutDraft::new())
    }

    /// Continue a saved draft. Bookings are loaded on the next interaction.
    pub fn resume(provider: Arc<P>, sink: Arc<S>, draft: CheckoutDraft) -> Self {
        Self {
            provider,
            sink,
            draft,
            bookings: Vec::new(),
            bookings_room: None,
        }
    }

    pub fn draft(&self) -> &CheckoutDraft {
        &self.draft
    }

    pub fn bookings(&self) -> &[ExistingBooking] {
        &self.bookings
    }

    async fn load_bookings(&mut self, room: RoomId) -> Result<(), CheckoutError> {
        if self.bookings_room == Some(room) {
            return Ok(());
        }
        self.bookings = self.provider.bookings_for_room(room).await?;
        self.bookings_room = Some(room);
        debug!("room {room}: {} bookings loaded", self.bookings.len());
        Ok(())
    }

    pub async fn select_room(&mut self, room: RoomId) -> Result<(), CheckoutError> {
        self.load_bookings(room).await?;
        self.draft.apply(Action::SelectRoom(room), &self.bookings)
    }

    pub async fn apply(&mut self, action: Action) -> Result<(), CheckoutError> {
        if let Action::SelectRoom(room) = action {
            return self.select_room(room).await;
        }
        if let Some(room) = self.draft.room {
            self.load_bookings(room).await?;
        }
        self.draft.apply(action, &self.bookings)
    }

    pub fn save(&self, store: &dyn DraftStore) -> Result<(), CheckoutError> {
        store.save(&self.draft)
    }

    /// Re-fetch the room's bookings, finalize, and hand the booking to the sink.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, CheckoutError> {
        let room = ensure_room(self.draft.room)?;
        self.bookings_room = None;
        self.load_bookings(room).await?;

        let payload = match self.draft.finalize(&self.bookings) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::counter!(crate::observability::SUBMISSIONS_TOTAL, "status" => "rejected")
                    .increment(1);
                warn!("draft {} rejected at submission: {e}", self.draft.id);
                return Err(e);
            }
        };
        let receipt = self.sink.submit(payload).await?;
        metrics::counter!(crate::observability::SUBMISSIONS_TOTAL, "status" => "accepted")
            .increment(1);
        info!(
            "draft {} submitted as booking {} ({})",
            self.draft.id,
            receipt.booking_id,
            receipt.status.as_str()
        );
        Ok(receipt)
    }
}

/// Rooms among `rooms` that can host `interval`. Bookings are fetched concurrently.
pub async fn search_available_rooms<P: BookingProvider>(
    provider: &P,
    rooms: &[RoomId],
    interval: &StayInterval,
) -> Result<Vec<RoomId>, CheckoutError> {
    let fetched = try_join_all(rooms.iter().map(|&room| async move {
        provider
            .bookings_for_room(room)
            .await
            .map(|bookings| (room, bookings))
    }))
    .await?;

    let mut available = Vec::new();
    for (room, bookings) in fetched {
        match check_interval(Some(room), interval, &bookings) {
            Ok(_) => available.push(room),
            Err(CheckoutError::OverlapConflict(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(available)
}
