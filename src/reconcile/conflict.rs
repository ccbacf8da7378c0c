use tracing::{info, warn};

use crate::limits::*;
use crate::model::*;

use super::CheckoutError;

/// Missing room identifier fails closed: without the room's bookings nothing can be vouched for.
pub fn ensure_room(room: Option<RoomId>) -> Result<RoomId, CheckoutError> {
    room.ok_or(CheckoutError::MissingRoom)
}

/// Convert a candidate interval to a span, rejecting `end <= start`.
pub fn candidate_span(interval: &StayInterval) -> Result<Span, CheckoutError> {
    let start = interval.start_ms();
    let end = interval.end_ms();
    if end <= start {
        return Err(CheckoutError::InvalidInterval { start, end });
    }
    Ok(Span::new(start, end))
}

/// Effective reserved span of an existing booking, filling in implicit times.
///
/// Start defaults to 14:00. A missing end time is midnight after check-out
/// for 10-hour stays and 11:00 otherwise. An end at 00:00 that would not be
/// after the start is read as end of day and rolls forward one day.
/// Returns `None` when no valid span can be derived.
pub fn effective_span(booking: &ExistingBooking) -> Option<Span> {
    let start = instant(
        booking.check_in_date,
        booking.check_in_time.unwrap_or(DEFAULT_CHECK_IN),
    );
    let end_time = match booking.check_out_time {
        Some(t) => t,
        None if booking.stay_type == Some(StayType::TenHour) => MIDNIGHT,
        None => DEFAULT_CHECK_OUT,
    };
    let mut end = instant(booking.check_out_date, end_time);
    if end <= start && end_time == MIDNIGHT {
        end += DAY_MS;
    }
    (end > start).then(|| Span::new(start, end))
}

/// Build the room schedule from blocking bookings only.
pub fn schedule_for(bookings: &[ExistingBooking]) -> RoomSchedule {
    let mut schedule = RoomSchedule::new();
    for booking in bookings.iter().filter(|b| b.status.is_blocking()) {
        match effective_span(booking) {
            Some(span) => schedule.insert(Reservation {
                booking_id: booking.id,
                span,
            }),
            None => warn!(
                "booking {} has no valid span ({} -> {}), ignored",
                booking.id, booking.check_in_date, booking.check_out_date
            ),
        }
    }
    schedule
}

pub(crate) fn check_no_conflict(schedule: &RoomSchedule, span: &Span) -> Result<(), CheckoutError> {
    if let Some(hit) = schedule.overlapping(span).next() {
        return Err(CheckoutError::OverlapConflict(hit.booking_id));
    }
    Ok(())
}

/// Validate a candidate interval for `room` against its existing bookings.
/// Returns the candidate span when it is valid and free.
pub fn check_interval(
    room: Option<RoomId>,
    interval: &StayInterval,
    bookings: &[ExistingBooking],
) -> Result<Span, CheckoutError> {
    let started = std::time::Instant::now();
    let room = ensure_room(room)?;
    let span = candidate_span(interval)?;
    let schedule = schedule_for(bookings);
    let result = check_no_conflict(&schedule, &span);
    metrics::histogram!(crate::observability::OVERLAP_CHECK_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());

    match result {
        Ok(()) => {
            metrics::counter!(crate::observability::OVERLAP_CHECKS_TOTAL, "result" => "free")
                .increment(1);
            Ok(span)
        }
        Err(e) => {
            metrics::counter!(crate::observability::OVERLAP_CHECKS_TOTAL, "result" => "conflict")
                .increment(1);
            info!("room {room}: {e}");
            Err(e)
        }
    }
}
