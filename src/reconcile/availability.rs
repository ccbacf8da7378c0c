use chrono::NaiveDate;

use crate::limits::MAX_CALENDAR_DAYS;
use crate::model::*;

use super::conflict::{candidate_span, check_no_conflict, schedule_for};
use super::resolver::default_interval;
use super::CheckoutError;

// ── Room calendar ────────────────────────────────────────────────

/// Sorted, disjoint spans during which the room is held by blocking bookings.
pub fn occupied_spans(bookings: &[ExistingBooking]) -> Vec<Span> {
    let spans: Vec<Span> = schedule_for(bookings)
        .reservations
        .iter()
        .map(|r| r.span)
        .collect();
    merge_overlapping(&spans)
}

/// Parts of `query` not held by any blocking booking.
pub fn free_windows(bookings: &[ExistingBooking], query: &Span) -> Vec<Span> {
    subtract_intervals(&[*query], &occupied_spans(bookings))
}

/// Check-in dates in `[from, to]` on which `stay` cannot be booked with its
/// default times. Feeds the date picker.
pub fn unavailable_check_in_dates(
    bookings: &[ExistingBooking],
    stay: StayType,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>, CheckoutError> {
    if to < from {
        return Ok(Vec::new());
    }
    if (to - from).num_days() >= i64::from(MAX_CALENDAR_DAYS) {
        return Err(CheckoutError::LimitExceeded("calendar range too wide"));
    }

    let schedule = schedule_for(bookings);
    let mut blocked = Vec::new();
    for date in from.iter_days().take_while(|d| *d <= to) {
        let span = candidate_span(&default_interval(stay, date))?;
        if check_no_conflict(&schedule, &span).is_err() {
            blocked.push(date);
        }
    }
    Ok(blocked)
}

// ── Span algebra ─────────────────────────────────────────────────

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Remove sorted disjoint `to_remove` spans from sorted disjoint `base` spans.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Span::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Span::new(current_start, current_end));
        }
    }

    result
}
