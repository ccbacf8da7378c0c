//! Stay interval reconciliation: stay-type date derivation, overlap
//! detection against existing bookings, and occupancy rules.
//!
//! Everything here is synchronous and free of hidden state; callers pass
//! the bookings they fetched and get back a structured result.

mod availability;
mod conflict;
mod error;
mod guests;
mod resolver;

pub use availability::{
    free_windows, merge_overlapping, occupied_spans, subtract_intervals,
    unavailable_check_in_dates,
};
pub use conflict::{candidate_span, check_interval, effective_span, ensure_room, schedule_for};
pub use error::CheckoutError;
pub use guests::{Advisory, advisory_for, is_valid_guest_count, night_count, validate_guests};
pub use resolver::{
    CheckoutRule, DateAdjustment, Resolution, default_interval, interval_for, resolve,
};

pub(crate) use resolver::add_days;
