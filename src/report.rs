use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::checkout::{AddOn, Quote, quote};
use crate::limits::MAX_CALENDAR_DAYS;
use crate::model::*;
use crate::provider::BookingProvider;
use crate::reconcile::{
    Advisory, CheckoutError, DateAdjustment, add_days, advisory_for, check_interval, ensure_room,
    night_count, resolve, unavailable_check_in_dates, validate_guests,
};

/// One availability/price check, as read by the command-line driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub stay_type: StayType,
    pub check_in_date: NaiveDate,
    #[serde(default)]
    pub check_out_date: Option<NaiveDate>,
    #[serde(default)]
    pub guests: GuestCount,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    /// When set, also list unavailable check-in dates for this many days from check-in.
    #[serde(default)]
    pub calendar_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportError {
    pub code: String,
    pub field: String,
    pub message: String,
}

impl From<&CheckoutError> for ReportError {
    fn from(e: &CheckoutError) -> Self {
        Self {
            code: e.code().to_string(),
            field: e.field().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub ok: bool,
    pub interval: StayInterval,
    pub adjusted: Option<DateAdjustment>,
    pub advisories: Vec<Advisory>,
    pub quote: Option<Quote>,
    pub unavailable_dates: Vec<NaiveDate>,
    pub error: Option<ReportError>,
}

/// Resolve, validate and price a request against the room's bookings.
/// Validation and calendar failures are reported in the result; only provider
/// errors fail the call.
pub async fn evaluate<P: BookingProvider>(
    provider: &P,
    req: &CheckRequest,
) -> Result<CheckReport, CheckoutError> {
    let resolution = resolve(req.stay_type, req.check_in_date, req.check_out_date);
    let interval = resolution.interval;
    let bookings = match req.room_id {
        Some(room) => provider.bookings_for_room(room).await?,
        None => Vec::new(),
    };

    let outcome = ensure_room(req.room_id)
        .and_then(|_| validate_guests(&req.guests))
        .and_then(|_| check_interval(req.room_id, &interval, &bookings));
    let quote = quote(req.stay_type, night_count(&interval), &req.add_ons);

    let calendar = match req.calendar_days {
        Some(days) if req.room_id.is_some() => unavailable_check_in_dates(
            &bookings,
            req.stay_type,
            req.check_in_date,
            add_days(req.check_in_date, days.clamp(1, MAX_CALENDAR_DAYS) - 1),
        ),
        _ => Ok(Vec::new()),
    };

    let error = outcome
        .err()
        .or_else(|| quote.clone().err())
        .or_else(|| calendar.clone().err());
    metrics::counter!(
        crate::observability::CHECKS_TOTAL,
        "outcome" => crate::observability::outcome_label(error.as_ref())
    )
    .increment(1);
    Ok(CheckReport {
        ok: error.is_none(),
        interval,
        adjusted: resolution.adjusted,
        advisories: advisory_for(req.stay_type, &interval).into_iter().collect(),
        quote: quote.ok(),
        unavailable_dates: calendar.unwrap_or_default(),
        error: error.as_ref().map(ReportError::from),
    })
}
