use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::limits::*;
use crate::model::{StayInterval, StayType};

/// How a stay type derives its check-out date from the check-in date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutRule {
    SameDay,
    NextDay,
    /// Guest picks the date; `min_nights` is the proposal when none is picked.
    UserSelected { min_nights: u32 },
}

/// Check-out date overwritten by the resolver. Surfaced as a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAdjustment {
    pub from: Option<NaiveDate>,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub interval: StayInterval,
    pub adjusted: Option<DateAdjustment>,
}

impl StayType {
    /// Default `(check_in, check_out)` times.
    pub fn default_times(self) -> (NaiveTime, NaiveTime) {
        match self {
            StayType::TenHour => (DEFAULT_CHECK_IN, TEN_HOUR_CHECK_OUT),
            StayType::TwentyOneHourWeekday
            | StayType::TwentyOneHourWeekend
            | StayType::MultiDay => (DEFAULT_CHECK_IN, DEFAULT_CHECK_OUT),
        }
    }

    pub fn checkout_rule(self) -> CheckoutRule {
        match self {
            StayType::TenHour => CheckoutRule::SameDay,
            StayType::TwentyOneHourWeekday | StayType::TwentyOneHourWeekend => {
                CheckoutRule::NextDay
            }
            StayType::MultiDay => CheckoutRule::UserSelected {
                min_nights: MIN_MULTI_DAY_NIGHTS,
            },
        }
    }
}

pub(crate) fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(days.into()))
        .unwrap_or(NaiveDate::MAX)
}

/// Build the interval for explicit dates using the stay type's default times.
pub fn interval_for(stay: StayType, check_in: NaiveDate, check_out: NaiveDate) -> StayInterval {
    let (check_in_time, check_out_time) = stay.default_times();
    StayInterval {
        check_in_date: check_in,
        check_in_time,
        check_out_date: check_out,
        check_out_time,
    }
}

/// Derive check-out boundaries for `stay` starting on `check_in`.
///
/// `stored_check_out` is the date currently held by the form. A multi-day
/// selection is kept unless it no longer lies after `check_in`. When the
/// derived date differs the resolution carries a [`DateAdjustment`] and the
/// caller must overwrite its stored value.
pub fn resolve(
    stay: StayType,
    check_in: NaiveDate,
    stored_check_out: Option<NaiveDate>,
) -> Resolution {
    let check_out = match stay.checkout_rule() {
        CheckoutRule::SameDay => check_in,
        CheckoutRule::NextDay => add_days(check_in, 1),
        CheckoutRule::UserSelected { min_nights } => match stored_check_out {
            Some(date) if date > check_in => date,
            _ => add_days(check_in, min_nights),
        },
    };

    let adjusted = (stored_check_out != Some(check_out)).then_some(DateAdjustment {
        from: stored_check_out,
        to: check_out,
    });
    if let Some(adj) = &adjusted {
        debug!(
            "check-out auto-adjusted for {stay}: {:?} -> {}",
            adj.from, adj.to
        );
    }

    Resolution {
        interval: interval_for(stay, check_in, check_out),
        adjusted,
    }
}

/// Interval a stay type occupies when booked on `check_in` with no other input.
pub fn default_interval(stay: StayType, check_in: NaiveDate) -> StayInterval {
    resolve(stay, check_in, None).interval
}
