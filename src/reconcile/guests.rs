use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::limits::*;
use crate::model::*;

use super::CheckoutError;

pub fn is_valid_guest_count(adults: u32, children: u32) -> bool {
    adults.saturating_add(children) <= MAX_GUESTS
}

/// Hard cap on bed-occupying guests. Infants are always accepted.
pub fn validate_guests(guests: &GuestCount) -> Result<(), CheckoutError> {
    if !is_valid_guest_count(guests.adults, guests.children) {
        metrics::counter!(crate::observability::GUEST_CAP_REJECTIONS_TOTAL).increment(1);
        debug!(
            "guest count rejected: {} adults, {} children",
            guests.adults, guests.children
        );
        return Err(CheckoutError::GuestCountExceeded {
            adults: guests.adults,
            children: guests.children,
        });
    }
    Ok(())
}

/// `ceil((check_out - check_in) / 1 day)`, never negative.
pub fn night_count(interval: &StayInterval) -> u32 {
    let diff = interval.end_ms() - interval.start_ms();
    if diff <= 0 {
        return 0;
    }
    let nights = (diff + DAY_MS - 1) / DAY_MS;
    u32::try_from(nights).unwrap_or(u32::MAX)
}

/// Informational date-range warnings. Never block progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advisory {
    TooFewNights { nights: u32, minimum: u32 },
    SameDayExpected { check_in: NaiveDate, check_out: NaiveDate },
    SingleNightExpected { nights: u32 },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::TooFewNights { nights, minimum } => write!(
                f,
                "multi-day stays are at least {minimum} nights; selected range is {nights}"
            ),
            Advisory::SameDayExpected {
                check_in,
                check_out,
            } => write!(
                f,
                "10-hour stays check out on the check-in date ({check_in}), not {check_out}"
            ),
            Advisory::SingleNightExpected { nights } => {
                write!(f, "21-hour stays cover exactly one night; selected range is {nights}")
            }
        }
    }
}

pub fn advisory_for(stay: StayType, interval: &StayInterval) -> Option<Advisory> {
    let nights = night_count(interval);
    match stay {
        StayType::MultiDay if nights < MIN_MULTI_DAY_NIGHTS => Some(Advisory::TooFewNights {
            nights,
            minimum: MIN_MULTI_DAY_NIGHTS,
        }),
        StayType::TenHour if interval.check_out_date != interval.check_in_date => {
            Some(Advisory::SameDayExpected {
                check_in: interval.check_in_date,
                check_out: interval.check_out_date,
            })
        }
        StayType::TwentyOneHourWeekday | StayType::TwentyOneHourWeekend if nights != 1 => {
            Some(Advisory::SingleNightExpected { nights })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::interval_for;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn guest_cap_boundary() {
        assert!(is_valid_guest_count(4, 0));
        assert!(is_valid_guest_count(0, 4));
        assert!(is_valid_guest_count(2, 2));
        assert!(!is_valid_guest_count(3, 2));
        assert!(!is_valid_guest_count(5, 0));
        assert!(!is_valid_guest_count(u32::MAX, 1));
    }

    #[test]
    fn guest_cap_exhaustive_small_grid() {
        for adults in 0..=8 {
            for children in 0..=8 {
                for infants in [0, 1, 10] {
                    let g = GuestCount::new(adults, children, infants);
                    assert_eq!(validate_guests(&g).is_ok(), adults + children <= 4);
                }
            }
        }
    }

    #[test]
    fn rejection_reports_counts() {
        let err = validate_guests(&GuestCount::new(3, 2, 0)).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::GuestCountExceeded {
                adults: 3,
                children: 2
            }
        );
        assert_eq!(err.field(), "guests");
    }

    #[test]
    fn night_counts() {
        let overnight = interval_for(StayType::TwentyOneHourWeekday, date(2024, 6, 1), date(2024, 6, 2));
        assert_eq!(night_count(&overnight), 1);
        let ten = interval_for(StayType::TenHour, date(2024, 6, 1), date(2024, 6, 1));
        assert_eq!(night_count(&ten), 1);
        let multi = interval_for(StayType::MultiDay, date(2024, 6, 1), date(2024, 6, 4));
        assert_eq!(night_count(&multi), 3);
        let backwards = interval_for(StayType::MultiDay, date(2024, 6, 4), date(2024, 6, 1));
        assert_eq!(night_count(&backwards), 0);
    }

    #[test]
    fn multi_day_short_range_warns() {
        let one = interval_for(StayType::MultiDay, date(2024, 6, 1), date(2024, 6, 2));
        assert_eq!(
            advisory_for(StayType::MultiDay, &one),
            Some(Advisory::TooFewNights {
                nights: 1,
                minimum: 2
            })
        );
        let two = interval_for(StayType::MultiDay, date(2024, 6, 1), date(2024, 6, 3));
        assert_eq!(advisory_for(StayType::MultiDay, &two), None);
    }

    #[test]
    fn ten_hour_date_mismatch_warns() {
        let i = interval_for(StayType::TenHour, date(2024, 6, 1), date(2024, 6, 2));
        assert!(matches!(
            advisory_for(StayType::TenHour, &i),
            Some(Advisory::SameDayExpected { .. })
        ));
    }

    #[test]
    fn overnight_multi_night_warns() {
        let i = interval_for(StayType::TwentyOneHourWeekend, date(2024, 6, 1), date(2024, 6, 3));
        assert_eq!(
            advisory_for(StayType::TwentyOneHourWeekend, &i),
            Some(Advisory::SingleNightExpected { nights: 2 })
        );
    }
}
