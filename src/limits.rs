use chrono::NaiveTime;

const fn hms(hour: u32, min: u32, sec: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, sec) {
        Some(t) => t,
        None => panic!("invalid time constant"),
    }
}

/// Universal check-in time when a booking does not carry one.
pub const DEFAULT_CHECK_IN: NaiveTime = hms(14, 0, 0);

/// Check-out time for overnight and multi-day stays.
pub const DEFAULT_CHECK_OUT: NaiveTime = hms(11, 0, 0);

/// Midnight. As a check-out time it means end of day.
pub const MIDNIGHT: NaiveTime = hms(0, 0, 0);

/// Check-out time used for new 10-hour stays: same calendar day, last second.
pub const TEN_HOUR_CHECK_OUT: NaiveTime = hms(23, 59, 59);

/// Adults + children per room. Infants do not take a bed and are not counted.
pub const MAX_GUESTS: u32 = 4;

/// Multi-day stays should cover at least this many nights.
pub const MIN_MULTI_DAY_NIGHTS: u32 = 2;

pub const MAX_ADD_ONS: usize = 32;
pub const MAX_ADD_ON_NAME_LEN: usize = 128;
pub const MAX_PAYMENT_PROOF_BYTES: usize = 10 * 1024 * 1024;

/// Upper bound for a single date-picker scan.
pub const MAX_CALENDAR_DAYS: u32 = 366;

/// Draft log appends before it is rewritten down to the latest snapshot.
pub const DEFAULT_DRAFT_COMPACT_THRESHOLD: u64 = 64;

/// Largest encoded draft snapshot. Covers a full-size payment proof plus form fields.
pub const MAX_DRAFT_SNAPSHOT_BYTES: usize = 16 * 1024 * 1024;
