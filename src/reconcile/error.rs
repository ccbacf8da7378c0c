use crate::checkout::CaptureError;
use crate::model::{BookingId, Ms};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Candidate check-out is not after check-in.
    InvalidInterval { start: Ms, end: Ms },
    /// Candidate overlaps a booking that holds the room.
    OverlapConflict(BookingId),
    GuestCountExceeded { adults: u32, children: u32 },
    MissingRoom,
    MissingField(&'static str),
    LimitExceeded(&'static str),
    PriceOverflow,
    BookingNotFound(BookingId),
    Capture(CaptureError),
    Provider(String),
    Storage(String),
}

impl CheckoutError {
    /// Form field the error belongs to, for field-level feedback.
    pub fn field(&self) -> &'static str {
        match self {
            CheckoutError::InvalidInterval { .. } => "check_out_date",
            CheckoutError::OverlapConflict(_) => "check_in_date",
            CheckoutError::GuestCountExceeded { .. } => "guests",
            CheckoutError::MissingRoom => "room",
            CheckoutError::MissingField(field) => field,
            CheckoutError::LimitExceeded(_) | CheckoutError::PriceOverflow => "add_ons",
            CheckoutError::Capture(_) => "payment_proof",
            CheckoutError::BookingNotFound(_)
            | CheckoutError::Provider(_)
            | CheckoutError::Storage(_) => "form",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::InvalidInterval { .. } => "invalid_interval",
            CheckoutError::OverlapConflict(_) => "overlap_conflict",
            CheckoutError::GuestCountExceeded { .. } => "guest_count_exceeded",
            CheckoutError::MissingRoom => "missing_room",
            CheckoutError::MissingField(_) => "missing_field",
            CheckoutError::LimitExceeded(_) => "limit_exceeded",
            CheckoutError::PriceOverflow => "price_overflow",
            CheckoutError::BookingNotFound(_) => "booking_not_found",
            CheckoutError::Capture(_) => "capture_failed",
            CheckoutError::Provider(_) => "provider_error",
            CheckoutError::Storage(_) => "storage_error",
        }
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::InvalidInterval { start, end } => {
                write!(f, "check-out must be after check-in: [{start}, {end})")
            }
            CheckoutError::OverlapConflict(id) => {
                write!(f, "selected dates overlap an existing booking: {id}")
            }
            CheckoutError::GuestCountExceeded { adults, children } => write!(
                f,
                "{adults} adults + {children} children exceeds the maximum of {} guests",
                crate::limits::MAX_GUESTS
            ),
            CheckoutError::MissingRoom => write!(f, "no room selected"),
            CheckoutError::MissingField(field) => write!(f, "missing required field: {field}"),
            CheckoutError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            CheckoutError::PriceOverflow => write!(f, "price total overflow"),
            CheckoutError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            CheckoutError::Capture(e) => write!(f, "image capture failed: {e}"),
            CheckoutError::Provider(e) => write!(f, "booking provider error: {e}"),
            CheckoutError::Storage(e) => write!(f, "draft storage error: {e}"),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<CaptureError> for CheckoutError {
    fn from(e: CaptureError) -> Self {
        CheckoutError::Capture(e)
    }
}
