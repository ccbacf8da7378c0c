//! Multi-step checkout wizard: `GuestInfo → BookingDetails → AddOns → Payment`.

mod capture;
mod pricing;
mod wizard;

pub use capture::{CaptureError, CapturedImage, ImageCapture, capture_payment_proof};
pub use pricing::{AddOn, Quote, quote};
pub use wizard::{
    Action, BookingPayload, CheckoutDraft, GuestInfo, Notice, PaymentMethod, Step, step_label,
};
