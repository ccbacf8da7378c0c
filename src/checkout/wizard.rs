use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::reconcile::{
    Advisory, CheckoutError, DateAdjustment, advisory_for, check_interval, ensure_room,
    interval_for, night_count, resolve, validate_guests,
};

use super::capture::{CapturedImage, check_image};
use super::pricing::{AddOn, Quote, quote, validate_add_on};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    GuestInfo,
    BookingDetails,
    AddOns,
    Payment,
}

impl Step {
    pub const ORDER: [Step; 4] = [Step::GuestInfo, Step::BookingDetails, Step::AddOns, Step::Payment];

    pub fn next(self) -> Option<Step> {
        match self {
            Step::GuestInfo => Some(Step::BookingDetails),
            Step::BookingDetails => Some(Step::AddOns),
            Step::AddOns => Some(Step::Payment),
            Step::Payment => None,
        }
    }

    pub fn prev(self) -> Option<Step> {
        match self {
            Step::GuestInfo => None,
            Step::BookingDetails => Some(Step::GuestInfo),
            Step::AddOns => Some(Step::BookingDetails),
            Step::Payment => Some(Step::AddOns),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Gcash,
    BankTransfer,
}

/// Non-blocking feedback produced by the last action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    CheckOutAdjusted(DateAdjustment),
    Advisory(Advisory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetGuestInfo(GuestInfo),
    SelectRoom(RoomId),
    SetStayType(StayType),
    SetCheckInDate(NaiveDate),
    SetCheckOutDate(NaiveDate),
    SetGuests(GuestCount),
    /// Adds a line, replacing any line with the same name.
    AddAddOn(AddOn),
    RemoveAddOn(String),
    SetPaymentMethod(PaymentMethod),
    AttachPaymentProof(CapturedImage),
    Next,
    Back,
    Reset,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::SetGuestInfo(_) => "set_guest_info",
            Action::SelectRoom(_) => "select_room",
            Action::SetStayType(_) => "set_stay_type",
            Action::SetCheckInDate(_) => "set_check_in_date",
            Action::SetCheckOutDate(_) => "set_check_out_date",
            Action::SetGuests(_) => "set_guests",
            Action::AddAddOn(_) => "add_add_on",
            Action::RemoveAddOn(_) => "remove_add_on",
            Action::SetPaymentMethod(_) => "set_payment_method",
            Action::AttachPaymentProof(_) => "attach_payment_proof",
            Action::Next => "next",
            Action::Back => "back",
            Action::Reset => "reset",
        }
    }
}

/// Finalized booking handed to the submission sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub draft_id: Ulid,
    pub room_id: RoomId,
    pub stay_type: StayType,
    pub interval: StayInterval,
    pub guests: GuestCount,
    pub guest: GuestInfo,
    pub add_ons: Vec<AddOn>,
    pub quote: Quote,
    pub payment_method: PaymentMethod,
    pub payment_proof: CapturedImage,
}

/// Serializable checkout wizard state. Mutated only through [`CheckoutDraft::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub id: Ulid,
    pub step: Step,
    pub guest: GuestInfo,
    pub room: Option<RoomId>,
    pub stay_type: Option<StayType>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub guests: GuestCount,
    pub add_ons: Vec<AddOn>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_proof: Option<CapturedImage>,
    pub notices: Vec<Notice>,
}

impl Default for CheckoutDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutDraft {
    pub fn new() -> Self {
        Self::with_id(Ulid::new())
    }

    pub fn with_id(id: Ulid) -> Self {
        Self {
            id,
            step: Step::GuestInfo,
            guest: GuestInfo::default(),
            room: None,
            stay_type: None,
            check_in_date: None,
            check_out_date: None,
            guests: GuestCount::new(1, 0, 0),
            add_ons: Vec::new(),
            payment_method: None,
            payment_proof: None,
            notices: Vec::new(),
        }
    }

    /// Current interval, if stay type and both dates are known.
    pub fn interval(&self) -> Option<StayInterval> {
        let stay = self.stay_type?;
        Some(interval_for(stay, self.check_in_date?, self.check_out_date?))
    }

    /// Price of the current selection.
    pub fn quote(&self) -> Result<Quote, CheckoutError> {
        let stay = self
            .stay_type
            .ok_or(CheckoutError::MissingField("stay_type"))?;
        let nights = self.interval().map(|i| night_count(&i)).unwrap_or(1);
        quote(stay, nights, &self.add_ons)
    }

    /// Apply one form interaction. `bookings` are the selected room's
    /// existing bookings. Notices from the previous action are replaced.
    /// A rejected action leaves the draft unchanged.
    pub fn apply(&mut self, action: Action, bookings: &[ExistingBooking]) -> Result<(), CheckoutError> {
        debug!("draft {}: {} at {:?}", self.id, action.label(), self.step);
        let previous = std::mem::take(&mut self.notices);
        let result = self.reduce(action, bookings);
        if result.is_err() {
            self.notices = previous;
        }
        result
    }

    fn reduce(&mut self, action: Action, bookings: &[ExistingBooking]) -> Result<(), CheckoutError> {
        match action {
            Action::SetGuestInfo(info) => self.guest = info,
            Action::SelectRoom(room) => self.room = Some(room),
            Action::SetStayType(stay) => {
                self.stay_type = Some(stay);
                self.reconcile_dates();
            }
            Action::SetCheckInDate(date) => {
                self.check_in_date = Some(date);
                self.reconcile_dates();
            }
            Action::SetCheckOutDate(date) => {
                self.check_out_date = Some(date);
                self.reconcile_dates();
            }
            Action::SetGuests(guests) => {
                validate_guests(&guests)?;
                self.guests = guests;
            }
            Action::AddAddOn(add_on) => {
                validate_add_on(&self.add_ons, &add_on)?;
                self.add_ons.retain(|a| a.name != add_on.name);
                self.add_ons.push(add_on);
            }
            Action::RemoveAddOn(name) => self.add_ons.retain(|a| a.name != name),
            Action::SetPaymentMethod(method) => self.payment_method = Some(method),
            Action::AttachPaymentProof(image) => {
                self.payment_proof = Some(check_image(image)?);
            }
            Action::Next => {
                self.validate_step(self.step, bookings)?;
                if let Some(next) = self.step.next() {
                    self.step = next;
                    metrics::counter!(crate::observability::STEP_ADVANCES_TOTAL, "to" => step_label(next))
                        .increment(1);
                }
            }
            Action::Back => {
                if let Some(prev) = self.step.prev() {
                    self.step = prev;
                }
            }
            Action::Reset => *self = Self::with_id(self.id),
        }
        Ok(())
    }

    /// Run the resolver and apply its auto-adjustment.
    fn reconcile_dates(&mut self) {
        let (Some(stay), Some(check_in)) = (self.stay_type, self.check_in_date) else {
            return;
        };
        let resolution = resolve(stay, check_in, self.check_out_date);
        if let Some(adj) = resolution.adjusted {
            self.check_out_date = Some(adj.to);
            self.notices.push(Notice::CheckOutAdjusted(adj));
            metrics::counter!(crate::observability::CHECKOUT_DATE_ADJUSTMENTS_TOTAL).increment(1);
        }
        if let Some(advisory) = advisory_for(stay, &resolution.interval) {
            self.notices.push(Notice::Advisory(advisory));
        }
    }

    pub fn validate_step(&self, step: Step, bookings: &[ExistingBooking]) -> Result<(), CheckoutError> {
        match step {
            Step::GuestInfo => {
                if self.guest.name.trim().is_empty() {
                    return Err(CheckoutError::MissingField("name"));
                }
                if !self.guest.email.contains('@') {
                    return Err(CheckoutError::MissingField("email"));
                }
                if self.guest.phone.trim().is_empty() {
                    return Err(CheckoutError::MissingField("phone"));
                }
            }
            Step::BookingDetails => {
                ensure_room(self.room)?;
                if self.stay_type.is_none() {
                    return Err(CheckoutError::MissingField("stay_type"));
                }
                if self.check_in_date.is_none() {
                    return Err(CheckoutError::MissingField("check_in_date"));
                }
                if self.guests.occupancy() == 0 {
                    return Err(CheckoutError::MissingField("guests"));
                }
                validate_guests(&self.guests)?;
                let interval = self
                    .interval()
                    .ok_or(CheckoutError::MissingField("check_out_date"))?;
                check_interval(self.room, &interval, bookings)?;
            }
            Step::AddOns => {}
            Step::Payment => {
                if self.payment_method.is_none() {
                    return Err(CheckoutError::MissingField("payment_method"));
                }
                if self.payment_proof.is_none() {
                    return Err(CheckoutError::MissingField("payment_proof"));
                }
            }
        }
        Ok(())
    }

    /// Re-validate every step and build the submission payload.
    pub fn finalize(&self, bookings: &[ExistingBooking]) -> Result<BookingPayload, CheckoutError> {
        for step in Step::ORDER {
            self.validate_step(step, bookings)?;
        }
        let (Some(room_id), Some(stay_type), Some(interval), Some(payment_method), Some(proof)) = (
            self.room,
            self.stay_type,
            self.interval(),
            self.payment_method,
            self.payment_proof.clone(),
        ) else {
            return Err(CheckoutError::MissingField("form"));
        };
        let payload = BookingPayload {
            draft_id: self.id,
            room_id,
            stay_type,
            interval,
            guests: self.guests,
            guest: self.guest.clone(),
            add_ons: self.add_ons.clone(),
            quote: self.quote()?,
            payment_method,
            payment_proof: proof,
        };
        info!(
            "draft {} finalized: room {room_id}, {stay_type}, {} -> {}",
            self.id, interval.check_in_date, interval.check_out_date
        );
        Ok(payload)
    }
}

pub fn step_label(step: Step) -> &'static str {
    match step {
        Step::GuestInfo => "guest_info",
        Step::BookingDetails => "booking_details",
        Step::AddOns => "add_ons",
        Step::Payment => "payment",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn guest() -> GuestInfo {
        GuestInfo {
            name: "Ana Reyes".into(),
            email: "ana@example.com".into(),
            phone: "+63 917 000 0000".into(),
        }
    }

    fn proof() -> CapturedImage {
        CapturedImage {
            mime_type: "image/jpeg".into(),
            bytes: vec![0xff, 0xd8],
        }
    }

    fn confirmed(ci: NaiveDate, co: NaiveDate) -> ExistingBooking {
        ExistingBooking {
            id: Ulid::new(),
            check_in_date: ci,
            check_out_date: co,
            check_in_time: Some(NaiveTime::from_hms_opt(14, 0, 0).unwrap()),
            check_out_time: Some(NaiveTime::from_hms_opt(11, 0, 0).unwrap()),
            stay_type: None,
            status: BookingStatus::Confirmed,
        }
    }

    /// Draft filled up to BookingDetails with an overnight stay on `check_in`.
    fn at_details(check_in: NaiveDate) -> CheckoutDraft {
        let mut d = CheckoutDraft::new();
        d.apply(Action::SetGuestInfo(guest()), &[]).unwrap();
        d.apply(Action::Next, &[]).unwrap();
        d.apply(Action::SelectRoom(Ulid::new()), &[]).unwrap();
        d.apply(Action::SetStayType(StayType::TwentyOneHourWeekday), &[]).unwrap();
        d.apply(Action::SetCheckInDate(check_in), &[]).unwrap();
        d
    }

    #[test]
    fn guest_info_required_before_advancing() {
        let mut d = CheckoutDraft::new();
        assert_eq!(
            d.apply(Action::Next, &[]),
            Err(CheckoutError::MissingField("name"))
        );
        assert_eq!(d.step, Step::GuestInfo);

        let mut info = guest();
        info.email = "not-an-email".into();
        d.apply(Action::SetGuestInfo(info), &[]).unwrap();
        assert_eq!(
            d.apply(Action::Next, &[]),
            Err(CheckoutError::MissingField("email"))
        );
    }

    #[test]
    fn stay_type_fills_check_out_with_notice() {
        let d = at_details(date(2024, 6, 1));
        assert_eq!(d.check_out_date, Some(date(2024, 6, 2)));
        assert!(matches!(
            d.notices.as_slice(),
            [Notice::CheckOutAdjusted(DateAdjustment { to, .. })] if *to == date(2024, 6, 2)
        ));
    }

    #[test]
    fn manual_check_out_is_overridden_for_overnight() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetCheckOutDate(date(2024, 6, 5)), &[]).unwrap();
        assert_eq!(d.check_out_date, Some(date(2024, 6, 2)));
        assert_eq!(d.notices.len(), 1);
    }

    #[test]
    fn switching_to_ten_hour_pulls_date_back() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetStayType(StayType::TenHour), &[]).unwrap();
        assert_eq!(d.check_out_date, Some(date(2024, 6, 1)));
        let interval = d.interval().unwrap();
        assert!(interval.end_ms() > interval.start_ms());
    }

    #[test]
    fn multi_day_short_range_is_advisory_only() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetStayType(StayType::MultiDay), &[]).unwrap();
        assert_eq!(d.check_out_date, Some(date(2024, 6, 2)));
        assert!(d
            .notices
            .iter()
            .any(|n| matches!(n, Notice::Advisory(Advisory::TooFewNights { nights: 1, .. }))));
        assert!(d.apply(Action::Next, &[]).is_ok());
        assert_eq!(d.step, Step::AddOns);
    }

    #[test]
    fn moving_check_in_past_multi_day_check_out_reproposes() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetStayType(StayType::MultiDay), &[]).unwrap();
        d.apply(Action::SetCheckOutDate(date(2024, 6, 4)), &[]).unwrap();

        d.apply(Action::SetCheckInDate(date(2024, 6, 10)), &[]).unwrap();
        assert_eq!(d.check_out_date, Some(date(2024, 6, 12)));
        assert_eq!(
            d.notices,
            vec![Notice::CheckOutAdjusted(DateAdjustment {
                from: Some(date(2024, 6, 4)),
                to: date(2024, 6, 12)
            })]
        );
        d.apply(Action::Next, &[]).unwrap();
        assert_eq!(d.step, Step::AddOns);
    }

    #[test]
    fn guest_cap_rejects_mutation() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetGuests(GuestCount::new(2, 2, 1)), &[]).unwrap();
        let err = d.apply(Action::SetGuests(GuestCount::new(3, 2, 0)), &[]);
        assert!(matches!(err, Err(CheckoutError::GuestCountExceeded { .. })));
        assert_eq!(d.guests, GuestCount::new(2, 2, 1));
    }

    #[test]
    fn conflict_blocks_details_step() {
        let mut d = at_details(date(2024, 6, 1));
        let existing = vec![confirmed(date(2024, 5, 31), date(2024, 6, 2))];
        let err = d.apply(Action::Next, &existing).unwrap_err();
        assert_eq!(err.field(), "check_in_date");
        assert_eq!(d.step, Step::BookingDetails);

        d.apply(Action::SetCheckInDate(date(2024, 6, 2)), &existing).unwrap();
        d.apply(Action::Next, &existing).unwrap();
        assert_eq!(d.step, Step::AddOns);
    }

    #[test]
    fn details_require_room() {
        let mut d = CheckoutDraft::new();
        d.step = Step::BookingDetails;
        d.apply(Action::SetStayType(StayType::TenHour), &[]).unwrap();
        d.apply(Action::SetCheckInDate(date(2024, 6, 1)), &[]).unwrap();
        assert_eq!(d.apply(Action::Next, &[]), Err(CheckoutError::MissingRoom));
    }

    #[test]
    fn back_and_reset() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::Back, &[]).unwrap();
        assert_eq!(d.step, Step::GuestInfo);
        d.apply(Action::Back, &[]).unwrap();
        assert_eq!(d.step, Step::GuestInfo);

        let id = d.id;
        d.apply(Action::Reset, &[]).unwrap();
        assert_eq!(d, CheckoutDraft::with_id(id));
    }

    #[test]
    fn add_ons_replace_by_name() {
        let mut d = CheckoutDraft::new();
        let breakfast = |q| AddOn {
            name: "Breakfast".into(),
            unit_price: 250,
            quantity: q,
        };
        d.apply(Action::AddAddOn(breakfast(1)), &[]).unwrap();
        d.apply(Action::AddAddOn(breakfast(3)), &[]).unwrap();
        assert_eq!(d.add_ons, vec![breakfast(3)]);
        d.apply(Action::RemoveAddOn("Breakfast".into()), &[]).unwrap();
        assert!(d.add_ons.is_empty());
    }

    #[test]
    fn full_flow_finalizes() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::SetGuests(GuestCount::new(2, 1, 1)), &[]).unwrap();
        d.apply(Action::Next, &[]).unwrap();
        d.apply(
            Action::AddAddOn(AddOn {
                name: "Late checkout".into(),
                unit_price: 300,
                quantity: 1,
            }),
            &[],
        )
        .unwrap();
        d.apply(Action::Next, &[]).unwrap();
        assert_eq!(d.step, Step::Payment);
        assert_eq!(
            d.apply(Action::Next, &[]),
            Err(CheckoutError::MissingField("payment_method"))
        );

        d.apply(Action::SetPaymentMethod(PaymentMethod::Gcash), &[]).unwrap();
        d.apply(Action::AttachPaymentProof(proof()), &[]).unwrap();
        let payload = d.finalize(&[]).unwrap();
        assert_eq!(payload.interval.check_out_date, date(2024, 6, 2));
        assert_eq!(payload.quote.total, 2_499 + 300);
        assert_eq!(payload.guests.infants, 1);
    }

    #[test]
    fn finalize_rechecks_conflicts() {
        let mut d = at_details(date(2024, 6, 1));
        d.apply(Action::Next, &[]).unwrap();
        d.apply(Action::Next, &[]).unwrap();
        d.apply(Action::SetPaymentMethod(PaymentMethod::BankTransfer), &[]).unwrap();
        d.apply(Action::AttachPaymentProof(proof()), &[]).unwrap();

        let existing = vec![confirmed(date(2024, 6, 1), date(2024, 6, 2))];
        assert!(matches!(
            d.finalize(&existing),
            Err(CheckoutError::OverlapConflict(_))
        ));
    }

    #[test]
    fn empty_proof_rejected() {
        let mut d = CheckoutDraft::new();
        let empty = CapturedImage {
            mime_type: "image/png".into(),
            bytes: Vec::new(),
        };
        assert!(matches!(
            d.apply(Action::AttachPaymentProof(empty), &[]),
            Err(CheckoutError::Capture(_))
        ));
        assert!(d.payment_proof.is_none());
    }

    #[test]
    fn draft_serializes() {
        let d = at_details(date(2024, 6, 1));
        let json = serde_json::to_string(&d).unwrap();
        let back: CheckoutDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
