use serde::{Deserialize, Serialize};

use crate::limits::{MAX_ADD_ON_NAME_LEN, MAX_ADD_ONS};
use crate::model::StayType;
use crate::reconcile::CheckoutError;

impl StayType {
    /// Fixed price in whole pesos. Multi-day is charged per night.
    pub fn price(self) -> u64 {
        match self {
            StayType::TenHour => 1_999,
            StayType::TwentyOneHourWeekday => 2_499,
            StayType::TwentyOneHourWeekend => 2_999,
            StayType::MultiDay => 2_499,
        }
    }
}

/// Optional extra (breakfast, extra bed, late checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOn {
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
}

impl AddOn {
    pub fn line_total(&self) -> Option<u64> {
        self.unit_price.checked_mul(u64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub stay_type: StayType,
    pub nights: u32,
    pub base: u64,
    pub add_ons: u64,
    pub total: u64,
}

pub(crate) fn validate_add_on(existing: &[AddOn], add_on: &AddOn) -> Result<(), CheckoutError> {
    if add_on.name.trim().is_empty() {
        return Err(CheckoutError::MissingField("add_on_name"));
    }
    if add_on.name.len() > MAX_ADD_ON_NAME_LEN {
        return Err(CheckoutError::LimitExceeded("add-on name too long"));
    }
    if existing.len() >= MAX_ADD_ONS && !existing.iter().any(|a| a.name == add_on.name) {
        return Err(CheckoutError::LimitExceeded("too many add-ons"));
    }
    add_on.line_total().ok_or(CheckoutError::PriceOverflow)?;
    Ok(())
}

pub fn quote(stay: StayType, nights: u32, add_ons: &[AddOn]) -> Result<Quote, CheckoutError> {
    let base = match stay {
        StayType::MultiDay => stay
            .price()
            .checked_mul(u64::from(nights.max(1)))
            .ok_or(CheckoutError::PriceOverflow)?,
        _ => stay.price(),
    };
    let add_on_total = add_ons.iter().try_fold(0u64, |acc, a| {
        a.line_total()
            .and_then(|line| acc.checked_add(line))
            .ok_or(CheckoutError::PriceOverflow)
    })?;
    let total = base
        .checked_add(add_on_total)
        .ok_or(CheckoutError::PriceOverflow)?;
    Ok(Quote {
        stay_type: stay,
        nights,
        base,
        add_ons: add_on_total,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_on(name: &str, unit_price: u64, quantity: u32) -> AddOn {
        AddOn {
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    #[test]
    fn fixed_prices() {
        let q = quote(StayType::TwentyOneHourWeekend, 1, &[]).unwrap();
        assert_eq!(q.base, 2_999);
        assert_eq!(q.total, 2_999);
        // Short stays are a flat price regardless of night count.
        assert_eq!(quote(StayType::TenHour, 3, &[]).unwrap().base, 1_999);
    }

    #[test]
    fn multi_day_per_night() {
        assert_eq!(quote(StayType::MultiDay, 3, &[]).unwrap().base, 3 * 2_499);
        assert_eq!(quote(StayType::MultiDay, 0, &[]).unwrap().base, 2_499);
    }

    #[test]
    fn add_ons_summed() {
        let q = quote(
            StayType::TenHour,
            1,
            &[add_on("Breakfast", 250, 2), add_on("Extra towel", 50, 1)],
        )
        .unwrap();
        assert_eq!(q.add_ons, 550);
        assert_eq!(q.total, 1_999 + 550);
    }

    #[test]
    fn overflow_is_an_error() {
        let huge = add_on("Gold", u64::MAX, 2);
        assert_eq!(
            quote(StayType::TenHour, 1, &[huge]),
            Err(CheckoutError::PriceOverflow)
        );
        let exact = add_on("Gold", u64::MAX - 1_998, 1);
        assert_eq!(
            quote(StayType::TenHour, 1, &[exact]),
            Err(CheckoutError::PriceOverflow)
        );
    }

    #[test]
    fn add_on_validation() {
        assert_eq!(
            validate_add_on(&[], &add_on("  ", 10, 1)),
            Err(CheckoutError::MissingField("add_on_name"))
        );
        let full: Vec<AddOn> = (0..MAX_ADD_ONS).map(|i| add_on(&format!("x{i}"), 1, 1)).collect();
        assert!(validate_add_on(&full, &add_on("new", 1, 1)).is_err());
        // Replacing an existing line is allowed even when full.
        assert!(validate_add_on(&full, &add_on("x0", 2, 1)).is_ok());
    }
}
