//! Coupon Evaluator

use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::domain::coupons::{
    CouponError,
    records::{CouponQuote, CouponRecord},
};

/// Price `coupon` against `candidate_value` (in minor units).
///
/// Checks run in a fixed order: prior use, expiry, then minimum order value. The
/// discount is `discount_percent` of the value, rounded half away from zero, capped at
/// `discount_max_amount` and never more than the value itself.
///
/// # Errors
///
/// - [`CouponError::AlreadyUsed`] when `already_used` is set.
/// - [`CouponError::Expired`] when `now` is after `valid_till`.
/// - [`CouponError::BelowMinimum`] when the value is under `min_order_value`.
pub fn evaluate(
    coupon: &CouponRecord,
    candidate_value: u64,
    already_used: bool,
    now: Timestamp,
) -> Result<CouponQuote, CouponError> {
    if already_used {
        return Err(CouponError::AlreadyUsed);
    }

    if now > coupon.valid_till {
        return Err(CouponError::Expired);
    }

    if candidate_value < coupon.min_order_value {
        return Err(CouponError::BelowMinimum);
    }

    let discount = percent_of(candidate_value, coupon.discount_percent)
        .unwrap_or(candidate_value)
        .min(coupon.discount_max_amount)
        .min(candidate_value);

    Ok(CouponQuote {
        discount,
        payable: candidate_value - discount,
    })
}

fn percent_of(value: u64, percent: u8) -> Option<u64> {
    let applied = Decimal::from(value)
        .checked_mul(Decimal::from(percent.min(100)))?
        .checked_div(Decimal::ONE_HUNDRED)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}
