//! Coupon Records

use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::TypedUuid;

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Coupon Record
#[derive(Debug, Clone, Serialize)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub code: String,
    pub min_order_value: u64,
    pub discount_percent: u8,
    pub discount_max_amount: u64,
    pub valid_till: Timestamp,
}

/// Outcome of pricing a coupon against an order value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CouponQuote {
    /// Amount taken off, never more than the order value or the coupon cap.
    pub discount: u64,

    /// What remains to be paid.
    pub payable: u64,
}
