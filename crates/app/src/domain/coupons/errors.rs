//! Coupon errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CouponError {
    #[error("coupon not found")]
    NotFound,

    #[error("coupon has already been used")]
    AlreadyUsed,

    #[error("coupon has expired")]
    Expired,

    #[error("order value is below the coupon minimum")]
    BelowMinimum,
}
