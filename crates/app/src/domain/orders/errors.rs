//! Orders service errors.

use sqlx::{Error, error::ErrorKind};
use thiserror::Error;

use crate::domain::{catalog::records::ProductItemUuid, coupons::CouponError};

/// Partial unique index that allows one live order per user and coupon.
const COUPON_ONCE_PER_USER_INDEX: &str = "orders_coupon_once_per_user_idx";

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("product item not found")]
    ProductItemNotFound,

    /// The offending item is carried for callers and logs but never rendered.
    #[error("product item is out of stock")]
    OutOfStock { item: ProductItemUuid },

    #[error("cart is empty")]
    EmptyCart,

    #[error("no verified shipping address")]
    NoAddress,

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("order is already cancelled")]
    AlreadyCancelled,

    #[error("order can no longer be cancelled")]
    CannotCancel,

    #[error("return window has closed")]
    TooLate,

    #[error("order is not eligible for return")]
    NotEligible,

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        let Some((kind, constraint)) = error
            .as_database_error()
            .map(|e| (e.kind(), e.constraint().map(str::to_owned)))
        else {
            return Self::Sql(error);
        };

        match kind {
            ErrorKind::UniqueViolation
                if constraint.as_deref() == Some(COUPON_ONCE_PER_USER_INDEX) =>
            {
                Self::Coupon(CouponError::AlreadyUsed)
            }
            ErrorKind::ForeignKeyViolation => Self::InvalidReference,
            ErrorKind::UniqueViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
