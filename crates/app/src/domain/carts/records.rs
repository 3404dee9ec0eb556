//! Cart Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{catalog::records::ProductItemUuid, coupons::records::CouponUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
///
/// `subtotal` always equals the sum of the line totals; `total` is `subtotal` less the
/// discount of the applied coupon, if any.
#[derive(Debug, Clone, Serialize)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user_uuid: UserUuid,
    pub coupon_uuid: Option<CouponUuid>,
    pub subtotal: u64,
    pub discount: u64,
    pub total: u64,
    pub lines: Vec<CartLineRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart Line Record
#[derive(Debug, Clone, Serialize)]
pub struct CartLineRecord {
    pub cart_uuid: CartUuid,
    pub product_item_uuid: ProductItemUuid,
    pub quantity: u32,
    pub unit_price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartLineRecord {
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}
