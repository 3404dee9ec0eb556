//! Orders Data

use serde::Deserialize;

use crate::domain::{
    addresses::records::AddressUuid,
    catalog::records::ProductItemUuid,
    coupons::records::CouponUuid,
    orders::records::{DeliveryStatus, OrderStatus},
    payments::records::PaymentMethod,
};

/// Purchase of one unit of a product item, bypassing the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleItemPurchase {
    pub product_item_uuid: ProductItemUuid,
    pub payment_method: PaymentMethod,
    pub address_uuid: AddressUuid,
    pub coupon_code: Option<String>,
}

/// Checkout of the whole cart.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CartPurchase {
    pub payment_method: PaymentMethod,
    pub address_uuid: AddressUuid,
}

/// Administrative status write.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
}

/// Order row as inserted, before any line exists.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NewOrder {
    pub(crate) payment_method: PaymentMethod,
    pub(crate) address_uuid: AddressUuid,
    pub(crate) coupon_uuid: Option<CouponUuid>,
    pub(crate) subtotal: u64,
    pub(crate) discount: u64,
    pub(crate) total: u64,
}
