//! Order Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    database::ParseStatusError,
    domain::{
        addresses::records::AddressUuid,
        catalog::records::ProductItemUuid,
        coupons::records::CouponUuid,
        payments::records::PaymentMethod,
        users::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Return UUID
pub type OrderReturnUuid = TypedUuid<OrderReturnRecord>;

/// Order status.
///
/// `Pending` moves to `Cancelled` or `Completed`; `Completed` moves to
/// `ReturnRequested` once delivered. `Cancelled` and `ReturnRequested` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    ReturnRequested,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::ReturnRequested => "return_requested",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "return_requested" => Ok(Self::ReturnRequested),
            other => Err(ParseStatusError::new("order status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Processing,
    Shipped,
    Delivered,
}

impl DeliveryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            other => Err(ParseStatusError::new("delivery status", other)),
        }
    }
}

/// Order Record
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub address_uuid: AddressUuid,
    pub coupon_uuid: Option<CouponUuid>,
    pub payment_method: PaymentMethod,
    pub subtotal: u64,
    pub discount: u64,
    pub total: u64,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub delivery_updated_at: Timestamp,
    pub lines: SmallVec<[OrderLineRecord; 4]>,
    pub placed_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Line Record
///
/// `price` is the amount charged for the whole line at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLineRecord {
    pub order_uuid: OrderUuid,
    pub product_item_uuid: ProductItemUuid,
    pub quantity: u32,
    pub price: u64,
}

/// Order Return Record
#[derive(Debug, Clone, Serialize)]
pub struct OrderReturnRecord {
    pub uuid: OrderReturnUuid,
    pub order_uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub reason: String,
    pub approved: bool,
    pub created_at: Timestamp,
}
