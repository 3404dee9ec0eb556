//! Test Helpers
//!
//! Catalog, address and coupon rows belong to collaborators outside this crate, so
//! tests seed them with plain SQL.

use jiff::{SignedDuration, Timestamp};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{query, query_scalar};

use crate::{
    domain::{
        addresses::records::AddressUuid, catalog::records::ProductItemUuid,
        coupons::records::CouponUuid, users::UserUuid,
    },
    test::TestContext,
};

pub(crate) async fn create_product_item(
    ctx: &TestContext,
    price: u64,
    stock: u32,
) -> Result<ProductItemUuid, sqlx::Error> {
    let item = ProductItemUuid::new();

    query(
        "INSERT INTO product_items (uuid, sku, price, quantity_in_stock) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(item.into_uuid())
    .bind(format!("SKU-{}", item.into_uuid().simple()))
    .bind(i64::try_from(price).unwrap_or(i64::MAX))
    .bind(i32::try_from(stock).unwrap_or(i32::MAX))
    .execute(ctx.db.pool())
    .await?;

    Ok(item)
}

pub(crate) async fn create_address(
    ctx: &TestContext,
    user: UserUuid,
) -> Result<AddressUuid, sqlx::Error> {
    let address = AddressUuid::new();

    query(
        "INSERT INTO addresses (uuid, user_uuid, line_1, city, postcode, country) \
         VALUES ($1, $2, '1 High Street', 'Bristol', 'BS1 1AA', 'GB')",
    )
    .bind(address.into_uuid())
    .bind(user.into_uuid())
    .execute(ctx.db.pool())
    .await?;

    Ok(address)
}

/// Create a coupon valid for the next thirty days.
pub(crate) async fn create_coupon(
    ctx: &TestContext,
    code: &str,
    min_order_value: u64,
    discount_percent: u8,
    discount_max_amount: u64,
) -> Result<CouponUuid, sqlx::Error> {
    let valid_till = Timestamp::now()
        .checked_add(SignedDuration::from_hours(30 * 24))
        .unwrap_or(Timestamp::MAX);

    create_coupon_valid_till(
        ctx,
        code,
        min_order_value,
        discount_percent,
        discount_max_amount,
        valid_till,
    )
    .await
}

pub(crate) async fn create_coupon_valid_till(
    ctx: &TestContext,
    code: &str,
    min_order_value: u64,
    discount_percent: u8,
    discount_max_amount: u64,
    valid_till: Timestamp,
) -> Result<CouponUuid, sqlx::Error> {
    let coupon = CouponUuid::new();

    query(
        "INSERT INTO coupons \
         (uuid, code, min_order_value, discount_percent, discount_max_amount, valid_till) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(coupon.into_uuid())
    .bind(code)
    .bind(i64::try_from(min_order_value).unwrap_or(i64::MAX))
    .bind(i16::from(discount_percent))
    .bind(i64::try_from(discount_max_amount).unwrap_or(i64::MAX))
    .bind(SqlxTimestamp::from(valid_till))
    .execute(ctx.db.pool())
    .await?;

    Ok(coupon)
}

pub(crate) async fn stock_of(ctx: &TestContext, item: ProductItemUuid) -> Result<i32, sqlx::Error> {
    query_scalar("SELECT quantity_in_stock FROM product_items WHERE uuid = $1")
        .bind(item.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn count_orders(ctx: &TestContext, user: UserUuid) -> Result<i64, sqlx::Error> {
    query_scalar("SELECT COUNT(*) FROM orders WHERE user_uuid = $1")
        .bind(user.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}
