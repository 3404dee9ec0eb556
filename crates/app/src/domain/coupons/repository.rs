//! Coupons Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::try_get_amount,
    domain::{
        coupons::records::{CouponRecord, CouponUuid},
        users::UserUuid,
    },
};

const GET_COUPON_SQL: &str = include_str!("sql/get_coupon.sql");
const GET_COUPON_BY_CODE_SQL: &str = include_str!("sql/get_coupon_by_code.sql");
const HAS_USER_USED_COUPON_SQL: &str = include_str!("sql/has_user_used_coupon.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Whether any of the user's non-cancelled orders already references the coupon.
    pub(crate) async fn has_user_used_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        coupon: CouponUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(HAS_USER_USED_COUPON_SQL)
            .bind(user.into_uuid())
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount_percent: i16 = row.try_get("discount_percent")?;

        let discount_percent =
            u8::try_from(discount_percent).map_err(|e| sqlx::Error::ColumnDecode {
                index: "discount_percent".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            min_order_value: try_get_amount(row, "min_order_value")?,
            discount_percent,
            discount_max_amount: try_get_amount(row, "discount_max_amount")?,
            valid_till: row.try_get::<SqlxTimestamp, _>("valid_till")?.to_jiff(),
        })
    }
}
