//! Order Returns Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    orders::records::{OrderReturnRecord, OrderReturnUuid, OrderUuid},
    users::UserUuid,
};

const CREATE_ORDER_RETURN_SQL: &str = include_str!("../sql/create_order_return.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderReturnsRepository;

impl PgOrderReturnsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert an unapproved return request.
    pub(crate) async fn create_return(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: UserUuid,
        reason: &str,
    ) -> Result<OrderReturnRecord, sqlx::Error> {
        query_as::<Postgres, OrderReturnRecord>(CREATE_ORDER_RETURN_SQL)
            .bind(OrderReturnUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .bind(reason)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderReturnRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderReturnUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            reason: row.try_get("reason")?,
            approved: row.try_get("approved")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
