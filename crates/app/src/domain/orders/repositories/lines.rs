//! Order Lines Repository

use smallvec::SmallVec;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{try_get_amount, try_get_quantity, try_i32_from_u32, try_i64_from_u64},
    domain::{
        catalog::records::ProductItemUuid,
        orders::records::{OrderLineRecord, OrderUuid},
    },
};

const CREATE_ORDER_LINE_SQL: &str = include_str!("../sql/create_order_line.sql");
const GET_ORDER_LINES_SQL: &str = include_str!("../sql/get_order_lines.sql");
const GET_ORDER_LINES_FOR_ORDERS_SQL: &str = include_str!("../sql/get_order_lines_for_orders.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderLinesRepository;

impl PgOrderLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: ProductItemUuid,
        quantity: u32,
        price: u64,
    ) -> Result<OrderLineRecord, sqlx::Error> {
        query_as::<Postgres, OrderLineRecord>(CREATE_ORDER_LINE_SQL)
            .bind(order.into_uuid())
            .bind(item.into_uuid())
            .bind(try_i32_from_u32(quantity, "quantity")?)
            .bind(try_i64_from_u64(price, "price")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<SmallVec<[OrderLineRecord; 4]>, sqlx::Error> {
        let lines = query_as::<Postgres, OrderLineRecord>(GET_ORDER_LINES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(SmallVec::from_vec(lines))
    }

    /// Load the lines of several orders in one round trip.
    pub(crate) async fn get_lines_for_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderLineRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().copied().map(OrderUuid::into_uuid).collect();

        query_as::<Postgres, OrderLineRecord>(GET_ORDER_LINES_FOR_ORDERS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_item_uuid: ProductItemUuid::from_uuid(row.try_get("product_item_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_amount(row, "price")?,
        })
    }
}
