//! Cart Lines Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{try_get_amount, try_get_quantity, try_i64_from_u64},
    domain::{
        carts::records::{CartLineRecord, CartUuid},
        catalog::records::ProductItemUuid,
    },
};

const GET_CART_LINES_SQL: &str = include_str!("../sql/get_cart_lines.sql");
const GET_CART_LINE_SQL: &str = include_str!("../sql/get_cart_line.sql");
const ADD_CART_LINE_SQL: &str = include_str!("../sql/add_cart_line.sql");
const DECREMENT_CART_LINE_SQL: &str = include_str!("../sql/decrement_cart_line.sql");
const DELETE_CART_LINE_SQL: &str = include_str!("../sql/delete_cart_line.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartLinesRepository;

impl PgCartLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(GET_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: ProductItemUuid,
    ) -> Result<Option<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(GET_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(item.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Insert a line with quantity 1, or bump an existing line by one and refresh its
    /// unit price.
    pub(crate) async fn add_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: ProductItemUuid,
        unit_price: u64,
    ) -> Result<CartLineRecord, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(ADD_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(item.into_uuid())
            .bind(try_i64_from_u64(unit_price, "unit_price")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Decrement a line holding more than one unit.
    pub(crate) async fn decrement_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: ProductItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DECREMENT_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(item.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        item: ProductItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(item.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            cart_uuid: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            product_item_uuid: ProductItemUuid::from_uuid(row.try_get("product_item_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
