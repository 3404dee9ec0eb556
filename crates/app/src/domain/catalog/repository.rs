//! Catalog Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    database::{try_get_amount, try_get_quantity, try_i32_from_u32},
    domain::catalog::records::{ProductItemRecord, ProductItemUuid},
};

const GET_PRODUCT_ITEM_SQL: &str = include_str!("sql/get_product_item.sql");
const DECREMENT_STOCK_SQL: &str = include_str!("sql/decrement_stock.sql");
const INCREMENT_STOCK_SQL: &str = include_str!("sql/increment_stock.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_product_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: ProductItemUuid,
    ) -> Result<Option<ProductItemRecord>, sqlx::Error> {
        query_as::<Postgres, ProductItemRecord>(GET_PRODUCT_ITEM_SQL)
            .bind(item.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Take `quantity` units of stock, only if that many are still available.
    ///
    /// Returns the number of rows affected; `0` means the item is missing or the
    /// stock was exhausted by a concurrent buyer.
    pub(crate) async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: ProductItemUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DECREMENT_STOCK_SQL)
            .bind(item.into_uuid())
            .bind(try_i32_from_u32(quantity, "quantity_in_stock")?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn increment_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: ProductItemUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INCREMENT_STOCK_SQL)
            .bind(item.into_uuid())
            .bind(try_i32_from_u32(quantity, "quantity_in_stock")?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ProductItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductItemUuid::from_uuid(row.try_get("uuid")?),
            sku: row.try_get("sku")?,
            price: try_get_amount(row, "price")?,
            quantity_in_stock: try_get_quantity(row, "quantity_in_stock")?,
        })
    }
}
