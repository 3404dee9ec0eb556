//! Carts service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            records::{CartLineRecord, CartRecord},
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        catalog::{PgCatalogRepository, records::ProductItemUuid},
        coupons::{CouponError, PgCouponsRepository, evaluate},
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts: PgCartsRepository,
    lines: PgCartLinesRepository,
    catalog: PgCatalogRepository,
    coupons: PgCouponsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            lines: PgCartLinesRepository::new(),
            catalog: PgCatalogRepository::new(),
            coupons: PgCouponsRepository::new(),
        }
    }

    async fn get_cart_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut cart = self.carts.get_cart(tx, user).await?;

        cart.lines = self.lines.get_lines(tx, cart.uuid).await?;

        Ok(cart)
    }

    async fn add_line_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<CartLineRecord, CartsServiceError> {
        let product = self
            .catalog
            .get_product_item(tx, item)
            .await?
            .ok_or(CartsServiceError::ProductItemNotFound)?;

        let cart = self.carts.upsert_cart(tx, user).await?;

        let line = self
            .lines
            .add_line(tx, cart.uuid, item, product.price)
            .await?;

        self.carts.recompute_totals(tx, cart.uuid).await?;

        Ok(line)
    }

    async fn remove_line_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<(), CartsServiceError> {
        let cart = self
            .carts
            .lock_cart(tx, user)
            .await?
            .ok_or(CartsServiceError::Empty)?;

        let line = self
            .lines
            .get_line(tx, cart.uuid, item)
            .await?
            .ok_or(CartsServiceError::Empty)?;

        let rows_affected = if line.quantity > 1 {
            self.lines.decrement_line(tx, cart.uuid, item).await?
        } else {
            self.lines.delete_line(tx, cart.uuid, item).await?
        };

        if rows_affected == 0 {
            return Err(CartsServiceError::Empty);
        }

        self.carts.recompute_totals(tx, cart.uuid).await?;

        Ok(())
    }

    async fn apply_coupon_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        code: &str,
    ) -> Result<CartRecord, CartsServiceError> {
        let cart = self
            .carts
            .lock_cart(tx, user)
            .await?
            .ok_or(CartsServiceError::Empty)?;

        let lines = self.lines.get_lines(tx, cart.uuid).await?;

        if lines.is_empty() {
            return Err(CartsServiceError::Empty);
        }

        let coupon = self
            .coupons
            .get_coupon_by_code(tx, code)
            .await?
            .ok_or(CouponError::NotFound)?;

        let already_used = self
            .coupons
            .has_user_used_coupon(tx, user, coupon.uuid)
            .await?;

        let quote = evaluate(&coupon, cart.subtotal, already_used, Timestamp::now())?;

        let mut cart = self
            .carts
            .apply_discount(tx, cart.uuid, coupon.uuid, quote.discount)
            .await?;

        cart.lines = lines;

        Ok(cart)
    }

    async fn remove_coupon_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let cart = self
            .carts
            .lock_cart(tx, user)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let mut cart = self.carts.recompute_totals(tx, cart.uuid).await?;

        cart.lines = self.lines.get_lines(tx, cart.uuid).await?;

        Ok(cart)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.get_cart_in(&mut tx, user).await;

        Db::finish(tx, result).await
    }

    #[tracing::instrument(
        name = "carts.service.add_line",
        skip(self),
        fields(user_uuid = %user, product_item_uuid = %item),
        err
    )]
    async fn add_line(
        &self,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<CartLineRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.add_line_in(&mut tx, user, item).await;

        let line = Db::finish(tx, result).await?;

        info!(quantity = line.quantity, "added cart line");

        Ok(line)
    }

    #[tracing::instrument(
        name = "carts.service.remove_line",
        skip(self),
        fields(user_uuid = %user, product_item_uuid = %item),
        err
    )]
    async fn remove_line(
        &self,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.remove_line_in(&mut tx, user, item).await;

        Db::finish(tx, result).await?;

        info!("removed cart line");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.apply_coupon",
        skip(self, code),
        fields(user_uuid = %user),
        err
    )]
    async fn apply_coupon(
        &self,
        user: UserUuid,
        code: String,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.apply_coupon_in(&mut tx, user, &code).await;

        let cart = Db::finish(tx, result).await?;

        info!(discount = cart.discount, total = cart.total, "applied coupon to cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.remove_coupon",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn remove_coupon(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.remove_coupon_in(&mut tx, user).await;

        Db::finish(tx, result).await
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Retrieve the user's cart with its lines.
    async fn get_cart(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;

    /// Add one unit of a product item, creating the cart on first use.
    async fn add_line(
        &self,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<CartLineRecord, CartsServiceError>;

    /// Remove one unit of a product item, deleting the line at zero.
    async fn remove_line(
        &self,
        user: UserUuid,
        item: ProductItemUuid,
    ) -> Result<(), CartsServiceError>;

    /// Price a coupon against the cart subtotal and attach it.
    async fn apply_coupon(
        &self,
        user: UserUuid,
        code: String,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Detach the applied coupon, restoring `total` to the subtotal.
    async fn remove_coupon(&self, user: UserUuid) -> Result<CartRecord, CartsServiceError>;
}
