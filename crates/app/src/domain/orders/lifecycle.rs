//! Order Lifecycle Service

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        catalog::PgCatalogRepository,
        orders::{
            OrdersServiceError,
            data::StatusUpdate,
            records::{DeliveryStatus, OrderRecord, OrderReturnRecord, OrderStatus, OrderUuid},
            repositories::{PgOrderLinesRepository, PgOrderReturnsRepository, PgOrdersRepository},
        },
        users::UserUuid,
    },
};

/// How long after delivery a return may still be requested.
pub const RETURN_WINDOW: SignedDuration = SignedDuration::from_hours(15 * 24);

#[derive(Debug, Clone)]
pub struct PgOrderLifecycleService {
    db: Db,
    orders: PgOrdersRepository,
    lines: PgOrderLinesRepository,
    returns: PgOrderReturnsRepository,
    catalog: PgCatalogRepository,
}

impl PgOrderLifecycleService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            lines: PgOrderLinesRepository::new(),
            returns: PgOrderReturnsRepository::new(),
            catalog: PgCatalogRepository::new(),
        }
    }

    async fn cancel_order_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let order = self
            .orders
            .lock_order(tx, user, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        match order.status {
            OrderStatus::Pending => {}
            OrderStatus::Cancelled => return Err(OrdersServiceError::AlreadyCancelled),
            OrderStatus::Completed | OrderStatus::ReturnRequested => {
                return Err(OrdersServiceError::CannotCancel);
            }
        }

        let mut order = self
            .orders
            .set_status(tx, order.uuid, OrderStatus::Cancelled)
            .await?;

        let lines = self.lines.get_lines(tx, order.uuid).await?;

        for line in &lines {
            let rows_affected = self
                .catalog
                .increment_stock(tx, line.product_item_uuid, line.quantity)
                .await?;

            if rows_affected == 0 {
                return Err(OrdersServiceError::ProductItemNotFound);
            }
        }

        order.lines = lines;

        Ok(order)
    }

    async fn request_return_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        order: OrderUuid,
        reason: &str,
        point_in_time: Timestamp,
    ) -> Result<OrderReturnRecord, OrdersServiceError> {
        let order = self
            .orders
            .lock_order(tx, user, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if point_in_time.duration_since(order.delivery_updated_at) > RETURN_WINDOW {
            return Err(OrdersServiceError::TooLate);
        }

        if order.status != OrderStatus::Completed
            || order.delivery_status != DeliveryStatus::Delivered
        {
            return Err(OrdersServiceError::NotEligible);
        }

        self.orders
            .set_status(tx, order.uuid, OrderStatus::ReturnRequested)
            .await?;

        let order_return = self
            .returns
            .create_return(tx, order.uuid, user, reason)
            .await?;

        Ok(order_return)
    }
}

#[async_trait]
impl OrderLifecycleService for PgOrderLifecycleService {
    #[tracing::instrument(
        name = "orders.lifecycle.cancel_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.cancel_order_in(&mut tx, user, order).await;

        let order = Db::finish(tx, result).await?;

        info!(restocked_lines = order.lines.len(), "cancelled order");

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.lifecycle.update_status",
        skip(self, update),
        fields(
            order_uuid = %order,
            status = %update.status,
            delivery_status = %update.delivery_status
        ),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = match self.orders.update_status(&mut tx, order, update).await {
            Ok(0) => Err(OrdersServiceError::NotFound),
            Ok(_) => Ok(()),
            Err(error) => Err(error.into()),
        };

        Db::finish(tx, result).await?;

        info!("updated order status");

        Ok(())
    }

    #[tracing::instrument(
        name = "orders.lifecycle.request_return",
        skip(self, reason),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn request_return(
        &self,
        user: UserUuid,
        order: OrderUuid,
        reason: String,
        point_in_time: Timestamp,
    ) -> Result<OrderReturnRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self
            .request_return_in(&mut tx, user, order, &reason, point_in_time)
            .await;

        let order_return = Db::finish(tx, result).await?;

        info!(return_uuid = %order_return.uuid, "requested order return");

        Ok(order_return)
    }
}

#[automock]
#[async_trait]
pub trait OrderLifecycleService: Send + Sync {
    /// Cancel a pending order and put its stock back.
    async fn cancel_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Overwrite an order's status and delivery status.
    async fn update_status(
        &self,
        order: OrderUuid,
        update: StatusUpdate,
    ) -> Result<(), OrdersServiceError>;

    /// File a return for a delivered order, evaluated as of `point_in_time`.
    async fn request_return(
        &self,
        user: UserUuid,
        order: OrderUuid,
        reason: String,
        point_in_time: Timestamp,
    ) -> Result<OrderReturnRecord, OrdersServiceError>;
}
