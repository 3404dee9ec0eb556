//! Payments Service

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        orders::records::{OrderStatus, OrderUuid},
        payments::{
            PaymentsServiceError,
            records::{PaymentRecord, PaymentStatus},
            repository::PgPaymentsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgPaymentsService {
    db: Db,
    payments: PgPaymentsRepository,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            payments: PgPaymentsRepository::new(),
        }
    }

    async fn reconcile_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        external_reference: &str,
        reported_total: u64,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        let payment = self
            .payments
            .lock_payment_by_order(tx, order)
            .await?
            .ok_or(PaymentsServiceError::NotFound)?;

        if payment.status == PaymentStatus::Paid {
            return Err(PaymentsServiceError::AlreadyPaid);
        }

        let order_status = self
            .payments
            .lock_order_status(tx, order)
            .await?
            .ok_or(PaymentsServiceError::NotFound)?;

        if order_status == OrderStatus::Cancelled {
            warn!(
                payment_uuid = %payment.uuid,
                "refusing payment for cancelled order"
            );

            return Err(PaymentsServiceError::OrderCancelled);
        }

        if reported_total != payment.order_total {
            warn!(
                payment_uuid = %payment.uuid,
                "reported payment amount does not match order total"
            );

            return Err(PaymentsServiceError::AmountMismatch);
        }

        self.payments
            .mark_paid(tx, payment.uuid, external_reference)
            .await?
            .ok_or(PaymentsServiceError::AlreadyPaid)
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.view_payment",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn view_payment(&self, order: OrderUuid) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self
            .payments
            .get_payment_by_order(&mut tx, order)
            .await
            .map_err(PaymentsServiceError::from)
            .and_then(|payment| payment.ok_or(PaymentsServiceError::NotFound));

        Db::finish(tx, result).await
    }

    #[tracing::instrument(
        name = "payments.service.reconcile",
        skip(self, external_reference),
        fields(order_uuid = %order),
        err
    )]
    async fn reconcile(
        &self,
        order: OrderUuid,
        external_reference: String,
        reported_total: u64,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self
            .reconcile_in(&mut tx, order, &external_reference, reported_total)
            .await;

        let payment = Db::finish(tx, result).await?;

        info!(payment_uuid = %payment.uuid, "reconciled payment");

        Ok(payment)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Retrieve the payment record of an order.
    async fn view_payment(&self, order: OrderUuid) -> Result<PaymentRecord, PaymentsServiceError>;

    /// Settle an order's payment from a gateway confirmation.
    ///
    /// The reported amount must equal the stored order total; a mismatch leaves the
    /// payment unpaid. Payments for cancelled orders are refused.
    async fn reconcile(
        &self,
        order: OrderUuid,
        external_reference: String,
        reported_total: u64,
    ) -> Result<PaymentRecord, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            orders::{
                OrderLifecycleService, OrdersService, data::SingleItemPurchase,
                records::OrderUuid,
            },
            payments::records::PaymentMethod,
            users::UserUuid,
        },
        test::{
            TestContext,
            helpers::{create_address, create_product_item},
        },
    };

    use super::*;

    async fn place_order(ctx: &TestContext, price: u64) -> TestResult<OrderUuid> {
        let user = UserUuid::new();
        let item = create_product_item(ctx, price, 5).await?;
        let address = create_address(ctx, user).await?;

        let order = ctx
            .orders
            .buy_single_item(
                user,
                SingleItemPurchase {
                    product_item_uuid: item,
                    payment_method: PaymentMethod::Gateway,
                    address_uuid: address,
                    coupon_code: None,
                },
            )
            .await?;

        Ok(order.uuid)
    }

    #[tokio::test]
    async fn placed_order_has_unpaid_payment_mirroring_total() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx, 2_499).await?;

        let payment = ctx.payments.view_payment(order).await?;

        assert_eq!(payment.order_uuid, order);
        assert_eq!(payment.order_total, 2_499);
        assert_eq!(payment.payment_method, PaymentMethod::Gateway);
        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert!(payment.external_reference.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn viewing_unknown_payment_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.payments.view_payment(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn reconcile_with_matching_total_marks_paid() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx, 2_499).await?;

        let payment = ctx
            .payments
            .reconcile(order, "pay_123".to_string(), 2_499)
            .await?;

        assert_eq!(payment.status, PaymentStatus::Paid);
        assert_eq!(payment.external_reference.as_deref(), Some("pay_123"));

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_with_mismatched_total_leaves_payment_unpaid() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx, 2_499).await?;

        let result = ctx
            .payments
            .reconcile(order, "pay_123".to_string(), 1)
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::AmountMismatch)),
            "expected AmountMismatch, got {result:?}"
        );

        let payment = ctx.payments.view_payment(order).await?;

        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert!(payment.external_reference.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_twice_returns_already_paid() -> TestResult {
        let ctx = TestContext::new().await;
        let order = place_order(&ctx, 2_499).await?;

        ctx.payments
            .reconcile(order, "pay_123".to_string(), 2_499)
            .await?;

        let result = ctx
            .payments
            .reconcile(order, "pay_456".to_string(), 2_499)
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::AlreadyPaid)),
            "expected AlreadyPaid, got {result:?}"
        );

        let payment = ctx.payments.view_payment(order).await?;

        assert_eq!(payment.external_reference.as_deref(), Some("pay_123"));

        Ok(())
    }

    #[tokio::test]
    async fn reconcile_after_cancellation_is_refused() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let item = create_product_item(&ctx, 1_200, 5).await?;
        let address = create_address(&ctx, user).await?;

        let order = ctx
            .orders
            .buy_single_item(
                user,
                SingleItemPurchase {
                    product_item_uuid: item,
                    payment_method: PaymentMethod::Gateway,
                    address_uuid: address,
                    coupon_code: None,
                },
            )
            .await?;

        ctx.lifecycle.cancel_order(user, order.uuid).await?;

        let result = ctx
            .payments
            .reconcile(order.uuid, "pay_late".to_string(), 1_200)
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::OrderCancelled)),
            "expected OrderCancelled, got {result:?}"
        );

        let payment = ctx.payments.view_payment(order.uuid).await?;

        assert_eq!(payment.status, PaymentStatus::Unpaid);
        assert!(payment.external_reference.is_none());

        Ok(())
    }

    #[test]
    fn amount_mismatch_message_does_not_leak_amounts() {
        let message = PaymentsServiceError::AmountMismatch.to_string();

        assert!(
            !message.chars().any(|c| c.is_ascii_digit()),
            "message should not contain figures: {message}"
        );
    }
}
