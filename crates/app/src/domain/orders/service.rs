//! Orders Service

use std::collections::HashMap;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        addresses::{PgAddressesRepository, records::AddressUuid},
        carts::{PgCartLinesRepository, PgCartsRepository},
        catalog::{PgCatalogRepository, records::ProductItemUuid},
        coupons::{
            CouponError, PgCouponsRepository, evaluate,
            records::{CouponQuote, CouponRecord},
        },
        orders::{
            OrdersServiceError,
            data::{CartPurchase, NewOrder, SingleItemPurchase},
            records::{OrderRecord, OrderUuid},
            repositories::{PgOrderLinesRepository, PgOrdersRepository},
        },
        payments::PgPaymentsRepository,
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    lines: PgOrderLinesRepository,
    addresses: PgAddressesRepository,
    catalog: PgCatalogRepository,
    coupons: PgCouponsRepository,
    carts: PgCartsRepository,
    cart_lines: PgCartLinesRepository,
    payments: PgPaymentsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            lines: PgOrderLinesRepository::new(),
            addresses: PgAddressesRepository::new(),
            catalog: PgCatalogRepository::new(),
            coupons: PgCouponsRepository::new(),
            carts: PgCartsRepository::new(),
            cart_lines: PgCartLinesRepository::new(),
            payments: PgPaymentsRepository::new(),
        }
    }

    async fn ensure_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: AddressUuid,
    ) -> Result<(), OrdersServiceError> {
        if self
            .addresses
            .address_belongs_to_user(tx, user, address)
            .await?
        {
            Ok(())
        } else {
            Err(OrdersServiceError::NoAddress)
        }
    }

    async fn quote_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        coupon: &CouponRecord,
        value: u64,
    ) -> Result<CouponQuote, OrdersServiceError> {
        let already_used = self
            .coupons
            .has_user_used_coupon(tx, user, coupon.uuid)
            .await?;

        Ok(evaluate(coupon, value, already_used, Timestamp::now())?)
    }

    /// Conditionally decrement stock, failing when a concurrent buyer got there first.
    async fn take_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: ProductItemUuid,
        quantity: u32,
    ) -> Result<(), OrdersServiceError> {
        let rows_affected = self.catalog.decrement_stock(tx, item, quantity).await?;

        if rows_affected == 0 {
            warn!(product_item_uuid = %item, quantity, "stock exhausted before decrement");

            return Err(OrdersServiceError::OutOfStock { item });
        }

        Ok(())
    }

    async fn buy_single_item_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchase: &SingleItemPurchase,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.ensure_address(tx, user, purchase.address_uuid).await?;

        let item = purchase.product_item_uuid;

        let product = self
            .catalog
            .get_product_item(tx, item)
            .await?
            .ok_or(OrdersServiceError::ProductItemNotFound)?;

        if !product.has_stock_for(1) {
            return Err(OrdersServiceError::OutOfStock { item });
        }

        let (coupon_uuid, quote) = match purchase.coupon_code.as_deref() {
            Some(code) => {
                let coupon = self
                    .coupons
                    .get_coupon_by_code(tx, code)
                    .await?
                    .ok_or(CouponError::NotFound)?;

                let quote = self.quote_coupon(tx, user, &coupon, product.price).await?;

                (Some(coupon.uuid), quote)
            }
            None => (
                None,
                CouponQuote {
                    discount: 0,
                    payable: product.price,
                },
            ),
        };

        let mut order = self
            .orders
            .create_order(
                tx,
                user,
                NewOrder {
                    payment_method: purchase.payment_method,
                    address_uuid: purchase.address_uuid,
                    coupon_uuid,
                    subtotal: product.price,
                    discount: quote.discount,
                    total: quote.payable,
                },
            )
            .await?;

        Span::current().record("order_uuid", tracing::field::display(order.uuid));

        let line = self
            .lines
            .create_line(tx, order.uuid, item, 1, quote.payable)
            .await?;

        self.take_stock(tx, item, 1).await?;

        self.payments
            .create_payment(tx, order.uuid, order.total, order.payment_method)
            .await?;

        order.lines.push(line);

        Ok(order)
    }

    async fn buy_all_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        purchase: CartPurchase,
    ) -> Result<OrderRecord, OrdersServiceError> {
        self.ensure_address(tx, user, purchase.address_uuid).await?;

        let cart = self
            .carts
            .lock_cart(tx, user)
            .await?
            .ok_or(OrdersServiceError::EmptyCart)?;

        let mut cart_lines = self.cart_lines.get_lines(tx, cart.uuid).await?;

        if cart_lines.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        // Stock rows are locked in product item order, as cancellation restocks them.
        cart_lines.sort_by_key(|line| line.product_item_uuid);

        let quote = match cart.coupon_uuid {
            Some(coupon) => {
                let coupon = self
                    .coupons
                    .get_coupon(tx, coupon)
                    .await?
                    .ok_or(CouponError::NotFound)?;

                self.quote_coupon(tx, user, &coupon, cart.subtotal).await?
            }
            None => CouponQuote {
                discount: 0,
                payable: cart.subtotal,
            },
        };

        let mut order = self
            .orders
            .create_order(
                tx,
                user,
                NewOrder {
                    payment_method: purchase.payment_method,
                    address_uuid: purchase.address_uuid,
                    coupon_uuid: cart.coupon_uuid,
                    subtotal: cart.subtotal,
                    discount: quote.discount,
                    total: quote.payable,
                },
            )
            .await?;

        Span::current().record("order_uuid", tracing::field::display(order.uuid));

        for cart_line in &cart_lines {
            let item = cart_line.product_item_uuid;

            let product = self
                .catalog
                .get_product_item(tx, item)
                .await?
                .ok_or(OrdersServiceError::ProductItemNotFound)?;

            if !product.has_stock_for(cart_line.quantity) {
                return Err(OrdersServiceError::OutOfStock { item });
            }

            let line = self
                .lines
                .create_line(
                    tx,
                    order.uuid,
                    item,
                    cart_line.quantity,
                    cart_line.line_total(),
                )
                .await?;

            self.take_stock(tx, item, cart_line.quantity).await?;

            order.lines.push(line);
        }

        self.payments
            .create_payment(tx, order.uuid, order.total, order.payment_method)
            .await?;

        self.carts.clear_cart(tx, cart.uuid).await?;

        Ok(order)
    }

    async fn get_order_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut order = self
            .orders
            .get_order(tx, user, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        order.lines = self.lines.get_lines(tx, order.uuid).await?;

        Ok(order)
    }

    async fn list_orders_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut orders = self.orders.list_orders(tx, user).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let positions: HashMap<OrderUuid, usize> = uuids
            .iter()
            .enumerate()
            .map(|(position, uuid)| (*uuid, position))
            .collect();

        for line in self.lines.get_lines_for_orders(tx, &uuids).await? {
            if let Some(&position) = positions.get(&line.order_uuid) {
                orders[position].lines.push(line);
            }
        }

        Ok(orders)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.buy_single_item",
        skip(self, purchase),
        fields(
            user_uuid = %user,
            product_item_uuid = %purchase.product_item_uuid,
            payment_method = %purchase.payment_method,
            has_coupon = purchase.coupon_code.is_some(),
            order_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn buy_single_item(
        &self,
        user: UserUuid,
        purchase: SingleItemPurchase,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.buy_single_item_in(&mut tx, user, &purchase).await;

        let order = Db::finish(tx, result).await?;

        info!(total = order.total, "placed single item order");

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.service.buy_all",
        skip(self, purchase),
        fields(
            user_uuid = %user,
            payment_method = %purchase.payment_method,
            order_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn buy_all(
        &self,
        user: UserUuid,
        purchase: CartPurchase,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.buy_all_in(&mut tx, user, purchase).await;

        let order = Db::finish(tx, result).await?;

        info!(
            total = order.total,
            line_count = order.lines.len(),
            "placed cart order"
        );

        Ok(order)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self),
        fields(user_uuid = %user, order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.get_order_in(&mut tx, user, order).await;

        Db::finish(tx, result).await
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self),
        fields(user_uuid = %user),
        err
    )]
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let result = self.list_orders_in(&mut tx, user).await;

        Db::finish(tx, result).await
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Buy one unit of a product item, optionally discounted by a coupon.
    async fn buy_single_item(
        &self,
        user: UserUuid,
        purchase: SingleItemPurchase,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Turn the user's cart into an order and clear the cart.
    ///
    /// A stock shortfall on any line aborts the whole checkout.
    async fn buy_all(
        &self,
        user: UserUuid,
        purchase: CartPurchase,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve one of the user's orders with its lines.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// List the user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;

    use crate::{
        domain::{
            addresses::records::AddressUuid,
            carts::CartsService,
            catalog::records::ProductItemUuid,
            coupons::CouponError,
            orders::{
                OrderLifecycleService,
                records::{DeliveryStatus, OrderStatus},
            },
            payments::{PaymentsService, records::PaymentMethod},
        },
        test::{
            TestContext,
            helpers::{
                count_orders, create_address, create_coupon, create_coupon_valid_till,
                create_product_item, stock_of,
            },
        },
    };

    use super::*;

    fn single(item: ProductItemUuid, address: AddressUuid) -> SingleItemPurchase {
        SingleItemPurchase {
            product_item_uuid: item,
            payment_method: PaymentMethod::CashOnDelivery,
            address_uuid: address,
            coupon_code: None,
        }
    }

    fn with_coupon(
        item: ProductItemUuid,
        address: AddressUuid,
        code: &str,
    ) -> SingleItemPurchase {
        SingleItemPurchase {
            coupon_code: Some(code.to_string()),
            ..single(item, address)
        }
    }

    fn whole_cart(address: AddressUuid) -> CartPurchase {
        CartPurchase {
            payment_method: PaymentMethod::Gateway,
            address_uuid: address,
        }
    }

    #[tokio::test]
    async fn buying_single_item_creates_order_line_and_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 1_999, 3).await?;

        let order = ctx
            .orders
            .buy_single_item(user, single(item, address))
            .await?;

        assert_eq!(order.user_uuid, user);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.delivery_status, DeliveryStatus::Processing);
        assert_eq!(order.total, 1_999);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 1);
        assert_eq!(order.lines[0].price, 1_999);

        assert_eq!(stock_of(&ctx, item).await?, 2);

        let payment = ctx.payments.view_payment(order.uuid).await?;

        assert_eq!(payment.order_total, order.total);
        assert_eq!(payment.payment_method, PaymentMethod::CashOnDelivery);

        Ok(())
    }

    #[tokio::test]
    async fn buying_without_own_address_returns_no_address() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let someone_else = create_address(&ctx, UserUuid::new()).await?;
        let item = create_product_item(&ctx, 500, 3).await?;

        let result = ctx
            .orders
            .buy_single_item(user, single(item, someone_else))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NoAddress)),
            "expected NoAddress, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, item).await?, 3);

        Ok(())
    }

    #[tokio::test]
    async fn buying_item_without_stock_returns_out_of_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 500, 0).await?;

        let result = ctx
            .orders
            .buy_single_item(user, single(item, address))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::OutOfStock { item: failed }) if failed == item),
            "expected OutOfStock, got {result:?}"
        );
        assert_eq!(count_orders(&ctx, user).await?, 0);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_buyers_of_last_unit_get_exactly_one_order() -> TestResult {
        let ctx = TestContext::new().await;
        let item = create_product_item(&ctx, 500, 1).await?;

        let alice = UserUuid::new();
        let bob = UserUuid::new();
        let alice_address = create_address(&ctx, alice).await?;
        let bob_address = create_address(&ctx, bob).await?;

        let (alice_result, bob_result) = tokio::join!(
            ctx.orders.buy_single_item(alice, single(item, alice_address)),
            ctx.orders.buy_single_item(bob, single(item, bob_address)),
        );

        let results = [alice_result, bob_result];

        let succeeded = results.iter().filter(|result| result.is_ok()).count();

        let out_of_stock = results
            .iter()
            .filter(|result| matches!(result, Err(OrdersServiceError::OutOfStock { .. })))
            .count();

        assert_eq!(succeeded, 1, "exactly one buyer should win: {results:?}");
        assert_eq!(out_of_stock, 1, "the other should be out of stock: {results:?}");
        assert_eq!(stock_of(&ctx, item).await?, 0);
        assert_eq!(
            count_orders(&ctx, alice).await? + count_orders(&ctx, bob).await?,
            1
        );

        Ok(())
    }

    #[tokio::test]
    async fn coupon_discount_is_capped() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 600, 3).await?;
        let coupon = create_coupon(&ctx, "SAVE20", 500, 20, 50).await?;

        let order = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "SAVE20"))
            .await?;

        assert_eq!(order.coupon_uuid, Some(coupon));
        assert_eq!(order.subtotal, 600);
        assert_eq!(order.discount, 50);
        assert_eq!(order.total, 550);
        assert_eq!(order.lines[0].price, 550);

        assert_eq!(ctx.payments.view_payment(order.uuid).await?.order_total, 550);

        Ok(())
    }

    #[tokio::test]
    async fn coupon_below_minimum_aborts_purchase() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 300, 3).await?;
        create_coupon(&ctx, "SAVE20", 500, 20, 50).await?;

        let result = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "SAVE20"))
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Coupon(CouponError::BelowMinimum))
            ),
            "expected BelowMinimum, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, item).await?, 3);
        assert_eq!(count_orders(&ctx, user).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn expired_coupon_aborts_purchase() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 600, 3).await?;
        let yesterday = Timestamp::now().checked_sub(SignedDuration::from_hours(24))?;
        create_coupon_valid_till(&ctx, "OLD", 0, 10, 100, yesterday).await?;

        let result = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "OLD"))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Coupon(CouponError::Expired))),
            "expected Expired, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn coupon_cannot_be_used_twice_until_order_cancelled() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 600, 5).await?;
        create_coupon(&ctx, "ONCE", 0, 10, 100).await?;

        let first = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "ONCE"))
            .await?;

        let second = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "ONCE"))
            .await;

        assert!(
            matches!(second, Err(OrdersServiceError::Coupon(CouponError::AlreadyUsed))),
            "expected AlreadyUsed, got {second:?}"
        );

        ctx.lifecycle.cancel_order(user, first.uuid).await?;

        let third = ctx
            .orders
            .buy_single_item(user, with_coupon(item, address, "ONCE"))
            .await?;

        assert_eq!(third.discount, 60);

        Ok(())
    }

    #[tokio::test]
    async fn buying_cart_creates_order_and_clears_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let mug = create_product_item(&ctx, 800, 5).await?;
        let lamp = create_product_item(&ctx, 3_500, 5).await?;

        ctx.carts.add_line(user, mug).await?;
        ctx.carts.add_line(user, mug).await?;
        ctx.carts.add_line(user, lamp).await?;

        let order = ctx.orders.buy_all(user, whole_cart(address)).await?;

        assert_eq!(order.subtotal, 5_100);
        assert_eq!(order.total, 5_100);
        assert_eq!(order.lines.len(), 2);

        let line_sum: u64 = order.lines.iter().map(|line| line.price).sum();

        assert_eq!(line_sum, order.subtotal);
        assert_eq!(stock_of(&ctx, mug).await?, 3);
        assert_eq!(stock_of(&ctx, lamp).await?, 4);

        let cart = ctx.carts.get_cart(user).await?;

        assert!(cart.lines.is_empty());
        assert_eq!(cart.total, 0);

        let payment = ctx.payments.view_payment(order.uuid).await?;

        assert_eq!(payment.order_total, 5_100);

        Ok(())
    }

    #[tokio::test]
    async fn buying_cart_with_coupon_carries_discount() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 300, 5).await?;
        let coupon = create_coupon(&ctx, "SAVE20", 500, 20, 50).await?;

        ctx.carts.add_line(user, item).await?;
        ctx.carts.add_line(user, item).await?;
        ctx.carts.apply_coupon(user, "SAVE20".to_string()).await?;

        let order = ctx.orders.buy_all(user, whole_cart(address)).await?;

        assert_eq!(order.coupon_uuid, Some(coupon));
        assert_eq!(order.subtotal, 600);
        assert_eq!(order.discount, 50);
        assert_eq!(order.total, 550);

        let cart = ctx.carts.get_cart(user).await?;

        assert!(cart.coupon_uuid.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn stock_shortfall_aborts_whole_cart_checkout() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let plenty = create_product_item(&ctx, 100, 10).await?;
        let scarce = create_product_item(&ctx, 200, 1).await?;

        ctx.carts.add_line(user, plenty).await?;
        ctx.carts.add_line(user, scarce).await?;
        ctx.carts.add_line(user, scarce).await?;

        let before = ctx.carts.get_cart(user).await?;

        let result = ctx.orders.buy_all(user, whole_cart(address)).await;

        assert!(
            matches!(result, Err(OrdersServiceError::OutOfStock { item }) if item == scarce),
            "expected OutOfStock naming the scarce item, got {result:?}"
        );

        assert_eq!(count_orders(&ctx, user).await?, 0);
        assert_eq!(stock_of(&ctx, plenty).await?, 10);
        assert_eq!(stock_of(&ctx, scarce).await?, 1);

        let after = ctx.carts.get_cart(user).await?;

        assert_eq!(after.total, before.total);
        assert_eq!(after.lines.len(), before.lines.len());

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_carts_with_shared_items_both_check_out() -> TestResult {
        let ctx = TestContext::new().await;
        let mug = create_product_item(&ctx, 800, 10).await?;
        let lamp = create_product_item(&ctx, 3_500, 10).await?;

        let alice = UserUuid::new();
        let bob = UserUuid::new();
        let alice_address = create_address(&ctx, alice).await?;
        let bob_address = create_address(&ctx, bob).await?;

        ctx.carts.add_line(alice, mug).await?;
        ctx.carts.add_line(alice, lamp).await?;
        ctx.carts.add_line(bob, lamp).await?;
        ctx.carts.add_line(bob, mug).await?;

        for _ in 0..5 {
            let (alice_result, bob_result) = tokio::join!(
                ctx.orders.buy_all(alice, whole_cart(alice_address)),
                ctx.orders.buy_all(bob, whole_cart(bob_address)),
            );

            alice_result?;
            bob_result?;

            ctx.carts.add_line(alice, mug).await?;
            ctx.carts.add_line(alice, lamp).await?;
            ctx.carts.add_line(bob, lamp).await?;
            ctx.carts.add_line(bob, mug).await?;
        }

        assert_eq!(stock_of(&ctx, mug).await?, 0);
        assert_eq!(stock_of(&ctx, lamp).await?, 0);
        assert_eq!(count_orders(&ctx, alice).await?, 5);
        assert_eq!(count_orders(&ctx, bob).await?, 5);

        Ok(())
    }

    #[tokio::test]
    async fn cart_coupon_used_since_applying_aborts_checkout() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let cart_item = create_product_item(&ctx, 600, 5).await?;
        let single_item = create_product_item(&ctx, 400, 5).await?;
        create_coupon(&ctx, "ONCE", 0, 10, 100).await?;

        ctx.carts.add_line(user, cart_item).await?;
        ctx.carts.apply_coupon(user, "ONCE".to_string()).await?;

        ctx.orders
            .buy_single_item(user, with_coupon(single_item, address, "ONCE"))
            .await?;

        let before = ctx.carts.get_cart(user).await?;

        let result = ctx.orders.buy_all(user, whole_cart(address)).await;

        assert!(
            matches!(result, Err(OrdersServiceError::Coupon(CouponError::AlreadyUsed))),
            "expected AlreadyUsed, got {result:?}"
        );

        assert_eq!(count_orders(&ctx, user).await?, 1);
        assert_eq!(stock_of(&ctx, cart_item).await?, 5);

        let after = ctx.carts.get_cart(user).await?;

        assert_eq!(after.lines.len(), before.lines.len());
        assert_eq!(after.coupon_uuid, before.coupon_uuid);
        assert_eq!(after.total, before.total);

        Ok(())
    }

    #[tokio::test]
    async fn buying_cart_without_own_address_returns_no_address() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let someone_else = create_address(&ctx, UserUuid::new()).await?;
        let item = create_product_item(&ctx, 500, 3).await?;

        ctx.carts.add_line(user, item).await?;

        let result = ctx.orders.buy_all(user, whole_cart(someone_else)).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NoAddress)),
            "expected NoAddress, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, item).await?, 3);
        assert_eq!(ctx.carts.get_cart(user).await?.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn buying_empty_cart_returns_empty_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;

        let never_used = ctx.orders.buy_all(user, whole_cart(address)).await;

        assert!(
            matches!(never_used, Err(OrdersServiceError::EmptyCart)),
            "expected EmptyCart, got {never_used:?}"
        );

        let item = create_product_item(&ctx, 100, 10).await?;

        ctx.carts.add_line(user, item).await?;
        ctx.carts.remove_line(user, item).await?;

        let emptied = ctx.orders.buy_all(user, whole_cart(address)).await;

        assert!(
            matches!(emptied, Err(OrdersServiceError::EmptyCart)),
            "expected EmptyCart, got {emptied:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first_with_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 100, 10).await?;

        let older = ctx
            .orders
            .buy_single_item(user, single(item, address))
            .await?;

        let newer = ctx
            .orders
            .buy_single_item(user, single(item, address))
            .await?;

        let orders = ctx.orders.list_orders(user).await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![newer.uuid, older.uuid]);
        assert!(orders.iter().all(|order| order.lines.len() == 1));

        assert!(ctx.orders.list_orders(UserUuid::new()).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn orders_of_other_users_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let address = create_address(&ctx, user).await?;
        let item = create_product_item(&ctx, 100, 10).await?;

        let order = ctx
            .orders
            .buy_single_item(user, single(item, address))
            .await?;

        assert_eq!(ctx.orders.get_order(user, order.uuid).await?.lines.len(), 1);

        let result = ctx.orders.get_order(UserUuid::new(), order.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
