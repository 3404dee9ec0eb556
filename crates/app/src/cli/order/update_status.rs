use clap::Args;
use storefront_app::{
    config::DatabaseConfig,
    context::AppContext,
    domain::orders::{
        data::StatusUpdate,
        records::{DeliveryStatus, OrderStatus, OrderUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct UpdateStatusArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    /// New order status (pending, completed, cancelled, return_requested)
    #[arg(long)]
    status: OrderStatus,

    /// New delivery status (processing, shipped, delivered)
    #[arg(long)]
    delivery: DeliveryStatus,
}

pub(crate) async fn run(args: UpdateStatusArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database)
        .await
        .map_err(|error| error.to_string())?;

    context
        .lifecycle
        .update_status(
            args.order,
            StatusUpdate {
                status: args.status,
                delivery_status: args.delivery,
            },
        )
        .await
        .map_err(|error| format!("failed to update order status: {error}"))?;

    println!("order_uuid: {}", args.order);
    println!("status: {}", args.status);
    println!("delivery_status: {}", args.delivery);

    Ok(())
}
