use clap::Args;
use storefront_app::{
    config::DatabaseConfig,
    context::AppContext,
    domain::{orders::records::OrderUuid, users::UserUuid},
};

#[derive(Debug, Args)]
pub(crate) struct CancelOrderArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// UUID of the user who placed the order
    #[arg(long)]
    user: UserUuid,

    /// Order UUID
    #[arg(long)]
    order: OrderUuid,
}

pub(crate) async fn run(args: CancelOrderArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database)
        .await
        .map_err(|error| error.to_string())?;

    let order = context
        .lifecycle
        .cancel_order(args.user, args.order)
        .await
        .map_err(|error| format!("failed to cancel order: {error}"))?;

    println!("order_uuid: {}", order.uuid);
    println!("status: {}", order.status);
    println!("restocked_lines: {}", order.lines.len());

    Ok(())
}
