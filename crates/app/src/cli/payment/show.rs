use clap::Args;
use storefront_app::{
    config::DatabaseConfig, context::AppContext, domain::orders::records::OrderUuid,
};

#[derive(Debug, Args)]
pub(crate) struct ShowPaymentArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Order UUID
    #[arg(long)]
    order: OrderUuid,
}

pub(crate) async fn run(args: ShowPaymentArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.database)
        .await
        .map_err(|error| error.to_string())?;

    let payment = context
        .payments
        .view_payment(args.order)
        .await
        .map_err(|error| format!("failed to load payment: {error}"))?;

    let json = serde_json::to_string_pretty(&payment)
        .map_err(|error| format!("failed to encode payment: {error}"))?;

    println!("{json}");

    Ok(())
}
