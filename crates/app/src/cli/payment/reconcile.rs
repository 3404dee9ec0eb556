use clap::Args;
use storefront_app::{
    config::DatabaseConfig, context::AppContext, domain::orders::records::OrderUuid,
};

#[derive(Debug, Args)]
pub(crate) struct ReconcileArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    /// Gateway payment reference
    #[arg(long)]
    reference: String,

    /// Amount reported by the gateway, in minor units
    #[arg(long)]
    amount: u64,
}

pub(crate) async fn run(args: ReconcileArgs) -> Result<(), String> {
    if args.reference.trim().is_empty() {
        return Err("reference cannot be empty".to_string());
    }

    let context = AppContext::from_config(&args.database)
        .await
        .map_err(|error| error.to_string())?;

    let payment = context
        .payments
        .reconcile(args.order, args.reference, args.amount)
        .await
        .map_err(|error| format!("failed to reconcile payment: {error}"))?;

    println!("payment_uuid: {}", payment.uuid);
    println!("status: {}", payment.status);

    Ok(())
}
