use clap::{Args, Subcommand};

mod cancel;
mod update_status;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Cancel a pending order on behalf of its owner and restock its lines
    Cancel(cancel::CancelOrderArgs),

    /// Overwrite an order's status and delivery status
    UpdateStatus(update_status::UpdateStatusArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Cancel(args) => cancel::run(args).await,
        OrderSubcommand::UpdateStatus(args) => update_status::run(args).await,
    }
}
