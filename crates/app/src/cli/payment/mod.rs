use clap::{Args, Subcommand};

mod reconcile;
mod show;

#[derive(Debug, Args)]
pub(crate) struct PaymentCommand {
    #[command(subcommand)]
    command: PaymentSubcommand,
}

#[derive(Debug, Subcommand)]
enum PaymentSubcommand {
    /// Print an order's payment record as JSON
    Show(show::ShowPaymentArgs),

    /// Settle a payment from a gateway confirmation
    Reconcile(reconcile::ReconcileArgs),
}

pub(crate) async fn run(command: PaymentCommand) -> Result<(), String> {
    match command.command {
        PaymentSubcommand::Show(args) => show::run(args).await,
        PaymentSubcommand::Reconcile(args) => reconcile::run(args).await,
    }
}
