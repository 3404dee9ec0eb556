use clap::{Parser, Subcommand};
use storefront_app::config::LoggingConfig;

mod db;
mod order;
mod payment;

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront order engine CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Order(order::OrderCommand),
    Payment(payment::PaymentCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Order(command) => order::run(command).await,
            Commands::Payment(command) => payment::run(command).await,
        }
    }
}
