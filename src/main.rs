use clap::Parser;
use ipg_ledger::cli::{self, Cli, Commands, DbCommands, TxCommands};
use ipg_ledger::config::Config;
use ipg_ledger::PaymentStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Config => cli::handle_config_validate(&config),
        Commands::Tx(command) => {
            let store = PaymentStore::connect(&config).await?;
            match command {
                TxCommands::Show { pay_id } => cli::handle_tx_show(&store, pay_id).await,
                TxCommands::Calls { pay_id } => cli::handle_tx_calls(&store, pay_id).await,
            }
        }
        Commands::Db(command) => {
            let store = PaymentStore::connect(&config).await?;
            match command {
                DbCommands::Migrate => cli::handle_db_migrate(&store).await,
                DbCommands::Check => cli::handle_db_check(&store).await,
            }
        }
    }
}
