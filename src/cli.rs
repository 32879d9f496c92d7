use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::domain::PayId;
use crate::store::PaymentStore;

#[derive(Parser)]
#[command(name = "ipg-ledger")]
#[command(about = "IPG Ledger - payment attempt ledger and call audit tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Print a recorded payment attempt
    Show {
        #[arg(value_name = "PAY_ID")]
        pay_id: PayId,
    },

    /// Print the method calls logged against a payment attempt
    Calls {
        #[arg(value_name = "PAY_ID")]
        pay_id: PayId,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,

    /// Check database connectivity
    Check,
}

pub async fn handle_tx_show(store: &PaymentStore, pay_id: PayId) -> anyhow::Result<()> {
    match store.ledger().get_transaction(pay_id).await {
        Ok(tx) => {
            println!("{}", serde_json::to_string_pretty(&tx)?);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!("Transaction {} not found", pay_id);
            anyhow::bail!("Transaction {} not found", pay_id)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn handle_tx_calls(store: &PaymentStore, pay_id: PayId) -> anyhow::Result<()> {
    let calls = store.audit_log().calls_for_payment(pay_id).await?;

    if calls.is_empty() {
        println!("No method calls logged for {}", pay_id);
        return Ok(());
    }

    println!("{:<10} {:<32} {:<8} {:<26}", "Id", "Method", "Status", "Logged at");
    println!("{}", "-".repeat(78));

    for call in calls {
        let status = call
            .status_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<32} {:<8} {:<26}",
            call.id,
            call.method_name,
            status,
            call.created_at.format("%Y-%m-%d %H:%M:%S%.3f")
        );
    }

    Ok(())
}

pub async fn handle_db_migrate(store: &PaymentStore) -> anyhow::Result<()> {
    tracing::info!("Running database migrations...");
    store.migrate().await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub async fn handle_db_check(store: &PaymentStore) -> anyhow::Result<()> {
    if !store.is_healthy().await {
        anyhow::bail!("Database did not answer");
    }

    println!("✓ Database is reachable");
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");
    config.validate()?;

    println!("Configuration:");
    println!("  Database: {}", config.database.masked_url());
    println!("  Charset: {}", config.database.charset);
    println!("  Max connections: {}", config.database.max_connections);
    println!("  Method logging: {}", config.method_logging);

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}
