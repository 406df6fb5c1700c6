mod app;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reserve_oracle::config::Config;
use reserve_oracle::lending::POLICY_NAMES;
use reserve_oracle::pool::FEE_SCHEDULE_NAMES;

#[derive(Parser, Debug)]
#[command(version, about = "Constant-product pricing and lending-pool collateral oracle calculator")]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log filter (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Output obtained for selling an exact input into the pool
    Quote {
        #[arg(long)]
        amount_in: String,
        #[arg(long)]
        reserve_in: String,
        #[arg(long)]
        reserve_out: String,
        #[arg(long, default_value = "exchange-v1", help = FEE_SCHEDULE_NAMES)]
        fee: String,
    },

    /// Input needed to buy an exact output from the pool
    QuoteInput {
        #[arg(long)]
        amount_out: String,
        #[arg(long)]
        reserve_in: String,
        #[arg(long)]
        reserve_out: String,
        #[arg(long, default_value = "exchange-v1", help = FEE_SCHEDULE_NAMES)]
        fee: String,
    },

    /// Collateral a lending pool demands for a borrow
    Collateral {
        #[arg(long)]
        borrow: String,
        /// Oracle pool reserve of the borrowed asset
        #[arg(long)]
        token_reserve: String,
        /// Oracle pool reserve of the collateral asset
        #[arg(long)]
        collateral_reserve: String,
        #[arg(long, default_value = "pair-v2", help = POLICY_NAMES)]
        policy: String,
    },

    /// Replay the configured manipulation scenarios
    Simulate {
        /// Only run this scenario
        #[arg(long)]
        scenario: Option<String>,

        /// Print JSON reports instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Some(Config::from_file(path)?),
        None => None,
    };

    // RUST_LOG > --log-filter > config file > info
    let filter = cli
        .log_filter
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.log_filter().map(str::to_string)))
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Quote { amount_in, reserve_in, reserve_out, fee } => {
            app::quote(&amount_in, &reserve_in, &reserve_out, &fee)
        }
        Commands::QuoteInput { amount_out, reserve_in, reserve_out, fee } => {
            app::quote_input(&amount_out, &reserve_in, &reserve_out, &fee)
        }
        Commands::Collateral { borrow, token_reserve, collateral_reserve, policy } => {
            app::collateral(&borrow, &token_reserve, &collateral_reserve, &policy)
        }
        Commands::Simulate { scenario, json } => {
            let config = config.ok_or_else(|| anyhow::anyhow!("--config is required for simulate"))?;
            app::simulate(&config, scenario.as_deref(), json)
        }
    }
}
