//! CLI commands and handlers
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::app::run_scenario;
use crate::config::Config;
use crate::domain::pool::{PoolEngine, PoolState};
use crate::scenario::Scenario;
use crate::shared::errors::AppError;
use crate::shared::types::{AccountId, AssetId, SwapDirection, VaultHandle};

#[derive(Parser)]
#[command(name = "pairpool")]
#[command(version, about = "Two-asset constant-product liquidity pool engine")]
pub struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario script against an in-memory ledger and print a JSON report
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Swap fee in basis points (overrides config)
        #[arg(long)]
        fee_bps: Option<u16>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Quote a swap against the given reserves
    Quote {
        #[arg(long)]
        reserve_in: u64,

        #[arg(long)]
        reserve_out: u64,

        #[arg(long)]
        amount_in: u64,

        /// Swap fee in basis points (overrides config)
        #[arg(long)]
        fee_bps: Option<u16>,
    },
}

pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute the selected command
    pub async fn execute(command: Commands, config: Config) -> Result<(), AppError> {
        match command {
            Commands::Run {
                scenario,
                fee_bps,
                pretty,
            } => Self::execute_run_command(scenario, fee_bps, pretty, config).await,
            Commands::Quote {
                reserve_in,
                reserve_out,
                amount_in,
                fee_bps,
            } => Self::execute_quote_command(reserve_in, reserve_out, amount_in, fee_bps, config),
        }
    }

    fn engine(fee_bps: Option<u16>, config: &Config) -> Result<PoolEngine, AppError> {
        let fee_bps = fee_bps.unwrap_or(config.engine.swap_fee_bps);
        PoolEngine::new(fee_bps)
            .map_err(|e| AppError::ConfigError(format!("invalid swap fee {}: {}", fee_bps, e)))
    }

    async fn execute_run_command(
        scenario_path: PathBuf,
        fee_bps: Option<u16>,
        pretty: bool,
        config: Config,
    ) -> Result<(), AppError> {
        let engine = Self::engine(fee_bps, &config)?;
        let scenario = Scenario::from_file(&scenario_path)
            .map_err(|e| AppError::ScenarioError(format!("{:#}", e)))?;
        info!(
            scenario = %scenario_path.display(),
            steps = scenario.steps.len(),
            swap_fee_bps = engine.swap_fee_bps(),
            "running scenario"
        );

        let report = run_scenario(engine, &scenario).await?;
        println!("{}", report.to_json(pretty)?);
        Ok(())
    }

    fn execute_quote_command(
        reserve_in: u64,
        reserve_out: u64,
        amount_in: u64,
        fee_bps: Option<u16>,
        config: Config,
    ) -> Result<(), AppError> {
        let engine = Self::engine(fee_bps, &config)?;
        let mut pool = PoolState::new(
            VaultHandle::new(AccountId::new("quote-in"), AssetId::new("in")),
            VaultHandle::new(AccountId::new("quote-out"), AssetId::new("out")),
        );
        pool.reserve_a = reserve_in;
        pool.reserve_b = reserve_out;
        pool.initialized = true;

        let amount_out = engine.quote_swap(&pool, SwapDirection::AToB, amount_in)?;
        let quote = serde_json::json!({
            "reserve_in": reserve_in,
            "reserve_out": reserve_out,
            "amount_in": amount_in,
            "swap_fee_bps": engine.swap_fee_bps(),
            "amount_out": amount_out,
        });
        println!("{}", quote);
        Ok(())
    }
}
