// src/app.rs
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::services::PoolService;
use crate::domain::pool::PoolEngine;
use crate::infrastructure::ledger::InMemoryLedger;
use crate::report::{BalanceEntry, PoolReport, RunReport, StepOutcome, StepResult};
use crate::scenario::{Scenario, Step};
use crate::shared::errors::{AppError, PoolError};
use crate::shared::types::{PoolKey, SwapDirection};

async fn run_step(
    service: &PoolService<InMemoryLedger>,
    step: &Step,
) -> Result<StepResult, PoolError> {
    let (asset_a, asset_b) = step.pool();
    let pool = PoolKey::new(asset_a.clone(), asset_b.clone());

    match step {
        Step::Deposit {
            caller,
            amount_a,
            amount_b,
            ..
        } => {
            let minted = service.deposit(&pool, caller, *amount_a, *amount_b).await?;
            Ok(StepResult::Deposited { minted })
        }
        Step::Redeem { caller, units, .. } => {
            let (amount_a, amount_b) = service.redeem(&pool, caller, *units).await?;
            Ok(StepResult::Redeemed { amount_a, amount_b })
        }
        Step::Swap {
            caller,
            asset_in,
            amount_in,
            min_amount_out,
            ..
        } => {
            let state = service.pool_state(&pool).await?;
            let direction = if asset_in == &state.asset_a {
                SwapDirection::AToB
            } else if asset_in == &state.asset_b {
                SwapDirection::BToA
            } else {
                warn!(%pool, %asset_in, "swap names an asset outside the pool");
                return Err(PoolError::UnknownAsset(asset_in.clone()));
            };
            let amount_out = service
                .swap(&pool, caller, direction, *amount_in, *min_amount_out)
                .await?;
            Ok(StepResult::Swapped { amount_out })
        }
    }
}

/// Replays a scenario against a fresh in-memory ledger.
///
/// Funding and pool creation must succeed; operation steps may fail, and each
/// failure is recorded in the report without stopping the run.
pub async fn run_scenario(engine: PoolEngine, scenario: &Scenario) -> Result<RunReport, AppError> {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = PoolService::new(engine, ledger.clone());

    for funding in &scenario.funding {
        ledger
            .mint(&funding.account, &funding.asset, funding.amount)
            .await?;
    }

    for pool_spec in &scenario.pools {
        let (vault_a, vault_b) = pool_spec.vaults();
        service
            .initialize(pool_spec.asset_a.clone(), pool_spec.asset_b.clone(), vault_a, vault_b)
            .await?;
    }

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let (asset_a, asset_b) = step.pool();
        let pool = PoolKey::new(asset_a.clone(), asset_b.clone());
        let outcome = run_step(&service, step).await;
        steps.push(StepOutcome {
            index,
            op: step.name().to_string(),
            caller: step.caller().clone(),
            pool: pool.to_string(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
            result: outcome.ok(),
        });
    }

    let mut pools = Vec::new();
    for key in service.pools().await {
        let state = service.pool_state(&key).await?;
        pools.push(PoolReport {
            product: state.product(),
            positions: service.positions(&key).await?,
            reconciliation: service.verify_reserves(&key).await?,
            state,
        });
    }

    let balances = ledger
        .snapshot()
        .await
        .into_iter()
        .map(|(account, asset, amount)| BalanceEntry { account, asset, amount })
        .collect();

    let report = RunReport {
        swap_fee_bps: engine.swap_fee_bps(),
        steps,
        pools,
        balances,
        timestamp: Utc::now(),
    };

    info!(
        steps = report.steps.len(),
        failed = report.failed_steps(),
        pools = report.pools.len(),
        "scenario finished"
    );
    if !report.is_consistent() {
        warn!("scenario finished with pool books out of line with vault balances");
    }
    Ok(report)
}
