// src/report.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::ReserveCheck;
use crate::domain::pool::{LiquidityPosition, PoolState};
use crate::shared::errors::AppError;
use crate::shared::types::{AccountId, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepResult {
    Deposited { minted: u64 },
    Redeemed { amount_a: u64, amount_b: u64 },
    Swapped { amount_out: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: String,
    pub caller: AccountId,
    pub pool: String,
    pub result: Option<StepResult>,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolReport {
    pub state: PoolState,
    pub product: u128,
    pub positions: Vec<LiquidityPosition>,
    pub reconciliation: ReserveCheck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub account: AccountId,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub swap_fee_bps: u16,
    pub steps: Vec<StepOutcome>,
    pub pools: Vec<PoolReport>,
    pub balances: Vec<BalanceEntry>,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|step| !step.succeeded()).count()
    }

    pub fn is_consistent(&self) -> bool {
        self.pools
            .iter()
            .all(|pool| pool.reconciliation.is_consistent())
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, AppError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| AppError::ReportError(format!("Failed to serialize report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(error: Option<&str>) -> StepOutcome {
        StepOutcome {
            index: 0,
            op: "swap".to_string(),
            caller: AccountId::new("alice"),
            pool: "A/B".to_string(),
            result: error.is_none().then_some(StepResult::Swapped { amount_out: 18 }),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_report_counts_failures_and_serializes() {
        let report = RunReport {
            swap_fee_bps: 0,
            steps: vec![outcome(None), outcome(Some("Pool not initialized"))],
            pools: Vec::new(),
            balances: Vec::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(report.failed_steps(), 1);
        assert!(report.is_consistent());

        let json = report.to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["steps"][0]["result"]["kind"], "swapped");
        assert_eq!(value["steps"][0]["result"]["amount_out"], 18);
        assert_eq!(value["steps"][1]["error"], "Pool not initialized");
    }
}
