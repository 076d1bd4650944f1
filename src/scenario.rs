//! Scenario scripts: balances to fund, pools to create and operations to run

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::shared::types::{AccountId, AssetId, VaultHandle};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Funding {
    pub account: AccountId,
    pub asset: AssetId,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolSpec {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub vault_a: Option<AccountId>,
    pub vault_b: Option<AccountId>,
}

impl PoolSpec {
    /// Vault handles, named after the pair when the script leaves them out
    pub fn vaults(&self) -> (VaultHandle, VaultHandle) {
        let default_vault =
            |asset: &AssetId| AccountId::new(format!("vault:{}-{}:{}", self.asset_a, self.asset_b, asset));
        (
            VaultHandle::new(
                self.vault_a.clone().unwrap_or_else(|| default_vault(&self.asset_a)),
                self.asset_a.clone(),
            ),
            VaultHandle::new(
                self.vault_b.clone().unwrap_or_else(|| default_vault(&self.asset_b)),
                self.asset_b.clone(),
            ),
        )
    }
}

/// One operation; `pool` names the pair in either order.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Deposit {
        caller: AccountId,
        pool: (AssetId, AssetId),
        amount_a: u64,
        amount_b: u64,
    },
    Redeem {
        caller: AccountId,
        pool: (AssetId, AssetId),
        units: u64,
    },
    Swap {
        caller: AccountId,
        pool: (AssetId, AssetId),
        /// Asset paid in; the direction follows from the pool's own A side
        asset_in: AssetId,
        amount_in: u64,
        #[serde(default)]
        min_amount_out: u64,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Deposit { .. } => "deposit",
            Step::Redeem { .. } => "redeem",
            Step::Swap { .. } => "swap",
        }
    }

    pub fn caller(&self) -> &AccountId {
        match self {
            Step::Deposit { caller, .. } | Step::Redeem { caller, .. } | Step::Swap { caller, .. } => {
                caller
            }
        }
    }

    pub fn pool(&self) -> &(AssetId, AssetId) {
        match self {
            Step::Deposit { pool, .. } | Step::Redeem { pool, .. } | Step::Swap { pool, .. } => pool,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Scenario {
    pub funding: Vec<Funding>,
    pub pools: Vec<PoolSpec>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read scenario {}", path.as_ref().display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse scenario")
    }
}
