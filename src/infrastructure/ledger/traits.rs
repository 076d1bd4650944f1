use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::errors::LedgerError;
use crate::shared::types::{AccountId, AssetId};

/// One leg of a value movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: u64,
}

impl Transfer {
    pub fn new(from: &AccountId, to: &AccountId, asset: &AssetId, amount: u64) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            asset: asset.clone(),
            amount,
        }
    }
}

/// Value-transfer primitive supplied by the environment the pools run in.
/// The engine never edits balances itself; it only issues transfers.
#[async_trait]
pub trait ValueLedger: Send + Sync {
    /// Current balance of `asset` held by `account`
    async fn balance(&self, account: &AccountId, asset: &AssetId) -> u64;

    /// Applies every leg or none of them
    async fn transfer_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError>;

    /// Single movement of value
    async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        asset: &AssetId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.transfer_batch(&[Transfer::new(from, to, asset, amount)])
            .await
    }
}
