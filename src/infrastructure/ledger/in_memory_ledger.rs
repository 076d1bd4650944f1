//! In-process ledger backing the CLI runner and the tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::traits::{Transfer, ValueLedger};
use crate::shared::errors::LedgerError;
use crate::shared::types::{AccountId, AssetId};

type Balances = HashMap<(AccountId, AssetId), u64>;

/// Balances keyed by (account, asset), all behind one lock so a batch is atomic
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: RwLock<Balances>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `amount` of `asset` out of thin air for `account`
    pub async fn mint(
        &self,
        account: &AccountId,
        asset: &AssetId,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let mut balances = self.balances.write().await;
        let balance = balances
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: account.clone(),
                asset: asset.clone(),
            })?;
        debug!(%account, %asset, amount, "minted");
        Ok(*balance)
    }

    /// Every non-zero balance, sorted for stable output
    pub async fn snapshot(&self) -> Vec<(AccountId, AssetId, u64)> {
        let balances = self.balances.read().await;
        let mut entries: Vec<_> = balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((account, asset), amount)| (account.clone(), asset.clone(), *amount))
            .collect();
        entries.sort();
        entries
    }
}

/// Applies `transfers` to a scratch copy of the touched balances, so a failing
/// leg leaves `balances` as it was.
fn apply_batch(balances: &mut Balances, transfers: &[Transfer]) -> Result<(), LedgerError> {
    let mut staged: HashMap<(AccountId, AssetId), u64> = HashMap::new();

    for transfer in transfers {
        let from_key = (transfer.from.clone(), transfer.asset.clone());
        let available = staged
            .get(&from_key)
            .or_else(|| balances.get(&from_key))
            .copied()
            .unwrap_or(0);
        let debited = available
            .checked_sub(transfer.amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: transfer.from.clone(),
                asset: transfer.asset.clone(),
                needed: transfer.amount,
                available,
            })?;
        staged.insert(from_key, debited);

        let to_key = (transfer.to.clone(), transfer.asset.clone());
        let current = staged
            .get(&to_key)
            .or_else(|| balances.get(&to_key))
            .copied()
            .unwrap_or(0);
        let credited = current
            .checked_add(transfer.amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: transfer.to.clone(),
                asset: transfer.asset.clone(),
            })?;
        staged.insert(to_key, credited);
    }

    balances.extend(staged);
    Ok(())
}

#[async_trait]
impl ValueLedger for InMemoryLedger {
    async fn balance(&self, account: &AccountId, asset: &AssetId) -> u64 {
        let balances = self.balances.read().await;
        balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    async fn transfer_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut balances = self.balances.write().await;
        if let Err(e) = apply_batch(&mut balances, transfers) {
            warn!("Transfer batch rejected: {}", e);
            return Err(e);
        }
        debug!(legs = transfers.len(), "transfer batch applied");
        Ok(())
    }
}
