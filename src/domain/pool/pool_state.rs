//! Pool state record and its invariants

use serde::{Deserialize, Serialize};

use crate::math;
use crate::shared::errors::PoolError;
use crate::shared::types::{AssetId, PoolKey, SwapDirection, VaultHandle};

/// Ledger record of one asset pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub vault_a: VaultHandle,
    pub vault_b: VaultHandle,
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub total_liquidity: u64,
    pub initialized: bool,
}

impl PoolState {
    pub fn new(vault_a: VaultHandle, vault_b: VaultHandle) -> Self {
        Self {
            asset_a: vault_a.asset.clone(),
            asset_b: vault_b.asset.clone(),
            vault_a,
            vault_b,
            reserve_a: 0,
            reserve_b: 0,
            total_liquidity: 0,
            initialized: false,
        }
    }

    pub fn key(&self) -> PoolKey {
        PoolKey::new(self.asset_a.clone(), self.asset_b.clone())
    }

    /// No outstanding liquidity
    pub fn is_empty(&self) -> bool {
        self.total_liquidity == 0
    }

    pub fn product(&self) -> u128 {
        math::product(self.reserve_a, self.reserve_b)
    }

    /// `(reserve_in, reserve_out)` for a swap direction
    pub fn reserves_for(&self, direction: SwapDirection) -> (u64, u64) {
        match direction {
            SwapDirection::AToB => (self.reserve_a, self.reserve_b),
            SwapDirection::BToA => (self.reserve_b, self.reserve_a),
        }
    }

    /// `(vault_in, vault_out)` for a swap direction
    pub fn vaults_for(&self, direction: SwapDirection) -> (&VaultHandle, &VaultHandle) {
        match direction {
            SwapDirection::AToB => (&self.vault_a, &self.vault_b),
            SwapDirection::BToA => (&self.vault_b, &self.vault_a),
        }
    }

    /// Checks that liquidity exists exactly when reserves do.
    pub fn check_emptiness(&self) -> Result<(), PoolError> {
        let reserves_empty = self.reserve_a == 0 && self.reserve_b == 0;
        if self.is_empty() != reserves_empty {
            return Err(PoolError::InvariantViolation(format!(
                "total liquidity {} with reserves ({}, {})",
                self.total_liquidity, self.reserve_a, self.reserve_b
            )));
        }
        Ok(())
    }
}
