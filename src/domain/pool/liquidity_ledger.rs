//! Per-depositor liquidity positions of one pool

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shared::errors::PoolError;
use crate::shared::types::AccountId;

/// A depositor's claim on a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub owner: AccountId,
    pub units_held: u64,
}

/// Liquidity units held per owner. Owners with zero units have no record.
#[derive(Debug, Clone, Default)]
pub struct LiquidityLedger {
    positions: BTreeMap<AccountId, u64>,
}

impl LiquidityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units_of(&self, owner: &AccountId) -> u64 {
        self.positions.get(owner).copied().unwrap_or(0)
    }

    pub fn position(&self, owner: &AccountId) -> Option<LiquidityPosition> {
        self.positions.get(owner).map(|units| LiquidityPosition {
            owner: owner.clone(),
            units_held: *units,
        })
    }

    pub fn positions(&self) -> Vec<LiquidityPosition> {
        self.positions
            .iter()
            .map(|(owner, units)| LiquidityPosition {
                owner: owner.clone(),
                units_held: *units,
            })
            .collect()
    }

    /// Sum of all positions, widened so it cannot wrap
    pub fn total_units(&self) -> u128 {
        self.positions.values().map(|units| *units as u128).sum()
    }

    /// Fails without touching the record if the new balance would overflow.
    pub fn credit(&mut self, owner: &AccountId, units: u64) -> Result<u64, PoolError> {
        let held = self.units_of(owner);
        let new_units = held.checked_add(units).ok_or(PoolError::ArithmeticOverflow)?;
        if new_units > 0 {
            self.positions.insert(owner.clone(), new_units);
        }
        Ok(new_units)
    }

    /// Removes the record once it reaches zero.
    pub fn debit(&mut self, owner: &AccountId, units: u64) -> Result<u64, PoolError> {
        let held = self.units_of(owner);
        let remaining = held.checked_sub(units).ok_or(PoolError::ExcessiveRedemption {
            requested: units,
            held,
        })?;
        if remaining == 0 {
            self.positions.remove(owner);
        } else {
            self.positions.insert(owner.clone(), remaining);
        }
        Ok(remaining)
    }
}
