//! Constant product pool engine.
//!
//! Every operation is split in two phases. `plan_*` validates the request
//! against the current state and computes the complete successor state without
//! mutating anything. `apply` then commits a plan. Callers move value between
//! the plan and the commit, so a rejected transfer leaves the pool untouched.

use tracing::{debug, error};

use super::liquidity_ledger::LiquidityLedger;
use super::pool_state::PoolState;
use crate::math;
use crate::shared::errors::PoolError;
use crate::shared::types::{AccountId, SwapDirection};

/// Validated deposit, ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    pub amount_a: u64,
    pub amount_b: u64,
    pub minted: u64,
    pub first_deposit: bool,
    next: PoolState,
}

/// Validated redemption, ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemPlan {
    pub units: u64,
    pub amount_a: u64,
    pub amount_b: u64,
    next: PoolState,
}

/// Validated swap, ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub direction: SwapDirection,
    pub amount_in: u64,
    pub amount_out: u64,
    next: PoolState,
}

impl DepositPlan {
    /// Commits the deposit and returns the owner's new unit balance.
    pub fn apply(
        self,
        pool: &mut PoolState,
        positions: &mut LiquidityLedger,
        owner: &AccountId,
    ) -> Result<u64, PoolError> {
        let units_held = positions.credit(owner, self.minted)?;
        *pool = self.next;
        Ok(units_held)
    }
}

impl RedeemPlan {
    /// Commits the redemption and returns the owner's remaining units.
    pub fn apply(
        self,
        pool: &mut PoolState,
        positions: &mut LiquidityLedger,
        owner: &AccountId,
    ) -> Result<u64, PoolError> {
        let remaining = positions.debit(owner, self.units)?;
        *pool = self.next;
        Ok(remaining)
    }
}

impl SwapPlan {
    pub fn apply(self, pool: &mut PoolState) {
        *pool = self.next;
    }
}

/// Pricing and issuance rules shared by every pool of a service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolEngine {
    swap_fee_bps: u16,
}

impl PoolEngine {
    pub fn new(swap_fee_bps: u16) -> Result<Self, PoolError> {
        if swap_fee_bps as u64 >= math::BPS_SCALE {
            return Err(PoolError::InvalidFee(swap_fee_bps));
        }
        Ok(Self { swap_fee_bps })
    }

    pub fn swap_fee_bps(&self) -> u16 {
        self.swap_fee_bps
    }

    /// Amount of asset B a deposit of `amount_a` must bring into a non-empty pool
    pub fn required_amount_b(&self, pool: &PoolState, amount_a: u64) -> Result<u64, PoolError> {
        if amount_a == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if pool.is_empty() {
            return Err(PoolError::InsufficientLiquidity);
        }
        math::mul_div_ceil(amount_a, pool.reserve_b, pool.reserve_a)
    }

    pub fn plan_deposit(
        &self,
        pool: &PoolState,
        units_held: u64,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<DepositPlan, PoolError> {
        if amount_a == 0 || amount_b == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let first_deposit = pool.is_empty();
        let minted = if first_deposit {
            // The first deposit fixes the unit scale: one unit per raw unit of A
            amount_a
        } else {
            let required = self.required_amount_b(pool, amount_a)?;
            if amount_b != required {
                return Err(PoolError::UnbalancedDeposit {
                    offered: amount_b,
                    required,
                });
            }
            math::mul_div_floor(amount_a, pool.total_liquidity, pool.reserve_a)?
        };
        if minted == 0 {
            return Err(PoolError::ZeroLiquidityMinted);
        }
        units_held
            .checked_add(minted)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let mut next = pool.clone();
        next.reserve_a = pool
            .reserve_a
            .checked_add(amount_a)
            .ok_or(PoolError::ArithmeticOverflow)?;
        next.reserve_b = pool
            .reserve_b
            .checked_add(amount_b)
            .ok_or(PoolError::ArithmeticOverflow)?;
        next.total_liquidity = pool
            .total_liquidity
            .checked_add(minted)
            .ok_or(PoolError::ArithmeticOverflow)?;
        next.initialized = true;

        debug!(
            amount_a,
            amount_b,
            minted,
            first_deposit,
            "deposit planned"
        );

        Ok(DepositPlan {
            amount_a,
            amount_b,
            minted,
            first_deposit,
            next,
        })
    }

    pub fn plan_redeem(
        &self,
        pool: &PoolState,
        units_held: u64,
        units: u64,
    ) -> Result<RedeemPlan, PoolError> {
        if units == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if !pool.initialized {
            return Err(PoolError::NotInitialized);
        }
        if units_held == 0 || pool.is_empty() {
            return Err(PoolError::InsufficientLiquidity);
        }
        if units > units_held {
            return Err(PoolError::ExcessiveRedemption {
                requested: units,
                held: units_held,
            });
        }
        if units > pool.total_liquidity {
            return Err(PoolError::InvariantViolation(format!(
                "position of {} units exceeds total liquidity {}",
                units_held, pool.total_liquidity
            )));
        }

        let (amount_a, amount_b) =
            math::redeem_amounts(units, pool.reserve_a, pool.reserve_b, pool.total_liquidity)?;
        // One side may round to zero; that loss stays with the pool
        if amount_a == 0 && amount_b == 0 {
            return Err(PoolError::ZeroOutput);
        }

        let mut next = pool.clone();
        next.reserve_a = pool
            .reserve_a
            .checked_sub(amount_a)
            .ok_or(PoolError::ArithmeticOverflow)?;
        next.reserve_b = pool
            .reserve_b
            .checked_sub(amount_b)
            .ok_or(PoolError::ArithmeticOverflow)?;
        next.total_liquidity = pool.total_liquidity - units;
        next.check_emptiness()?;

        debug!(units, amount_a, amount_b, "redeem planned");

        Ok(RedeemPlan {
            units,
            amount_a,
            amount_b,
            next,
        })
    }

    /// Output a swap would pay at the current reserves, without the slippage guard
    pub fn quote_swap(
        &self,
        pool: &PoolState,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<u64, PoolError> {
        if amount_in == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if !pool.initialized {
            return Err(PoolError::NotInitialized);
        }
        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        if reserve_in == 0 || reserve_out == 0 {
            return Err(PoolError::InsufficientLiquidity);
        }
        let effective_in = math::apply_fee(amount_in, self.swap_fee_bps)?;
        math::swap_output(effective_in, reserve_in, reserve_out)
    }

    pub fn plan_swap(
        &self,
        pool: &PoolState,
        direction: SwapDirection,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<SwapPlan, PoolError> {
        let amount_out = self.quote_swap(pool, direction, amount_in)?;
        if amount_out < min_amount_out {
            return Err(PoolError::SlippageExceeded {
                amount_out,
                min_amount_out,
            });
        }
        if amount_out == 0 {
            return Err(PoolError::ZeroOutput);
        }

        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(PoolError::ArithmeticOverflow)?;
        let new_out = reserve_out
            .checked_sub(amount_out)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let mut next = pool.clone();
        match direction {
            SwapDirection::AToB => {
                next.reserve_a = new_in;
                next.reserve_b = new_out;
            }
            SwapDirection::BToA => {
                next.reserve_b = new_in;
                next.reserve_a = new_out;
            }
        }

        let before = pool.product();
        let after = next.product();
        if after < before {
            error!(before = %before, after = %after, direction = direction.as_str(), "constant product decreased");
            return Err(PoolError::InvariantViolation(format!(
                "constant product decreased from {} to {}",
                before, after
            )));
        }

        debug!(
            direction = direction.as_str(),
            amount_in,
            amount_out,
            "swap planned"
        );

        Ok(SwapPlan {
            direction,
            amount_in,
            amount_out,
            next,
        })
    }
}
