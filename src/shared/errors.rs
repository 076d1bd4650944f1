//! Error handling for the application

use thiserror::Error;

use crate::shared::types::{AccountId, AssetId, PoolKey};

/// Failures of the value-transfer primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient funds: {account} holds {available} {asset}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        needed: u64,
        available: u64,
    },

    #[error("Balance overflow crediting {account} with {asset}")]
    BalanceOverflow { account: AccountId, asset: AssetId },
}

/// Pool engine errors.
///
/// Every variant is a non-retryable rejection: the operation that produced it
/// left pool state, positions and balances untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool already initialized for {0}")]
    AlreadyInitialized(PoolKey),

    #[error("Pool not initialized")]
    NotInitialized,

    #[error("Pool not found: {0}")]
    PoolNotFound(PoolKey),

    #[error("Pool assets must differ, got {0} twice")]
    IdenticalAssets(AssetId),

    #[error("Asset {0} is not traded by this pool")]
    UnknownAsset(AssetId),

    #[error("Swap fee must be below 10000 bps, got {0}")]
    InvalidFee(u16),

    #[error("Invalid vault {account}: {reason}")]
    InvalidVault { account: AccountId, reason: String },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Unbalanced deposit: offered {offered} of asset B, pool ratio requires {required}")]
    UnbalancedDeposit { offered: u64, required: u64 },

    #[error("Deposit too small to mint any liquidity")]
    ZeroLiquidityMinted,

    #[error("Insufficient liquidity")]
    InsufficientLiquidity,

    #[error("Excessive redemption: requested {requested} units, holding {held}")]
    ExcessiveRedemption { requested: u64, held: u64 },

    #[error("Operation would pay out nothing")]
    ZeroOutput,

    #[error("Slippage tolerance exceeded: output {amount_out} below minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u64, min_amount_out: u64 },

    #[error("Insufficient funds: {account} holds {available} {asset}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        asset: AssetId,
        needed: u64,
        available: u64,
    },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<LedgerError> for PoolError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds { account, asset, needed, available } => {
                PoolError::InsufficientFunds { account, asset, needed, available }
            }
            LedgerError::BalanceOverflow { .. } => PoolError::ArithmeticOverflow,
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_maps_to_insufficient_funds() {
        let err = LedgerError::InsufficientFunds {
            account: AccountId::new("alice"),
            asset: AssetId::new("A"),
            needed: 10,
            available: 3,
        };
        let pool_err: PoolError = err.into();
        assert!(matches!(
            pool_err,
            PoolError::InsufficientFunds { needed: 10, available: 3, .. }
        ));
    }

    #[test]
    fn test_balance_overflow_is_arithmetic_overflow() {
        let err = LedgerError::BalanceOverflow {
            account: AccountId::new("vault"),
            asset: AssetId::new("B"),
        };
        assert_eq!(PoolError::from(err), PoolError::ArithmeticOverflow);
    }
}
