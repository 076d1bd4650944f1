//! Pool domain - reserve bookkeeping, liquidity issuance and swaps

mod liquidity_ledger;
mod pool_engine;
mod pool_state;

pub use liquidity_ledger::{LiquidityLedger, LiquidityPosition};
pub use pool_engine::{DepositPlan, PoolEngine, RedeemPlan, SwapPlan};
pub use pool_state::PoolState;
