//! Pairpool - two-asset constant-product liquidity pools
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod math;
pub mod report;
pub mod scenario;
pub mod shared;

// Re-export main types for convenience
pub use application::PoolService;
pub use domain::pool::{LiquidityPosition, PoolEngine, PoolState};
pub use infrastructure::ledger::{InMemoryLedger, ValueLedger};
pub use shared::errors::{AppError, LedgerError, PoolError};
pub use shared::types::{AccountId, AssetId, PoolKey, SwapDirection, VaultHandle};
