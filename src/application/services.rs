//! Application services and use cases

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::domain::pool::{LiquidityLedger, LiquidityPosition, PoolEngine, PoolState};
use crate::infrastructure::ledger::{Transfer, ValueLedger};
use crate::shared::errors::PoolError;
use crate::shared::types::{AccountId, AssetId, PoolKey, SwapDirection, VaultHandle};

/// Pool record plus the positions stored alongside it
#[derive(Debug)]
struct PoolEntry {
    state: PoolState,
    positions: LiquidityLedger,
}

#[derive(Default)]
struct Registry {
    pools: HashMap<PoolKey, Arc<Mutex<PoolEntry>>>,
    vaults: HashMap<AccountId, PoolKey>,
}

/// Reconciliation of a pool's books against the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveCheck {
    pub pool: PoolKey,
    pub reserve_a: u64,
    pub vault_balance_a: u64,
    pub reserve_b: u64,
    pub vault_balance_b: u64,
    pub total_liquidity: u64,
    pub units_outstanding: u128,
}

impl ReserveCheck {
    pub fn is_consistent(&self) -> bool {
        self.reserve_a == self.vault_balance_a
            && self.reserve_b == self.vault_balance_b
            && self.total_liquidity as u128 == self.units_outstanding
    }
}

/// Runs the pool operations for any number of asset pairs.
///
/// Each pool sits behind its own mutex, so operations on one pool are
/// serialized while different pools proceed independently. The registry lock
/// is held only to look a pool up or to insert one.
pub struct PoolService<L: ValueLedger> {
    engine: PoolEngine,
    ledger: Arc<L>,
    registry: RwLock<Registry>,
}

fn rejected<T>(op: &str, pool: &PoolKey, result: Result<T, PoolError>) -> Result<T, PoolError> {
    if let Err(e) = &result {
        warn!(%pool, "{} rejected: {}", op, e);
    }
    result
}

impl<L: ValueLedger> PoolService<L> {
    pub fn new(engine: PoolEngine, ledger: Arc<L>) -> Self {
        Self {
            engine,
            ledger,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn engine(&self) -> &PoolEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    async fn entry(&self, pool: &PoolKey) -> Result<Arc<Mutex<PoolEntry>>, PoolError> {
        let registry = self.registry.read().await;
        registry
            .pools
            .get(pool)
            .cloned()
            .ok_or_else(|| PoolError::PoolNotFound(pool.clone()))
    }

    async fn check_vault(
        &self,
        registry: &Registry,
        vault: &VaultHandle,
        asset: &AssetId,
    ) -> Result<(), PoolError> {
        if &vault.asset != asset {
            return Err(PoolError::InvalidVault {
                account: vault.account.clone(),
                reason: format!("holds {}, expected {}", vault.asset, asset),
            });
        }
        if let Some(other) = registry.vaults.get(&vault.account) {
            return Err(PoolError::InvalidVault {
                account: vault.account.clone(),
                reason: format!("already backs pool {}", other),
            });
        }
        let balance = self.ledger.balance(&vault.account, &vault.asset).await;
        if balance != 0 {
            return Err(PoolError::InvalidVault {
                account: vault.account.clone(),
                reason: format!("must start empty, holds {}", balance),
            });
        }
        Ok(())
    }

    async fn check_new_pool(
        &self,
        registry: &Registry,
        key: &PoolKey,
        asset_a: &AssetId,
        asset_b: &AssetId,
        vault_a: &VaultHandle,
        vault_b: &VaultHandle,
    ) -> Result<(), PoolError> {
        if registry.pools.contains_key(key) {
            return Err(PoolError::AlreadyInitialized(key.clone()));
        }
        if vault_a.account == vault_b.account {
            return Err(PoolError::InvalidVault {
                account: vault_a.account.clone(),
                reason: "both sides use the same account".to_string(),
            });
        }
        self.check_vault(registry, vault_a, asset_a).await?;
        self.check_vault(registry, vault_b, asset_b).await
    }

    /// Creates an empty pool for `(asset_a, asset_b)` backed by the two vaults.
    /// No value moves.
    pub async fn initialize(
        &self,
        asset_a: AssetId,
        asset_b: AssetId,
        vault_a: VaultHandle,
        vault_b: VaultHandle,
    ) -> Result<PoolKey, PoolError> {
        let key = PoolKey::new(asset_a.clone(), asset_b.clone());
        if asset_a == asset_b {
            return rejected("initialize", &key, Err(PoolError::IdenticalAssets(asset_a)));
        }

        let mut registry = self.registry.write().await;
        let result = self
            .check_new_pool(&registry, &key, &asset_a, &asset_b, &vault_a, &vault_b)
            .await;
        rejected("initialize", &key, result)?;

        registry.vaults.insert(vault_a.account.clone(), key.clone());
        registry.vaults.insert(vault_b.account.clone(), key.clone());
        let state = PoolState::new(vault_a, vault_b);
        registry.pools.insert(
            key.clone(),
            Arc::new(Mutex::new(PoolEntry {
                state,
                positions: LiquidityLedger::new(),
            })),
        );

        info!(pool = %key, %asset_a, %asset_b, "pool initialized");
        Ok(key)
    }

    /// Adds liquidity and returns the units minted to `caller`.
    pub async fn deposit(
        &self,
        pool: &PoolKey,
        caller: &AccountId,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<u64, PoolError> {
        let entry = self.entry(pool).await?;
        let mut entry = entry.lock().await;
        let PoolEntry { state, positions } = &mut *entry;

        let held = positions.units_of(caller);
        let plan = rejected(
            "deposit",
            pool,
            self.engine.plan_deposit(state, held, amount_a, amount_b),
        )?;

        let transfers = [
            Transfer::new(caller, &state.vault_a.account, &state.asset_a, plan.amount_a),
            Transfer::new(caller, &state.vault_b.account, &state.asset_b, plan.amount_b),
        ];
        rejected(
            "deposit",
            pool,
            self.ledger.transfer_batch(&transfers).await.map_err(PoolError::from),
        )?;

        let minted = plan.minted;
        let units_held = plan.apply(state, positions, caller)?;
        info!(
            %pool,
            %caller,
            amount_a,
            amount_b,
            minted,
            units_held,
            reserve_a = state.reserve_a,
            reserve_b = state.reserve_b,
            "liquidity deposited"
        );
        Ok(minted)
    }

    /// Burns `units` of `caller`'s liquidity and returns the `(amount_a, amount_b)` paid out.
    pub async fn redeem(
        &self,
        pool: &PoolKey,
        caller: &AccountId,
        units: u64,
    ) -> Result<(u64, u64), PoolError> {
        let entry = self.entry(pool).await?;
        let mut entry = entry.lock().await;
        let PoolEntry { state, positions } = &mut *entry;

        let held = positions.units_of(caller);
        let plan = rejected("redeem", pool, self.engine.plan_redeem(state, held, units))?;

        let transfers: Vec<Transfer> = [
            Transfer::new(&state.vault_a.account, caller, &state.asset_a, plan.amount_a),
            Transfer::new(&state.vault_b.account, caller, &state.asset_b, plan.amount_b),
        ]
        .into_iter()
        .filter(|transfer| transfer.amount > 0)
        .collect();
        rejected(
            "redeem",
            pool,
            self.ledger.transfer_batch(&transfers).await.map_err(PoolError::from),
        )?;

        let payout = (plan.amount_a, plan.amount_b);
        let remaining = plan.apply(state, positions, caller)?;
        info!(
            %pool,
            %caller,
            units,
            amount_a = payout.0,
            amount_b = payout.1,
            remaining,
            "liquidity redeemed"
        );
        Ok(payout)
    }

    /// Exchanges `amount_in` of the input asset and returns the output paid to `caller`.
    pub async fn swap(
        &self,
        pool: &PoolKey,
        caller: &AccountId,
        direction: SwapDirection,
        amount_in: u64,
        min_amount_out: u64,
    ) -> Result<u64, PoolError> {
        let entry = self.entry(pool).await?;
        let mut entry = entry.lock().await;
        let state = &mut entry.state;

        let plan = rejected(
            "swap",
            pool,
            self.engine.plan_swap(state, direction, amount_in, min_amount_out),
        )?;

        let (vault_in, vault_out) = state.vaults_for(direction);
        let transfers = [
            Transfer::new(caller, &vault_in.account, &vault_in.asset, plan.amount_in),
            Transfer::new(&vault_out.account, caller, &vault_out.asset, plan.amount_out),
        ];
        rejected(
            "swap",
            pool,
            self.ledger.transfer_batch(&transfers).await.map_err(PoolError::from),
        )?;

        let amount_out = plan.amount_out;
        plan.apply(state);
        info!(
            %pool,
            %caller,
            direction = direction.as_str(),
            amount_in,
            amount_out,
            reserve_a = state.reserve_a,
            reserve_b = state.reserve_b,
            "swap executed"
        );
        Ok(amount_out)
    }

    /// Asset B a balanced deposit of `amount_a` requires right now
    pub async fn quote_deposit(&self, pool: &PoolKey, amount_a: u64) -> Result<u64, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        self.engine.required_amount_b(&entry.state, amount_a)
    }

    /// Output a swap would pay right now, ignoring any slippage guard
    pub async fn quote_swap(
        &self,
        pool: &PoolKey,
        direction: SwapDirection,
        amount_in: u64,
    ) -> Result<u64, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        self.engine.quote_swap(&entry.state, direction, amount_in)
    }

    pub async fn pool_state(&self, pool: &PoolKey) -> Result<PoolState, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        Ok(entry.state.clone())
    }

    pub async fn position(
        &self,
        pool: &PoolKey,
        owner: &AccountId,
    ) -> Result<Option<LiquidityPosition>, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        Ok(entry.positions.position(owner))
    }

    pub async fn positions(&self, pool: &PoolKey) -> Result<Vec<LiquidityPosition>, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        Ok(entry.positions.positions())
    }

    /// Keys of every registered pool, sorted
    pub async fn pools(&self) -> Vec<PoolKey> {
        let registry = self.registry.read().await;
        let mut keys: Vec<PoolKey> = registry.pools.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Compares a pool's reserves with its vault balances and its total
    /// liquidity with the sum of positions.
    pub async fn verify_reserves(&self, pool: &PoolKey) -> Result<ReserveCheck, PoolError> {
        let entry = self.entry(pool).await?;
        let entry = entry.lock().await;
        let state = &entry.state;

        let check = ReserveCheck {
            pool: pool.clone(),
            reserve_a: state.reserve_a,
            vault_balance_a: self
                .ledger
                .balance(&state.vault_a.account, &state.vault_a.asset)
                .await,
            reserve_b: state.reserve_b,
            vault_balance_b: self
                .ledger
                .balance(&state.vault_b.account, &state.vault_b.asset)
                .await,
            total_liquidity: state.total_liquidity,
            units_outstanding: entry.positions.total_units(),
        };
        if !check.is_consistent() {
            warn!(%pool, ?check, "pool books disagree with ledger");
        }
        Ok(check)
    }

    /// Reconciles every pool concurrently
    pub async fn verify_all(&self) -> Result<Vec<ReserveCheck>, PoolError> {
        let keys = self.pools().await;
        join_all(keys.iter().map(|key| self.verify_reserves(key)))
            .await
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ledger::InMemoryLedger;

    struct Fixture {
        service: PoolService<InMemoryLedger>,
        pool: PoolKey,
        alice: AccountId,
        a: AssetId,
        b: AssetId,
    }

    async fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let service = PoolService::new(PoolEngine::default(), ledger.clone());
        let a = AssetId::new("A");
        let b = AssetId::new("B");
        let alice = AccountId::new("alice");
        ledger.mint(&alice, &a, 10_000).await.unwrap();
        ledger.mint(&alice, &b, 10_000).await.unwrap();

        let pool = service
            .initialize(
                a.clone(),
                b.clone(),
                VaultHandle::new(AccountId::new("vault-a"), a.clone()),
                VaultHandle::new(AccountId::new("vault-b"), b.clone()),
            )
            .await
            .unwrap();
        Fixture { service, pool, alice, a, b }
    }

    #[tokio::test]
    async fn test_initialize_creates_empty_pool() {
        let f = fixture().await;
        let state = f.service.pool_state(&f.pool).await.unwrap();
        assert_eq!((state.reserve_a, state.reserve_b, state.total_liquidity), (0, 0, 0));
        assert!(!state.initialized);
        assert_eq!(state.asset_a, f.a);
        assert_eq!(f.service.pools().await, vec![f.pool.clone()]);
    }

    #[tokio::test]
    async fn test_initialize_twice_fails_either_order() {
        let f = fixture().await;
        let again = f
            .service
            .initialize(
                f.b.clone(),
                f.a.clone(),
                VaultHandle::new(AccountId::new("vault-b2"), f.b.clone()),
                VaultHandle::new(AccountId::new("vault-a2"), f.a.clone()),
            )
            .await;
        assert_eq!(again, Err(PoolError::AlreadyInitialized(f.pool.clone())));
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_vaults() {
        let f = fixture().await;
        let c = AssetId::new("C");
        let d = AssetId::new("D");

        let same_account = f
            .service
            .initialize(
                c.clone(),
                d.clone(),
                VaultHandle::new(AccountId::new("v"), c.clone()),
                VaultHandle::new(AccountId::new("v"), d.clone()),
            )
            .await;
        assert!(matches!(same_account, Err(PoolError::InvalidVault { .. })));

        let wrong_asset = f
            .service
            .initialize(
                c.clone(),
                d.clone(),
                VaultHandle::new(AccountId::new("v-c"), d.clone()),
                VaultHandle::new(AccountId::new("v-d"), d.clone()),
            )
            .await;
        assert!(matches!(wrong_asset, Err(PoolError::InvalidVault { .. })));

        let reused = f
            .service
            .initialize(
                c.clone(),
                d.clone(),
                VaultHandle::new(AccountId::new("vault-a"), c.clone()),
                VaultHandle::new(AccountId::new("v-d"), d.clone()),
            )
            .await;
        assert!(matches!(reused, Err(PoolError::InvalidVault { .. })));

        f.service
            .ledger()
            .mint(&AccountId::new("v-d"), &d, 1)
            .await
            .unwrap();
        let funded = f
            .service
            .initialize(
                c.clone(),
                d.clone(),
                VaultHandle::new(AccountId::new("v-c"), c.clone()),
                VaultHandle::new(AccountId::new("v-d"), d.clone()),
            )
            .await;
        assert!(matches!(funded, Err(PoolError::InvalidVault { .. })));

        assert_eq!(
            f.service
                .initialize(
                    c.clone(),
                    c.clone(),
                    VaultHandle::new(AccountId::new("x"), c.clone()),
                    VaultHandle::new(AccountId::new("y"), c.clone()),
                )
                .await,
            Err(PoolError::IdenticalAssets(c.clone()))
        );
        assert_eq!(f.service.pools().await.len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_identical_assets_rejection_is_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = PoolService::new(PoolEngine::default(), Arc::new(InMemoryLedger::new()));
        let c = AssetId::new("C");
        let result = service
            .initialize(
                c.clone(),
                c.clone(),
                VaultHandle::new(AccountId::new("x"), c.clone()),
                VaultHandle::new(AccountId::new("y"), c.clone()),
            )
            .await;
        assert_eq!(result, Err(PoolError::IdenticalAssets(c)));
        assert!(service.pools().await.is_empty());

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"));
        assert!(output.contains("initialize rejected"));
    }

    #[tokio::test]
    async fn test_deposit_moves_value_into_vaults() {
        let f = fixture().await;
        let minted = f.service.deposit(&f.pool, &f.alice, 100, 200).await.unwrap();
        assert_eq!(minted, 100);

        let ledger = f.service.ledger();
        assert_eq!(ledger.balance(&f.alice, &f.a).await, 9_900);
        assert_eq!(ledger.balance(&f.alice, &f.b).await, 9_800);
        assert_eq!(ledger.balance(&AccountId::new("vault-a"), &f.a).await, 100);

        let position = f.service.position(&f.pool, &f.alice).await.unwrap().unwrap();
        assert_eq!(position.units_held, 100);
        assert!(f.service.verify_reserves(&f.pool).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_deposit_without_funds_leaves_pool_untouched() {
        let f = fixture().await;
        let bob = AccountId::new("bob");
        f.service.ledger().mint(&bob, &f.a, 100).await.unwrap();

        let result = f.service.deposit(&f.pool, &bob, 100, 200).await;
        assert!(matches!(result, Err(PoolError::InsufficientFunds { .. })));

        let state = f.service.pool_state(&f.pool).await.unwrap();
        assert_eq!(state.total_liquidity, 0);
        assert!(!state.initialized);
        assert_eq!(f.service.ledger().balance(&bob, &f.a).await, 100);
        assert!(f.service.position(&f.pool, &bob).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_swap_pays_caller() {
        let f = fixture().await;
        f.service.deposit(&f.pool, &f.alice, 150, 300).await.unwrap();

        assert_eq!(
            f.service.quote_swap(&f.pool, SwapDirection::AToB, 10).await.unwrap(),
            18
        );
        let out = f
            .service
            .swap(&f.pool, &f.alice, SwapDirection::AToB, 10, 1)
            .await
            .unwrap();
        assert_eq!(out, 18);
        assert_eq!(f.service.ledger().balance(&f.alice, &f.b).await, 10_000 - 300 + 18);
        assert!(f.service.verify_reserves(&f.pool).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_unknown_pool() {
        let f = fixture().await;
        let missing = PoolKey::new(AssetId::new("X"), AssetId::new("Y"));
        assert_eq!(
            f.service.deposit(&missing, &f.alice, 1, 1).await,
            Err(PoolError::PoolNotFound(missing.clone()))
        );
    }

    #[tokio::test]
    async fn test_quote_deposit() {
        let f = fixture().await;
        assert_eq!(
            f.service.quote_deposit(&f.pool, 10).await,
            Err(PoolError::InsufficientLiquidity)
        );
        f.service.deposit(&f.pool, &f.alice, 100, 200).await.unwrap();
        assert_eq!(f.service.quote_deposit(&f.pool, 10).await.unwrap(), 20);
    }
}
