use proptest::prelude::*;

use pairpool::domain::pool::{LiquidityLedger, PoolEngine, PoolState};
use pairpool::{AccountId, AssetId, PoolError, SwapDirection, VaultHandle};

#[derive(Debug, Clone)]
enum Op {
    Deposit { who: usize, amount_a: u64 },
    Redeem { who: usize, fraction_pct: u64 },
    Swap { a_to_b: bool, amount_in: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1u64..1_000_000).prop_map(|(who, amount_a)| Op::Deposit { who, amount_a }),
        (0usize..3, 1u64..=100).prop_map(|(who, fraction_pct)| Op::Redeem { who, fraction_pct }),
        (any::<bool>(), 1u64..1_000_000).prop_map(|(a_to_b, amount_in)| Op::Swap { a_to_b, amount_in }),
    ]
}

fn empty_pool() -> PoolState {
    PoolState::new(
        VaultHandle::new(AccountId::new("vault-a"), AssetId::new("A")),
        VaultHandle::new(AccountId::new("vault-b"), AssetId::new("B")),
    )
}

proptest! {
    #[test]
    fn invariants_hold_over_random_sequences(
        seed_a in 1u64..1_000_000,
        seed_b in 1u64..1_000_000,
        fee_bps in prop_oneof![Just(0u16), Just(30u16)],
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let engine = PoolEngine::new(fee_bps).unwrap();
        let owners: Vec<AccountId> = (0..3).map(|i| AccountId::new(format!("lp-{}", i))).collect();
        let mut pool = empty_pool();
        let mut positions = LiquidityLedger::new();

        engine
            .plan_deposit(&pool, 0, seed_a, seed_b)
            .unwrap()
            .apply(&mut pool, &mut positions, &owners[0])
            .unwrap();

        for op in ops {
            let before = pool.clone();
            let is_swap = matches!(op, Op::Swap { .. });
            let result = match op {
                Op::Deposit { who, amount_a } => {
                    let owner = &owners[who];
                    let held = positions.units_of(owner);
                    let amount_b = if pool.is_empty() {
                        Ok(amount_a)
                    } else {
                        engine.required_amount_b(&pool, amount_a)
                    };
                    match amount_b.and_then(|amount_b| engine.plan_deposit(&pool, held, amount_a, amount_b)) {
                        Ok(plan) => {
                            if !plan.first_deposit {
                                // minted / L == amount_a / reserve_a, floored
                                let lhs = plan.minted as u128 * before.reserve_a as u128;
                                let rhs = amount_a as u128 * before.total_liquidity as u128;
                                prop_assert!(lhs <= rhs);
                                prop_assert!(rhs - lhs < before.reserve_a as u128);
                            }
                            plan.apply(&mut pool, &mut positions, owner).map(|_| ())
                        }
                        Err(e) => Err(e),
                    }
                }
                Op::Redeem { who, fraction_pct } => {
                    let owner = &owners[who];
                    let held = positions.units_of(owner);
                    let units = (held * fraction_pct / 100).max(1);
                    engine
                        .plan_redeem(&pool, held, units)
                        .and_then(|plan| plan.apply(&mut pool, &mut positions, owner).map(|_| ()))
                }
                Op::Swap { a_to_b, amount_in } => {
                    let direction = SwapDirection::from_a_to_b(a_to_b);
                    engine.plan_swap(&pool, direction, amount_in, 0).map(|plan| {
                        plan.apply(&mut pool);
                    })
                }
            };

            match result {
                Ok(()) => {
                    if is_swap {
                        prop_assert!(pool.product() >= before.product());
                    }
                }
                Err(PoolError::InvariantViolation(msg)) => {
                    prop_assert!(false, "invariant violated: {}", msg);
                }
                Err(_) => prop_assert_eq!(&pool, &before),
            }

            prop_assert_eq!(positions.total_units(), pool.total_liquidity as u128);
            prop_assert!(pool.check_emptiness().is_ok());
        }
    }

    #[test]
    fn single_round_trip_is_lossless(amount_a in 1u64..u64::MAX / 2, amount_b in 1u64..u64::MAX / 2) {
        let engine = PoolEngine::default();
        let owner = AccountId::new("lp");
        let mut pool = empty_pool();
        let mut positions = LiquidityLedger::new();

        let minted = {
            let plan = engine.plan_deposit(&pool, 0, amount_a, amount_b).unwrap();
            let minted = plan.minted;
            plan.apply(&mut pool, &mut positions, &owner).unwrap();
            minted
        };
        let plan = engine.plan_redeem(&pool, minted, minted).unwrap();
        prop_assert_eq!((plan.amount_a, plan.amount_b), (amount_a, amount_b));
    }
}
