use cauldron_lib::{
    address::Address,
    error::LendingResult,
    operation::liquidation::LiquidationRequest,
    testing::{alice, bob, liquidator, mim, weth},
};
use proptest::prelude::*;

use crate::fixture::cauldron_fixture::{carol, CauldronFixture, FAST_RATE};

#[derive(Debug, Clone)]
enum Op {
    Deposit(usize, u64),
    Withdraw(usize, u64),
    Borrow(usize, u64),
    Repay(usize, u64),
    RepayAll(usize),
    Advance(i64),
    SetRate(u64),
    Liquidate(usize, u64),
    WithdrawFees,
}

fn account(index: usize) -> Address {
    [alice(), bob(), carol()][index % 3]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..1_000u64).prop_map(|(a, x)| Op::Deposit(a, x)),
        (0..3usize, 1..500u64).prop_map(|(a, x)| Op::Withdraw(a, x)),
        (0..3usize, 1..1_000u64).prop_map(|(a, x)| Op::Borrow(a, x)),
        (0..3usize, 1..500u64).prop_map(|(a, x)| Op::Repay(a, x)),
        (0..3usize).prop_map(Op::RepayAll),
        (1..3_600i64).prop_map(Op::Advance),
        (1..4u64).prop_map(Op::SetRate),
        (0..3usize, 1..1_000u64).prop_map(|(a, x)| Op::Liquidate(a, x)),
        Just(Op::WithdrawFees),
    ]
}

fn apply(fixture: &mut CauldronFixture, op: &Op) -> LendingResult<()> {
    let CauldronFixture { env, cauldron } = fixture;
    match op {
        Op::Deposit(a, amount) => {
            env.mint(&weth(), &account(*a), *amount);
            cauldron.add_collateral(env, &account(*a), &account(*a), *amount)?;
        }
        Op::Withdraw(a, amount) => {
            cauldron.withdraw_collateral(env, &account(*a), &account(*a), *amount, false)?;
        }
        Op::Borrow(a, amount) => {
            cauldron.borrow(env, &account(*a), &account(*a), *amount)?;
        }
        Op::Repay(a, principal) => {
            cauldron.repay(env, &account(*a), &account(*a), *principal)?;
        }
        Op::RepayAll(a) => {
            cauldron.repay_all(env, &account(*a), &account(*a))?;
        }
        Op::Advance(seconds) => env.advance(*seconds),
        Op::SetRate(rate) => env.set_rate((*rate).into()),
        Op::Liquidate(a, principal) => {
            let request = LiquidationRequest::new(vec![account(*a)], vec![*principal], liquidator());
            cauldron.liquidate(env, &liquidator(), &request)?;
        }
        Op::WithdrawFees => {
            cauldron.withdraw_fees(env)?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledgers_and_balances_stay_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let mut fixture = CauldronFixture::with_interest(FAST_RATE);
        for index in 0..3 {
            fixture.env.mint(&mim(), &account(index), 100_000);
        }
        fixture.env.mint(&mim(), &liquidator(), 1_000_000);
        let mim_supply = fixture.env.supply(&mim());
        for op in &ops {
            let state_before = fixture.cauldron.state().clone();
            let events_before = fixture.cauldron.events().len();
            let weth_supply = fixture.env.supply(&weth());
            let elastic_before = fixture.cauldron.total_loan().elastic();
            let result = apply(&mut fixture, op);
            if !matches!(op, Op::Repay(..) | Op::RepayAll(..) | Op::Liquidate(..)) {
                prop_assert!(fixture.cauldron.total_loan().elastic() >= elastic_before);
            }
            if result.is_err() {
                prop_assert_eq!(fixture.cauldron.state(), &state_before);
                prop_assert_eq!(fixture.cauldron.events().len(), events_before);
            }
            prop_assert_eq!(fixture.env.checkpoint_depth(), 0);
            prop_assert_eq!(fixture.env.supply(&mim()), mim_supply);
            if !matches!(op, Op::Deposit(..)) {
                prop_assert_eq!(fixture.env.supply(&weth()), weth_supply);
            }
            fixture.assert_ledgers_consistent();
            prop_assert_eq!(
                fixture.env.balance(&weth(), &fixture.cauldron.address()),
                fixture.cauldron.total_collateral()
            );
            if matches!(op, Op::Borrow(..) | Op::Withdraw(..)) && result.is_ok() {
                let (Op::Borrow(a, _) | Op::Withdraw(a, _)) = op else { unreachable!() };
                prop_assert!(fixture.cauldron.is_solvent(&account(*a)).unwrap());
            }
        }
    }
}
