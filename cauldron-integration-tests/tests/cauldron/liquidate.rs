use cauldron_lib::{
    error::LendingError,
    event::CauldronEvent,
    interest_rate::InterestRatePerSecond,
    math::ifixed_point::IFixedPoint,
    operation::liquidation::LiquidationRequest,
    state::market_config::LiquidationDustPolicy,
    testing::{alice, bob, cauldron_address, liquidator, mim, test_config, treasury, usdc, weth},
};

use crate::fixture::cauldron_fixture::{carol, lp, yvweth, CauldronFixture};

fn full(accounts: &[cauldron_lib::address::Address]) -> LiquidationRequest {
    LiquidationRequest::new(accounts.to_vec(), vec![u64::MAX; accounts.len()], liquidator())
}

#[test]
fn cant_liquidate_healthy_position() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    let err = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &full(&[alice()]))
        .unwrap_err();
    assert_eq!(err, LendingError::NoLiquidation);
    assert_eq!(fixture.cauldron.events().len(), 2);
}

#[test]
fn can_partially_liquidate_unhealthy_position() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    fixture.env.mint(&mim(), &liquidator(), 100);
    let health_before_liquidation = fixture.cauldron.position_health(&alice()).unwrap();
    let request = LiquidationRequest::new(vec![alice()], vec![100], liquidator());
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.totals.debt_repaid, 100);
    assert_eq!(outcome.totals.fee, 12);
    assert_eq!(outcome.totals.collateral_seized, 74);
    assert_eq!(outcome.settlement.protocol_cut, 3);
    assert_eq!(fixture.balance(&liquidator()).collateral, 71);
    assert_eq!(fixture.treasury_balance().collateral, 3);
    assert_eq!(fixture.balance(&liquidator()).debt, 0);
    assert_eq!(fixture.cauldron.user_loan(&alice()), 300);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 226);

    let liquidate_event = fixture
        .cauldron
        .events()
        .iter()
        .find_map(|event| match event {
            CauldronEvent::Liquidate(event) => Some(*event),
            _ => None,
        })
        .unwrap();
    // the event carries the health at the refreshed rate, not the cached one
    assert_ne!(
        liquidate_event.health_before_liquidation,
        health_before_liquidation
    );
    assert_eq!(liquidate_event.health_before_liquidation.collateral_value, IFixedPoint::from_u64(450));
    fixture.assert_ledgers_consistent();
}

#[test]
fn full_liquidation_closes_the_loan() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    fixture.env.mint(&mim(), &liquidator(), 400);
    let before = fixture.market_balance();
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &full(&[alice()]))
        .unwrap();
    assert_eq!(outcome.totals.principal, 400);
    assert_eq!(outcome.totals.loans_left_open, 0);
    assert_eq!(fixture.balance(&liquidator()).collateral, 284);
    assert_eq!(fixture.treasury_balance().collateral, 16);
    let delta = fixture.market_balance().delta(&before);
    assert_eq!((delta.collateral, delta.debt), (-300, 400));
    assert!(fixture.cauldron.total_loan().is_empty());
    assert_eq!(fixture.cauldron.user_loan(&alice()), 0);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 0);
    assert_eq!(fixture.cauldron.total_collateral(), 0);
}

#[test]
fn batch_skips_solvent_accounts() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.deposit_and_borrow(&bob(), 300, 100);
    fixture.set_rate("1.5");
    fixture.env.mint(&mim(), &liquidator(), 400);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &full(&[bob(), alice(), carol()]))
        .unwrap();
    assert_eq!(outcome.totals.accounts_liquidated, 1);
    assert_eq!(fixture.cauldron.user_loan(&bob()), 100);
    assert_eq!(fixture.cauldron.user_collateral(&bob()), 300);
    assert_eq!(fixture.cauldron.user_loan(&alice()), 0);
}

#[test]
fn liquidation_checks_its_request() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    let mismatched = LiquidationRequest::new(vec![alice(), bob()], vec![1], liquidator());
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &mismatched)
            .unwrap_err(),
        LendingError::ArrayLengthMismatch
    );
    let null_recipient =
        LiquidationRequest::new(vec![alice()], vec![1], cauldron_lib::address::Address::NULL);
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &null_recipient)
            .unwrap_err(),
        LendingError::InvalidAddress
    );
    let bad_path = full(&[alice()]).selling(vec![weth(), usdc()], vec![]);
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &bad_path)
            .unwrap_err(),
        LendingError::PathInvalid
    );
}

#[test]
fn dust_liquidations_are_refused() {
    let config = test_config().with_liquidation_dust_policy(LiquidationDustPolicy::per_account(50));
    let mut fixture =
        CauldronFixture::with_config(config, InterestRatePerSecond::ZERO, IFixedPoint::from_u64(2));
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.deposit_and_borrow(&bob(), 30, 40);
    fixture.set_rate("1.5");
    fixture.env.mint(&mim(), &liquidator(), 1_000);
    let dust = LiquidationRequest::new(vec![alice()], vec![10], liquidator());
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &dust)
            .unwrap_err(),
        LendingError::PrincipalTooLow
    );
    // closing a small loan is never dust
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &full(&[bob()]))
        .unwrap();
    assert_eq!(outcome.totals.principal, 40);
    // dust accounts are skipped when others in the batch are liquidated
    let mixed = LiquidationRequest::new(vec![alice(), alice()], vec![10, 100], liquidator());
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &mixed)
        .unwrap();
    assert_eq!(outcome.totals.skipped_as_dust, 1);
    assert_eq!(outcome.totals.principal, 100);
}

#[test]
fn aggregate_dust_policy_looks_at_the_batch() {
    let config = test_config().with_liquidation_dust_policy(LiquidationDustPolicy::aggregate(50));
    let mut fixture =
        CauldronFixture::with_config(config, InterestRatePerSecond::ZERO, IFixedPoint::from_u64(2));
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.deposit_and_borrow(&bob(), 300, 400);
    fixture.set_rate("1.5");
    fixture.env.mint(&mim(), &liquidator(), 1_000);
    let small = LiquidationRequest::new(vec![alice()], vec![30], liquidator());
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &small)
            .unwrap_err(),
        LendingError::PrincipalTooLow
    );
    let batch = LiquidationRequest::new(vec![alice(), bob()], vec![30, 30], liquidator());
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &batch)
        .unwrap();
    assert_eq!(outcome.totals.principal, 60);
}

#[test]
fn can_liquidate_by_selling_collateral() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    fixture
        .env
        .set_price(&weth(), &mim(), IFixedPoint::lit("1.5"));
    let request = full(&[alice()]).selling(vec![weth(), mim()], vec![]);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.swap_output, 450);
    assert_eq!(fixture.balance(&liquidator()).debt, 25);
    assert_eq!(fixture.treasury_balance().debt, 25);
    assert_eq!(fixture.market_balance().debt, 10_000);
    assert_eq!(fixture.market_balance().collateral, 0);
    assert_eq!(fixture.cauldron.user_loan(&alice()), 0);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 0);
}

#[test]
fn selling_all_collateral_pays_the_fee_surplus() {
    let mut fixture = CauldronFixture::new();
    fixture.set_rate("2.5");
    fixture.deposit_and_borrow(&alice(), 300, 500);
    fixture.set_rate("1.75");
    fixture
        .env
        .set_price(&weth(), &mim(), IFixedPoint::lit("1.875"));
    let request = LiquidationRequest::new(vec![alice()], vec![500], liquidator())
        .selling(vec![weth(), mim()], vec![]);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.totals.debt_repaid, 500);
    assert_eq!(outcome.totals.fee, 62);
    assert_eq!(outcome.totals.collateral_seized, 300);
    assert_eq!(outcome.swap_output, 562);
    assert_eq!(outcome.settlement.protocol_cut, 31);
    assert_eq!(outcome.settlement.to_recipient, 31);
    assert_eq!(
        outcome.settlement.protocol_cut + outcome.settlement.to_recipient,
        outcome.totals.fee
    );
    assert_eq!(fixture.balance(&liquidator()).debt, 31);
    assert_eq!(fixture.treasury_balance().debt, 31);
    assert_eq!(fixture.market_balance().debt, 10_000);
    assert_eq!(fixture.market_balance().collateral, 0);
    assert_eq!(fixture.cauldron.user_loan(&alice()), 0);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 0);
    fixture.assert_ledgers_consistent();
}

#[test]
fn swap_shortfall_needs_a_top_up() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    fixture
        .env
        .set_price(&weth(), &mim(), IFixedPoint::lit("1.25"));
    let request = full(&[alice()]).selling(vec![weth(), mim()], vec![]);
    let err = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap_err();
    assert_eq!(err, LendingError::SwapFailed);
    assert_eq!(fixture.market_balance().collateral, 300);
    assert_eq!(fixture.cauldron.user_loan(&alice()), 400);

    fixture.env.mint(&mim(), &liquidator(), 25);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request.with_max_top_up(25))
        .unwrap();
    assert_eq!(outcome.settlement.top_up, 25);
    assert_eq!(outcome.settlement.to_recipient, 0);
    assert_eq!(fixture.balance(&liquidator()).debt, 0);
    assert_eq!(fixture.market_balance().debt, 10_000);
}

#[test]
fn multi_hop_swap_path() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.set_rate("1.5");
    fixture.env.set_price(&weth(), &usdc(), IFixedPoint::from_u64(3));
    fixture.env.set_price(&usdc(), &mim(), IFixedPoint::lit("0.5"));
    let request = full(&[alice()]).selling(vec![weth(), usdc(), mim()], vec![]);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.swap_output, 450);
}

#[test]
fn yield_bearing_collateral_is_unwrapped() {
    let mut fixture = CauldronFixture::yield_bearing();
    fixture.deposit_and_borrow(&alice(), 200, 300);
    fixture.set_rate("3.5");
    fixture.env.mint(&mim(), &liquidator(), 300);
    let request = full(&[alice()]).as_underlying();
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.totals.collateral_seized, 96);
    // fee collateral is 96 - ceil(300 / 3.5) = 10, half of it to the treasury
    assert_eq!(fixture.env.balance(&yvweth(), &treasury()), 5);
    assert_eq!(fixture.env.balance(&weth(), &liquidator()), 182);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 4);
}

#[test]
fn yield_bearing_collateral_is_sold_as_underlying() {
    let mut fixture = CauldronFixture::yield_bearing();
    fixture.deposit_and_borrow(&alice(), 200, 300);
    fixture.set_rate("3.5");
    fixture
        .env
        .set_price(&weth(), &mim(), IFixedPoint::lit("1.75"));
    let request = full(&[alice()]).selling(vec![weth(), mim()], vec![]);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.swap_output, 336);
    assert_eq!(outcome.settlement.protocol_cut, 18);
    assert_eq!(outcome.settlement.to_recipient, 18);
    assert_eq!(fixture.env.balance(&yvweth(), &cauldron_address()), 4);
}

#[test]
fn pool_token_collateral_is_split_and_sold() {
    let mut fixture = CauldronFixture::pool_token();
    fixture.deposit_and_borrow(&alice(), 100, 300);
    fixture.set_rate("3.5");
    fixture
        .env
        .set_price(&weth(), &mim(), IFixedPoint::lit("1.5"));
    fixture.env.set_price(&usdc(), &mim(), IFixedPoint::one());
    let one_leg = full(&[alice()]).selling(vec![lp(), mim()], vec![]);
    assert_eq!(
        fixture
            .cauldron
            .liquidate(&mut fixture.env, &liquidator(), &one_leg)
            .unwrap_err(),
        LendingError::PathInvalid
    );
    let request = full(&[alice()]).selling(vec![weth(), mim()], vec![usdc(), mim()]);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &request)
        .unwrap();
    assert_eq!(outcome.totals.collateral_seized, 96);
    assert_eq!(outcome.swap_output, 336);
    assert_eq!(fixture.balance(&liquidator()).debt, 18);
    assert_eq!(fixture.env.balance(&mim(), &treasury()), 18);
    assert_eq!(fixture.env.balance(&lp(), &cauldron_address()), 4);
}

#[test]
fn liquidation_after_interest_repays_rounded_up_debt() {
    let mut fixture = CauldronFixture::with_interest(crate::fixture::cauldron_fixture::FAST_RATE);
    fixture.deposit_and_borrow(&alice(), 300, 400);
    fixture.deposit_and_borrow(&bob(), 1_000, 100);
    fixture.env.advance(200);
    fixture.env.mint(&mim(), &liquidator(), 1_000);
    let outcome = fixture
        .cauldron
        .liquidate(&mut fixture.env, &liquidator(), &full(&[alice()]))
        .unwrap();
    // 20% interest: alice owes 480 against 450 of borrowing power
    assert_eq!(outcome.totals.debt_repaid, 480);
    assert_eq!(outcome.totals.fee, 60);
    assert_eq!(outcome.totals.collateral_seized, 270);
    assert_eq!(fixture.cauldron.user_debt(&bob()).unwrap(), 120);
    fixture.assert_ledgers_consistent();
}
