use cauldron_lib::{
    event::CauldronEvent,
    interest_rate::InterestRatePerSecond,
    testing::{alice, mim, treasury},
};

use crate::fixture::cauldron_fixture::{CauldronFixture, FAST_RATE, START};

#[test]
fn empty_market_accrues_nothing() {
    let mut fixture = CauldronFixture::with_interest(FAST_RATE);
    fixture.env.advance(1_000);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 0);
    assert_eq!(fixture.cauldron.debt_ledger().last_accrued(), START + 1_000);
    assert!(fixture.cauldron.events().is_empty());
}

#[test]
fn interest_accrues_linearly_between_accruals() {
    let mut fixture = CauldronFixture::with_interest(FAST_RATE);
    fixture.deposit_and_borrow(&alice(), 2_000, 1_000);
    fixture.env.advance(10);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 10);
    fixture.env.advance(10);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 10);
    assert_eq!(fixture.cauldron.total_loan().elastic(), 1_020);
    assert_eq!(fixture.cauldron.total_loan().base(), 1_000);
    let Some(CauldronEvent::Accrue(event)) = fixture.cauldron.events().last() else {
        panic!("expected an accrue event");
    };
    assert_eq!(event.interest, 10);
    assert_eq!(event.total_elastic, 1_020);
    assert_eq!(event.fees_earned, 20);
}

#[test]
fn clock_going_backwards_is_ignored() {
    let mut fixture = CauldronFixture::with_interest(FAST_RATE);
    fixture.deposit_and_borrow(&alice(), 2_000, 1_000);
    fixture.env.advance(10);
    fixture.cauldron.accrue(&mut fixture.env).unwrap();
    fixture.env.set_now(START);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 0);
    assert_eq!(fixture.cauldron.debt_ledger().last_accrued(), START + 10);
    fixture.env.set_now(START + 20);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 10);
}

#[test]
fn small_loans_round_interest_down() {
    let mut fixture = CauldronFixture::with_interest(InterestRatePerSecond::from_apr_bps(1_000));
    fixture.deposit_and_borrow(&alice(), 100, 10);
    fixture.env.advance(60);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 0);
    assert_eq!(fixture.cauldron.total_loan().elastic(), 10);
}

#[test]
fn fees_are_withdrawn_to_fee_to() {
    let mut fixture = CauldronFixture::with_interest(FAST_RATE);
    fixture.deposit_and_borrow(&alice(), 2_000, 1_000);
    fixture.env.advance(100);
    assert_eq!(fixture.cauldron.withdraw_fees(&mut fixture.env).unwrap(), 100);
    assert_eq!(fixture.env.balance(&mim(), &treasury()), 100);
    assert_eq!(fixture.cauldron.withdraw_fees(&mut fixture.env).unwrap(), 0);
    assert_eq!(fixture.env.balance(&mim(), &treasury()), 100);
}

#[test]
fn fixed_rate_accrues_known_interest() {
    let mut fixture = CauldronFixture::with_interest(InterestRatePerSecond::new(10_000_000_000_000));
    fixture.deposit_and_borrow(&alice(), 2_000, 1_000);
    fixture.env.advance(10_000);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 100);
    assert_eq!(fixture.cauldron.total_loan().elastic(), 1_100);
    assert_eq!(fixture.cauldron.fees_earned(), 100);
    assert_eq!(fixture.cauldron.accrue(&mut fixture.env).unwrap(), 0);
    let accrue_events = fixture
        .cauldron
        .events()
        .iter()
        .filter(|event| matches!(event, CauldronEvent::Accrue(_)))
        .count();
    assert_eq!(accrue_events, 1);
}
