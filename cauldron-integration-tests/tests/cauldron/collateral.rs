use cauldron_lib::{
    address::Address,
    error::LendingError,
    event::CauldronEvent,
    testing::{alice, bob, cauldron_address, weth},
};

use crate::fixture::cauldron_fixture::{yvweth, CauldronFixture};

#[test]
fn can_add_and_withdraw_collateral() {
    let mut fixture = CauldronFixture::new();
    assert_eq!(fixture.deposit(&alice(), 300).unwrap(), 300);
    assert_eq!(fixture.cauldron.total_collateral(), 300);
    assert_eq!(fixture.market_balance().collateral, 300);
    let sent = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &bob(), 120, false)
        .unwrap();
    assert_eq!(sent, 120);
    assert_eq!(fixture.balance(&bob()).collateral, 120);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 180);
    fixture.assert_ledgers_consistent();
}

#[test]
fn collateral_can_be_added_for_someone_else() {
    let mut fixture = CauldronFixture::new();
    fixture.env.mint(&weth(), &alice(), 50);
    fixture
        .cauldron
        .add_collateral(&mut fixture.env, &alice(), &bob(), 50)
        .unwrap();
    assert_eq!(fixture.cauldron.user_collateral(&bob()), 50);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 0);
    let Some(CauldronEvent::AddCollateral(event)) = fixture.cauldron.events().last() else {
        panic!("expected an add collateral event");
    };
    assert_eq!(event.from, alice());
    assert_eq!(event.to, bob());
}

#[test]
fn cant_withdraw_more_than_deposited() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit(&alice(), 300).unwrap();
    let err = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &alice(), 301, false)
        .unwrap_err();
    assert_eq!(err, LendingError::InsufficientBalance);
    let err = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &bob(), &bob(), 1, false)
        .unwrap_err();
    assert_eq!(err, LendingError::InsufficientBalance);
}

#[test]
fn rejects_zero_amounts_and_null_beneficiaries() {
    let mut fixture = CauldronFixture::new();
    let err = fixture
        .cauldron
        .add_collateral(&mut fixture.env, &alice(), &alice(), 0)
        .unwrap_err();
    assert_eq!(err, LendingError::InvalidAmount);
    let err = fixture
        .cauldron
        .add_collateral(&mut fixture.env, &alice(), &Address::NULL, 10)
        .unwrap_err();
    assert_eq!(err, LendingError::InvalidAddress);
    let err = fixture
        .cauldron
        .add_collateral(&mut fixture.env, &alice(), &alice(), 10)
        .unwrap_err();
    assert_eq!(err, LendingError::TransferFailed);
}

#[test]
fn withdrawal_keeps_the_position_solvent() {
    let mut fixture = CauldronFixture::new();
    fixture.deposit_and_borrow(&alice(), 300, 400);
    let err = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &alice(), 34, false)
        .unwrap_err();
    assert_eq!(err, LendingError::Insolvent);
    assert_eq!(fixture.balance(&alice()).collateral, 0);
    fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &alice(), 33, false)
        .unwrap();
}

#[test]
fn wrapped_collateral_is_credited_in_wrapped_units() {
    let mut fixture = CauldronFixture::yield_bearing();
    assert_eq!(fixture.deposit(&alice(), 200).unwrap(), 100);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 100);
    assert_eq!(fixture.env.balance(&yvweth(), &cauldron_address()), 100);
    assert_eq!(fixture.env.balance(&weth(), &cauldron_address()), 0);
    let Some(CauldronEvent::AddCollateral(event)) = fixture.cauldron.events().last() else {
        panic!("expected an add collateral event");
    };
    assert_eq!((event.amount, event.token, event.token_amount), (100, weth(), 200));
}

#[test]
fn wrapped_collateral_can_be_withdrawn_as_underlying() {
    let mut fixture = CauldronFixture::yield_bearing();
    fixture.deposit(&alice(), 200).unwrap();
    let sent = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &alice(), 25, true)
        .unwrap();
    assert_eq!(sent, 50);
    assert_eq!(fixture.env.balance(&weth(), &alice()), 50);
    let sent = fixture
        .cauldron
        .withdraw_collateral(&mut fixture.env, &alice(), &alice(), 25, false)
        .unwrap();
    assert_eq!(sent, 25);
    assert_eq!(fixture.env.balance(&yvweth(), &alice()), 25);
    assert_eq!(fixture.cauldron.user_collateral(&alice()), 50);
}

#[test]
fn wrapper_minting_nothing_is_refused() {
    let mut fixture = CauldronFixture::yield_bearing();
    let err = fixture.deposit(&alice(), 1).unwrap_err();
    assert_eq!(err, LendingError::CollateralEntryFailed);
    assert_eq!(fixture.env.balance(&weth(), &alice()), 1);
}
