use crate::{
    address::Address,
    error::LendingResult,
    env::{ExchangeRateOracle, MarketEnv},
    interest_rate::InterestRatePerSecond,
    math::ifixed_point::IFixedPoint,
    state::{
        market::Cauldron,
        market_config::{MarketConfig, MarketTokens},
    },
};

use super::sim_env::SimEnv;

pub fn weth() -> Address {
    Address::from_label("weth")
}

pub fn mim() -> Address {
    Address::from_label("mim")
}

pub fn usdc() -> Address {
    Address::from_label("usdc")
}

pub fn cauldron_address() -> Address {
    Address::from_label("cauldron")
}

pub fn treasury() -> Address {
    Address::from_label("treasury")
}

pub fn alice() -> Address {
    Address::from_label("alice")
}

pub fn bob() -> Address {
    Address::from_label("bob")
}

pub fn liquidator() -> Address {
    Address::from_label("liquidator")
}

/// weth collateral, mim debt, 75% max ltv, 12.5% liquidation fee and half of
/// the liquidation fee going to the treasury.
pub fn test_config() -> MarketConfig {
    MarketConfig::new(
        cauldron_address(),
        MarketTokens::new(weth(), mim()),
        IFixedPoint::lit("0.75"),
        IFixedPoint::lit("0.125"),
        treasury(),
    )
    .and_then(|config| config.with_protocol_fee_share_in_bps(5000))
    .expect("valid test config")
}

/// A market over `config` priced at the env's current rate, with
/// `liquidity` debt tokens available to borrow.
pub fn open_cauldron(
    env: &mut SimEnv,
    config: MarketConfig,
    interest_rate: InterestRatePerSecond,
    liquidity: u64,
) -> LendingResult<Cauldron> {
    env.mint(&config.tokens().debt, config.address(), liquidity);
    Cauldron::new(
        config,
        interest_rate,
        env.current_rate(),
        env.unix_timestamp(),
    )
}

/// Default test market: weth at 2 mim, no interest, 10k mim of liquidity.
pub fn test_cauldron() -> (SimEnv, Cauldron) {
    let mut env = SimEnv::new(IFixedPoint::from_u64(2), 1_700_000_000);
    let cauldron = open_cauldron(
        &mut env,
        test_config(),
        InterestRatePerSecond::ZERO,
        10_000,
    )
    .expect("valid test market");
    (env, cauldron)
}
