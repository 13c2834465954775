use cauldron_lib::{
    address::Address,
    error::LendingResult,
    interest_rate::InterestRatePerSecond,
    math::ifixed_point::IFixedPoint,
    state::{
        market::Cauldron,
        market_config::{MarketConfig, MarketTokens, PoolLegs, YieldBearing},
    },
    testing::{cauldron_address, mim, open_cauldron, test_config, treasury, usdc, weth, SimEnv, SimPool, SimWrapper},
};

use crate::fixture::balance::Balance;

pub const START: i64 = 1_700_000_000;
pub const LIQUIDITY: u64 = 10_000;
/// 0.1% of the outstanding debt per second
pub const FAST_RATE: InterestRatePerSecond = InterestRatePerSecond::new(1_000_000_000_000_000);

pub fn yvweth() -> Address {
    Address::from_label("yvweth")
}

pub fn lp() -> Address {
    Address::from_label("weth-usdc-lp")
}

pub fn carol() -> Address {
    Address::from_label("carol")
}

pub struct CauldronFixture {
    pub env: SimEnv,
    pub cauldron: Cauldron,
}

impl CauldronFixture {
    /// weth collateral priced at 2 mim, no interest.
    pub fn new() -> Self {
        Self::with_config(test_config(), InterestRatePerSecond::ZERO, IFixedPoint::from_u64(2))
    }

    pub fn with_interest(rate: InterestRatePerSecond) -> Self {
        Self::with_config(test_config(), rate, IFixedPoint::from_u64(2))
    }

    pub fn with_config(
        config: MarketConfig,
        interest_rate: InterestRatePerSecond,
        exchange_rate: IFixedPoint,
    ) -> Self {
        let mut env = SimEnv::new(exchange_rate, START);
        let cauldron = open_cauldron(&mut env, config, interest_rate, LIQUIDITY).unwrap();
        CauldronFixture { env, cauldron }
    }

    /// yvweth collateral wrapping weth 1:2, paying yield in usdc, priced at 4 mim.
    pub fn yield_bearing() -> Self {
        let tokens = MarketTokens::new(yvweth(), mim()).with_yield_bearing(YieldBearing {
            underlying: weth(),
            reward: usdc(),
        });
        let mut fixture = Self::with_config(config_with_tokens(tokens), InterestRatePerSecond::ZERO, IFixedPoint::from_u64(4));
        fixture.env.set_wrapper(SimWrapper {
            wrapped: yvweth(),
            underlying: weth(),
            reward: usdc(),
            underlying_per_wrapped: IFixedPoint::from_u64(2),
        });
        fixture
    }

    /// Pool token collateral burning into 1 weth and 2 usdc, priced at 4 mim.
    pub fn pool_token() -> Self {
        let tokens = MarketTokens::new(lp(), mim()).with_pool_legs(PoolLegs {
            first: weth(),
            second: usdc(),
        });
        let mut fixture = Self::with_config(config_with_tokens(tokens), InterestRatePerSecond::ZERO, IFixedPoint::from_u64(4));
        fixture.env.add_pool(
            &lp(),
            SimPool {
                first: weth(),
                first_per_token: IFixedPoint::one(),
                second: usdc(),
                second_per_token: IFixedPoint::from_u64(2),
            },
        );
        fixture
    }

    /// Mints `deposit` of the deposit token to `account` and adds it all as collateral.
    pub fn deposit(&mut self, account: &Address, deposit: u64) -> LendingResult<u64> {
        let token = self.cauldron.config().tokens().deposit_token();
        self.env.mint(&token, account, deposit);
        self.cauldron
            .add_collateral(&mut self.env, account, account, deposit)
    }

    pub fn deposit_and_borrow(&mut self, account: &Address, deposit: u64, borrow: u64) {
        self.deposit(account, deposit).unwrap();
        self.cauldron
            .borrow(&mut self.env, account, account, borrow)
            .unwrap();
    }

    pub fn set_rate(&mut self, rate: &str) {
        self.env.set_rate(IFixedPoint::lit(rate));
    }

    pub fn balance(&self, account: &Address) -> Balance {
        Balance {
            collateral: self
                .env
                .balance(&self.cauldron.config().tokens().collateral, account),
            debt: self.env.balance(&mim(), account),
        }
    }

    pub fn market_balance(&self) -> Balance {
        self.balance(&cauldron_address())
    }

    pub fn treasury_balance(&self) -> Balance {
        self.balance(&treasury())
    }

    /// Ledger totals match the per account entries.
    pub fn assert_ledgers_consistent(&self) {
        let debt = self.cauldron.debt_ledger();
        assert_eq!(debt.sum_user_loans(), debt.total_loan().base() as u128);
        let collateral = self.cauldron.collateral_ledger();
        assert_eq!(
            collateral.sum_user_collateral(),
            collateral.total_collateral() as u128
        );
        if debt.total_loan().base() > 0 {
            assert!(debt.total_loan().elastic() > 0);
        }
    }
}

fn config_with_tokens(tokens: MarketTokens) -> MarketConfig {
    MarketConfig::new(
        cauldron_address(),
        tokens,
        IFixedPoint::lit("0.75"),
        IFixedPoint::lit("0.125"),
        treasury(),
    )
    .unwrap()
    .with_protocol_fee_share_in_bps(5000)
    .unwrap()
}
