use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    address::Address,
    constant::{MAX_BORROW_OPENING_FEE, MAX_LIQUIDATION_FEE, MAX_LTV},
    error::{LendingError, LendingResult, LendingResultExt},
    math::{bps::ONE_IN_BPS, ifixed_point::IFixedPoint},
};

/// Immutable-shape parameters of a market. `max_ltv`, `liquidation_fee` and
/// `fee_to` can be updated by the administrator, always within bounds.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct MarketConfig {
    /// Address holding the market's tokens
    address: Address,
    tokens: MarketTokens,
    /// Maximum debt value to collateral value ratio, at most 90%
    max_ltv: IFixedPoint,
    /// Bonus paid to liquidators on top of the repaid debt, at most 15%
    liquidation_fee: IFixedPoint,
    /// Protocol fee recipient
    fee_to: Address,
    /// Share of the liquidation fee sent to `fee_to`
    #[cfg_attr(feature = "client", serde(default))]
    protocol_fee_share_in_bps: u16,
    /// Added to the debt on every borrow, at most 5%
    #[cfg_attr(feature = "client", serde(default))]
    borrow_opening_fee: IFixedPoint,
    #[cfg_attr(feature = "client", serde(default = "no_borrow_limit"))]
    max_total_borrow: u64,
    #[cfg_attr(feature = "client", serde(default))]
    liquidation_dust_policy: LiquidationDustPolicy,
}

#[cfg(feature = "client")]
fn no_borrow_limit() -> u64 {
    u64::MAX
}

impl MarketConfig {
    #[track_caller]
    pub fn new(
        address: Address,
        tokens: MarketTokens,
        max_ltv: IFixedPoint,
        liquidation_fee: IFixedPoint,
        fee_to: Address,
    ) -> LendingResult<Self> {
        let config = MarketConfig {
            address,
            tokens,
            max_ltv,
            liquidation_fee,
            fee_to,
            protocol_fee_share_in_bps: 0,
            borrow_opening_fee: IFixedPoint::zero(),
            max_total_borrow: u64::MAX,
            liquidation_dust_policy: LiquidationDustPolicy::default(),
        };
        config.validate().track_caller()?;
        Ok(config)
    }

    #[inline(always)]
    pub fn address(&self) -> &Address {
        &self.address
    }

    #[inline(always)]
    pub fn tokens(&self) -> &MarketTokens {
        &self.tokens
    }

    #[inline(always)]
    pub fn max_ltv(&self) -> IFixedPoint {
        self.max_ltv
    }

    #[inline(always)]
    pub fn liquidation_fee(&self) -> IFixedPoint {
        self.liquidation_fee
    }

    #[inline(always)]
    pub fn fee_to(&self) -> &Address {
        &self.fee_to
    }

    #[inline(always)]
    pub fn protocol_fee_share_in_bps(&self) -> u16 {
        self.protocol_fee_share_in_bps
    }

    #[inline(always)]
    pub fn borrow_opening_fee(&self) -> IFixedPoint {
        self.borrow_opening_fee
    }

    #[inline(always)]
    pub fn max_total_borrow(&self) -> u64 {
        self.max_total_borrow
    }

    #[inline(always)]
    pub fn liquidation_dust_policy(&self) -> &LiquidationDustPolicy {
        &self.liquidation_dust_policy
    }

    /// Checks every bound, used on creation and on deserialized configs.
    #[track_caller]
    pub fn validate(&self) -> LendingResult {
        self.address.require_non_null().with_msg("market address")?;
        self.fee_to.require_non_null().with_msg("fee_to")?;
        self.tokens.validate()?;
        check_fraction(self.max_ltv, MAX_LTV).with_msg("max_ltv")?;
        check_fraction(self.liquidation_fee, MAX_LIQUIDATION_FEE).with_msg("liquidation_fee")?;
        check_fraction(self.borrow_opening_fee, MAX_BORROW_OPENING_FEE)
            .with_msg("borrow_opening_fee")?;
        if self.protocol_fee_share_in_bps as u32 > ONE_IN_BPS {
            return Err(LendingError::InvalidConfig.into()).with_msg("protocol_fee_share_in_bps");
        }
        Ok(())
    }

    pub fn update_max_ltv(&mut self, max_ltv: IFixedPoint) -> LendingResult {
        check_fraction(max_ltv, MAX_LTV).with_msg("max_ltv")?;
        self.max_ltv = max_ltv;
        Ok(())
    }

    pub fn update_liquidation_fee(&mut self, liquidation_fee: IFixedPoint) -> LendingResult {
        check_fraction(liquidation_fee, MAX_LIQUIDATION_FEE).with_msg("liquidation_fee")?;
        self.liquidation_fee = liquidation_fee;
        Ok(())
    }

    pub fn set_fee_to(&mut self, fee_to: Address) -> LendingResult {
        fee_to.require_non_null().with_msg("fee_to")?;
        self.fee_to = fee_to;
        Ok(())
    }

    pub fn with_protocol_fee_share_in_bps(mut self, share_in_bps: u16) -> LendingResult<Self> {
        self.protocol_fee_share_in_bps = share_in_bps;
        self.validate()?;
        Ok(self)
    }

    pub fn with_borrow_opening_fee(mut self, fee: IFixedPoint) -> LendingResult<Self> {
        self.borrow_opening_fee = fee;
        self.validate()?;
        Ok(self)
    }

    pub fn with_max_total_borrow(mut self, max_total_borrow: u64) -> Self {
        self.max_total_borrow = max_total_borrow;
        self
    }

    pub fn with_liquidation_dust_policy(mut self, policy: LiquidationDustPolicy) -> Self {
        self.liquidation_dust_policy = policy;
        self
    }
}

#[track_caller]
fn check_fraction(value: IFixedPoint, max: IFixedPoint) -> LendingResult {
    if value.is_negative() || value > max {
        return Err(LendingError::InvalidConfig.into());
    }
    Ok(())
}

/// Tokens a market deals with.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct MarketTokens {
    /// Unit the collateral ledger is kept in, the wrapped token when a
    /// yield-bearing wrapper is configured
    pub collateral: Address,
    /// Asset lent out and repaid
    pub debt: Address,
    #[cfg_attr(feature = "client", serde(default))]
    pub yield_bearing: Option<YieldBearing>,
    /// Set when the collateral is a two-sided pool token
    #[cfg_attr(feature = "client", serde(default))]
    pub pool_legs: Option<PoolLegs>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct YieldBearing {
    /// Token deposited into the wrapper
    pub underlying: Address,
    /// Token the wrapper pays its yield in
    pub reward: Address,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PoolLegs {
    pub first: Address,
    pub second: Address,
}

impl MarketTokens {
    pub fn new(collateral: Address, debt: Address) -> Self {
        MarketTokens {
            collateral,
            debt,
            yield_bearing: None,
            pool_legs: None,
        }
    }

    pub fn with_yield_bearing(mut self, yield_bearing: YieldBearing) -> Self {
        self.yield_bearing = Some(yield_bearing);
        self
    }

    pub fn with_pool_legs(mut self, pool_legs: PoolLegs) -> Self {
        self.pool_legs = Some(pool_legs);
        self
    }

    pub fn yield_bearing(&self) -> Option<&YieldBearing> {
        self.yield_bearing.as_ref()
    }

    pub fn pool_legs(&self) -> Option<&PoolLegs> {
        self.pool_legs.as_ref()
    }

    pub fn has_wrapper(&self) -> bool {
        self.yield_bearing.is_some()
    }

    /// Token depositors pay in, the underlying when wrapped.
    pub fn deposit_token(&self) -> Address {
        self.yield_bearing
            .map(|y| y.underlying)
            .unwrap_or(self.collateral)
    }

    /// Token sold during liquidation, the underlying when wrapped.
    pub fn sold_token(&self) -> Address {
        self.deposit_token()
    }

    #[track_caller]
    pub fn validate(&self) -> LendingResult {
        let mut tokens = vec![self.collateral, self.debt];
        if let Some(yield_bearing) = &self.yield_bearing {
            tokens.extend([yield_bearing.underlying, yield_bearing.reward]);
        }
        if let Some(legs) = &self.pool_legs {
            tokens.extend([legs.first, legs.second]);
        }
        if tokens.iter().any(Address::is_null) {
            return Err(LendingError::InvalidAddress.into()).with_msg("market token");
        }
        if self.collateral == self.debt {
            return Err(LendingError::InvalidConfig.into()).with_msg("collateral is debt");
        }
        Ok(())
    }
}

/// Whether the dust threshold applies to each liquidated account or to the
/// whole batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(feature = "client", derive(serde::Serialize, serde::Deserialize))]
#[borsh(use_discriminant = true)]
pub enum DustScope {
    #[default]
    PerAccount = 0,
    Aggregate = 1,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LiquidationDustPolicy {
    /// Liquidations below this principal are refused unless they close the loan
    pub min_principal: u64,
    pub scope: DustScope,
}

impl LiquidationDustPolicy {
    pub fn per_account(min_principal: u64) -> Self {
        LiquidationDustPolicy {
            min_principal,
            scope: DustScope::PerAccount,
        }
    }

    pub fn aggregate(min_principal: u64) -> Self {
        LiquidationDustPolicy {
            min_principal,
            scope: DustScope::Aggregate,
        }
    }

    pub fn is_dust(&self, principal: u64, closes_loan: bool) -> bool {
        principal < self.min_principal && !closes_loan
    }
}
