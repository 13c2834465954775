//! Collaborators a market is driven against.
//!
//! Every call is synchronous and fail-fast. A market never retries: the first
//! error aborts the operation and [`Transactional::rollback`] undoes whatever
//! the collaborators already did.

use crate::{address::Address, error::LendingResult, math::ifixed_point::IFixedPoint};

pub trait ExchangeRateOracle {
    /// Fetches a fresh collateral/debt rate. Zero fails with `InvalidExchangeRate`.
    fn refresh_exchange_rate(&mut self) -> LendingResult<IFixedPoint>;

    fn current_rate(&self) -> IFixedPoint;
}

/// Yield-bearing wrapper around the collateral's underlying token.
pub trait CollateralWrapper {
    /// Wraps `amount` underlying held by `holder`, returns the wrapped units minted.
    fn deposit(&mut self, holder: &Address, amount: u64) -> LendingResult<u64>;

    /// Unwraps `wrapped` units held by `holder`, returns the underlying released.
    fn withdraw(&mut self, holder: &Address, wrapped: u64) -> LendingResult<u64>;

    fn pending_yield(&self, holder: &Address) -> u64;

    /// Pays the yield accrued to `holder` in the reward token.
    fn claim_yield(&mut self, holder: &Address) -> LendingResult<u64>;
}

pub trait SwapRouter {
    /// Swaps `amount_in` of `path[0]` held by `holder` along `path`, returns
    /// the amount of the last token received.
    fn swap_exact_input(
        &mut self,
        holder: &Address,
        path: &[Address],
        amount_in: u64,
    ) -> LendingResult<u64>;

    /// Burns `amount` pool tokens held by `holder` into its two legs.
    fn remove_liquidity(
        &mut self,
        holder: &Address,
        pool_token: &Address,
        amount: u64,
    ) -> LendingResult<(u64, u64)>;
}

pub trait ValueTransfer {
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> LendingResult;
}

pub trait Transactional {
    fn checkpoint(&mut self);

    fn commit(&mut self);

    fn rollback(&mut self);
}

pub trait MarketEnv:
    ExchangeRateOracle + CollateralWrapper + SwapRouter + ValueTransfer + Transactional
{
    fn unix_timestamp(&self) -> i64;
}
