use std::collections::BTreeMap;

use crate::{
    address::Address,
    env::{
        CollateralWrapper, ExchangeRateOracle, MarketEnv, SwapRouter, Transactional,
        ValueTransfer,
    },
    error::{LendingError, LendingResult, LendingResultExt},
    math::{ifixed_point::IFixedPoint, rounding::RoundingMode, safe_math::SafeMath},
};

/// Wrapper minting `wrapped` for `underlying` at a fixed ratio and paying
/// its yield in `reward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimWrapper {
    pub wrapped: Address,
    pub underlying: Address,
    pub reward: Address,
    pub underlying_per_wrapped: IFixedPoint,
}

/// Pool token burning into fixed amounts of its two legs per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPool {
    pub first: Address,
    pub first_per_token: IFixedPoint,
    pub second: Address,
    pub second_per_token: IFixedPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SimLedger {
    balances: BTreeMap<(Address, Address), u64>,
    prices: BTreeMap<(Address, Address), IFixedPoint>,
    pending_yield: BTreeMap<Address, u64>,
}

impl SimLedger {
    fn credit(&mut self, token: &Address, owner: &Address, amount: u64) -> LendingResult {
        let balance = self.balances.entry((*token, *owner)).or_default();
        *balance = balance.safe_add(amount)?;
        Ok(())
    }

    fn debit(&mut self, token: &Address, owner: &Address, amount: u64) -> Option<()> {
        if amount == 0 {
            return Some(());
        }
        let balance = self.balances.get_mut(&(*token, *owner))?;
        *balance = balance.checked_sub(amount)?;
        Some(())
    }
}

/// Token balances, swap prices, wrapper and oracle held in memory.
///
/// Balances, prices and pending yield are checkpointed so a failed market
/// operation leaves them untouched. The oracle rate and the clock are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEnv {
    ledger: SimLedger,
    checkpoints: Vec<SimLedger>,
    rate: IFixedPoint,
    now: i64,
    wrapper: Option<SimWrapper>,
    pools: BTreeMap<Address, SimPool>,
}

impl SimEnv {
    pub fn new(rate: IFixedPoint, now: i64) -> Self {
        SimEnv {
            ledger: SimLedger::default(),
            checkpoints: Vec::new(),
            rate,
            now,
            wrapper: None,
            pools: BTreeMap::new(),
        }
    }

    pub fn mint(&mut self, token: &Address, owner: &Address, amount: u64) {
        let balance = self.ledger.balances.entry((*token, *owner)).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn balance(&self, token: &Address, owner: &Address) -> u64 {
        self.ledger
            .balances
            .get(&(*token, *owner))
            .copied()
            .unwrap_or_default()
    }

    /// Every non-zero `(token, owner, amount)` balance.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Address, u64)> {
        self.ledger
            .balances
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|((token, owner), amount)| (token, owner, *amount))
    }

    /// Sum of every holder's balance of `token`.
    pub fn supply(&self, token: &Address) -> u128 {
        self.ledger
            .balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, amount)| *amount as u128)
            .sum()
    }

    pub fn set_rate(&mut self, rate: IFixedPoint) {
        self.rate = rate;
    }

    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn set_now(&mut self, now: i64) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now += seconds;
    }

    /// Price of one `from` unit in `to` units for a swap hop.
    pub fn set_price(&mut self, from: &Address, to: &Address, price: IFixedPoint) {
        self.ledger.prices.insert((*from, *to), price);
    }

    pub fn set_wrapper(&mut self, wrapper: SimWrapper) {
        self.wrapper = Some(wrapper);
    }

    pub fn add_pool(&mut self, pool_token: &Address, pool: SimPool) {
        self.pools.insert(*pool_token, pool);
    }

    /// Yield the wrapper owes `holder`, paid on the next claim.
    pub fn add_yield(&mut self, holder: &Address, amount: u64) {
        let pending = self.ledger.pending_yield.entry(*holder).or_default();
        *pending = pending.saturating_add(amount);
    }

    pub fn checkpoint_depth(&self) -> usize {
        self.checkpoints.len()
    }

    fn wrapper(&self) -> LendingResult<SimWrapper> {
        let wrapper: LendingResult<SimWrapper> =
            self.wrapper.ok_or_else(|| LendingError::InvalidConfig.into());
        wrapper.with_msg("no wrapper configured")
    }
}

impl ExchangeRateOracle for SimEnv {
    fn refresh_exchange_rate(&mut self) -> LendingResult<IFixedPoint> {
        if !self.rate.is_positive() {
            return Err(LendingError::InvalidExchangeRate.into());
        }
        Ok(self.rate)
    }

    fn current_rate(&self) -> IFixedPoint {
        self.rate
    }
}

impl CollateralWrapper for SimEnv {
    fn deposit(&mut self, holder: &Address, amount: u64) -> LendingResult<u64> {
        let wrapper = self.wrapper()?;
        let wrapped = wrapper
            .underlying_per_wrapped
            .div_atoms(amount, RoundingMode::RoundDown)?;
        self.ledger
            .debit(&wrapper.underlying, holder, amount)
            .ok_or(LendingError::CollateralEntryFailed)?;
        self.ledger.credit(&wrapper.wrapped, holder, wrapped)?;
        Ok(wrapped)
    }

    fn withdraw(&mut self, holder: &Address, wrapped: u64) -> LendingResult<u64> {
        let wrapper = self.wrapper()?;
        let underlying = wrapper
            .underlying_per_wrapped
            .mul_atoms(wrapped, RoundingMode::RoundDown)?;
        self.ledger
            .debit(&wrapper.wrapped, holder, wrapped)
            .ok_or(LendingError::CollateralExitFailed)?;
        self.ledger.credit(&wrapper.underlying, holder, underlying)?;
        Ok(underlying)
    }

    fn pending_yield(&self, holder: &Address) -> u64 {
        self.ledger
            .pending_yield
            .get(holder)
            .copied()
            .unwrap_or_default()
    }

    fn claim_yield(&mut self, holder: &Address) -> LendingResult<u64> {
        let wrapper = self.wrapper()?;
        let amount = self.ledger.pending_yield.remove(holder).unwrap_or_default();
        self.ledger.credit(&wrapper.reward, holder, amount)?;
        Ok(amount)
    }
}

impl SwapRouter for SimEnv {
    fn swap_exact_input(
        &mut self,
        holder: &Address,
        path: &[Address],
        amount_in: u64,
    ) -> LendingResult<u64> {
        let (Some(token_in), Some(token_out)) = (path.first(), path.last()) else {
            return Err(LendingError::PathInvalid.into());
        };
        let mut amount = amount_in;
        for hop in path.windows(2) {
            let price = self
                .ledger
                .prices
                .get(&(hop[0], hop[1]))
                .copied()
                .ok_or(LendingError::SwapFailed)?;
            amount = price.mul_atoms(amount, RoundingMode::RoundDown)?;
        }
        self.ledger
            .debit(token_in, holder, amount_in)
            .ok_or(LendingError::SwapFailed)?;
        self.ledger.credit(token_out, holder, amount)?;
        tracing::debug!("Swapped {} for {} along {} hops", amount_in, amount, path.len() - 1);
        Ok(amount)
    }

    fn remove_liquidity(
        &mut self,
        holder: &Address,
        pool_token: &Address,
        amount: u64,
    ) -> LendingResult<(u64, u64)> {
        let pool = self
            .pools
            .get(pool_token)
            .copied()
            .ok_or(LendingError::SwapFailed)?;
        self.ledger
            .debit(pool_token, holder, amount)
            .ok_or(LendingError::SwapFailed)?;
        let first = pool.first_per_token.mul_atoms(amount, RoundingMode::RoundDown)?;
        let second = pool.second_per_token.mul_atoms(amount, RoundingMode::RoundDown)?;
        self.ledger.credit(&pool.first, holder, first)?;
        self.ledger.credit(&pool.second, holder, second)?;
        Ok((first, second))
    }
}

impl ValueTransfer for SimEnv {
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> LendingResult {
        self.ledger
            .debit(token, from, amount)
            .ok_or(LendingError::TransferFailed)?;
        self.ledger.credit(token, to, amount)
    }
}

impl Transactional for SimEnv {
    fn checkpoint(&mut self) {
        self.checkpoints.push(self.ledger.clone());
    }

    fn commit(&mut self) {
        self.checkpoints.pop();
    }

    fn rollback(&mut self) {
        if let Some(ledger) = self.checkpoints.pop() {
            self.ledger = ledger;
        }
    }
}

impl MarketEnv for SimEnv {
    fn unix_timestamp(&self) -> i64 {
        self.now
    }
}
