use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::{LendingError, LendingResult, LendingResultExt},
    math::{rounding::RoundingMode, safe_math::mul_div},
};

use super::safe_math::SafeMath;

/// A pool tracked in two units: `base` shares and the `elastic` value they
/// represent. Interest grows `elastic` without touching `base`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RebasePool {
    base: u64,
    elastic: u64,
}

impl RebasePool {
    pub const fn new(base: u64, elastic: u64) -> Self {
        RebasePool { base, elastic }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn elastic(&self) -> u64 {
        self.elastic
    }

    pub fn is_empty(&self) -> bool {
        self.base == 0
    }

    /// Converts a value amount to shares. 1:1 while the pool holds no value.
    #[track_caller]
    pub fn to_base(&self, elastic: u64, rounding: RoundingMode) -> LendingResult<u64> {
        if self.elastic == 0 {
            return Ok(elastic);
        }
        mul_div(elastic, self.base, self.elastic, rounding)
    }

    /// Converts shares to a value amount. 1:1 while the pool holds no shares.
    #[track_caller]
    pub fn to_elastic(&self, base: u64, rounding: RoundingMode) -> LendingResult<u64> {
        if self.base == 0 {
            return Ok(base);
        }
        mul_div(base, self.elastic, self.base, rounding)
    }

    /// Adds `elastic` value and returns the shares minted for it.
    #[track_caller]
    pub fn add_elastic(&mut self, elastic: u64, rounding: RoundingMode) -> LendingResult<u64> {
        let base = self.to_base(elastic, rounding)?;
        self.add(base, elastic).track_caller()?;
        Ok(base)
    }

    /// Value removed from the pool along with `base` shares. The last shares
    /// take whatever value is left.
    #[track_caller]
    pub fn value_of_base(&self, base: u64, rounding: RoundingMode) -> LendingResult<u64> {
        if base == self.base {
            return Ok(self.elastic);
        }
        self.to_elastic(base, rounding)
    }

    /// Removes `base` shares and returns the value they were worth.
    /// Removing every share empties the pool exactly.
    #[track_caller]
    pub fn sub_base(&mut self, base: u64, rounding: RoundingMode) -> LendingResult<u64> {
        let elastic = self.value_of_base(base, rounding)?;
        self.sub(base, elastic).track_caller()?;
        Ok(elastic)
    }

    #[track_caller]
    pub fn add(&mut self, base: u64, elastic: u64) -> LendingResult {
        self.base = self.base.safe_add(base)?;
        self.elastic = self.elastic.safe_add(elastic)?;
        Ok(())
    }

    /// Removes an exact `(base, elastic)` pair. When the last shares leave,
    /// any value left behind by rounding goes with them.
    #[track_caller]
    pub fn sub(&mut self, base: u64, elastic: u64) -> LendingResult {
        let base_left = self
            .base
            .checked_sub(base)
            .ok_or_else(crate::with_context!(LendingError::InsufficientBalance))?;
        let elastic_left = self.elastic.saturating_sub(elastic);
        if base_left == 0 {
            *self = RebasePool::default();
        } else {
            self.base = base_left;
            self.elastic = elastic_left.max(1);
        }
        Ok(())
    }

    /// Grows the value side only. No-op on an empty pool.
    #[track_caller]
    pub fn add_interest(&mut self, elastic: u64) -> LendingResult {
        if self.is_empty() {
            return Ok(());
        }
        self.elastic = self.elastic.safe_add(elastic)?;
        Ok(())
    }
}
