use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    constant::{RATE_SCALE, SECONDS_PER_YEAR},
    error::{LendingError, LendingResult},
    math::bps::ONE_IN_BPS,
    with_context,
};

/// Simple interest rate per second, scaled by `RATE_SCALE`.
#[repr(transparent)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    BorshSerialize,
    BorshDeserialize,
)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct InterestRatePerSecond(pub u64);

impl InterestRatePerSecond {
    pub const ZERO: Self = InterestRatePerSecond(0);

    pub const fn new(scaled_rate: u64) -> Self {
        InterestRatePerSecond(scaled_rate)
    }

    /// Rate giving `apr_in_bps` of simple interest over a year.
    pub const fn from_apr_bps(apr_in_bps: u64) -> Self {
        let per_year = (apr_in_bps as u128) * (RATE_SCALE as u128) / (ONE_IN_BPS as u128);
        InterestRatePerSecond((per_year / SECONDS_PER_YEAR as u128) as u64)
    }

    pub fn approximate_apr(&self) -> f64 {
        self.0 as f64 * SECONDS_PER_YEAR as f64 / RATE_SCALE as f64
    }

    /// Interest owed by `principal` over `elapsed_seconds`, rounded down.
    #[track_caller]
    pub fn interest(&self, principal: u64, elapsed_seconds: u64) -> LendingResult<u64> {
        let scaled = (principal as u128)
            .checked_mul(self.0 as u128)
            .and_then(|x| x.checked_mul(elapsed_seconds as u128))
            .ok_or_else(with_context!(LendingError::MathOverflow))?;
        u64::try_from(scaled / RATE_SCALE as u128)
            .map_err(crate::map_context!(LendingError::CastOverflow))
    }
}
