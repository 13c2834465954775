use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::{LendingError, LendingResult},
    math::{ifixed_point::IFixedPoint, rounding::RoundingMode, safe_math::SafeMath},
};

/// Price of one collateral unit expressed in debt asset units.
///
/// Always strictly positive, a zero or negative oracle answer never makes it
/// into the market state.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ExchangeRate(IFixedPoint);

impl ExchangeRate {
    #[track_caller]
    pub fn try_new(rate: IFixedPoint) -> LendingResult<Self> {
        if !rate.is_positive() {
            return Err(LendingError::InvalidExchangeRate.into());
        }
        Ok(ExchangeRate(rate))
    }

    pub fn rate(&self) -> IFixedPoint {
        self.0
    }

    pub fn collateral_value(&self, collateral_atoms: u64) -> LendingResult<IFixedPoint> {
        IFixedPoint::from_u64(collateral_atoms).safe_mul(self.0)
    }

    /// Collateral units worth `debt_atoms` of the debt asset.
    pub fn collateral_atoms(&self, debt_atoms: u64, rounding: RoundingMode) -> LendingResult<u64> {
        self.0.div_atoms(debt_atoms, rounding)
    }
}
