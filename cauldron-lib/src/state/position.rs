use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    error::LendingResult,
    math::{ifixed_point::IFixedPoint, safe_math::SafeMath},
    oracle::ExchangeRate,
};

/// Snapshot of a borrower's position, debt valued in debt asset units.
#[derive(Default, Debug, Clone, Copy, BorshSerialize, BorshDeserialize, PartialEq, Eq)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PositionHealth {
    pub ltv: IFixedPoint,
    pub debt_atoms: u64,
    pub collateral_atoms: u64,
    pub debt_value: IFixedPoint,
    pub collateral_value: IFixedPoint,
}

impl PositionHealth {
    pub fn new(
        debt_atoms: u64,
        collateral_atoms: u64,
        exchange_rate: &ExchangeRate,
    ) -> LendingResult<Self> {
        let debt_value = IFixedPoint::from_u64(debt_atoms);
        let collateral_value = exchange_rate.collateral_value(collateral_atoms)?;
        let ltv = if debt_atoms == 0 {
            IFixedPoint::zero()
        } else if collateral_value.is_zero() {
            IFixedPoint::MAX
        } else {
            debt_value.safe_div(collateral_value)?
        };
        Ok(PositionHealth {
            ltv,
            debt_atoms,
            collateral_atoms,
            debt_value,
            collateral_value,
        })
    }

    /// Solvent iff `collateral_value * max_ltv >= debt`. No debt is always solvent.
    pub fn is_solvent(&self, max_ltv: IFixedPoint) -> LendingResult<bool> {
        if self.debt_atoms == 0 {
            return Ok(true);
        }
        Ok(self.collateral_value.safe_mul(max_ltv)? >= self.debt_value)
    }
}
