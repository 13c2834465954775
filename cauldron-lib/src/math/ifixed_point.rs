use std::ops::Neg;

use fixed::types::I80F48;

use crate::{
    error::{ErrorWithContext, LendingError, LendingResult},
    map_context,
    math::{rounding::RoundingMode, ufixed_point::UFixedPoint},
    with_context,
};

use super::safe_math::SafeMath;

crate::define_fixed_point!(IFixedPoint, I80F48, i128);

impl IFixedPoint {
    pub const fn from_i64(num: i64) -> Self {
        IFixedPoint(I80F48::from_bits((num as i128) << I80F48::FRAC_NBITS))
    }

    pub const fn from_i64_u64_ratio(num: i64, dem: u64) -> Self {
        let bits = ((num as i128) << I80F48::FRAC_NBITS) / (dem as i128);
        IFixedPoint(I80F48::from_bits(bits))
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn from_ufixed(value: UFixedPoint) -> Option<Self> {
        Self::from_num_checked(value.to_fixed())
    }

    /// `amount * self`, converted back to atoms in the requested direction.
    #[track_caller]
    pub fn mul_atoms(self, amount: u64, rounding: RoundingMode) -> LendingResult<u64> {
        Self::from_u64(amount)
            .safe_mul(self)?
            .as_u64_rounded(rounding)
    }

    /// `amount / self`, converted back to atoms in the requested direction.
    #[track_caller]
    pub fn div_atoms(self, amount: u64, rounding: RoundingMode) -> LendingResult<u64> {
        if !self.is_positive() {
            return Err(LendingError::DivisionByZero.into());
        }
        Self::from_u64(amount)
            .safe_div(self)?
            .as_u64_rounded(rounding)
    }
}

impl Neg for IFixedPoint {
    type Output = Self;

    fn neg(self) -> Self::Output {
        IFixedPoint(-self.0)
    }
}

impl TryFrom<UFixedPoint> for IFixedPoint {
    type Error = ErrorWithContext<LendingError>;

    #[track_caller]
    fn try_from(value: UFixedPoint) -> Result<Self, Self::Error> {
        Self::from_ufixed(value).ok_or_else(with_context!(LendingError::CastOverflow))
    }
}

impl SafeMath<UFixedPoint, IFixedPoint> for IFixedPoint {
    #[track_caller]
    fn safe_add(self, other: UFixedPoint) -> LendingResult<Self> {
        let other =
            Self::from_ufixed(other).ok_or_else(with_context!(LendingError::CastOverflow))?;
        self.safe_add(other)
            .map_err(map_context!(LendingError::AdditionOverflow))
    }

    #[track_caller]
    fn safe_sub(self, other: UFixedPoint) -> LendingResult<Self> {
        let other =
            Self::from_ufixed(other).ok_or_else(with_context!(LendingError::CastOverflow))?;
        self.safe_sub(other)
            .map_err(map_context!(LendingError::SubtractionOverflow))
    }

    #[track_caller]
    fn safe_mul(self, other: UFixedPoint) -> LendingResult<Self> {
        let other =
            Self::from_ufixed(other).ok_or_else(with_context!(LendingError::CastOverflow))?;
        self.safe_mul(other)
            .map_err(map_context!(LendingError::MultiplicationOverflow))
    }

    #[track_caller]
    fn safe_div(self, other: UFixedPoint) -> LendingResult<Self> {
        let other =
            Self::from_ufixed(other).ok_or_else(with_context!(LendingError::CastOverflow))?;
        self.safe_div(other)
            .map_err(map_context!(LendingError::DivisionOverflow))
    }
}
