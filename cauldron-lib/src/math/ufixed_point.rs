use fixed::types::U64F64;

use crate::{
    error::{ErrorWithContext, LendingError, LendingResult},
    math::{ifixed_point::IFixedPoint, safe_math::SafeMath},
    with_context,
};

crate::define_fixed_point!(UFixedPoint, U64F64, u128);

impl UFixedPoint {
    pub const fn from_u64_u64_ratio(num: u64, dem: u64) -> Self {
        let bits = ((num as u128) << Self::FRAC_NBITS) / (dem as u128);
        UFixedPoint(U64F64::from_bits(bits))
    }

    pub fn from_ifixed(value: IFixedPoint) -> Option<Self> {
        Self::from_num_checked(value.to_fixed())
    }

    /// `amount * self` as a fixed point.
    #[track_caller]
    pub fn mul_amount(self, amount: u64) -> LendingResult<Self> {
        self.safe_mul(amount)
    }
}

impl TryFrom<IFixedPoint> for UFixedPoint {
    type Error = ErrorWithContext<LendingError>;

    #[track_caller]
    fn try_from(value: IFixedPoint) -> Result<Self, Self::Error> {
        Self::from_ifixed(value).ok_or_else(with_context!(LendingError::CastOverflow))
    }
}
