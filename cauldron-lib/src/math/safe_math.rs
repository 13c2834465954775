use crate::{
    error::{LendingError, LendingResult},
    map_context,
    math::{ifixed_point::IFixedPoint, rounding::RoundingMode},
    with_context,
};

pub trait SafeMath<Other = Self, Output = Self>: Sized {
    #[track_caller]
    fn safe_add(self, other: Other) -> LendingResult<Output>;
    #[track_caller]
    fn safe_sub(self, other: Other) -> LendingResult<Output>;
    #[track_caller]
    fn safe_mul(self, other: Other) -> LendingResult<Output>;
    #[track_caller]
    fn safe_div(self, other: Other) -> LendingResult<Output>;
}

impl SafeMath for u64 {
    fn safe_add(self, other: Self) -> LendingResult<Self> {
        self.checked_add(other)
            .ok_or_else(with_context!(LendingError::AdditionOverflow))
    }

    fn safe_sub(self, other: Self) -> LendingResult<Self> {
        self.checked_sub(other)
            .ok_or_else(with_context!(LendingError::SubtractionOverflow))
    }

    fn safe_mul(self, other: Self) -> LendingResult<Self> {
        self.checked_mul(other)
            .ok_or_else(with_context!(LendingError::MultiplicationOverflow))
    }

    fn safe_div(self, other: Self) -> LendingResult<Self> {
        self.checked_div(other)
            .ok_or_else(with_context!(LendingError::DivisionByZero))
    }
}

impl SafeMath<IFixedPoint, IFixedPoint> for u64 {
    fn safe_add(self, other: IFixedPoint) -> LendingResult<IFixedPoint> {
        IFixedPoint::from_u64(self)
            .safe_add(other)
            .map_err(map_context!(LendingError::AdditionOverflow))
    }

    fn safe_sub(self, other: IFixedPoint) -> LendingResult<IFixedPoint> {
        IFixedPoint::from_u64(self)
            .safe_sub(other)
            .map_err(map_context!(LendingError::SubtractionOverflow))
    }

    fn safe_mul(self, other: IFixedPoint) -> LendingResult<IFixedPoint> {
        IFixedPoint::from_u64(self)
            .safe_mul(other)
            .map_err(map_context!(LendingError::MultiplicationOverflow))
    }

    fn safe_div(self, other: IFixedPoint) -> LendingResult<IFixedPoint> {
        IFixedPoint::from_u64(self)
            .safe_div(other)
            .map_err(map_context!(LendingError::DivisionOverflow))
    }
}

/// `value * mul / div` with a 128 bit intermediate.
#[track_caller]
pub fn mul_div(value: u64, mul: u64, div: u64, rounding: RoundingMode) -> LendingResult<u64> {
    if div == 0 {
        return Err(LendingError::DivisionByZero.into());
    }
    let product = (value as u128) * (mul as u128);
    let result = rounding
        .div_u128(product, div as u128)
        .ok_or_else(with_context!(LendingError::DivisionOverflow))?;
    u64::try_from(result).map_err(map_context!(LendingError::CastOverflow))
}
