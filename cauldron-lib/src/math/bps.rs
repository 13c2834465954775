use crate::{
    error::LendingResult,
    math::{rounding::RoundingMode, safe_math::mul_div, ufixed_point::UFixedPoint},
};

pub const ONE_IN_BPS: u32 = 10_000;

pub const fn percent_to_bps(percent: u64) -> u64 {
    percent * 100
}

pub const fn bps_to_fixed_point(bps: u64) -> UFixedPoint {
    UFixedPoint::from_u64_u64_ratio(bps as _, ONE_IN_BPS as _)
}

/// Share of `amount` worth `bps` basis points.
#[track_caller]
pub fn bps_of(amount: u64, bps: u32, rounding: RoundingMode) -> LendingResult<u64> {
    mul_div(amount, bps as u64, ONE_IN_BPS as u64, rounding)
}
