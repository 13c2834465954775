use super::math::ifixed_point::IFixedPoint;

pub const DAYS_PER_YEAR: u64 = 365;
pub const SECOND_PER_HOUR: u64 = 60 * 60;
pub const SECONDS_PER_DAY: u64 = 24 * SECOND_PER_HOUR;
pub const SECONDS_PER_YEAR: u64 = DAYS_PER_YEAR * SECONDS_PER_DAY;

/// `InterestRatePerSecond` scale, `RATE_SCALE` is 100% per second.
pub const RATE_SCALE: u64 = 1_000_000_000_000_000_000;

pub const MAX_LTV: IFixedPoint = IFixedPoint::lit("0.9");
pub const MAX_LIQUIDATION_FEE: IFixedPoint = IFixedPoint::lit("0.15");
pub const MAX_BORROW_OPENING_FEE: IFixedPoint = IFixedPoint::lit("0.05");
