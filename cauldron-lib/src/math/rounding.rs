/// Direction used whenever a conversion cannot be exact.
///
/// Amounts owed to the market round up, amounts paid out by the market round down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    RoundDown,
    RoundUp,
}

impl RoundingMode {
    /// Rounds `num / dem` in this direction, `None` on division by zero.
    pub fn div_u128(self, num: u128, dem: u128) -> Option<u128> {
        let quotient = num.checked_div(dem)?;
        match self {
            RoundingMode::RoundDown => Some(quotient),
            RoundingMode::RoundUp if num % dem == 0 => Some(quotient),
            RoundingMode::RoundUp => quotient.checked_add(1),
        }
    }
}
