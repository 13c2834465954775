use crate::{
    address::Address,
    error::{LendingError, LendingResult, LendingResultExt},
    state::market_config::MarketTokens,
};

/// Checks a liquidation swap path: non-empty, starting at the token sold
/// and ending at the debt token.
#[track_caller]
pub fn validate_swap_path(path: &[Address], token_in: &Address, debt: &Address) -> LendingResult {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) if first == token_in && last == debt => Ok(()),
        _ => Err(LendingError::PathInvalid.into()),
    }
}

/// A one token path naming the debt token needs no swap.
pub fn is_noop_path(path: &[Address], debt: &Address) -> bool {
    path.len() == 1 && path[0] == *debt
}

/// Validates the paths used when seized collateral is sold.
///
/// Pool token collateral is split into its two legs first, each leg needing
/// its own path.
#[track_caller]
pub fn validate_sell_paths(
    tokens: &MarketTokens,
    swap_path: &[Address],
    swap_path2: &[Address],
) -> LendingResult {
    match tokens.pool_legs() {
        Some(legs) => {
            validate_swap_path(swap_path, &legs.first, &tokens.debt).with_msg("first leg")?;
            validate_swap_path(swap_path2, &legs.second, &tokens.debt).with_msg("second leg")
        }
        None => validate_swap_path(swap_path, &tokens.sold_token(), &tokens.debt),
    }
}
