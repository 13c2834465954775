use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    address::Address,
    error::{LendingError, LendingResult},
    math::{
        bps::bps_of, ifixed_point::IFixedPoint, rebase::RebasePool, rounding::RoundingMode,
        safe_math::SafeMath,
    },
    oracle::ExchangeRate,
    state::market_config::{DustScope, LiquidationDustPolicy},
};

/// A batch liquidation: `principals[i]` base shares of `accounts[i]`'s loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct LiquidationRequest {
    pub accounts: Vec<Address>,
    pub principals: Vec<u64>,
    /// Receives the seized collateral, or the swap surplus when selling
    pub recipient: Address,
    #[cfg_attr(feature = "client", serde(default))]
    pub sell_collateral: bool,
    #[cfg_attr(feature = "client", serde(default))]
    pub swap_path: Vec<Address>,
    /// Second leg path for pool token collateral
    #[cfg_attr(feature = "client", serde(default))]
    pub swap_path2: Vec<Address>,
    #[cfg_attr(feature = "client", serde(default))]
    pub as_underlying: bool,
    /// Largest shortfall the liquidator agrees to cover when a swap comes short
    #[cfg_attr(feature = "client", serde(default))]
    pub max_top_up: u64,
}

impl LiquidationRequest {
    pub fn new(accounts: Vec<Address>, principals: Vec<u64>, recipient: Address) -> Self {
        LiquidationRequest {
            accounts,
            principals,
            recipient,
            ..Default::default()
        }
    }

    pub fn selling(mut self, swap_path: Vec<Address>, swap_path2: Vec<Address>) -> Self {
        self.sell_collateral = true;
        self.swap_path = swap_path;
        self.swap_path2 = swap_path2;
        self
    }

    pub fn with_max_top_up(mut self, max_top_up: u64) -> Self {
        self.max_top_up = max_top_up;
        self
    }

    pub fn as_underlying(mut self) -> Self {
        self.as_underlying = true;
        self
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountLiquidation {
    /// Base shares removed from the loan
    pub principal: u64,
    /// Debt asset owed for `principal`, rounded up
    pub debt_repaid: u64,
    /// Liquidation fee in debt asset units
    pub fee: u64,
    pub collateral_seized: u64,
    /// Part of `collateral_seized` paying the fee rather than the debt
    pub fee_collateral: u64,
    pub closes_loan: bool,
}

/// Quotes the liquidation of `requested` base shares of a loan.
///
/// Seized collateral is `(debt_repaid + fee) / exchange_rate` rounded down. When
/// that exceeds the collateral held, the whole loan is liquidated against all
/// the collateral.
pub fn compute_account_liquidation(
    total_loan: &RebasePool,
    user_base: u64,
    user_collateral: u64,
    exchange_rate: &ExchangeRate,
    liquidation_fee: IFixedPoint,
    requested: u64,
) -> LendingResult<AccountLiquidation> {
    let quote = |principal: u64| -> LendingResult<(u64, u64, u64)> {
        let debt_repaid = total_loan.value_of_base(principal, RoundingMode::RoundUp)?;
        let fee = liquidation_fee.mul_atoms(debt_repaid, RoundingMode::RoundDown)?;
        let seized =
            exchange_rate.collateral_atoms(debt_repaid.safe_add(fee)?, RoundingMode::RoundDown)?;
        Ok((debt_repaid, fee, seized))
    };
    let mut principal = requested.min(user_base);
    let (mut debt_repaid, mut fee, mut seized) = quote(principal)?;
    if seized > user_collateral {
        principal = user_base;
        (debt_repaid, fee, _) = quote(principal)?;
        seized = user_collateral;
    }
    let debt_collateral = exchange_rate.collateral_atoms(debt_repaid, RoundingMode::RoundUp)?;
    Ok(AccountLiquidation {
        principal,
        debt_repaid,
        fee,
        collateral_seized: seized,
        fee_collateral: seized.saturating_sub(debt_collateral),
        closes_loan: principal == user_base,
    })
}

/// Running aggregate of a liquidation batch.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationTotals {
    pub principal: u64,
    pub debt_repaid: u64,
    pub fee: u64,
    pub collateral_seized: u64,
    pub fee_collateral: u64,
    pub accounts_liquidated: u32,
    /// Liquidated accounts whose loan stays open
    pub loans_left_open: u32,
    pub skipped_as_dust: u32,
}

impl LiquidationTotals {
    pub fn add(mut self, liquidation: &AccountLiquidation) -> LendingResult<Self> {
        self.principal = self.principal.safe_add(liquidation.principal)?;
        self.debt_repaid = self.debt_repaid.safe_add(liquidation.debt_repaid)?;
        self.fee = self.fee.safe_add(liquidation.fee)?;
        self.collateral_seized = self
            .collateral_seized
            .safe_add(liquidation.collateral_seized)?;
        self.fee_collateral = self.fee_collateral.safe_add(liquidation.fee_collateral)?;
        self.accounts_liquidated += 1;
        if !liquidation.closes_loan {
            self.loans_left_open += 1;
        }
        Ok(self)
    }

    pub fn skip_dust(mut self) -> Self {
        self.skipped_as_dust += 1;
        self
    }

    /// Fails a batch that liquidated nothing, or too little for an aggregate
    /// dust policy.
    #[track_caller]
    pub fn check_outcome(&self, policy: &LiquidationDustPolicy) -> LendingResult {
        if self.accounts_liquidated == 0 {
            if self.skipped_as_dust > 0 {
                return Err(LendingError::PrincipalTooLow.into());
            }
            return Err(LendingError::NoLiquidation.into());
        }
        if policy.scope == DustScope::Aggregate
            && policy.is_dust(self.principal, self.loans_left_open == 0)
        {
            return Err(LendingError::PrincipalTooLow.into());
        }
        Ok(())
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub protocol_cut: u64,
    pub to_recipient: u64,
    /// Debt asset pulled from the liquidator on top of the swap output
    pub top_up: u64,
}

/// Splits seized collateral between `fee_to` and the recipient. Only the fee
/// part of the collateral is shared with the protocol.
pub fn settle_collateral(totals: &LiquidationTotals, protocol_share_in_bps: u16) -> LendingResult<Settlement> {
    let protocol_cut = bps_of(
        totals.fee_collateral,
        protocol_share_in_bps as u32,
        RoundingMode::RoundDown,
    )?;
    Ok(Settlement {
        protocol_cut,
        to_recipient: totals.collateral_seized.safe_sub(protocol_cut)?,
        top_up: 0,
    })
}

/// Splits the debt asset received from selling the collateral.
///
/// A shortfall is pulled from the liquidator up to `max_top_up`. The protocol
/// takes its share of the surplus, capped at the fee value.
#[track_caller]
pub fn settle_swap_output(
    totals: &LiquidationTotals,
    swap_output: u64,
    max_top_up: u64,
    protocol_share_in_bps: u16,
) -> LendingResult<Settlement> {
    let top_up = totals.debt_repaid.saturating_sub(swap_output);
    if top_up > max_top_up {
        return Err(LendingError::SwapFailed.into());
    }
    let surplus = swap_output.saturating_sub(totals.debt_repaid);
    let protocol_cut = bps_of(
        surplus.min(totals.fee),
        protocol_share_in_bps as u32,
        RoundingMode::RoundDown,
    )?;
    Ok(Settlement {
        protocol_cut,
        to_recipient: surplus - protocol_cut,
        top_up,
    })
}
