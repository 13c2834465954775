use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    address::Address,
    error::{LendingError, LendingResult, LendingResultExt},
    interest_rate::InterestRatePerSecond,
    math::{
        ifixed_point::IFixedPoint, rebase::RebasePool, rounding::RoundingMode,
        safe_math::SafeMath,
    },
};

/// Total and per-borrower debt. Borrowers hold `base` shares of a pool
/// whose `elastic` side grows with interest.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DebtLedger {
    interest_rate: InterestRatePerSecond,
    last_accrued: i64,
    /// Interest and opening fees not yet withdrawn
    fees_earned: u64,
    total_loan: RebasePool,
    /// Base shares per borrower, entries at zero are removed
    user_loan: BTreeMap<Address, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub interest: u64,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowReceipt {
    /// Debt recorded, amount plus opening fee
    pub debt: u64,
    pub opening_fee: u64,
    pub base: u64,
}

impl DebtLedger {
    pub fn new(interest_rate: InterestRatePerSecond, unix_timestamp: i64) -> Self {
        DebtLedger {
            interest_rate,
            last_accrued: unix_timestamp,
            ..Default::default()
        }
    }

    pub fn interest_rate(&self) -> InterestRatePerSecond {
        self.interest_rate
    }

    pub fn last_accrued(&self) -> i64 {
        self.last_accrued
    }

    pub fn fees_earned(&self) -> u64 {
        self.fees_earned
    }

    pub fn total_loan(&self) -> &RebasePool {
        &self.total_loan
    }

    pub fn user_loan(&self, account: &Address) -> u64 {
        self.user_loan.get(account).copied().unwrap_or_default()
    }

    pub fn borrowers(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.user_loan.iter()
    }

    pub fn sum_user_loans(&self) -> u128 {
        self.user_loan.values().map(|x| *x as u128).sum()
    }

    /// Debt owed by `account` in debt asset units, rounded up.
    pub fn user_debt(&self, account: &Address) -> LendingResult<u64> {
        self.total_loan
            .to_elastic(self.user_loan(account), RoundingMode::RoundUp)
    }

    /// Applies simple interest since the last accrual. The clock never moves
    /// backwards and an empty pool accrues nothing.
    pub fn accrue(&mut self, unix_timestamp: i64) -> LendingResult<Option<Accrual>> {
        let elapsed = unix_timestamp.saturating_sub(self.last_accrued);
        if elapsed <= 0 {
            return Ok(None);
        }
        self.last_accrued = unix_timestamp;
        if self.total_loan.is_empty() {
            return Ok(None);
        }
        let elapsed_seconds = elapsed as u64;
        let interest = self
            .interest_rate
            .interest(self.total_loan.elastic(), elapsed_seconds)
            .track_caller()?;
        self.total_loan.add_interest(interest)?;
        self.fees_earned = self.fees_earned.safe_add(interest)?;
        Ok(Some(Accrual {
            interest,
            elapsed_seconds,
        }))
    }

    /// Records `amount` plus the opening fee as debt of `borrower`.
    pub fn borrow(
        &mut self,
        borrower: &Address,
        amount: u64,
        opening_fee: IFixedPoint,
    ) -> LendingResult<BorrowReceipt> {
        let fee = opening_fee.mul_atoms(amount, RoundingMode::RoundUp)?;
        let debt = amount.safe_add(fee)?;
        let base = self
            .total_loan
            .add_elastic(debt, RoundingMode::RoundUp)
            .track_caller()?;
        let user_loan = self.user_loan.entry(*borrower).or_default();
        *user_loan = user_loan.safe_add(base)?;
        self.fees_earned = self.fees_earned.safe_add(fee)?;
        Ok(BorrowReceipt {
            debt,
            opening_fee: fee,
            base,
        })
    }

    /// Removes `base` shares of `account`'s loan, returns the debt asset owed
    /// for them, rounded up.
    pub fn repay(&mut self, account: &Address, base: u64) -> LendingResult<u64> {
        let user_loan = self.user_loan(account);
        if base > user_loan {
            return Err(LendingError::InsufficientBalance.into()).with_msg("repay exceeds loan");
        }
        let owed = self
            .total_loan
            .sub_base(base, RoundingMode::RoundUp)
            .track_caller()?;
        self.set_user_loan(account, user_loan - base);
        Ok(owed)
    }

    /// Takes every accrued fee out of the ledger.
    pub fn take_fees(&mut self) -> u64 {
        std::mem::take(&mut self.fees_earned)
    }

    fn set_user_loan(&mut self, account: &Address, base: u64) {
        if base == 0 {
            self.user_loan.remove(account);
        } else {
            self.user_loan.insert(*account, base);
        }
    }
}
