use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::{
    address::Address,
    error::{LendingError, LendingResult, LendingResultExt},
    math::{safe_math::SafeMath, ufixed_point::UFixedPoint},
};

/// Total and per-depositor collateral, plus an accumulator-per-share that
/// distributes externally arriving yield pro-rata.
///
/// A depositor's pending reward is `balance * (rewards_per_share - snapshot)`,
/// where `snapshot` is the accumulator seen at their last balance change. Every
/// balance change settles the pending reward first and takes a new snapshot,
/// so rewards only ever accrue on balances actually held.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CollateralLedger {
    total_collateral: u64,
    user_collateral: BTreeMap<Address, u64>,
    rewards_per_share: UFixedPoint,
    reward_snapshot: BTreeMap<Address, UFixedPoint>,
    /// Yield that arrived while nobody held collateral
    undistributed_rewards: u64,
}

impl CollateralLedger {
    pub fn total_collateral(&self) -> u64 {
        self.total_collateral
    }

    pub fn user_collateral(&self, account: &Address) -> u64 {
        self.user_collateral
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    pub fn rewards_per_share(&self) -> UFixedPoint {
        self.rewards_per_share
    }

    pub fn undistributed_rewards(&self) -> u64 {
        self.undistributed_rewards
    }

    pub fn depositors(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.user_collateral.iter()
    }

    pub fn sum_user_collateral(&self) -> u128 {
        self.user_collateral.values().map(|x| *x as u128).sum()
    }

    /// Adds `amount` of yield to the accumulator. Held back while the ledger
    /// is empty and folded in with the next yield that has depositors.
    pub fn fold_yield(&mut self, amount: u64) -> LendingResult {
        let pot = self.undistributed_rewards.safe_add(amount)?;
        if pot == 0 {
            return Ok(());
        }
        if self.total_collateral == 0 {
            self.undistributed_rewards = pot;
            return Ok(());
        }
        let per_share = UFixedPoint::from_ratio(pot, self.total_collateral)?;
        self.rewards_per_share = self.rewards_per_share.safe_add(per_share)?;
        self.undistributed_rewards = 0;
        Ok(())
    }

    pub fn pending_reward(&self, account: &Address) -> LendingResult<u64> {
        let snapshot = self
            .reward_snapshot
            .get(account)
            .copied()
            .unwrap_or(self.rewards_per_share);
        self.rewards_per_share
            .safe_sub(snapshot)
            .with_msg("reward snapshot above accumulator")?
            .mul_amount(self.user_collateral(account))?
            .as_u64_rounded_down()
    }

    /// Settles `account`'s pending reward, returns the amount to pay out.
    pub fn claim(&mut self, account: &Address) -> LendingResult<u64> {
        let pending = self.pending_reward(account)?;
        self.set_balance(account, self.user_collateral(account))?;
        Ok(pending)
    }

    /// Credits `amount`, returns the reward settled on the previous balance.
    pub fn deposit(&mut self, account: &Address, amount: u64) -> LendingResult<u64> {
        let pending = self.pending_reward(account)?;
        let balance = self.user_collateral(account).safe_add(amount)?;
        self.total_collateral = self.total_collateral.safe_add(amount)?;
        self.set_balance(account, balance)?;
        Ok(pending)
    }

    /// Debits `amount`, returns the reward settled on the previous balance.
    pub fn withdraw(&mut self, account: &Address, amount: u64) -> LendingResult<u64> {
        let balance = self.user_collateral(account);
        if amount > balance {
            return Err(LendingError::InsufficientBalance.into())
                .with_msg("withdraw exceeds collateral");
        }
        let pending = self.pending_reward(account)?;
        self.total_collateral = self.total_collateral.safe_sub(amount)?;
        self.set_balance(account, balance - amount)?;
        Ok(pending)
    }

    fn set_balance(&mut self, account: &Address, balance: u64) -> LendingResult {
        if balance == 0 {
            self.user_collateral.remove(account);
            self.reward_snapshot.remove(account);
            return Ok(());
        }
        self.user_collateral.insert(*account, balance);
        self.reward_snapshot.insert(*account, self.rewards_per_share);
        Ok(())
    }
}
