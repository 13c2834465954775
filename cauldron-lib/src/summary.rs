#[cfg(feature = "client")]
pub mod client {
    use crate::{error::LendingResult, state::market::Cauldron};

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CauldronSummary {
        pub market: String,
        pub collateral_token: String,
        pub debt_token: String,
        pub exchange_rate: f64,
        pub total_borrow: u64,
        pub total_borrow_base: u64,
        pub total_collateral: u64,
        pub total_collateral_value: f64,
        pub fees_earned: u64,
        pub undistributed_rewards: u64,
        pub last_accrued: i64,
        pub borrowers: Vec<BorrowerSummary>,
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BorrowerSummary {
        pub account: String,
        pub base: u64,
        pub debt: u64,
        pub collateral: u64,
        pub collateral_value: f64,
        pub pending_reward: u64,
        pub ltv: f64,
        pub solvent: bool,
    }

    impl Cauldron {
        pub fn summary(&self) -> LendingResult<CauldronSummary> {
            let accounts = self
                .debt_ledger()
                .borrowers()
                .map(|(account, _)| *account)
                .chain(self.collateral_ledger().depositors().map(|(account, _)| *account))
                .collect::<std::collections::BTreeSet<_>>();
            let borrowers = accounts
                .iter()
                .map(|account| self.borrower_summary(account))
                .collect::<LendingResult<Vec<_>>>()?;
            let tokens = self.config().tokens();
            Ok(CauldronSummary {
                market: self.address().to_string(),
                collateral_token: tokens.collateral.to_string(),
                debt_token: tokens.debt.to_string(),
                exchange_rate: self.exchange_rate().to_float(),
                total_borrow: self.total_loan().elastic(),
                total_borrow_base: self.total_loan().base(),
                total_collateral: self.total_collateral(),
                total_collateral_value: self.total_collateral() as f64
                    * self.exchange_rate().to_float(),
                fees_earned: self.fees_earned(),
                undistributed_rewards: self.collateral_ledger().undistributed_rewards(),
                last_accrued: self.debt_ledger().last_accrued(),
                borrowers,
            })
        }

        pub fn borrower_summary(
            &self,
            account: &crate::address::Address,
        ) -> LendingResult<BorrowerSummary> {
            let health = self.position_health(account)?;
            Ok(BorrowerSummary {
                account: account.to_string(),
                base: self.user_loan(account),
                debt: health.debt_atoms,
                collateral: health.collateral_atoms,
                collateral_value: health.collateral_value.to_float(),
                pending_reward: self.pending_reward(account)?,
                ltv: health.ltv.to_float(),
                solvent: health.is_solvent(self.config().max_ltv())?,
            })
        }
    }
}
