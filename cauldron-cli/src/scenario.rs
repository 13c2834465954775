use std::path::Path;

use anyhow::Context;
use cauldron_lib::{
    address::Address,
    error::LendingResult,
    event::CauldronEvent,
    interest_rate::InterestRatePerSecond,
    math::ifixed_point::IFixedPoint,
    operation::liquidation::LiquidationRequest,
    state::{market::Cauldron, market_config::MarketConfig},
    summary::client::CauldronSummary,
    testing::{open_cauldron, SimEnv, SimPool, SimWrapper},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub market: MarketConfig,
    #[serde(default)]
    pub interest_rate: InterestRatePerSecond,
    pub exchange_rate: IFixedPoint,
    #[serde(default)]
    pub start_time: i64,
    /// Debt tokens the market starts with
    #[serde(default)]
    pub liquidity: u64,
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub prices: Vec<Price>,
    #[serde(default)]
    pub wrapper: Option<Wrapper>,
    #[serde(default)]
    pub pools: Vec<Pool>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub token: Address,
    pub owner: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub token: String,
    pub owner: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub from: Address,
    pub to: Address,
    pub price: IFixedPoint,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrapper {
    pub wrapped: Address,
    pub underlying: Address,
    pub reward: Address,
    pub underlying_per_wrapped: IFixedPoint,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub pool_token: Address,
    pub first: Address,
    pub first_per_token: IFixedPoint,
    pub second: Address,
    pub second_per_token: IFixedPoint,
}

/// One scenario step: either a market operation or a change to the
/// simulated world.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Step {
    Advance {
        seconds: i64,
    },
    SetRate {
        rate: IFixedPoint,
    },
    SetPrice {
        from: Address,
        to: Address,
        price: IFixedPoint,
    },
    Mint {
        token: Address,
        owner: Address,
        amount: u64,
    },
    /// Yield the wrapper owes the market
    AddYield {
        amount: u64,
    },
    Accrue,
    UpdateExchangeRate,
    Borrow {
        borrower: Address,
        recipient: Address,
        amount: u64,
    },
    Repay {
        payer: Address,
        account: Address,
        principal: u64,
    },
    RepayAll {
        payer: Address,
        account: Address,
    },
    AddCollateral {
        payer: Address,
        beneficiary: Address,
        amount: u64,
    },
    WithdrawCollateral {
        caller: Address,
        beneficiary: Address,
        amount: u64,
        #[serde(default)]
        as_underlying: bool,
    },
    ClaimRewards {
        account: Address,
    },
    Liquidate {
        liquidator: Address,
        #[serde(flatten)]
        request: LiquidationRequest,
    },
    WithdrawFees,
    UpdateMaxLtv {
        max_ltv: IFixedPoint,
    },
    UpdateLiquidationFee {
        liquidation_fee: IFixedPoint,
    },
    SetFeeTo {
        fee_to: Address,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub failed_steps: usize,
    pub summary: CauldronSummary,
    pub balances: Vec<BalanceReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CauldronEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_logs: Vec<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    fn build_env(&self) -> SimEnv {
        let mut env = SimEnv::new(self.exchange_rate, self.start_time);
        for balance in &self.balances {
            env.mint(&balance.token, &balance.owner, balance.amount);
        }
        for price in &self.prices {
            env.set_price(&price.from, &price.to, price.price);
        }
        if let Some(wrapper) = &self.wrapper {
            env.set_wrapper(SimWrapper {
                wrapped: wrapper.wrapped,
                underlying: wrapper.underlying,
                reward: wrapper.reward,
                underlying_per_wrapped: wrapper.underlying_per_wrapped,
            });
        }
        for pool in &self.pools {
            env.add_pool(
                &pool.pool_token,
                SimPool {
                    first: pool.first,
                    first_per_token: pool.first_per_token,
                    second: pool.second,
                    second_per_token: pool.second_per_token,
                },
            );
        }
        env
    }

    pub fn run(&self, fail_fast: bool, with_events: bool) -> anyhow::Result<Report> {
        let mut env = self.build_env();
        let mut cauldron = open_cauldron(
            &mut env,
            self.market.clone(),
            self.interest_rate,
            self.liquidity,
        )
        .map_err(|err| anyhow::anyhow!("opening market: {err}"))?;
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut failed_steps = 0;
        for (index, step) in self.steps.iter().enumerate() {
            let op = step.name().to_string();
            match step.apply(&mut cauldron, &mut env) {
                Ok(result) => steps.push(StepReport {
                    index,
                    op,
                    result: Some(result),
                    error: None,
                }),
                Err(err) => {
                    tracing::warn!("Step {} ({}) failed: {:?}", index, op, err.error);
                    failed_steps += 1;
                    steps.push(StepReport {
                        index,
                        op,
                        result: None,
                        error: Some(format!("{:?}", err.error)),
                    });
                    if fail_fast {
                        break;
                    }
                }
            }
        }
        let summary = cauldron
            .summary()
            .map_err(|err| anyhow::anyhow!("summarizing market: {err}"))?;
        let balances = env
            .balances()
            .map(|(token, owner, amount)| BalanceReport {
                token: display_name(token),
                owner: display_name(owner),
                amount,
            })
            .collect();
        let (events, event_logs) = if with_events {
            (cauldron.events().to_vec(), cauldron.event_logs())
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(Report {
            steps,
            failed_steps,
            summary,
            balances,
            events,
            event_logs,
        })
    }
}

fn display_name(address: &Address) -> String {
    address
        .label()
        .map(str::to_string)
        .unwrap_or_else(|| address.to_string())
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Advance { .. } => "advance",
            Step::SetRate { .. } => "setRate",
            Step::SetPrice { .. } => "setPrice",
            Step::Mint { .. } => "mint",
            Step::AddYield { .. } => "addYield",
            Step::Accrue => "accrue",
            Step::UpdateExchangeRate => "updateExchangeRate",
            Step::Borrow { .. } => "borrow",
            Step::Repay { .. } => "repay",
            Step::RepayAll { .. } => "repayAll",
            Step::AddCollateral { .. } => "addCollateral",
            Step::WithdrawCollateral { .. } => "withdrawCollateral",
            Step::ClaimRewards { .. } => "claimRewards",
            Step::Liquidate { .. } => "liquidate",
            Step::WithdrawFees => "withdrawFees",
            Step::UpdateMaxLtv { .. } => "updateMaxLtv",
            Step::UpdateLiquidationFee { .. } => "updateLiquidationFee",
            Step::SetFeeTo { .. } => "setFeeTo",
        }
    }

    pub fn apply(&self, cauldron: &mut Cauldron, env: &mut SimEnv) -> LendingResult<Value> {
        let result = match self {
            Step::Advance { seconds } => {
                env.advance(*seconds);
                json!({ "now": env.now() })
            }
            Step::SetRate { rate } => {
                env.set_rate(*rate);
                Value::Null
            }
            Step::SetPrice { from, to, price } => {
                env.set_price(from, to, *price);
                Value::Null
            }
            Step::Mint {
                token,
                owner,
                amount,
            } => {
                env.mint(token, owner, *amount);
                Value::Null
            }
            Step::AddYield { amount } => {
                env.add_yield(&cauldron.address(), *amount);
                Value::Null
            }
            Step::Accrue => json!({ "interest": cauldron.accrue(env)? }),
            Step::UpdateExchangeRate => {
                json!({ "rate": cauldron.update_exchange_rate(env)?.to_string() })
            }
            Step::Borrow {
                borrower,
                recipient,
                amount,
            } => json!({ "base": cauldron.borrow(env, borrower, recipient, *amount)? }),
            Step::Repay {
                payer,
                account,
                principal,
            } => json!({ "amount": cauldron.repay(env, payer, account, *principal)? }),
            Step::RepayAll { payer, account } => {
                json!({ "amount": cauldron.repay_all(env, payer, account)? })
            }
            Step::AddCollateral {
                payer,
                beneficiary,
                amount,
            } => json!({ "credited": cauldron.add_collateral(env, payer, beneficiary, *amount)? }),
            Step::WithdrawCollateral {
                caller,
                beneficiary,
                amount,
                as_underlying,
            } => json!({
                "sent": cauldron.withdraw_collateral(env, caller, beneficiary, *amount, *as_underlying)?
            }),
            Step::ClaimRewards { account } => {
                json!({ "reward": cauldron.claim_rewards(env, account)? })
            }
            Step::Liquidate {
                liquidator,
                request,
            } => {
                let outcome = cauldron.liquidate(env, liquidator, request)?;
                json!({
                    "accountsLiquidated": outcome.totals.accounts_liquidated,
                    "skippedAsDust": outcome.totals.skipped_as_dust,
                    "principal": outcome.totals.principal,
                    "debtRepaid": outcome.totals.debt_repaid,
                    "collateralSeized": outcome.totals.collateral_seized,
                    "swapOutput": outcome.swap_output,
                    "topUp": outcome.settlement.top_up,
                    "protocolCut": outcome.settlement.protocol_cut,
                    "toRecipient": outcome.settlement.to_recipient,
                })
            }
            Step::WithdrawFees => json!({ "amount": cauldron.withdraw_fees(env)? }),
            Step::UpdateMaxLtv { max_ltv } => {
                cauldron.update_max_ltv(*max_ltv)?;
                Value::Null
            }
            Step::UpdateLiquidationFee { liquidation_fee } => {
                cauldron.update_liquidation_fee(*liquidation_fee)?;
                Value::Null
            }
            Step::SetFeeTo { fee_to } => {
                cauldron.set_fee_to(*fee_to)?;
                Value::Null
            }
        };
        Ok(result)
    }
}
