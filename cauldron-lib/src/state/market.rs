use borsh::{BorshDeserialize, BorshSerialize};
use itertools::Itertools;

use crate::{
    address::Address,
    env::MarketEnv,
    error::{LendingError, LendingResult, LendingResultExt},
    event::{
        AccrueEvent, BorrowEvent, CauldronEvent, CauldronEvents, CollateralEvent,
        ConfigUpdatedEvent, ExchangeRateEvent, LiquidateEvent, LiquidationSettledEvent,
        RepayEvent, RewardEvent, WithdrawFeesEvent,
    },
    interest_rate::InterestRatePerSecond,
    math::{ifixed_point::IFixedPoint, rebase::RebasePool, safe_math::SafeMath},
    operation::liquidation::{
        compute_account_liquidation, settle_collateral, settle_swap_output, LiquidationRequest,
        LiquidationTotals, Settlement,
    },
    oracle::ExchangeRate,
    state::market_config::DustScope,
    swap::{is_noop_path, validate_sell_paths},
};

use super::{
    collateral_ledger::CollateralLedger, debt_ledger::DebtLedger, market_config::MarketConfig,
    position::PositionHealth,
};

/// Everything a market persists. Serializable with borsh, and with serde
/// under the `client` feature.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
#[cfg_attr(
    feature = "client",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CauldronState {
    pub config: MarketConfig,
    pub exchange_rate: ExchangeRate,
    pub debt: DebtLedger,
    pub collateral: CollateralLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationOutcome {
    pub totals: LiquidationTotals,
    pub settlement: Settlement,
    /// Debt asset received from selling the collateral, zero when not selling
    pub swap_output: u64,
}

/// A lending market: one collateral asset, one debt asset.
///
/// Every state-mutating operation is all-or-nothing: on error the ledgers,
/// the event log and the environment are left exactly as before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cauldron {
    state: CauldronState,
    events: Vec<CauldronEvent>,
}

impl Cauldron {
    pub fn new(
        config: MarketConfig,
        interest_rate: InterestRatePerSecond,
        exchange_rate: IFixedPoint,
        unix_timestamp: i64,
    ) -> LendingResult<Self> {
        config.validate().track_caller()?;
        let exchange_rate = ExchangeRate::try_new(exchange_rate).with_msg("initial rate")?;
        tracing::info!(
            "Created market {} with max ltv {} and liquidation fee {}",
            config.address(),
            config.max_ltv(),
            config.liquidation_fee()
        );
        Ok(Cauldron {
            state: CauldronState {
                config,
                exchange_rate,
                debt: DebtLedger::new(interest_rate, unix_timestamp),
                collateral: CollateralLedger::default(),
            },
            events: Vec::new(),
        })
    }

    pub fn from_state(state: CauldronState) -> LendingResult<Self> {
        state.config.validate()?;
        ExchangeRate::try_new(state.exchange_rate.rate()).with_msg("stored rate")?;
        Ok(Cauldron {
            state,
            events: Vec::new(),
        })
    }

    #[inline(always)]
    pub fn state(&self) -> &CauldronState {
        &self.state
    }

    #[inline(always)]
    pub fn config(&self) -> &MarketConfig {
        &self.state.config
    }

    #[inline(always)]
    pub fn address(&self) -> Address {
        *self.state.config.address()
    }

    pub fn debt_ledger(&self) -> &DebtLedger {
        &self.state.debt
    }

    pub fn collateral_ledger(&self) -> &CollateralLedger {
        &self.state.collateral
    }

    pub fn events(&self) -> &[CauldronEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> CauldronEvents {
        CauldronEvents {
            events: std::mem::take(&mut self.events),
        }
    }

    pub fn event_logs(&self) -> Vec<String> {
        self.events
            .iter()
            .flat_map(CauldronEvent::to_log_lines)
            .collect()
    }

    pub fn user_loan(&self, account: &Address) -> u64 {
        self.state.debt.user_loan(account)
    }

    pub fn user_debt(&self, account: &Address) -> LendingResult<u64> {
        self.state.debt.user_debt(account)
    }

    pub fn user_collateral(&self, account: &Address) -> u64 {
        self.state.collateral.user_collateral(account)
    }

    pub fn total_loan(&self) -> &RebasePool {
        self.state.debt.total_loan()
    }

    pub fn total_collateral(&self) -> u64 {
        self.state.collateral.total_collateral()
    }

    pub fn pending_reward(&self, account: &Address) -> LendingResult<u64> {
        self.state.collateral.pending_reward(account)
    }

    pub fn exchange_rate(&self) -> IFixedPoint {
        self.state.exchange_rate.rate()
    }

    pub fn fees_earned(&self) -> u64 {
        self.state.debt.fees_earned()
    }

    pub fn position_health(&self, account: &Address) -> LendingResult<PositionHealth> {
        PositionHealth::new(
            self.state.debt.user_debt(account)?,
            self.state.collateral.user_collateral(account),
            &self.state.exchange_rate,
        )
    }

    /// Checked against the cached exchange rate.
    pub fn is_solvent(&self, account: &Address) -> LendingResult<bool> {
        self.position_health(account)?
            .is_solvent(self.state.config.max_ltv())
    }

    /// Runs `operation` all-or-nothing. On error the ledger state is restored,
    /// events emitted by the operation are dropped and `env` is rolled back.
    pub fn atomic<E: MarketEnv, T>(
        &mut self,
        env: &mut E,
        operation: &'static str,
        f: impl FnOnce(&mut Self, &mut E) -> LendingResult<T>,
    ) -> LendingResult<T> {
        let snapshot = self.state.clone();
        let events_len = self.events.len();
        env.checkpoint();
        match f(self, env) {
            Ok(result) => {
                env.commit();
                Ok(result)
            }
            Err(err) => {
                tracing::warn!("{} on market {} rolled back: {}", operation, self.address(), err);
                self.state = snapshot;
                self.events.truncate(events_len);
                env.rollback();
                Err(err)
            }
        }
    }

    /// Applies the interest accrued since the last accrual, returns it.
    pub fn accrue<E: MarketEnv>(&mut self, env: &mut E) -> LendingResult<u64> {
        self.atomic(env, "accrue", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())
        })
    }

    pub fn update_exchange_rate<E: MarketEnv>(&mut self, env: &mut E) -> LendingResult<IFixedPoint> {
        self.atomic(env, "update_exchange_rate", |cauldron, env| {
            cauldron.refresh_exchange_rate(env)
        })
    }

    /// Borrows `amount` against `borrower`'s collateral and sends it to
    /// `recipient`. Returns the base shares added to the borrower's loan.
    pub fn borrow<E: MarketEnv>(
        &mut self,
        env: &mut E,
        borrower: &Address,
        recipient: &Address,
        amount: u64,
    ) -> LendingResult<u64> {
        recipient.require_non_null().with_msg("borrow recipient")?;
        require_positive(amount)?;
        self.atomic(env, "borrow", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            cauldron.refresh_exchange_rate(env)?;
            let receipt = cauldron.state.debt.borrow(
                borrower,
                amount,
                cauldron.state.config.borrow_opening_fee(),
            )?;
            if cauldron.total_loan().elastic() > cauldron.state.config.max_total_borrow() {
                return Err(LendingError::BorrowLimitReached.into());
            }
            let debt_token = cauldron.state.config.tokens().debt;
            env.transfer(&debt_token, &cauldron.address(), recipient, amount)?;
            cauldron.require_solvent(borrower).with_msg("borrow")?;
            tracing::info!(
                "Borrowed {} (fee {}) on market {} for {:?}",
                amount,
                receipt.opening_fee,
                cauldron.address(),
                borrower
            );
            cauldron.emit(CauldronEvent::Borrow(BorrowEvent {
                market: cauldron.address(),
                borrower: *borrower,
                recipient: *recipient,
                amount,
                opening_fee: receipt.opening_fee,
                base: receipt.base,
            }));
            Ok(receipt.base)
        })
    }

    /// Repays `principal` base shares of `account`'s loan with funds from
    /// `payer`. Returns the debt asset amount pulled, rounded up.
    pub fn repay<E: MarketEnv>(
        &mut self,
        env: &mut E,
        payer: &Address,
        account: &Address,
        principal: u64,
    ) -> LendingResult<u64> {
        account.require_non_null().with_msg("repay account")?;
        require_positive(principal)?;
        self.atomic(env, "repay", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            cauldron.repay_inner(env, payer, account, principal)
        })
    }

    /// Repays the whole loan of `account`.
    pub fn repay_all<E: MarketEnv>(
        &mut self,
        env: &mut E,
        payer: &Address,
        account: &Address,
    ) -> LendingResult<u64> {
        account.require_non_null().with_msg("repay account")?;
        self.atomic(env, "repay_all", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            let principal = require_positive(cauldron.user_loan(account))?;
            cauldron.repay_inner(env, payer, account, principal)
        })
    }

    /// Pulls `amount` from `payer` and credits it as collateral of
    /// `beneficiary`, wrapping it first when the market uses a yield-bearing
    /// wrapper. Returns the collateral units credited.
    pub fn add_collateral<E: MarketEnv>(
        &mut self,
        env: &mut E,
        payer: &Address,
        beneficiary: &Address,
        amount: u64,
    ) -> LendingResult<u64> {
        beneficiary.require_non_null().with_msg("collateral beneficiary")?;
        require_positive(amount)?;
        self.atomic(env, "add_collateral", |cauldron, env| {
            let market = cauldron.address();
            let token = cauldron.state.config.tokens().deposit_token();
            env.transfer(&token, payer, &market, amount)?;
            cauldron.fold_yield(env)?;
            let credited = if cauldron.state.config.tokens().has_wrapper() {
                match env.deposit(&market, amount)? {
                    0 => return Err(LendingError::CollateralEntryFailed.into()),
                    wrapped => wrapped,
                }
            } else {
                amount
            };
            let reward = cauldron.state.collateral.deposit(beneficiary, credited)?;
            cauldron.pay_reward(env, beneficiary, reward)?;
            tracing::info!(
                "Added {} collateral on market {} for {:?}",
                credited,
                market,
                beneficiary
            );
            cauldron.emit(CauldronEvent::AddCollateral(CollateralEvent {
                market,
                from: *payer,
                to: *beneficiary,
                amount: credited,
                token,
                token_amount: amount,
            }));
            Ok(credited)
        })
    }

    /// Withdraws `amount` of `caller`'s collateral to `beneficiary`. Returns
    /// the amount of token sent, underlying when `as_underlying` unwraps.
    pub fn withdraw_collateral<E: MarketEnv>(
        &mut self,
        env: &mut E,
        caller: &Address,
        beneficiary: &Address,
        amount: u64,
        as_underlying: bool,
    ) -> LendingResult<u64> {
        beneficiary.require_non_null().with_msg("collateral beneficiary")?;
        require_positive(amount)?;
        self.atomic(env, "withdraw_collateral", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            cauldron.refresh_exchange_rate(env)?;
            cauldron.fold_yield(env)?;
            let reward = cauldron.state.collateral.withdraw(caller, amount)?;
            cauldron.pay_reward(env, caller, reward)?;
            let (token, sent) = cauldron.send_collateral(env, beneficiary, amount, as_underlying)?;
            cauldron.require_solvent(caller).with_msg("withdraw collateral")?;
            tracing::info!(
                "Withdrew {} collateral on market {} for {:?}",
                amount,
                cauldron.address(),
                caller
            );
            cauldron.emit(CauldronEvent::WithdrawCollateral(CollateralEvent {
                market: cauldron.address(),
                from: *caller,
                to: *beneficiary,
                amount,
                token,
                token_amount: sent,
            }));
            Ok(sent)
        })
    }

    /// Pays `account`'s pending reward. Returns the amount paid.
    pub fn claim_rewards<E: MarketEnv>(
        &mut self,
        env: &mut E,
        account: &Address,
    ) -> LendingResult<u64> {
        account.require_non_null().with_msg("reward account")?;
        self.atomic(env, "claim_rewards", |cauldron, env| {
            cauldron.fold_yield(env)?;
            let reward = cauldron.state.collateral.claim(account)?;
            cauldron.pay_reward(env, account, reward)?;
            Ok(reward)
        })
    }

    /// Liquidates a batch of insolvent accounts.
    ///
    /// Solvent accounts, empty loans and dust liquidations are skipped. The
    /// batch only fails as a whole when nothing could be liquidated, or when
    /// settlement fails.
    pub fn liquidate<E: MarketEnv>(
        &mut self,
        env: &mut E,
        liquidator: &Address,
        request: &LiquidationRequest,
    ) -> LendingResult<LiquidationOutcome> {
        if request.accounts.len() != request.principals.len() {
            return Err(LendingError::ArrayLengthMismatch.into());
        }
        request.recipient.require_non_null().with_msg("liquidation recipient")?;
        if request.sell_collateral {
            validate_sell_paths(
                self.state.config.tokens(),
                &request.swap_path,
                &request.swap_path2,
            )?;
        }
        self.atomic(env, "liquidate", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            cauldron.refresh_exchange_rate(env)?;
            cauldron.fold_yield(env)?;
            let totals = request
                .accounts
                .iter()
                .zip_eq(request.principals.iter())
                .try_fold(LiquidationTotals::default(), |totals, (account, requested)| {
                    cauldron.liquidate_account(env, liquidator, account, *requested, totals)
                })?;
            totals
                .check_outcome(cauldron.state.config.liquidation_dust_policy())
                .track_caller()?;
            let (settlement, swap_output) = if request.sell_collateral {
                cauldron.settle_by_selling(env, liquidator, request, &totals)?
            } else {
                (cauldron.settle_in_collateral(env, liquidator, request, &totals)?, 0)
            };
            tracing::info!(
                "Liquidated {} accounts on market {}, debt repaid {}, collateral seized {}",
                totals.accounts_liquidated,
                cauldron.address(),
                totals.debt_repaid,
                totals.collateral_seized
            );
            cauldron.emit(CauldronEvent::LiquidationSettled(LiquidationSettledEvent {
                market: cauldron.address(),
                liquidator: *liquidator,
                recipient: request.recipient,
                accounts_liquidated: totals.accounts_liquidated,
                total_principal: totals.principal,
                total_debt_repaid: totals.debt_repaid,
                total_collateral_seized: totals.collateral_seized,
                sold_collateral: request.sell_collateral,
                swap_output,
                top_up: settlement.top_up,
                protocol_cut: settlement.protocol_cut,
                to_recipient: settlement.to_recipient,
            }));
            Ok(LiquidationOutcome {
                totals,
                settlement,
                swap_output,
            })
        })
    }

    /// Sends every accrued fee to `fee_to`. Returns the amount sent.
    pub fn withdraw_fees<E: MarketEnv>(&mut self, env: &mut E) -> LendingResult<u64> {
        self.atomic(env, "withdraw_fees", |cauldron, env| {
            cauldron.accrue_inner(env.unix_timestamp())?;
            let amount = cauldron.state.debt.take_fees();
            let fee_to = *cauldron.state.config.fee_to();
            let debt_token = cauldron.state.config.tokens().debt;
            cauldron.send(env, &debt_token, &fee_to, amount)?;
            tracing::info!("Withdrew {} fees on market {}", amount, cauldron.address());
            cauldron.emit(CauldronEvent::WithdrawFees(WithdrawFeesEvent {
                market: cauldron.address(),
                fee_to,
                amount,
            }));
            Ok(amount)
        })
    }

    pub fn update_max_ltv(&mut self, max_ltv: IFixedPoint) -> LendingResult {
        self.state.config.update_max_ltv(max_ltv)?;
        self.emit_config_updated();
        Ok(())
    }

    pub fn update_liquidation_fee(&mut self, liquidation_fee: IFixedPoint) -> LendingResult {
        self.state.config.update_liquidation_fee(liquidation_fee)?;
        self.emit_config_updated();
        Ok(())
    }

    pub fn set_fee_to(&mut self, fee_to: Address) -> LendingResult {
        self.state.config.set_fee_to(fee_to)?;
        self.emit_config_updated();
        Ok(())
    }

    fn emit(&mut self, event: CauldronEvent) {
        self.events.push(event);
    }

    fn emit_config_updated(&mut self) {
        let config = &self.state.config;
        tracing::info!(
            "Updated market {} config: max ltv {}, liquidation fee {}, fee to {:?}",
            config.address(),
            config.max_ltv(),
            config.liquidation_fee(),
            config.fee_to()
        );
        let event = CauldronEvent::ConfigUpdated(ConfigUpdatedEvent {
            market: *config.address(),
            max_ltv: config.max_ltv(),
            liquidation_fee: config.liquidation_fee(),
            fee_to: *config.fee_to(),
        });
        self.emit(event);
    }

    fn accrue_inner(&mut self, unix_timestamp: i64) -> LendingResult<u64> {
        let Some(accrual) = self.state.debt.accrue(unix_timestamp)? else {
            return Ok(0);
        };
        tracing::info!(
            "Accrued {} interest over {}s on market {}",
            accrual.interest,
            accrual.elapsed_seconds,
            self.address()
        );
        self.emit(CauldronEvent::Accrue(AccrueEvent {
            market: self.address(),
            interest: accrual.interest,
            total_elastic: self.total_loan().elastic(),
            fees_earned: self.fees_earned(),
            unix_timestamp,
        }));
        Ok(accrual.interest)
    }

    fn refresh_exchange_rate<E: MarketEnv>(&mut self, env: &mut E) -> LendingResult<IFixedPoint> {
        let rate = ExchangeRate::try_new(env.refresh_exchange_rate()?)?;
        let previous = self.state.exchange_rate;
        if rate != previous {
            self.state.exchange_rate = rate;
            tracing::info!(
                "Exchange rate of market {} moved from {} to {}",
                self.address(),
                previous.rate(),
                rate.rate()
            );
            self.emit(CauldronEvent::ExchangeRateUpdated(ExchangeRateEvent {
                market: self.address(),
                previous_rate: previous.rate(),
                rate: rate.rate(),
            }));
        }
        Ok(rate.rate())
    }

    /// Folds the yield claimed from the wrapper into the reward accumulator.
    fn fold_yield<E: MarketEnv>(&mut self, env: &mut E) -> LendingResult {
        if !self.state.config.tokens().has_wrapper() {
            return Ok(());
        }
        let claimed = env.claim_yield(&self.address())?;
        self.state.collateral.fold_yield(claimed)
    }

    fn pay_reward<E: MarketEnv>(&mut self, env: &mut E, account: &Address, amount: u64) -> LendingResult {
        let Some(yield_bearing) = self.state.config.tokens().yield_bearing().copied() else {
            return Ok(());
        };
        if amount == 0 {
            return Ok(());
        }
        self.send(env, &yield_bearing.reward, account, amount)?;
        self.emit(CauldronEvent::RewardsPaid(RewardEvent {
            market: self.address(),
            account: *account,
            token: yield_bearing.reward,
            amount,
        }));
        Ok(())
    }

    fn repay_inner<E: MarketEnv>(
        &mut self,
        env: &mut E,
        payer: &Address,
        account: &Address,
        principal: u64,
    ) -> LendingResult<u64> {
        let owed = self.state.debt.repay(account, principal)?;
        let debt_token = self.state.config.tokens().debt;
        env.transfer(&debt_token, payer, &self.address(), owed)?;
        tracing::info!(
            "Repaid {} ({} base) on market {} for {:?}",
            owed,
            principal,
            self.address(),
            account
        );
        self.emit(CauldronEvent::Repay(RepayEvent {
            market: self.address(),
            payer: *payer,
            account: *account,
            base: principal,
            amount: owed,
        }));
        Ok(owed)
    }

    fn liquidate_account<E: MarketEnv>(
        &mut self,
        env: &mut E,
        liquidator: &Address,
        account: &Address,
        requested: u64,
        totals: LiquidationTotals,
    ) -> LendingResult<LiquidationTotals> {
        let health = self.position_health(account)?;
        if health.is_solvent(self.state.config.max_ltv())? {
            tracing::debug!("Skipping solvent account {:?}", account);
            return Ok(totals);
        }
        let user_base = self.user_loan(account);
        if requested.min(user_base) == 0 {
            tracing::debug!("Skipping empty liquidation of {:?}", account);
            return Ok(totals);
        }
        let liquidation = compute_account_liquidation(
            self.total_loan(),
            user_base,
            health.collateral_atoms,
            &self.state.exchange_rate,
            self.state.config.liquidation_fee(),
            requested,
        )?;
        let policy = self.state.config.liquidation_dust_policy();
        if policy.scope == DustScope::PerAccount
            && policy.is_dust(liquidation.principal, liquidation.closes_loan)
        {
            tracing::debug!(
                "Skipping dust liquidation of {:?}, principal {}",
                account,
                liquidation.principal
            );
            return Ok(totals.skip_dust());
        }
        let reward = self
            .state
            .collateral
            .withdraw(account, liquidation.collateral_seized)?;
        self.pay_reward(env, account, reward)?;
        self.state.debt.repay(account, liquidation.principal)?;
        self.emit(CauldronEvent::Liquidate(LiquidateEvent {
            market: self.address(),
            liquidator: *liquidator,
            account: *account,
            health_before_liquidation: health,
            principal: liquidation.principal,
            debt_repaid: liquidation.debt_repaid,
            liquidation_fee: liquidation.fee,
            collateral_seized: liquidation.collateral_seized,
        }));
        totals.add(&liquidation)
    }

    fn settle_in_collateral<E: MarketEnv>(
        &mut self,
        env: &mut E,
        liquidator: &Address,
        request: &LiquidationRequest,
        totals: &LiquidationTotals,
    ) -> LendingResult<Settlement> {
        let tokens = self.state.config.tokens().clone();
        env.transfer(&tokens.debt, liquidator, &self.address(), totals.debt_repaid)?;
        let settlement =
            settle_collateral(totals, self.state.config.protocol_fee_share_in_bps())?;
        let fee_to = *self.state.config.fee_to();
        self.send(env, &tokens.collateral, &fee_to, settlement.protocol_cut)?;
        self.send_collateral(
            env,
            &request.recipient,
            settlement.to_recipient,
            request.as_underlying,
        )?;
        Ok(settlement)
    }

    fn settle_by_selling<E: MarketEnv>(
        &mut self,
        env: &mut E,
        liquidator: &Address,
        request: &LiquidationRequest,
        totals: &LiquidationTotals,
    ) -> LendingResult<(Settlement, u64)> {
        let market = self.address();
        let tokens = self.state.config.tokens().clone();
        let mut amount = totals.collateral_seized;
        if tokens.has_wrapper() && amount > 0 {
            amount = match env.withdraw(&market, amount)? {
                0 => return Err(LendingError::CollateralExitFailed.into()),
                underlying => underlying,
            };
        }
        let swap_output = match tokens.pool_legs() {
            Some(_) => {
                let (first, second) = env.remove_liquidity(&market, &tokens.sold_token(), amount)?;
                swap_leg(env, &market, &request.swap_path, &tokens.debt, first)?
                    .safe_add(swap_leg(env, &market, &request.swap_path2, &tokens.debt, second)?)?
            }
            None => swap_leg(env, &market, &request.swap_path, &tokens.debt, amount)?,
        };
        let settlement = settle_swap_output(
            totals,
            swap_output,
            request.max_top_up,
            self.state.config.protocol_fee_share_in_bps(),
        )
        .with_msg("swap output below debt repaid")?;
        if settlement.top_up > 0 {
            env.transfer(&tokens.debt, liquidator, &market, settlement.top_up)?;
        }
        let fee_to = *self.state.config.fee_to();
        self.send(env, &tokens.debt, &fee_to, settlement.protocol_cut)?;
        self.send(env, &tokens.debt, &request.recipient, settlement.to_recipient)?;
        Ok((settlement, swap_output))
    }

    /// Sends collateral held by the market, unwrapping it first when asked
    /// and a wrapper is configured. Returns the token and amount sent.
    fn send_collateral<E: MarketEnv>(
        &mut self,
        env: &mut E,
        to: &Address,
        amount: u64,
        as_underlying: bool,
    ) -> LendingResult<(Address, u64)> {
        let tokens = self.state.config.tokens().clone();
        match tokens.yield_bearing() {
            Some(yield_bearing) if as_underlying && amount > 0 => {
                let underlying = env.withdraw(&self.address(), amount)?;
                if underlying == 0 {
                    return Err(LendingError::CollateralExitFailed.into());
                }
                self.send(env, &yield_bearing.underlying, to, underlying)?;
                Ok((yield_bearing.underlying, underlying))
            }
            _ => {
                self.send(env, &tokens.collateral, to, amount)?;
                Ok((tokens.collateral, amount))
            }
        }
    }

    /// Transfers from the market, skipping zero amounts.
    fn send<E: MarketEnv>(
        &self,
        env: &mut E,
        token: &Address,
        to: &Address,
        amount: u64,
    ) -> LendingResult {
        if amount == 0 {
            return Ok(());
        }
        env.transfer(token, &self.address(), to, amount)
    }

    #[track_caller]
    fn require_solvent(&self, account: &Address) -> LendingResult {
        if !self.is_solvent(account)? {
            return Err(LendingError::Insolvent.into());
        }
        Ok(())
    }
}

#[track_caller]
fn require_positive(amount: u64) -> LendingResult<u64> {
    if amount == 0 {
        return Err(LendingError::InvalidAmount.into());
    }
    Ok(amount)
}

fn swap_leg<E: MarketEnv>(
    env: &mut E,
    market: &Address,
    path: &[Address],
    debt: &Address,
    amount: u64,
) -> LendingResult<u64> {
    if amount == 0 || is_noop_path(path, debt) {
        return Ok(amount);
    }
    env.swap_exact_input(market, path, amount)
}
