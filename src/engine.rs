use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, warn};

use crate::collateral::{CollateralRegistry, CollateralVault, Holdings};
use crate::config::{LedgerConfig, LoanTerms};
use crate::custody::{Authority, Custody};
use crate::debt::{AccountPosition, DebtLedger};
use crate::decimal::Amount;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::types::{
    AccountId, AccountStatus, AssetId, BorrowResult, DepositAndBorrowResult, DepositResult,
    LiquidationResult, RepaymentResult, SeizedCollateral, Transfer, WithdrawalResult,
};
use crate::view::AccountView;

/// staged copy of one account, committed only once every step and transfer succeeded
struct Draft {
    account: AccountId,
    now: DateTime<Utc>,
    position: AccountPosition,
    holdings: Holdings,
    /// interest capitalized when the draft was opened
    interest: Amount,
    transfers: Vec<Transfer>,
    events: Vec<Event>,
}

/// lending engine: orchestrates registry, debt ledger and vault
pub struct LendingEngine<C: Custody, A: Authority> {
    config: LedgerConfig,
    registry: CollateralRegistry,
    debts: DebtLedger,
    vault: CollateralVault,
    events: EventStore,
    custody: C,
    authority: A,
}

impl<C: Custody, A: Authority> LendingEngine<C, A> {
    /// create new engine from a validated configuration
    pub fn new(config: LedgerConfig, custody: C, authority: A) -> Result<Self> {
        config.validate()?;

        let registry = CollateralRegistry::new(
            config.reference_asset.clone(),
            config.governance_asset.clone(),
            config.precision,
        );

        Ok(Self {
            config,
            registry,
            debts: DebtLedger::new(),
            vault: CollateralVault::new(),
            events: EventStore::new(),
            custody,
            authority,
        })
    }

    // administration

    /// register a collateral asset
    pub fn add_asset(
        &mut self,
        caller: AccountId,
        asset: impl Into<AssetId>,
        beneficiary: AccountId,
        ratio: u128,
        precision: u32,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        let asset = asset.into();
        let event = self.registry.add_asset(asset.clone(), beneficiary, ratio, precision)?;

        info!(%asset, ratio, "collateral asset added");
        self.events.emit(event, caller, time.now());
        Ok(())
    }

    /// change an asset's collaterability ratio; zero retires it
    pub fn set_ratio(
        &mut self,
        caller: AccountId,
        asset: &AssetId,
        ratio: u128,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        let event = self.registry.set_ratio(asset, ratio)?;

        info!(%asset, ratio, retired = self.registry.is_retired(asset), "collateral ratio changed");
        self.events.emit(event, caller, time.now());
        Ok(())
    }

    /// redirect liquidated collateral of an asset
    pub fn set_beneficiary(
        &mut self,
        caller: AccountId,
        asset: &AssetId,
        beneficiary: AccountId,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        let event = self.registry.set_beneficiary(asset, beneficiary)?;

        info!(%asset, beneficiary = %beneficiary.or_burn(), "liquidation beneficiary changed");
        self.events.emit(event, caller, time.now());
        Ok(())
    }

    /// replace the loan terms
    ///
    /// Interest not yet settled on any account accrues at the new rate.
    pub fn set_loan_terms(
        &mut self,
        caller: AccountId,
        terms: LoanTerms,
        time: &SafeTimeProvider,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        terms.validate()?;

        let old_terms = self.config.terms;
        self.config.terms = terms;

        info!(
            rate = terms.yearly_interest_percent,
            threshold = terms.default_threshold_percent,
            "loan terms changed"
        );
        self.events.emit(
            Event::LoanTermsChanged {
                old_terms,
                new_terms: terms,
            },
            caller,
            time.now(),
        );
        Ok(())
    }

    fn require_admin(&self, caller: &AccountId) -> Result<()> {
        if !self.authority.is_administrator(caller) {
            warn!(%caller, "administrative call rejected");
            return Err(LedgerError::NotAuthorized { account: *caller });
        }
        Ok(())
    }

    // account operations

    /// deposit collateral
    pub fn add_collateral(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
        time: &SafeTimeProvider,
    ) -> Result<DepositResult> {
        let mut draft = self.open(account, time.now())?;
        let result = self.stage_deposit(&mut draft, asset, amount)?;
        self.commit(draft, account)?;

        info!(%account, %asset, %amount, balance = %result.new_balance, "collateral added");
        Ok(result)
    }

    /// deposit collateral and borrow against it, both or neither
    pub fn add_collateral_and_borrow(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
        borrow_amount: Amount,
        time: &SafeTimeProvider,
    ) -> Result<DepositAndBorrowResult> {
        let mut draft = self.open(account, time.now())?;
        let deposit = self.stage_deposit(&mut draft, asset, amount)?;
        let borrow = self.stage_borrow(&mut draft, borrow_amount)?;
        self.commit(draft, account)?;

        info!(%account, %asset, %amount, disbursed = %borrow.disbursed, "collateral added and borrowed");
        Ok(DepositAndBorrowResult { deposit, borrow })
    }

    /// borrow the reference asset, capped at available credit
    pub fn borrow(
        &mut self,
        account: AccountId,
        amount: Amount,
        time: &SafeTimeProvider,
    ) -> Result<BorrowResult> {
        let mut draft = self.open(account, time.now())?;
        let result = self.stage_borrow(&mut draft, amount)?;
        self.commit(draft, account)?;

        info!(
            %account,
            requested = %amount,
            disbursed = %result.disbursed,
            debt = %result.outstanding_debt,
            "loan taken"
        );
        Ok(result)
    }

    /// repay debt in the reference asset, or in kind from the account's collateral holding
    pub fn repay_loan(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
        time: &SafeTimeProvider,
    ) -> Result<RepaymentResult> {
        if !self.debts.position(&account).has_debt() {
            return Err(LedgerError::NoDebt { account });
        }

        let mut draft = self.open(account, time.now())?;
        let result = self.stage_repay(&mut draft, asset, amount)?;
        self.commit(draft, account)?;

        info!(
            %account,
            %asset,
            %amount,
            to_interest = %result.to_interest,
            to_principal = %result.to_principal,
            debt = %result.outstanding_debt,
            "loan repaid"
        );
        Ok(result)
    }

    /// seize every holding of a delinquent account; callable by anyone
    pub fn liquidate_delinquent(
        &mut self,
        caller: AccountId,
        account: AccountId,
        time: &SafeTimeProvider,
    ) -> Result<LiquidationResult> {
        let mut draft = self.open(account, time.now())?;

        let debt = draft.position.outstanding_debt();
        let collateral_value = draft.holdings.total_value(&self.registry)?;
        let limit = self.liquidation_limit(collateral_value)?;
        if !draft.position.has_debt() || debt <= limit {
            return Err(LedgerError::NotDelinquent { account, debt, limit });
        }

        let mut seized = Vec::new();
        for (asset, amount) in draft.holdings.drain() {
            let beneficiary = self.registry.beneficiary_of(&asset);
            draft.transfers.push(Transfer::outbound(beneficiary, asset.clone(), amount));
            draft.events.push(Event::CollateralLiquidated {
                account,
                asset: asset.clone(),
                amount,
                beneficiary,
            });
            seized.push(SeizedCollateral {
                asset,
                amount,
                beneficiary,
            });
        }

        draft.position.clear();
        draft.events.push(Event::AccountLiquidated {
            account,
            debt_cleared: debt,
            collateral_value,
        });

        let result = LiquidationResult {
            account,
            debt_cleared: debt,
            interest_capitalized: draft.interest,
            collateral_value,
            seized,
            transfers: draft.transfers.clone(),
        };
        self.commit(draft, caller)?;

        warn!(%account, %caller, %debt, %collateral_value, "account liquidated");
        Ok(result)
    }

    /// return every holding to a debt-free account
    pub fn reclaim_all_collateral(
        &mut self,
        account: AccountId,
        time: &SafeTimeProvider,
    ) -> Result<WithdrawalResult> {
        let mut draft = self.open(account, time.now())?;

        if draft.position.has_debt() {
            return Err(LedgerError::StillInDebt {
                debt: draft.position.outstanding_debt(),
            });
        }
        if draft.holdings.is_empty() {
            return Err(LedgerError::NothingToClaim { account });
        }

        let returned = draft.holdings.drain();
        for (asset, amount) in &returned {
            draft.transfers.push(Transfer::outbound(account, asset.clone(), *amount));
            draft.events.push(Event::CollateralReclaimed {
                account,
                asset: asset.clone(),
                amount: *amount,
            });
        }

        let result = WithdrawalResult {
            returned,
            interest_capitalized: draft.interest,
            collateral_value: Amount::ZERO,
            transfers: draft.transfers.clone(),
        };
        self.commit(draft, account)?;

        info!(%account, assets = result.returned.len(), "collateral reclaimed");
        Ok(result)
    }

    /// withdraw part of a holding while the remaining collateral still covers the debt
    pub fn withdraw_collateral(
        &mut self,
        account: AccountId,
        asset: &AssetId,
        amount: Amount,
        time: &SafeTimeProvider,
    ) -> Result<WithdrawalResult> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let mut draft = self.open(account, time.now())?;
        let new_balance = draft.holdings.withdraw(asset, amount)?;

        let debt = draft.position.outstanding_debt();
        let collateral_value = draft.holdings.total_value(&self.registry)?;
        if debt > collateral_value {
            return Err(LedgerError::Undercollateralized {
                debt,
                collateral_value,
            });
        }

        draft.transfers.push(Transfer::outbound(account, asset.clone(), amount));
        draft.events.push(Event::CollateralWithdrawn {
            account,
            asset: asset.clone(),
            amount,
            new_balance,
        });

        let result = WithdrawalResult {
            returned: vec![(asset.clone(), amount)],
            interest_capitalized: draft.interest,
            collateral_value,
            transfers: draft.transfers.clone(),
        };
        self.commit(draft, account)?;

        info!(%account, %asset, %amount, balance = %new_balance, "collateral withdrawn");
        Ok(result)
    }

    // staging

    /// copy the account's state and settle its interest up to `now`
    fn open(&self, account: AccountId, now: DateTime<Utc>) -> Result<Draft> {
        let mut position = self.debts.position(&account);
        let interest = position.settle_interest(now, &self.config.terms)?;

        if interest.is_positive() {
            debug!(%account, %interest, "interest capitalized");
        }

        Ok(Draft {
            account,
            now,
            position,
            holdings: self.vault.holdings(&account),
            interest,
            transfers: Vec::new(),
            events: Vec::new(),
        })
    }

    fn stage_deposit(&self, draft: &mut Draft, asset: &AssetId, amount: Amount) -> Result<DepositResult> {
        if *asset == self.config.reference_asset {
            return Err(LedgerError::WrongAssetForDeposit { asset: asset.clone() });
        }

        let new_balance = draft.holdings.deposit(asset, amount, &self.registry, draft.now)?;
        let transfer = Transfer::inbound(draft.account, asset.clone(), amount);

        draft.transfers.push(transfer.clone());
        draft.events.push(Event::CollateralDeposited {
            account: draft.account,
            asset: asset.clone(),
            amount,
            new_balance,
        });

        Ok(DepositResult {
            asset: asset.clone(),
            amount,
            new_balance,
            interest_capitalized: draft.interest,
            collateral_value: draft.holdings.total_value(&self.registry)?,
            transfers: vec![transfer],
        })
    }

    fn stage_borrow(&self, draft: &mut Draft, amount: Amount) -> Result<BorrowResult> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let collateral_value = draft.holdings.total_value(&self.registry)?;
        let old_debt = draft.position.outstanding_debt();
        let available = collateral_value
            .checked_sub(old_debt)
            .filter(|a| a.is_positive())
            .ok_or(LedgerError::OverDebted {
                debt: old_debt,
                collateral_value,
            })?;

        let disbursed = amount.min(available);
        draft.position.increase_debt(disbursed)?;
        let new_debt = draft.position.outstanding_debt();

        let transfer = Transfer::outbound(draft.account, self.config.reference_asset.clone(), disbursed);
        draft.transfers.push(transfer.clone());
        draft.events.push(Event::LoanTaken {
            account: draft.account,
            requested: amount,
            disbursed,
            interest_capitalized: draft.interest,
            old_debt,
            new_debt,
        });
        if draft.interest.is_positive() {
            draft.events.push(Event::InterestPaid {
                account: draft.account,
                amount: draft.interest,
                treasury: self.config.terms.treasury,
            });
        }

        if disbursed < amount {
            debug!(account = %draft.account, requested = %amount, %disbursed, "borrow capped at available credit");
        }

        Ok(BorrowResult {
            requested: amount,
            disbursed,
            interest_capitalized: draft.interest,
            outstanding_debt: new_debt,
            available_credit: collateral_value.saturating_sub(new_debt),
            transfers: vec![transfer],
        })
    }

    fn stage_repay(&self, draft: &mut Draft, asset: &AssetId, amount: Amount) -> Result<RepaymentResult> {
        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        // the reference asset comes from the borrower's wallet at par,
        // anything else is taken in kind from the vault
        let in_kind = *asset != self.config.reference_asset;
        let ratio = if in_kind {
            if self.registry.is_retired(asset) {
                return Err(LedgerError::AssetRetired { asset: asset.clone() });
            }
            let balance = draft.holdings.balance(asset);
            if amount > balance {
                return Err(LedgerError::InsufficientBalance {
                    asset: asset.clone(),
                    available: balance,
                    requested: amount,
                });
            }
            self.registry.ratio_of(asset)
        } else {
            1
        };

        let value = amount
            .checked_mul_ratio(ratio)
            .ok_or_else(|| LedgerError::overflow("repayment valuation"))?;
        if value < draft.interest {
            return Err(LedgerError::InsufficientAmount {
                interest: draft.interest,
                provided: value,
            });
        }

        let old_debt = draft.position.outstanding_debt();
        let applied = value.min(old_debt);
        let to_interest = draft.interest.min(applied);
        let to_principal = applied.saturating_sub(to_interest);
        let unapplied = value.saturating_sub(applied);

        draft.position.decrease_debt(applied)?;
        let new_debt = draft.position.outstanding_debt();

        let treasury = self.config.terms.treasury;
        let transfer = if in_kind {
            draft.holdings.withdraw(asset, amount)?;
            Transfer::outbound(treasury, asset.clone(), amount)
        } else {
            Transfer::inbound(draft.account, asset.clone(), amount)
        };
        draft.transfers.push(transfer.clone());
        draft.events.push(Event::LoanRepaid {
            account: draft.account,
            asset: asset.clone(),
            amount,
            value,
            to_principal,
            old_debt,
            new_debt,
        });
        if to_interest.is_positive() {
            draft.events.push(Event::InterestPaid {
                account: draft.account,
                amount: to_interest,
                treasury,
            });
        }

        Ok(RepaymentResult {
            asset: asset.clone(),
            amount,
            value,
            to_interest,
            to_principal,
            unapplied,
            outstanding_debt: new_debt,
            transfers: vec![transfer],
        })
    }

    /// execute staged transfers, then write the draft back
    fn commit(&mut self, draft: Draft, initiator: AccountId) -> Result<()> {
        let Draft {
            account,
            now,
            position,
            holdings,
            transfers,
            events,
            ..
        } = draft;

        for (index, transfer) in transfers.iter().enumerate() {
            if let Err(e) = self.custody.execute(transfer) {
                warn!(
                    %account,
                    asset = %transfer.asset,
                    amount = %transfer.amount,
                    error = %e,
                    "custody transfer failed, operation aborted"
                );
                self.custody.rollback(&transfers[..index]);
                return Err(LedgerError::TransferFailed {
                    asset: transfer.asset.clone(),
                    amount: transfer.amount,
                    reason: e.to_string(),
                });
            }
        }

        self.debts.commit(account, position);
        self.vault.commit(account, holdings);
        self.events.emit_all(events, initiator, now);
        Ok(())
    }

    fn liquidation_limit(&self, collateral_value: Amount) -> Result<Amount> {
        let scaled = collateral_value
            .units()
            .checked_mul(self.config.terms.default_threshold_percent as u128)
            .ok_or_else(|| LedgerError::overflow("liquidation limit"))?;
        Ok(Amount::new(scaled / 100))
    }

    // queries

    /// stored debt, without accruing
    pub fn outstanding_debt(&self, account: &AccountId) -> Amount {
        self.debts.outstanding_debt(account)
    }

    /// debt including interest accrued up to now
    pub fn debt_due(&self, account: &AccountId, time: &SafeTimeProvider) -> Result<Amount> {
        self.debts
            .position(account)
            .debt_at(time.now(), &self.config.terms)
    }

    pub fn total_value(&self, account: &AccountId) -> Result<Amount> {
        self.vault.total_value(account, &self.registry)
    }

    pub fn holding(&self, account: &AccountId, asset: &AssetId) -> Amount {
        self.vault.balance(account, asset)
    }

    pub fn holdings(&self, account: &AccountId) -> Holdings {
        self.vault.holdings(account)
    }

    pub fn position(&self, account: &AccountId) -> AccountPosition {
        self.debts.position(account)
    }

    /// credit left at current time
    pub fn available_credit(&self, account: &AccountId, time: &SafeTimeProvider) -> Result<Amount> {
        let debt = self.debt_due(account, time)?;
        Ok(self.total_value(account)?.saturating_sub(debt))
    }

    /// debt level above which the account can be liquidated
    pub fn liquidation_threshold(&self, account: &AccountId) -> Result<Amount> {
        self.liquidation_limit(self.total_value(account)?)
    }

    /// solvency state at current time
    pub fn account_status(&self, account: &AccountId, time: &SafeTimeProvider) -> Result<AccountStatus> {
        let debt = self.debt_due(account, time)?;
        if debt.is_zero() {
            return Ok(AccountStatus::Clean);
        }
        if debt > self.liquidation_threshold(account)? {
            Ok(AccountStatus::Delinquent)
        } else {
            Ok(AccountStatus::Active)
        }
    }

    /// total units of an asset held for all accounts
    pub fn total_custodied(&self, asset: &AssetId) -> Option<Amount> {
        self.vault.total_custodied(asset)
    }

    pub fn audit_log(&self) -> &EventStore {
        &self.events
    }

    /// serializable snapshot of one account at current time
    pub fn account_view(&self, account: AccountId, time: &SafeTimeProvider) -> Result<AccountView> {
        AccountView::from_engine(self, account, time)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.config.terms
    }

    pub fn registry(&self) -> &CollateralRegistry {
        &self.registry
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }
}
