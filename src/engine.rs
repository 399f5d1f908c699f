//! The issuance engine: position bookkeeping, solvency enforcement and the
//! liquidation protocol.
//!
//! Every public mutating operation runs as one indivisible unit: it takes
//! the reentrancy guard, stages its mutations in a scratch buffer,
//! validates every invariant on the staged view, performs the external
//! capability calls, and only then commits the buffer to the ledger. Any
//! failure on any path discards the buffer and releases the guard.

use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, error, info};

use crate::error::EngineError;
use crate::events::{EventSink, LedgerEvent};
use crate::health::{
    calculate_health_factor, LIQUIDATION_BONUS_PCT, MIN_HEALTH_FACTOR,
};
use crate::math::{self, WAD};
use crate::oracle::{Clock, OracleAdapter};
use crate::registry::CollateralRegistry;
use crate::state::{AccountId, AssetId, Ledger, Position, Staging};
use crate::token::{CollateralCustody, MintAuthority};

/// Exclusive-entry flag for public mutating operations.
///
/// External capabilities could in principle call back into the core; a
/// nested mutating entry while the flag is held is rejected outright, and
/// dropping the guard clears the flag on every exit path.
struct OpGuard(Rc<Cell<bool>>);

impl OpGuard {
    fn acquire(flag: &Rc<Cell<bool>>) -> Result<Self, EngineError> {
        if flag.get() {
            return Err(EngineError::ReentrantCall);
        }
        flag.set(true);
        Ok(Self(Rc::clone(flag)))
    }
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Collateralized synthetic-asset issuance engine.
pub struct SynthEngine {
    registry: CollateralRegistry,
    ledger: Ledger,
    synthetic_asset: AssetId,
    custody: Box<dyn CollateralCustody>,
    mint_authority: Box<dyn MintAuthority>,
    clock: Box<dyn Clock>,
    events: Box<dyn EventSink>,
    entered: Rc<Cell<bool>>,
}

impl SynthEngine {
    /// Builds the engine from parallel collateral/oracle lists and the
    /// injected capabilities. Fails with `LengthMismatch` if the lists
    /// differ in length.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        synthetic_asset: AssetId,
        collateral_assets: Vec<AssetId>,
        oracles: Vec<OracleAdapter>,
        custody: Box<dyn CollateralCustody>,
        mint_authority: Box<dyn MintAuthority>,
        clock: Box<dyn Clock>,
        events: Box<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let registry = CollateralRegistry::new(collateral_assets, oracles)?;
        Ok(Self {
            registry,
            ledger: Ledger::new(),
            synthetic_asset,
            custody,
            mint_authority,
            clock,
            events,
            entered: Rc::new(Cell::new(false)),
        })
    }

    // ---- operations ----

    /// Deposits approved collateral into custody and credits the account's
    /// position.
    pub fn deposit(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, ?asset, amount, "deposit");

        if amount == 0 {
            return Err(EngineError::MustBePositive);
        }
        if !self.registry.is_allowed(asset) {
            return Err(EngineError::NotAllowedAsset);
        }

        let mut staging = Staging::new();
        staging
            .position_mut(&self.ledger, account)
            .add_collateral(*asset, amount)?;

        self.custody
            .pull(asset, account, amount)
            .map_err(|_| EngineError::TransferFailed)?;

        staging.commit(&mut self.ledger);
        self.events.record(LedgerEvent::CollateralDeposited {
            account: *account,
            asset: *asset,
            amount,
        });
        info!(?account, ?asset, amount, "collateral deposited");
        Ok(())
    }

    /// Releases collateral from `account`'s position to `beneficiary`.
    /// Rejected if the remaining position would be undercollateralized.
    pub fn redeem(
        &mut self,
        account: &AccountId,
        beneficiary: &AccountId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, ?beneficiary, ?asset, amount, "redeem");

        if amount == 0 {
            return Err(EngineError::MustBePositive);
        }

        let mut staging = Staging::new();
        staging
            .position_mut(&self.ledger, account)
            .remove_collateral(asset, amount)?;
        self.ensure_healthy(&staging, account)?;

        self.custody
            .push(asset, beneficiary, amount)
            .map_err(|_| EngineError::TransferFailed)?;

        staging.commit(&mut self.ledger);
        self.events.record(LedgerEvent::CollateralRedeemed {
            from: *account,
            to: *beneficiary,
            asset: *asset,
            amount,
        });
        info!(?account, ?asset, amount, "collateral redeemed");
        Ok(())
    }

    /// Mints synthetic debt against the account's collateral.
    pub fn mint(&mut self, account: &AccountId, amount: u128) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, amount, "mint");

        if amount == 0 {
            return Err(EngineError::MustBePositive);
        }

        let mut staging = Staging::new();
        staging.position_mut(&self.ledger, account).add_debt(amount)?;
        self.ensure_healthy(&staging, account)?;

        self.mint_authority
            .issue(account, amount)
            .map_err(|_| EngineError::MintFailed)?;

        staging.commit(&mut self.ledger);
        info!(?account, amount, "synthetic minted");
        Ok(())
    }

    /// Repays `account`'s debt with synthetic tokens pulled from `payer`
    /// and destroyed.
    pub fn burn(
        &mut self,
        account: &AccountId,
        payer: &AccountId,
        amount: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, ?payer, amount, "burn");

        if amount == 0 {
            return Err(EngineError::MustBePositive);
        }

        let mut staging = Staging::new();
        staging
            .position_mut(&self.ledger, account)
            .remove_debt(amount)?;

        self.settle_debt(payer, amount)?;

        staging.commit(&mut self.ledger);
        info!(?account, amount, "synthetic burned");
        Ok(())
    }

    /// Deposit followed by mint, as one atomic unit.
    pub fn deposit_and_mint(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount_collateral: u128,
        amount_mint: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, ?asset, amount_collateral, amount_mint, "deposit_and_mint");

        if amount_collateral == 0 || amount_mint == 0 {
            return Err(EngineError::MustBePositive);
        }
        if !self.registry.is_allowed(asset) {
            return Err(EngineError::NotAllowedAsset);
        }

        let mut staging = Staging::new();
        {
            let position = staging.position_mut(&self.ledger, account);
            position.add_collateral(*asset, amount_collateral)?;
            position.add_debt(amount_mint)?;
        }
        self.ensure_healthy(&staging, account)?;

        self.custody
            .pull(asset, account, amount_collateral)
            .map_err(|_| EngineError::TransferFailed)?;
        if self.mint_authority.issue(account, amount_mint).is_err() {
            // The pull already happened; return the collateral before
            // discarding the staged state.
            if self.custody.push(asset, account, amount_collateral).is_err() {
                error!(
                    ?account,
                    ?asset,
                    amount_collateral,
                    "collateral return refused, funds stranded in custody"
                );
            }
            return Err(EngineError::MintFailed);
        }

        staging.commit(&mut self.ledger);
        self.events.record(LedgerEvent::CollateralDeposited {
            account: *account,
            asset: *asset,
            amount: amount_collateral,
        });
        info!(?account, amount_collateral, amount_mint, "deposited and minted");
        Ok(())
    }

    /// Burn followed by redeem back to the account, as one atomic unit.
    pub fn redeem_and_burn(
        &mut self,
        account: &AccountId,
        asset: &AssetId,
        amount_collateral: u128,
        amount_burn: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?account, ?asset, amount_collateral, amount_burn, "redeem_and_burn");

        if amount_collateral == 0 || amount_burn == 0 {
            return Err(EngineError::MustBePositive);
        }

        let mut staging = Staging::new();
        {
            let position = staging.position_mut(&self.ledger, account);
            position.remove_debt(amount_burn)?;
            position.remove_collateral(asset, amount_collateral)?;
        }
        self.ensure_healthy(&staging, account)?;

        self.settle_debt(account, amount_burn)?;
        if self.custody.push(asset, account, amount_collateral).is_err() {
            error!(?account, ?asset, "custody refused credit after debt settlement");
            self.unsettle_debt(account, amount_burn);
            return Err(EngineError::TransferFailed);
        }

        staging.commit(&mut self.ledger);
        self.events.record(LedgerEvent::CollateralRedeemed {
            from: *account,
            to: *account,
            asset: *asset,
            amount: amount_collateral,
        });
        info!(?account, amount_collateral, amount_burn, "redeemed and burned");
        Ok(())
    }

    /// Third-party liquidation: the caller repays `debt_to_cover` of the
    /// target's debt and seizes the equivalent collateral plus the
    /// liquidation bonus.
    pub fn liquidate(
        &mut self,
        caller: &AccountId,
        target: &AccountId,
        asset: &AssetId,
        debt_to_cover: u128,
    ) -> Result<(), EngineError> {
        let _guard = OpGuard::acquire(&self.entered)?;
        debug!(?caller, ?target, ?asset, debt_to_cover, "liquidate");

        if debt_to_cover == 0 {
            return Err(EngineError::MustBePositive);
        }
        if !self.registry.is_allowed(asset) {
            return Err(EngineError::NotAllowedAsset);
        }

        let starting_health = self.position_health_factor(&self.ledger.position(target))?;
        if starting_health >= MIN_HEALTH_FACTOR {
            return Err(EngineError::HealthFactorOk);
        }

        // Seizure sizing: debt converted at the oracle price, plus the
        // incentive premium.
        let base = self.collateral_from_usd(asset, debt_to_cover)?;
        let bonus = math::pct(base, LIQUIDATION_BONUS_PCT)?;
        let total_seized = math::checked_add(base, bonus)?;

        let mut staging = Staging::new();
        {
            let position = staging.position_mut(&self.ledger, target);
            position.remove_collateral(asset, total_seized)?;
            position.remove_debt(debt_to_cover)?;
        }

        // The settlement must strictly improve the target.
        let ending_health =
            self.position_health_factor(&staging.position(&self.ledger, target))?;
        if ending_health <= starting_health {
            return Err(EngineError::HealthFactorNotImproved);
        }
        // And must not leave the caller's own position broken.
        self.ensure_healthy(&staging, caller)?;

        self.settle_debt(caller, debt_to_cover)?;
        if self.custody.push(asset, caller, total_seized).is_err() {
            error!(?caller, ?asset, "custody refused seizure credit");
            self.unsettle_debt(caller, debt_to_cover);
            return Err(EngineError::TransferFailed);
        }

        staging.commit(&mut self.ledger);
        self.events.record(LedgerEvent::CollateralRedeemed {
            from: *target,
            to: *caller,
            asset: *asset,
            amount: total_seized,
        });
        info!(
            ?caller,
            ?target,
            debt_to_cover,
            total_seized,
            "position liquidated"
        );
        Ok(())
    }

    // ---- valuation & reads ----

    /// Health factor of an account against current oracle prices.
    pub fn health_factor(&self, account: &AccountId) -> Result<u128, EngineError> {
        self.position_health_factor(&self.ledger.position(account))
    }

    /// USD value (WAD scale) of `amount` of an approved asset.
    pub fn usd_value(&self, asset: &AssetId, amount: u128) -> Result<u128, EngineError> {
        math::mul_div(amount, self.price_of(asset)?, WAD)
    }

    /// Collateral quantity of an approved asset worth `usd` (WAD scale).
    pub fn collateral_from_usd(&self, asset: &AssetId, usd: u128) -> Result<u128, EngineError> {
        math::mul_div(usd, WAD, self.price_of(asset)?)
    }

    /// Total USD value of an account's deposited collateral.
    pub fn collateral_value_usd(&self, account: &AccountId) -> Result<u128, EngineError> {
        self.position_value_usd(&self.ledger.position(account))
    }

    /// Outstanding debt and total collateral value of an account.
    pub fn account_information(&self, account: &AccountId) -> Result<(u128, u128), EngineError> {
        let position = self.ledger.position(account);
        let value = self.position_value_usd(&position)?;
        Ok((position.debt, value))
    }

    pub fn collateral_balance(&self, account: &AccountId, asset: &AssetId) -> u128 {
        self.ledger.position(account).collateral_of(asset)
    }

    pub fn debt_of(&self, account: &AccountId) -> u128 {
        self.ledger.position(account).debt
    }

    pub fn collateral_assets(&self) -> &[AssetId] {
        self.registry.assets()
    }

    pub fn synthetic_asset(&self) -> &AssetId {
        &self.synthetic_asset
    }

    /// Sum of debt across all positions; equals the authority's supply.
    pub fn total_debt(&self) -> u128 {
        self.ledger.total_debt()
    }

    /// Supply tracked by the mint authority, for accounting audits.
    pub fn synthetic_supply(&self) -> u128 {
        self.mint_authority.total_supply()
    }

    /// Read-only view of the position table.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ---- internals ----

    fn price_of(&self, asset: &AssetId) -> Result<u128, EngineError> {
        let adapter: &OracleAdapter = self
            .registry
            .adapter_for(asset)
            .ok_or(EngineError::NotAllowedAsset)?;
        adapter.normalized_price(self.clock.unix_timestamp())
    }

    fn position_value_usd(&self, position: &Position) -> Result<u128, EngineError> {
        let mut total: u128 = 0;
        for asset in self.registry.assets() {
            let amount = position.collateral_of(asset);
            if amount == 0 {
                continue;
            }
            let value = math::mul_div(amount, self.price_of(asset)?, WAD)?;
            total = math::checked_add(total, value)?;
        }
        Ok(total)
    }

    fn position_health_factor(&self, position: &Position) -> Result<u128, EngineError> {
        calculate_health_factor(self.position_value_usd(position)?, position.debt)
    }

    fn ensure_healthy(&self, staging: &Staging, account: &AccountId) -> Result<(), EngineError> {
        let position = staging.position(&self.ledger, account);
        let health = self.position_health_factor(&position)?;
        if health < MIN_HEALTH_FACTOR {
            return Err(EngineError::BrokenHealthFactor);
        }
        Ok(())
    }

    /// Pulls synthetic tokens from `payer` into custody and destroys them.
    fn settle_debt(&mut self, payer: &AccountId, amount: u128) -> Result<(), EngineError> {
        self.custody
            .pull(&self.synthetic_asset, payer, amount)
            .map_err(|_| EngineError::TransferFailed)?;
        if self.mint_authority.destroy(amount).is_err() {
            // The pull already happened; hand the tokens back before
            // reporting the failure.
            if self.custody.push(&self.synthetic_asset, payer, amount).is_err() {
                error!(
                    ?payer,
                    amount,
                    "synthetic return refused, funds stranded in custody"
                );
            }
            return Err(EngineError::MintFailed);
        }
        Ok(())
    }

    /// Reverses a completed settlement by re-issuing the destroyed amount
    /// to the payer. Run when a later step of the operation fails: the
    /// staged debt reduction is about to be discarded, so the supply must
    /// come back up to keep it equal to ledger debt.
    fn unsettle_debt(&mut self, payer: &AccountId, amount: u128) {
        if self.mint_authority.issue(payer, amount).is_err() {
            error!(
                ?payer,
                amount,
                "re-issue after failed operation refused, supply understates ledger debt"
            );
        }
    }
}
