#![no_std]
//! Risk controller for a collateralized lending venue.
//!
//! Market vaults hold balances and move tokens; this contract decides what
//! they may do. It tracks which markets each account has entered, prices
//! positions through an external oracle, computes hypothetical account
//! liquidity, sizes liquidation seizures, and meters out protocol rewards to
//! suppliers and borrowers.
//!
//! Gate hooks are invoked by the market mid-action, and the host forbids
//! calling back into a contract already on the stack. Each hook therefore
//! receives the calling market's own numbers as hints; only the account's
//! other markets are queried cross-contract.

use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Vec};

mod errors;
mod events;
mod exp;
mod market;
mod oracle;
mod rewards;
mod storage;

pub use errors::Error;
pub use exp::{DOUBLE_SCALE, EXP_SCALE};
pub use oracle::{PriceOracle, PriceOracleClient};
pub use storage::{AccountHint, MarketHint, MarketState, RewardIndexState};

use events::*;
use exp::Exp;
use oracle::PriceOracleClient as OracleClient;
use storage::DataKey;

const MAX_COLLATERAL_FACTOR: u128 = 900_000_000_000_000_000; // 0.9
const DEFAULT_CLOSE_FACTOR: u128 = 500_000_000_000_000_000; // 0.5
const DEFAULT_LIQUIDATION_INCENTIVE: u128 = 1_080_000_000_000_000_000; // 1.08

type InFlight<'a> = (&'a Address, &'a MarketHint, &'a AccountHint);

#[contract]
pub struct RiskController;

#[contractimpl]
impl RiskController {
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        env.storage().persistent().set(&DataKey::Admin, &admin);
        env.storage()
            .persistent()
            .set(&DataKey::Markets, &Vec::<Address>::new(&env));
        env.storage()
            .persistent()
            .set(&DataKey::CloseFactor, &DEFAULT_CLOSE_FACTOR);
        env.storage()
            .persistent()
            .set(&DataKey::LiquidationIncentive, &DEFAULT_LIQUIDATION_INCENTIVE);
        env.storage().persistent().set(&DataKey::TransferPaused, &false);
        env.storage().persistent().set(&DataKey::SeizePaused, &false);
        Ok(())
    }

    // ---- admin surface ----

    pub fn set_price_oracle(env: Env, caller: Address, oracle: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::Oracle, &oracle);
        OracleUpdated { oracle }.publish(&env);
        Ok(())
    }

    /// Lists a market. Listing is one-time; the market starts with a zero
    /// collateral factor and no borrow cap.
    pub fn support_market(env: Env, caller: Address, market: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if storage::is_listed(&env, &market) {
            return Err(Error::MarketAlreadyListed);
        }
        storage::write_market(
            &env,
            &market,
            &MarketState {
                collateral_factor: 0,
                borrow_cap: 0,
                supply_reward_speed: 0,
                borrow_reward_speed: 0,
                mint_paused: false,
                borrow_paused: false,
                deprecated: false,
            },
        );
        storage::push_market(&env, &market);
        rewards::init_market_states(&env, &market);
        MarketListed { market }.publish(&env);
        Ok(())
    }

    pub fn set_collateral_factor(
        env: Env,
        caller: Address,
        market: Address,
        new_factor: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let mut state = storage::read_market(&env, &market)?;
        if new_factor > MAX_COLLATERAL_FACTOR {
            return Err(Error::InvalidParameter);
        }
        // A collateral factor on an unpriceable asset would let deposits
        // count for nothing while still gating exits.
        if new_factor > 0 {
            let asset = market::underlying_asset(&env, &market);
            Self::asset_price(&env, &asset)?;
        }
        state.collateral_factor = new_factor;
        storage::write_market(&env, &market, &state);
        CollateralFactorUpdated {
            market,
            factor_mantissa: new_factor,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_close_factor(env: Env, caller: Address, close_factor: u128) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if close_factor > EXP_SCALE {
            return Err(Error::InvalidParameter);
        }
        env.storage()
            .persistent()
            .set(&DataKey::CloseFactor, &close_factor);
        CloseFactorUpdated {
            close_factor_mantissa: close_factor,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_liquidation_incentive(
        env: Env,
        caller: Address,
        incentive: u128,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if incentive < EXP_SCALE {
            return Err(Error::InvalidParameter);
        }
        env.storage()
            .persistent()
            .set(&DataKey::LiquidationIncentive, &incentive);
        LiquidationIncentiveUpdated {
            incentive_mantissa: incentive,
        }
        .publish(&env);
        Ok(())
    }

    /// Sets borrow caps for several markets at once. A cap of zero means
    /// unlimited. Admin or pause guardian.
    pub fn set_borrow_caps(
        env: Env,
        caller: Address,
        markets: Vec<Address>,
        caps: Vec<u128>,
    ) -> Result<(), Error> {
        storage::require_admin_or_guardian(&env, &caller)?;
        if markets.len() != caps.len() || markets.is_empty() {
            return Err(Error::InvalidParameter);
        }
        for i in 0..markets.len() {
            let m = markets.get_unchecked(i);
            let cap = caps.get_unchecked(i);
            let mut state = storage::read_market(&env, &m)?;
            state.borrow_cap = cap;
            storage::write_market(&env, &m, &state);
            BorrowCapUpdated { market: m, cap }.publish(&env);
        }
        Ok(())
    }

    pub fn set_pause_guardian(env: Env, caller: Address, guardian: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage()
            .persistent()
            .set(&DataKey::PauseGuardian, &guardian);
        PauseGuardianUpdated { guardian }.publish(&env);
        Ok(())
    }

    pub fn set_mint_paused(
        env: Env,
        caller: Address,
        market: Address,
        paused: bool,
    ) -> Result<(), Error> {
        let mut state = storage::read_market(&env, &market)?;
        Self::require_pause_auth(&env, &caller, paused)?;
        state.mint_paused = paused;
        storage::write_market(&env, &market, &state);
        MarketActionPauseUpdated {
            market,
            action: symbol_short!("mint"),
            paused,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_borrow_paused(
        env: Env,
        caller: Address,
        market: Address,
        paused: bool,
    ) -> Result<(), Error> {
        let mut state = storage::read_market(&env, &market)?;
        Self::require_pause_auth(&env, &caller, paused)?;
        state.borrow_paused = paused;
        storage::write_market(&env, &market, &state);
        MarketActionPauseUpdated {
            market,
            action: symbol_short!("borrow"),
            paused,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_transfer_paused(env: Env, caller: Address, paused: bool) -> Result<(), Error> {
        Self::require_pause_auth(&env, &caller, paused)?;
        env.storage()
            .persistent()
            .set(&DataKey::TransferPaused, &paused);
        GlobalActionPauseUpdated {
            action: symbol_short!("transfer"),
            paused,
        }
        .publish(&env);
        Ok(())
    }

    pub fn set_seize_paused(env: Env, caller: Address, paused: bool) -> Result<(), Error> {
        Self::require_pause_auth(&env, &caller, paused)?;
        env.storage().persistent().set(&DataKey::SeizePaused, &paused);
        GlobalActionPauseUpdated {
            action: symbol_short!("seize"),
            paused,
        }
        .publish(&env);
        Ok(())
    }

    /// Marks a market as deprecated. Borrowers in a deprecated market can be
    /// liquidated regardless of shortfall, capped only by their outstanding
    /// balance.
    pub fn set_market_deprecated(
        env: Env,
        caller: Address,
        market: Address,
        deprecated: bool,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        let mut state = storage::read_market(&env, &market)?;
        state.deprecated = deprecated;
        storage::write_market(&env, &market, &state);
        MarketDeprecationUpdated { market, deprecated }.publish(&env);
        Ok(())
    }

    pub fn set_reward_token(env: Env, caller: Address, token: Address) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        env.storage().persistent().set(&DataKey::RewardToken, &token);
        RewardTokenSet { token }.publish(&env);
        Ok(())
    }

    /// Updates reward emission speeds. Each market's indices are brought
    /// current under the old speed before the new one takes effect.
    pub fn set_reward_speeds(
        env: Env,
        caller: Address,
        markets: Vec<Address>,
        supply_speeds: Vec<u128>,
        borrow_speeds: Vec<u128>,
    ) -> Result<(), Error> {
        storage::require_admin(&env, &caller)?;
        if markets.len() != supply_speeds.len()
            || markets.len() != borrow_speeds.len()
            || markets.is_empty()
        {
            return Err(Error::InvalidParameter);
        }
        for i in 0..markets.len() {
            let m = markets.get_unchecked(i);
            storage::read_market(&env, &m)?;
            rewards::update_supply_index(&env, &m, market::total_shares(&env, &m))?;
            rewards::update_borrow_index(
                &env,
                &m,
                market::total_borrows(&env, &m),
                market::borrow_index(&env, &m),
            )?;
            let mut state = storage::read_market(&env, &m)?;
            state.supply_reward_speed = supply_speeds.get_unchecked(i);
            state.borrow_reward_speed = borrow_speeds.get_unchecked(i);
            storage::write_market(&env, &m, &state);
            RewardSpeedUpdated {
                market: m,
                supply_speed: supply_speeds.get_unchecked(i),
                borrow_speed: borrow_speeds.get_unchecked(i),
            }
            .publish(&env);
        }
        Ok(())
    }

    // ---- membership ----

    pub fn enter_markets(env: Env, account: Address, markets: Vec<Address>) -> Result<(), Error> {
        account.require_auth();
        for m in markets.iter() {
            storage::read_market(&env, &m)?;
            if !storage::is_member(&env, &m, &account) {
                storage::add_to_market(&env, &m, &account);
                MarketEntered {
                    account: account.clone(),
                    market: m,
                }
                .publish(&env);
            }
        }
        Ok(())
    }

    /// Leaves a market. Rejected while the account owes the market anything
    /// or while its shares there are load-bearing collateral.
    pub fn exit_market(env: Env, account: Address, market: Address) -> Result<(), Error> {
        account.require_auth();
        storage::read_market(&env, &market)?;
        let (shares, debt, _rate) = market::account_snapshot(&env, &market, &account)?;
        if debt > 0 {
            return Err(Error::NonzeroBorrowBalance);
        }
        Self::redeem_checks(&env, &market, &account, shares, None)?;
        if !storage::is_member(&env, &market, &account) {
            return Ok(());
        }
        storage::remove_from_market(&env, &market, &account);
        MarketExited { account, market }.publish(&env);
        Ok(())
    }

    // ---- liquidity ----

    /// Current account liquidity as `(liquidity, shortfall)`, both USD at
    /// mantissa 1e18. At most one of the pair is nonzero.
    pub fn get_account_liquidity(env: Env, account: Address) -> Result<(u128, u128), Error> {
        Self::hypothetical(&env, &account, None, 0, 0, None)
    }

    /// Liquidity as it would stand after redeeming `redeem_tokens` shares of
    /// `market` and borrowing `borrow_amount` of its underlying.
    pub fn hypothetical_account_liquidity(
        env: Env,
        account: Address,
        market: Address,
        redeem_tokens: u128,
        borrow_amount: u128,
    ) -> Result<(u128, u128), Error> {
        Self::hypothetical(
            &env,
            &account,
            Some(&market),
            redeem_tokens,
            borrow_amount,
            None,
        )
    }

    // ---- policy gate ----

    pub fn mint_allowed(
        env: Env,
        market: Address,
        minter: Address,
        _mint_amount: u128,
        market_hint: MarketHint,
        minter_hint: AccountHint,
    ) -> Result<(), Error> {
        let state = storage::read_market(&env, &market)?;
        if state.mint_paused {
            return Err(Error::ActionPaused);
        }
        rewards::update_supply_index(&env, &market, market_hint.total_shares)?;
        rewards::distribute_supplier(&env, &market, &minter, minter_hint.shares)?;
        Ok(())
    }

    pub fn redeem_allowed(
        env: Env,
        market: Address,
        redeemer: Address,
        redeem_tokens: u128,
        market_hint: MarketHint,
        redeemer_hint: AccountHint,
    ) -> Result<(), Error> {
        Self::redeem_checks(
            &env,
            &market,
            &redeemer,
            redeem_tokens,
            Some((&market, &market_hint, &redeemer_hint)),
        )?;
        rewards::update_supply_index(&env, &market, market_hint.total_shares)?;
        rewards::distribute_supplier(&env, &market, &redeemer, redeemer_hint.shares)?;
        Ok(())
    }

    pub fn borrow_allowed(
        env: Env,
        market: Address,
        borrower: Address,
        borrow_amount: u128,
        market_hint: MarketHint,
        borrower_hint: AccountHint,
    ) -> Result<(), Error> {
        let state = storage::read_market(&env, &market)?;
        if state.borrow_paused {
            return Err(Error::ActionPaused);
        }
        // First borrow against a market enters it implicitly.
        if !storage::is_member(&env, &market, &borrower) {
            storage::add_to_market(&env, &market, &borrower);
            MarketEntered {
                account: borrower.clone(),
                market: market.clone(),
            }
            .publish(&env);
        }
        Self::asset_price(&env, &market_hint.underlying)?;
        if state.borrow_cap != 0 {
            let next_total = market_hint
                .total_borrows
                .checked_add(borrow_amount)
                .ok_or(Error::MathOverflow)?;
            if next_total > state.borrow_cap {
                return Err(Error::BorrowCapExceeded);
            }
        }
        let (_, shortfall) = Self::hypothetical(
            &env,
            &borrower,
            Some(&market),
            0,
            borrow_amount,
            Some((&market, &market_hint, &borrower_hint)),
        )?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
        rewards::update_borrow_index(
            &env,
            &market,
            market_hint.total_borrows,
            market_hint.borrow_index,
        )?;
        rewards::distribute_borrower(
            &env,
            &market,
            &borrower,
            borrower_hint.borrows,
            market_hint.borrow_index,
        )?;
        Ok(())
    }

    pub fn repay_allowed(
        env: Env,
        market: Address,
        _payer: Address,
        borrower: Address,
        _repay_amount: u128,
        market_hint: MarketHint,
        borrower_hint: AccountHint,
    ) -> Result<(), Error> {
        storage::read_market(&env, &market)?;
        rewards::update_borrow_index(
            &env,
            &market,
            market_hint.total_borrows,
            market_hint.borrow_index,
        )?;
        rewards::distribute_borrower(
            &env,
            &market,
            &borrower,
            borrower_hint.borrows,
            market_hint.borrow_index,
        )?;
        Ok(())
    }

    pub fn liquidate_allowed(
        env: Env,
        borrowed_market: Address,
        collateral_market: Address,
        _liquidator: Address,
        borrower: Address,
        repay_amount: u128,
    ) -> Result<(), Error> {
        let borrowed_state = storage::read_market(&env, &borrowed_market)?;
        storage::read_market(&env, &collateral_market)?;
        let debt = market::borrow_balance(&env, &borrowed_market, &borrower);
        if borrowed_state.deprecated {
            if repay_amount > debt {
                return Err(Error::TooMuchRepay);
            }
            return Ok(());
        }
        let (_, shortfall) = Self::hypothetical(&env, &borrower, None, 0, 0, None)?;
        if shortfall == 0 {
            return Err(Error::InsufficientShortfall);
        }
        let close_factor = Exp(Self::get_close_factor(env.clone()));
        let max_close = close_factor.mul_scalar_truncate(debt)?;
        if repay_amount > max_close {
            return Err(Error::TooMuchRepay);
        }
        Ok(())
    }

    pub fn seize_allowed(
        env: Env,
        collateral_market: Address,
        borrowed_market: Address,
        liquidator: Address,
        borrower: Address,
        _seize_tokens: u128,
    ) -> Result<(), Error> {
        let paused: bool = env
            .storage()
            .persistent()
            .get(&DataKey::SeizePaused)
            .unwrap_or(false);
        if paused {
            return Err(Error::ActionPaused);
        }
        storage::read_market(&env, &collateral_market)?;
        storage::read_market(&env, &borrowed_market)?;
        let total = market::total_shares(&env, &collateral_market);
        rewards::update_supply_index(&env, &collateral_market, total)?;
        rewards::distribute_supplier(
            &env,
            &collateral_market,
            &borrower,
            market::share_balance(&env, &collateral_market, &borrower),
        )?;
        rewards::distribute_supplier(
            &env,
            &collateral_market,
            &liquidator,
            market::share_balance(&env, &collateral_market, &liquidator),
        )?;
        Ok(())
    }

    pub fn transfer_allowed(
        env: Env,
        market: Address,
        src: Address,
        dst: Address,
        transfer_tokens: u128,
        market_hint: MarketHint,
        src_hint: AccountHint,
        dst_hint: AccountHint,
    ) -> Result<(), Error> {
        let paused: bool = env
            .storage()
            .persistent()
            .get(&DataKey::TransferPaused)
            .unwrap_or(false);
        if paused {
            return Err(Error::ActionPaused);
        }
        Self::redeem_checks(
            &env,
            &market,
            &src,
            transfer_tokens,
            Some((&market, &market_hint, &src_hint)),
        )?;
        rewards::update_supply_index(&env, &market, market_hint.total_shares)?;
        rewards::distribute_supplier(&env, &market, &src, src_hint.shares)?;
        rewards::distribute_supplier(&env, &market, &dst, dst_hint.shares)?;
        Ok(())
    }

    // ---- liquidation sizing ----

    /// Collateral shares a liquidator receives for repaying `repay_amount`
    /// of the borrowed market's underlying:
    /// (incentive * price_borrowed) / (price_collateral * exchange_rate),
    /// truncated against the repay amount.
    pub fn liquidate_calculate_seize_tokens(
        env: Env,
        borrowed_market: Address,
        collateral_market: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        let borrowed_asset = market::underlying_asset(&env, &borrowed_market);
        let collateral_asset = market::underlying_asset(&env, &collateral_market);
        let price_borrowed = Self::asset_price(&env, &borrowed_asset)?;
        let price_collateral = Self::asset_price(&env, &collateral_asset)?;
        let rate = Exp(market::exchange_rate(&env, &collateral_market));
        let incentive = Exp(Self::get_liquidation_incentive(env.clone()));
        let numerator = incentive.mul(price_borrowed)?;
        let denominator = price_collateral.mul(rate)?;
        let ratio = numerator.div(denominator)?;
        ratio.mul_scalar_truncate(repay_amount)
    }

    /// Full liquidation flow: gate the repay, size the seizure, then drive
    /// both vaults. Returns the seized share count.
    pub fn liquidate(
        env: Env,
        liquidator: Address,
        borrower: Address,
        borrowed_market: Address,
        collateral_market: Address,
        repay_amount: u128,
    ) -> Result<u128, Error> {
        liquidator.require_auth();
        if liquidator == borrower || repay_amount == 0 {
            return Err(Error::InvalidParameter);
        }
        Self::liquidate_allowed(
            env.clone(),
            borrowed_market.clone(),
            collateral_market.clone(),
            liquidator.clone(),
            borrower.clone(),
            repay_amount,
        )?;
        // Settle the borrower's borrow-side rewards before the repay moves
        // the balance.
        let borrow_index = market::borrow_index(&env, &borrowed_market);
        rewards::update_borrow_index(
            &env,
            &borrowed_market,
            market::total_borrows(&env, &borrowed_market),
            borrow_index,
        )?;
        rewards::distribute_borrower(
            &env,
            &borrowed_market,
            &borrower,
            market::borrow_balance(&env, &borrowed_market, &borrower),
            borrow_index,
        )?;
        let seize_tokens = Self::liquidate_calculate_seize_tokens(
            env.clone(),
            borrowed_market.clone(),
            collateral_market.clone(),
            repay_amount,
        )?;
        if seize_tokens > market::share_balance(&env, &collateral_market, &borrower) {
            return Err(Error::TooMuchSeize);
        }
        Self::seize_allowed(
            env.clone(),
            collateral_market.clone(),
            borrowed_market.clone(),
            liquidator.clone(),
            borrower.clone(),
            seize_tokens,
        )?;
        market::repay_on_behalf(&env, &borrowed_market, &liquidator, &borrower, repay_amount);
        market::seize(&env, &collateral_market, &borrower, &liquidator, seize_tokens);
        LiquidateBorrow {
            liquidator,
            borrower,
            borrowed_market,
            collateral_market,
            repay_amount,
            seize_tokens,
        }
        .publish(&env);
        Ok(seize_tokens)
    }

    // ---- rewards ----

    /// Brings one account current in one market. Permissionless; settling
    /// someone else's rewards only moves value toward them.
    pub fn accrue_account(env: Env, account: Address, market: Address) -> Result<(), Error> {
        Self::settle_account_in_market(&env, &market, &account)
    }

    /// Settles the account across its entered markets and pays the accrued
    /// balance from the controller's reward pool. If the pool cannot cover
    /// the full amount nothing is paid and the balance stays accrued.
    pub fn claim_reward(env: Env, account: Address) -> Result<u128, Error> {
        for m in storage::entered_markets(&env, &account).iter() {
            Self::settle_account_in_market(&env, &m, &account)?;
        }
        let owed = rewards::accrued(&env, &account);
        if owed == 0 {
            return Ok(0);
        }
        let reward_token: Option<Address> = env.storage().persistent().get(&DataKey::RewardToken);
        let Some(reward_token) = reward_token else {
            return Ok(0);
        };
        if owed > i128::MAX as u128 {
            return Ok(0);
        }
        let client = token::Client::new(&env, &reward_token);
        let amount = owed as i128;
        if client.balance(&env.current_contract_address()) < amount {
            return Ok(0);
        }
        client.transfer(&env.current_contract_address(), &account, &amount);
        rewards::set_accrued(&env, &account, 0);
        RewardClaimed {
            account,
            amount: owed,
        }
        .publish(&env);
        Ok(owed)
    }

    pub fn claim_rewards(env: Env, accounts: Vec<Address>) -> Result<(), Error> {
        for account in accounts.iter() {
            Self::claim_reward(env.clone(), account)?;
        }
        Ok(())
    }

    // ---- views ----

    pub fn get_admin(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Admin)
    }

    pub fn get_pause_guardian(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::PauseGuardian)
    }

    pub fn get_price_oracle(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Oracle)
    }

    pub fn get_reward_token(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::RewardToken)
    }

    pub fn get_close_factor(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::CloseFactor)
            .unwrap_or(DEFAULT_CLOSE_FACTOR)
    }

    pub fn get_liquidation_incentive(env: Env) -> u128 {
        env.storage()
            .persistent()
            .get(&DataKey::LiquidationIncentive)
            .unwrap_or(DEFAULT_LIQUIDATION_INCENTIVE)
    }

    pub fn get_all_markets(env: Env) -> Vec<Address> {
        storage::all_markets(&env)
    }

    pub fn get_market(env: Env, market: Address) -> Result<MarketState, Error> {
        storage::read_market(&env, &market)
    }

    pub fn get_borrow_cap(env: Env, market: Address) -> Result<u128, Error> {
        Ok(storage::read_market(&env, &market)?.borrow_cap)
    }

    pub fn is_market_member(env: Env, market: Address, account: Address) -> bool {
        storage::is_member(&env, &market, &account)
    }

    pub fn get_entered_markets(env: Env, account: Address) -> Vec<Address> {
        storage::entered_markets(&env, &account)
    }

    pub fn get_reward_accrued(env: Env, account: Address) -> u128 {
        rewards::accrued(&env, &account)
    }

    pub fn get_reward_supply_state(env: Env, market: Address) -> RewardIndexState {
        rewards::supply_state(&env, &market)
    }

    pub fn get_reward_borrow_state(env: Env, market: Address) -> RewardIndexState {
        rewards::borrow_state(&env, &market)
    }

    // ---- internals ----

    fn require_pause_auth(env: &Env, caller: &Address, pausing: bool) -> Result<(), Error> {
        if pausing {
            storage::require_admin_or_guardian(env, caller)
        } else {
            // Only the admin may switch an action back on.
            storage::require_admin(env, caller)
        }
    }

    fn settle_account_in_market(
        env: &Env,
        market: &Address,
        account: &Address,
    ) -> Result<(), Error> {
        rewards::update_supply_index(env, market, market::total_shares(env, market))?;
        let borrow_index = market::borrow_index(env, market);
        rewards::update_borrow_index(
            env,
            market,
            market::total_borrows(env, market),
            borrow_index,
        )?;
        rewards::distribute_supplier(
            env,
            market,
            account,
            market::share_balance(env, market, account),
        )?;
        rewards::distribute_borrower(
            env,
            market,
            account,
            market::borrow_balance(env, market, account),
            borrow_index,
        )?;
        Ok(())
    }

    fn redeem_checks(
        env: &Env,
        market: &Address,
        redeemer: &Address,
        redeem_tokens: u128,
        inflight: Option<InFlight>,
    ) -> Result<(), Error> {
        storage::read_market(env, market)?;
        // Shares in a market the holder never entered back nothing, so they
        // may always leave.
        if !storage::is_member(env, market, redeemer) {
            return Ok(());
        }
        let (_, shortfall) =
            Self::hypothetical(env, redeemer, Some(market), redeem_tokens, 0, inflight)?;
        if shortfall > 0 {
            return Err(Error::InsufficientLiquidity);
        }
        Ok(())
    }

    fn asset_price(env: &Env, asset: &Address) -> Result<Exp, Error> {
        let oracle: Address = env
            .storage()
            .persistent()
            .get(&DataKey::Oracle)
            .ok_or(Error::PriceUnavailable)?;
        let price = OracleClient::new(env, &oracle).get_underlying_price(asset);
        if price == 0 {
            return Err(Error::PriceUnavailable);
        }
        Ok(Exp(price))
    }

    /// Walks the account's entered markets in entry order, pricing each
    /// position. Held shares scale by collateral_factor * exchange_rate *
    /// price; debts scale by price alone. The hypothetical redeem counts
    /// against the account as if it were debt, so a redeem that would tip
    /// the account into shortfall shows up before it happens. When a market
    /// is in flight its numbers come from the hint instead of a call back
    /// into it.
    fn hypothetical(
        env: &Env,
        account: &Address,
        modify: Option<&Address>,
        redeem_tokens: u128,
        borrow_amount: u128,
        inflight: Option<InFlight>,
    ) -> Result<(u128, u128), Error> {
        let mut collateral_sum: u128 = 0;
        let mut debt_sum: u128 = 0;
        for m in storage::entered_markets(env, account).iter() {
            let state = storage::read_market(env, &m)?;
            let (shares, debt, rate, asset) = match inflight {
                Some((im, mh, ah)) if *im == m => (
                    ah.shares,
                    ah.borrows,
                    mh.exchange_rate,
                    mh.underlying.clone(),
                ),
                _ => {
                    let (shares, debt, rate) = market::account_snapshot(env, &m, account)?;
                    (shares, debt, rate, market::underlying_asset(env, &m))
                }
            };
            let price = Self::asset_price(env, &asset)?;
            let conversion = Exp(state.collateral_factor).mul(Exp(rate))?.mul(price)?;
            collateral_sum = conversion.mul_scalar_truncate_add(shares, collateral_sum)?;
            debt_sum = price.mul_scalar_truncate_add(debt, debt_sum)?;
            if let Some(target) = modify {
                if *target == m {
                    debt_sum = conversion.mul_scalar_truncate_add(redeem_tokens, debt_sum)?;
                    debt_sum = price.mul_scalar_truncate_add(borrow_amount, debt_sum)?;
                }
            }
        }
        if collateral_sum >= debt_sum {
            Ok((collateral_sum - debt_sum, 0))
        } else {
            Ok((0, debt_sum - collateral_sum))
        }
    }
}
