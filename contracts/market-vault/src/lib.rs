#![no_std]
//! A minimal lending market supervised by the risk controller.
//!
//! Depositors receive shares against the underlying at the current exchange
//! rate; borrowers draw on the pooled cash. Every balance-changing entry
//! point consults the controller's gate hook first when a controller is
//! wired; a vault without one applies no cross-market policy, which keeps it
//! usable standalone in tests. Debt carries no interest here, so the borrow
//! index is a constant.

use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env, IntoVal, Symbol};

mod errors;
mod events;
mod storage;
#[cfg(test)]
mod test;

pub use errors::Error;

use events::*;
use storage::DataKey;

pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000;

/// The vault's own numbers, handed to the controller with each gate hook.
/// The host rejects re-entering a contract already on the call stack, so the
/// controller cannot query the vault back mid-action; it works from these
/// instead. Field layout matches the controller's decoding type.
#[contracttype]
#[derive(Clone)]
pub struct MarketHint {
    pub underlying: Address,
    pub exchange_rate: u128, // mantissa 1e18
    pub borrow_index: u128,  // mantissa 1e18
    pub total_shares: u128,
    pub total_borrows: u128,
}

/// One account's balances here, taken before the gated action changes them.
#[contracttype]
#[derive(Clone)]
pub struct AccountHint {
    pub shares: u128,
    pub borrows: u128,
}

#[contract]
pub struct MarketVault;

#[contractimpl]
impl MarketVault {
    pub fn initialize(env: Env, admin: Address, underlying: Address) -> Result<(), Error> {
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
        env.storage().persistent().set(&DataKey::Underlying, &underlying);
        storage::write_total_shares(&env, 0);
        storage::write_total_borrows(&env, 0);
        Ok(())
    }

    pub fn set_controller(env: Env, caller: Address, controller: Address) -> Result<(), Error> {
        caller.require_auth();
        if caller != storage::read_admin(&env)? {
            return Err(Error::Unauthorized);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Controller, &controller);
        ControllerSet { controller }.publish(&env);
        Ok(())
    }

    /// Supplies underlying and mints shares at the pre-transfer exchange
    /// rate. Returns the share count minted.
    pub fn deposit(env: Env, from: Address, amount: u128) -> Result<u128, Error> {
        from.require_auth();
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        Self::hook_mint(&env, &from, amount)?;
        let rate = Self::get_exchange_rate(env.clone())?;
        let underlying = storage::read_underlying(&env)?;
        let client = token::Client::new(&env, &underlying);
        client.transfer(&from, &env.current_contract_address(), &to_i128(amount)?);
        let shares = mul_div(amount, EXP_SCALE, rate)?;
        let held = storage::shares_of(&env, &from)
            .checked_add(shares)
            .ok_or(Error::MathOverflow)?;
        let total = storage::total_shares(&env)
            .checked_add(shares)
            .ok_or(Error::MathOverflow)?;
        storage::write_shares(&env, &from, held);
        storage::write_total_shares(&env, total);
        Deposit {
            user: from,
            amount,
            shares,
        }
        .publish(&env);
        Ok(shares)
    }

    /// Burns shares and pays out underlying at the current exchange rate.
    /// Returns the underlying amount paid.
    pub fn withdraw(env: Env, from: Address, share_amount: u128) -> Result<u128, Error> {
        from.require_auth();
        if share_amount == 0 {
            return Err(Error::InvalidAmount);
        }
        Self::hook_redeem(&env, &from, share_amount)?;
        let held = storage::shares_of(&env, &from);
        if held < share_amount {
            return Err(Error::InsufficientShares);
        }
        let rate = Self::get_exchange_rate(env.clone())?;
        let amount = mul_div(share_amount, rate, EXP_SCALE)?;
        let underlying = storage::read_underlying(&env)?;
        let client = token::Client::new(&env, &underlying);
        if Self::cash(&env)? < amount {
            return Err(Error::InsufficientCash);
        }
        storage::write_shares(&env, &from, held - share_amount);
        storage::write_total_shares(&env, storage::total_shares(&env) - share_amount);
        client.transfer(&env.current_contract_address(), &from, &to_i128(amount)?);
        Withdraw {
            user: from,
            shares: share_amount,
            amount,
        }
        .publish(&env);
        Ok(amount)
    }

    pub fn borrow(env: Env, from: Address, amount: u128) -> Result<(), Error> {
        from.require_auth();
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        Self::hook_borrow(&env, &from, amount)?;
        if Self::cash(&env)? < amount {
            return Err(Error::InsufficientCash);
        }
        let account_borrows = storage::debt_of(&env, &from)
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        let total = storage::total_borrows(&env)
            .checked_add(amount)
            .ok_or(Error::MathOverflow)?;
        storage::write_debt(&env, &from, account_borrows);
        storage::write_total_borrows(&env, total);
        let underlying = storage::read_underlying(&env)?;
        token::Client::new(&env, &underlying).transfer(
            &env.current_contract_address(),
            &from,
            &to_i128(amount)?,
        );
        Borrow {
            user: from,
            amount,
            account_borrows,
            total_borrows: total,
        }
        .publish(&env);
        Ok(())
    }

    /// Repays the caller's own debt, capped at the outstanding balance.
    /// Returns the amount actually repaid.
    pub fn repay(env: Env, from: Address, amount: u128) -> Result<u128, Error> {
        from.require_auth();
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        Self::hook_repay(&env, &from, &from, amount)?;
        Self::settle_repay(&env, &from, &from, amount)
    }

    /// Liquidation repay path, driven by the controller on behalf of a
    /// liquidator. Returns the amount actually repaid.
    pub fn repay_on_behalf(
        env: Env,
        liquidator: Address,
        borrower: Address,
        amount: u128,
    ) -> Result<u128, Error> {
        let controller = storage::controller(&env).ok_or(Error::Unauthorized)?;
        controller.require_auth();
        liquidator.require_auth();
        Self::settle_repay(&env, &liquidator, &borrower, amount)
    }

    /// Moves seized collateral shares from the borrower to the liquidator.
    /// Only the controller may drive this.
    pub fn seize(
        env: Env,
        borrower: Address,
        liquidator: Address,
        share_amount: u128,
    ) -> Result<(), Error> {
        let controller = storage::controller(&env).ok_or(Error::Unauthorized)?;
        controller.require_auth();
        if share_amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let held = storage::shares_of(&env, &borrower);
        if held < share_amount {
            return Err(Error::InsufficientShares);
        }
        let to_held = storage::shares_of(&env, &liquidator)
            .checked_add(share_amount)
            .ok_or(Error::MathOverflow)?;
        storage::write_shares(&env, &borrower, held - share_amount);
        storage::write_shares(&env, &liquidator, to_held);
        Seize {
            borrower,
            liquidator,
            shares: share_amount,
        }
        .publish(&env);
        Ok(())
    }

    /// Share-to-share transfer, gated like a redeem on the sender.
    pub fn transfer_shares(
        env: Env,
        from: Address,
        to: Address,
        share_amount: u128,
    ) -> Result<(), Error> {
        from.require_auth();
        if share_amount == 0 {
            return Err(Error::InvalidAmount);
        }
        Self::hook_transfer(&env, &from, &to, share_amount)?;
        let held = storage::shares_of(&env, &from);
        if held < share_amount {
            return Err(Error::InsufficientShares);
        }
        let to_held = storage::shares_of(&env, &to)
            .checked_add(share_amount)
            .ok_or(Error::MathOverflow)?;
        storage::write_shares(&env, &from, held - share_amount);
        storage::write_shares(&env, &to, to_held);
        Ok(())
    }

    // ---- controller surface ----

    /// (error code, share balance, borrow balance, exchange rate 1e18).
    /// A nonzero error code means the other fields are meaningless.
    pub fn get_account_snapshot(env: Env, user: Address) -> (u32, u128, u128, u128) {
        match Self::get_exchange_rate(env.clone()) {
            Ok(rate) => (
                0,
                storage::shares_of(&env, &user),
                storage::debt_of(&env, &user),
                rate,
            ),
            Err(_) => (1, 0, 0, 0),
        }
    }

    /// Underlying per share, mantissa 1e18. One-to-one while the vault is
    /// empty.
    pub fn get_exchange_rate(env: Env) -> Result<u128, Error> {
        let shares = storage::total_shares(&env);
        if shares == 0 {
            return Ok(EXP_SCALE);
        }
        let backing = Self::cash(&env)?
            .checked_add(storage::total_borrows(&env))
            .ok_or(Error::MathOverflow)?;
        mul_div(backing, EXP_SCALE, shares)
    }

    pub fn get_total_shares(env: Env) -> u128 {
        storage::total_shares(&env)
    }

    pub fn get_total_borrows(env: Env) -> u128 {
        storage::total_borrows(&env)
    }

    pub fn get_borrow_index(_env: Env) -> u128 {
        EXP_SCALE
    }

    pub fn get_share_balance(env: Env, user: Address) -> u128 {
        storage::shares_of(&env, &user)
    }

    pub fn get_borrow_balance(env: Env, user: Address) -> u128 {
        storage::debt_of(&env, &user)
    }

    pub fn get_underlying_asset(env: Env) -> Result<Address, Error> {
        storage::read_underlying(&env)
    }

    pub fn get_admin(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Admin)
    }

    pub fn get_controller(env: Env) -> Option<Address> {
        storage::controller(&env)
    }

    // ---- internals ----

    fn cash(env: &Env) -> Result<u128, Error> {
        let underlying = storage::read_underlying(env)?;
        let balance = token::Client::new(env, &underlying).balance(&env.current_contract_address());
        u128::try_from(balance).map_err(|_| Error::MathOverflow)
    }

    fn settle_repay(
        env: &Env,
        payer: &Address,
        borrower: &Address,
        amount: u128,
    ) -> Result<u128, Error> {
        let debt = storage::debt_of(env, borrower);
        let pay = if amount > debt { debt } else { amount };
        if pay == 0 {
            return Ok(0);
        }
        let underlying = storage::read_underlying(env)?;
        token::Client::new(env, &underlying).transfer(
            payer,
            &env.current_contract_address(),
            &to_i128(pay)?,
        );
        let account_borrows = debt - pay;
        let total = storage::total_borrows(env)
            .checked_sub(pay)
            .ok_or(Error::MathOverflow)?;
        storage::write_debt(env, borrower, account_borrows);
        storage::write_total_borrows(env, total);
        RepayBorrow {
            payer: payer.clone(),
            borrower: borrower.clone(),
            repay_amount: pay,
            account_borrows,
            total_borrows: total,
        }
        .publish(env);
        Ok(pay)
    }

    fn self_hint(env: &Env) -> Result<MarketHint, Error> {
        Ok(MarketHint {
            underlying: storage::read_underlying(env)?,
            exchange_rate: Self::get_exchange_rate(env.clone())?,
            borrow_index: EXP_SCALE,
            total_shares: storage::total_shares(env),
            total_borrows: storage::total_borrows(env),
        })
    }

    fn account_hint(env: &Env, user: &Address) -> AccountHint {
        AccountHint {
            shares: storage::shares_of(env, user),
            borrows: storage::debt_of(env, user),
        }
    }

    fn hook_mint(env: &Env, user: &Address, amount: u128) -> Result<(), Error> {
        if let Some(controller) = storage::controller(env) {
            let hint = Self::self_hint(env)?;
            env.invoke_contract::<()>(
                &controller,
                &Symbol::new(env, "mint_allowed"),
                (
                    env.current_contract_address(),
                    user.clone(),
                    amount,
                    hint,
                    Self::account_hint(env, user),
                )
                    .into_val(env),
            );
        }
        Ok(())
    }

    fn hook_redeem(env: &Env, user: &Address, share_amount: u128) -> Result<(), Error> {
        if let Some(controller) = storage::controller(env) {
            let hint = Self::self_hint(env)?;
            env.invoke_contract::<()>(
                &controller,
                &Symbol::new(env, "redeem_allowed"),
                (
                    env.current_contract_address(),
                    user.clone(),
                    share_amount,
                    hint,
                    Self::account_hint(env, user),
                )
                    .into_val(env),
            );
        }
        Ok(())
    }

    fn hook_borrow(env: &Env, user: &Address, amount: u128) -> Result<(), Error> {
        if let Some(controller) = storage::controller(env) {
            let hint = Self::self_hint(env)?;
            env.invoke_contract::<()>(
                &controller,
                &Symbol::new(env, "borrow_allowed"),
                (
                    env.current_contract_address(),
                    user.clone(),
                    amount,
                    hint,
                    Self::account_hint(env, user),
                )
                    .into_val(env),
            );
        }
        Ok(())
    }

    fn hook_repay(
        env: &Env,
        payer: &Address,
        borrower: &Address,
        amount: u128,
    ) -> Result<(), Error> {
        if let Some(controller) = storage::controller(env) {
            let hint = Self::self_hint(env)?;
            env.invoke_contract::<()>(
                &controller,
                &Symbol::new(env, "repay_allowed"),
                (
                    env.current_contract_address(),
                    payer.clone(),
                    borrower.clone(),
                    amount,
                    hint,
                    Self::account_hint(env, borrower),
                )
                    .into_val(env),
            );
        }
        Ok(())
    }

    fn hook_transfer(
        env: &Env,
        from: &Address,
        to: &Address,
        share_amount: u128,
    ) -> Result<(), Error> {
        if let Some(controller) = storage::controller(env) {
            let hint = Self::self_hint(env)?;
            env.invoke_contract::<()>(
                &controller,
                &Symbol::new(env, "transfer_allowed"),
                (
                    env.current_contract_address(),
                    from.clone(),
                    to.clone(),
                    share_amount,
                    hint,
                    Self::account_hint(env, from),
                    Self::account_hint(env, to),
                )
                    .into_val(env),
            );
        }
        Ok(())
    }
}

fn to_i128(value: u128) -> Result<i128, Error> {
    i128::try_from(value).map_err(|_| Error::MathOverflow)
}

fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, Error> {
    if c == 0 {
        return Err(Error::MathOverflow);
    }
    Ok(a.checked_mul(b).ok_or(Error::MathOverflow)? / c)
}
