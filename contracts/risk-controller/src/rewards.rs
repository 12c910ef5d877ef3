//! Reward flywheel: per-market cumulative indices and per-account
//! settlement.
//!
//! Each side of a market (supply, borrow) carries a cumulative index at
//! mantissa 1e36 together with the ledger sequence it was last advanced to.
//! Advancing multiplies elapsed blocks by the configured speed and spreads
//! the product over the participating size; settling an account pays out the
//! index movement since the account last settled, proportional to its
//! balance. Accrual never consults the oracle, so reward bookkeeping keeps
//! working while prices are unavailable.
//!
//! Sizes and balances are supplied by the caller: gate hooks forward the
//! in-flight market's hint, top-level paths fetch them cross-contract.

use soroban_sdk::{Address, Env};

use crate::errors::Error;
use crate::exp::{div_by_exp, Double, Exp, DOUBLE_SCALE};
use crate::storage::{self, DataKey, RewardIndexState};

pub const INITIAL_REWARD_INDEX: u128 = DOUBLE_SCALE;

fn fresh_state(env: &Env) -> RewardIndexState {
    RewardIndexState {
        index: INITIAL_REWARD_INDEX,
        block: env.ledger().sequence(),
    }
}

pub fn supply_state(env: &Env, market: &Address) -> RewardIndexState {
    env.storage()
        .persistent()
        .get(&DataKey::SupplyRewardState(market.clone()))
        .unwrap_or_else(|| fresh_state(env))
}

pub fn borrow_state(env: &Env, market: &Address) -> RewardIndexState {
    env.storage()
        .persistent()
        .get(&DataKey::BorrowRewardState(market.clone()))
        .unwrap_or_else(|| fresh_state(env))
}

pub fn init_market_states(env: &Env, market: &Address) {
    let state = fresh_state(env);
    env.storage()
        .persistent()
        .set(&DataKey::SupplyRewardState(market.clone()), &state);
    env.storage()
        .persistent()
        .set(&DataKey::BorrowRewardState(market.clone()), &state);
}

/// Advances the supply-side index to the current ledger sequence. The stored
/// block moves forward even when the speed or the participating size is
/// zero, so a later first supplier cannot back-collect the idle interval.
pub fn update_supply_index(env: &Env, market: &Address, total_shares: u128) -> Result<(), Error> {
    let mut state = supply_state(env, market);
    let block = env.ledger().sequence();
    let delta = block.checked_sub(state.block).ok_or(Error::MathOverflow)?;
    if delta == 0 {
        return Ok(());
    }
    let speed = storage::read_market(env, market)?.supply_reward_speed;
    if speed > 0 && total_shares > 0 {
        let accrued = speed
            .checked_mul(delta as u128)
            .ok_or(Error::MathOverflow)?;
        let ratio = Double::fraction(accrued, total_shares)?;
        state.index = state.index.checked_add(ratio.0).ok_or(Error::MathOverflow)?;
    }
    state.block = block;
    env.storage()
        .persistent()
        .set(&DataKey::SupplyRewardState(market.clone()), &state);
    Ok(())
}

/// Borrow-side counterpart; the participating size is the market's total
/// borrows normalized by its borrow index.
pub fn update_borrow_index(
    env: &Env,
    market: &Address,
    total_borrows: u128,
    borrow_index: u128,
) -> Result<(), Error> {
    let mut state = borrow_state(env, market);
    let block = env.ledger().sequence();
    let delta = block.checked_sub(state.block).ok_or(Error::MathOverflow)?;
    if delta == 0 {
        return Ok(());
    }
    let speed = storage::read_market(env, market)?.borrow_reward_speed;
    if speed > 0 {
        let accrued = speed
            .checked_mul(delta as u128)
            .ok_or(Error::MathOverflow)?;
        let total = div_by_exp(total_borrows, Exp(borrow_index))?;
        if total > 0 {
            let ratio = Double::fraction(accrued, total)?;
            state.index = state.index.checked_add(ratio.0).ok_or(Error::MathOverflow)?;
        }
    }
    state.block = block;
    env.storage()
        .persistent()
        .set(&DataKey::BorrowRewardState(market.clone()), &state);
    Ok(())
}

/// Settles a supplier against the market's current supply index. An account
/// that has never settled starts from the initial index so it earns only
/// from the market's own starting point. Calling again without an index
/// movement changes nothing.
pub fn distribute_supplier(
    env: &Env,
    market: &Address,
    account: &Address,
    account_shares: u128,
) -> Result<(), Error> {
    let state = supply_state(env, market);
    let mut supplier_index: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::SupplierIndex(market.clone(), account.clone()))
        .unwrap_or(0);
    if supplier_index == 0 && state.index >= INITIAL_REWARD_INDEX {
        supplier_index = INITIAL_REWARD_INDEX;
    }
    env.storage().persistent().set(
        &DataKey::SupplierIndex(market.clone(), account.clone()),
        &state.index,
    );
    let delta = state
        .index
        .checked_sub(supplier_index)
        .ok_or(Error::MathOverflow)?;
    if delta == 0 {
        return Ok(());
    }
    let amount = Double(delta).mul_scalar_truncate(account_shares)?;
    if amount > 0 {
        add_accrued(env, account, amount)?;
    }
    Ok(())
}

pub fn distribute_borrower(
    env: &Env,
    market: &Address,
    account: &Address,
    account_borrows: u128,
    borrow_index: u128,
) -> Result<(), Error> {
    let state = borrow_state(env, market);
    let mut borrower_index: u128 = env
        .storage()
        .persistent()
        .get(&DataKey::BorrowerIndex(market.clone(), account.clone()))
        .unwrap_or(0);
    if borrower_index == 0 && state.index >= INITIAL_REWARD_INDEX {
        borrower_index = INITIAL_REWARD_INDEX;
    }
    env.storage().persistent().set(
        &DataKey::BorrowerIndex(market.clone(), account.clone()),
        &state.index,
    );
    let delta = state
        .index
        .checked_sub(borrower_index)
        .ok_or(Error::MathOverflow)?;
    if delta == 0 {
        return Ok(());
    }
    let balance = div_by_exp(account_borrows, Exp(borrow_index))?;
    let amount = Double(delta).mul_scalar_truncate(balance)?;
    if amount > 0 {
        add_accrued(env, account, amount)?;
    }
    Ok(())
}

pub fn accrued(env: &Env, account: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::RewardAccrued(account.clone()))
        .unwrap_or(0)
}

pub fn set_accrued(env: &Env, account: &Address, amount: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::RewardAccrued(account.clone()), &amount);
}

fn add_accrued(env: &Env, account: &Address, amount: u128) -> Result<(), Error> {
    let total = accrued(env, account)
        .checked_add(amount)
        .ok_or(Error::MathOverflow)?;
    set_accrued(env, account, total);
    Ok(())
}
