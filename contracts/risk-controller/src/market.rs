//! Cross-contract surface of a supervised market vault.

use soroban_sdk::{Address, Env, IntoVal, Symbol};

use crate::errors::Error;

/// (share balance, borrow balance, exchange rate 1e18) for an account.
/// A nonzero error code in the snapshot is surfaced as `SnapshotFailure`.
pub fn account_snapshot(
    env: &Env,
    market: &Address,
    account: &Address,
) -> Result<(u128, u128, u128), Error> {
    let (err, shares, debt, rate): (u32, u128, u128, u128) = env.invoke_contract(
        market,
        &Symbol::new(env, "get_account_snapshot"),
        (account.clone(),).into_val(env),
    );
    if err != 0 {
        return Err(Error::SnapshotFailure);
    }
    Ok((shares, debt, rate))
}

pub fn total_shares(env: &Env, market: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_total_shares"),
        ().into_val(env),
    )
}

pub fn total_borrows(env: &Env, market: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_total_borrows"),
        ().into_val(env),
    )
}

pub fn borrow_index(env: &Env, market: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_borrow_index"),
        ().into_val(env),
    )
}

pub fn exchange_rate(env: &Env, market: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_exchange_rate"),
        ().into_val(env),
    )
}

pub fn share_balance(env: &Env, market: &Address, account: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_share_balance"),
        (account.clone(),).into_val(env),
    )
}

pub fn borrow_balance(env: &Env, market: &Address, account: &Address) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_borrow_balance"),
        (account.clone(),).into_val(env),
    )
}

pub fn underlying_asset(env: &Env, market: &Address) -> Address {
    env.invoke_contract(
        market,
        &Symbol::new(env, "get_underlying_asset"),
        ().into_val(env),
    )
}

pub fn repay_on_behalf(
    env: &Env,
    market: &Address,
    liquidator: &Address,
    borrower: &Address,
    amount: u128,
) -> u128 {
    env.invoke_contract(
        market,
        &Symbol::new(env, "repay_on_behalf"),
        (liquidator.clone(), borrower.clone(), amount).into_val(env),
    )
}

pub fn seize(
    env: &Env,
    market: &Address,
    borrower: &Address,
    liquidator: &Address,
    share_amount: u128,
) {
    env.invoke_contract::<()>(
        market,
        &Symbol::new(env, "seize"),
        (borrower.clone(), liquidator.clone(), share_amount).into_val(env),
    )
}
