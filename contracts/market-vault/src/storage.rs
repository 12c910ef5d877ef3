use soroban_sdk::{contracttype, Address, Env};

use crate::errors::Error;

#[contracttype]
pub enum DataKey {
    Admin,
    Underlying,
    Controller,          // Address (optional); gate hooks skipped while unset
    TotalShares,
    TotalBorrows,
    Shares(Address),
    Debt(Address),
}

pub fn read_admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn read_underlying(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Underlying)
        .ok_or(Error::NotInitialized)
}

pub fn controller(env: &Env) -> Option<Address> {
    env.storage().persistent().get(&DataKey::Controller)
}

pub fn total_shares(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalShares)
        .unwrap_or(0)
}

pub fn total_borrows(env: &Env) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalBorrows)
        .unwrap_or(0)
}

pub fn write_total_shares(env: &Env, total: u128) {
    env.storage().persistent().set(&DataKey::TotalShares, &total);
}

pub fn write_total_borrows(env: &Env, total: u128) {
    env.storage().persistent().set(&DataKey::TotalBorrows, &total);
}

pub fn shares_of(env: &Env, account: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::Shares(account.clone()))
        .unwrap_or(0)
}

pub fn write_shares(env: &Env, account: &Address, amount: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::Shares(account.clone()), &amount);
}

pub fn debt_of(env: &Env, account: &Address) -> u128 {
    env.storage()
        .persistent()
        .get(&DataKey::Debt(account.clone()))
        .unwrap_or(0)
}

pub fn write_debt(env: &Env, account: &Address, amount: u128) {
    env.storage()
        .persistent()
        .set(&DataKey::Debt(account.clone()), &amount);
}
