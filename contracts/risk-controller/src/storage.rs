use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::errors::Error;

#[contracttype]
pub enum DataKey {
    Admin,
    PauseGuardian,            // Address (optional)
    Oracle,                   // Address
    RewardToken,              // Address (optional)
    CloseFactor,              // u128 mantissa 1e18
    LiquidationIncentive,     // u128 mantissa 1e18
    TransferPaused,           // bool, venue wide
    SeizePaused,              // bool, venue wide
    Markets,                  // Vec<Address>, listing order
    Market(Address),          // MarketState
    Membership(Address, Address),   // (market, account) -> bool
    EnteredMarkets(Address),        // account -> Vec<Address>, entry order
    SupplyRewardState(Address),     // RewardIndexState
    BorrowRewardState(Address),     // RewardIndexState
    SupplierIndex(Address, Address), // (market, account) -> u128 mantissa 1e36
    BorrowerIndex(Address, Address), // (market, account) -> u128 mantissa 1e36
    RewardAccrued(Address),         // account -> u128
}

/// Per-market risk configuration. Presence of the key is the listing flag.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketState {
    pub collateral_factor: u128, // mantissa 1e18
    pub borrow_cap: u128,        // underlying units, 0 = unlimited
    pub supply_reward_speed: u128,
    pub borrow_reward_speed: u128,
    pub mint_paused: bool,
    pub borrow_paused: bool,
    pub deprecated: bool,
}

/// Cumulative reward index (mantissa 1e36) and the ledger sequence it was
/// last advanced to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardIndexState {
    pub index: u128,
    pub block: u32,
}

/// A market's own numbers, supplied by the market when it invokes a gate
/// hook. The host rejects re-entering a contract already on the call stack,
/// so the in-flight market cannot be queried back; it reports about itself
/// instead and the gate cross-calls only the account's other markets.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketHint {
    pub underlying: Address,
    pub exchange_rate: u128, // mantissa 1e18
    pub borrow_index: u128,  // mantissa 1e18
    pub total_shares: u128,
    pub total_borrows: u128,
}

/// One account's balances in the in-flight market, taken before the action
/// being gated changes them.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountHint {
    pub shares: u128,
    pub borrows: u128,
}

pub fn read_admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Admin)
        .ok_or(Error::Unauthorized)
}

pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if *caller != read_admin(env)? {
        return Err(Error::Unauthorized);
    }
    bump_core_ttl(env);
    Ok(())
}

/// Guardian-or-admin gate used by pause setters and borrow caps.
pub fn require_admin_or_guardian(env: &Env, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if *caller == read_admin(env)? {
        bump_core_ttl(env);
        return Ok(());
    }
    let guardian: Option<Address> = env.storage().persistent().get(&DataKey::PauseGuardian);
    match guardian {
        Some(g) if g == *caller => {
            bump_core_ttl(env);
            Ok(())
        }
        _ => Err(Error::Unauthorized),
    }
}

pub fn read_market(env: &Env, market: &Address) -> Result<MarketState, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Market(market.clone()))
        .ok_or(Error::MarketNotListed)
}

pub fn write_market(env: &Env, market: &Address, state: &MarketState) {
    env.storage()
        .persistent()
        .set(&DataKey::Market(market.clone()), state);
}

pub fn is_listed(env: &Env, market: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Market(market.clone()))
}

pub fn all_markets(env: &Env) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::Markets)
        .unwrap_or(Vec::new(env))
}

pub fn push_market(env: &Env, market: &Address) {
    let mut markets = all_markets(env);
    markets.push_back(market.clone());
    env.storage().persistent().set(&DataKey::Markets, &markets);
}

pub fn is_member(env: &Env, market: &Address, account: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Membership(market.clone(), account.clone()))
        .unwrap_or(false)
}

pub fn entered_markets(env: &Env, account: &Address) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::EnteredMarkets(account.clone()))
        .unwrap_or(Vec::new(env))
}

/// Adds `account` to `market`, updating the membership flag and the entered
/// list together. No-op when already a member. All membership writes go
/// through here and `remove_from_market`; nothing else touches these keys.
pub fn add_to_market(env: &Env, market: &Address, account: &Address) {
    if is_member(env, market, account) {
        return;
    }
    env.storage().persistent().set(
        &DataKey::Membership(market.clone(), account.clone()),
        &true,
    );
    let mut entered = entered_markets(env, account);
    entered.push_back(market.clone());
    env.storage()
        .persistent()
        .set(&DataKey::EnteredMarkets(account.clone()), &entered);
}

/// Removes `account` from `market` with a swap-with-last delete on the
/// entered list. A set flag without a list entry means the two stores have
/// diverged, which no code path can produce; that state is unrecoverable and
/// traps rather than returning an error.
pub fn remove_from_market(env: &Env, market: &Address, account: &Address) {
    if !is_member(env, market, account) {
        return;
    }
    env.storage()
        .persistent()
        .remove(&DataKey::Membership(market.clone(), account.clone()));
    let mut entered = entered_markets(env, account);
    let idx = match entered.first_index_of(market.clone()) {
        Some(i) => i,
        None => panic!("membership state corrupted"),
    };
    let last = entered.len() - 1;
    if idx != last {
        let tail = entered.get_unchecked(last);
        entered.set(idx, tail);
    }
    entered.pop_back();
    env.storage()
        .persistent()
        .set(&DataKey::EnteredMarkets(account.clone()), &entered);
}

const TTL_THRESHOLD: u32 = 100_000_000;
const TTL_EXTEND_TO: u32 = 200_000_000;

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    if persistent.has(&DataKey::Admin) {
        persistent.extend_ttl(&DataKey::Admin, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::Oracle) {
        persistent.extend_ttl(&DataKey::Oracle, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::Markets) {
        persistent.extend_ttl(&DataKey::Markets, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::CloseFactor) {
        persistent.extend_ttl(&DataKey::CloseFactor, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::LiquidationIncentive) {
        persistent.extend_ttl(&DataKey::LiquidationIncentive, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::RewardToken) {
        persistent.extend_ttl(&DataKey::RewardToken, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}
