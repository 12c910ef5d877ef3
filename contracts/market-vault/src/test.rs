#![cfg(test)]
use super::*;
use soroban_sdk::token;
use soroban_sdk::{testutils::Address as _, Address, Env};

fn setup() -> (Env, MarketVaultClient<'static>, token::StellarAssetClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let underlying = env
        .register_stellar_asset_contract_v2(token_admin.clone())
        .address();
    let token_client = token::StellarAssetClient::new(&env, &underlying);

    let vault_id = env.register(MarketVault, ());
    let vault = MarketVaultClient::new(&env, &vault_id);
    vault.initialize(&admin, &underlying);

    (env, vault, token_client, admin)
}

#[test]
fn deposit_and_withdraw_round_trip() {
    let (env, vault, token_admin, _) = setup();
    let user = Address::generate(&env);
    token_admin.mint(&user, &1_000i128);

    let shares = vault.deposit(&user, &400u128);
    // Empty vault mints one share per unit
    assert_eq!(shares, 400);
    assert_eq!(vault.get_share_balance(&user), 400);
    assert_eq!(vault.get_total_shares(), 400);
    assert_eq!(vault.get_exchange_rate(), EXP_SCALE);

    let paid = vault.withdraw(&user, &150u128);
    assert_eq!(paid, 150);
    assert_eq!(vault.get_share_balance(&user), 250);

    let underlying = vault.get_underlying_asset();
    let balance = token::Client::new(&env, &underlying).balance(&user);
    assert_eq!(balance, 750);
}

#[test]
fn exchange_rate_tracks_backing() {
    let (_env, vault, token_admin, _) = setup();
    let lender = Address::generate(&vault.env);
    token_admin.mint(&lender, &1_000i128);
    vault.deposit(&lender, &500u128);

    // A donation to the vault raises the rate for existing shares
    token_admin.mint(&vault.address, &500i128);
    assert_eq!(vault.get_exchange_rate(), 2 * EXP_SCALE);

    // New deposits mint at the higher rate
    let late = Address::generate(&vault.env);
    token_admin.mint(&late, &200i128);
    let shares = vault.deposit(&late, &200u128);
    assert_eq!(shares, 100);
}

#[test]
fn borrow_and_repay() {
    let (env, vault, token_admin, _) = setup();
    let lender = Address::generate(&env);
    let borrower = Address::generate(&env);
    token_admin.mint(&lender, &1_000i128);
    token_admin.mint(&borrower, &100i128);
    vault.deposit(&lender, &1_000u128);

    vault.borrow(&borrower, &300u128);
    assert_eq!(vault.get_borrow_balance(&borrower), 300);
    assert_eq!(vault.get_total_borrows(), 300);
    // Borrows stay in the backing, so the rate holds
    assert_eq!(vault.get_exchange_rate(), EXP_SCALE);

    // Repay above the outstanding balance settles only the debt
    let repaid = vault.repay(&borrower, &400u128);
    assert_eq!(repaid, 300);
    assert_eq!(vault.get_borrow_balance(&borrower), 0);
    assert_eq!(vault.get_total_borrows(), 0);
}

#[test]
fn snapshot_reports_balances_and_rate() {
    let (env, vault, token_admin, _) = setup();
    let user = Address::generate(&env);
    token_admin.mint(&user, &1_000i128);
    vault.deposit(&user, &600u128);
    vault.borrow(&user, &200u128);

    let (err, shares, debt, rate) = vault.get_account_snapshot(&user);
    assert_eq!(err, 0);
    assert_eq!(shares, 600);
    assert_eq!(debt, 200);
    assert_eq!(rate, EXP_SCALE);
    assert_eq!(vault.get_borrow_index(), EXP_SCALE);
}

#[test]
fn transfer_shares_moves_balances() {
    let (env, vault, token_admin, _) = setup();
    let from = Address::generate(&env);
    let to = Address::generate(&env);
    token_admin.mint(&from, &500i128);
    vault.deposit(&from, &500u128);

    vault.transfer_shares(&from, &to, &200u128);
    assert_eq!(vault.get_share_balance(&from), 300);
    assert_eq!(vault.get_share_balance(&to), 200);
}

#[test]
fn rejects_bad_amounts_and_balances() {
    let (env, vault, token_admin, _) = setup();
    let user = Address::generate(&env);
    token_admin.mint(&user, &100i128);

    assert_eq!(vault.try_deposit(&user, &0u128), Err(Ok(Error::InvalidAmount)));

    vault.deposit(&user, &100u128);
    assert_eq!(
        vault.try_withdraw(&user, &101u128),
        Err(Ok(Error::InsufficientShares))
    );
    assert_eq!(
        vault.try_borrow(&user, &200u128),
        Err(Ok(Error::InsufficientCash))
    );
}

#[test]
fn liquidation_entrypoints_need_a_controller() {
    let (env, vault, token_admin, _) = setup();
    let borrower = Address::generate(&env);
    let liquidator = Address::generate(&env);
    token_admin.mint(&borrower, &100i128);
    vault.deposit(&borrower, &100u128);

    assert_eq!(
        vault.try_seize(&borrower, &liquidator, &50u128),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(
        vault.try_repay_on_behalf(&liquidator, &borrower, &50u128),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn initialize_is_one_time() {
    let (env, vault, _, admin) = setup();
    let other = Address::generate(&env);
    assert_eq!(
        vault.try_initialize(&admin, &other),
        Err(Ok(Error::AlreadyInitialized))
    );
}
