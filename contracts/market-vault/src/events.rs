use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposit {
    #[topic]
    pub user: Address,
    pub amount: u128,
    pub shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdraw {
    #[topic]
    pub user: Address,
    pub shares: u128,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Borrow {
    #[topic]
    pub user: Address,
    pub amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepayBorrow {
    #[topic]
    pub payer: Address,
    #[topic]
    pub borrower: Address,
    pub repay_amount: u128,
    pub account_borrows: u128,
    pub total_borrows: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Seize {
    #[topic]
    pub borrower: Address,
    #[topic]
    pub liquidator: Address,
    pub shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ControllerSet {
    #[topic]
    pub controller: Address,
}
