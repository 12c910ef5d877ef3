use soroban_sdk::{contractevent, Address, Symbol};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleUpdated {
    #[topic]
    pub oracle: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketListed {
    #[topic]
    pub market: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketEntered {
    #[topic]
    pub account: Address,
    #[topic]
    pub market: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketExited {
    #[topic]
    pub account: Address,
    #[topic]
    pub market: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloseFactorUpdated {
    pub close_factor_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidationIncentiveUpdated {
    pub incentive_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollateralFactorUpdated {
    #[topic]
    pub market: Address,
    pub factor_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BorrowCapUpdated {
    #[topic]
    pub market: Address,
    pub cap: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PauseGuardianUpdated {
    #[topic]
    pub guardian: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketActionPauseUpdated {
    #[topic]
    pub market: Address,
    #[topic]
    pub action: Symbol,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobalActionPauseUpdated {
    #[topic]
    pub action: Symbol,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketDeprecationUpdated {
    #[topic]
    pub market: Address,
    pub deprecated: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardTokenSet {
    #[topic]
    pub token: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardSpeedUpdated {
    #[topic]
    pub market: Address,
    pub supply_speed: u128,
    pub borrow_speed: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardClaimed {
    #[topic]
    pub account: Address,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquidateBorrow {
    #[topic]
    pub liquidator: Address,
    #[topic]
    pub borrower: Address,
    #[topic]
    pub borrowed_market: Address,
    pub collateral_market: Address,
    pub repay_amount: u128,
    pub seize_tokens: u128,
}
