use soroban_sdk::{Address, Env};

/// Price feed consulted by the liquidity engine and liquidation sizing.
///
/// Prices are USD per whole underlying unit, mantissa 1e18. A return of
/// zero means the feed has no usable price for the asset; callers must
/// treat that as unavailable, never as a free asset.
#[soroban_sdk::contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn get_underlying_price(e: Env, asset: Address) -> u128;
}
