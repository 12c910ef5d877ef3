use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    Unauthorized = 2,
    MarketNotListed = 3,
    MarketAlreadyListed = 4,
    ActionPaused = 5,
    InsufficientLiquidity = 6,
    NonzeroBorrowBalance = 7,
    BorrowCapExceeded = 8,
    PriceUnavailable = 9,
    SnapshotFailure = 10,
    InsufficientShortfall = 11,
    TooMuchRepay = 12,
    TooMuchSeize = 13,
    InvalidParameter = 14,
    MathOverflow = 15,
    DivisionByZero = 16,
}
