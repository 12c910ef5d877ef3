//! Unsigned fixed-point arithmetic over `u128`.
//!
//! Two scales are used throughout the controller: `Exp` values carry 18
//! decimals (prices, factors, exchange rates) and `Double` values carry 36
//! decimals (cumulative reward indices). Every operation truncates toward
//! zero; there is no rounding anywhere in the risk math.

use crate::errors::Error;

pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000;
pub const DOUBLE_SCALE: u128 = EXP_SCALE * EXP_SCALE;

/// An 18-decimal fixed-point mantissa.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Exp(pub u128);

/// A 36-decimal fixed-point mantissa.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Double(pub u128);

impl Exp {
    /// Truncating cross-scale product: (a * b) / 1e18.
    pub fn mul(self, other: Exp) -> Result<Exp, Error> {
        let wide = self.0.checked_mul(other.0).ok_or(Error::MathOverflow)?;
        Ok(Exp(wide / EXP_SCALE))
    }

    /// (a * 1e18) / b, keeping the Exp scale.
    pub fn div(self, other: Exp) -> Result<Exp, Error> {
        if other.0 == 0 {
            return Err(Error::DivisionByZero);
        }
        let wide = self.0.checked_mul(EXP_SCALE).ok_or(Error::MathOverflow)?;
        Ok(Exp(wide / other.0))
    }

    /// ⌊mantissa * scalar / 1e18⌋.
    pub fn mul_scalar_truncate(self, scalar: u128) -> Result<u128, Error> {
        let wide = self.0.checked_mul(scalar).ok_or(Error::MathOverflow)?;
        Ok(wide / EXP_SCALE)
    }

    /// ⌊mantissa * scalar / 1e18⌋ + addend, checked.
    pub fn mul_scalar_truncate_add(self, scalar: u128, addend: u128) -> Result<u128, Error> {
        self.mul_scalar_truncate(scalar)?
            .checked_add(addend)
            .ok_or(Error::MathOverflow)
    }
}

impl Double {
    /// a / b at Double scale: (a * 1e36) / b.
    pub fn fraction(numerator: u128, denominator: u128) -> Result<Double, Error> {
        if denominator == 0 {
            return Err(Error::DivisionByZero);
        }
        let wide = numerator
            .checked_mul(DOUBLE_SCALE)
            .ok_or(Error::MathOverflow)?;
        Ok(Double(wide / denominator))
    }

    /// ⌊mantissa * scalar / 1e36⌋.
    pub fn mul_scalar_truncate(self, scalar: u128) -> Result<u128, Error> {
        let wide = self.0.checked_mul(scalar).ok_or(Error::MathOverflow)?;
        Ok(wide / DOUBLE_SCALE)
    }
}

/// (amount * 1e18) / divisor, for normalizing a raw amount by an Exp index.
pub fn div_by_exp(amount: u128, divisor: Exp) -> Result<u128, Error> {
    if divisor.0 == 0 {
        return Err(Error::DivisionByZero);
    }
    let wide = amount.checked_mul(EXP_SCALE).ok_or(Error::MathOverflow)?;
    Ok(wide / divisor.0)
}
