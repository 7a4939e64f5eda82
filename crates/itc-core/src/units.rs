//! Runtime-checked dimensioned quantities.
//!
//! Every physical value flowing through the planner and the inference engine
//! is a [`Quantity`]: a canonical magnitude plus a [`Dimension`] tag. An
//! operation that would combine incompatible dimensions fails with a
//! [`ItcError::Unit`] at the call site; nothing is ever coerced silently.
//!
//! Canonical magnitudes are grams, liters, moles, calories, and seconds.
//! Association constants in this domain span roughly 1e4..1e10 L/mol, so
//! [`Quantity::ln_value_in`] exposes log-space magnitudes for arithmetic that
//! multiplies several wide-range factors.

use std::fmt::{self, Display};
use std::ops::{Div, Mul, Neg};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, ItcError};

/// Integer exponents over the base dimensions used by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Mass exponent (canonical unit: gram).
    pub mass: i8,
    /// Volume exponent (canonical unit: liter).
    pub volume: i8,
    /// Amount-of-substance exponent (canonical unit: mole).
    pub amount: i8,
    /// Energy exponent (canonical unit: calorie).
    pub energy: i8,
    /// Time exponent (canonical unit: second).
    pub time: i8,
}

impl Dimension {
    /// The dimensionless tag.
    pub const NONE: Dimension = Dimension {
        mass: 0,
        volume: 0,
        amount: 0,
        energy: 0,
        time: 0,
    };

    /// Returns true when every exponent is zero.
    pub fn is_none(&self) -> bool {
        *self == Dimension::NONE
    }

    fn combine(self, other: Dimension, sign: i8) -> Dimension {
        Dimension {
            mass: self.mass + sign * other.mass,
            volume: self.volume + sign * other.volume,
            amount: self.amount + sign * other.amount,
            energy: self.energy + sign * other.energy,
            time: self.time + sign * other.time,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "dimensionless");
        }
        let mut first = true;
        for (symbol, exponent) in [
            ("g", self.mass),
            ("L", self.volume),
            ("mol", self.amount),
            ("cal", self.energy),
            ("s", self.time),
        ] {
            if exponent == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if exponent == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exponent}")?;
            }
        }
        Ok(())
    }
}

/// A named unit: dimension tag plus scale to the canonical magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    /// Display name of the unit.
    pub name: &'static str,
    /// Dimension tag of the unit.
    pub dim: Dimension,
    /// Multiplier converting a value in this unit to the canonical magnitude.
    pub scale: f64,
}

macro_rules! unit {
    ($const_name:ident, $name:literal, $scale:expr, $mass:expr, $volume:expr, $amount:expr, $energy:expr, $time:expr) => {
        /// Unit constant.
        pub const $const_name: Unit = Unit {
            name: $name,
            dim: Dimension {
                mass: $mass,
                volume: $volume,
                amount: $amount,
                energy: $energy,
                time: $time,
            },
            scale: $scale,
        };
    };
}

unit!(DIMENSIONLESS, "dimensionless", 1.0, 0, 0, 0, 0, 0);
unit!(GRAM, "g", 1.0, 1, 0, 0, 0, 0);
unit!(MILLIGRAM, "mg", 1e-3, 1, 0, 0, 0, 0);
unit!(KILOGRAM, "kg", 1e3, 1, 0, 0, 0, 0);
unit!(LITER, "L", 1.0, 0, 1, 0, 0, 0);
unit!(MILLILITER, "mL", 1e-3, 0, 1, 0, 0, 0);
unit!(MICROLITER, "uL", 1e-6, 0, 1, 0, 0, 0);
unit!(MOLE, "mol", 1.0, 0, 0, 1, 0, 0);
unit!(MILLIMOLE, "mmol", 1e-3, 0, 0, 1, 0, 0);
unit!(MICROMOLE, "umol", 1e-6, 0, 0, 1, 0, 0);
unit!(MOLAR, "M", 1.0, 0, -1, 1, 0, 0);
unit!(MILLIMOLAR, "mM", 1e-3, 0, -1, 1, 0, 0);
unit!(MICROMOLAR, "uM", 1e-6, 0, -1, 1, 0, 0);
unit!(GRAM_PER_MILLILITER, "g/mL", 1e3, 1, -1, 0, 0, 0);
unit!(GRAM_PER_LITER, "g/L", 1.0, 1, -1, 0, 0, 0);
unit!(GRAM_PER_MOLE, "g/mol", 1.0, 1, 0, -1, 0, 0);
unit!(LITER_PER_MOLE, "L/mol", 1.0, 0, 1, -1, 0, 0);
unit!(CALORIE, "cal", 1.0, 0, 0, 0, 1, 0);
unit!(KILOCALORIE, "kcal", 1e3, 0, 0, 0, 1, 0);
unit!(MICROCALORIE, "ucal", 1e-6, 0, 0, 0, 1, 0);
unit!(KILOCALORIE_PER_MOLE, "kcal/mol", 1e3, 0, 0, -1, 1, 0);
unit!(SECOND, "s", 1.0, 0, 0, 0, 0, 1);

/// A physical quantity: canonical magnitude plus dimension tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    value: f64,
    dim: Dimension,
}

fn mismatch(operation: &str, left: Dimension, right: Dimension) -> ItcError {
    ItcError::Unit(
        ErrorInfo::new(
            "dimension-mismatch",
            format!("cannot {operation} quantities with incompatible dimensions"),
        )
        .with_context("left", left.to_string())
        .with_context("right", right.to_string()),
    )
}

impl Quantity {
    /// Creates a quantity from a magnitude expressed in the given unit.
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value: value * unit.scale,
            dim: unit.dim,
        }
    }

    /// Creates a dimensionless quantity.
    pub fn dimensionless(value: f64) -> Self {
        Self {
            value,
            dim: Dimension::NONE,
        }
    }

    /// Creates a zero quantity carrying the dimension of the given unit.
    pub fn zero(unit: Unit) -> Self {
        Self {
            value: 0.0,
            dim: unit.dim,
        }
    }

    /// Returns the dimension tag.
    pub fn dim(&self) -> Dimension {
        self.dim
    }

    /// Returns the magnitude expressed in the given unit, or a `Unit` error
    /// when the dimensions differ.
    pub fn value_in(&self, unit: Unit) -> Result<f64, ItcError> {
        if self.dim != unit.dim {
            return Err(mismatch(
                &format!("convert to {}", unit.name),
                self.dim,
                unit.dim,
            ));
        }
        Ok(self.value / unit.scale)
    }

    /// Returns `ln` of the magnitude in the given unit.
    ///
    /// Fails with a `Unit` error on dimension mismatch or a non-positive
    /// magnitude. Intended for log-space arithmetic over wide-range values.
    pub fn ln_value_in(&self, unit: Unit) -> Result<f64, ItcError> {
        let magnitude = self.value_in(unit)?;
        if magnitude <= 0.0 {
            return Err(ItcError::Unit(
                ErrorInfo::new(
                    "non-positive-log",
                    format!("cannot take the log of {magnitude} {}", unit.name),
                )
                .with_context("dimension", self.dim.to_string()),
            ));
        }
        Ok(magnitude.ln())
    }

    /// Checked addition; fails when dimensions differ.
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, ItcError> {
        if self.dim != other.dim {
            return Err(mismatch("add", self.dim, other.dim));
        }
        Ok(Quantity {
            value: self.value + other.value,
            dim: self.dim,
        })
    }

    /// Checked subtraction; fails when dimensions differ.
    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity, ItcError> {
        if self.dim != other.dim {
            return Err(mismatch("subtract", self.dim, other.dim));
        }
        Ok(Quantity {
            value: self.value - other.value,
            dim: self.dim,
        })
    }

    /// Dimensionless quotient of two quantities of the same dimension.
    pub fn ratio(&self, other: &Quantity) -> Result<f64, ItcError> {
        if self.dim != other.dim {
            return Err(mismatch("form a ratio of", self.dim, other.dim));
        }
        Ok(self.value / other.value)
    }

    /// Extracts the magnitude of a dimensionless quantity.
    pub fn into_dimensionless(self) -> Result<f64, ItcError> {
        if !self.dim.is_none() {
            return Err(mismatch(
                "treat as dimensionless",
                self.dim,
                Dimension::NONE,
            ));
        }
        Ok(self.value)
    }

    /// Returns true when the magnitude is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity {
            value: self.value * rhs.value,
            dim: self.dim.combine(rhs.dim, 1),
        }
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity {
            value: self.value / rhs.value,
            dim: self.dim.combine(rhs.dim, -1),
        }
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value * rhs,
            dim: self.dim,
        }
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value / rhs,
            dim: self.dim,
        }
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity {
            value: -self.value,
            dim: self.dim,
        }
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dim.is_none() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, self.dim)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_requires_matching_dimension() {
        let mass = Quantity::new(8.7, MILLIGRAM);
        let err = mass.value_in(MILLILITER).unwrap_err();
        assert!(matches!(err, ItcError::Unit(_)));
        assert_eq!(err.info().code, "dimension-mismatch");
    }

    #[test]
    fn multiplication_combines_dimensions() {
        let conc = Quantity::new(0.5, MILLIMOLAR);
        let volume = Quantity::new(202.8, MICROLITER);
        let amount = conc * volume;
        let nanomoles = amount.value_in(MICROMOLE).unwrap() * 1e3;
        assert!((nanomoles - 101.4).abs() < 1e-9);
    }

    #[test]
    fn wiseman_product_is_dimensionless() {
        let ka = Quantity::new(1.788_684_707e6, LITER_PER_MOLE);
        let conc = Quantity::new(0.5, MILLIMOLAR);
        let c = (ka * conc).into_dimensionless().unwrap();
        assert!((c - 894.342_3535).abs() < 1e-6);
    }

    #[test]
    fn log_magnitude_rejects_non_positive_values() {
        let conc = Quantity::zero(MILLIMOLAR);
        assert!(conc.ln_value_in(MOLAR).is_err());
    }
}
