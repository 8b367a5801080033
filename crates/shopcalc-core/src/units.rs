//! Weight conversions between grams, ounces and kilograms.
//!
//! Every calculation in the crate is carried out in grams. Ounces and
//! kilograms only appear at the edges (wholesale prices quoted per ounce,
//! stock counts shown in kilograms) and are converted with the constants
//! below. Inputs are not range-checked: negative weights convert like any
//! other number.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ShopcalcError;
use crate::types::{Grams, Money};

/// Avoirdupois ounce in grams.
pub const GRAMS_PER_OUNCE: Decimal = dec!(28.3495);

pub const GRAMS_PER_KILOGRAM: Decimal = dec!(1000);

pub fn grams_to_ounces(grams: Grams) -> Decimal {
    grams / GRAMS_PER_OUNCE
}

pub fn ounces_to_grams(ounces: Decimal) -> Grams {
    ounces * GRAMS_PER_OUNCE
}

pub fn grams_to_kilograms(grams: Grams) -> Decimal {
    grams / GRAMS_PER_KILOGRAM
}

pub fn kilograms_to_grams(kilograms: Decimal) -> Grams {
    kilograms * GRAMS_PER_KILOGRAM
}

/// A price quoted per ounce, re-expressed per gram.
pub fn price_per_ounce_to_per_gram(price_per_ounce: Money) -> Money {
    price_per_ounce / GRAMS_PER_OUNCE
}

/// A price quoted per gram, re-expressed per ounce.
pub fn price_per_gram_to_per_ounce(price_per_gram: Money) -> Money {
    price_per_gram * GRAMS_PER_OUNCE
}

/// Units a weight can be entered or displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Grams,
    Ounces,
    Kilograms,
}

impl WeightUnit {
    pub fn to_grams(self, value: Decimal) -> Grams {
        match self {
            WeightUnit::Grams => value,
            WeightUnit::Ounces => ounces_to_grams(value),
            WeightUnit::Kilograms => kilograms_to_grams(value),
        }
    }

    pub fn from_grams(self, grams: Grams) -> Decimal {
        match self {
            WeightUnit::Grams => grams,
            WeightUnit::Ounces => grams_to_ounces(grams),
            WeightUnit::Kilograms => grams_to_kilograms(grams),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            WeightUnit::Grams => "g",
            WeightUnit::Ounces => "oz",
            WeightUnit::Kilograms => "kg",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for WeightUnit {
    type Err = ShopcalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(WeightUnit::Grams),
            "oz" | "ounce" | "ounces" => Ok(WeightUnit::Ounces),
            "kg" | "kilogram" | "kilograms" => Ok(WeightUnit::Kilograms),
            other => Err(ShopcalcError::invalid(
                "unit",
                format!("Unknown weight unit '{other}' (expected g, oz or kg)"),
            )),
        }
    }
}

/// Convert a weight between any two units, going through grams.
pub fn convert(value: Decimal, from: WeightUnit, to: WeightUnit) -> Decimal {
    if from == to {
        return value;
    }
    to.from_grams(from.to_grams(value))
}

/// The same weight in all three units. Inventory rows store all three, so
/// they are always built from a single authoritative value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub grams: Grams,
    pub ounces: Decimal,
    pub kilograms: Decimal,
}

impl Quantity {
    pub fn from_grams(grams: Grams) -> Self {
        Quantity {
            grams,
            ounces: grams_to_ounces(grams),
            kilograms: grams_to_kilograms(grams),
        }
    }

    pub fn from_ounces(ounces: Decimal) -> Self {
        let mut q = Quantity::from_grams(ounces_to_grams(ounces));
        q.ounces = ounces;
        q
    }

    pub fn from_kilograms(kilograms: Decimal) -> Self {
        let mut q = Quantity::from_grams(kilograms_to_grams(kilograms));
        q.kilograms = kilograms;
        q
    }

    pub fn from_unit(value: Decimal, unit: WeightUnit) -> Self {
        match unit {
            WeightUnit::Grams => Quantity::from_grams(value),
            WeightUnit::Ounces => Quantity::from_ounces(value),
            WeightUnit::Kilograms => Quantity::from_kilograms(value),
        }
    }

    pub fn zero() -> Self {
        Quantity::from_grams(Decimal::ZERO)
    }

    /// Adds a signed number of grams (negative for a sale).
    pub fn adjust_grams(&self, delta: Grams) -> Self {
        Quantity::from_grams(self.grams + delta)
    }
}
