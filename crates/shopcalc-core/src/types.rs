use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ShopcalcError;
use crate::ShopcalcResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Weights in grams, the unit every calculation is carried out in.
pub type Grams = Decimal;

/// Percentages as entered on the forms (60 = 60%). Never as fractions.
pub type Percent = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// `numerator / denominator * 100`, or zero with a warning when the
/// denominator is not positive.
pub(crate) fn percent_or_zero(
    numerator: Decimal,
    denominator: Decimal,
    metric: &str,
    warnings: &mut Vec<String>,
) -> Percent {
    if denominator <= Decimal::ZERO {
        warnings.push(format!(
            "{metric} is undefined (denominator is {denominator}); reported as 0"
        ));
        return Decimal::ZERO;
    }
    match numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
    {
        Some(percent) => percent,
        None => {
            warnings.push(format!(
                "{metric} is out of range ({numerator} over {denominator}); reported as 0"
            ));
            Decimal::ZERO
        }
    }
}

/// Unwrap a checked `Decimal` operation. `None` means the quantity left the
/// 96-bit range and is reported against the input that drove it there.
pub(crate) fn in_range(
    value: Option<Decimal>,
    field: &str,
    quantity: &str,
) -> ShopcalcResult<Decimal> {
    value.ok_or_else(|| {
        ShopcalcError::invalid(field, format!("{quantity} is too large to represent"))
    })
}
