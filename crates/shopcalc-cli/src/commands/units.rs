use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use shopcalc_core::units::{self, Quantity, WeightUnit};
use shopcalc_core::with_metadata;

/// Arguments for weight conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Weight to convert
    pub value: Decimal,

    /// Unit of the value: g, oz or kg
    #[arg(long, default_value = "g")]
    pub from: WeightUnit,

    /// Target unit; all three units when omitted
    #[arg(long)]
    pub to: Option<WeightUnit>,
}

#[derive(Serialize)]
struct Conversion {
    value: Decimal,
    from: WeightUnit,
    to: WeightUnit,
    converted: Decimal,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.value < Decimal::ZERO {
        return Err("weight cannot be negative".into());
    }
    let start = Instant::now();
    let assumptions = serde_json::json!({
        "grams_per_ounce": units::GRAMS_PER_OUNCE.to_string(),
        "grams_per_kilogram": units::GRAMS_PER_KILOGRAM.to_string(),
    });
    let methodology = "Weight conversion through grams";

    let value = match args.to {
        Some(to) => {
            let result = Conversion {
                value: args.value,
                from: args.from,
                to,
                converted: units::convert(args.value, args.from, to),
            };
            let elapsed = start.elapsed().as_micros() as u64;
            serde_json::to_value(with_metadata(methodology, &assumptions, vec![], elapsed, result))?
        }
        None => {
            let result = Quantity::from_unit(args.value, args.from);
            let elapsed = start.elapsed().as_micros() as u64;
            serde_json::to_value(with_metadata(methodology, &assumptions, vec![], elapsed, result))?
        }
    };
    Ok(value)
}
