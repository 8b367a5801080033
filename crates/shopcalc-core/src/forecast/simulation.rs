use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use crate::error::ShopcalcError;
use crate::records::{Transaction, TransactionType};
use crate::types::{with_metadata, ComputationOutput, Grams, Money};
use crate::ShopcalcResult;

pub const MAX_SIMULATION_MONTHS: u32 = 36;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a day-by-day sales simulation against a single stock item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub start_date: NaiveDate,
    pub months: u32,
    #[serde(default = "default_product_name")]
    pub product_name: String,
    pub starting_inventory_grams: Grams,
    /// Restock when stock falls to or below this level
    pub reorder_threshold_grams: Grams,
    /// Size of each restock purchase
    pub restock_grams: Grams,
    pub daily_demand_mean_grams: Grams,
    #[serde(default)]
    pub daily_demand_std_dev_grams: Grams,
    pub price_per_gram: Money,
    pub cost_per_gram: Money,
    /// Optional seed for reproducibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_product_name() -> String {
    "House product".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatedMonth {
    pub label: String,
    pub grams_sold: Grams,
    pub revenue: Money,
    pub profit: Money,
    pub purchase_cost: Money,
    pub restocks: u32,
    /// Days on which demand exceeded the stock on hand
    pub stockout_days: u32,
    pub ending_inventory_grams: Grams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Ready to feed into the monthly forecast
    pub transactions: Vec<Transaction>,
    pub months: Vec<SimulatedMonth>,
    pub total_grams_sold: Grams,
    pub total_revenue: Money,
    pub total_profit: Money,
    pub stockout_days: u32,
    pub ending_inventory_grams: Grams,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate daily sales and restocks, never selling stock that isn't there.
pub fn simulate_sales(
    input: &SimulationInput,
) -> ShopcalcResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_simulation_input(input)?;

    let end_date = input
        .start_date
        .checked_add_months(Months::new(input.months))
        .ok_or_else(|| ShopcalcError::DateError("simulation end date out of range".into()))?;

    let mean = to_f64(input.daily_demand_mean_grams, "daily_demand_mean_grams")?;
    let std_dev = to_f64(input.daily_demand_std_dev_grams, "daily_demand_std_dev_grams")?;
    let demand = if std_dev > 0.0 {
        Some(Normal::new(mean, std_dev).map_err(|e| ShopcalcError::InvalidInput {
            field: "daily_demand".into(),
            reason: format!("Invalid Normal parameters: {e}"),
        })?)
    } else {
        None
    };

    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut stock = input.starting_inventory_grams;
    let mut transactions = Vec::new();
    let mut months: BTreeMap<String, SimulatedMonth> = BTreeMap::new();
    let mut sequence = 0u64;

    let mut day = input.start_date;
    while day < end_date {
        let label = day.format("%Y-%m").to_string();
        let month = months.entry(label.clone()).or_insert_with(|| SimulatedMonth {
            label,
            ..Default::default()
        });

        let wanted: f64 = match &demand {
            Some(dist) => {
                let draw: f64 = rng.sample(dist);
                draw.max(0.0)
            }
            None => mean,
        };
        let wanted = Decimal::from_f64(wanted)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        let sold = wanted.min(stock.max(Decimal::ZERO));

        if wanted > sold {
            month.stockout_days += 1;
        }
        if sold > Decimal::ZERO {
            let total = sold * input.price_per_gram;
            let cost = sold * input.cost_per_gram;
            sequence += 1;
            transactions.push(Transaction {
                id: Some(format!("sim-{sequence}")),
                transaction_type: TransactionType::Sale,
                product_name: Some(input.product_name.clone()),
                customer_id: None,
                quantity_grams: sold,
                price_per_gram: input.price_per_gram,
                total_price: total,
                cost: Some(cost),
                profit: Some(total - cost),
                date: Some(day.to_string()),
            });
            stock -= sold;
            month.grams_sold += sold;
            month.revenue += total;
            month.profit += total - cost;
        }

        if stock <= input.reorder_threshold_grams {
            let paid = input.restock_grams * input.cost_per_gram;
            debug!(date = %day, stock = %stock, restock = %input.restock_grams, "Restocking");
            sequence += 1;
            transactions.push(Transaction {
                id: Some(format!("sim-{sequence}")),
                transaction_type: TransactionType::Purchase,
                product_name: Some(input.product_name.clone()),
                customer_id: None,
                quantity_grams: input.restock_grams,
                price_per_gram: input.cost_per_gram,
                total_price: paid,
                cost: Some(paid),
                profit: None,
                date: Some(day.to_string()),
            });
            stock += input.restock_grams;
            month.restocks += 1;
            month.purchase_cost += paid;
        }

        month.ending_inventory_grams = stock;
        day = day
            .succ_opt()
            .ok_or_else(|| ShopcalcError::DateError(format!("no day after {day}")))?;
    }

    let months: Vec<SimulatedMonth> = months.into_values().collect();
    let stockout_days: u32 = months.iter().map(|m| m.stockout_days).sum();
    if stockout_days > 0 {
        warnings.push(format!(
            "Demand went unmet on {stockout_days} day(s); consider a larger restock or higher threshold"
        ));
    }

    let output = SimulationOutput {
        total_grams_sold: months.iter().map(|m| m.grams_sold).sum(),
        total_revenue: months.iter().map(|m| m.revenue).sum(),
        total_profit: months.iter().map(|m| m.profit).sum(),
        stockout_days,
        ending_inventory_grams: stock,
        transactions,
        months,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Inventory-constrained daily sales simulation (Normal demand)",
        &serde_json::json!({
            "start_date": input.start_date,
            "months": input.months,
            "seed": input.seed,
            "daily_demand_mean_grams": input.daily_demand_mean_grams.to_string(),
            "daily_demand_std_dev_grams": input.daily_demand_std_dev_grams.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_simulation_input(input: &SimulationInput) -> ShopcalcResult<()> {
    if input.months == 0 || input.months > MAX_SIMULATION_MONTHS {
        return Err(ShopcalcError::invalid(
            "months",
            format!("Must be between 1 and {MAX_SIMULATION_MONTHS}"),
        ));
    }
    if input.restock_grams <= Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "restock_grams",
            "Restock size must be positive",
        ));
    }
    for (field, value) in [
        ("starting_inventory_grams", input.starting_inventory_grams),
        ("reorder_threshold_grams", input.reorder_threshold_grams),
        ("daily_demand_mean_grams", input.daily_demand_mean_grams),
        ("daily_demand_std_dev_grams", input.daily_demand_std_dev_grams),
        ("price_per_gram", input.price_per_gram),
        ("cost_per_gram", input.cost_per_gram),
    ] {
        if value < Decimal::ZERO {
            return Err(ShopcalcError::invalid(field, "Cannot be negative"));
        }
    }
    Ok(())
}

fn to_f64(value: Decimal, field: &str) -> ShopcalcResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ShopcalcError::invalid(field, "Not representable as a float"))
}
