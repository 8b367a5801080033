use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::Path;

use shopcalc_core::forecast::inventory::{self, InventoryInput};
use shopcalc_core::forecast::monthly::{self, ForecastInput};
use shopcalc_core::forecast::receivables::{self, ReceivablesInput};
use shopcalc_core::forecast::simulation::{self, SimulationInput};

use crate::config::BusinessProfile;
use crate::input::{self, default_field, set_field};

/// Arguments for the monthly dashboard and forecast
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForecastArgs {
    /// Path to JSON or YAML file with transactions, customers and inventory
    #[arg(long)]
    pub input: Option<String>,

    /// Date the dashboard is built for (default: today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Months to project forward
    #[arg(long)]
    pub months: Option<u32>,

    /// Month-over-month volume growth, in percent
    #[arg(long)]
    pub growth_rate: Option<Decimal>,

    /// Retail price per gram for projected sales
    #[arg(long)]
    pub price_per_gram: Option<Decimal>,

    /// Complete months of history to report
    #[arg(long)]
    pub history_months: Option<u32>,

    /// Cost per gram for projected sales (default: from sales history)
    #[arg(long)]
    pub unit_cost_per_gram: Option<Decimal>,
}

/// Arguments for receivables aging
#[derive(Args)]
pub struct ReceivablesArgs {
    /// Path to JSON or YAML file with customers
    #[arg(long)]
    pub input: Option<String>,

    /// Date balances are aged to (default: today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for inventory valuation
#[derive(Args)]
pub struct InventoryArgs {
    /// Path to JSON or YAML file with inventory items
    #[arg(long)]
    pub input: Option<String>,

    /// Retail price per gram for items without their own
    #[arg(long)]
    pub default_retail_price_per_gram: Option<Decimal>,

    /// Recent grams sold per day, for days of cover
    #[arg(long)]
    pub daily_sales_grams: Option<Decimal>,
}

/// Arguments for the sales simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Path to JSON or YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,

    /// First simulated day
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Months to simulate
    #[arg(long)]
    pub months: Option<u32>,

    /// Stock on hand at the start, in grams
    #[arg(long)]
    pub starting_inventory: Option<Decimal>,

    /// Restock when stock falls to this many grams
    #[arg(long)]
    pub reorder_threshold: Option<Decimal>,

    /// Grams bought per restock
    #[arg(long)]
    pub restock: Option<Decimal>,

    /// Mean daily demand in grams
    #[arg(long)]
    pub demand_mean: Option<Decimal>,

    /// Standard deviation of daily demand in grams
    #[arg(long)]
    pub demand_std_dev: Option<Decimal>,

    /// Selling price per gram
    #[arg(long)]
    pub price_per_gram: Option<Decimal>,

    /// Wholesale cost per gram
    #[arg(long)]
    pub cost_per_gram: Option<Decimal>,

    /// Random seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn run_forecast(
    args: ForecastArgs,
    profile: Option<&Path>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = BusinessProfile::load_optional(profile)?;
    let mut doc = input::require_document(args.input.as_deref(), "forecast")?;

    default_field(&mut doc, &["as_of"], Some(today()))?;
    default_field(&mut doc, &["forecast_months"], profile.forecast_months)?;
    default_field(&mut doc, &["growth_rate"], profile.growth_rate)?;
    default_field(&mut doc, &["selected_price_per_gram"], profile.retail_price_per_gram)?;

    set_field(&mut doc, &["as_of"], args.as_of)?;
    set_field(&mut doc, &["forecast_months"], args.months)?;
    set_field(&mut doc, &["growth_rate"], args.growth_rate)?;
    set_field(&mut doc, &["selected_price_per_gram"], args.price_per_gram)?;
    set_field(&mut doc, &["history_months"], args.history_months)?;
    set_field(&mut doc, &["unit_cost_per_gram"], args.unit_cost_per_gram)?;

    let forecast_input: ForecastInput = serde_json::from_value(doc).map_err(|e| {
        format!("forecast needs transactions, a forecast horizon and a selling price: {e}")
    })?;
    let result = monthly::build_monthly_forecast(&forecast_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_receivables(args: ReceivablesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut doc = input::require_document(args.input.as_deref(), "receivables")?;

    default_field(&mut doc, &["as_of"], Some(today()))?;
    set_field(&mut doc, &["as_of"], args.as_of)?;

    let receivables_input: ReceivablesInput = serde_json::from_value(doc)?;
    let result = receivables::analyze_receivables(&receivables_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_inventory(
    args: InventoryArgs,
    profile: Option<&Path>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = BusinessProfile::load_optional(profile)?;
    let mut doc = input::require_document(args.input.as_deref(), "inventory")?;

    default_field(
        &mut doc,
        &["default_retail_price_per_gram"],
        profile.retail_price_per_gram,
    )?;
    set_field(
        &mut doc,
        &["default_retail_price_per_gram"],
        args.default_retail_price_per_gram,
    )?;
    set_field(&mut doc, &["daily_sales_grams"], args.daily_sales_grams)?;

    let inventory_input: InventoryInput = serde_json::from_value(doc)?;
    let result = inventory::value_inventory(&inventory_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut doc = input::load_document(args.input.as_deref())?;

    default_field(&mut doc, &["start_date"], Some(today()))?;
    set_field(&mut doc, &["start_date"], args.start_date)?;
    set_field(&mut doc, &["months"], args.months)?;
    set_field(&mut doc, &["starting_inventory_grams"], args.starting_inventory)?;
    set_field(&mut doc, &["reorder_threshold_grams"], args.reorder_threshold)?;
    set_field(&mut doc, &["restock_grams"], args.restock)?;
    set_field(&mut doc, &["daily_demand_mean_grams"], args.demand_mean)?;
    set_field(&mut doc, &["daily_demand_std_dev_grams"], args.demand_std_dev)?;
    set_field(&mut doc, &["price_per_gram"], args.price_per_gram)?;
    set_field(&mut doc, &["cost_per_gram"], args.cost_per_gram)?;
    set_field(&mut doc, &["seed"], args.seed)?;

    let sim_input: SimulationInput = serde_json::from_value(doc)
        .map_err(|e| format!("simulate needs stock levels, demand and prices: {e}"))?;
    let result = simulation::simulate_sales(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
