use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::Path;

use shopcalc_core::pricing::derived::{self, DerivedInput, WholesaleCost};
use shopcalc_core::pricing::markup::{self, MarkupInput};
use shopcalc_core::pricing::scenarios::{self, ScenarioInput};

use crate::config::BusinessProfile;
use crate::input::{self, default_field, set_field};

/// Arguments for the markup price table
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PricePointsArgs {
    /// What the supplier charges per ounce
    #[arg(long)]
    pub wholesale_price_per_ounce: Option<Decimal>,

    /// Net profit wanted each month
    #[arg(long)]
    pub target_profit: Option<Decimal>,

    /// Fixed monthly costs
    #[arg(long)]
    pub operating_expenses: Option<Decimal>,

    /// Markups to price, in percent (e.g. 50,100,200)
    #[arg(long, value_delimiter = ',')]
    pub markups: Option<Vec<u32>>,

    /// Path to JSON or YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the price scenario ladder
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScenariosArgs {
    /// Retail price per gram at the centre of the ladder
    #[arg(long)]
    pub base_price: Option<Decimal>,

    /// Step between adjacent scenarios
    #[arg(long)]
    pub increment: Option<Decimal>,

    /// Gross margin as a percent of the retail price
    #[arg(long)]
    pub gross_margin: Option<Decimal>,

    /// Net profit wanted each month
    #[arg(long)]
    pub target_profit: Option<Decimal>,

    /// Fixed monthly costs
    #[arg(long)]
    pub operating_expenses: Option<Decimal>,

    /// Flat sales commission, in percent of revenue
    #[arg(long)]
    pub commission_rate: Option<Decimal>,

    /// Path to JSON or YAML input file (salespeople go here)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a single price/volume breakdown
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DerivedArgs {
    /// Selling price per gram
    #[arg(long)]
    pub retail_price_per_gram: Option<Decimal>,

    /// Wholesale cost per ounce
    #[arg(long, conflicts_with = "wholesale_price_per_gram")]
    pub wholesale_price_per_ounce: Option<Decimal>,

    /// Wholesale cost per gram
    #[arg(long)]
    pub wholesale_price_per_gram: Option<Decimal>,

    /// Grams sold per month
    #[arg(long)]
    pub monthly_sales_grams: Option<Decimal>,

    /// Fixed monthly costs
    #[arg(long)]
    pub operating_expenses: Option<Decimal>,

    /// Sales commission, in percent of revenue
    #[arg(long)]
    pub commission_rate: Option<Decimal>,

    /// Path to JSON or YAML input file (flags override its values)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_price_points(
    args: PricePointsArgs,
    profile: Option<&Path>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = BusinessProfile::load_optional(profile)?;
    let mut doc = input::load_document(args.input.as_deref())?;

    let wholesale = ["params", "wholesale_price_per_ounce"];
    let target = ["params", "target_profit_per_month"];
    let expenses = ["params", "operating_expenses"];

    default_field(&mut doc, &wholesale, profile.wholesale_price_per_ounce)?;
    default_field(&mut doc, &target, profile.target_profit_per_month)?;
    default_field(&mut doc, &expenses, profile.operating_expenses)?;
    default_field(&mut doc, &["markup_percentages"], profile.markup_percentages)?;

    set_field(&mut doc, &wholesale, args.wholesale_price_per_ounce)?;
    set_field(&mut doc, &target, args.target_profit)?;
    set_field(&mut doc, &expenses, args.operating_expenses)?;
    set_field(&mut doc, &["markup_percentages"], args.markups)?;

    let markup_input: MarkupInput = serde_json::from_value(doc)
        .map_err(|e| format!("price-points needs a wholesale price, target profit and operating expenses: {e}"))?;
    let result = markup::generate_price_points(&markup_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(
    args: ScenariosArgs,
    profile: Option<&Path>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = BusinessProfile::load_optional(profile)?;
    let mut doc = input::load_document(args.input.as_deref())?;

    default_field(&mut doc, &["base_price"], profile.retail_price_per_gram)?;
    default_field(&mut doc, &["target_profit"], profile.target_profit_per_month)?;
    default_field(&mut doc, &["operating_expenses"], profile.operating_expenses)?;
    default_field(&mut doc, &["commission_rate"], profile.commission_rate)?;

    set_field(&mut doc, &["base_price"], args.base_price)?;
    set_field(&mut doc, &["price_increment"], args.increment)?;
    set_field(&mut doc, &["gross_margin_percentage"], args.gross_margin)?;
    set_field(&mut doc, &["target_profit"], args.target_profit)?;
    set_field(&mut doc, &["operating_expenses"], args.operating_expenses)?;
    set_field(&mut doc, &["commission_rate"], args.commission_rate)?;

    let scenario_input: ScenarioInput = serde_json::from_value(doc).map_err(|e| {
        format!("scenarios needs a base price, increment, gross margin and target profit: {e}")
    })?;
    let result = scenarios::generate_scenarios(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_derived(
    args: DerivedArgs,
    profile: Option<&Path>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let profile = BusinessProfile::load_optional(profile)?;
    let mut doc = input::load_document(args.input.as_deref())?;

    default_field(&mut doc, &["retail_price_per_gram"], profile.retail_price_per_gram)?;
    default_field(
        &mut doc,
        &["wholesale_cost"],
        profile.wholesale_price_per_ounce.map(WholesaleCost::PerOunce),
    )?;
    default_field(&mut doc, &["operating_expenses"], profile.operating_expenses)?;
    default_field(&mut doc, &["commission_rate"], profile.commission_rate)?;

    let wholesale = args
        .wholesale_price_per_ounce
        .map(WholesaleCost::PerOunce)
        .or(args.wholesale_price_per_gram.map(WholesaleCost::PerGram));
    set_field(&mut doc, &["retail_price_per_gram"], args.retail_price_per_gram)?;
    set_field(&mut doc, &["wholesale_cost"], wholesale)?;
    set_field(&mut doc, &["monthly_sales_grams"], args.monthly_sales_grams)?;
    set_field(&mut doc, &["operating_expenses"], args.operating_expenses)?;
    set_field(&mut doc, &["commission_rate"], args.commission_rate)?;

    let derived_input: DerivedInput = serde_json::from_value(doc).map_err(|e| {
        format!("derived needs a retail price, wholesale cost and monthly sales: {e}")
    })?;
    let result = derived::calculate_derived_values(&derived_input)?;
    Ok(serde_json::to_value(result)?)
}
