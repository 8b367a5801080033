use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use shopcalc_core::units::{self, Quantity, WeightUnit};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Convert `value` between "g", "oz" and "kg". Decimals travel as strings.
#[napi]
pub fn convert_weight(value: String, from: String, to: String) -> NapiResult<String> {
    let value: Decimal = value.trim().parse().map_err(to_napi_error)?;
    let from: WeightUnit = from.parse().map_err(to_napi_error)?;
    let to: WeightUnit = to.parse().map_err(to_napi_error)?;
    Ok(units::convert(value, from, to).to_string())
}

/// The same weight in grams, ounces and kilograms, as JSON.
#[napi]
pub fn weight_quantity(value: String, unit: String) -> NapiResult<String> {
    let value: Decimal = value.trim().parse().map_err(to_napi_error)?;
    let unit: WeightUnit = unit.parse().map_err(to_napi_error)?;
    serde_json::to_string(&Quantity::from_unit(value, unit)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_price_points(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::pricing::markup::MarkupInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        shopcalc_core::pricing::markup::generate_price_points(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_scenarios(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::pricing::scenarios::ScenarioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        shopcalc_core::pricing::scenarios::generate_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_derived_values(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::pricing::derived::DerivedInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = shopcalc_core::pricing::derived::calculate_derived_values(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn build_monthly_forecast(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::forecast::monthly::ForecastInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = shopcalc_core::forecast::monthly::build_monthly_forecast(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_receivables(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::forecast::receivables::ReceivablesInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = shopcalc_core::forecast::receivables::analyze_receivables(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn value_inventory(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::forecast::inventory::InventoryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        shopcalc_core::forecast::inventory::value_inventory(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_sales(input_json: String) -> NapiResult<String> {
    let input: shopcalc_core::forecast::simulation::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        shopcalc_core::forecast::simulation::simulate_sales(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
