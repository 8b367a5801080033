use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ShopcalcError;
use crate::types::{
    in_range, percent_or_zero, with_metadata, ComputationOutput, Grams, Money, Percent,
};
use crate::units::{grams_to_ounces, price_per_ounce_to_per_gram, GRAMS_PER_OUNCE};
use crate::ShopcalcResult;

pub const MIN_MARKUP_PERCENTAGE: u32 = 1;
pub const MAX_MARKUP_PERCENTAGE: u32 = 300;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The handful of numbers every markup calculation starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessParameters {
    /// What the business pays its supplier per ounce
    pub wholesale_price_per_ounce: Money,
    /// Net profit the owner wants to take home each month
    pub target_profit_per_month: Money,
    /// Fixed monthly costs (rent, utilities, wages)
    pub operating_expenses: Money,
}

/// Input for the markup price calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupInput {
    pub params: BusinessParameters,
    /// Markups to price, in percent (100 = double the wholesale price)
    #[serde(default = "default_markups")]
    pub markup_percentages: Vec<u32>,
}

pub fn default_markups() -> Vec<u32> {
    vec![25, 50, 75, 100, 150, 200, 300]
}

/// One row of the price table: what selling at a given markup means for
/// the monthly volume needed to hit the profit target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub markup_percentage: u32,
    pub wholesale_price_per_gram: Money,
    pub retail_price_per_gram: Money,
    pub retail_price_per_ounce: Money,
    /// retail - wholesale
    pub profit_per_gram: Money,
    /// profit_per_gram / retail_price_per_gram, in percent
    pub gross_margin_percentage: Percent,
    /// (operating_expenses + target_profit) / profit_per_gram
    pub break_even_grams_per_month: Grams,
    pub break_even_ounces_per_month: Decimal,
    pub monthly_revenue: Money,
    pub monthly_cost: Money,
    /// monthly_revenue - monthly_cost - operating_expenses
    pub monthly_profit: Money,
    /// monthly_profit / (monthly_cost + operating_expenses), in percent
    pub roi: Percent,
}

/// Output of the markup price calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupOutput {
    pub price_points: Vec<PricePoint>,
    /// Markup with the highest ROI (first one on ties)
    pub best_roi_markup: Option<u32>,
    /// Markup needing the smallest monthly volume
    pub lowest_volume_markup: Option<u32>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price every requested markup.
///
/// Each point is independent; the list order of the input is preserved.
pub fn generate_price_points(
    input: &MarkupInput,
) -> ShopcalcResult<ComputationOutput<MarkupOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_params(&input.params)?;
    if input.markup_percentages.is_empty() {
        return Err(ShopcalcError::InsufficientData(
            "At least one markup percentage is required".into(),
        ));
    }

    let price_points = input
        .markup_percentages
        .iter()
        .map(|&m| price_point(&input.params, m, &mut warnings))
        .collect::<ShopcalcResult<Vec<PricePoint>>>()?;

    let best_roi_markup = price_points
        .iter()
        .fold(None::<&PricePoint>, |best, p| match best {
            Some(b) if b.roi >= p.roi => Some(b),
            _ => Some(p),
        })
        .map(|p| p.markup_percentage);

    let lowest_volume_markup = price_points
        .iter()
        .fold(None::<&PricePoint>, |best, p| match best {
            Some(b) if b.break_even_grams_per_month <= p.break_even_grams_per_month => Some(b),
            _ => Some(p),
        })
        .map(|p| p.markup_percentage);

    let output = MarkupOutput {
        price_points,
        best_roi_markup,
        lowest_volume_markup,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Markup pricing with monthly break-even volume",
        &serde_json::json!({
            "wholesale_price_per_ounce": input.params.wholesale_price_per_ounce.to_string(),
            "target_profit_per_month": input.params.target_profit_per_month.to_string(),
            "operating_expenses": input.params.operating_expenses.to_string(),
            "markups": input.markup_percentages,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Price a single markup.
pub fn calculate_price_point(
    params: &BusinessParameters,
    markup_percentage: u32,
) -> ShopcalcResult<PricePoint> {
    validate_params(params)?;
    let mut warnings = Vec::new();
    price_point(params, markup_percentage, &mut warnings)
}

/// Gross margin (share of the retail price) for a markup on cost.
/// 100% markup is a 50% margin.
pub fn markup_to_margin(markup_percentage: Percent) -> ShopcalcResult<Percent> {
    let denominator = dec!(100) + markup_percentage;
    if denominator.is_zero() {
        return Err(ShopcalcError::DivisionByZero {
            context: "markup to margin conversion (markup of -100%)".into(),
        });
    }
    Ok(markup_percentage / denominator * dec!(100))
}

/// Markup on cost needed to achieve a gross margin.
pub fn margin_to_markup(margin_percentage: Percent) -> ShopcalcResult<Percent> {
    if margin_percentage >= dec!(100) {
        return Err(ShopcalcError::invalid(
            "margin_percentage",
            "A gross margin of 100% or more cannot be reached with any markup",
        ));
    }
    Ok(margin_percentage / (dec!(100) - margin_percentage) * dec!(100))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_params(params: &BusinessParameters) -> ShopcalcResult<()> {
    if params.wholesale_price_per_ounce < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "wholesale_price_per_ounce",
            "Wholesale price cannot be negative",
        ));
    }
    if params.target_profit_per_month < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "target_profit_per_month",
            "Target profit cannot be negative",
        ));
    }
    if params.operating_expenses < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "operating_expenses",
            "Operating expenses cannot be negative",
        ));
    }
    Ok(())
}

fn price_point(
    params: &BusinessParameters,
    markup_percentage: u32,
    warnings: &mut Vec<String>,
) -> ShopcalcResult<PricePoint> {
    if !(MIN_MARKUP_PERCENTAGE..=MAX_MARKUP_PERCENTAGE).contains(&markup_percentage) {
        return Err(ShopcalcError::invalid(
            "markup_percentage",
            format!(
                "Markup must be between {MIN_MARKUP_PERCENTAGE} and {MAX_MARKUP_PERCENTAGE}, got {markup_percentage}"
            ),
        ));
    }

    let markup = Decimal::from(markup_percentage);
    let field = "wholesale_price_per_ounce";
    let wholesale = price_per_ounce_to_per_gram(params.wholesale_price_per_ounce);
    let retail = in_range(
        wholesale.checked_mul(Decimal::ONE + markup / dec!(100)),
        field,
        "Retail price per gram",
    )?;
    let profit_per_gram = retail - wholesale;

    if profit_per_gram.is_zero() {
        return Err(ShopcalcError::DivisionByZero {
            context: format!(
                "break-even volume at {markup_percentage}% markup (profit per gram is zero)"
            ),
        });
    }

    let required = in_range(
        params
            .operating_expenses
            .checked_add(params.target_profit_per_month),
        "target_profit_per_month",
        "Operating expenses plus target profit",
    )?;
    let break_even_grams = in_range(
        required.checked_div(profit_per_gram),
        field,
        &format!("Break-even volume at {markup_percentage}% markup"),
    )?;
    let monthly_revenue = in_range(
        retail.checked_mul(break_even_grams),
        field,
        &format!("Monthly revenue at {markup_percentage}% markup"),
    )?;
    let monthly_cost = wholesale * break_even_grams;
    let monthly_profit = monthly_revenue - monthly_cost - params.operating_expenses;
    let retail_price_per_ounce = in_range(
        retail.checked_mul(GRAMS_PER_OUNCE),
        field,
        "Retail price per ounce",
    )?;

    let mut point_warnings = Vec::new();
    let roi = percent_or_zero(
        monthly_profit,
        monthly_cost + params.operating_expenses,
        &format!("ROI at {markup_percentage}% markup"),
        &mut point_warnings,
    );
    warnings.extend(point_warnings);

    Ok(PricePoint {
        markup_percentage,
        wholesale_price_per_gram: wholesale,
        retail_price_per_gram: retail,
        retail_price_per_ounce,
        profit_per_gram,
        gross_margin_percentage: profit_per_gram / retail * dec!(100),
        break_even_grams_per_month: break_even_grams,
        break_even_ounces_per_month: grams_to_ounces(break_even_grams),
        monthly_revenue,
        monthly_cost,
        monthly_profit,
        roi,
    })
}
