use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ShopcalcError;
use crate::types::{
    in_range, percent_or_zero, with_metadata, ComputationOutput, Grams, Money, Percent,
};
use crate::units::{grams_to_ounces, price_per_ounce_to_per_gram};
use crate::ShopcalcResult;

/// Wholesale cost as the supplier quotes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WholesaleCost {
    PerOunce(Money),
    PerGram(Money),
}

impl WholesaleCost {
    pub fn per_gram(&self) -> Money {
        match *self {
            WholesaleCost::PerOunce(price) => price_per_ounce_to_per_gram(price),
            WholesaleCost::PerGram(price) => price,
        }
    }
}

/// Input for a full monthly profitability breakdown at one selling price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedInput {
    pub retail_price_per_gram: Money,
    pub wholesale_cost: WholesaleCost,
    pub monthly_sales_grams: Grams,
    #[serde(default)]
    pub operating_expenses: Money,
    /// Sales commission as a percent of revenue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Percent>,
}

/// Monthly profitability breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedValues {
    pub wholesale_price_per_gram: Money,
    pub monthly_revenue: Money,
    pub monthly_cost: Money,
    /// revenue - cost of goods
    pub gross_profit: Money,
    pub commission: Money,
    /// gross_profit - operating_expenses - commission
    pub net_profit: Money,
    /// net_profit / revenue, in percent (0 without revenue)
    pub profit_margin: Percent,
    /// net_profit / (cost + operating_expenses), in percent (0 without investment)
    pub roi: Percent,
    /// retail - wholesale, before expenses
    pub profit_per_gram: Money,
    /// Grams needed to cover operating expenses (0 when each gram loses money)
    pub break_even_grams: Grams,
    pub break_even_ounces: Decimal,
}

/// Compute the monthly profitability breakdown.
pub fn calculate_derived_values(
    input: &DerivedInput,
) -> ShopcalcResult<ComputationOutput<DerivedValues>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_derived_input(input)?;
    let values = derive(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly revenue, cost, commission and net profit at a fixed price",
        input,
        warnings,
        elapsed,
        values,
    ))
}

pub(crate) fn validate_derived_input(input: &DerivedInput) -> ShopcalcResult<()> {
    if input.retail_price_per_gram < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "retail_price_per_gram",
            "Retail price cannot be negative",
        ));
    }
    if input.wholesale_cost.per_gram() < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "wholesale_cost",
            "Wholesale cost cannot be negative",
        ));
    }
    if input.monthly_sales_grams < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "monthly_sales_grams",
            "Sales volume cannot be negative",
        ));
    }
    if input.operating_expenses < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "operating_expenses",
            "Operating expenses cannot be negative",
        ));
    }
    if let Some(rate) = input.commission_rate {
        if rate < Decimal::ZERO || rate > dec!(100) {
            return Err(ShopcalcError::invalid(
                "commission_rate",
                "Commission rate must be between 0 and 100",
            ));
        }
    }
    Ok(())
}

/// Shared derivation used by the scenario generator. Assumes validated input.
pub(crate) fn derive(
    input: &DerivedInput,
    warnings: &mut Vec<String>,
) -> ShopcalcResult<DerivedValues> {
    let wholesale = input.wholesale_cost.per_gram();
    let grams = input.monthly_sales_grams;

    let monthly_revenue = in_range(
        grams.checked_mul(input.retail_price_per_gram),
        "monthly_sales_grams",
        "Monthly revenue",
    )?;
    let monthly_cost = in_range(
        grams.checked_mul(wholesale),
        "monthly_sales_grams",
        "Monthly cost",
    )?;
    let gross_profit = monthly_revenue - monthly_cost;
    let commission = input
        .commission_rate
        .map(|rate| rate / dec!(100) * monthly_revenue)
        .unwrap_or(Decimal::ZERO);
    let net_profit = in_range(
        gross_profit
            .checked_sub(input.operating_expenses)
            .and_then(|p| p.checked_sub(commission)),
        "operating_expenses",
        "Net loss",
    )?;
    let investment = in_range(
        monthly_cost.checked_add(input.operating_expenses),
        "operating_expenses",
        "Cost plus operating expenses",
    )?;

    let profit_margin = percent_or_zero(net_profit, monthly_revenue, "Profit margin", warnings);
    let roi = percent_or_zero(net_profit, investment, "ROI", warnings);

    let profit_per_gram = input.retail_price_per_gram - wholesale;
    let break_even_grams = if profit_per_gram > Decimal::ZERO {
        in_range(
            input.operating_expenses.checked_div(profit_per_gram),
            "operating_expenses",
            "Break-even volume",
        )?
    } else {
        warnings.push(format!(
            "Break-even volume is undefined (profit per gram is {profit_per_gram}); reported as 0"
        ));
        Decimal::ZERO
    };

    Ok(DerivedValues {
        wholesale_price_per_gram: wholesale,
        monthly_revenue,
        monthly_cost,
        gross_profit,
        commission,
        net_profit,
        profit_margin,
        roi,
        profit_per_gram,
        break_even_grams,
        break_even_ounces: grams_to_ounces(break_even_grams),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> DerivedInput {
        DerivedInput {
            retail_price_per_gram: dec!(10),
            wholesale_cost: WholesaleCost::PerGram(dec!(4)),
            monthly_sales_grams: dec!(1000),
            operating_expenses: dec!(2000),
            commission_rate: None,
        }
    }

    #[test]
    fn test_basic_breakdown() {
        let out = calculate_derived_values(&sample_input()).unwrap();
        let v = &out.result;
        assert_eq!(v.monthly_revenue, dec!(10000));
        assert_eq!(v.monthly_cost, dec!(4000));
        assert_eq!(v.gross_profit, dec!(6000));
        assert_eq!(v.commission, Decimal::ZERO);
        assert_eq!(v.net_profit, dec!(4000));
        assert_eq!(v.profit_margin, dec!(40));
        // 4000 / (4000 + 2000)
        assert!((v.roi - dec!(66.6667)).abs() < dec!(0.001));
        assert_eq!(v.profit_per_gram, dec!(6));
        assert!((v.break_even_grams - dec!(333.333)).abs() < dec!(0.001));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_commission_deducted() {
        let mut input = sample_input();
        input.commission_rate = Some(dec!(10));
        let v = calculate_derived_values(&input).unwrap().result;
        assert_eq!(v.commission, dec!(1000));
        assert_eq!(v.net_profit, dec!(3000));
    }

    #[test]
    fn test_per_ounce_cost() {
        let mut input = sample_input();
        input.wholesale_cost = WholesaleCost::PerOunce(dec!(28.3495));
        let v = calculate_derived_values(&input).unwrap().result;
        assert_eq!(v.wholesale_price_per_gram, dec!(1));
        assert_eq!(v.monthly_cost, dec!(1000));
    }

    #[test]
    fn test_zero_volume_is_defined() {
        let mut input = sample_input();
        input.monthly_sales_grams = Decimal::ZERO;
        let out = calculate_derived_values(&input).unwrap();
        let v = &out.result;
        assert_eq!(v.monthly_revenue, Decimal::ZERO);
        assert_eq!(v.monthly_cost, Decimal::ZERO);
        assert_eq!(v.profit_margin, Decimal::ZERO);
        // Only operating expenses are invested, and all of it is lost
        assert_eq!(v.roi, dec!(-100));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_nothing_invested_guards_roi() {
        let input = DerivedInput {
            retail_price_per_gram: dec!(5),
            wholesale_cost: WholesaleCost::PerGram(dec!(2)),
            monthly_sales_grams: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            commission_rate: None,
        };
        let out = calculate_derived_values(&input).unwrap();
        assert_eq!(out.result.roi, Decimal::ZERO);
        assert_eq!(out.result.break_even_grams, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_selling_below_cost() {
        let mut input = sample_input();
        input.retail_price_per_gram = dec!(3);
        let out = calculate_derived_values(&input).unwrap();
        assert_eq!(out.result.profit_per_gram, dec!(-1));
        assert_eq!(out.result.break_even_grams, Decimal::ZERO);
        assert!(out.result.net_profit < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.starts_with("Break-even")));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = sample_input();
        input.commission_rate = Some(dec!(120));
        assert!(calculate_derived_values(&input).is_err());

        let mut input = sample_input();
        input.monthly_sales_grams = dec!(-1);
        assert!(calculate_derived_values(&input).is_err());

        let mut input = sample_input();
        input.wholesale_cost = WholesaleCost::PerOunce(dec!(-5));
        assert!(calculate_derived_values(&input).is_err());
    }

    #[test]
    fn test_wholesale_cost_json() {
        let input: DerivedInput = serde_json::from_value(serde_json::json!({
            "retail_price_per_gram": "7",
            "wholesale_cost": { "per_ounce": "100" },
            "monthly_sales_grams": "500"
        }))
        .unwrap();
        assert_eq!(input.operating_expenses, Decimal::ZERO);
        assert!(matches!(input.wholesale_cost, WholesaleCost::PerOunce(_)));
    }

    #[test]
    fn test_break_even_out_of_range() {
        let input = DerivedInput {
            retail_price_per_gram: dec!(0.0000000000000000001),
            wholesale_cost: WholesaleCost::PerGram(Decimal::ZERO),
            monthly_sales_grams: dec!(10),
            operating_expenses: dec!(100000000000000000000),
            commission_rate: None,
        };
        match calculate_derived_values(&input) {
            Err(ShopcalcError::InvalidInput { field, reason }) => {
                assert_eq!(field, "operating_expenses");
                assert!(reason.starts_with("Break-even volume"), "{reason}");
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
