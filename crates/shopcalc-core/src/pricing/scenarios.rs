use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ShopcalcError;
use crate::pricing::derived::{derive, DerivedInput, DerivedValues, WholesaleCost};
use crate::types::{in_range, with_metadata, ComputationOutput, Grams, Money, Percent};
use crate::units::grams_to_ounces;
use crate::ShopcalcResult;

/// Number of price steps generated on each side of the base price.
pub const STEPS_EACH_SIDE: u32 = 5;

/// Total scenarios produced per run.
pub const SCENARIO_COUNT: usize = (2 * STEPS_EACH_SIDE + 1) as usize;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A salesperson who takes a share of the monthly volume on commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salesperson {
    pub name: String,
    /// Commission as a percent of the revenue they bring in
    pub commission_rate: Percent,
    /// Share of total monthly volume, in percent
    pub sales_share: Percent,
}

/// Input for the price scenario generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Retail price per gram at the centre of the ladder
    pub base_price: Money,
    /// Step between adjacent scenarios
    pub price_increment: Money,
    /// Gross margin as a percent of the retail price
    pub gross_margin_percentage: Percent,
    /// Net profit to reach each month
    pub target_profit: Money,
    #[serde(default)]
    pub operating_expenses: Money,
    /// Flat commission rate, ignored when salespeople are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Percent>,
    #[serde(default)]
    pub salespeople: Vec<Salesperson>,
}

/// One salesperson's slice of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalespersonAllocation {
    pub name: String,
    pub sales_share: Percent,
    pub grams: Grams,
    pub revenue: Money,
    pub commission: Money,
}

/// The business at one candidate retail price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioData {
    /// "P20", or "P20 (base)" for the centre scenario
    pub label: String,
    pub is_base: bool,
    pub retail_price_per_gram: Money,
    pub gross_margin_per_gram: Money,
    pub target_net_profit: Money,
    /// Volume needed to reach the target at this price
    pub monthly_sales_grams: Grams,
    pub monthly_sales_ounces: Decimal,
    /// False when each gram earns nothing after commission
    pub target_reachable: bool,
    #[serde(flatten)]
    pub values: DerivedValues,
    pub salespeople: Vec<SalespersonAllocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutput {
    /// Ascending by price; index 5 is the base case
    pub scenarios: Vec<ScenarioData>,
    pub base_index: usize,
    /// Effective commission rate applied to every scenario
    pub commission_rate: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the 11-step price ladder around a base price.
///
/// Prices below the base never drop under one increment, so a ladder whose
/// lower steps would go negative repeats the floor price instead. The
/// ladder stays ascending even when the base is below one increment.
pub fn generate_scenarios(
    input: &ScenarioInput,
) -> ShopcalcResult<ComputationOutput<ScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_scenario_input(input)?;
    let commission_rate = effective_commission_rate(input, &mut warnings);

    let prices = price_ladder(input.base_price, input.price_increment)?;
    if prices.windows(2).any(|w| w[0] == w[1]) {
        warnings.push(format!(
            "Lower scenarios clamped to the minimum price of {}",
            input.price_increment.min(input.base_price)
        ));
    }

    let base_index = STEPS_EACH_SIDE as usize;
    let scenarios = prices
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            build_scenario(input, price, i == base_index, commission_rate, &mut warnings)
        })
        .collect::<ShopcalcResult<Vec<ScenarioData>>>()?;

    let output = ScenarioOutput {
        scenarios,
        base_index,
        commission_rate,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Retail price ladder with required monthly volume per price",
        &serde_json::json!({
            "base_price": input.base_price.to_string(),
            "price_increment": input.price_increment.to_string(),
            "gross_margin_percentage": input.gross_margin_percentage.to_string(),
            "target_profit": input.target_profit.to_string(),
            "operating_expenses": input.operating_expenses.to_string(),
            "salespeople": input.salespeople.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_scenario_input(input: &ScenarioInput) -> ShopcalcResult<()> {
    if input.price_increment <= Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "price_increment",
            "Price increment must be positive",
        ));
    }
    if input.base_price <= Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "base_price",
            "Base price must be positive",
        ));
    }
    if input.gross_margin_percentage < Decimal::ZERO || input.gross_margin_percentage > dec!(100) {
        return Err(ShopcalcError::invalid(
            "gross_margin_percentage",
            "Gross margin must be between 0 and 100",
        ));
    }
    if input.target_profit < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "target_profit",
            "Target profit cannot be negative",
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
    if !input.salespeople.is_empty() {
        for sp in &input.salespeople {
            if sp.commission_rate < Decimal::ZERO || sp.commission_rate > dec!(100) {
                return Err(ShopcalcError::invalid(
                    format!("salespeople:{}", sp.name),
                    "Commission rate must be between 0 and 100",
                ));
            }
            if sp.sales_share < Decimal::ZERO {
                return Err(ShopcalcError::invalid(
                    format!("salespeople:{}", sp.name),
                    "Sales share cannot be negative",
                ));
            }
        }
        let total_share: Decimal = input.salespeople.iter().map(|s| s.sales_share).sum();
        if (total_share - dec!(100)).abs() > dec!(0.01) {
            return Err(ShopcalcError::invalid(
                "salespeople",
                format!("Sales shares must sum to 100, got {total_share}"),
            ));
        }
    }
    Ok(())
}

/// Blended commission across the sales team, or the flat rate.
fn effective_commission_rate(input: &ScenarioInput, warnings: &mut Vec<String>) -> Percent {
    if input.salespeople.is_empty() {
        return input.commission_rate.unwrap_or(Decimal::ZERO);
    }
    if input.commission_rate.is_some() {
        warnings.push(
            "Flat commission_rate ignored; using the blended rate of the salespeople".into(),
        );
    }
    input
        .salespeople
        .iter()
        .map(|s| s.sales_share * s.commission_rate / dec!(100))
        .sum()
}

/// Five steps below, the base, five steps above. Lower steps are floored at
/// one increment, or at the base itself when the base is smaller.
fn price_ladder(base: Money, increment: Money) -> ShopcalcResult<Vec<Money>> {
    let floor = increment.min(base);
    let step = |i: u32| {
        in_range(
            increment.checked_mul(Decimal::from(i)),
            "price_increment",
            "Price ladder step",
        )
    };
    let mut prices = Vec::with_capacity(SCENARIO_COUNT);
    for i in (1..=STEPS_EACH_SIDE).rev() {
        prices.push((base - step(i)?).max(floor));
    }
    prices.push(base);
    for i in 1..=STEPS_EACH_SIDE {
        prices.push(in_range(
            base.checked_add(step(i)?),
            "price_increment",
            "Top of the price ladder",
        )?);
    }
    Ok(prices)
}

fn scenario_label(price: Money, is_base: bool) -> String {
    let rounded = price.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    if is_base {
        format!("P{rounded} (base)")
    } else {
        format!("P{rounded}")
    }
}

fn build_scenario(
    input: &ScenarioInput,
    price: Money,
    is_base: bool,
    commission_rate: Percent,
    warnings: &mut Vec<String>,
) -> ShopcalcResult<ScenarioData> {
    let label = scenario_label(price, is_base);
    let margin = price * (input.gross_margin_percentage / dec!(100));
    let wholesale = price - margin;

    let contribution_per_gram = margin - price * (commission_rate / dec!(100));
    let required = in_range(
        input.target_profit.checked_add(input.operating_expenses),
        "target_profit",
        "Target profit plus operating expenses",
    )?;
    let (grams, target_reachable) = if contribution_per_gram > Decimal::ZERO {
        let grams = in_range(
            required.checked_div(contribution_per_gram),
            "target_profit",
            &format!("{label}: required monthly volume"),
        )?;
        (grams, true)
    } else {
        warnings.push(format!(
            "{label}: margin after commission is {contribution_per_gram} per gram; target unreachable"
        ));
        (Decimal::ZERO, false)
    };

    let derived_input = DerivedInput {
        retail_price_per_gram: price,
        wholesale_cost: WholesaleCost::PerGram(wholesale),
        monthly_sales_grams: grams,
        operating_expenses: input.operating_expenses,
        commission_rate: (!commission_rate.is_zero()).then_some(commission_rate),
    };
    // Per-step guard warnings are dropped; unreachable targets are flagged above.
    let mut derive_warnings = Vec::new();
    let values = derive(&derived_input, &mut derive_warnings)?;

    let salespeople = input
        .salespeople
        .iter()
        .map(|sp| {
            let sp_grams = grams * (sp.sales_share / dec!(100));
            let revenue = sp_grams * price;
            SalespersonAllocation {
                name: sp.name.clone(),
                sales_share: sp.sales_share,
                grams: sp_grams,
                revenue,
                commission: revenue * sp.commission_rate / dec!(100),
            }
        })
        .collect();

    Ok(ScenarioData {
        label,
        is_base,
        retail_price_per_gram: price,
        gross_margin_per_gram: margin,
        target_net_profit: input.target_profit,
        monthly_sales_grams: grams,
        monthly_sales_ounces: grams_to_ounces(grams),
        target_reachable,
        values,
        salespeople,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> ScenarioInput {
        ScenarioInput {
            base_price: dec!(20),
            price_increment: dec!(1),
            gross_margin_percentage: dec!(60),
            target_profit: dec!(2000),
            operating_expenses: Decimal::ZERO,
            commission_rate: None,
            salespeople: vec![],
        }
    }

    #[test]
    fn test_eleven_ascending_with_base_in_middle() {
        let out = generate_scenarios(&sample_input()).unwrap().result;
        assert_eq!(out.scenarios.len(), SCENARIO_COUNT);
        assert_eq!(out.base_index, 5);
        for w in out.scenarios.windows(2) {
            assert!(w[0].retail_price_per_gram <= w[1].retail_price_per_gram);
        }
        let base = &out.scenarios[5];
        assert!(base.is_base);
        assert_eq!(base.retail_price_per_gram, dec!(20));
        assert_eq!(base.gross_margin_per_gram, dec!(12));
        assert_eq!(base.label, "P20 (base)");
        assert_eq!(out.scenarios[0].retail_price_per_gram, dec!(15));
        assert_eq!(out.scenarios[0].label, "P15");
        assert_eq!(out.scenarios[10].retail_price_per_gram, dec!(25));
        assert_eq!(out.scenarios.iter().filter(|s| s.is_base).count(), 1);
    }

    #[test]
    fn test_volume_meets_target() {
        let out = generate_scenarios(&sample_input()).unwrap().result;
        let base = &out.scenarios[5];
        // 2000 / 12 per gram
        assert!((base.monthly_sales_grams - dec!(166.6667)).abs() < dec!(0.001));
        assert!((base.values.net_profit - dec!(2000)).abs() < dec!(0.000001));
        assert_eq!(base.values.wholesale_price_per_gram, dec!(8));
        assert!(base.target_reachable);
    }

    #[test]
    fn test_floor_at_one_increment() {
        let mut input = sample_input();
        input.base_price = dec!(3);
        let out = generate_scenarios(&input).unwrap();
        let prices: Vec<Decimal> = out
            .result
            .scenarios
            .iter()
            .map(|s| s.retail_price_per_gram)
            .collect();
        assert_eq!(
            prices,
            vec![
                dec!(1), dec!(1), dec!(1), dec!(1), dec!(2), dec!(3),
                dec!(4), dec!(5), dec!(6), dec!(7), dec!(8)
            ]
        );
        assert!(out.warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn test_base_below_increment_stays_ascending() {
        let prices = price_ladder(dec!(0.5), dec!(2)).unwrap();
        assert_eq!(prices.len(), SCENARIO_COUNT);
        assert_eq!(prices[0], dec!(0.5));
        assert_eq!(prices[5], dec!(0.5));
        assert_eq!(prices[6], dec!(2.5));
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_label_rounding() {
        assert_eq!(scenario_label(dec!(12.5), false), "P13");
        assert_eq!(scenario_label(dec!(12.49), false), "P12");
        assert_eq!(scenario_label(dec!(7.5), true), "P8 (base)");
    }

    #[test]
    fn test_salespeople_allocation_and_blended_rate() {
        let mut input = sample_input();
        input.salespeople = vec![
            Salesperson {
                name: "Ana".into(),
                commission_rate: dec!(10),
                sales_share: dec!(50),
            },
            Salesperson {
                name: "Ben".into(),
                commission_rate: dec!(20),
                sales_share: dec!(50),
            },
        ];
        let out = generate_scenarios(&input).unwrap().result;
        assert_eq!(out.commission_rate, dec!(15));

        let base = &out.scenarios[5];
        // margin 12, commission 3 per gram => 2000 / 9
        assert!((base.monthly_sales_grams - dec!(222.2222)).abs() < dec!(0.001));
        let allocated: Decimal = base.salespeople.iter().map(|s| s.commission).sum();
        assert!((allocated - base.values.commission).abs() < dec!(0.000001));
        assert!((base.values.net_profit - dec!(2000)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_unreachable_target() {
        let mut input = sample_input();
        input.gross_margin_percentage = dec!(10);
        input.commission_rate = Some(dec!(10));
        let out = generate_scenarios(&input).unwrap();
        assert!(out.result.scenarios.iter().all(|s| !s.target_reachable));
        assert!(out.result.scenarios.iter().all(|s| s.monthly_sales_grams.is_zero()));
        assert!(out.warnings.iter().any(|w| w.contains("unreachable")));
    }

    #[test]
    fn test_invalid_inputs() {
        let mut input = sample_input();
        input.price_increment = Decimal::ZERO;
        assert!(generate_scenarios(&input).is_err());

        let mut input = sample_input();
        input.gross_margin_percentage = dec!(101);
        assert!(generate_scenarios(&input).is_err());

        let mut input = sample_input();
        input.salespeople = vec![Salesperson {
            name: "Solo".into(),
            commission_rate: dec!(5),
            sales_share: dec!(80),
        }];
        assert!(generate_scenarios(&input).is_err());
    }

    #[test]
    fn test_required_volume_out_of_range() {
        let mut input = sample_input();
        input.base_price = dec!(0.0000000001);
        input.price_increment = dec!(0.0000000001);
        input.target_profit = dec!(100000000000000000000);
        match generate_scenarios(&input) {
            Err(ShopcalcError::InvalidInput { field, reason }) => {
                assert_eq!(field, "target_profit");
                assert!(reason.contains("required monthly volume"));
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_price_ladder_out_of_range() {
        let err = price_ladder(Decimal::MAX, dec!(1)).unwrap_err();
        assert!(matches!(
            err,
            ShopcalcError::InvalidInput { ref field, .. } if field == "price_increment"
        ));
    }
}
