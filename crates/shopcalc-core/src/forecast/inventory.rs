use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ShopcalcError;
use crate::records::InventoryItem;
use crate::types::{with_metadata, ComputationOutput, Grams, Money};
use crate::units::{grams_to_ounces, Quantity};
use crate::ShopcalcResult;

/// Input for stock valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryInput {
    pub items: Vec<InventoryItem>,
    /// Retail price for items without their own price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_retail_price_per_gram: Option<Money>,
    /// Recent sales rate, for days of cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_sales_grams: Option<Grams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLine {
    pub name: String,
    pub quantity: Quantity,
    pub cost_value: Money,
    pub retail_value: Money,
    pub needs_reorder: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryValuation {
    pub total: Quantity,
    /// Stock at what it cost
    pub cost_value: Money,
    /// Stock at what it would sell for
    pub retail_value: Money,
    pub potential_profit: Money,
    pub lines: Vec<InventoryLine>,
    /// Items at or below their reorder threshold
    pub reorder_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_cover: Option<Decimal>,
}

/// Value the stock on hand at cost and at retail.
pub fn value_inventory(
    input: &InventoryInput,
) -> ShopcalcResult<ComputationOutput<InventoryValuation>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input
        .default_retail_price_per_gram
        .is_some_and(|p| p < Decimal::ZERO)
    {
        return Err(ShopcalcError::invalid(
            "default_retail_price_per_gram",
            "Retail price cannot be negative",
        ));
    }
    if input.daily_sales_grams.is_some_and(|g| g < Decimal::ZERO) {
        return Err(ShopcalcError::invalid(
            "daily_sales_grams",
            "Sales rate cannot be negative",
        ));
    }

    let valuation = summarize_inventory(
        &input.items,
        input.default_retail_price_per_gram,
        input.daily_sales_grams,
        &mut warnings,
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Inventory valuation at cost and retail with reorder alerts",
        &serde_json::json!({
            "items": input.items.len(),
            "default_retail_price_per_gram": input.default_retail_price_per_gram,
            "daily_sales_grams": input.daily_sales_grams,
        }),
        warnings,
        elapsed,
        valuation,
    ))
}

pub(crate) fn summarize_inventory(
    items: &[InventoryItem],
    default_retail_price_per_gram: Option<Money>,
    daily_sales_grams: Option<Grams>,
    warnings: &mut Vec<String>,
) -> InventoryValuation {
    let mut total_grams = Decimal::ZERO;
    let mut cost_value = Decimal::ZERO;
    let mut retail_value = Decimal::ZERO;
    let mut lines = Vec::with_capacity(items.len());
    let mut reorder_items = Vec::new();

    for item in items {
        if item.quantity_grams < Decimal::ZERO {
            warnings.push(format!(
                "{} has negative stock ({} g)",
                item.name, item.quantity_grams
            ));
        }
        if !item.units_consistent() {
            warnings.push(format!(
                "{}: stored ounce/kilogram quantities disagree with {} g; using grams",
                item.name, item.quantity_grams
            ));
        }

        let quantity = item.quantity();
        let item_cost = grams_to_ounces(quantity.grams) * item.cost_per_ounce;
        let price = match item.retail_price_per_gram.or(default_retail_price_per_gram) {
            Some(p) => p,
            None => {
                warnings.push(format!(
                    "{} has no retail price; valued at 0 retail",
                    item.name
                ));
                Decimal::ZERO
            }
        };
        let item_retail = quantity.grams * price;
        let needs_reorder = item.needs_reorder();
        if needs_reorder {
            reorder_items.push(item.name.clone());
        }

        total_grams += quantity.grams;
        cost_value += item_cost;
        retail_value += item_retail;
        lines.push(InventoryLine {
            name: item.name.clone(),
            quantity,
            cost_value: item_cost,
            retail_value: item_retail,
            needs_reorder,
        });
    }

    let days_of_cover = daily_sales_grams
        .filter(|rate| *rate > Decimal::ZERO)
        .map(|rate| total_grams / rate);

    InventoryValuation {
        total: Quantity::from_grams(total_grams),
        cost_value,
        retail_value,
        potential_profit: retail_value - cost_value,
        lines,
        reorder_items,
        days_of_cover,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, grams: Decimal, cost_per_ounce: Decimal, retail: Option<Decimal>) -> InventoryItem {
        InventoryItem {
            id: None,
            name: name.into(),
            quantity_grams: grams,
            quantity_ounces: None,
            quantity_kilograms: None,
            cost_per_ounce,
            retail_price_per_gram: retail,
            reorder_threshold_grams: dec!(100),
        }
    }

    #[test]
    fn test_valuation_totals() {
        let input = InventoryInput {
            items: vec![
                item("Espresso", dec!(283.495), dec!(20), Some(dec!(2))),
                item("Decaf", dec!(1000), dec!(10), None),
            ],
            default_retail_price_per_gram: Some(dec!(1)),
            daily_sales_grams: Some(dec!(50)),
        };
        let out = value_inventory(&input).unwrap();
        let v = &out.result;
        // 10 oz * 20 = 200
        assert_eq!(v.lines[0].cost_value, dec!(200));
        assert_eq!(v.lines[0].retail_value, dec!(566.99));
        assert_eq!(v.lines[1].retail_value, dec!(1000));
        assert!((v.lines[1].cost_value - dec!(352.74)).abs() < dec!(0.01));
        assert_eq!(v.total.grams, dec!(1283.495));
        assert_eq!(v.potential_profit, v.retail_value - v.cost_value);
        assert!((v.days_of_cover.unwrap() - dec!(25.6699)).abs() < dec!(0.0001));
        assert!(v.reorder_items.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_reorder_and_missing_price() {
        let input = InventoryInput {
            items: vec![item("Low", dec!(80), dec!(5), None)],
            default_retail_price_per_gram: None,
            daily_sales_grams: None,
        };
        let out = value_inventory(&input).unwrap();
        assert_eq!(out.result.reorder_items, vec!["Low".to_string()]);
        assert!(out.result.lines[0].needs_reorder);
        assert_eq!(out.result.retail_value, Decimal::ZERO);
        assert!(out.result.days_of_cover.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_inconsistent_units_warns() {
        let mut stale = item("Stale", dec!(500), dec!(5), Some(dec!(1)));
        stale.quantity_kilograms = Some(dec!(0.75));
        let mut warnings = Vec::new();
        let v = summarize_inventory(&[stale], None, None, &mut warnings);
        assert_eq!(v.total.grams, dec!(500));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_negative_default_price_rejected() {
        let input = InventoryInput {
            items: vec![],
            default_retail_price_per_gram: Some(dec!(-1)),
            daily_sales_grams: None,
        };
        assert!(value_inventory(&input).is_err());
    }
}
