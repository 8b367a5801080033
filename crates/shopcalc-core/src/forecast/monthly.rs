use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::debug;

use crate::error::ShopcalcError;
use crate::forecast::inventory::{summarize_inventory, InventoryValuation};
use crate::forecast::receivables::{summarize_receivables, ReceivablesSummary};
use crate::records::{Customer, InventoryItem, Transaction, TransactionType};
use crate::types::{in_range, with_metadata, ComputationOutput, Grams, Money, Percent};
use crate::ShopcalcResult;

/// Smallest monthly volume a projection will report, in grams.
pub const MIN_PROJECTED_GRAMS: Decimal = dec!(1);

pub const MAX_FORECAST_MONTHS: u32 = 60;
pub const MAX_HISTORY_MONTHS: u32 = 36;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the monthly dashboard and forward forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    /// "Today": the current month is the month containing this date
    pub as_of: NaiveDate,
    /// Months to project forward
    pub forecast_months: u32,
    /// Month-over-month volume growth, in percent
    #[serde(default)]
    pub growth_rate: Percent,
    /// Retail price per gram the projection sells at
    pub selected_price_per_gram: Money,
    /// Complete months of history to report and seed from
    #[serde(default = "default_history_months")]
    pub history_months: u32,
    /// Cost per gram for projected months; derived from sales when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost_per_gram: Option<Money>,
}

fn default_history_months() -> u32 {
    6
}

/// Totals for one calendar month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthStats {
    /// "YYYY-MM"
    pub label: String,
    pub year: i32,
    pub month: u32,
    /// Sales and customer payments
    pub revenue: Money,
    /// Sales only
    pub profit: Money,
    /// Stock purchases only
    pub cost: Money,
    pub grams_sold: Grams,
    pub sales_count: usize,
}

impl MonthStats {
    fn new(month_start: NaiveDate) -> Self {
        MonthStats {
            label: month_start.format("%Y-%m").to_string(),
            year: month_start.year(),
            month: month_start.month(),
            ..Default::default()
        }
    }

    fn record(&mut self, tx: &Transaction) {
        match tx.transaction_type {
            TransactionType::Sale => {
                self.revenue += tx.total_price;
                self.profit += tx.profit_amount();
                self.grams_sold += tx.quantity_grams;
                self.sales_count += 1;
            }
            TransactionType::Payment => self.revenue += tx.total_price,
            TransactionType::Purchase => self.cost += tx.cost_amount(),
        }
    }
}

/// Current-month sales of one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_name: String,
    pub grams_sold: Grams,
    pub revenue: Money,
    pub profit: Money,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub revenue: Money,
    pub profit: Money,
}

/// One projected month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionMonth {
    /// 1 for the month after the current one
    pub month_index: u32,
    pub label: String,
    pub projected_grams: Grams,
    pub projected_revenue: Money,
    pub projected_cost: Money,
    pub projected_profit: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub as_of: NaiveDate,
    pub current_month: MonthStats,
    /// By revenue, highest first
    pub product_breakdown: Vec<ProductSales>,
    /// Day 1 through `as_of`
    pub daily_series: Vec<DailyPoint>,
    /// profit so far / days elapsed * days in month
    pub projected_month_end_profit: Money,
    /// Complete months before the current one, oldest first
    pub history: Vec<MonthStats>,
    pub accounts_receivable: ReceivablesSummary,
    pub inventory: InventoryValuation,
    /// Volume the growth projection starts from
    pub seed_grams: Grams,
    pub unit_cost_per_gram: Money,
    pub projection: Vec<ProjectionMonth>,
    /// Transactions dropped for a missing or unreadable date
    pub skipped_transactions: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the monthly dashboard: current-month stats, history, receivables,
/// stock value and a compound-growth projection.
pub fn build_monthly_forecast(
    input: &ForecastInput,
) -> ShopcalcResult<ComputationOutput<ForecastOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_forecast_input(input)?;

    let as_of = input.as_of;
    let current_start = month_start(as_of);
    let history_start = current_start
        .checked_sub_months(Months::new(input.history_months))
        .ok_or_else(|| ShopcalcError::DateError("history window before year 0".into()))?;

    // --- Date every transaction, dropping unreadable and future ones ---
    let mut skipped = 0usize;
    let mut future = 0usize;
    let mut dated: Vec<(NaiveDate, &Transaction)> = Vec::with_capacity(input.transactions.len());
    for tx in &input.transactions {
        match tx.date() {
            Some(d) if d > as_of => future += 1,
            Some(d) => dated.push((d, tx)),
            None => {
                debug!(id = ?tx.id, date = ?tx.date, "Skipping transaction without a usable date");
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warnings.push(format!(
            "{skipped} transaction(s) skipped: missing or unreadable date"
        ));
    }
    if future > 0 {
        warnings.push(format!("{future} transaction(s) dated after {as_of} ignored"));
    }

    // --- Current month ---
    let mut current_month = MonthStats::new(current_start);
    let mut by_product: BTreeMap<&str, ProductSales> = BTreeMap::new();
    let days_elapsed = as_of.day();
    let mut daily_series: Vec<DailyPoint> = (1..=days_elapsed)
        .filter_map(|day| as_of.with_day(day))
        .map(|date| DailyPoint {
            date,
            revenue: Decimal::ZERO,
            profit: Decimal::ZERO,
        })
        .collect();

    for &(date, tx) in dated.iter().filter(|(d, _)| *d >= current_start) {
        current_month.record(tx);

        let point = &mut daily_series[(date.day() - 1) as usize];
        match tx.transaction_type {
            TransactionType::Sale => {
                point.revenue += tx.total_price;
                point.profit += tx.profit_amount();
                let entry = by_product
                    .entry(tx.product_label())
                    .or_insert_with(|| ProductSales {
                        product_name: tx.product_label().to_string(),
                        grams_sold: Decimal::ZERO,
                        revenue: Decimal::ZERO,
                        profit: Decimal::ZERO,
                        transaction_count: 0,
                    });
                entry.grams_sold += tx.quantity_grams;
                entry.revenue += tx.total_price;
                entry.profit += tx.profit_amount();
                entry.transaction_count += 1;
            }
            TransactionType::Payment => point.revenue += tx.total_price,
            TransactionType::Purchase => {}
        }
    }

    let mut product_breakdown: Vec<ProductSales> = by_product.into_values().collect();
    product_breakdown.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });

    let days_in_month = days_in_month(current_start)?;
    let projected_month_end_profit = in_range(
        current_month
            .profit
            .checked_mul(Decimal::from(days_in_month))
            .and_then(|p| p.checked_div(Decimal::from(days_elapsed))),
        "transactions",
        "Projected month-end profit",
    )?;

    // --- History (complete months before the current one) ---
    let mut history: Vec<MonthStats> = (0..input.history_months)
        .filter_map(|k| history_start.checked_add_months(Months::new(k)))
        .map(MonthStats::new)
        .collect();
    for &(date, tx) in dated
        .iter()
        .filter(|(d, _)| *d >= history_start && *d < current_start)
    {
        let idx = months_between(history_start, date);
        if let Some(stats) = history.get_mut(idx) {
            stats.record(tx);
        }
    }

    // --- Projection ---
    let seed_grams = projection_seed(&history);
    if seed_grams.is_zero() {
        warnings.push(format!(
            "No sales in the last {} month(s); projection uses the {} g floor",
            input.history_months, MIN_PROJECTED_GRAMS
        ));
    }
    let unit_cost_per_gram = match input.unit_cost_per_gram {
        Some(cost) => cost,
        None => historical_cost_per_gram(dated.iter().map(|(_, tx)| *tx), history_start),
    };
    let projection = project_months(
        current_start,
        seed_grams,
        input.growth_rate,
        input.forecast_months,
        input.selected_price_per_gram,
        unit_cost_per_gram,
    )?;

    // --- Receivables and stock ---
    let accounts_receivable = summarize_receivables(&input.customers, as_of, &mut warnings);
    let daily_sales_rate = current_month.grams_sold / Decimal::from(days_elapsed);
    let inventory = summarize_inventory(
        &input.inventory,
        Some(input.selected_price_per_gram),
        Some(daily_sales_rate),
        &mut warnings,
    );

    let output = ForecastOutput {
        as_of,
        current_month,
        product_breakdown,
        daily_series,
        projected_month_end_profit,
        history,
        accounts_receivable,
        inventory,
        seed_grams,
        unit_cost_per_gram,
        projection,
        skipped_transactions: skipped,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly sales dashboard with compound-growth volume projection",
        &serde_json::json!({
            "as_of": as_of,
            "transactions": input.transactions.len(),
            "forecast_months": input.forecast_months,
            "growth_rate": input.growth_rate.to_string(),
            "selected_price_per_gram": input.selected_price_per_gram.to_string(),
            "history_months": input.history_months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Compound a starting volume forward month by month.
///
/// The growth chain runs on the raw volume; `MIN_PROJECTED_GRAMS` only
/// floors what each month reports. A volume, revenue or cost that leaves
/// the `Decimal` range is an `InvalidInput` against the input driving it:
/// the growth rate when volume is compounding upward, otherwise the price.
pub fn project_months(
    current_month_start: NaiveDate,
    seed_grams: Grams,
    growth_rate: Percent,
    months: u32,
    price_per_gram: Money,
    unit_cost_per_gram: Money,
) -> ShopcalcResult<Vec<ProjectionMonth>> {
    let growth = Decimal::ONE + growth_rate / dec!(100);
    let driver = |price_field: &'static str| -> &'static str {
        if growth_rate > Decimal::ZERO {
            "growth_rate"
        } else {
            price_field
        }
    };
    let mut units = seed_grams;
    (1..=months)
        .map(|i| {
            units = in_range(
                units.checked_mul(growth),
                "growth_rate",
                &format!("Projected volume for month {i}"),
            )?;
            let grams = units.max(MIN_PROJECTED_GRAMS);
            let revenue = in_range(
                grams.checked_mul(price_per_gram),
                driver("selected_price_per_gram"),
                &format!("Projected revenue for month {i}"),
            )?;
            let cost = in_range(
                grams.checked_mul(unit_cost_per_gram),
                driver("unit_cost_per_gram"),
                &format!("Projected cost for month {i}"),
            )?;
            let label = current_month_start
                .checked_add_months(Months::new(i))
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default();
            Ok(ProjectionMonth {
                month_index: i,
                label,
                projected_grams: grams,
                projected_revenue: revenue,
                projected_cost: cost,
                projected_profit: revenue - cost,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_forecast_input(input: &ForecastInput) -> ShopcalcResult<()> {
    if input.forecast_months == 0 || input.forecast_months > MAX_FORECAST_MONTHS {
        return Err(ShopcalcError::invalid(
            "forecast_months",
            format!("Must be between 1 and {MAX_FORECAST_MONTHS}"),
        ));
    }
    if input.history_months == 0 || input.history_months > MAX_HISTORY_MONTHS {
        return Err(ShopcalcError::invalid(
            "history_months",
            format!("Must be between 1 and {MAX_HISTORY_MONTHS}"),
        ));
    }
    if input.growth_rate <= dec!(-100) {
        return Err(ShopcalcError::invalid(
            "growth_rate",
            "Growth rate must be greater than -100%",
        ));
    }
    if input.selected_price_per_gram < Decimal::ZERO {
        return Err(ShopcalcError::invalid(
            "selected_price_per_gram",
            "Selected price cannot be negative",
        ));
    }
    if input.unit_cost_per_gram.is_some_and(|c| c < Decimal::ZERO) {
        return Err(ShopcalcError::invalid(
            "unit_cost_per_gram",
            "Unit cost cannot be negative",
        ));
    }
    Ok(())
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_in_month(month_start: NaiveDate) -> ShopcalcResult<u32> {
    let next = month_start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ShopcalcError::DateError(format!("no month after {month_start}")))?;
    Ok((next - month_start).num_days() as u32)
}

fn months_between(from: NaiveDate, to: NaiveDate) -> usize {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    months.max(0) as usize
}

/// Last complete month's volume, or the window average when that month
/// sold nothing. Zero for a tenant with no sales history.
fn projection_seed(history: &[MonthStats]) -> Grams {
    match history.last() {
        Some(last) if last.grams_sold > Decimal::ZERO => last.grams_sold,
        Some(_) => {
            let total: Grams = history.iter().map(|m| m.grams_sold).sum();
            total / Decimal::from(history.len() as u64)
        }
        None => Decimal::ZERO,
    }
}

/// Average cost per gram of sales since `since`.
fn historical_cost_per_gram<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    since: NaiveDate,
) -> Money {
    let (cost, grams) = transactions
        .filter(|tx| tx.transaction_type == TransactionType::Sale)
        .filter(|tx| tx.date().is_some_and(|d| d >= since))
        .fold((Decimal::ZERO, Decimal::ZERO), |(c, g), tx| {
            (c + tx.total_price - tx.profit_amount(), g + tx.quantity_grams)
        });
    if grams > Decimal::ZERO {
        cost / grams
    } else {
        Decimal::ZERO
    }
}
