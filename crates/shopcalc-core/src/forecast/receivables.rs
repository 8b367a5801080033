use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::records::{parse_record_date, Customer};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ShopcalcResult;

/// Input for accounts-receivable aging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivablesInput {
    pub customers: Vec<Customer>,
    pub as_of: NaiveDate,
}

/// Outstanding balances grouped by days past the due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgingBuckets {
    /// Not yet due, or no due date recorded
    pub current: Money,
    pub days_1_30: Money,
    pub days_31_60: Money,
    pub days_61_90: Money,
    pub days_over_90: Money,
}

impl AgingBuckets {
    fn add(&mut self, days_past_due: i64, amount: Money) {
        let bucket = match days_past_due {
            d if d <= 0 => &mut self.current,
            1..=30 => &mut self.days_1_30,
            31..=60 => &mut self.days_31_60,
            61..=90 => &mut self.days_61_90,
            _ => &mut self.days_over_90,
        };
        *bucket += amount;
    }
}

/// One customer carrying a balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerBalance {
    pub name: String,
    pub amount_owed: Money,
    pub due_date: Option<NaiveDate>,
    /// 0 when not overdue
    pub days_past_due: i64,
    pub total_paid: Money,
    pub last_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivablesSummary {
    pub total_owed: Money,
    pub customers_with_balance: usize,
    pub overdue_amount: Money,
    pub overdue_customers: usize,
    pub aging: AgingBuckets,
    /// Sum of every recorded payment
    pub total_collected: Money,
    /// Most overdue first, then largest balance
    pub balances: Vec<CustomerBalance>,
}

/// Age the open customer balances as of a date.
pub fn analyze_receivables(
    input: &ReceivablesInput,
) -> ShopcalcResult<ComputationOutput<ReceivablesSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let summary = summarize_receivables(&input.customers, input.as_of, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Accounts receivable aging (current, 1-30, 31-60, 61-90, 90+ days)",
        &serde_json::json!({
            "as_of": input.as_of,
            "customers": input.customers.len(),
        }),
        warnings,
        elapsed,
        summary,
    ))
}

pub(crate) fn summarize_receivables(
    customers: &[Customer],
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> ReceivablesSummary {
    let mut aging = AgingBuckets::default();
    let mut total_owed = Decimal::ZERO;
    let mut overdue_amount = Decimal::ZERO;
    let mut overdue_customers = 0;
    let mut total_collected = Decimal::ZERO;
    let mut balances = Vec::new();

    for customer in customers {
        let total_paid: Money = customer.payment_history.iter().map(|p| p.amount).sum();
        total_collected += total_paid;

        if customer.amount_owed < Decimal::ZERO {
            warnings.push(format!(
                "{} has a credit balance of {}; excluded from receivables",
                customer.name, -customer.amount_owed
            ));
            continue;
        }
        if customer.amount_owed.is_zero() {
            continue;
        }

        let due_date = customer.due_date();
        if customer.due_date.is_some() && due_date.is_none() {
            warnings.push(format!(
                "{} has an unreadable due date; treated as current",
                customer.name
            ));
        }
        let days_past_due = due_date
            .map(|d| (as_of - d).num_days().max(0))
            .unwrap_or(0);

        total_owed += customer.amount_owed;
        aging.add(days_past_due, customer.amount_owed);
        if days_past_due > 0 {
            overdue_amount += customer.amount_owed;
            overdue_customers += 1;
        }

        let last_payment_date = customer
            .payment_history
            .iter()
            .filter_map(|p| p.date.as_deref().and_then(parse_record_date))
            .max();

        balances.push(CustomerBalance {
            name: customer.name.clone(),
            amount_owed: customer.amount_owed,
            due_date,
            days_past_due,
            total_paid,
            last_payment_date,
        });
    }

    balances.sort_by(|a, b| {
        b.days_past_due
            .cmp(&a.days_past_due)
            .then(b.amount_owed.cmp(&a.amount_owed))
    });

    ReceivablesSummary {
        total_owed,
        customers_with_balance: balances.len(),
        overdue_amount,
        overdue_customers,
        aging,
        total_collected,
        balances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PaymentRecord;
    use rust_decimal_macros::dec;

    fn customer(name: &str, owed: Decimal, due: Option<&str>) -> Customer {
        Customer {
            id: None,
            name: name.into(),
            amount_owed: owed,
            due_date: due.map(String::from),
            payment_history: vec![],
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn test_aging_buckets() {
        let customers = vec![
            customer("Not due", dec!(100), Some("2024-07-15")),
            customer("Ten days", dec!(200), Some("2024-06-20")),
            customer("Forty days", dec!(300), Some("2024-05-21")),
            customer("Seventy days", dec!(400), Some("2024-04-21")),
            customer("Ancient", dec!(500), Some("2023-12-01")),
            customer("No date", dec!(50), None),
            customer("Settled", dec!(0), Some("2024-01-01")),
        ];
        let mut warnings = Vec::new();
        let s = summarize_receivables(&customers, as_of(), &mut warnings);
        assert_eq!(s.total_owed, dec!(1550));
        assert_eq!(s.customers_with_balance, 6);
        assert_eq!(s.aging.current, dec!(150));
        assert_eq!(s.aging.days_1_30, dec!(200));
        assert_eq!(s.aging.days_31_60, dec!(300));
        assert_eq!(s.aging.days_61_90, dec!(400));
        assert_eq!(s.aging.days_over_90, dec!(500));
        assert_eq!(s.overdue_amount, dec!(1400));
        assert_eq!(s.overdue_customers, 4);
        assert_eq!(s.balances[0].name, "Ancient");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_due_today_is_current() {
        let customers = vec![customer("Today", dec!(75), Some("2024-06-30"))];
        let mut warnings = Vec::new();
        let s = summarize_receivables(&customers, as_of(), &mut warnings);
        assert_eq!(s.overdue_customers, 0);
        assert_eq!(s.aging.current, dec!(75));
    }

    #[test]
    fn test_payments_and_credit_balances() {
        let mut paying = customer("Paying", dec!(40), Some("2024-06-01"));
        paying.payment_history = vec![
            PaymentRecord { amount: dec!(10), date: Some("2024-05-01".into()) },
            PaymentRecord { amount: dec!(15), date: Some("2024-06-10T12:00:00Z".into()) },
            PaymentRecord { amount: dec!(5), date: None },
        ];
        let credit = customer("In credit", dec!(-20), None);
        let mut warnings = Vec::new();
        let s = summarize_receivables(&[paying, credit], as_of(), &mut warnings);
        assert_eq!(s.total_collected, dec!(30));
        assert_eq!(s.total_owed, dec!(40));
        assert_eq!(
            s.balances[0].last_payment_date,
            NaiveDate::from_ymd_opt(2024, 6, 10)
        );
        assert_eq!(s.balances[0].days_past_due, 29);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_unreadable_due_date_warns() {
        let input = ReceivablesInput {
            customers: vec![customer("Smudged", dec!(10), Some("next friday"))],
            as_of: as_of(),
        };
        let out = analyze_receivables(&input).unwrap();
        assert_eq!(out.result.aging.current, dec!(10));
        assert_eq!(out.warnings.len(), 1);
    }
}
