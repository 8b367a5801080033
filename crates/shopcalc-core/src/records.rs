//! Records the engine consumes from the storage layer.
//!
//! These arrive already deserialized from the application database. The
//! engine never mutates them; optional columns are `Option` and the one
//! place each default is applied is the accessor on the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Grams, Money};
use crate::units::{grams_to_kilograms, grams_to_ounces, Quantity};

/// Kind of register entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
    Payment,
}

/// A single register entry: a sale to a customer, a stock purchase, or a
/// payment received against a customer's credit account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub quantity_grams: Grams,
    #[serde(default)]
    pub price_per_gram: Money,
    pub total_price: Money,
    /// Cost of goods for a sale, or the amount paid for a purchase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<Money>,
    /// As stored: `YYYY-MM-DD`, RFC 3339, or a naive timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Transaction {
    /// Calendar date of the entry, or `None` when missing or malformed.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_record_date)
    }

    /// What a purchase cost the business.
    pub fn cost_amount(&self) -> Money {
        self.cost.unwrap_or(self.total_price)
    }

    /// Profit on a sale, falling back to price minus recorded cost.
    pub fn profit_amount(&self) -> Money {
        self.profit
            .unwrap_or_else(|| self.total_price - self.cost.unwrap_or(Decimal::ZERO))
    }

    pub fn product_label(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unassigned")
    }
}

/// One payment made by a customer against their balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A customer with a credit account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub amount_owed: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub payment_history: Vec<PaymentRecord>,
}

impl Customer {
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_record_date)
    }
}

/// A stocked product. `quantity_grams` is authoritative; the ounce and
/// kilogram columns are redundant copies kept by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub quantity_grams: Grams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_ounces: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_kilograms: Option<Decimal>,
    pub cost_per_ounce: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retail_price_per_gram: Option<Money>,
    #[serde(default)]
    pub reorder_threshold_grams: Grams,
}

impl InventoryItem {
    pub fn quantity(&self) -> Quantity {
        Quantity::from_grams(self.quantity_grams)
    }

    /// Whether the stored ounce/kilogram copies agree with the gram count
    /// to within 0.01 g.
    pub fn units_consistent(&self) -> bool {
        let tolerance = dec!(0.01);
        let ounces_ok = self.quantity_ounces.map_or(true, |oz| {
            ((oz - grams_to_ounces(self.quantity_grams)) * crate::units::GRAMS_PER_OUNCE).abs()
                <= tolerance
        });
        let kilograms_ok = self.quantity_kilograms.map_or(true, |kg| {
            ((kg - grams_to_kilograms(self.quantity_grams)) * crate::units::GRAMS_PER_KILOGRAM)
                .abs()
                <= tolerance
        });
        ounces_ok && kilograms_ok
    }

    pub fn needs_reorder(&self) -> bool {
        self.quantity_grams <= self.reorder_threshold_grams
    }
}

/// Parse a stored date into its calendar date.
///
/// Timestamps keep the date as written: `2024-03-31T23:30:00-05:00` is
/// March 31st, not the UTC date.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(total: Decimal, cost: Option<Decimal>, profit: Option<Decimal>) -> Transaction {
        Transaction {
            id: None,
            transaction_type: TransactionType::Sale,
            product_name: None,
            customer_id: None,
            quantity_grams: dec!(10),
            price_per_gram: dec!(5),
            total_price: total,
            cost,
            profit,
            date: Some("2024-05-02".into()),
        }
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_record_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_parse_rfc3339_keeps_written_date() {
        assert_eq!(
            parse_record_date("2024-03-31T23:30:00-05:00"),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert_eq!(
            parse_record_date("2024-04-01T00:15:00Z"),
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
    }

    #[test]
    fn test_parse_naive_timestamp() {
        assert_eq!(
            parse_record_date("2024-06-10T08:00:00.123"),
            NaiveDate::from_ymd_opt(2024, 6, 10)
        );
        assert_eq!(
            parse_record_date("2024-06-10 08:00:00"),
            NaiveDate::from_ymd_opt(2024, 6, 10)
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("yesterday"), None);
        assert_eq!(parse_record_date("2024-13-01"), None);
    }

    #[test]
    fn test_transaction_defaults() {
        assert_eq!(sale(dec!(50), Some(dec!(20)), None).profit_amount(), dec!(30));
        assert_eq!(sale(dec!(50), None, None).profit_amount(), dec!(50));
        assert_eq!(sale(dec!(50), Some(dec!(20)), Some(dec!(25))).profit_amount(), dec!(25));
        assert_eq!(sale(dec!(50), None, None).cost_amount(), dec!(50));
        assert_eq!(sale(dec!(50), Some(dec!(20)), None).cost_amount(), dec!(20));
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx: Transaction = serde_json::from_str(
            r#"{"type":"purchase","quantity_grams":"100","total_price":"250","date":"2024-01-05"}"#,
        )
        .unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Purchase);
        assert_eq!(tx.cost_amount(), dec!(250));
        assert_eq!(tx.date(), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(tx.product_label(), "Unassigned");
    }

    #[test]
    fn test_inventory_units_consistency() {
        let mut item = InventoryItem {
            id: None,
            name: "House blend".into(),
            quantity_grams: dec!(1000),
            quantity_ounces: Some(dec!(35.274)),
            quantity_kilograms: Some(dec!(1)),
            cost_per_ounce: dec!(10),
            retail_price_per_gram: None,
            reorder_threshold_grams: dec!(200),
        };
        assert!(item.units_consistent());
        item.quantity_kilograms = Some(dec!(1.2));
        assert!(!item.units_consistent());
        assert!(!item.needs_reorder());
        item.quantity_grams = dec!(200);
        assert!(item.needs_reorder());
    }
}
