//! Defines the core data model for sales transactions.

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

// ============================================================================
// MODELS
// ============================================================================

/// A single sale, i.e. one customer buying some quantity of one product.
///
/// Transactions are created once by [crate::normalize_record] and are
/// read-only afterwards. Every field always holds a defined value: missing
/// source data becomes an empty string, zero or an empty tag list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The unique key of the transaction, e.g. "TXN000042".
    pub transaction_id: String,

    /// The ID of the customer who made the purchase.
    pub customer_id: String,
    /// The full name of the customer, e.g. "Neha Yadav".
    pub customer_name: String,
    /// The customer's phone number as written in the source data.
    pub phone_number: String,
    /// The customer's gender.
    pub gender: String,
    /// The customer's age in years, zero when unknown.
    pub age: u32,
    /// The region the customer lives in.
    pub customer_region: String,
    /// The customer segment, e.g. "Loyal" or "New".
    pub customer_type: String,

    /// The ID of the product that was sold.
    pub product_id: String,
    /// The display name of the product.
    pub product_name: String,
    /// The brand of the product.
    pub brand: String,
    /// The category of the product, e.g. "Electronics".
    pub product_category: String,
    /// Free-form labels attached to the sale, in source order.
    pub tags: Vec<String>,

    /// The number of units sold.
    pub quantity: u32,
    /// The price of a single unit before discounts.
    pub price_per_unit: f64,
    /// The discount applied to the sale, as a percentage.
    pub discount_percentage: f64,
    /// The gross amount of the sale, before discounts.
    pub total_amount: f64,
    /// The net amount of the sale, after discounts.
    pub final_amount: f64,

    /// When the sale happened.
    ///
    /// This is kept as the source text and only parsed on demand, see
    /// [Transaction::sale_date].
    pub date: String,
    /// How the customer paid, e.g. "UPI" or "Cash".
    pub payment_method: String,
    /// The fulfilment status of the order.
    pub order_status: String,
    /// How the order was delivered.
    pub delivery_type: String,

    /// The ID of the store that made the sale.
    pub store_id: String,
    /// Where the store is located.
    pub store_location: String,
    /// The ID of the salesperson who made the sale.
    pub salesperson_id: String,
    /// The name of the salesperson who made the sale.
    pub employee_name: String,
}

impl Transaction {
    /// The calendar date of the sale, or `None` if [Transaction::date] cannot
    /// be parsed.
    pub fn sale_date(&self) -> Option<Date> {
        parse_sale_date(&self.date)
    }

    /// The fields that free-text search looks at.
    pub(crate) fn searchable_fields(&self) -> [&str; 6] {
        [
            &self.customer_name,
            &self.phone_number,
            &self.transaction_id,
            &self.customer_id,
            &self.employee_name,
            &self.product_id,
        ]
    }
}

// ============================================================================
// DATE PARSING
// ============================================================================

const ISO_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const SLASH_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]/[month]/[day]");

/// Parse the calendar date out of a transaction date string.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`, optionally followed by a `T` or a
/// space and a time of day. The time of day is ignored.
///
/// Returns `None` if `text` does not start with a valid date.
pub fn parse_sale_date(text: &str) -> Option<Date> {
    let text = text.trim();
    let date_text = match text.find(['T', ' ']) {
        Some(end) => &text[..end],
        None => text,
    };

    Date::parse(date_text, ISO_DATE_FORMAT)
        .or_else(|_| Date::parse(date_text, SLASH_DATE_FORMAT))
        .ok()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{Transaction, parse_sale_date};

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_sale_date("2023-03-15"), Some(date!(2023 - 03 - 15)));
    }

    #[test]
    fn parses_slash_date() {
        assert_eq!(parse_sale_date("2023/03/15"), Some(date!(2023 - 03 - 15)));
    }

    #[test]
    fn ignores_time_of_day() {
        assert_eq!(
            parse_sale_date("2023-03-15T23:59:59.000Z"),
            Some(date!(2023 - 03 - 15))
        );
        assert_eq!(
            parse_sale_date("2023-03-15 08:30:00"),
            Some(date!(2023 - 03 - 15))
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        for text in ["", "yesterday", "2023-02-30", "15-03-2023", "2023-3-5"] {
            assert_eq!(parse_sale_date(text), None, "want None for {text:?}");
        }
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let transaction = Transaction {
            transaction_id: "TXN000001".to_owned(),
            price_per_unit: 12.5,
            ..Default::default()
        };

        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(json["transactionId"], "TXN000001");
        assert_eq!(json["pricePerUnit"], 12.5);
        assert_eq!(json["tags"], serde_json::json!([]));
        assert!(json.get("transaction_id").is_none());
    }
}
