//! Turns loosely-typed source rows into [Transaction]s.
//!
//! Source data comes from CSV exports whose column names vary between
//! human-readable ("Transaction ID") and snake_case ("transaction_id")
//! spellings. Each field has an ordered list of accepted column names and the
//! first one holding a non-empty value wins.

use std::collections::HashMap;

use super::Transaction;

/// A raw source row: column name to cell text.
pub type SourceRow = HashMap<String, String>;

const TRANSACTION_ID: &[&str] = &["Transaction ID", "transaction_id"];
const CUSTOMER_ID: &[&str] = &["Customer ID", "customer_id"];
const CUSTOMER_NAME: &[&str] = &["Customer Name", "customer_name"];
const PHONE_NUMBER: &[&str] = &["Phone Number", "phone_number"];
const GENDER: &[&str] = &["Gender", "gender"];
const AGE: &[&str] = &["Age", "age"];
const CUSTOMER_REGION: &[&str] = &["Customer Region", "customer_region"];
const CUSTOMER_TYPE: &[&str] = &["Customer Type", "customer_type"];
const PRODUCT_ID: &[&str] = &["Product ID", "product_id"];
const PRODUCT_NAME: &[&str] = &["Product Name", "product_name"];
const BRAND: &[&str] = &["Brand", "brand"];
const PRODUCT_CATEGORY: &[&str] = &["Product Category", "product_category"];
const TAGS: &[&str] = &["Tags", "tags"];
const QUANTITY: &[&str] = &["Quantity", "quantity"];
const PRICE_PER_UNIT: &[&str] = &["Price per Unit", "price_per_unit", "Price", "price"];
const DISCOUNT_PERCENTAGE: &[&str] = &[
    "Discount Percentage",
    "discount_percentage",
    "Discount",
    "discount",
];
const TOTAL_AMOUNT: &[&str] = &["Total Amount", "total_amount"];
const FINAL_AMOUNT: &[&str] = &["Final Amount", "final_amount", "Net Amount", "net_amount"];
const DATE: &[&str] = &["Date", "date"];
const PAYMENT_METHOD: &[&str] = &["Payment Method", "payment_method"];
const ORDER_STATUS: &[&str] = &["Order Status", "order_status"];
const DELIVERY_TYPE: &[&str] = &["Delivery Type", "delivery_type"];
const STORE_ID: &[&str] = &["Store ID", "store_id"];
const STORE_LOCATION: &[&str] = &["Store Location", "store_location"];
const SALESPERSON_ID: &[&str] = &[
    "Salesperson ID",
    "salesperson_id",
    "Sales Person ID",
    "sales_person_id",
];
const EMPLOYEE_NAME: &[&str] = &[
    "Employee Name",
    "employee_name",
    "Sales Person Name",
    "sales_person_name",
];

/// Normalize the source `row` found at the 0-based position `index`.
///
/// This never fails: missing text becomes an empty string, unparsable numbers
/// become zero and a missing transaction ID is synthesized from `index`.
pub fn normalize_record(row: &SourceRow, index: usize) -> Transaction {
    let text = |aliases: &[&str]| lookup(row, aliases).unwrap_or_default().to_owned();

    Transaction {
        transaction_id: lookup(row, TRANSACTION_ID)
            .map(str::to_owned)
            .unwrap_or_else(|| synthesize_transaction_id(index)),

        customer_id: text(CUSTOMER_ID),
        customer_name: text(CUSTOMER_NAME),
        phone_number: text(PHONE_NUMBER),
        gender: text(GENDER),
        age: parse_count(lookup(row, AGE)),
        customer_region: text(CUSTOMER_REGION),
        customer_type: text(CUSTOMER_TYPE),

        product_id: text(PRODUCT_ID),
        product_name: text(PRODUCT_NAME),
        brand: text(BRAND),
        product_category: text(PRODUCT_CATEGORY),
        tags: lookup(row, TAGS).map(parse_tags).unwrap_or_default(),

        quantity: parse_count(lookup(row, QUANTITY)),
        price_per_unit: parse_amount(lookup(row, PRICE_PER_UNIT)),
        discount_percentage: parse_amount(lookup(row, DISCOUNT_PERCENTAGE)),
        total_amount: parse_amount(lookup(row, TOTAL_AMOUNT)),
        final_amount: parse_amount(lookup(row, FINAL_AMOUNT)),

        date: text(DATE),
        payment_method: text(PAYMENT_METHOD),
        order_status: text(ORDER_STATUS),
        delivery_type: text(DELIVERY_TYPE),

        store_id: text(STORE_ID),
        store_location: text(STORE_LOCATION),
        salesperson_id: text(SALESPERSON_ID),
        employee_name: text(EMPLOYEE_NAME),
    }
}

/// Find the first alias in `aliases` with a non-blank value in `row`.
fn lookup<'a>(row: &'a SourceRow, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Create the ID for a transaction without one, e.g. "TXN000001" for index 0.
fn synthesize_transaction_id(index: usize) -> String {
    format!("TXN{:06}", index + 1)
}

/// Parse a non-negative decimal, ignoring thousands separators.
///
/// Returns zero for missing, unparsable, negative or non-finite values.
fn parse_amount(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };

    match value.replace(',', "").trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => amount,
        _ => 0.0,
    }
}

/// Parse a non-negative whole number, ignoring thousands separators.
///
/// Decimal input is truncated, e.g. "3.0" becomes 3.
fn parse_count(value: Option<&str>) -> u32 {
    parse_amount(value).trunc() as u32
}

/// Parse a delimited list of tags such as `["sale", "new"]` or `sale|new`.
fn parse_tags(text: &str) -> Vec<String> {
    text.replace(['[', ']', '"', '\''], "")
        .split([',', '|'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
