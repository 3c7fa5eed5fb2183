//! The raw parameters of a sales query and how they are read.
//!
//! Malformed parameters never fail a request: they are dropped or replaced by
//! their defaults. A parameter may be repeated, multi-select parameters keep
//! every value and the others keep the first.

use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

use crate::transaction::parse_sale_date;

/// The query string parameters accepted by the sales query endpoint.
///
/// Multi-select parameters hold comma separated values, e.g.
/// `customerRegion=North,East`, and repeating one adds its values, e.g.
/// `customerRegion=North&customerRegion=East`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesQuery {
    /// Free-text search term.
    #[serde(deserialize_with = "first_value")]
    pub search: Option<String>,
    /// Customer regions to include.
    #[serde(deserialize_with = "join_values")]
    pub customer_region: Option<String>,
    /// Genders to include.
    #[serde(deserialize_with = "join_values")]
    pub gender: Option<String>,
    /// Inclusive lower bound on the customer's age.
    #[serde(deserialize_with = "first_value")]
    pub age_min: Option<String>,
    /// Inclusive upper bound on the customer's age.
    #[serde(deserialize_with = "first_value")]
    pub age_max: Option<String>,
    /// Product categories to include.
    #[serde(deserialize_with = "join_values")]
    pub product_category: Option<String>,
    /// Tags of which a transaction must have at least one.
    #[serde(deserialize_with = "join_values")]
    pub tags: Option<String>,
    /// Payment methods to include.
    #[serde(deserialize_with = "join_values")]
    pub payment_method: Option<String>,
    /// Inclusive start date.
    #[serde(deserialize_with = "first_value")]
    pub date_from: Option<String>,
    /// Inclusive end date, covering the whole day.
    #[serde(deserialize_with = "first_value")]
    pub date_to: Option<String>,
    /// The field to sort by.
    #[serde(deserialize_with = "first_value")]
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    #[serde(deserialize_with = "first_value")]
    pub sort_order: Option<String>,
    /// The 1-based page number.
    #[serde(deserialize_with = "first_value")]
    pub page: Option<String>,
    /// The number of transactions per page.
    #[serde(deserialize_with = "first_value")]
    pub page_size: Option<String>,
}

impl SalesQuery {
    /// The requested page number, or `default` if missing or not a positive integer.
    pub fn page_number(&self, default: u64) -> u64 {
        parse_positive(self.page.as_deref()).unwrap_or(default)
    }

    /// The requested page size, or `default` if missing or not a positive integer.
    pub fn page_size(&self, default: u64) -> u64 {
        parse_positive(self.page_size.as_deref()).unwrap_or(default)
    }
}

/// Read every value of a repeated multi-select parameter as one comma
/// separated list.
fn join_values<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<String>::deserialize(deserializer)?;

    Ok((!values.is_empty()).then(|| values.join(",")))
}

/// Read the first value of a repeated parameter.
fn first_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<String>::deserialize(deserializer)?;

    Ok(values.into_iter().next())
}

/// Split a comma separated parameter into trimmed, non-empty values.
pub(crate) fn split_values(param: Option<&str>) -> Vec<String> {
    param
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse an age bound, dropping it if it is not a number.
///
/// Decimal input is truncated towards zero.
pub(crate) fn parse_age_bound(param: Option<&str>, name: &str) -> Option<i64> {
    let text = param?.trim();

    if text.is_empty() {
        return None;
    }

    let bound = text
        .parse::<i64>()
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .map(|number| number.trunc() as i64)
        });

    if bound.is_none() {
        tracing::debug!("Ignoring unparsable {name} {text:?}");
    }

    bound
}

/// Parse a date bound, dropping it if it is not a valid date.
pub(crate) fn parse_date_bound(param: Option<&str>, name: &str) -> Option<Date> {
    let text = param?.trim();

    if text.is_empty() {
        return None;
    }

    let date = parse_sale_date(text);

    if date.is_none() {
        tracing::debug!("Ignoring unparsable {name} {text:?}");
    }

    date
}

fn parse_positive(param: Option<&str>) -> Option<u64> {
    param?.trim().parse::<u64>().ok().filter(|number| *number > 0)
}
