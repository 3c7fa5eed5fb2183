//! The values offered by the filter panel.
//!
//! Options are computed over the whole data set rather than the current
//! query, so choosing one filter never hides the options of another.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    store::{CategoryField, SalesStore},
};

/// The age range offered when no transaction has a known age.
const DEFAULT_AGE_RANGE: AgeRange = AgeRange { min: 0, max: 100 };

/// The inclusive range of known customer ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    /// The youngest known age.
    pub min: u32,
    /// The oldest known age.
    pub max: u32,
}

/// The choices for each filter, sorted and without duplicates or blanks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Every customer region.
    pub customer_regions: Vec<String>,
    /// Every gender.
    pub genders: Vec<String>,
    /// Every product category.
    pub product_categories: Vec<String>,
    /// Every tag on any transaction.
    pub tags: Vec<String>,
    /// Every payment method.
    pub payment_methods: Vec<String>,
    /// The range of known ages. Unknown ages (zero) are left out.
    pub age_range: AgeRange,
}

/// Collect the filter choices from every transaction in `store`.
///
/// # Errors
/// Returns any error from `store`.
pub fn get_filter_options(store: &dyn SalesStore) -> Result<FilterOptions, Error> {
    let age_range = store
        .positive_age_bounds()?
        .map(|(min, max)| AgeRange { min, max })
        .unwrap_or(DEFAULT_AGE_RANGE);

    Ok(FilterOptions {
        customer_regions: sorted_options(store.distinct_values(CategoryField::CustomerRegion)?),
        genders: sorted_options(store.distinct_values(CategoryField::Gender)?),
        product_categories: sorted_options(store.distinct_values(CategoryField::ProductCategory)?),
        tags: sorted_options(store.tag_values()?),
        payment_methods: sorted_options(store.distinct_values(CategoryField::PaymentMethod)?),
        age_range,
    })
}

fn sorted_options(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
