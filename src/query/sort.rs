//! Ordering of sales query results.

use std::{cmp::Ordering, sync::LazyLock};

use icu_collator::{
    Collator, CollatorBorrowed,
    options::{CollatorOptions, Strength},
};

use crate::transaction::Transaction;

use super::SalesQuery;

/// The fields transactions can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// The parsed sale date. Unparsable dates sort as the oldest.
    Date,
    /// The customer name, ignoring case.
    CustomerName,
    /// The number of units sold.
    Quantity,
    /// The net amount of the sale.
    FinalAmount,
}

impl SortKey {
    /// Read a sort key from its query string name, e.g. "customerName".
    ///
    /// Returns `None` for unrecognized names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "date" => Some(Self::Date),
            "customerName" => Some(Self::CustomerName),
            "quantity" => Some(Self::Quantity),
            "finalAmount" => Some(Self::FinalAmount),
            _ => None,
        }
    }
}

/// The order to sort transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value, oldest first for dates.
    Ascending,
    /// Sort in order of decreasing value, newest first for dates.
    Descending,
}

impl SortOrder {
    /// Read a sort order, anything other than "asc" means descending.
    pub fn parse(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("asc") {
            Self::Ascending
        } else {
            Self::Descending
        }
    }
}

/// How to order the rows of a sales query.
///
/// Rows with equal sort keys keep their ingestion order, and without a key
/// every row keeps its ingestion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesSort {
    /// The field to sort by, `None` leaves the order unchanged.
    pub key: Option<SortKey>,
    /// The direction to sort in.
    pub order: SortOrder,
}

impl SalesSort {
    /// The sort key used when a query does not name one.
    pub const DEFAULT_KEY: &'static str = "date";

    /// Create a sort on `key` in the direction `order`.
    pub fn new(key: Option<SortKey>, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// The sort requested by `query`, newest first by date by default.
    pub fn from_query(query: &SalesQuery) -> Self {
        let key_name = query.sort_by.as_deref().unwrap_or(Self::DEFAULT_KEY);
        let key = SortKey::parse(key_name);

        if key.is_none() {
            tracing::debug!("Ignoring unrecognized sort key {key_name:?}");
        }

        let order = query
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or(SortOrder::Descending);

        Self::new(key, order)
    }

    /// Compare two transactions by the sort key in the sort direction.
    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.key {
            None => Ordering::Equal,
            Some(SortKey::Date) => a.sale_date().cmp(&b.sale_date()),
            Some(SortKey::CustomerName) => compare_names(&a.customer_name, &b.customer_name),
            Some(SortKey::Quantity) => a.quantity.cmp(&b.quantity),
            Some(SortKey::FinalAmount) => a.final_amount.total_cmp(&b.final_amount),
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Compares names ignoring case but not accents, e.g. "amit" < "Émile" < "Zara".
static NAME_COLLATOR: LazyLock<Option<CollatorBorrowed<'static>>> = LazyLock::new(|| {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Secondary);

    Collator::try_new(Default::default(), options)
        .inspect_err(|error| tracing::error!("could not create the name collator: {error}"))
        .ok()
});

/// Compare two customer names in locale-aware, case-insensitive order.
///
/// Names that differ only in case compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    match NAME_COLLATOR.as_ref() {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
