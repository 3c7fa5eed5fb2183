//! Implements a sales store that keeps every transaction in memory.

use std::collections::HashSet;

use crate::{
    Error,
    pagination::PageWindow,
    query::{SalesFilter, SalesSort},
    summary::Totals,
    transaction::Transaction,
};

use super::{CategoryField, SalesStore};

/// Evaluates sales queries over a resident list of transactions.
///
/// The list is kept in ingestion order, which is also the order rows keep when
/// they tie under a sort.
#[derive(Debug, Clone, Default)]
pub struct InMemorySalesStore {
    transactions: Vec<Transaction>,
}

impl InMemorySalesStore {
    /// Create a store holding `transactions` in ingestion order.
    ///
    /// # Errors
    /// Returns [Error::DuplicateTransactionId] if two transactions share an ID.
    pub fn new(transactions: Vec<Transaction>) -> Result<Self, Error> {
        let mut seen = HashSet::with_capacity(transactions.len());

        if let Some(duplicate) = transactions
            .iter()
            .find(|transaction| !seen.insert(transaction.transaction_id.as_str()))
        {
            tracing::error!("Duplicate transaction ID {}", duplicate.transaction_id);
            return Err(Error::DuplicateTransactionId(
                duplicate.transaction_id.clone(),
            ));
        }

        Ok(Self { transactions })
    }

    fn matching<'a>(
        &'a self,
        filter: &'a SalesFilter,
    ) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |transaction| filter.matches(transaction))
    }
}

impl SalesStore for InMemorySalesStore {
    fn count(&self) -> Result<u64, Error> {
        Ok(self.transactions.len() as u64)
    }

    fn count_matching(&self, filter: &SalesFilter) -> Result<u64, Error> {
        Ok(self.matching(filter).count() as u64)
    }

    fn summarize(&self, filter: &SalesFilter) -> Result<Totals, Error> {
        Ok(self.matching(filter).collect())
    }

    fn fetch_page(
        &self,
        filter: &SalesFilter,
        sort: &SalesSort,
        window: PageWindow,
    ) -> Result<Vec<Transaction>, Error> {
        let mut matching: Vec<&Transaction> = self.matching(filter).collect();

        // `sort_by` is stable, so ties keep ingestion order.
        if sort.key.is_some() {
            matching.sort_by(|a, b| sort.compare(a, b));
        }

        let page = matching
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect::<Vec<_>>();

        tracing::debug!("Fetched {} transactions from memory", page.len());

        Ok(page)
    }

    fn distinct_values(&self, field: CategoryField) -> Result<Vec<String>, Error> {
        let values: HashSet<&str> = self
            .transactions
            .iter()
            .map(|transaction| field.value(transaction))
            .collect();

        Ok(values.into_iter().map(str::to_owned).collect())
    }

    fn tag_values(&self) -> Result<Vec<String>, Error> {
        let tags: HashSet<&str> = self
            .transactions
            .iter()
            .flat_map(|transaction| transaction.tags.iter().map(String::as_str))
            .collect();

        Ok(tags.into_iter().map(str::to_owned).collect())
    }

    fn positive_age_bounds(&self) -> Result<Option<(u32, u32)>, Error> {
        let bounds = self
            .transactions
            .iter()
            .map(|transaction| transaction.age)
            .filter(|age| *age > 0)
            .fold(None, |bounds, age| match bounds {
                None => Some((age, age)),
                Some((min, max)) => Some((age.min(min), age.max(max))),
            });

        Ok(bounds)
    }

    fn get(&self, transaction_id: &str) -> Result<Option<Transaction>, Error> {
        Ok(self
            .transactions
            .iter()
            .find(|transaction| transaction.transaction_id == transaction_id)
            .cloned())
    }
}
