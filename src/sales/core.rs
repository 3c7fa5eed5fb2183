//! The sales query orchestrator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    filter_options::{FilterOptions, get_filter_options},
    pagination::{Pagination, PaginationConfig},
    query::{SalesFilter, SalesQuery, SalesSort},
    store::SalesStore,
    summary::Summary,
    transaction::Transaction,
};

/// One page of a sales query, with the summary of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPage {
    /// The transactions on the page, in sort order.
    pub data: Vec<Transaction>,
    /// The totals over every matching transaction, not just this page.
    pub summary: Summary,
    /// Where this page sits in the filtered set.
    pub pagination: Pagination,
}

/// Runs sales queries against whichever store the app was started with.
#[derive(Debug, Clone)]
pub struct SalesService {
    store: Arc<dyn SalesStore>,
    pagination_config: PaginationConfig,
}

impl SalesService {
    /// Create a service that queries `store`, using `pagination_config` for
    /// requests that do not specify a page.
    pub fn new(store: Arc<dyn SalesStore>, pagination_config: PaginationConfig) -> Self {
        Self {
            store,
            pagination_config,
        }
    }

    /// Search, filter, sort and page the transactions as `query` asks.
    ///
    /// Malformed parts of `query` fall back to their defaults, so only a
    /// failing store produces an error. Requesting a page past the end serves
    /// the last page.
    ///
    /// # Errors
    /// Returns any error from the store. No partial page is returned.
    pub fn query(&self, query: &SalesQuery) -> Result<SalesPage, Error> {
        let filter = SalesFilter::from_query(query);
        let sort = SalesSort::from_query(query);

        let total_items = self.store.count_matching(&filter)?;
        let summary = Summary::new(self.store.summarize(&filter)?, total_items);
        let pagination = Pagination::new(
            query.page_number(self.pagination_config.default_page),
            query.page_size(self.pagination_config.default_page_size),
            total_items,
        );

        let data = if total_items == 0 {
            Vec::new()
        } else {
            self.store.fetch_page(&filter, &sort, pagination.window())?
        };

        tracing::debug!(
            "Serving page {} of {} with {} of {} matching transactions",
            pagination.current_page,
            pagination.total_pages,
            data.len(),
            total_items
        );

        Ok(SalesPage {
            data,
            summary,
            pagination,
        })
    }

    /// The filter choices over the whole data set.
    ///
    /// # Errors
    /// Returns any error from the store.
    pub fn filter_options(&self) -> Result<FilterOptions, Error> {
        get_filter_options(self.store.as_ref())
    }

    /// The transaction with the ID `transaction_id`, if there is one.
    ///
    /// # Errors
    /// Returns any error from the store.
    pub fn get_by_id(&self, transaction_id: &str) -> Result<Option<Transaction>, Error> {
        self.store.get(transaction_id)
    }

    /// The number of transactions in the data set.
    ///
    /// # Errors
    /// Returns any error from the store.
    pub fn count(&self) -> Result<u64, Error> {
        self.store.count()
    }
}
