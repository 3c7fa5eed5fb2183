//! The record sources that sales queries run against.
//!
//! [SalesStore] is the capability the query orchestrator needs from a data
//! source. There are two interchangeable implementations and one is chosen per
//! deployment:
//! - [InMemorySalesStore] evaluates queries over a resident `Vec`,
//! - [SQLiteSalesStore] delegates them to SQLite's query planner.

mod memory;
mod sqlite;

pub use memory::InMemorySalesStore;
pub use sqlite::SQLiteSalesStore;

use std::fmt::Debug;

use crate::{
    Error,
    pagination::PageWindow,
    query::{SalesFilter, SalesSort},
    summary::Totals,
    transaction::Transaction,
};

/// Answers counting, aggregation and paging questions about sales.
///
/// Every method that takes a [SalesFilter] must select exactly the
/// transactions for which [SalesFilter::matches] returns `true`.
pub trait SalesStore: Debug + Send + Sync {
    /// The number of transactions in the store.
    fn count(&self) -> Result<u64, Error>;

    /// The number of transactions that match `filter`.
    fn count_matching(&self, filter: &SalesFilter) -> Result<u64, Error>;

    /// The sums over every transaction that matches `filter`.
    fn summarize(&self, filter: &SalesFilter) -> Result<Totals, Error>;

    /// The transactions that match `filter`, ordered by `sort` and cut down to
    /// `window`.
    ///
    /// Transactions that compare equal under `sort` must stay in ingestion
    /// order.
    fn fetch_page(
        &self,
        filter: &SalesFilter,
        sort: &SalesSort,
        window: PageWindow,
    ) -> Result<Vec<Transaction>, Error>;

    /// The distinct values of `field` over the whole store, in no particular
    /// order.
    fn distinct_values(&self, field: CategoryField) -> Result<Vec<String>, Error>;

    /// The distinct tags over the whole store, in no particular order.
    fn tag_values(&self) -> Result<Vec<String>, Error>;

    /// The smallest and largest strictly positive ages in the store, `None` if
    /// there are none.
    fn positive_age_bounds(&self) -> Result<Option<(u32, u32)>, Error>;

    /// The transaction with the ID `transaction_id`, if there is one.
    fn get(&self, transaction_id: &str) -> Result<Option<Transaction>, Error>;
}

/// The text fields used as multi-select filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryField {
    /// [Transaction::customer_region]
    CustomerRegion,
    /// [Transaction::gender]
    Gender,
    /// [Transaction::product_category]
    ProductCategory,
    /// [Transaction::payment_method]
    PaymentMethod,
}

impl CategoryField {
    /// The value of the field on `transaction`.
    pub fn value(self, transaction: &Transaction) -> &str {
        match self {
            Self::CustomerRegion => &transaction.customer_region,
            Self::Gender => &transaction.gender,
            Self::ProductCategory => &transaction.product_category,
            Self::PaymentMethod => &transaction.payment_method,
        }
    }

    /// The name of the SQL column holding the field.
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::CustomerRegion => "customer_region",
            Self::Gender => "gender",
            Self::ProductCategory => "product_category",
            Self::PaymentMethod => "payment_method",
        }
    }
}

#[cfg(test)]
pub(crate) mod test_data {
    use crate::{
        Error,
        pagination::PageWindow,
        query::{SalesFilter, SalesSort},
        summary::Totals,
        transaction::Transaction,
    };

    use super::{CategoryField, SalesStore};

    /// A transaction with the fields the store tests care about.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn sale(
        transaction_id: &str,
        customer_name: &str,
        customer_region: &str,
        age: u32,
        tags: &[&str],
        quantity: u32,
        final_amount: f64,
        date: &str,
    ) -> Transaction {
        Transaction {
            transaction_id: transaction_id.to_owned(),
            customer_id: format!("CUST-{transaction_id}"),
            customer_name: customer_name.to_owned(),
            customer_region: customer_region.to_owned(),
            age,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            quantity,
            total_amount: final_amount + 10.0,
            final_amount,
            date: date.to_owned(),
            gender: if age % 2 == 0 { "Female" } else { "Male" }.to_owned(),
            payment_method: "UPI".to_owned(),
            product_category: "Electronics".to_owned(),
            ..Default::default()
        }
    }

    /// A small data set covering search, filter and sort edge cases.
    pub(crate) fn sample_sales() -> Vec<Transaction> {
        vec![
            sale("TXN000001", "Neha Yadav", "North", 34, &["clearance", "sale"], 2, 90.0, "2023-03-15"),
            sale("TXN000002", "Sneha Rao", "South", 0, &["new"], 3, 50.0, "2023-01-02"),
            sale("TXN000003", "Neha Sharma", "North", 67, &[], 1, 250.5, "2023-06-30"),
            sale("TXN000004", "amit Verma", "East", 0, &["sale"], 5, 50.0, "not a date"),
            sale("TXN000005", "Priya Singh", "", 0, &["premium", "new"], 2, 1000.0, "2023-03-15T10:00:00"),
        ]
    }

    /// A store whose every operation fails.
    #[derive(Debug)]
    pub(crate) struct FailingStore;

    impl SalesStore for FailingStore {
        fn count(&self) -> Result<u64, Error> {
            Err(Error::DatabaseLockError)
        }

        fn count_matching(&self, _: &SalesFilter) -> Result<u64, Error> {
            Err(Error::DatabaseLockError)
        }

        fn summarize(&self, _: &SalesFilter) -> Result<Totals, Error> {
            Err(Error::DatabaseLockError)
        }

        fn fetch_page(
            &self,
            _: &SalesFilter,
            _: &SalesSort,
            _: PageWindow,
        ) -> Result<Vec<Transaction>, Error> {
            Err(Error::DatabaseLockError)
        }

        fn distinct_values(&self, _: CategoryField) -> Result<Vec<String>, Error> {
            Err(Error::DatabaseLockError)
        }

        fn tag_values(&self) -> Result<Vec<String>, Error> {
            Err(Error::DatabaseLockError)
        }

        fn positive_age_bounds(&self) -> Result<Option<(u32, u32)>, Error> {
            Err(Error::DatabaseLockError)
        }

        fn get(&self, _: &str) -> Result<Option<Transaction>, Error> {
            Err(Error::DatabaseLockError)
        }
    }
}
