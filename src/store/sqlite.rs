//! Implements a sales store backed by SQLite.
//!
//! Search and date parsing are registered as SQL functions, and name ordering as
//! a collation, all calling the same Rust code as the in-memory store so both
//! stores select and order rows identically.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{
    Connection, OptionalExtension, Row,
    functions::FunctionFlags,
    params, params_from_iter,
    types::{Type, Value},
};

use crate::{
    Error,
    pagination::PageWindow,
    query::{SalesFilter, SalesSort, SortKey, SortOrder, compare_names, has_word_prefix},
    summary::Totals,
    transaction::{Transaction, parse_sale_date},
};

use super::{CategoryField, SalesStore};

/// The columns of the sale table, in the order [map_sale_row] reads them.
const SALE_COLUMNS: &str = "transaction_id, customer_id, customer_name, phone_number, gender, \
    age, customer_region, customer_type, product_id, product_name, brand, product_category, \
    tags, quantity, price_per_unit, discount_percentage, total_amount, final_amount, date, \
    payment_method, order_status, delivery_type, store_id, store_location, salesperson_id, \
    employee_name";

/// The columns free-text search looks at.
const SEARCH_COLUMNS: [&str; 6] = [
    "customer_name",
    "phone_number",
    "transaction_id",
    "customer_id",
    "employee_name",
    "product_id",
];

/// Stores sales in a SQLite database and answers queries with SQL.
#[derive(Debug, Clone)]
pub struct SQLiteSalesStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteSalesStore {
    /// Create a store on `connection`, creating the sale tables if they do not
    /// exist yet.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the SQL functions cannot be registered
    /// or the tables cannot be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Replace every sale in the database with `transactions`.
    ///
    /// The rows are written in one SQL transaction in the order given, which
    /// becomes the tie-break order for sorting. Returns the number of rows
    /// written.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateTransactionId] if two transactions share an ID,
    /// - [Error::DatabaseLockError] if the connection lock is poisoned,
    /// - or [Error::SqlError] if there is some other SQL error.
    pub fn replace_all(&self, transactions: &[Transaction]) -> Result<usize, Error> {
        let mut connection = self.lock()?;
        let sql_transaction = connection.transaction()?;

        sql_transaction.execute("DELETE FROM sale_tag", ())?;
        sql_transaction.execute("DELETE FROM sale", ())?;

        {
            let mut insert_sale = sql_transaction.prepare(&format!(
                "INSERT INTO sale ({SALE_COLUMNS}) VALUES \
                (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, \
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)"
            ))?;
            let mut insert_tag =
                sql_transaction.prepare("INSERT INTO sale_tag (sale_id, tag) VALUES (?1, ?2)")?;

            for transaction in transactions {
                let tags = serde_json::to_string(&transaction.tags)
                    .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

                insert_sale
                    .execute(params![
                        transaction.transaction_id,
                        transaction.customer_id,
                        transaction.customer_name,
                        transaction.phone_number,
                        transaction.gender,
                        transaction.age,
                        transaction.customer_region,
                        transaction.customer_type,
                        transaction.product_id,
                        transaction.product_name,
                        transaction.brand,
                        transaction.product_category,
                        tags,
                        transaction.quantity,
                        transaction.price_per_unit,
                        transaction.discount_percentage,
                        transaction.total_amount,
                        transaction.final_amount,
                        transaction.date,
                        transaction.payment_method,
                        transaction.order_status,
                        transaction.delivery_type,
                        transaction.store_id,
                        transaction.store_location,
                        transaction.salesperson_id,
                        transaction.employee_name,
                    ])
                    .map_err(|error| match error {
                        rusqlite::Error::SqliteFailure(
                            rusqlite::ffi::Error {
                                code: _,
                                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                            },
                            _,
                        ) => Error::DuplicateTransactionId(transaction.transaction_id.clone()),
                        error => error.into(),
                    })?;

                let sale_id = sql_transaction.last_insert_rowid();

                for tag in &transaction.tags {
                    insert_tag.execute((sale_id, tag))?;
                }
            }
        }

        sql_transaction.commit()?;

        tracing::info!("Wrote {} sales to the database", transactions.len());

        Ok(transactions.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl SalesStore for SQLiteSalesStore {
    fn count(&self) -> Result<u64, Error> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(id) FROM sale", [], |row| row.get(0))?;

        Ok(count as u64)
    }

    fn count_matching(&self, filter: &SalesFilter) -> Result<u64, Error> {
        let mut parameters = vec![];
        let where_clause = build_where_clause(filter, &mut parameters);
        let query = format!("SELECT COUNT(id) FROM sale {where_clause}");

        let count: i64 = self
            .lock()?
            .query_row(&query, params_from_iter(parameters.iter()), |row| row.get(0))?;

        Ok(count as u64)
    }

    fn summarize(&self, filter: &SalesFilter) -> Result<Totals, Error> {
        let mut parameters = vec![];
        let where_clause = build_where_clause(filter, &mut parameters);
        let query = format!(
            "SELECT COALESCE(SUM(quantity), 0), TOTAL(total_amount), TOTAL(final_amount) \
            FROM sale {where_clause}"
        );

        self.lock()?
            .query_row(&query, params_from_iter(parameters.iter()), |row| {
                let units_sold: i64 = row.get(0)?;

                Ok(Totals {
                    units_sold: units_sold as u64,
                    amount: row.get(1)?,
                    final_amount: row.get(2)?,
                })
            })
            .map_err(|error| error.into())
    }

    fn fetch_page(
        &self,
        filter: &SalesFilter,
        sort: &SalesSort,
        window: PageWindow,
    ) -> Result<Vec<Transaction>, Error> {
        let mut parameters = vec![];
        let where_clause = build_where_clause(filter, &mut parameters);
        let order_clause = build_order_clause(sort);

        let query = format!(
            "SELECT {SALE_COLUMNS} FROM sale {where_clause} {order_clause} LIMIT ?{} OFFSET ?{}",
            parameters.len() + 1,
            parameters.len() + 2,
        );
        parameters.push(Value::Integer(
            i64::try_from(window.limit).unwrap_or(i64::MAX),
        ));
        parameters.push(Value::Integer(
            i64::try_from(window.offset).unwrap_or(i64::MAX),
        ));

        let connection = self.lock()?;
        let page = connection
            .prepare(&query)?
            .query_map(params_from_iter(parameters.iter()), map_sale_row)?
            .map(|maybe_sale| maybe_sale.map_err(Error::SqlError))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Fetched {} transactions from the database", page.len());

        Ok(page)
    }

    fn distinct_values(&self, field: CategoryField) -> Result<Vec<String>, Error> {
        let query = format!("SELECT DISTINCT {column} FROM sale", column = field.column());

        self.lock()?
            .prepare(&query)?
            .query_map([], |row| row.get(0))?
            .map(|maybe_value| maybe_value.map_err(Error::SqlError))
            .collect()
    }

    fn tag_values(&self) -> Result<Vec<String>, Error> {
        self.lock()?
            .prepare("SELECT DISTINCT tag FROM sale_tag")?
            .query_map([], |row| row.get(0))?
            .map(|maybe_tag| maybe_tag.map_err(Error::SqlError))
            .collect()
    }

    fn positive_age_bounds(&self) -> Result<Option<(u32, u32)>, Error> {
        let (min, max): (Option<u32>, Option<u32>) = self.lock()?.query_row(
            "SELECT MIN(age), MAX(age) FROM sale WHERE age > 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(min.zip(max))
    }

    fn get(&self, transaction_id: &str) -> Result<Option<Transaction>, Error> {
        self.lock()?
            .prepare(&format!(
                "SELECT {SALE_COLUMNS} FROM sale WHERE transaction_id = ?1"
            ))?
            .query_row([transaction_id], map_sale_row)
            .optional()
            .map_err(|error| error.into())
    }
}

/// Register the SQL functions and create the sale tables.
fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    connection.create_scalar_function("word_prefix", 2, flags, |context| {
        let field: String = context.get(0)?;
        let word: String = context.get(1)?;

        Ok(has_word_prefix(&field, &word))
    })?;

    // Dates are compared as Julian day numbers, NULL when unparsable.
    connection.create_scalar_function("sale_date", 1, flags, |context| {
        let date: String = context.get(0)?;

        Ok(parse_sale_date(&date).map(|date| date.to_julian_day()))
    })?;

    connection.create_collation("customer_name", compare_names)?;

    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sale (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id TEXT NOT NULL UNIQUE,
            customer_id TEXT NOT NULL,
            customer_name TEXT NOT NULL,
            phone_number TEXT NOT NULL,
            gender TEXT NOT NULL,
            age INTEGER NOT NULL,
            customer_region TEXT NOT NULL,
            customer_type TEXT NOT NULL,
            product_id TEXT NOT NULL,
            product_name TEXT NOT NULL,
            brand TEXT NOT NULL,
            product_category TEXT NOT NULL,
            tags TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            price_per_unit REAL NOT NULL,
            discount_percentage REAL NOT NULL,
            total_amount REAL NOT NULL,
            final_amount REAL NOT NULL,
            date TEXT NOT NULL,
            payment_method TEXT NOT NULL,
            order_status TEXT NOT NULL,
            delivery_type TEXT NOT NULL,
            store_id TEXT NOT NULL,
            store_location TEXT NOT NULL,
            salesperson_id TEXT NOT NULL,
            employee_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sale_tag (
            sale_id INTEGER NOT NULL,
            tag TEXT NOT NULL,
            FOREIGN KEY(sale_id) REFERENCES sale(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_sale_customer_region ON sale(customer_region);
        CREATE INDEX IF NOT EXISTS idx_sale_gender ON sale(gender);
        CREATE INDEX IF NOT EXISTS idx_sale_product_category ON sale(product_category);
        CREATE INDEX IF NOT EXISTS idx_sale_payment_method ON sale(payment_method);
        CREATE INDEX IF NOT EXISTS idx_sale_age ON sale(age);
        CREATE INDEX IF NOT EXISTS idx_sale_tag_sale_id_tag ON sale_tag(sale_id, tag);
        CREATE INDEX IF NOT EXISTS idx_sale_tag_tag ON sale_tag(tag);",
    )
}

/// Build the WHERE clause for `filter`, appending its values to `parameters`.
///
/// Placeholders are numbered so that further parameters can be appended after
/// the ones added here. Returns an empty string for an unconstrained filter.
fn build_where_clause(filter: &SalesFilter, parameters: &mut Vec<Value>) -> String {
    let mut where_clause_parts = vec![];

    for word in filter.search.words() {
        parameters.push(Value::Text(word.clone()));
        let placeholder = parameters.len();

        let any_column = SEARCH_COLUMNS
            .iter()
            .map(|column| format!("word_prefix({column}, ?{placeholder})"))
            .collect::<Vec<_>>()
            .join(" OR ");

        where_clause_parts.push(format!("({any_column})"));
    }

    let memberships = [
        (CategoryField::CustomerRegion, &filter.customer_regions),
        (CategoryField::Gender, &filter.genders),
        (CategoryField::ProductCategory, &filter.product_categories),
        (CategoryField::PaymentMethod, &filter.payment_methods),
    ];

    for (field, values) in memberships {
        if !values.is_empty() {
            let placeholders = push_placeholders(values, parameters);
            where_clause_parts.push(format!("{} IN ({placeholders})", field.column()));
        }
    }

    if !filter.tags.is_empty() {
        let placeholders = push_placeholders(&filter.tags, parameters);
        where_clause_parts.push(format!(
            "EXISTS (SELECT 1 FROM sale_tag WHERE sale_tag.sale_id = sale.id \
            AND sale_tag.tag IN ({placeholders}))"
        ));
    }

    if let Some(age_min) = filter.age_min {
        parameters.push(Value::Integer(age_min));
        where_clause_parts.push(format!("age >= ?{}", parameters.len()));
    }

    if let Some(age_max) = filter.age_max {
        parameters.push(Value::Integer(age_max));
        where_clause_parts.push(format!("age <= ?{}", parameters.len()));
    }

    if let Some(date_from) = filter.date_from {
        parameters.push(Value::Integer(date_from.to_julian_day().into()));
        where_clause_parts.push(format!("sale_date(date) >= ?{}", parameters.len()));
    }

    if let Some(date_to) = filter.date_to {
        parameters.push(Value::Integer(date_to.to_julian_day().into()));
        where_clause_parts.push(format!("sale_date(date) <= ?{}", parameters.len()));
    }

    if where_clause_parts.is_empty() {
        String::new()
    } else {
        String::from("WHERE ") + &where_clause_parts.join(" AND ")
    }
}

fn push_placeholders(values: &[String], parameters: &mut Vec<Value>) -> String {
    values
        .iter()
        .map(|value| {
            parameters.push(Value::Text(value.clone()));
            format!("?{}", parameters.len())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sort by the requested key, and then ID to keep ties in ingestion order.
fn build_order_clause(sort: &SalesSort) -> String {
    let Some(key) = sort.key else {
        return "ORDER BY id ASC".to_owned();
    };

    let expression = match key {
        SortKey::Date => "sale_date(date)",
        SortKey::CustomerName => "customer_name COLLATE customer_name",
        SortKey::Quantity => "quantity",
        SortKey::FinalAmount => "final_amount",
    };

    let direction = match sort.order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    };

    format!("ORDER BY {expression} {direction}, id ASC")
}

/// Map a database row selected with [SALE_COLUMNS] to a Transaction.
fn map_sale_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let tags: String = row.get(12)?;
    let tags = serde_json::from_str(&tags)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        transaction_id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        phone_number: row.get(3)?,
        gender: row.get(4)?,
        age: row.get(5)?,
        customer_region: row.get(6)?,
        customer_type: row.get(7)?,
        product_id: row.get(8)?,
        product_name: row.get(9)?,
        brand: row.get(10)?,
        product_category: row.get(11)?,
        tags,
        quantity: row.get(13)?,
        price_per_unit: row.get(14)?,
        discount_percentage: row.get(15)?,
        total_amount: row.get(16)?,
        final_amount: row.get(17)?,
        date: row.get(18)?,
        payment_method: row.get(19)?,
        order_status: row.get(20)?,
        delivery_type: row.get(21)?,
        store_id: row.get(22)?,
        store_location: row.get(23)?,
        salesperson_id: row.get(24)?,
        employee_name: row.get(25)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod sqlite_sales_store_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        pagination::PageWindow,
        query::{SalesFilter, SalesSort, SearchTerms, SortKey, SortOrder},
        store::{
            CategoryField, InMemorySalesStore, SalesStore,
            test_data::{sale, sample_sales},
        },
    };

    use super::SQLiteSalesStore;

    fn get_store() -> SQLiteSalesStore {
        let store = SQLiteSalesStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.replace_all(&sample_sales()).unwrap();
        store
    }

    const EVERYTHING: PageWindow = PageWindow {
        offset: 0,
        limit: 100,
    };

    #[test]
    fn replace_all_overwrites_previous_rows() {
        let store = get_store();

        let written = store
            .replace_all(&[sale("A1", "Solo", "West", 20, &["one"], 1, 1.0, "2024-01-01")])
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.tag_values().unwrap(), ["one"]);
    }

    #[test]
    fn replace_all_rejects_duplicate_ids() {
        let store = SQLiteSalesStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let duplicate = sale("A1", "Solo", "West", 20, &[], 1, 1.0, "2024-01-01");

        let got = store.replace_all(&[duplicate.clone(), duplicate]);

        assert_eq!(got, Err(Error::DuplicateTransactionId("A1".to_owned())));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn round_trips_every_field() {
        let store = get_store();
        let want = sample_sales().remove(0);

        let got = store.get(&want.transaction_id).unwrap();

        assert_eq!(got, Some(want));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn search_matches_word_prefixes_only() {
        let store = get_store();
        let filter = SalesFilter {
            search: SearchTerms::parse("NEHA"),
            ..Default::default()
        };

        assert_eq!(store.count_matching(&filter).unwrap(), 2);
    }

    #[test]
    fn date_bounds_exclude_undated_rows() {
        let store = get_store();
        let filter = SalesFilter {
            date_from: Some(date!(2023 - 03 - 15)),
            date_to: Some(date!(2023 - 12 - 31)),
            ..Default::default()
        };

        let got = store
            .fetch_page(&filter, &SalesSort::new(None, SortOrder::Ascending), EVERYTHING)
            .unwrap();
        let ids: Vec<_> = got.iter().map(|sale| sale.transaction_id.as_str()).collect();

        assert_eq!(ids, ["TXN000001", "TXN000003", "TXN000005"]);
    }

    #[test]
    fn age_bounds_skip_unknown_ages() {
        assert_eq!(get_store().positive_age_bounds().unwrap(), Some((34, 67)));

        let empty = SQLiteSalesStore::new(Connection::open_in_memory().unwrap()).unwrap();
        assert_eq!(empty.positive_age_bounds().unwrap(), None);
    }

    #[test]
    fn summarizes_empty_selection_as_zeros() {
        let store = get_store();
        let filter = SalesFilter {
            customer_regions: vec!["Atlantis".to_owned()],
            ..Default::default()
        };

        let got = store.summarize(&filter).unwrap();

        assert_eq!(got.units_sold, 0);
        assert_eq!(got.amount, 0.0);
        assert_eq!(got.final_amount, 0.0);
    }

    #[test]
    fn sorts_names_with_locale_collation() {
        let store = SQLiteSalesStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store
            .replace_all(&[
                sale("T1", "Zara Khan", "", 0, &[], 1, 1.0, ""),
                sale("T2", "Émile Roy", "", 0, &[], 1, 1.0, ""),
                sale("T3", "amit Verma", "", 0, &[], 1, 1.0, ""),
            ])
            .unwrap();
        let sort = SalesSort::new(Some(SortKey::CustomerName), SortOrder::Ascending);

        let got: Vec<_> = store
            .fetch_page(&SalesFilter::default(), &sort, EVERYTHING)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.customer_name)
            .collect();

        assert_eq!(got, ["amit Verma", "Émile Roy", "Zara Khan"]);
    }

    #[test]
    fn summary_matches_in_memory_store_despite_rounding() {
        let transactions: Vec<_> = (0..10)
            .map(|index| sale(&format!("T{index}"), "", "", 0, &[], 1, 0.1, ""))
            .collect();
        let store = SQLiteSalesStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.replace_all(&transactions).unwrap();
        let memory = InMemorySalesStore::new(transactions).unwrap();

        let got = store.summarize(&SalesFilter::default()).unwrap();

        assert_eq!(got.final_amount, 1.0);
        assert_eq!(got, memory.summarize(&SalesFilter::default()).unwrap());
    }

    /// Every filter and sort must select and order rows exactly as the
    /// in-memory store does.
    #[test]
    fn agrees_with_in_memory_store() {
        let memory = InMemorySalesStore::new(sample_sales()).unwrap();
        let sqlite = get_store();

        let filters = [
            SalesFilter::default(),
            SalesFilter {
                search: SearchTerms::parse("neha"),
                ..Default::default()
            },
            SalesFilter {
                search: SearchTerms::parse("txn00000 sharma"),
                ..Default::default()
            },
            SalesFilter {
                customer_regions: vec!["North".to_owned(), "East".to_owned()],
                tags: vec!["sale".to_owned(), "premium".to_owned()],
                ..Default::default()
            },
            SalesFilter {
                age_min: Some(1),
                age_max: Some(40),
                ..Default::default()
            },
            SalesFilter {
                date_from: Some(date!(2023 - 01 - 01)),
                ..Default::default()
            },
            SalesFilter {
                genders: vec!["Female".to_owned()],
                payment_methods: vec!["UPI".to_owned()],
                product_categories: vec!["Electronics".to_owned()],
                ..Default::default()
            },
        ];

        let sorts = [
            SalesSort::new(None, SortOrder::Descending),
            SalesSort::new(Some(SortKey::Date), SortOrder::Descending),
            SalesSort::new(Some(SortKey::Date), SortOrder::Ascending),
            SalesSort::new(Some(SortKey::CustomerName), SortOrder::Ascending),
            SalesSort::new(Some(SortKey::CustomerName), SortOrder::Descending),
            SalesSort::new(Some(SortKey::Quantity), SortOrder::Descending),
            SalesSort::new(Some(SortKey::FinalAmount), SortOrder::Ascending),
        ];

        for filter in &filters {
            assert_eq!(
                memory.count_matching(filter).unwrap(),
                sqlite.count_matching(filter).unwrap(),
                "count mismatch for {filter:?}"
            );
            assert_eq!(
                memory.summarize(filter).unwrap(),
                sqlite.summarize(filter).unwrap(),
                "summary mismatch for {filter:?}"
            );

            for sort in &sorts {
                for window in [EVERYTHING, PageWindow { offset: 1, limit: 2 }] {
                    assert_eq!(
                        memory.fetch_page(filter, sort, window).unwrap(),
                        sqlite.fetch_page(filter, sort, window).unwrap(),
                        "page mismatch for {filter:?}, {sort:?}, {window:?}"
                    );
                }
            }
        }

        for field in [
            CategoryField::CustomerRegion,
            CategoryField::Gender,
            CategoryField::ProductCategory,
            CategoryField::PaymentMethod,
        ] {
            let mut want = memory.distinct_values(field).unwrap();
            let mut got = sqlite.distinct_values(field).unwrap();
            want.sort();
            got.sort();

            assert_eq!(want, got, "distinct values mismatch for {field:?}");
        }
    }
}
