//! The API endpoints URIs.

/// The route for querying pages of sales.
pub const SALES: &str = "/api/sales";
/// The route for the choices of every sales filter.
pub const SALES_FILTERS: &str = "/api/sales/filters";
/// The route for the size of the data set.
pub const SALES_STATS: &str = "/api/sales/stats";
/// The route to access a single sale by its transaction ID.
pub const SALE: &str = "/api/sales/{transaction_id}";
/// The route for checking that the server can reach its data.
pub const HEALTH: &str = "/health";
