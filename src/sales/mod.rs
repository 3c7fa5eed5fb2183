//! Querying sales: the orchestrator that ties filtering, sorting, paging and
//! summarizing together, and the HTTP handlers that expose it.

mod core;
mod handlers;

pub use core::{SalesPage, SalesService};
pub use handlers::{get_filters, get_health, get_sale, get_sales, get_stats};
